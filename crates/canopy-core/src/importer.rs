//! The import context.
//!
//! [`Importer`] carries everything a run needs: the site, the process-wide
//! switches, the log sink, the clock and the accumulated [`ImportReport`].
//! The operations themselves live in the sibling modules (`reconciler`,
//! `folder`, `fixup`, `translations`, `siteroot`) as `impl` blocks on it.

use std::mem;

use chrono::{DateTime, Utc};

use crate::config::ImportSettings;
use crate::error::{CanopyError, CanopyResult};
use crate::logging::{LogHandler, TracingHandler};
use crate::report::{ImportReport, NodeFailure};
use crate::repository::ContentSite;

/// Called by the topmost entry points with the failure that aborted a run,
/// when [`ImportSettings::debug`] is set.
pub trait InspectionHook {
	fn inspect(&self, failure: &NodeFailure);
}

impl<F> InspectionHook for F
where
	F: Fn(&NodeFailure),
{
	fn inspect(&self, failure: &NodeFailure) {
		self(failure)
	}
}

/// Explicit context of an import run.
pub struct Importer<'a, S: ContentSite> {
	pub(crate) site: &'a mut S,
	pub(crate) settings: ImportSettings,
	pub(crate) log: Box<dyn LogHandler + 'a>,
	clock: Box<dyn Fn() -> DateTime<Utc> + 'a>,
	hook: Option<Box<dyn InspectionHook + 'a>>,
	pub(crate) report: ImportReport,
}

impl<'a, S: ContentSite> Importer<'a, S> {
	/// Creates an importer with default settings, `tracing` output and the system clock.
	pub fn new(site: &'a mut S) -> Self {
		Self {
			site,
			settings: ImportSettings::default(),
			log: Box::new(TracingHandler),
			clock: Box::new(Utc::now),
			hook: None,
			report: ImportReport::default(),
		}
	}

	/// Replaces the process-wide switches.
	pub fn with_settings(mut self, settings: ImportSettings) -> Self {
		self.settings = settings;
		self
	}

	/// Sends engine messages to `handler` instead of `tracing`.
	pub fn with_log_handler(mut self, handler: impl LogHandler + 'a) -> Self {
		self.log = Box::new(handler);
		self
	}

	/// Replaces the clock used for publish-time effective dates.
	pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + 'a) -> Self {
		self.clock = Box::new(clock);
		self
	}

	/// Installs the hook called with the failure that aborted a debug run.
	pub fn with_inspection_hook(mut self, hook: impl InspectionHook + 'a) -> Self {
		self.hook = Some(Box::new(hook));
		self
	}

	pub fn settings(&self) -> &ImportSettings {
		&self.settings
	}

	pub fn site(&self) -> &S {
		self.site
	}

	pub fn report(&self) -> &ImportReport {
		&self.report
	}

	/// Returns the accumulated report and starts a fresh one.
	pub fn take_report(&mut self) -> ImportReport {
		mem::take(&mut self.report)
	}

	pub fn into_report(self) -> ImportReport {
		self.report
	}

	pub(crate) fn now(&self) -> DateTime<Utc> {
		(self.clock)()
	}

	/// Records a failure that never aborts the run.
	pub(crate) fn skip_node(&mut self, failure: NodeFailure) {
		self.log.error(&failure.to_string());
		self.report.failures.push(failure);
	}

	/// Records a failure inside the field boundary.
	///
	/// Returns the abort unless continue-on-error is set.
	pub(crate) fn fail_node(&mut self, failure: NodeFailure) -> CanopyResult<()> {
		self.log.error(&format!("could not edit the fields and properties: {failure}"));
		self.report.failures.push(failure.clone());
		if self.settings.continue_on_error {
			return Ok(());
		}
		Err(CanopyError::Aborted(Box::new(failure)))
	}

	/// Hands an abort to the inspection hook when debugging is enabled.
	pub(crate) fn inspect_abort<T>(&self, result: CanopyResult<T>) -> CanopyResult<T> {
		if let Err(CanopyError::Aborted(failure)) = &result
			&& self.settings.debug
			&& let Some(hook) = &self.hook
		{
			hook.inspect(failure);
		}
		result
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::backends::memory::MemorySite;
	use crate::logging::{LogLevel, MemoryHandler};
	use crate::path::ContentPath;
	use chrono::TimeZone;
	use rstest::rstest;
	use std::cell::RefCell;

	fn failure() -> NodeFailure {
		NodeFailure::new(
			ContentPath::root(),
			Some("doc".to_string()),
			Some("Document".to_string()),
			None,
			"boom",
		)
	}

	#[rstest]
	fn test_fail_node_aborts_by_default() {
		// Arrange
		let mut site = MemorySite::new();
		let log = MemoryHandler::default();
		let mut importer = Importer::new(&mut site).with_log_handler(log.clone());

		// Act
		let result = importer.fail_node(failure());

		// Assert
		assert!(matches!(result, Err(CanopyError::Aborted(_))));
		assert_eq!(importer.report().failures.len(), 1);
		assert!(log.contains(LogLevel::Error, "boom"));
	}

	#[rstest]
	fn test_fail_node_continues_when_configured() {
		let mut site = MemorySite::new();
		let mut importer = Importer::new(&mut site)
			.with_settings(ImportSettings::default().with_continue_on_error(true))
			.with_log_handler(MemoryHandler::default());

		assert!(importer.fail_node(failure()).is_ok());
		assert_eq!(importer.take_report().failures.len(), 1);
		assert!(importer.report().failures.is_empty());
	}

	#[rstest]
	#[case(true, 1)]
	#[case(false, 0)]
	fn test_inspection_hook_only_when_debugging(#[case] debug: bool, #[case] expected: usize) {
		// Arrange
		let seen = RefCell::new(Vec::new());
		let mut site = MemorySite::new();
		let importer = Importer::new(&mut site)
			.with_settings(ImportSettings::default().with_debug(debug))
			.with_log_handler(MemoryHandler::default())
			.with_inspection_hook(|f: &NodeFailure| seen.borrow_mut().push(f.cause.clone()));

		// Act
		let result: CanopyResult<()> =
			importer.inspect_abort(Err(CanopyError::Aborted(Box::new(failure()))));

		// Assert
		assert!(result.is_err());
		drop(importer);
		assert_eq!(seen.borrow().len(), expected);
	}

	#[rstest]
	fn test_injected_clock() {
		let fixed = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
		let mut site = MemorySite::new();
		let importer = Importer::new(&mut site).with_clock(move || fixed);
		assert_eq!(importer.now(), fixed);
	}
}
