//! Run outcome accounting.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::path::ContentPath;

/// A node that could not be reconciled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeFailure {
	/// Container the node was declared in.
	pub container: ContentPath,
	/// Declared or resolved identifier, if known.
	pub id: Option<String>,
	/// Declared content type, if any.
	pub type_name: Option<String>,
	/// Declared title, if any.
	pub title: Option<String>,
	/// Rendered cause.
	pub cause: String,
}

impl NodeFailure {
	/// Creates a failure record.
	pub fn new(
		container: ContentPath,
		id: Option<String>,
		type_name: Option<String>,
		title: Option<String>,
		cause: impl Into<String>,
	) -> Self {
		Self {
			container,
			id,
			type_name,
			title,
			cause: cause.into(),
		}
	}
}

impl fmt::Display for NodeFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"could not create {} with id {} (title: {}) in {}: {}",
			self.type_name.as_deref().unwrap_or("<no type>"),
			self.id.as_deref().unwrap_or("<none>"),
			self.title.as_deref().unwrap_or("<none>"),
			self.container,
			self.cause
		)
	}
}

/// A source file that could not be read or parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileError {
	/// Offending file.
	pub file: PathBuf,
	/// Rendered cause.
	pub message: String,
}

/// A translations table row that was not applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationRowError {
	/// One-based line number in the table, header included.
	pub line: usize,
	/// Rendered cause.
	pub message: String,
}

/// Summary of an import run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
	/// Objects created, in creation order.
	pub created: Vec<ContentPath>,
	/// Existing objects updated in place.
	pub edited: Vec<ContentPath>,
	/// Existing objects left alone because they were modified after the watermark.
	pub skipped_stale: Vec<ContentPath>,
	/// Node failures, in encounter order.
	pub failures: Vec<NodeFailure>,
	/// Source files skipped by the folder orchestrator.
	pub file_errors: Vec<FileError>,
	/// Translation rows that were rejected.
	pub translation_errors: Vec<TranslationRowError>,
	/// Translation pairs linked.
	pub translations_linked: usize,
}

impl ImportReport {
	/// Returns true when nothing failed.
	pub fn is_clean(&self) -> bool {
		self.failures.is_empty() && self.file_errors.is_empty() && self.translation_errors.is_empty()
	}

	/// Number of objects created or edited.
	pub fn touched(&self) -> usize {
		self.created.len() + self.edited.len()
	}
}

impl fmt::Display for ImportReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} created, {} edited, {} skipped as modified, {} failed, {} unreadable files, {} translations linked ({} rejected)",
			self.created.len(),
			self.edited.len(),
			self.skipped_stale.len(),
			self.failures.len(),
			self.file_errors.len(),
			self.translations_linked,
			self.translation_errors.len()
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_failure_display() {
		let failure = NodeFailure::new(
			ContentPath::new("/news"),
			Some("launch".to_string()),
			Some("Event".to_string()),
			None,
			"Type 'Event' is not addable in /news",
		);
		assert_eq!(
			failure.to_string(),
			"could not create Event with id launch (title: <none>) in /news: Type 'Event' is not addable in /news"
		);
	}

	#[rstest]
	fn test_report_is_clean() {
		// Arrange
		let mut report = ImportReport::default();
		report.created.push(ContentPath::new("/a"));
		assert!(report.is_clean());

		// Act
		report.translation_errors.push(TranslationRowError {
			line: 2,
			message: "canonical not found".to_string(),
		});

		// Assert
		assert!(!report.is_clean());
		assert_eq!(report.touched(), 1);
	}
}
