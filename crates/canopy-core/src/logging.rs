//! Progress and diagnostics reporting.
//!
//! The engine never prints. Every message goes through a [`LogHandler`]; the
//! default [`TracingHandler`] forwards to `tracing`, while [`MemoryHandler`]
//! keeps records for inspection in tests.

use std::sync::{Arc, Mutex};

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
	Debug,
	Info,
	Warning,
	Error,
}

/// One emitted message.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
	pub level: LogLevel,
	pub message: String,
}

impl LogRecord {
	pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
		Self {
			level,
			message: message.into(),
		}
	}
}

/// Sink for engine messages.
pub trait LogHandler {
	/// Handles one record.
	fn handle(&self, record: &LogRecord);

	fn debug(&self, message: &str) {
		self.handle(&LogRecord::new(LogLevel::Debug, message));
	}

	fn info(&self, message: &str) {
		self.handle(&LogRecord::new(LogLevel::Info, message));
	}

	fn warning(&self, message: &str) {
		self.handle(&LogRecord::new(LogLevel::Warning, message));
	}

	fn error(&self, message: &str) {
		self.handle(&LogRecord::new(LogLevel::Error, message));
	}
}

/// Forwards records to the `tracing` macros under the `canopy` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHandler;

impl LogHandler for TracingHandler {
	fn handle(&self, record: &LogRecord) {
		match record.level {
			LogLevel::Debug => tracing::debug!(target: "canopy", "{}", record.message),
			LogLevel::Info => tracing::info!(target: "canopy", "{}", record.message),
			LogLevel::Warning => tracing::warn!(target: "canopy", "{}", record.message),
			LogLevel::Error => tracing::error!(target: "canopy", "{}", record.message),
		}
	}
}

/// Keeps records at or above a level in memory.
///
/// Clones share the same buffer, so a test can hand one clone to the engine
/// and read the records back from another.
#[derive(Debug, Clone)]
pub struct MemoryHandler {
	level: LogLevel,
	records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemoryHandler {
	pub fn new(level: LogLevel) -> Self {
		Self {
			level,
			records: Arc::new(Mutex::new(Vec::new())),
		}
	}

	pub fn get_records(&self) -> Vec<LogRecord> {
		self.records
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.clone()
	}

	/// Returns true if any record at `level` contains `needle`.
	pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
		self.get_records()
			.iter()
			.any(|r| r.level == level && r.message.contains(needle))
	}

	pub fn clear(&self) {
		self.records
			.lock()
			.unwrap_or_else(|e| e.into_inner())
			.clear();
	}
}

impl Default for MemoryHandler {
	fn default() -> Self {
		Self::new(LogLevel::Debug)
	}
}

impl LogHandler for MemoryHandler {
	fn handle(&self, record: &LogRecord) {
		if record.level >= self.level {
			self.records
				.lock()
				.unwrap_or_else(|e| e.into_inner())
				.push(record.clone());
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_memory_handler_filters_by_level() {
		// Arrange
		let handler = MemoryHandler::new(LogLevel::Warning);

		// Act
		handler.info("created /a");
		handler.warning("skipped /b");
		handler.error("failed /c");

		// Assert
		let records = handler.get_records();
		assert_eq!(records.len(), 2);
		assert_eq!(records[0].level, LogLevel::Warning);
		assert!(handler.contains(LogLevel::Error, "/c"));
		assert!(!handler.contains(LogLevel::Info, "/a"));
	}

	#[rstest]
	fn test_memory_handler_clones_share_buffer() {
		let handler = MemoryHandler::default();
		let clone = handler.clone();

		clone.debug("hello");
		assert_eq!(handler.get_records().len(), 1);

		handler.clear();
		assert!(clone.get_records().is_empty());
	}

	#[rstest]
	fn test_level_ordering() {
		assert!(LogLevel::Debug < LogLevel::Info);
		assert!(LogLevel::Warning < LogLevel::Error);
	}
}
