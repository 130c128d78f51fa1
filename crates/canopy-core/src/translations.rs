//! Translation linking from `translations.csv`.
//!
//! Each row after the header names a canonical object and its translation by
//! path. Rows that cannot be linked are logged with their line number and
//! never stop the pass.

use std::path::Path;

use thiserror::Error;

use crate::error::{CanopyError, CanopyResult, RepositoryError};
use crate::importer::Importer;
use crate::path::ContentPath;
use crate::report::TranslationRowError;
use crate::repository::{ContentObject, ContentRepository, ContentSite, TranslationManager};

/// Why a single translation row could not be linked.
#[derive(Debug, Error)]
pub enum TranslationError {
	/// No object at the canonical path.
	#[error("Canonical path not found: {0}")]
	CanonicalNotFound(String),

	/// No object at the translation path.
	#[error("Translation path not found: {0}")]
	TranslationNotFound(String),

	/// The object at this path has no language set.
	#[error("{0} has unknown language")]
	UnknownLanguage(String),

	/// Canonical and translation are of different content types.
	#[error("Canonical and translation type does not match")]
	TypeMismatch,

	/// Both objects are in the same language.
	#[error("Can't link translation with the same language")]
	SameLanguage,

	/// The row does not have exactly two columns.
	#[error("expected 2 columns, found {0}")]
	MalformedRow(usize),

	/// The translation manager refused the change.
	#[error(transparent)]
	Repository(#[from] RepositoryError),
}

impl<'a, S: ContentSite> Importer<'a, S> {
	/// Links every row of a translation map. Returns how many links were made.
	///
	/// Only an unreadable file is an error; row failures land in the report.
	pub fn link_translations(&mut self, csv_path: &Path) -> CanopyResult<usize> {
		if !self.site.translations_enabled() {
			self.log
				.warning("Content includes translations but the site has no translation support");
			return Ok(0);
		}

		let file_name = csv_path
			.file_name()
			.map(|n| n.to_string_lossy().into_owned())
			.unwrap_or_else(|| csv_path.display().to_string());
		let mut reader = csv::ReaderBuilder::new()
			.has_headers(true)
			.flexible(true)
			.from_path(csv_path)
			.map_err(|e| match e.kind() {
				csv::ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
					CanopyError::FileNotFound(csv_path.to_path_buf())
				}
				_ => CanopyError::Csv(e),
			})?;

		let mut linked = 0;
		// Line 1 is the header.
		for (line, record) in (2..).zip(reader.records()) {
			let outcome = record
				.map_err(|e| TranslationError::Repository(RepositoryError::Translation(e.to_string())))
				.and_then(|record| {
					if record.len() != 2 {
						return Err(TranslationError::MalformedRow(record.len()));
					}
					self.link_translation(record[0].trim(), record[1].trim())
				});
			match outcome {
				Ok(true) => linked += 1,
				Ok(false) => {}
				Err(e) => {
					let message = e.to_string();
					self.log.error(&format!("{file_name} line {line}: {message}"));
					self.report
						.translation_errors
						.push(TranslationRowError { line, message });
				}
			}
		}
		self.report.translations_linked += linked;
		Ok(linked)
	}

	/// Links `translation_path` as the translation of `canonical_path`.
	///
	/// An existing different translation for the same language is unlinked
	/// first. Returns false when the pair was already linked.
	pub fn link_translation(
		&mut self,
		canonical_path: &str,
		translation_path: &str,
	) -> Result<bool, TranslationError> {
		let canonical = self
			.site
			.get(&ContentPath::new(canonical_path))
			.ok_or_else(|| TranslationError::CanonicalNotFound(canonical_path.to_string()))?;
		let canonical_language = canonical
			.language()
			.ok_or_else(|| TranslationError::UnknownLanguage(canonical_path.to_string()))?
			.to_string();
		let translation = self
			.site
			.get(&ContentPath::new(translation_path))
			.ok_or_else(|| TranslationError::TranslationNotFound(translation_path.to_string()))?;
		let language = translation
			.language()
			.ok_or_else(|| TranslationError::UnknownLanguage(translation_path.to_string()))?
			.to_string();
		if translation.type_name() != canonical.type_name() {
			return Err(TranslationError::TypeMismatch);
		}
		if language == canonical_language {
			return Err(TranslationError::SameLanguage);
		}

		if let Some(existing) = self.site.translation(&canonical, &language) {
			if existing.uid() == translation.uid() {
				return Ok(false);
			}
			self.site.remove_translation(&canonical, &language)?;
		}
		self.site
			.register_translation(&canonical, &language, &translation)?;
		self.log.info(&format!(
			"Linked {translation_path} as translation of {canonical_path}"
		));
		Ok(true)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::backends::memory::MemorySite;
	use crate::logging::{LogLevel, MemoryHandler};
	use rstest::{fixture, rstest};
	use std::io::Write;

	#[fixture]
	fn site() -> MemorySite {
		let mut site = MemorySite::new().with_languages(true, &["de", "en"]);
		for (id, language, type_name) in [
			("de", Some("de"), "Document"),
			("en", Some("en"), "Document"),
			("en-2", Some("en"), "Document"),
			("en-folder", Some("en"), "Folder"),
			("neutral", None, "Document"),
		] {
			site.seed(&ContentPath::root(), type_name, id, id).unwrap();
			if let Some(language) = language {
				site.edit(&ContentPath::new(&format!("/{id}")), |o| o.set_language(language))
					.unwrap();
			}
		}
		site
	}

	fn csv_file(rows: &str) -> tempfile::NamedTempFile {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(file, "canonical,translation\n{rows}").unwrap();
		file
	}

	#[rstest]
	#[case("/missing", "/en", "Canonical path not found: /missing")]
	#[case("/neutral", "/en", "/neutral has unknown language")]
	#[case("/de", "/missing", "Translation path not found: /missing")]
	#[case("/de", "/en-folder", "Canonical and translation type does not match")]
	#[case("/en", "/en-2", "Can't link translation with the same language")]
	fn test_row_checks(
		mut site: MemorySite,
		#[case] canonical: &str,
		#[case] translation: &str,
		#[case] message: &str,
	) {
		let mut importer = Importer::new(&mut site).with_log_handler(MemoryHandler::default());

		let error = importer.link_translation(canonical, translation).unwrap_err();

		assert_eq!(error.to_string(), message);
	}

	#[rstest]
	fn test_link_is_bidirectional_and_idempotent(mut site: MemorySite) {
		// Arrange
		let mut importer = Importer::new(&mut site).with_log_handler(MemoryHandler::default());

		// Act
		let first = importer.link_translation("/de", "/en").unwrap();
		let second = importer.link_translation("/de", "/en").unwrap();

		// Assert
		assert!(first);
		assert!(!second);
		drop(importer);
		let de = site.get(&ContentPath::new("/de")).unwrap();
		let en = site.get(&ContentPath::new("/en")).unwrap();
		assert_eq!(site.translation(&de, "en").unwrap().path(), en.path());
		assert_eq!(site.translation(&en, "de").unwrap().path(), de.path());
	}

	#[rstest]
	fn test_existing_translation_is_replaced(mut site: MemorySite) {
		let mut importer = Importer::new(&mut site).with_log_handler(MemoryHandler::default());
		importer.link_translation("/de", "/en").unwrap();

		assert!(importer.link_translation("/de", "/en-2").unwrap());

		drop(importer);
		let de = site.get(&ContentPath::new("/de")).unwrap();
		assert_eq!(site.translation(&de, "en").unwrap().id(), "en-2");
	}

	#[rstest]
	fn test_csv_rows_report_line_numbers(mut site: MemorySite) {
		// Arrange
		let file = csv_file("/de,/en\n/missing,/en\n/de\n");
		let log = MemoryHandler::default();
		let mut importer = Importer::new(&mut site).with_log_handler(log.clone());

		// Act
		let linked = importer.link_translations(file.path()).unwrap();

		// Assert
		assert_eq!(linked, 1);
		let report = importer.into_report();
		assert_eq!(report.translations_linked, 1);
		let lines: Vec<usize> = report.translation_errors.iter().map(|e| e.line).collect();
		assert_eq!(lines, vec![3, 4]);
		assert!(log.contains(LogLevel::Error, "line 3: Canonical path not found: /missing"));
	}

	#[rstest]
	fn test_single_language_site_skips_with_warning() {
		let mut site = MemorySite::new();
		let file = csv_file("/de,/en\n");
		let log = MemoryHandler::default();

		let linked = Importer::new(&mut site)
			.with_log_handler(log.clone())
			.link_translations(file.path())
			.unwrap();

		assert_eq!(linked, 0);
		assert!(log.contains(LogLevel::Warning, "no translation support"));
	}

	#[rstest]
	fn test_missing_csv_is_an_error(mut site: MemorySite) {
		let result = Importer::new(&mut site)
			.with_log_handler(MemoryHandler::default())
			.link_translations(Path::new("/nonexistent/translations.csv"));

		assert!(matches!(result, Err(CanopyError::FileNotFound(_))));
	}
}
