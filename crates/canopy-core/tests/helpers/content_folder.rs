//! Content folder builder.
//!
//! Lays out a throwaway content folder for folder import tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use canopy_core::assets::placeholder::placeholder_png;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tempfile::TempDir;

/// A content folder in a temporary directory, removed on drop.
pub struct ContentFolder {
	dir: TempDir,
}

impl ContentFolder {
	/// Create an empty content folder.
	///
	/// # Panics
	///
	/// Panics if the temporary directory cannot be created.
	pub fn new() -> Self {
		Self {
			dir: tempfile::tempdir().expect("Failed to create content folder"),
		}
	}

	/// Add a file with raw contents.
	pub fn with_file(self, name: &str, content: &str) -> Self {
		let path = self.dir.path().join(name);
		fs::write(&path, content).unwrap_or_else(|_| panic!("Failed to write {:?}", path));
		self
	}

	/// Add a JSON file.
	pub fn with_json(self, name: &str, value: Value) -> Self {
		let content = serde_json::to_string_pretty(&value).expect("Failed to encode test data");
		self.with_file(name, &content)
	}

	/// Add a PNG under the `images` subfolder.
	pub fn with_image(self, name: &str) -> Self {
		let images = self.images();
		fs::create_dir_all(&images).expect("Failed to create images folder");
		let png = placeholder_png().expect("Failed to render placeholder");
		fs::write(images.join(name), png).expect("Failed to write image");
		self
	}

	pub fn path(&self) -> &Path {
		self.dir.path()
	}

	pub fn images(&self) -> PathBuf {
		self.dir.path().join("images")
	}
}

impl Default for ContentFolder {
	fn default() -> Self {
		Self::new()
	}
}

/// Fixed point in time used as the clock of the site and the importer.
pub fn fixed_now() -> DateTime<Utc> {
	Utc.with_ymd_and_hms(2022, 3, 1, 12, 0, 0).unwrap()
}
