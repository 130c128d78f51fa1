//! Processing order of per-file nodes.
//!
//! A file named `de.about.team.json` declares the node `team` inside
//! `/de/about`. Files are processed by depth first, so containers declared by
//! their own files exist before their children are reconciled. Among files of
//! equal depth, an explicit custom order comes first, then a type priority,
//! then the case-insensitive file name.

use std::cmp::Ordering;

use crate::path::ContentPath;

/// A per-file node source, addressed by its file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
	/// File name inside the content folder.
	pub file_name: String,
	/// Path of the container the node lives in.
	pub container: ContentPath,
	/// Identifier of the node inside the container.
	pub id: String,
	/// Declared `@type`, once the file has been read.
	pub type_name: Option<String>,
}

impl SourceFile {
	/// Splits a file name into container path and leaf id.
	///
	/// Returns `None` when the name has no usable stem.
	///
	/// # Example
	///
	/// ```
	/// # use canopy_core::ordering::SourceFile;
	/// let source = SourceFile::parse("de.about.team.json").unwrap();
	/// assert_eq!(source.container.as_str(), "/de/about");
	/// assert_eq!(source.id, "team");
	/// ```
	pub fn parse(file_name: &str) -> Option<Self> {
		let stem = match file_name.rsplit_once('.') {
			Some((stem, _)) if !stem.is_empty() => stem,
			Some(_) => return None,
			None => file_name,
		};
		let mut segments: Vec<&str> = stem.split('.').collect();
		let id = segments.pop().filter(|id| !id.is_empty())?;
		if segments.iter().any(|s| s.is_empty()) {
			return None;
		}
		Some(Self {
			file_name: file_name.to_string(),
			container: ContentPath::from_segments(segments),
			id: id.to_string(),
			type_name: None,
		})
	}

	pub fn with_type(mut self, type_name: Option<String>) -> Self {
		self.type_name = type_name;
		self
	}

	/// Path of the declared node.
	pub fn path(&self) -> ContentPath {
		self.container.join(&self.id)
	}

	/// Number of dotted segments, the leaf included.
	pub fn depth(&self) -> usize {
		self.container.depth() + 1
	}

	/// File name without its extension.
	pub fn stem(&self) -> &str {
		self.file_name
			.rsplit_once('.')
			.map_or(self.file_name.as_str(), |(stem, _)| stem)
	}

	pub fn ordering_key(&self, custom_order: &[String], types_order: &[String]) -> OrderingKey {
		let custom = custom_order
			.iter()
			.position(|name| *name == self.file_name || name == self.stem())
			.unwrap_or(usize::MAX);
		let type_priority = self
			.type_name
			.as_deref()
			.and_then(|t| types_order.iter().position(|name| name == t))
			.unwrap_or(usize::MAX);
		OrderingKey {
			depth: self.depth(),
			custom,
			type_priority,
			name: self.file_name.to_lowercase(),
		}
	}
}

/// Sort key of a [`SourceFile`]. Fields compare in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct OrderingKey {
	pub depth: usize,
	/// Position in the custom order, `usize::MAX` when absent.
	pub custom: usize,
	/// Position of the declared type in the type order, `usize::MAX` when absent.
	pub type_priority: usize,
	pub name: String,
}

/// Sorts sources into processing order.
///
/// Equal keys keep their relative order, and the file name breaks the
/// remaining ties so the result never depends on directory enumeration.
pub fn sort_sources(sources: &mut [SourceFile], custom_order: &[String], types_order: &[String]) {
	sources.sort_by(|a, b| compare(a, b, custom_order, types_order));
}

fn compare(a: &SourceFile, b: &SourceFile, custom_order: &[String], types_order: &[String]) -> Ordering {
	a.ordering_key(custom_order, types_order)
		.cmp(&b.ordering_key(custom_order, types_order))
		.then_with(|| a.file_name.cmp(&b.file_name))
}
