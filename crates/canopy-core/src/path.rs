//! Absolute content paths.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Absolute, slash-separated path of an object inside the repository.
///
/// The site root is `/`. Paths never carry a trailing slash and never contain
/// empty segments, so two paths naming the same object compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct ContentPath(String);

impl ContentPath {
	/// The site root path.
	pub fn root() -> Self {
		Self("/".to_string())
	}

	/// Parses a path, normalizing duplicate and trailing slashes.
	///
	/// # Example
	///
	/// ```
	/// # use canopy_core::path::ContentPath;
	/// let path = ContentPath::new("de//about/");
	/// assert_eq!(path.as_str(), "/de/about");
	/// ```
	pub fn new(path: &str) -> Self {
		Self::from_segments(path.split('/'))
	}

	/// Builds a path from its segments, dropping empty ones.
	pub fn from_segments<I, S>(segments: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut path = String::new();
		for segment in segments {
			let segment = segment.as_ref();
			if segment.is_empty() {
				continue;
			}
			path.push('/');
			path.push_str(segment);
		}
		if path.is_empty() {
			return Self::root();
		}
		Self(path)
	}

	/// Returns the path as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Returns true for the site root.
	pub fn is_root(&self) -> bool {
		self.0 == "/"
	}

	/// Iterates over the non-empty segments.
	pub fn segments(&self) -> impl Iterator<Item = &str> {
		self.0.split('/').filter(|s| !s.is_empty())
	}

	/// Number of segments below the root.
	pub fn depth(&self) -> usize {
		self.segments().count()
	}

	/// Returns the path of a child object.
	pub fn join(&self, id: &str) -> Self {
		Self::from_segments(self.segments().chain(std::iter::once(id)))
	}

	/// Returns the parent path, or `None` for the root.
	pub fn parent(&self) -> Option<Self> {
		if self.is_root() {
			return None;
		}
		let mut segments: Vec<&str> = self.segments().collect();
		segments.pop();
		Some(Self::from_segments(segments))
	}

	/// Returns the last segment, or `None` for the root.
	pub fn leaf(&self) -> Option<&str> {
		self.segments().last()
	}
}

impl Default for ContentPath {
	fn default() -> Self {
		Self::root()
	}
}

impl fmt::Display for ContentPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<String> for ContentPath {
	fn from(value: String) -> Self {
		Self::new(&value)
	}
}

impl From<&str> for ContentPath {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

impl From<ContentPath> for String {
	fn from(value: ContentPath) -> Self {
		value.0
	}
}
