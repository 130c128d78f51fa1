//! Declared content nodes.
//!
//! A [`DeclaredNode`] is one entry of the input structure: the desired state of
//! a single content object plus its ordered children. The JSON shape follows
//! the REST API content format:
//!
//! ```json
//! {
//!   "@type": "Document",
//!   "id": "about",
//!   "title": "About us",
//!   "opts": {"exclude_from_nav": true},
//!   "set_dummy_image": ["preview_image"],
//!   "items": []
//! }
//! ```
//!
//! Keys without a dedicated member (`blocks`, `blocks_layout`, `effective`,
//! `text`, ...) are kept in [`DeclaredNode::fields`] and handed to the
//! deserializer untouched.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CanopyError, CanopyResult};

/// Desired state of one content object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeclaredNode {
	/// Content type to create.
	#[serde(
		rename = "@type",
		alias = "type",
		default,
		skip_serializing_if = "Option::is_none"
	)]
	pub type_name: Option<String>,

	/// Explicit identifier inside the container. Derived from the title when absent.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,

	/// Object title.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,

	/// Object description.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,

	/// Language code. Defaulted from site policy when absent.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub language: Option<String>,

	/// Target workflow state. Defaulted by the runner when absent.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub review_state: Option<String>,

	/// Stable identity to pin on the object.
	#[serde(rename = "UID", default, skip_serializing_if = "Option::is_none")]
	pub uid: Option<String>,

	/// Structural options applied after the fields.
	#[serde(default, skip_serializing_if = "NodeOptions::is_empty")]
	pub opts: NodeOptions,

	/// Generated placeholder image(s).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub set_dummy_image: Option<AssetDirective>,

	/// Image(s) read from the image folder.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub set_local_image: Option<AssetDirective>,

	/// Generated placeholder file(s).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub set_dummy_file: Option<AssetDirective>,

	/// File(s) read from the image folder.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub set_local_file: Option<AssetDirective>,

	/// Ordered children, created inside this node's object.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub items: Vec<DeclaredNode>,

	/// Every other declared field.
	#[serde(flatten)]
	pub fields: Map<String, Value>,
}

impl DeclaredNode {
	/// Creates a node of the given type.
	pub fn new(type_name: impl Into<String>) -> Self {
		Self {
			type_name: Some(type_name.into()),
			..Self::default()
		}
	}

	/// Sets the explicit identifier.
	pub fn with_id(mut self, id: impl Into<String>) -> Self {
		self.id = Some(id.into());
		self
	}

	/// Sets the title.
	pub fn with_title(mut self, title: impl Into<String>) -> Self {
		self.title = Some(title.into());
		self
	}

	/// Sets an additional field.
	pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
		self.fields.insert(name.into(), value);
		self
	}

	/// Appends a child node.
	pub fn with_item(mut self, item: DeclaredNode) -> Self {
		self.items.push(item);
		self
	}

	/// The declared identifier, unless it is missing or blank.
	pub fn declared_id(&self) -> Option<&str> {
		self.id.as_deref().filter(|id| !id.trim().is_empty())
	}

	/// Returns true when a non-empty `blocks` mapping is declared.
	pub fn has_blocks(&self) -> bool {
		is_truthy(self.fields.get("blocks"))
	}

	/// Returns true when an explicit effective date is declared.
	pub fn has_effective(&self) -> bool {
		is_truthy(self.fields.get("effective"))
	}

	/// Builds the payload handed to the deserializer.
	///
	/// Structural keys consumed by the reconciler (`@type`, `id`, `UID`,
	/// `review_state`, `opts`, asset directives and `items`) are left out.
	pub fn field_payload(&self) -> Map<String, Value> {
		let mut payload = self.fields.clone();
		if let Some(title) = &self.title {
			payload.insert("title".to_string(), Value::String(title.clone()));
		}
		if let Some(description) = &self.description {
			payload.insert(
				"description".to_string(),
				Value::String(description.clone()),
			);
		}
		if let Some(language) = &self.language {
			payload.insert("language".to_string(), Value::String(language.clone()));
		}
		payload
	}
}

/// Structural options of a node (`opts`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeOptions {
	/// Make this object the default page of its container.
	#[serde(default)]
	pub default_page: bool,

	/// View (layout) name to select on the object.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub default_view: Option<String>,

	/// Hide the object from navigation.
	#[serde(default)]
	pub exclude_from_nav: bool,

	/// Local role grants, principal to roles.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub local_roles: BTreeMap<String, Vec<String>>,

	/// Types allowed inside the object once constraints are enabled.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub locally_allowed_types: Vec<String>,

	/// Types offered directly in the add menu once constraints are enabled.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub immediately_allowed_types: Vec<String>,
}

impl NodeOptions {
	/// Returns true when no option is set.
	pub fn is_empty(&self) -> bool {
		*self == Self::default()
	}
}

/// Value of an asset directive key.
///
/// The same shapes are accepted for all four keys; which shapes are valid for
/// which key is decided by the asset attacher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetDirective {
	/// Legacy switch for the conventional field.
	Enabled(bool),
	/// A single value: a field name for dummies, a file name for local assets.
	Single(String),
	/// Several field names.
	Fields(Vec<String>),
	/// Field name to file name (local) or field name to anything (dummy).
	Mapped(Map<String, Value>),
}

/// Parses a declared structure: either an array of nodes or a single node.
pub fn parse_nodes(content: &str) -> CanopyResult<Vec<DeclaredNode>> {
	let value: Value = serde_json::from_str(content)?;
	match value {
		Value::Array(items) => items
			.into_iter()
			.map(|item| serde_json::from_value(item).map_err(CanopyError::from))
			.collect(),
		Value::Object(_) => Ok(vec![serde_json::from_value(value)?]),
		other => Err(CanopyError::Json(serde::de::Error::custom(format!(
			"expected array or object, found {}",
			json_kind(&other)
		)))),
	}
}

/// Reads and parses a declared structure from a file.
pub fn load_nodes(path: &Path) -> CanopyResult<Vec<DeclaredNode>> {
	parse_nodes(&read_source(path)?)
}

/// Reads a single declared node from a file.
pub fn load_node(path: &Path) -> CanopyResult<DeclaredNode> {
	let content = read_source(path)?;
	Ok(serde_json::from_str(&content)?)
}

pub(crate) fn read_source(path: &Path) -> CanopyResult<String> {
	std::fs::read_to_string(path).map_err(|e| {
		if e.kind() == std::io::ErrorKind::NotFound {
			CanopyError::FileNotFound(path.to_path_buf())
		} else {
			CanopyError::Io(e)
		}
	})
}

/// JSON truthiness: null, false, empty strings and empty containers are false.
pub(crate) fn is_truthy(value: Option<&Value>) -> bool {
	match value {
		None | Some(Value::Null) => false,
		Some(Value::Bool(b)) => *b,
		Some(Value::String(s)) => !s.is_empty(),
		Some(Value::Array(a)) => !a.is_empty(),
		Some(Value::Object(o)) => !o.is_empty(),
		Some(Value::Number(_)) => true,
	}
}

fn json_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;
	use std::io::Write;
	use tempfile::NamedTempFile;

	#[rstest]
	fn test_parse_full_node() {
		// Arrange
		let content = r#"[{
			"@type": "Document",
			"id": "a-folder",
			"title": "A Folder",
			"UID": "1f699ffa110e45afb1ba502f75f7ec33",
			"review_state": "private",
			"opts": {"default_page": true, "local_roles": {"editors": ["Editor"]}},
			"set_dummy_image": ["image", "preview_image"],
			"set_local_file": {"file": "report.pdf"},
			"blocks": {"a": {"@type": "title"}},
			"items": [{"@type": "Document", "title": "Child"}]
		}]"#;

		// Act
		let nodes = parse_nodes(content).unwrap();

		// Assert
		assert_eq!(nodes.len(), 1);
		let node = &nodes[0];
		assert_eq!(node.type_name.as_deref(), Some("Document"));
		assert_eq!(node.id.as_deref(), Some("a-folder"));
		assert_eq!(
			node.uid.as_deref(),
			Some("1f699ffa110e45afb1ba502f75f7ec33")
		);
		assert!(node.opts.default_page);
		assert_eq!(node.opts.local_roles["editors"], vec!["Editor".to_string()]);
		assert_eq!(
			node.set_dummy_image,
			Some(AssetDirective::Fields(vec![
				"image".to_string(),
				"preview_image".to_string()
			]))
		);
		assert!(matches!(
			node.set_local_file,
			Some(AssetDirective::Mapped(_))
		));
		assert!(node.has_blocks());
		assert_eq!(node.items.len(), 1);
		assert_eq!(node.items[0].id, None);
		assert!(!node.fields.contains_key("items"));
		assert!(!node.fields.contains_key("opts"));
	}

	#[rstest]
	fn test_parse_single_object() {
		let nodes = parse_nodes(r#"{"@type": "Folder", "title": "Solo"}"#).unwrap();
		assert_eq!(nodes.len(), 1);
		assert_eq!(nodes[0].title.as_deref(), Some("Solo"));
	}

	#[rstest]
	fn test_parse_rejects_scalar() {
		let result = parse_nodes("42");
		assert!(matches!(result, Err(CanopyError::Json(_))));
	}

	#[rstest]
	#[case(json!(true), AssetDirective::Enabled(true))]
	#[case(json!("image.png"), AssetDirective::Single("image.png".to_string()))]
	#[case(json!(["a", "b"]), AssetDirective::Fields(vec!["a".to_string(), "b".to_string()]))]
	fn test_asset_directive_shapes(#[case] value: Value, #[case] expected: AssetDirective) {
		let directive: AssetDirective = serde_json::from_value(value).unwrap();
		assert_eq!(directive, expected);
	}

	#[rstest]
	fn test_field_payload_skips_structural_keys() {
		// Arrange
		let node = DeclaredNode::new("Document")
			.with_id("doc")
			.with_title("Doc")
			.with_field("effective", json!("2021-01-01T00:00:00Z"))
			.with_item(DeclaredNode::new("Document"));

		// Act
		let payload = node.field_payload();

		// Assert
		assert_eq!(payload["title"], json!("Doc"));
		assert_eq!(payload["effective"], json!("2021-01-01T00:00:00Z"));
		assert!(!payload.contains_key("id"));
		assert!(!payload.contains_key("@type"));
		assert!(!payload.contains_key("items"));
		assert!(node.has_effective());
	}

	#[rstest]
	#[case(None, None)]
	#[case(Some(""), None)]
	#[case(Some("  "), None)]
	#[case(Some("about"), Some("about"))]
	fn test_declared_id(#[case] id: Option<&str>, #[case] expected: Option<&str>) {
		let node = DeclaredNode {
			id: id.map(str::to_string),
			..DeclaredNode::default()
		};
		assert_eq!(node.declared_id(), expected);
	}

	#[rstest]
	fn test_empty_blocks_are_not_declared() {
		let node = DeclaredNode::new("Document").with_field("blocks", json!({}));
		assert!(!node.has_blocks());
	}

	#[rstest]
	fn test_load_node_from_file() {
		let mut file = NamedTempFile::with_suffix(".json").unwrap();
		writeln!(file, r#"{{"@type": "Document", "title": "From file"}}"#).unwrap();

		let node = load_node(file.path()).unwrap();
		assert_eq!(node.title.as_deref(), Some("From file"));
	}

	#[rstest]
	fn test_load_missing_file() {
		let result = load_nodes(Path::new("/nonexistent/content.json"));
		assert!(matches!(result, Err(CanopyError::FileNotFound(_))));
	}
}
