//! Content objects of the in-memory site.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::types::TypeCapabilities;
use crate::error::{RepositoryError, RepositoryResult};
use crate::path::ContentPath;
use crate::repository::{
	ContentObject, FILE_FIELD, HasLegacyAssetFields, HasNamedBlobFields, HasStructuredBody,
	HasTypeConstraints, IMAGE_FIELD, NamedBlob,
};

/// A stored object, or a working copy of one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryObject {
	pub(crate) id: String,
	pub(crate) path: ContentPath,
	#[serde(rename = "@type")]
	pub(crate) type_name: String,
	#[serde(rename = "UID")]
	pub(crate) uid: Option<String>,
	pub(crate) title: Option<String>,
	pub(crate) description: Option<String>,
	pub(crate) language: Option<String>,
	pub(crate) review_state: Option<String>,
	pub(crate) created: Option<DateTime<Utc>>,
	pub(crate) modified: Option<DateTime<Utc>>,
	pub(crate) effective: Option<DateTime<Utc>>,
	pub(crate) layout: Option<String>,
	pub(crate) exclude_from_nav: bool,
	pub(crate) local_roles: BTreeMap<String, Vec<String>>,
	pub(crate) blocks: Option<Value>,
	pub(crate) blocks_layout: Option<Value>,
	pub(crate) blobs: BTreeMap<String, NamedBlob>,
	pub(crate) fields: Map<String, Value>,
	pub(crate) constrain_types: bool,
	pub(crate) locally_allowed_types: Option<Vec<String>>,
	pub(crate) immediately_addable_types: Option<Vec<String>>,
	pub(crate) default_page: Option<String>,
	pub(crate) children: Vec<String>,
	#[serde(skip)]
	pub(crate) capabilities: TypeCapabilities,
}

impl MemoryObject {
	pub(crate) fn new(
		path: ContentPath,
		type_name: &str,
		capabilities: TypeCapabilities,
		now: DateTime<Utc>,
	) -> Self {
		Self {
			id: path.leaf().unwrap_or_default().to_string(),
			path,
			type_name: type_name.to_string(),
			uid: None,
			title: None,
			description: None,
			language: None,
			review_state: None,
			created: Some(now),
			modified: Some(now),
			effective: None,
			layout: None,
			exclude_from_nav: false,
			local_roles: BTreeMap::new(),
			blocks: None,
			blocks_layout: None,
			blobs: BTreeMap::new(),
			fields: Map::new(),
			constrain_types: false,
			locally_allowed_types: None,
			immediately_addable_types: None,
			default_page: None,
			children: Vec::new(),
			capabilities,
		}
	}

	pub fn description(&self) -> Option<&str> {
		self.description.as_deref()
	}

	pub fn set_title(&mut self, title: impl Into<String>) {
		self.title = Some(title.into());
	}

	pub fn set_description(&mut self, description: impl Into<String>) {
		self.description = Some(description.into());
	}

	pub fn set_language(&mut self, language: impl Into<String>) {
		self.language = Some(language.into());
	}

	pub fn created(&self) -> Option<DateTime<Utc>> {
		self.created
	}

	pub fn layout(&self) -> Option<&str> {
		self.layout.as_deref()
	}

	pub fn exclude_from_nav(&self) -> bool {
		self.exclude_from_nav
	}

	pub fn local_roles(&self) -> &BTreeMap<String, Vec<String>> {
		&self.local_roles
	}

	pub fn blocks(&self) -> Option<&Value> {
		self.blocks.as_ref()
	}

	pub fn blocks_layout(&self) -> Option<&Value> {
		self.blocks_layout.as_ref()
	}

	pub fn blob(&self, field: &str) -> Option<&NamedBlob> {
		self.blobs.get(field)
	}

	/// A deserialized field without a dedicated member.
	pub fn field(&self, name: &str) -> Option<&Value> {
		self.fields.get(name)
	}

	pub fn constrains_types(&self) -> bool {
		self.constrain_types
	}

	pub fn locally_allowed_types(&self) -> Option<&[String]> {
		self.locally_allowed_types.as_deref()
	}

	pub fn immediately_addable_types(&self) -> Option<&[String]> {
		self.immediately_addable_types.as_deref()
	}

	pub fn children(&self) -> &[String] {
		&self.children
	}
}

impl ContentObject for MemoryObject {
	fn id(&self) -> &str {
		&self.id
	}

	fn path(&self) -> &ContentPath {
		&self.path
	}

	fn type_name(&self) -> &str {
		&self.type_name
	}

	fn uid(&self) -> Option<&str> {
		self.uid.as_deref()
	}

	fn set_uid(&mut self, uid: &str) {
		self.uid = Some(uid.to_string());
	}

	fn title(&self) -> Option<&str> {
		self.title.as_deref()
	}

	fn language(&self) -> Option<&str> {
		self.language.as_deref().filter(|l| !l.is_empty())
	}

	fn review_state(&self) -> Option<&str> {
		self.review_state.as_deref()
	}

	fn modified(&self) -> Option<DateTime<Utc>> {
		self.modified
	}

	fn effective(&self) -> Option<DateTime<Utc>> {
		self.effective
	}

	fn set_effective(&mut self, when: DateTime<Utc>) {
		self.effective = Some(when);
	}

	fn set_layout(&mut self, layout: &str) {
		self.layout = Some(layout.to_string());
	}

	fn set_exclude_from_nav(&mut self, exclude: bool) {
		self.exclude_from_nav = exclude;
	}

	fn grant_local_roles(&mut self, principal: &str, roles: &[String]) {
		let granted = self.local_roles.entry(principal.to_string()).or_default();
		for role in roles {
			if !granted.contains(role) {
				granted.push(role.clone());
			}
		}
	}

	fn names_from_title(&self) -> bool {
		self.capabilities.names_from_title
	}

	fn structured_body(&mut self) -> Option<&mut dyn HasStructuredBody> {
		if self.capabilities.blocks {
			Some(self)
		} else {
			None
		}
	}

	fn legacy_asset_fields(&mut self) -> Option<&mut dyn HasLegacyAssetFields> {
		if self.capabilities.legacy_image || self.capabilities.legacy_file {
			Some(self)
		} else {
			None
		}
	}

	fn named_blob_fields(&mut self) -> Option<&mut dyn HasNamedBlobFields> {
		if self.capabilities.named_blobs {
			Some(self)
		} else {
			None
		}
	}

	fn type_constraints(&mut self) -> Option<&mut dyn HasTypeConstraints> {
		if self.capabilities.constrainable {
			Some(self)
		} else {
			None
		}
	}
}

impl HasStructuredBody for MemoryObject {
	fn blocks(&self) -> Option<&Value> {
		self.blocks.as_ref()
	}

	fn blocks_layout(&self) -> Option<&Value> {
		self.blocks_layout.as_ref()
	}

	fn set_blocks(&mut self, blocks: Value) {
		self.blocks = Some(blocks);
	}

	fn set_blocks_layout(&mut self, layout: Value) {
		self.blocks_layout = Some(layout);
	}
}

impl HasLegacyAssetFields for MemoryObject {
	fn set_image(&mut self, blob: NamedBlob) -> RepositoryResult<()> {
		if !self.capabilities.legacy_image {
			return Err(RepositoryError::Validation {
				field: IMAGE_FIELD.to_string(),
				message: format!("{} has no image field", self.type_name),
			});
		}
		self.blobs.insert(IMAGE_FIELD.to_string(), blob);
		Ok(())
	}

	fn set_file(&mut self, blob: NamedBlob) -> RepositoryResult<()> {
		if !self.capabilities.legacy_file {
			return Err(RepositoryError::Validation {
				field: FILE_FIELD.to_string(),
				message: format!("{} has no file field", self.type_name),
			});
		}
		self.blobs.insert(FILE_FIELD.to_string(), blob);
		Ok(())
	}
}

impl HasNamedBlobFields for MemoryObject {
	fn set_blob(&mut self, field: &str, blob: NamedBlob) -> RepositoryResult<()> {
		if field.is_empty() {
			return Err(RepositoryError::Validation {
				field: field.to_string(),
				message: "blob field name must not be empty".to_string(),
			});
		}
		self.blobs.insert(field.to_string(), blob);
		Ok(())
	}

	fn blob(&self, field: &str) -> Option<&NamedBlob> {
		self.blobs.get(field)
	}
}

impl HasTypeConstraints for MemoryObject {
	fn enable_constraints(&mut self) {
		self.constrain_types = true;
	}

	fn set_locally_allowed_types(&mut self, types: Vec<String>) {
		self.locally_allowed_types = Some(types);
	}

	fn set_immediately_addable_types(&mut self, types: Vec<String>) {
		self.immediately_addable_types = Some(types);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn object(capabilities: TypeCapabilities) -> MemoryObject {
		MemoryObject::new(ContentPath::new("/doc"), "Document", capabilities, Utc::now())
	}

	#[rstest]
	fn test_local_roles_are_additive() {
		// Arrange
		let mut object = object(TypeCapabilities::default());

		// Act
		object.grant_local_roles("editors", &["Editor".to_string()]);
		object.grant_local_roles("editors", &["Reader".to_string(), "Editor".to_string()]);

		// Assert
		assert_eq!(
			object.local_roles()["editors"],
			vec!["Editor".to_string(), "Reader".to_string()]
		);
	}

	#[rstest]
	fn test_capability_probes_follow_type() {
		let mut plain = object(TypeCapabilities::default());
		assert!(plain.structured_body().is_none());
		assert!(plain.named_blob_fields().is_none());

		let mut rich = object(TypeCapabilities {
			blocks: true,
			named_blobs: true,
			..TypeCapabilities::default()
		});
		assert!(rich.structured_body().is_some());
		assert!(rich.named_blob_fields().is_some());
		assert!(rich.legacy_asset_fields().is_none());
	}

	#[rstest]
	fn test_legacy_file_rejected_on_image_type() {
		let mut image = object(TypeCapabilities {
			legacy_image: true,
			named_blobs: true,
			..TypeCapabilities::default()
		});
		let result = image.set_file(NamedBlob::new(vec![1], "text/plain"));
		assert!(matches!(result, Err(RepositoryError::Validation { .. })));
	}

	#[rstest]
	fn test_empty_language_counts_as_unset() {
		let mut object = object(TypeCapabilities::default());
		object.set_language("");
		assert_eq!(ContentObject::language(&object), None);
	}
}
