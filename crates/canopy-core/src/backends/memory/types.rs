//! Content type registry of the in-memory site.

use std::collections::BTreeMap;

/// Name of the site root type.
pub const SITE_ROOT_TYPE: &str = "Plone Site";

/// Behaviour of a content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
	pub name: String,
	/// Addable anywhere not otherwise restricted.
	pub global_allow: bool,
	/// Can contain other objects.
	pub folderish: bool,
	/// Types addable inside, overriding `global_allow` of the children.
	pub allowed_types: Option<Vec<String>>,
	pub capabilities: TypeCapabilities,
}

/// Per-type feature switches, copied onto each object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeCapabilities {
	pub blocks: bool,
	pub names_from_title: bool,
	pub workflow: bool,
	pub legacy_image: bool,
	pub legacy_file: bool,
	pub named_blobs: bool,
	pub constrainable: bool,
	pub required_title: bool,
	pub deserializable: bool,
}

impl TypeInfo {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			global_allow: true,
			folderish: false,
			allowed_types: None,
			capabilities: TypeCapabilities {
				deserializable: true,
				..TypeCapabilities::default()
			},
		}
	}

	pub fn global_allow(mut self, allow: bool) -> Self {
		self.global_allow = allow;
		self
	}

	pub fn folderish(mut self) -> Self {
		self.folderish = true;
		self.capabilities.constrainable = true;
		self
	}

	pub fn allowed_types(mut self, types: &[&str]) -> Self {
		self.allowed_types = Some(types.iter().map(|t| t.to_string()).collect());
		self
	}

	pub fn with_blocks(mut self) -> Self {
		self.capabilities.blocks = true;
		self
	}

	pub fn names_from_title(mut self) -> Self {
		self.capabilities.names_from_title = true;
		self
	}

	pub fn with_workflow(mut self) -> Self {
		self.capabilities.workflow = true;
		self
	}

	pub fn legacy_image(mut self) -> Self {
		self.capabilities.legacy_image = true;
		self.capabilities.named_blobs = true;
		self
	}

	pub fn legacy_file(mut self) -> Self {
		self.capabilities.legacy_file = true;
		self.capabilities.named_blobs = true;
		self
	}

	pub fn required_title(mut self) -> Self {
		self.capabilities.required_title = true;
		self
	}

	/// Marks the type as having no field deserializer.
	pub fn without_deserializer(mut self) -> Self {
		self.capabilities.deserializable = false;
		self
	}
}

/// Registered content types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRegistry {
	types: BTreeMap<String, TypeInfo>,
}

impl TypeRegistry {
	/// An empty registry.
	pub fn empty() -> Self {
		Self {
			types: BTreeMap::new(),
		}
	}

	/// The classic site types.
	///
	/// `Event` is not globally addable, so importing events needs it
	/// temporarily enabled.
	pub fn standard() -> Self {
		let mut registry = Self::empty();
		registry.register(
			TypeInfo::new(SITE_ROOT_TYPE)
				.global_allow(false)
				.folderish()
				.with_blocks(),
		);
		registry.register(
			TypeInfo::new("Document")
				.folderish()
				.with_blocks()
				.names_from_title()
				.with_workflow()
				.legacy_image()
				.required_title(),
		);
		registry.register(
			TypeInfo::new("Folder")
				.folderish()
				.names_from_title()
				.with_workflow()
				.required_title(),
		);
		registry.register(
			TypeInfo::new("News Item")
				.with_blocks()
				.names_from_title()
				.with_workflow()
				.legacy_image()
				.required_title(),
		);
		registry.register(
			TypeInfo::new("Event")
				.global_allow(false)
				.with_blocks()
				.names_from_title()
				.with_workflow()
				.required_title(),
		);
		registry.register(
			TypeInfo::new("Link")
				.names_from_title()
				.with_workflow()
				.required_title(),
		);
		registry.register(TypeInfo::new("Image").legacy_image());
		registry.register(TypeInfo::new("File").legacy_file());
		registry
	}

	pub fn register(&mut self, info: TypeInfo) {
		self.types.insert(info.name.clone(), info);
	}

	pub fn get(&self, name: &str) -> Option<&TypeInfo> {
		self.types.get(name)
	}

	pub fn get_mut(&mut self, name: &str) -> Option<&mut TypeInfo> {
		self.types.get_mut(name)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.types.keys().map(String::as_str)
	}
}

impl Default for TypeRegistry {
	fn default() -> Self {
		Self::standard()
	}
}
