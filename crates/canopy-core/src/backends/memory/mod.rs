//! In-memory reference site.
//!
//! [`MemorySite`] implements every collaborator port with plain maps. It is
//! the backend of the command-line preview and of the test suite, and models
//! the behaviour the engine relies on:
//!
//! - a type registry with global addability, containment and constraints,
//! - a three-state publication workflow (`private`, `pending`, `published`),
//! - a title-normalizing name chooser with `-1`, `-2` collision suffixes,
//! - a UID index and resolve-by-id links inside blocks,
//! - translation groups, image scales and an event log.
//!
//! # Example
//!
//! ```
//! use canopy_core::backends::memory::MemorySite;
//! use canopy_core::path::ContentPath;
//! use canopy_core::repository::{ContentObject, ContentRepository};
//!
//! let mut site = MemorySite::new();
//! site.seed(&ContentPath::root(), "Document", "about", "About").unwrap();
//! let about = site.get(&ContentPath::new("/about")).unwrap();
//! assert_eq!(about.title(), Some("About"));
//! ```

mod links;
mod object;
mod scales;
mod types;

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value, json};
use uuid::Uuid;

pub use self::links::{LINK_KEYS, RESOLVEUID_PREFIX};
pub use self::object::MemoryObject;
pub use self::scales::{ALLOWED_SIZES, ORIGINAL_SCALE, Scale};
pub use self::types::{SITE_ROOT_TYPE, TypeCapabilities, TypeInfo, TypeRegistry};

use crate::config::parse_watermark;
use crate::error::{RepositoryError, RepositoryResult};
use crate::path::ContentPath;
use crate::repository::{
	ContentObject, ContentRepository, DeserializeOptions, DeserializeReport, FieldDeserializer,
	FieldSerializer, LanguagePolicy, RepositoryCapabilities, ScaleGenerator, SiteRootValue,
	TranslationManager,
};

/// Default absolute URL of the site root.
pub const DEFAULT_PORTAL_URL: &str = "http://localhost:8080/Plone";

/// Workflow states of the publication workflow.
pub const WORKFLOW_STATES: &[&str] = &["private", "pending", "published"];

/// Initial state of workflowed objects.
pub const INITIAL_STATE: &str = "private";

static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Something the site did, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SiteEvent {
	Created { path: ContentPath },
	Added { path: ContentPath },
	Modified { path: ContentPath, fields: Vec<String> },
	Transitioned { path: ContentPath, state: String },
	Reindexed { path: ContentPath, indexes: Vec<String> },
	TranslationRegistered { canonical: ContentPath, language: String, translation: ContentPath },
	TranslationRemoved { canonical: ContentPath, language: String },
}

/// A complete site held in memory.
#[derive(Debug, Clone)]
pub struct MemorySite {
	objects: BTreeMap<ContentPath, MemoryObject>,
	uids: HashMap<String, ContentPath>,
	types: TypeRegistry,
	language_policy: LanguagePolicy,
	capabilities: RepositoryCapabilities,
	/// Translation group per UID.
	groups: HashMap<String, String>,
	site_properties: BTreeMap<String, SiteRootValue>,
	scales: BTreeMap<(ContentPath, String), Vec<Scale>>,
	events: Vec<SiteEvent>,
	portal_url: String,
	clock: fn() -> DateTime<Utc>,
}

impl MemorySite {
	/// A site with the standard types, a single language and object-valued site root blocks.
	pub fn new() -> Self {
		Self::with_types(TypeRegistry::standard())
	}

	pub fn with_types(types: TypeRegistry) -> Self {
		let clock: fn() -> DateTime<Utc> = Utc::now;
		let capabilities = types
			.get(SITE_ROOT_TYPE)
			.map(|info| info.capabilities)
			.unwrap_or_default();
		let mut root = MemoryObject::new(ContentPath::root(), SITE_ROOT_TYPE, capabilities, clock());
		root.title = Some("Site".to_string());
		root.uid = Some(new_uid());

		let mut site = Self {
			objects: BTreeMap::new(),
			uids: HashMap::new(),
			types,
			language_policy: LanguagePolicy::default(),
			capabilities: RepositoryCapabilities {
				site_root_blocks_as_object: true,
			},
			groups: HashMap::new(),
			site_properties: BTreeMap::new(),
			scales: BTreeMap::new(),
			events: Vec::new(),
			portal_url: DEFAULT_PORTAL_URL.to_string(),
			clock,
		};
		site.store(root);
		site
	}

	/// Configures supported languages. A multilingual site also links translations.
	pub fn with_languages(mut self, multilingual: bool, languages: &[&str]) -> Self {
		self.language_policy = LanguagePolicy {
			multilingual,
			supported: languages.iter().map(|l| l.to_string()).collect(),
		};
		self
	}

	pub fn with_capabilities(mut self, capabilities: RepositoryCapabilities) -> Self {
		self.capabilities = capabilities;
		self
	}

	pub fn with_portal_url(mut self, url: impl Into<String>) -> Self {
		self.portal_url = url.into().trim_end_matches('/').to_string();
		self
	}

	/// Replaces the clock used for creation and modification dates.
	pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
		self.clock = clock;
		self
	}

	pub fn portal_url(&self) -> &str {
		&self.portal_url
	}

	pub fn types(&self) -> &TypeRegistry {
		&self.types
	}

	pub fn types_mut(&mut self) -> &mut TypeRegistry {
		&mut self.types
	}

	pub fn events(&self) -> &[SiteEvent] {
		&self.events
	}

	/// Number of stored objects, the root included.
	pub fn len(&self) -> usize {
		self.objects.len()
	}

	pub fn is_empty(&self) -> bool {
		self.objects.is_empty()
	}

	/// Ids of the children of `path`, in insertion order.
	pub fn children(&self, path: &ContentPath) -> Vec<String> {
		self.objects
			.get(path)
			.map(|o| o.children.clone())
			.unwrap_or_default()
	}

	pub fn default_page(&self, path: &ContentPath) -> Option<String> {
		self.objects.get(path).and_then(|o| o.default_page.clone())
	}

	pub fn find_by_uid(&self, uid: &str) -> Option<ContentPath> {
		self.uids.get(uid).cloned()
	}

	pub fn is_globally_allowed(&self, type_name: &str) -> bool {
		self.types.get(type_name).is_some_and(|t| t.global_allow)
	}

	/// Names of the stored scales of an image field.
	pub fn scales(&self, path: &ContentPath, field: &str) -> Vec<String> {
		self.scales
			.get(&(path.clone(), field.to_string()))
			.map(|s| s.iter().map(|scale| scale.name.clone()).collect())
			.unwrap_or_default()
	}

	pub fn scale(&self, path: &ContentPath, field: &str, name: &str) -> Option<&Scale> {
		self.scales
			.get(&(path.clone(), field.to_string()))
			.and_then(|s| s.iter().find(|scale| scale.name == name))
	}

	pub fn site_property(&self, name: &str) -> Option<&SiteRootValue> {
		self.site_properties.get(name)
	}

	/// Creates and attaches an object directly, bypassing the engine.
	pub fn seed(
		&mut self,
		container: &ContentPath,
		type_name: &str,
		id: &str,
		title: &str,
	) -> RepositoryResult<MemoryObject> {
		let object = self.create(container, type_name, Some(id), Some(title))?;
		self.add(container, object, false)
	}

	/// Changes a stored object out of band and bumps its modification date.
	pub fn edit<F>(&mut self, path: &ContentPath, f: F) -> RepositoryResult<()>
	where
		F: FnOnce(&mut MemoryObject),
	{
		let now = (self.clock)();
		let object = self
			.objects
			.get_mut(path)
			.ok_or_else(|| RepositoryError::NotFound(path.to_string()))?;
		f(object);
		object.modified = Some(now);
		let object = object.clone();
		self.index(&object);
		Ok(())
	}

	/// Overrides the modification date of a stored object.
	pub fn touch(&mut self, path: &ContentPath, when: DateTime<Utc>) -> RepositoryResult<()> {
		let object = self
			.objects
			.get_mut(path)
			.ok_or_else(|| RepositoryError::NotFound(path.to_string()))?;
		object.modified = Some(when);
		Ok(())
	}

	/// Removes an object and everything below it.
	pub fn delete(&mut self, path: &ContentPath) -> RepositoryResult<()> {
		let parent = path
			.parent()
			.ok_or_else(|| RepositoryError::Validation {
				field: "path".to_string(),
				message: "the site root cannot be deleted".to_string(),
			})?;
		if !self.objects.contains_key(path) {
			return Err(RepositoryError::NotFound(path.to_string()));
		}
		let doomed: Vec<ContentPath> = self
			.objects
			.keys()
			.filter(|p| *p == path || p.as_str().starts_with(&format!("{path}/")))
			.cloned()
			.collect();
		for p in doomed {
			if let Some(object) = self.objects.remove(&p)
				&& let Some(uid) = object.uid
			{
				self.uids.remove(&uid);
				self.groups.remove(&uid);
			}
			self.scales.retain(|(scaled, _), _| *scaled != p);
		}
		if let Some(parent) = self.objects.get_mut(&parent) {
			let leaf = path.leaf().unwrap_or_default();
			parent.children.retain(|c| c != leaf);
			if parent.default_page.as_deref() == Some(leaf) {
				parent.default_page = None;
			}
		}
		Ok(())
	}

	/// The whole tree as nested JSON, children in insertion order.
	pub fn dump(&self) -> Value {
		self.dump_path(&ContentPath::root())
	}

	fn dump_path(&self, path: &ContentPath) -> Value {
		let Some(object) = self.objects.get(path) else {
			return Value::Null;
		};
		let mut entry = Map::new();
		entry.insert("@id".to_string(), json!(self.absolute_url(path)));
		entry.insert("@type".to_string(), json!(object.type_name));
		entry.insert("id".to_string(), json!(object.id));
		entry.insert("UID".to_string(), json!(object.uid));
		entry.insert("title".to_string(), json!(object.title));
		entry.insert("language".to_string(), json!(object.language));
		entry.insert("review_state".to_string(), json!(object.review_state));
		if let Some(blobs) = (!object.blobs.is_empty()).then(|| {
			object
				.blobs
				.iter()
				.map(|(field, blob)| (field.clone(), json!({"content_type": blob.content_type, "size": blob.size()})))
				.collect::<Map<String, Value>>()
		}) {
			entry.insert("blobs".to_string(), Value::Object(blobs));
		}
		if let Some(page) = &object.default_page {
			entry.insert("default_page".to_string(), json!(page));
		}
		let items: Vec<Value> = object
			.children
			.iter()
			.map(|id| self.dump_path(&path.join(id)))
			.collect();
		if !items.is_empty() {
			entry.insert("items".to_string(), Value::Array(items));
		}
		Value::Object(entry)
	}

	fn absolute_url(&self, path: &ContentPath) -> String {
		if path.is_root() {
			self.portal_url.clone()
		} else {
			format!("{}{}", self.portal_url, path)
		}
	}

	fn store(&mut self, object: MemoryObject) {
		self.index(&object);
		self.objects.insert(object.path.clone(), object);
	}

	/// Points the UID index at `object`, dropping stale entries for its path.
	fn index(&mut self, object: &MemoryObject) {
		self.uids.retain(|_, path| *path != object.path);
		if let Some(uid) = &object.uid {
			self.uids.insert(uid.clone(), object.path.clone());
		}
	}

	fn check_addable(&self, container: &MemoryObject, type_name: &str) -> RepositoryResult<()> {
		let not_addable = || RepositoryError::NotAddable {
			type_name: type_name.to_string(),
			container: container.path.to_string(),
		};
		let info = self
			.types
			.get(type_name)
			.ok_or_else(|| RepositoryError::UnknownType(type_name.to_string()))?;
		let container_info = self
			.types
			.get(&container.type_name)
			.ok_or_else(|| RepositoryError::UnknownType(container.type_name.clone()))?;

		if !container_info.folderish {
			return Err(not_addable());
		}
		if container.constrain_types
			&& let Some(allowed) = &container.locally_allowed_types
		{
			return if allowed.iter().any(|t| t == type_name) {
				Ok(())
			} else {
				Err(not_addable())
			};
		}
		if let Some(allowed) = &container_info.allowed_types {
			return if allowed.iter().any(|t| t == type_name) {
				Ok(())
			} else {
				Err(not_addable())
			};
		}
		if info.global_allow {
			Ok(())
		} else {
			Err(not_addable())
		}
	}

	/// Name chooser: normalized title, then `-1`, `-2` until free.
	fn free_name(&self, container: &ContentPath, base: &str) -> String {
		let mut name = base.to_string();
		let mut counter = 0;
		while self.objects.contains_key(&container.join(&name)) {
			counter += 1;
			name = format!("{base}-{counter}");
		}
		name
	}

	fn group_of(&self, object: &MemoryObject) -> Option<&String> {
		object.uid.as_ref().and_then(|uid| self.groups.get(uid))
	}

	fn persist_field<F>(&mut self, path: &ContentPath, f: F)
	where
		F: FnOnce(&mut MemoryObject),
	{
		if let Some(stored) = self.objects.get_mut(path) {
			f(stored);
		}
	}
}

impl Default for MemorySite {
	fn default() -> Self {
		Self::new()
	}
}

/// Normalizes a title into an id: lowercase ASCII alphanumerics joined by dashes.
pub fn normalize_name(title: &str) -> String {
	let lowered = title.trim().to_lowercase();
	NON_ALNUM
		.replace_all(&lowered, "-")
		.trim_matches('-')
		.to_string()
}

fn new_uid() -> String {
	Uuid::new_v4().simple().to_string()
}

fn string_field(field: &str, value: &Value) -> RepositoryResult<Option<String>> {
	match value {
		Value::Null => Ok(None),
		Value::String(s) => Ok(Some(s.clone())),
		other => Err(RepositoryError::Validation {
			field: field.to_string(),
			message: format!("expected a string, got {other}"),
		}),
	}
}

fn date_field(field: &str, value: &Value) -> RepositoryResult<Option<DateTime<Utc>>> {
	match string_field(field, value)? {
		None => Ok(None),
		Some(s) if s.is_empty() => Ok(None),
		Some(s) => parse_watermark(&s)
			.map(Some)
			.ok_or_else(|| RepositoryError::Validation {
				field: field.to_string(),
				message: format!("'{s}' is not a date"),
			}),
	}
}

fn object_field(field: &str, value: &Value) -> RepositoryResult<Value> {
	match value {
		Value::Object(_) => Ok(value.clone()),
		other => Err(RepositoryError::Validation {
			field: field.to_string(),
			message: format!("expected an object, got {other}"),
		}),
	}
}

fn update<T: PartialEq>(slot: &mut T, value: T, field: &str, modified: &mut Vec<String>) {
	if *slot != value {
		*slot = value;
		modified.push(field.to_string());
	}
}

impl ContentRepository for MemorySite {
	type Object = MemoryObject;

	fn get(&self, path: &ContentPath) -> Option<MemoryObject> {
		self.objects.get(path).cloned()
	}

	fn create(
		&mut self,
		container: &ContentPath,
		type_name: &str,
		id: Option<&str>,
		title: Option<&str>,
	) -> RepositoryResult<MemoryObject> {
		let parent = self
			.objects
			.get(container)
			.ok_or_else(|| RepositoryError::NotFound(container.to_string()))?;
		self.check_addable(parent, type_name)?;
		let capabilities = self
			.types
			.get(type_name)
			.map(|info| info.capabilities)
			.unwrap_or_default();

		let mut object = MemoryObject::new(
			container.join(id.unwrap_or_default()),
			type_name,
			capabilities,
			(self.clock)(),
		);
		object.id = id.unwrap_or_default().to_string();
		object.title = title.map(str::to_string);
		object.uid = Some(new_uid());
		if capabilities.workflow {
			object.review_state = Some(INITIAL_STATE.to_string());
		}
		Ok(object)
	}

	fn add(
		&mut self,
		container: &ContentPath,
		mut object: MemoryObject,
		rename: bool,
	) -> RepositoryResult<MemoryObject> {
		if !self.objects.contains_key(container) {
			return Err(RepositoryError::NotFound(container.to_string()));
		}
		let mut id = object.id.clone();
		if id.is_empty() {
			id = self.choose_name(container, None, &object)?;
		}
		if self.objects.contains_key(&container.join(&id)) {
			if !rename {
				return Err(RepositoryError::IdTaken {
					id,
					container: container.to_string(),
				});
			}
			id = self.free_name(container, &id);
		}

		object.path = container.join(&id);
		object.id = id.clone();
		if let Some(parent) = self.objects.get_mut(container) {
			parent.children.push(id);
		}
		self.events.push(SiteEvent::Added {
			path: object.path.clone(),
		});
		self.store(object.clone());
		Ok(object)
	}

	fn choose_name(
		&self,
		container: &ContentPath,
		suggestion: Option<&str>,
		object: &MemoryObject,
	) -> RepositoryResult<String> {
		let source = match suggestion {
			Some(s) if !s.trim().is_empty() => s,
			_ => object
				.title
				.as_deref()
				.filter(|t| !t.trim().is_empty())
				.ok_or_else(|| RepositoryError::Validation {
					field: "id".to_string(),
					message: format!("cannot derive a name for a {} without a title", object.type_name),
				})?,
		};
		let mut base = normalize_name(source);
		if base.is_empty() {
			base = normalize_name(&object.type_name);
		}
		Ok(self.free_name(container, &base))
	}

	fn transition(&mut self, object: &mut MemoryObject, to_state: &str) -> RepositoryResult<()> {
		if !object.capabilities.workflow {
			return Err(RepositoryError::InvalidTransition(format!(
				"{} has no workflow",
				object.type_name
			)));
		}
		if !WORKFLOW_STATES.contains(&to_state) {
			return Err(RepositoryError::InvalidTransition(format!(
				"unknown state '{to_state}' for {}",
				object.path
			)));
		}
		object.review_state = Some(to_state.to_string());
		let state = to_state.to_string();
		self.persist_field(&object.path, |stored| stored.review_state = Some(state));
		self.events.push(SiteEvent::Transitioned {
			path: object.path.clone(),
			state: to_state.to_string(),
		});
		Ok(())
	}

	fn reindex(&mut self, object: &MemoryObject, indexes: &[&str]) -> RepositoryResult<()> {
		let stored = self
			.objects
			.get(&object.path)
			.ok_or_else(|| RepositoryError::NotFound(object.path.to_string()))?;
		let mut updated = object.clone();
		updated.children = stored.children.clone();
		updated.default_page = stored.default_page.clone();
		self.store(updated);
		self.events.push(SiteEvent::Reindexed {
			path: object.path.clone(),
			indexes: indexes.iter().map(|i| i.to_string()).collect(),
		});
		Ok(())
	}

	fn set_default_page(&mut self, container: &ContentPath, id: &str) -> RepositoryResult<()> {
		let parent = self
			.objects
			.get_mut(container)
			.ok_or_else(|| RepositoryError::NotFound(container.to_string()))?;
		parent.default_page = Some(id.to_string());
		Ok(())
	}

	fn notify_created(&mut self, object: &MemoryObject) {
		self.events.push(SiteEvent::Created {
			path: object.path.clone(),
		});
	}

	fn notify_modified(&mut self, object: &MemoryObject, fields: &[String]) {
		self.events.push(SiteEvent::Modified {
			path: object.path.clone(),
			fields: fields.to_vec(),
		});
	}

	fn set_globally_allowed(&mut self, type_name: &str, allowed: bool) -> RepositoryResult<bool> {
		let info = self
			.types
			.get_mut(type_name)
			.ok_or_else(|| RepositoryError::UnknownType(type_name.to_string()))?;
		Ok(std::mem::replace(&mut info.global_allow, allowed))
	}

	fn language_policy(&self) -> LanguagePolicy {
		self.language_policy.clone()
	}

	fn capabilities(&self) -> RepositoryCapabilities {
		self.capabilities
	}

	fn set_site_root_property(&mut self, name: &str, value: SiteRootValue) -> RepositoryResult<()> {
		let root = ContentPath::root();
		if let SiteRootValue::Object(data) = &value {
			let data = data.clone();
			match name {
				"blocks" => self.persist_field(&root, |stored| stored.blocks = Some(data)),
				"blocks_layout" => self.persist_field(&root, |stored| stored.blocks_layout = Some(data)),
				_ => self.persist_field(&root, |stored| {
					stored.fields.insert(name.to_string(), data);
				}),
			}
		}
		self.site_properties.insert(name.to_string(), value);
		Ok(())
	}
}

impl FieldDeserializer for MemorySite {
	fn can_deserialize(&self, object: &MemoryObject) -> bool {
		object.capabilities.deserializable
	}

	fn deserialize(
		&mut self,
		object: &mut MemoryObject,
		_container: &ContentPath,
		data: &Map<String, Value>,
		options: DeserializeOptions,
	) -> RepositoryResult<DeserializeReport> {
		if !object.capabilities.deserializable {
			return Err(RepositoryError::Unsupported(object.type_name.clone()));
		}

		let mut modified = Vec::new();
		for (key, value) in data {
			match key.as_str() {
				"title" => update(&mut object.title, string_field(key, value)?, key, &mut modified),
				"description" => update(
					&mut object.description,
					string_field(key, value)?,
					key,
					&mut modified,
				),
				"language" => update(
					&mut object.language,
					string_field(key, value)?,
					key,
					&mut modified,
				),
				"effective" => update(
					&mut object.effective,
					date_field(key, value)?,
					key,
					&mut modified,
				),
				"blocks" if object.capabilities.blocks => {
					let mut blocks = object_field(key, value)?;
					let uids: HashMap<ContentPath, String> = self
						.uids
						.iter()
						.map(|(uid, path)| (path.clone(), uid.clone()))
						.collect();
					links::resolve_links(&mut blocks, &self.portal_url, |path| uids.get(path).cloned());
					update(&mut object.blocks, Some(blocks), key, &mut modified);
				}
				"blocks_layout" if object.capabilities.blocks => update(
					&mut object.blocks_layout,
					Some(object_field(key, value)?),
					key,
					&mut modified,
				),
				"@type" | "id" | "UID" | "review_state" | "opts" | "items" => {}
				_ => {
					if object.fields.get(key) != Some(value) {
						object.fields.insert(key.clone(), value.clone());
						modified.push(key.clone());
					}
				}
			}
		}

		if options.validate_all
			&& object.capabilities.required_title
			&& object.title.as_deref().is_none_or(|t| t.trim().is_empty())
		{
			return Err(RepositoryError::Validation {
				field: "title".to_string(),
				message: "Required input is missing.".to_string(),
			});
		}

		if !modified.is_empty() {
			object.modified = Some((self.clock)());
		}
		Ok(DeserializeReport {
			notified_create: false,
			modified_fields: modified,
		})
	}
}

impl FieldSerializer for MemorySite {
	fn serialize_field(&self, object: &MemoryObject, field: &str) -> RepositoryResult<Option<Value>> {
		let value = match field {
			"title" => object.title.clone().map(Value::String),
			"description" => object.description.clone().map(Value::String),
			"language" => object.language.clone().map(Value::String),
			"effective" => object.effective.map(|d| Value::String(d.to_rfc3339())),
			"blocks" => object.blocks.clone().map(|mut blocks| {
				links::expand_links(&mut blocks, &self.portal_url, |uid| self.uids.get(uid).cloned());
				blocks
			}),
			"blocks_layout" => object.blocks_layout.clone(),
			other => object.fields.get(other).cloned(),
		};
		Ok(value)
	}
}

impl TranslationManager for MemorySite {
	fn translations_enabled(&self) -> bool {
		self.language_policy.multilingual
	}

	fn translation(&self, canonical: &MemoryObject, language: &str) -> Option<MemoryObject> {
		let group = self.group_of(canonical)?;
		self.groups
			.iter()
			.filter(|(_, g)| *g == group)
			.filter_map(|(uid, _)| self.uids.get(uid))
			.filter_map(|path| self.objects.get(path))
			.find(|o| o.language.as_deref() == Some(language))
			.cloned()
	}

	fn register_translation(
		&mut self,
		canonical: &MemoryObject,
		language: &str,
		translation: &MemoryObject,
	) -> RepositoryResult<()> {
		let canonical_uid = canonical
			.uid
			.clone()
			.ok_or_else(|| RepositoryError::Translation(format!("{} has no UID", canonical.path)))?;
		let translation_uid = translation
			.uid
			.clone()
			.ok_or_else(|| RepositoryError::Translation(format!("{} has no UID", translation.path)))?;
		if self.translation(canonical, language).is_some_and(|t| t.uid != translation.uid) {
			return Err(RepositoryError::Translation(format!(
				"{} already has a {language} translation",
				canonical.path
			)));
		}
		let group = self
			.groups
			.entry(canonical_uid.clone())
			.or_insert(canonical_uid)
			.clone();
		self.groups.insert(translation_uid, group);
		self.events.push(SiteEvent::TranslationRegistered {
			canonical: canonical.path.clone(),
			language: language.to_string(),
			translation: translation.path.clone(),
		});
		Ok(())
	}

	fn remove_translation(&mut self, canonical: &MemoryObject, language: &str) -> RepositoryResult<()> {
		let existing = self.translation(canonical, language).ok_or_else(|| {
			RepositoryError::Translation(format!("{} has no {language} translation", canonical.path))
		})?;
		if let Some(uid) = &existing.uid {
			self.groups.remove(uid);
		}
		self.events.push(SiteEvent::TranslationRemoved {
			canonical: canonical.path.clone(),
			language: language.to_string(),
		});
		Ok(())
	}
}

impl ScaleGenerator for MemorySite {
	fn generate_scales(&mut self, object: &MemoryObject, field: &str) -> RepositoryResult<usize> {
		let blob = object.blobs.get(field).ok_or_else(|| RepositoryError::Scale {
			field: field.to_string(),
			message: format!("{} has no data in {field}", object.path),
		})?;
		let rendered = scales::render_scales(field, &blob.data)?;
		let count = rendered.len();
		self.scales
			.insert((object.path.clone(), field.to_string()), rendered);
		Ok(count)
	}
}
