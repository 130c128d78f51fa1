//! Collaborator ports.
//!
//! The engine never touches storage directly. It works on working copies of
//! content objects ([`ContentObject`]) obtained from a [`ContentRepository`]
//! and hands them back to be persisted. Field (de)serialization, translation
//! linking and scale generation are separate ports that share the
//! repository's object type; [`ContentSite`] bundles them all.
//!
//! Persistence contract: changes made to a working copy become visible to
//! later lookups once the copy is passed to [`ContentRepository::add`],
//! [`ContentRepository::transition`] or [`ContentRepository::reindex`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::RepositoryResult;
use crate::path::ContentPath;

/// Conventional image field populated by boolean and single-name directives.
pub const IMAGE_FIELD: &str = "image";

/// Conventional file field populated by boolean and single-name directives.
pub const FILE_FIELD: &str = "file";

/// Binary payload stored in a blob field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedBlob {
	/// Original file name, if any.
	pub filename: Option<String>,
	/// MIME type.
	pub content_type: String,
	/// Raw bytes.
	#[serde(skip)]
	pub data: Vec<u8>,
}

impl NamedBlob {
	pub fn new(data: Vec<u8>, content_type: impl Into<String>) -> Self {
		Self {
			filename: None,
			content_type: content_type.into(),
			data,
		}
	}

	pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
		self.filename = Some(filename.into());
		self
	}

	pub fn size(&self) -> usize {
		self.data.len()
	}
}

/// Objects carrying a block-structured body.
pub trait HasStructuredBody {
	fn blocks(&self) -> Option<&Value>;
	fn blocks_layout(&self) -> Option<&Value>;
	fn set_blocks(&mut self, blocks: Value);
	fn set_blocks_layout(&mut self, layout: Value);
}

/// Objects exposing the conventional single image and file fields.
pub trait HasLegacyAssetFields {
	fn set_image(&mut self, blob: NamedBlob) -> RepositoryResult<()>;
	fn set_file(&mut self, blob: NamedBlob) -> RepositoryResult<()>;
}

/// Objects accepting blobs on arbitrary named fields.
pub trait HasNamedBlobFields {
	fn set_blob(&mut self, field: &str, blob: NamedBlob) -> RepositoryResult<()>;
	fn blob(&self, field: &str) -> Option<&NamedBlob>;
}

/// Objects supporting per-object addable-type constraints.
pub trait HasTypeConstraints {
	fn enable_constraints(&mut self);
	fn set_locally_allowed_types(&mut self, types: Vec<String>);
	fn set_immediately_addable_types(&mut self, types: Vec<String>);
}

/// Working copy of a persisted content object.
pub trait ContentObject: Clone {
	/// Identifier inside the container.
	fn id(&self) -> &str;

	/// Absolute path.
	fn path(&self) -> &ContentPath;

	/// Content type name.
	fn type_name(&self) -> &str;

	/// Stable identity, once assigned.
	fn uid(&self) -> Option<&str>;

	/// Overrides the stable identity.
	fn set_uid(&mut self, uid: &str);

	fn title(&self) -> Option<&str>;

	fn language(&self) -> Option<&str>;

	fn review_state(&self) -> Option<&str>;

	/// Last modification time.
	fn modified(&self) -> Option<DateTime<Utc>>;

	fn effective(&self) -> Option<DateTime<Utc>>;

	fn set_effective(&mut self, when: DateTime<Utc>);

	/// Selects the view used to render the object.
	fn set_layout(&mut self, layout: &str);

	fn set_exclude_from_nav(&mut self, exclude: bool);

	/// Grants roles to a principal, keeping roles granted earlier.
	fn grant_local_roles(&mut self, principal: &str, roles: &[String]);

	/// True when the naming policy derives this object's name from its title
	/// by itself, so no explicit suggestion should be passed to it.
	fn names_from_title(&self) -> bool;

	fn structured_body(&mut self) -> Option<&mut dyn HasStructuredBody> {
		None
	}

	fn legacy_asset_fields(&mut self) -> Option<&mut dyn HasLegacyAssetFields> {
		None
	}

	fn named_blob_fields(&mut self) -> Option<&mut dyn HasNamedBlobFields> {
		None
	}

	fn type_constraints(&mut self) -> Option<&mut dyn HasTypeConstraints> {
		None
	}
}

/// Site language configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguagePolicy {
	/// Language-rooted folders are in use.
	pub multilingual: bool,
	/// Supported language codes.
	pub supported: Vec<String>,
}

impl LanguagePolicy {
	/// True when languages should be derived from container paths.
	pub fn derives_from_path(&self) -> bool {
		self.multilingual && self.supported.len() > 1
	}

	/// Returns the first segment of `path` that names a supported language.
	pub fn language_from_path<'p>(&self, path: &'p ContentPath) -> Option<&'p str> {
		path.segments()
			.find(|segment| self.supported.iter().any(|lang| lang == segment))
	}
}

/// Version-dependent behaviour of the repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepositoryCapabilities {
	/// The site root stores its body as objects rather than JSON strings.
	pub site_root_blocks_as_object: bool,
}

/// Value assigned to a site root body property.
#[derive(Debug, Clone, PartialEq)]
pub enum SiteRootValue {
	/// Stored as structured data.
	Object(Value),
	/// Stored as a serialized JSON string property.
	Serialized(String),
}

/// Content storage, naming policy, workflow and indexing.
pub trait ContentRepository {
	type Object: ContentObject;

	/// Path of the site root.
	fn site_root(&self) -> ContentPath {
		ContentPath::root()
	}

	/// Looks up an object.
	fn get(&self, path: &ContentPath) -> Option<Self::Object>;

	/// Instantiates a bare object without attaching it to the container.
	fn create(
		&mut self,
		container: &ContentPath,
		type_name: &str,
		id: Option<&str>,
		title: Option<&str>,
	) -> RepositoryResult<Self::Object>;

	/// Attaches a created object to its container and returns the stored copy.
	///
	/// With `rename`, a taken id is replaced by a free one instead of failing.
	fn add(
		&mut self,
		container: &ContentPath,
		object: Self::Object,
		rename: bool,
	) -> RepositoryResult<Self::Object>;

	/// Naming policy: the name `object` would receive in `container`.
	fn choose_name(
		&self,
		container: &ContentPath,
		suggestion: Option<&str>,
		object: &Self::Object,
	) -> RepositoryResult<String>;

	/// Moves the object to a workflow state.
	fn transition(&mut self, object: &mut Self::Object, to_state: &str) -> RepositoryResult<()>;

	/// Persists the working copy and refreshes the named indexes (all when empty).
	fn reindex(&mut self, object: &Self::Object, indexes: &[&str]) -> RepositoryResult<()>;

	fn set_default_page(&mut self, container: &ContentPath, id: &str) -> RepositoryResult<()>;

	fn notify_created(&mut self, object: &Self::Object);

	fn notify_modified(&mut self, object: &Self::Object, fields: &[String]);

	/// Sets whether a type may be added anywhere. Returns the previous flag.
	fn set_globally_allowed(&mut self, type_name: &str, allowed: bool) -> RepositoryResult<bool>;

	fn language_policy(&self) -> LanguagePolicy;

	fn capabilities(&self) -> RepositoryCapabilities;

	fn set_site_root_property(&mut self, name: &str, value: SiteRootValue) -> RepositoryResult<()>;
}

/// Mode flags of a deserializer call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeserializeOptions {
	/// Validate every schema field, not only the submitted ones.
	pub validate_all: bool,
	/// The object is being created.
	pub create: bool,
}

/// Outcome of a deserializer call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeserializeReport {
	/// The deserializer already emitted the creation notification.
	pub notified_create: bool,
	/// Fields whose value changed.
	pub modified_fields: Vec<String>,
}

/// Schema-aware field population from a JSON payload.
pub trait FieldDeserializer: ContentRepository {
	/// Returns false when no deserializer exists for the object's type.
	fn can_deserialize(&self, object: &Self::Object) -> bool;

	fn deserialize(
		&mut self,
		object: &mut Self::Object,
		container: &ContentPath,
		data: &Map<String, Value>,
		options: DeserializeOptions,
	) -> RepositoryResult<DeserializeReport>;
}

/// Client-equivalent JSON projection of a single field.
pub trait FieldSerializer: ContentRepository {
	fn serialize_field(&self, object: &Self::Object, field: &str) -> RepositoryResult<Option<Value>>;
}

/// Translation links between objects of different languages.
pub trait TranslationManager: ContentRepository {
	fn translations_enabled(&self) -> bool;

	/// The object registered as `canonical`'s translation into `language`.
	fn translation(&self, canonical: &Self::Object, language: &str) -> Option<Self::Object>;

	fn register_translation(
		&mut self,
		canonical: &Self::Object,
		language: &str,
		translation: &Self::Object,
	) -> RepositoryResult<()>;

	fn remove_translation(&mut self, canonical: &Self::Object, language: &str) -> RepositoryResult<()>;
}

/// Derived image representations.
pub trait ScaleGenerator: ContentRepository {
	/// Produces and persists the scales of one image field. Returns how many were made.
	fn generate_scales(&mut self, object: &Self::Object, field: &str) -> RepositoryResult<usize>;
}

/// Everything the import engine needs from a site.
pub trait ContentSite:
	ContentRepository + FieldDeserializer + FieldSerializer + TranslationManager + ScaleGenerator
{
}

impl<T> ContentSite for T where
	T: ContentRepository + FieldDeserializer + FieldSerializer + TranslationManager + ScaleGenerator
{
}
