//! Second pass over created content that re-applies block bodies.
//!
//! Links inside blocks can only be turned into resolve-by-id tokens once
//! their target exists. After the whole tree has been imported, each body is
//! serialized the way a client would read it and fed back through the
//! deserializer, which resolves whatever became resolvable in the meantime.
//! Running the pass again changes nothing.

use serde_json::{Map, Value};

use crate::error::CanopyResult;
use crate::importer::Importer;
use crate::node::DeclaredNode;
use crate::ordering::SourceFile;
use crate::path::ContentPath;
use crate::repository::{
	ContentObject, ContentRepository, ContentSite, DeserializeOptions, DeserializeReport,
	FieldDeserializer, FieldSerializer,
};
use crate::resolver::resolve_id;

/// Field re-applied by the pass.
pub const BODY_FIELD: &str = "blocks";

impl<'a, S: ContentSite> Importer<'a, S> {
	/// Client projection of the object's block body.
	pub fn serialize_body(&self, object: &S::Object) -> CanopyResult<Option<Value>> {
		Ok(self.site.serialize_field(object, BODY_FIELD)?)
	}

	/// Feeds a block body back into the object and persists it.
	pub fn deserialize_body(
		&mut self,
		object: &mut S::Object,
		container: &ContentPath,
		blocks: Value,
	) -> CanopyResult<DeserializeReport> {
		let mut data = Map::new();
		data.insert(BODY_FIELD.to_string(), blocks);
		let outcome = self.site.deserialize(
			object,
			container,
			&data,
			DeserializeOptions {
				validate_all: false,
				create: false,
			},
		)?;
		if !outcome.modified_fields.is_empty() {
			self.site.notify_modified(object, &outcome.modified_fields);
			self.site.reindex(object, &[])?;
		}
		Ok(outcome)
	}

	/// Re-applies the bodies of a declared tree. Returns how many objects were refreshed.
	///
	/// A node whose object cannot be found is logged and its branch skipped.
	pub fn refresh_by_structure(&mut self, container: &ContentPath, nodes: &[DeclaredNode]) -> usize {
		let mut refreshed = 0;
		for node in nodes {
			let path = resolve_id(&mut *self.site, node, container)
				.ok()
				.map(|id| container.join(&id));
			let Some(path) = path.filter(|p| self.site.get(p).is_some()) else {
				self.log.error(&format!(
					"id can't be guessed for {} in container {container}",
					node.title.as_deref().or(node.id.as_deref()).unwrap_or("<untitled>")
				));
				continue;
			};
			if self.refresh(&path) {
				refreshed += 1;
			}
			refreshed += self.refresh_by_structure(&path, &node.items);
		}
		refreshed
	}

	/// Re-applies the body of the object at the path a per-file source names.
	///
	/// The path is derived from the file name alone, so a node that declares
	/// its own id is not found here; use [`Importer::refresh_written`] with
	/// the path the import wrote to instead.
	pub fn refresh_by_file(&mut self, file_name: &str) -> bool {
		let Some(source) = SourceFile::parse(file_name) else {
			return false;
		};
		if self.site.get(&source.container).is_none() {
			self.log.error(&format!(
				"Could not look up container under \"{}\"",
				source.container
			));
			return false;
		}
		self.refresh_written(file_name, &source.path())
	}

	/// Re-applies the body of the object a per-file source was written to.
	pub fn refresh_written(&mut self, file_name: &str, path: &ContentPath) -> bool {
		if self.site.get(path).is_none() {
			self.log
				.error(&format!("Could not find {path} declared by {file_name}"));
			return false;
		}
		self.refresh(path)
	}

	/// Round-trips one object's body. Returns true when the object has one.
	fn refresh(&mut self, path: &ContentPath) -> bool {
		let Some(mut object) = self.site.get(path) else {
			return false;
		};
		if object.structured_body().is_none() {
			return false;
		}
		let container = path.parent().unwrap_or_else(ContentPath::root);
		let result = self.serialize_body(&object).and_then(|body| match body {
			Some(blocks) => self.deserialize_body(&mut object, &container, blocks).map(Some),
			None => Ok(None),
		});
		match result {
			Ok(Some(outcome)) => {
				if !outcome.modified_fields.is_empty() {
					self.log.debug(&format!("{path} - references refreshed"));
				}
				true
			}
			Ok(None) => false,
			Err(e) => {
				self.log.error(&format!("{path} - could not refresh blocks: {e}"));
				false
			}
		}
	}
}
