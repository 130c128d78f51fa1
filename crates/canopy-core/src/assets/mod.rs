//! Binary asset population.
//!
//! Four independent directive keys on a declared node put blobs on the
//! object before its fields are deserialized:
//!
//! | key | `true` | `"name"` | `["a", "b"]` | `{"a": ..}` |
//! |---|---|---|---|---|
//! | `set_dummy_image` | placeholder on `image` | placeholder on `name` | placeholder on each | placeholder on each key |
//! | `set_dummy_file` | placeholder on `file` | placeholder on `name` | placeholder on each | placeholder on each key |
//! | `set_local_image` | invalid | file `name` on `image` | invalid | file per field |
//! | `set_local_file` | invalid | file `name` on `file` | invalid | file per field |
//!
//! Local files are read from the image folder and typed by content.

pub mod placeholder;
pub mod sniff;

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{AssetError, RepositoryError};
use crate::node::{AssetDirective, DeclaredNode};
use crate::repository::{ContentObject, FILE_FIELD, IMAGE_FIELD, NamedBlob};

use self::placeholder::placeholder_png;
use self::sniff::sniff_mime;

const SET_DUMMY_IMAGE: &str = "set_dummy_image";
const SET_DUMMY_FILE: &str = "set_dummy_file";
const SET_LOCAL_IMAGE: &str = "set_local_image";
const SET_LOCAL_FILE: &str = "set_local_file";

const PLACEHOLDER_MIME: &str = "image/png";

/// Fields populated by [`attach_assets`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachedAssets {
	/// Image fields, in population order. Scales are generated for these.
	pub image_fields: Vec<String>,
	/// File fields, in population order.
	pub file_fields: Vec<String>,
}

impl AttachedAssets {
	pub fn is_empty(&self) -> bool {
		self.image_fields.is_empty() && self.file_fields.is_empty()
	}

	fn record(&mut self, kind: BlobKind, field: String) {
		let fields = match kind {
			BlobKind::Image => &mut self.image_fields,
			BlobKind::File => &mut self.file_fields,
		};
		if !fields.contains(&field) {
			fields.push(field);
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlobKind {
	Image,
	File,
}

impl BlobKind {
	fn conventional_field(self) -> &'static str {
		match self {
			Self::Image => IMAGE_FIELD,
			Self::File => FILE_FIELD,
		}
	}
}

/// Where a blob goes.
enum Target<'n> {
	/// The conventional `image` or `file` field.
	Conventional,
	/// A named field.
	Named(&'n str),
}

/// Populates the blob fields requested by the node's asset directives.
///
/// A missing local file fails the whole call; nothing is rolled back on the
/// working copy, so the caller is expected to discard it.
pub fn attach_assets<O: ContentObject>(
	node: &DeclaredNode,
	object: &mut O,
	base_image_path: Option<&Path>,
) -> Result<AttachedAssets, AssetError> {
	let mut attached = AttachedAssets::default();
	let mut placeholder: Option<Vec<u8>> = None;

	for (key, directive, kind) in [
		(SET_DUMMY_IMAGE, &node.set_dummy_image, BlobKind::Image),
		(SET_DUMMY_FILE, &node.set_dummy_file, BlobKind::File),
	] {
		let Some(directive) = directive else {
			continue;
		};
		let targets = dummy_targets(directive);
		if targets.is_empty() {
			continue;
		}
		let data = match &placeholder {
			Some(data) => data.clone(),
			None => {
				let data = placeholder_png()?;
				placeholder = Some(data.clone());
				data
			}
		};
		for target in targets {
			let blob = NamedBlob::new(data.clone(), PLACEHOLDER_MIME);
			let field = put_blob(object, key, kind, &target, blob)?;
			attached.record(kind, field);
		}
	}

	for (key, directive, kind) in [
		(SET_LOCAL_IMAGE, &node.set_local_image, BlobKind::Image),
		(SET_LOCAL_FILE, &node.set_local_file, BlobKind::File),
	] {
		let Some(directive) = directive else {
			continue;
		};
		for (target, filename) in local_targets(key, directive)? {
			let blob = read_local(base_image_path, filename)?;
			let field = put_blob(object, key, kind, &target, blob)?;
			attached.record(kind, field);
		}
	}

	Ok(attached)
}

fn dummy_targets(directive: &AssetDirective) -> Vec<Target<'_>> {
	match directive {
		AssetDirective::Enabled(true) => vec![Target::Conventional],
		AssetDirective::Enabled(false) => Vec::new(),
		AssetDirective::Single(field) => vec![Target::Named(field)],
		AssetDirective::Fields(fields) => fields.iter().map(|f| Target::Named(f)).collect(),
		AssetDirective::Mapped(map) => map.keys().map(|f| Target::Named(f)).collect(),
	}
}

fn local_targets<'n>(
	key: &str,
	directive: &'n AssetDirective,
) -> Result<Vec<(Target<'n>, &'n str)>, AssetError> {
	match directive {
		AssetDirective::Enabled(false) => Ok(Vec::new()),
		AssetDirective::Single(filename) => Ok(vec![(Target::Conventional, filename.as_str())]),
		AssetDirective::Mapped(map) => map
			.iter()
			.map(|(field, filename)| match filename {
				Value::String(filename) => Ok((Target::Named(field.as_str()), filename.as_str())),
				other => Err(AssetError::InvalidDirective {
					key: key.to_string(),
					message: format!("file name for field '{field}' must be a string, got {other}"),
				}),
			})
			.collect(),
		AssetDirective::Enabled(true) | AssetDirective::Fields(_) => Err(AssetError::InvalidDirective {
			key: key.to_string(),
			message: "expected a file name or a mapping of field name to file name".to_string(),
		}),
	}
}

fn read_local(base: Option<&Path>, filename: &str) -> Result<NamedBlob, AssetError> {
	let path = match base {
		Some(base) => base.join(filename),
		None => PathBuf::from(filename),
	};
	let data = std::fs::read(&path).map_err(|e| {
		if e.kind() == std::io::ErrorKind::NotFound {
			AssetError::FileNotFound(path.clone())
		} else {
			AssetError::Io(e)
		}
	})?;
	let content_type = sniff_mime(&data);
	Ok(NamedBlob::new(data, content_type).with_filename(filename))
}

fn put_blob<O: ContentObject>(
	object: &mut O,
	key: &str,
	kind: BlobKind,
	target: &Target<'_>,
	blob: NamedBlob,
) -> Result<String, AssetError> {
	let type_name = object.type_name().to_string();
	let field = match target {
		Target::Named(field) => *field,
		Target::Conventional => {
			if let Some(legacy) = object.legacy_asset_fields() {
				match kind {
					BlobKind::Image => legacy.set_image(blob),
					BlobKind::File => legacy.set_file(blob),
				}
				.map_err(|e| invalid(key, e))?;
				return Ok(kind.conventional_field().to_string());
			}
			kind.conventional_field()
		}
	};
	let fields = object
		.named_blob_fields()
		.ok_or_else(|| AssetError::MissingCapability {
			key: key.to_string(),
			type_name,
		})?;
	fields.set_blob(field, blob).map_err(|e| invalid(key, e))?;
	Ok(field.to_string())
}

fn invalid(key: &str, error: RepositoryError) -> AssetError {
	AssetError::InvalidDirective {
		key: key.to_string(),
		message: error.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::backends::memory::{MemoryObject, MemorySite};
	use crate::path::ContentPath;
	use crate::repository::ContentRepository;
	use rstest::{fixture, rstest};
	use serde_json::json;
	use tempfile::TempDir;

	const PNG_HEADER: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

	#[fixture]
	fn site() -> MemorySite {
		MemorySite::new()
	}

	fn bare(site: &mut MemorySite, type_name: &str) -> MemoryObject {
		site.create(&ContentPath::root(), type_name, Some("item"), Some("Item"))
			.unwrap()
	}

	fn node(directives: serde_json::Value) -> DeclaredNode {
		let mut value = json!({"@type": "Document", "title": "Item"});
		if let (Some(target), Some(extra)) = (value.as_object_mut(), directives.as_object()) {
			target.extend(extra.clone());
		}
		serde_json::from_value(value).unwrap()
	}

	#[rstest]
	fn test_dummy_image_named_fields(mut site: MemorySite) {
		// Arrange
		let mut object = bare(&mut site, "Document");
		let node = node(json!({"set_dummy_image": ["image", "preview_image"]}));

		// Act
		let attached = attach_assets(&node, &mut object, None).unwrap();

		// Assert
		assert_eq!(attached.image_fields, vec!["image", "preview_image"]);
		assert!(attached.file_fields.is_empty());
		let blob = object.blob("preview_image").unwrap();
		assert_eq!(blob.content_type, "image/png");
		assert!(blob.data.starts_with(&PNG_HEADER));
	}

	#[rstest]
	fn test_dummy_image_legacy_switch(mut site: MemorySite) {
		let mut object = bare(&mut site, "Image");
		let node = node(json!({"set_dummy_image": true}));

		let attached = attach_assets(&node, &mut object, None).unwrap();

		assert_eq!(attached.image_fields, vec![IMAGE_FIELD]);
		assert!(object.blob(IMAGE_FIELD).is_some());
	}

	#[rstest]
	fn test_dummy_switch_off_does_nothing(mut site: MemorySite) {
		let mut object = bare(&mut site, "Image");
		let node = node(json!({"set_dummy_image": false, "set_dummy_file": false}));

		let attached = attach_assets(&node, &mut object, None).unwrap();

		assert!(attached.is_empty());
	}

	#[rstest]
	fn test_dummy_file_is_not_scaled(mut site: MemorySite) {
		let mut object = bare(&mut site, "File");
		let node = node(json!({"set_dummy_file": true}));

		let attached = attach_assets(&node, &mut object, None).unwrap();

		assert!(attached.image_fields.is_empty());
		assert_eq!(attached.file_fields, vec![FILE_FIELD]);
	}

	#[rstest]
	fn test_local_image_is_sniffed_by_content(mut site: MemorySite) {
		// Arrange
		let dir = TempDir::new().unwrap();
		let mut bytes = PNG_HEADER.to_vec();
		bytes.extend_from_slice(&[0u8; 16]);
		std::fs::write(dir.path().join("photo.jpg"), &bytes).unwrap();
		let mut object = bare(&mut site, "Image");
		let node = node(json!({"set_local_image": "photo.jpg"}));

		// Act
		let attached = attach_assets(&node, &mut object, Some(dir.path())).unwrap();

		// Assert
		assert_eq!(attached.image_fields, vec![IMAGE_FIELD]);
		let blob = object.blob(IMAGE_FIELD).unwrap();
		assert_eq!(blob.content_type, "image/png");
		assert_eq!(blob.filename.as_deref(), Some("photo.jpg"));
	}

	#[rstest]
	fn test_local_file_mapping(mut site: MemorySite) {
		let dir = TempDir::new().unwrap();
		std::fs::write(dir.path().join("report.pdf"), b"%PDF-1.4\n").unwrap();
		let mut object = bare(&mut site, "Document");
		let node = node(json!({"set_local_file": {"attachment": "report.pdf"}}));

		let attached = attach_assets(&node, &mut object, Some(dir.path())).unwrap();

		assert_eq!(attached.file_fields, vec!["attachment"]);
		assert_eq!(
			object.blob("attachment").unwrap().content_type,
			"application/pdf"
		);
	}

	#[rstest]
	fn test_missing_local_file(mut site: MemorySite) {
		let dir = TempDir::new().unwrap();
		let mut object = bare(&mut site, "Image");
		let node = node(json!({"set_local_image": "missing.png"}));

		let result = attach_assets(&node, &mut object, Some(dir.path()));

		assert!(matches!(result, Err(AssetError::FileNotFound(p)) if p.ends_with("missing.png")));
	}

	#[rstest]
	#[case(json!({"set_local_image": true}))]
	#[case(json!({"set_local_file": ["a", "b"]}))]
	#[case(json!({"set_local_image": {"image": 3}}))]
	fn test_invalid_local_directives(mut site: MemorySite, #[case] directives: serde_json::Value) {
		let mut object = bare(&mut site, "Document");
		let node = node(directives);

		let result = attach_assets(&node, &mut object, None);

		assert!(matches!(result, Err(AssetError::InvalidDirective { .. })));
	}

	#[rstest]
	fn test_type_without_blob_fields(mut site: MemorySite) {
		let mut object = bare(&mut site, "Link");
		let node = node(json!({"set_dummy_image": true}));

		let result = attach_assets(&node, &mut object, None);

		assert!(matches!(
			result,
			Err(AssetError::MissingCapability { ref type_name, .. }) if type_name == "Link"
		));
	}
}
