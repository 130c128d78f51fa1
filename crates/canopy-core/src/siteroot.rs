//! Site root body from `siteroot.json`.

use std::path::Path;

use serde_json::Value;

use crate::error::{CanopyResult, RepositoryError};
use crate::importer::Importer;
use crate::node::read_source;
use crate::repository::{ContentRepository, ContentSite, SiteRootValue};

/// Properties of `siteroot.json` applied to the site root, in order.
pub const SITE_ROOT_FIELDS: &[&str] = &["blocks", "blocks_layout"];

impl<'a, S: ContentSite> Importer<'a, S> {
	/// Reads `siteroot.json` and applies it.
	pub fn apply_site_root_file(&mut self, path: &Path) -> CanopyResult<()> {
		let root_info: Value = serde_json::from_str(&read_source(path)?)?;
		self.apply_site_root(&root_info)
	}

	/// Sets the site root's `blocks` and `blocks_layout`.
	///
	/// Sites that store the root body as objects get the values verbatim;
	/// older ones get them as JSON string properties.
	pub fn apply_site_root(&mut self, root_info: &Value) -> CanopyResult<()> {
		let as_object = self.site.capabilities().site_root_blocks_as_object;
		for field in SITE_ROOT_FIELDS {
			let value = root_info
				.get(field)
				.ok_or_else(|| RepositoryError::Validation {
					field: field.to_string(),
					message: "required in siteroot.json".to_string(),
				})?;
			let value = if as_object {
				SiteRootValue::Object(value.clone())
			} else {
				SiteRootValue::Serialized(serde_json::to_string(value)?)
			};
			self.site.set_site_root_property(field, value)?;
		}
		self.log.info("site root - blocks updated");
		Ok(())
	}
}
