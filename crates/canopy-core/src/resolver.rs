//! Identifier resolution for nodes declared without an id.
//!
//! Re-runs must find the object created by an earlier run. The naming policy
//! is asked what it would call a fresh object with the node's title; when it
//! answers with a collision suffix (`about-1`) and the unsuffixed name is
//! taken, the unsuffixed object is the one from the earlier run.
//!
//! Any numeric suffix counts (`about-12` as well as `about-1`), not only
//! the single-digit `-1` a name chooser hands out first. This breaks down
//! when a title itself ends in `-<digits>` and an unrelated object holds the
//! stripped name.
//!
//! A blank declared id counts as missing. An id containing `/` is rejected,
//! since it would address an object outside the container.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{RepositoryError, RepositoryResult};
use crate::node::DeclaredNode;
use crate::path::ContentPath;
use crate::repository::{ContentObject, ContentRepository};

static COLLISION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+)-\d+$").unwrap());

/// Returns the identifier the node maps to inside `container`.
pub fn resolve_id<R>(repo: &mut R, node: &DeclaredNode, container: &ContentPath) -> RepositoryResult<String>
where
	R: ContentRepository + ?Sized,
{
	if let Some(id) = node.declared_id() {
		if id.contains('/') {
			return Err(RepositoryError::Validation {
				field: "id".to_string(),
				message: format!("'{id}' must not contain '/'"),
			});
		}
		return Ok(id.to_string());
	}

	let type_name = node.type_name.as_deref().ok_or_else(|| RepositoryError::Validation {
		field: "@type".to_string(),
		message: "required to derive an id".to_string(),
	})?;
	let title = node.title.as_deref().ok_or_else(|| RepositoryError::Validation {
		field: "id".to_string(),
		message: "an id or a title is required".to_string(),
	})?;

	let probe = repo.create(container, type_name, None, Some(title))?;
	let suggestion = if probe.names_from_title() {
		None
	} else {
		probe.title()
	};
	let name = repo.choose_name(container, suggestion, &probe)?;

	if let Some(stripped) = strip_collision_suffix(&name)
		&& repo.get(&container.join(stripped)).is_some()
	{
		return Ok(stripped.to_string());
	}
	Ok(name)
}

/// Returns `name` without a trailing `-<digits>` suffix, if it has one.
pub fn strip_collision_suffix(name: &str) -> Option<&str> {
	COLLISION_SUFFIX
		.captures(name)
		.and_then(|caps| caps.get(1))
		.map(|m| m.as_str())
}
