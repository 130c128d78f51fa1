//! Resolve-by-id link tokens inside block data.
//!
//! On the way in, internal links (`/about`, or absolute URLs under the portal
//! URL) stored under `href`, `url` or `@id` become `../resolveuid/<uid>` once
//! their target exists. On the way out, tokens are turned back into absolute
//! URLs. Links to targets that do not exist yet are kept verbatim, so a later
//! round trip can resolve them.

use serde_json::Value;

use crate::blocks::rewrite_strings;
use crate::path::ContentPath;

/// Block keys holding links.
pub const LINK_KEYS: &[&str] = &["href", "url", "@id"];

/// Prefix of a resolve-by-id token.
pub const RESOLVEUID_PREFIX: &str = "../resolveuid/";

/// Replaces internal links with resolve-by-id tokens where `uid_of` knows the target.
pub fn resolve_links<F>(blocks: &mut Value, portal_url: &str, uid_of: F)
where
	F: Fn(&ContentPath) -> Option<String>,
{
	rewrite_strings(blocks, LINK_KEYS, &mut |link| {
		let path = internal_path(link, portal_url)?;
		uid_of(&path).map(|uid| format!("{RESOLVEUID_PREFIX}{uid}"))
	});
}

/// Replaces resolve-by-id tokens with absolute URLs where `path_of` knows the uid.
pub fn expand_links<F>(blocks: &mut Value, portal_url: &str, path_of: F)
where
	F: Fn(&str) -> Option<ContentPath>,
{
	rewrite_strings(blocks, LINK_KEYS, &mut |link| {
		let uid = link.strip_prefix(RESOLVEUID_PREFIX)?;
		let uid = uid.split(['/', '?', '#']).next().unwrap_or(uid);
		path_of(uid).map(|path| absolute_url(portal_url, &path))
	});
}

/// Path named by an internal link, or `None` for external and token links.
fn internal_path(link: &str, portal_url: &str) -> Option<ContentPath> {
	if link.starts_with(RESOLVEUID_PREFIX) {
		return None;
	}
	let rest = match link.strip_prefix(portal_url) {
		Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
		_ if link.starts_with('/') && !link.starts_with("//") => link,
		_ => return None,
	};
	let rest = rest.split(['?', '#']).next().unwrap_or(rest);
	Some(ContentPath::new(rest))
}

fn absolute_url(portal_url: &str, path: &ContentPath) -> String {
	if path.is_root() {
		return portal_url.to_string();
	}
	format!("{portal_url}{path}")
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	const PORTAL: &str = "http://localhost:8080/Plone";

	fn uid_of(path: &ContentPath) -> Option<String> {
		(path.as_str() == "/about").then(|| "abc123".to_string())
	}

	fn path_of(uid: &str) -> Option<ContentPath> {
		(uid == "abc123").then(|| ContentPath::new("/about"))
	}

	#[rstest]
	#[case("/about", "../resolveuid/abc123")]
	#[case("http://localhost:8080/Plone/about", "../resolveuid/abc123")]
	#[case("/about?x=1", "../resolveuid/abc123")]
	#[case("/missing", "/missing")]
	#[case("https://example.org/about", "https://example.org/about")]
	#[case("//cdn.example.org/about", "//cdn.example.org/about")]
	fn test_resolve_links(#[case] link: &str, #[case] expected: &str) {
		let mut blocks = json!({"a": {"@type": "teaser", "href": link}});

		resolve_links(&mut blocks, PORTAL, uid_of);

		assert_eq!(blocks["a"]["href"], expected);
	}

	#[rstest]
	fn test_round_trip_is_stable() {
		// Arrange
		let mut blocks = json!({"a": {"href": [{"@id": "/about"}]}});
		resolve_links(&mut blocks, PORTAL, uid_of);
		let first = blocks.clone();

		// Act
		expand_links(&mut blocks, PORTAL, path_of);
		assert_eq!(blocks["a"]["href"][0]["@id"], "http://localhost:8080/Plone/about");
		resolve_links(&mut blocks, PORTAL, uid_of);

		// Assert
		assert_eq!(blocks, first);
	}

	#[rstest]
	fn test_unknown_token_is_kept() {
		let mut blocks = json!({"a": {"url": "../resolveuid/zzz"}});
		expand_links(&mut blocks, PORTAL, path_of);
		assert_eq!(blocks["a"]["url"], "../resolveuid/zzz");
	}
}
