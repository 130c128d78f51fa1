//! Structured body helpers.
//!
//! A structured body is a pair of JSON values: `blocks`, a mapping of block id
//! to block data, and `blocks_layout`, `{"items": [block ids in order]}`.

use serde_json::{Map, Value, json};

/// Id of the title block seeded into empty bodies.
pub const TITLE_BLOCK_ID: &str = "d3f1c443-583f-4e8e-a682-3bf25752a300";

/// Id of the text block seeded into empty bodies.
pub const TEXT_BLOCK_ID: &str = "7624cf59-05d0-4055-8f55-5fd6597d84b0";

/// Returns the default `blocks` mapping: one title block and one empty text block.
pub fn default_blocks() -> Value {
	json!({
		TITLE_BLOCK_ID: {"@type": "title"},
		TEXT_BLOCK_ID: {"@type": "slate"},
	})
}

/// Returns the default `blocks_layout` listing the default blocks in order.
pub fn default_blocks_layout() -> Value {
	json!({"items": [TITLE_BLOCK_ID, TEXT_BLOCK_ID]})
}

/// Returns true when `blocks` holds at least one block.
pub fn has_blocks(blocks: Option<&Value>) -> bool {
	matches!(blocks, Some(Value::Object(map)) if !map.is_empty())
}

/// Ordered block ids of a layout, ignoring malformed entries.
pub fn layout_items(layout: &Value) -> Vec<&str> {
	layout
		.get("items")
		.and_then(Value::as_array)
		.map(|items| items.iter().filter_map(Value::as_str).collect())
		.unwrap_or_default()
}

/// Applies `f` to every string stored under one of `keys`, at any depth.
///
/// Used to rewrite internal links inside block data in both directions.
pub fn rewrite_strings<F>(value: &mut Value, keys: &[&str], f: &mut F)
where
	F: FnMut(&str) -> Option<String>,
{
	match value {
		Value::Object(map) => rewrite_map(map, keys, f),
		Value::Array(items) => {
			for item in items {
				rewrite_strings(item, keys, f);
			}
		}
		_ => {}
	}
}

fn rewrite_map<F>(map: &mut Map<String, Value>, keys: &[&str], f: &mut F)
where
	F: FnMut(&str) -> Option<String>,
{
	for (key, child) in map.iter_mut() {
		if keys.contains(&key.as_str())
			&& let Value::String(text) = child
		{
			if let Some(replacement) = f(text) {
				*text = replacement;
			}
			continue;
		}
		rewrite_strings(child, keys, f);
	}
}
