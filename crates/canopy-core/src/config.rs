//! Import configuration.
//!
//! Three layers:
//! - [`ImportSettings`]: process-wide switches read from the environment.
//! - [`RunnerOptions`]: defaulting parameters of the tree runner.
//! - [`FolderOptions`]: runner options plus folder-level ordering and
//!   filtering, loadable from a TOML file.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CanopyError, CanopyResult};
use crate::node::read_source;

/// Environment variable enabling continue-on-error.
pub const ENV_CONTINUE_ON_ERROR: &str = "CANOPY_CONTINUE_ON_ERROR";
/// Environment variable enabling the inspection hook on abort.
pub const ENV_DEBUG: &str = "CANOPY_DEBUG";
/// Environment variable suppressing derived scale generation.
pub const ENV_SKIP_SCALES: &str = "CANOPY_SKIP_SCALES";

/// Process-wide switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSettings {
	/// Keep going with siblings after a node failure instead of aborting.
	#[serde(default)]
	pub continue_on_error: bool,
	/// Invoke the inspection hook before an abort is returned.
	#[serde(default)]
	pub debug: bool,
	/// Do not generate derived image scales.
	#[serde(default)]
	pub skip_scales: bool,
}

impl ImportSettings {
	/// Reads the switches from the process environment.
	pub fn from_env() -> CanopyResult<Self> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Reads the switches through an arbitrary lookup function.
	///
	/// Unset variables default to `false`; set but unparsable values are errors.
	pub fn from_lookup<F>(lookup: F) -> CanopyResult<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let read = |key: &str| -> CanopyResult<bool> {
			match lookup(key) {
				Some(value) => parse_bool(&value).ok_or_else(|| CanopyError::InvalidSetting {
					key: key.to_string(),
					value,
				}),
				None => Ok(false),
			}
		};

		Ok(Self {
			continue_on_error: read(ENV_CONTINUE_ON_ERROR)?,
			debug: read(ENV_DEBUG)?,
			skip_scales: read(ENV_SKIP_SCALES)?,
		})
	}

	/// Keeps going after a node fails inside the field boundary.
	pub fn with_continue_on_error(mut self, enabled: bool) -> Self {
		self.continue_on_error = enabled;
		self
	}

	/// Hands aborts to the inspection hook.
	pub fn with_debug(mut self, enabled: bool) -> Self {
		self.debug = enabled;
		self
	}

	/// Skips image scale generation.
	pub fn with_skip_scales(mut self, enabled: bool) -> Self {
		self.skip_scales = enabled;
		self
	}
}

/// Parses a boolean switch (`1/0`, `true/false`, `yes/no`, `on/off`, case-insensitive).
pub fn parse_bool(value: &str) -> Option<bool> {
	match value.trim().to_lowercase().as_str() {
		"1" | "true" | "yes" | "on" | "y" | "t" => Some(true),
		"0" | "false" | "no" | "off" | "n" | "f" | "" => Some(false),
		_ => None,
	}
}

fn default_ignore_wf_types() -> Vec<String> {
	vec!["Image".to_string(), "File".to_string()]
}

/// Defaulting parameters passed unchanged down the declared tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerOptions {
	/// Folder local assets are read from.
	#[serde(default)]
	pub base_image_path: Option<PathBuf>,

	/// Language applied to nodes that declare none.
	#[serde(default)]
	pub default_lang: Option<String>,

	/// Workflow state applied to nodes that declare none.
	#[serde(default)]
	pub default_wf_state: Option<String>,

	/// Types that never get a workflow state applied.
	#[serde(default = "default_ignore_wf_types")]
	pub ignore_wf_types: Vec<String>,

	/// Existing objects modified after this instant are left untouched.
	#[serde(default, deserialize_with = "deserialize_watermark")]
	pub do_not_edit_if_modified_after: Option<DateTime<Utc>>,
}

impl Default for RunnerOptions {
	fn default() -> Self {
		Self {
			base_image_path: None,
			default_lang: None,
			default_wf_state: None,
			ignore_wf_types: default_ignore_wf_types(),
			do_not_edit_if_modified_after: None,
		}
	}
}

impl RunnerOptions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the folder local images and files are read from.
	pub fn with_base_image_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.base_image_path = Some(path.into());
		self
	}

	/// Sets the language for nodes that declare none.
	pub fn with_default_lang(mut self, lang: impl Into<String>) -> Self {
		self.default_lang = Some(lang.into());
		self
	}

	/// Sets the workflow state for nodes that declare none.
	pub fn with_default_wf_state(mut self, state: impl Into<String>) -> Self {
		self.default_wf_state = Some(state.into());
		self
	}

	/// Sets the types that never get a workflow transition.
	pub fn with_ignore_wf_types(mut self, types: Vec<String>) -> Self {
		self.ignore_wf_types = types;
		self
	}

	/// Leaves objects modified after `watermark` untouched.
	pub fn with_watermark(mut self, watermark: DateTime<Utc>) -> Self {
		self.do_not_edit_if_modified_after = Some(watermark);
		self
	}

	/// Returns true if workflow defaults and transitions skip this type.
	pub fn ignores_workflow(&self, type_name: &str) -> bool {
		self.ignore_wf_types.iter().any(|t| t == type_name)
	}
}

/// Options of a folder import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FolderOptions {
	/// Tree runner defaults.
	#[serde(flatten)]
	pub runner: RunnerOptions,

	/// Types made globally addable for the duration of the import.
	#[serde(default)]
	pub temp_enable_types: Vec<String>,

	/// File names processed first among files of equal depth, in this order.
	#[serde(default)]
	pub custom_order: Vec<String>,

	/// Content types processed first among files of equal depth, in this order.
	#[serde(default)]
	pub types_order: Vec<String>,

	/// File name prefixes to ignore.
	#[serde(default)]
	pub exclude: Vec<String>,
}

impl FolderOptions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses options from TOML.
	///
	/// # Example
	///
	/// ```
	/// # use canopy_core::config::FolderOptions;
	/// let options = FolderOptions::from_toml_str(r#"
	/// default_lang = "de"
	/// default_wf_state = "published"
	/// custom_order = ["a-folder.json"]
	/// "#).unwrap();
	/// assert_eq!(options.runner.default_lang.as_deref(), Some("de"));
	/// assert_eq!(options.custom_order, vec!["a-folder.json".to_string()]);
	/// ```
	pub fn from_toml_str(content: &str) -> CanopyResult<Self> {
		Ok(toml::from_str(content)?)
	}

	/// Reads options from a TOML file.
	pub fn from_file(path: &Path) -> CanopyResult<Self> {
		Self::from_toml_str(&read_source(path)?)
	}

	/// Replaces the tree runner defaults.
	pub fn with_runner(mut self, runner: RunnerOptions) -> Self {
		self.runner = runner;
		self
	}

	/// Sets the folder local images and files are read from.
	pub fn with_base_image_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.runner.base_image_path = Some(path.into());
		self
	}

	/// Sets the language for nodes that declare none.
	pub fn with_default_lang(mut self, lang: impl Into<String>) -> Self {
		self.runner.default_lang = Some(lang.into());
		self
	}

	/// Sets the workflow state for nodes that declare none.
	pub fn with_default_wf_state(mut self, state: impl Into<String>) -> Self {
		self.runner.default_wf_state = Some(state.into());
		self
	}

	/// Leaves objects modified after `watermark` untouched.
	pub fn with_watermark(mut self, watermark: DateTime<Utc>) -> Self {
		self.runner.do_not_edit_if_modified_after = Some(watermark);
		self
	}

	/// Sets the types made globally addable during the import.
	pub fn with_temp_enable_types(mut self, types: Vec<String>) -> Self {
		self.temp_enable_types = types;
		self
	}

	/// Sets the file names processed first, in order.
	pub fn with_custom_order(mut self, order: Vec<String>) -> Self {
		self.custom_order = order;
		self
	}

	/// Sets the content types processed first, in order.
	pub fn with_types_order(mut self, order: Vec<String>) -> Self {
		self.types_order = order;
		self
	}

	/// Sets the file name prefixes to skip.
	pub fn with_exclude(mut self, prefixes: Vec<String>) -> Self {
		self.exclude = prefixes;
		self
	}
}

/// Parses a watermark given as RFC 3339, a naive date-time, or a bare date (midnight UTC).
pub fn parse_watermark(value: &str) -> Option<DateTime<Utc>> {
	let value = value.trim();
	if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
		return Some(dt.with_timezone(&Utc));
	}
	for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
		if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
			return Some(naive.and_utc());
		}
	}
	NaiveDate::parse_from_str(value, "%Y-%m-%d")
		.ok()
		.and_then(|date| date.and_hms_opt(0, 0, 0))
		.map(|naive| naive.and_utc())
}

fn deserialize_watermark<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
	D: Deserializer<'de>,
{
	let raw: Option<String> = Option::deserialize(deserializer)?;
	match raw {
		None => Ok(None),
		Some(value) => parse_watermark(&value).map(Some).ok_or_else(|| {
			serde::de::Error::custom(format!("invalid watermark '{value}'"))
		}),
	}
}
