//! Error types for the import engine.
//!
//! Collaborator failures surface as [`RepositoryError`], asset materialization
//! failures as [`AssetError`], and everything that reaches the caller of a run
//! is a [`CanopyError`].

use std::path::PathBuf;

use thiserror::Error;

use crate::report::NodeFailure;

/// Errors reported by the content repository and its collaborators.
#[derive(Debug, Error)]
pub enum RepositoryError {
	/// No object exists at the given path.
	#[error("Content not found: {0}")]
	NotFound(String),

	/// The content type is unknown to the repository.
	#[error("Unknown content type: {0}")]
	UnknownType(String),

	/// The content type may not be added to the container.
	#[error("Type '{type_name}' is not addable in {container}")]
	NotAddable {
		/// Content type that was rejected.
		type_name: String,
		/// Path of the container.
		container: String,
	},

	/// An object with the same id already exists in the container.
	#[error("Id '{id}' is already taken in {container}")]
	IdTaken {
		/// Conflicting identifier.
		id: String,
		/// Path of the container.
		container: String,
	},

	/// The workflow cannot reach the requested state.
	#[error("Invalid workflow transition: {0}")]
	InvalidTransition(String),

	/// No deserializer is available for the content type.
	#[error("Cannot deserialize type {0}")]
	Unsupported(String),

	/// A declared field failed validation.
	#[error("Validation error: {field}: {message}")]
	Validation {
		/// Field that failed validation.
		field: String,
		/// Validation error message.
		message: String,
	},

	/// Derived image scales could not be produced.
	#[error("Scale generation failed for {field}: {message}")]
	Scale {
		/// Blob field the scales were requested for.
		field: String,
		/// Underlying cause.
		message: String,
	},

	/// The translation link is not possible.
	#[error("Translation error: {0}")]
	Translation(String),
}

/// Result type alias for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors raised while materializing binary assets for a node.
#[derive(Debug, Error)]
pub enum AssetError {
	/// A local asset referenced by a directive does not exist.
	#[error("Asset file not found: {}", .0.display())]
	FileNotFound(PathBuf),

	/// Reading an asset failed.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// The placeholder raster could not be encoded.
	#[error("Image error: {0}")]
	Image(#[from] image::ImageError),

	/// The directive value has a shape the key does not accept.
	#[error("Invalid asset directive '{key}': {message}")]
	InvalidDirective {
		/// Directive key (e.g. `set_local_image`).
		key: String,
		/// What was wrong with it.
		message: String,
	},

	/// The object exposes no field the directive could populate.
	#[error("Type '{type_name}' has no field for {key}")]
	MissingCapability {
		/// Directive key.
		key: String,
		/// Content type of the object.
		type_name: String,
	},
}

/// Top-level errors of an import run.
#[derive(Debug, Error)]
pub enum CanopyError {
	/// I/O operation failed.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON parsing failed.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// CSV parsing failed.
	#[error("CSV error: {0}")]
	Csv(#[from] csv::Error),

	/// The configuration file could not be parsed.
	#[error("Configuration error: {0}")]
	Config(#[from] toml::de::Error),

	/// An environment switch holds an unparsable value.
	#[error("Invalid value for {key}: {value}")]
	InvalidSetting {
		/// Environment variable name.
		key: String,
		/// Offending value.
		value: String,
	},

	/// A source file was not found.
	#[error("Source file not found: {}", .0.display())]
	FileNotFound(PathBuf),

	/// A collaborator failed outside any node boundary.
	#[error(transparent)]
	Repository(#[from] RepositoryError),

	/// Asset materialization failed outside any node boundary.
	#[error(transparent)]
	Asset(#[from] AssetError),

	/// A node failed and the run was not allowed to continue.
	#[error("Import aborted: {0}")]
	Aborted(Box<NodeFailure>),
}

/// Result type alias for import operations.
pub type CanopyResult<T> = Result<T, CanopyError>;
