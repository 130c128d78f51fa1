//! Convenience re-exports for common usage.
//!
//! # Example
//!
//! ```
//! use canopy_core::prelude::*;
//!
//! let mut site = MemorySite::new();
//! let importer = Importer::new(&mut site).with_settings(ImportSettings::default());
//! assert!(importer.report().is_clean());
//! ```

// Error types
pub use crate::error::{AssetError, CanopyError, CanopyResult, RepositoryError, RepositoryResult};

// Declarations and configuration
pub use crate::config::{FolderOptions, ImportSettings, RunnerOptions};
pub use crate::node::{AssetDirective, DeclaredNode, NodeOptions, load_node, load_nodes, parse_nodes};
pub use crate::path::ContentPath;

// Engine
pub use crate::folder::{FolderPlan, plan_folder};
pub use crate::importer::{Importer, InspectionHook};
pub use crate::logging::{LogHandler, LogLevel, LogRecord, MemoryHandler, TracingHandler};
pub use crate::ordering::{SourceFile, sort_sources};
pub use crate::report::{FileError, ImportReport, NodeFailure, TranslationRowError};

// Ports
pub use crate::repository::{
	ContentObject, ContentRepository, ContentSite, FieldDeserializer, FieldSerializer,
	ScaleGenerator, TranslationManager,
};

// Reference backend
pub use crate::backends::memory::{MemoryObject, MemorySite};
