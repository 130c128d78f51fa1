//! Declarative, idempotent content tree provisioning.
//!
//! This crate brings a content repository in line with a declared tree of
//! pages, folders, files and images. Re-running an import converges the
//! repository to the declaration instead of duplicating content:
//!
//! - **Tree runner**: reconciles nested [`DeclaredNode`]s, creating or
//!   editing one object per node
//! - **Folder import**: reads a content folder, orders its files so
//!   containers come first, and fixes up cross references afterwards
//! - **Assets**: attaches placeholder or local images and files
//! - **Translations**: links language variants from a CSV map
//!
//! # Quick Start
//!
//! ```
//! use canopy_core::prelude::*;
//!
//! let mut site = MemorySite::new();
//! let nodes = parse_nodes(r#"[
//!     {"@type": "Folder", "id": "news", "title": "News", "items": [
//!         {"@type": "Document", "title": "Launch"}
//!     ]}
//! ]"#).unwrap();
//! let options = RunnerOptions::new().with_default_wf_state("published");
//!
//! let mut importer = Importer::new(&mut site).with_log_handler(MemoryHandler::default());
//! importer.run_tree(&ContentPath::root(), &nodes, &options).unwrap();
//! let report = importer.into_report();
//!
//! assert_eq!(report.created.len(), 2);
//! let launch = site.get(&ContentPath::new("/news/launch")).unwrap();
//! assert_eq!(launch.review_state(), Some("published"));
//! ```
//!
//! # Architecture
//!
//! ## Collaborator ports
//!
//! The engine never talks to storage directly. It is generic over
//! [`ContentSite`](repository::ContentSite), the bundle of:
//!
//! - [`ContentRepository`](repository::ContentRepository) - storage, naming, workflow, indexes
//! - [`FieldDeserializer`](repository::FieldDeserializer) - schema-aware field population
//! - [`FieldSerializer`](repository::FieldSerializer) - client projection of a field
//! - [`TranslationManager`](repository::TranslationManager) - translation groups
//! - [`ScaleGenerator`](repository::ScaleGenerator) - derived image sizes
//!
//! [`MemorySite`](backends::memory::MemorySite) implements all of them in memory.
//!
//! ## Engine
//!
//! [`Importer`] is the context of a run. Its operations live in
//! `reconciler` (tree runner), `folder` (folder import), `fixup` (reference
//! fixup pass), `translations` and `siteroot`.
//!
//! ## Errors
//!
//! Node failures are recorded in the [`ImportReport`]. A failure while
//! applying fields aborts the run with [`CanopyError::Aborted`] unless
//! [`ImportSettings::continue_on_error`](config::ImportSettings) is set.

#![warn(rustdoc::missing_crate_level_docs)]

pub mod assets;
pub mod backends;
pub mod blocks;
pub mod config;
pub mod error;
pub mod fixup;
pub mod folder;
pub mod importer;
pub mod logging;
pub mod node;
pub mod ordering;
pub mod path;
pub mod prelude;
pub mod reconciler;
pub mod report;
pub mod repository;
pub mod resolver;
pub mod siteroot;
pub mod translations;

// Re-export commonly used types at crate root
pub use config::{FolderOptions, ImportSettings, RunnerOptions};
pub use error::{AssetError, CanopyError, CanopyResult, RepositoryError, RepositoryResult};
pub use folder::plan_folder;
pub use importer::{Importer, InspectionHook};
pub use node::{DeclaredNode, load_node, load_nodes, parse_nodes};
pub use path::ContentPath;
pub use report::{ImportReport, NodeFailure};
