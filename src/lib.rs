//! # Canopy
//!
//! Declarative, idempotent content tree provisioning for content-management
//! repositories.
//!
//! Canopy reads a declared site tree (JSON nodes, a site root body and a
//! translation map) and reconciles a repository with it. Re-running an
//! import edits what exists and creates what is missing, so seeding a site
//! at deploy time converges instead of duplicating content.
//!
//! ## Crates
//!
//! - `canopy-core` - declarations, collaborator ports, the import engine and
//!   the in-memory reference site
//! - `canopy-cli` - the `canopy` binary, previewing folder imports
//!
//! ## Quick Start
//!
//! ```
//! use canopy::prelude::*;
//!
//! let mut site = MemorySite::new();
//! let nodes = parse_nodes(r#"[{"@type": "Document", "title": "Front Page"}]"#).unwrap();
//!
//! Importer::new(&mut site)
//!     .with_log_handler(MemoryHandler::default())
//!     .run_tree(&ContentPath::root(), &nodes, &RunnerOptions::new())
//!     .unwrap();
//!
//! assert!(site.get(&ContentPath::new("/front-page")).is_some());
//! ```

pub use canopy_core::*;

/// Convenience re-exports for common usage.
pub mod prelude {
	pub use canopy_core::prelude::*;
}
