//! Test helpers module

#[path = "helpers/content_folder.rs"]
pub mod content_folder;
