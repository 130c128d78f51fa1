//! Folder-driven imports.
//!
//! A content folder holds:
//!
//! - `content.json`: a nested tree applied under the site root,
//! - `siteroot.json`: the site root's own block body,
//! - `translations.csv`: translation links, applied last,
//! - `<dotted.path.id>.json`: one node each, placed by its file name.
//!
//! Subdirectories, the `images` entry and names matching an exclude prefix
//! are ignored. Per-file nodes run in [`ordering`](crate::ordering) order,
//! their missing containers are synthesized, and a reference fixup pass
//! follows once everything exists.

use std::path::{Path, PathBuf};

use crate::config::FolderOptions;
use crate::error::{CanopyError, CanopyResult};
use crate::importer::Importer;
use crate::node::{DeclaredNode, load_node, load_nodes};
use crate::ordering::{SourceFile, sort_sources};
use crate::path::ContentPath;
use crate::reconciler::PUBLISHED_STATE;
use crate::report::{FileError, ImportReport};
use crate::repository::{ContentRepository, ContentSite};

/// Tree applied under the site root.
pub const CONTENT_FILE: &str = "content.json";

/// Site root body.
pub const SITE_ROOT_FILE: &str = "siteroot.json";

/// Translation map.
pub const TRANSLATIONS_FILE: &str = "translations.csv";

/// Entry reserved for local assets.
pub const IMAGES_ENTRY: &str = "images";

/// Type of a synthesized immediate container.
pub const SYNTHESIZED_CONTAINER_TYPE: &str = "Document";

/// Type of synthesized ancestors above the immediate container.
pub const SYNTHESIZED_ANCESTOR_TYPE: &str = "Folder";

/// A per-file node, read and placed.
#[derive(Debug, Clone)]
pub struct PlannedSource {
	pub source: SourceFile,
	pub file: PathBuf,
	pub node: DeclaredNode,
}

/// What a folder import will do, in order.
#[derive(Debug, Clone, Default)]
pub struct FolderPlan {
	pub content: Option<PathBuf>,
	pub site_root: Option<PathBuf>,
	/// Per-file nodes, sorted.
	pub sources: Vec<PlannedSource>,
	pub translations: Option<PathBuf>,
	/// Files that could not be read, parsed or placed.
	pub errors: Vec<FileError>,
}

impl FolderPlan {
	/// File names in processing order.
	pub fn order(&self) -> Vec<String> {
		let name = |path: &PathBuf| {
			path.file_name()
				.map(|n| n.to_string_lossy().into_owned())
				.unwrap_or_default()
		};
		self.content
			.iter()
			.chain(self.site_root.iter())
			.map(name)
			.chain(self.sources.iter().map(|s| s.source.file_name.clone()))
			.chain(self.translations.iter().map(name))
			.collect()
	}
}

/// Lists, classifies, reads and sorts the entries of a content folder.
pub fn plan_folder(folder: &Path, options: &FolderOptions) -> CanopyResult<FolderPlan> {
	let entries = std::fs::read_dir(folder).map_err(|e| {
		if e.kind() == std::io::ErrorKind::NotFound {
			CanopyError::FileNotFound(folder.to_path_buf())
		} else {
			CanopyError::Io(e)
		}
	})?;

	let mut names = Vec::new();
	for entry in entries {
		let entry = entry?;
		if entry.file_type()?.is_dir() {
			continue;
		}
		names.push(entry.file_name().to_string_lossy().into_owned());
	}
	names.sort();

	let mut plan = FolderPlan::default();
	let mut sources = Vec::new();
	for name in names {
		if is_excluded(&name, &options.exclude) {
			continue;
		}
		let file = folder.join(&name);
		match name.as_str() {
			CONTENT_FILE => plan.content = Some(file),
			SITE_ROOT_FILE => plan.site_root = Some(file),
			TRANSLATIONS_FILE => plan.translations = Some(file),
			IMAGES_ENTRY => {}
			_ => match read_source_file(&name, &file) {
				Ok(planned) => sources.push(planned),
				Err(message) => plan.errors.push(FileError { file, message }),
			},
		}
	}

	let mut files: Vec<SourceFile> = sources.iter().map(|s: &PlannedSource| s.source.clone()).collect();
	sort_sources(&mut files, &options.custom_order, &options.types_order);
	for source in files {
		if let Some(index) = sources.iter().position(|s| s.source.file_name == source.file_name) {
			plan.sources.push(sources.swap_remove(index));
		}
	}
	Ok(plan)
}

fn is_excluded(name: &str, exclude: &[String]) -> bool {
	exclude
		.iter()
		.filter(|prefix| !prefix.is_empty())
		.any(|prefix| name.starts_with(prefix.as_str()))
}

fn read_source_file(name: &str, file: &Path) -> Result<PlannedSource, String> {
	let source = SourceFile::parse(name)
		.ok_or_else(|| format!("Cannot derive a content path from \"{name}\""))?;
	let node = load_node(file)
		.map_err(|e| format!("Error in file structure: \"{}\": {e}", file.display()))?;
	Ok(PlannedSource {
		source: source.with_type(node.type_name.clone()),
		file: file.to_path_buf(),
		node,
	})
}

impl<'a, S: ContentSite> Importer<'a, S> {
	/// Imports a content folder and returns the run's report.
	///
	/// Types listed in `temp_enable_types` are made globally addable for the
	/// run and restored to their previous flag afterwards, also on abort.
	pub fn import_folder(&mut self, folder: &Path, options: &FolderOptions) -> CanopyResult<ImportReport> {
		let plan = plan_folder(folder, options)?;
		let previous = self.enable_types(&options.temp_enable_types);
		let result = self.run_plan(&plan, options);
		self.restore_types(previous);
		self.inspect_abort(result)?;
		Ok(self.take_report())
	}

	fn run_plan(&mut self, plan: &FolderPlan, options: &FolderOptions) -> CanopyResult<()> {
		let root = self.site.site_root();
		for error in &plan.errors {
			self.file_error(error.file.clone(), error.message.clone());
		}

		let mut content = None;
		if let Some(file) = &plan.content {
			self.log.debug("content.json file found, creating content");
			match load_nodes(file) {
				Ok(nodes) => {
					self.create_items(&root, &nodes, &options.runner)?;
					content = Some(nodes);
				}
				Err(e) => self.file_error(
					file.clone(),
					format!("Error in file structure: \"{}\": {e}", file.display()),
				),
			}
		}

		if let Some(file) = &plan.site_root {
			self.log.debug("Site root info found, applying changes");
			if let Err(e) = self.apply_site_root_file(file) {
				self.file_error(file.clone(), e.to_string());
			}
		}

		let mut written = Vec::with_capacity(plan.sources.len());
		for planned in &plan.sources {
			let container = planned.source.container.clone();
			let mut node = planned.node.clone();
			if self.site.get(&container).is_some() {
				if node.declared_id().is_none() {
					node.id = Some(planned.source.id.clone());
				}
			} else {
				self.log.error(&format!(
					"Could not look up container under \"{container}\""
				));
				self.synthesize_container(&container, true)?;
			}
			if let Some(path) = self.create_item(&container, &node, &options.runner)? {
				written.push((planned.source.file_name.as_str(), path));
			}
		}

		if !plan.sources.is_empty() || content.is_some() {
			self.log.debug("Refreshing content serialization after creation...");
		}
		for (file_name, path) in &written {
			self.refresh_written(file_name, path);
		}
		if let Some(nodes) = &content {
			self.log.debug(
				"Refreshing structured (content.json) content serialization after creation...",
			);
			self.refresh_by_structure(&root, nodes);
		}

		if let Some(file) = &plan.translations
			&& let Err(e) = self.link_translations(file)
		{
			self.file_error(file.clone(), e.to_string());
		}
		Ok(())
	}

	/// Creates the missing objects along `path`, each published.
	///
	/// The object at `path` itself is a document when `immediate` is set,
	/// ancestors are folders.
	fn synthesize_container(&mut self, path: &ContentPath, immediate: bool) -> CanopyResult<()> {
		if self.site.get(path).is_some() {
			return Ok(());
		}
		let (Some(parent), Some(id)) = (path.parent(), path.leaf()) else {
			return Ok(());
		};
		self.synthesize_container(&parent, false)?;

		self.log.info(&format!("{path} - create"));
		let type_name = if immediate {
			SYNTHESIZED_CONTAINER_TYPE
		} else {
			SYNTHESIZED_ANCESTOR_TYPE
		};
		let object = self.site.create(&parent, type_name, Some(id), None)?;
		let mut object = self.site.add(&parent, object, false)?;
		self.site.notify_created(&object);
		self.site.transition(&mut object, PUBLISHED_STATE)?;
		self.site.reindex(&object, &[])?;
		self.report.created.push(path.clone());
		Ok(())
	}

	fn enable_types(&mut self, types: &[String]) -> Vec<(String, bool)> {
		let mut previous = Vec::with_capacity(types.len());
		for type_name in types {
			match self.site.set_globally_allowed(type_name, true) {
				Ok(flag) => previous.push((type_name.clone(), flag)),
				Err(e) => self
					.log
					.warning(&format!("cannot enable type {type_name}: {e}")),
			}
		}
		previous
	}

	fn restore_types(&mut self, previous: Vec<(String, bool)>) {
		for (type_name, flag) in previous.into_iter().rev() {
			if let Err(e) = self.site.set_globally_allowed(&type_name, flag) {
				self.log
					.warning(&format!("cannot restore type {type_name}: {e}"));
			}
		}
	}

	fn file_error(&mut self, file: PathBuf, message: String) {
		self.log.error(&message);
		self.report.file_errors.push(FileError { file, message });
	}
}
