//! Node reconciliation and the recursive tree runner.
//!
//! Each declared node is brought to its declared state in a fixed sequence:
//! locate or create, staleness guard, language and workflow defaults,
//! default body, assets, field deserialization, create/edit housekeeping,
//! identity pin, workflow transition, structural options, final reindex.
//! Children are processed afterwards with the resolved object as container.
//!
//! Failures before the object exists (missing type, unresolvable id, creation
//! refused, no deserializer) only drop the node and its subtree. Failures
//! after that point abort the run unless continue-on-error is set.

use serde_json::Value;

use crate::assets::attach_assets;
use crate::blocks::{default_blocks, default_blocks_layout, has_blocks};
use crate::config::RunnerOptions;
use crate::error::{CanopyError, CanopyResult};
use crate::importer::Importer;
use crate::node::DeclaredNode;
use crate::path::ContentPath;
use crate::report::NodeFailure;
use crate::repository::{
	ContentObject, ContentRepository, ContentSite, DeserializeOptions, FieldDeserializer,
	ScaleGenerator,
};
use crate::resolver::resolve_id;

/// Workflow state that stamps an effective date when none is declared.
pub const PUBLISHED_STATE: &str = "published";

/// Whether a located object was created in this run or already existed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
	Create,
	Edit,
}

impl<'a, S: ContentSite> Importer<'a, S> {
	/// Runs a declared tree under `container` as a topmost call.
	///
	/// An abort is handed to the inspection hook before it is returned.
	pub fn run_tree(
		&mut self,
		container: &ContentPath,
		nodes: &[DeclaredNode],
		options: &RunnerOptions,
	) -> CanopyResult<()> {
		let result = self.create_items(container, nodes, options);
		self.inspect_abort(result)
	}

	/// Reconciles `nodes` in order under `container`, then their children.
	pub fn create_items(
		&mut self,
		container: &ContentPath,
		nodes: &[DeclaredNode],
		options: &RunnerOptions,
	) -> CanopyResult<()> {
		for node in nodes {
			self.create_item(container, node, options)?;
		}
		Ok(())
	}

	/// Reconciles one node and its children.
	///
	/// Returns the path the node was written to, or `None` when it was skipped.
	pub fn create_item(
		&mut self,
		container: &ContentPath,
		node: &DeclaredNode,
		options: &RunnerOptions,
	) -> CanopyResult<Option<ContentPath>> {
		let Some(path) = self.reconcile(container, node, options)? else {
			return Ok(None);
		};
		self.create_items(&path, &node.items, options)?;
		Ok(Some(path))
	}

	/// Reconciles a single node. Returns the object path when children should follow.
	fn reconcile(
		&mut self,
		container: &ContentPath,
		node: &DeclaredNode,
		options: &RunnerOptions,
	) -> CanopyResult<Option<ContentPath>> {
		let failure = |id: Option<&str>, cause: String| {
			NodeFailure::new(
				container.clone(),
				id.map(str::to_string),
				node.type_name.clone(),
				node.title.clone(),
				cause,
			)
		};

		let Some(type_name) = node.type_name.as_deref() else {
			self.log.warning("Property '@type' is required");
			self.report.failures.push(failure(
				node.id.as_deref(),
				"property '@type' is required".to_string(),
			));
			return Ok(None);
		};

		let id = match resolve_id(&mut *self.site, node, container) {
			Ok(id) => id,
			Err(e) => {
				self.skip_node(failure(node.id.as_deref(), e.to_string()));
				return Ok(None);
			}
		};

		let path = container.join(&id);
		let (object, mode) = match self.site.get(&path) {
			Some(existing) => {
				if let (Some(watermark), Some(modified)) =
					(options.do_not_edit_if_modified_after, existing.modified())
					&& modified > watermark
				{
					self.log.info(&format!(
						"{path} - skipped, modified {modified} after {watermark}"
					));
					self.report.skipped_stale.push(path);
					return Ok(None);
				}
				(existing, Mode::Edit)
			}
			None => match self.site.create(container, type_name, Some(&id), node.title.as_deref()) {
				Ok(created) => (created, Mode::Create),
				Err(e) => {
					self.skip_node(failure(Some(&id), e.to_string()));
					return Ok(None);
				}
			},
		};

		if !self.site.can_deserialize(&object) {
			self.skip_node(failure(
				Some(&id),
				format!("Cannot deserialize type {}", object.type_name()),
			));
			return Ok(None);
		}

		match self.apply(container, node, object, mode, options) {
			Ok(path) => Ok(Some(path)),
			Err(cause) => {
				self.fail_node(failure(Some(&id), cause.to_string()))?;
				Ok(None)
			}
		}
	}

	/// Everything inside the field boundary.
	fn apply(
		&mut self,
		container: &ContentPath,
		node: &DeclaredNode,
		mut object: S::Object,
		mode: Mode,
		options: &RunnerOptions,
	) -> CanopyResult<ContentPath> {
		let mut payload = node.field_payload();

		if node.language.as_deref().is_none_or(str::is_empty)
			&& let Some(language) = self.default_language(container, &object, options)
		{
			payload.insert("language".to_string(), Value::String(language));
		}

		let review_state = if options.ignores_workflow(object.type_name()) {
			None
		} else {
			node.review_state
				.clone()
				.filter(|s| !s.is_empty())
				.or_else(|| options.default_wf_state.clone())
		};

		if !node.has_blocks()
			&& let Some(body) = object.structured_body()
			&& !has_blocks(body.blocks())
		{
			body.set_blocks(default_blocks());
			body.set_blocks_layout(default_blocks_layout());
		}

		let attached = attach_assets(node, &mut object, options.base_image_path.as_deref())?;

		let outcome = self.site.deserialize(
			&mut object,
			container,
			&payload,
			DeserializeOptions {
				validate_all: true,
				create: true,
			},
		)?;

		match mode {
			Mode::Create => {
				if !outcome.notified_create {
					self.site.notify_created(&object);
				}
				object = self.site.add(container, object, node.declared_id().is_none())?;
				if !self.settings.skip_scales {
					for field in &attached.image_fields {
						self.generate_scales(&object, field);
					}
				}
			}
			Mode::Edit => {
				if !outcome.modified_fields.is_empty() {
					self.site.notify_modified(&object, &outcome.modified_fields);
				}
			}
		}

		if let Some(uid) = node.uid.as_deref().filter(|u| !u.is_empty()) {
			object.set_uid(uid);
			self.site.reindex(&object, &["UID"])?;
		}

		if let Some(state) = review_state {
			self.site.transition(&mut object, &state)?;
			if state == PUBLISHED_STATE && !node.has_effective() {
				object.set_effective(self.now());
			}
		}

		self.apply_options(container, node, &mut object)?;

		self.site.reindex(&object, &[])?;

		let path = object.path().clone();
		match mode {
			Mode::Create => {
				self.log.info(&format!("{path} - created"));
				self.report.created.push(path.clone());
			}
			Mode::Edit => {
				self.log.info(&format!("{path} - edited"));
				self.report.edited.push(path.clone());
			}
		}
		Ok(path)
	}

	fn default_language(
		&self,
		container: &ContentPath,
		object: &S::Object,
		options: &RunnerOptions,
	) -> Option<String> {
		let policy = self.site.language_policy();
		if policy.derives_from_path() && object.language().is_none() {
			return policy.language_from_path(container).map(str::to_string);
		}
		if object.language().is_none() {
			return options.default_lang.clone();
		}
		None
	}

	fn generate_scales(&mut self, object: &S::Object, field: &str) {
		let path = object.path().clone();
		self.log
			.debug(&format!("{path} - generating image scales for {field} field"));
		match ScaleGenerator::generate_scales(&mut *self.site, object, field) {
			Ok(count) => self.log.debug(&format!("{path} - {count} scales for {field}")),
			Err(e) => self
				.log
				.warning(&format!("{path} - scales not generated for {field}: {e}")),
		}
	}

	fn apply_options(
		&mut self,
		container: &ContentPath,
		node: &DeclaredNode,
		object: &mut S::Object,
	) -> Result<(), CanopyError> {
		let opts = &node.opts;
		let path = object.path().clone();

		if opts.default_page {
			self.site.set_default_page(container, object.id())?;
		}

		if let Some(view) = opts.default_view.as_deref().filter(|v| !v.is_empty()) {
			object.set_layout(view);
		}

		if opts.exclude_from_nav {
			object.set_exclude_from_nav(true);
			self.site.reindex(object, &["exclude_from_nav"])?;
		}

		let locally = &opts.locally_allowed_types;
		let immediately = &opts.immediately_allowed_types;
		if !locally.is_empty() || !immediately.is_empty() {
			match object.type_constraints() {
				Some(constraints) => {
					constraints.enable_constraints();
					if !locally.is_empty() {
						constraints.set_locally_allowed_types(locally.clone());
						self.log
							.warning(&format!("{path} - locally_allowed_types {locally:?}"));
					}
					if !immediately.is_empty() {
						constraints.set_immediately_addable_types(immediately.clone());
						self.log
							.warning(&format!("{path} - immediately_allowed_types {immediately:?}"));
					}
				}
				None => self
					.log
					.warning(&format!("{path} - type constraints not supported, ignored")),
			}
		}

		for (principal, roles) in &opts.local_roles {
			object.grant_local_roles(principal, roles);
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::backends::memory::{MemorySite, SiteEvent};
	use crate::blocks::{TEXT_BLOCK_ID, TITLE_BLOCK_ID};
	use crate::config::ImportSettings;
	use crate::logging::{LogLevel, MemoryHandler};
	use crate::node::parse_nodes;
	use chrono::{DateTime, TimeZone, Utc};
	use rstest::{fixture, rstest};
	use serde_json::json;

	fn fixed_now() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap()
	}

	#[fixture]
	fn site() -> MemorySite {
		MemorySite::new()
	}

	fn run(
		site: &mut MemorySite,
		settings: ImportSettings,
		content: &str,
		options: &RunnerOptions,
	) -> (CanopyResult<()>, crate::report::ImportReport, MemoryHandler) {
		let log = MemoryHandler::default();
		let nodes = parse_nodes(content).unwrap();
		let mut importer = Importer::new(site)
			.with_settings(settings)
			.with_log_handler(log.clone())
			.with_clock(fixed_now);
		let result = importer.run_tree(&ContentPath::root(), &nodes, options);
		(result, importer.into_report(), log)
	}

	#[rstest]
	fn test_nested_publish_with_effective_dates(mut site: MemorySite) {
		// Arrange
		let content = r#"[
			{"@type": "Folder", "id": "a", "title": "A", "items": [
				{"@type": "Document", "id": "b", "title": "B"}
			]}
		]"#;
		let options = RunnerOptions::new().with_default_wf_state("published");

		// Act
		let (result, report, _) = run(&mut site, ImportSettings::default(), content, &options);

		// Assert
		result.unwrap();
		assert_eq!(
			report.created,
			vec![ContentPath::new("/a"), ContentPath::new("/a/b")]
		);
		for path in ["/a", "/a/b"] {
			let object = site.get(&ContentPath::new(path)).unwrap();
			assert_eq!(object.review_state(), Some("published"));
			assert_eq!(object.effective(), Some(fixed_now()));
		}
	}

	#[rstest]
	fn test_declared_effective_is_kept(mut site: MemorySite) {
		let content = r#"[{"@type": "Document", "id": "d", "title": "D",
			"review_state": "published", "effective": "2020-01-01T00:00:00+00:00"}]"#;

		let (result, _, _) = run(&mut site, ImportSettings::default(), content, &RunnerOptions::new());

		result.unwrap();
		let object = site.get(&ContentPath::new("/d")).unwrap();
		assert_eq!(
			object.effective(),
			Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())
		);
	}

	#[rstest]
	fn test_default_blocks_only_when_absent(mut site: MemorySite) {
		// Arrange
		let content = r#"[
			{"@type": "Document", "id": "empty", "title": "Empty"},
			{"@type": "Document", "id": "full", "title": "Full",
			 "blocks": {"x": {"@type": "image"}}, "blocks_layout": {"items": ["x"]}}
		]"#;

		// Act
		let (result, _, _) = run(&mut site, ImportSettings::default(), content, &RunnerOptions::new());

		// Assert
		result.unwrap();
		let empty = site.get(&ContentPath::new("/empty")).unwrap();
		let blocks = empty.blocks().unwrap();
		assert_eq!(blocks[TITLE_BLOCK_ID]["@type"], "title");
		assert_eq!(blocks[TEXT_BLOCK_ID]["@type"], "slate");
		let full = site.get(&ContentPath::new("/full")).unwrap();
		assert_eq!(full.blocks().unwrap(), &json!({"x": {"@type": "image"}}));
	}

	#[rstest]
	fn test_missing_type_skips_node_only(mut site: MemorySite) {
		let content = r#"[
			{"id": "typeless", "title": "No type", "items": [{"@type": "Document", "id": "child"}]},
			{"@type": "Document", "id": "sibling", "title": "Sibling"}
		]"#;

		let (result, report, log) = run(&mut site, ImportSettings::default(), content, &RunnerOptions::new());

		result.unwrap();
		assert!(log.contains(LogLevel::Warning, "'@type' is required"));
		assert_eq!(report.failures.len(), 1);
		assert!(site.get(&ContentPath::new("/typeless")).is_none());
		assert!(site.get(&ContentPath::new("/typeless/child")).is_none());
		assert!(site.get(&ContentPath::new("/sibling")).is_some());
	}

	#[rstest]
	fn test_blank_id_creates_child_instead_of_editing_container(mut site: MemorySite) {
		// Arrange
		let content = r#"[{"@type": "Folder", "id": "parent", "title": "Parent",
			"items": [{"@type": "Document", "id": "", "title": "Child"}]}]"#;

		// Act
		let (result, report, _) = run(&mut site, ImportSettings::default(), content, &RunnerOptions::new());

		// Assert
		result.unwrap();
		let parent = site.get(&ContentPath::new("/parent")).unwrap();
		assert_eq!(parent.title(), Some("Parent"));
		assert_eq!(site.children(&ContentPath::new("/parent")), vec!["child"]);
		assert!(report.edited.is_empty());
	}

	#[rstest]
	fn test_id_with_slash_is_node_local_failure(mut site: MemorySite) {
		// Arrange
		site.seed(&ContentPath::root(), "Folder", "a", "A").unwrap();
		site.seed(&ContentPath::new("/a"), "Document", "b", "B").unwrap();
		let content = r#"[
			{"@type": "Document", "id": "a/b", "title": "Hijack"},
			{"@type": "Document", "id": "after", "title": "After"}
		]"#;

		// Act
		let (result, report, _) = run(&mut site, ImportSettings::default(), content, &RunnerOptions::new());

		// Assert
		result.unwrap();
		assert_eq!(site.get(&ContentPath::new("/a/b")).unwrap().title(), Some("B"));
		assert_eq!(report.failures.len(), 1);
		assert!(report.failures[0].cause.contains("must not contain '/'"));
		assert!(site.get(&ContentPath::new("/after")).is_some());
	}

	#[rstest]
	fn test_creation_failure_is_node_local(mut site: MemorySite) {
		// Arrange
		let content = r#"[
			{"@type": "Spaceship", "id": "enterprise", "title": "Enterprise",
			 "items": [{"@type": "Document", "id": "bridge", "title": "Bridge"}]},
			{"@type": "Document", "id": "after", "title": "After"}
		]"#;

		// Act
		let (result, report, log) = run(&mut site, ImportSettings::default(), content, &RunnerOptions::new());

		// Assert
		result.unwrap();
		assert_eq!(report.failures.len(), 1);
		assert_eq!(report.failures[0].id.as_deref(), Some("enterprise"));
		assert!(log.contains(LogLevel::Error, "Spaceship"));
		assert!(site.get(&ContentPath::new("/after")).is_some());
	}

	#[rstest]
	fn test_field_failure_aborts_by_default(mut site: MemorySite) {
		// Arrange
		let content = r#"[
			{"@type": "Document", "id": "bad", "title": "Bad", "effective": "not a date"},
			{"@type": "Document", "id": "after", "title": "After"}
		]"#;

		// Act
		let (result, report, _) = run(&mut site, ImportSettings::default(), content, &RunnerOptions::new());

		// Assert
		match result {
			Err(CanopyError::Aborted(failure)) => {
				assert_eq!(failure.id.as_deref(), Some("bad"));
				assert!(failure.cause.contains("effective"));
			}
			other => panic!("expected abort, got {other:?}"),
		}
		assert_eq!(report.failures.len(), 1);
		assert!(site.get(&ContentPath::new("/after")).is_none());
	}

	#[rstest]
	fn test_field_failure_continues_when_configured(mut site: MemorySite) {
		// Arrange
		let content = r#"[
			{"@type": "Document", "id": "bad", "title": "Bad", "effective": "not a date",
			 "items": [{"@type": "Document", "id": "child", "title": "Child"}]},
			{"@type": "Document", "id": "after", "title": "After"}
		]"#;
		let settings = ImportSettings::default().with_continue_on_error(true);

		// Act
		let (result, report, _) = run(&mut site, settings, content, &RunnerOptions::new());

		// Assert
		result.unwrap();
		assert_eq!(report.failures.len(), 1);
		assert!(site.get(&ContentPath::new("/bad")).is_none());
		assert!(site.get(&ContentPath::new("/bad/child")).is_none());
		assert!(site.get(&ContentPath::new("/after")).is_some());
	}

	#[rstest]
	fn test_watermark_skips_subtree(mut site: MemorySite) {
		// Arrange
		let content = r#"[{"@type": "Folder", "id": "f", "title": "Declared",
			"items": [{"@type": "Document", "id": "new-child", "title": "New"}]}]"#;
		run(&mut site, ImportSettings::default(), content, &RunnerOptions::new()).0.unwrap();
		site.edit(&ContentPath::new("/f"), |object| object.set_title("Manual"))
			.unwrap();
		site.delete(&ContentPath::new("/f/new-child")).unwrap();
		site.touch(
			&ContentPath::new("/f"),
			Utc.with_ymd_and_hms(2021, 8, 1, 0, 0, 0).unwrap(),
		)
		.unwrap();
		let options = RunnerOptions::new()
			.with_watermark(Utc.with_ymd_and_hms(2021, 7, 12, 0, 0, 0).unwrap());

		// Act
		let (result, report, _) = run(&mut site, ImportSettings::default(), content, &options);

		// Assert
		result.unwrap();
		assert_eq!(report.skipped_stale, vec![ContentPath::new("/f")]);
		let folder = site.get(&ContentPath::new("/f")).unwrap();
		assert_eq!(folder.title(), Some("Manual"));
		assert!(site.get(&ContentPath::new("/f/new-child")).is_none());
	}

	#[rstest]
	fn test_rerun_restores_declared_title(mut site: MemorySite) {
		// Arrange
		let content = r#"[{"@type": "Document", "title": "Front Page"}]"#;
		run(&mut site, ImportSettings::default(), content, &RunnerOptions::new()).0.unwrap();
		site.edit(&ContentPath::new("/front-page"), |object| object.set_title("Changed"))
			.unwrap();

		// Act
		let (result, report, _) = run(&mut site, ImportSettings::default(), content, &RunnerOptions::new());

		// Assert
		result.unwrap();
		assert_eq!(report.edited, vec![ContentPath::new("/front-page")]);
		assert_eq!(site.children(&ContentPath::root()), vec!["front-page"]);
		let object = site.get(&ContentPath::new("/front-page")).unwrap();
		assert_eq!(object.title(), Some("Front Page"));
		assert!(site.events().iter().any(|e| matches!(
			e,
			SiteEvent::Modified { path, fields } if path.as_str() == "/front-page" && fields.contains(&"title".to_string())
		)));
	}

	#[rstest]
	fn test_uid_pin_and_options(mut site: MemorySite) {
		// Arrange
		let content = r#"[{"@type": "Folder", "id": "f", "title": "F", "items": [
			{"@type": "Document", "id": "d", "title": "D",
			 "UID": "1f699ffa110e45afb1ba502f75f7ec33",
			 "opts": {
				"default_page": true,
				"default_view": "summary_view",
				"exclude_from_nav": true,
				"local_roles": {"editors": ["Editor", "Reader"]},
				"locally_allowed_types": ["Document"],
				"immediately_allowed_types": ["Document"]
			 }}
		]}]"#;

		// Act
		let (result, _, log) = run(&mut site, ImportSettings::default(), content, &RunnerOptions::new());

		// Assert
		result.unwrap();
		let doc = site.get(&ContentPath::new("/f/d")).unwrap();
		assert_eq!(doc.uid(), Some("1f699ffa110e45afb1ba502f75f7ec33"));
		assert_eq!(
			site.find_by_uid("1f699ffa110e45afb1ba502f75f7ec33"),
			Some(ContentPath::new("/f/d"))
		);
		assert_eq!(site.default_page(&ContentPath::new("/f")).as_deref(), Some("d"));
		assert_eq!(doc.layout(), Some("summary_view"));
		assert!(doc.exclude_from_nav());
		assert_eq!(
			doc.local_roles()["editors"],
			vec!["Editor".to_string(), "Reader".to_string()]
		);
		assert_eq!(doc.locally_allowed_types(), Some(&["Document".to_string()][..]));
		assert!(log.contains(LogLevel::Warning, "locally_allowed_types"));
	}

	#[rstest]
	fn test_workflow_ignored_types(mut site: MemorySite) {
		let content = r#"[{"@type": "Image", "id": "pic", "title": "Pic",
			"review_state": "published", "set_dummy_image": true}]"#;
		let options = RunnerOptions::new().with_default_wf_state("published");

		let (result, _, _) = run(&mut site, ImportSettings::default(), content, &options);

		result.unwrap();
		let pic = site.get(&ContentPath::new("/pic")).unwrap();
		assert_eq!(pic.review_state(), None);
		assert!(!site.scales(&ContentPath::new("/pic"), "image").is_empty());
	}

	#[rstest]
	fn test_skip_scales(mut site: MemorySite) {
		let content = r#"[{"@type": "Image", "id": "pic", "title": "Pic", "set_dummy_image": true}]"#;
		let settings = ImportSettings::default().with_skip_scales(true);

		let (result, _, _) = run(&mut site, settings, content, &RunnerOptions::new());

		result.unwrap();
		assert!(site.scales(&ContentPath::new("/pic"), "image").is_empty());
	}

	#[rstest]
	fn test_default_language(mut site: MemorySite) {
		let content = r#"[
			{"@type": "Document", "id": "plain", "title": "Plain"},
			{"@type": "Document", "id": "declared", "title": "Declared", "language": "fr"}
		]"#;
		let options = RunnerOptions::new().with_default_lang("de");

		let (result, _, _) = run(&mut site, ImportSettings::default(), content, &options);

		result.unwrap();
		assert_eq!(site.get(&ContentPath::new("/plain")).unwrap().language(), Some("de"));
		assert_eq!(site.get(&ContentPath::new("/declared")).unwrap().language(), Some("fr"));
	}

	#[rstest]
	fn test_language_from_language_root() {
		// Arrange
		let mut site = MemorySite::new().with_languages(true, &["de", "en"]);
		let content = r#"[
			{"@type": "Folder", "id": "en", "title": "English", "language": "en", "items": [
				{"@type": "Document", "id": "about", "title": "About"}
			]}
		]"#;
		let options = RunnerOptions::new().with_default_lang("de");

		// Act
		let (result, _, _) = run(&mut site, ImportSettings::default(), content, &options);

		// Assert
		result.unwrap();
		let about = site.get(&ContentPath::new("/en/about")).unwrap();
		assert_eq!(about.language(), Some("en"));
	}
}
