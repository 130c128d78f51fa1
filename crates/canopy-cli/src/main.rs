//! Canopy CLI
//!
//! Previews a content folder import against an in-memory site.
//!
//! ## Usage
//!
//! ```bash
//! canopy import content/ --default-wf-state published --dump
//! canopy import content/ --config canopy.toml --languages de,en
//! canopy order content/
//! ```
//!
//! The process-wide switches are also read from `CANOPY_CONTINUE_ON_ERROR`,
//! `CANOPY_DEBUG` and `CANOPY_SKIP_SCALES`; command-line flags can only turn
//! them on.

mod output;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use canopy_core::backends::memory::MemorySite;
use canopy_core::logging::TracingHandler;
use canopy_core::{FolderOptions, ImportSettings, Importer, NodeFailure, plan_folder};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "canopy")]
#[command(about = "Declarative content tree importer", long_about = None)]
#[command(version)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Verbosity level (can be repeated)
	#[arg(short, long, action = clap::ArgAction::Count, global = true)]
	verbosity: u8,
}

#[derive(Subcommand)]
enum Commands {
	/// Import a content folder into an in-memory site and report the outcome
	Import {
		/// Content folder
		#[arg(value_name = "FOLDER")]
		folder: PathBuf,

		/// Folder with local images and files (defaults to FOLDER/images)
		#[arg(long, value_name = "DIR")]
		images: Option<PathBuf>,

		/// TOML file with folder import options
		#[arg(long, value_name = "FILE")]
		config: Option<PathBuf>,

		/// Language for nodes that declare none
		#[arg(long, value_name = "LANG")]
		default_lang: Option<String>,

		/// Workflow state for nodes that declare none
		#[arg(long, value_name = "STATE")]
		default_wf_state: Option<String>,

		/// Supported languages; more than one makes the site multilingual
		#[arg(long, value_name = "LANGS", value_delimiter = ',')]
		languages: Vec<String>,

		/// Keep going after a node fails
		#[arg(long)]
		continue_on_error: bool,

		/// Print the failing node when a run aborts
		#[arg(long)]
		debug: bool,

		/// Do not generate image scales
		#[arg(long)]
		skip_scales: bool,

		/// Print the resulting tree as JSON
		#[arg(long)]
		dump: bool,
	},

	/// Print the order in which the files of a content folder are processed
	Order {
		/// Content folder
		#[arg(value_name = "FOLDER")]
		folder: PathBuf,

		/// TOML file with folder import options
		#[arg(long, value_name = "FILE")]
		config: Option<PathBuf>,
	},
}

fn main() {
	let cli = Cli::parse();
	init_tracing(cli.verbosity);

	let result = match cli.command {
		Commands::Import {
			folder,
			images,
			config,
			default_lang,
			default_wf_state,
			languages,
			continue_on_error,
			debug,
			skip_scales,
			dump,
		} => {
			let overrides = ImportOverrides {
				images,
				default_lang,
				default_wf_state,
				languages,
				continue_on_error,
				debug,
				skip_scales,
				dump,
			};
			run_import(&folder, config.as_deref(), overrides)
		}
		Commands::Order { folder, config } => run_order(&folder, config.as_deref()),
	};

	if let Err(e) = result {
		eprintln!("{} {:#}", "Error:".red().bold(), e);
		process::exit(1);
	}
}

fn init_tracing(verbosity: u8) {
	let level = match verbosity {
		0 => "canopy=info",
		1 => "canopy=debug",
		_ => "canopy=trace",
	};
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.with_writer(std::io::stderr)
		.init();
}

/// Command-line values layered over the config file and environment.
struct ImportOverrides {
	images: Option<PathBuf>,
	default_lang: Option<String>,
	default_wf_state: Option<String>,
	languages: Vec<String>,
	continue_on_error: bool,
	debug: bool,
	skip_scales: bool,
	dump: bool,
}

fn load_options(folder: &Path, config: Option<&Path>) -> anyhow::Result<FolderOptions> {
	let mut options = match config {
		Some(path) => FolderOptions::from_file(path)
			.with_context(|| format!("cannot read options from {}", path.display()))?,
		None => FolderOptions::new(),
	};
	if options.runner.base_image_path.is_none() {
		let images = folder.join("images");
		if images.is_dir() {
			options.runner.base_image_path = Some(images);
		}
	}
	Ok(options)
}

fn run_import(folder: &Path, config: Option<&Path>, overrides: ImportOverrides) -> anyhow::Result<()> {
	let mut options = load_options(folder, config)?;
	if let Some(images) = overrides.images {
		options.runner.base_image_path = Some(images);
	}
	if let Some(lang) = overrides.default_lang {
		options.runner.default_lang = Some(lang);
	}
	if let Some(state) = overrides.default_wf_state {
		options.runner.default_wf_state = Some(state);
	}

	let env = ImportSettings::from_env().context("invalid environment switch")?;
	let settings = ImportSettings::default()
		.with_continue_on_error(env.continue_on_error || overrides.continue_on_error)
		.with_debug(env.debug || overrides.debug)
		.with_skip_scales(env.skip_scales || overrides.skip_scales);

	let languages: Vec<&str> = overrides.languages.iter().map(String::as_str).collect();
	let mut site = MemorySite::new().with_languages(languages.len() > 1, &languages);

	let result = Importer::new(&mut site)
		.with_settings(settings)
		.with_log_handler(TracingHandler)
		.with_inspection_hook(|failure: &NodeFailure| {
			eprintln!("{}", output::render_failure(failure));
		})
		.import_folder(folder, &options);

	let report = result.with_context(|| format!("import of {} aborted", folder.display()))?;
	println!("{}", output::render_report(&report));
	if overrides.dump {
		println!("{}", serde_json::to_string_pretty(&site.dump())?);
	}
	Ok(())
}

fn run_order(folder: &Path, config: Option<&Path>) -> anyhow::Result<()> {
	let options = load_options(folder, config)?;
	let plan = plan_folder(folder, &options)
		.with_context(|| format!("cannot read {}", folder.display()))?;
	for line in output::render_plan(&plan) {
		println!("{line}");
	}
	Ok(())
}
