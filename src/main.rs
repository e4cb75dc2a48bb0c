use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use repatch_cli::android::AndroidPatcher;
use repatch_cli::config::{
	CONFIG_FILE_NAME, Settings, discover_configs, generate_init_template, load_settings,
	user_config_path,
};
use repatch_cli::desktop::{Asar, Bundle, DesktopPatcher, Mode, locate_resources_dir};
use repatch_cli::exec::resolve_command;
use repatch_cli::logging::{LogLevel, init_cli_logger};
use repatch_cli::rules::{RuleSet, load_rule_file};

#[derive(Parser)]
#[command(name = "repatch")]
#[command(
	author,
	version,
	about = "CLI tool for patching a desktop app bundle and an Android package with rule files"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	/// Log verbosity (RUST_LOG overrides it)
	#[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
	log_level: LogLevel,

	/// Create a template .repatch.toml in the current directory
	#[arg(long)]
	init: bool,

	/// Overwrite existing .repatch.toml when using --init
	#[arg(long, requires = "init")]
	force: bool,
}

#[derive(Subcommand)]
enum Commands {
	/// Patch, search or restore the desktop app bundle
	Desktop(DesktopArgs),

	/// Download, patch and re-sign the Android package
	Android {
		/// Work directory holding strings.xml and the signing properties
		#[arg(long, value_name = "DIR")]
		dir: Option<PathBuf>,
	},

	/// Rule file utilities
	Rules {
		#[command(subcommand)]
		action: RulesAction,
	},

	/// Configuration management commands
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Args)]
struct DesktopArgs {
	/// Apply the trial rules
	#[arg(short, long)]
	trial: bool,

	/// Apply the skip-login rules
	#[arg(short = 'k', long)]
	skip_login: bool,

	/// Apply the localization rules (the default when no mode is given)
	#[arg(short, long)]
	localize: bool,

	/// Apply the style rules, including stylesheets
	#[arg(short, long)]
	style: bool,

	/// Restore the original app.asar and remove the backup
	#[arg(short, long, conflicts_with_all = ["trial", "skip_login", "localize", "style", "find"])]
	restore: bool,

	/// List extracted files containing all of the given terms
	#[arg(short, long, num_args = 1.., value_name = "TERM")]
	find: Option<Vec<String>>,

	/// Resources directory holding app.asar
	#[arg(long, value_name = "DIR")]
	path: Option<PathBuf>,
}

impl DesktopArgs {
	fn has_mode_flag(&self) -> bool {
		self.skip_login || self.trial || self.style || self.localize
	}

	fn modes(&self) -> Vec<Mode> {
		let selected: Vec<Mode> = [
			(self.skip_login, Mode::SkipLogin),
			(self.trial, Mode::Trial),
			(self.style, Mode::Style),
			(self.localize, Mode::Localize),
		]
		.into_iter()
		.filter_map(|(on, mode)| on.then_some(mode))
		.collect();

		if selected.is_empty() {
			vec![Mode::Localize]
		} else {
			selected
		}
	}
}

#[derive(Subcommand)]
enum RulesAction {
	/// Parse rule files and report what they contain
	Check {
		#[arg(required = true, value_name = "FILE")]
		files: Vec<PathBuf>,
	},
}

#[derive(Subcommand)]
enum ConfigAction {
	/// Display discovered config files and the effective settings
	Show,
	/// Check all config files for errors without running anything
	Validate,
}

fn main() -> ExitCode {
	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();
	init_cli_logger(cli.log_level);

	if cli.init {
		return handle_init(cli.force);
	}

	match cli.command {
		Some(Commands::Desktop(args)) => handle_desktop(&args),
		Some(Commands::Android { dir }) => handle_android(dir),
		Some(Commands::Rules { action }) => match action {
			RulesAction::Check { files } => handle_rules_check(&files),
		},
		Some(Commands::Config { action }) => match action {
			ConfigAction::Show => handle_config_show(),
			ConfigAction::Validate => handle_config_validate(),
		},
		// arg_required_else_help covers the bare invocation
		None => Ok(ExitCode::SUCCESS),
	}
}

fn current_dir() -> Result<PathBuf> {
	std::env::current_dir().context("Failed to get current directory")
}

fn load_current_settings() -> Result<Settings> {
	let cwd = current_dir()?;
	load_settings(&cwd).context("Failed to load configuration")
}

fn handle_init(force: bool) -> Result<ExitCode> {
	let config_path = PathBuf::from(CONFIG_FILE_NAME);

	if config_path.exists() && !force {
		anyhow::bail!("{CONFIG_FILE_NAME} already exists. Use --force to overwrite.");
	}

	std::fs::write(&config_path, generate_init_template())
		.with_context(|| format!("Failed to write {}", config_path.display()))?;

	println!("Created {CONFIG_FILE_NAME}");
	Ok(ExitCode::SUCCESS)
}

fn handle_desktop(args: &DesktopArgs) -> Result<ExitCode> {
	let settings = load_current_settings()?;

	let asar = Asar::new(&settings.tools.asar);
	asar.check_installed().with_context(|| {
		format!(
			"`{}` is not usable. Install it with `npm install -g @electron/asar`",
			settings.tools.asar
		)
	})?;

	let explicit = args.path.as_deref().or(settings.desktop.path.as_deref());
	let resources = locate_resources_dir(explicit)
		.context("Could not locate the desktop app resources")?;
	let bundle = Bundle::open(resources)?;
	let patcher = DesktopPatcher::new(bundle, asar, settings.desktop);

	if args.restore {
		patcher
			.restore_changes()
			.context("Failed to restore the original bundle")?;
		println!("Restored {}", patcher.bundle().archive_path().display());
		return Ok(ExitCode::SUCCESS);
	}

	// Any mode flag means patch; search only runs on its own.
	if let Some(terms) = args.find.as_ref().filter(|_| !args.has_mode_flag()) {
		let found = patcher
			.find_in_content(terms)
			.context("Failed to search extracted files")?;
		for path in &found {
			println!("{}", path.display());
		}
		return Ok(ExitCode::SUCCESS);
	}

	if args.find.is_some() {
		tracing::warn!("Ignoring --find because a mode flag was given");
	}

	let modes = args.modes();
	let names: Vec<_> = modes.iter().map(Mode::as_str).collect();
	tracing::info!("Patching with modes: {}", names.join(", "));

	let report = patcher
		.apply_changes(&modes)
		.context("Failed to patch the bundle")?;
	report.log();

	Ok(ExitCode::SUCCESS)
}

fn handle_android(dir: Option<PathBuf>) -> Result<ExitCode> {
	let mut settings = load_current_settings()?;
	if let Some(dir) = dir {
		settings.android.work_dir = dir;
	}

	let work_dir = settings.android.work_dir.clone();
	let patcher = AndroidPatcher::new(settings.android, settings.tools);
	let output = patcher
		.run()
		.with_context(|| format!("Android build failed in {}", work_dir.display()))?;

	println!("Created {}", output.display());
	Ok(ExitCode::SUCCESS)
}

fn handle_rules_check(files: &[PathBuf]) -> Result<ExitCode> {
	let mut any_invalid = false;

	for file in files {
		let lines = load_rule_file(file)?;
		let (rules, rejected) = RuleSet::from_lines(&lines);

		let regex = rules
			.substitutions()
			.filter(|sub| sub.pattern.is_regex())
			.count();
		let literal = rules.substitution_count() - regex;

		println!("{}:", file.display());
		println!("  comments: {}", rules.comment_count());
		println!("  literal rules: {literal}");
		println!("  regex rules: {regex}");
		println!("  invalid rules: {}", rejected.len());
		for rejection in &rejected {
			println!(
				"    line {}: {}",
				rejection.line.line_no, rejection.error
			);
		}

		any_invalid |= !rejected.is_empty();
	}

	Ok(if any_invalid {
		ExitCode::FAILURE
	} else {
		ExitCode::SUCCESS
	})
}

fn print_tool(name: &str, command: &str) {
	match resolve_command(command) {
		Some(path) => println!("  {name}: {command} ({})", path.display()),
		None => println!("  {name}: {command} (not found)"),
	}
}

fn print_path(name: &str, path: &Path) {
	println!("  {name}: {}", path.display());
}

fn handle_config_show() -> Result<ExitCode> {
	let cwd = current_dir()?;
	let configs = discover_configs(&cwd).context("Failed to discover config files")?;

	if configs.is_empty() {
		println!("No configuration files found.");
	} else {
		println!("Configuration files (in cascade order):");
		for loaded in &configs {
			println!("  {} (root: {})", loaded.path.display(), loaded.config.root);
		}
	}
	println!();

	let settings = load_settings(&cwd).context("Failed to load configuration")?;

	println!("[desktop]");
	match &settings.desktop.path {
		Some(path) => print_path("path", path),
		None => println!("  path: (platform default)"),
	}
	print_path("rules-dir", &settings.desktop.rules_dir);
	let scan_dirs: Vec<_> = settings
		.desktop
		.scan_dirs
		.iter()
		.map(|dir| dir.display().to_string())
		.collect();
	println!("  scan-dirs: {}", scan_dirs.join(", "));
	println!("  unpack-dir: {}", settings.desktop.unpack_dir);
	println!();

	println!("[android]");
	print_path("work-dir", &settings.android.work_dir);
	println!("  app-name: {}", settings.android.app_name);
	println!("  mirror-url: {}", settings.android.mirror_url);
	println!("  editor-repo: {}", settings.android.editor_repo);
	println!();

	println!("[tools]");
	print_tool("asar", &settings.tools.asar);
	print_tool("java", &settings.tools.java);
	print_tool("zipalign", &settings.tools.zipalign);
	print_tool("apksigner", &settings.tools.apksigner);
	print_tool("keytool", &settings.tools.keytool);
	println!();

	if let Ok(user_path) = user_config_path() {
		println!("User config path: {}", user_path.display());
		if user_path.exists() {
			println!("  (exists)");
		} else {
			println!("  (not found)");
		}
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_config_validate() -> Result<ExitCode> {
	let cwd = current_dir()?;

	match discover_configs(&cwd) {
		Ok(configs) => {
			if configs.is_empty() {
				println!("No configuration files found.");
			} else {
				println!("All configuration files are valid:");
				for loaded in &configs {
					println!("  {}", loaded.path.display());
				}
			}
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("Configuration error: {}", e);
			Ok(ExitCode::FAILURE)
		}
	}
}
