//! Electron bundle patching.
//!
//! This module handles:
//! - Backing up and restoring `app.asar`
//! - Extracting and repacking the archive with `asar`
//! - Applying rule files to the extracted scripts
//! - Searching the extracted scripts for text

pub mod asar;
pub mod locate;
pub mod workspace;

pub use asar::Asar;
pub use locate::{default_resources_dir, locate_resources_dir};
pub use workspace::{Bundle, RestoreGuard, remove_dir};

use crate::cache::{FileCache, collect_code_files, find_files_containing};
use crate::config::DesktopSettings;
use crate::error::Result;
use crate::rules::{RuleSet, load_rule_files};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// A patch preset backed by `<rules-dir>/<name>.txt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Mode {
	SkipLogin,
	Trial,
	Style,
	Localize,
}

impl Mode {
	/// Every mode, in the order their rule files are concatenated.
	pub const ALL: [Mode; 4] = [Mode::SkipLogin, Mode::Trial, Mode::Style, Mode::Localize];

	pub fn as_str(&self) -> &'static str {
		match self {
			Mode::SkipLogin => "skip_login",
			Mode::Trial => "trial",
			Mode::Style => "style",
			Mode::Localize => "localize",
		}
	}

	pub fn rule_file(&self, rules_dir: &Path) -> PathBuf {
		rules_dir.join(format!("{}.txt", self.as_str()))
	}
}

/// Outcome of one patch run.
#[derive(Debug, Clone)]
pub struct PatchReport {
	/// Substitution rules loaded (comments and rejected lines excluded).
	pub total_rules: usize,

	/// Rules that changed at least one file.
	pub applied_rules: usize,

	/// Lines rejected as invalid.
	pub rejected_rules: usize,

	/// Raw text of rules that changed nothing, in rule order.
	pub unmatched: Vec<String>,

	/// Raw text of each applied rule with the files it changed.
	pub coverage: Vec<(String, Vec<PathBuf>)>,

	pub files_written: usize,
	pub elapsed: Duration,
}

impl PatchReport {
	/// Log the summary the way a run ends.
	pub fn log(&self) {
		tracing::info!(
			"Replacement done in {:.2} seconds.",
			self.elapsed.as_secs_f64()
		);
		tracing::info!("Rules applied: {}/{}", self.applied_rules, self.total_rules);
		if self.rejected_rules > 0 {
			tracing::warn!("Skipped {} invalid rule(s).", self.rejected_rules);
		}
		for (rule, files) in &self.coverage {
			let listing = files
				.iter()
				.map(|path| path.display().to_string())
				.collect::<Vec<_>>()
				.join(", ");
			tracing::debug!("Rule `{}` changed {} file(s): {}", rule, files.len(), listing);
		}

		if self.unmatched.is_empty() {
			tracing::debug!("All rules matched.");
			return;
		}
		if self.unmatched.len() > 3 {
			tracing::warn!(
				"Found {} unmatched rules. Check debug log for details.",
				self.unmatched.len()
			);
		}
		let listing = self
			.unmatched
			.iter()
			.enumerate()
			.map(|(i, rule)| format!("{:>4}. {}", i + 1, rule))
			.collect::<Vec<_>>()
			.join("\n");
		tracing::debug!("Unmatched rules ({}):\n{}", self.unmatched.len(), listing);
	}
}

/// Runs patch, find and restore against one installed bundle.
#[derive(Debug, Clone)]
pub struct DesktopPatcher {
	bundle: Bundle,
	asar: Asar,
	settings: DesktopSettings,
}

impl DesktopPatcher {
	pub fn new(bundle: Bundle, asar: Asar, settings: DesktopSettings) -> Self {
		DesktopPatcher {
			bundle,
			asar,
			settings,
		}
	}

	pub fn bundle(&self) -> &Bundle {
		&self.bundle
	}

	/// Files under the extracted tree that rules may touch.
	pub fn code_files(&self, include_styles: bool) -> Vec<PathBuf> {
		collect_code_files(
			&self.bundle.app_dir(),
			&self.settings.scan_dirs,
			include_styles,
		)
	}

	/// Load and parse the rule files for `modes`, in [`Mode::ALL`] order.
	pub fn load_rules(&self, modes: &[Mode]) -> Result<(RuleSet, usize)> {
		let paths: Vec<PathBuf> = Mode::ALL
			.iter()
			.filter(|mode| modes.contains(*mode))
			.map(|mode| mode.rule_file(&self.settings.rules_dir))
			.collect();

		let lines = load_rule_files(&paths)?;
		let (rules, rejected) = RuleSet::from_lines(&lines);
		Ok((rules, rejected.len()))
	}

	/// Patch the bundle from a clean baseline.
	///
	/// If anything fails before the repack finishes, the archive is put back
	/// from the backup.
	pub fn apply_changes(&self, modes: &[Mode]) -> Result<PatchReport> {
		let start = Instant::now();

		let (rules, rejected_rules) = self.load_rules(modes)?;

		self.bundle.create_backup()?;
		self.bundle.clean()?;
		let guard = self.bundle.restore_guard();

		self.asar
			.extract(&self.bundle.archive_path(), &self.bundle.app_dir())?;

		let files = self.code_files(modes.contains(&Mode::Style));
		let mut cache = FileCache::load_all(&files)?;

		tracing::info!("Starting replacement...");
		let applied = cache.apply_rules_to_all(&rules);
		tracing::info!("Replacement completed.");

		tracing::info!("Starting writing...");
		let files_written = cache.write_all()?;
		tracing::info!("Writing completed.");

		self.asar.pack(
			&self.bundle.app_dir(),
			&self.bundle.archive_path(),
			&self.settings.unpack_dir,
		)?;
		guard.commit();

		Ok(PatchReport {
			total_rules: rules.substitution_count(),
			applied_rules: applied.applied_count(),
			rejected_rules,
			unmatched: applied
				.unmatched(&rules)
				.into_iter()
				.map(str::to_string)
				.collect(),
			coverage: applied
				.coverage(&rules)
				.into_iter()
				.map(|(rule, files)| {
					let files = files.into_iter().map(Path::to_path_buf).collect();
					(rule.to_string(), files)
				})
				.collect(),
			files_written,
			elapsed: start.elapsed(),
		})
	}

	/// Script files containing every term. Extracts the archive first if needed.
	pub fn find_in_content(&self, terms: &[String]) -> Result<Vec<PathBuf>> {
		if !self.bundle.app_dir().exists() {
			self.asar
				.extract(&self.bundle.archive_path(), &self.bundle.app_dir())?;
		}

		let found = find_files_containing(&self.code_files(false), terms)?;
		if found.is_empty() {
			tracing::warn!("No results found for terms {:?}.", terms);
		} else {
			tracing::info!("Found all terms {:?} in {} file(s).", terms, found.len());
		}
		Ok(found)
	}

	/// Put the application back to its original state.
	pub fn restore_changes(&self) -> Result<()> {
		self.bundle.restore_original()
	}
}
