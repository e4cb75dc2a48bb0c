//! In-memory file cache for a patch run.
//!
//! Files are read once, rewritten in memory by every rule, then flushed in a
//! single pass. Nothing touches disk between `load_all` and `write_all`.

use crate::error::{PatchError, Result};
use crate::rules::{AppliedRules, RuleSet, apply};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Script files are always scanned.
pub const SCRIPT_EXTENSION: &str = "js";

/// Stylesheets are only scanned when style rules are active.
pub const STYLE_EXTENSION: &str = "css";

/// Walk `scan_dirs` under `root` and collect patchable files.
///
/// Missing scan directories yield nothing. Results are sorted per directory
/// so runs are reproducible.
pub fn collect_code_files(
	root: &Path,
	scan_dirs: &[PathBuf],
	include_styles: bool,
) -> Vec<PathBuf> {
	let mut files = Vec::new();

	for dir in scan_dirs {
		let prefix = root.join(dir);
		for entry in WalkDir::new(&prefix)
			.sort_by_file_name()
			.into_iter()
			.filter_map(|e| e.ok())
			.filter(|e| e.file_type().is_file())
			.filter(|e| has_code_extension(e.path(), include_styles))
		{
			files.push(entry.into_path());
		}
	}

	files
}

fn has_code_extension(path: &Path, include_styles: bool) -> bool {
	path.extension().is_some_and(|ext| {
		ext == SCRIPT_EXTENSION || (include_styles && ext == STYLE_EXTENSION)
	})
}

/// Path to full text for every file being patched.
#[derive(Debug, Clone, Default)]
pub struct FileCache {
	files: BTreeMap<PathBuf, String>,
}

impl FileCache {
	/// Read every existing path into memory. Missing paths are skipped.
	pub fn load_all(paths: &[PathBuf]) -> Result<Self> {
		let mut files = BTreeMap::new();

		for path in paths {
			if !path.exists() {
				tracing::debug!("Skipping missing file: {}", path.display());
				continue;
			}
			let content = std::fs::read_to_string(path).map_err(|source| PatchError::ReadError {
				path: path.clone(),
				source,
			})?;
			files.insert(path.clone(), content);
		}

		tracing::debug!("Loaded {} files into cache", files.len());
		Ok(FileCache { files })
	}

	/// Run the rule set over every cached file, in path order.
	pub fn apply_rules_to_all(&mut self, rules: &RuleSet) -> AppliedRules {
		let mut applied = AppliedRules::new();

		for (path, content) in self.files.iter_mut() {
			let rewrite = apply(content, rules);
			if !rewrite.changed.is_empty() {
				tracing::debug!(
					"{} rule(s) changed {}",
					rewrite.changed.len(),
					path.display()
				);
				*content = rewrite.content;
			}
			applied.record(path, &rewrite.changed);
		}

		applied
	}

	/// Flush every cached file back to disk. Returns the number written.
	pub fn write_all(&self) -> Result<usize> {
		for (path, content) in &self.files {
			std::fs::write(path, content).map_err(|source| PatchError::WriteError {
				path: path.clone(),
				source,
			})?;
		}
		Ok(self.files.len())
	}

	pub fn get(&self, path: &Path) -> Option<&str> {
		self.files.get(path).map(String::as_str)
	}

	pub fn contains(&self, path: &Path) -> bool {
		self.files.contains_key(path)
	}

	pub fn len(&self) -> usize {
		self.files.len()
	}

	pub fn is_empty(&self) -> bool {
		self.files.is_empty()
	}
}

/// Files whose content contains every one of `terms`.
pub fn find_files_containing(paths: &[PathBuf], terms: &[String]) -> Result<Vec<PathBuf>> {
	let cache = FileCache::load_all(paths)?;
	Ok(cache
		.files
		.into_iter()
		.filter(|(_, content)| {
			!content.is_empty() && terms.iter().all(|t| content.contains(t.as_str()))
		})
		.map(|(path, _)| path)
		.collect())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::rules::parser::split_rule_lines;
	use std::fs;

	fn rule_set(text: &str) -> RuleSet {
		let (set, _) = RuleSet::from_lines(&split_rule_lines(text, Path::new("test.txt")));
		set
	}

	fn scan_dirs() -> Vec<PathBuf> {
		vec![
			PathBuf::from("background-process/assets"),
			PathBuf::from("ui-process/assets"),
			PathBuf::from("main-process"),
		]
	}

	fn make_tree(root: &Path) {
		for (rel, body) in [
			("background-process/assets/bg.js", "foo bg"),
			("ui-process/assets/ui.js", "foo ui"),
			("ui-process/assets/ui.css", ".foo {}"),
			("ui-process/assets/nested/deep.js", "deep foo"),
			("main-process/main.js", "main"),
			("main-process/readme.md", "foo"),
			("node_modules/lib/index.js", "foo"),
		] {
			let path = root.join(rel);
			fs::create_dir_all(path.parent().unwrap()).unwrap();
			fs::write(path, body).unwrap();
		}
	}

	#[test]
	fn test_collect_scripts_only() {
		let dir = tempfile::tempdir().unwrap();
		make_tree(dir.path());

		let files = collect_code_files(dir.path(), &scan_dirs(), false);
		let rel: Vec<_> = files
			.iter()
			.map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
			.collect();

		assert_eq!(
			rel,
			vec![
				PathBuf::from("background-process/assets/bg.js"),
				PathBuf::from("ui-process/assets/nested/deep.js"),
				PathBuf::from("ui-process/assets/ui.js"),
				PathBuf::from("main-process/main.js"),
			]
		);
	}

	#[test]
	fn test_collect_with_styles() {
		let dir = tempfile::tempdir().unwrap();
		make_tree(dir.path());

		let files = collect_code_files(dir.path(), &scan_dirs(), true);
		assert!(files.iter().any(|p| p.ends_with("ui.css")));
		assert_eq!(files.len(), 5);
	}

	#[test]
	fn test_collect_missing_scan_dir() {
		let dir = tempfile::tempdir().unwrap();
		let files = collect_code_files(dir.path(), &scan_dirs(), true);
		assert!(files.is_empty());
	}

	#[test]
	fn test_load_all_skips_missing() {
		let dir = tempfile::tempdir().unwrap();
		let present = dir.path().join("a.js");
		let missing = dir.path().join("gone.js");
		fs::write(&present, "x").unwrap();

		let cache = FileCache::load_all(&[present.clone(), missing.clone()]).unwrap();
		assert_eq!(cache.len(), 1);
		assert_eq!(cache.get(&present), Some("x"));
		assert!(!cache.contains(&missing));
	}

	#[test]
	fn test_apply_then_write_all() {
		let dir = tempfile::tempdir().unwrap();
		let a = dir.path().join("a.js");
		let b = dir.path().join("b.js");
		fs::write(&a, "login(); login();").unwrap();
		fs::write(&b, "nothing here").unwrap();

		let mut cache = FileCache::load_all(&[a.clone(), b.clone()]).unwrap();
		let rules = rule_set("# skip login\nlogin();|\nunused|x");
		let applied = cache.apply_rules_to_all(&rules);

		// Nothing on disk changes before write_all.
		assert_eq!(fs::read_to_string(&a).unwrap(), "login(); login();");
		assert_eq!(cache.get(&a), Some(" "));

		assert_eq!(applied.applied_count(), 1);
		assert_eq!(applied.unmatched(&rules), vec!["unused|x"]);

		assert_eq!(cache.write_all().unwrap(), 2);
		assert_eq!(fs::read_to_string(&a).unwrap(), " ");
		assert_eq!(fs::read_to_string(&b).unwrap(), "nothing here");
	}

	#[test]
	fn test_empty_file_left_alone() {
		let dir = tempfile::tempdir().unwrap();
		let a = dir.path().join("empty.js");
		fs::write(&a, "").unwrap();

		let mut cache = FileCache::load_all(std::slice::from_ref(&a)).unwrap();
		let applied = cache.apply_rules_to_all(&rule_set("/^/|header"));
		assert_eq!(applied.applied_count(), 0);
		assert_eq!(cache.get(&a), Some(""));
	}

	#[test]
	fn test_find_files_containing_all_terms() {
		let dir = tempfile::tempdir().unwrap();
		let a = dir.path().join("a.js");
		let b = dir.path().join("b.js");
		fs::write(&a, "isTrial && isPro").unwrap();
		fs::write(&b, "isTrial only").unwrap();

		let terms = vec!["isTrial".to_string(), "isPro".to_string()];
		let found = find_files_containing(&[a.clone(), b], &terms).unwrap();
		assert_eq!(found, vec![a]);
	}
}
