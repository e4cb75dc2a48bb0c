use crate::rules::parser::RuleSet;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Result of running a rule set over one piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
	/// Text after every rule has run.
	pub content: String,

	/// Indices (into `RuleSet::substitutions`) of rules that changed the text.
	pub changed: Vec<usize>,
}

/// Apply every substitution in order, each one seeing the previous output.
///
/// Empty input is returned as-is without running any rule.
pub fn apply(content: &str, rules: &RuleSet) -> Rewrite {
	let mut current = content.to_string();
	let mut changed = Vec::new();

	if current.is_empty() {
		return Rewrite {
			content: current,
			changed,
		};
	}

	for (idx, sub) in rules.substitutions().enumerate() {
		let next = sub.pattern.replace_all(&current, &sub.replacement);
		if next != current.as_str() {
			let next = next.into_owned();
			current = next;
			changed.push(idx);
		}
	}

	Rewrite {
		content: current,
		changed,
	}
}

/// Which rules changed which files over a whole run.
///
/// The run-level count treats a rule as applied when it changed any file;
/// the per-file sets stay available for detailed reporting.
#[derive(Debug, Clone, Default)]
pub struct AppliedRules {
	by_rule: BTreeMap<usize, BTreeSet<PathBuf>>,
}

impl AppliedRules {
	pub fn new() -> Self {
		Self::default()
	}

	/// Record the rules that changed `path`.
	pub fn record(&mut self, path: &Path, changed: &[usize]) {
		for &idx in changed {
			self.by_rule
				.entry(idx)
				.or_default()
				.insert(path.to_path_buf());
		}
	}

	/// Number of distinct rules that changed at least one file.
	pub fn applied_count(&self) -> usize {
		self.by_rule.len()
	}

	pub fn is_applied(&self, idx: usize) -> bool {
		self.by_rule.contains_key(&idx)
	}

	/// Files changed by the rule at `idx`, in path order.
	pub fn files_for(&self, idx: usize) -> impl Iterator<Item = &Path> {
		self.by_rule
			.get(&idx)
			.into_iter()
			.flat_map(|files| files.iter().map(PathBuf::as_path))
	}

	/// Raw text of every applied substitution with the files it changed, in rule order.
	pub fn coverage<'a>(&'a self, rules: &'a RuleSet) -> Vec<(&'a str, Vec<&'a Path>)> {
		rules
			.substitutions()
			.enumerate()
			.filter(|(idx, _)| self.is_applied(*idx))
			.map(|(idx, sub)| (sub.text.as_str(), self.files_for(idx).collect()))
			.collect()
	}

	/// Raw text of every substitution that changed nothing, in rule order.
	pub fn unmatched<'a>(&self, rules: &'a RuleSet) -> Vec<&'a str> {
		rules
			.substitutions()
			.enumerate()
			.filter(|(idx, _)| !self.is_applied(*idx))
			.map(|(_, sub)| sub.text.as_str())
			.collect()
	}
}
