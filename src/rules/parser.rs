use crate::error::{PatchError, Result, RuleError};
use crate::rules::matcher::Pattern;
use std::path::{Path, PathBuf};

/// Marker that starts a comment line.
pub const COMMENT_MARKER: char = '#';

/// Separator between the search side and the replacement.
pub const DELIMITER: char = '|';

/// One non-blank line read from a rule file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleLine {
	/// File the line came from.
	pub source: PathBuf,

	/// 1-based line number within `source`.
	pub line_no: usize,

	/// Line text with the trailing newline removed.
	pub text: String,
}

/// A parsed rule line.
#[derive(Debug, Clone)]
pub enum Rule {
	Comment(String),
	Substitution(Substitution),
}

/// An `old|new` directive ready to apply.
#[derive(Debug, Clone)]
pub struct Substitution {
	pub pattern: Pattern,
	pub replacement: String,

	/// The raw rule text, for diagnostics.
	pub text: String,
}

/// A rule line that failed to parse, kept for reporting.
#[derive(Debug)]
pub struct RejectedRule {
	pub line: RuleLine,
	pub error: RuleError,
}

/// Ordered rules for one run.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
	rules: Vec<Rule>,
}

impl RuleSet {
	/// Parse lines in order. Bad lines are returned alongside, never fatal.
	pub fn from_lines(lines: &[RuleLine]) -> (Self, Vec<RejectedRule>) {
		let mut rules = Vec::with_capacity(lines.len());
		let mut rejected = Vec::new();

		for line in lines {
			match parse_rule(&line.text) {
				Ok(rule) => rules.push(rule),
				Err(error) => {
					tracing::error!(
						"Skipping invalid rule at {}:{}: {}",
						line.source.display(),
						line.line_no,
						error
					);
					rejected.push(RejectedRule {
						line: line.clone(),
						error,
					});
				}
			}
		}

		(RuleSet { rules }, rejected)
	}

	pub fn rules(&self) -> &[Rule] {
		&self.rules
	}

	/// Substitution rules only, in file order.
	pub fn substitutions(&self) -> impl Iterator<Item = &Substitution> {
		self.rules.iter().filter_map(|rule| match rule {
			Rule::Substitution(sub) => Some(sub),
			Rule::Comment(_) => None,
		})
	}

	pub fn substitution_count(&self) -> usize {
		self.substitutions().count()
	}

	pub fn comment_count(&self) -> usize {
		self.rules.len() - self.substitution_count()
	}

	pub fn is_empty(&self) -> bool {
		self.substitution_count() == 0
	}
}

/// Whether the first non-whitespace character is the comment marker.
pub fn is_comment_line(line: &str) -> bool {
	line.trim_start().starts_with(COMMENT_MARKER)
}

/// Parse one rule line into a comment or a substitution.
///
/// The line is split on the first delimiter only, so the replacement may
/// itself contain `|`.
pub fn parse_rule(line: &str) -> std::result::Result<Rule, RuleError> {
	if is_comment_line(line) {
		return Ok(Rule::Comment(line.to_string()));
	}

	let (old, new) = line
		.split_once(DELIMITER)
		.ok_or_else(|| RuleError::MissingDelimiter {
			line: line.to_string(),
		})?;

	let pattern = Pattern::compile(old).map_err(|error| match error {
		RuleError::EmptyPattern { .. } => RuleError::EmptyPattern {
			line: line.to_string(),
		},
		other => other,
	})?;

	Ok(Rule::Substitution(Substitution {
		pattern,
		replacement: new.to_string(),
		text: line.to_string(),
	}))
}

/// Split rule file text into non-blank lines.
pub fn split_rule_lines(content: &str, source: &Path) -> Vec<RuleLine> {
	content
		.lines()
		.enumerate()
		.filter(|(_, text)| !text.trim().is_empty())
		.map(|(idx, text)| RuleLine {
			source: source.to_path_buf(),
			line_no: idx + 1,
			text: text.trim_end_matches('\r').to_string(),
		})
		.collect()
}

/// Read a rule file into its non-blank lines.
pub fn load_rule_file(path: &Path) -> Result<Vec<RuleLine>> {
	if !path.exists() {
		return Err(PatchError::MissingFile {
			path: path.to_path_buf(),
		});
	}

	let content = std::fs::read_to_string(path).map_err(|source| PatchError::ReadError {
		path: path.to_path_buf(),
		source,
	})?;

	Ok(split_rule_lines(&content, path))
}

/// Load several rule files, concatenated in the order given.
pub fn load_rule_files(paths: &[PathBuf]) -> Result<Vec<RuleLine>> {
	let mut lines = Vec::new();
	for path in paths {
		let loaded = load_rule_file(path)?;
		tracing::debug!("Loaded {} rule lines from {}", loaded.len(), path.display());
		lines.extend(loaded);
	}
	Ok(lines)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn lines(text: &str) -> Vec<RuleLine> {
		split_rule_lines(text, Path::new("test.txt"))
	}

	#[test]
	fn test_comment_detection() {
		assert!(is_comment_line("# note"));
		assert!(is_comment_line("   # indented note"));
		assert!(is_comment_line("#foo|bar"));
		assert!(!is_comment_line("foo|#bar"));
	}

	#[test]
	fn test_parse_comment() {
		assert!(matches!(parse_rule("# comment line"), Ok(Rule::Comment(_))));
	}

	#[test]
	fn test_parse_literal_rule() {
		let Rule::Substitution(sub) = parse_rule("foo|bar").unwrap() else {
			panic!("Expected substitution");
		};
		assert!(!sub.pattern.is_regex());
		assert_eq!(sub.replacement, "bar");
		assert_eq!(sub.text, "foo|bar");
	}

	#[test]
	fn test_parse_splits_on_first_delimiter() {
		let Rule::Substitution(sub) = parse_rule("a|b|c").unwrap() else {
			panic!("Expected substitution");
		};
		assert_eq!(sub.replacement, "b|c");
		assert_eq!(sub.pattern.replace_all("xax", &sub.replacement), "xb|cx");
	}

	#[test]
	fn test_parse_empty_replacement() {
		let Rule::Substitution(sub) = parse_rule("remove me|").unwrap() else {
			panic!("Expected substitution");
		};
		assert_eq!(sub.replacement, "");
	}

	#[test]
	fn test_parse_regex_rule() {
		let Rule::Substitution(sub) = parse_rule("/ba(z)/|qux$1").unwrap() else {
			panic!("Expected substitution");
		};
		assert!(sub.pattern.is_regex());
	}

	#[test]
	fn test_parse_missing_delimiter() {
		match parse_rule("no delimiter here") {
			Err(RuleError::MissingDelimiter { line }) => assert_eq!(line, "no delimiter here"),
			other => panic!("Expected MissingDelimiter, got {other:?}"),
		}
	}

	#[test]
	fn test_parse_empty_search_reports_whole_line() {
		match parse_rule("|new") {
			Err(RuleError::EmptyPattern { line }) => assert_eq!(line, "|new"),
			other => panic!("Expected EmptyPattern, got {other:?}"),
		}
	}

	#[test]
	fn test_split_rule_lines_skips_blanks_and_keeps_numbers() {
		let parsed = lines("foo|bar\r\n\n   \n# c\r\nx|y");
		assert_eq!(parsed.len(), 3);
		assert_eq!(parsed[0].text, "foo|bar");
		assert_eq!(parsed[0].line_no, 1);
		assert_eq!(parsed[1].text, "# c");
		assert_eq!(parsed[1].line_no, 4);
		assert_eq!(parsed[2].line_no, 5);
	}

	#[test]
	fn test_split_rule_lines_keeps_surrounding_spaces() {
		let parsed = lines("  padded |  value ");
		assert_eq!(parsed[0].text, "  padded |  value ");
	}

	#[test]
	fn test_rule_set_skips_bad_rules() {
		let (set, rejected) = RuleSet::from_lines(&lines(
			"# header\nfoo|bar\nbroken\n/[oops/|x\n/ba(z)/|qux$1",
		));

		assert_eq!(set.rules().len(), 3);
		assert_eq!(set.comment_count(), 1);
		assert_eq!(set.substitution_count(), 2);
		assert_eq!(rejected.len(), 2);
		assert_eq!(rejected[0].line.line_no, 3);
		assert!(matches!(
			rejected[0].error,
			RuleError::MissingDelimiter { .. }
		));
		assert!(matches!(rejected[1].error, RuleError::InvalidRegex { .. }));
	}

	#[test]
	fn test_load_rule_file_missing() {
		let result = load_rule_file(Path::new("/nonexistent/rules/trial.txt"));
		assert!(matches!(result, Err(PatchError::MissingFile { .. })));
	}

	#[test]
	fn test_load_rule_files_in_order() {
		let dir = tempfile::tempdir().unwrap();
		let first = dir.path().join("a.txt");
		let second = dir.path().join("b.txt");
		std::fs::write(&first, "one|1\n").unwrap();
		std::fs::write(&second, "two|2\n\nthree|3\n").unwrap();

		let loaded = load_rule_files(&[first.clone(), second.clone()]).unwrap();
		let texts: Vec<_> = loaded.iter().map(|l| l.text.as_str()).collect();
		assert_eq!(texts, vec!["one|1", "two|2", "three|3"]);
		assert_eq!(loaded[0].source, first);
		assert_eq!(loaded[2].source, second);
		assert_eq!(loaded[2].line_no, 3);
	}
}
