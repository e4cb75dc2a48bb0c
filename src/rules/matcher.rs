use crate::error::RuleError;
use regex::Regex;
use std::borrow::Cow;

/// The search side of a rule: literal text or a `/regex/`.
#[derive(Debug, Clone)]
pub enum Pattern {
	/// Matched verbatim, no escaping needed.
	Literal(String),

	/// Interior of a `/.../` rule, compiled once at parse time.
	Regex(Regex),
}

impl Pattern {
	/// Classify and compile the `old` side of a rule.
	pub fn compile(old: &str) -> Result<Self, RuleError> {
		if is_regex_pattern(old) {
			let interior = &old[1..old.len() - 1];
			return compile_regex(interior).map(Pattern::Regex);
		}

		if old.is_empty() {
			return Err(RuleError::EmptyPattern {
				line: old.to_string(),
			});
		}

		Ok(Pattern::Literal(old.to_string()))
	}

	/// Replace every non-overlapping match in `input`.
	///
	/// Regex replacements use `regex` crate group syntax (`$1`, `${name}`, `$$`).
	pub fn replace_all<'a>(&self, input: &'a str, replacement: &str) -> Cow<'a, str> {
		match self {
			Pattern::Literal(old) => {
				if input.contains(old.as_str()) {
					Cow::Owned(input.replace(old.as_str(), replacement))
				} else {
					Cow::Borrowed(input)
				}
			}
			Pattern::Regex(regex) => regex.replace_all(input, replacement),
		}
	}

	pub fn is_regex(&self) -> bool {
		matches!(self, Pattern::Regex(_))
	}
}

/// A string of the form `/pattern/` with no `//` anywhere in it.
pub fn is_regex_pattern(s: &str) -> bool {
	s.len() > 1 && s.starts_with('/') && s.ends_with('/') && !s.contains("//")
}

/// Compile a regex pattern string.
fn compile_regex(pattern: &str) -> Result<Regex, RuleError> {
	Regex::new(pattern).map_err(|source| RuleError::InvalidRegex {
		pattern: pattern.to_string(),
		source,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_is_regex_pattern() {
		assert!(is_regex_pattern("/foo/"));
		assert!(is_regex_pattern("/a/b/"));
		assert!(is_regex_pattern("/ba(z)/"));

		assert!(!is_regex_pattern("/"));
		assert!(!is_regex_pattern("//"));
		assert!(!is_regex_pattern("/foo//bar/"));
		assert!(!is_regex_pattern("foo"));
		assert!(!is_regex_pattern("/foo"));
		assert!(!is_regex_pattern("foo/"));
		assert!(!is_regex_pattern(""));
	}

	#[test]
	fn test_compile_literal() {
		let pattern = Pattern::compile("foo").unwrap();
		assert!(!pattern.is_regex());
		assert_eq!(pattern.replace_all("a foo b", "bar"), "a bar b");
	}

	#[test]
	fn test_compile_single_slash_is_literal() {
		let pattern = Pattern::compile("/").unwrap();
		assert!(!pattern.is_regex());
		assert_eq!(pattern.replace_all("a/b", "-"), "a-b");
	}

	#[test]
	fn test_compile_degenerate_slashes_is_literal() {
		let pattern = Pattern::compile("//").unwrap();
		assert!(!pattern.is_regex());
		assert_eq!(pattern.replace_all("http://x", ":"), "http::x");
	}

	#[test]
	fn test_compile_regex() {
		let pattern = Pattern::compile(r"/\d+/").unwrap();
		assert!(pattern.is_regex());
		assert_eq!(pattern.replace_all("a1b22c", "#"), "a#b#c");
	}

	#[test]
	fn test_compile_invalid_regex() {
		let result = Pattern::compile("/[invalid/");
		match result.unwrap_err() {
			RuleError::InvalidRegex { pattern, .. } => {
				assert_eq!(pattern, "[invalid");
			}
			_ => panic!("Expected InvalidRegex error"),
		}
	}

	#[test]
	fn test_compile_empty_literal_rejected() {
		assert!(matches!(
			Pattern::compile(""),
			Err(RuleError::EmptyPattern { .. })
		));
	}

	#[test]
	fn test_literal_special_characters_are_verbatim() {
		let pattern = Pattern::compile("a.b(c)").unwrap();
		assert_eq!(pattern.replace_all("a.b(c) axb(c)", "X"), "X axb(c)");
	}

	#[test]
	fn test_literal_no_match_borrows() {
		let pattern = Pattern::compile("zzz").unwrap();
		assert!(matches!(pattern.replace_all("abc", "y"), Cow::Borrowed(_)));
	}

	#[test]
	fn test_regex_group_reference() {
		let pattern = Pattern::compile("/ba(z)/").unwrap();
		assert_eq!(pattern.replace_all("bar baz bar", "qux$1"), "bar quxz bar");
	}

	#[test]
	fn test_regex_named_group_reference() {
		let pattern = Pattern::compile(r"/(?P<word>\w+)=1/").unwrap();
		assert_eq!(pattern.replace_all("on=1", "${word}=0"), "on=0");
	}
}
