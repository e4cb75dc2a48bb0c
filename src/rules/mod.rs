//! Rule files and the text substitution engine.
//!
//! This module handles:
//! - Loading rule files (`old|new` and `/regex/|new` lines)
//! - Parsing lines into comments or substitutions
//! - Applying substitutions in order and tracking which ones changed text

pub mod matcher;
pub mod parser;
pub mod rewriter;

pub use matcher::{Pattern, is_regex_pattern};
pub use parser::{
	RejectedRule, Rule, RuleLine, RuleSet, Substitution, is_comment_line, load_rule_file,
	load_rule_files, parse_rule,
};
pub use rewriter::{AppliedRules, Rewrite, apply};
