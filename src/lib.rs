//! Repatch - CLI tool for patching an Electron app bundle and an Android
//! package with rule files and external tools.
//!
//! This library provides the core functionality for repatch, including:
//! - Rule file parsing (`old|new` and `/regex/|new`) and ordered substitution
//! - An in-memory file cache with a single write-back pass
//! - `app.asar` backup, extraction, patching and repacking
//! - Android package download, rebuild, alignment and signing
//! - Configuration file parsing and cascade discovery
//!
//! # Example
//!
//! ```
//! use repatch_cli::rules::{RuleSet, apply, parser::split_rule_lines};
//! use std::path::Path;
//!
//! let lines = split_rule_lines("# comment line\nfoo|bar\n/ba(z)/|qux$1", Path::new("rules.txt"));
//! let (rules, rejected) = RuleSet::from_lines(&lines);
//! assert!(rejected.is_empty());
//!
//! let rewrite = apply("foo baz foo", &rules);
//! assert_eq!(rewrite.content, "bar quxz bar");
//! ```

pub mod android;
pub mod cache;
pub mod config;
pub mod desktop;
pub mod error;
pub mod exec;
pub mod logging;
pub mod rules;

pub use error::{PatchError, Result, RuleError};
