use crate::config::types::Config;
use crate::error::{PatchError, Result};
use std::path::Path;

/// Parse a config file from the given path.
///
/// Relative paths inside the file are resolved against its directory.
pub fn parse_config_file(path: &Path) -> Result<Config> {
	let content = std::fs::read_to_string(path).map_err(|source| PatchError::ConfigReadError {
		path: path.to_path_buf(),
		source,
	})?;

	let mut config = parse_config_str(&content, path)?;
	if let Some(base) = path.parent() {
		config.resolve_paths(base);
	}
	Ok(config)
}

/// Parse a config from a string (useful for testing).
pub fn parse_config_str(content: &str, path: &Path) -> Result<Config> {
	toml::from_str(content).map_err(|source| PatchError::ConfigParseError {
		path: path.to_path_buf(),
		source,
	})
}
