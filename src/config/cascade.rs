use crate::config::parser::parse_config_file;
use crate::config::types::{Config, LoadedConfig, Settings};
use crate::error::{PatchError, Result};
use std::path::{Path, PathBuf};

/// Name of the config file looked up in each directory.
pub const CONFIG_FILE_NAME: &str = ".repatch.toml";

/// Discover and load all config files in the cascade.
///
/// The cascade order is:
/// 1. Start from `start_dir` and look for `.repatch.toml`
/// 2. If found and `root = true`, stop walking up
/// 3. Otherwise, continue up the directory tree
/// 4. Finally, check ~/.repatch.toml
///
/// Returns configs in cascade order (most specific first).
pub fn discover_configs(start_dir: &Path) -> Result<Vec<LoadedConfig>> {
	let mut configs = Vec::new();
	let mut current_dir = start_dir.to_path_buf();

	loop {
		let config_path = current_dir.join(CONFIG_FILE_NAME);

		if config_path.is_file() {
			let config = parse_config_file(&config_path)?;
			let stop = config.root;

			configs.push(LoadedConfig {
				config,
				path: config_path,
			});

			if stop {
				break;
			}
		}

		if let Some(parent) = current_dir.parent() {
			current_dir = parent.to_path_buf();
		} else {
			break;
		}
	}

	if let Some(user_config) = load_user_config(&configs)? {
		configs.push(user_config);
	}

	Ok(configs)
}

/// Load the user's ~/.repatch.toml unless the walk already picked it up.
fn load_user_config(existing_configs: &[LoadedConfig]) -> Result<Option<LoadedConfig>> {
	let Some(home_dir) = dirs::home_dir() else {
		return Ok(None);
	};
	let user_config_path = home_dir.join(CONFIG_FILE_NAME);

	if existing_configs.iter().any(|c| c.path == user_config_path) {
		return Ok(None);
	}

	if user_config_path.is_file() {
		let config = parse_config_file(&user_config_path)?;
		Ok(Some(LoadedConfig {
			config,
			path: user_config_path,
		}))
	} else {
		Ok(None)
	}
}

/// Merge multiple configs into a single effective config.
///
/// The first config (most specific) wins for every value it sets.
pub fn merge_configs(configs: &[LoadedConfig]) -> Config {
	let mut merged = Config::default();

	for loaded in configs {
		merged.fill_from(&loaded.config);
		if loaded.config.root {
			merged.root = true;
		}
	}

	merged
}

/// Convenience function to discover, merge, and default settings from a directory.
pub fn load_settings(start_dir: &Path) -> Result<Settings> {
	let configs = discover_configs(start_dir)?;
	Ok(Settings::from_config(merge_configs(&configs), start_dir))
}

/// Get the path to the user's config file.
pub fn user_config_path() -> Result<PathBuf> {
	let home_dir = dirs::home_dir().ok_or(PatchError::HomeDirectoryNotFound)?;
	Ok(home_dir.join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;

	#[test]
	fn test_user_config_path() {
		let path = user_config_path();
		assert!(path.is_ok());
		let path = path.unwrap();
		assert!(path.ends_with(".repatch.toml"));
	}

	#[test]
	fn test_discover_walks_up_and_stops_at_root() {
		let dir = tempfile::tempdir().unwrap();
		let outer = dir.path().join("outer");
		let inner = outer.join("inner");
		let leaf = inner.join("leaf");
		fs::create_dir_all(&leaf).unwrap();

		fs::write(outer.join(CONFIG_FILE_NAME), "[tools]\nasar = \"outer-asar\"\n").unwrap();
		fs::write(
			inner.join(CONFIG_FILE_NAME),
			"root = true\n[tools]\njava = \"inner-java\"\n",
		)
		.unwrap();

		let configs = discover_configs(&leaf).unwrap();
		let local: Vec<_> = configs
			.iter()
			.filter(|c| c.path.starts_with(dir.path()))
			.collect();

		assert_eq!(local.len(), 1);
		assert_eq!(local[0].path, inner.join(CONFIG_FILE_NAME));
	}

	#[test]
	fn test_merge_most_specific_wins() {
		let near = LoadedConfig {
			config: toml::from_str("[tools]\nasar = \"near\"\n").unwrap(),
			path: PathBuf::from("/a/b/.repatch.toml"),
		};
		let far = LoadedConfig {
			config: toml::from_str("[tools]\nasar = \"far\"\njava = \"far-java\"\n").unwrap(),
			path: PathBuf::from("/a/.repatch.toml"),
		};

		let merged = merge_configs(&[near, far]);
		assert_eq!(merged.tools.asar, Some("near".to_string()));
		assert_eq!(merged.tools.java, Some("far-java".to_string()));
		assert!(merged.tools.zipalign.is_none());
	}

	#[test]
	fn test_settings_defaults() {
		let cwd = Path::new("/work");
		let settings = Settings::from_config(Config::default(), cwd);

		assert!(settings.desktop.path.is_none());
		assert_eq!(settings.desktop.rules_dir, PathBuf::from("/work/rules"));
		assert_eq!(settings.desktop.scan_dirs.len(), 3);
		assert_eq!(settings.desktop.unpack_dir, "{node_modules/@termius,out}");
		assert_eq!(settings.android.work_dir, PathBuf::from("/work"));
		assert_eq!(settings.android.app_name, "Termius");
		assert_eq!(settings.android.editor_repo, "REAndroid/APKEditor");
		assert_eq!(settings.tools.asar, "asar");
		assert_eq!(settings.tools.apksigner, "apksigner");
	}
}
