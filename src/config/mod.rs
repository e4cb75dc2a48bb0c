//! Configuration loading and parsing for repatch.
//!
//! This module handles:
//! - TOML config file parsing
//! - Directory cascade discovery
//! - Config merging and defaults
//! - Signing properties for the Android pipeline

pub mod cascade;
pub mod parser;
pub mod signing;
pub mod template;
pub mod types;

pub use cascade::{
	CONFIG_FILE_NAME, discover_configs, load_settings, merge_configs, user_config_path,
};
pub use parser::{parse_config_file, parse_config_str};
pub use signing::{
	SIGN_PROPERTIES_FILE, SignProperties, find_sign_properties, parse_sign_properties,
};
pub use template::generate_init_template;
pub use types::{
	AndroidSettings, Config, DesktopSettings, LoadedConfig, Settings, ToolSettings,
};
