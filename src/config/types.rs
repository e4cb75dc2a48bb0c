use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration from a `.repatch.toml` file.
///
/// Every value is optional; unset values fall through the cascade and end
/// up at the defaults in [`Settings`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
	/// If true, stop the upward directory walk (the user config is still read).
	#[serde(default)]
	pub root: bool,

	#[serde(default)]
	pub desktop: DesktopConfig,

	#[serde(default)]
	pub android: AndroidConfig,

	#[serde(default)]
	pub tools: ToolsConfig,
}

/// `[desktop]`: Electron bundle patching.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct DesktopConfig {
	/// Resources directory holding `app.asar`.
	pub path: Option<PathBuf>,

	/// Directory holding `<mode>.txt` rule files.
	pub rules_dir: Option<PathBuf>,

	/// Subdirectories of the extracted bundle that are scanned for files.
	pub scan_dirs: Option<Vec<PathBuf>>,

	/// Glob passed to `asar pack --unpack-dir`.
	pub unpack_dir: Option<String>,
}

/// `[android]`: package download and rebuild.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AndroidConfig {
	pub work_dir: Option<PathBuf>,
	pub app_name: Option<String>,
	pub mirror_url: Option<String>,
	pub mirror_origin: Option<String>,
	pub version_slug_prefix: Option<String>,

	/// GitHub `owner/name` of the package editor.
	pub editor_repo: Option<String>,
	pub github_api: Option<String>,
	pub user_agent: Option<String>,
}

/// `[tools]`: external programs, by name or path.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ToolsConfig {
	pub asar: Option<String>,
	pub java: Option<String>,
	pub zipalign: Option<String>,
	pub apksigner: Option<String>,
	pub keytool: Option<String>,
}

/// A loaded configuration with its source path for debugging/display.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
	/// The parsed configuration.
	pub config: Config,

	/// The path this config was loaded from.
	pub path: PathBuf,
}

macro_rules! fill_from {
	($target:expr, $other:expr, $($field:ident),+ $(,)?) => {
		$(
			if $target.$field.is_none() {
				$target.$field = $other.$field.clone();
			}
		)+
	};
}

impl Config {
	/// Fill every unset value from `other` (a less specific config).
	pub fn fill_from(&mut self, other: &Config) {
		fill_from!(self.desktop, other.desktop, path, rules_dir, scan_dirs, unpack_dir);
		fill_from!(
			self.android,
			other.android,
			work_dir,
			app_name,
			mirror_url,
			mirror_origin,
			version_slug_prefix,
			editor_repo,
			github_api,
			user_agent,
		);
		fill_from!(self.tools, other.tools, asar, java, zipalign, apksigner, keytool);
	}

	/// Make relative paths absolute against `base` (the config file's directory).
	pub fn resolve_paths(&mut self, base: &Path) {
		for path in [
			&mut self.desktop.path,
			&mut self.desktop.rules_dir,
			&mut self.android.work_dir,
		]
		.into_iter()
		.flatten()
		{
			if path.is_relative() {
				*path = base.join(&*path);
			}
		}
	}
}

pub const DEFAULT_SCAN_DIRS: [&str; 3] = [
	"background-process/assets",
	"ui-process/assets",
	"main-process",
];
pub const DEFAULT_UNPACK_DIR: &str = "{node_modules/@termius,out}";
pub const DEFAULT_APP_NAME: &str = "Termius";
pub const DEFAULT_MIRROR_URL: &str =
	"https://www.apkmirror.com/apk/termius-corporation/termius-ssh-telnet-client/";
pub const DEFAULT_MIRROR_ORIGIN: &str = "https://www.apkmirror.com";
pub const DEFAULT_VERSION_SLUG_PREFIX: &str = "termius-modern-ssh-client";
pub const DEFAULT_EDITOR_REPO: &str = "REAndroid/APKEditor";
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36 Edg/138.0.0.0";

/// Effective settings after merging the cascade and applying defaults.
#[derive(Debug, Clone)]
pub struct Settings {
	pub desktop: DesktopSettings,
	pub android: AndroidSettings,
	pub tools: ToolSettings,
}

#[derive(Debug, Clone)]
pub struct DesktopSettings {
	/// `None` means "use the platform default".
	pub path: Option<PathBuf>,
	pub rules_dir: PathBuf,
	pub scan_dirs: Vec<PathBuf>,
	pub unpack_dir: String,
}

#[derive(Debug, Clone)]
pub struct AndroidSettings {
	pub work_dir: PathBuf,
	pub app_name: String,
	pub mirror_url: String,
	pub mirror_origin: String,
	pub version_slug_prefix: String,
	pub editor_repo: String,
	pub github_api: String,
	pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct ToolSettings {
	pub asar: String,
	pub java: String,
	pub zipalign: String,
	pub apksigner: String,
	pub keytool: String,
}

impl Settings {
	/// Apply defaults to a merged config. Relative defaults resolve against `cwd`.
	pub fn from_config(config: Config, cwd: &Path) -> Self {
		let Config {
			desktop,
			android,
			tools,
			..
		} = config;

		Settings {
			desktop: DesktopSettings {
				path: desktop.path,
				rules_dir: desktop.rules_dir.unwrap_or_else(|| cwd.join("rules")),
				scan_dirs: desktop
					.scan_dirs
					.unwrap_or_else(|| DEFAULT_SCAN_DIRS.iter().map(PathBuf::from).collect()),
				unpack_dir: desktop
					.unpack_dir
					.unwrap_or_else(|| DEFAULT_UNPACK_DIR.to_string()),
			},
			android: AndroidSettings {
				work_dir: android.work_dir.unwrap_or_else(|| cwd.to_path_buf()),
				app_name: android
					.app_name
					.unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
				mirror_url: android
					.mirror_url
					.unwrap_or_else(|| DEFAULT_MIRROR_URL.to_string()),
				mirror_origin: android
					.mirror_origin
					.unwrap_or_else(|| DEFAULT_MIRROR_ORIGIN.to_string()),
				version_slug_prefix: android
					.version_slug_prefix
					.unwrap_or_else(|| DEFAULT_VERSION_SLUG_PREFIX.to_string()),
				editor_repo: android
					.editor_repo
					.unwrap_or_else(|| DEFAULT_EDITOR_REPO.to_string()),
				github_api: android
					.github_api
					.unwrap_or_else(|| DEFAULT_GITHUB_API.to_string()),
				user_agent: android
					.user_agent
					.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
			},
			tools: ToolSettings {
				asar: tools.asar.unwrap_or_else(|| "asar".to_string()),
				java: tools.java.unwrap_or_else(|| "java".to_string()),
				zipalign: tools.zipalign.unwrap_or_else(|| "zipalign".to_string()),
				apksigner: tools.apksigner.unwrap_or_else(|| "apksigner".to_string()),
				keytool: tools.keytool.unwrap_or_else(|| "keytool".to_string()),
			},
		}
	}
}
