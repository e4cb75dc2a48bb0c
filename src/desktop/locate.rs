use crate::desktop::workspace::BUNDLE_FILE;
use crate::error::{PatchError, Result};
use std::path::{Path, PathBuf};

/// Where the desktop app keeps its resources on this platform.
pub fn default_resources_dir() -> Result<PathBuf> {
	match std::env::consts::OS {
		"windows" => {
			let local = std::env::var_os("LOCALAPPDATA")
				.map(PathBuf::from)
				.or_else(dirs::data_local_dir)
				.ok_or(PatchError::HomeDirectoryNotFound)?;
			Ok(local.join("Programs").join("Termius").join("resources"))
		}
		"macos" => Ok(PathBuf::from("/Applications/Termius.app/Contents/Resources")),
		"linux" => Ok(PathBuf::from("/opt/Termius/resources")),
		other => Err(PatchError::UnsupportedOs {
			os: other.to_string(),
		}),
	}
}

pub fn has_bundle(dir: &Path) -> bool {
	dir.join(BUNDLE_FILE).is_file()
}

/// Pick the resources directory: explicit path first, then the platform default.
pub fn locate_resources_dir(explicit: Option<&Path>) -> Result<PathBuf> {
	let dir = match explicit {
		Some(path) => path.to_path_buf(),
		None => default_resources_dir()?,
	};

	if !has_bundle(&dir) {
		tracing::warn!(
			"app.asar file not found at: {}",
			dir.join(BUNDLE_FILE).display()
		);
		return Err(PatchError::BundleNotFound { path: dir });
	}

	Ok(dir)
}
