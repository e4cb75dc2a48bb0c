use crate::desktop::remove_dir;
use crate::error::{PatchError, Result};
use std::path::{Path, PathBuf};

/// Scratch directory for one pipeline run, removed when dropped.
#[derive(Debug)]
pub struct TempWorkspace {
	path: PathBuf,
}

impl TempWorkspace {
	/// Create `path` fresh, wiping whatever a previous run left there.
	pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
		let path = path.into();
		if path.is_dir() {
			remove_dir(&path)?;
		} else if path.exists() {
			remove_file(&path)?;
		}
		std::fs::create_dir_all(&path).map_err(|source| PatchError::WriteError {
			path: path.clone(),
			source,
		})?;
		Ok(TempWorkspace { path })
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
		self.path.join(name)
	}
}

impl Drop for TempWorkspace {
	fn drop(&mut self) {
		tracing::info!("Cleaning temporary directory: {}", self.path.display());
		if let Err(e) = remove_dir(&self.path) {
			tracing::error!("Failed to clean temporary directory: {e}");
		}
	}
}

pub fn remove_file(path: &Path) -> Result<()> {
	std::fs::remove_file(path).map_err(|source| PatchError::WriteError {
		path: path.to_path_buf(),
		source,
	})
}

/// Remove `path` if it exists.
pub fn remove_file_if_exists(path: &Path) -> Result<()> {
	if path.exists() {
		remove_file(path)?;
	}
	Ok(())
}

/// Move a file, falling back to copy and delete across filesystems.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
	if std::fs::rename(from, to).is_ok() {
		return Ok(());
	}
	std::fs::copy(from, to).map_err(|source| PatchError::WriteError {
		path: to.to_path_buf(),
		source,
	})?;
	remove_file(from)
}

/// Copy `source` over `target`, logging instead of failing.
///
/// Returns false when the source is missing or the copy is refused.
pub fn replace_file(source: &Path, target: &Path) -> bool {
	if !source.exists() {
		tracing::error!(
			"Source file does not exist, cannot replace: {}",
			source.display()
		);
		return false;
	}

	if !target.exists() {
		tracing::warn!(
			"Target file does not exist, will copy directly: {}",
			target.display()
		);
	}

	match std::fs::copy(source, target) {
		Ok(_) => {
			tracing::info!(
				"File replaced successfully: {}, [Source: {}]",
				target.display(),
				source.display()
			);
			true
		}
		Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
			tracing::error!(
				"No write permission for target path: {}, check directory permissions",
				target.display()
			);
			false
		}
		Err(e) => {
			tracing::error!("File replacement failed: {e}");
			false
		}
	}
}
