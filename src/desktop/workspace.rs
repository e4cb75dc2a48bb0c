use crate::error::{PatchError, Result};
use std::path::{Path, PathBuf};

pub const BUNDLE_FILE: &str = "app.asar";
pub const BACKUP_FILE: &str = "app.asar.bak";
pub const APP_DIR: &str = "app";

/// The files repatch manages inside an application's resources directory.
#[derive(Debug, Clone)]
pub struct Bundle {
	root: PathBuf,
}

impl Bundle {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Bundle { root: root.into() }
	}

	/// Open `root` as a bundle, failing if it holds no `app.asar`.
	pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
		let bundle = Bundle::new(root);
		if !bundle.archive_path().is_file() {
			return Err(PatchError::BundleNotFound { path: bundle.root });
		}
		Ok(bundle)
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn archive_path(&self) -> PathBuf {
		self.root.join(BUNDLE_FILE)
	}

	pub fn backup_path(&self) -> PathBuf {
		self.root.join(BACKUP_FILE)
	}

	pub fn app_dir(&self) -> PathBuf {
		self.root.join(APP_DIR)
	}

	pub fn has_backup(&self) -> bool {
		self.backup_path().is_file()
	}

	/// Copy the pristine archive aside, only if no backup exists yet.
	pub fn create_backup(&self) -> Result<()> {
		if self.has_backup() {
			return Ok(());
		}
		copy_file(&self.archive_path(), &self.backup_path())?;
		tracing::info!("Created initial backup.");
		Ok(())
	}

	/// Put the pristine archive back. Returns false when there is no backup.
	pub fn restore_backup(&self) -> Result<bool> {
		if !self.has_backup() {
			tracing::info!("Backup file not found, skip backup restore.");
			return Ok(false);
		}
		copy_file(&self.backup_path(), &self.archive_path())?;
		tracing::info!("Restored from backup.");
		Ok(true)
	}

	/// Restore the archive and drop any previously extracted tree.
	pub fn clean(&self) -> Result<()> {
		self.restore_backup()?;
		let app_dir = self.app_dir();
		if app_dir.exists() {
			remove_dir(&app_dir)?;
			tracing::debug!("Cleaned app directory.");
		}
		Ok(())
	}

	/// Undo everything: clean, then forget the backup.
	pub fn restore_original(&self) -> Result<()> {
		self.clean()?;
		let backup = self.backup_path();
		if backup.exists() {
			std::fs::remove_file(&backup).map_err(|source| PatchError::WriteError {
				path: backup,
				source,
			})?;
		}
		Ok(())
	}

	/// Guard that puts the backup back unless [`RestoreGuard::commit`] is called.
	pub fn restore_guard(&self) -> RestoreGuard<'_> {
		RestoreGuard {
			bundle: self,
			armed: true,
		}
	}
}

/// Restores `app.asar` from its backup when dropped while still armed.
#[must_use = "dropping the guard immediately restores the backup"]
#[derive(Debug)]
pub struct RestoreGuard<'a> {
	bundle: &'a Bundle,
	armed: bool,
}

impl RestoreGuard<'_> {
	/// The run finished; keep the patched archive.
	pub fn commit(mut self) {
		self.armed = false;
	}
}

impl Drop for RestoreGuard<'_> {
	fn drop(&mut self) {
		if !self.armed {
			return;
		}
		tracing::warn!("Run did not complete, restoring original archive.");
		if let Err(e) = self.bundle.restore_backup() {
			tracing::error!("Failed to restore backup: {e}");
		}
	}
}

fn copy_file(from: &Path, to: &Path) -> Result<()> {
	std::fs::copy(from, to).map_err(|source| PatchError::WriteError {
		path: to.to_path_buf(),
		source,
	})?;
	Ok(())
}

/// Remove a directory tree, clearing read-only flags if the first attempt
/// is refused.
pub fn remove_dir(path: &Path) -> Result<()> {
	if !path.exists() {
		return Ok(());
	}

	let to_error = |source: std::io::Error| PatchError::WriteError {
		path: path.to_path_buf(),
		source,
	};

	match std::fs::remove_dir_all(path) {
		Ok(()) => Ok(()),
		Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
			clear_readonly(path);
			std::fs::remove_dir_all(path).map_err(to_error)
		}
		Err(e) => Err(to_error(e)),
	}
}

#[allow(clippy::permissions_set_readonly_false)]
fn clear_readonly(path: &Path) {
	for entry in walkdir::WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
		if let Ok(metadata) = entry.metadata() {
			let mut permissions = metadata.permissions();
			if permissions.readonly() {
				permissions.set_readonly(false);
				let _ = std::fs::set_permissions(entry.path(), permissions);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;

	fn bundle_with_archive(body: &str) -> (tempfile::TempDir, Bundle) {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join(BUNDLE_FILE), body).unwrap();
		let bundle = Bundle::open(dir.path()).unwrap();
		(dir, bundle)
	}

	#[test]
	fn test_open_requires_archive() {
		let dir = tempfile::tempdir().unwrap();
		assert!(matches!(
			Bundle::open(dir.path()),
			Err(PatchError::BundleNotFound { .. })
		));
	}

	#[test]
	fn test_backup_created_once() {
		let (_dir, bundle) = bundle_with_archive("original");
		bundle.create_backup().unwrap();

		fs::write(bundle.archive_path(), "patched").unwrap();
		bundle.create_backup().unwrap();

		assert_eq!(fs::read_to_string(bundle.backup_path()).unwrap(), "original");
	}

	#[test]
	fn test_restore_without_backup() {
		let (_dir, bundle) = bundle_with_archive("original");
		assert!(!bundle.restore_backup().unwrap());
	}

	#[test]
	fn test_clean_restores_and_removes_app_dir() {
		let (_dir, bundle) = bundle_with_archive("original");
		bundle.create_backup().unwrap();
		fs::write(bundle.archive_path(), "patched").unwrap();
		fs::create_dir_all(bundle.app_dir().join("main-process")).unwrap();
		fs::write(bundle.app_dir().join("main-process/main.js"), "x").unwrap();

		bundle.clean().unwrap();

		assert_eq!(fs::read_to_string(bundle.archive_path()).unwrap(), "original");
		assert!(!bundle.app_dir().exists());
		assert!(bundle.has_backup());
	}

	#[test]
	fn test_restore_original_drops_backup() {
		let (_dir, bundle) = bundle_with_archive("original");
		bundle.create_backup().unwrap();
		fs::write(bundle.archive_path(), "patched").unwrap();

		bundle.restore_original().unwrap();

		assert_eq!(fs::read_to_string(bundle.archive_path()).unwrap(), "original");
		assert!(!bundle.has_backup());
	}

	#[test]
	fn test_guard_restores_when_dropped() {
		let (_dir, bundle) = bundle_with_archive("original");
		bundle.create_backup().unwrap();
		{
			let _guard = bundle.restore_guard();
			fs::write(bundle.archive_path(), "half written").unwrap();
		}
		assert_eq!(fs::read_to_string(bundle.archive_path()).unwrap(), "original");
	}

	#[test]
	fn test_guard_commit_keeps_patch() {
		let (_dir, bundle) = bundle_with_archive("original");
		bundle.create_backup().unwrap();
		let guard = bundle.restore_guard();
		fs::write(bundle.archive_path(), "patched").unwrap();
		guard.commit();
		assert_eq!(fs::read_to_string(bundle.archive_path()).unwrap(), "patched");
	}

	#[test]
	fn test_remove_dir_missing_is_ok() {
		let dir = tempfile::tempdir().unwrap();
		assert!(remove_dir(&dir.path().join("nope")).is_ok());
	}
}
