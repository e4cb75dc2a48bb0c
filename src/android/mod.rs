//! Android package download, rebuild and re-signing.
//!
//! This module handles:
//! - Fetching the split package bundle and the package editor jar
//! - Merging, decompiling, patching and rebuilding the package
//! - Aligning, signing and verifying the result

pub mod download;
pub mod tools;
pub mod workspace;

pub use download::Downloader;
pub use tools::BuildTools;
pub use workspace::{TempWorkspace, move_file, replace_file};

use crate::config::{AndroidSettings, SignProperties, ToolSettings, find_sign_properties};
use crate::error::{PatchError, Result};
use std::path::{Path, PathBuf};
use workspace::remove_file_if_exists;

pub const TEMP_DIR: &str = ".tmp_dir";
pub const OUTPUT_DIR: &str = "out";
pub const BUNDLE_EXT: &str = "apkm";
pub const APK_EXT: &str = "apk";
pub const EDITOR_JAR: &str = "APKEditor.jar";
pub const LANGUAGE_XML: &str = "strings.xml";
const ALIGNED_SUFFIX: &str = "_aligned";
const SIGNED_SUFFIX: &str = "_signed";
const PATCHED_SUFFIX: &str = "_zh";

/// Where the decompiled tree keeps its default string table.
pub fn language_xml_target(decompile_dir: &Path) -> PathBuf {
	decompile_dir
		.join("resources")
		.join("package_1")
		.join("res")
		.join("values")
		.join(LANGUAGE_XML)
}

/// Paths and tools for one Android run.
#[derive(Debug)]
pub struct AndroidPatcher {
	settings: AndroidSettings,
	tools: BuildTools,
}

impl AndroidPatcher {
	pub fn new(settings: AndroidSettings, tools: ToolSettings) -> Self {
		let editor_jar = settings.work_dir.join(EDITOR_JAR);
		AndroidPatcher {
			tools: BuildTools::new(tools, editor_jar),
			settings,
		}
	}

	pub fn work_dir(&self) -> &Path {
		&self.settings.work_dir
	}

	pub fn bundle_path(&self) -> PathBuf {
		self.work_dir()
			.join(format!("{}.{}", self.settings.app_name, BUNDLE_EXT))
	}

	pub fn editor_jar_path(&self) -> PathBuf {
		self.work_dir().join(EDITOR_JAR)
	}

	pub fn language_xml_path(&self) -> PathBuf {
		self.work_dir().join(LANGUAGE_XML)
	}

	/// Final signed package.
	pub fn output_path(&self) -> PathBuf {
		self.work_dir()
			.join(OUTPUT_DIR)
			.join(format!("{}.{}", self.settings.app_name, APK_EXT))
	}

	/// Read signing configuration for this work dir.
	pub fn sign_properties(&self) -> Result<SignProperties> {
		find_sign_properties(self.work_dir())
	}

	/// Download or generate whatever the pipeline needs and is missing.
	pub fn ensure_prerequisites(&self, sign: &SignProperties) -> Result<()> {
		let language_xml = self.language_xml_path();
		if !language_xml.is_file() {
			return Err(PatchError::MissingFile { path: language_xml });
		}

		let bundle = self.bundle_path();
		let jar = self.editor_jar_path();
		if !bundle.exists() || !jar.exists() {
			let downloader = Downloader::new(&self.settings)?;
			if bundle.exists() {
				tracing::info!("{} already exists, skipping download.", bundle.display());
			} else {
				tracing::info!("{} does not exist, starting download...", bundle.display());
				downloader.download_app_package(&bundle)?;
			}
			if !jar.exists() {
				tracing::info!("{} not found, starting download...", jar.display());
				downloader.download_editor_jar(&jar)?;
			}
		}

		let keystore = sign.keystore_path(self.work_dir());
		if !keystore.exists() {
			self.tools.generate_keystore(&keystore, sign)?;
		}

		Ok(())
	}

	/// Rebuild the package with the replacement string table and sign it.
	///
	/// All intermediate files live in a temp dir that is removed on every
	/// exit path.
	pub fn modify(&self, sign: &SignProperties) -> Result<PathBuf> {
		let jar = self.editor_jar_path();
		if !jar.exists() {
			return Err(PatchError::MissingFile { path: jar });
		}
		let bundle = self.bundle_path();
		if !bundle.exists() {
			return Err(PatchError::MissingFile { path: bundle });
		}

		let tmp = TempWorkspace::create(self.work_dir().join(TEMP_DIR))?;
		let app = &self.settings.app_name;
		let merged_apk = tmp.join(format!("{app}.{APK_EXT}"));
		let decompile_dir = tmp.join(app);
		let patched_name = format!("{app}{PATCHED_SUFFIX}");
		let patched_apk = tmp.join(format!("{patched_name}.{APK_EXT}"));

		tracing::info!("Starting APK file processing");
		remove_file_if_exists(&merged_apk)?;
		self.tools.merge_command(&bundle, &merged_apk).run()?;

		tracing::info!("Decompiling APK file");
		crate::desktop::remove_dir(&decompile_dir)?;
		self.tools.decode_command(&merged_apk, &decompile_dir).run()?;

		tracing::info!("Replacing language resources");
		let target_xml = language_xml_target(&decompile_dir);
		if !replace_file(&self.language_xml_path(), &target_xml) {
			tracing::warn!("Language file was not replaced; the package keeps its original strings");
		}

		tracing::info!("Repackaging APK file");
		remove_file_if_exists(&patched_apk)?;
		self.tools.build_command(&decompile_dir, &patched_apk).run()?;

		tracing::info!("Executing zipalign operation");
		let aligned = tmp.join(format!("{patched_name}{ALIGNED_SUFFIX}.{APK_EXT}"));
		self.swap_through(&patched_apk, &aligned, |input, output| {
			self.tools.zipalign_command(input, output).run()
		})?;

		tracing::info!("Signing APK file");
		let keystore = sign.keystore_path(self.work_dir());
		let signed = tmp.join(format!("{patched_name}{SIGNED_SUFFIX}.{APK_EXT}"));
		self.swap_through(&patched_apk, &signed, |input, output| {
			self.tools.sign_command(&keystore, sign, input, output).run()
		})?;

		tracing::info!("Verifying APK signature");
		self.tools.verify_command(&patched_apk).run()?;

		tracing::info!("Exporting final APK file");
		let output = self.output_path();
		if let Some(out_dir) = output.parent() {
			std::fs::create_dir_all(out_dir).map_err(|source| PatchError::WriteError {
				path: out_dir.to_path_buf(),
				source,
			})?;
		}
		remove_file_if_exists(&output)?;
		move_file(&patched_apk, &output)?;

		Ok(output)
	}

	/// Run `step` from `apk` into `scratch`, then put the result back at `apk`.
	fn swap_through<F>(&self, apk: &Path, scratch: &Path, step: F) -> Result<()>
	where
		F: FnOnce(&Path, &Path) -> Result<()>,
	{
		if !apk.exists() {
			return Err(PatchError::MissingFile {
				path: apk.to_path_buf(),
			});
		}
		remove_file_if_exists(scratch)?;
		step(apk, scratch)?;
		workspace::remove_file(apk)?;
		move_file(scratch, apk)
	}

	/// The whole Android flow: prerequisites, then rebuild.
	pub fn run(&self) -> Result<PathBuf> {
		let sign = self.sign_properties()?;
		self.ensure_prerequisites(&sign)?;
		self.modify(&sign)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::{Config, Settings};

	fn patcher(work_dir: &Path) -> AndroidPatcher {
		let settings = Settings::from_config(Config::default(), work_dir);
		AndroidPatcher::new(settings.android, settings.tools)
	}

	#[test]
	fn test_paths() {
		let p = patcher(Path::new("/w"));
		assert_eq!(p.bundle_path(), PathBuf::from("/w/Termius.apkm"));
		assert_eq!(p.editor_jar_path(), PathBuf::from("/w/APKEditor.jar"));
		assert_eq!(p.language_xml_path(), PathBuf::from("/w/strings.xml"));
		assert_eq!(p.output_path(), PathBuf::from("/w/out/Termius.apk"));
	}

	#[test]
	fn test_language_xml_target() {
		assert_eq!(
			language_xml_target(Path::new("/t/Termius")),
			PathBuf::from("/t/Termius/resources/package_1/res/values/strings.xml")
		);
	}

	#[test]
	fn test_missing_language_file_is_fatal() {
		let dir = tempfile::tempdir().unwrap();
		let p = patcher(dir.path());
		let sign = crate::config::parse_sign_properties(
			"sign.keystore=k.jks\nsign.keystore.password=a\nsign.key.alias=b\nsign.key.password=c\n",
			Path::new("p"),
		)
		.unwrap();

		match p.ensure_prerequisites(&sign) {
			Err(PatchError::MissingFile { path }) => assert!(path.ends_with("strings.xml")),
			other => panic!("Expected MissingFile, got {other:?}"),
		}
	}

	#[test]
	fn test_modify_requires_editor_jar() {
		let dir = tempfile::tempdir().unwrap();
		let p = patcher(dir.path());
		let sign = crate::config::parse_sign_properties(
			"sign.keystore=k.jks\nsign.keystore.password=a\nsign.key.alias=b\nsign.key.password=c\n",
			Path::new("p"),
		)
		.unwrap();

		assert!(matches!(
			p.modify(&sign),
			Err(PatchError::MissingFile { .. })
		));
		assert!(!dir.path().join(TEMP_DIR).exists());
	}
}
