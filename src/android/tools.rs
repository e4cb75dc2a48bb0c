use crate::config::{SignProperties, ToolSettings};
use crate::error::Result;
use crate::exec::ToolCommand;
use std::path::{Path, PathBuf};

/// Commands for the package editor jar and the SDK build tools.
#[derive(Debug, Clone)]
pub struct BuildTools {
	tools: ToolSettings,
	editor_jar: PathBuf,
}

impl BuildTools {
	pub fn new(tools: ToolSettings, editor_jar: impl Into<PathBuf>) -> Self {
		BuildTools {
			tools,
			editor_jar: editor_jar.into(),
		}
	}

	fn editor(&self, action: &str, input: &Path, output: &Path) -> ToolCommand {
		ToolCommand::new(&self.tools.java)
			.arg("-jar")
			.arg(&self.editor_jar)
			.arg(action)
			.arg("-i")
			.arg(input)
			.arg("-o")
			.arg(output)
	}

	/// Merge a split bundle into one package.
	pub fn merge_command(&self, bundle: &Path, apk: &Path) -> ToolCommand {
		self.editor("m", bundle, apk)
	}

	/// Decompile a package into an editable resource tree.
	pub fn decode_command(&self, apk: &Path, out_dir: &Path) -> ToolCommand {
		self.editor("d", apk, out_dir)
	}

	/// Rebuild a package from a resource tree.
	pub fn build_command(&self, src_dir: &Path, apk: &Path) -> ToolCommand {
		self.editor("b", src_dir, apk)
	}

	pub fn zipalign_command(&self, input: &Path, output: &Path) -> ToolCommand {
		ToolCommand::new(&self.tools.zipalign)
			.args(["-p", "-f", "4"])
			.arg(input)
			.arg(output)
	}

	pub fn sign_command(
		&self,
		keystore: &Path,
		sign: &SignProperties,
		input: &Path,
		output: &Path,
	) -> ToolCommand {
		ToolCommand::new(&self.tools.apksigner)
			.arg("sign")
			.arg("--ks")
			.arg(keystore)
			.arg("--ks-pass")
			.arg(format!("pass:{}", sign.keystore_password))
			.arg("--ks-key-alias")
			.arg(&sign.key_alias)
			.arg("--key-pass")
			.arg(format!("pass:{}", sign.key_password))
			.arg("--out")
			.arg(output)
			.arg(input)
			.redacted()
	}

	pub fn verify_command(&self, apk: &Path) -> ToolCommand {
		ToolCommand::new(&self.tools.apksigner)
			.args(["verify", "--verbose"])
			.arg(apk)
	}

	pub fn keystore_command(&self, keystore: &Path, sign: &SignProperties) -> ToolCommand {
		ToolCommand::new(&self.tools.keytool)
			.arg("-genkeypair")
			.args(["-alias", sign.key_alias.as_str()])
			.args(["-keyalg", "RSA", "-keysize", "2048", "-validity", "10000"])
			.arg("-keystore")
			.arg(keystore)
			.args(["-storepass", sign.keystore_password.as_str()])
			.args(["-keypass", sign.key_password.as_str()])
			.args(["-dname", sign.dname().as_str()])
			.redacted()
	}

	/// Create a signing keystore from the properties.
	pub fn generate_keystore(&self, keystore: &Path, sign: &SignProperties) -> Result<()> {
		tracing::info!("Generating keystore");
		self.keystore_command(keystore, sign).run()?;
		tracing::info!("Keystore generation completed");
		Ok(())
	}
}
