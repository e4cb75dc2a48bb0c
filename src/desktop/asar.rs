use crate::error::Result;
use crate::exec::ToolCommand;
use std::path::Path;

/// The `asar` archive packer.
#[derive(Debug, Clone)]
pub struct Asar {
	program: String,
}

impl Asar {
	pub fn new(program: impl Into<String>) -> Self {
		Asar {
			program: program.into(),
		}
	}

	/// Fails unless `asar --version` runs cleanly.
	pub fn check_installed(&self) -> Result<()> {
		self.command().arg("--version").run()
	}

	pub fn extract_command(&self, archive: &Path, dest: &Path) -> ToolCommand {
		self.command().arg("extract").arg(archive).arg(dest)
	}

	/// `unpack_dir` is a glob of paths kept outside the archive.
	pub fn pack_command(&self, src: &Path, archive: &Path, unpack_dir: &str) -> ToolCommand {
		self.command()
			.arg("pack")
			.arg(src)
			.arg(archive)
			.args(["--unpack-dir", unpack_dir])
	}

	pub fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
		self.extract_command(archive, dest).run()
	}

	pub fn pack(&self, src: &Path, archive: &Path, unpack_dir: &str) -> Result<()> {
		self.pack_command(src, archive, unpack_dir).run()
	}

	fn command(&self) -> ToolCommand {
		ToolCommand::new(&self.program)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_extract_command() {
		let asar = Asar::new("asar");
		let cmd = asar.extract_command(Path::new("/r/app.asar"), Path::new("/r/app"));
		assert_eq!(cmd.display(), "asar extract /r/app.asar /r/app");
	}

	#[test]
	fn test_pack_command() {
		let asar = Asar::new("asar");
		let cmd = asar.pack_command(
			Path::new("/r/app"),
			Path::new("/r/app.asar"),
			"{node_modules/@termius,out}",
		);
		assert_eq!(
			cmd.display(),
			"asar pack /r/app /r/app.asar --unpack-dir {node_modules/@termius,out}"
		);
	}
}
