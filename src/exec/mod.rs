//! External tool execution for repatch.
//!
//! This module handles:
//! - Running archive, package editor and signing tools with inherited stdio
//! - Turning non-zero exits into errors that name the command
//! - Resolving tool names against PATH for diagnostics

use crate::error::{PatchError, Result};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// One invocation of an external tool.
#[derive(Debug, Clone)]
pub struct ToolCommand {
	program: String,
	args: Vec<OsString>,
	redacted: bool,
}

impl ToolCommand {
	pub fn new(program: impl Into<String>) -> Self {
		ToolCommand {
			program: program.into(),
			args: Vec::new(),
			redacted: false,
		}
	}

	pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
		self.args.push(arg.as_ref().to_os_string());
		self
	}

	pub fn args<I, S>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<OsStr>,
	{
		self.args
			.extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
		self
	}

	/// Keep arguments out of logs and error messages (they carry secrets).
	pub fn redacted(mut self) -> Self {
		self.redacted = true;
		self
	}

	/// Command line as shown in logs and errors.
	pub fn display(&self) -> String {
		if self.redacted {
			return format!("{} <arguments redacted>", self.program);
		}
		std::iter::once(self.program.clone())
			.chain(self.args.iter().map(|a| a.to_string_lossy().into_owned()))
			.collect::<Vec<_>>()
			.join(" ")
	}

	fn build(&self) -> Command {
		// Node and Android SDK tools ship as .cmd/.bat shims on Windows.
		let mut cmd = if cfg!(windows) {
			let mut cmd = Command::new("cmd");
			cmd.arg("/C").arg(&self.program);
			cmd
		} else {
			Command::new(&self.program)
		};
		cmd.args(&self.args)
			.stdin(Stdio::inherit())
			.stdout(Stdio::inherit())
			.stderr(Stdio::inherit());
		cmd
	}

	/// Run to completion; a non-zero exit is an error.
	pub fn run(&self) -> Result<()> {
		let shown = self.display();
		tracing::info!("Running command: {}", shown);

		let status = self.build().status().map_err(|source| {
			if source.kind() == std::io::ErrorKind::NotFound {
				PatchError::CommandNotFound {
					command: self.program.clone(),
				}
			} else {
				PatchError::CommandFailed {
					command: shown.clone(),
					source,
				}
			}
		})?;

		if !status.success() {
			return Err(PatchError::CommandNonZeroExit {
				command: shown,
				exit_code: status.code().unwrap_or(-1),
			});
		}

		Ok(())
	}
}

/// Resolve a command name to its full path.
///
/// If the command is already an absolute path, returns it as-is.
/// Otherwise, searches PATH for the command.
pub fn resolve_command(command: &str) -> Option<PathBuf> {
	let path = Path::new(command);

	if path.is_absolute() {
		return path.exists().then(|| path.to_path_buf());
	}

	let path_var = std::env::var_os("PATH")?;
	std::env::split_paths(&path_var)
		.map(|dir| dir.join(command))
		.find(|full_path| full_path.is_file())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_display_joins_args() {
		let cmd = ToolCommand::new("asar")
			.arg("extract")
			.args(["app.asar", "app"]);
		assert_eq!(cmd.display(), "asar extract app.asar app");
	}

	#[test]
	fn test_display_redacted() {
		let cmd = ToolCommand::new("keytool")
			.args(["-storepass", "secret"])
			.redacted();
		assert_eq!(cmd.display(), "keytool <arguments redacted>");
		assert!(!cmd.display().contains("secret"));
	}

	#[cfg(unix)]
	#[test]
	fn test_run_success() {
		assert!(ToolCommand::new("true").run().is_ok());
	}

	#[cfg(unix)]
	#[test]
	fn test_run_non_zero_exit() {
		let result = ToolCommand::new("sh").args(["-c", "exit 3"]).run();
		match result.unwrap_err() {
			PatchError::CommandNonZeroExit { command, exit_code } => {
				assert_eq!(command, "sh -c exit 3");
				assert_eq!(exit_code, 3);
			}
			other => panic!("Expected CommandNonZeroExit, got {other:?}"),
		}
	}

	#[cfg(unix)]
	#[test]
	fn test_run_not_found() {
		let result = ToolCommand::new("nonexistent_tool_12345").run();
		assert!(matches!(result, Err(PatchError::CommandNotFound { .. })));
	}

	#[test]
	fn test_resolve_command_absolute_path() {
		#[cfg(unix)]
		{
			let result = resolve_command("/bin/sh");
			assert!(result.is_some());
			assert_eq!(result.unwrap(), Path::new("/bin/sh"));
		}
	}

	#[test]
	fn test_resolve_command_not_found() {
		let result = resolve_command("/nonexistent/path/to/binary");
		assert!(result.is_none());
	}

	#[test]
	fn test_resolve_command_from_path() {
		#[cfg(unix)]
		{
			let result = resolve_command("sh");
			assert!(result.is_some());
		}
	}
}
