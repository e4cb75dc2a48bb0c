use std::path::PathBuf;

/// Library-level structured errors for repatch.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
	#[error("Failed to read config file: {path}")]
	ConfigReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Required file not found: {path}")]
	MissingFile { path: PathBuf },

	#[error("Failed to read file: {path}")]
	ReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to write file: {path}")]
	WriteError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Command execution failed: {command}")]
	CommandFailed {
		command: String,
		#[source]
		source: std::io::Error,
	},

	#[error("Command not found: {command}")]
	CommandNotFound { command: String },

	#[error("Command returned non-zero exit code: {command} (exit code: {exit_code})")]
	CommandNonZeroExit { command: String, exit_code: i32 },

	#[error("Request failed: {url}")]
	HttpError {
		url: String,
		#[source]
		source: reqwest::Error,
	},

	#[error("Failed to build HTTP client")]
	HttpClient {
		#[source]
		source: reqwest::Error,
	},

	#[error("Failed to decode JSON from {url}")]
	JsonError {
		url: String,
		#[source]
		source: serde_json::Error,
	},

	#[error("Unexpected response from {url}: {reason}")]
	UnexpectedResponse { url: String, reason: String },

	#[error("Signing configuration incomplete: {path} (missing or empty: {key})")]
	SignConfigIncomplete { path: PathBuf, key: String },

	#[error("Signing configuration not found in {work_dir} or the home directory")]
	SignConfigNotFound { work_dir: PathBuf },

	#[error("No app.asar found in {path}; pass --path to point at the resources directory")]
	BundleNotFound { path: PathBuf },

	#[error("Unsupported operating system: {os}")]
	UnsupportedOs { os: String },

	#[error("Failed to resolve home directory")]
	HomeDirectoryNotFound,
}

/// A problem with a single rule line.
///
/// These never abort a run: the offending rule is logged and skipped.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
	#[error("Invalid replacement rule format (expected old|new): {line}")]
	MissingDelimiter { line: String },

	#[error("Empty search text in rule: {line}")]
	EmptyPattern { line: String },

	#[error("Invalid regex pattern in rule: {pattern}")]
	InvalidRegex {
		pattern: String,
		#[source]
		source: regex::Error,
	},
}

/// Result type alias using PatchError.
pub type Result<T> = std::result::Result<T, PatchError>;
