use crate::error::{PatchError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Java-properties file holding keystore settings.
pub const SIGN_PROPERTIES_FILE: &str = "apk.sign.properties";

const KEY_KEYSTORE: &str = "sign.keystore";
const KEY_KEYSTORE_PASSWORD: &str = "sign.keystore.password";
const KEY_ALIAS: &str = "sign.key.alias";
const KEY_PASSWORD: &str = "sign.key.password";
const KEY_DNAME_CN: &str = "sign.key.dname.cn";
const KEY_DNAME_C: &str = "sign.key.dname.c";

/// Keystore settings used to sign the rebuilt package.
#[derive(Clone, PartialEq, Eq)]
pub struct SignProperties {
	/// Keystore file name, relative to the work dir.
	pub keystore: String,
	pub keystore_password: String,
	pub key_alias: String,
	pub key_password: String,
	pub dname_cn: String,
	pub dname_c: String,
}

impl std::fmt::Debug for SignProperties {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SignProperties")
			.field("keystore", &self.keystore)
			.field("keystore_password", &"<redacted>")
			.field("key_alias", &self.key_alias)
			.field("key_password", &"<redacted>")
			.field("dname_cn", &self.dname_cn)
			.field("dname_c", &self.dname_c)
			.finish()
	}
}

impl SignProperties {
	/// The keystore path inside `work_dir`.
	pub fn keystore_path(&self, work_dir: &Path) -> PathBuf {
		work_dir.join(&self.keystore)
	}

	/// Distinguished name passed to `keytool -dname`.
	pub fn dname(&self) -> String {
		format!("CN={},C={}", self.dname_cn, self.dname_c)
	}
}

/// Parse `key=value` lines. Blank lines, `#` comments, and lines that do
/// not split into exactly two parts are ignored.
fn parse_properties(content: &str) -> HashMap<String, String> {
	content
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty() && !line.starts_with('#'))
		.filter_map(|line| {
			let parts: Vec<&str> = line.split('=').collect();
			match parts.as_slice() {
				[key, value] => Some((key.trim().to_string(), value.trim().to_string())),
				_ => None,
			}
		})
		.collect()
}

/// Parse signing properties, checking that every required key is present.
pub fn parse_sign_properties(content: &str, path: &Path) -> Result<SignProperties> {
	let mut props = parse_properties(content);

	let mut take = |key: &str, allow_empty: bool| -> Result<String> {
		match props.remove(key) {
			Some(value) if allow_empty || !value.is_empty() => Ok(value),
			_ => Err(PatchError::SignConfigIncomplete {
				path: path.to_path_buf(),
				key: key.to_string(),
			}),
		}
	};

	let keystore = take(KEY_KEYSTORE, false)?;
	let keystore_password = take(KEY_KEYSTORE_PASSWORD, false)?;
	let key_alias = take(KEY_ALIAS, false)?;
	let key_password = take(KEY_PASSWORD, false)?;
	let dname_cn = take(KEY_DNAME_CN, true).unwrap_or_else(|_| "Unknown".to_string());
	let dname_c = take(KEY_DNAME_C, true).unwrap_or_else(|_| "Unknown".to_string());

	Ok(SignProperties {
		keystore,
		keystore_password,
		key_alias,
		key_password,
		dname_cn,
		dname_c,
	})
}

/// Look for the properties file in `work_dir`, then in the home directory.
pub fn find_sign_properties(work_dir: &Path) -> Result<SignProperties> {
	let candidates = std::iter::once(work_dir.join(SIGN_PROPERTIES_FILE))
		.chain(dirs::home_dir().map(|home| home.join(SIGN_PROPERTIES_FILE)));

	for path in candidates {
		if !path.is_file() {
			continue;
		}
		let content = std::fs::read_to_string(&path).map_err(|source| PatchError::ReadError {
			path: path.clone(),
			source,
		})?;
		tracing::debug!("Using signing configuration from {}", path.display());
		return parse_sign_properties(&content, &path);
	}

	Err(PatchError::SignConfigNotFound {
		work_dir: work_dir.to_path_buf(),
	})
}
