use crate::config::types::{
	DEFAULT_APP_NAME, DEFAULT_EDITOR_REPO, DEFAULT_MIRROR_URL, DEFAULT_UNPACK_DIR,
};

/// Commented `.repatch.toml` written by `repatch --init`.
pub fn generate_init_template() -> String {
	format!(
		r#"# repatch configuration
#
# Values set here override ~/.repatch.toml. Relative paths resolve against
# the directory holding this file.

# Stop looking for .repatch.toml in parent directories.
root = true

[desktop]
# Resources directory holding app.asar (defaults to the platform install path).
# path = "/opt/Termius/resources"

# Directory with skip_login.txt, trial.txt, style.txt, localize.txt.
rules-dir = "rules"

# Subdirectories of the extracted bundle to patch.
# scan-dirs = ["background-process/assets", "ui-process/assets", "main-process"]

# unpack-dir = "{unpack_dir}"

[android]
# Directory holding strings.xml, apk.sign.properties and the downloads.
work-dir = "android"
# app-name = "{app_name}"
# mirror-url = "{mirror_url}"
# editor-repo = "{editor_repo}"

[tools]
# asar = "asar"
# java = "java"
# zipalign = "zipalign"
# apksigner = "apksigner"
# keytool = "keytool"
"#,
		unpack_dir = DEFAULT_UNPACK_DIR,
		app_name = DEFAULT_APP_NAME,
		mirror_url = DEFAULT_MIRROR_URL,
		editor_repo = DEFAULT_EDITOR_REPO,
	)
}
