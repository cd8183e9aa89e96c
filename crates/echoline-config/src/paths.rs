//! Platform-specific configuration paths.
//!
//! - **User config**: `~/.config/echoline/` (Linux), `~/Library/Application Support/echoline/` (macOS), `%APPDATA%\echoline\` (Windows)
//! - **Default session**: `session.toml` inside the user config directory
//!
//! # Example
//!
//! ```rust,no_run
//! use echoline_config::paths;
//!
//! println!("Session file: {:?}", paths::default_session_path());
//! ```

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "echoline";

/// File name of the default session.
const SESSION_FILE: &str = "session.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path of the session file used when none is given.
pub fn default_session_path() -> PathBuf {
    user_config_dir().join(SESSION_FILE)
}
