mod config;
pub mod database;

pub use config::{ApiConfig, Config, NotificationsConfig, SessionConfig};
pub use database::{Database, SessionRow, Stats};

use std::path::PathBuf;

/// Key under which the serialized [`crate::SessionState`] lives in the
/// kv store.
pub const STATE_KEY: &str = "session_state";

/// Returns the data directory, creating it if needed.
///
/// `FOCUSKIT_DATA_DIR` overrides the location outright (used by tests);
/// otherwise it is `~/.config/focuskit`, or `~/.config/focuskit-dev`
/// when `FOCUSKIT_ENV=dev`.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = if let Ok(dir) = std::env::var("FOCUSKIT_DATA_DIR") {
        PathBuf::from(dir)
    } else {
        let base_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config");
        let env = std::env::var("FOCUSKIT_ENV").unwrap_or_else(|_| "production".to_string());
        if env == "dev" {
            base_dir.join("focuskit-dev")
        } else {
            base_dir.join("focuskit")
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
