mod config;
pub mod database;

pub use config::{BackendConfig, Config, ExerciseConfig, NotificationsConfig};
pub use database::Database;

use std::path::PathBuf;

use crate::error::CoreError;

/// Returns `~/.config/orthoptic[-dev]/` based on ORTHOPTIC_ENV.
///
/// Set ORTHOPTIC_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, CoreError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("ORTHOPTIC_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("orthoptic-dev")
    } else {
        base_dir.join("orthoptic")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
