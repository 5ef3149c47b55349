//! Centralized path utilities
//!
//! All application paths in one place for consistency

use std::path::PathBuf;

use crate::constants::paths::CONFIG_DIR_NAME;

/// Get the vaani config directory (~/.vaani)
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Get the config file (~/.vaani/config.toml)
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Get the default scheme catalog override (~/.vaani/schemes.json)
pub fn schemes_file() -> PathBuf {
    config_dir().join("schemes.json")
}

/// Ensure a scratch directory for uploaded and synthesized audio exists
pub fn ensure_dir(dir: &std::path::Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    Ok(dir.to_path_buf())
}
