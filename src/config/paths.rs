//! Configuration paths
//!
//! Utilities for resolving configuration file paths.

use std::path::PathBuf;

/// Get the configuration directory
pub fn config_dir() -> PathBuf {
    // Check for explicit override
    if let Ok(dir) = std::env::var("NETEXPLORER_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    dirs::config_dir()
        .map(|d| d.join("netexplorer"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".config").join("netexplorer"))
                .unwrap_or_else(|| PathBuf::from(".netexplorer"))
        })
}

/// Get the main configuration file path
pub fn config_path() -> PathBuf {
    // Check for explicit override
    if let Ok(path) = std::env::var("NETEXPLORER_CONFIG") {
        return PathBuf::from(path);
    }

    config_dir().join("config.toml")
}

/// Get the state directory (filesystem report store lives here by default)
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("NETEXPLORER_STATE_DIR") {
        return PathBuf::from(dir);
    }

    dirs::data_dir()
        .map(|d| d.join("netexplorer"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".local").join("share").join("netexplorer"))
                .unwrap_or_else(|| PathBuf::from(".netexplorer"))
        })
}
