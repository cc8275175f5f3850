//! Configuration I/O - Loading and saving configuration
//!
//! Handles reading configuration from files and environment variables.

use std::path::Path;

use super::types::Config;
use crate::error::{Error, Result};

/// Load configuration with layered precedence:
/// 1. Config file (config.toml / config.json) if it exists, otherwise defaults
/// 2. Environment variable overrides (includes .env)
pub fn load_config() -> Result<Config> {
    let config_path = super::paths::config_path();

    let mut config = if config_path.exists() {
        load_config_from_path(&config_path)?
    } else {
        Config::default()
    };

    apply_env_overrides(&mut config);

    Ok(config)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    // Detect format by extension
    let config: Config = if path.extension().is_some_and(|ext| ext == "json") {
        json5::from_str(&content).map_err(|e| Error::Config(format!("Invalid JSON config: {}", e)))?
    } else if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&content).map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))?
    } else {
        // Try JSON5 first, then TOML
        json5::from_str(&content)
            .or_else(|_| toml::from_str(&content).map_err(|e| Error::Config(e.to_string())))
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?
    };

    Ok(config)
}

/// Apply environment variable overrides to an existing config.
///
/// This loads `.env` if present and overlays any set environment variables
/// onto the config. Env vars have the highest precedence.
pub fn apply_env_overrides(config: &mut Config) {
    dotenvy::dotenv().ok();

    // Server overrides
    if let Ok(bind) = std::env::var("SERVER_BIND") {
        config.server.bind = bind;
    }
    if let Ok(port) = std::env::var("SERVER_PORT") {
        if let Ok(port) = port.parse() {
            config.server.port = port;
        }
    }

    // Sandbox overrides
    if let Ok(runtime) = std::env::var("SANDBOX_RUNTIME") {
        if let Ok(runtime) = runtime.parse() {
            config.sandbox.runtime = runtime;
        }
    }
    if let Ok(image) = std::env::var("LAB_IMAGE") {
        config.sandbox.image = image;
    }
    if let Ok(network) = std::env::var("LAB_NETWORK") {
        config.sandbox.network = network;
    }
    if let Ok(memory) = std::env::var("LAB_MEMORY_LIMIT") {
        config.sandbox.memory_limit = memory;
    }
    if let Ok(binary) = std::env::var("DOCKER_BINARY") {
        config.sandbox.docker_binary = binary;
    }

    // Storage overrides
    if let Ok(backend) = std::env::var("STORAGE_BACKEND") {
        if let Ok(backend) = backend.parse() {
            config.storage.backend = backend;
        }
    }
    if let Ok(root) = std::env::var("STORAGE_ROOT") {
        config.storage.root = std::path::PathBuf::from(root);
    }

    // Session overrides
    if let Ok(idle) = std::env::var("SESSION_IDLE_TIMEOUT") {
        if let Ok(idle) = humantime_serde::re::humantime::parse_duration(&idle) {
            config.session.idle_timeout = idle;
        }
    }

    // Auth overrides: "alice=token1,bob=token2"
    if let Ok(tokens) = std::env::var("AUTH_TOKENS") {
        config.auth.tokens.extend(parse_token_list(&tokens));
    }

    // Logging overrides
    if let Ok(level) = std::env::var("RUST_LOG") {
        config.log.level = level;
    }
    if let Ok(format) = std::env::var("LOG_FORMAT") {
        config.log.format = format;
    }
}

fn parse_token_list(raw: &str) -> Vec<(String, secrecy::SecretString)> {
    raw.split(',')
        .filter_map(|pair| {
            let (user, token) = pair.split_once('=')?;
            let (user, token) = (user.trim(), token.trim());
            if user.is_empty() || token.is_empty() {
                return None;
            }
            Some((user.to_string(), secrecy::SecretString::from(token.to_string())))
        })
        .collect()
}

/// Save configuration to a file
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let content = if path.extension().is_some_and(|ext| ext == "toml") {
        toml::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?
    } else {
        serde_json::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, content)?;
    Ok(())
}
