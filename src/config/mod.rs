//! Configuration module
//!
//! - types/mod.rs: Core configuration types (Config, LabConfig, etc.)
//! - types/sandbox.rs: Sandbox runtime configuration
//! - types/storage.rs: Report store and session store configuration
//! - io.rs: Configuration loading and saving
//! - validation.rs: Configuration validation
//! - paths.rs: Configuration file paths

mod io;
mod paths;
mod types;
mod validation;

pub use types::{AuthConfig, Config, LabConfig, LogConfig, ServerConfig};

pub use types::sandbox::{SandboxConfig, SandboxRuntime};

pub use types::storage::{SessionConfig, StorageBackendType, StorageConfig};

pub use io::{apply_env_overrides, load_config, load_config_from_path, save_config};
pub use paths::{config_dir, config_path, state_dir};
pub use validation::{validate_config, ConfigValidationResult, ValidationIssue};
