//! Configuration validation
//!
//! Validates configuration and reports issues.

use super::types::storage::StorageBackendType;
use super::types::Config;
use crate::sandbox::parse_memory_limit;

/// Result of configuration validation
#[derive(Debug, Clone)]
pub struct ConfigValidationResult {
    /// Whether the config is valid
    pub valid: bool,
    /// Validation errors (critical)
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (non-critical)
    pub warnings: Vec<ValidationIssue>,
}

impl ConfigValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        ConfigValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn with_error(mut self, issue: ValidationIssue) -> Self {
        self.valid = false;
        self.errors.push(issue);
        self
    }

    /// Add a warning
    pub fn with_warning(mut self, issue: ValidationIssue) -> Self {
        self.warnings.push(issue);
        self
    }
}

/// A validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the config field
    pub path: String,
    /// Issue message
    pub message: String,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Create a new issue
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

/// Validate the configuration
pub fn validate_config(config: &Config) -> ConfigValidationResult {
    let mut result = ConfigValidationResult::valid();

    result = validate_sandbox_config(config, result);
    result = validate_storage_config(config, result);
    result = validate_auth_config(config, result);

    if config.lab.expected_subnet_mask.trim().is_empty() {
        result = result.with_error(ValidationIssue::new(
            "lab.expected_subnet_mask",
            "Expected answer is empty; every submission would be judged against an empty mask",
        ));
    }

    result
}

fn validate_sandbox_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    let sandbox = &config.sandbox;

    if parse_memory_limit(&sandbox.memory_limit).is_none() {
        result = result.with_error(
            ValidationIssue::new(
                "sandbox.memory_limit",
                format!("Unparseable memory limit: {}", sandbox.memory_limit),
            )
            .with_suggestion("Use a size such as \"128m\" or \"1g\""),
        );
    }

    if sandbox.network.trim().is_empty() {
        result = result.with_error(
            ValidationIssue::new("sandbox.network", "Lab network name is empty")
                .with_suggestion("Set LAB_NETWORK or sandbox.network"),
        );
    } else if matches!(sandbox.network.as_str(), "host" | "none") {
        result = result.with_warning(ValidationIssue::new(
            "sandbox.network",
            format!("Lab containers attach to '{}' rather than a lab bridge", sandbox.network),
        ));
    }

    if sandbox.image.trim().is_empty() {
        result = result.with_error(ValidationIssue::new("sandbox.image", "Lab image is empty"));
    }

    if sandbox.create_timeout.is_zero() || sandbox.destroy_timeout.is_zero() {
        result = result.with_error(ValidationIssue::new(
            "sandbox",
            "Create and destroy timeouts must be non-zero",
        ));
    }

    result
}

fn validate_storage_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if config.storage.backend == StorageBackendType::Memory {
        result = result.with_warning(
            ValidationIssue::new(
                "storage.backend",
                "Reports are kept in memory and lost on restart",
            )
            .with_suggestion("Use the filesystem backend for durable reports"),
        );
    }

    if config.storage.timeout.is_zero() {
        result = result.with_error(ValidationIssue::new(
            "storage.timeout",
            "Store timeout must be non-zero",
        ));
    }

    result
}

fn validate_auth_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if config.auth.tokens.is_empty() {
        result = result.with_warning(
            ValidationIssue::new("auth.tokens", "No users configured; nobody can log in")
                .with_suggestion("Set AUTH_TOKENS=user=token or auth.tokens in config"),
        );
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn config_with_user() -> Config {
        let mut config = Config::default();
        config
            .auth
            .tokens
            .insert("alice".to_string(), SecretString::from("t0ken".to_string()));
        config
    }

    #[test]
    fn test_default_config_with_user_is_valid() {
        let result = validate_config(&config_with_user());
        assert!(result.valid, "unexpected errors: {:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_no_users_is_a_warning() {
        let result = validate_config(&Config::default());
        assert!(result.valid);
        assert!(result.warnings.iter().any(|w| w.path == "auth.tokens"));
    }

    #[test]
    fn test_bad_memory_limit_is_an_error() {
        let mut config = config_with_user();
        config.sandbox.memory_limit = "lots".to_string();

        let result = validate_config(&config);
        assert!(!result.valid);
        assert_eq!(result.errors[0].path, "sandbox.memory_limit");
    }

    #[test]
    fn test_memory_backend_warns() {
        let mut config = config_with_user();
        config.storage.backend = StorageBackendType::Memory;

        let result = validate_config(&config);
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
    }
}
