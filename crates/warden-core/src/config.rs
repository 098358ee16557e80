//! Configuration module for Warden.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level configuration for a Warden enforcer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    pub policy: PolicyConfig,
    pub logging: LoggingConfig,
}

/// Model source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the model definition file.
    pub path: PathBuf,
}

/// Policy storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Storage backend: `file`, `sqlite`, or `memory`.
    pub backend: String,
    /// Path to the CSV policy file (required for the `file` backend).
    pub path: Option<PathBuf>,
    /// Path to the SQLite database (required for the `sqlite` backend).
    pub database: Option<PathBuf>,
}

/// Diagnostic logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Whether decision logging starts enabled.
    pub enabled: bool,
    /// Output format: `plain` or `json`.
    pub format: String,
    /// Where log lines go: `stderr` or a file path.
    pub target: String,
}

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/warden/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("warden")
            .join("config.yaml")
    }
}

// Config derives Default because all its fields implement Default.
// (clippy::derivable_impls)

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("~/.config"))
                .join("warden")
                .join("model.conf"),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            backend: "file".to_string(),
            path: Some(
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("~/.config"))
                    .join("warden")
                    .join("policy.csv"),
            ),
            database: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            format: "plain".to_string(),
            target: "stderr".to_string(),
        }
    }
}

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"policy.backend"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `policy.backend`.
const VALID_POLICY_BACKENDS: &[&str] = &["file", "sqlite", "memory"];

/// Valid values for `logging.format`.
const VALID_LOG_FORMATS: &[&str] = &["plain", "json"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- model ---
        if self.model.path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "model.path".into(),
                message: "must not be empty".into(),
            });
        }

        // --- policy ---
        if !VALID_POLICY_BACKENDS.contains(&self.policy.backend.as_str()) {
            errors.push(ValidationError {
                field: "policy.backend".into(),
                message: format!(
                    "invalid backend '{}'; valid options: {}",
                    self.policy.backend,
                    VALID_POLICY_BACKENDS.join(", ")
                ),
            });
        }
        if self.policy.backend == "file" && self.policy.path.is_none() {
            errors.push(ValidationError {
                field: "policy.path".into(),
                message: "required when policy.backend is 'file'".into(),
            });
        }
        if self.policy.backend == "sqlite" && self.policy.database.is_none() {
            errors.push(ValidationError {
                field: "policy.database".into(),
                message: "required when policy.backend is 'sqlite'".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_FORMATS.contains(&self.logging.format.as_str()) {
            errors.push(ValidationError {
                field: "logging.format".into(),
                message: format!(
                    "invalid format '{}'; valid options: {}",
                    self.logging.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }
        if self.logging.target.is_empty() {
            errors.push(ValidationError {
                field: "logging.target".into(),
                message: "must be 'stderr' or a file path".into(),
            });
        }

        errors
    }
}

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use warden_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .model_path(PathBuf::from("model.conf"))
///     .policy_backend("memory")
///     .logging_enabled(true)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- model ---

    pub fn model_path(mut self, path: PathBuf) -> Self {
        self.config.model.path = path;
        self
    }

    // --- policy ---

    pub fn policy_backend(mut self, backend: impl Into<String>) -> Self {
        self.config.policy.backend = backend.into();
        self
    }

    pub fn policy_path(mut self, path: PathBuf) -> Self {
        self.config.policy.path = Some(path);
        self
    }

    pub fn policy_database(mut self, database: PathBuf) -> Self {
        self.config.policy.database = Some(database);
        self
    }

    // --- logging ---

    pub fn logging_enabled(mut self, enabled: bool) -> Self {
        self.config.logging.enabled = enabled;
        self
    }

    pub fn logging_format(mut self, format: impl Into<String>) -> Self {
        self.config.logging.format = format.into();
        self
    }

    pub fn logging_target(mut self, target: impl Into<String>) -> Self {
        self.config.logging.target = target.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    // -- Defaults --

    #[test]
    fn default_config_has_sensible_values() {
        let cfg = Config::default();
        assert!(cfg.model.path.to_string_lossy().contains("model.conf"));
        assert_eq!(cfg.policy.backend, "file");
        assert!(cfg.policy.path.is_some());
        assert!(cfg.policy.database.is_none());
        assert!(!cfg.logging.enabled);
        assert_eq!(cfg.logging.format, "plain");
        assert_eq!(cfg.logging.target, "stderr");
    }

    #[test]
    fn default_config_passes_validation() {
        let cfg = Config::default();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "unexpected validation errors: {errors:?}");
    }

    // -- Loading --

    #[test]
    fn load_from_yaml_file() {
        let yaml = r#"
model:
  path: /etc/warden/model.conf
policy:
  backend: sqlite
  path: null
  database: /var/lib/warden/policy.db
logging:
  enabled: true
  format: json
  target: /var/log/warden.log
"#;
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.model.path, PathBuf::from("/etc/warden/model.conf"));
        assert_eq!(cfg.policy.backend, "sqlite");
        assert_eq!(
            cfg.policy.database,
            Some(PathBuf::from("/var/lib/warden/policy.db"))
        );
        assert!(cfg.logging.enabled);
        assert_eq!(cfg.logging.format, "json");
        assert_eq!(cfg.logging.target, "/var/log/warden.log");
    }

    #[test]
    fn load_or_default_returns_default_on_missing_file() {
        let cfg = Config::load_or_default(Path::new("/nonexistent/config.yaml"));
        assert_eq!(cfg.policy.backend, "file");
    }

    #[test]
    fn load_returns_error_on_invalid_yaml() {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(b"not: [valid: yaml: {{{").unwrap();
        tmp.flush().unwrap();

        let result = Config::load(tmp.path());
        assert!(result.is_err());
    }

    // -- Validation --

    #[test]
    fn validate_catches_empty_model_path() {
        let mut cfg = Config::default();
        cfg.model.path = PathBuf::new();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "model.path"));
    }

    #[test]
    fn validate_catches_invalid_backend() {
        let mut cfg = Config::default();
        cfg.policy.backend = "postgres".to_string();
        let errors = cfg.validate();
        assert!(errors
            .iter()
            .any(|e| e.field == "policy.backend" && e.message.contains("postgres")));
    }

    #[test]
    fn validate_catches_file_backend_without_path() {
        let mut cfg = Config::default();
        cfg.policy.path = None;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "policy.path"));
    }

    #[test]
    fn validate_catches_sqlite_backend_without_database() {
        let mut cfg = Config::default();
        cfg.policy.backend = "sqlite".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "policy.database"));
    }

    #[test]
    fn validate_catches_invalid_log_format() {
        let mut cfg = Config::default();
        cfg.logging.format = "xml".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "logging.format"));
    }

    #[test]
    fn validate_catches_empty_log_target() {
        let mut cfg = Config::default();
        cfg.logging.target = String::new();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "logging.target"));
    }

    #[test]
    fn validate_accepts_all_valid_backends() {
        for backend in VALID_POLICY_BACKENDS {
            let mut cfg = Config::default();
            cfg.policy.backend = backend.to_string();
            cfg.policy.path = Some(PathBuf::from("policy.csv"));
            cfg.policy.database = Some(PathBuf::from("policy.db"));
            let errors = cfg.validate();
            assert!(
                !errors.iter().any(|e| e.field == "policy.backend"),
                "backend '{backend}' should be valid"
            );
        }
    }

    // -- Builder --

    #[test]
    fn builder_starts_from_defaults() {
        let cfg = ConfigBuilder::new().build();
        assert_eq!(cfg.policy.backend, "file");
        assert_eq!(cfg.logging.format, "plain");
    }

    #[test]
    fn builder_overrides_fields() {
        let cfg = ConfigBuilder::new()
            .model_path(PathBuf::from("/custom/model.conf"))
            .policy_backend("sqlite")
            .policy_database(PathBuf::from("/custom/policy.db"))
            .logging_enabled(true)
            .logging_format("json")
            .logging_target("stderr")
            .build();

        assert_eq!(cfg.model.path, PathBuf::from("/custom/model.conf"));
        assert_eq!(cfg.policy.backend, "sqlite");
        assert_eq!(cfg.policy.database, Some(PathBuf::from("/custom/policy.db")));
        assert!(cfg.logging.enabled);
        assert_eq!(cfg.logging.format, "json");
    }

    #[test]
    fn builder_build_validated_succeeds_for_valid_config() {
        let result = ConfigBuilder::new().policy_backend("memory").build_validated();
        assert!(result.is_ok());
    }

    #[test]
    fn builder_build_validated_fails_for_invalid_config() {
        let result = ConfigBuilder::new()
            .policy_backend("nope")
            .logging_format("xml")
            .build_validated();
        assert!(result.is_err());
        let errors = result.unwrap_err();
        assert!(errors.len() >= 2);
    }

    // -- default_path --

    #[test]
    fn default_path_ends_with_config_yaml() {
        let p = Config::default_path();
        assert!(p.ends_with("warden/config.yaml"));
    }

    // -- ValidationError Display --

    #[test]
    fn validation_error_display() {
        let err = ValidationError {
            field: "policy.backend".into(),
            message: "invalid backend 'x'".into(),
        };
        assert_eq!(err.to_string(), "policy.backend: invalid backend 'x'");
    }
}
