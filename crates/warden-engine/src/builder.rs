//! Enforcer construction
//!
//! [`EnforcerBuilder`] wires a model source, a storage backend, a decision
//! logger, and an optional watcher into a ready [`Enforcer`]. `build`
//! parses the model, loads the policy through the adapter, and links the
//! role managers, so a successfully built enforcer is fully usable.
//!
//! ## Logger Precedence
//!
//! Omitting the logger installs a [`DefaultLogger`] (stderr, disabled).
//! [`enable_log`](EnforcerBuilder::enable_log) is a convenience for that
//! default handle only; an explicitly supplied handle keeps its own
//! enabled flag and the convenience setting is ignored.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, RwLock};

use warden_core::config::Config;
use warden_core::domain::PolicyStore;
use warden_core::errors::{ConfigurationError, EnforcerError};
use warden_core::matcher::FunctionMap;
use warden_core::ports::decision_logger::IDecisionLogger;
use warden_core::ports::policy_adapter::IPolicyAdapter;
use warden_core::ports::role_manager::IRoleManager;
use warden_core::ports::watcher::IPolicyWatcher;
use warden_logging::{DefaultLogger, JsonLogger};
use warden_rbac::DefaultRoleManager;
use warden_store::{FileAdapter, MemoryAdapter, SqliteAdapter, StorePool};

use crate::enforcer::{Enforcer, ModelSource};

/// Storage backend selected by path or configuration
///
/// Only consulted when no adapter instance was supplied directly.
enum StorageBackend {
    File(PathBuf),
    Sqlite(PathBuf),
    Memory,
}

/// Builder for [`Enforcer`] instances
///
/// ## Defaults
///
/// - Adapter: in-memory, empty
/// - Logger: `DefaultLogger` to stderr, disabled
/// - `auto_save` and `auto_build_role_links`: on
/// - Enforcement gate: open
pub struct EnforcerBuilder {
    model: Option<ModelSource>,
    backend: Option<StorageBackend>,
    adapter: Option<Arc<dyn IPolicyAdapter>>,
    logger: Option<Arc<dyn IDecisionLogger>>,
    log_format: String,
    log_target: String,
    enable_log: Option<bool>,
    auto_save: bool,
    auto_build_role_links: bool,
    watcher: Option<Arc<dyn IPolicyWatcher>>,
}

impl EnforcerBuilder {
    /// Creates a builder with the defaults listed above
    pub fn new() -> Self {
        Self {
            model: None,
            backend: None,
            adapter: None,
            logger: None,
            log_format: "plain".to_string(),
            log_target: "stderr".to_string(),
            enable_log: None,
            auto_save: true,
            auto_build_role_links: true,
            watcher: None,
        }
    }

    /// Seeds a builder from ambient configuration
    ///
    /// Maps the policy backend (`file`, `sqlite`, `memory`) and the
    /// logging section onto builder settings. The config should have
    /// passed [`Config::validate`]; unknown values fall back to the
    /// builder defaults.
    pub fn from_config(config: &Config) -> Self {
        let mut builder = Self::new().model_path(&config.model.path);
        builder.backend = match config.policy.backend.as_str() {
            "sqlite" => config.policy.database.clone().map(StorageBackend::Sqlite),
            "memory" => Some(StorageBackend::Memory),
            _ => config.policy.path.clone().map(StorageBackend::File),
        };
        builder.log_format = config.logging.format.clone();
        builder.log_target = config.logging.target.clone();
        builder.enable_log = Some(config.logging.enabled);
        builder
    }

    /// Sets the model definition file
    pub fn model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model = Some(ModelSource::Path(path.into()));
        self
    }

    /// Sets an inline model definition
    pub fn model_text(mut self, text: impl Into<String>) -> Self {
        self.model = Some(ModelSource::Text(text.into()));
        self
    }

    /// Uses a CSV policy file as the storage backend
    pub fn policy_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.backend = Some(StorageBackend::File(path.into()));
        self
    }

    /// Uses a SQLite database as the storage backend
    pub fn policy_database(mut self, path: impl Into<PathBuf>) -> Self {
        self.backend = Some(StorageBackend::Sqlite(path.into()));
        self
    }

    /// Supplies a storage adapter directly, overriding any backend path
    pub fn adapter(mut self, adapter: Arc<dyn IPolicyAdapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    /// Supplies the decision logger to install
    ///
    /// The handle's own enabled flag governs; the
    /// [`enable_log`](EnforcerBuilder::enable_log) convenience does not
    /// apply to it.
    pub fn logger(mut self, logger: Arc<dyn IDecisionLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Pre-sets the default logger's enabled flag
    ///
    /// Applies only when no logger was supplied through
    /// [`logger`](EnforcerBuilder::logger).
    pub fn enable_log(mut self, enabled: bool) -> Self {
        self.enable_log = Some(enabled);
        self
    }

    /// Controls whether mutations write through to the adapter
    pub fn auto_save(mut self, enabled: bool) -> Self {
        self.auto_save = enabled;
        self
    }

    /// Controls whether grouping mutations update role links immediately
    pub fn auto_build_role_links(mut self, enabled: bool) -> Self {
        self.auto_build_role_links = enabled;
        self
    }

    /// Attaches a policy change watcher
    pub fn watcher(mut self, watcher: Arc<dyn IPolicyWatcher>) -> Self {
        self.watcher = Some(watcher);
        self
    }

    /// Parses the model, loads the policy, and assembles the enforcer
    ///
    /// # Errors
    /// Returns [`ConfigurationError::MissingModel`] (wrapped) when no
    /// model source was set, a configuration error for malformed
    /// definitions or policy rows, or an adapter failure.
    pub async fn build(self) -> Result<Enforcer, EnforcerError> {
        let source = self.model.ok_or(ConfigurationError::MissingModel)?;
        let model = source.parse()?;

        let adapter: Arc<dyn IPolicyAdapter> = match (self.adapter, self.backend) {
            (Some(adapter), _) => adapter,
            (None, Some(StorageBackend::File(path))) => Arc::new(FileAdapter::new(path)),
            (None, Some(StorageBackend::Sqlite(path))) => {
                let pool = StorePool::new(&path)
                    .await
                    .map_err(|e| EnforcerError::Adapter(e.into()))?;
                Arc::new(SqliteAdapter::new(pool.pool().clone()))
            }
            (None, Some(StorageBackend::Memory)) | (None, None) => Arc::new(MemoryAdapter::new()),
        };

        let logger = match self.logger {
            Some(handle) => handle,
            None => {
                let handle = default_logger(&self.log_format, &self.log_target)?;
                if let Some(enabled) = self.enable_log {
                    handle.set_enabled(enabled);
                }
                handle
            }
        };

        let mut store = PolicyStore::new();
        for ptype in model.policy_types() {
            store.register_type(ptype);
        }
        for ptype in model.role_types() {
            store.register_type(ptype);
        }

        let mut role_managers: HashMap<String, Arc<dyn IRoleManager>> = HashMap::new();
        for ptype in model.role_types() {
            role_managers.insert(ptype.to_string(), Arc::new(DefaultRoleManager::default()));
        }

        let mut enforcer = Enforcer {
            model,
            store,
            adapter,
            role_managers,
            functions: FunctionMap::with_builtins(),
            logger: RwLock::new(logger),
            enforcement_enabled: AtomicBool::new(true),
            auto_save: self.auto_save,
            auto_build_role_links: self.auto_build_role_links,
            watcher: self.watcher,
            source,
        };

        enforcer.emit_model_event();
        enforcer.load_policy().await?;
        Ok(enforcer)
    }
}

impl Default for EnforcerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the default logger flavor from format and target settings
fn default_logger(format: &str, target: &str) -> Result<Arc<dyn IDecisionLogger>, EnforcerError> {
    let writer: Box<dyn Write + Send> = match target {
        "stderr" => Box::new(std::io::stderr()),
        "stdout" => Box::new(std::io::stdout()),
        path => Box::new(
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| ConfigurationError::Read {
                    path: path.to_string(),
                    reason: e.to_string(),
                })?,
        ),
    };
    Ok(match format {
        "json" => Arc::new(JsonLogger::with_writer(writer)),
        _ => Arc::new(DefaultLogger::with_writer(writer)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use warden_core::config::ConfigBuilder;

    const BASIC_MODEL: &str = r#"
[request_definition]
r = sub, obj, act

[policy_definition]
p = sub, obj, act

[policy_effect]
e = some(where (p.eft == allow))

[matchers]
m = r.sub == p.sub && r.obj == p.obj && r.act == p.act
"#;

    #[tokio::test]
    async fn test_build_requires_a_model() {
        let err = EnforcerBuilder::new().build().await.unwrap_err();
        assert!(matches!(
            err,
            EnforcerError::Configuration(ConfigurationError::MissingModel)
        ));
    }

    #[tokio::test]
    async fn test_default_logger_starts_disabled() {
        let enforcer = EnforcerBuilder::new()
            .model_text(BASIC_MODEL)
            .build()
            .await
            .unwrap();
        assert!(!enforcer.is_log_enabled());
        assert!(enforcer.is_enforce_enabled());
    }

    #[tokio::test]
    async fn test_enable_log_presets_the_default_handle() {
        let enforcer = EnforcerBuilder::new()
            .model_text(BASIC_MODEL)
            .enable_log(true)
            .build()
            .await
            .unwrap();
        assert!(enforcer.is_log_enabled());
    }

    #[tokio::test]
    async fn test_explicit_handle_keeps_its_own_flag() {
        let handle = Arc::new(DefaultLogger::with_writer(Box::new(std::io::sink())));
        handle.set_enabled(true);

        let enforcer = EnforcerBuilder::new()
            .model_text(BASIC_MODEL)
            .logger(handle)
            .enable_log(false)
            .build()
            .await
            .unwrap();
        assert!(
            enforcer.is_log_enabled(),
            "the convenience flag must not override a supplied handle"
        );
    }

    #[tokio::test]
    async fn test_default_adapter_is_empty_memory() {
        let mut enforcer = EnforcerBuilder::new()
            .model_text(BASIC_MODEL)
            .build()
            .await
            .unwrap();
        assert!(!enforcer.enforce(&["alice", "data1", "read"]).unwrap());

        enforcer
            .add_policy(warden_core::domain::PolicyRule::new(["alice", "data1", "read"]))
            .await
            .unwrap();
        assert!(enforcer.enforce(&["alice", "data1", "read"]).unwrap());
    }

    #[tokio::test]
    async fn test_from_config_memory_backend() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("model.conf");
        std::fs::write(&model_path, BASIC_MODEL).unwrap();

        let config = ConfigBuilder::new()
            .model_path(model_path.clone())
            .policy_backend("memory")
            .logging_enabled(true)
            .build();

        let enforcer = EnforcerBuilder::from_config(&config).build().await.unwrap();
        assert!(enforcer.is_log_enabled());
        assert!(!enforcer.enforce(&["alice", "data1", "read"]).unwrap());
    }

    #[tokio::test]
    async fn test_from_config_file_backend() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("model.conf");
        let policy_path = dir.path().join("policy.csv");
        std::fs::write(&model_path, BASIC_MODEL).unwrap();
        std::fs::write(&policy_path, "p, alice, data1, read\n").unwrap();

        let config = ConfigBuilder::new()
            .model_path(model_path.clone())
            .policy_backend("file")
            .policy_path(policy_path.clone())
            .build();

        let enforcer = EnforcerBuilder::from_config(&config).build().await.unwrap();
        assert!(!enforcer.is_log_enabled());
        assert!(enforcer.enforce(&["alice", "data1", "read"]).unwrap());
    }

    #[tokio::test]
    async fn test_log_target_file() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("decisions.log");

        let mut builder = EnforcerBuilder::new()
            .model_text(BASIC_MODEL)
            .enable_log(true);
        builder.log_target = log_path.to_string_lossy().into_owned();
        let enforcer = builder.build().await.unwrap();

        enforcer.enforce(&["alice", "data1", "read"]).unwrap();
        let contents = std::fs::read_to_string(&log_path).unwrap();
        assert!(contents.contains("alice, data1, read"));
    }
}
