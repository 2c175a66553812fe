use serde::Deserialize;
use std::path::PathBuf;

/// The single normative configuration record covering every key named in
/// the external interface table, plus the ambient fields a runnable process
/// needs (listen address, log filter, storage backend selection).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct StatictConfig {
    /// Log identifier, used in SCTs and the checkpoint, and as the path prefix.
    pub(crate) origin: String,
    pub(crate) roots_pem_file: PathBuf,
    pub(crate) signing_key_pem_file: PathBuf,

    #[serde(default)]
    pub(crate) reject_expired: bool,
    #[serde(default)]
    pub(crate) reject_unexpired: bool,
    #[serde(default)]
    pub(crate) not_after_start: Option<u64>,
    #[serde(default)]
    pub(crate) not_after_limit: Option<u64>,

    #[serde(default = "default_ext_key_usages")]
    pub(crate) ext_key_usages: String,
    #[serde(default)]
    pub(crate) reject_extensions: String,

    #[serde(default = "default_http_deadline_ms")]
    pub(crate) http_deadline_ms: u64,
    #[serde(default)]
    pub(crate) mask_internal_errors: bool,

    #[serde(default = "default_listen_addr")]
    pub(crate) listen_addr: String,
    #[serde(default = "default_log_filter")]
    pub(crate) log_filter: String,

    #[serde(default)]
    pub(crate) storage_backend: StorageBackend,
    #[serde(default)]
    pub(crate) data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub(crate) enum StorageBackend {
    #[default]
    Memory,
    File,
}

fn default_ext_key_usages() -> String {
    "ServerAuth".to_string()
}

fn default_http_deadline_ms() -> u64 {
    2_000
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl StatictConfig {
    /// Load from an optional TOML file, overridden by `STATICT_*` environment
    /// variables. A malformed or missing required value is a fatal startup
    /// error, per the error handling design.
    pub(crate) fn load(path: Option<&std::path::Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::with_name("statict").required(false));
        }

        builder
            .add_source(config::Environment::with_prefix("STATICT").separator("_"))
            .build()?
            .try_deserialize()
    }
}
