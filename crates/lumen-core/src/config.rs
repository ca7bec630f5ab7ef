use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;

use crate::upload::HashAlgorithm;

pub const DEFAULT_UPLOAD_WORKERS: usize = 5;

/// Settings for the client and the upload pipeline. Loaded from an optional
/// `Lumen.toml` merged with `LUMEN_*` environment variables; CLI flags are
/// applied on top by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_upload_workers")]
    pub upload_workers: usize,
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,
    pub ledger_path: Option<String>,
}

fn default_upload_workers() -> usize {
    DEFAULT_UPLOAD_WORKERS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            upload_workers: DEFAULT_UPLOAD_WORKERS,
            hash_algorithm: HashAlgorithm::default(),
            ledger_path: None,
        }
    }
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Lumen").required(false))
        .add_source(Environment::with_prefix("LUMEN").try_parsing(true))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
