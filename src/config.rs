use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const CONFIG_FILE: &str = "cyberschool.toml";
pub const ENV_PREFIX: &str = "CYBERSCHOOL_";

/// Daemon configuration: defaults, then `cyberschool.toml`, then
/// `CYBERSCHOOL_*` environment variables.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Workspace opened at startup. Env: `CYBERSCHOOL_WORKSPACE`. Default: unset,
    /// the client sends `workspace.select`.
    #[serde(default)]
    pub workspace: Option<PathBuf>,

    /// Fallback filter when `RUST_LOG` is unset. Env: `CYBERSCHOOL_LOGLEVEL`.
    /// Default: `info`.
    #[serde(default = "default_loglevel")]
    pub loglevel: String,

    /// Directory for export files when a request names none.
    /// Env: `CYBERSCHOOL_EXPORT_DIR`.
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
}

fn default_loglevel() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: None,
            loglevel: default_loglevel(),
            export_dir: None,
        }
    }
}

impl Config {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }
}
