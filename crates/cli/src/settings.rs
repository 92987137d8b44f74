//! Optional TOML settings file, merged under command-line flags.
//!
//! ```toml
//! store_dir = "/etc/artifetch/credentials"
//! environment = "prod"
//! node_name = "web-01"
//! ssl_verify = true
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::CliError;

/// Environment used when neither a flag nor the settings file names one.
pub const DEFAULT_ENVIRONMENT: &str = "default";

/// Node name used when neither a flag nor the settings file names one.
pub const DEFAULT_NODE_NAME: &str = "localhost";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub store_dir: Option<PathBuf>,
    pub environment: Option<String>,
    pub node_name: Option<String>,
    pub ssl_verify: Option<bool>,
}

impl Settings {
    /// `<config dir>/artifetch/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("artifetch").join("config.toml"))
    }

    /// Load settings.
    ///
    /// An explicit `path` must exist. The default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        match path {
            Some(path) => Self::read(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::read(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn read(path: &Path) -> Result<Self, CliError> {
        debug!(path = %path.display(), "Loading settings");
        let raw =
            std::fs::read_to_string(path).map_err(|e| CliError::settings_read(path, e))?;
        toml::from_str(&raw).map_err(|e| CliError::settings_parse(path, e))
    }
}

/// Settings after flags, environment and file are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effective {
    pub store_dir: Option<PathBuf>,
    pub environment: String,
    pub node_name: String,
    pub ssl_verify: bool,
}

/// Values given on the command line or through `ARTIFETCH_*` variables.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub store_dir: Option<PathBuf>,
    pub environment: Option<String>,
    pub node_name: Option<String>,
    pub no_ssl_verify: bool,
}

impl Settings {
    /// Merge with `overrides`, which win.
    pub fn merge(self, overrides: Overrides) -> Effective {
        Effective {
            store_dir: overrides.store_dir.or(self.store_dir),
            environment: overrides
                .environment
                .or(self.environment)
                .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            node_name: overrides
                .node_name
                .or(self.node_name)
                .unwrap_or_else(|| DEFAULT_NODE_NAME.to_string()),
            ssl_verify: !overrides.no_ssl_verify && self.ssl_verify.unwrap_or(true),
        }
    }
}
