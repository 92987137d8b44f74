//! CLI-specific errors rendered through miette.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised before the engine gets involved.
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Could not read settings file '{}'", path.display())]
    #[diagnostic(
        code(artifetch::cli::settings_read),
        help("Pass an existing file with --config or omit the flag")
    )]
    SettingsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings file '{}' is not valid", path.display())]
    #[diagnostic(code(artifetch::cli::settings_parse))]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },

    #[error("Invalid option '{option}', expected key=value")]
    #[diagnostic(code(artifetch::cli::invalid_option))]
    InvalidOption { option: String },
}

impl CliError {
    pub fn settings_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SettingsRead {
            path: path.into(),
            source,
        }
    }

    pub fn settings_parse(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::SettingsParse {
            path: path.into(),
            source: Box::new(source),
        }
    }
}
