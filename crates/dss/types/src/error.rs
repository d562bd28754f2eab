use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a rule set. All of them are fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {file}: {reason}")]
    Invalid { file: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(file: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            file,
            reason: reason.into(),
        }
    }
}
