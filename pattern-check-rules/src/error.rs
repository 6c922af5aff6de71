use std::path::PathBuf;

use thiserror::Error;

/// Errors returned when compiling, resolving or loading patterns.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("unknown match kind `{kind}` for pattern on `{key}`")]
    UnknownMatchKind { key: String, kind: String },
    #[error("invalid path expression `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },
    #[error("patterns path does not exist: {0}")]
    MissingPath(String),
    #[error("failed to read patterns from {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse patterns from {path}: {message}")]
    Parse { path: String, message: String },
}

impl RuleError {
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RuleError::Io {
            path: path.into().display().to_string(),
            source,
        }
    }

    pub fn parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        RuleError::Parse {
            path: path.into().display().to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        RuleError::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
