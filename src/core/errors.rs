//! DPM-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, DpmError>;

/// Top-level error type for the dashboard path manager.
#[derive(Debug, Error)]
pub enum DpmError {
    #[error("[DPM-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[DPM-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[DPM-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[DPM-1004] host configuration error: {details}")]
    HostConfig { details: String },

    #[error("[DPM-2001] invalid path: {details}")]
    InvalidPath { details: String },

    #[error("[DPM-2002] document not found: {details}")]
    DocumentNotFound { details: String },

    #[error("[DPM-2003] invalid document: {details}")]
    InvalidDocument { details: String },

    #[error("[DPM-2004] cancelled")]
    CommandCancelled,

    #[error("[DPM-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[DPM-2102] SQL failure in {context}: {details}")]
    Sql {
        context: &'static str,
        details: String,
    },

    #[error("[DPM-2201] HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("[DPM-2202] transport failure: {details}")]
    Transport { details: String },

    #[error("[DPM-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[DPM-3101] editor failure: {details}")]
    Editor { details: String },
}

impl DpmError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "DPM-1001",
            Self::MissingConfig { .. } => "DPM-1002",
            Self::ConfigParse { .. } => "DPM-1003",
            Self::HostConfig { .. } => "DPM-1004",
            Self::InvalidPath { .. } => "DPM-2001",
            Self::DocumentNotFound { .. } => "DPM-2002",
            Self::InvalidDocument { .. } => "DPM-2003",
            Self::CommandCancelled => "DPM-2004",
            Self::Serialization { .. } => "DPM-2101",
            Self::Sql { .. } => "DPM-2102",
            Self::Http { .. } => "DPM-2201",
            Self::Transport { .. } => "DPM-2202",
            Self::Io { .. } => "DPM-3002",
            Self::Editor { .. } => "DPM-3101",
        }
    }

    /// Whether the failure is user-correctable (bad path, wrong document
    /// type, unknown host) rather than an environment or backend failure.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidPath { .. }
                | Self::DocumentNotFound { .. }
                | Self::InvalidDocument { .. }
                | Self::HostConfig { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn invalid_path(details: impl Into<String>) -> Self {
        Self::InvalidPath {
            details: details.into(),
        }
    }

    pub fn not_found(details: impl Into<String>) -> Self {
        Self::DocumentNotFound {
            details: details.into(),
        }
    }

    pub fn invalid_document(details: impl Into<String>) -> Self {
        Self::InvalidDocument {
            details: details.into(),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for DpmError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql {
            context: "rusqlite",
            details: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for DpmError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for DpmError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<ureq::Error> for DpmError {
    fn from(value: ureq::Error) -> Self {
        match value {
            ureq::Error::Status(status, response) => Self::Http {
                status,
                url: response.get_url().to_string(),
            },
            ureq::Error::Transport(transport) => Self::Transport {
                details: transport.to_string(),
            },
        }
    }
}
