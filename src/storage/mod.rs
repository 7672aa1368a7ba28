//! Persistence of whole dashboards, keyed by dashboard id.
//!
//! Every backend satisfies the same contract: `get`/`remove` of a missing id
//! fail with `DocumentNotFound`, `save` is an upsert, and callers always hand
//! over the complete dashboard.

pub mod api;
pub mod elastic;
mod http;
#[cfg(feature = "sqlite")]
pub mod sql;
pub mod system;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::core::config::BackendConfig;
use crate::core::errors::{DpmError, Result};
use crate::document::Dashboard;

pub use api::ApiStorage;
pub use elastic::ElasticStorage;
#[cfg(feature = "sqlite")]
pub use sql::{SqlDialect, SqlStorage};
pub use system::SystemStorage;

/// Backend contract shared by every persistence medium.
pub trait Storage {
    /// Ids of every stored dashboard.
    fn list(&self) -> Result<Vec<String>>;
    fn get(&self, id: &str) -> Result<Dashboard>;
    fn save(&self, id: &str, dashboard: &Dashboard) -> Result<()>;
    fn remove(&self, id: &str) -> Result<()>;
}

/// Closed set of backends, resolved from host configuration.
#[derive(Debug)]
pub enum Backend {
    System(SystemStorage),
    Elastic(ElasticStorage),
    #[cfg(feature = "sqlite")]
    Sql(SqlStorage),
    Api(ApiStorage),
}

impl Backend {
    /// Build the backend for a host. Connections are opened on first use.
    pub fn open(config: &BackendConfig) -> Result<Self> {
        match config {
            BackendConfig::System { path } => Ok(Self::System(SystemStorage::new(path))),
            BackendConfig::Elastic {
                url,
                index,
                user,
                password,
            } => Ok(Self::Elastic(ElasticStorage::new(
                url,
                index,
                http::Auth::from_parts(None, user.as_deref(), password.as_deref()),
            ))),
            #[cfg(feature = "sqlite")]
            BackendConfig::Sqlite { path } => Ok(Self::Sql(SqlStorage::sqlite(path))),
            #[cfg(not(feature = "sqlite"))]
            BackendConfig::Sqlite { .. } => Err(DpmError::HostConfig {
                details: "sqlite support is not compiled in".to_string(),
            }),
            BackendConfig::Api {
                url,
                token,
                user,
                password,
            } => Ok(Self::Api(ApiStorage::new(
                url,
                http::Auth::from_parts(token.as_deref(), user.as_deref(), password.as_deref()),
            ))),
        }
    }

    fn inner(&self) -> &dyn Storage {
        match self {
            Self::System(storage) => storage,
            Self::Elastic(storage) => storage,
            #[cfg(feature = "sqlite")]
            Self::Sql(storage) => storage,
            Self::Api(storage) => storage,
        }
    }
}

impl Storage for Backend {
    fn list(&self) -> Result<Vec<String>> {
        self.inner().list()
    }

    fn get(&self, id: &str) -> Result<Dashboard> {
        self.inner().get(id)
    }

    fn save(&self, id: &str, dashboard: &Dashboard) -> Result<()> {
        self.inner().save(id, dashboard)
    }

    fn remove(&self, id: &str) -> Result<()> {
        self.inner().remove(id)
    }
}

/// Reject ids that would escape a directory or an URL segment.
pub(crate) fn check_id(id: &str) -> Result<()> {
    if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
        return Err(DpmError::invalid_path(format!("invalid dashboard id: {id:?}")));
    }
    Ok(())
}

/// Four-space pretty JSON in the value's own key order, newline-terminated.
/// Every file written for a document uses this layout.
pub fn to_pretty_json(value: &serde_json::Value) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Parse stored JSON text into a dashboard.
pub(crate) fn parse_dashboard(id: &str, raw: &str) -> Result<Dashboard> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    dashboard_from_value(id, value)
}

pub(crate) fn dashboard_from_value(id: &str, value: serde_json::Value) -> Result<Dashboard> {
    match value {
        serde_json::Value::Object(source) => Dashboard::from_source(source, id),
        _ => Err(DpmError::invalid_document(format!(
            "stored dashboard {id} is not a JSON object"
        ))),
    }
}
