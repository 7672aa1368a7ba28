//! Grafana-compatible HTTP API backend.

use serde_json::{Value, json};

use super::http::{Auth, HttpClient};
use super::{Storage, check_id, dashboard_from_value};
use crate::core::errors::{DpmError, Result};
use crate::document::Dashboard;

#[derive(Debug)]
pub struct ApiStorage {
    client: HttpClient,
}

impl ApiStorage {
    pub(crate) fn new(url: &str, auth: Auth) -> Self {
        Self {
            client: HttpClient::new(url, auth),
        }
    }

    fn dashboard_path(id: &str) -> String {
        format!("dashboards/db/{id}")
    }
}

impl Storage for ApiStorage {
    /// Ids are the last segment of each search hit's `uri` (`db/<slug>`).
    fn list(&self) -> Result<Vec<String>> {
        let hits = self.client.get("search")?;
        let hits = hits.as_array().cloned().unwrap_or_default();
        Ok(hits
            .iter()
            .filter_map(|hit| hit["uri"].as_str())
            .filter_map(|uri| uri.rsplit('/').next())
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn get(&self, id: &str) -> Result<Dashboard> {
        check_id(id)?;
        let mut body = self
            .client
            .get_optional(&Self::dashboard_path(id))?
            .ok_or_else(|| DpmError::not_found(format!("there is no such dashboard: {id}")))?;
        let source = body
            .get_mut("dashboard")
            .map(Value::take)
            .unwrap_or(Value::Null);
        dashboard_from_value(id, source)
    }

    /// Overwrites an existing dashboard; otherwise clears the numeric id so
    /// the service assigns one.
    fn save(&self, id: &str, dashboard: &Dashboard) -> Result<()> {
        check_id(id)?;
        let exists = self
            .client
            .get_optional(&Self::dashboard_path(id))?
            .is_some();

        let mut source = dashboard.source();
        if !exists {
            source.insert("id".to_string(), Value::Null);
        }
        self.client.send(
            "POST",
            "dashboards/db",
            &json!({"dashboard": source, "overwrite": exists}),
        )?;
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<()> {
        check_id(id)?;
        if self.client.delete(&Self::dashboard_path(id))? {
            Ok(())
        } else {
            Err(DpmError::not_found(format!("there is no such dashboard: {id}")))
        }
    }
}
