//! Search-index backend: one `dashboard` document per dashboard, its JSON
//! kept as a string in the `dashboard` field.

use serde_json::{Value, json};

use super::http::{Auth, HttpClient};
use super::{Storage, check_id, parse_dashboard};
use crate::core::errors::{DpmError, Result};
use crate::document::Dashboard;

const DASHBOARD_TYPE: &str = "dashboard";
const LIST_SIZE: u64 = 10_000;

#[derive(Debug)]
pub struct ElasticStorage {
    client: HttpClient,
    index: String,
}

impl ElasticStorage {
    pub(crate) fn new(url: &str, index: &str, auth: Auth) -> Self {
        Self {
            client: HttpClient::new(url, auth),
            index: index.to_string(),
        }
    }

    fn search_path(&self) -> String {
        format!("{}/{DASHBOARD_TYPE}/_search", self.index)
    }

    fn document_path(&self, id: &str) -> String {
        format!("{}/{DASHBOARD_TYPE}/{id}", self.index)
    }

    fn search(&self, body: &Value) -> Result<Vec<String>> {
        let result = self.client.send("POST", &self.search_path(), body)?;
        let hits = result["hits"]["hits"].as_array().cloned().unwrap_or_default();
        Ok(hits
            .iter()
            .filter_map(|hit| hit["_id"].as_str().map(str::to_string))
            .collect())
    }

    fn exists(&self, id: &str) -> Result<bool> {
        let hits = self.search(&json!({
            "_source": false,
            "query": {"ids": {"values": [id]}},
        }))?;
        Ok(!hits.is_empty())
    }
}

impl Storage for ElasticStorage {
    fn list(&self) -> Result<Vec<String>> {
        self.search(&json!({
            "_source": false,
            "size": LIST_SIZE,
            "query": {"match_all": {}},
        }))
    }

    fn get(&self, id: &str) -> Result<Dashboard> {
        check_id(id)?;
        let missing = || DpmError::not_found(format!("there is no such dashboard: {id}"));
        let document = self
            .client
            .get_optional(&self.document_path(id))?
            .ok_or_else(missing)?;
        if document["found"] == Value::Bool(false) {
            return Err(missing());
        }
        let raw = document["_source"]["dashboard"].as_str().ok_or_else(|| {
            DpmError::invalid_document(format!("index document {id} has no dashboard field"))
        })?;
        parse_dashboard(id, raw)
    }

    fn save(&self, id: &str, dashboard: &Dashboard) -> Result<()> {
        check_id(id)?;
        let body = json!({
            "dashboard": serde_json::to_string(&Value::Object(dashboard.source()))?,
        });
        if self.exists(id)? {
            self.client.send(
                "POST",
                &format!("{}/_update", self.document_path(id)),
                &json!({"doc": body}),
            )?;
        } else {
            self.client.send(
                "PUT",
                &format!("{}/_create", self.document_path(id)),
                &body,
            )?;
        }
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<()> {
        check_id(id)?;
        if self.client.delete(&self.document_path(id))? {
            Ok(())
        } else {
            Err(DpmError::not_found(format!("there is no such dashboard: {id}")))
        }
    }
}
