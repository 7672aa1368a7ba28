//! Blocking JSON-over-HTTP helper shared by the search-index and API backends.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use crate::core::errors::{DpmError, Result};

/// `Authorization` header source.
#[derive(Clone, PartialEq, Eq)]
pub(crate) enum Auth {
    Anonymous,
    Basic { user: String, password: String },
    Bearer(String),
}

impl Auth {
    /// A token wins over user/password.
    pub(crate) fn from_parts(token: Option<&str>, user: Option<&str>, password: Option<&str>) -> Self {
        match (token, user, password) {
            (Some(token), _, _) => Self::Bearer(token.to_string()),
            (None, Some(user), Some(password)) => Self::Basic {
                user: user.to_string(),
                password: password.to_string(),
            },
            _ => Self::Anonymous,
        }
    }

    fn header(&self) -> Option<String> {
        match self {
            Self::Anonymous => None,
            Self::Basic { user, password } => Some(format!(
                "Basic {}",
                STANDARD.encode(format!("{user}:{password}"))
            )),
            Self::Bearer(token) => Some(format!("Bearer {token}")),
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::Basic { user, .. } => write!(f, "Basic({user}, ***)"),
            Self::Bearer(_) => f.write_str("Bearer(***)"),
        }
    }
}

#[derive(Debug)]
pub(crate) struct HttpClient {
    agent: ureq::Agent,
    base: String,
    auth: Auth,
}

impl HttpClient {
    pub(crate) fn new(base: &str, auth: Auth) -> Self {
        Self {
            agent: ureq::Agent::new(),
            base: base.trim_end_matches('/').to_string(),
            auth,
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let request = self.agent.request(method, &self.url(path));
        match self.auth.header() {
            Some(header) => request.set("Authorization", &header),
            None => request,
        }
    }

    pub(crate) fn get(&self, path: &str) -> Result<Value> {
        let response = self.request("GET", path).call()?;
        read_body(&self.url(path), response)
    }

    /// GET where 404 means "absent" rather than failure.
    pub(crate) fn get_optional(&self, path: &str) -> Result<Option<Value>> {
        match self.request("GET", path).call() {
            Ok(response) => read_body(&self.url(path), response).map(Some),
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    pub(crate) fn send(&self, method: &str, path: &str, body: &Value) -> Result<Value> {
        let response = self.request(method, path).send_json(body)?;
        read_body(&self.url(path), response)
    }

    /// DELETE; `false` when the resource did not exist.
    pub(crate) fn delete(&self, path: &str) -> Result<bool> {
        match self.request("DELETE", path).call() {
            Ok(_) => Ok(true),
            Err(ureq::Error::Status(404, _)) => Ok(false),
            Err(error) => Err(error.into()),
        }
    }
}

fn read_body(url: &str, response: ureq::Response) -> Result<Value> {
    let body = response
        .into_string()
        .map_err(|error| DpmError::Transport {
            details: format!("reading {url}: {error}"),
        })?;
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_takes_precedence() {
        let auth = Auth::from_parts(Some("abc"), Some("admin"), Some("pw"));
        assert_eq!(auth.header().as_deref(), Some("Bearer abc"));
    }

    #[test]
    fn basic_auth_is_base64() {
        let auth = Auth::from_parts(None, Some("admin"), Some("admin"));
        assert_eq!(auth.header().as_deref(), Some("Basic YWRtaW46YWRtaW4="));
        assert_eq!(Auth::from_parts(None, Some("admin"), None), Auth::Anonymous);
    }

    #[test]
    fn debug_hides_secrets() {
        let rendered = format!("{:?}", Auth::from_parts(Some("s3cret"), None, None));
        assert!(!rendered.contains("s3cret"));
    }

    #[test]
    fn url_joins_without_double_slash() {
        let client = HttpClient::new("http://grafana/api/", Auth::Anonymous);
        assert_eq!(client.url("/search"), "http://grafana/api/search");
        assert_eq!(client.url("dashboards/db/x"), "http://grafana/api/dashboards/db/x");
    }
}
