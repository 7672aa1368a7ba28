//! Relational backend: one row per dashboard in a `dashboard` table keyed by
//! `slug`.

use std::path::PathBuf;
use std::sync::LazyLock;

use parking_lot::Mutex;
use regex::Regex;
use rusqlite::types::ToSql;
use rusqlite::{Connection, OptionalExtension, params_from_iter};
use serde_json::Value;

use super::{Storage, parse_dashboard};
use crate::core::errors::{DpmError, Result};
use crate::document::Dashboard;

static NAMED_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([a-z_]+)").expect("named parameter regex is valid"));

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS dashboard (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    version INTEGER NOT NULL DEFAULT 0,
    slug TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    data TEXT NOT NULL
);";

const LIST: &str = "SELECT slug FROM dashboard ORDER BY id ASC";
const SELECT_DATA: &str = "SELECT data FROM dashboard WHERE slug = :slug";
const SELECT_ID: &str = "SELECT id FROM dashboard WHERE slug = :slug";
const UPDATE: &str = "UPDATE dashboard
    SET version = version + 1, title = :title, data = :data
    WHERE slug = :slug";
const INSERT: &str = "INSERT INTO dashboard (version, slug, title, data)
    VALUES (0, :slug, :title, :data)";
const DELETE: &str = "DELETE FROM dashboard WHERE slug = :slug";

/// Placeholder syntax of a SQL engine.
///
/// Queries are written once with `:name` placeholders and rendered per
/// dialect, together with the parameter order the rendered text expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    /// `?1`, `?2`, ... numbered by first appearance.
    Sqlite,
    /// `$1`, `$2`, ... numbered by first appearance.
    Postgres,
    /// Bare `?`, one per occurrence.
    MySql,
}

impl SqlDialect {
    pub fn render(self, query: &str) -> (String, Vec<String>) {
        let mut order: Vec<String> = Vec::new();
        let rendered = NAMED_PARAM.replace_all(query, |caps: &regex::Captures<'_>| {
            let name = caps[1].to_string();
            match self {
                Self::MySql => {
                    order.push(name);
                    "?".to_string()
                }
                Self::Sqlite | Self::Postgres => {
                    let position = match order.iter().position(|seen| *seen == name) {
                        Some(index) => index + 1,
                        None => {
                            order.push(name);
                            order.len()
                        }
                    };
                    if self == Self::Sqlite {
                        format!("?{position}")
                    } else {
                        format!("${position}")
                    }
                }
            }
        });
        (rendered.into_owned(), order)
    }
}

/// Order named arguments the way a rendered query expects them.
fn bind<'a>(order: &[String], args: &[(&str, &'a dyn ToSql)]) -> Result<Vec<&'a dyn ToSql>> {
    order
        .iter()
        .map(|name| {
            args.iter()
                .find(|(arg, _)| *arg == name.as_str())
                .map(|(_, value)| *value)
                .ok_or_else(|| DpmError::Sql {
                    context: "bind",
                    details: format!("no value for parameter :{name}"),
                })
        })
        .collect()
}

#[derive(Debug)]
pub struct SqlStorage {
    path: PathBuf,
    dialect: SqlDialect,
    connection: Mutex<Option<Connection>>,
}

impl SqlStorage {
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            dialect: SqlDialect::Sqlite,
            connection: Mutex::new(None),
        }
    }

    fn connect(&self) -> Result<Connection> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| DpmError::io(parent, source))?;
        }
        let conn = Connection::open(&self.path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn)
    }

    fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let mut guard = self.connection.lock();
        let conn = match guard.take() {
            Some(conn) => conn,
            None => self.connect()?,
        };
        f(guard.insert(conn))
    }

    fn execute(&self, query: &str, args: &[(&str, &dyn ToSql)]) -> Result<usize> {
        let (sql, order) = self.dialect.render(query);
        let params = bind(&order, args)?;
        self.with_connection(|conn| Ok(conn.execute(&sql, params_from_iter(params))?))
    }

    fn query_one(&self, query: &str, args: &[(&str, &dyn ToSql)]) -> Result<Option<Value>> {
        let (sql, order) = self.dialect.render(query);
        let params = bind(&order, args)?;
        self.with_connection(|conn| {
            let value = conn
                .query_row(&sql, params_from_iter(params), |row| {
                    row.get::<_, rusqlite::types::Value>(0)
                })
                .optional()?;
            Ok(value.map(sql_to_json))
        })
    }
}

fn sql_to_json(value: rusqlite::types::Value) -> Value {
    match value {
        rusqlite::types::Value::Null => Value::Null,
        rusqlite::types::Value::Integer(n) => Value::from(n),
        rusqlite::types::Value::Real(n) => Value::from(n),
        rusqlite::types::Value::Text(text) => Value::String(text),
        rusqlite::types::Value::Blob(bytes) => {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}

impl Storage for SqlStorage {
    fn list(&self) -> Result<Vec<String>> {
        let (sql, _) = self.dialect.render(LIST);
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let slugs = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(slugs)
        })
    }

    fn get(&self, id: &str) -> Result<Dashboard> {
        let args: [(&str, &dyn ToSql); 1] = [("slug", &id)];
        let data = self
            .query_one(SELECT_DATA, &args)?
            .ok_or_else(|| DpmError::not_found(format!("there is no such dashboard: {id}")))?;
        let raw = data.as_str().ok_or_else(|| {
            DpmError::invalid_document(format!("dashboard {id} has non-text data"))
        })?;
        parse_dashboard(id, raw)
    }

    fn save(&self, id: &str, dashboard: &Dashboard) -> Result<()> {
        let data = serde_json::to_string(&Value::Object(dashboard.source()))?;
        let title = dashboard.title().to_string();
        let args: [(&str, &dyn ToSql); 3] = [("slug", &id), ("title", &title), ("data", &data)];

        if self.query_one(SELECT_ID, &args)?.is_some() {
            self.execute(UPDATE, &args)?;
        } else {
            self.execute(INSERT, &args)?;
        }
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<()> {
        let args: [(&str, &dyn ToSql); 1] = [("slug", &id)];
        if self.execute(DELETE, &args)? == 0 {
            return Err(DpmError::not_found(format!("there is no such dashboard: {id}")));
        }
        Ok(())
    }
}
