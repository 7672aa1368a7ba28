//! Dashboard document tree: Dashboard → Row → Panel, or Dashboard → Panel in
//! the flat layout.
//!
//! Documents keep their JSON objects verbatim (field order included) and only
//! touch the keys they own: `rows`/`panels` children and a panel's `id`.
//! Children are spliced back in whenever a source is requested, so a mutated
//! panel is always reflected in its dashboard's JSON.
//!
//! Row and panel identifiers are positional or dashboard-scoped integers and
//! are renumbered on structural change; addressing is by the leading integer
//! of a `"{id}-{slug}"` name.

mod dashboard;
mod panel;
mod row;

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::core::errors::{DpmError, Result};

pub use dashboard::{Dashboard, Layout, NodeRef};
pub use panel::Panel;
pub use row::Row;

/// JSON object backing a document.
pub type Source = Map<String, Value>;

static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)-?").expect("id pattern is a valid regex"));

static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]+").expect("slug pattern is a valid regex"));

/// Keys whose presence marks a top-level object with `panels` as a flat
/// dashboard rather than a standalone row.
const DASHBOARD_MARKERS: [&str; 3] = ["schemaVersion", "uid", "time"];

/// Parse the leading integer of a child name (`"42-cpu-load"` → 42).
pub fn get_id(name: &str) -> Result<u64> {
    ID_PATTERN
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse::<u64>().ok())
        .ok_or_else(|| DpmError::invalid_path(format!("name should start with an id: {name}")))
}

/// Lowercase, hyphen-separated form of a title.
pub fn slug(title: &str) -> String {
    SLUG_PATTERN
        .replace_all(title, "-")
        .trim_matches('-')
        .to_lowercase()
}

/// The three document variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Dashboard,
    Row,
    Panel,
}

impl DocumentKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Row => "row",
            Self::Panel => "panel",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a document: opaque for dashboards, numeric below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentId<'a> {
    Key(&'a str),
    Number(u64),
}

impl fmt::Display for DocumentId<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// A dashboard, row or panel.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Dashboard(Dashboard),
    Row(Row),
    Panel(Panel),
}

impl Document {
    /// Classify an arbitrary JSON value by its keys.
    ///
    /// `rows` ⇒ dashboard; `panels` ⇒ flat dashboard when a dashboard marker
    /// key is present, row otherwise; an object with `id` or `title` ⇒ panel.
    /// Imported dashboards are keyed by the slug of their title.
    pub fn from_source(value: Value) -> Result<Self> {
        let Value::Object(source) = value else {
            return Err(DpmError::invalid_document("document must be a JSON object"));
        };

        if source.contains_key("rows")
            || (source.contains_key("panels")
                && DASHBOARD_MARKERS.iter().any(|key| source.contains_key(*key)))
        {
            let id = slug(source.get("title").and_then(Value::as_str).unwrap_or(""));
            return Dashboard::from_source(source, id).map(Self::Dashboard);
        }
        if source.contains_key("panels") {
            return Row::from_source(source, 0).map(Self::Row);
        }
        if source.contains_key("id") || source.contains_key("title") {
            return Ok(Self::Panel(Panel::from_source(source)));
        }
        Err(DpmError::invalid_document(
            "unrecognised document: expected rows, panels, id or title",
        ))
    }

    pub const fn kind(&self) -> DocumentKind {
        match self {
            Self::Dashboard(_) => DocumentKind::Dashboard,
            Self::Row(_) => DocumentKind::Row,
            Self::Panel(_) => DocumentKind::Panel,
        }
    }

    pub fn id(&self) -> DocumentId<'_> {
        match self {
            Self::Dashboard(dashboard) => DocumentId::Key(dashboard.id()),
            Self::Row(row) => DocumentId::Number(row.id()),
            Self::Panel(panel) => DocumentId::Number(panel.id()),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Self::Dashboard(dashboard) => dashboard.name().to_string(),
            Self::Row(row) => row.name(),
            Self::Panel(panel) => panel.name(),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Dashboard(dashboard) => dashboard.title(),
            Self::Row(row) => row.title(),
            Self::Panel(panel) => panel.title(),
        }
    }

    pub fn slug(&self) -> String {
        slug(self.title())
    }

    /// Current JSON representation, children included.
    pub fn source(&self) -> Value {
        match self {
            Self::Dashboard(dashboard) => Value::Object(dashboard.source()),
            Self::Row(row) => Value::Object(row.source()),
            Self::Panel(panel) => Value::Object(panel.source().clone()),
        }
    }

    /// Apply `document` to this one, treating it as a standalone root.
    pub fn update(&mut self, document: Self) -> Result<()> {
        match self {
            Self::Dashboard(dashboard) => dashboard.update(document),
            Self::Row(row) => row.update(document),
            Self::Panel(panel) => match document {
                Self::Panel(other) => {
                    panel.replace(other);
                    Ok(())
                }
                other => Err(incompatible(DocumentKind::Panel, other.kind())),
            },
        }
    }

    pub fn remove_child(&mut self, name: &str) -> Result<()> {
        match self {
            Self::Dashboard(dashboard) => dashboard.remove_child(name),
            Self::Row(row) => row.remove_child(name),
            Self::Panel(_) => Err(leaf_error()),
        }
    }

    pub fn move_child(&mut self, name: &str, position: &str) -> Result<()> {
        match self {
            Self::Dashboard(dashboard) => dashboard.move_child(name, position),
            Self::Row(row) => row.move_child(name, position),
            Self::Panel(_) => Err(leaf_error()),
        }
    }
}

pub(crate) fn incompatible(target: DocumentKind, incoming: DocumentKind) -> DpmError {
    DpmError::invalid_document(format!("can not update {target} with {incoming}"))
}

pub(crate) fn leaf_error() -> DpmError {
    DpmError::invalid_document("panels have no children")
}

pub(crate) fn title_of(source: &Source) -> &str {
    source.get("title").and_then(Value::as_str).unwrap_or("")
}

/// Parse the JSON array stored under `key`; a missing key is an empty list.
pub(crate) fn child_sources(source: &Source, key: &str) -> Result<Vec<Source>> {
    match source.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map.clone()),
                _ => Err(DpmError::invalid_document(format!(
                    "entries of '{key}' must be objects"
                ))),
            })
            .collect(),
        Some(_) => Err(DpmError::invalid_document(format!(
            "'{key}' must be an array"
        ))),
    }
}

/// Resolve a `pos` argument into a target index.
///
/// `+N`/`-N` move relative to `current`; anything else is a 1-based absolute
/// position. Results below zero saturate; the caller clamps the upper bound.
pub(crate) fn target_index(current: usize, position: &str) -> Result<usize> {
    let position = position.trim();
    let invalid = || DpmError::invalid_path(format!("invalid position: {position}"));

    if let Some(offset) = position.strip_prefix('+') {
        let offset: usize = offset.parse().map_err(|_| invalid())?;
        return Ok(current.saturating_add(offset));
    }
    if let Some(offset) = position.strip_prefix('-') {
        let offset: usize = offset.parse().map_err(|_| invalid())?;
        return Ok(current.saturating_sub(offset));
    }
    let absolute: usize = position.parse().map_err(|_| invalid())?;
    Ok(absolute.saturating_sub(1))
}

/// Remove the item at `from` and reinsert it at the index `position` names.
pub(crate) fn reposition<T>(items: &mut Vec<T>, from: usize, position: &str) -> Result<()> {
    let target = target_index(from, position)?;
    let item = items.remove(from);
    let target = target.min(items.len());
    items.insert(target, item);
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{Value, json};

    use super::{Dashboard, Source};

    pub fn object(value: Value) -> Source {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    pub fn panel_source(id: u64, title: &str) -> Value {
        json!({"id": id, "title": title})
    }

    pub fn row_source(title: &str, panels: Vec<Value>) -> Value {
        json!({"title": title, "panels": panels})
    }

    /// Rows `1-a` (panels 1-aa, 2-ab) and `2-b` (panels 3-ba, 4-bb).
    pub fn dashboard_source() -> Value {
        json!({
            "title": "Any dashboard",
            "rows": [
                row_source("A", vec![panel_source(1, "AA"), panel_source(2, "AB")]),
                row_source("B", vec![panel_source(3, "BA"), panel_source(4, "BB")]),
            ],
        })
    }

    pub fn mock_dashboard(id: &str) -> Dashboard {
        Dashboard::from_source(object(dashboard_source()), id).expect("fixture dashboard")
    }
}
