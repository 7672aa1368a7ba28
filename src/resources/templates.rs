//! Reusable dashboards, rows and panels kept under `<data_dir>/templates`.

use std::fmt;

use serde_json::Value;

use super::manager::{Manager, SaveOutcome};
use crate::core::errors::{DpmError, Result};
use crate::core::prompt::{Confirm, Confirmation};
use crate::document::{Document, DocumentKind, Panel, Row};
use crate::storage::SystemStorage;

/// Sub-directories of `templates`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateCategory {
    Dashboards,
    Rows,
    Panels,
}

impl TemplateCategory {
    pub const ALL: [Self; 3] = [Self::Dashboards, Self::Rows, Self::Panels];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dashboards => "dashboards",
            Self::Rows => "rows",
            Self::Panels => "panels",
        }
    }

    pub fn parse(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == name)
            .ok_or_else(|| DpmError::invalid_path(format!("invalid template category: {name}")))
    }

    /// Category a document of `kind` is kept in.
    pub const fn for_kind(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Dashboard => Self::Dashboards,
            DocumentKind::Row => Self::Rows,
            DocumentKind::Panel => Self::Panels,
        }
    }
}

impl fmt::Display for TemplateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Template store: dashboards through the generic manager, standalone rows
/// and panels as one file each.
///
/// Standalone rows number their panels from 1 within the row.
#[derive(Debug)]
pub struct Templates {
    dashboards: Manager<SystemStorage>,
    rows: SystemStorage,
    panels: SystemStorage,
}

impl Templates {
    pub fn new(dashboards: SystemStorage, rows: SystemStorage, panels: SystemStorage) -> Self {
        Self {
            dashboards: Manager::new(dashboards),
            rows,
            panels,
        }
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        self.dashboards.storage().ensure_dir()?;
        self.rows.ensure_dir()?;
        self.panels.ensure_dir()
    }

    pub fn list(&self, category: TemplateCategory, names: &[String]) -> Result<Vec<String>> {
        match (category, names) {
            (TemplateCategory::Dashboards, _) => self.dashboards.list(names),
            (TemplateCategory::Rows, []) => self.rows.names(),
            (TemplateCategory::Rows, [row]) => Ok(self
                .load_row(row)?
                .panels()
                .iter()
                .map(Panel::name)
                .collect()),
            (TemplateCategory::Rows, [row, panel]) => {
                self.load_row(row)?.panel(panel)?;
                Err(no_sub_nodes())
            }
            (TemplateCategory::Panels, []) => self.panels.names(),
            (TemplateCategory::Panels, [panel]) => {
                self.panels.read(panel)?;
                Err(no_sub_nodes())
            }
            _ => Err(no_sub_nodes()),
        }
    }

    pub fn get(&self, category: TemplateCategory, names: &[String]) -> Result<Document> {
        match (category, names) {
            (_, []) => Err(DpmError::invalid_path("can not get a template directory")),
            (TemplateCategory::Dashboards, _) => self.dashboards.get(names),
            (TemplateCategory::Rows, [row]) => Ok(Document::Row(self.load_row(row)?)),
            (TemplateCategory::Rows, [row, panel]) => {
                Ok(Document::Panel(self.load_row(row)?.panel(panel)?.clone()))
            }
            (TemplateCategory::Panels, [panel]) => Ok(Document::Panel(self.load_panel(panel)?)),
            _ => Err(no_sub_nodes()),
        }
    }

    /// Store `document`; without a name it is keyed by its slug (dashboards
    /// by their id).
    pub fn save(
        &self,
        category: TemplateCategory,
        document: Document,
        names: &[String],
        confirm: &dyn Confirm,
    ) -> Result<SaveOutcome> {
        if category == TemplateCategory::Dashboards {
            return self.dashboards.save(document, names, confirm);
        }

        let key = match names.first() {
            Some(name) => name.clone(),
            None => template_key(&document)?,
        };
        match category {
            TemplateCategory::Rows if names.len() > 2 => Err(no_sub_nodes()),
            TemplateCategory::Rows => self.save_row(&key, names.get(1), document, confirm),
            _ => self.save_panel(&key, names.len(), document, confirm),
        }
    }

    fn save_row(
        &self,
        key: &str,
        panel: Option<&String>,
        document: Document,
        confirm: &dyn Confirm,
    ) -> Result<SaveOutcome> {
        let mut row = match self.load_row(key) {
            Ok(row) => row,
            Err(DpmError::DocumentNotFound { .. }) if panel.is_none() => {
                let Document::Row(mut row) = document else {
                    return Err(wrong_kind(TemplateCategory::Rows, document.kind()));
                };
                row.renumber_panels(1);
                self.rows.write(key, &Value::Object(row.source()))?;
                return Ok(SaveOutcome::Saved);
            }
            Err(error) => return Err(error),
        };

        match panel {
            None => {
                if document.kind() == DocumentKind::Row && !confirmed(confirm, key)? {
                    return Ok(SaveOutcome::Cancelled);
                }
                row.update(document)?;
            }
            Some(panel) => {
                let index = row.panel_index(panel)?;
                let Document::Panel(other) = document else {
                    return Err(DpmError::invalid_document(format!(
                        "can not update {} with {}",
                        DocumentKind::Panel,
                        document.kind()
                    )));
                };
                if !confirmed(confirm, panel)? {
                    return Ok(SaveOutcome::Cancelled);
                }
                row.panels_mut()[index].replace(other);
            }
        }
        self.rows.write(key, &Value::Object(row.source()))?;
        Ok(SaveOutcome::Saved)
    }

    fn save_panel(
        &self,
        key: &str,
        depth: usize,
        document: Document,
        confirm: &dyn Confirm,
    ) -> Result<SaveOutcome> {
        if depth > 1 {
            return Err(no_sub_nodes());
        }
        let Document::Panel(incoming) = document else {
            return Err(wrong_kind(TemplateCategory::Panels, document.kind()));
        };
        let panel = match self.load_panel(key) {
            Ok(mut existing) => {
                if !confirmed(confirm, key)? {
                    return Ok(SaveOutcome::Cancelled);
                }
                existing.replace(incoming);
                existing
            }
            Err(DpmError::DocumentNotFound { .. }) => incoming,
            Err(error) => return Err(error),
        };
        self.panels.write(key, &Value::Object(panel.source().clone()))?;
        Ok(SaveOutcome::Saved)
    }

    pub fn remove(&self, category: TemplateCategory, names: &[String]) -> Result<()> {
        match (category, names) {
            (_, []) => Err(DpmError::invalid_path("can not remove a template directory")),
            (TemplateCategory::Dashboards, _) => self.dashboards.remove(names),
            (TemplateCategory::Rows, [row]) => self.rows.delete(row),
            (TemplateCategory::Rows, [row, panel]) => {
                let mut loaded = self.load_row(row)?;
                loaded.remove_child(panel)?;
                self.rows.write(row, &Value::Object(loaded.source()))
            }
            (TemplateCategory::Panels, [panel]) => self.panels.delete(panel),
            _ => Err(no_sub_nodes()),
        }
    }

    pub fn move_child(
        &self,
        category: TemplateCategory,
        names: &[String],
        position: &str,
    ) -> Result<()> {
        match (category, names) {
            (TemplateCategory::Dashboards, _) => self.dashboards.move_child(names, position),
            (TemplateCategory::Rows, [row, panel]) => {
                let mut loaded = self.load_row(row)?;
                loaded.move_child(panel, position)?;
                self.rows.write(row, &Value::Object(loaded.source()))
            }
            _ => Err(DpmError::invalid_path(
                "only panels inside a row template can be moved",
            )),
        }
    }

    fn load_row(&self, key: &str) -> Result<Row> {
        match self.rows.read(key)? {
            Value::Object(source) => Row::from_source(source, 1),
            _ => Err(DpmError::invalid_document(format!(
                "row template {key} is not a JSON object"
            ))),
        }
    }

    fn load_panel(&self, key: &str) -> Result<Panel> {
        match self.panels.read(key)? {
            Value::Object(source) => Ok(Panel::from_source(source)),
            _ => Err(DpmError::invalid_document(format!(
                "panel template {key} is not a JSON object"
            ))),
        }
    }
}

fn template_key(document: &Document) -> Result<String> {
    let key = document.slug();
    if key.is_empty() {
        return Err(DpmError::invalid_document(
            "untitled template; provide a name",
        ));
    }
    Ok(key)
}

fn confirmed(confirm: &dyn Confirm, name: &str) -> Result<bool> {
    Ok(confirm.confirm(&format!("Overwrite {name}?"))? == Confirmation::Proceed)
}

fn wrong_kind(category: TemplateCategory, kind: DocumentKind) -> DpmError {
    DpmError::invalid_document(format!("can not add {kind} to {category}"))
}

fn no_sub_nodes() -> DpmError {
    DpmError::invalid_path("panels contain no sub-nodes")
}
