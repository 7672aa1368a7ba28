use serde_json::Value;

use super::{
    Document, DocumentKind, Panel, Source, child_sources, get_id, incompatible, reposition, slug,
    title_of,
};
use crate::core::errors::{DpmError, Result};

/// Mid-level document owning an ordered list of panels.
///
/// Panel ids are kept as loaded. A row attached to a dashboard has its panel
/// ids managed dashboard-wide by the [`Dashboard`](super::Dashboard); the
/// methods on `Row` itself use row scope, which is what a standalone row
/// (a template) needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    id: u64,
    source: Source,
    panels: Vec<Panel>,
}

impl Row {
    pub fn from_source(source: Source, id: u64) -> Result<Self> {
        let panels = child_sources(&source, "panels")?
            .into_iter()
            .map(Panel::from_source)
            .collect();
        Ok(Self { id, source, panels })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    pub fn title(&self) -> &str {
        title_of(&self.source)
    }

    pub fn name(&self) -> String {
        format!("{}-{}", self.id, slug(self.title()))
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub(crate) fn panels_mut(&mut self) -> &mut [Panel] {
        &mut self.panels
    }

    /// JSON object with the current panels spliced in.
    pub fn source(&self) -> Source {
        let mut source = self.source.clone();
        source.insert(
            "panels".to_string(),
            Value::Array(
                self.panels
                    .iter()
                    .map(|panel| Value::Object(panel.source().clone()))
                    .collect(),
            ),
        );
        source
    }

    pub fn panel(&self, name: &str) -> Result<&Panel> {
        let index = self.panel_index(name)?;
        Ok(&self.panels[index])
    }

    pub(crate) fn panel_index(&self, name: &str) -> Result<usize> {
        let id = get_id(name)?;
        self.panels
            .iter()
            .position(|panel| panel.id() == id)
            .ok_or_else(|| DpmError::not_found(format!("there is no panel with id {id}")))
    }

    pub fn max_panel_id(&self) -> u64 {
        self.panels.iter().map(Panel::id).max().unwrap_or(0)
    }

    pub(crate) fn push_panel(&mut self, source: Source, id: u64) {
        self.panels.push(Panel::with_id(source, id));
    }

    pub(crate) fn take_panel(&mut self, name: &str) -> Result<Panel> {
        let index = self.panel_index(name)?;
        Ok(self.panels.remove(index))
    }

    pub(crate) fn reposition_panel(&mut self, name: &str, position: &str) -> Result<()> {
        let index = self.panel_index(name)?;
        reposition(&mut self.panels, index, position)
    }

    /// Reset every panel id, then number them consecutively from `start`.
    pub(crate) fn renumber_panels(&mut self, start: u64) {
        for panel in &mut self.panels {
            panel.set_id(0);
        }
        for (panel, id) in self.panels.iter_mut().zip(start..) {
            panel.set_id(id);
        }
    }

    /// Take over `other`'s content and panels, keeping this row's id.
    pub(crate) fn replace(&mut self, other: Self) {
        self.source = other.source;
        self.panels = other.panels;
    }

    /// Standalone update: Row←Row replaces, Row←Panel appends.
    pub fn update(&mut self, document: Document) -> Result<()> {
        match document {
            Document::Row(other) => {
                self.replace(other);
                self.renumber_panels(1);
                Ok(())
            }
            Document::Panel(panel) => {
                let next = self.max_panel_id() + 1;
                self.push_panel(panel.source().clone(), next);
                Ok(())
            }
            Document::Dashboard(_) => Err(incompatible(DocumentKind::Row, DocumentKind::Dashboard)),
        }
    }

    pub fn remove_child(&mut self, name: &str) -> Result<()> {
        self.take_panel(name)?;
        self.renumber_panels(1);
        Ok(())
    }

    pub fn move_child(&mut self, name: &str, position: &str) -> Result<()> {
        self.reposition_panel(name, position)?;
        self.renumber_panels(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::fixtures::*;
    use serde_json::json;

    fn any_row() -> Row {
        Row::from_source(
            object(row_source(
                "Any row",
                vec![panel_source(1, "First panel"), panel_source(2, "Second panel")],
            )),
            1,
        )
        .unwrap()
    }

    fn names(row: &Row) -> Vec<String> {
        row.panels().iter().map(Panel::name).collect()
    }

    #[test]
    fn row_addresses_panels_by_id() {
        let row = any_row();
        assert_eq!(row.id(), 1);
        assert_eq!(row.name(), "1-any-row");
        assert_eq!(row.panels().len(), 2);
        assert_eq!(row.panel("1-any-name").unwrap().id(), 1);
        assert_eq!(row.panel("2-any-name").unwrap().id(), 2);
        assert!(matches!(
            row.panel("3-any-name"),
            Err(DpmError::DocumentNotFound { .. })
        ));
        assert!(matches!(
            row.panel("0-any-name"),
            Err(DpmError::DocumentNotFound { .. })
        ));
        assert!(matches!(row.panel("x"), Err(DpmError::InvalidPath { .. })));
    }

    #[test]
    fn source_round_trips() {
        let source = object(row_source(
            "Any row",
            vec![json!({"id": 1, "title": "p", "gridPos": {"h": 8}})],
        ));
        let row = Row::from_source(source.clone(), 1).unwrap();
        assert_eq!(row.source(), source);
    }

    #[test]
    fn standalone_append_uses_row_scope() {
        let mut row = any_row();
        let panel = Panel::from_source(object(panel_source(42, "New")));
        row.update(Document::Panel(panel)).unwrap();
        assert_eq!(names(&row), ["1-first-panel", "2-second-panel", "3-new"]);
    }

    #[test]
    fn standalone_replace_renumbers_from_one() {
        let mut row = any_row();
        let other = Row::from_source(
            object(row_source("Other", vec![panel_source(30, "x"), panel_source(31, "y")])),
            0,
        )
        .unwrap();
        row.update(Document::Row(other)).unwrap();
        assert_eq!(row.id(), 1);
        assert_eq!(names(&row), ["1-x", "2-y"]);
    }

    #[test]
    fn remove_and_move_keep_ids_dense() {
        let mut row = any_row();
        row.update(Document::Panel(Panel::from_source(object(panel_source(0, "Third")))))
            .unwrap();
        row.remove_child("1-first-panel").unwrap();
        assert_eq!(names(&row), ["1-second-panel", "2-third"]);

        row.move_child("2-third", "1").unwrap();
        assert_eq!(names(&row), ["1-third", "2-second-panel"]);

        assert!(matches!(
            row.remove_child("9-missing"),
            Err(DpmError::DocumentNotFound { .. })
        ));
    }
}
