use serde_json::Value;

use super::{
    Document, DocumentKind, Panel, Row, Source, child_sources, get_id, incompatible, leaf_error,
    reposition, title_of,
};
use crate::core::errors::{DpmError, Result};

/// Children of a dashboard: rows in the current format, panels in the flat one.
#[derive(Debug, Clone, PartialEq)]
pub enum Layout {
    Rows(Vec<Row>),
    Panels(Vec<Panel>),
}

/// Position of a node inside a [`Dashboard`].
///
/// Stands in for parent back-references: the dashboard owns every node, so a
/// node is named by indices and its parent is derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef {
    Dashboard,
    Row(usize),
    /// `row` is `None` for panels of a flat dashboard.
    Panel { row: Option<usize>, index: usize },
}

impl NodeRef {
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::Dashboard => None,
            Self::Row(_) | Self::Panel { row: None, .. } => Some(Self::Dashboard),
            Self::Panel { row: Some(row), .. } => Some(Self::Row(row)),
        }
    }
}

/// Root document, keyed by an opaque storage id.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    id: String,
    source: Source,
    layout: Layout,
}

impl Dashboard {
    /// Rows are numbered 1..N and keep their panels' ids; flat panels are
    /// renumbered 1..N.
    pub fn from_source(source: Source, id: impl Into<String>) -> Result<Self> {
        let layout = if source.contains_key("rows") {
            let rows = child_sources(&source, "rows")?
                .into_iter()
                .zip(1..)
                .map(|(row, id)| Row::from_source(row, id))
                .collect::<Result<Vec<_>>>()?;
            Layout::Rows(rows)
        } else {
            let panels = child_sources(&source, "panels")?
                .into_iter()
                .zip(1..)
                .map(|(panel, id)| Panel::with_id(panel, id))
                .collect();
            Layout::Panels(panels)
        };
        Ok(Self {
            id: id.into(),
            source,
            layout,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn name(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        title_of(&self.source)
    }

    pub fn has_rows(&self) -> bool {
        matches!(self.layout, Layout::Rows(_))
    }

    pub fn rows(&self) -> &[Row] {
        match &self.layout {
            Layout::Rows(rows) => rows,
            Layout::Panels(_) => &[],
        }
    }

    /// JSON object with the current children spliced in.
    pub fn source(&self) -> Source {
        let mut source = self.source.clone();
        match &self.layout {
            Layout::Rows(rows) => {
                let rows = rows.iter().map(|row| Value::Object(row.source())).collect();
                source.insert("rows".to_string(), Value::Array(rows));
            }
            Layout::Panels(panels) => {
                if !panels.is_empty() || source.contains_key("panels") {
                    let panels = panels
                        .iter()
                        .map(|panel| Value::Object(panel.source().clone()))
                        .collect();
                    source.insert("panels".to_string(), Value::Array(panels));
                }
            }
        }
        source
    }

    pub fn max_panel_id(&self) -> u64 {
        match &self.layout {
            Layout::Rows(rows) => rows.iter().map(Row::max_panel_id).max().unwrap_or(0),
            Layout::Panels(panels) => panels.iter().map(Panel::id).max().unwrap_or(0),
        }
    }

    pub fn row(&self, name: &str) -> Result<&Row> {
        let index = self.row_index(name)?;
        Ok(&self.rows()[index])
    }

    fn row_index(&self, name: &str) -> Result<usize> {
        let id = get_id(name)?;
        let count = self.rows().len() as u64;
        if id == 0 || id > count {
            return Err(DpmError::not_found(format!("there is no row with id {id}")));
        }
        Ok((id - 1) as usize)
    }

    /// Panel lookup by id: among the flat panels, or dashboard-wide.
    pub fn panel(&self, name: &str) -> Result<&Panel> {
        let id = get_id(name)?;
        let found = match &self.layout {
            Layout::Panels(panels) => panels.iter().find(|panel| panel.id() == id),
            Layout::Rows(rows) => rows
                .iter()
                .flat_map(|row| row.panels())
                .find(|panel| panel.id() == id),
        };
        found.ok_or_else(|| DpmError::not_found(format!("there is no panel with id {id}")))
    }

    fn flat_panel_index(panels: &[Panel], name: &str) -> Result<usize> {
        let id = get_id(name)?;
        panels
            .iter()
            .position(|panel| panel.id() == id)
            .ok_or_else(|| DpmError::not_found(format!("there is no panel with id {id}")))
    }

    /// Resolve child names below the dashboard into a node.
    ///
    /// A second name below a flat panel addresses past a leaf: that is an
    /// invalid path when the panel exists.
    pub fn locate(&self, child: Option<&str>, grandchild: Option<&str>) -> Result<NodeRef> {
        let Some(child) = child else {
            return Ok(NodeRef::Dashboard);
        };
        match &self.layout {
            Layout::Rows(rows) => {
                let row = self.row_index(child)?;
                match grandchild {
                    None => Ok(NodeRef::Row(row)),
                    Some(panel) => Ok(NodeRef::Panel {
                        row: Some(row),
                        index: rows[row].panel_index(panel)?,
                    }),
                }
            }
            Layout::Panels(panels) => {
                let index = Self::flat_panel_index(panels, child)?;
                match grandchild {
                    None => Ok(NodeRef::Panel { row: None, index }),
                    Some(_) => Err(DpmError::invalid_path(format!(
                        "{child} is a panel and has no sub-nodes"
                    ))),
                }
            }
        }
    }

    /// Owned copy of the node at `node`.
    pub fn document(&self, node: NodeRef) -> Result<Document> {
        match (node, &self.layout) {
            (NodeRef::Dashboard, _) => Ok(Document::Dashboard(self.clone())),
            (NodeRef::Row(row), Layout::Rows(rows)) => rows
                .get(row)
                .cloned()
                .map(Document::Row)
                .ok_or_else(|| stale(node)),
            (NodeRef::Panel { row: Some(row), index }, Layout::Rows(rows)) => rows
                .get(row)
                .and_then(|row| row.panels().get(index))
                .cloned()
                .map(Document::Panel)
                .ok_or_else(|| stale(node)),
            (NodeRef::Panel { row: None, index }, Layout::Panels(panels)) => panels
                .get(index)
                .cloned()
                .map(Document::Panel)
                .ok_or_else(|| stale(node)),
            _ => Err(stale(node)),
        }
    }

    pub fn children_names(&self, node: NodeRef) -> Result<Vec<String>> {
        match (node, &self.layout) {
            (NodeRef::Dashboard, Layout::Rows(rows)) => Ok(rows.iter().map(Row::name).collect()),
            (NodeRef::Dashboard, Layout::Panels(panels)) => {
                Ok(panels.iter().map(Panel::name).collect())
            }
            (NodeRef::Row(row), Layout::Rows(rows)) => rows
                .get(row)
                .map(|row| row.panels().iter().map(Panel::name).collect())
                .ok_or_else(|| stale(node)),
            (NodeRef::Panel { .. }, _) => {
                Err(DpmError::invalid_path("a panel has no sub-nodes"))
            }
            _ => Err(stale(node)),
        }
    }

    /// Dashboard←Dashboard replaces, keeping the id; Dashboard←Row appends
    /// a row; Dashboard←Panel appends to a flat dashboard.
    pub fn update(&mut self, document: Document) -> Result<()> {
        let next_panel_id = self.max_panel_id() + 1;
        let kind = document.kind();
        match document {
            Document::Dashboard(other) => {
                self.source = other.source;
                self.layout = other.layout;
            }
            Document::Row(mut row) => {
                let Layout::Rows(rows) = &mut self.layout else {
                    return Err(incompatible(DocumentKind::Dashboard, kind));
                };
                row.set_id(rows.len() as u64 + 1);
                row.renumber_panels(next_panel_id);
                rows.push(row);
            }
            Document::Panel(panel) => {
                let Layout::Panels(panels) = &mut self.layout else {
                    return Err(incompatible(DocumentKind::Dashboard, kind));
                };
                panels.push(Panel::with_id(panel.source().clone(), next_panel_id));
            }
        }
        Ok(())
    }

    /// Apply `document` to the node at `node`.
    ///
    /// Attached rows draw new panel ids from the dashboard-wide maximum.
    pub fn update_at(&mut self, node: NodeRef, document: Document) -> Result<()> {
        match node {
            NodeRef::Dashboard => self.update(document),
            NodeRef::Row(index) => {
                let Layout::Rows(rows) = &mut self.layout else {
                    return Err(stale(node));
                };
                if index >= rows.len() {
                    return Err(stale(node));
                }
                match document {
                    Document::Row(other) => {
                        rows[index].replace(other);
                        for panel in rows[index].panels_mut() {
                            panel.set_id(0);
                        }
                        let start = rows.iter().map(Row::max_panel_id).max().unwrap_or(0) + 1;
                        rows[index].renumber_panels(start);
                        Ok(())
                    }
                    Document::Panel(panel) => {
                        let next = rows.iter().map(Row::max_panel_id).max().unwrap_or(0) + 1;
                        rows[index].push_panel(panel.source().clone(), next);
                        Ok(())
                    }
                    other => Err(incompatible(DocumentKind::Row, other.kind())),
                }
            }
            NodeRef::Panel { row, index } => {
                let kind = document.kind();
                let Document::Panel(other) = document else {
                    return Err(incompatible(DocumentKind::Panel, kind));
                };
                self.panel_at_mut(row, index)
                    .ok_or_else(|| stale(node))?
                    .replace(other);
                Ok(())
            }
        }
    }

    fn panel_at_mut(&mut self, row: Option<usize>, index: usize) -> Option<&mut Panel> {
        match (&mut self.layout, row) {
            (Layout::Rows(rows), Some(row)) => {
                rows.get_mut(row)?.panels_mut().get_mut(index)
            }
            (Layout::Panels(panels), None) => panels.get_mut(index),
            _ => None,
        }
    }

    /// Remove a row (or a flat panel) and renumber the survivors 1..N.
    pub fn remove_child(&mut self, name: &str) -> Result<()> {
        let index = self.child_index(name)?;
        match &mut self.layout {
            Layout::Rows(rows) => {
                rows.remove(index);
                renumber_rows(rows);
            }
            Layout::Panels(panels) => {
                panels.remove(index);
                renumber_flat(panels);
            }
        }
        Ok(())
    }

    /// Reorder a row (or a flat panel) and renumber 1..N in the new order.
    pub fn move_child(&mut self, name: &str, position: &str) -> Result<()> {
        let index = self.child_index(name)?;
        match &mut self.layout {
            Layout::Rows(rows) => {
                reposition(rows, index, position)?;
                renumber_rows(rows);
            }
            Layout::Panels(panels) => {
                reposition(panels, index, position)?;
                renumber_flat(panels);
            }
        }
        Ok(())
    }

    fn child_index(&self, name: &str) -> Result<usize> {
        match &self.layout {
            Layout::Rows(_) => self.row_index(name),
            Layout::Panels(panels) => Self::flat_panel_index(panels, name),
        }
    }

    /// `remove_child` on the node at `node`.
    ///
    /// Panels nested in rows are renumbered dashboard-wide in document order.
    pub fn remove_child_at(&mut self, node: NodeRef, name: &str) -> Result<()> {
        match node {
            NodeRef::Dashboard => self.remove_child(name),
            NodeRef::Row(index) => {
                self.attached_row(node, index)?.take_panel(name)?;
                self.renumber_nested_panels();
                Ok(())
            }
            NodeRef::Panel { .. } => Err(leaf_error()),
        }
    }

    /// `move_child` on the node at `node`.
    pub fn move_child_at(&mut self, node: NodeRef, name: &str, position: &str) -> Result<()> {
        match node {
            NodeRef::Dashboard => self.move_child(name, position),
            NodeRef::Row(index) => {
                self.attached_row(node, index)?
                    .reposition_panel(name, position)?;
                self.renumber_nested_panels();
                Ok(())
            }
            NodeRef::Panel { .. } => Err(leaf_error()),
        }
    }

    fn attached_row(&mut self, node: NodeRef, index: usize) -> Result<&mut Row> {
        match &mut self.layout {
            Layout::Rows(rows) => rows.get_mut(index).ok_or_else(|| stale(node)),
            Layout::Panels(_) => Err(stale(node)),
        }
    }

    fn renumber_nested_panels(&mut self) {
        let Layout::Rows(rows) = &mut self.layout else {
            return;
        };
        let mut next = 1;
        for row in rows.iter_mut() {
            row.renumber_panels(next);
            next += row.panels().len() as u64;
        }
    }
}

fn renumber_rows(rows: &mut [Row]) {
    for (row, id) in rows.iter_mut().zip(1..) {
        row.set_id(id);
    }
}

fn renumber_flat(panels: &mut [Panel]) {
    for (panel, id) in panels.iter_mut().zip(1..) {
        panel.set_id(id);
    }
}

fn stale(node: NodeRef) -> DpmError {
    DpmError::not_found(format!("no document at {node:?}"))
}
