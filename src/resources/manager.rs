//! Path-addressed CRUD over one storage backend.

use crate::core::errors::{DpmError, Result};
use crate::core::prompt::{Confirm, Confirmation};
use crate::document::{Dashboard, Document, DocumentKind, NodeRef};
use crate::storage::Storage;

/// Result of a save that may need confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Cancelled,
}

/// `[dashboard, row, panel]` names below a manager's root.
#[derive(Debug, Clone, Copy)]
struct Address<'a> {
    dashboard: Option<&'a str>,
    child: Option<&'a str>,
    grandchild: Option<&'a str>,
}

impl<'a> Address<'a> {
    fn parse(names: &'a [String]) -> Result<Self> {
        if names.len() > 3 {
            return Err(DpmError::invalid_path(format!(
                "too many path segments below a dashboard: {}",
                names.join("/")
            )));
        }
        let name = |index: usize| names.get(index).map(String::as_str);
        Ok(Self {
            dashboard: name(0),
            child: name(1),
            grandchild: name(2),
        })
    }

    fn require_dashboard(&self) -> Result<&'a str> {
        self.dashboard
            .ok_or_else(|| DpmError::invalid_path("provide the dashboard at least"))
    }

    /// Name of the deepest addressed row or panel.
    fn leaf(&self) -> Option<&'a str> {
        self.grandchild.or(self.child)
    }
}

/// Generic list/get/save/remove over whole dashboards kept in `S`.
#[derive(Debug)]
pub struct Manager<S> {
    storage: S,
}

impl<S: Storage> Manager<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Dashboard ids, or the children of the addressed node.
    pub fn list(&self, names: &[String]) -> Result<Vec<String>> {
        let address = Address::parse(names)?;
        let Some(id) = address.dashboard else {
            return self.storage.list();
        };
        let dashboard = self.storage.get(id)?;
        let node = dashboard.locate(address.child, address.grandchild)?;
        dashboard.children_names(node)
    }

    pub fn get(&self, names: &[String]) -> Result<Document> {
        let address = Address::parse(names)?;
        let dashboard = self.storage.get(address.require_dashboard()?)?;
        let node = dashboard.locate(address.child, address.grandchild)?;
        dashboard.document(node)
    }

    /// Apply `document` at `names` and persist the whole dashboard.
    ///
    /// Replacing a node of the same kind asks `confirm` first. A missing
    /// dashboard is created when `document` is itself a dashboard.
    pub fn save(
        &self,
        document: Document,
        names: &[String],
        confirm: &dyn Confirm,
    ) -> Result<SaveOutcome> {
        let address = Address::parse(names)?;

        let dashboard = match address.dashboard {
            Some(id) => match self.locate(id, &address) {
                Ok((mut dashboard, node)) => {
                    let existing = dashboard.document(node)?;
                    if existing.kind() == document.kind()
                        && confirm.confirm(&format!("Overwrite {}?", existing.name()))?
                            == Confirmation::Cancelled
                    {
                        return Ok(SaveOutcome::Cancelled);
                    }
                    dashboard.update_at(node, document)?;
                    dashboard
                }
                Err(DpmError::DocumentNotFound { details }) => match document {
                    Document::Dashboard(mut dashboard) if address.child.is_none() => {
                        dashboard.set_id(id);
                        dashboard
                    }
                    Document::Dashboard(_) => {
                        return Err(DpmError::invalid_document(
                            "a dashboard can only be saved at dashboard level",
                        ));
                    }
                    _ => return Err(DpmError::DocumentNotFound { details }),
                },
                Err(error) => return Err(error),
            },
            None => match document {
                Document::Dashboard(dashboard) if !dashboard.id().is_empty() => dashboard,
                Document::Dashboard(_) => {
                    return Err(DpmError::invalid_document(
                        "dashboard has no id; provide a name",
                    ));
                }
                other => {
                    return Err(DpmError::invalid_document(format!(
                        "can not save {} as {}",
                        other.kind(),
                        DocumentKind::Dashboard
                    )));
                }
            },
        };

        self.storage.save(dashboard.id(), &dashboard)?;
        Ok(SaveOutcome::Saved)
    }

    /// Delete a dashboard, or a row/panel inside it.
    pub fn remove(&self, names: &[String]) -> Result<()> {
        let address = Address::parse(names)?;
        let id = address.require_dashboard()?;
        let Some(leaf) = address.leaf() else {
            return self.storage.remove(id);
        };

        let (mut dashboard, node) = self.locate(id, &address)?;
        dashboard.remove_child_at(parent_of(node)?, leaf)?;
        self.storage.save(dashboard.id(), &dashboard)
    }

    /// Reorder a row or panel within its parent.
    pub fn move_child(&self, names: &[String], position: &str) -> Result<()> {
        let address = Address::parse(names)?;
        let id = address.require_dashboard()?;
        let leaf = address
            .leaf()
            .ok_or_else(|| DpmError::invalid_path("dashboards have no position"))?;

        let (mut dashboard, node) = self.locate(id, &address)?;
        dashboard.move_child_at(parent_of(node)?, leaf, position)?;
        self.storage.save(dashboard.id(), &dashboard)
    }

    fn locate(&self, id: &str, address: &Address<'_>) -> Result<(Dashboard, NodeRef)> {
        let dashboard = self.storage.get(id)?;
        let node = dashboard.locate(address.child, address.grandchild)?;
        Ok((dashboard, node))
    }
}

fn parent_of(node: NodeRef) -> Result<NodeRef> {
    node.parent()
        .ok_or_else(|| DpmError::invalid_path("the dashboard has no parent"))
}
