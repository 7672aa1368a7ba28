//! Virtual path routing: the first segment selects a resource root, the
//! rest address a dashboard, row and panel inside it.
//!
//! ```text
//! /backups/<dashboard>[/<row>[/<panel>]]
//! /remote/<host>/<dashboard>[/<row>[/<panel>]]
//! /templates/{dashboards,rows,panels}/...
//! ```

pub mod manager;
pub mod templates;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::config::Config;
use crate::core::errors::{DpmError, Result};
use crate::core::paths;
use crate::core::prompt::Confirm;
use crate::document::Document;
use crate::storage::{Backend, SystemStorage};

pub use manager::{Manager, SaveOutcome};
pub use templates::{TemplateCategory, Templates};

pub const BACKUPS: &str = "backups";
pub const REMOTE: &str = "remote";
pub const TEMPLATES: &str = "templates";

/// Names listed at `/`.
pub const ROOTS: [&str; 3] = [BACKUPS, REMOTE, TEMPLATES];

/// What a path resolved to.
enum Target<'a> {
    /// `/`, `/remote` or `/templates`: fixed listings, nothing to read.
    Directory(Vec<String>),
    Backups(&'a [String]),
    Remote(Arc<Manager<Backend>>, &'a [String]),
    Template(TemplateCategory, &'a [String]),
}

/// Router from absolute virtual paths to the manager owning them.
#[derive(Debug)]
pub struct Resources {
    config: Config,
    backups: Manager<SystemStorage>,
    templates: Templates,
    remotes: Mutex<HashMap<String, Arc<Manager<Backend>>>>,
}

impl Resources {
    /// Bind the local categories under `data_dir`, creating their
    /// directories. Remote hosts are connected on first use.
    pub fn new(config: &Config) -> Result<Self> {
        let category = |name: &str| SystemStorage::new(config.category_dir(name));
        let backups = Manager::new(category(BACKUPS));
        backups.storage().ensure_dir()?;
        let templates = Templates::new(
            category("templates/dashboards"),
            category("templates/rows"),
            category("templates/panels"),
        );
        templates.ensure_dirs()?;

        Ok(Self {
            config: config.clone(),
            backups,
            templates,
            remotes: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Manager of a remote host, created and cached on first access.
    pub fn remote(&self, host: &str) -> Result<Arc<Manager<Backend>>> {
        let mut remotes = self.remotes.lock();
        if let Some(manager) = remotes.get(host) {
            return Ok(Arc::clone(manager));
        }
        let settings = self.config.host(host)?;
        let manager = Arc::new(Manager::new(Backend::open(&settings.backend)?));
        remotes.insert(host.to_string(), Arc::clone(&manager));
        Ok(manager)
    }

    fn resolve<'a>(&self, segments: &'a [String]) -> Result<Target<'a>> {
        let Some((root, rest)) = segments.split_first() else {
            return Ok(Target::Directory(owned(&ROOTS)));
        };
        match root.as_str() {
            BACKUPS => Ok(Target::Backups(rest)),
            REMOTE => match rest.split_first() {
                None => Ok(Target::Directory(owned(&self.config.enabled_hosts()))),
                Some((host, names)) => Ok(Target::Remote(self.remote(host)?, names)),
            },
            TEMPLATES => match rest.split_first() {
                None => Ok(Target::Directory(
                    TemplateCategory::ALL
                        .iter()
                        .map(|category| category.as_str().to_string())
                        .collect(),
                )),
                Some((category, names)) => {
                    Ok(Target::Template(TemplateCategory::parse(category)?, names))
                }
            },
            other => Err(DpmError::invalid_path(format!(
                "unknown resource root: {other}"
            ))),
        }
    }

    pub fn list(&self, path: &str) -> Result<Vec<String>> {
        let segments = paths::split(path);
        match self.resolve(&segments)? {
            Target::Directory(names) => Ok(names),
            Target::Backups(names) => self.backups.list(names),
            Target::Remote(manager, names) => manager.list(names),
            Target::Template(category, names) => self.templates.list(category, names),
        }
    }

    pub fn get(&self, path: &str) -> Result<Document> {
        let segments = paths::split(path);
        match self.resolve(&segments)? {
            Target::Directory(_) => Err(not_a_document(path)),
            Target::Backups(names) => self.backups.get(names),
            Target::Remote(manager, names) => manager.get(names),
            Target::Template(category, names) => self.templates.get(category, names),
        }
    }

    /// Write `document` at `path`; a path naming only a category stores it
    /// under its own id.
    pub fn save(
        &self,
        path: &str,
        document: Document,
        confirm: &dyn Confirm,
    ) -> Result<SaveOutcome> {
        let segments = paths::split(path);
        match self.resolve(&segments)? {
            Target::Directory(_) => Err(not_a_document(path)),
            Target::Backups(names) => self.backups.save(document, names, confirm),
            Target::Remote(manager, names) => manager.save(document, names, confirm),
            Target::Template(category, names) => {
                self.templates.save(category, document, names, confirm)
            }
        }
    }

    pub fn remove(&self, path: &str) -> Result<()> {
        let segments = paths::split(path);
        match self.resolve(&segments)? {
            Target::Directory(_) => Err(not_a_document(path)),
            Target::Backups(names) => self.backups.remove(names),
            Target::Remote(manager, names) => manager.remove(names),
            Target::Template(category, names) => self.templates.remove(category, names),
        }
    }

    pub fn move_child(&self, path: &str, position: &str) -> Result<()> {
        let segments = paths::split(path);
        match self.resolve(&segments)? {
            Target::Directory(_) => Err(not_a_document(path)),
            Target::Backups(names) => self.backups.move_child(names, position),
            Target::Remote(manager, names) => manager.move_child(names, position),
            Target::Template(category, names) => {
                self.templates.move_child(category, names, position)
            }
        }
    }
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

fn not_a_document(path: &str) -> DpmError {
    DpmError::invalid_path(format!("{path} is a directory, not a document"))
}
