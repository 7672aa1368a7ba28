//! Local directory of `<id>.json` files.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use serde_json::Value;
use tempfile::NamedTempFile;

use super::{Storage, check_id, dashboard_from_value, to_pretty_json};
use crate::core::errors::{DpmError, Result};
use crate::document::Dashboard;

const EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct SystemStorage {
    dir: PathBuf,
}

impl SystemStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|source| DpmError::io(&self.dir, source))
    }

    fn file(&self, name: &str) -> Result<PathBuf> {
        check_id(name)?;
        Ok(self.dir.join(format!("{name}.{EXTENSION}")))
    }

    /// Names of the stored files without extension, sorted. A missing
    /// directory holds nothing.
    pub fn names(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(DpmError::io(&self.dir, source)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(|source| DpmError::io(&self.dir, source))?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn read(&self, name: &str) -> Result<Value> {
        let path = self.file(name)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Err(DpmError::not_found(format!(
                    "file not found: {}",
                    path.display()
                )));
            }
            Err(source) => return Err(DpmError::io(&path, source)),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    /// Pretty-print `value` to `<name>.json`, replacing the file atomically.
    pub fn write(&self, name: &str, value: &Value) -> Result<()> {
        let path = self.file(name)?;
        self.ensure_dir()?;

        let body = to_pretty_json(value)?;

        let mut tmp =
            NamedTempFile::new_in(&self.dir).map_err(|source| DpmError::io(&self.dir, source))?;
        tmp.write_all(body.as_bytes())
            .map_err(|source| DpmError::io(tmp.path(), source))?;
        tmp.persist(&path)
            .map_err(|error| DpmError::io(&path, error.error))?;
        Ok(())
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.file(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Err(DpmError::not_found(
                format!("file not found: {}", path.display()),
            )),
            Err(source) => Err(DpmError::io(&path, source)),
        }
    }
}

impl Storage for SystemStorage {
    fn list(&self) -> Result<Vec<String>> {
        self.names()
    }

    fn get(&self, id: &str) -> Result<Dashboard> {
        dashboard_from_value(id, self.read(id)?)
    }

    fn save(&self, id: &str, dashboard: &Dashboard) -> Result<()> {
        self.write(id, &Value::Object(dashboard.source()))
    }

    fn remove(&self, id: &str) -> Result<()> {
        self.delete(id)
    }
}
