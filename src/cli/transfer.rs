//! Moving documents between virtual paths and the host filesystem.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use regex::Regex;
use serde_json::Value;

use crate::core::errors::{DpmError, Result};
use crate::core::paths::{self, SEPARATOR, expand_home};
use crate::core::prompt::Confirm;
use crate::document::{Document, get_id};
use crate::resources::{REMOTE, Resources, SaveOutcome};
use crate::storage::to_pretty_json;

/// Extension of exported and backed-up documents.
pub const FILE_EXTENSION: &str = "json";

/// Whether the last segment of `path` is a wildcard pattern.
pub fn has_wildcard(path: &str) -> bool {
    path.rsplit(SEPARATOR)
        .next()
        .is_some_and(|last| last.contains(['*', '?']))
}

/// Destination child of `destination` whose name is `<digits>-<slug>`, so a
/// copy replaces it instead of appending. Without a match `destination` is
/// returned unchanged.
pub fn match_slug(resources: &Resources, document: &Document, destination: &str) -> Result<String> {
    let pattern = Regex::new(&format!(r"^\d+-{}$", regex::escape(&document.slug())))
        .map_err(|e| DpmError::invalid_document(format!("unusable slug: {e}")))?;
    let matches: Vec<String> = resources
        .list(destination)?
        .into_iter()
        .filter(|child| pattern.is_match(child))
        .collect();
    match matches.as_slice() {
        [] => Ok(destination.to_string()),
        [only] => Ok(format!("{}{SEPARATOR}{only}", destination.trim_end_matches(SEPARATOR))),
        _ => Err(DpmError::invalid_path(format!(
            "too many children match {}, be more specific: {}",
            document.slug(),
            matches.join(", ")
        ))),
    }
}

/// Orders source paths so removing them one at a time never renumbers a path
/// still waiting: later siblings go first and children precede their parents.
/// Duplicates are dropped.
pub fn removal_order(mut paths: Vec<String>) -> Vec<String> {
    paths.sort_by(|a, b| document_order(b, a));
    paths.dedup();
    paths
}

/// Segment-wise comparison, numeric on `{id}-{slug}` names.
fn document_order(a: &str, b: &str) -> Ordering {
    let mut left = a.split(SEPARATOR).filter(|segment| !segment.is_empty());
    let mut right = b.split(SEPARATOR).filter(|segment| !segment.is_empty());
    loop {
        let order = match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match (get_id(x), get_id(y)) {
                (Ok(i), Ok(j)) => i.cmp(&j).then_with(|| x.cmp(y)),
                _ => x.cmp(y),
            },
        };
        if order != Ordering::Equal {
            return order;
        }
    }
}

/// `<dir>/<name>.json`
pub fn file_for(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.{FILE_EXTENSION}"))
}

pub fn read_document(file: &Path) -> Result<Document> {
    let raw = fs::read_to_string(file).map_err(|source| DpmError::io(file, source))?;
    let value: Value = serde_json::from_str(&raw)?;
    Document::from_source(value)
}

pub fn write_document(file: &Path, document: &Document) -> Result<()> {
    if let Some(parent) = file.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| DpmError::io(parent, source))?;
    }
    let text = to_pretty_json(&document.source())?;
    fs::write(file, text).map_err(|source| DpmError::io(file, source))
}

pub fn export(resources: &Resources, path: &str, file: &Path) -> Result<()> {
    let document = resources.get(path)?;
    write_document(&expand_home(file), &document)
}

pub fn import(
    resources: &Resources,
    file: &Path,
    path: &str,
    match_slugs: bool,
    confirm: &dyn Confirm,
) -> Result<(String, SaveOutcome)> {
    let document = read_document(&expand_home(file))?;
    let destination = if match_slugs {
        match_slug(resources, &document, path)?
    } else {
        path.to_string()
    };
    let outcome = resources.save(&destination, document, confirm)?;
    Ok((destination, outcome))
}

/// One file written or read by a bulk transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transferred {
    pub path: String,
    pub file: PathBuf,
    pub outcome: SaveOutcome,
}

/// `/remote/<host>/<pattern>` → one file per matching dashboard. The
/// directory defaults to `<data_dir>/exports/<host>`.
pub fn export_all(
    resources: &Resources,
    path_pattern: &str,
    dir: Option<&Path>,
) -> Result<Vec<Transferred>> {
    let segments = paths::split(path_pattern);
    let [root, host, pattern] = segments.as_slice() else {
        return Err(DpmError::invalid_path(
            "bulk export needs /remote/<host>/<pattern>",
        ));
    };
    if root != REMOTE {
        return Err(DpmError::invalid_path(
            "bulk export is only available for remote hosts",
        ));
    }
    let pattern = glob::Pattern::new(pattern)
        .map_err(|e| DpmError::invalid_path(format!("invalid pattern {pattern}: {e}")))?;
    let dir = match dir {
        Some(dir) => expand_home(dir),
        None => resources.config().category_dir(&format!("exports/{host}")),
    };
    fs::create_dir_all(&dir).map_err(|source| DpmError::io(&dir, source))?;

    let host_path = paths::join(&[root.clone(), host.clone()]);
    let mut exported = Vec::new();
    for name in resources.list(&host_path)? {
        if !pattern.matches(&name) {
            continue;
        }
        let path = format!("{host_path}{SEPARATOR}{name}");
        let file = file_for(&dir, &name);
        write_document(&file, &resources.get(&path)?)?;
        exported.push(Transferred {
            path,
            file,
            outcome: SaveOutcome::Saved,
        });
    }
    Ok(exported)
}

/// `<dir>/<pattern>` files → dashboards under `/remote/<host>`, each keyed by
/// its own id. A relative directory that does not exist is looked up below
/// `data_dir` (so `exports/prod/*` works from anywhere).
pub fn import_all(
    resources: &Resources,
    file_pattern: &str,
    path: &str,
    confirm: &dyn Confirm,
) -> Result<Vec<Transferred>> {
    let segments = paths::split(path);
    match segments.as_slice() {
        [root, _host] if root == REMOTE => {}
        [_, _] => {
            return Err(DpmError::invalid_path(
                "bulk import is only available for remote hosts",
            ));
        }
        _ => return Err(DpmError::invalid_path("bulk import needs /remote/<host>")),
    }

    let (dir, pattern) = file_pattern
        .rsplit_once(SEPARATOR)
        .unwrap_or((".", file_pattern));
    let mut dir = expand_home(Path::new(dir));
    if !dir.is_dir() {
        dir = resources.config().resources.data_dir.join(&dir);
    }
    if !dir.is_dir() {
        return Err(DpmError::invalid_path(format!(
            "cannot find source directory for {file_pattern}"
        )));
    }

    let full_pattern = dir.join(format!("{pattern}.{FILE_EXTENSION}"));
    let mut files: Vec<PathBuf> = glob::glob(&full_pattern.to_string_lossy())
        .map_err(|e| DpmError::invalid_path(format!("invalid pattern {file_pattern}: {e}")))?
        .filter_map(std::result::Result::ok)
        .filter(|file| file.is_file())
        .collect();
    files.sort();

    let mut imported = Vec::new();
    for file in files {
        let document = read_document(&file)?;
        let outcome = resources.save(path, document, confirm)?;
        imported.push(Transferred {
            path: path.to_string(),
            file,
            outcome,
        });
    }
    Ok(imported)
}

/// Export every document listed under `path` into `dir`.
pub fn backup(resources: &Resources, path: &str, dir: &Path) -> Result<Vec<Transferred>> {
    let names = resources.list(path)?;
    if names.is_empty() {
        return Err(DpmError::not_found(format!("nothing to back up under {path}")));
    }
    let dir = expand_home(dir);
    fs::create_dir_all(&dir).map_err(|source| DpmError::io(&dir, source))?;

    names
        .into_iter()
        .map(|name| {
            let path = format!("{}{SEPARATOR}{name}", path.trim_end_matches(SEPARATOR));
            let file = file_for(&dir, &name);
            write_document(&file, &resources.get(&path)?)?;
            Ok(Transferred {
                path,
                file,
                outcome: SaveOutcome::Saved,
            })
        })
        .collect()
}

/// Import every `*.json` file of `dir` to `path/<file stem>`. A declined
/// overwrite skips that file only; a cancelled command stops the restore.
pub fn restore(
    resources: &Resources,
    dir: &Path,
    path: &str,
    confirm: &dyn Confirm,
) -> Result<Vec<Transferred>> {
    let dir = expand_home(dir);
    let entries = fs::read_dir(&dir).map_err(|source| DpmError::io(&dir, source))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|file| {
            file.is_file() && file.extension().is_some_and(|ext| ext == FILE_EXTENSION)
        })
        .collect();
    files.sort();

    let mut restored = Vec::new();
    for file in files {
        let Some(name) = file.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let target = format!("{}{SEPARATOR}{name}", path.trim_end_matches(SEPARATOR));
        let document = read_document(&file)?;
        let outcome = resources.save(&target, document, confirm)?;
        restored.push(Transferred {
            path: target,
            file,
            outcome,
        });
    }
    Ok(restored)
}

/// Result of an editor session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Saved,
    /// The editor exited non-zero; nothing was written.
    Aborted,
    /// An overwrite confirmation was declined.
    Cancelled,
}

/// Round-trip the document at `path` through `editor` and a temp file,
/// saving it back only when the editor exits successfully.
///
/// `editor` may carry arguments (`code --wait`).
pub fn edit(
    resources: &Resources,
    path: &str,
    editor: &str,
    confirm: &dyn Confirm,
) -> Result<EditOutcome> {
    let document = resources.get(path)?;
    let scratch = tempfile::Builder::new()
        .prefix("dpm-")
        .suffix(&format!(".{FILE_EXTENSION}"))
        .tempfile()
        .map_err(|source| DpmError::io(std::env::temp_dir(), source))?;
    write_document(scratch.path(), &document)?;

    let mut words = editor.split_whitespace();
    let program = words.next().ok_or_else(|| DpmError::Editor {
        details: "no editor configured".to_string(),
    })?;
    let status = Command::new(program)
        .args(words)
        .arg(scratch.path())
        .status()
        .map_err(|e| DpmError::Editor {
            details: format!("failed to start {program}: {e}"),
        })?;
    if !status.success() {
        return Ok(EditOutcome::Aborted);
    }

    let edited = read_document(scratch.path())?;
    match resources.save(path, edited, confirm)? {
        SaveOutcome::Saved => Ok(EditOutcome::Saved),
        SaveOutcome::Cancelled => Ok(EditOutcome::Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{BackendConfig, Config, HostConfig};
    use crate::core::prompt::{AutoConfirm, Confirmation};
    use crate::document::fixtures::*;

    fn resources(dir: &Path) -> Resources {
        let mut config = Config::default();
        config.resources.data_dir = dir.join("data");
        config.hosts.insert(
            "prod".to_string(),
            HostConfig {
                enabled: true,
                backend: BackendConfig::System {
                    path: dir.join("prod"),
                },
            },
        );
        Resources::new(&config).unwrap()
    }

    fn seed(resources: &Resources, path: &str) {
        resources
            .save(
                path,
                Document::from_source(dashboard_source()).unwrap(),
                &AutoConfirm::PROCEED,
            )
            .unwrap();
    }

    #[test]
    fn wildcard_detection_looks_at_last_segment() {
        assert!(has_wildcard("/remote/prod/*"));
        assert!(has_wildcard("exports/prod/web-?"));
        assert!(!has_wildcard("/remote/pr*d/main"));
    }

    #[test]
    fn removal_runs_from_the_last_node_backwards() {
        let paths = [
            "/backups/main/2-b",
            "/backups/main/10-j",
            "/backups/main/1-a/1-aa",
            "/backups/main/1-a",
            "/backups/main/2-b",
            "/backups/other",
        ];
        assert_eq!(
            removal_order(paths.iter().map(|p| (*p).to_string()).collect()),
            [
                "/backups/other",
                "/backups/main/10-j",
                "/backups/main/2-b",
                "/backups/main/1-a/1-aa",
                "/backups/main/1-a",
            ]
        );
    }

    #[test]
    fn slug_matching_targets_existing_child() {
        let dir = tempfile::tempdir().unwrap();
        let resources = resources(dir.path());
        seed(&resources, "/backups/main");

        let row = Document::from_source(row_source("B", vec![])).unwrap();
        assert_eq!(
            match_slug(&resources, &row, "/backups/main").unwrap(),
            "/backups/main/2-b"
        );
        let other = Document::from_source(row_source("C", vec![])).unwrap();
        assert_eq!(
            match_slug(&resources, &other, "/backups/main/").unwrap(),
            "/backups/main/"
        );
    }

    #[test]
    fn ambiguous_slug_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let resources = resources(dir.path());
        seed(&resources, "/backups/main");
        let row = Document::from_source(row_source("A", vec![])).unwrap();
        resources
            .save("/backups/main", row.clone(), &AutoConfirm::PROCEED)
            .unwrap();
        assert!(matches!(
            match_slug(&resources, &row, "/backups/main"),
            Err(DpmError::InvalidPath { .. })
        ));
    }

    #[test]
    fn export_then_import_with_slug_match() {
        let dir = tempfile::tempdir().unwrap();
        let resources = resources(dir.path());
        seed(&resources, "/backups/main");

        let file = dir.path().join("out").join("row.json");
        export(&resources, "/backups/main/1-a", &file).unwrap();
        let (destination, outcome) =
            import(&resources, &file, "/backups/main", true, &AutoConfirm::PROCEED).unwrap();
        assert_eq!(destination, "/backups/main/1-a");
        assert_eq!(outcome, SaveOutcome::Saved);
        assert_eq!(resources.list("/backups/main").unwrap(), ["1-a", "2-b"]);

        import(&resources, &file, "/backups/main", false, &AutoConfirm::PROCEED).unwrap();
        assert_eq!(
            resources.list("/backups/main").unwrap(),
            ["1-a", "2-b", "3-a"]
        );
    }

    #[test]
    fn bulk_export_and_import() {
        let dir = tempfile::tempdir().unwrap();
        let resources = resources(dir.path());
        seed(&resources, "/remote/prod/web-1");
        seed(&resources, "/remote/prod/web-2");
        seed(&resources, "/remote/prod/db");

        let exported = export_all(&resources, "/remote/prod/web-*", None).unwrap();
        assert_eq!(exported.len(), 2);
        let exports = dir.path().join("data/exports/prod");
        assert!(file_for(&exports, "web-1").is_file());
        assert!(!file_for(&exports, "db").exists());

        resources.remove("/remote/prod/web-1").unwrap();
        resources.remove("/remote/prod/web-2").unwrap();
        let imported =
            import_all(&resources, "exports/prod/*", "/remote/prod", &AutoConfirm::PROCEED)
                .unwrap();
        assert_eq!(imported.len(), 2);
        // Imported dashboards are keyed by the slug of their title.
        assert_eq!(
            resources.list("/remote/prod").unwrap(),
            ["any-dashboard", "db"]
        );

        assert!(matches!(
            export_all(&resources, "/backups/*", None),
            Err(DpmError::InvalidPath { .. })
        ));
        assert!(matches!(
            import_all(&resources, "exports/prod/*", "/backups/x", &AutoConfirm::PROCEED),
            Err(DpmError::InvalidPath { .. })
        ));
    }

    #[test]
    fn backup_and_restore_skip_declined_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let resources = resources(dir.path());
        seed(&resources, "/remote/prod/web");
        seed(&resources, "/remote/prod/db");

        let archive = dir.path().join("archive");
        let saved = backup(&resources, "/remote/prod", &archive).unwrap();
        assert_eq!(saved.len(), 2);

        resources.remove("/remote/prod/web").unwrap();
        let restored = restore(&resources, &archive, "/remote/prod", &AutoConfirm::CANCEL).unwrap();
        let outcomes: Vec<(String, SaveOutcome)> = restored
            .into_iter()
            .map(|item| (item.path, item.outcome))
            .collect();
        assert_eq!(
            outcomes,
            [
                ("/remote/prod/db".to_string(), SaveOutcome::Cancelled),
                ("/remote/prod/web".to_string(), SaveOutcome::Saved),
            ]
        );
        assert_eq!(resources.list("/remote/prod").unwrap(), ["db", "web"]);
    }

    #[test]
    fn restore_stops_when_the_command_is_cancelled() {
        struct ClosedPrompt;
        impl Confirm for ClosedPrompt {
            fn confirm(&self, _question: &str) -> Result<Confirmation> {
                Err(DpmError::CommandCancelled)
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let resources = resources(dir.path());
        seed(&resources, "/remote/prod/web");
        seed(&resources, "/remote/prod/db");
        let archive = dir.path().join("archive");
        backup(&resources, "/remote/prod", &archive).unwrap();

        resources.remove("/remote/prod/web").unwrap();
        assert!(matches!(
            restore(&resources, &archive, "/remote/prod", &ClosedPrompt),
            Err(DpmError::CommandCancelled)
        ));
        assert_eq!(resources.list("/remote/prod").unwrap(), ["db"]);
    }

    #[test]
    fn empty_backup_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let resources = resources(dir.path());
        assert!(matches!(
            backup(&resources, "/backups", &dir.path().join("none")),
            Err(DpmError::DocumentNotFound { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn editor_exit_status_decides_the_save() {
        let dir = tempfile::tempdir().unwrap();
        let resources = resources(dir.path());
        seed(&resources, "/backups/main");

        assert_eq!(
            edit(&resources, "/backups/main/1-a", "false", &AutoConfirm::PROCEED).unwrap(),
            EditOutcome::Aborted
        );
        assert_eq!(
            edit(&resources, "/backups/main/1-a", "true", &AutoConfirm::PROCEED).unwrap(),
            EditOutcome::Saved
        );
        assert_eq!(resources.list("/backups/main").unwrap(), ["1-a", "2-b"]);
        assert!(matches!(
            edit(&resources, "/backups/main", "no-such-editor-dpm", &AutoConfirm::PROCEED),
            Err(DpmError::Editor { .. })
        ));
    }
}
