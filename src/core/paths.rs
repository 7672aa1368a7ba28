//! Shared path manipulation utilities.
//!
//! Two kinds of paths live here: the virtual, slash-separated resource paths
//! (`/remote/prod/my-dashboard/1-cpu`) that address documents, and host
//! filesystem paths from configuration that may start with `~`.

use std::env;
use std::path::{Path, PathBuf};

/// Marker that starts every absolute virtual path.
pub const ROOT_PATH: &str = "/";

/// Separator between virtual path segments.
pub const SEPARATOR: char = '/';

/// Resolve `input` against `current` into a canonical absolute virtual path.
///
/// An empty (or whitespace-only) `input` yields `default` when given and
/// `current` unchanged otherwise. `.` segments are dropped and `..` pops the
/// previous segment; popping at the root is a no-op.
pub fn normalize(current: &str, input: &str, default: Option<&str>) -> String {
    let input = input.trim();
    if input.is_empty() {
        return default.unwrap_or(current).to_string();
    }

    let joined = if input.starts_with(ROOT_PATH) {
        input.to_string()
    } else {
        format!("{current}{SEPARATOR}{input}")
    };

    let mut resolved: Vec<&str> = Vec::new();
    for segment in segments(&joined) {
        match segment {
            "." => {}
            ".." => {
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }

    format!("{ROOT_PATH}{}", resolved.join(&SEPARATOR.to_string()))
}

/// Split a path into its non-empty, trimmed segments.
pub fn split(path: &str) -> Vec<String> {
    segments(path).map(str::to_string).collect()
}

/// Join segments back into an absolute virtual path.
pub fn join(segments: &[String]) -> String {
    format!("{ROOT_PATH}{}", segments.join(&SEPARATOR.to_string()))
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
}

/// Expand a leading `~` to `$HOME`.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}
