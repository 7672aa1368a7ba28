#![forbid(unsafe_code)]

//! Dashboard Path Manager (dpm): a filesystem-like view over dashboard
//! documents kept in local files, a search index, a SQL table or a remote
//! HTTP API.
//!
//! Paths such as `/remote/prod/node-exporter/2-disk/5-io-wait` address a
//! dashboard, one of its rows and a panel inside that row:
//! 1. **Documents**: the dashboard → row → panel tree, its naming and
//!    renumbering rules
//! 2. **Storage**: interchangeable backends persisting whole dashboards
//! 3. **Resources**: path routing and the generic read-modify-write cycle
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use dashboard_path_manager::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use dashboard_path_manager::core::config::Config;
//! use dashboard_path_manager::storage::{Storage, SystemStorage};
//! ```

pub mod prelude;

#[cfg(feature = "cli")]
pub mod cli;
pub mod core;
pub mod document;
pub mod logger;
pub mod resources;
pub mod storage;
