//! Core types: errors, configuration, virtual paths, confirmation.

pub mod config;
pub mod errors;
pub mod paths;
pub mod prompt;
