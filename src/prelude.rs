//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use dashboard_path_manager::prelude::*;
//! ```

// Core
pub use crate::core::config::{BackendConfig, Config, HostConfig};
pub use crate::core::errors::{DpmError, Result};
pub use crate::core::prompt::{AutoConfirm, Confirm, Confirmation, StdinPrompt};

// Documents
pub use crate::document::{Dashboard, Document, DocumentKind, Panel, Row};

// Storage
pub use crate::storage::{Backend, Storage, SystemStorage};

// Resources
pub use crate::resources::{Manager, Resources, SaveOutcome, TemplateCategory, Templates};

// Logging
pub use crate::logger::{EventType, JsonlWriter, LogEntry};
