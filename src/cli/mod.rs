//! Building blocks of the `dpm` commands that do more than one resource call.
#![allow(missing_docs)]

pub mod output;
pub mod transfer;

use crate::core::config::Config;
use crate::core::prompt::{AutoConfirm, Confirm, StdinPrompt};
use crate::document::DocumentKind;
use crate::resources::{TEMPLATES, TemplateCategory};

/// Overwrite confirmation honoring `--force` / `prompt.force`.
pub fn confirmer(config: &Config, force: bool) -> Box<dyn Confirm> {
    if force || config.prompt.force {
        Box::new(AutoConfirm::PROCEED)
    } else {
        Box::new(StdinPrompt)
    }
}

/// Template category a document of `kind` is saved to.
pub fn template_path(kind: DocumentKind) -> String {
    format!("/{TEMPLATES}/{}", TemplateCategory::for_kind(kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_by_kind() {
        assert_eq!(template_path(DocumentKind::Row), "/templates/rows");
        assert_eq!(template_path(DocumentKind::Dashboard), "/templates/dashboards");
        assert_eq!(template_path(DocumentKind::Panel), "/templates/panels");
    }
}
