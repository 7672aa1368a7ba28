use serde_json::Value;

use super::{Source, slug, title_of};

/// Leaf document carrying opaque rendering configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    id: u64,
    source: Source,
}

impl Panel {
    /// Build a panel keeping the id embedded in its source (0 when absent).
    pub fn from_source(source: Source) -> Self {
        let id = source.get("id").and_then(Value::as_u64).unwrap_or(0);
        Self { id, source }
    }

    /// Build a panel and overwrite its embedded id.
    pub fn with_id(source: Source, id: u64) -> Self {
        let mut panel = Self { id, source };
        panel.set_id(id);
        panel
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn set_id(&mut self, id: u64) {
        self.id = id;
        self.source.insert("id".to_string(), Value::from(id));
    }

    pub fn title(&self) -> &str {
        title_of(&self.source)
    }

    pub fn name(&self) -> String {
        format!("{}-{}", self.id, slug(self.title()))
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Take over `other`'s content while keeping this panel's id.
    pub fn replace(&mut self, other: Self) {
        let id = self.id;
        self.source = other.source;
        self.set_id(id);
    }
}
