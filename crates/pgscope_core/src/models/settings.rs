//! User-facing browser settings consumed by the core.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::sql::quote_ident;

/// Settings that shape how catalog facts are presented.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Show internal and system objects (e.g. internal dependencies).
    pub show_system_objects: bool,
    /// Schemas whose prefix is omitted when qualifying object names.
    pub search_path: Vec<String>,
}

impl BrowserSettings {
    /// Parse settings from a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        tracing::debug!(path = %path.display(), "Loaded browser settings");
        Ok(settings)
    }

    /// Set whether system objects are shown.
    pub fn with_system_objects(mut self, show: bool) -> Self {
        self.show_system_objects = show;
        self
    }

    /// Quoted `schema.` prefix for an object, or empty when the schema is
    /// empty or on the search path.
    pub fn schema_prefix(&self, schema: &str) -> String {
        if schema.is_empty() || self.search_path.iter().any(|s| s == schema) {
            return String::new();
        }
        format!("{}.", quote_ident(schema))
    }
}
