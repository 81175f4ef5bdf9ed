//! In-memory store of the last data submitted per template.
//! Entries live for the session only; nothing is written to disk.

use std::collections::HashMap;
use std::path::Path;

/// Builds the store key of a template in a workspace.
///
/// Templates are identified by name alone, so equally named templates from
/// different directories share one entry.
pub fn data_key<P: AsRef<Path>>(workspace: P, name: &str) -> String {
    format!("{}:{}", workspace.as_ref().display(), name)
}

#[derive(Debug, Default)]
pub struct TemplateDataStore {
    entries: HashMap<String, serde_json::Value>,
}

impl TemplateDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the saved data, or an empty object if nothing was saved.
    pub fn get<P: AsRef<Path>>(&self, workspace: P, name: &str) -> serde_json::Value {
        self.entries
            .get(&data_key(workspace, name))
            .cloned()
            .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()))
    }

    pub fn set<P: AsRef<Path>>(&mut self, workspace: P, name: &str, value: serde_json::Value) {
        self.entries.insert(data_key(workspace, name), value);
    }

    pub fn clear<P: AsRef<Path>>(&mut self, workspace: P, name: &str) {
        self.entries.remove(&data_key(workspace, name));
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }
}
