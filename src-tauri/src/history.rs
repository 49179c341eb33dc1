// Most-recently-activated ordering of open tab ids (newest last).
// Picks the next active tab when the active one closes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ActivationHistory {
    ids: Vec<String>,
}

impl ActivationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `id` to the tail, dropping any earlier occurrence.
    pub fn touch(&mut self, id: &str) {
        self.ids.retain(|existing| existing != id);
        self.ids.push(id.to_string());
    }

    pub fn remove(&mut self, id: &str) {
        self.ids.retain(|existing| existing != id);
    }

    /// Most recently activated id.
    pub fn last(&self) -> Option<&str> {
        self.ids.last().map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}
