// Shared state structs to avoid circular dependencies.
// The session snapshot types are pure data; AppState wires them together for the desktop shell.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::history::ActivationHistory;

/// One open instance of a module.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: String,
    pub module_id: String,
    pub title: String,
    pub path: String,
    pub is_active: bool,
    pub can_close: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

/// What the tab strip needs to draw one tab.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TabSummary {
    pub id: String,
    pub title: String,
    pub is_active: bool,
    pub can_close: bool,
    pub has_error: bool,
}

/// Payload of the `update-tabs` event.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabsUpdate {
    pub tabs: Vec<TabSummary>,
    pub active_tab_id: Option<String>,
    pub is_dashboard: bool,
}

/// Immutable snapshot of the session. New snapshots are produced by
/// `modules::session::reduce`; nothing mutates a published one.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub(crate) is_dashboard: bool,
    pub(crate) active_tab_id: Option<String>,
    pub(crate) tabs: Vec<Tab>,
    #[serde(rename = "tabHistory")]
    pub(crate) history: ActivationHistory,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            is_dashboard: true,
            active_tab_id: None,
            tabs: Vec::new(),
            history: ActivationHistory::new(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("{0} tabs are marked active")]
    MultipleActive(usize),
    #[error("dashboard flag disagrees with active tab id")]
    DashboardMismatch,
    #[error("active tab id `{0}` does not match the active flags")]
    ActiveFlagMismatch(String),
    #[error("history references closed tab `{0}`")]
    UnknownHistoryEntry(String),
    #[error("history lists `{0}` twice")]
    DuplicateHistoryEntry(String),
    #[error("two tabs share id `{0}`")]
    DuplicateTabId(String),
}

impl SessionState {
    pub fn is_dashboard(&self) -> bool {
        self.is_dashboard
    }

    pub fn active_tab_id(&self) -> Option<&str> {
        self.active_tab_id.as_deref()
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn history(&self) -> &ActivationHistory {
        &self.history
    }

    pub fn tab(&self, id: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn tab_index(&self, id: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == id)
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.active_tab_id.as_deref().and_then(|id| self.tab(id))
    }

    pub fn tab_bar(&self) -> Vec<TabSummary> {
        self.tabs
            .iter()
            .map(|t| TabSummary {
                id: t.id.clone(),
                title: t.title.clone(),
                is_active: t.is_active,
                can_close: t.can_close,
                has_error: t.error.is_some(),
            })
            .collect()
    }

    pub fn tabs_update(&self) -> TabsUpdate {
        TabsUpdate {
            tabs: self.tab_bar(),
            active_tab_id: self.active_tab_id.clone(),
            is_dashboard: self.is_dashboard,
        }
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut ids = HashSet::new();
        for tab in &self.tabs {
            if !ids.insert(tab.id.as_str()) {
                return Err(InvariantViolation::DuplicateTabId(tab.id.clone()));
            }
        }

        let active: Vec<&Tab> = self.tabs.iter().filter(|t| t.is_active).collect();
        if active.len() > 1 {
            return Err(InvariantViolation::MultipleActive(active.len()));
        }
        if self.is_dashboard != self.active_tab_id.is_none() {
            return Err(InvariantViolation::DashboardMismatch);
        }
        match (&self.active_tab_id, active.first()) {
            (Some(id), Some(tab)) if &tab.id == id => {}
            (None, None) => {}
            (id, _) => {
                return Err(InvariantViolation::ActiveFlagMismatch(
                    id.clone().unwrap_or_default(),
                ))
            }
        }

        let mut seen = HashSet::new();
        for id in self.history.iter() {
            if !ids.contains(id) {
                return Err(InvariantViolation::UnknownHistoryEntry(id.to_string()));
            }
            if !seen.insert(id) {
                return Err(InvariantViolation::DuplicateHistoryEntry(id.to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(feature = "desktop")]
pub use desktop::AppState;

#[cfg(feature = "desktop")]
mod desktop {
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex, RwLock};

    use crate::modules::host::ContentHost;
    use crate::modules::session::Session;
    use crate::modules::tab_state::TabStateCache;
    use crate::registry::ModuleRegistry;
    use crate::settings::Settings;

    pub struct AppState {
        pub settings: Arc<RwLock<Settings>>,
        pub settings_path: PathBuf,
        pub registry: Arc<ModuleRegistry>,
        pub cache: Arc<TabStateCache>,
        pub session: Arc<Session>,
        pub host: Mutex<ContentHost>,
    }
}
