// Tab state cache: ephemeral per-tab UI state (scroll position, selections,
// form drafts) that survives the tab being unmounted and remounted.
//
// Entries are keyed by tab id and are only purged by `clear_tab`, which the
// session calls when the tab closes. A cleared id stays closed: late writes
// from retained scopes are dropped. Values are opaque JSON owned by the module.

use dashmap::{DashMap, DashSet};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::error::Result;

pub type TabStateMap = HashMap<String, Value>;

type Callback = Arc<dyn Fn(&TabStateMap) + Send + Sync>;

#[derive(Default)]
pub struct TabStateCache {
    states: DashMap<String, TabStateMap>,
    subscribers: DashMap<String, Vec<(u64, Callback)>>,
    closed: DashSet<String>,
    next_subscription: AtomicU64,
}

impl TabStateCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_state(&self, tab_id: &str, key: &str, value: Value) {
        if self.is_closed(tab_id) {
            return;
        }
        let snapshot = {
            let mut state = self.states.entry(tab_id.to_string()).or_default();
            state.insert(key.to_string(), value);
            state.value().clone()
        };
        self.notify(tab_id, &snapshot);
    }

    /// Writes several keys, then notifies once.
    pub fn merge(&self, tab_id: &str, values: impl IntoIterator<Item = (String, Value)>) {
        if self.is_closed(tab_id) {
            return;
        }
        let snapshot = {
            let mut state = self.states.entry(tab_id.to_string()).or_default();
            state.extend(values);
            state.value().clone()
        };
        self.notify(tab_id, &snapshot);
    }

    /// Replaces `key` with `f(previous)` and returns the new value, or `None`
    /// if the tab is closed. `f` runs while the tab's entry is locked and must
    /// not touch the cache.
    pub fn update_state<F>(&self, tab_id: &str, key: &str, f: F) -> Option<Value>
    where
        F: FnOnce(Option<Value>) -> Value,
    {
        if self.is_closed(tab_id) {
            return None;
        }
        let (value, snapshot) = {
            let mut state = self.states.entry(tab_id.to_string()).or_default();
            let value = f(state.get(key).cloned());
            state.insert(key.to_string(), value.clone());
            (value, state.value().clone())
        };
        self.notify(tab_id, &snapshot);
        Some(value)
    }

    pub fn get_state(&self, tab_id: &str, key: &str) -> Option<Value> {
        self.states.get(tab_id)?.value().get(key).cloned()
    }

    /// Copy of everything stored for the tab; empty if nothing was written.
    pub fn get_full_state(&self, tab_id: &str) -> TabStateMap {
        self.states
            .get(tab_id)
            .map(|state| state.value().clone())
            .unwrap_or_default()
    }

    /// Drops the tab's entries and subscriber registrations, and refuses any
    /// later write to `tab_id` until `reopen_tab`.
    pub fn clear_tab(&self, tab_id: &str) {
        self.closed.insert(tab_id.to_string());
        let entries = self.states.remove(tab_id).map(|(_, s)| s.len()).unwrap_or(0);
        let subscribers = self.subscribers.remove(tab_id).map(|(_, s)| s.len()).unwrap_or(0);
        log::debug!(
            "[TabState] Cleared tab '{}' ({} entries, {} subscribers)",
            tab_id,
            entries,
            subscribers
        );
    }

    /// Registers `callback` for writes to `tab_id`. It receives the tab's full
    /// state after each write.
    pub fn subscribe<F>(self: &Arc<Self>, tab_id: &str, callback: F) -> Unsubscribe
    where
        F: Fn(&TabStateMap) + Send + Sync + 'static,
    {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .entry(tab_id.to_string())
            .or_default()
            .push((id, Arc::new(callback)));

        Unsubscribe {
            cache: Arc::downgrade(self),
            tab_id: tab_id.to_string(),
            id,
        }
    }

    /// Accepts writes for `tab_id` again. Only needed when an id source hands
    /// out an id that was used by a closed tab.
    pub fn reopen_tab(&self, tab_id: &str) {
        if self.closed.remove(tab_id).is_some() {
            log::debug!("[TabState] Reopened tab id '{}'", tab_id);
        }
    }

    pub fn has_tab(&self, tab_id: &str) -> bool {
        self.states.contains_key(tab_id)
    }

    pub fn subscriber_count(&self, tab_id: &str) -> usize {
        self.subscribers.get(tab_id).map(|s| s.len()).unwrap_or(0)
    }

    /// Scoped handle that can only reach `tab_id`'s entries.
    pub fn scope(self: &Arc<Self>, tab_id: &str) -> TabScope {
        TabScope {
            cache: Arc::clone(self),
            tab_id: tab_id.to_string(),
        }
    }

    fn is_closed(&self, tab_id: &str) -> bool {
        let closed = self.closed.contains(tab_id);
        if closed {
            log::debug!("[TabState] Write to closed tab '{}' dropped", tab_id);
        }
        closed
    }

    fn remove_subscriber(&self, tab_id: &str, id: u64) {
        let emptied = match self.subscribers.get_mut(tab_id) {
            Some(mut subs) => {
                subs.retain(|(sub_id, _)| *sub_id != id);
                subs.is_empty()
            }
            None => false,
        };
        if emptied {
            self.subscribers.remove_if(tab_id, |_, subs| subs.is_empty());
        }
    }

    fn notify(&self, tab_id: &str, snapshot: &TabStateMap) {
        // Copy the callback list out so callbacks may (un)subscribe freely.
        let callbacks: Vec<Callback> = match self.subscribers.get(tab_id) {
            Some(subs) => subs.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
            None => return,
        };

        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(snapshot))).is_err() {
                log::warn!("[TabState] Subscriber for tab '{}' panicked; ignored", tab_id);
            }
        }
    }
}

/// Returned by `subscribe`; consuming it removes that one registration.
#[must_use = "dropping the handle keeps the subscription alive"]
pub struct Unsubscribe {
    cache: Weak<TabStateCache>,
    tab_id: String,
    id: u64,
}

impl Unsubscribe {
    pub fn unsubscribe(self) {
        if let Some(cache) = self.cache.upgrade() {
            cache.remove_subscriber(&self.tab_id, self.id);
        }
    }
}

/// The cache as seen by one tab's module content.
#[derive(Clone)]
pub struct TabScope {
    cache: Arc<TabStateCache>,
    tab_id: String,
}

impl TabScope {
    pub fn tab_id(&self) -> &str {
        &self.tab_id
    }

    pub fn set(&self, key: &str, value: Value) {
        self.cache.set_state(&self.tab_id, key, value);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.cache.get_state(&self.tab_id, key)
    }

    /// Read-modify-write of one key; `f` receives the previous value.
    pub fn update<F>(&self, key: &str, f: F) -> Option<Value>
    where
        F: FnOnce(Option<Value>) -> Value,
    {
        self.cache.update_state(&self.tab_id, key, f)
    }

    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    pub fn full_state(&self) -> TabStateMap {
        self.cache.get_full_state(&self.tab_id)
    }

    pub fn merge(&self, values: impl IntoIterator<Item = (String, Value)>) {
        self.cache.merge(&self.tab_id, values);
    }

    pub fn subscribe<F>(&self, callback: F) -> Unsubscribe
    where
        F: Fn(&TabStateMap) + Send + Sync + 'static,
    {
        self.cache.subscribe(&self.tab_id, callback)
    }

    pub fn set_as<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.set(key, serde_json::to_value(value)?);
        Ok(())
    }

    /// `Ok(None)` when nothing is stored under `key`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }
}
