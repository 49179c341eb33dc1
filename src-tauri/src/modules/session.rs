// Session state machine: the single authority over open tabs, the active tab,
// activation history and dashboard mode.
//
// `reduce` is a pure function from (state, command) to a new state. `Session`
// owns the published snapshot and is the only place that swaps it.
// Every command is total: unknown ids and modules degrade to no-ops.

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use crate::modules::naming;
use crate::modules::tab_state::TabStateCache;
use crate::modules::tabs::move_tab;
use crate::registry::ModuleRegistry;
use crate::state::{SessionState, Tab};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionCommand {
    #[serde(rename_all = "camelCase")]
    OpenModule {
        module_id: String,
        #[serde(default)]
        params: Option<Value>,
    },
    #[serde(rename_all = "camelCase")]
    CloseTab { tab_id: String },
    #[serde(rename_all = "camelCase")]
    SwitchTab { tab_id: String },
    #[serde(rename_all = "camelCase")]
    ReorderTabs {
        source_index: usize,
        destination_index: usize,
    },
    GoToDashboard,
    #[serde(rename_all = "camelCase")]
    SetTabError { tab_id: String, error: String },
    #[serde(rename_all = "camelCase")]
    ClearTabError { tab_id: String },
}

/// Source of fresh tab ids.
pub trait TabIdSource: Send + Sync {
    fn next_id(&self, module_id: &str) -> String;
}

/// `<moduleId>-<millis>` from a process-wide clock that never repeats a value,
/// even for several tabs opened within one millisecond.
#[derive(Debug, Default)]
pub struct TimestampIds {
    last: AtomicI64,
}

impl TimestampIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TabIdSource for TimestampIds {
    fn next_id(&self, module_id: &str) -> String {
        let now = chrono::Utc::now().timestamp_millis();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, candidate, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return format!("{}-{}", module_id, candidate),
                Err(current) => last = current,
            }
        }
    }
}

/// Result of applying one command.
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: SessionState,
    /// Tab removed by this command; its cache entries must be purged.
    pub closed: Option<Tab>,
    /// Id of a tab created by this command.
    pub opened: Option<String>,
    pub changed: bool,
}

impl Transition {
    fn unchanged(state: &SessionState) -> Self {
        Self {
            state: state.clone(),
            closed: None,
            opened: None,
            changed: false,
        }
    }

    fn to(previous: &SessionState, state: SessionState) -> Self {
        let changed = &state != previous;
        Self {
            state,
            closed: None,
            opened: None,
            changed,
        }
    }
}

pub fn reduce(
    state: &SessionState,
    command: SessionCommand,
    registry: &ModuleRegistry,
    ids: &dyn TabIdSource,
) -> Transition {
    match command {
        SessionCommand::OpenModule { module_id, params } => {
            open_module(state, &module_id, params, registry, ids)
        }
        SessionCommand::CloseTab { tab_id } => close_tab(state, &tab_id, registry),
        SessionCommand::SwitchTab { tab_id } => match state.tab(&tab_id) {
            Some(_) => Transition::to(state, activate(state.clone(), &tab_id)),
            None => {
                log::debug!("[Session] Switch to unknown tab '{}' ignored", tab_id);
                Transition::unchanged(state)
            }
        },
        SessionCommand::ReorderTabs {
            source_index,
            destination_index,
        } => {
            let mut next = state.clone();
            if move_tab(&mut next.tabs, source_index, destination_index) {
                Transition::to(state, next)
            } else {
                Transition::unchanged(state)
            }
        }
        SessionCommand::GoToDashboard => {
            let mut next = state.clone();
            next.is_dashboard = true;
            next.active_tab_id = None;
            for tab in &mut next.tabs {
                tab.is_active = false;
            }
            Transition::to(state, next)
        }
        SessionCommand::SetTabError { tab_id, error } => {
            update_tab(state, &tab_id, |tab| tab.error = Some(error))
        }
        SessionCommand::ClearTabError { tab_id } => update_tab(state, &tab_id, |tab| tab.error = None),
    }
}

/// Marks `tab_id` as the single active tab and moves it to the history tail.
fn activate(mut state: SessionState, tab_id: &str) -> SessionState {
    state.is_dashboard = false;
    state.active_tab_id = Some(tab_id.to_string());
    for tab in &mut state.tabs {
        tab.is_active = tab.id == tab_id;
    }
    state.history.touch(tab_id);
    state
}

fn open_module(
    state: &SessionState,
    module_id: &str,
    params: Option<Value>,
    registry: &ModuleRegistry,
    ids: &dyn TabIdSource,
) -> Transition {
    let Some(module) = registry.get(module_id) else {
        log::debug!("[Session] Open of unknown module '{}' ignored", module_id);
        return Transition::unchanged(state);
    };

    if let Some(existing) = state
        .tabs
        .iter()
        .find(|tab| naming::is_duplicate(tab, module_id, params.as_ref()))
    {
        log::debug!("[Session] Reactivating tab '{}' for module '{}'", existing.id, module_id);
        let id = existing.id.clone();
        return Transition::to(state, activate(state.clone(), &id));
    }

    let siblings = state.tabs.iter().filter(|t| t.module_id == module_id).count();
    let tab = Tab {
        id: unique_id(state, ids.next_id(module_id)),
        module_id: module.id.clone(),
        title: naming::initial_title(module, params.as_ref(), siblings),
        path: module.path.clone(),
        is_active: true,
        can_close: true,
        error: None,
        params,
    };
    log::info!("[Session] Opened tab '{}' ({})", tab.id, tab.title);

    let mut next = state.clone();
    let id = tab.id.clone();
    next.tabs.push(tab);
    Transition {
        opened: Some(id.clone()),
        ..Transition::to(state, activate(next, &id))
    }
}

fn unique_id(state: &SessionState, candidate: String) -> String {
    if state.tab(&candidate).is_none() {
        return candidate;
    }
    let mut n = 2usize;
    loop {
        let id = format!("{}-{}", candidate, n);
        if state.tab(&id).is_none() {
            log::warn!("[Session] Tab id '{}' already taken, using '{}'", candidate, id);
            return id;
        }
        n += 1;
    }
}

fn close_tab(state: &SessionState, tab_id: &str, registry: &ModuleRegistry) -> Transition {
    let Some(index) = state.tab_index(tab_id) else {
        log::debug!("[Session] Close of unknown tab '{}' ignored", tab_id);
        return Transition::unchanged(state);
    };

    let mut next = state.clone();
    let closed = next.tabs.remove(index);
    next.history.remove(tab_id);

    if closed.is_active {
        match next.history.last().map(str::to_string) {
            Some(successor) => next = activate(next, &successor),
            None => {
                next.is_dashboard = true;
                next.active_tab_id = None;
                for tab in &mut next.tabs {
                    tab.is_active = false;
                }
            }
        }
    }

    if let Some(module) = registry.get(&closed.module_id) {
        naming::renumber(&mut next.tabs, module);
    }
    log::info!("[Session] Closed tab '{}'", closed.id);

    Transition {
        state: next,
        closed: Some(closed),
        opened: None,
        changed: true,
    }
}

fn update_tab(state: &SessionState, tab_id: &str, f: impl FnOnce(&mut Tab)) -> Transition {
    let mut next = state.clone();
    match next.tabs.iter_mut().find(|t| t.id == tab_id) {
        Some(tab) => {
            f(tab);
            Transition::to(state, next)
        }
        None => {
            log::debug!("[Session] Update of unknown tab '{}' ignored", tab_id);
            Transition::unchanged(state)
        }
    }
}

/// Process-wide coordinator. Readers take cheap snapshots; commands are
/// serialized so each one sees the result of the previous.
pub struct Session {
    registry: Arc<ModuleRegistry>,
    cache: Arc<TabStateCache>,
    ids: Box<dyn TabIdSource>,
    state: ArcSwap<SessionState>,
    write: Mutex<()>,
}

impl Session {
    pub fn new(registry: Arc<ModuleRegistry>, cache: Arc<TabStateCache>) -> Self {
        Self::with_ids(registry, cache, Box::new(TimestampIds::new()))
    }

    pub fn with_ids(
        registry: Arc<ModuleRegistry>,
        cache: Arc<TabStateCache>,
        ids: Box<dyn TabIdSource>,
    ) -> Self {
        Self {
            registry,
            cache,
            ids,
            state: ArcSwap::from_pointee(SessionState::default()),
            write: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> Arc<SessionState> {
        self.state.load_full()
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Applies `command`; returns whether the published state changed.
    pub fn dispatch(&self, command: SessionCommand) -> bool {
        let transition = {
            let _guard = self.write.lock().unwrap_or_else(|e| e.into_inner());
            let current = self.state.load_full();
            let transition = reduce(&current, command, &self.registry, self.ids.as_ref());
            debug_assert_eq!(transition.state.check_invariants(), Ok(()));
            if transition.changed {
                self.state.store(Arc::new(transition.state.clone()));
            }
            transition
        };

        if let Some(closed) = &transition.closed {
            self.cache.clear_tab(&closed.id);
        }
        if let Some(opened) = &transition.opened {
            self.cache.reopen_tab(opened);
        }
        transition.changed
    }

    pub fn open_module(&self, module_id: &str, params: Option<Value>) -> bool {
        self.dispatch(SessionCommand::OpenModule {
            module_id: module_id.to_string(),
            params,
        })
    }

    pub fn close_tab(&self, tab_id: &str) -> bool {
        self.dispatch(SessionCommand::CloseTab {
            tab_id: tab_id.to_string(),
        })
    }

    pub fn switch_tab(&self, tab_id: &str) -> bool {
        self.dispatch(SessionCommand::SwitchTab {
            tab_id: tab_id.to_string(),
        })
    }

    pub fn reorder_tabs(&self, source_index: usize, destination_index: usize) -> bool {
        self.dispatch(SessionCommand::ReorderTabs {
            source_index,
            destination_index,
        })
    }

    pub fn go_to_dashboard(&self) -> bool {
        self.dispatch(SessionCommand::GoToDashboard)
    }

    pub fn set_tab_error(&self, tab_id: &str, error: &str) -> bool {
        self.dispatch(SessionCommand::SetTabError {
            tab_id: tab_id.to_string(),
            error: error.to_string(),
        })
    }

    pub fn clear_tab_error(&self, tab_id: &str) -> bool {
        self.dispatch(SessionCommand::ClearTabError {
            tab_id: tab_id.to_string(),
        })
    }

    /// Writes to the cache on behalf of the front end; refused for tabs that
    /// are not open.
    pub fn set_tab_state(&self, tab_id: &str, key: &str, value: Value) -> bool {
        if self.snapshot().tab(tab_id).is_none() {
            log::debug!("[Session] State write for unknown tab '{}' refused", tab_id);
            return false;
        }
        self.cache.set_state(tab_id, key, value);
        true
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::registry::test_module;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    /// Deterministic ids: `<module>-1`, `<module>-2`, ...
    #[derive(Default)]
    pub(crate) struct SequentialIds(AtomicUsize);

    impl TabIdSource for SequentialIds {
        fn next_id(&self, module_id: &str) -> String {
            format!("{}-{}", module_id, self.0.fetch_add(1, Ordering::SeqCst) + 1)
        }
    }

    pub(crate) fn test_registry() -> Arc<ModuleRegistry> {
        Arc::new(
            ModuleRegistry::new(vec![
                test_module("pos", "POS"),
                test_module("tables", "Tables"),
                test_module("orders", "Orders"),
            ])
            .unwrap(),
        )
    }

    pub(crate) fn test_session(cache: Arc<TabStateCache>) -> Session {
        Session::with_ids(test_registry(), cache, Box::new(SequentialIds::default()))
    }

    #[fixture]
    fn session() -> Session {
        test_session(TabStateCache::new())
    }

    fn ids(state: &SessionState) -> Vec<&str> {
        state.tabs().iter().map(|t| t.id.as_str()).collect()
    }

    fn titles(state: &SessionState) -> Vec<&str> {
        state.tabs().iter().map(|t| t.title.as_str()).collect()
    }

    fn history(state: &SessionState) -> Vec<&str> {
        state.history().iter().collect()
    }

    fn table(id: u32, name: &str) -> Option<Value> {
        Some(json!({"selectedTable": {"id": id, "name": name}}))
    }

    #[rstest]
    fn test_starts_on_dashboard(session: Session) {
        let s = session.snapshot();
        assert!(s.is_dashboard());
        assert!(s.tabs().is_empty());
    }

    #[rstest]
    fn test_open_creates_active_tab(session: Session) {
        assert!(session.open_module("pos", None));

        let s = session.snapshot();
        assert!(!s.is_dashboard());
        assert_eq!(s.active_tab_id(), Some("pos-1"));
        let tab = s.active_tab().unwrap();
        assert_eq!(tab.title, "POS");
        assert_eq!(tab.path, "/pos");
        assert!(tab.is_active && tab.can_close);
        assert_eq!(history(&s), vec!["pos-1"]);
    }

    #[rstest]
    fn test_open_unknown_module_is_noop(session: Session) {
        assert!(!session.open_module("nope", None));
        assert_eq!(*session.snapshot(), SessionState::default());
    }

    #[rstest]
    fn test_bare_opens_are_never_deduplicated(session: Session) {
        session.open_module("pos", None);
        session.open_module("pos", None);

        let s = session.snapshot();
        assert_eq!(ids(&s), vec!["pos-1", "pos-2"]);
        assert_eq!(titles(&s), vec!["POS", "POS 2"]);
        assert_eq!(s.active_tab_id(), Some("pos-2"));
    }

    #[rstest]
    fn test_open_with_same_record_reactivates(session: Session) {
        session.open_module("tables", table(4, "Terrace"));
        session.open_module("pos", None);
        assert!(session.open_module("tables", table(4, "Terrace")));

        let s = session.snapshot();
        assert_eq!(s.tabs().len(), 2);
        assert_eq!(s.active_tab_id(), Some("tables-1"));
        assert_eq!(history(&s), vec!["pos-2", "tables-1"]);
        assert_eq!(s.tab("tables-1").unwrap().title, "Tables - Terrace");
    }

    #[rstest]
    fn test_open_with_other_record_creates_tab(session: Session) {
        session.open_module("tables", table(4, "Terrace"));
        session.open_module("tables", table(5, "Bar"));

        let s = session.snapshot();
        assert_eq!(titles(&s), vec!["Tables - Terrace", "Tables - Bar"]);
    }

    #[rstest]
    fn test_reopening_active_record_tab_changes_nothing(session: Session) {
        session.open_module("tables", table(4, "Terrace"));
        assert!(!session.open_module("tables", table(4, "Terrace")));
        assert_eq!(session.snapshot().tabs().len(), 1);
    }

    #[rstest]
    fn test_close_active_activates_history_tail(session: Session) {
        session.open_module("pos", None); // A
        session.open_module("tables", None); // B
        session.open_module("orders", None); // C
        session.switch_tab("tables-2");
        session.switch_tab("pos-1");
        assert_eq!(history(&session.snapshot()), vec!["orders-3", "tables-2", "pos-1"]);

        session.close_tab("pos-1");

        let s = session.snapshot();
        assert_eq!(s.active_tab_id(), Some("tables-2"));
        assert!(s.tab("tables-2").unwrap().is_active);
        assert_eq!(history(&s), vec!["orders-3", "tables-2"]);
    }

    #[rstest]
    fn test_close_inactive_keeps_active(session: Session) {
        session.open_module("pos", None);
        session.open_module("tables", None);

        session.close_tab("pos-1");

        let s = session.snapshot();
        assert_eq!(s.active_tab_id(), Some("tables-2"));
        assert_eq!(ids(&s), vec!["tables-2"]);
    }

    #[rstest]
    fn test_close_last_tab_returns_to_dashboard(session: Session) {
        session.open_module("pos", None);
        session.close_tab("pos-1");

        let s = session.snapshot();
        assert!(s.is_dashboard());
        assert_eq!(s.active_tab_id(), None);
        assert!(s.tabs().is_empty() && s.history().is_empty());
    }

    #[rstest]
    fn test_close_unknown_is_noop(session: Session) {
        session.open_module("pos", None);
        let before = session.snapshot();
        assert!(!session.close_tab("ghost"));
        assert_eq!(session.snapshot(), before);
    }

    #[rstest]
    fn test_close_purges_tab_cache() {
        let cache = TabStateCache::new();
        let session = test_session(Arc::clone(&cache));
        session.open_module("pos", None);
        session.open_module("pos", None);
        cache.set_state("pos-1", "cart", json!([1]));
        cache.set_state("pos-2", "cart", json!([2]));

        session.close_tab("pos-1");

        assert_eq!(cache.get_state("pos-1", "cart"), None);
        assert_eq!(cache.get_state("pos-2", "cart"), Some(json!([2])));
    }

    #[rstest]
    fn test_late_write_after_close_is_dropped() {
        let cache = TabStateCache::new();
        let session = test_session(Arc::clone(&cache));
        session.open_module("pos", None);
        let retained = cache.scope("pos-1");
        retained.set("draft", json!("early"));

        session.close_tab("pos-1");
        retained.set("draft", json!("late"));

        assert!(session.snapshot().tab("pos-1").is_none());
        assert!(!cache.has_tab("pos-1"));
        assert_eq!(cache.get_state("pos-1", "draft"), None);
    }

    #[rstest]
    fn test_front_end_state_write_needs_open_tab() {
        let cache = TabStateCache::new();
        let session = test_session(Arc::clone(&cache));
        session.open_module("pos", None);

        assert!(session.set_tab_state("pos-1", "scroll", json!(40)));
        assert!(!session.set_tab_state("ghost", "scroll", json!(40)));
        session.close_tab("pos-1");
        assert!(!session.set_tab_state("pos-1", "scroll", json!(80)));

        assert!(!cache.has_tab("pos-1"));
        assert!(!cache.has_tab("ghost"));
    }

    #[test]
    fn test_reused_id_gets_a_writable_cache_entry() {
        struct Constant;
        impl TabIdSource for Constant {
            fn next_id(&self, _module_id: &str) -> String {
                "same".to_string()
            }
        }

        let cache = TabStateCache::new();
        let session = Session::with_ids(test_registry(), Arc::clone(&cache), Box::new(Constant));
        session.open_module("pos", None);
        session.close_tab("same");
        session.open_module("pos", None);

        cache.set_state("same", "cart", json!([3]));
        assert_eq!(cache.get_state("same", "cart"), Some(json!([3])));
    }

    #[rstest]
    fn test_close_renumbers_siblings(session: Session) {
        for _ in 0..3 {
            session.open_module("pos", None);
        }
        session.open_module("orders", None);
        assert_eq!(titles(&session.snapshot()), vec!["POS", "POS 2", "POS 3", "Orders"]);

        session.close_tab("pos-1");
        assert_eq!(titles(&session.snapshot()), vec!["POS", "POS 2", "Orders"]);

        session.open_module("pos", None);
        assert_eq!(titles(&session.snapshot()), vec!["POS", "POS 2", "Orders", "POS 3"]);
    }

    #[rstest]
    #[case(&["pos-1"])]
    #[case(&["pos-2"])]
    #[case(&["pos-4"])]
    #[case(&["pos-3", "pos-1"])]
    #[case(&["pos-4", "pos-2", "pos-1"])]
    fn test_renumbering_is_stable_under_any_close_order(#[case] closes: &[&str]) {
        let session = test_session(TabStateCache::new());
        for _ in 0..4 {
            session.open_module("pos", None);
        }
        for id in closes {
            session.close_tab(id);
        }

        let s = session.snapshot();
        let expected: Vec<String> = (0..s.tabs().len())
            .map(|i| if i == 0 { "POS".to_string() } else { format!("POS {}", i + 1) })
            .collect();
        assert_eq!(titles(&s), expected);
    }

    #[rstest]
    fn test_switch_is_idempotent(session: Session) {
        session.open_module("pos", None);
        session.open_module("tables", None);

        assert!(session.switch_tab("pos-1"));
        let once = session.snapshot();
        assert!(!session.switch_tab("pos-1"));
        assert_eq!(session.snapshot(), once);
    }

    #[rstest]
    fn test_switch_unknown_is_noop(session: Session) {
        session.open_module("pos", None);
        session.go_to_dashboard();
        assert!(!session.switch_tab("ghost"));
        assert!(session.snapshot().is_dashboard());
    }

    #[rstest]
    fn test_reorder(session: Session) {
        session.open_module("pos", None);
        session.open_module("tables", None);
        session.open_module("orders", None);
        let before = session.snapshot();

        assert!(session.reorder_tabs(0, 2));

        let s = session.snapshot();
        assert_eq!(ids(&s), vec!["tables-2", "orders-3", "pos-1"]);
        assert_eq!(s.active_tab_id(), before.active_tab_id());
        assert_eq!(s.history(), before.history());
    }

    #[rstest]
    #[case(3, 0)]
    #[case(0, 3)]
    #[case(1, 1)]
    fn test_reorder_rejects_invalid_indices(#[case] from: usize, #[case] to: usize) {
        let session = test_session(TabStateCache::new());
        session.open_module("pos", None);
        session.open_module("tables", None);
        session.open_module("orders", None);
        let before = session.snapshot();

        assert!(!session.reorder_tabs(from, to));
        assert_eq!(session.snapshot(), before);
    }

    #[rstest]
    fn test_dashboard_keeps_tabs_and_switch_restores(session: Session) {
        session.open_module("pos", None);
        session.open_module("tables", None);

        session.go_to_dashboard();
        let s = session.snapshot();
        assert!(s.is_dashboard());
        assert_eq!(s.tabs().len(), 2);
        assert!(s.tabs().iter().all(|t| !t.is_active));

        session.switch_tab("pos-1");
        assert_eq!(session.snapshot().active_tab_id(), Some("pos-1"));
    }

    #[rstest]
    fn test_tab_error_set_and_clear(session: Session) {
        session.open_module("pos", None);
        session.open_module("tables", None);

        assert!(session.set_tab_error("pos-1", "boom"));
        let s = session.snapshot();
        assert_eq!(s.tab("pos-1").unwrap().error.as_deref(), Some("boom"));
        assert_eq!(s.tab("tables-2").unwrap().error, None);
        assert_eq!(s.active_tab_id(), Some("tables-2"));

        assert!(session.clear_tab_error("pos-1"));
        assert_eq!(session.snapshot().tab("pos-1").unwrap().error, None);
        assert!(!session.set_tab_error("ghost", "boom"));
    }

    #[test]
    fn test_colliding_ids_are_suffixed() {
        struct Constant;
        impl TabIdSource for Constant {
            fn next_id(&self, _module_id: &str) -> String {
                "same".to_string()
            }
        }

        let session = Session::with_ids(test_registry(), TabStateCache::new(), Box::new(Constant));
        session.open_module("pos", None);
        session.open_module("pos", None);
        session.open_module("pos", None);

        assert_eq!(ids(&session.snapshot()), vec!["same", "same-2", "same-3"]);
    }

    #[test]
    fn test_timestamp_ids_are_unique_and_prefixed() {
        let source = TimestampIds::new();
        let generated: Vec<String> = (0..50).map(|_| source.next_id("pos")).collect();
        let unique: std::collections::HashSet<&String> = generated.iter().collect();

        assert_eq!(unique.len(), generated.len());
        assert!(generated.iter().all(|id| id.starts_with("pos-")));
    }

    #[test]
    fn test_command_wire_format() {
        let command: SessionCommand = serde_json::from_value(json!({
            "type": "OPEN_MODULE",
            "payload": {"moduleId": "tables", "params": {"selectedTable": {"id": 1}}}
        }))
        .unwrap();
        assert!(matches!(command, SessionCommand::OpenModule { ref module_id, .. } if module_id == "tables"));

        let reorder: SessionCommand = serde_json::from_value(json!({
            "type": "REORDER_TABS",
            "payload": {"sourceIndex": 0, "destinationIndex": 2}
        }))
        .unwrap();
        assert_eq!(
            reorder,
            SessionCommand::ReorderTabs {
                source_index: 0,
                destination_index: 2
            }
        );

        let dashboard: SessionCommand = serde_json::from_value(json!({"type": "GO_TO_DASHBOARD"})).unwrap();
        assert_eq!(dashboard, SessionCommand::GoToDashboard);
    }

    /// Drives a fixed pseudo-random command sequence and checks the
    /// invariants after every step.
    #[test]
    fn test_invariants_hold_across_random_walk() {
        let registry = test_registry();
        let ids_source = SequentialIds::default();
        let modules = ["pos", "tables", "orders", "ghost"];
        let mut state = SessionState::default();
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;

        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let pick = |n: usize| (seed as usize / 7) % n.max(1);
            let tab_id = state
                .tabs()
                .get(pick(state.tabs().len()))
                .map(|t| t.id.clone())
                .unwrap_or_else(|| "ghost".to_string());

            let command = match seed % 8 {
                0 | 1 => SessionCommand::OpenModule {
                    module_id: modules[pick(modules.len())].to_string(),
                    params: if seed % 3 == 0 { table((seed % 4) as u32, "T") } else { None },
                },
                2 => SessionCommand::CloseTab { tab_id },
                3 => SessionCommand::SwitchTab { tab_id },
                4 => SessionCommand::ReorderTabs {
                    source_index: pick(state.tabs().len() + 1),
                    destination_index: (seed as usize) % (state.tabs().len() + 1),
                },
                5 => SessionCommand::GoToDashboard,
                6 => SessionCommand::SetTabError {
                    tab_id,
                    error: "e".to_string(),
                },
                _ => SessionCommand::ClearTabError { tab_id },
            };

            state = reduce(&state, command, &registry, &ids_source).state;
            assert_eq!(state.check_invariants(), Ok(()));
            assert_eq!(state.history().len(), state.tabs().len());
        }
    }
}
