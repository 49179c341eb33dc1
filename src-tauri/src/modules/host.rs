// Renders the session: the dashboard when no tab is active, otherwise the
// active tab's content inside its own fault boundary.
//
// Only the active tab is mounted. Switching away unmounts it; anything it
// needs on return must live in the tab state cache.

use serde::Serialize;
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::modules::boundary::{ErrorSink, Fault, FaultBoundary, RecoveryView, Stage};
use crate::modules::content::{CommandExecutor, ContentRegistry, ModuleContent, NoBackend, RenderContext};
use crate::modules::session::Session;
use crate::modules::tab_state::TabStateCache;
use crate::registry::ModuleColor;
use crate::settings::Settings;
use crate::state::SessionState;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Frame {
    Dashboard(DashboardView),
    #[serde(rename_all = "camelCase")]
    Module { tab_id: String, view: Value },
    #[serde(rename_all = "camelCase")]
    Recovery { tab_id: String, view: RecoveryView },
}

impl Frame {
    pub fn tab_id(&self) -> Option<&str> {
        match self {
            Frame::Dashboard(_) => None,
            Frame::Module { tab_id, .. } | Frame::Recovery { tab_id, .. } => Some(tab_id.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub tiles: Vec<ModuleTile>,
    pub open_tabs: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleTile {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: ModuleColor,
    pub is_main: bool,
}

struct Mount {
    tab_id: String,
    content: Option<Box<dyn ModuleContent>>,
    boundary: FaultBoundary,
}

pub struct ContentHost {
    session: Arc<Session>,
    cache: Arc<TabStateCache>,
    contents: ContentRegistry,
    backend: Arc<dyn CommandExecutor>,
    locale: String,
    show_error_details: bool,
    mounted: Option<Mount>,
}

impl ContentHost {
    pub fn new(session: Arc<Session>, cache: Arc<TabStateCache>, contents: ContentRegistry) -> Self {
        let defaults = Settings::default();
        Self {
            session,
            cache,
            contents,
            backend: Arc::new(NoBackend),
            locale: defaults.locale,
            show_error_details: defaults.show_error_details,
            mounted: None,
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn CommandExecutor>) -> Self {
        self.backend = backend;
        self
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.locale = settings.locale.clone();
        self.show_error_details = settings.show_error_details;
    }

    pub fn mounted_tab_id(&self) -> Option<&str> {
        self.mounted.as_ref().map(|m| m.tab_id.as_str())
    }

    /// Fault recorded by the mounted tab's boundary, if any.
    pub fn fault(&self) -> Option<&Fault> {
        self.mounted.as_ref().and_then(|m| m.boundary.fault())
    }

    pub fn render(&mut self) -> Frame {
        let snapshot = self.session.snapshot();
        let Some(tab) = snapshot.active_tab() else {
            self.unmount(&snapshot);
            return Frame::Dashboard(self.dashboard(&snapshot));
        };

        if self.mounted_tab_id() != Some(tab.id.as_str()) {
            self.unmount(&snapshot);
        }
        let sink = self.error_sink();
        let mount = self.mounted.get_or_insert_with(|| {
            log::debug!("[Host] Mounting tab '{}'", tab.id);
            Mount {
                tab_id: tab.id.clone(),
                content: None,
                boundary: FaultBoundary::new(&tab.id, sink),
            }
        });

        let ctx = RenderContext::new(tab, self.cache.scope(&tab.id), self.backend.as_ref());
        let contents = &self.contents;
        let show_details = self.show_error_details;
        let locale = self.locale.as_str();
        let recovery = |fault: Fault| Frame::Recovery {
            tab_id: tab.id.clone(),
            view: fault.recovery_view(show_details, locale),
        };

        let mut content = match mount.content.take() {
            Some(content) => content,
            None => match mount.boundary.run(Stage::Construct, || contents.construct(&ctx)) {
                Ok(content) => content,
                Err(fault) => return recovery(fault),
            },
        };

        // A failed content is dropped here; retry constructs it anew.
        match mount.boundary.run(Stage::Render, || content.render(&ctx)) {
            Ok(view) => {
                mount.content = Some(content);
                Frame::Module {
                    tab_id: tab.id.clone(),
                    view,
                }
            }
            Err(fault) => recovery(fault),
        }
    }

    /// Re-arms the mounted tab's boundary. The session-level error on the
    /// tab is left as is.
    pub fn retry(&mut self) -> bool {
        match self.mounted.as_mut() {
            Some(mount) if mount.boundary.has_fault() => {
                log::info!("[Host] Retrying tab '{}'", mount.tab_id);
                mount.boundary.retry();
                mount.content = None;
                true
            }
            _ => false,
        }
    }

    fn dashboard(&self, snapshot: &SessionState) -> DashboardView {
        DashboardView {
            tiles: self
                .session
                .registry()
                .iter()
                .map(|module| ModuleTile {
                    id: module.id.clone(),
                    name: module.display_name(&self.locale).to_string(),
                    description: module.description.clone(),
                    icon: module.icon.clone(),
                    color: module.color,
                    is_main: module.is_main,
                })
                .collect(),
            open_tabs: snapshot.tabs().len(),
        }
    }

    fn unmount(&mut self, snapshot: &SessionState) {
        let Some(mut mount) = self.mounted.take() else {
            return;
        };
        // Closed tabs are dropped without the hook; their cache entry is gone.
        if let (Some(content), Some(tab)) = (mount.content.as_mut(), snapshot.tab(&mount.tab_id)) {
            let ctx = RenderContext::new(tab, self.cache.scope(&tab.id), self.backend.as_ref());
            if catch_unwind(AssertUnwindSafe(|| content.unmount(&ctx))).is_err() {
                log::warn!("[Host] Unmount hook of tab '{}' panicked", mount.tab_id);
            }
        }
        log::debug!("[Host] Unmounted tab '{}'", mount.tab_id);
    }

    fn error_sink(&self) -> ErrorSink {
        let session = Arc::clone(&self.session);
        Arc::new(move |tab_id: &str, message: &str| {
            session.set_tab_error(tab_id, message);
        })
    }
}
