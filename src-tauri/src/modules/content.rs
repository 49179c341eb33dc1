// Module content providers and the backend command seam.
//
// Each module kind registers one constructor. Constructors run only when a
// tab of that module becomes active, so modules never opened are never built.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::modules::tab_state::TabScope;
use crate::state::Tab;

/// Request/response executor owned by the host application
/// (e.g. "get_records", "save_record"). Only module content calls it.
pub trait CommandExecutor: Send + Sync {
    fn execute(&self, command: &str, args: Value) -> Result<Value>;
}

/// Executor for hosts without a backend: every command fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBackend;

impl CommandExecutor for NoBackend {
    fn execute(&self, command: &str, _args: Value) -> Result<Value> {
        Err(Error::Command {
            command: command.to_string(),
            message: "no backend attached".to_string(),
        })
    }
}

/// Everything a module's content may touch while it is mounted.
pub struct RenderContext<'a> {
    tab: &'a Tab,
    state: TabScope,
    backend: &'a dyn CommandExecutor,
}

impl<'a> RenderContext<'a> {
    pub fn new(tab: &'a Tab, state: TabScope, backend: &'a dyn CommandExecutor) -> Self {
        Self { tab, state, backend }
    }

    pub fn tab(&self) -> &Tab {
        self.tab
    }

    pub fn params(&self) -> Option<&Value> {
        self.tab.params.as_ref()
    }

    /// This tab's slice of the tab state cache.
    pub fn state(&self) -> &TabScope {
        &self.state
    }

    pub fn invoke(&self, command: &str, args: Value) -> Result<Value> {
        self.backend.execute(command, args)
    }

    pub fn invoke_as<T: DeserializeOwned>(&self, command: &str, args: Value) -> Result<T> {
        Ok(serde_json::from_value(self.invoke(command, args)?)?)
    }
}

/// A mounted module screen. `render` produces the view model handed to the
/// front end; returning `Err` or panicking trips the tab's fault boundary.
pub trait ModuleContent: Send {
    fn render(&mut self, ctx: &RenderContext<'_>) -> Result<Value>;

    /// Called before the content is dropped on deactivation.
    fn unmount(&mut self, _ctx: &RenderContext<'_>) {}
}

pub type Constructor = dyn Fn(&RenderContext<'_>) -> Result<Box<dyn ModuleContent>> + Send + Sync;

/// Module id to content constructor.
#[derive(Clone, Default)]
pub struct ContentRegistry {
    constructors: HashMap<String, Arc<Constructor>>,
}

impl ContentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, module_id: &str, constructor: F) -> &mut Self
    where
        F: Fn(&RenderContext<'_>) -> Result<Box<dyn ModuleContent>> + Send + Sync + 'static,
    {
        self.constructors
            .insert(module_id.to_string(), Arc::new(constructor));
        self
    }

    pub fn construct(&self, ctx: &RenderContext<'_>) -> Result<Box<dyn ModuleContent>> {
        let module_id = &ctx.tab().module_id;
        let constructor = self
            .constructors
            .get(module_id)
            .ok_or_else(|| Error::NoContent(module_id.clone()))?;
        log::debug!("[Host] Constructing content for tab '{}'", ctx.tab().id);
        constructor(ctx)
    }
}

/// Content for screens drawn entirely by the web front end: the view model is
/// the route plus the tab's params and cached state, so a remount restores it.
#[derive(Debug, Default)]
pub struct RouteContent;

impl RouteContent {
    pub fn boxed(_ctx: &RenderContext<'_>) -> Result<Box<dyn ModuleContent>> {
        Ok(Box::new(Self))
    }
}

impl ModuleContent for RouteContent {
    fn render(&mut self, ctx: &RenderContext<'_>) -> Result<Value> {
        Ok(serde_json::json!({
            "route": ctx.tab().path,
            "moduleId": ctx.tab().module_id,
            "params": ctx.params(),
            "state": ctx.state().full_state(),
        }))
    }
}
