// Tauri commands for the tab bar and content pane.
// Every command that changes the session re-emits `update-tabs`.

use serde_json::Value;
use std::sync::Arc;
use tauri::{AppHandle, Emitter, State};

use crate::modules::host::Frame;
use crate::modules::session::{Session, SessionCommand};
use crate::registry::ModuleDescriptor;
use crate::settings::Settings;
use crate::state::{AppState, SessionState};

pub const UPDATE_TABS_EVENT: &str = "update-tabs";

/// Broadcasts the current tab bar to the front end.
pub fn emit_tabs(app: &AppHandle, session: &Session) -> Result<(), String> {
    let snapshot = session.snapshot();
    app.emit(UPDATE_TABS_EVENT, snapshot.tabs_update())
        .map_err(|e| e.to_string())
}

fn emit_if_changed(app: &AppHandle, session: &Session, changed: bool) -> Result<bool, String> {
    if changed {
        emit_tabs(app, session)?;
    }
    Ok(changed)
}

#[tauri::command]
pub fn get_session(state: State<'_, AppState>) -> SessionState {
    state.session.snapshot().as_ref().clone()
}

#[tauri::command]
pub fn list_modules(state: State<'_, AppState>) -> Vec<ModuleDescriptor> {
    state.registry.iter().cloned().collect()
}

#[tauri::command]
pub fn dispatch(
    app: AppHandle,
    state: State<'_, AppState>,
    command: SessionCommand,
) -> Result<bool, String> {
    log::debug!("[Session] UI dispatched {:?}", command);
    let changed = state.session.dispatch(command);
    emit_if_changed(&app, &state.session, changed)
}

#[tauri::command]
pub fn open_module(
    app: AppHandle,
    state: State<'_, AppState>,
    module_id: String,
    params: Option<Value>,
) -> Result<bool, String> {
    let changed = state.session.open_module(&module_id, params);
    emit_if_changed(&app, &state.session, changed)
}

#[tauri::command]
pub fn close_tab(app: AppHandle, state: State<'_, AppState>, tab_id: String) -> Result<bool, String> {
    let changed = state.session.close_tab(&tab_id);
    emit_if_changed(&app, &state.session, changed)
}

#[tauri::command]
pub fn switch_tab(app: AppHandle, state: State<'_, AppState>, tab_id: String) -> Result<bool, String> {
    let changed = state.session.switch_tab(&tab_id);
    emit_if_changed(&app, &state.session, changed)
}

#[tauri::command]
pub fn go_to_dashboard(app: AppHandle, state: State<'_, AppState>) -> Result<bool, String> {
    let changed = state.session.go_to_dashboard();
    emit_if_changed(&app, &state.session, changed)
}

#[tauri::command]
pub fn clear_tab_error(app: AppHandle, state: State<'_, AppState>, tab_id: String) -> Result<bool, String> {
    let changed = state.session.clear_tab_error(&tab_id);
    emit_if_changed(&app, &state.session, changed)
}

/// Renders the dashboard or the active tab. A fault caught while rendering
/// marks the tab, so the tab bar is re-emitted when the session moved.
#[tauri::command]
pub fn render_active_tab(app: AppHandle, state: State<'_, AppState>) -> Result<Frame, String> {
    let before = state.session.snapshot();
    let frame = {
        let mut host = state.host.lock().map_err(|e| e.to_string())?;
        host.render()
    };
    let changed = !Arc::ptr_eq(&before, &state.session.snapshot());
    emit_if_changed(&app, &state.session, changed)?;
    Ok(frame)
}

#[tauri::command]
pub fn retry_active_tab(state: State<'_, AppState>) -> Result<bool, String> {
    let mut host = state.host.lock().map_err(|e| e.to_string())?;
    Ok(host.retry())
}

/// One key of a tab's cached state, or the whole map when `key` is absent.
#[tauri::command]
pub fn get_tab_state(state: State<'_, AppState>, tab_id: String, key: Option<String>) -> Result<Value, String> {
    match key {
        Some(key) => Ok(state.cache.get_state(&tab_id, &key).unwrap_or(Value::Null)),
        None => serde_json::to_value(state.cache.get_full_state(&tab_id)).map_err(|e| e.to_string()),
    }
}

/// Rejects ids that are not open, so a stale front end cannot revive a
/// closed tab's entry.
#[tauri::command]
pub fn set_tab_state(
    state: State<'_, AppState>,
    tab_id: String,
    key: String,
    value: Value,
) -> Result<(), String> {
    if state.session.set_tab_state(&tab_id, &key, value) {
        Ok(())
    } else {
        Err(format!("tab `{}` is not open", tab_id))
    }
}

#[tauri::command]
pub fn get_settings(state: State<'_, AppState>) -> Result<Settings, String> {
    let settings = state.settings.read().map_err(|e| e.to_string())?;
    Ok(settings.clone())
}

/// Persists `settings` and applies locale and error-detail changes to the
/// content host. A changed module file takes effect on next launch.
#[tauri::command]
pub fn save_settings(state: State<'_, AppState>, settings: Settings) -> Result<(), String> {
    settings
        .save(&state.settings_path)
        .map_err(|e| e.to_string())?;
    state
        .host
        .lock()
        .map_err(|e| e.to_string())?
        .apply_settings(&settings);
    *state.settings.write().map_err(|e| e.to_string())? = settings;
    log::info!("[Settings] Saved to {}", state.settings_path.display());
    Ok(())
}
