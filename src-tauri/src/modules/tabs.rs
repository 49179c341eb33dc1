// Tab reordering module - Pure logic + drag interaction + Tauri command
// Gestures on the tab strip become index-based ReorderTabs commands.

use crate::modules::session::Session;
use crate::settings::Settings;
use crate::state::{SessionState, Tab};

/// Pure logic for reordering tabs: removes the tab at `from` and reinserts it at `to`.
/// Returns true if the order changed; out-of-range indices leave `tabs` untouched.
pub fn move_tab(tabs: &mut Vec<Tab>, from: usize, to: usize) -> bool {
    if from >= tabs.len() || to >= tabs.len() {
        log::warn!(
            "[Reorder] Rejected move {} -> {} on {} tabs",
            from,
            to,
            tabs.len()
        );
        return false;
    }
    if from == to {
        return false;
    }

    let tab = tabs.remove(from);
    tabs.insert(to, tab);
    true
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn distance_to(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    Enter,
    Left,
    Right,
    Escape,
    Other,
}

/// Lightweight placeholder drawn under the pointer while dragging.
#[derive(Debug, Clone, PartialEq)]
pub struct DragOverlay {
    pub tab_id: String,
    pub title: String,
    /// Horizontal translation from the press point; the strip only moves along x.
    pub offset_x: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// Press and release without enough travel: the caller treats it as a click.
    Click(String),
    Reordered {
        source_index: usize,
        destination_index: usize,
    },
    Cancelled,
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
enum DragState {
    Idle,
    Pressed { tab_id: String, origin: Point },
    Pointer { tab_id: String, origin: Point, offset_x: f32 },
    Keyboard { tab_id: String, over: String },
}

#[derive(Debug)]
pub struct DragController {
    activation_distance: f32,
    state: DragState,
}

impl DragController {
    pub fn new(activation_distance: f32) -> Self {
        Self {
            activation_distance: activation_distance.max(0.0),
            state: DragState::Idle,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.drag_activation_distance)
    }

    /// Tab currently being dragged (pointer drags only count once activated).
    pub fn dragged_tab_id(&self) -> Option<&str> {
        match &self.state {
            DragState::Pointer { tab_id, .. } | DragState::Keyboard { tab_id, .. } => {
                Some(tab_id.as_str())
            }
            DragState::Idle | DragState::Pressed { .. } => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragged_tab_id().is_some()
    }

    pub fn pointer_down(&mut self, tab_id: &str, at: Point) {
        if matches!(self.state, DragState::Idle) {
            self.state = DragState::Pressed {
                tab_id: tab_id.to_string(),
                origin: at,
            };
        }
    }

    /// Returns true while a drag is in progress.
    pub fn pointer_move(&mut self, at: Point) -> bool {
        match &mut self.state {
            DragState::Pressed { tab_id, origin } => {
                if origin.distance_to(at) >= self.activation_distance {
                    log::debug!("[Reorder] Drag started on '{}'", tab_id);
                    self.state = DragState::Pointer {
                        tab_id: std::mem::take(tab_id),
                        origin: *origin,
                        offset_x: at.x - origin.x,
                    };
                    true
                } else {
                    false
                }
            }
            DragState::Pointer {
                origin, offset_x, ..
            } => {
                *offset_x = at.x - origin.x;
                true
            }
            DragState::Idle | DragState::Keyboard { .. } => false,
        }
    }

    /// Release over `over` (the tab under the pointer, if any).
    pub fn pointer_up(&mut self, over: Option<&str>, session: &Session) -> DropOutcome {
        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Pressed { tab_id, .. } => DropOutcome::Click(tab_id),
            DragState::Pointer { tab_id, .. } => match over {
                Some(target) => drop_on(&tab_id, target, session),
                None => DropOutcome::Cancelled,
            },
            other => {
                self.state = other;
                DropOutcome::Ignored
            }
        }
    }

    /// Keyboard sensor: Space/Enter picks up `focused`, Left/Right move the
    /// drop target, Space/Enter drops, Escape cancels.
    pub fn key_down(&mut self, focused: &str, key: Key, session: &Session) -> DropOutcome {
        if key == Key::Escape {
            if self.is_dragging() {
                self.cancel();
                return DropOutcome::Cancelled;
            }
            return DropOutcome::Ignored;
        }

        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Idle => {
                if matches!(key, Key::Space | Key::Enter) && session.snapshot().tab(focused).is_some() {
                    self.state = DragState::Keyboard {
                        tab_id: focused.to_string(),
                        over: focused.to_string(),
                    };
                }
                DropOutcome::Ignored
            }
            DragState::Keyboard { tab_id, over } => match key {
                Key::Space | Key::Enter => drop_on(&tab_id, &over, session),
                _ => {
                    let over = neighbour(&session.snapshot(), &over, key).unwrap_or(over);
                    self.state = DragState::Keyboard { tab_id, over };
                    DropOutcome::Ignored
                }
            },
            other => {
                self.state = other;
                DropOutcome::Ignored
            }
        }
    }

    /// Aborts any gesture without reordering.
    pub fn cancel(&mut self) {
        if let Some(tab_id) = self.dragged_tab_id() {
            log::debug!("[Reorder] Drag of '{}' cancelled", tab_id);
        }
        self.state = DragState::Idle;
    }

    pub fn overlay(&self, session: &SessionState) -> Option<DragOverlay> {
        let (tab_id, offset_x) = match &self.state {
            DragState::Pointer {
                tab_id, offset_x, ..
            } => (tab_id, *offset_x),
            DragState::Keyboard { tab_id, .. } => (tab_id, 0.0),
            DragState::Idle | DragState::Pressed { .. } => return None,
        };
        let tab = session.tab(tab_id)?;
        Some(DragOverlay {
            tab_id: tab.id.clone(),
            title: tab.title.clone(),
            offset_x,
        })
    }
}

/// Tab next to `id` in the direction of an arrow key.
fn neighbour(snapshot: &SessionState, id: &str, key: Key) -> Option<String> {
    let index = snapshot.tab_index(id)?;
    let next = match key {
        Key::Left => index.checked_sub(1)?,
        Key::Right => index + 1,
        _ => return None,
    };
    snapshot.tabs().get(next).map(|t| t.id.clone())
}

/// Resolves both positions against the current order and issues the reorder.
fn drop_on(tab_id: &str, target: &str, session: &Session) -> DropOutcome {
    if tab_id == target {
        return DropOutcome::Cancelled;
    }
    let snapshot = session.snapshot();
    match (snapshot.tab_index(tab_id), snapshot.tab_index(target)) {
        (Some(source_index), Some(destination_index)) => {
            session.reorder_tabs(source_index, destination_index);
            log::info!(
                "[Reorder] Moved '{}' from {} to {}",
                tab_id,
                source_index,
                destination_index
            );
            DropOutcome::Reordered {
                source_index,
                destination_index,
            }
        }
        _ => DropOutcome::Cancelled,
    }
}

/// Tauri command to reorder tabs by index
#[cfg(feature = "desktop")]
#[tauri::command]
pub fn reorder_tabs(
    app: tauri::AppHandle,
    state: tauri::State<crate::state::AppState>,
    source_index: usize,
    destination_index: usize,
) -> Result<(), String> {
    log::debug!("[Reorder] Received move {} -> {}", source_index, destination_index);

    if state.session.reorder_tabs(source_index, destination_index) {
        crate::commands::emit_tabs(&app, &state.session)?;
    } else {
        log::debug!("[Reorder] No change detected, skipping emit");
    }

    Ok(())
}
