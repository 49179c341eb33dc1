// Session and tab logic. Nothing here touches Tauri except the
// `desktop`-gated command wrappers in `tabs`.
pub mod boundary;
pub mod content;
pub mod host;
pub mod naming;
pub mod session;
pub mod tab_state;
pub mod tabs;             // Tab bar reordering
