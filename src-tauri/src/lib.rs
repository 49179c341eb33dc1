// Tabbed Shell library entry point.
// Session, tab and rendering logic is plain Rust and tested without a window;
// the `desktop` feature adds the Tauri shell around it.

pub mod error;
pub mod history;
pub mod registry;
pub mod settings;

// Shared state
pub mod state;

// Pure logic modules (no Tauri imports outside `desktop`-gated items)
pub mod modules;

#[cfg(feature = "desktop")]
pub mod commands;

pub use error::{Error, Result};

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use std::sync::{Arc, Mutex, RwLock};
    use tauri::Manager;

    use crate::modules::content::{ContentRegistry, RouteContent};
    use crate::modules::host::ContentHost;
    use crate::modules::session::Session;
    use crate::modules::tab_state::TabStateCache;
    use crate::settings::Settings;
    use crate::state::AppState;

    let result = tauri::Builder::default()
        .setup(|app| {
            if cfg!(debug_assertions) {
                app.handle().plugin(
                    tauri_plugin_log::Builder::default()
                        .level(log::LevelFilter::Info)
                        .build(),
                )?;
            }

            let settings_path = Settings::get_path(app.handle())?;
            let settings = Settings::load(&settings_path);
            let registry = Arc::new(settings.module_registry());
            log::info!("[Shell] Loaded {} modules", registry.len());

            // Every screen is drawn by the web front end from its route.
            let mut contents = ContentRegistry::new();
            for module in registry.iter() {
                contents.register(&module.id, RouteContent::boxed);
            }

            let cache = TabStateCache::new();
            let session = Arc::new(Session::new(Arc::clone(&registry), Arc::clone(&cache)));
            let mut host = ContentHost::new(Arc::clone(&session), Arc::clone(&cache), contents);
            host.apply_settings(&settings);

            app.manage(AppState {
                settings: Arc::new(RwLock::new(settings)),
                settings_path,
                registry,
                cache,
                session,
                host: Mutex::new(host),
            });
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::get_session,
            commands::list_modules,
            commands::dispatch,
            commands::open_module,
            commands::close_tab,
            commands::switch_tab,
            commands::go_to_dashboard,
            commands::clear_tab_error,
            commands::render_active_tab,
            commands::retry_active_tab,
            commands::get_tab_state,
            commands::set_tab_state,
            commands::get_settings,
            commands::save_settings,
            modules::tabs::reorder_tabs,
        ])
        .run(tauri::generate_context!());

    if let Err(e) = result {
        log::error!("[Shell] Error while running application: {}", e);
        std::process::exit(1);
    }
}
