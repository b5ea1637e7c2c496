pub mod autocomplete;
pub mod cache;
#[cfg(feature = "desktop")]
pub mod commands;
pub mod config;
pub mod controller;
pub mod directory;
pub mod error;
pub mod events;
pub mod filter;
pub mod form;
pub mod popover;
pub mod prefs;
pub mod render;
pub mod status;
pub mod store;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::autocomplete::{AddressAutocomplete, GeocoderAutocomplete};
use crate::config::StoreConfig;
use crate::directory::Directory;
use crate::error::DirectoryError;
use crate::store::{RecordStore, RestStore};
use crate::types::Theme;

/// All runtime state shared between the event loop and background store calls.
pub struct AppState {
    /// Record cache, query, rendered list and transient UI state.
    pub directory: Directory,
    /// Remote store client. `None` when credentials are missing.
    pub store: Option<Arc<dyn RecordStore>>,
    /// Optional address lookup. The app behaves the same without it.
    pub autocomplete: Option<Arc<dyn AddressAutocomplete>>,
    /// Where the theme preference is kept.
    pub prefs_path: Option<PathBuf>,
    /// Problem found while building the state, reported once by the initial load.
    pub startup_error: Option<DirectoryError>,
}

impl AppState {
    pub fn new(
        store: Option<Arc<dyn RecordStore>>,
        autocomplete: Option<Arc<dyn AddressAutocomplete>>,
        theme: Theme,
    ) -> Self {
        Self {
            directory: Directory::new(theme),
            store,
            autocomplete,
            prefs_path: None,
            startup_error: None,
        }
    }

    /// Build the state from environment configuration. Never fails: a missing
    /// or unusable store is recorded in `startup_error` for the first load to show.
    pub fn from_env(prefs_path: Option<PathBuf>, theme: Theme) -> Self {
        Self::from_lookup(|name| std::env::var(name).ok(), prefs_path, theme)
    }

    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        prefs_path: Option<PathBuf>,
        theme: Theme,
    ) -> Self {
        let mut startup_error = None;
        let store: Option<Arc<dyn RecordStore>> = match StoreConfig::from_lookup(&lookup) {
            Ok(config) => match RestStore::new(config) {
                Ok(store) => Some(Arc::new(store)),
                Err(e) => {
                    startup_error = Some(DirectoryError::Initialization(e.to_string()));
                    None
                }
            },
            Err(e) => {
                startup_error = Some(e);
                None
            }
        };

        let autocomplete = config::geocoder_url(&lookup).and_then(|url| {
            GeocoderAutocomplete::new(url)
                .map_err(|e| tracing::warn!("Address suggestions disabled: {e}"))
                .ok()
                .map(|geocoder| Arc::new(geocoder) as Arc<dyn AddressAutocomplete>)
        });

        Self {
            prefs_path,
            startup_error,
            ..Self::new(store, autocomplete, theme)
        }
    }
}

/// Type alias used by the controller, the event loop and the desktop commands.
pub type AppMutex = Mutex<AppState>;

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use tauri::Manager;

    // Only log WARN and above in production to avoid leaking record contents
    #[cfg(debug_assertions)]
    tracing_subscriber::fmt::init();
    #[cfg(not(debug_assertions))]
    tracing_subscriber::fmt().with_max_level(tracing::Level::WARN).init();

    config::load_dotenv();

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .invoke_handler(tauri::generate_handler![
            commands::dispatch_event,
            commands::get_view,
        ])
        .setup(|app| {
            let prefs_path = app
                .path()
                .app_config_dir()
                .ok()
                .map(|dir| dir.join("prefs.sqlite"));
            let system_prefers_dark = app
                .get_webview_window("main")
                .and_then(|window| window.theme().ok())
                .is_some_and(|theme| matches!(theme, tauri::Theme::Dark));
            let theme = prefs::load_theme(prefs_path.as_deref(), system_prefers_dark);

            let state = Arc::new(AppMutex::new(AppState::from_env(prefs_path, theme)));
            let (events, receiver) = tokio::sync::mpsc::channel(64);
            app.manage(state.clone());
            app.manage(commands::EventSender(events));

            let sink = commands::WebviewSink::new(app.handle().clone());
            tauri::async_runtime::spawn(commands::start_session(state, sink, receiver));
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
