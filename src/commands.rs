use std::sync::Arc;

use tauri::Emitter;
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};
use tokio::sync::mpsc;

use crate::directory::DirectoryView;
use crate::error::DirectoryError;
use crate::events::{UiEvent, ViewSink};
use crate::AppMutex;

/// Name of the event carrying a fresh [`DirectoryView`] to the webview.
pub const VIEW_EVENT: &str = "directory-view";

/// Queue feeding the session's event loop.
pub struct EventSender(pub mpsc::Sender<UiEvent>);

// ─── Tauri commands ────────────────────────────────────────────────────────────

/// Forward one user interaction. Events are applied in the order they arrive.
#[tauri::command]
pub async fn dispatch_event(
    event: UiEvent,
    sender: tauri::State<'_, EventSender>,
) -> Result<(), String> {
    sender.0.send(event).await.map_err(|e| e.to_string())
}

/// Current view, for the first paint before any `directory-view` event.
#[tauri::command]
pub async fn get_view(state: tauri::State<'_, Arc<AppMutex>>) -> Result<DirectoryView, String> {
    Ok(state.lock().await.directory.view())
}

// ─── Presentation surface ──────────────────────────────────────────────────────

/// Pushes views to the webview and shows validation notices as dialogs.
pub struct WebviewSink {
    app: tauri::AppHandle,
}

impl WebviewSink {
    pub fn new(app: tauri::AppHandle) -> Self {
        Self { app }
    }
}

impl ViewSink for WebviewSink {
    fn publish(&self, view: &DirectoryView) {
        if let Err(e) = self.app.emit(VIEW_EVENT, view) {
            tracing::warn!("Failed to publish view: {e}");
        }
    }

    fn notify(&self, error: &DirectoryError) {
        self.app
            .dialog()
            .message(error.to_string())
            .kind(MessageDialogKind::Warning)
            .title("Business Directory")
            .show(|_| {});
    }
}

/// Runs for the lifetime of the window: initial load, then the event loop.
pub async fn start_session(
    state: Arc<AppMutex>,
    sink: WebviewSink,
    mut events: mpsc::Receiver<UiEvent>,
) {
    crate::controller::start(state, Arc::new(sink), &mut events).await;
}
