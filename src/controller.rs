//! Async operations over the shared [`AppState`].
//!
//! Each operation locks the state only to read or apply, never across a
//! store call, so input handled meanwhile sees the cache as it stood when
//! the call was issued.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::directory::{LoadTicket, LoadTrigger, SubmitOutcome};
use crate::error::DirectoryError;
use crate::events::{EventSource, Key, PointerTarget, UiEvent, ViewSink};
use crate::store::RecordStore;
use crate::types::FormFields;
use crate::AppMutex;

/// Start the session: kick off the initial load and handle events until the
/// source closes. A panic inside the initial load is reported as an
/// initialization failure as soon as it happens, while events keep flowing.
pub async fn start(state: Arc<AppMutex>, sink: Arc<dyn ViewSink>, source: &mut dyn EventSource) {
    let init = tokio::spawn({
        let state = state.clone();
        let sink = sink.clone();
        async move { startup_init(&state, sink.as_ref()).await }
    });
    let watcher = tokio::spawn({
        let state = state.clone();
        let sink = sink.clone();
        async move {
            if let Err(e) = init.await {
                tracing::error!("Initial load failed: {e}");
                let error = DirectoryError::Initialization(e.to_string());
                let mut s = state.lock().await;
                s.directory.report(&error);
                sink.publish(&s.directory.view());
            }
        }
    });

    run_event_loop(state, sink, source).await;

    if let Err(e) = watcher.await {
        tracing::error!("Startup watcher failed: {e}");
    }
}

/// Initial load. Missing configuration is shown once and nothing is fetched.
pub async fn startup_init(state: &AppMutex, sink: &dyn ViewSink) {
    {
        let mut s = state.lock().await;
        let error = match s.startup_error.take() {
            Some(error) => Some(error),
            None if s.store.is_none() => Some(DirectoryError::Configuration(
                "the record store is unavailable".to_string(),
            )),
            None => None,
        };
        if let Some(error) = error {
            s.directory.report(&error);
            sink.publish(&s.directory.view());
            return;
        }
    }
    // Errors are already on the status banner.
    let _ = load_all(state, sink, LoadTrigger::Startup).await;
}

/// Replace the cache with the store's current contents. Without a store
/// this does nothing: the configuration error was shown at startup.
pub async fn load_all(
    state: &AppMutex,
    sink: &dyn ViewSink,
    trigger: LoadTrigger,
) -> Result<(), DirectoryError> {
    let (store, ticket) = {
        let mut s = state.lock().await;
        let Some(store) = s.store.clone() else {
            tracing::debug!("Ignoring {trigger:?} load: no record store configured");
            return Ok(());
        };
        let ticket = s.directory.begin_load(trigger);
        sink.publish(&s.directory.view());
        (store, ticket)
    };
    complete_load(state, sink, store, ticket).await
}

async fn complete_load(
    state: &AppMutex,
    sink: &dyn ViewSink,
    store: Arc<dyn RecordStore>,
    ticket: LoadTicket,
) -> Result<(), DirectoryError> {
    let result = store.select_all().await;
    let mut s = state.lock().await;
    let outcome = s.directory.finish_load(ticket, result);
    sink.publish(&s.directory.view());
    outcome
}

/// Validate, insert and reconcile one form submission.
pub async fn submit(
    state: &AppMutex,
    sink: &dyn ViewSink,
    fields: FormFields,
) -> Result<(), DirectoryError> {
    let (store, record) = {
        let mut s = state.lock().await;
        let store = s.store.clone();
        let begun = s.directory.begin_submit(fields, store.is_some());
        sink.publish(&s.directory.view());
        match (begun, store) {
            (Ok(Some(record)), Some(store)) => (store, record),
            (Ok(_), _) => return Ok(()),
            (Err(e), _) => {
                if matches!(e, DirectoryError::Validation { .. }) {
                    sink.notify(&e);
                }
                return Err(e);
            }
        }
    };

    let result = store.insert(&record).await;

    let ticket = {
        let mut s = state.lock().await;
        let outcome = s.directory.finish_submit(result);
        sink.publish(&s.directory.view());
        match outcome? {
            SubmitOutcome::Created => return Ok(()),
            SubmitOutcome::Reload(ticket) => ticket,
        }
    };
    tracing::debug!("Insert confirmed without a row, reloading");
    complete_load(state, sink, store, ticket).await
}

/// Ask the optional geocoder for a location suggestion. Absence or failure
/// of the provider only means no suggestion. Answers that were overtaken by
/// a newer lookup or by a cleared form are dropped.
pub async fn suggest_location(state: &AppMutex, sink: &dyn ViewSink, text: String) {
    let (provider, ticket) = {
        let mut s = state.lock().await;
        let Some(provider) = s.autocomplete.clone() else {
            return;
        };
        (provider, s.directory.begin_suggestion(&text))
    };
    let suggestion = provider
        .suggest(&text)
        .await
        .map_err(|e| tracing::warn!("Address lookup failed: {e}"))
        .ok()
        .flatten();
    let mut s = state.lock().await;
    if s.directory.finish_suggestion(ticket, suggestion) {
        sink.publish(&s.directory.view());
    }
}

/// Apply one event and publish the resulting view.
pub async fn dispatch(
    state: &AppMutex,
    sink: &dyn ViewSink,
    event: UiEvent,
) -> Result<(), DirectoryError> {
    match event {
        UiEvent::Submit { fields } => return submit(state, sink, fields).await,
        UiEvent::Reload => return load_all(state, sink, LoadTrigger::Reload).await,
        UiEvent::SuggestLocation { text } => {
            suggest_location(state, sink, text).await;
            return Ok(());
        }
        _ => {}
    }

    let mut s = state.lock().await;
    match event {
        UiEvent::SearchInput { query } => s.directory.set_query(&query),
        UiEvent::ToggleForm => s.directory.toggle_form(),
        UiEvent::OpenForm => s.directory.open_form(),
        UiEvent::CloseForm => s.directory.close_form(),
        UiEvent::ResetForm => s.directory.reset_form(),
        UiEvent::FieldsChanged { fields } => s.directory.update_fields(fields),
        UiEvent::CardActivated { key, via, placement } => {
            if via.opens_popover() {
                s.directory.open_popover(key, placement);
            }
        }
        UiEvent::KeyPressed { key: Key::Escape } | UiEvent::ClosePopover => {
            s.directory.close_popover()
        }
        UiEvent::KeyPressed { key: Key::Other } => {}
        UiEvent::PointerDown { target } => {
            let inside = match target {
                PointerTarget::Popover => true,
                PointerTarget::Card(key) => s.directory.popover_anchor() == Some(key),
                PointerTarget::Elsewhere => false,
            };
            if !inside {
                s.directory.close_popover();
            }
        }
        UiEvent::ViewportChanged { placement } => s.directory.reposition_popover(placement),
        UiEvent::ToggleTheme => {
            let theme = s.directory.toggle_theme();
            crate::prefs::save_theme(s.prefs_path.as_deref(), theme);
        }
        UiEvent::ApplySuggestion => s.directory.apply_suggestion(),
        UiEvent::Submit { .. } | UiEvent::Reload | UiEvent::SuggestLocation { .. } => {}
    }
    sink.publish(&s.directory.view());
    Ok(())
}

/// Dispatch events in arrival order until the source closes. Remote events
/// run as background tasks; the loop waits for them before returning.
pub async fn run_event_loop(
    state: Arc<AppMutex>,
    sink: Arc<dyn ViewSink>,
    source: &mut dyn EventSource,
) {
    let mut in_flight = JoinSet::new();

    while let Some(event) = source.next_event().await {
        if event.is_remote() {
            let state = state.clone();
            let sink = sink.clone();
            in_flight.spawn(async move {
                if let Err(e) = dispatch(&state, sink.as_ref(), event).await {
                    tracing::debug!("{e}");
                }
            });
        } else if let Err(e) = dispatch(&state, sink.as_ref(), event).await {
            tracing::debug!("{e}");
        }

        while let Some(done) = in_flight.try_join_next() {
            if let Err(e) = done {
                tracing::error!("Background task failed: {e}");
            }
        }
    }

    while let Some(done) = in_flight.join_next().await {
        if let Err(e) = done {
            tracing::error!("Background task failed: {e}");
        }
    }
}
