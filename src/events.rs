use async_trait::async_trait;
use serde::Deserialize;

use crate::directory::DirectoryView;
use crate::error::DirectoryError;
use crate::popover::Placement;
use crate::render::CardKey;
use crate::types::FormFields;

/// How a card was activated. Only pointer, Enter and Space open the popover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Activation {
    Pointer,
    Enter,
    Space,
    #[serde(other)]
    OtherKey,
}

impl Activation {
    pub fn opens_popover(self) -> bool {
        !matches!(self, Activation::OtherKey)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Key {
    Escape,
    #[serde(other)]
    Other,
}

/// What a pointer-down landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointerTarget {
    Popover,
    Card(CardKey),
    Elsewhere,
}

/// Every user interaction the directory reacts to.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UiEvent {
    SearchInput { query: String },
    ToggleForm,
    OpenForm,
    /// Cancel button.
    CloseForm,
    ResetForm,
    FieldsChanged { fields: FormFields },
    Submit { fields: FormFields },
    Reload,
    CardActivated {
        key: CardKey,
        via: Activation,
        placement: Placement,
    },
    KeyPressed { key: Key },
    PointerDown { target: PointerTarget },
    ClosePopover,
    /// Scroll or resize while the popover is open.
    ViewportChanged { placement: Placement },
    ToggleTheme,
    SuggestLocation { text: String },
    ApplySuggestion,
}

impl UiEvent {
    /// Events that wait on a remote service. The event loop runs these
    /// off the input path so typing stays responsive.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            UiEvent::Submit { .. } | UiEvent::Reload | UiEvent::SuggestLocation { .. }
        )
    }
}

/// Produces interaction events in the order the user made them.
#[async_trait]
pub trait EventSource: Send {
    /// `None` once the surface is gone.
    async fn next_event(&mut self) -> Option<UiEvent>;
}

#[async_trait]
impl EventSource for tokio::sync::mpsc::Receiver<UiEvent> {
    async fn next_event(&mut self) -> Option<UiEvent> {
        self.recv().await
    }
}

/// The presentation surface. Receives a complete view after every change.
pub trait ViewSink: Send + Sync {
    fn publish(&self, view: &DirectoryView);

    /// Blocking notice for validation failures. Optional for surfaces that
    /// only show the status banner.
    fn notify(&self, _error: &DirectoryError) {}
}
