use serde::Serialize;

/// Shown while a load is in flight.
pub const LOADING: &str = "Loading…";
/// Shown while an insert is in flight.
pub const SAVING: &str = "Saving…";
pub const REFRESHED: &str = "Directory refreshed.";
pub const CREATED: &str = "Business added.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub message: String,
}

/// Single-slot status banner. Each update replaces the previous message;
/// setting no message clears it.
#[derive(Debug, Default)]
pub struct StatusIndicator {
    current: Option<StatusMessage>,
}

impl StatusIndicator {
    pub fn set(&mut self, kind: StatusKind, message: Option<&str>) {
        self.current = message.map(|message| StatusMessage {
            kind,
            message: message.to_string(),
        });
    }

    pub fn info(&mut self, message: &str) {
        self.set(StatusKind::Info, Some(message));
    }

    pub fn error(&mut self, message: &str) {
        tracing::warn!("{message}");
        self.set(StatusKind::Error, Some(message));
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&StatusMessage> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_message_wins() {
        let mut status = StatusIndicator::default();
        status.info(LOADING);
        status.error("network timeout");
        let current = status.current().cloned();
        assert_eq!(
            current,
            Some(StatusMessage {
                kind: StatusKind::Error,
                message: "network timeout".to_string()
            })
        );
    }

    #[test]
    fn missing_message_clears() {
        let mut status = StatusIndicator::default();
        status.info(CREATED);
        status.set(StatusKind::Error, None);
        assert!(status.current().is_none());
        status.info(REFRESHED);
        status.clear();
        assert!(status.current().is_none());
    }
}
