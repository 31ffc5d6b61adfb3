//! Shared event state
//!
//! Observer channel shared by the clock adapter, sequencer and editor.
//! Components announce mutations here instead of relying on reactive
//! tracking; UI collaborators subscribe and re-read what they render.

use tokio::sync::broadcast;
use vhl_common::events::EditorEvent;

/// Shared state accessible by all components
pub struct SharedState {
    /// Event broadcaster for observers
    event_tx: broadcast::Sender<EditorEvent>,
}

impl SharedState {
    /// Create new shared state
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self { event_tx }
    }

    /// Broadcast an event to all observers
    pub fn broadcast_event(&self, event: EditorEvent) {
        // Ignore send errors (no receivers is OK)
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to the event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<EditorEvent> {
        self.event_tx.subscribe()
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_broadcast_without_subscribers_is_ok() {
        let state = SharedState::new();
        state.broadcast_event(EditorEvent::SeekCleared {
            timestamp: Utc::now(),
        });
    }

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let state = SharedState::new();
        let mut rx = state.subscribe_events();

        state.broadcast_event(EditorEvent::SeekRequested {
            time: 12.5,
            timestamp: Utc::now(),
        });

        match rx.recv().await.unwrap() {
            EditorEvent::SeekRequested { time, .. } => assert_eq!(time, 12.5),
            other => panic!("Expected SeekRequested, got {:?}", other),
        }
    }
}
