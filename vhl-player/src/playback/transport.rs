//! Transport controller
//!
//! User-facing play/pause/previous/next surface. Holds no state of its own;
//! every call is forwarded to the sequencer.

use crate::playback::sequencer::HighlightSequencer;
use tracing::debug;

#[derive(Clone)]
pub struct TransportController {
    sequencer: HighlightSequencer,
}

impl TransportController {
    pub fn new(sequencer: HighlightSequencer) -> Self {
        Self { sequencer }
    }

    pub async fn play(&self) -> bool {
        self.sequencer.play().await
    }

    pub async fn pause(&self) -> bool {
        self.sequencer.pause().await
    }

    /// Pause when playing, play otherwise
    pub async fn toggle_play(&self) -> bool {
        if self.sequencer.clock().is_playing().await {
            debug!("Transport toggle: pause");
            self.pause().await
        } else {
            debug!("Transport toggle: play");
            self.play().await
        }
    }

    pub async fn previous(&self) -> bool {
        self.sequencer.previous().await
    }

    pub async fn next(&self) -> bool {
        self.sequencer.next().await
    }

    pub async fn can_go_previous(&self) -> bool {
        self.sequencer.can_go_previous().await
    }

    pub async fn can_go_next(&self) -> bool {
        self.sequencer.can_go_next().await
    }
}
