//! Playback state snapshot

use serde::{Deserialize, Serialize};

/// Observable playback state owned by the clock adapter
///
/// `current_clip_index` is `Some` only while `is_playing_highlights` is true,
/// and then indexes the highlight clip list derived at the last check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub current_time: f64,
    pub duration: f64,
    pub is_playing: bool,
    pub is_playing_highlights: bool,
    pub current_clip_index: Option<usize>,
    /// Pending seek target, cleared when its validity window expires
    pub seek_request: Option<f64>,
    pub playback_rate: f64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            duration: 0.0,
            is_playing: false,
            is_playing_highlights: false,
            current_clip_index: None,
            seek_request: None,
            playback_rate: 1.0,
        }
    }
}

impl PlaybackState {
    /// Percent of the duration played, 0 when the duration is unknown
    pub fn progress_percent(&self) -> f64 {
        if self.duration > 0.0 {
            (self.current_time / self.duration * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}
