//! Event types for the VHL event system
//!
//! Events replace the reactive change tracking of a UI store: every
//! observable mutation of transcript, clock or sequencer state is announced
//! on a broadcast channel and observers subscribe to what they render.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Highlight sequencer state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SequencerState {
    /// Nothing playing
    #[default]
    Idle,
    /// Whole media playing unmodified (no clips selected)
    PlayingFull,
    /// Playing selected clips in start order
    PlayingHighlights,
    /// Seeked to the next clip, volume ramp in progress
    Transitioning,
}

impl SequencerState {
    /// True while the sequencer owns the media position and volume
    pub fn is_highlight_mode(&self) -> bool {
        matches!(
            self,
            SequencerState::PlayingHighlights | SequencerState::Transitioning
        )
    }
}

impl std::fmt::Display for SequencerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SequencerState::Idle => write!(f, "idle"),
            SequencerState::PlayingFull => write!(f, "playing_full"),
            SequencerState::PlayingHighlights => write!(f, "playing_highlights"),
            SequencerState::Transitioning => write!(f, "transitioning"),
        }
    }
}

/// VHL event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EditorEvent {
    /// Sequencer moved between states
    PlaybackStateChanged {
        old_state: SequencerState,
        new_state: SequencerState,
        timestamp: DateTime<Utc>,
    },

    /// Highlight playback entered a clip
    ClipStarted {
        clip_index: usize,
        clip_id: String,
        start: f64,
        timestamp: DateTime<Utc>,
    },

    /// Clip boundary crossed, media jumped to the next clip
    ClipTransition {
        from_clip_id: String,
        to_clip_id: String,
        to_index: usize,
        timestamp: DateTime<Utc>,
    },

    /// Last clip ended, highlight playback stopped
    HighlightsFinished {
        clips_played: usize,
        timestamp: DateTime<Utc>,
    },

    /// Seek requested (validity window open)
    SeekRequested {
        time: f64,
        timestamp: DateTime<Utc>,
    },

    /// Seek request window expired
    SeekCleared {
        timestamp: DateTime<Utc>,
    },

    /// Media metadata reported a duration
    DurationChanged {
        duration: f64,
        timestamp: DateTime<Utc>,
    },

    /// Sentence selection flags changed
    SelectionChanged {
        sentence_id: String,
        is_selected: bool,
        selected_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Transcript replaced wholesale
    TranscriptLoaded {
        sentence_count: usize,
        section_count: usize,
        selected_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Project persisted
    ProjectSaved {
        saved_at: DateTime<Utc>,
    },

    /// Project restored from persistence
    ProjectLoaded {
        saved_at: Option<DateTime<Utc>>,
        timestamp: DateTime<Utc>,
    },

    /// All project state cleared
    ProjectReset {
        timestamp: DateTime<Utc>,
    },

    /// User-visible error (fetch or persistence fault)
    Error {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl EditorEvent {
    /// Event type name, matching the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            EditorEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            EditorEvent::ClipStarted { .. } => "ClipStarted",
            EditorEvent::ClipTransition { .. } => "ClipTransition",
            EditorEvent::HighlightsFinished { .. } => "HighlightsFinished",
            EditorEvent::SeekRequested { .. } => "SeekRequested",
            EditorEvent::SeekCleared { .. } => "SeekCleared",
            EditorEvent::DurationChanged { .. } => "DurationChanged",
            EditorEvent::SelectionChanged { .. } => "SelectionChanged",
            EditorEvent::TranscriptLoaded { .. } => "TranscriptLoaded",
            EditorEvent::ProjectSaved { .. } => "ProjectSaved",
            EditorEvent::ProjectLoaded { .. } => "ProjectLoaded",
            EditorEvent::ProjectReset { .. } => "ProjectReset",
            EditorEvent::Error { .. } => "Error",
        }
    }
}
