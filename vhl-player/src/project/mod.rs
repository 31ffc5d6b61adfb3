//! Project persistence shapes
//!
//! `PersistedProject` is the saved document (`video`, `transcript` with
//! `isSelected` flags, `sections`, `savedAt`). `ExportPayload` is the
//! one-shot export handed to downstream tools.

pub mod store;

pub use store::{JsonFileStore, MemoryStore, ProjectStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vhl_common::{HighlightClip, Section, TranscriptSentence};

/// Video reference stored with a project
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub duration: f64,
}

/// Saved project document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedProject {
    #[serde(default)]
    pub video: Option<VideoInfo>,
    #[serde(default)]
    pub transcript: Option<Vec<TranscriptSentence>>,
    #[serde(default)]
    pub sections: Option<Vec<Section>>,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl PersistedProject {
    /// Ids of sentences saved as selected, in storage order
    pub fn selected_ids(&self) -> Vec<String> {
        self.transcript
            .iter()
            .flatten()
            .filter(|s| s.is_selected)
            .map(|s| s.id().to_string())
            .collect()
    }
}

/// Export document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub video_url: Option<String>,
    pub transcript: Vec<TranscriptSentence>,
    pub sections: Vec<Section>,
    pub highlights: Vec<HighlightClip>,
    pub export_time: DateTime<Utc>,
}
