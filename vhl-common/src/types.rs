//! Transcript domain types
//!
//! Wire shapes follow the transcription backend and the persisted project
//! format: sentence fields are plain (`id`, `start`, `end`, `text`), the
//! selection flag is `isSelected`, and the fetch bundle uses camelCase keys.

use serde::{Deserialize, Serialize};

/// Atomic transcript unit with time bounds in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    pub id: String,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Sentence {
    pub fn new(id: impl Into<String>, start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            start,
            end,
            text: text.into(),
        }
    }

    /// True when `time` lies within `[start, end]` (both bounds inclusive)
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }

    /// Finite bounds with `start < end`
    pub fn is_well_formed(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.start < self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Titled grouping of sentence ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub sentence_ids: Vec<String>,
}

impl Section {
    pub fn new(title: impl Into<String>, sentence_ids: Vec<String>) -> Self {
        Self {
            title: title.into(),
            sentence_ids,
        }
    }
}

/// Sentence plus its selection flag, as owned by the transcript model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSentence {
    #[serde(flatten)]
    pub sentence: Sentence,

    #[serde(rename = "isSelected", default)]
    pub is_selected: bool,
}

impl TranscriptSentence {
    pub fn new(sentence: Sentence, is_selected: bool) -> Self {
        Self {
            sentence,
            is_selected,
        }
    }

    pub fn id(&self) -> &str {
        &self.sentence.id
    }

    pub fn start(&self) -> f64 {
        self.sentence.start
    }

    pub fn end(&self) -> f64 {
        self.sentence.end
    }

    pub fn text(&self) -> &str {
        &self.sentence.text
    }
}

/// Read-only projection of a selected sentence, the unit of highlight playback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightClip {
    pub id: String,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl HighlightClip {
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }

    /// Seconds remaining until the clip's end boundary (negative once past it)
    pub fn time_until_end(&self, time: f64) -> f64 {
        self.end - time
    }
}

impl From<&TranscriptSentence> for HighlightClip {
    fn from(s: &TranscriptSentence) -> Self {
        Self {
            id: s.sentence.id.clone(),
            start: s.sentence.start,
            end: s.sentence.end,
            text: s.sentence.text.clone(),
        }
    }
}

/// Result of the transcription backend for one video
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptBundle {
    pub full_transcript: Vec<Sentence>,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub suggested_highlights: Vec<String>,
}
