//! Transcript model
//!
//! Owns the loaded sentences with their selection flags and the section
//! groupings. Highlight clips are derived on every read from the selection
//! flags; nothing here caches a clip list that could go stale when a
//! selection changes mid-playback.

use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, warn};
use vhl_common::{HighlightClip, Section, Sentence, TranscriptSentence};

/// Issues found while loading sentences
///
/// Malformed sentences are kept (lookups fall back to first match in
/// storage order); duplicate ids are dropped so each sentence backs at most
/// one clip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Ids whose bounds are not finite with `start < end`
    pub malformed: Vec<String>,
    /// Adjacent pairs (storage order) whose time ranges overlap
    pub overlapping: Vec<(String, String)>,
    /// Ids that appeared more than once (later copies dropped)
    pub duplicates: Vec<String>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.malformed.is_empty() && self.overlapping.is_empty() && self.duplicates.is_empty()
    }
}

/// Ordered sentences with selection flags plus section groupings
#[derive(Debug, Clone, Default)]
pub struct TranscriptModel {
    sentences: Vec<TranscriptSentence>,
    sections: Vec<Section>,
}

impl TranscriptModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all sentences; a sentence is selected iff its id is suggested
    pub fn load(&mut self, sentences: Vec<Sentence>, suggested_highlights: &[String]) -> LoadReport {
        let suggested: HashSet<&str> = suggested_highlights.iter().map(String::as_str).collect();
        let mut seen: HashSet<String> = HashSet::with_capacity(sentences.len());
        let mut report = LoadReport::default();
        let mut loaded: Vec<TranscriptSentence> = Vec::with_capacity(sentences.len());

        for sentence in sentences {
            if !seen.insert(sentence.id.clone()) {
                report.duplicates.push(sentence.id);
                continue;
            }
            if !sentence.is_well_formed() {
                report.malformed.push(sentence.id.clone());
            }
            if let Some(prev) = loaded.last() {
                if sentence.start < prev.end() && prev.start() < sentence.end {
                    report
                        .overlapping
                        .push((prev.id().to_string(), sentence.id.clone()));
                }
            }
            let is_selected = suggested.contains(sentence.id.as_str());
            loaded.push(TranscriptSentence::new(sentence, is_selected));
        }

        if !report.is_clean() {
            warn!(
                "Transcript loaded with issues: {} malformed, {} overlapping, {} duplicate",
                report.malformed.len(),
                report.overlapping.len(),
                report.duplicates.len()
            );
        }

        self.sentences = loaded;
        debug!(
            "Loaded {} sentences ({} selected)",
            self.sentences.len(),
            self.selected_count()
        );
        report
    }

    /// Replace the section groupings
    pub fn set_sections(&mut self, sections: Vec<Section>) {
        self.sections = sections;
    }

    /// Drop sentences and sections
    pub fn clear(&mut self) {
        self.sentences.clear();
        self.sections.clear();
    }

    pub fn sentences(&self) -> &[TranscriptSentence] {
        &self.sentences
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// Flip the selection flag; returns the new flag, or None for unknown ids
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let sentence = self.sentences.iter_mut().find(|s| s.id() == id)?;
        sentence.is_selected = !sentence.is_selected;
        Some(sentence.is_selected)
    }

    /// Set the selection flag; returns false for unknown ids
    pub fn set_selected(&mut self, id: &str, selected: bool) -> bool {
        match self.sentences.iter_mut().find(|s| s.id() == id) {
            Some(sentence) => {
                sentence.is_selected = selected;
                true
            }
            None => false,
        }
    }

    /// Selected sentences in storage order
    pub fn selected_sentences(&self) -> Vec<&TranscriptSentence> {
        self.sentences.iter().filter(|s| s.is_selected).collect()
    }

    pub fn selected_count(&self) -> usize {
        self.sentences.iter().filter(|s| s.is_selected).count()
    }

    /// Selected sentences as clips, sorted ascending by start
    ///
    /// The sort is stable, so clips sharing a start keep storage order.
    pub fn highlight_clips(&self) -> Vec<HighlightClip> {
        let mut clips: Vec<HighlightClip> = self
            .sentences
            .iter()
            .filter(|s| s.is_selected)
            .map(HighlightClip::from)
            .collect();
        clips.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(Ordering::Equal));
        clips
    }

    /// Storage index of the first sentence whose `[start, end]` contains `time`
    pub fn index_at(&self, time: f64) -> Option<usize> {
        self.sentences.iter().position(|s| s.sentence.contains(time))
    }

    /// First sentence (storage order) whose `[start, end]` contains `time`
    pub fn sentence_at(&self, time: f64) -> Option<&TranscriptSentence> {
        self.index_at(time).map(|i| &self.sentences[i])
    }

    /// Text of the selected sentence playing at `time`, or empty
    pub fn active_subtitle(&self, time: f64) -> &str {
        self.sentences
            .iter()
            .find(|s| s.is_selected && s.sentence.contains(time))
            .map(|s| s.text())
            .unwrap_or("")
    }

    /// Sentence stored immediately before the one containing `time`
    pub fn previous_sentence(&self, time: f64) -> Option<&TranscriptSentence> {
        let index = self.index_at(time)?;
        index.checked_sub(1).map(|i| &self.sentences[i])
    }

    /// Sentence stored immediately after the one containing `time`
    pub fn next_sentence(&self, time: f64) -> Option<&TranscriptSentence> {
        let index = self.index_at(time)?;
        self.sentences.get(index + 1)
    }

    /// Sentences referenced by the named section, in storage order
    pub fn sentences_by_section(&self, title: &str) -> Vec<&TranscriptSentence> {
        let Some(section) = self.sections.iter().find(|s| s.title == title) else {
            return Vec::new();
        };
        let ids: HashSet<&str> = section.sentence_ids.iter().map(String::as_str).collect();
        self.sentences
            .iter()
            .filter(|s| ids.contains(s.id()))
            .collect()
    }
}
