//! Test helpers for vhl-player integration tests
//!
//! `TestRig` wires a transcript, clock, sequencer and transport around a
//! `SimulatedMedia`. Media events are pumped by hand (`drain`) so every
//! test controls exactly when the sequencer sees a time update.

#![allow(dead_code)]

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};
use vhl_common::events::{EditorEvent, SequencerState};
use vhl_common::Sentence;
use vhl_player::config::PlayerSettings;
use vhl_player::media::{MediaElement, MediaEvent, SimulatedMedia};
use vhl_player::playback::{ClockAdapter, HighlightSequencer, TransportController};
use vhl_player::transcript::TranscriptModel;
use vhl_player::SharedState;

pub const EPSILON: f64 = 1e-6;

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// Sentences from `(id, start, end)` triples; text is derived from the id
pub fn sentences(triples: &[(&str, f64, f64)]) -> Vec<Sentence> {
    triples.iter()
        .map(|(id, start, end)| Sentence::new(*id, *start, *end, format!("sentence {}", id)))
        .collect()
}

pub struct TestRig {
    pub media: SimulatedMedia,
    pub clock: ClockAdapter,
    pub sequencer: HighlightSequencer,
    pub transport: TransportController,
    pub transcript: Arc<RwLock<TranscriptModel>>,
    pub events: broadcast::Receiver<EditorEvent>,
    media_events: mpsc::UnboundedReceiver<MediaEvent>,
}

impl TestRig {
    /// Rig over an 80 s simulated video with `selected` ids highlighted
    pub async fn new(sentences: Vec<Sentence>, selected: &[&str]) -> Self {
        Self::with_settings(sentences, selected, PlayerSettings::default()).await
    }

    pub async fn with_settings(
        sentences: Vec<Sentence>,
        selected: &[&str],
        settings: PlayerSettings,
    ) -> Self {
        let shared = Arc::new(SharedState::new());
        let events = shared.subscribe_events();

        let media = SimulatedMedia::new(80.0);
        let media_events = media.subscribe();
        let clock = ClockAdapter::new(shared.clone(), settings.seek_request_window);
        clock.attach(Arc::new(media.clone())).await;

        let mut model = TranscriptModel::new();
        let selected: Vec<String> = selected.iter().map(|s| s.to_string()).collect();
        model.load(sentences, &selected);
        let transcript = Arc::new(RwLock::new(model));

        let sequencer =
            HighlightSequencer::new(transcript.clone(), clock.clone(), shared, &settings);
        let transport = TransportController::new(sequencer.clone());

        Self {
            media,
            clock,
            sequencer,
            transport,
            transcript,
            events,
            media_events,
        }
    }

    /// Hand every queued media event to the sequencer, in order
    pub async fn drain(&mut self) {
        while let Ok(event) = self.media_events.try_recv() {
            self.sequencer.handle_media_event(event).await;
        }
    }

    /// Move the playhead to `time` and process the resulting events
    pub async fn tick_at(&mut self, time: f64) {
        self.media.advance_to(time);
        self.drain().await;
    }

    pub async fn play(&mut self) {
        assert!(self.transport.play().await);
        self.drain().await;
    }

    pub async fn set_selected(&self, id: &str, selected: bool) {
        assert!(self.transcript.write().await.set_selected(id, selected));
    }

    pub async fn state(&self) -> SequencerState {
        self.sequencer.state().await
    }

    pub fn volume(&self) -> f64 {
        self.media.volume()
    }

    /// Editor events broadcast so far
    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        std::iter::from_fn(|| self.events.try_recv().ok()).collect()
    }
}

pub fn is_monotonic_non_decreasing(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] <= w[1] + EPSILON)
}
