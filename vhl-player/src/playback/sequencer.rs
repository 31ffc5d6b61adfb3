//! Highlight sequencer
//!
//! Keeps the media synchronized with a virtual timeline made of the selected
//! clips only. Media events are handled one at a time by the event pump;
//! each time update checks the current clip's end boundary and, when it is
//! reached, seeks to the next clip with a short crossfade.
//!
//! # State machine
//!
//! ```text
//!             play() / 0 clips            play() / >=1 clip
//!   Idle ─────────────────────▶ PlayingFull ──────────────▶ PlayingHighlights
//!    ▲  ◀──────── pause() ────────   │                         │      ▲
//!    │                               │             boundary +  │      │ ramp done
//!    │                                             next clip   ▼      │
//!    └────── last clip ended / pause() ◀──────────────── Transitioning
//! ```
//!
//! The clip list is derived from the transcript at every check, so selection
//! changes during playback take effect at the next boundary. When the current
//! clip is deselected, its remembered window still plays to its end; the
//! next clip is then the first remaining clip starting after it.

use crate::config::PlayerSettings;
use crate::media::MediaEvent;
use crate::playback::clock::ClockAdapter;
use crate::playback::fader::Fader;
use crate::playback::state::PlaybackState;
use crate::state::SharedState;
use crate::transcript::TranscriptModel;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::AbortHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, trace, warn};
use vhl_common::events::{EditorEvent, SequencerState};
use vhl_common::HighlightClip;

#[derive(Debug, Default)]
struct Control {
    state: SequencerState,

    /// Window of the clip being played; kept even if the clip is deselected
    current_clip: Option<HighlightClip>,

    clips_played: usize,

    /// Running fade-in ramp
    fade_task: Option<AbortHandle>,

    /// Bumped whenever a ramp starts or is cancelled; stale ramps stop
    ramp_generation: u64,
}

struct SequencerInner {
    transcript: Arc<RwLock<TranscriptModel>>,
    clock: ClockAdapter,
    shared: Arc<SharedState>,
    fader: Fader,
    fade_in_delay: Duration,
    fade_in_tick: Duration,
    control: Mutex<Control>,
}

/// Cloneable handle to the highlight sequencer
#[derive(Clone)]
pub struct HighlightSequencer {
    inner: Arc<SequencerInner>,
}

impl HighlightSequencer {
    pub fn new(
        transcript: Arc<RwLock<TranscriptModel>>,
        clock: ClockAdapter,
        shared: Arc<SharedState>,
        settings: &PlayerSettings,
    ) -> Self {
        Self {
            inner: Arc::new(SequencerInner {
                transcript,
                clock,
                shared,
                fader: Fader::from_settings(settings),
                fade_in_delay: settings.fade_in_delay,
                fade_in_tick: settings.fade_in_tick,
                control: Mutex::new(Control::default()),
            }),
        }
    }

    pub fn clock(&self) -> &ClockAdapter {
        &self.inner.clock
    }

    pub fn transcript(&self) -> &Arc<RwLock<TranscriptModel>> {
        &self.inner.transcript
    }

    pub async fn state(&self) -> SequencerState {
        self.inner.control.lock().await.state
    }

    pub async fn current_clip(&self) -> Option<HighlightClip> {
        self.inner.control.lock().await.current_clip.clone()
    }

    pub async fn playback_state(&self) -> PlaybackState {
        self.inner.clock.snapshot().await
    }

    pub async fn is_fading_in(&self) -> bool {
        self.inner.control.lock().await.fade_task.is_some()
    }

    /// Start playback
    ///
    /// With no selected clips the whole media plays from the current
    /// position. Otherwise highlight playback starts at the first clip. A
    /// highlight session suspended by an outside pause resumes in place.
    pub async fn play(&self) -> bool {
        let clock = &self.inner.clock;
        let Some(media) = clock.media().await else {
            debug!("play() ignored: no media attached");
            return false;
        };

        let clips = self.inner.transcript.read().await.highlight_clips();
        let mut control = self.inner.control.lock().await;

        if control.state.is_highlight_mode() {
            if media.is_paused() {
                debug!("Resuming highlight playback");
                clock.play().await;
            }
            return true;
        }

        self.cancel_fade(&mut control);
        clock.set_volume(1.0).await;

        let Some(first) = clips.first().cloned() else {
            clock.set_highlight_playback(false, None).await;
            clock.play().await;
            self.transition(&mut control, SequencerState::PlayingFull);
            return true;
        };

        info!(
            "Starting highlight playback: {} clips, first {} at {:.2}s",
            clips.len(),
            first.id,
            first.start
        );
        clock.set_highlight_playback(true, Some(0)).await;
        clock.seek(first.start).await;
        clock.play().await;

        control.clips_played = 1;
        control.current_clip = Some(first.clone());
        self.transition(&mut control, SequencerState::PlayingHighlights);
        self.inner.shared.broadcast_event(EditorEvent::ClipStarted {
            clip_index: 0,
            clip_id: first.id,
            start: first.start,
            timestamp: Utc::now(),
        });
        true
    }

    /// Pause from any state
    ///
    /// Clears highlight mode, cancels a running fade and the pending seek
    /// request, and restores full volume.
    pub async fn pause(&self) -> bool {
        let clock = &self.inner.clock;
        if !clock.is_attached().await {
            debug!("pause() ignored: no media attached");
            return false;
        }

        let mut control = self.inner.control.lock().await;
        self.cancel_fade(&mut control);
        clock.cancel_seek_request().await;
        clock.pause().await;
        clock.set_volume(1.0).await;
        clock.set_highlight_playback(false, None).await;
        control.current_clip = None;
        self.transition(&mut control, SequencerState::Idle);
        true
    }

    /// Seek to the start of the sentence before the one playing
    pub async fn previous(&self) -> bool {
        let Some(time) = self.inner.clock.media_time().await else {
            return false;
        };
        let target = self
            .inner
            .transcript
            .read()
            .await
            .previous_sentence(time)
            .map(|s| s.start());
        match target {
            Some(start) => self.inner.clock.seek(start).await,
            None => false,
        }
    }

    /// Seek to the start of the sentence after the one playing
    pub async fn next(&self) -> bool {
        let Some(time) = self.inner.clock.media_time().await else {
            return false;
        };
        let target = self
            .inner
            .transcript
            .read()
            .await
            .next_sentence(time)
            .map(|s| s.start());
        match target {
            Some(start) => self.inner.clock.seek(start).await,
            None => false,
        }
    }

    pub async fn can_go_previous(&self) -> bool {
        let Some(time) = self.inner.clock.media_time().await else {
            return false;
        };
        self.inner
            .transcript
            .read()
            .await
            .previous_sentence(time)
            .is_some()
    }

    pub async fn can_go_next(&self) -> bool {
        let Some(time) = self.inner.clock.media_time().await else {
            return false;
        };
        self.inner.transcript.read().await.next_sentence(time).is_some()
    }

    /// Return to Idle without touching the media
    ///
    /// Used when the source switches or the project resets.
    pub async fn reset(&self) {
        let mut control = self.inner.control.lock().await;
        self.cancel_fade(&mut control);
        control.current_clip = None;
        control.clips_played = 0;
        self.inner.clock.set_highlight_playback(false, None).await;
        self.inner.clock.set_volume(1.0).await;
        self.transition(&mut control, SequencerState::Idle);
    }

    /// Event pump: handle media events in arrival order until the channel closes
    pub async fn run(&self, mut events: mpsc::UnboundedReceiver<MediaEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_media_event(event).await;
        }
        debug!("Media event channel closed");
    }

    /// Handle one media event
    pub async fn handle_media_event(&self, event: MediaEvent) {
        match event {
            MediaEvent::TimeUpdate => self.on_time_update().await,
            MediaEvent::LoadedMetadata { duration } => {
                self.inner.clock.set_duration(duration).await;
            }
            MediaEvent::Play => self.on_external_play().await,
            MediaEvent::Pause => self.on_external_pause().await,
            MediaEvent::Ended => self.on_ended().await,
        }
    }

    async fn on_time_update(&self) {
        let clock = &self.inner.clock;
        let Some(media) = clock.media().await else {
            return;
        };

        {
            let mut control = self.inner.control.lock().await;
            if control.state.is_highlight_mode() && !media.is_paused() {
                let time = media.current_time();
                if time.is_finite() {
                    self.check_boundary(&mut control, time).await;
                }
            }
        }

        // Recorded after the boundary check so a jump never exposes the
        // position between two clips
        clock.record_time_update().await;
    }

    async fn check_boundary(&self, control: &mut Control, time: f64) {
        let Some(current) = control.current_clip.clone() else {
            return;
        };
        let clips = self.inner.transcript.read().await.highlight_clips();
        let position = clips.iter().position(|c| c.id == current.id);
        // A deselected clip has no index of its own; publish its successor's
        let successor = clips.iter().position(|c| c.start > current.start);
        self.inner
            .clock
            .set_current_clip_index(position.or(successor))
            .await;

        let remaining = current.time_until_end(time);
        if remaining > 0.0 {
            // The ramp owns the volume while transitioning
            if control.state == SequencerState::PlayingHighlights {
                if let Some(volume) = self.inner.fader.fade_out_volume(remaining) {
                    trace!("Fade-out {:.3} ({:.3}s left)", volume, remaining);
                    self.inner.clock.set_volume(volume).await;
                }
            }
            return;
        }

        let next = match position {
            Some(index) => clips.get(index + 1).cloned().map(|c| (index + 1, c)),
            None => {
                debug!("Current clip {} was deselected", current.id);
                successor.map(|i| (i, clips[i].clone()))
            }
        };

        match next {
            Some((index, clip)) => self.advance_to_clip(control, &current, index, clip).await,
            None => self.finish(control).await,
        }
    }

    async fn advance_to_clip(
        &self,
        control: &mut Control,
        from: &HighlightClip,
        index: usize,
        clip: HighlightClip,
    ) {
        let clock = &self.inner.clock;
        info!(
            "Clip transition {} -> {} (index {}, seek to {:.2}s)",
            from.id, clip.id, index, clip.start
        );

        self.cancel_fade(control);
        clock.set_volume(0.0).await;
        clock.set_current_clip_index(Some(index)).await;
        clock.seek(clip.start).await;

        self.inner.shared.broadcast_event(EditorEvent::ClipTransition {
            from_clip_id: from.id.clone(),
            to_clip_id: clip.id.clone(),
            to_index: index,
            timestamp: Utc::now(),
        });
        self.inner.shared.broadcast_event(EditorEvent::ClipStarted {
            clip_index: index,
            clip_id: clip.id.clone(),
            start: clip.start,
            timestamp: Utc::now(),
        });

        control.clips_played += 1;
        control.current_clip = Some(clip);
        self.transition(control, SequencerState::Transitioning);
        self.spawn_fade_in(control);
    }

    async fn finish(&self, control: &mut Control) {
        let clock = &self.inner.clock;
        info!(
            "Highlight playback finished after {} clips",
            control.clips_played
        );

        self.cancel_fade(control);
        clock.pause().await;
        clock.set_volume(1.0).await;
        clock.set_highlight_playback(false, None).await;

        self.inner
            .shared
            .broadcast_event(EditorEvent::HighlightsFinished {
                clips_played: control.clips_played,
                timestamp: Utc::now(),
            });
        control.current_clip = None;
        self.transition(control, SequencerState::Idle);
    }

    async fn on_external_play(&self) {
        let clock = &self.inner.clock;
        // Stale when the element was paused again or reloaded since
        match clock.media().await {
            Some(media) if !media.is_paused() => {}
            _ => return,
        }
        clock.set_playing(true).await;

        let mut control = self.inner.control.lock().await;
        if control.state == SequencerState::Idle {
            self.transition(&mut control, SequencerState::PlayingFull);
        }
    }

    async fn on_external_pause(&self) {
        let clock = &self.inner.clock;
        match clock.media().await {
            Some(media) if media.is_paused() => {}
            _ => return,
        }
        clock.set_playing(false).await;

        let mut control = self.inner.control.lock().await;
        match control.state {
            SequencerState::PlayingFull => {
                self.transition(&mut control, SequencerState::Idle);
            }
            SequencerState::Transitioning => {
                // Suspended mid-ramp: settle at full volume
                self.cancel_fade(&mut control);
                clock.set_volume(1.0).await;
                self.transition(&mut control, SequencerState::PlayingHighlights);
            }
            SequencerState::PlayingHighlights => {
                debug!("Highlight playback suspended by outside pause");
            }
            SequencerState::Idle => {}
        }
    }

    async fn on_ended(&self) {
        let clock = &self.inner.clock;
        // Stale when the element was seeked, restarted or reloaded since
        match clock.media().await {
            Some(media) if media.is_ended() => {}
            _ => {
                debug!("Ignoring stale Ended event");
                return;
            }
        }
        let mut control = self.inner.control.lock().await;
        self.cancel_fade(&mut control);
        clock.set_playing(false).await;
        clock.set_volume(1.0).await;

        if control.state.is_highlight_mode() {
            warn!("Media ended during highlight playback");
            self.inner
                .shared
                .broadcast_event(EditorEvent::HighlightsFinished {
                    clips_played: control.clips_played,
                    timestamp: Utc::now(),
                });
        }
        clock.set_highlight_playback(false, None).await;
        control.current_clip = None;
        self.transition(&mut control, SequencerState::Idle);
    }

    fn spawn_fade_in(&self, control: &mut Control) {
        control.ramp_generation += 1;
        let generation = control.ramp_generation;
        let sequencer = self.clone();
        let task = tokio::spawn(async move {
            sequencer.run_fade_in(generation).await;
        });
        control.fade_task = Some(task.abort_handle());
    }

    async fn run_fade_in(&self, generation: u64) {
        let fader = self.inner.fader;
        let tick = self.inner.fade_in_tick;
        tokio::time::sleep(self.inner.fade_in_delay).await;

        let mut ticker = interval_at(Instant::now() + tick, tick);
        for step in 1..=fader.fade_in_steps() {
            ticker.tick().await;
            let control = self.inner.control.lock().await;
            if control.ramp_generation != generation {
                return;
            }
            let volume = fader.fade_in_volume(step);
            trace!("Fade-in step {} volume {:.2}", step, volume);
            self.inner.clock.set_volume(volume).await;
        }

        let mut control = self.inner.control.lock().await;
        if control.ramp_generation != generation {
            return;
        }
        control.fade_task = None;
        self.inner.clock.set_volume(1.0).await;
        if control.state == SequencerState::Transitioning {
            self.transition(&mut control, SequencerState::PlayingHighlights);
        }
    }

    fn cancel_fade(&self, control: &mut Control) {
        control.ramp_generation += 1;
        if let Some(handle) = control.fade_task.take() {
            handle.abort();
            trace!("Fade-in ramp cancelled");
        }
    }

    fn transition(&self, control: &mut Control, new_state: SequencerState) {
        let old_state = control.state;
        if old_state == new_state {
            return;
        }
        control.state = new_state;
        debug!("Sequencer {} -> {}", old_state, new_state);
        self.inner
            .shared
            .broadcast_event(EditorEvent::PlaybackStateChanged {
                old_state,
                new_state,
                timestamp: Utc::now(),
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MediaElement, SimulatedMedia};
    use vhl_common::Sentence;

    async fn rig(sentences: Vec<Sentence>, selected: &[&str]) -> (HighlightSequencer, SimulatedMedia) {
        let shared = Arc::new(SharedState::new());
        let settings = PlayerSettings::default();
        let clock = ClockAdapter::new(shared.clone(), settings.seek_request_window);
        let media = SimulatedMedia::new(80.0);
        clock.attach(Arc::new(media.clone())).await;

        let mut model = TranscriptModel::new();
        let selected: Vec<String> = selected.iter().map(|s| s.to_string()).collect();
        model.load(sentences, &selected);

        let sequencer =
            HighlightSequencer::new(Arc::new(RwLock::new(model)), clock, shared, &settings);
        (sequencer, media)
    }

    fn two_clips() -> Vec<Sentence> {
        vec![
            Sentence::new("a", 0.0, 4.0, "a"),
            Sentence::new("b", 15.0, 19.0, "b"),
        ]
    }

    #[tokio::test]
    async fn test_no_media_is_noop() {
        let shared = Arc::new(SharedState::new());
        let settings = PlayerSettings::default();
        let clock = ClockAdapter::new(shared.clone(), settings.seek_request_window);
        let sequencer = HighlightSequencer::new(
            Arc::new(RwLock::new(TranscriptModel::new())),
            clock,
            shared,
            &settings,
        );

        assert!(!sequencer.play().await);
        assert!(!sequencer.pause().await);
        assert!(!sequencer.next().await);
        assert!(!sequencer.can_go_previous().await);
        assert_eq!(sequencer.state().await, SequencerState::Idle);
    }

    #[tokio::test]
    async fn test_play_without_clips_plays_full() {
        let (sequencer, media) = rig(two_clips(), &[]).await;
        media.set_current_time(7.0);

        assert!(sequencer.play().await);
        assert_eq!(sequencer.state().await, SequencerState::PlayingFull);
        assert!(!media.is_paused());
        assert_eq!(media.current_time(), 7.0);
        assert!(!sequencer.playback_state().await.is_playing_highlights);
    }

    #[tokio::test]
    async fn test_play_with_clips_seeks_to_first() {
        let (sequencer, media) = rig(two_clips(), &["a", "b"]).await;
        media.set_current_time(30.0);

        sequencer.play().await;
        let state = sequencer.playback_state().await;
        assert_eq!(media.current_time(), 0.0);
        assert!(state.is_playing_highlights);
        assert_eq!(state.current_clip_index, Some(0));
        assert_eq!(sequencer.current_clip().await.unwrap().id, "a");
    }

    #[tokio::test]
    async fn test_fade_out_inside_window_only() {
        let (sequencer, media) = rig(two_clips(), &["a", "b"]).await;
        sequencer.play().await;
        media.clear_history();

        media.advance_to(3.5);
        sequencer.handle_media_event(MediaEvent::TimeUpdate).await;
        assert!(media.volume_history().is_empty());

        media.advance_to(3.85);
        sequencer.handle_media_event(MediaEvent::TimeUpdate).await;
        assert!((media.volume() - 0.5).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_pause_clears_highlight_mode() {
        let (sequencer, media) = rig(two_clips(), &["a", "b"]).await;
        sequencer.play().await;
        sequencer.pause().await;

        let state = sequencer.playback_state().await;
        assert!(!state.is_playing);
        assert!(!state.is_playing_highlights);
        assert_eq!(state.seek_request, None);
        assert!(media.is_paused());
        assert_eq!(media.volume(), 1.0);
        assert_eq!(sequencer.state().await, SequencerState::Idle);
    }
}
