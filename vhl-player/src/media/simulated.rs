//! Simulated media element
//!
//! Deterministic stand-in for a real player: time only moves when the host
//! calls [`SimulatedMedia::advance`] or [`SimulatedMedia::advance_to`].
//! Used by the command-line demo and the test suites. Volume writes and
//! seeks are recorded so crossfade behaviour can be inspected afterwards.

use super::{MediaElement, MediaEvent};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::trace;

#[derive(Debug)]
struct SimState {
    current_time: f64,
    duration: f64,
    volume: f64,
    playback_rate: f64,
    paused: bool,
    ended: bool,
    source: Option<String>,
    volume_log: Vec<f64>,
    seek_log: Vec<f64>,
    events: Option<mpsc::UnboundedSender<MediaEvent>>,
}

impl SimState {
    fn emit(&self, event: MediaEvent) {
        if let Some(tx) = &self.events {
            // Receiver dropped means nobody is listening any more
            let _ = tx.send(event);
        }
    }
}

/// Cloneable handle to a simulated media element
#[derive(Debug, Clone)]
pub struct SimulatedMedia {
    inner: Arc<Mutex<SimState>>,
}

impl SimulatedMedia {
    /// Create a paused element with the given duration (seconds)
    pub fn new(duration: f64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimState {
                current_time: 0.0,
                duration: duration.max(0.0),
                volume: 1.0,
                playback_rate: 1.0,
                paused: true,
                ended: false,
                source: None,
                volume_log: Vec::new(),
                seek_log: Vec::new(),
                events: None,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Route element notifications to a new receiver (replaces any previous)
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<MediaEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state().events = Some(tx);
        rx
    }

    /// Advance playback by `seconds` of wall time (scaled by playback rate)
    pub fn advance(&self, seconds: f64) {
        let target = {
            let state = self.state();
            state.current_time + seconds * state.playback_rate
        };
        self.advance_to(target);
    }

    /// Move the playhead forward to `time` as if playback reached it
    ///
    /// Emits `TimeUpdate`; reaching the duration additionally pauses and
    /// emits `Pause` then `Ended`. No-op while paused.
    pub fn advance_to(&self, time: f64) {
        let mut state = self.state();
        if state.paused {
            return;
        }

        let clamped = if state.duration > 0.0 {
            time.clamp(0.0, state.duration)
        } else {
            time.max(0.0)
        };
        state.current_time = clamped;
        trace!("Simulated media at {:.3}s", clamped);
        state.emit(MediaEvent::TimeUpdate);

        if state.duration > 0.0 && clamped >= state.duration {
            state.paused = true;
            state.ended = true;
            state.emit(MediaEvent::Pause);
            state.emit(MediaEvent::Ended);
        }
    }

    /// Pause without a command, as a buffering stall would
    pub fn stall(&self) {
        let mut state = self.state();
        if !state.paused {
            state.paused = true;
            state.emit(MediaEvent::Pause);
        }
    }

    pub fn set_playback_rate(&self, rate: f64) {
        self.state().playback_rate = rate.max(0.0);
    }

    /// Every volume written through `set_volume`, in order
    pub fn volume_history(&self) -> Vec<f64> {
        self.state().volume_log.clone()
    }

    /// Every seek target written through `set_current_time`, in order
    pub fn seek_history(&self) -> Vec<f64> {
        self.state().seek_log.clone()
    }

    pub fn clear_history(&self) {
        let mut state = self.state();
        state.volume_log.clear();
        state.seek_log.clear();
    }

    pub fn source(&self) -> Option<String> {
        self.state().source.clone()
    }
}

impl MediaElement for SimulatedMedia {
    fn current_time(&self) -> f64 {
        self.state().current_time
    }

    fn set_current_time(&self, time: f64) {
        let mut state = self.state();
        let clamped = if state.duration > 0.0 {
            time.clamp(0.0, state.duration)
        } else {
            time.max(0.0)
        };
        state.current_time = clamped;
        state.ended = false;
        state.seek_log.push(clamped);
    }

    fn duration(&self) -> f64 {
        self.state().duration
    }

    fn volume(&self) -> f64 {
        self.state().volume
    }

    fn set_volume(&self, volume: f64) {
        let mut state = self.state();
        state.volume = volume.clamp(0.0, 1.0);
        let v = state.volume;
        state.volume_log.push(v);
    }

    fn playback_rate(&self) -> f64 {
        self.state().playback_rate
    }

    fn is_paused(&self) -> bool {
        self.state().paused
    }

    fn is_ended(&self) -> bool {
        let state = self.state();
        state.ended && state.paused
    }

    fn play(&self) {
        let mut state = self.state();
        if state.ended {
            // Playing an ended element restarts it
            state.current_time = 0.0;
            state.ended = false;
        }
        if state.paused {
            state.paused = false;
            state.emit(MediaEvent::Play);
        }
    }

    fn pause(&self) {
        let mut state = self.state();
        if !state.paused {
            state.paused = true;
            state.emit(MediaEvent::Pause);
        }
    }

    fn load(&self, url: &str) {
        let mut state = self.state();
        state.source = Some(url.to_string());
        state.current_time = 0.0;
        state.paused = true;
        state.ended = false;
        let duration = state.duration;
        state.emit(MediaEvent::LoadedMetadata { duration });
    }
}
