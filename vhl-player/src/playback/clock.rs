//! Playback clock adapter
//!
//! Wraps the injected media element and mirrors its position, duration and
//! play flags into [`PlaybackState`]. Every operation is a no-op while no
//! element is attached.
//!
//! Seeks go through a short-lived seek request: the target is published in
//! `seek_request` and cleared by a timer task once the validity window
//! expires. Issuing a new seek, switching source or resetting cancels the
//! pending expiry.

use crate::media::MediaElement;
use crate::playback::state::PlaybackState;
use crate::state::SharedState;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::AbortHandle;
use tracing::{debug, trace};
use vhl_common::events::EditorEvent;

#[derive(Default)]
struct SeekExpiry {
    handle: Option<AbortHandle>,
    generation: u64,
}

struct ClockInner {
    media: RwLock<Option<Arc<dyn MediaElement>>>,
    state: RwLock<PlaybackState>,
    video_url: RwLock<Option<String>>,
    seek_expiry: Mutex<SeekExpiry>,
    seek_window: Duration,
    shared: Arc<SharedState>,
}

/// Cloneable handle to the playback clock
#[derive(Clone)]
pub struct ClockAdapter {
    inner: Arc<ClockInner>,
}

impl ClockAdapter {
    pub fn new(shared: Arc<SharedState>, seek_window: Duration) -> Self {
        Self {
            inner: Arc::new(ClockInner {
                media: RwLock::new(None),
                state: RwLock::new(PlaybackState::default()),
                video_url: RwLock::new(None),
                seek_expiry: Mutex::new(SeekExpiry::default()),
                seek_window,
                shared,
            }),
        }
    }

    /// Attach a media element; picks up its duration if already known
    pub async fn attach(&self, media: Arc<dyn MediaElement>) {
        let duration = media.duration();
        let rate = media.playback_rate();
        *self.inner.media.write().await = Some(media);

        let mut state = self.inner.state.write().await;
        state.playback_rate = rate;
        if duration > 0.0 {
            state.duration = duration;
        }
        debug!("Media attached (duration {:.2}s)", duration);
    }

    /// Detach the media element; pending seek expiry is cancelled
    pub async fn detach(&self) {
        self.cancel_seek_request().await;
        *self.inner.media.write().await = None;
        self.inner.state.write().await.is_playing = false;
        debug!("Media detached");
    }

    pub async fn is_attached(&self) -> bool {
        self.inner.media.read().await.is_some()
    }

    pub async fn media(&self) -> Option<Arc<dyn MediaElement>> {
        self.inner.media.read().await.clone()
    }

    pub async fn snapshot(&self) -> PlaybackState {
        self.inner.state.read().await.clone()
    }

    /// Last recorded playback position
    pub async fn current_time(&self) -> f64 {
        self.inner.state.read().await.current_time
    }

    pub async fn duration(&self) -> f64 {
        self.inner.state.read().await.duration
    }

    pub async fn is_playing(&self) -> bool {
        self.inner.state.read().await.is_playing
    }

    /// Position read directly from the element
    pub async fn media_time(&self) -> Option<f64> {
        self.media().await.map(|m| m.current_time())
    }

    /// Copy the element's position into state; returns the recorded time
    pub async fn record_time_update(&self) -> Option<f64> {
        let media = self.media().await?;
        let time = media.current_time();
        if !time.is_finite() {
            return None;
        }
        trace!("timeupdate {:.3}s", time);
        self.inner.state.write().await.current_time = time;
        Some(time)
    }

    /// Metadata ready
    pub async fn set_duration(&self, duration: f64) {
        let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        self.inner.state.write().await.duration = duration;
        debug!("Duration set to {:.2}s", duration);
        self.inner.shared.broadcast_event(EditorEvent::DurationChanged {
            duration,
            timestamp: Utc::now(),
        });
    }

    pub async fn play(&self) -> bool {
        let Some(media) = self.media().await else {
            return false;
        };
        media.play();
        self.inner.state.write().await.is_playing = true;
        true
    }

    pub async fn pause(&self) -> bool {
        let Some(media) = self.media().await else {
            return false;
        };
        media.pause();
        self.inner.state.write().await.is_playing = false;
        true
    }

    pub async fn volume(&self) -> Option<f64> {
        self.media().await.map(|m| m.volume())
    }

    /// Set output volume, clamped to 0.0..=1.0
    pub async fn set_volume(&self, volume: f64) -> bool {
        let Some(media) = self.media().await else {
            return false;
        };
        let volume = if volume.is_finite() { volume.clamp(0.0, 1.0) } else { 1.0 };
        media.set_volume(volume);
        true
    }

    /// Jump to `time` through a seek request
    ///
    /// The target is clamped to `[0, duration]` (upper bound only once the
    /// duration is known). The recorded current time moves immediately so
    /// observers never see the pre-seek position after this returns.
    pub async fn seek(&self, time: f64) -> bool {
        let Some(media) = self.media().await else {
            return false;
        };
        if !time.is_finite() {
            return false;
        }

        let duration = media.duration();
        let target = if duration > 0.0 {
            time.clamp(0.0, duration)
        } else {
            time.max(0.0)
        };

        media.set_current_time(target);
        self.inner.state.write().await.current_time = target;
        self.open_seek_request(target).await;
        debug!("Seek requested to {:.3}s", target);
        self.inner.shared.broadcast_event(EditorEvent::SeekRequested {
            time: target,
            timestamp: Utc::now(),
        });
        true
    }

    async fn open_seek_request(&self, target: f64) {
        let mut expiry = self.inner.seek_expiry.lock().await;
        if let Some(handle) = expiry.handle.take() {
            handle.abort();
        }
        expiry.generation += 1;
        let generation = expiry.generation;
        self.inner.state.write().await.seek_request = Some(target);

        let clock = self.clone();
        let window = self.inner.seek_window;
        let task = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            clock.expire_seek_request(generation).await;
        });
        expiry.handle = Some(task.abort_handle());
    }

    async fn expire_seek_request(&self, generation: u64) {
        let mut expiry = self.inner.seek_expiry.lock().await;
        if expiry.generation != generation {
            return;
        }
        expiry.handle = None;
        self.inner.state.write().await.seek_request = None;
        trace!("Seek request expired");
        self.inner.shared.broadcast_event(EditorEvent::SeekCleared {
            timestamp: Utc::now(),
        });
    }

    /// Drop a pending seek request and its expiry timer
    pub async fn cancel_seek_request(&self) {
        let mut expiry = self.inner.seek_expiry.lock().await;
        if let Some(handle) = expiry.handle.take() {
            handle.abort();
        }
        expiry.generation += 1;
        self.inner.state.write().await.seek_request = None;
    }

    pub async fn has_pending_seek_expiry(&self) -> bool {
        self.inner.seek_expiry.lock().await.handle.is_some()
    }

    pub async fn set_playing(&self, playing: bool) {
        self.inner.state.write().await.is_playing = playing;
    }

    /// Set highlight mode and the current clip index together
    pub async fn set_highlight_playback(&self, playing_highlights: bool, index: Option<usize>) {
        let mut state = self.inner.state.write().await;
        state.is_playing_highlights = playing_highlights;
        state.current_clip_index = if playing_highlights { index } else { None };
    }

    pub async fn set_current_clip_index(&self, index: Option<usize>) {
        let mut state = self.inner.state.write().await;
        if state.is_playing_highlights {
            state.current_clip_index = index;
        }
    }

    /// Switch the media source
    ///
    /// Cancels the pending seek expiry and rewinds the recorded position.
    /// Duration is reported again by the element's metadata event.
    pub async fn set_source(&self, url: &str) {
        self.cancel_seek_request().await;
        *self.inner.video_url.write().await = Some(url.to_string());
        {
            let mut state = self.inner.state.write().await;
            state.current_time = 0.0;
            state.is_playing = false;
            state.is_playing_highlights = false;
            state.current_clip_index = None;
        }
        if let Some(media) = self.media().await {
            media.load(url);
        }
        debug!("Media source set to {}", url);
    }

    pub async fn video_url(&self) -> Option<String> {
        self.inner.video_url.read().await.clone()
    }

    /// Forget source and state; the element stays attached
    pub async fn reset(&self) {
        self.cancel_seek_request().await;
        *self.inner.video_url.write().await = None;
        *self.inner.state.write().await = PlaybackState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::SimulatedMedia;

    fn clock() -> ClockAdapter {
        ClockAdapter::new(Arc::new(SharedState::new()), Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_unattached_operations_are_noops() {
        let clock = clock();
        assert!(!clock.play().await);
        assert!(!clock.pause().await);
        assert!(!clock.seek(5.0).await);
        assert!(!clock.set_volume(0.5).await);
        assert_eq!(clock.volume().await, None);
        assert_eq!(clock.record_time_update().await, None);
        assert_eq!(clock.snapshot().await, PlaybackState::default());
    }

    #[tokio::test]
    async fn test_volume_is_clamped() {
        let clock = clock();
        let media = SimulatedMedia::new(60.0);
        clock.attach(Arc::new(media.clone())).await;

        clock.set_volume(3.0).await;
        assert_eq!(clock.volume().await, Some(1.0));
        clock.set_volume(-1.0).await;
        assert_eq!(clock.volume().await, Some(0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_request_expires() {
        let shared = Arc::new(SharedState::new());
        let mut rx = shared.subscribe_events();
        let clock = ClockAdapter::new(shared, Duration::from_millis(50));
        let media = SimulatedMedia::new(60.0);
        clock.attach(Arc::new(media.clone())).await;

        assert!(clock.seek(12.0).await);
        let state = clock.snapshot().await;
        assert_eq!(state.seek_request, Some(12.0));
        assert_eq!(state.current_time, 12.0);
        assert_eq!(media.current_time(), 12.0);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(clock.snapshot().await.seek_request, None);

        assert!(matches!(
            rx.recv().await.unwrap(),
            EditorEvent::SeekRequested { .. }
        ));
        assert!(matches!(
            rx.recv().await.unwrap(),
            EditorEvent::SeekCleared { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_seek_restarts_window() {
        let clock = clock();
        clock.attach(Arc::new(SimulatedMedia::new(60.0))).await;

        clock.seek(1.0).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        clock.seek(2.0).await;
        tokio::time::sleep(Duration::from_millis(40)).await;

        // First window would have expired by now; the second is still open
        assert_eq!(clock.snapshot().await.seek_request, Some(2.0));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(clock.snapshot().await.seek_request, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_source_cancels_seek_expiry() {
        let clock = clock();
        let media = SimulatedMedia::new(60.0);
        clock.attach(Arc::new(media.clone())).await;

        clock.seek(30.0).await;
        assert!(clock.has_pending_seek_expiry().await);

        clock.set_source("sim://other").await;
        assert!(!clock.has_pending_seek_expiry().await);
        let state = clock.snapshot().await;
        assert_eq!(state.seek_request, None);
        assert_eq!(state.current_time, 0.0);
        assert_eq!(media.source().as_deref(), Some("sim://other"));
        assert_eq!(clock.video_url().await.as_deref(), Some("sim://other"));
    }

    #[tokio::test]
    async fn test_seek_clamps_to_duration() {
        let clock = clock();
        clock.attach(Arc::new(SimulatedMedia::new(20.0))).await;

        clock.seek(99.0).await;
        assert_eq!(clock.current_time().await, 20.0);
        clock.seek(-5.0).await;
        assert_eq!(clock.current_time().await, 0.0);
    }

    #[tokio::test]
    async fn test_clip_index_only_in_highlight_mode() {
        let clock = clock();
        clock.set_current_clip_index(Some(2)).await;
        assert_eq!(clock.snapshot().await.current_clip_index, None);

        clock.set_highlight_playback(true, Some(0)).await;
        clock.set_current_clip_index(Some(1)).await;
        assert_eq!(clock.snapshot().await.current_clip_index, Some(1));

        clock.set_highlight_playback(false, Some(1)).await;
        assert_eq!(clock.snapshot().await.current_clip_index, None);
    }
}
