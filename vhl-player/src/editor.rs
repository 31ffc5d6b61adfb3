//! Editor application state
//!
//! Façade tying the transcript model, the playback clock, the highlight
//! sequencer and the project store together. Holds the user-visible status
//! (loading flag, last error, last save time), runs the media event pump and
//! debounces auto-save after selection changes.
//!
//! Fetch and persistence faults never propagate out of the editor: they are
//! recorded in `error`, announced as `EditorEvent::Error`, and leave the
//! previous state untouched.

use crate::autosave::AutoSaveTimer;
use crate::config::PlayerSettings;
use crate::error::Error;
use crate::fetch::{FetchState, TranscriptSource};
use crate::media::{MediaElement, MediaEvent};
use crate::playback::{ClockAdapter, HighlightSequencer, PlaybackState, TransportController};
use crate::project::{ExportPayload, PersistedProject, ProjectStore, VideoInfo};
use crate::state::SharedState;
use crate::transcript::{LoadReport, TranscriptModel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use vhl_common::events::EditorEvent;
use vhl_common::TranscriptBundle;

/// Overall readiness of the project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    NoVideo,
    NoTranscript,
    NoSelection,
    Ready,
}

/// User-visible editor status
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorStatus {
    pub is_loading: bool,
    pub error: Option<String>,
    pub last_save_time: Option<DateTime<Utc>>,
}

struct EditorInner {
    shared: Arc<SharedState>,
    transcript: Arc<RwLock<TranscriptModel>>,
    clock: ClockAdapter,
    sequencer: HighlightSequencer,
    transport: TransportController,
    store: Arc<dyn ProjectStore>,
    autosave: AutoSaveTimer,
    status: RwLock<EditorStatus>,
    fetch_state: RwLock<Option<FetchState>>,
    last_video_id: RwLock<Option<String>>,
    pump: Mutex<Option<JoinHandle<()>>>,

    /// Bumped by `reset_project`; a save that straddles a reset leaves the
    /// status alone
    resets: AtomicU64,
}

/// Cloneable handle to the editor
#[derive(Clone)]
pub struct Editor {
    inner: Arc<EditorInner>,
}

impl Editor {
    pub fn new(settings: &PlayerSettings, store: Arc<dyn ProjectStore>) -> Self {
        let shared = Arc::new(SharedState::new());
        let transcript = Arc::new(RwLock::new(TranscriptModel::new()));
        let clock = ClockAdapter::new(shared.clone(), settings.seek_request_window);
        let sequencer =
            HighlightSequencer::new(transcript.clone(), clock.clone(), shared.clone(), settings);
        let transport = TransportController::new(sequencer.clone());

        Self {
            inner: Arc::new(EditorInner {
                shared,
                transcript,
                clock,
                sequencer,
                transport,
                store,
                autosave: AutoSaveTimer::new(settings.autosave_delay),
                status: RwLock::new(EditorStatus::default()),
                fetch_state: RwLock::new(None),
                last_video_id: RwLock::new(None),
                pump: Mutex::new(None),
                resets: AtomicU64::new(0),
            }),
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<EditorEvent> {
        self.inner.shared.subscribe_events()
    }

    pub fn transport(&self) -> &TransportController {
        &self.inner.transport
    }

    pub fn sequencer(&self) -> &HighlightSequencer {
        &self.inner.sequencer
    }

    pub fn clock(&self) -> &ClockAdapter {
        &self.inner.clock
    }

    pub fn transcript(&self) -> &Arc<RwLock<TranscriptModel>> {
        &self.inner.transcript
    }

    // ---- Media ----

    /// Attach a media element and start pumping its events
    pub async fn attach_media(
        &self,
        media: Arc<dyn MediaElement>,
        events: mpsc::UnboundedReceiver<MediaEvent>,
    ) {
        self.inner.clock.attach(media).await;
        if let Some(url) = self.inner.clock.video_url().await {
            if let Some(media) = self.inner.clock.media().await {
                media.load(&url);
            }
        }
        self.spawn_event_pump(events).await;
    }

    /// Replace the running event pump
    pub async fn spawn_event_pump(&self, events: mpsc::UnboundedReceiver<MediaEvent>) {
        let sequencer = self.inner.sequencer.clone();
        let handle = tokio::spawn(async move {
            sequencer.run(events).await;
        });
        if let Some(previous) = self.inner.pump.lock().await.replace(handle) {
            previous.abort();
        }
    }

    pub async fn detach_media(&self) {
        self.inner.sequencer.reset().await;
        if let Some(pump) = self.inner.pump.lock().await.take() {
            pump.abort();
        }
        self.inner.clock.detach().await;
    }

    /// Switch the video source
    ///
    /// Highlight playback stops; pending fade and seek timers are cancelled.
    pub async fn set_video_url(&self, url: &str) {
        info!("Video source: {}", url);
        self.inner.sequencer.reset().await;
        self.inner.clock.set_source(url).await;
        self.maybe_schedule_autosave().await;
    }

    pub async fn seek_to(&self, time: f64) -> bool {
        self.inner.clock.seek(time).await
    }

    pub async fn playback_state(&self) -> PlaybackState {
        self.inner.clock.snapshot().await
    }

    /// Percent of the duration played
    pub async fn playback_progress(&self) -> f64 {
        self.inner.clock.snapshot().await.progress_percent()
    }

    /// Text of the selected sentence at the current time, or empty
    pub async fn subtitle(&self) -> String {
        let time = self.inner.clock.current_time().await;
        self.inner
            .transcript
            .read()
            .await
            .active_subtitle(time)
            .to_string()
    }

    // ---- Status ----

    pub async fn status(&self) -> EditorStatus {
        self.inner.status.read().await.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.status.read().await.is_loading
    }

    pub async fn error(&self) -> Option<String> {
        self.inner.status.read().await.error.clone()
    }

    pub async fn last_save_time(&self) -> Option<DateTime<Utc>> {
        self.inner.status.read().await.last_save_time
    }

    pub async fn project_status(&self) -> ProjectStatus {
        if self.inner.clock.video_url().await.is_none() {
            return ProjectStatus::NoVideo;
        }
        let transcript = self.inner.transcript.read().await;
        if transcript.is_empty() {
            ProjectStatus::NoTranscript
        } else if transcript.selected_count() == 0 {
            ProjectStatus::NoSelection
        } else {
            ProjectStatus::Ready
        }
    }

    async fn set_loading(&self, loading: bool) {
        self.inner.status.write().await.is_loading = loading;
    }

    async fn set_error(&self, message: Option<String>) {
        if let Some(message) = &message {
            self.inner.shared.broadcast_event(EditorEvent::Error {
                message: message.clone(),
                timestamp: Utc::now(),
            });
        }
        self.inner.status.write().await.error = message;
    }

    // ---- Transcript ----

    /// Replace the transcript with a fetched bundle
    pub async fn load_transcript(&self, bundle: TranscriptBundle) -> LoadReport {
        let TranscriptBundle {
            full_transcript,
            sections,
            suggested_highlights,
        } = bundle;

        let mut transcript = self.inner.transcript.write().await;
        let report = transcript.load(full_transcript, &suggested_highlights);
        transcript.set_sections(sections);
        self.announce_transcript(&transcript);
        report
    }

    fn announce_transcript(&self, transcript: &TranscriptModel) {
        info!(
            "Transcript loaded: {} sentences, {} sections, {} selected",
            transcript.len(),
            transcript.sections().len(),
            transcript.selected_count()
        );
        self.inner
            .shared
            .broadcast_event(EditorEvent::TranscriptLoaded {
                sentence_count: transcript.len(),
                section_count: transcript.sections().len(),
                selected_count: transcript.selected_count(),
                timestamp: Utc::now(),
            });
    }

    /// Fetch the transcript for `video_id` and load it
    ///
    /// On failure the current transcript is kept and the error is recorded.
    pub async fn load_video_data(&self, source: &dyn TranscriptSource, video_id: &str) -> FetchState {
        *self.inner.last_video_id.write().await = Some(video_id.to_string());
        *self.inner.fetch_state.write().await = Some(FetchState::Pending);
        self.set_loading(true).await;

        let state = match source.fetch(video_id).await {
            Ok(bundle) => {
                self.load_transcript(bundle.clone()).await;
                self.set_error(None).await;
                FetchState::Data(bundle)
            }
            Err(e) => {
                error!("Transcript fetch for {} failed: {}", video_id, e);
                let message = format!("Failed to load video data: {}", e);
                self.set_error(Some(message.clone())).await;
                FetchState::Error(message)
            }
        };

        self.set_loading(false).await;
        *self.inner.fetch_state.write().await = Some(state.clone());
        state
    }

    /// Fetch again for the last requested video id
    pub async fn refresh(&self, source: &dyn TranscriptSource) -> Option<FetchState> {
        let video_id = self.inner.last_video_id.read().await.clone()?;
        debug!("Refreshing transcript for {}", video_id);
        Some(self.load_video_data(source, &video_id).await)
    }

    pub async fn fetch_state(&self) -> Option<FetchState> {
        self.inner.fetch_state.read().await.clone()
    }

    /// Flip a sentence's selection; `None` for unknown ids
    pub async fn toggle_sentence(&self, id: &str) -> Option<bool> {
        let (is_selected, selected_count) = {
            let mut transcript = self.inner.transcript.write().await;
            let is_selected = transcript.toggle(id)?;
            (is_selected, transcript.selected_count())
        };
        self.selection_changed(id, is_selected, selected_count).await;
        Some(is_selected)
    }

    /// Set a sentence's selection; false for unknown ids
    pub async fn set_sentence_selected(&self, id: &str, selected: bool) -> bool {
        let selected_count = {
            let mut transcript = self.inner.transcript.write().await;
            if !transcript.set_selected(id, selected) {
                return false;
            }
            transcript.selected_count()
        };
        self.selection_changed(id, selected, selected_count).await;
        true
    }

    async fn selection_changed(&self, id: &str, is_selected: bool, selected_count: usize) {
        debug!(
            "Sentence {} {} ({} selected)",
            id,
            if is_selected { "selected" } else { "deselected" },
            selected_count
        );
        self.inner
            .shared
            .broadcast_event(EditorEvent::SelectionChanged {
                sentence_id: id.to_string(),
                is_selected,
                selected_count,
                timestamp: Utc::now(),
            });
        self.maybe_schedule_autosave().await;
    }

    async fn maybe_schedule_autosave(&self) {
        let has_video = self.inner.clock.video_url().await.is_some();
        let has_selection = self.inner.transcript.read().await.selected_count() > 0;
        if !(has_video && has_selection) {
            return;
        }

        let editor = self.clone();
        self.inner
            .autosave
            .schedule(async move {
                debug!("Auto-saving project");
                editor.save_project().await;
            })
            .await;
    }

    pub async fn autosave_pending(&self) -> bool {
        self.inner.autosave.is_pending().await
    }

    // ---- Project ----

    pub async fn export_data(&self) -> ExportPayload {
        let transcript = self.inner.transcript.read().await;
        ExportPayload {
            video_url: self.inner.clock.video_url().await,
            transcript: transcript.sentences().to_vec(),
            sections: transcript.sections().to_vec(),
            highlights: transcript.highlight_clips(),
            export_time: Utc::now(),
        }
    }

    async fn snapshot_project(&self, saved_at: DateTime<Utc>) -> PersistedProject {
        let transcript = self.inner.transcript.read().await;
        PersistedProject {
            video: Some(VideoInfo {
                url: self.inner.clock.video_url().await,
                duration: self.inner.clock.duration().await,
            }),
            transcript: Some(transcript.sentences().to_vec()),
            sections: Some(transcript.sections().to_vec()),
            saved_at: Some(saved_at),
        }
    }

    /// Persist the project; failures set the error flag
    pub async fn save_project(&self) -> bool {
        let epoch = self.inner.resets.load(Ordering::SeqCst);
        self.set_loading(true).await;
        self.set_error(None).await;

        let saved_at = Utc::now();
        let project = self.snapshot_project(saved_at).await;
        let result = self.inner.store.save(&project).await;

        if self.inner.resets.load(Ordering::SeqCst) != epoch {
            debug!("Project reset while saving; status left as reset");
            return result.is_ok();
        }

        let ok = match result {
            Ok(()) => {
                self.inner.status.write().await.last_save_time = Some(saved_at);
                self.inner
                    .shared
                    .broadcast_event(EditorEvent::ProjectSaved { saved_at });
                true
            }
            Err(e) => {
                error!("Project save failed: {}", e);
                self.set_error(Some(format!("Failed to save project: {}", e)))
                    .await;
                false
            }
        };

        self.set_loading(false).await;
        ok
    }

    /// Restore the saved project
    ///
    /// All or nothing: a missing or unreadable document leaves the current
    /// project as it was.
    pub async fn load_project(&self) -> bool {
        self.set_loading(true).await;
        self.set_error(None).await;

        let result = match self.inner.store.load().await {
            Ok(Some(project)) => Ok(project),
            Ok(None) => Err(Error::ProjectNotFound("no saved project".to_string())),
            Err(e) => Err(e),
        };

        let ok = match result {
            Ok(project) => {
                self.apply_project(project).await;
                true
            }
            Err(e) => {
                warn!("Project load failed: {}", e);
                self.set_error(Some(format!("Failed to load project: {}", e)))
                    .await;
                false
            }
        };

        self.set_loading(false).await;
        ok
    }

    async fn apply_project(&self, project: PersistedProject) {
        let selected = project.selected_ids();
        let PersistedProject {
            video,
            transcript,
            sections,
            saved_at,
        } = project;

        if let Some(VideoInfo {
            url: Some(url),
            duration,
        }) = video
        {
            self.inner.sequencer.reset().await;
            self.inner.clock.set_source(&url).await;
            self.inner.clock.set_duration(duration).await;
        }

        {
            let mut model = self.inner.transcript.write().await;
            if let Some(sentences) = transcript {
                let sentences = sentences.into_iter().map(|s| s.sentence).collect();
                model.load(sentences, &selected);
            }
            if let Some(sections) = sections {
                model.set_sections(sections);
            }
            self.announce_transcript(&model);
        }

        self.inner.status.write().await.last_save_time = saved_at;
        info!("Project loaded (saved at {:?})", saved_at);
        self.inner.shared.broadcast_event(EditorEvent::ProjectLoaded {
            saved_at,
            timestamp: Utc::now(),
        });
    }

    /// Clear video, transcript and status
    pub async fn reset_project(&self) {
        self.inner.resets.fetch_add(1, Ordering::SeqCst);
        self.inner.autosave.cancel().await;
        self.inner.sequencer.reset().await;
        self.inner.clock.pause().await;
        self.inner.clock.reset().await;
        self.inner.transcript.write().await.clear();
        *self.inner.fetch_state.write().await = None;
        *self.inner.last_video_id.write().await = None;
        {
            let mut status = self.inner.status.write().await;
            status.is_loading = false;
            status.error = None;
            status.last_save_time = None;
        }
        info!("Project reset");
        self.inner.shared.broadcast_event(EditorEvent::ProjectReset {
            timestamp: Utc::now(),
        });
    }

    /// Cancel timers and stop the event pump
    pub async fn shutdown(&self) {
        self.inner.autosave.cancel().await;
        self.inner.sequencer.reset().await;
        self.inner.clock.cancel_seek_request().await;
        if let Some(pump) = self.inner.pump.lock().await.take() {
            pump.abort();
        }
        debug!("Editor shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::MemoryStore;

    fn editor() -> Editor {
        Editor::new(&PlayerSettings::default(), Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_project_status_progression() {
        let editor = editor();
        assert_eq!(editor.project_status().await, ProjectStatus::NoVideo);

        editor.set_video_url("sim://demo").await;
        assert_eq!(editor.project_status().await, ProjectStatus::NoTranscript);

        editor
            .load_transcript(crate::fetch::MockTranscriptSource::bundle())
            .await;
        assert_eq!(editor.project_status().await, ProjectStatus::NoSelection);

        editor.toggle_sentence("s3").await;
        assert_eq!(editor.project_status().await, ProjectStatus::Ready);
        editor.shutdown().await;
    }

    #[tokio::test]
    async fn test_progress_without_duration_is_zero() {
        let editor = editor();
        assert_eq!(editor.playback_progress().await, 0.0);
    }

    #[test]
    fn test_project_status_wire_names() {
        let json = serde_json::to_value(ProjectStatus::NoSelection).unwrap();
        assert_eq!(json, "no-selection");
    }
}
