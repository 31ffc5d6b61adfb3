//! Integration tests for the editor: fetch, selection, auto-save and
//! project persistence

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use vhl_common::events::{EditorEvent, SequencerState};
use vhl_common::{Sentence, TranscriptBundle};
use vhl_player::config::PlayerSettings;
use vhl_player::fetch::{FetchState, MockTranscriptSource, TranscriptSource};
use vhl_player::media::{MediaElement, SimulatedMedia};
use vhl_player::project::{JsonFileStore, MemoryStore, PersistedProject, ProjectStore};
use vhl_player::{Editor, Error, ProjectStatus, Result};

struct FailingSource;

#[async_trait]
impl TranscriptSource for FailingSource {
    async fn fetch(&self, video_id: &str) -> Result<TranscriptBundle> {
        Err(Error::Fetch(format!("backend unavailable for {}", video_id)))
    }
}

/// Store whose saves take a second to complete
struct SlowStore {
    inner: MemoryStore,
    delay: Duration,
}

#[async_trait]
impl ProjectStore for SlowStore {
    async fn save(&self, project: &PersistedProject) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.save(project).await
    }

    async fn load(&self) -> Result<Option<PersistedProject>> {
        self.inner.load().await
    }
}

fn memory_editor() -> (Editor, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let editor = Editor::new(&PlayerSettings::default(), store.clone());
    (editor, store)
}

fn small_bundle(suggested: &[&str]) -> TranscriptBundle {
    TranscriptBundle {
        full_transcript: vec![
            Sentence::new("s1", 0.0, 4.0, "Welcome to our product demonstration."),
            Sentence::new("s2", 5.0, 10.0, "Today, we'll be showcasing our latest innovation."),
            Sentence::new("s3", 15.0, 19.0, "Our product has three main features."),
        ],
        sections: Vec::new(),
        suggested_highlights: suggested.iter().map(|s| s.to_string()).collect(),
    }
}

#[tokio::test]
async fn test_suggested_highlights_select_only_those() {
    let (editor, _) = memory_editor();
    let report = editor.load_transcript(small_bundle(&["s2"])).await;
    assert!(report.is_clean());

    let transcript = editor.transcript().read().await;
    let selected: Vec<&str> = transcript
        .selected_sentences()
        .iter()
        .map(|s| s.id())
        .collect();
    assert_eq!(selected, vec!["s2"]);
}

#[tokio::test]
async fn test_load_video_data_from_mock() {
    let (editor, _) = memory_editor();
    let state = editor.load_video_data(&MockTranscriptSource::new(), "demo").await;

    let bundle = state.data().unwrap();
    assert_eq!(bundle.full_transcript.len(), 12);
    assert!(!editor.is_loading().await);
    assert_eq!(editor.error().await, None);

    let transcript = editor.transcript().read().await;
    assert_eq!(transcript.len(), 12);
    assert_eq!(transcript.sections().len(), 4);
    assert_eq!(transcript.selected_count(), 0);
    assert_eq!(transcript.sentences_by_section("Demonstration").len(), 3);
}

#[tokio::test]
async fn test_failed_fetch_keeps_previous_transcript() {
    let (editor, _) = memory_editor();
    editor.load_transcript(small_bundle(&["s1"])).await;
    let mut events = editor.subscribe_events();

    let state = editor.load_video_data(&FailingSource, "broken").await;
    assert!(matches!(state, FetchState::Error(_)));
    assert!(editor.error().await.unwrap().contains("backend unavailable"));
    assert!(!editor.is_loading().await);
    assert_eq!(editor.fetch_state().await, Some(state));

    let transcript = editor.transcript().read().await;
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript.selected_count(), 1);

    assert!(matches!(
        events.try_recv().unwrap(),
        EditorEvent::Error { .. }
    ));
}

#[tokio::test]
async fn test_refresh_refetches_last_video() {
    let (editor, _) = memory_editor();
    assert!(editor.refresh(&MockTranscriptSource::new()).await.is_none());

    editor.load_video_data(&FailingSource, "demo").await;
    let state = editor.refresh(&MockTranscriptSource::new()).await.unwrap();
    assert!(state.data().is_some());
    assert_eq!(editor.error().await, None);
}

#[tokio::test]
async fn test_toggle_emits_selection_changed() {
    let (editor, _) = memory_editor();
    editor.load_transcript(small_bundle(&[])).await;
    let mut events = editor.subscribe_events();

    assert_eq!(editor.toggle_sentence("s3").await, Some(true));
    assert_eq!(editor.toggle_sentence("missing").await, None);
    assert!(!editor.set_sentence_selected("missing", true).await);

    match events.try_recv().unwrap() {
        EditorEvent::SelectionChanged {
            sentence_id,
            is_selected,
            selected_count,
            ..
        } => {
            assert_eq!(sentence_id, "s3");
            assert!(is_selected);
            assert_eq!(selected_count, 1);
        }
        other => panic!("Expected SelectionChanged, got {:?}", other),
    }
    assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_autosave_after_selection_debounce() {
    let (editor, store) = memory_editor();
    editor.set_video_url("https://example.test/demo.mp4").await;
    editor.load_transcript(small_bundle(&[])).await;

    editor.toggle_sentence("s1").await;
    tokio::time::sleep(Duration::from_secs(2)).await;
    editor.toggle_sentence("s2").await;
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(store.raw().is_none());
    assert!(editor.autosave_pending().await);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let saved = store.load().await.unwrap().unwrap();
    assert_eq!(saved.selected_ids(), vec!["s1".to_string(), "s2".to_string()]);
    assert!(editor.last_save_time().await.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_no_autosave_without_video() {
    let (editor, store) = memory_editor();
    editor.load_transcript(small_bundle(&[])).await;

    editor.toggle_sentence("s1").await;
    assert!(!editor.autosave_pending().await);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(store.raw().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_reset_cancels_pending_autosave() {
    let (editor, store) = memory_editor();
    editor.set_video_url("https://example.test/demo.mp4").await;
    editor.load_transcript(small_bundle(&[])).await;
    editor.toggle_sentence("s1").await;

    editor.reset_project().await;
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(store.raw().is_none());
    assert_eq!(editor.project_status().await, ProjectStatus::NoVideo);
    assert!(editor.transcript().read().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_reset_during_autosave_clears_loading() {
    let store = Arc::new(SlowStore {
        inner: MemoryStore::new(),
        delay: Duration::from_secs(1),
    });
    let editor = Editor::new(&PlayerSettings::default(), store.clone());
    editor.set_video_url("https://example.test/demo.mp4").await;
    editor.load_transcript(small_bundle(&[])).await;
    editor.toggle_sentence("s1").await;

    // Debounce elapsed, store still writing
    tokio::time::sleep(Duration::from_millis(3100)).await;
    assert!(editor.is_loading().await);

    editor.reset_project().await;
    assert!(!editor.is_loading().await);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(!editor.is_loading().await);
    assert_eq!(editor.last_save_time().await, None);
    // The save that was already running still completed
    assert!(store.inner.raw().is_some());
}

#[tokio::test]
async fn test_save_and_load_round_trip() {
    let (editor, store) = memory_editor();
    editor.set_video_url("https://example.test/demo.mp4").await;
    editor.clock().set_duration(75.0).await;
    editor
        .load_video_data(&MockTranscriptSource::new(), "demo")
        .await;
    editor.set_sentence_selected("s4", true).await;
    editor.set_sentence_selected("s9", true).await;

    assert!(editor.save_project().await);
    let saved_at = editor.last_save_time().await.unwrap();

    let restored = Editor::new(&PlayerSettings::default(), store.clone());
    assert!(restored.load_project().await);
    assert_eq!(restored.error().await, None);
    assert_eq!(
        restored.clock().video_url().await.as_deref(),
        Some("https://example.test/demo.mp4")
    );
    assert_eq!(restored.clock().duration().await, 75.0);
    assert_eq!(restored.last_save_time().await, Some(saved_at));
    assert_eq!(restored.project_status().await, ProjectStatus::Ready);

    let transcript = restored.transcript().read().await;
    assert_eq!(transcript.len(), 12);
    assert_eq!(transcript.sections().len(), 4);
    let clips: Vec<String> = transcript.highlight_clips().into_iter().map(|c| c.id).collect();
    assert_eq!(clips, vec!["s4".to_string(), "s9".to_string()]);
    drop(transcript);

    editor.shutdown().await;
    restored.shutdown().await;
}

#[tokio::test]
async fn test_load_without_saved_project_sets_error() {
    let (editor, _) = memory_editor();
    editor.load_transcript(small_bundle(&["s1"])).await;

    assert!(!editor.load_project().await);
    assert!(editor.error().await.is_some());
    assert!(!editor.is_loading().await);
    assert_eq!(editor.transcript().read().await.selected_count(), 1);
}

#[tokio::test]
async fn test_corrupt_project_leaves_state_untouched() {
    let (editor, store) = memory_editor();
    editor.set_video_url("https://example.test/original.mp4").await;
    editor.load_transcript(small_bundle(&["s2"])).await;
    store.put_raw(r#"{"video": {"url": "https://example.test/other.mp4"}, "transcript": ["#);

    assert!(!editor.load_project().await);
    assert!(editor.error().await.unwrap().contains("Corrupt"));
    assert_eq!(
        editor.clock().video_url().await.as_deref(),
        Some("https://example.test/original.mp4")
    );
    let transcript = editor.transcript().read().await;
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript.selected_count(), 1);
    drop(transcript);
    editor.shutdown().await;
}

#[tokio::test]
async fn test_export_payload() {
    let (editor, _) = memory_editor();
    editor.set_video_url("https://example.test/demo.mp4").await;
    editor.load_transcript(small_bundle(&["s3", "s1"])).await;

    let payload = editor.export_data().await;
    assert_eq!(payload.video_url.as_deref(), Some("https://example.test/demo.mp4"));
    assert_eq!(payload.transcript.len(), 3);
    let highlights: Vec<&str> = payload.highlights.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(highlights, vec!["s1", "s3"]);

    let json = serde_json::to_value(&payload).unwrap();
    assert!(json["exportTime"].is_string());
    assert_eq!(json["highlights"][1]["start"], 15.0);
    editor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_subtitle_and_progress_follow_seek() {
    let (editor, _) = memory_editor();
    let media = SimulatedMedia::new(80.0);
    let events = media.subscribe();
    editor.attach_media(Arc::new(media.clone()), events).await;
    editor.load_transcript(small_bundle(&["s2"])).await;

    assert!(editor.seek_to(7.0).await);
    assert_eq!(
        editor.subtitle().await,
        "Today, we'll be showcasing our latest innovation."
    );
    assert_eq!(editor.playback_progress().await, 7.0 / 80.0 * 100.0);

    editor.seek_to(2.0).await;
    assert_eq!(editor.subtitle().await, "");
    editor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_event_pump_drives_highlight_playback() {
    let (editor, _) = memory_editor();
    let media = SimulatedMedia::new(80.0);
    let events = media.subscribe();
    editor.attach_media(Arc::new(media.clone()), events).await;
    editor.set_video_url("sim://demo").await;
    editor.load_transcript(small_bundle(&["s1", "s3"])).await;

    assert!(editor.transport().play().await);
    for _ in 0..200 {
        media.advance(0.1);
        tokio::time::sleep(Duration::from_millis(100)).await;
        if editor.sequencer().state().await == SequencerState::Idle {
            break;
        }
    }

    assert_eq!(editor.sequencer().state().await, SequencerState::Idle);
    assert!(media.is_paused());
    assert_eq!(media.volume(), 1.0);
    assert!(media.seek_history().contains(&15.0));
    editor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_set_video_url_stops_highlight_playback() {
    let (editor, _) = memory_editor();
    let media = SimulatedMedia::new(80.0);
    let events = media.subscribe();
    editor.attach_media(Arc::new(media.clone()), events).await;
    editor.load_transcript(small_bundle(&["s1", "s3"])).await;
    editor.transport().play().await;

    editor.set_video_url("sim://other").await;
    assert_eq!(editor.sequencer().state().await, SequencerState::Idle);
    let state = editor.playback_state().await;
    assert!(!state.is_playing_highlights);
    assert_eq!(state.seek_request, None);
    assert_eq!(media.source().as_deref(), Some("sim://other"));
    editor.shutdown().await;
}

#[tokio::test]
async fn test_json_file_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("project.json");
    let store = Arc::new(JsonFileStore::new(&path));
    assert!(store.load().await.unwrap().is_none());

    let editor = Editor::new(&PlayerSettings::default(), store.clone());
    editor.set_video_url("https://example.test/demo.mp4").await;
    editor.load_transcript(small_bundle(&["s2"])).await;
    assert!(editor.save_project().await);

    assert!(path.exists());
    assert!(!dir.path().join("nested").join("project.json.tmp").exists());

    let loaded = store.load().await.unwrap().unwrap();
    assert_eq!(loaded.selected_ids(), vec!["s2".to_string()]);
    assert_eq!(
        loaded.video.unwrap().url.as_deref(),
        Some("https://example.test/demo.mp4")
    );
    editor.shutdown().await;
}

#[tokio::test]
async fn test_json_file_store_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.json");
    std::fs::write(&path, "not json at all").unwrap();

    let store = JsonFileStore::new(&path);
    assert!(matches!(store.load().await, Err(Error::CorruptProject(_))));
}
