//! Video Highlight Player (vhl-player) - command-line entry point
//!
//! Loads a transcript file (`{fullTranscript, sections, suggestedHighlights}`)
//! and drives the highlight sequencer against a simulated media element.
//! Projects are saved and restored through a JSON file store.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vhl_common::config::TomlConfig;
use vhl_common::events::{EditorEvent, SequencerState};
use vhl_common::time::format_time;
use vhl_common::TranscriptBundle;
use vhl_player::config::PlayerSettings;
use vhl_player::media::SimulatedMedia;
use vhl_player::project::{JsonFileStore, MemoryStore, ProjectStore};
use vhl_player::Editor;

/// Command-line arguments for vhl-player
#[derive(Parser, Debug)]
#[command(name = "vhl-player")]
#[command(about = "Plays only the highlighted sentences of a transcribed video")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, global = true, env = "VHL_CONFIG")]
    config: Option<PathBuf>,

    /// Project file (overrides the configured project path)
    #[arg(short, long, global = true, env = "VHL_PROJECT")]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the highlight clips derived from a transcript
    Clips(TranscriptArgs),

    /// Play the highlight clips against a simulated video
    Play {
        #[command(flatten)]
        transcript: TranscriptArgs,

        /// Simulated video duration in seconds
        #[arg(long, default_value = "80")]
        duration: f64,

        /// Simulated time-update interval in milliseconds
        #[arg(long, default_value = "250")]
        step_ms: u64,
    },

    /// Print the export payload as JSON
    Export {
        #[command(flatten)]
        transcript: TranscriptArgs,

        #[arg(long)]
        video_url: String,
    },

    /// Save a project built from a transcript
    Save {
        #[command(flatten)]
        transcript: TranscriptArgs,

        #[arg(long)]
        video_url: String,
    },

    /// Load the saved project and print its highlights
    Load,
}

#[derive(ClapArgs, Debug)]
struct TranscriptArgs {
    /// Transcript JSON file
    transcript: PathBuf,

    /// Sentence ids to select in addition to the suggested highlights
    #[arg(long, value_delimiter = ',')]
    select: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load config")?;

    // Initialize tracing
    let default_filter = format!("vhl_player={}", config.logging.level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "vhl-player {} (git {}, built {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let mut settings = PlayerSettings::from_config(&config).context("Invalid configuration")?;
    if let Some(project) = args.project {
        settings.project_path = project;
    }

    match args.command {
        Command::Clips(transcript) => print_clips(&settings, &transcript).await,
        Command::Play {
            transcript,
            duration,
            step_ms,
        } => play(&settings, &transcript, duration, step_ms).await,
        Command::Export {
            transcript,
            video_url,
        } => export(&settings, &transcript, &video_url).await,
        Command::Save {
            transcript,
            video_url,
        } => save(&settings, &transcript, &video_url).await,
        Command::Load => load(&settings).await,
    }
}

async fn read_bundle(path: &Path) -> Result<TranscriptBundle> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid transcript in {}", path.display()))
}

/// Editor backed by an in-memory store, loaded with the transcript
async fn editor_with_transcript(settings: &PlayerSettings, args: &TranscriptArgs) -> Result<Editor> {
    editor_with_store(settings, args, Arc::new(MemoryStore::new())).await
}

async fn editor_with_store(
    settings: &PlayerSettings,
    args: &TranscriptArgs,
    store: Arc<dyn ProjectStore>,
) -> Result<Editor> {
    let bundle = read_bundle(&args.transcript).await?;
    let editor = Editor::new(settings, store);

    let report = editor.load_transcript(bundle).await;
    if !report.is_clean() {
        info!("Transcript issues: {:?}", report);
    }
    for id in &args.select {
        if !editor.set_sentence_selected(id, true).await {
            bail!("Unknown sentence id: {}", id);
        }
    }
    Ok(editor)
}

async fn print_editor_clips(editor: &Editor) {
    let clips = editor.transcript().read().await.highlight_clips();
    if clips.is_empty() {
        println!("No highlights selected");
        return;
    }
    for (index, clip) in clips.iter().enumerate() {
        println!(
            "{:>3}  {} - {}  [{}] {}",
            index + 1,
            format_time(clip.start),
            format_time(clip.end),
            clip.id,
            clip.text
        );
    }
}

async fn print_clips(settings: &PlayerSettings, args: &TranscriptArgs) -> Result<()> {
    let editor = editor_with_transcript(settings, args).await?;
    print_editor_clips(&editor).await;
    editor.shutdown().await;
    Ok(())
}

async fn play(
    settings: &PlayerSettings,
    args: &TranscriptArgs,
    duration: f64,
    step_ms: u64,
) -> Result<()> {
    if step_ms == 0 {
        bail!("--step-ms must be > 0");
    }

    let editor = editor_with_transcript(settings, args).await?;
    let media = SimulatedMedia::new(duration);
    let events = media.subscribe();
    editor.attach_media(Arc::new(media.clone()), events).await;
    editor
        .set_video_url(&format!("sim://{}", args.transcript.display()))
        .await;

    let mut editor_events = editor.subscribe_events();
    let logger = tokio::spawn(async move {
        while let Ok(event) = editor_events.recv().await {
            match event {
                EditorEvent::ClipStarted {
                    clip_index,
                    clip_id,
                    start,
                    ..
                } => println!("clip {} [{}] from {}", clip_index + 1, clip_id, format_time(start)),
                EditorEvent::HighlightsFinished { clips_played, .. } => {
                    println!("finished after {} clips", clips_played)
                }
                _ => {}
            }
        }
    });

    editor.transport().play().await;

    let step = Duration::from_millis(step_ms);
    loop {
        tokio::time::sleep(step).await;
        media.advance(step.as_secs_f64());

        let state = editor.playback_state().await;
        let idle = editor.sequencer().state().await == SequencerState::Idle;
        if idle && !state.is_playing && !state.is_playing_highlights {
            break;
        }
    }

    editor.shutdown().await;
    logger.abort();
    Ok(())
}

async fn export(settings: &PlayerSettings, args: &TranscriptArgs, video_url: &str) -> Result<()> {
    let editor = editor_with_transcript(settings, args).await?;
    editor.set_video_url(video_url).await;

    let payload = editor.export_data().await;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    editor.shutdown().await;
    Ok(())
}

async fn save(settings: &PlayerSettings, args: &TranscriptArgs, video_url: &str) -> Result<()> {
    let store = Arc::new(JsonFileStore::new(&settings.project_path));
    let editor = editor_with_store(settings, args, store).await?;
    editor.set_video_url(video_url).await;

    let saved = editor.save_project().await;
    editor.shutdown().await;
    if !saved {
        bail!(editor.error().await.unwrap_or_else(|| "save failed".to_string()));
    }
    println!("Saved project to {}", settings.project_path.display());
    Ok(())
}

async fn load(settings: &PlayerSettings) -> Result<()> {
    let store = Arc::new(JsonFileStore::new(&settings.project_path));
    let editor = Editor::new(settings, store);

    if !editor.load_project().await {
        bail!(editor.error().await.unwrap_or_else(|| "load failed".to_string()));
    }

    println!("Status: {:?}", editor.project_status().await);
    if let Some(saved) = editor.last_save_time().await {
        println!("Saved at: {}", saved.to_rfc3339());
    }
    print_editor_clips(&editor).await;
    editor.shutdown().await;
    Ok(())
}
