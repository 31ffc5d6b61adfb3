//! Transcript fetch
//!
//! The transcription backend is an opaque collaborator: given a video id it
//! returns the full transcript, its sections and the suggested highlights.
//! `HttpTranscriptSource` calls `GET {base_url}/api/video/{id}`;
//! `MockTranscriptSource` serves a fixed demonstration transcript.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};
use vhl_common::{Section, Sentence, TranscriptBundle};

const USER_AGENT: &str = concat!("vhl-player/", env!("CARGO_PKG_VERSION"));

/// Outcome of a transcript load as seen by observers
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    /// Request in flight
    Pending,
    /// Request failed; message is user-visible
    Error(String),
    /// Transcript received and loaded
    Data(TranscriptBundle),
}

impl FetchState {
    pub fn is_pending(&self) -> bool {
        matches!(self, FetchState::Pending)
    }

    pub fn data(&self) -> Option<&TranscriptBundle> {
        match self {
            FetchState::Data(bundle) => Some(bundle),
            _ => None,
        }
    }
}

/// Source of transcripts by video id
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch(&self, video_id: &str) -> Result<TranscriptBundle>;
}

/// Transcription backend reached over HTTP
pub struct HttpTranscriptSource {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpTranscriptSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Fetch(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, video_id: &str) -> String {
        format!("{}/api/video/{}", self.base_url, video_id)
    }
}

#[async_trait]
impl TranscriptSource for HttpTranscriptSource {
    async fn fetch(&self, video_id: &str) -> Result<TranscriptBundle> {
        let url = self.url_for(video_id);
        debug!(video_id = %video_id, url = %url, "Fetching transcript");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Fetch(format!("{} returned {}: {}", url, status, body)));
        }

        let bundle: TranscriptBundle = response
            .json()
            .await
            .map_err(|e| Error::Fetch(format!("invalid transcript from {}: {}", url, e)))?;

        info!(
            video_id = %video_id,
            sentences = bundle.full_transcript.len(),
            sections = bundle.sections.len(),
            "Transcript fetched"
        );
        Ok(bundle)
    }
}

/// Fixed demonstration transcript
///
/// Twelve sentences of a product demo in four sections. Nothing is
/// suggested, so every highlight is picked by the user.
#[derive(Debug, Clone, Default)]
pub struct MockTranscriptSource {
    /// Simulated processing delay
    pub delay: Duration,
}

impl MockTranscriptSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn bundle() -> TranscriptBundle {
        let sentences = [
            ("s1", 0.0, 4.0, "Welcome to our product demonstration."),
            ("s2", 5.0, 10.0, "Today, we'll be showcasing our latest innovation."),
            ("s3", 15.0, 19.0, "Our product has three main features."),
            ("s4", 20.0, 24.0, "First, it's incredibly easy to use."),
            ("s5", 25.0, 29.0, "Second, it's highly efficient."),
            ("s6", 30.0, 34.0, "And third, it's cost-effective."),
            ("s7", 40.0, 44.0, "Let me show you how it works."),
            ("s8", 45.0, 49.0, "Simply press this button to start."),
            ("s9", 50.0, 54.0, "The interface is intuitive and user-friendly."),
            ("s10", 60.0, 64.0, "In conclusion, our product is a game-changer."),
            ("s11", 65.0, 69.0, "We're excited to bring this to market."),
            ("s12", 70.0, 74.0, "Thank you for your attention."),
        ];
        let sections = [
            ("Introduction", &["s1", "s2"][..]),
            ("Key Features", &["s3", "s4", "s5", "s6"][..]),
            ("Demonstration", &["s7", "s8", "s9"][..]),
            ("Conclusion", &["s10", "s11", "s12"][..]),
        ];

        TranscriptBundle {
            full_transcript: sentences
                .iter()
                .map(|(id, start, end, text)| Sentence::new(*id, *start, *end, *text))
                .collect(),
            sections: sections
                .iter()
                .map(|(title, ids)| {
                    Section::new(*title, ids.iter().map(|id| id.to_string()).collect())
                })
                .collect(),
            suggested_highlights: Vec::new(),
        }
    }
}

#[async_trait]
impl TranscriptSource for MockTranscriptSource {
    async fn fetch(&self, video_id: &str) -> Result<TranscriptBundle> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        debug!(video_id = %video_id, "Serving demonstration transcript");
        Ok(Self::bundle())
    }
}
