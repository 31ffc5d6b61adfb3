//! # VHL Common Library
//!
//! Shared code for the video highlight player workspace:
//! - Transcript domain types (sentences, sections, highlight clips)
//! - Editor event types (EditorEvent enum)
//! - Configuration loading
//! - Time formatting utilities
//! - Fade curve definitions and calculations

pub mod config;
pub mod error;
pub mod events;
pub mod fade_curves;
pub mod time;
pub mod types;

pub use error::{Error, Result};
pub use fade_curves::FadeCurve;
pub use types::{HighlightClip, Section, Sentence, TranscriptBundle, TranscriptSentence};
