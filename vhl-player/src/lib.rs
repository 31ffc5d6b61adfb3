//! # VHL Highlight Player Library (vhl-player)
//!
//! Plays only the selected sentences of a transcribed video, in start order,
//! with a short volume crossfade at every jump between clips.
//!
//! **Architecture:** a transcript model derives the ordered highlight clips;
//! a clock adapter wraps an injected media element; the highlight sequencer
//! consumes media events and commands seeks and volume; the transport
//! controller and the editor façade expose user-facing operations.

pub mod autosave;
pub mod config;
pub mod editor;
pub mod error;
pub mod fetch;
pub mod media;
pub mod playback;
pub mod project;
pub mod state;
pub mod transcript;

pub use editor::{Editor, ProjectStatus};
pub use error::{Error, Result};
pub use state::SharedState;
