//! Highlight playback: clock adapter, crossfade, sequencer and transport

pub mod clock;
pub mod fader;
pub mod sequencer;
pub mod state;
pub mod transport;

pub use clock::ClockAdapter;
pub use fader::Fader;
pub use sequencer::HighlightSequencer;
pub use state::PlaybackState;
pub use transport::TransportController;
