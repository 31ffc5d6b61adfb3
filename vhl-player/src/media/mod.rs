//! Media element abstraction
//!
//! The sequencer never talks to a concrete player. A host (browser binding,
//! native video widget, or the bundled simulation) implements
//! [`MediaElement`] and forwards its native notifications as [`MediaEvent`]s
//! into the sequencer's event pump.

pub mod simulated;

pub use simulated::SimulatedMedia;

/// Notifications emitted by a media element
///
/// `TimeUpdate` carries no position: handlers read the element's current
/// time when they process the event, so a seek issued by an earlier handler
/// is already visible.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Playback position advanced (native, irregular interval)
    TimeUpdate,
    /// Metadata ready, duration known
    LoadedMetadata { duration: f64 },
    /// Playback started
    Play,
    /// Playback paused (by command, stall, or reaching the end)
    Pause,
    /// Playback reached the end of the media
    Ended,
}

/// Time-continuous media resource under external control
///
/// Methods take `&self`; implementations hold their own interior state the
/// way a platform media handle does.
pub trait MediaElement: Send + Sync {
    /// Current playback position in seconds
    fn current_time(&self) -> f64;

    /// Jump to `time` seconds
    fn set_current_time(&self, time: f64);

    /// Media duration in seconds (0.0 before metadata is ready)
    fn duration(&self) -> f64;

    /// Output volume in 0.0..=1.0
    fn volume(&self) -> f64;

    fn set_volume(&self, volume: f64);

    fn playback_rate(&self) -> f64 {
        1.0
    }

    fn is_paused(&self) -> bool;

    /// Paused at the end of the media; cleared by a seek, play or reload
    fn is_ended(&self) -> bool {
        let duration = self.duration();
        self.is_paused() && duration > 0.0 && self.current_time() >= duration
    }

    fn play(&self);

    fn pause(&self);

    /// Replace the media source and start loading it
    fn load(&self, url: &str);
}
