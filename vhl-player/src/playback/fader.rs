//! Crossfade volume calculation
//!
//! Two halves of a clip-to-clip crossfade:
//! - **Fade-out**: driven by media time. Inside the window before a clip's
//!   end the volume follows the remaining time down to silence.
//! - **Fade-in**: driven by a timer after the seek. Each tick advances one
//!   step up the configured curve until full volume.
//!
//! With the linear curve and the default 0.3 s window the fade-out is exactly
//! `remaining / 0.3`.

use crate::config::PlayerSettings;
use vhl_common::FadeCurve;

/// Volume curve evaluator for clip transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fader {
    curve: FadeCurve,

    /// Seconds before a clip's end where the fade-out starts
    window_secs: f64,

    /// Normalized progress added per fade-in tick
    step: f64,
}

impl Fader {
    pub fn new(curve: FadeCurve, window_secs: f64, step: f64) -> Self {
        Self {
            curve,
            window_secs: window_secs.max(0.0),
            step: step.clamp(f64::EPSILON, 1.0),
        }
    }

    pub fn from_settings(settings: &PlayerSettings) -> Self {
        Self::new(
            settings.fade_curve,
            settings.fade_out_window_secs,
            settings.fade_in_step,
        )
    }

    /// Fade-out volume for the time left before a boundary
    ///
    /// Returns `None` outside the fade window (more than `window_secs` left,
    /// or the boundary already reached); the caller leaves the volume alone.
    pub fn fade_out_volume(&self, time_until_end: f64) -> Option<f64> {
        if time_until_end <= 0.0 || time_until_end > self.window_secs {
            return None;
        }
        Some(
            self.curve
                .fade_out_remaining(time_until_end, self.window_secs)
                .max(0.0),
        )
    }

    /// Number of ticks in a full fade-in ramp
    pub fn fade_in_steps(&self) -> u32 {
        ((1.0 / self.step) - 1e-9).ceil().max(1.0) as u32
    }

    /// Volume after `step` fade-in ticks (step 0 is silence)
    pub fn fade_in_volume(&self, step: u32) -> f64 {
        let position = (step as f64 * self.step).min(1.0);
        self.curve.calculate_fade_in(position)
    }

    pub fn curve(&self) -> FadeCurve {
        self.curve
    }

    pub fn window_secs(&self) -> f64 {
        self.window_secs
    }
}

impl Default for Fader {
    fn default() -> Self {
        Self::new(FadeCurve::Linear, 0.3, 0.1)
    }
}
