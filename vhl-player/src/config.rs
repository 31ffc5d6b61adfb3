//! vhl-player runtime settings
//!
//! Converts the TOML bootstrap sections into validated runtime values.
//! Missing keys already carry built-in defaults from `vhl_common::config`;
//! this layer rejects values that would break the sequencer (zero-length
//! ramps, negative windows).

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;
use vhl_common::config::{default_project_path, TomlConfig};
use vhl_common::time::millis_to_duration;
use vhl_common::FadeCurve;

/// Player runtime settings
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSettings {
    /// Seconds before a clip's end where the fade-out starts
    pub fade_out_window_secs: f64,
    /// Volume added per fade-in tick
    pub fade_in_step: f64,
    /// Interval between fade-in ticks
    pub fade_in_tick: Duration,
    /// Delay after the seek before the first fade-in tick
    pub fade_in_delay: Duration,
    pub fade_curve: FadeCurve,
    /// Lifetime of a seek request before it auto-clears
    pub seek_request_window: Duration,
    /// Debounce between the last selection change and auto-save
    pub autosave_delay: Duration,
    pub project_path: PathBuf,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            fade_out_window_secs: 0.3,
            fade_in_step: 0.1,
            fade_in_tick: Duration::from_millis(30),
            fade_in_delay: Duration::from_millis(50),
            fade_curve: FadeCurve::Linear,
            seek_request_window: Duration::from_millis(50),
            autosave_delay: Duration::from_millis(3000),
            project_path: default_project_path(),
        }
    }
}

impl PlayerSettings {
    /// Build validated settings from the bootstrap config
    pub fn from_config(config: &TomlConfig) -> Result<Self> {
        let playback = &config.playback;

        if !playback.fade_out_window_secs.is_finite() || playback.fade_out_window_secs < 0.0 {
            return Err(Error::Config(format!(
                "fade_out_window_secs must be >= 0, got {}",
                playback.fade_out_window_secs
            )));
        }

        if !(playback.fade_in_step > 0.0 && playback.fade_in_step <= 1.0) {
            return Err(Error::Config(format!(
                "fade_in_step must be in (0, 1], got {}",
                playback.fade_in_step
            )));
        }

        if playback.fade_in_tick_ms == 0 {
            return Err(Error::Config("fade_in_tick_ms must be > 0".to_string()));
        }

        Ok(Self {
            fade_out_window_secs: playback.fade_out_window_secs,
            fade_in_step: playback.fade_in_step,
            fade_in_tick: millis_to_duration(playback.fade_in_tick_ms),
            fade_in_delay: millis_to_duration(playback.fade_in_delay_ms),
            fade_curve: playback.fade_curve,
            seek_request_window: millis_to_duration(playback.seek_request_window_ms),
            autosave_delay: millis_to_duration(config.project.autosave_delay_ms),
            project_path: config
                .project
                .project_path
                .clone()
                .unwrap_or_else(default_project_path),
        })
    }
}
