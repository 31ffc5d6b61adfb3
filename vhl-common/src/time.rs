//! Media-time utilities
//!
//! `format_time` / `parse_time` implement the `MM:SS` display used by the
//! transcript editor. Minutes are not wrapped into hours, so 75 minutes
//! renders as `75:00`.

use crate::{Error, Result};

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// Format media seconds as `MM:SS` (floored, zero-padded to two digits each)
///
/// Negative and non-finite inputs render as `00:00`.
///
/// # Examples
///
/// ```
/// use vhl_common::time::format_time;
///
/// assert_eq!(format_time(65.0), "01:05");
/// assert_eq!(format_time(4.9), "00:04");
/// assert_eq!(format_time(3600.0), "60:00");
/// ```
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Parse `MM:SS` into media seconds (`minutes * 60 + seconds`)
///
/// # Examples
///
/// ```
/// use vhl_common::time::parse_time;
///
/// assert_eq!(parse_time("01:05").unwrap(), 65.0);
/// assert_eq!(parse_time("120:00").unwrap(), 7200.0);
/// assert!(parse_time("1:5:3").is_err());
/// ```
pub fn parse_time(value: &str) -> Result<f64> {
    let (mins, secs) = value
        .trim()
        .split_once(':')
        .ok_or_else(|| Error::InvalidInput(format!("expected MM:SS, got '{}'", value)))?;

    let mins: u64 = mins
        .parse()
        .map_err(|_| Error::InvalidInput(format!("invalid minutes in '{}'", value)))?;
    let secs: u64 = secs
        .parse()
        .map_err(|_| Error::InvalidInput(format!("invalid seconds in '{}'", value)))?;

    if secs >= 60 {
        return Err(Error::InvalidInput(format!(
            "seconds out of range in '{}'",
            value
        )));
    }

    let total = mins
        .checked_mul(60)
        .and_then(|m| m.checked_add(secs))
        .ok_or_else(|| Error::InvalidInput(format!("minutes out of range in '{}'", value)))?;

    Ok(total as f64)
}
