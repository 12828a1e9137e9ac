//! Timestamp parsing and formatting in the engine's notation

use crate::error::{VideoForgeError, VideoForgeResult};

/// Parse `SS[.fff]`, `MM:SS[.fff]` or `HH:MM:SS[.fff]` into seconds
pub fn parse_timestamp(text: &str) -> VideoForgeResult<f64> {
    let text = text.trim();
    let invalid = || VideoForgeError::InvalidTimestamp {
        value: text.to_string(),
    };

    let parts: Vec<&str> = text.split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(invalid());
    }

    let mut seconds = 0.0;
    for part in &parts {
        let value: f64 = part.parse().map_err(|_| invalid())?;
        if !value.is_finite() || value < 0.0 {
            return Err(invalid());
        }
        seconds = seconds * 60.0 + value;
    }
    Ok(seconds)
}

/// Format seconds as `HH:MM:SS.mmm`, rounding to the millisecond
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("90").unwrap(), 90.0);
        assert_eq!(parse_timestamp("01:30.5").unwrap(), 90.5);
        assert_eq!(parse_timestamp("01:00:01.250000").unwrap(), 3601.25);
        assert!(parse_timestamp("N/A").is_err());
        assert!(parse_timestamp("1:2:3:4").is_err());
        assert!(parse_timestamp("-5").is_err());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00:00.000");
        assert_eq!(format_timestamp(5.0), "00:00:05.000");
        assert_eq!(format_timestamp(3725.5), "01:02:05.500");
        assert_eq!(format_timestamp(1.9996), "00:00:02.000");
    }
}
