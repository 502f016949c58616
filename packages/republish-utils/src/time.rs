use chrono::{DateTime, Utc};
use std::time::Instant;

/// Format used for the release-notes "last updated" column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

pub fn utc_timestamp() -> String {
    format_timestamp(Utc::now())
}

pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Seconds since `start`, padded the way the step timings are logged.
pub fn elapsed_secs(start: Instant) -> String {
    format!("{:5.2}", start.elapsed().as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp() {
        let time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_timestamp(time), "2024-01-01 00:00:00 UTC");
    }

    #[test]
    fn test_elapsed_secs_width() {
        assert_eq!(elapsed_secs(Instant::now()).len(), 5);
    }
}
