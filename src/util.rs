//! Shared utility functions

use chrono::{DateTime, FixedOffset, Utc};

/// IST is UTC+05:30 with no DST.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

fn ist() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).expect("IST offset is in range")
}

/// Format an instant as `YYYY-MM-DD HH:MM:SS` in Indian Standard Time.
/// Bill and point writes stamp rows with this format.
pub fn format_ist(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&ist())
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Current date-time in IST, in the stored-procedure timestamp format.
pub fn india_datetime() -> String {
    format_ist(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_ist() {
        // 2025-03-18 00:00:00 UTC is 05:30 the same day in IST
        let instant = Utc.with_ymd_and_hms(2025, 3, 18, 0, 0, 0).unwrap();
        assert_eq!(format_ist(instant), "2025-03-18 05:30:00");

        // 20:00 UTC rolls over to the next IST day
        let instant = Utc.with_ymd_and_hms(2025, 3, 18, 20, 0, 0).unwrap();
        assert_eq!(format_ist(instant), "2025-03-19 01:30:00");
    }
}
