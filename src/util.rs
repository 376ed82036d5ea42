use chrono::{DateTime, Utc};
use time_humanize::HumanTime;

/// `MM:SS`, or `H:MM:SS` from one hour up.
pub fn format_clock(seconds: u32) -> String {
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// Filesystem-safe key for a workout id.
pub fn slot_key(workout_id: &str) -> String {
    let key: String = workout_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if key.is_empty() {
        "_".to_string()
    } else {
        key
    }
}

pub fn humanize_since(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    HumanTime::from_seconds(-secs).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn clock_under_an_hour() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(90), "01:30");
        assert_eq!(format_clock(3599), "59:59");
    }

    #[test]
    fn clock_with_hours() {
        assert_eq!(format_clock(3600), "1:00:00");
        assert_eq!(format_clock(3725), "1:02:05");
    }

    #[test]
    fn slot_key_replaces_path_characters() {
        assert_eq!(slot_key("2024-06-01"), "2024-06-01");
        assert_eq!(slot_key("../etc/passwd"), "___etc_passwd");
        assert_eq!(slot_key("wod 1"), "wod_1");
        assert_eq!(slot_key(""), "_");
    }

    #[test]
    fn humanize_past() {
        let now = Utc::now();
        let text = humanize_since(now - Duration::hours(3), now);
        assert!(text.contains("hour"), "{text}");
    }
}
