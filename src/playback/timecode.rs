use chrono::{Local, TimeZone};

/// `mm:ss`, or `hh:mm:ss` once the value reaches an hour.
pub fn format_progress(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

/// Wall-clock time shown over the video: capture start plus position.
pub fn overlay_timestamp(capture_time_ms: i64, position: f64) -> String {
    let offset_ms = if position.is_finite() {
        (position * 1000.0) as i64
    } else {
        0
    };
    match Local.timestamp_millis_opt(capture_time_ms.saturating_add(offset_ms)) {
        chrono::LocalResult::Single(at) | chrono::LocalResult::Ambiguous(at, _) => {
            at.format("%Y-%m-%d %H:%M:%S").to_string()
        }
        chrono::LocalResult::None => String::from("--"),
    }
}
