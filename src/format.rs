/// Formats a video length for the time badge.
///
/// Non-positive lengths yield an empty string (the badge stays hidden).
/// Lengths of an hour or more render as `H:MM:SS`, shorter ones as `M:SS`.
pub fn format_duration(seconds: i64) -> String {
    if seconds <= 0 {
        return String::new();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}
