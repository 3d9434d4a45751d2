/// Formats a duration in seconds as hours, minutes and seconds,
/// omitting leading units that are zero: `"1h 02m 03s"`, `"4m 05s"`, `"7s"`.
///
/// Negative and non-finite durations render as `"0s"`.
pub fn format_hms(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours}h {minutes:02}m {secs:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs:02}s")
    } else {
        format!("{secs}s")
    }
}
