/// Format seconds as `M:SS`.
///
/// Minutes are never padded and there is no hours field, so an hour and a
/// half renders as `90:00`. Negative and non-finite input renders `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let minutes = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{}:{:02}", minutes, secs)
}

/// `elapsed / total` label shown next to the seek bar.
pub fn time_label(current: f64, duration: f64) -> String {
    format!("{} / {}", format_time(current), format_time(duration))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_seconds_but_not_minutes() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(5.0), "0:05");
        assert_eq!(format_time(59.99), "0:59");
        assert_eq!(format_time(60.0), "1:00");
        assert_eq!(format_time(125.0), "2:05");
        assert_eq!(format_time(754.4), "12:34");
    }

    #[test]
    fn hours_fold_into_minutes() {
        assert_eq!(format_time(3600.0), "60:00");
        assert_eq!(format_time(5430.0), "90:30");
    }

    #[test]
    fn unusable_input_renders_zero() {
        assert_eq!(format_time(-4.0), "0:00");
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(f64::INFINITY), "0:00");
    }

    #[test]
    fn label_joins_elapsed_and_total() {
        assert_eq!(time_label(5.0, 10.0), "0:05 / 0:10");
        assert_eq!(time_label(0.0, 0.0), "0:00 / 0:00");
    }
}
