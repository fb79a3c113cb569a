use std::time::Duration;

/// Keep only ASCII digits from raw keyboard input.
pub fn sanitize_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Whole seconds shown on the clock: remaining time rounded up.
pub fn display_secs(remaining: Duration) -> u64 {
    let millis = remaining.as_millis();
    millis.div_ceil(1000) as u64
}

/// Problems per minute for a round of `duration_secs`; 0 for an empty round.
pub fn problems_per_minute(score: u32, duration_secs: u32) -> f64 {
    match duration_secs {
        0 => 0.0,
        secs => f64::from(score) / f64::from(secs) * 60.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_digits() {
        assert_eq!(sanitize_digits("12a3"), "123");
        assert_eq!(sanitize_digits("-4.5"), "45");
        assert_eq!(sanitize_digits(" 7 "), "7");
        assert_eq!(sanitize_digits("abc"), "");
        assert_eq!(sanitize_digits(""), "");
    }

    #[test]
    fn test_sanitize_digits_drops_non_ascii_digits() {
        assert_eq!(sanitize_digits("٣4"), "4");
    }

    #[test]
    fn test_display_secs_rounds_up() {
        assert_eq!(display_secs(Duration::from_millis(59_001)), 60);
        assert_eq!(display_secs(Duration::from_millis(59_000)), 59);
        assert_eq!(display_secs(Duration::from_millis(1)), 1);
        assert_eq!(display_secs(Duration::ZERO), 0);
    }

    #[test]
    fn test_problems_per_minute() {
        assert_eq!(problems_per_minute(30, 60), 30.0);
        assert_eq!(problems_per_minute(30, 120), 15.0);
        assert_eq!(problems_per_minute(7, 30), 14.0);
        assert_eq!(problems_per_minute(0, 90), 0.0);
    }

    #[test]
    fn test_problems_per_minute_zero_duration() {
        assert_eq!(problems_per_minute(10, 0), 0.0);
    }
}
