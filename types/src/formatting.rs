//! Remaining-time formatting helpers for rendering layers.
//!
//! The ledger only ever hands out raw `Duration`s. Displays disagree on how
//! to round them: "time left" counters truncate to whole seconds, while
//! decimal displays keep a fixed precision and may need European-style
//! separators (swapping `.` and `,`).

use std::time::Duration;

/// Swap `.` and `,` in a formatted number.
fn europeanize(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '.' => result.push(','),
            ',' => result.push('.'),
            _ => result.push(c),
        }
    }
    result
}

#[inline]
fn maybe_eu(s: String, european: bool) -> String {
    if european { europeanize(&s) } else { s }
}

/// Whole seconds left, truncated toward zero.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use engage_types::formatting::whole_seconds_left;
/// assert_eq!(whole_seconds_left(Duration::from_millis(9_999)), 9);
/// assert_eq!(whole_seconds_left(Duration::from_millis(999)), 0);
/// ```
pub fn whole_seconds_left(remaining: Duration) -> u64 {
    remaining.as_secs()
}

/// Seconds left with a fixed number of decimals.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use engage_types::formatting::decimal_seconds_left;
/// assert_eq!(decimal_seconds_left(Duration::from_millis(3_240), 1, false), "3.2");
/// assert_eq!(decimal_seconds_left(Duration::from_millis(3_250), 2, true), "3,25");
/// assert_eq!(decimal_seconds_left(Duration::ZERO, 1, false), "0.0");
/// ```
pub fn decimal_seconds_left(remaining: Duration, precision: usize, european: bool) -> String {
    let secs = remaining.as_secs_f64();
    maybe_eu(format!("{:.prec$}", secs, prec = precision), european)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_seconds_truncates() {
        assert_eq!(whole_seconds_left(Duration::ZERO), 0);
        assert_eq!(whole_seconds_left(Duration::from_millis(1_000)), 1);
        assert_eq!(whole_seconds_left(Duration::from_millis(14_999)), 14);
    }

    #[test]
    fn test_decimal_precision() {
        assert_eq!(decimal_seconds_left(Duration::from_millis(12_500), 1, false), "12.5");
        assert_eq!(decimal_seconds_left(Duration::from_millis(12_000), 0, false), "12");
        assert_eq!(decimal_seconds_left(Duration::from_millis(1_234), 3, false), "1.234");
    }

    #[test]
    fn test_decimal_european() {
        assert_eq!(decimal_seconds_left(Duration::from_millis(1_500), 1, true), "1,5");
        assert_eq!(decimal_seconds_left(Duration::from_millis(1_500), 1, false), "1.5");
    }
}
