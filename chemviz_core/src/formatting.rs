use chrono::{DateTime, Utc};

/// Rounds `value` to `places` decimal places. Ties go to the even neighbour,
/// so 0.125 becomes 0.12 and 0.375 becomes 0.38. The tie test is made on the
/// binary value: 2.675 is really 2.67499999... and rounds down.
///
/// Scaling by a power of ten first would round twice (2.675 * 100.0 is
/// exactly 267.5), so the rounding is left to the float formatter, which works
/// from the exact decimal expansion.
pub fn round_half_even(value: f64, places: u32) -> f64 {
    format!("{:.*}", places as usize, value)
        .parse()
        .unwrap_or(value)
}

/// Formats a number so that whole values keep one decimal place, e.g. "15.0"
/// rather than "15". Anything else uses the shortest representation.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Formats 'utc_date' into a string like "2024-09-01 05:10". This is the
/// resolution the upload history is displayed at.
pub fn format_history_date(utc_date: &DateTime<Utc>) -> String {
    utc_date.format("%Y-%m-%d %H:%M").to_string()
}
