use chrono::{NaiveDate, NaiveDateTime};

/// Largest owed-sum residual the reconciler will absorb. Anything at or above
/// this is a data error and is reported instead of patched.
pub const TOLERANCE: f64 = 0.02;

/// Rounds to 2 decimal places using round-half-to-even, the rounding the rest
/// of the pipeline assumes. Every derived share goes through this function so
/// the rule lives in exactly one place.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}


/// Parses a date cell rendered as text. Accepts "YYYY-MM-DD" and the
/// "YYYY-MM-DD HH:MM:SS" form spreadsheet readers produce for date cells.
pub fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().or_else(|| {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|dt| dt.date())
    })
}
