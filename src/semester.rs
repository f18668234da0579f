//! Semester partition keys for the output directory.

use chrono::{Datelike, NaiveDate};

/// Derives the semester tag for a run.
///
/// A non-blank hint from the source (the first record's `Semester` field)
/// wins, lowercased and trimmed. Otherwise the tag is computed from the
/// calendar date.
pub fn derive(hint: Option<&str>, today: NaiveDate) -> String {
    match hint.map(|h| h.trim().to_lowercase()) {
        Some(tag) if !tag.is_empty() => tag,
        _ => current_semester(today),
    }
}

/// Computes the date-based semester tag, e.g. `sp26` or `fa25`.
///
/// January through July count as spring, August through December as fall.
pub fn current_semester(today: NaiveDate) -> String {
    let season = if today.month() <= 7 { "sp" } else { "fa" };
    format!("{season}{:02}", today.year() % 100)
}
