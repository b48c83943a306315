//! Unix `date` style timestamps, e.g. `Fri Jul 30 21:25:10 BST 2021`

use chrono::{NaiveDateTime, Utc};

/// Format used when writing `timeStamp`
///
/// The zone is a literal abbreviation, so the clock must be read in UTC.
pub const UNIX_DATE_FORMAT: &str = "%a %b %e %H:%M:%S UTC %Y";

/// The current time in Unix `date` format
pub fn now_unix_date() -> String {
    Utc::now().format(UNIX_DATE_FORMAT).to_string()
}

/// Parse a Unix `date` timestamp
///
/// The zone token is accepted but ignored, and the weekday is not checked
/// against the date. A five-token form without a zone is also accepted.
pub fn parse_unix_date(text: &str) -> Option<NaiveDateTime> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let (month, day, time, year) = match tokens.as_slice() {
        [_weekday, month, day, time, _zone, year] => (month, day, time, year),
        [_weekday, month, day, time, year] => (month, day, time, year),
        _ => return None,
    };
    let normalized = format!("{} {} {} {}", month, day, time, year);
    NaiveDateTime::parse_from_str(&normalized, "%b %d %H:%M:%S %Y").ok()
}
