use chrono::{Duration, NaiveDate};

/// This is the standard way of converting a date to a string in tabtime.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// The last `days` calendar days ending at `today`, oldest first.
pub fn trailing_days(today: NaiveDate, days: u32) -> impl Iterator<Item = NaiveDate> {
    (0..i64::from(days))
        .rev()
        .map(move |back| today - Duration::days(back))
}
