use chrono::{Datelike, Duration as ChronoDuration, Local, NaiveDate};

/// Largest week offset accepted from callers (about a century either way).
pub const MAX_WEEK_OFFSET: i64 = 5_200;

pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Accepts "YYYY-MM-DD" and full timestamps whose first ten characters are
/// a date (store `date` and `timestamptz` columns both come back this way).
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let t = raw.trim();
    let head = t.get(..10).unwrap_or(t);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

pub fn format_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Monday on or before `today`. Sunday maps six days back, never forward.
pub fn week_monday(today: NaiveDate) -> NaiveDate {
    let back = i64::from(today.weekday().num_days_from_monday());
    today - ChronoDuration::days(back)
}

/// Monday..Sunday of the week `offset` weeks away from the one holding
/// `today`. Callers bound `offset` by `MAX_WEEK_OFFSET`.
pub fn week_window(today: NaiveDate, offset: i64) -> [NaiveDate; 7] {
    let monday = week_monday(today) + ChronoDuration::days(offset * 7);
    std::array::from_fn(|i| monday + ChronoDuration::days(i as i64))
}

/// "Mar 9"
pub fn day_label(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

/// Day of the month shown in the grid header.
pub fn day_number(date: NaiveDate) -> u32 {
    date.day()
}

pub fn week_label(today: NaiveDate, offset: i64) -> String {
    if offset == 0 {
        return "This Week".to_string();
    }
    let days = week_window(today, offset);
    format!("{} - {}", day_label(days[0]), day_label(days[6]))
}
