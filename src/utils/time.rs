use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use mongodb::bson::DateTime as BsonDateTime;

pub fn chrono_to_bson(dt: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(dt.timestamp_millis())
}

/// Combine a stored calendar date with an optional "HH:MM" time-of-day into a
/// single UTC instant. Without a time the stored instant is used as-is
/// (midnight for date-only values). An unparseable time degrades to the
/// date-only instant rather than discarding the schedule.
pub fn combine_date_time(
    date: Option<DateTime<Utc>>,
    time: Option<&str>,
) -> Option<DateTime<Utc>> {
    let date = date?;
    match time.and_then(|t| NaiveTime::parse_from_str(t.trim(), "%H:%M").ok()) {
        Some(t) => Utc
            .from_utc_datetime(&date.date_naive().and_time(t))
            .into(),
        None => Some(date),
    }
}

/// Parse a schedule date from a request body: "YYYY-MM-DD" (midnight UTC) or
/// a full RFC 3339 instant.
pub fn parse_schedule_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
