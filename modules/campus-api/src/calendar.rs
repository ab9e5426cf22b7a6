// Calendar projection of the events dataset.

use campus_common::Record;
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEntry {
    pub title: String,
    pub url: String,
    /// `YYYY-MM-DD` for all-day entries, otherwise `YYYY-MM-DDTHH:MM:SS`.
    pub start: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    pub all_day: bool,
    pub location: Option<String>,
    pub speaker: Option<String>,
    pub description: String,
}

fn time(record: &Record, key: &str) -> Option<NaiveTime> {
    record
        .meta_text(key)
        .and_then(|t| NaiveTime::parse_from_str(t, "%H:%M").ok())
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", cut.trim_end())
}

/// One entry per event with a readable date, ordered by start.
///
/// Without a start time the entry is all-day. An end time is only used
/// together with a start time.
pub fn calendar_entry(record: &Record) -> Option<CalendarEntry> {
    let date = NaiveDate::parse_from_str(record.meta_text("date")?, "%Y-%m-%d").ok()?;
    let start = time(record, "time_start").map(|t| date.and_time(t));
    let end = start.and(time(record, "time_end")).map(|t| date.and_time(t));

    Some(CalendarEntry {
        title: record.title.clone(),
        url: record.url.clone(),
        start: match start {
            Some(start) => start.format("%Y-%m-%dT%H:%M:%S").to_string(),
            None => date.format("%Y-%m-%d").to_string(),
        },
        end: end.map(|e| e.format("%Y-%m-%dT%H:%M:%S").to_string()),
        all_day: start.is_none(),
        location: record.meta_text("location").map(str::to_string),
        speaker: record.meta_text("speaker").map(str::to_string),
        description: preview(&record.description),
    })
}

pub fn calendar_entries<'a>(records: impl IntoIterator<Item = &'a Record>) -> Vec<CalendarEntry> {
    let mut entries: Vec<CalendarEntry> = records.into_iter().filter_map(calendar_entry).collect();
    entries.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.title.cmp(&b.title)));
    entries
}
