use std::sync::LazyLock;

use campus_common::{MetaValue, Metadata};
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use regex::Regex;

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september", "october",
    "november", "december",
];

/// `4 February 2026`, `4. Feb 2026`, `04 Sept. 2026`.
static DAY_MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\.?\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{4})\b")
        .expect("valid regex")
});

/// Already-normalized form.
static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("valid regex"));

static TIME_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,2}[:.]\d{2}\s*(?:am|pm|a\.m\.|p\.m\.)?)\s*(?:-|–|—|to|until)\s*(\d{1,2}[:.]\d{2}\s*(?:am|pm|a\.m\.|p\.m\.)?)")
        .expect("valid regex")
});

/// A lone time. `16:00` stands on its own; `16.00` only with a unit
/// (`16.00 h`, `4.00 pm`), since `04.02` is as likely a day and month.
static SINGLE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,2}:\d{2}(?:\s*(?:am|pm|a\.m\.|p\.m\.|uhr|h\b))?|\d{1,2}\.\d{2}\s*(?:am|pm|a\.m\.|p\.m\.|uhr|h\b))",
    )
    .expect("valid regex")
});

fn month_number(prefix: &str) -> Option<u32> {
    let prefix = prefix.to_lowercase();
    MONTHS
        .iter()
        .position(|m| m.starts_with(&prefix))
        .map(|i| i as u32 + 1)
}

/// First recognizable date in `text`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    if let Some(caps) = ISO_DATE.captures(text) {
        let date = NaiveDate::from_ymd_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?);
        if date.is_some() {
            return date;
        }
    }
    let caps = DAY_MONTH_YEAR.captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month = month_number(&caps[2])?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `date`, `year` and `month` keys for a parsed date.
pub fn date_metadata(date: NaiveDate) -> Metadata {
    let mut meta = Metadata::new();
    meta.insert("date".into(), MetaValue::Text(date.format("%Y-%m-%d").to_string()));
    meta.insert("year".into(), MetaValue::Int(i64::from(date.year())));
    meta.insert("month".into(), MetaValue::Text(date.format("%B").to_string()));
    meta
}

/// `"4:00 pm"` → `16:00`. Already 24h values pass through unchanged.
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    let normalized = text.trim().to_lowercase().replace("a.m.", "am").replace("p.m.", "pm");
    let lower = normalized
        .strip_suffix("uhr")
        .or_else(|| normalized.strip_suffix('h'))
        .unwrap_or(&normalized)
        .trim();
    let (clock, meridiem) = if let Some(rest) = lower.strip_suffix("pm") {
        (rest.trim(), Some(true))
    } else if let Some(rest) = lower.strip_suffix("am") {
        (rest.trim(), Some(false))
    } else {
        (lower, None)
    };

    let (h, m) = clock.split_once([':', '.'])?;
    let mut hour: u32 = h.trim().parse().ok()?;
    let minute: u32 = m.trim().parse().ok()?;
    match meridiem {
        Some(true) if hour < 12 => hour += 12,
        Some(false) if hour == 12 => hour = 0,
        _ => {}
    }
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// `04.02` in `04.02.2026` is not a clock time.
fn runs_into_digits(text: &str, end: usize) -> bool {
    let rest = &text[end..];
    let rest = rest.strip_prefix('.').unwrap_or(rest);
    rest.starts_with(|c: char| c.is_ascii_digit())
}

/// Start and optional end time, as `HH:MM`.
pub fn parse_time_range(text: &str) -> Option<(String, Option<String>)> {
    let fmt = |t: NaiveTime| t.format("%H:%M").to_string();

    let range = TIME_RANGE
        .captures_iter(text)
        .find(|caps| caps.get(0).is_some_and(|m| !runs_into_digits(text, m.end())));
    if let Some(caps) = range {
        let (start_raw, end_raw) = (&caps[1], &caps[2]);
        let mut start = parse_time(start_raw)?;
        let end = parse_time(end_raw);

        // "2:00 - 4:00 pm": a single trailing meridiem covers both ends.
        let start_bare = !start_raw.to_lowercase().contains('m');
        if let Some(end) = end {
            if start_bare && end_raw.to_lowercase().contains('p') && start.hour() + 12 <= end.hour() {
                start = NaiveTime::from_hms_opt(start.hour() + 12, start.minute(), 0)?;
            }
        }
        return Some((fmt(start), end.map(fmt)));
    }

    SINGLE_TIME
        .captures_iter(text)
        .filter(|caps| caps.get(0).is_some_and(|m| !runs_into_digits(text, m.end())))
        .find_map(|caps| parse_time(&caps[1]))
        .map(|t| (fmt(t), None))
}
