use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

const MONTHS: &str = "January|February|March|April|May|June|July|August|September|October|November|December|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sept|Sep|Oct|Nov|Dec";

static ALL_DAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\ball\s*day\b").expect("all-day regex"));

static MONTH_DAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b({MONTHS})\.?\s+(\d{{1,2}})(?:,?\s*(\d{{4}}))?"
    ))
    .expect("month-day regex")
});

static TIMED_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)(?:\b({MONTHS})\.?\s+(\d{{1,2}})(?:,?\s*(\d{{4}}))?\s+)?(\d{{1,2}}):(\d{{2}})\s*(am|pm)(?:\s*[-–—]\s*(\d{{1,2}}):(\d{{2}})\s*(am|pm))?"
    ))
    .expect("timed-range regex")
});

static URL_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(\d{4})/(\d{2})/(\d{2})(?:/|$)").expect("url date regex"));

/// Outcome of the normalizer. `start == None` means no strategy matched and
/// the caller should treat the candidate as date-unresolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolvedSchedule {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub all_day: bool,
}

struct StrategyInput<'a> {
    text: &'a str,
    all_day_hint: bool,
    fallback_url: &'a str,
}

type Strategy = fn(&StrategyInput<'_>) -> Option<ResolvedSchedule>;

/// First match wins; each fallback stays independently testable.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("all-day", all_day),
    ("timed-range", timed_range),
    ("date-only", date_only),
];

/// Turns a raw date/time text blob into timestamps. `fallback_url` may embed
/// the event date as `/YYYY/MM/DD/` and backs up blobs carrying only a time.
pub fn resolve(text: &str, all_day_hint: bool, fallback_url: &str) -> ResolvedSchedule {
    let input = StrategyInput {
        text,
        all_day_hint,
        fallback_url,
    };
    for (name, strategy) in STRATEGIES {
        if let Some(resolved) = strategy(&input) {
            debug!(strategy = name, "resolved date/time from {text:?}");
            return resolved;
        }
    }
    debug!("no date/time strategy matched {text:?}");
    ResolvedSchedule::default()
}

/// Whether a line carries a date/time signal: a time of day, a month-day
/// pattern, or the literal "all day".
pub fn has_date_signal(line: &str) -> bool {
    ALL_DAY_RE.is_match(line) || TIMED_RANGE_RE.is_match(line) || MONTH_DAY_RE.is_match(line)
}

fn all_day(input: &StrategyInput<'_>) -> Option<ResolvedSchedule> {
    if !input.all_day_hint && !ALL_DAY_RE.is_match(input.text) {
        return None;
    }
    let date = first_month_day(input.text)?;
    Some(ResolvedSchedule {
        start: Some(date.and_time(NaiveTime::MIN)),
        end: None,
        all_day: true,
    })
}

fn timed_range(input: &StrategyInput<'_>) -> Option<ResolvedSchedule> {
    let caps = TIMED_RANGE_RE.captures(input.text)?;

    let date = match caps.get(1) {
        Some(month) => compose_date(
            month.as_str(),
            caps.get(2)?.as_str(),
            caps.get(3).map(|m| m.as_str()),
        )?,
        // No date in the blob itself; fall back to the date embedded in the
        // source URL. Without that, time parsing is abandoned.
        None => url_date(input.fallback_url)?,
    };

    let start_time = compose_time(
        caps.get(4)?.as_str(),
        caps.get(5)?.as_str(),
        caps.get(6)?.as_str(),
    )?;
    let start = date.and_time(start_time);

    let end = match (caps.get(7), caps.get(8), caps.get(9)) {
        (Some(h), Some(m), Some(ap)) => {
            let end_time = compose_time(h.as_str(), m.as_str(), ap.as_str())?;
            let end = date.and_time(end_time);
            if end < start {
                // Retained as-is under a same-day assumption; no rollover.
                debug!("end time precedes start in {:?}", input.text);
            }
            Some(end)
        }
        _ => None,
    };

    Some(ResolvedSchedule {
        start: Some(start),
        end,
        all_day: false,
    })
}

fn date_only(input: &StrategyInput<'_>) -> Option<ResolvedSchedule> {
    let date = first_month_day(input.text)?;
    Some(ResolvedSchedule {
        start: Some(date.and_time(NaiveTime::MIN)),
        end: None,
        all_day: true,
    })
}

fn first_month_day(text: &str) -> Option<NaiveDate> {
    let caps = MONTH_DAY_RE.captures(text)?;
    compose_date(
        caps.get(1)?.as_str(),
        caps.get(2)?.as_str(),
        caps.get(3).map(|m| m.as_str()),
    )
}

fn compose_date(month_name: &str, day: &str, year: Option<&str>) -> Option<NaiveDate> {
    let month = month_number(month_name)?;
    let day: u32 = day.parse().ok()?;
    // A missing year defaults to the current calendar year at parse time.
    // Near a year boundary this can misdate events; accepted policy.
    let year: i32 = match year {
        Some(value) => value.parse().ok()?,
        None => Local::now().year(),
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn compose_time(hour: &str, minute: &str, am_pm: &str) -> Option<NaiveTime> {
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    if hour == 0 || hour > 12 {
        return None;
    }
    // 12:00am maps to 00:00 and 12:00pm to 12:00.
    let hour = hour % 12 + if am_pm.eq_ignore_ascii_case("pm") { 12 } else { 0 };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn url_date(url: &str) -> Option<NaiveDate> {
    let caps = URL_DATE_RE.captures(url)?;
    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    let month: u32 = caps.get(2)?.as_str().parse().ok()?;
    let day: u32 = caps.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    let key = if lower.len() >= 3 { &lower[..3] } else { return None };
    match key {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .expect("valid date")
            .and_hms_opt(h, mi, 0)
            .expect("valid time")
    }

    #[test]
    fn timed_range_with_explicit_year() {
        let resolved = resolve("March 5, 2025 9:00am - 11:00am", false, "");
        assert_eq!(resolved.start, Some(dt(2025, 3, 5, 9, 0)));
        assert_eq!(resolved.end, Some(dt(2025, 3, 5, 11, 0)));
        assert!(!resolved.all_day);
    }

    #[test]
    fn missing_year_defaults_to_current_year() {
        let resolved = resolve("March 5 9:00am", false, "");
        let start = resolved.start.expect("start resolved");
        assert_eq!(start.year(), Local::now().year());
        assert_eq!(start.month(), 3);
        assert_eq!(start.day(), 5);
    }

    #[test]
    fn all_day_text_yields_no_end() {
        let resolved = resolve("All day March 5", false, "");
        let start = resolved.start.expect("start resolved");
        assert_eq!(start.year(), Local::now().year());
        assert_eq!((start.month(), start.day()), (3, 5));
        assert_eq!(start.time(), NaiveTime::MIN);
        assert_eq!(resolved.end, None);
        assert!(resolved.all_day);
    }

    #[test]
    fn all_day_hint_beats_timed_parse() {
        let resolved = resolve("March 5, 2025 9:00am", true, "");
        assert_eq!(resolved.start, Some(dt(2025, 3, 5, 0, 0)));
        assert_eq!(resolved.end, None);
        assert!(resolved.all_day);
    }

    #[test]
    fn bare_time_uses_date_from_url() {
        let resolved = resolve(
            "7:30pm",
            false,
            "https://www.hawaii.edu/calendar/manoa/2025/03/05/event.php?et_id=9",
        );
        assert_eq!(resolved.start, Some(dt(2025, 3, 5, 19, 30)));
        assert!(!resolved.all_day);
    }

    #[test]
    fn bare_time_without_url_date_fails() {
        let resolved = resolve("7:30pm", false, "https://example.edu/event.php?et_id=9");
        assert_eq!(resolved.start, None);
        assert!(!resolved.all_day);
    }

    #[test]
    fn date_only_falls_back_to_all_day() {
        let resolved = resolve("January 20, 2026", false, "");
        assert_eq!(resolved.start, Some(dt(2026, 1, 20, 0, 0)));
        assert_eq!(resolved.end, None);
        assert!(resolved.all_day);
    }

    #[test]
    fn noon_and_midnight_map_correctly() {
        let noon = resolve("May 1, 2025 12:00pm", false, "");
        assert_eq!(noon.start, Some(dt(2025, 5, 1, 12, 0)));
        let midnight = resolve("May 1, 2025 12:00am", false, "");
        assert_eq!(midnight.start, Some(dt(2025, 5, 1, 0, 0)));
    }

    #[test]
    fn inverted_range_is_retained_without_rollover() {
        let resolved = resolve("March 5, 2025 10:00pm - 1:00am", false, "");
        assert_eq!(resolved.start, Some(dt(2025, 3, 5, 22, 0)));
        assert_eq!(resolved.end, Some(dt(2025, 3, 5, 1, 0)));
    }

    #[test]
    fn en_dash_ranges_parse() {
        let resolved = resolve("Sept 12, 2025 1:00pm \u{2013} 2:30pm", false, "");
        assert_eq!(resolved.start, Some(dt(2025, 9, 12, 13, 0)));
        assert_eq!(resolved.end, Some(dt(2025, 9, 12, 14, 30)));
    }

    #[test]
    fn unparseable_blob_resolves_nothing() {
        let resolved = resolve("TBD - check the website", false, "");
        assert_eq!(resolved, ResolvedSchedule::default());
    }
}
