//! Text normalization shared by the venue scrapers.
//!
//! Every venue spells times and durations differently; these helpers turn them
//! into `HH:MM` (24h), `YYYY-MM-DD HH:MM` showtimes and whole minutes.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

/// Canonical showtime layout. Lexicographic order equals chronological order.
pub const SHOWTIME_FORMAT: &str = "%Y-%m-%d %H:%M";

static RE_TIME_12H: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d{1,2})(?::(\d{2}))?\s*([ap])\.?\s*m\.?\s*$")
        .expect("invalid regex: 12h time")
});

static RE_RUN_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Run Time:\s*(\d+)\s*min\.?").expect("invalid regex: run time")
});

static RE_ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?").expect("invalid regex: iso duration")
});

static RE_HOURS_MINUTES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*hrs?\s*(\d+)\s*min").expect("invalid regex: hours minutes")
});

static RE_MINUTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*min").expect("invalid regex: minutes"));

/// Parse `7:30 pm`, `7 pm`, `7:30PM` or `7:30 p.m.` into `HH:MM` (24h).
pub fn parse_time_12h(text: &str) -> Option<String> {
    let caps = RE_TIME_12H.captures(text)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    if !(1..=12).contains(&hour) || minute > 59 {
        return None;
    }
    let pm = caps[3].eq_ignore_ascii_case("p");
    let hour24 = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    };
    Some(format!("{:02}:{:02}", hour24, minute))
}

/// `Run Time: 123 min.` anywhere in the text.
pub fn gateway_runtime(text: &str) -> Option<u32> {
    RE_RUN_TIME
        .captures(text)
        .and_then(|c| c[1].parse().ok())
}

/// ISO-8601 duration as used by JSON-LD: `PT2H42M`, `PT102M`, `PT2H`.
pub fn iso_duration_minutes(text: &str) -> Option<u32> {
    let caps = RE_ISO_DURATION.captures(text.trim())?;
    if caps.get(1).is_none() && caps.get(2).is_none() {
        return None;
    }
    let hours: u32 = caps.get(1).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
    let minutes: u32 = caps.get(2).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
    let total = hours.checked_mul(60)?.checked_add(minutes)?;
    (total > 0).then_some(total)
}

/// `Drama | 2 hr 35 min` or `Comedy | 107 min`. Hours+minutes wins.
pub fn hours_minutes_runtime(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Some(caps) = RE_HOURS_MINUTES.captures(text) {
        let hours: u32 = caps[1].parse().ok()?;
        let minutes: u32 = caps[2].parse().ok()?;
        return hours.checked_mul(60)?.checked_add(minutes);
    }
    RE_MINUTES.captures(text).and_then(|c| c[1].parse().ok())
}

/// `YYYY-MM-DD HH:MM`, with an optional ` (label)` suffix.
pub fn format_showtime(date: NaiveDate, hm: &str, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("{} {} ({})", date.format("%Y-%m-%d"), hm, label),
        None => format!("{} {}", date.format("%Y-%m-%d"), hm),
    }
}

/// `September 24, 8:45 pm` in the given year.
pub fn parse_month_day_time(text: &str, year: i32) -> Option<String> {
    let stamped = format!("{} {}", text.trim(), year);
    NaiveDateTime::parse_from_str(&stamped, "%B %d, %I:%M %p %Y")
        .ok()
        .map(|dt| dt.format(SHOWTIME_FORMAT).to_string())
}

/// `Mon, Sep 29` plus `7:00 PM` in the given year.
///
/// The weekday is dropped, it is not checked against the resulting date.
pub fn parse_weekday_date_time(date_text: &str, time_text: &str, year: i32) -> Option<String> {
    let date_text = date_text.trim();
    let month_day = match date_text.split_once(',') {
        Some((_, rest)) => rest.trim(),
        None => date_text,
    };
    let date = NaiveDate::parse_from_str(&format!("{} {}", month_day, year), "%b %d %Y").ok()?;
    let hm = parse_time_12h(time_text)?;
    Some(format_showtime(date, &hm, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_hour_times() {
        assert_eq!(parse_time_12h("7:30 pm").as_deref(), Some("19:30"));
        assert_eq!(parse_time_12h("7 pm").as_deref(), Some("19:00"));
        assert_eq!(parse_time_12h(" 11:05AM ").as_deref(), Some("11:05"));
        assert_eq!(parse_time_12h("9:15 p.m.").as_deref(), Some("21:15"));
    }

    #[test]
    fn twelve_hour_noon_and_midnight() {
        assert_eq!(parse_time_12h("12:00 am").as_deref(), Some("00:00"));
        assert_eq!(parse_time_12h("12:10 pm").as_deref(), Some("12:10"));
    }

    #[test]
    fn twelve_hour_rejects_garbage() {
        assert_eq!(parse_time_12h("19:30"), None);
        assert_eq!(parse_time_12h("13:00 pm"), None);
        assert_eq!(parse_time_12h("0:30 am"), None);
        assert_eq!(parse_time_12h("7:75 pm"), None);
        assert_eq!(parse_time_12h("Sold Out"), None);
        assert_eq!(parse_time_12h(""), None);
    }

    #[test]
    fn gateway_run_time() {
        assert_eq!(gateway_runtime("Rated R | Run Time: 123 min. | 2024"), Some(123));
        assert_eq!(gateway_runtime("run time:95 min"), Some(95));
        assert_eq!(gateway_runtime("Run Time: TBD"), None);
    }

    #[test]
    fn iso_durations() {
        assert_eq!(iso_duration_minutes("PT2H42M"), Some(162));
        assert_eq!(iso_duration_minutes("PT102M"), Some(102));
        assert_eq!(iso_duration_minutes("PT2H"), Some(120));
        assert_eq!(iso_duration_minutes("PT"), None);
        assert_eq!(iso_duration_minutes("PT0M"), None);
        assert_eq!(iso_duration_minutes("P1D"), None);
    }

    #[test]
    fn descriptive_runtimes() {
        assert_eq!(hours_minutes_runtime("Drama | 2 hr 35 min"), Some(155));
        assert_eq!(hours_minutes_runtime("Drama | 1 hrs 5 min"), Some(65));
        assert_eq!(hours_minutes_runtime("Comedy | 107 min"), Some(107));
        assert_eq!(hours_minutes_runtime("Documentary | 2 hr"), None);
        assert_eq!(hours_minutes_runtime("   "), None);
    }

    #[test]
    fn showtime_formatting() {
        let date = NaiveDate::from_ymd_opt(2025, 9, 4).unwrap();
        assert_eq!(format_showtime(date, "19:30", None), "2025-09-04 19:30");
        assert_eq!(format_showtime(date, "19:30", Some("4K")), "2025-09-04 19:30 (4K)");
    }

    #[test]
    fn month_day_time() {
        assert_eq!(
            parse_month_day_time("September 24, 8:45 pm", 2025).as_deref(),
            Some("2025-09-24 20:45")
        );
        assert_eq!(
            parse_month_day_time("October 3, 11:00 AM", 2025).as_deref(),
            Some("2025-10-03 11:00")
        );
        assert_eq!(parse_month_day_time("Tomorrow, 8:45 pm", 2025), None);
    }

    #[test]
    fn weekday_date_time() {
        assert_eq!(
            parse_weekday_date_time("Mon, Sep 29", "7:00 PM", 2025).as_deref(),
            Some("2025-09-29 19:00")
        );
        // Weekday does not have to agree with the reference year.
        assert_eq!(
            parse_weekday_date_time("Fri, Jan 2", "1:30 PM", 2025).as_deref(),
            Some("2025-01-02 13:30")
        );
        assert_eq!(parse_weekday_date_time("Mon, Sep 29", "TBA", 2025), None);
        assert_eq!(parse_weekday_date_time("Someday", "7:00 PM", 2025), None);
    }
}
