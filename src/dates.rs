//! Date and time helpers shared by the model, validator and command line.
//!
//! Instants are kept in UTC at millisecond precision and written as
//! ISO-8601 strings (`2024-01-01T09:30:00.000Z`). Calendar questions such as
//! "is this due today" are answered in the local time zone.

use chrono::{
    DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound,
    TimeZone, Utc,
};

/// Current instant, truncated to milliseconds.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Years an instant may fall in and still be written as a plain
/// four-digit ISO-8601 timestamp.
pub const MIN_YEAR: i32 = 0;
pub const MAX_YEAR: i32 = 9999;

/// Whether `t` can be written by [`format_instant`] and read back by
/// [`parse_instant`].
pub fn in_storable_range(t: &DateTime<Utc>) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&t.year())
}

/// Format an instant the way it is stored.
pub fn format_instant(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an ISO-8601 instant.
///
/// Accepts full RFC 3339 timestamps, zone-less date-times (read as local
/// time) and bare `YYYY-MM-DD` dates (read as UTC midnight).
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    parse_any_instant(s).filter(in_storable_range)
}

fn parse_any_instant(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).trunc_subsecs(3));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc).trunc_subsecs(3));
        }
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

/// The last second of `day` in local time, as a UTC instant.
pub fn end_of_local_day(day: NaiveDate) -> Option<DateTime<Utc>> {
    let naive = day.and_hms_opt(23, 59, 59)?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Local calendar day an instant falls on.
pub fn local_day(t: &DateTime<Utc>) -> NaiveDate {
    t.with_timezone(&Local).date_naive()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse human-readable due date input relative to the local current day.
///
/// See [`parse_due_input_on`] for the accepted forms.
pub fn parse_due_input(s: &str) -> Option<DateTime<Utc>> {
    parse_due_input_on(s, today())
}

/// Parse human-readable due date input.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - "monday", "next monday", "this friday", "weekend"
/// - "end of week", "end of month"
/// - "in 3d", "in 2w", "in 1m"
/// - "YYYY-MM-DD"
///
/// Day-level answers resolve to the end of that local day, so a task due
/// "today" is not overdue until the day is over. Anything else falls back to
/// [`parse_instant`].
pub fn parse_due_input_on(s: &str, today: NaiveDate) -> Option<DateTime<Utc>> {
    let lowered = s.trim().to_lowercase();
    if let Some(day) = parse_due_day(&lowered, today) {
        return end_of_local_day(day).filter(in_storable_range);
    }
    parse_instant(s)
}

fn parse_due_day(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    match s {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        "end of week" | "eow" => return Some(end_of_week(today)),
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            let first_of_next = NaiveDate::from_ymd_opt(year, month, 1)?;
            return Some(first_of_next - Duration::days(1));
        }
        "this weekend" | "weekend" => {
            let days_until_saturday = (5 + 7 - today.weekday().num_days_from_monday()) % 7;
            return Some(today + Duration::days(days_until_saturday as i64));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let rest = rest.trim();
        let split = rest.char_indices().last().map_or(0, |(i, _)| i);
        let (amount, unit) = rest.split_at(split);
        if let Ok(n) = amount.trim().parse::<i64>() {
            let offset = match unit {
                "d" => Duration::try_days(n),
                "w" => Duration::try_weeks(n),
                // Approximate: 30 days per month
                "m" => n.checked_mul(30).and_then(Duration::try_days),
                _ => None,
            };
            return today.checked_add_signed(offset?);
        }
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    let current = today.weekday().num_days_from_monday() as i64;
    for (name, target) in weekdays {
        let days_ahead = (target + 7 - current) % 7;
        if s == name || s == format!("this {name}") {
            return Some(today + Duration::days(days_ahead));
        }
        if s == format!("next {name}") {
            let days = if days_ahead == 0 { 7 } else { days_ahead + 7 };
            return Some(today + Duration::days(days));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Sunday of the ISO week containing `today`.
fn end_of_week(today: NaiveDate) -> NaiveDate {
    let weekday = today.weekday().num_days_from_monday() as i64;
    today + Duration::days(6 - weekday)
}

/// Format a due date relative to `today`: "Today", "Tomorrow", "Yesterday",
/// otherwise e.g. "Jan 05, 2024". An absent date renders as "-".
pub fn format_due_relative(due: Option<&DateTime<Utc>>, today: NaiveDate) -> String {
    let Some(due) = due else {
        return "-".into();
    };
    let day = local_day(due);
    match (day - today).num_days() {
        0 => "Today".into(),
        1 => "Tomorrow".into(),
        -1 => "Yesterday".into(),
        _ => day.format("%b %d, %Y").to_string(),
    }
}

/// Serde adapters writing instants with [`format_instant`] and reading them
/// with [`parse_instant`].
pub mod iso {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_instant(t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_instant(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{raw}'")))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            t: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match t {
                Some(t) => s.serialize_str(&super::super::format_instant(t)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(d)? {
                None => Ok(None),
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => super::super::parse_instant(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{raw}'"))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format_instant_uses_millis_and_z() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap();
        assert_eq!(format_instant(&t), "2024-01-01T09:30:00.000Z");
    }

    #[test]
    fn test_parse_instant_forms() {
        let t = parse_instant("2024-01-01T09:30:00.123Z").unwrap();
        assert_eq!(format_instant(&t), "2024-01-01T09:30:00.123Z");

        let offset = parse_instant("2024-01-01T10:30:00+01:00").unwrap();
        assert_eq!(offset, Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap());

        let date_only = parse_instant("2024-01-01").unwrap();
        assert_eq!(date_only, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

        assert!(parse_instant("2024-01-01T12:00").is_some());
        assert!(parse_instant("not a date").is_none());
        assert!(parse_instant("2024-13-45").is_none());
        assert!(parse_instant("   ").is_none());
    }

    #[test]
    fn test_parse_instant_truncates_to_millis() {
        let t = parse_instant("2024-01-01T00:00:00.123456789Z").unwrap();
        assert_eq!(format_instant(&t), "2024-01-01T00:00:00.123Z");
        assert_eq!(parse_instant(&format_instant(&t)), Some(t));
    }

    #[test]
    fn test_parse_due_input_relative_days() {
        // 2024-05-15 is a Wednesday.
        let today = day(2024, 5, 15);
        let due = |s: &str| parse_due_input_on(s, today).map(|t| local_day(&t));

        assert_eq!(due("today"), Some(today));
        assert_eq!(due("Tomorrow"), Some(day(2024, 5, 16)));
        assert_eq!(due("yesterday"), Some(day(2024, 5, 14)));
        assert_eq!(due("in 3d"), Some(day(2024, 5, 18)));
        assert_eq!(due("in 2w"), Some(day(2024, 5, 29)));
        assert_eq!(due("friday"), Some(day(2024, 5, 17)));
        assert_eq!(due("wed"), Some(today));
        assert_eq!(due("next wednesday"), Some(day(2024, 5, 22)));
        assert_eq!(due("next friday"), Some(day(2024, 5, 24)));
        assert_eq!(due("weekend"), Some(day(2024, 5, 18)));
        assert_eq!(due("end of week"), Some(day(2024, 5, 19)));
        assert_eq!(due("eom"), Some(day(2024, 5, 31)));
        assert_eq!(due("2024-06-01"), Some(day(2024, 6, 1)));
        assert_eq!(due("someday"), None);
    }

    #[test]
    fn test_parse_due_input_rejects_huge_offsets() {
        let today = day(2024, 5, 15);
        for input in [
            "in 99999999999999d",
            "in 99999999999999w",
            "in 999999999999999999m",
            "in 9223372036854775807d",
            "in -99999999999999d",
            "in 3000000d",
        ] {
            assert_eq!(parse_due_input_on(input, today), None, "{input}");
        }
        assert!(parse_due_input_on("in 36500d", today).is_some());
    }

    #[test]
    fn test_instants_outside_four_digit_years_are_rejected() {
        assert!(parse_instant("+10240-07-07T23:59:59.000Z").is_none());
        assert!(parse_instant("9999-12-31T00:00:00.000Z").is_some());

        let far = Utc.with_ymd_and_hms(10240, 7, 7, 0, 0, 0).unwrap();
        assert!(!in_storable_range(&far));
        let near = Utc.with_ymd_and_hms(2024, 7, 7, 0, 0, 0).unwrap();
        assert!(in_storable_range(&near));
        assert_eq!(parse_instant(&format_instant(&near)), Some(near));
    }

    #[test]
    fn test_parse_due_input_end_of_month_december() {
        let due = parse_due_input_on("end of month", day(2024, 12, 3)).unwrap();
        assert_eq!(local_day(&due), day(2024, 12, 31));
    }

    #[test]
    fn test_parse_due_input_falls_back_to_instant() {
        let due = parse_due_input_on("2024-01-01T09:30:00Z", day(2024, 5, 15)).unwrap();
        assert_eq!(due, Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap());
    }

    #[test]
    fn test_format_due_relative() {
        let today = day(2024, 5, 15);
        let at = |d: NaiveDate| end_of_local_day(d).unwrap();

        assert_eq!(format_due_relative(None, today), "-");
        assert_eq!(format_due_relative(Some(&at(today)), today), "Today");
        assert_eq!(format_due_relative(Some(&at(day(2024, 5, 16))), today), "Tomorrow");
        assert_eq!(format_due_relative(Some(&at(day(2024, 5, 14))), today), "Yesterday");
        assert_eq!(format_due_relative(Some(&at(day(2024, 1, 5))), today), "Jan 05, 2024");
    }
}
