use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// Brazilian day-first format, tried before any ISO form
const DAY_FIRST_FORMAT: &str = "%d/%m/%Y";

const ISO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// `%z` accepts both `+0300` and `+03:00`
const ISO_OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
];

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Normalize a free-text partner date.
///
/// `dd/MM/yyyy` wins; otherwise ISO-8601 is attempted, extended or basic,
/// down to hour or year-month precision. Anything else, including empty
/// input, is absent. Never falls back to a default date.
pub fn normalize_date(raw: Option<&str>) -> Option<NaiveDateTime> {
    let value = raw.map(str::trim).filter(|s| !s.is_empty())?;

    parse_day_first(value).or_else(|| parse_iso(value))
}

fn parse_day_first(value: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(value, DAY_FIRST_FORMAT)
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

fn parse_iso(value: &str) -> Option<NaiveDateTime> {
    // Offsets keep the wall-clock time the partner wrote
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for format in ISO_OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.naive_local());
        }
    }

    // A UTC designator changes nothing about the wall-clock reading
    let local = value
        .strip_suffix('Z')
        .or_else(|| value.strip_suffix('z'))
        .unwrap_or(value);

    for format in ISO_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(local, format) {
            return Some(dt);
        }
    }

    parse_hour_only(local)
        .or_else(|| {
            NaiveDate::parse_from_str(local, ISO_DATE_FORMAT)
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
        .or_else(|| parse_year_month(local))
        .or_else(|| parse_basic(local))
}

/// `2024-01-31T10`: chrono needs minutes, so supply them
fn parse_hour_only(value: &str) -> Option<NaiveDateTime> {
    let bytes = value.as_bytes();
    if bytes.len() != 13 || !matches!(bytes[10], b'T' | b' ') {
        return None;
    }
    NaiveDateTime::parse_from_str(&format!("{}T{}:00", &value[..10], &value[11..]), "%Y-%m-%dT%H:%M").ok()
}

/// `2024-01` is the first day of the month
fn parse_year_month(value: &str) -> Option<NaiveDateTime> {
    if value.len() != 7 || value.as_bytes()[4] != b'-' {
        return None;
    }
    NaiveDate::parse_from_str(&format!("{}-01", value), ISO_DATE_FORMAT)
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

/// Basic format `YYYYMMDD`, optionally followed by `THHMM` or `THHMMSS`.
/// Sliced by hand because `%Y` would swallow every digit.
fn parse_basic(value: &str) -> Option<NaiveDateTime> {
    let (date, time) = match value.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (value, None),
    };
    if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let day = NaiveDate::from_ymd_opt(
        date[..4].parse().ok()?,
        date[4..6].parse().ok()?,
        date[6..].parse().ok()?,
    )?;
    let time = match time.map(str::len) {
        None => NaiveTime::MIN,
        Some(4) => NaiveTime::parse_from_str(time?, "%H%M").ok()?,
        Some(6) => NaiveTime::parse_from_str(time?, "%H%M%S").ok()?,
        Some(_) => return None,
    };
    Some(day.and_time(time))
}

/// Render a date for tabular output: date-only at midnight, otherwise with time.
/// Absent dates render as an empty cell.
pub fn format_date(value: Option<NaiveDateTime>) -> String {
    match value {
        Some(dt) if dt.time() == NaiveTime::MIN => dt.format("%Y-%m-%d").to_string(),
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(NaiveTime::MIN)
    }

    #[test]
    fn test_day_first_format() {
        assert_eq!(normalize_date(Some("31/01/2024")), Some(ymd(2024, 1, 31)));
        assert_eq!(normalize_date(Some("  05/03/2023 ")), Some(ymd(2023, 3, 5)));
    }

    #[test]
    fn test_iso_fallback() {
        assert_eq!(normalize_date(Some("2024-01-31")), Some(ymd(2024, 1, 31)));

        let with_time = normalize_date(Some("2024-01-31T14:30:00")).unwrap();
        assert_eq!(with_time.format("%H:%M").to_string(), "14:30");

        let spaced = normalize_date(Some("2024-01-31 08:15")).unwrap();
        assert_eq!(spaced.format("%H:%M").to_string(), "08:15");

        let offset = normalize_date(Some("2024-01-31T10:00:00-03:00")).unwrap();
        assert_eq!(offset.format("%Y-%m-%d %H:%M").to_string(), "2024-01-31 10:00");
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_iso_offsets_and_utc_designator() {
        let expected = Some(at(2024, 1, 31, 10, 0));
        assert_eq!(normalize_date(Some("2024-01-31T10:00Z")), expected);
        assert_eq!(normalize_date(Some("2024-01-31T10:00:00Z")), expected);
        assert_eq!(normalize_date(Some("2024-01-31T10:00:00+0300")), expected);
        assert_eq!(normalize_date(Some("2024-01-31T10:00:00.000+0300")), expected);
        assert_eq!(normalize_date(Some("2024-01-31T10:00+03:00")), expected);
        assert_eq!(normalize_date(Some("2024-01-31 10:00:00-0300")), expected);
    }

    #[test]
    fn test_iso_reduced_precision() {
        assert_eq!(normalize_date(Some("2024-01-31T10")), Some(at(2024, 1, 31, 10, 0)));
        assert_eq!(normalize_date(Some("2024-01")), Some(ymd(2024, 1, 1)));
        assert_eq!(normalize_date(Some("2024-13")), None);
        assert_eq!(normalize_date(Some("2024-01-31T25")), None);
    }

    #[test]
    fn test_iso_basic_format() {
        assert_eq!(normalize_date(Some("20240131")), Some(ymd(2024, 1, 31)));
        assert_eq!(normalize_date(Some("20240131T1030")), Some(at(2024, 1, 31, 10, 30)));
        assert_eq!(
            normalize_date(Some("20240131T103015")),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap().and_hms_opt(10, 30, 15)
        );
        assert_eq!(normalize_date(Some("20241301")), None);
        assert_eq!(normalize_date(Some("202401311")), None);
        assert_eq!(normalize_date(Some("20240131T10")), None);
    }

    #[test]
    fn test_invalid_dates_are_absent() {
        assert_eq!(normalize_date(Some("not-a-date")), None);
        assert_eq!(normalize_date(Some("")), None);
        assert_eq!(normalize_date(Some("   ")), None);
        assert_eq!(normalize_date(None), None);
        // Day-first with an impossible day must not be rescued by the ISO path
        assert_eq!(normalize_date(Some("31/02/2024")), None);
        // Trailing text is rejected rather than truncated
        assert_eq!(normalize_date(Some("31/01/2024 10:30")), None);
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(Some(ymd(2024, 1, 31))), "2024-01-31");
        let dt = normalize_date(Some("2024-01-31T14:30:05")).unwrap();
        assert_eq!(format_date(Some(dt)), "2024-01-31 14:30:05");
        assert_eq!(format_date(None), "");
        // Output is readable by the normalizer again
        assert_eq!(normalize_date(Some(format_date(Some(dt)).as_str())), Some(dt));
    }
}
