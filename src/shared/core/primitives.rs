use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};

/// Render a UTC instant as ISO-8601 with a literal `Z` designator.
///
/// Precision is capped at microseconds; the fractional part is left out
/// entirely when it is zero.
pub fn format_utc_z(at: DateTime<Utc>) -> String {
    let at = at.trunc_subsecs(6);
    let precision = if at.timestamp_subsec_nanos() == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    at.to_rfc3339_opts(precision, true)
}

/// Parse an ISO-8601 timestamp into UTC.
///
/// A trailing `Z` is rewritten to `+00:00` first. Explicit offsets are
/// normalised to UTC and a timestamp without any offset is taken as UTC.
pub fn parse_iso_utc(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let normalized = match raw.strip_suffix('Z') {
        Some(head) => format!("{head}+00:00"),
        None => raw.to_string(),
    };

    DateTime::parse_from_rfc3339(&normalized)
        .map(|at| at.with_timezone(&Utc))
        .or_else(|err| {
            NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc())
                .map_err(|_| err)
        })
}

#[cfg(test)]
mod primitives_tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use rstest::rstest;

    #[rstest]
    fn it_should_format_whole_seconds_without_a_fraction() {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 3, 0, 0).unwrap();
        assert_eq!(format_utc_z(at), "2025-06-01T03:00:00Z");
    }

    #[rstest]
    fn it_should_format_sub_seconds_at_microsecond_precision() {
        let at = Utc
            .with_ymd_and_hms(2025, 6, 1, 3, 0, 0)
            .unwrap()
            .with_nanosecond(123_456_789)
            .unwrap();
        assert_eq!(format_utc_z(at), "2025-06-01T03:00:00.123456Z");
    }

    #[rstest]
    fn it_should_never_emit_a_numeric_offset() {
        let formatted = format_utc_z(Utc::now());
        assert!(formatted.ends_with('Z'));
        assert!(!formatted.contains("+00:00"));
    }

    #[rstest]
    #[case("2025-06-01T03:00:00Z", "2025-06-01T03:00:00Z")]
    #[case("2025-06-01T03:00:00+00:00", "2025-06-01T03:00:00Z")]
    #[case("2025-06-01T12:00:00+09:00", "2025-06-01T03:00:00Z")]
    #[case("2025-06-01T03:00:00.250000Z", "2025-06-01T03:00:00.250Z")]
    #[case("2025-06-01T03:00:00", "2025-06-01T03:00:00Z")]
    fn it_should_parse_iso_timestamps_into_utc(#[case] raw: &str, #[case] expected: &str) {
        let parsed = parse_iso_utc(raw).expect("expected a valid timestamp");
        assert_eq!(
            parsed,
            DateTime::parse_from_rfc3339(expected).unwrap().with_timezone(&Utc)
        );
    }

    #[rstest]
    #[case("")]
    #[case("yesterday")]
    #[case("2025-13-01T00:00:00Z")]
    #[case("01/06/2025 03:00")]
    fn it_should_reject_non_iso_timestamps(#[case] raw: &str) {
        assert!(parse_iso_utc(raw).is_err());
    }

    #[rstest]
    fn it_should_round_trip_a_formatted_timestamp() {
        let at = Utc::now().trunc_subsecs(6);
        assert_eq!(parse_iso_utc(&format_utc_z(at)).unwrap(), at);
    }
}
