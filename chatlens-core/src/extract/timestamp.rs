//! Store timestamp conversion
//!
//! The store records send times as nanoseconds since 2001-01-01 00:00:00 UTC,
//! not the Unix epoch. The 978307200-second offset between the two epochs is
//! where off-by-an-era bugs live, so the conversion is confined to this module
//! and pinned by known-date tests.

use chrono::{DateTime, TimeZone, Utc};

/// Seconds between 1970-01-01 and 2001-01-01, both UTC.
pub const APPLE_EPOCH_OFFSET: i64 = 978_307_200;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Convert a store timestamp (nanoseconds since 2001-01-01 UTC) to UTC,
/// preserving sub-second precision.
///
/// Total over all of `i64`: the nanosecond unit caps raw values at roughly
/// the year 2262, far inside chrono's representable range. Negative values
/// (pre-2001 clock skew) convert correctly too.
pub fn apple_ns_to_utc(apple_ns: i64) -> DateTime<Utc> {
    let unix_secs = apple_ns.div_euclid(NANOS_PER_SEC) + APPLE_EPOCH_OFFSET;
    let subsec = apple_ns.rem_euclid(NANOS_PER_SEC) as u32;
    match Utc.timestamp_opt(unix_secs, subsec) {
        chrono::LocalResult::Single(dt) => dt,
        // Unreachable: i64 nanosecond inputs stay within chrono's range.
        _ => DateTime::<Utc>::UNIX_EPOCH,
    }
}

/// Convert a UTC instant back to a store timestamp in nanoseconds.
///
/// Inverse of [`apple_ns_to_utc`] for instants before ~2262.
pub fn utc_to_apple_ns(at: DateTime<Utc>) -> i64 {
    (at.timestamp() - APPLE_EPOCH_OFFSET) * NANOS_PER_SEC + i64::from(at.timestamp_subsec_nanos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Tz;

    #[test]
    fn test_known_instant() {
        // 2023-01-01 00:00:00 UTC is 694224000 seconds after the store epoch
        // and 1672531200 seconds after the Unix epoch.
        let apple_ns = 694_224_000 * NANOS_PER_SEC;
        let dt = apple_ns_to_utc(apple_ns);
        assert_eq!(dt.timestamp(), 1_672_531_200);
        assert_eq!(dt.to_rfc3339(), "2023-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_epoch_origin() {
        let dt = apple_ns_to_utc(0);
        assert_eq!(dt.to_rfc3339(), "2001-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_subsecond_preserved() {
        let apple_ns = 694_224_000 * NANOS_PER_SEC + 123_456_789;
        let dt = apple_ns_to_utc(apple_ns);
        assert_eq!(dt.timestamp_subsec_nanos(), 123_456_789);
    }

    #[test]
    fn test_pre_epoch_value() {
        // One second before the store epoch lands at 2000-12-31 23:59:59 UTC.
        let dt = apple_ns_to_utc(-NANOS_PER_SEC);
        assert_eq!(dt.to_rfc3339(), "2000-12-31T23:59:59+00:00");
    }

    #[test]
    fn test_round_trip_inverse() {
        for apple_ns in [0i64, 1, 694_224_000 * NANOS_PER_SEC + 42, -5 * NANOS_PER_SEC] {
            assert_eq!(utc_to_apple_ns(apple_ns_to_utc(apple_ns)), apple_ns);
        }
    }

    #[test]
    fn test_localization_round_trip() {
        // A store value representing 2019-04-20 00:00:00 in US/Pacific must
        // come back as that same wall-clock time when localized there.
        let tz: Tz = "US/Pacific".parse().unwrap();
        let local = chrono::NaiveDate::from_ymd_opt(2019, 4, 20)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let utc = tz
            .from_local_datetime(&local)
            .single()
            .unwrap()
            .with_timezone(&Utc);

        let converted = apple_ns_to_utc(utc_to_apple_ns(utc));
        assert_eq!(converted.with_timezone(&tz).naive_local(), local);
    }
}
