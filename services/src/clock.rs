//! Campus calendar helpers. Days roll over at local midnight, where local is
//! UTC shifted by a fixed offset in minutes.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

/// Campus-local date of `now`.
pub fn campus_date(now: DateTime<Utc>, offset_minutes: i32) -> NaiveDate {
    (now + Duration::minutes(offset_minutes as i64)).date_naive()
}

/// UTC instant of the campus-local midnight that starts the day containing `now`.
pub fn day_start(now: DateTime<Utc>, offset_minutes: i32) -> DateTime<Utc> {
    let local_midnight = campus_date(now, offset_minutes)
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default();
    Utc.from_utc_datetime(&local_midnight) - Duration::minutes(offset_minutes as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_moves_the_day_boundary() {
        // 23:30 UTC is already the next day at UTC+7.
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 23, 30, 0).unwrap();
        assert_eq!(campus_date(now, 0), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(campus_date(now, 420), NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(
            day_start(now, 420),
            Utc.with_ymd_and_hms(2024, 5, 1, 17, 0, 0).unwrap()
        );
    }

    #[test]
    fn utc_day_starts_at_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 4, 0, 0).unwrap();
        assert_eq!(day_start(now, 0), Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap());
    }
}
