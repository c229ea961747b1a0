use chrono::{Datelike, NaiveDate, Weekday};

use crate::model::{DayOverride, ScheduleConfig};

// ── Business-Day Oracle ──────────────────────────────────────────

/// Whether the clinic accepts bookings on `date`. Pure and total for any
/// date — past dates are an admission concern, not a business-day concern.
///
/// Rule order: a closed override beats everything; then the weekend
/// exclusions; then the holiday set.
pub fn is_bookable_day(
    date: NaiveDate,
    config: &ScheduleConfig,
    day_override: Option<&DayOverride>,
) -> bool {
    if let Some(ov) = day_override
        && ov.is_closed {
            return false;
        }
    match date.weekday() {
        Weekday::Sat if !config.include_saturday => return false,
        Weekday::Sun if !config.include_sunday => return false,
        _ => {}
    }
    !config.holiday_dates.contains(&date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn closed() -> DayOverride {
        DayOverride {
            is_closed: true,
            ..DayOverride::default()
        }
    }

    #[test]
    fn weekdays_bookable_by_default() {
        let config = ScheduleConfig::default();
        // 2025-03-03 is a Monday
        for offset in 0..5 {
            let d = date(2025, 3, 3 + offset);
            assert!(is_bookable_day(d, &config, None), "{d} should be bookable");
        }
    }

    #[test]
    fn weekend_excluded_unless_included() {
        let mut config = ScheduleConfig::default();
        let saturday = date(2025, 3, 8);
        let sunday = date(2025, 3, 9);

        assert!(!is_bookable_day(saturday, &config, None));
        assert!(!is_bookable_day(sunday, &config, None));

        config.include_saturday = true;
        assert!(is_bookable_day(saturday, &config, None));
        assert!(!is_bookable_day(sunday, &config, None));

        config.include_sunday = true;
        assert!(is_bookable_day(sunday, &config, None));
    }

    #[test]
    fn holiday_excluded_on_a_weekday() {
        let mut config = ScheduleConfig::default();
        let wednesday = date(2025, 3, 5);
        config.holiday_dates.insert(wednesday);
        assert!(!is_bookable_day(wednesday, &config, None));
    }

    #[test]
    fn closed_override_beats_everything() {
        let mut config = ScheduleConfig::default();
        config.include_saturday = true;

        let monday = date(2025, 3, 3);
        let saturday = date(2025, 3, 8);
        let ov = closed();

        assert!(!is_bookable_day(monday, &config, Some(&ov)));
        assert!(!is_bookable_day(saturday, &config, Some(&ov)));
    }

    #[test]
    fn open_override_does_not_reopen_weekend() {
        // A capacity-only override on a Saturday leaves the weekend rule
        // in force.
        let config = ScheduleConfig::default();
        let saturday = date(2025, 3, 8);
        let ov = DayOverride {
            max_bookings: Some(10),
            ..DayOverride::default()
        };
        assert!(!is_bookable_day(saturday, &config, Some(&ov)));
    }

    #[test]
    fn past_dates_are_still_judged_by_the_same_rules() {
        let config = ScheduleConfig::default();
        assert!(is_bookable_day(date(1999, 12, 31), &config, None)); // a Friday
        assert!(!is_bookable_day(date(2000, 1, 1), &config, None)); // a Saturday
    }
}
