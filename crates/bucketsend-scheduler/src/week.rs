//! ISO week and weekday helpers.

use chrono::{Datelike, NaiveDate, Weekday};

/// ISO-8601 week string for a date, e.g. "2026-W35". Uses the ISO week
/// year, which can differ from the calendar year around January 1st.
pub fn iso_week_string(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// ISO weekday number: Monday = 1 … Sunday = 7.
pub fn iso_weekday(date: NaiveDate) -> u32 {
    date.weekday().number_from_monday()
}

/// Map a day name ("Monday" … "Sunday", case-insensitive) to its ISO
/// weekday number. None for anything that isn't a day name.
pub fn weekday_number(name: &str) -> Option<u32> {
    name.trim()
        .parse::<Weekday>()
        .ok()
        .map(|w| w.number_from_monday())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_week_string() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 26).unwrap();
        assert_eq!(iso_week_string(date), "2026-W35");
        // Zero-padded single-digit weeks.
        let jan = NaiveDate::from_ymd_opt(2026, 1, 7).unwrap();
        assert_eq!(iso_week_string(jan), "2026-W02");
    }

    #[test]
    fn test_iso_week_year_boundary() {
        // 2027-01-01 is a Friday belonging to 2026-W53.
        let date = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        assert_eq!(iso_week_string(date), "2026-W53");
    }

    #[test]
    fn test_iso_weekday_numbers() {
        assert_eq!(iso_weekday(NaiveDate::from_ymd_opt(2026, 8, 24).unwrap()), 1); // Monday
        assert_eq!(iso_weekday(NaiveDate::from_ymd_opt(2026, 8, 30).unwrap()), 7); // Sunday
    }

    #[test]
    fn test_weekday_number_parsing() {
        assert_eq!(weekday_number("Monday"), Some(1));
        assert_eq!(weekday_number("friday"), Some(5));
        assert_eq!(weekday_number("Sunday"), Some(7));
        assert_eq!(weekday_number("Any-day"), None);
        assert_eq!(weekday_number(""), None);
    }
}
