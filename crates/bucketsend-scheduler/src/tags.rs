//! Client "Day|Time" preference-tag parsing.
//!
//! Tags look like "Friday|Morning", "Any-day|Night", or
//! "Any-day|Any-time". A missing, empty, or malformed tag means the
//! client hasn't been configured yet; callers skip it, they don't error.

use crate::week::weekday_number;
use crate::windows::SendWindow;

pub const ANY_DAY: &str = "Any-day";
pub const ANY_TIME: &str = "Any-time";

/// Preferred day: a specific ISO weekday, or any day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPref {
    Any,
    /// ISO weekday number, Monday = 1 … Sunday = 7.
    Day(u32),
}

/// Preferred time of day: a named window, or any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePref {
    Any,
    Window(SendWindow),
}

/// Parsed "Day|Time" composite preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreferenceTag {
    pub day: DayPref,
    pub time: TimePref,
}

impl PreferenceTag {
    /// Parse a raw tag. None means not-yet-configured (empty or
    /// unparseable), which downstream treats as a silent skip.
    pub fn parse(tag: &str) -> Option<PreferenceTag> {
        let tag = tag.trim();
        if tag.is_empty() {
            return None;
        }
        let (day_part, time_part) = tag.split_once('|')?;

        let day = if day_part.trim() == ANY_DAY {
            DayPref::Any
        } else {
            DayPref::Day(weekday_number(day_part)?)
        };

        let time = if time_part.trim() == ANY_TIME {
            TimePref::Any
        } else {
            TimePref::Window(SendWindow::parse(time_part.trim())?)
        };

        Some(PreferenceTag { day, time })
    }
}
