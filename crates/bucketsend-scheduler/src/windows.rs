//! Daily send-window classifier.
//!
//! Works on a `NaiveDateTime` already converted to the scheduling
//! timezone; every function here is pure.

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// The four named daily send windows, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SendWindow {
    Morning,
    Midday,
    Afternoon,
    Night,
}

impl SendWindow {
    /// Canonical order: Morning, Midday, Afternoon, Night.
    pub const ALL: [SendWindow; 4] = [
        SendWindow::Morning,
        SendWindow::Midday,
        SendWindow::Afternoon,
        SendWindow::Night,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SendWindow::Morning => "Morning",
            SendWindow::Midday => "Midday",
            SendWindow::Afternoon => "Afternoon",
            SendWindow::Night => "Night",
        }
    }

    pub fn parse(s: &str) -> Option<SendWindow> {
        match s {
            "Morning" => Some(SendWindow::Morning),
            "Midday" => Some(SendWindow::Midday),
            "Afternoon" => Some(SendWindow::Afternoon),
            "Night" => Some(SendWindow::Night),
            _ => None,
        }
    }

    /// Half-open `[start, end)` bounds in minutes since midnight.
    /// Morning shifts to 10:30–11:30 on Mondays.
    fn bounds(&self, monday: bool) -> (u32, u32) {
        match self {
            SendWindow::Morning if monday => (10 * 60 + 30, 11 * 60 + 30),
            SendWindow::Morning => (8 * 60, 9 * 60),
            SendWindow::Midday => (12 * 60, 13 * 60),
            SendWindow::Afternoon => (16 * 60, 17 * 60),
            SendWindow::Night => (20 * 60, 21 * 60),
        }
    }
}

fn minute_of_day(now: NaiveDateTime) -> u32 {
    now.hour() * 60 + now.minute()
}

fn is_monday(now: NaiveDateTime) -> bool {
    now.weekday() == Weekday::Mon
}

/// The window whose half-open interval contains `now`, if any.
pub fn current_window(now: NaiveDateTime) -> Option<SendWindow> {
    let monday = is_monday(now);
    let minute = minute_of_day(now);
    SendWindow::ALL.into_iter().find(|w| {
        let (start, end) = w.bounds(monday);
        minute >= start && minute < end
    })
}

/// The first window whose start is strictly after `now`; None once all
/// of today's windows have started.
pub fn next_window(now: NaiveDateTime) -> Option<SendWindow> {
    let monday = is_monday(now);
    let minute = minute_of_day(now);
    SendWindow::ALL
        .into_iter()
        .find(|w| w.bounds(monday).0 > minute)
}

/// True once `now` has reached the window's start time today.
pub fn window_has_passed(window: SendWindow, now: NaiveDateTime) -> bool {
    minute_of_day(now) >= window.bounds(is_monday(now)).0
}

/// The batch this run targets: a concrete window, or the end-of-day
/// INSTANT sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveBatch {
    Window(SendWindow),
    Instant,
}

impl EffectiveBatch {
    pub fn label(&self) -> &'static str {
        match self {
            EffectiveBatch::Window(w) => w.label(),
            EffectiveBatch::Instant => "INSTANT",
        }
    }
}

/// Run-level scheduling decision derived from `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunWindow {
    /// Invocation landed between windows.
    pub manual_fire: bool,
    /// Invocation landed after the last window of the day.
    pub instant: bool,
    pub effective_batch: EffectiveBatch,
}

impl RunWindow {
    /// Operational mode string surfaced in the run report.
    pub fn mode(&self) -> &'static str {
        if self.instant {
            "instant"
        } else if self.manual_fire {
            "manual"
        } else {
            "scheduled"
        }
    }
}

/// Classify `now` into the run-level scheduling decision.
///
/// External triggers are not guaranteed to land inside a window, so
/// early, on-time, and late invocations all get well-formed behavior
/// instead of silently dropping a day's sends.
pub fn classify(now: NaiveDateTime) -> RunWindow {
    match current_window(now) {
        Some(w) => RunWindow {
            manual_fire: false,
            instant: false,
            effective_batch: EffectiveBatch::Window(w),
        },
        None => match next_window(now) {
            Some(w) => RunWindow {
                manual_fire: true,
                instant: false,
                effective_batch: EffectiveBatch::Window(w),
            },
            None => RunWindow {
                manual_fire: true,
                instant: true,
                effective_batch: EffectiveBatch::Instant,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    // 2026-08-26 is a Wednesday, 2026-08-24 a Monday.
    fn wed(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 26).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    fn mon(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 24).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_current_window_inside_each() {
        assert_eq!(current_window(wed(8, 30)), Some(SendWindow::Morning));
        assert_eq!(current_window(wed(12, 0)), Some(SendWindow::Midday));
        assert_eq!(current_window(wed(16, 59)), Some(SendWindow::Afternoon));
        assert_eq!(current_window(wed(20, 1)), Some(SendWindow::Night));
    }

    #[test]
    fn test_current_window_half_open_end() {
        // End bound excluded.
        assert_eq!(current_window(wed(9, 0)), None);
        assert_eq!(current_window(wed(13, 0)), None);
        assert_eq!(current_window(wed(17, 0)), None);
        assert_eq!(current_window(wed(21, 0)), None);
    }

    #[test]
    fn test_monday_morning_shift() {
        // 09:00 Monday is inside neither the default Morning window
        // (already over on other days) nor the shifted one.
        assert_eq!(current_window(mon(9, 0)), None);
        assert_eq!(current_window(mon(8, 30)), None);
        assert_eq!(current_window(mon(10, 30)), Some(SendWindow::Morning));
        assert_eq!(current_window(mon(11, 29)), Some(SendWindow::Morning));
        assert_eq!(current_window(mon(11, 30)), None);
    }

    #[test]
    fn test_next_window_ordering() {
        assert_eq!(next_window(wed(7, 0)), Some(SendWindow::Morning));
        assert_eq!(next_window(wed(9, 30)), Some(SendWindow::Midday));
        assert_eq!(next_window(wed(19, 59)), Some(SendWindow::Night));
        assert_eq!(next_window(wed(20, 0)), None);
        assert_eq!(next_window(wed(22, 0)), None);
    }

    #[test]
    fn test_next_window_monday_shift() {
        // 09:30 Monday: the shifted Morning window hasn't started yet.
        assert_eq!(next_window(mon(9, 30)), Some(SendWindow::Morning));
        assert_eq!(next_window(mon(10, 30)), Some(SendWindow::Midday));
    }

    #[test]
    fn test_window_has_passed() {
        assert!(!window_has_passed(SendWindow::Morning, wed(7, 59)));
        assert!(window_has_passed(SendWindow::Morning, wed(8, 0)));
        assert!(window_has_passed(SendWindow::Morning, wed(9, 30)));
        // Monday shift applies to the passed check too.
        assert!(!window_has_passed(SendWindow::Morning, mon(9, 0)));
        assert!(window_has_passed(SendWindow::Morning, mon(10, 30)));
    }

    #[test]
    fn test_classify_inside_window() {
        let run = classify(wed(12, 30));
        assert!(!run.manual_fire);
        assert!(!run.instant);
        assert_eq!(run.effective_batch, EffectiveBatch::Window(SendWindow::Midday));
        assert_eq!(run.mode(), "scheduled");
    }

    #[test]
    fn test_classify_before_first_window() {
        // Before 08:00: manual fire but not instant, targets Morning.
        let run = classify(wed(7, 0));
        assert!(run.manual_fire);
        assert!(!run.instant);
        assert_eq!(run.effective_batch, EffectiveBatch::Window(SendWindow::Morning));
        assert_eq!(run.mode(), "manual");
    }

    #[test]
    fn test_classify_between_windows() {
        let run = classify(wed(14, 0));
        assert!(run.manual_fire);
        assert!(!run.instant);
        assert_eq!(run.effective_batch, EffectiveBatch::Window(SendWindow::Afternoon));
    }

    #[test]
    fn test_classify_after_last_window() {
        let run = classify(wed(21, 30));
        assert!(run.manual_fire);
        assert!(run.instant);
        assert_eq!(run.effective_batch, EffectiveBatch::Instant);
        assert_eq!(run.effective_batch.label(), "INSTANT");
        assert_eq!(run.mode(), "instant");
    }

    #[test]
    fn test_classify_at_night_start_is_scheduled() {
        // 20:00 is inside Night (start inclusive), not instant.
        let run = classify(wed(20, 0));
        assert!(!run.instant);
        assert_eq!(run.effective_batch, EffectiveBatch::Window(SendWindow::Night));
    }
}
