//! # BucketSend Scheduler
//!
//! Pure temporal policy, no side effects: the daily send-window
//! classifier, ISO week/weekday helpers, and the client "Day|Time"
//! preference-tag parser.
//!
//! ## Schedule
//! ```text
//! Morning    08:00–09:00   (Monday: 10:30–11:30)
//! Midday     12:00–13:00
//! Afternoon  16:00–17:00
//! Night      20:00–21:00
//! ```
//! All bounds are half-open `[start, end)` in local wall-clock minutes.
//! An invocation that lands between windows is a "manual fire" and
//! targets the next window; one that lands after the last window runs
//! in instant mode and flushes everyone whose preferred window has
//! already passed today.

pub mod tags;
pub mod week;
pub mod windows;

pub use tags::{DayPref, PreferenceTag, TimePref};
pub use week::{iso_week_string, iso_weekday, weekday_number};
pub use windows::{classify, current_window, next_window, window_has_passed, EffectiveBatch, RunWindow, SendWindow};
