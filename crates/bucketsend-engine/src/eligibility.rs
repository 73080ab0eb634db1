//! Per-candidate eligibility: three independent gates, all must pass.
//!
//! 1. Dedup cooldown — most recent successful send must be at least the
//!    cooldown duration ago (absolute wall-clock time).
//! 2. Day-arrival — a preferred day is satisfied once it has *arrived*
//!    this ISO week (tag day ≤ today), so a Friday client stays
//!    eligible Friday through Sunday. Deliberately preserved for the
//!    catch-up guarantee; worth confirming with stakeholders before
//!    tightening to exact-day matching.
//! 3. Time-window — Any-time passes outright; instant runs pass
//!    everyone; otherwise the tag window must equal the effective batch
//!    or have already opened today (catch-up).

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use bucketsend_scheduler::tags::{DayPref, PreferenceTag, TimePref};
use bucketsend_scheduler::windows::{window_has_passed, EffectiveBatch, RunWindow};

/// Why a candidate was skipped this run. Skips are counted, never
/// recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No (or unparseable) preference tag — client not yet configured.
    NotConfigured,
    /// Messaged from this bucket within the cooldown period.
    CooldownActive,
    /// Preferred day hasn't arrived yet this ISO week.
    DayNotArrived,
    /// Preferred window hasn't opened yet today.
    WindowNotOpen,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NotConfigured => "not_configured",
            SkipReason::CooldownActive => "cooldown_active",
            SkipReason::DayNotArrived => "day_not_arrived",
            SkipReason::WindowNotOpen => "window_not_open",
        }
    }
}

/// Outcome of the gate chain for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Skip(SkipReason),
}

/// One run's frozen view of time, reused for every candidate.
#[derive(Debug, Clone)]
pub struct EligibilityGate {
    /// Cooldown between successful sends to the same client.
    pub cooldown: Duration,
    /// ISO weekday of the run, Monday = 1 … Sunday = 7.
    pub today_iso: u32,
    /// Local wall-clock time in the scheduling timezone.
    pub local_now: NaiveDateTime,
    pub now_utc: DateTime<Utc>,
    pub run: RunWindow,
}

impl EligibilityGate {
    /// Run the gate chain for one candidate's tag and latest success.
    pub fn evaluate(&self, tag: &str, last_success: Option<DateTime<Utc>>) -> Eligibility {
        let Some(pref) = PreferenceTag::parse(tag) else {
            return Eligibility::Skip(SkipReason::NotConfigured);
        };

        // Gate 1: dedup cooldown.
        if let Some(last) = last_success {
            if self.now_utc - last < self.cooldown {
                return Eligibility::Skip(SkipReason::CooldownActive);
            }
        }

        // Gate 2: day arrival.
        if let DayPref::Day(day) = pref.day {
            if day > self.today_iso {
                return Eligibility::Skip(SkipReason::DayNotArrived);
            }
        }

        // Gate 3: time window.
        match pref.time {
            TimePref::Any => Eligibility::Eligible,
            TimePref::Window(_) if self.run.instant => Eligibility::Eligible,
            TimePref::Window(w) => {
                let on_time = self.run.effective_batch == EffectiveBatch::Window(w);
                if on_time || window_has_passed(w, self.local_now) {
                    Eligibility::Eligible
                } else {
                    Eligibility::Skip(SkipReason::WindowNotOpen)
                }
            }
        }
    }
}
