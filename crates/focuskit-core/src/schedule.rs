//! Scheduled mode activations.
//!
//! Entries carry a daily `"HH:MM"` time of day. The coordinator keeps a
//! high-water mark and activates every entry whose occurrence fell inside
//! the window since the last tick, so a missed tick fires on the next one
//! rather than being dropped.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::Mode;

/// A recurring daily activation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub id: String,
    /// Time of day, `"HH:MM"`.
    pub time: String,
    pub mode: Mode,
    pub duration_min: u32,
}

impl ScheduleEntry {
    pub fn new(time: &str, mode: Mode, duration_min: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            time: time.to_string(),
            mode,
            duration_min,
        }
    }

    /// Parse the `"HH:MM"` field. Entries that fail to parse are skipped
    /// by the scheduler.
    pub fn parse_time(&self) -> Option<(u32, u32)> {
        parse_hhmm(&self.time)
    }

    /// The occurrence of this entry on the given day, if the time parses.
    fn occurrence_on(&self, day: chrono::NaiveDate) -> Option<DateTime<Utc>> {
        let (h, m) = self.parse_time()?;
        Some(day.and_hms_opt(h, m, 0)?.and_utc())
    }

    /// The next activation strictly after `now`. A time of day that
    /// already passed today schedules for tomorrow.
    pub fn next_occurrence(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let today = self.occurrence_on(now.date_naive())?;
        if today <= now {
            Some(today + Duration::days(1))
        } else {
            Some(today)
        }
    }
}

/// Parse `"HH:MM"` into hours and minutes, rejecting out-of-range values.
pub fn parse_hhmm(time: &str) -> Option<(u32, u32)> {
    let (h, m) = time.split_once(':')?;
    let h: u32 = h.trim().parse().ok()?;
    let m: u32 = m.trim().parse().ok()?;
    if h >= 24 || m >= 60 {
        return None;
    }
    Some((h, m))
}

/// Entries whose occurrence lies in `(after, now]`.
///
/// The window may span midnight, so occurrences on both boundary days are
/// considered. Unparseable entries are skipped.
pub fn due_between<'a>(
    entries: &'a [ScheduleEntry],
    after: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Vec<&'a ScheduleEntry> {
    if now <= after {
        return Vec::new();
    }
    let mut days = vec![after.date_naive()];
    if now.date_naive() != after.date_naive() {
        days.push(now.date_naive());
    }

    entries
        .iter()
        .filter(|entry| {
            days.iter().any(|day| {
                entry
                    .occurrence_on(*day)
                    .is_some_and(|t| t > after && t <= now)
            })
        })
        .collect()
}
