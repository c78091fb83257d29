//! Focus scoring and session summaries.
//!
//! The score is a fixed linear formula:
//!
//! ```text
//! score = clamp(100 - distractions * 10 - max(0, unique_sites - 5) * 2, 0, 100)
//! ```
//!
//! The constants (10 per distraction, 2 per unique site past the first
//! five) are part of the product definition and must not be tuned here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{Mode, SessionState};

/// Number of unique sites that carry no breadth penalty.
const FREE_SITES: u32 = 5;

/// Compute the 0-100 focus score from session counters.
pub fn focus_score(distractions: u32, unique_sites: u32) -> u32 {
    let breadth_penalty = unique_sites.saturating_sub(FREE_SITES) as i64 * 2;
    let penalty = distractions as i64 * 10 + breadth_penalty;
    (100 - penalty).clamp(0, 100) as u32
}

/// Post-session report broadcast on deactivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub mode: Mode,
    /// Elapsed whole minutes.
    pub duration_min: u32,
    /// The duration the session was started with (0 = unbounded).
    pub target_duration_min: u32,
    pub unique_sites: u32,
    pub total_visits: u32,
    /// Top five domains by visit count, descending.
    pub top_sites: Vec<(String, u32)>,
    pub distraction_count: u32,
    pub focus_score: u32,
}

/// Build a summary of the running session. Returns `None` when no start
/// timestamp is present.
pub fn build_summary(state: &SessionState, now: DateTime<Utc>) -> Option<SessionSummary> {
    let start = state.session_start?;
    let elapsed_min = (now - start).num_minutes().max(0) as u32;

    let mut top_sites: Vec<(String, u32)> = state
        .session_visits
        .iter()
        .map(|(domain, count)| (domain.clone(), *count))
        .collect();
    // Descending by count; ties resolved by domain for determinism.
    top_sites.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_sites.truncate(5);

    let unique_sites = state.unique_sites();
    let distractions = state.distraction_count;

    Some(SessionSummary {
        mode: state.mode,
        duration_min: elapsed_min,
        target_duration_min: state.session_duration_min,
        unique_sites,
        total_visits: state.total_visits(),
        top_sites,
        distraction_count: distractions,
        focus_score: focus_score(distractions, unique_sites),
    })
}
