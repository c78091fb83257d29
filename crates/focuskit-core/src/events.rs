use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::SessionSummary;
use crate::state::Mode;

/// Broadcast events emitted by the coordinator. The CLI prints them as
/// JSON; an embedding shell would forward them to its pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    ModeChanged {
        mode: Mode,
        at: DateTime<Utc>,
    },
    SessionEnded {
        summary: SessionSummary,
        at: DateTime<Utc>,
    },
    BlocklistUpdated {
        categories: usize,
        total_domains: usize,
        at: DateTime<Utc>,
    },
}
