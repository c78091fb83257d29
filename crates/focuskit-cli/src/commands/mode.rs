use clap::Subcommand;
use chrono::Utc;
use focuskit_core::scoring;
use focuskit_core::state::Mode;
use focuskit_core::storage::Database;

use super::common::{self, CliResult};

#[derive(Subcommand)]
pub enum ModeAction {
    /// Activate a focus mode and start a session
    Activate {
        /// Mode to enter (free, study, deepwork, chill)
        mode: String,
        /// Session length in minutes (0 for unbounded; omit to keep current)
        #[arg(long)]
        duration: Option<u32>,
    },
    /// End the current session and print its summary
    Deactivate,
    /// Print current mode and live session summary as JSON
    Status,
}

pub fn run(action: ModeAction) -> CliResult {
    let db = Database::open()?;
    let config = focuskit_core::Config::load_or_default();
    let mut coord = common::coordinator(&db, &config);

    match action {
        ModeAction::Activate { mode, duration } => {
            let mode: Mode = mode.parse()?;
            let event = coord.activate(mode, duration);
            common::save_state(&db, coord.state())?;
            common::print_json(&event)?;
        }
        ModeAction::Deactivate => {
            let started_at = coord.state().session_start;
            let (summary, events) = coord.deactivate();
            if let (Some(summary), Some(started_at)) = (&summary, started_at) {
                db.record_session(summary, started_at, Utc::now())?;
            }
            common::save_state(&db, coord.state())?;
            for event in &events {
                common::print_json(event)?;
            }
        }
        ModeAction::Status => {
            let state = coord.state();
            let summary = if state.session_active {
                scoring::build_summary(state, Utc::now())
            } else {
                None
            };
            common::print_json(&serde_json::json!({
                "state": state,
                "summary": summary,
            }))?;
        }
    }

    Ok(())
}
