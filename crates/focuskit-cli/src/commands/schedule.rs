use chrono::Utc;
use clap::Subcommand;
use focuskit_core::schedule::{self, ScheduleEntry};
use focuskit_core::state::Mode;
use focuskit_core::storage::Database;

use super::common::{self, CliResult};

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Add a daily scheduled activation
    Add {
        /// Time of day, 24h "HH:MM"
        #[arg(long)]
        time: String,
        /// Mode to activate (free, study, deepwork, chill)
        #[arg(long)]
        mode: String,
        /// Session length in minutes
        #[arg(long, default_value = "45")]
        duration: u32,
    },
    /// List scheduled activations with their next occurrence
    List,
    /// Remove a scheduled activation by id
    Remove { id: String },
}

pub fn run(action: ScheduleAction) -> CliResult {
    let db = Database::open()?;
    let config = focuskit_core::Config::load_or_default();
    let mut coord = common::coordinator(&db, &config);

    match action {
        ScheduleAction::Add { time, mode, duration } => {
            if schedule::parse_hhmm(&time).is_none() {
                return Err(format!("invalid time (expected HH:MM): {time}").into());
            }
            let mode: Mode = mode.parse()?;
            let entry = ScheduleEntry::new(&time, mode, duration);
            let id = entry.id.clone();
            let mut entries = coord.state().schedule.clone();
            entries.push(entry);
            coord.update_schedule(entries);
            common::save_state(&db, coord.state())?;
            println!("scheduled {mode} daily at {time} ({id})");
        }
        ScheduleAction::List => {
            let now = Utc::now();
            let listing: Vec<_> = coord
                .state()
                .schedule
                .iter()
                .map(|e| {
                    serde_json::json!({
                        "id": e.id,
                        "time": e.time,
                        "mode": e.mode,
                        "duration_min": e.duration_min,
                        "next": e.next_occurrence(now),
                    })
                })
                .collect();
            common::print_json(&listing)?;
        }
        ScheduleAction::Remove { id } => {
            let entries: Vec<_> = coord
                .state()
                .schedule
                .iter()
                .filter(|e| e.id != id)
                .cloned()
                .collect();
            if entries.len() == coord.state().schedule.len() {
                return Err(format!("no schedule entry with id {id}").into());
            }
            coord.update_schedule(entries);
            common::save_state(&db, coord.state())?;
            println!("removed {id}");
        }
    }

    Ok(())
}
