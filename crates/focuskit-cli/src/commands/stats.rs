use clap::Subcommand;
use focuskit_core::storage::Database;

use super::common::{self, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's totals
    Today,
    /// All-time totals
    All,
    /// Most recent sessions, newest first
    Recent {
        #[arg(long, default_value = "10")]
        limit: u32,
    },
}

pub fn run(action: StatsAction) -> CliResult {
    let db = Database::open()?;

    match action {
        StatsAction::Today => common::print_json(&db.stats_today()?),
        StatsAction::All => common::print_json(&db.stats_all()?),
        StatsAction::Recent { limit } => common::print_json(&db.history(limit)?),
    }
}
