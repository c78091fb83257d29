use chrono::Utc;
use focuskit_core::storage::Database;
use focuskit_core::Event;

use super::common::{self, CliResult};

pub fn run() -> CliResult {
    let db = Database::open()?;
    let config = focuskit_core::Config::load_or_default();
    let mut coord = common::coordinator(&db, &config);

    let pre_start = coord.state().session_start;
    let events = coord.tick(Utc::now());

    for event in &events {
        if let Event::SessionEnded { summary, at } = event {
            if let Some(started_at) = pre_start {
                db.record_session(summary, started_at, *at)?;
            }
        }
    }

    common::save_state(&db, coord.state())?;
    for event in &events {
        common::print_json(event)?;
    }
    Ok(())
}
