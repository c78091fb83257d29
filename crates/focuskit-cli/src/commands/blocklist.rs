use clap::Subcommand;
use focuskit_core::storage::Database;
use focuskit_core::BlocklistClient;

use super::common::{self, CliResult};

#[derive(Subcommand)]
pub enum BlocklistAction {
    /// Generate a fresh AI blocklist and store it
    Refresh,
    /// Print the currently effective blocked domains
    Show,
    /// Drop the AI blocklist and fall back to the built-in list
    Clear,
}

pub fn run(action: BlocklistAction) -> CliResult {
    let db = Database::open()?;

    match action {
        BlocklistAction::Refresh => {
            let config = focuskit_core::Config::load_or_default();
            let client = BlocklistClient::from_config(&config)?;
            let runtime = tokio::runtime::Runtime::new()?;
            let blocklist = runtime.block_on(client.fetch())?;
            let mut coord = common::coordinator(&db, &config);
            let event = coord.update_blocklist(blocklist);
            common::save_state(&db, coord.state())?;
            common::print_json(&event)?;
        }
        BlocklistAction::Show => {
            let state = common::load_state(&db);
            let source = if state.ai_blocklist_active() {
                "ai"
            } else {
                "fallback"
            };
            common::print_json(&serde_json::json!({
                "source": source,
                "domains": state.blocked_domains(),
            }))?;
        }
        BlocklistAction::Clear => {
            let mut state = common::load_state(&db);
            state.ai_blocklist = None;
            common::save_state(&db, &state)?;
            println!("cleared; using the built-in fallback list");
        }
    }

    Ok(())
}
