//! Shared helpers for CLI commands.

use focuskit_core::{Config, Coordinator, Database, MemoryHost, SessionState};
use focuskit_core::storage::STATE_KEY;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub fn load_state(db: &Database) -> SessionState {
    if let Ok(Some(json)) = db.kv_get(STATE_KEY) {
        match serde_json::from_str::<SessionState>(&json) {
            Ok(state) => return state,
            Err(e) => log::warn!("discarding corrupt state record: {e}"),
        }
    }
    SessionState::default()
}

pub fn save_state(db: &Database, state: &SessionState) -> CliResult {
    let json = serde_json::to_string(state)?;
    db.kv_set(STATE_KEY, &json)?;
    Ok(())
}

/// Build a coordinator over the persisted state. The CLI has no live
/// browser attached, so tab effects land on an in-memory host.
pub fn coordinator(db: &Database, config: &Config) -> Coordinator<MemoryHost> {
    Coordinator::new(load_state(db), MemoryHost::new())
        .with_idle_threshold(config.session.idle_threshold_min)
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
