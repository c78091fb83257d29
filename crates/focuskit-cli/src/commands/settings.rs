use clap::Subcommand;
use focuskit_core::state::{normalize_domain_input, Mode};
use focuskit_core::storage::Database;

use super::common::{self, CliResult};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Manage the always-allowed domain list
    Whitelist {
        #[command(subcommand)]
        action: WhitelistAction,
    },
    /// Set the tab cap for a mode
    MaxTabs {
        /// Mode to adjust (study, deepwork, chill)
        mode: String,
        /// Cap as a number, or "off" to remove the cap
        cap: String,
    },
    /// Print current settings as JSON
    Show,
}

#[derive(Subcommand)]
pub enum WhitelistAction {
    /// Add a domain to the whitelist
    Add { domain: String },
    /// Remove a domain from the whitelist
    Remove { domain: String },
    /// Print the whitelist
    List,
}

pub fn run(action: SettingsAction) -> CliResult {
    let db = Database::open()?;
    let mut state = common::load_state(&db);

    match action {
        SettingsAction::Whitelist { action } => match action {
            WhitelistAction::Add { domain } => {
                let domain = normalize_domain_input(&domain)
                    .ok_or_else(|| format!("invalid domain: {domain}"))?;
                if !state.whitelist.contains(&domain) {
                    state.whitelist.push(domain.clone());
                    common::save_state(&db, &state)?;
                }
                println!("whitelisted: {domain}");
            }
            WhitelistAction::Remove { domain } => {
                let domain = normalize_domain_input(&domain)
                    .ok_or_else(|| format!("invalid domain: {domain}"))?;
                let before = state.whitelist.len();
                state.whitelist.retain(|d| d != &domain);
                if state.whitelist.len() == before {
                    return Err(format!("not in whitelist: {domain}").into());
                }
                common::save_state(&db, &state)?;
                println!("removed: {domain}");
            }
            WhitelistAction::List => {
                common::print_json(&state.whitelist)?;
            }
        },
        SettingsAction::MaxTabs { mode, cap } => {
            let mode: Mode = mode.parse()?;
            let cap = match cap.to_ascii_lowercase().as_str() {
                "off" | "none" => None,
                n => Some(n.parse::<u32>().map_err(|_| {
                    format!("cap must be a number or \"off\", got: {cap}")
                })?),
            };
            state.max_tabs.set_cap(mode, cap);
            common::save_state(&db, &state)?;
            match cap {
                Some(n) => println!("{mode}: max {n} tabs"),
                None => println!("{mode}: no tab cap"),
            }
        }
        SettingsAction::Show => {
            common::print_json(&serde_json::json!({
                "whitelist": state.whitelist,
                "max_tabs": state.max_tabs,
            }))?;
        }
    }

    Ok(())
}
