use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "focuskit", version, about = "Focuskit CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mode and session control
    Mode {
        #[command(subcommand)]
        action: commands::mode::ModeAction,
    },
    /// Run timers that are due (session countdown, idle sweep, schedule)
    Tick,
    /// Whitelist and tab-cap settings
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Scheduled activations
    Schedule {
        #[command(subcommand)]
        action: commands::schedule::ScheduleAction,
    },
    /// AI blocklist management
    Blocklist {
        #[command(subcommand)]
        action: commands::blocklist::BlocklistAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Session statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Mode { action } => commands::mode::run(action),
        Commands::Tick => commands::tick::run(),
        Commands::Settings { action } => commands::settings::run(action),
        Commands::Schedule { action } => commands::schedule::run(action),
        Commands::Blocklist { action } => commands::blocklist::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Stats { action } => commands::stats::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
