use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "shiftalarm-cli", version, about = "Shift Alarm CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shift pattern management
    Pattern {
        #[command(subcommand)]
        action: commands::pattern::PatternAction,
    },
    /// Shift lookups on the active pattern
    Shift {
        #[command(subcommand)]
        action: commands::shift::ShiftAction,
    },
    /// Day-by-day shift preview starting today
    Preview(commands::preview::PreviewArgs),
    /// Shift and basic alarm management
    Alarm {
        #[command(subcommand)]
        action: commands::alarm::AlarmAction,
    },
    /// Notification planning
    Notify {
        #[command(subcommand)]
        action: commands::notify::NotifyAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Logs go to stderr so JSON on stdout stays parseable.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Pattern { action } => commands::pattern::run(action),
        Commands::Shift { action } => commands::shift::run(action),
        Commands::Preview(args) => commands::preview::run(args),
        Commands::Alarm { action } => commands::alarm::run(action),
        Commands::Notify { action } => commands::notify::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
