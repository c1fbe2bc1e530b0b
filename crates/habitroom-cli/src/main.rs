use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod telegram;

#[derive(Parser)]
#[command(name = "habitroom", version, about = "Habit tracking chat bot")]
struct Cli {
    /// Data directory (default: ~/.config/habitroom)
    #[arg(long, global = true, env = "HABITROOM_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot until interrupted
    Run(commands::run::RunArgs),
    /// Habit configuration
    Habits {
        #[command(subcommand)]
        action: commands::habits::HabitsAction,
    },
    /// Show points for a day
    Score(commands::score::ScoreArgs),
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "habitroom=debug,info"
    } else {
        "habitroom=info,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = commands::resolve_data_dir(cli.data_dir).and_then(|dir| match cli.command {
        Commands::Run(args) => commands::run::run(&dir, args),
        Commands::Habits { action } => commands::habits::run(&dir, action),
        Commands::Score(args) => commands::score::run(&dir, args),
    });

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
