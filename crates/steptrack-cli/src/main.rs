use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod app;
mod commands;
mod notifier;

#[derive(Parser)]
#[command(name = "steptrack", version, about = "Steptrack CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Today's steps and goal progress
    Today {
        /// Goal to measure against (defaults to goal.default_steps)
        #[arg(long)]
        goal: Option<i64>,
    },
    /// The last seven days with average, total and best day
    Week,
    /// Step sample ingestion
    Samples {
        #[command(subcommand)]
        action: commands::samples::SamplesAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Follow live updates and print events as JSON lines until Ctrl-C
    Watch {
        #[arg(long)]
        goal: Option<i64>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Today { goal } => commands::today::run(goal).await,
        Commands::Week => commands::week::run().await,
        Commands::Samples { action } => commands::samples::run(action).await,
        Commands::Config { action } => commands::config::run(action),
        Commands::Watch { goal } => commands::watch::run(goal).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
