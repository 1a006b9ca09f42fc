use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "rugwatch-cli")]
#[command(about = "RUGWATCH operator command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show ledger totals, trusted-account count, and recent analyses.
    Status,
    /// Fetch, score, print, and store a one-off analysis for a handle.
    Analyze {
        /// Account handle, with or without the leading '@'.
        handle: String,
    },
    /// Force a trusted-list refresh and print the new count.
    RefreshTrusted,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = rugwatch_core::load_app_config()?;
    let pool_config = rugwatch_db::PoolConfig::from_app_config(&config);
    let pool = rugwatch_db::connect_pool(&config.database_url, pool_config).await?;

    match cli.command {
        Commands::Status => commands::run_status(&pool).await,
        Commands::Analyze { handle } => commands::run_analyze(&pool, &config, &handle).await,
        Commands::RefreshTrusted => commands::run_refresh_trusted(&pool, &config).await,
    }
}
