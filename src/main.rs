//! Binary entrypoint for the blackoutbot CLI.
//!
//! Commands:
//! - `start` - run the bot with the console transport
//! - `init` - create a starter `config.toml` and a copy of the message catalog
//! - `scores` - print the leaderboard
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use blackoutbot::bot::BotServer;
use blackoutbot::catalog::BUILTIN_CATALOG;
use blackoutbot::config::Config;
use blackoutbot::storage::GameStore;
use blackoutbot::transport::console;

#[derive(Parser)]
#[command(name = "blackoutbot")]
#[command(about = "A menu-driven narrative adventure bot")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot on the console transport
    Start,
    /// Initialize a starter configuration and message catalog
    Init,
    /// Print the leaderboard
    Scores {
        /// How many rows to show
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Start => {
            let config = Config::load(&cli.config).await?;
            info!("starting {} v{}", config.bot.name, env!("CARGO_PKG_VERSION"));
            let (server, handles) = BotServer::new(config)?;
            console::spawn(handles);
            server.run().await
        }
        Commands::Init => {
            if tokio::fs::try_exists(&cli.config).await.unwrap_or(false) {
                println!("{} already exists; leaving it alone.", cli.config);
            } else {
                Config::create_default(&cli.config).await?;
                println!("Wrote {}.", cli.config);
            }
            let catalog_path = "data/catalog.json";
            if tokio::fs::try_exists(catalog_path).await.unwrap_or(false) {
                println!("{} already exists; leaving it alone.", catalog_path);
            } else {
                tokio::fs::create_dir_all("data")
                    .await
                    .context("creating data directory")?;
                tokio::fs::write(catalog_path, BUILTIN_CATALOG)
                    .await
                    .context("writing catalog")?;
                println!(
                    "Wrote {}. Point content.catalog_path at it to customize the story.",
                    catalog_path
                );
            }
            Ok(())
        }
        Commands::Scores { count } => {
            let config = Config::load(&cli.config).await?;
            let store = GameStore::open(&config.storage.data_dir)
                .with_context(|| format!("opening store at {}", config.storage.data_dir))?;
            let scores = store.top_scores(count)?;
            if scores.is_empty() {
                println!("No games finished yet.");
                return Ok(());
            }
            for (rank, score) in scores.iter().enumerate() {
                println!(
                    "{:>2}. {:<24} {:>6} turns {:>8} money {:>8} points",
                    rank + 1,
                    score.name,
                    score.turns,
                    score.money,
                    score.score
                );
            }
            Ok(())
        }
    }
}
