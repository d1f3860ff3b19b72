use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use sportsbook_ev_api::config::Settings;
use sportsbook_ev_api::utils::data::save_documents_to_file;
use sportsbook_ev_api::utils::time::DEFAULT_FRESHNESS_MINUTES;
use sportsbook_ev_api::{
    build_state, build_store, OddsFilter, OddsQuery, DEFAULT_HOURS_AHEAD, DEFAULT_LIMIT,
};

#[derive(Parser)]
#[command(name = "cli", about = "Query upcoming NBA spread odds")]
struct Cli {
    /// Print raw JSON instead of one line per result
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List individual odds records, soonest first
    Odds {
        #[arg(long)]
        bookmaker: Option<String>,
        #[arg(long)]
        team: Option<String>,
        #[arg(long)]
        min_ev: Option<f64>,
        #[arg(long, default_value_t = DEFAULT_HOURS_AHEAD)]
        hours_ahead: i64,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: i64,
        /// Also save the matching documents as a fixture file
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// List upcoming games with every bookmaker's lines
    Games {
        #[arg(long, default_value_t = DEFAULT_HOURS_AHEAD)]
        hours_ahead: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    // Initialize logging
    tracing_subscriber::fmt::init();

    let store = build_store(&settings)?;
    let state = build_state(&settings, store);
    let now = Utc::now();

    match cli.command {
        Command::Odds {
            bookmaker,
            team,
            min_ev,
            hours_ahead,
            limit,
            export,
        } => {
            let query = OddsQuery {
                filter: OddsFilter {
                    bookmaker,
                    team,
                    min_ev,
                },
                hours_ahead,
                limit,
            };
            let selection = state
                .odds
                .list_odds_at(&query, now)
                .await
                .context("Failed to list odds")?;

            if let Some(path) = &export {
                save_documents_to_file(&selection.documents, path)?;
                eprintln!("Saved {} documents to {}", selection.documents.len(), path.display());
            }

            if cli.json {
                let json = serde_json::to_string_pretty(&selection.into_views())?;
                println!("{}", json);
                return Ok(());
            }

            if selection.documents.is_empty() {
                println!("No odds found in the next {} hours.", hours_ahead);
            } else {
                println!("{} odds in the next {} hours:\n", selection.documents.len(), hours_ahead);
                let max_age = Duration::minutes(DEFAULT_FRESHNESS_MINUTES);
                for (i, doc) in selection.documents.iter().enumerate() {
                    println!("{}. {}", i + 1, doc.format(now, max_age));
                }
            }
            if selection.truncated {
                println!("\nMore matches may exist; raise --limit to scan further.");
            }
        }
        Command::Games { hours_ahead } => {
            let listing = state
                .games
                .list_games_at(hours_ahead, now)
                .await
                .context("Failed to list games")?;

            if cli.json {
                let json = serde_json::to_string_pretty(&listing.games)?;
                println!("{}", json);
                return Ok(());
            }

            if listing.games.is_empty() {
                println!("No games in the next {} hours.", hours_ahead);
            } else {
                println!("{} games in the next {} hours:\n", listing.games.len(), hours_ahead);
                for (i, game) in listing.games.iter().enumerate() {
                    println!("{}. {}", i + 1, game.format(now));
                }
            }
            if listing.truncated {
                println!("\nRow cap reached; later games may be missing bookmakers.");
            }
        }
    }

    Ok(())
}
