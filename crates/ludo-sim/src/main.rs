//! Headless Ludo simulator.
//!
//! Plays a batch of computer-only games and prints the results as JSON.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod runner;
mod store;

use runner::SimConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SimConfig::from_env()?;

    info!(
        games = config.games,
        players = config.players,
        difficulty = ?config.difficulty,
        seed = config.seed,
        "Starting simulation..."
    );

    let report = runner::run_simulation(config).await;
    info!(completed = report.completed, wins = ?report.wins, "Simulation finished");

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
