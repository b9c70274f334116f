//! Clocktower - terminal entry point.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use clocktower::{
    AppConfig, ConsoleHuman, ConsolePresenter, HeuristicOracle, LlmClient, LlmOracle,
    OracleProvider,
};
use clocktower_rules::{Catalog, Game, GameError, NIGHT_ORDER, Oracle, Role};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use strum::IntoEnumIterator;
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,clocktower=debug,clocktower_rules=debug";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Play {
            config,
            seed,
            heuristic,
        } => run_play(config, seed, heuristic).await,
        Command::Roles => {
            print_roles();
            Ok(())
        }
    }
}

/// Plays one game at the terminal.
#[instrument(skip_all, fields(config_path = %config.display()))]
async fn run_play(config: PathBuf, seed: Option<u64>, heuristic: bool) -> Result<()> {
    let mut app = AppConfig::load(&config)?.with_seed(seed);
    if heuristic {
        app = app.with_heuristic();
    }
    let seed = *app.seed();

    let oracle: Box<dyn Oracle> = match app.oracle().provider() {
        OracleProvider::Heuristic => Box::new(HeuristicOracle::new(seed)),
        OracleProvider::OpenAI | OracleProvider::Anthropic => {
            let client = LlmClient::new(app.oracle().create_llm_config()?);
            Box::new(LlmOracle::new(client, app.oracle().timeout()))
        }
    };
    info!(oracle = oracle.name(), ?seed, "Starting game");

    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut game = Game::setup(
        app.rules().clone(),
        &Catalog::trouble_brewing(),
        rng,
        oracle,
        Box::new(ConsoleHuman::new()),
        Box::new(ConsolePresenter::new()),
    )?;

    match game.run().await {
        Ok(winner) => {
            info!(?winner, days = game.state().day_count(), "Game finished");
            Ok(())
        }
        Err(GameError::Aborted { reason }) => {
            warn!(%reason, "Session aborted");
            println!("\nGoodbye.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Prints every character with its type and wake position.
fn print_roles() {
    for role in Role::iter() {
        let wake = role
            .wake_index()
            .map(|i| format!("wakes {}/{}", i + 1, NIGHT_ORDER.len()))
            .unwrap_or_else(|| "does not wake".to_string());
        println!("{:<14} {:<10} {wake}", role.to_string(), role.role_type().to_string());
    }
}
