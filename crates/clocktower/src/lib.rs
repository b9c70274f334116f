//! Clocktower - play Trouble Brewing against automated seats
//!
//! Wires the `clocktower_rules` engine to the outside world.
//!
//! # Architecture
//!
//! - **Config**: rules, oracle settings and seed from `clocktower.toml`
//! - **LLM**: OpenAI-compatible and Anthropic chat clients
//! - **Oracles**: [`LlmOracle`] for model-driven seats, [`HeuristicOracle`] offline
//! - **Console**: [`ConsoleHuman`] and [`ConsolePresenter`] for terminal play
//!
//! # Example
//!
//! ```no_run
//! use clocktower::{AppConfig, ConsoleHuman, ConsolePresenter, HeuristicOracle};
//! use clocktower_rules::{Catalog, Game};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = AppConfig::load("clocktower.toml")?;
//! let mut game = Game::setup(
//!     config.rules().clone(),
//!     &Catalog::trouble_brewing(),
//!     StdRng::seed_from_u64(7),
//!     Box::new(HeuristicOracle::new(Some(7))),
//!     Box::new(ConsoleHuman::new()),
//!     Box::new(ConsolePresenter::new()),
//! )?;
//! game.run().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod console;
mod heuristic;
mod llm_client;
mod llm_oracle;

// Crate-level exports - Configuration
pub use config::{AppConfig, OracleConfig, OracleProvider};

// Crate-level exports - LLM client
pub use llm_client::{LlmClient, LlmConfig, LlmError, LlmProvider};

// Crate-level exports - Oracles
pub use heuristic::HeuristicOracle;
pub use llm_oracle::{LlmOracle, extract_json, parse_decision, system_prompt, user_prompt};

// Crate-level exports - Console
pub use console::{ConsoleHuman, ConsolePresenter, seat_line};
