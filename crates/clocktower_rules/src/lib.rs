//! Clocktower rules - the Trouble Brewing rule engine
//!
//! Runs one game at a six-seat table: one human, the rest automated. The
//! engine deals roles, resolves nights in wake order, runs days of talk,
//! nominations and votes, and decides when a team has won.
//!
//! # Architecture
//!
//! - **Catalog**: every role as an enum variant with a constant capability record
//! - **Roster**: dealing, the Baron adjustment, the Drunk's belief, Demon bluffs
//! - **Night**: wake order, impairment, information and misinformation, deaths
//! - **Day**: private chats, speeches, the Slayer, nominations, votes, executions
//! - **Win**: evaluation after every death, including Demon inheritance
//! - **Boundaries**: [`Oracle`], [`HumanIo`] and [`Presenter`] keep decisions,
//!   input and display outside the engine
//!
//! # Example
//!
//! ```no_run
//! use clocktower_rules::{Catalog, Game, NullPresenter, RulesConfig};
//! # use clocktower_rules::{Decision, DecisionContext, HumanIo, Oracle};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! # struct Silent;
//! # #[async_trait::async_trait]
//! # impl Oracle for Silent {
//! #     async fn decide(&self, _: &DecisionContext) -> anyhow::Result<Decision> { Ok(Decision::default()) }
//! #     fn name(&self) -> &str { "silent" }
//! # }
//! # struct Quiet;
//! # #[async_trait::async_trait]
//! # impl HumanIo for Quiet {
//! #     fn say(&mut self, _: &str) {}
//! #     async fn ask(&mut self, _: &str) -> anyhow::Result<String> { Ok(String::new()) }
//! # }
//! # async fn example() -> anyhow::Result<()> {
//! let mut game = Game::setup(
//!     RulesConfig::default(),
//!     &Catalog::trouble_brewing(),
//!     StdRng::seed_from_u64(7),
//!     Box::new(Silent),
//!     Box::new(Quiet),
//!     Box::new(NullPresenter),
//! )?;
//! let winner = game.run().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod chat;
mod config;
mod day;
mod error;
mod game;
mod info;
mod night;
mod oracle;
mod player;
mod role;
mod roster;
mod state;
mod win;

// Crate-level exports - Roles
pub use role::{
    Ability, Alignment, Catalog, DRUNK_FALLBACK, Information, NIGHT_ORDER, NightWindow, Role,
    RoleTraits, RoleType,
};

// Crate-level exports - Configuration and errors
pub use config::{Distribution, RulesConfig};
pub use error::{ConfigError, GameError, InvariantError};

// Crate-level exports - Table state
pub use player::{Player, Seat};
pub use roster::{PERSONALITIES, Roster, RosterBuilder};
pub use state::{GameState, Phase};

// Crate-level exports - Boundaries
pub use oracle::{
    Decision, DecisionContext, DecisionKind, HumanIo, NullPresenter, Oracle, Presenter,
    is_chat_exit, parse_targets, parse_yes,
};

// Crate-level exports - Resolution
pub use day::{must_abstain, vote_threshold, voting_order};
pub use game::Game;
pub use info::{apparent_alignment, apparent_type, true_information};
pub use night::{DIZZY_MESSAGE, Effect, UNRELIABLE_PREFIX, apply_effect, wakes_tonight};
pub use win::{DeathCause, Verdict, evaluate, resolve_death};
