//! Error types for the rule engine.

use derive_more::{Display, Error, From};
use tracing::instrument;

/// Setup that cannot be satisfied from the catalog.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// A state the engine should never reach, such as two living Demons.
#[derive(Debug, Clone, Display, Error)]
#[display("Invariant violated: {} at {}:{}", message, file, line)]
pub struct InvariantError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl InvariantError {
    /// Creates a new invariant error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        let message = message.into();
        tracing::error!(error_message = %message, "Invariant error created");
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Reasons the game loop stops without a winner.
#[derive(Debug, Clone, Display, Error, From)]
pub enum GameError {
    /// The configured setup is unusable.
    #[display("{_0}")]
    Config(ConfigError),

    /// The engine detected an incoherent state.
    #[display("{_0}")]
    Invariant(InvariantError),

    /// The human boundary closed its input.
    #[display("Session aborted: {reason}")]
    #[from(skip)]
    Aborted {
        /// Why the boundary stopped answering.
        reason: String,
    },
}

impl GameError {
    /// Builds an [`GameError::Aborted`] from any boundary failure.
    pub fn aborted(reason: impl std::fmt::Display) -> Self {
        Self::Aborted {
            reason: reason.to_string(),
        }
    }
}
