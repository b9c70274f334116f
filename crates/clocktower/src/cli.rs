//! Command-line interface for clocktower.

use clap::{Parser, Subcommand};

/// Clocktower - Blood on the Clocktower against automated seats
#[derive(Parser, Debug)]
#[command(name = "clocktower")]
#[command(about = "Single-player Trouble Brewing in the terminal", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play one game
    Play {
        /// Path to the configuration file (defaults apply if it is missing)
        #[arg(short, long, default_value = "clocktower.toml")]
        config: std::path::PathBuf,

        /// Seed for a reproducible deal and table talk
        #[arg(long)]
        seed: Option<u64>,

        /// Use the offline heuristic instead of a language model
        #[arg(long)]
        heuristic: bool,
    },

    /// List the script's characters in night order
    Roles,
}
