use clap::{Parser, Subcommand};

use crate::models::StatusFilter;

/// Token Service — named token registry
#[derive(Parser)]
#[command(name = "tokens", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind (defaults to TOKENS_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage tokens directly against the database
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Create a token, reactivating an archived one with the same name
    Create {
        #[arg(long)]
        name: String,
    },
    /// List tokens
    List {
        /// all, active or inactive
        #[arg(long, default_value = "active")]
        status: StatusFilter,
    },
    /// Show a single token
    Get {
        #[arg(long)]
        id: i64,
    },
    /// Mark a token active
    Activate {
        #[arg(long)]
        id: i64,
    },
    /// Mark a token inactive
    Deactivate {
        #[arg(long)]
        id: i64,
    },
}
