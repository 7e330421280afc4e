//! Command line arguments

use clap::{Parser, Subcommand};

/// Keeper: client for the keeper secret synchronization server.
#[derive(Parser, Debug)]
#[command(name = "keeper", about = "Encrypted secret manager client", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Server base URL
    #[arg(
        long,
        global = true,
        env = "KEEPER_SERVER",
        default_value = "http://127.0.0.1:8080"
    )]
    pub server: String,

    /// Account login
    #[arg(long, global = true, env = "KEEPER_LOGIN")]
    pub login: Option<String>,

    /// Account password (also the encryption passphrase)
    #[arg(long, global = true, env = "KEEPER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Client identifier (random per process when omitted)
    #[arg(long, global = true, env = "KEEPER_CLIENT_ID")]
    pub client_id: Option<u64>,

    /// Key derivation salt (defaults to the client id, which is random per
    /// process). Set the same value on every run to read earlier secrets.
    #[arg(long, global = true, env = "KEEPER_KEY_SALT")]
    pub key_salt: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an account
    Register,

    /// List all secrets
    List,

    /// Show one secret
    Get {
        /// Secret id
        id: i64,
    },

    /// Store a new secret
    Add {
        #[command(subcommand)]
        kind: AddKind,
    },

    /// Change the title or note of a secret
    Edit {
        /// Secret id
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        metadata: Option<String>,
    },

    /// Delete a secret
    Delete {
        /// Secret id
        id: i64,
    },

    /// Follow changes made by other clients
    Watch,
}

#[derive(Subcommand, Debug)]
pub enum AddKind {
    /// Login and password pair
    Credential {
        title: String,
        /// Stored login (distinct from the account login)
        #[arg(long)]
        username: String,
        /// Stored password
        #[arg(long)]
        secret: String,
        #[arg(long, default_value = "")]
        metadata: String,
    },

    /// Free-form text
    Text {
        title: String,
        content: String,
        #[arg(long, default_value = "")]
        metadata: String,
    },

    /// Payment card
    Card {
        title: String,
        #[arg(long)]
        number: String,
        #[arg(long)]
        exp_month: u32,
        #[arg(long)]
        exp_year: u32,
        #[arg(long)]
        cvv: u32,
        #[arg(long, default_value = "")]
        metadata: String,
    },

    /// Contents of a file
    Blob {
        title: String,
        path: std::path::PathBuf,
        #[arg(long, default_value = "")]
        metadata: String,
    },
}
