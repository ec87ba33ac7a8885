//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tollgate_domain::{HttpMethod, TokenPool};

/// Tollgate - authenticated requests against the configured backend
#[derive(Parser, Debug)]
#[command(name = "tollgate")]
#[command(version, about = "Authenticated request gateway client", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./tollgate.toml when present)
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Credential pool to operate on
    #[arg(short = 'p', long = "pool", default_value = "general")]
    pub pool: TokenPool,

    #[command(subcommand)]
    pub command: Command,
}

/// Gateway operations.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and store a new session
    Login {
        /// Account name; omit together with --password to bootstrap an anonymous session
        #[arg(
            short = 'u',
            long = "username",
            env = "TOLLGATE_USERNAME",
            requires = "password"
        )]
        username: Option<String>,

        /// Account password
        #[arg(
            long = "password",
            env = "TOLLGATE_PASSWORD",
            hide_env_values = true,
            requires = "username"
        )]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the state of the stored session
    Status,

    /// Exchange the refresh token for a new access token now
    Refresh,

    /// Send a request through the gateway
    Request {
        /// HTTP method
        method: HttpMethod,

        /// Path relative to the backend base URL
        path: String,

        /// JSON request body
        #[arg(short = 'd', long = "body", value_name = "JSON")]
        body: Option<Value>,
    },
}
