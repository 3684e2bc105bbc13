//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Certificate-chain pinning authorizer
#[derive(Parser, Debug)]
#[command(name = "pin-authorizer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "PIN_AUTHORIZER_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "PIN_AUTHORIZER_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "PIN_AUTHORIZER_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand (optional - defaults to server mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the authorizer over HTTP (default)
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },

    /// Check the configured pins against the live chain once
    Check,

    /// Fetch the live verified chain of a host
    Fetch {
        /// Host name to connect to
        #[arg(long, required = true)]
        host: String,

        /// Port to connect to
        #[arg(short, long, default_value_t = 443)]
        port: u16,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = FetchFormat::Pem)]
        format: FetchFormat,
    },
}

/// Output format for `fetch`
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchFormat {
    /// PEM blocks, server to root
    Pem,
    /// Pinned record JSON, ready to store as the secret
    Json,
}
