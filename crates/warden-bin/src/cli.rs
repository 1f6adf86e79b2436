// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! - `run`: Start the server (default)
//! - `validate`: Validate configuration
//! - `hash-password`: Print an Argon2 PHC string
//! - `token`: Mint a token with the configured secret
//! - `version`: Show version information

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// Warden - token issuing and access control service
#[derive(Parser, Debug)]
#[command(
    name = "warden",
    author = "Sylvex",
    version = warden_api::VERSION,
    about = "JWT authentication, RBAC and rate limiting service",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path (YAML, TOML or JSON). Defaults and
    /// environment variables are used without one.
    #[arg(short, long, env = "WARDEN_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format. Overrides the config file.
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands for the Warden CLI.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the server
    ///
    /// This is the default command when no subcommand is specified.
    Run(RunArgs),

    /// Validate the configuration
    ///
    /// Loads and validates the configuration without starting the server.
    Validate(ValidateArgs),

    /// Hash a password
    ///
    /// Prints an Argon2 PHC string suitable for a credential store.
    #[command(name = "hash-password")]
    HashPassword(HashPasswordArgs),

    /// Mint a token
    ///
    /// Signs a token for a principal with the configured secret. Intended
    /// for operations and debugging.
    Token(TokenArgs),

    /// Show version information
    Version,
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `run` command.
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Development mode: detailed error bodies. Refused in production.
    #[arg(long, env = "WARDEN_DEV_MODE")]
    pub dev: bool,

    /// Bind address
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Listen port
    #[arg(long)]
    pub port: Option<u16>,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug, Default, Clone)]
pub struct ValidateArgs {
    /// Print the effective configuration (secrets redacted)
    #[arg(short, long)]
    pub show: bool,

    /// Output format for validation results
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the `hash-password` command.
#[derive(Args, Debug, Default, Clone)]
pub struct HashPasswordArgs {
    /// Password to hash. Read from stdin when omitted.
    #[arg(short, long)]
    pub password: Option<String>,
}

/// Arguments for the `token` command.
#[derive(Args, Debug, Clone)]
pub struct TokenArgs {
    /// Principal ID placed in `sub`
    #[arg(short, long)]
    pub user_id: u64,

    /// Token type
    #[arg(short = 't', long = "type", default_value = "access")]
    pub token_type: TokenKind,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

impl From<warden_config::LogFormat> for LogFormat {
    fn from(format: warden_config::LogFormat) -> Self {
        match format {
            warden_config::LogFormat::Text => LogFormat::Text,
            warden_config::LogFormat::Json => LogFormat::Json,
            warden_config::LogFormat::Compact => LogFormat::Compact,
        }
    }
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for programmatic parsing
    Json,
}

/// Token type accepted by the `token` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TokenKind {
    /// Access token
    #[default]
    Access,
    /// Refresh token
    Refresh,
}

impl From<TokenKind> for warden_api::TokenType {
    fn from(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Access => warden_api::TokenType::Access,
            TokenKind::Refresh => warden_api::TokenType::Refresh,
        }
    }
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective command, defaulting to `Run` if none specified.
    pub fn effective_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Run(RunArgs::default()))
    }

    /// Returns the log level: `-q`/`-v` first, then `--log-level`, then the
    /// configured level.
    pub fn effective_log_level(&self, configured: Option<warden_config::LogLevel>) -> String {
        if self.quiet {
            "warn".to_string()
        } else if self.verbose {
            "debug".to_string()
        } else if let Some(level) = &self.log_level {
            level.clone()
        } else {
            configured.map_or("info", |l| l.as_str()).to_string()
        }
    }

    /// Returns the log format: `--log-format`, then the configured format.
    pub fn effective_log_format(&self, configured: Option<warden_config::LogFormat>) -> LogFormat {
        self.log_format
            .or_else(|| configured.map(LogFormat::from))
            .unwrap_or_default()
    }
}

// =============================================================================
// Tests
// =============================================================================
