// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI command implementations.

mod hash_password;
mod run;
mod token;
mod validate;
mod version;

pub use hash_password::hash_password;
pub use run::run;
pub use token::token;
pub use validate::validate;
pub use version::version;

use crate::cli::{Cli, Commands};
use crate::error::BinResult;
use crate::logging::init_logging;

/// Executes the appropriate command based on CLI arguments.
///
/// `run` initializes logging itself once the configured level is known.
pub async fn execute(cli: Cli) -> BinResult<()> {
    let command = cli.effective_command();
    if !matches!(command, Commands::Run(_)) {
        init_logging(&cli.effective_log_level(None), cli.effective_log_format(None));
    }

    match command {
        Commands::Run(args) => run::run(&cli, args).await,
        Commands::Validate(args) => validate::validate(&cli, args),
        Commands::HashPassword(args) => hash_password::hash_password(&cli, args).await,
        Commands::Token(args) => token::token(&cli, args),
        Commands::Version => version::version(&cli),
    }
}
