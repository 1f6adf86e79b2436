// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `run` command.

use crate::cli::{Cli, RunArgs};
use crate::error::BinResult;
use crate::logging::init_logging;
use crate::runtime::RuntimeBuilder;

/// Executes the `run` command to start the server.
pub async fn run(cli: &Cli, args: RunArgs) -> BinResult<()> {
    let runtime = RuntimeBuilder::new()
        .config_path(cli.config.as_ref())
        .dev_mode(args.dev)
        .host(args.host)
        .port(args.port)
        .build()?;

    let logging = &runtime.config().logging;
    init_logging(
        &cli.effective_log_level(Some(logging.level)),
        cli.effective_log_format(Some(logging.format)),
    );

    runtime.run().await
}
