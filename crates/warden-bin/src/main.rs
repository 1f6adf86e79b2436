// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Warden - JWT authentication, RBAC and rate limiting service.

use warden_bin::commands::execute;
use warden_bin::error::report_error_and_exit;
use warden_bin::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    if let Err(e) = execute(cli).await {
        report_error_and_exit(e);
    }
}
