// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `token` command.

use warden_api::{JwtManager, TokenType};
use warden_config::WardenConfig;
use warden_core::{PrincipalId, SharedClock, SystemClock};

use crate::cli::{Cli, TokenArgs};
use crate::error::BinResult;
use crate::runtime::{api_config, load_config};

/// Mints a token for `--user-id` with the configured secret and lifetimes.
pub fn token(cli: &Cli, args: TokenArgs) -> BinResult<()> {
    let config = load_config(cli.config.as_deref())?;
    let token = mint(&config, args, SystemClock::shared())?;
    println!("{token}");
    Ok(())
}

fn mint(config: &WardenConfig, args: TokenArgs, clock: SharedClock) -> BinResult<String> {
    let jwt = api_config(config).jwt;
    let token_type = TokenType::from(args.token_type);
    let ttl = match token_type {
        TokenType::Access => jwt.access_ttl(),
        TokenType::Refresh => jwt.refresh_ttl(),
    };
    let manager = JwtManager::new(jwt, clock)?;
    Ok(manager.create(PrincipalId::new(args.user_id), token_type, ttl)?)
}
