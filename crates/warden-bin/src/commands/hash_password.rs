// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `hash-password` command.

use std::io::BufRead;

use anyhow::Context;
use warden_core::password::validate_password;
use warden_core::PasswordHasher;

use crate::cli::{Cli, HashPasswordArgs};
use crate::error::BinResult;

/// Prints the Argon2 PHC string for a password.
pub async fn hash_password(_cli: &Cli, args: HashPasswordArgs) -> BinResult<()> {
    let password = match args.password {
        Some(password) => password,
        None => read_password(std::io::stdin().lock())?,
    };

    println!("{}", hash(password).await?);
    Ok(())
}

async fn hash(password: String) -> BinResult<String> {
    validate_password(&password)?;
    Ok(PasswordHasher::default().hash_blocking(password).await?)
}

fn read_password(mut input: impl BufRead) -> BinResult<String> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
