// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use warden_config::{Environment, WardenConfig};

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::error::{BinError, BinResult};
use crate::runtime::load_config;

/// Executes the `validate` command.
///
/// Fatal problems fail the command; questionable settings are listed as
/// warnings.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config = load_config(cli.config.as_deref())?;
    let warnings = collect_warnings(&config);
    let source = cli
        .config
        .as_ref()
        .map_or_else(|| "(defaults + environment)".to_string(), |p| p.display().to_string());

    match args.format {
        OutputFormat::Text => {
            println!("✓ Configuration is valid: {source}");
            println!();
            println!("Summary:");
            println!("  Environment:   {}", config.environment);
            println!("  Listen:        {}", config.server.socket_addr());
            println!(
                "  Token TTLs:    access {}s, refresh {}s",
                config.security.jwt.access_ttl_secs, config.security.jwt.refresh_ttl_secs
            );
            println!(
                "  Rate limiting: {}",
                if config.rate_limit_enabled() { "enabled" } else { "disabled" }
            );
            println!(
                "  Audit:         {}",
                if config.security.audit.enabled { "enabled" } else { "disabled" }
            );

            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &warnings {
                    println!("  ⚠ {warning}");
                }
            }

            if args.show {
                println!();
                println!("Effective configuration:");
                println!("{}", to_json(&config)?);
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "source": source,
                "environment": config.environment.as_str(),
                "listen": config.server.socket_addr().to_string(),
                "rate_limit_enabled": config.rate_limit_enabled(),
                "warnings": warnings,
                "config": if args.show { Some(&config) } else { None },
            });
            println!("{}", to_json(&output)?);
        }
    }

    Ok(())
}

fn to_json(value: &impl serde::Serialize) -> BinResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| BinError::config(format!("Failed to render configuration: {e}")))
}

/// Settings that start fine but deserve a second look.
fn collect_warnings(config: &WardenConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !config.rate_limit_enabled() && config.environment != Environment::Testing {
        warnings.push("Rate limiting is disabled".to_string());
    }
    if config.security.rate_limit.trust_forwarded_for {
        warnings.push(
            "Rate limiting trusts X-Forwarded-For; only safe behind a proxy that sets it"
                .to_string(),
        );
    }
    if config.environment.is_production()
        && config.security.cors.allowed_origins.iter().any(|o| o == "*")
    {
        warnings.push("CORS allows any origin in production".to_string());
    }
    if config.seed.enabled
        && config.seed.admin_password == warden_config::SeedConfig::default().admin_password
    {
        warnings.push("Seed superuser uses the default password".to_string());
    }

    warnings
}
