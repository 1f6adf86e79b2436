// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Logging and tracing initialization.
//!
//! `RUST_LOG` wins over the level passed in, so operators can always turn
//! individual targets up without touching the configuration.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::LogFormat;

/// Noisy dependency targets capped below the application level.
const DEPENDENCY_DIRECTIVES: &[&str] = &["hyper=warn", "tower=warn", "axum=info", "tokio=info"];

// =============================================================================
// Logging Initialization
// =============================================================================

/// Initializes the logging subsystem.
///
/// Calling it twice is harmless; the second call leaves the first
/// subscriber in place.
///
/// # Example
///
/// ```ignore
/// use warden_bin::cli::LogFormat;
/// use warden_bin::logging::init_logging;
///
/// init_logging("info", LogFormat::Text);
/// ```
pub fn init_logging(level: &str, format: LogFormat) {
    let filter = build_filter(EnvFilter::try_from_default_env().ok(), level);

    match format {
        LogFormat::Text => init_text_logging(filter),
        LogFormat::Json => init_json_logging(filter),
        LogFormat::Compact => init_compact_logging(filter),
    }
}

/// Builds the filter: `from_env` when set, otherwise `level` plus the
/// dependency caps.
fn build_filter(from_env: Option<EnvFilter>, level: &str) -> EnvFilter {
    if let Some(filter) = from_env {
        return filter;
    }

    let mut filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    for directive in DEPENDENCY_DIRECTIVES {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

fn init_text_logging(filter: EnvFilter) {
    let is_terminal = std::io::IsTerminal::is_terminal(&std::io::stdout());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(is_terminal),
        )
        .try_init();
}

/// JSON lines for log aggregation. Audit entries keep `target = "audit"`.
fn init_json_logging(filter: EnvFilter) {
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_current_span(true)
                .with_span_list(false),
        )
        .try_init();
}

fn init_compact_logging(filter: EnvFilter) {
    let is_terminal = std::io::IsTerminal::is_terminal(&std::io::stdout());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(is_terminal),
        )
        .try_init();
}

// =============================================================================
// Tests
// =============================================================================
