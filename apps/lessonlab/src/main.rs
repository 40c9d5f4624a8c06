//! # LessonLab - Interactive Micro-Lesson Server
//!
//! The main binary for the LessonLab deterministic lesson engine.
//!
//! This application provides:
//! - HTTP REST API server (axum-based) hosting lesson sessions
//! - CLI interface for lesson operations
//! - The host-owned event journal
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                apps/lessonlab (THE BINARY)                │
//! │                                                           │
//! │  ┌─────────────┐   ┌─────────────┐   ┌────────────────┐  │
//! │  │   CLI       │   │  HTTP API   │   │ Event Journal  │  │
//! │  │  (clap)     │   │  (axum)     │   │ (memory/redb)  │  │
//! │  └──────┬──────┘   └──────┬──────┘   └───────┬────────┘  │
//! │         │                 │                  │           │
//! │         └─────────────────┼──────────────────┘           │
//! │                           ▼                              │
//! │                 ┌──────────────────┐                     │
//! │                 │  lessonlab-core  │                     │
//! │                 │   (THE LOGIC)    │                     │
//! │                 └──────────────────┘                     │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! lessonlab server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! lessonlab lessons
//! lessonlab walk --lesson projectile_motion
//! lessonlab eval --file request.json
//! ```

use clap::Parser;
use lessonlab::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing — LESSONLAB_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("LESSONLAB_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lessonlab=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Display startup banner
    if !cli.quiet {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the LessonLab startup banner.
fn print_banner() {
    println!(
        r#"
  ██╗     ███████╗███████╗███████╗ ██████╗ ███╗   ██╗██╗      █████╗ ██████╗
  ██║     ██╔════╝██╔════╝██╔════╝██╔═══██╗████╗  ██║██║     ██╔══██╗██╔══██╗
  ██║     █████╗  ███████╗███████╗██║   ██║██╔██╗ ██║██║     ███████║██████╔╝
  ██║     ██╔══╝  ╚════██║╚════██║██║   ██║██║╚██╗██║██║     ██╔══██║██╔══██╗
  ███████╗███████╗███████║███████║╚██████╔╝██║ ╚████║███████╗██║  ██║██████╔╝
  ╚══════╝╚══════╝╚══════╝╚══════╝ ╚═════╝ ╚═╝  ╚═══╝╚══════╝╚═╝  ╚═╝╚═════╝

  Interactive Micro-Lesson Server v{}

  Predict • Play • Master
"#,
        env!("CARGO_PKG_VERSION")
    );
}
