//! # LessonLab CLI Module
//!
//! This module implements the CLI interface for LessonLab.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `lessons` - List the catalog or show one lesson
//! - `walk` - Run a scripted walkthrough of a lesson
//! - `eval` - Evaluate a model request from a JSON file
//! - `events` - Dump a session's event log from a journal

mod commands;

use clap::{Parser, Subcommand};
use lessonlab_core::LessonError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// LessonLab - Interactive Micro-Lesson Server
///
/// A deterministic lesson engine: ten pedagogical stages, explicit
/// prediction, and a scored mastery gate.
#[derive(Parser, Debug)]
#[command(name = "lessonlab")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a configuration file (default: lessonlab.toml if present)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to a persistent event journal (default: in-memory)
    #[arg(short = 'j', long, global = true)]
    pub journal: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides config file)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List the lesson catalog, or show one lesson in full
    Lessons {
        /// Lesson id to show in detail
        #[arg(short, long)]
        lesson: Option<String>,
    },

    /// Run a scripted walkthrough of a lesson from hook to mastery
    Walk {
        /// Lesson id to walk
        #[arg(short, long)]
        lesson: String,

        /// Answer every quiz question wrong to demonstrate the mastery gate
        #[arg(long)]
        fail_quiz: bool,
    },

    /// Evaluate a model request from a JSON file
    Eval {
        /// Path to the JSON request file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Dump a session's event log from a persistent journal
    Events {
        /// Session id to dump
        #[arg(short, long)]
        session: u64,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), LessonError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            cmd_server(cli.config.as_deref(), cli.journal.as_deref(), host, port).await
        }
        Some(Commands::Lessons { lesson }) => cmd_lessons(json_mode, lesson.as_deref()),
        Some(Commands::Walk { lesson, fail_quiz }) => cmd_walk(json_mode, &lesson, fail_quiz),
        Some(Commands::Eval { file }) => cmd_eval(json_mode, &file),
        Some(Commands::Events { session }) => {
            cmd_events(json_mode, cli.journal.as_deref(), session)
        }
        None => {
            // No subcommand - list the catalog by default
            cmd_lessons(json_mode, None)
        }
    }
}
