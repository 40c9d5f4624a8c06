//! # LessonLab application library
//!
//! Library surface of THE BINARY, exposing the API router, journal, and
//! configuration for integration tests. The executable entry point lives
//! in `main.rs`.

pub mod api;
pub mod cli;
pub mod config;
pub mod journal;
