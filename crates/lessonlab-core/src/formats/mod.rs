//! # Serialization Formats
//!
//! Pure byte-level formats. No file I/O happens in this crate; hosts
//! decide where snapshot bytes live.

pub mod snapshot;

pub use snapshot::{SessionSnapshot, SnapshotHeader, snapshot_from_bytes, snapshot_to_bytes};
