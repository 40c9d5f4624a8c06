//! # Server Configuration
//!
//! Configuration for THE BINARY, layered lowest to highest precedence:
//! built-in defaults, then `lessonlab.toml` (if present), then CLI flags.
//!
//! Security-sensitive settings (`LESSONLAB_CORS_ORIGINS`,
//! `LESSONLAB_RATE_LIMIT`, `LESSONLAB_API_KEY`) are environment-only and
//! read where they are used, in the API layer.

use std::path::{Path, PathBuf};

use lessonlab_core::{ControllerConfig, JumpPolicy, LessonError, primitives};
use serde::{Deserialize, Serialize};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "lessonlab.toml";

/// Maximum config file size. A config is a handful of lines.
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Host the HTTP server binds to.
    pub host: String,
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Default debounce window for new sessions, ms.
    pub debounce_ms: u64,
    /// Default jump policy for new sessions.
    pub jump_policy: JumpPolicy,
    /// Event journal database path. `None` keeps the journal in memory.
    pub journal_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            debounce_ms: primitives::DEFAULT_DEBOUNCE_MS,
            jump_policy: JumpPolicy::default(),
            journal_path: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, LessonError> {
        let metadata = std::fs::metadata(path)
            .map_err(|e| LessonError::IoError(format!("Cannot read config metadata: {e}")))?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(LessonError::DeserializationError(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| LessonError::IoError(format!("Read config: {e}")))?;
        toml::from_str(&contents)
            .map_err(|e| LessonError::DeserializationError(format!("Parse config: {e}")))
    }

    /// Load `lessonlab.toml` from the working directory if it exists,
    /// defaults otherwise.
    pub fn load_default() -> Result<Self, LessonError> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// The controller configuration new sessions start from.
    #[must_use]
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            debounce_ms: self.debounce_ms,
            jump_policy: self.jump_policy,
        }
    }

    /// The server bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_localhost_with_standard_debounce() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.debounce_ms, 300);
        assert_eq!(config.jump_policy, JumpPolicy::Unrestricted);
        assert!(config.journal_path.is_none());
    }

    #[test]
    fn parses_full_config_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            r#"
host = "0.0.0.0"
port = 9000
debounce_ms = 150
jump_policy = "visited_only"
journal_path = "events.redb"
"#
        )
        .expect("write");

        let config = AppConfig::from_file(file.path()).expect("parse");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.controller_config().debounce_ms, 150);
        assert_eq!(config.jump_policy, JumpPolicy::VisitedOnly);
        assert_eq!(config.journal_path, Some(PathBuf::from("events.redb")));
    }

    #[test]
    fn unknown_keys_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "hots = \"typo\"").expect("write");
        assert!(AppConfig::from_file(file.path()).is_err());
    }
}
