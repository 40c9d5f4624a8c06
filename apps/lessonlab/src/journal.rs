//! # Event Journal
//!
//! The host-owned storage for emitted lesson events. The core engine
//! emits and forgets; everything a widget session reports ends up here,
//! keyed by session id in emission order.
//!
//! Two backends:
//! - In-memory (default): events live for the process lifetime.
//! - Persistent (redb): ACID, crash-safe, survives restarts. Records are
//!   postcard-encoded.
//!
//! Journal append failures degrade to a dropped event with a warning;
//! they never disturb navigation or scoring.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use lessonlab_core::{EventSink, LessonError, LessonEvent};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

/// Table for events: (session_id, seq) -> postcard-serialized LessonEvent
const EVENTS: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("events");

// =============================================================================
// JOURNAL
// =============================================================================

enum Backend {
    Memory(Mutex<BTreeMap<u64, Vec<LessonEvent>>>),
    Persistent(Database),
}

/// Append-only event log keyed by session id.
pub struct EventJournal {
    backend: Backend,
}

impl std::fmt::Debug for EventJournal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backend = match self.backend {
            Backend::Memory(_) => "memory",
            Backend::Persistent(_) => "redb",
        };
        f.debug_struct("EventJournal")
            .field("backend", &backend)
            .finish()
    }
}

impl Default for EventJournal {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl EventJournal {
    /// Create an in-memory journal.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Mutex::new(BTreeMap::new())),
        }
    }

    /// Open or create a persistent journal at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LessonError> {
        let db =
            Database::create(path.as_ref()).map_err(|e| LessonError::IoError(e.to_string()))?;

        // Initialize the table if it doesn't exist
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| LessonError::IoError(e.to_string()))?;
            let _ = write_txn
                .open_table(EVENTS)
                .map_err(|e| LessonError::IoError(e.to_string()))?;
            write_txn
                .commit()
                .map_err(|e| LessonError::IoError(e.to_string()))?;
        }

        Ok(Self {
            backend: Backend::Persistent(db),
        })
    }

    /// Whether events survive a process restart.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, Backend::Persistent(_))
    }

    /// Append one event to a session's log.
    pub fn append(&self, session_id: u64, event: &LessonEvent) -> Result<(), LessonError> {
        match &self.backend {
            Backend::Memory(map) => {
                let mut map = map
                    .lock()
                    .map_err(|_| LessonError::IoError("journal lock poisoned".to_string()))?;
                map.entry(session_id).or_default().push(event.clone());
                Ok(())
            }
            Backend::Persistent(db) => {
                let bytes = postcard::to_stdvec(event)
                    .map_err(|e| LessonError::SerializationError(e.to_string()))?;

                let write_txn = db
                    .begin_write()
                    .map_err(|e| LessonError::IoError(e.to_string()))?;
                {
                    let mut table = write_txn
                        .open_table(EVENTS)
                        .map_err(|e| LessonError::IoError(e.to_string()))?;

                    let next_seq = table
                        .range((session_id, 0)..=(session_id, u64::MAX))
                        .map_err(|e| LessonError::IoError(e.to_string()))?
                        .next_back()
                        .transpose()
                        .map_err(|e| LessonError::IoError(e.to_string()))?
                        .map(|(key, _)| key.value().1 + 1)
                        .unwrap_or(0);

                    table
                        .insert((session_id, next_seq), bytes.as_slice())
                        .map_err(|e| LessonError::IoError(e.to_string()))?;
                }
                write_txn
                    .commit()
                    .map_err(|e| LessonError::IoError(e.to_string()))?;
                Ok(())
            }
        }
    }

    /// Read a session's full log, oldest first.
    pub fn read(&self, session_id: u64) -> Result<Vec<LessonEvent>, LessonError> {
        match &self.backend {
            Backend::Memory(map) => {
                let map = map
                    .lock()
                    .map_err(|_| LessonError::IoError("journal lock poisoned".to_string()))?;
                Ok(map.get(&session_id).cloned().unwrap_or_default())
            }
            Backend::Persistent(db) => {
                let read_txn = db
                    .begin_read()
                    .map_err(|e| LessonError::IoError(e.to_string()))?;
                let table = read_txn
                    .open_table(EVENTS)
                    .map_err(|e| LessonError::IoError(e.to_string()))?;

                let mut events = Vec::new();
                for entry in table
                    .range((session_id, 0)..=(session_id, u64::MAX))
                    .map_err(|e| LessonError::IoError(e.to_string()))?
                {
                    let (_, value) = entry.map_err(|e| LessonError::IoError(e.to_string()))?;
                    let event: LessonEvent = postcard::from_bytes(value.value())
                        .map_err(|e| LessonError::DeserializationError(e.to_string()))?;
                    events.push(event);
                }
                Ok(events)
            }
        }
    }

    /// Number of events recorded for a session.
    pub fn len(&self, session_id: u64) -> Result<usize, LessonError> {
        Ok(self.read(session_id)?.len())
    }
}

// =============================================================================
// JOURNAL SINK
// =============================================================================

/// The event sink handed to each hosted session: appends every emitted
/// event to the shared journal under the session's id.
///
/// Delivery failures are logged and dropped, never surfaced to the
/// engine.
pub struct JournalSink {
    session_id: u64,
    journal: Arc<EventJournal>,
}

impl JournalSink {
    /// Create a sink writing to `journal` under `session_id`.
    #[must_use]
    pub fn new(session_id: u64, journal: Arc<EventJournal>) -> Self {
        Self {
            session_id,
            journal,
        }
    }
}

impl EventSink for JournalSink {
    fn emit(&mut self, event: &LessonEvent) {
        if let Err(e) = self.journal.append(self.session_id, event) {
            tracing::warn!(
                session_id = self.session_id,
                error = %e,
                "Dropping lesson event: journal append failed"
            );
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
