//! Lifecycle events for cairndb
//!
//! Events are explicit and typed; each has a stable name used as the
//! `event` field of the emitted log record.

use std::fmt;

/// Observable events in cairndb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & Lifecycle
    /// Engine open begins
    BootStart,
    /// Engine open complete, ready to serve
    BootComplete,
    /// Close initiated
    ShutdownStart,
    /// Close complete
    ShutdownComplete,

    // Configuration
    /// Configuration loaded and validated
    ConfigLoaded,

    // WAL
    /// Record appended and fsynced
    WalAppend,
    /// WAL truncated after checkpoint
    WalTruncate,
    /// Malformed WAL record found (FATAL)
    WalCorruption,

    // Snapshot
    /// Snapshot read and validated
    SnapshotLoaded,

    // Checkpoint
    CheckpointStart,
    CheckpointComplete,
    CheckpointFailed,

    // Recovery
    RecoveryStart,
    /// WAL replay begins
    RecoveryReplayBegin,
    /// WAL replay complete
    RecoveryReplayComplete,
    /// Index rebuild begins
    RecoveryIndexRebuildBegin,
    /// Index rebuild complete
    RecoveryIndexRebuildComplete,
    /// Recovery failed (FATAL)
    RecoveryFailed,

    // Indexes
    IndexCreated,
    IndexDropped,

    // Query
    QueryPlanned,
    QueryExecuted,

    // Bulk operations
    /// All documents removed
    CollectionCleared,
    /// Documents replaced from an external snapshot file
    LoadComplete,
}

/// Log level an event is emitted at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl Event {
    /// Returns the stable event name
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "BOOT_START",
            Event::BootComplete => "BOOT_COMPLETE",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::WalAppend => "WAL_APPEND",
            Event::WalTruncate => "WAL_TRUNCATED",
            Event::WalCorruption => "WAL_CORRUPTION",

            Event::SnapshotLoaded => "SNAPSHOT_LOADED",

            Event::CheckpointStart => "CHECKPOINT_BEGIN",
            Event::CheckpointComplete => "CHECKPOINT_COMPLETE",
            Event::CheckpointFailed => "CHECKPOINT_FAILED",

            Event::RecoveryStart => "RECOVERY_BEGIN",
            Event::RecoveryReplayBegin => "WAL_REPLAY_BEGIN",
            Event::RecoveryReplayComplete => "RECOVERY_REPLAY_COMPLETE",
            Event::RecoveryIndexRebuildBegin => "INDEX_REBUILD_BEGIN",
            Event::RecoveryIndexRebuildComplete => "INDEX_REBUILD_COMPLETE",
            Event::RecoveryFailed => "RECOVERY_FAILED",

            Event::IndexCreated => "INDEX_CREATED",
            Event::IndexDropped => "INDEX_DROPPED",

            Event::QueryPlanned => "QUERY_PLANNED",
            Event::QueryExecuted => "QUERY_COMPLETE",

            Event::CollectionCleared => "COLLECTION_CLEARED",
            Event::LoadComplete => "LOAD_COMPLETE",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::WalCorruption | Event::RecoveryFailed)
    }

    pub fn level(&self) -> EventLevel {
        match self {
            _ if self.is_fatal() => EventLevel::Error,
            Event::CheckpointFailed => EventLevel::Warn,
            Event::WalAppend | Event::QueryPlanned | Event::QueryExecuted => EventLevel::Debug,
            _ => EventLevel::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::BootStart.as_str(), "BOOT_START");
        assert_eq!(Event::RecoveryReplayComplete.as_str(), "RECOVERY_REPLAY_COMPLETE");
        assert_eq!(Event::CheckpointComplete.to_string(), "CHECKPOINT_COMPLETE");
    }

    #[test]
    fn test_levels() {
        assert!(Event::WalCorruption.is_fatal());
        assert_eq!(Event::RecoveryFailed.level(), EventLevel::Error);
        assert_eq!(Event::CheckpointFailed.level(), EventLevel::Warn);
        assert_eq!(Event::QueryPlanned.level(), EventLevel::Debug);
        assert_eq!(Event::BootComplete.level(), EventLevel::Info);
        assert!(!Event::BootComplete.is_fatal());
    }
}
