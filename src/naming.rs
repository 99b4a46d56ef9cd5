//! Artifact identifiers.
//!
//! Every pipeline invocation writes exactly one artifact whose name embeds an
//! identifier from an [`ArtifactNamer`]. The namer is injected through
//! [`crate::config::RelayConfig`] so tests can use [`SequenceNamer`] and get
//! predictable file names.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Produces the unique part of an artifact file name.
pub trait ArtifactNamer: Send + Sync {
    /// Return a fresh identifier. Must be usable inside a file name.
    fn next_id(&self) -> String;
}

/// Random UUID v4 identifiers (default).
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidNamer;

impl ArtifactNamer for UuidNamer {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

/// Unix-millisecond identifiers.
///
/// Two calls in the same millisecond collide; only use this where that is
/// acceptable.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimestampNamer;

impl ArtifactNamer for TimestampNamer {
    fn next_id(&self) -> String {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0)
            .to_string()
    }
}

/// `<prefix>-1`, `<prefix>-2`, … Deterministic, for tests and reproducible runs.
#[derive(Debug)]
pub struct SequenceNamer {
    prefix: String,
    counter: AtomicU64,
}

impl SequenceNamer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl ArtifactNamer for SequenceNamer {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{}", self.prefix, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_namer_counts_up() {
        let namer = SequenceNamer::new("t");
        assert_eq!(namer.next_id(), "t-1");
        assert_eq!(namer.next_id(), "t-2");
    }

    #[test]
    fn uuid_namer_is_file_name_safe() {
        let id = UuidNamer.next_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, UuidNamer.next_id());
    }

    #[test]
    fn timestamp_namer_is_numeric() {
        let id = TimestampNamer.next_id();
        assert!(id.parse::<u128>().is_ok());
    }
}
