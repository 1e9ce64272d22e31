//! Snapshot sources and the loader that turns their content into `Snapshot`s.
//!
//! Ownership model:
//! - `SnapshotSource` only retrieves raw content; it knows nothing of encodings.
//! - `SnapshotLoader` owns the missing-source policy and delegates decoding to
//!   `decode::decode_snapshot`.
//! - Loaded snapshots are immutable; later stages build new values from them.

use tracing::{info, warn};

use crate::data::Snapshot;
use crate::errors::StatsError;
use crate::types::SourceId;

/// Content decoding (JSON document vs. newline-delimited JSON).
pub mod decode;
/// Source implementation modules.
pub mod sources;

pub use sources::file_source::FileSnapshotSource;
#[cfg(feature = "http")]
pub use sources::http_source::HttpSnapshotSource;

/// Retrieval interface for one named snapshot.
pub trait SnapshotSource: Send + Sync {
    /// Stable source identifier used in logs and errors.
    fn id(&self) -> &str;

    /// Fetch the raw snapshot body.
    ///
    /// Return `Ok(None)` when the source reports not-found or has nothing to
    /// serve; return `Err(StatsError::Fetch { .. })` for transport failures and
    /// other non-success outcomes.
    fn fetch(&self) -> Result<Option<String>, StatsError>;
}

/// Source serving a fixed body held in memory.
#[derive(Clone, Debug)]
pub struct InMemorySource {
    id: SourceId,
    body: Option<String>,
}

impl InMemorySource {
    /// Source that always returns `body`.
    pub fn new(id: impl Into<SourceId>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: Some(body.into()),
        }
    }

    /// Source that always reports not-found.
    pub fn missing(id: impl Into<SourceId>) -> Self {
        Self {
            id: id.into(),
            body: None,
        }
    }
}

impl SnapshotSource for InMemorySource {
    fn id(&self) -> &str {
        &self.id
    }

    fn fetch(&self) -> Result<Option<String>, StatsError> {
        Ok(self.body.clone())
    }
}

/// Loads a snapshot from a source, applying the allow-missing policy.
#[derive(Clone, Copy, Debug, Default)]
pub struct SnapshotLoader {
    allow_missing: bool,
}

impl SnapshotLoader {
    /// Loader that fails on missing, empty, or unparseable content.
    pub fn required() -> Self {
        Self {
            allow_missing: false,
        }
    }

    /// Loader that degrades missing, empty, or unparseable content to an empty snapshot.
    pub fn optional() -> Self {
        Self {
            allow_missing: true,
        }
    }

    /// Loader with an explicit allow-missing flag.
    pub fn new(allow_missing: bool) -> Self {
        Self { allow_missing }
    }

    /// Retrieve and decode `source`.
    pub fn load(&self, source: &dyn SnapshotSource) -> Result<Snapshot, StatsError> {
        let source_id = source.id();
        let body = match source.fetch() {
            Ok(Some(body)) => body,
            Ok(None) => {
                return self.absorb(
                    source_id,
                    StatsError::Fetch {
                        source_id: source_id.to_string(),
                        reason: "not found".into(),
                    },
                );
            }
            Err(err) => return self.absorb(source_id, err),
        };

        if body.trim().is_empty() {
            return self.absorb(
                source_id,
                StatsError::Parse {
                    source_id: source_id.to_string(),
                    details: "content is empty".into(),
                },
            );
        }

        match decode::decode_snapshot(source_id, &body) {
            Ok(snapshot) => {
                info!(
                    "[racestats:loader] loaded source '{}' records={} skipped_lines={}",
                    source_id,
                    snapshot.len(),
                    snapshot.skipped_lines
                );
                Ok(snapshot)
            }
            Err(err) => self.absorb(source_id, err),
        }
    }

    fn absorb(&self, source_id: &str, err: StatsError) -> Result<Snapshot, StatsError> {
        if self.allow_missing {
            warn!(
                "[racestats:loader] optional source '{}' unavailable, using empty snapshot: {err}",
                source_id
            );
            Ok(Snapshot::empty(source_id))
        } else {
            Err(err)
        }
    }
}
