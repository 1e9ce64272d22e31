use std::io;

use thiserror::Error;

use crate::types::SourceId;

/// Error type for snapshot retrieval, decoding, configuration, and IO failures.
#[derive(Debug, Error)]
pub enum StatsError {
    /// A source could not be reached or refused the request.
    #[error("snapshot source '{source_id}' could not be fetched: {reason}")]
    Fetch {
        /// Failing source.
        source_id: SourceId,
        /// Transport or status detail.
        reason: String,
    },
    /// A source answered with content that is not a snapshot.
    #[error("snapshot source '{source_id}' could not be parsed: {details}")]
    Parse {
        /// Failing source.
        source_id: SourceId,
        /// Decoder detail.
        details: String,
    },
    /// Local filesystem failure outside a source fetch.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Invalid config file or option value.
    #[error("configuration error: {0}")]
    Configuration(String),
}
