#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Row assembly, ordering, and post-filtering.
pub mod board;
/// Engine configuration types.
pub mod config;
/// Centralized constants used across normalization, metrics, and layout.
pub mod constants;
/// Racer record, snapshot, and computed row types.
pub mod data;
/// Reusable CLI runners shared by the demo binaries.
pub mod example_apps;
/// Case-insensitive racer indexes.
pub mod index;
/// Concurrent source loading and view resolution.
pub mod ingestion;
/// Period-metric calculator.
pub mod metrics;
/// Raw record normalization.
pub mod normalize;
/// Snapshot source traits, loader, and built-in sources.
pub mod source;
/// Input transports used by sources (filesystem and HTTP).
pub mod transport;
/// Shared type aliases.
pub mod types;
/// Coercion and fallback helpers.
pub mod utils;

mod errors;

pub use board::{
    Board, BoardRow, BoardSummary, EventIndices, SortColumn, SortDirection, assemble_daily_board,
    assemble_event_board, retain_min_races, sort_rows,
};
pub use config::{CutoffMode, SpeedMethod, StatsConfig};
pub use data::{DailyRow, EventRow, RacerRecord, Snapshot};
pub use errors::StatsError;
pub use index::{RacerIndex, union_keys};
pub use ingestion::{
    DailySources, EventSources, SourceSpec, ViewStatus, load_sources, run_daily_view,
    run_event_view,
};
pub use metrics::{EventInputs, PeriodOutcome, daily_metrics, event_metrics};
pub use normalize::normalize_record;
#[cfg(feature = "http")]
pub use source::HttpSnapshotSource;
pub use source::{FileSnapshotSource, InMemorySource, SnapshotLoader, SnapshotSource};
pub use types::{LogMessage, RacerKey, SourceId, Username};
