//! Concurrent snapshot loading and view resolution.
//!
//! Every source of a view is fetched on its own scoped thread. Indexing and
//! row assembly start only after all fetches have resolved, so no state is
//! shared between fetches.

use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::board::{Board, EventIndices, assemble_daily_board, assemble_event_board};
use crate::config::StatsConfig;
use crate::data::{DailyRow, EventRow, Snapshot};
use crate::errors::StatsError;
use crate::index::RacerIndex;
use crate::source::{SnapshotLoader, SnapshotSource};
use crate::types::LogMessage;

/// One source of a view and whether the view can proceed without it.
pub struct SourceSpec {
    /// Where the snapshot comes from.
    pub source: Box<dyn SnapshotSource>,
    /// Whether a failure of this source fails the view.
    pub required: bool,
}

impl SourceSpec {
    /// Source whose failure turns the view into an error.
    pub fn required(source: impl SnapshotSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            required: true,
        }
    }

    /// Source whose failure degrades to an empty snapshot.
    pub fn optional(source: impl SnapshotSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            required: false,
        }
    }

    /// Wrap an already boxed source.
    pub fn boxed(source: Box<dyn SnapshotSource>, required: bool) -> Self {
        Self { source, required }
    }

    /// Identifier of the wrapped source.
    pub fn id(&self) -> &str {
        self.source.id()
    }

    fn loader(&self) -> SnapshotLoader {
        SnapshotLoader::new(!self.required)
    }
}

/// Load every spec concurrently; results keep the order of `specs`.
pub fn load_sources(specs: &[SourceSpec]) -> Vec<Result<Snapshot, StatsError>> {
    thread::scope(|scope| {
        let handles: Vec<_> = specs
            .iter()
            .map(|spec| {
                scope.spawn(move || {
                    let start = Instant::now();
                    let result = spec.loader().load(spec.source.as_ref());
                    (result, start.elapsed())
                })
            })
            .collect();

        handles
            .into_iter()
            .zip(specs)
            .map(|(handle, spec)| match handle.join() {
                Ok((result, elapsed)) => {
                    debug!(
                        source_id = %spec.id(),
                        fetch_ms = elapsed.as_millis(),
                        ok = result.is_ok(),
                        "source load completed"
                    );
                    result
                }
                Err(_) => {
                    let err = StatsError::Fetch {
                        source_id: spec.id().to_string(),
                        reason: "source load thread panicked".into(),
                    };
                    if spec.required {
                        Err(err)
                    } else {
                        warn!("[racestats:ingest] {err}; using empty snapshot");
                        Ok(Snapshot::empty(spec.id()))
                    }
                }
            })
            .collect()
    })
}

/// Outcome of computing one view, as presented to the user.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewStatus<R> {
    /// Rows are available.
    Ready {
        board: Board<R>,
        /// Timestamp of the newest snapshot that carried one.
        updated_at: Option<DateTime<Utc>>,
    },
    /// Nothing to compare (a side of the comparison is empty).
    NoData,
    /// A required source failed.
    Error(LogMessage),
}

impl<R> ViewStatus<R> {
    /// Rows when ready, otherwise `None`.
    pub fn board(&self) -> Option<&Board<R>> {
        match self {
            Self::Ready { board, .. } => Some(board),
            Self::NoData | Self::Error(_) => None,
        }
    }

    /// True when a required source failed.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// The four sources of the event comparison.
pub struct EventSources {
    /// Lean feed, earlier snapshot.
    pub lean_before: SourceSpec,
    /// Lean feed, current snapshot.
    pub lean_now: SourceSpec,
    /// Rich feed, earlier snapshot.
    pub rich_before: SourceSpec,
    /// Rich feed, current snapshot.
    pub rich_now: SourceSpec,
}

/// The two sources of the daily comparison.
pub struct DailySources {
    /// Earlier snapshot.
    pub before: SourceSpec,
    /// Current snapshot.
    pub now: SourceSpec,
}

impl DailySources {
    /// Conventional policy: the current snapshot is required, the previous one optional.
    pub fn new(before: impl SnapshotSource + 'static, now: impl SnapshotSource + 'static) -> Self {
        Self {
            before: SourceSpec::optional(before),
            now: SourceSpec::required(now),
        }
    }
}

/// Load the four event sources and compute the event view.
pub fn run_event_view(sources: EventSources, config: &StatsConfig) -> ViewStatus<EventRow> {
    let started = Instant::now();
    let specs = [
        sources.lean_before,
        sources.lean_now,
        sources.rich_before,
        sources.rich_now,
    ];
    let snapshots = match collect_required::<4>(load_sources(&specs)) {
        Ok(snapshots) => snapshots,
        Err(message) => return ViewStatus::Error(message),
    };
    let [lean_before, lean_now, rich_before, rich_now] = snapshots;

    if (lean_before.is_empty() && rich_before.is_empty())
        || (lean_now.is_empty() && rich_now.is_empty())
    {
        debug!("[racestats:ingest] event view has no comparable snapshots");
        return ViewStatus::NoData;
    }

    let indices = EventIndices::from_snapshots(&lean_before, &lean_now, &rich_before, &rich_now);
    let board = assemble_event_board(&indices, config);
    log_elapsed("event", started.elapsed());
    ViewStatus::Ready {
        board,
        updated_at: rich_now.updated_at.or(lean_now.updated_at),
    }
}

/// Load the two daily sources and compute the daily view.
pub fn run_daily_view(sources: DailySources, config: &StatsConfig) -> ViewStatus<DailyRow> {
    let started = Instant::now();
    let specs = [sources.before, sources.now];
    let snapshots = match collect_required::<2>(load_sources(&specs)) {
        Ok(snapshots) => snapshots,
        Err(message) => return ViewStatus::Error(message),
    };
    let [before, now] = snapshots;

    if before.is_empty() || now.is_empty() {
        debug!("[racestats:ingest] daily view has no comparable snapshots");
        return ViewStatus::NoData;
    }

    let board = assemble_daily_board(
        &RacerIndex::from_snapshot(&before),
        &RacerIndex::from_snapshot(&now),
        config,
    );
    log_elapsed("daily", started.elapsed());
    ViewStatus::Ready {
        board,
        updated_at: now.updated_at,
    }
}

fn collect_required<const N: usize>(
    results: Vec<Result<Snapshot, StatsError>>,
) -> Result<[Snapshot; N], LogMessage> {
    let mut snapshots = Vec::with_capacity(N);
    for result in results {
        match result {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(err) => {
                warn!("[racestats:ingest] required source failed: {err}");
                return Err(err.to_string());
            }
        }
    }
    snapshots
        .try_into()
        .map_err(|loaded: Vec<Snapshot>| {
            format!("expected {N} snapshots, loaded {}", loaded.len())
        })
}

fn log_elapsed(view: &str, elapsed: Duration) {
    debug!(
        view,
        elapsed_ms = elapsed.as_millis(),
        "view computed"
    );
}
