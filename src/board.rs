//! Row assembler: unions racer keys, runs the calculator per key, and orders
//! the surviving rows.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::StatsConfig;
use crate::data::{DailyRow, EventRow, Snapshot};
use crate::index::{RacerIndex, union_keys};
use crate::metrics::{EventInputs, PeriodOutcome, daily_metrics, event_metrics};

/// Counts describing one assembly pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSummary {
    /// Distinct racer keys visited.
    pub visited: usize,
    /// Rows produced.
    pub rows: usize,
    /// Racers left out for a zero or negative race delta.
    pub inactive: usize,
    /// Racers left out by the anomaly cutoff.
    pub anomalous: usize,
}

/// Ordered rows plus the summary of how they were produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board<R> {
    /// Surviving rows, races descending.
    pub rows: Vec<R>,
    /// Counts from the pass that produced `rows`.
    pub summary: BoardSummary,
}

/// Indexed snapshots feeding the four-source event comparison.
#[derive(Clone, Debug, Default)]
pub struct EventIndices {
    /// Lean feed, earlier snapshot.
    pub lean_before: RacerIndex,
    /// Lean feed, current snapshot.
    pub lean_now: RacerIndex,
    /// Rich feed, earlier snapshot.
    pub rich_before: RacerIndex,
    /// Rich feed, current snapshot.
    pub rich_now: RacerIndex,
}

impl EventIndices {
    /// Index four loaded snapshots.
    pub fn from_snapshots(
        lean_before: &Snapshot,
        lean_now: &Snapshot,
        rich_before: &Snapshot,
        rich_now: &Snapshot,
    ) -> Self {
        Self {
            lean_before: RacerIndex::from_snapshot(lean_before),
            lean_now: RacerIndex::from_snapshot(lean_now),
            rich_before: RacerIndex::from_snapshot(rich_before),
            rich_now: RacerIndex::from_snapshot(rich_now),
        }
    }
}

/// Compute event rows for every racer known to any of the four snapshots.
pub fn assemble_event_board(indices: &EventIndices, config: &StatsConfig) -> Board<EventRow> {
    let keys = union_keys(&[
        &indices.rich_now,
        &indices.rich_before,
        &indices.lean_now,
        &indices.lean_before,
    ]);
    let board = collect_board(keys.iter().map(|key| {
        let inputs = EventInputs {
            lean_before: indices.lean_before.get_key(key),
            lean_now: indices.lean_now.get_key(key),
            rich_before: indices.rich_before.get_key(key),
            rich_now: indices.rich_now.get_key(key),
        };
        event_metrics(key, &inputs, config)
    }));
    info!(
        "[racestats:board] event board visited={} rows={} inactive={} anomalous={}",
        board.summary.visited, board.summary.rows, board.summary.inactive, board.summary.anomalous
    );
    board
}

/// Compute daily rows for every racer known to either snapshot.
pub fn assemble_daily_board(
    before: &RacerIndex,
    now: &RacerIndex,
    config: &StatsConfig,
) -> Board<DailyRow> {
    let keys = union_keys(&[now, before]);
    let board = collect_board(
        keys.iter()
            .map(|key| daily_metrics(key, before.get_key(key), now.get_key(key), config)),
    );
    info!(
        "[racestats:board] daily board visited={} rows={} inactive={} anomalous={}",
        board.summary.visited, board.summary.rows, board.summary.inactive, board.summary.anomalous
    );
    board
}

fn collect_board<R, I>(outcomes: I) -> Board<R>
where
    R: BoardRow,
    I: IntoIterator<Item = PeriodOutcome<R>>,
{
    let mut summary = BoardSummary::default();
    let mut rows = Vec::new();
    for outcome in outcomes {
        summary.visited += 1;
        match outcome {
            PeriodOutcome::Row(row) => rows.push(row),
            PeriodOutcome::Inactive => summary.inactive += 1,
            PeriodOutcome::Anomalous => summary.anomalous += 1,
        }
    }
    summary.rows = rows.len();
    Board {
        rows: sort_rows(rows, SortColumn::Races, SortDirection::Descending),
        summary,
    }
}

/// Column a board can be ordered by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortColumn {
    /// Display label, case-insensitive.
    Name,
    /// Team tag, case-insensitive.
    Tag,
    /// Period races.
    Races,
    /// Event speed; daily rows report their average speed.
    Speed,
    /// Event accuracy.
    Accuracy,
    /// Event derived score.
    Points,
    /// Period nitros.
    Nitros,
    /// Daily peak speed change.
    PeakSpeed,
    /// Daily profile view change.
    ProfileViews,
    /// Daily current average speed.
    AvgSpeed,
}

/// Sort direction; missing values stay last either way.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    /// Smallest first.
    Ascending,
    /// Largest first.
    #[default]
    Descending,
}

impl SortDirection {
    /// The opposite direction, for callers that toggle on repeated selection.
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Comparable value of one cell.
#[derive(Clone, Debug, PartialEq)]
pub enum SortValue<'a> {
    /// Compared case-insensitively.
    Text(&'a str),
    /// `None` sorts last.
    Number(Option<f64>),
}

/// Row type that can be ordered and filtered by the board helpers.
pub trait BoardRow {
    /// Racer key, used as the final tie-breaker.
    fn key(&self) -> &str;
    /// Period race delta.
    fn races(&self) -> i64;
    /// Value of `column`; columns the row lacks report `Number(None)`.
    fn sort_value(&self, column: SortColumn) -> SortValue<'_>;
}

impl BoardRow for EventRow {
    fn key(&self) -> &str {
        &self.key
    }

    fn races(&self) -> i64 {
        self.races
    }

    fn sort_value(&self, column: SortColumn) -> SortValue<'_> {
        match column {
            SortColumn::Name => SortValue::Text(&self.display_name),
            SortColumn::Tag => SortValue::Text(&self.tag),
            SortColumn::Races => SortValue::Number(Some(self.races as f64)),
            SortColumn::Speed => SortValue::Number(self.speed),
            SortColumn::Accuracy => SortValue::Number(self.accuracy),
            SortColumn::Points => SortValue::Number(self.points),
            SortColumn::Nitros => SortValue::Number(self.nitros.map(|n| n as f64)),
            SortColumn::PeakSpeed | SortColumn::ProfileViews | SortColumn::AvgSpeed => {
                SortValue::Number(None)
            }
        }
    }
}

impl BoardRow for DailyRow {
    fn key(&self) -> &str {
        &self.key
    }

    fn races(&self) -> i64 {
        self.races
    }

    fn sort_value(&self, column: SortColumn) -> SortValue<'_> {
        match column {
            SortColumn::Name => SortValue::Text(&self.display_name),
            SortColumn::Tag => SortValue::Text(&self.tag),
            SortColumn::Races => SortValue::Number(Some(self.races as f64)),
            SortColumn::Nitros => SortValue::Number(self.nitros.map(|n| n as f64)),
            SortColumn::PeakSpeed => SortValue::Number(Some(self.peak_speed_delta)),
            SortColumn::ProfileViews => SortValue::Number(Some(self.profile_views_delta as f64)),
            SortColumn::AvgSpeed | SortColumn::Speed => SortValue::Number(Some(self.avg_speed)),
            SortColumn::Accuracy | SortColumn::Points => SortValue::Number(None),
        }
    }
}

/// Return `rows` ordered by `column` in `direction`.
///
/// Missing values always sort after present ones; ties fall back to the racer
/// key in ascending order so the result is deterministic.
pub fn sort_rows<R: BoardRow>(mut rows: Vec<R>, column: SortColumn, direction: SortDirection) -> Vec<R> {
    rows.sort_by(|left, right| {
        compare_values(
            &left.sort_value(column),
            &right.sort_value(column),
            direction,
        )
        .then_with(|| left.key().cmp(right.key()))
    });
    rows
}

fn compare_values(left: &SortValue<'_>, right: &SortValue<'_>, direction: SortDirection) -> Ordering {
    let directed = |ordering: Ordering| match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    };
    match (left, right) {
        (SortValue::Text(left), SortValue::Text(right)) => {
            directed(left.to_lowercase().cmp(&right.to_lowercase()))
        }
        (SortValue::Number(Some(left)), SortValue::Number(Some(right))) => {
            directed(left.total_cmp(right))
        }
        (SortValue::Number(Some(_)), SortValue::Number(None)) => Ordering::Less,
        (SortValue::Number(None), SortValue::Number(Some(_))) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Rows whose race delta is at least `min_races`, order preserved.
pub fn retain_min_races<R: BoardRow + Clone>(rows: &[R], min_races: i64) -> Vec<R> {
    rows.iter()
        .filter(|row| row.races() >= min_races)
        .cloned()
        .collect()
}
