use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::racer_key;

pub use crate::types::{RacerKey, SourceId, Username};

/// Canonical racer state at one point in time.
///
/// Built by `normalize::normalize_record`; every numeric field is finite and
/// defaulted, every string field is present (possibly empty).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RacerRecord {
    /// Racer identifier as published by the feed.
    pub username: Username,
    /// Human-readable label, possibly empty.
    pub display_name: String,
    /// Team tag, possibly empty.
    pub tag: String,
    /// Profile title.
    pub title: String,
    /// Membership level (`basic` when absent).
    pub membership: String,
    /// Join date exactly as published (date-like string).
    pub join_date: String,
    /// Profile link as published.
    pub profile_url: String,
    /// Lifetime race count (`racesPlayed` or `lifetimeRaces`).
    pub lifetime_races: f64,
    /// Cumulative average speed.
    pub avg_speed: f64,
    /// Best speed ever recorded.
    pub high_speed: f64,
    /// Profile view counter.
    pub profile_views: f64,
    /// Garage item count.
    pub garage_cars: f64,
    /// Nitro-use count; `None` when the feed does not publish the field.
    pub nitros_used: Option<f64>,
    /// Longest session length.
    pub longest_session: f64,
    /// League tier.
    pub league_tier: f64,
    /// Characters typed (lean feed accumulator).
    pub typed: f64,
    /// Typing errors (lean feed accumulator).
    pub errs: f64,
    /// Races counted by the lean feed's speed average.
    pub played: f64,
}

impl RacerRecord {
    /// Lowercased pairing key for this record.
    pub fn key(&self) -> RacerKey {
        racer_key(&self.username)
    }
}

/// Immutable collection of racer records loaded from one source.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Source the records were loaded from.
    pub source_id: SourceId,
    /// Publication time when the container carried one.
    pub updated_at: Option<DateTime<Utc>>,
    /// Records in source order.
    pub racers: Vec<RacerRecord>,
    /// Newline-delimited records that failed to parse and were skipped.
    pub skipped_lines: usize,
}

impl Snapshot {
    /// Empty snapshot used when an optional source is missing.
    pub fn empty(source_id: impl Into<SourceId>) -> Self {
        Self {
            source_id: source_id.into(),
            ..Self::default()
        }
    }

    /// True when the snapshot holds no records.
    pub fn is_empty(&self) -> bool {
        self.racers.is_empty()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.racers.len()
    }
}

/// Period metrics for one racer across the four-source event comparison.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRow {
    /// Pairing key.
    pub key: RacerKey,
    /// Identifier as published, preferring the rich feed.
    pub username: Username,
    /// Display label, falling back to `username`.
    pub display_name: String,
    /// Team tag, possibly empty.
    pub tag: String,
    /// Races completed during the period (always positive).
    pub races: i64,
    /// Period speed; `None` when no lean-feed record is available.
    pub speed: Option<f64>,
    /// Period accuracy percentage; `None` when no characters were typed.
    pub accuracy: Option<f64>,
    /// Derived score; present only when both speed and accuracy are.
    pub points: Option<f64>,
    /// Nitros used during the period, floored at 0; `None` unless both rich-feed
    /// records carry the counter.
    pub nitros: Option<i64>,
}

/// Period-over-period change for one racer within a single feed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyRow {
    /// Pairing key.
    pub key: RacerKey,
    /// Identifier as published.
    pub username: Username,
    /// Display label, falling back to `username`.
    pub display_name: String,
    /// Team tag, possibly empty.
    pub tag: String,
    /// Races completed during the period (always positive, below the anomaly cutoff).
    pub races: i64,
    /// Change in peak speed; may be negative.
    pub peak_speed_delta: f64,
    /// Change in profile views.
    pub profile_views_delta: i64,
    /// Nitros used during the period; `None` when either snapshot lacks the field.
    pub nitros: Option<i64>,
    /// Average speed from the newer snapshot.
    pub avg_speed: f64,
}
