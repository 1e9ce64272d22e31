//! Period-metric calculator.
//!
//! Two comparisons are supported:
//! - the four-source event comparison, pairing a lean feed (typing counters,
//!   cumulative speed) with a rich feed (profile counters) at two points in time;
//! - the two-source daily comparison, diffing one feed against itself.
//!
//! Both return a `PeriodOutcome`: either a row, or the reason the racer was
//! left out. Neither case is an error. Only the daily comparison applies the
//! anomaly cutoff; an event row is dropped only for a non-positive delta.

use crate::config::{SpeedMethod, StatsConfig};
use crate::constants::metrics::{ACCURACY_MAX, SCORE_BASE, SCORE_SPEED_DIVISOR};
use crate::data::{DailyRow, EventRow, RacerRecord};
use crate::utils::first_non_empty;

/// Result of computing one racer's period metrics.
#[derive(Clone, Debug, PartialEq)]
pub enum PeriodOutcome<R> {
    /// Racer was active; the computed row.
    Row(R),
    /// Race delta was zero or negative.
    Inactive,
    /// Race delta tripped the anomaly cutoff.
    Anomalous,
}

impl<R> PeriodOutcome<R> {
    /// The row, dropping the reason a racer was left out.
    pub fn into_row(self) -> Option<R> {
        match self {
            Self::Row(row) => Some(row),
            Self::Inactive | Self::Anomalous => None,
        }
    }
}

/// The up-to-four records paired for one racer in the event comparison.
#[derive(Clone, Copy, Debug, Default)]
pub struct EventInputs<'a> {
    /// Lean feed, earlier snapshot.
    pub lean_before: Option<&'a RacerRecord>,
    /// Lean feed, current snapshot.
    pub lean_now: Option<&'a RacerRecord>,
    /// Rich feed, earlier snapshot.
    pub rich_before: Option<&'a RacerRecord>,
    /// Rich feed, current snapshot.
    pub rich_now: Option<&'a RacerRecord>,
}

impl<'a> EventInputs<'a> {
    fn lean_pair(&self) -> Option<(&'a RacerRecord, &'a RacerRecord)> {
        self.lean_before.zip(self.lean_now)
    }

    fn rich_pair(&self) -> Option<(&'a RacerRecord, &'a RacerRecord)> {
        self.rich_before.zip(self.rich_now)
    }
}

/// Compute the event row for one racer identified by `key`.
pub fn event_metrics(
    key: &str,
    inputs: &EventInputs<'_>,
    config: &StatsConfig,
) -> PeriodOutcome<EventRow> {
    let rich_delta = inputs
        .rich_pair()
        .map(|(before, now)| count_delta(now.lifetime_races, before.lifetime_races))
        .filter(|delta| *delta != 0);
    let lean_delta = inputs
        .lean_pair()
        .map(|(before, now)| count_delta(now.lifetime_races, before.lifetime_races));
    let races = rich_delta.or(lean_delta).unwrap_or(0);
    if races <= 0 {
        return PeriodOutcome::Inactive;
    }

    let accuracy = inputs.lean_pair().and_then(|(before, now)| {
        let typed = (now.typed - before.typed).max(0.0);
        let errs = (now.errs - before.errs).max(0.0);
        accuracy_pct(typed, errs)
    });
    let speed = inputs
        .lean_now
        .map(|now| period_speed(inputs.lean_before, now, config.speed_method));
    let points = speed
        .zip(accuracy)
        .map(|(speed, accuracy)| derived_score(speed, accuracy));
    let nitros = inputs
        .rich_pair()
        .and_then(|(before, now)| nitros_delta(before, now))
        .map(|delta| delta.max(0));

    let username = first_non_empty(
        [
            inputs.rich_now,
            inputs.rich_before,
            inputs.lean_now,
            inputs.lean_before,
        ]
        .map(|record| record.map(|record| record.username.as_str())),
    )
    .unwrap_or(key)
    .to_string();
    let display_name = first_non_empty(
        [inputs.lean_now, inputs.lean_before]
            .map(|record| record.map(|record| record.display_name.as_str())),
    )
    .unwrap_or(&username)
    .to_string();
    let tag = first_non_empty(
        [
            inputs.rich_now,
            inputs.rich_before,
            inputs.lean_now,
            inputs.lean_before,
        ]
        .map(|record| record.map(|record| record.tag.as_str())),
    )
    .unwrap_or_default()
    .to_string();

    PeriodOutcome::Row(EventRow {
        key: key.to_string(),
        username,
        display_name,
        tag,
        races,
        speed,
        accuracy,
        points,
        nitros,
    })
}

/// Compute the daily row for one racer from two snapshots of the same feed.
///
/// A racer missing from either snapshot has no measurable period and is inactive.
pub fn daily_metrics(
    key: &str,
    before: Option<&RacerRecord>,
    now: Option<&RacerRecord>,
    config: &StatsConfig,
) -> PeriodOutcome<DailyRow> {
    let Some((before, now)) = before.zip(now) else {
        return PeriodOutcome::Inactive;
    };
    let races = count_delta(now.lifetime_races, before.lifetime_races);
    if races <= 0 {
        return PeriodOutcome::Inactive;
    }
    if config.is_anomalous(races) {
        return PeriodOutcome::Anomalous;
    }

    let username = first_non_empty([Some(now.username.as_str()), Some(before.username.as_str())])
        .unwrap_or(key)
        .to_string();
    let display_name = first_non_empty([
        Some(now.display_name.as_str()),
        Some(before.display_name.as_str()),
    ])
    .unwrap_or(&username)
    .to_string();
    let tag = first_non_empty([Some(now.tag.as_str()), Some(before.tag.as_str())])
        .unwrap_or_default()
        .to_string();

    PeriodOutcome::Row(DailyRow {
        key: key.to_string(),
        username,
        display_name,
        tag,
        races,
        peak_speed_delta: now.high_speed - before.high_speed,
        profile_views_delta: count_delta(now.profile_views, before.profile_views),
        nitros: nitros_delta(before, now),
        avg_speed: now.avg_speed,
    })
}

/// Accuracy percentage for a period, or `None` when nothing was typed.
pub fn accuracy_pct(typed_delta: f64, errs_delta: f64) -> Option<f64> {
    if typed_delta <= 0.0 {
        return None;
    }
    let accuracy = ACCURACY_MAX * (1.0 - errs_delta / typed_delta);
    Some(accuracy.clamp(0.0, ACCURACY_MAX))
}

/// Period-only average speed recovered from two cumulative snapshots.
///
/// Returns `None` when the played count did not grow or the result is not a
/// finite, non-negative number.
pub fn weighted_speed(before: &RacerRecord, now: &RacerRecord) -> Option<f64> {
    let played_delta = now.played - before.played;
    if played_delta <= 0.0 {
        return None;
    }
    let speed = (now.avg_speed * now.played - before.avg_speed * before.played) / played_delta;
    (speed.is_finite() && speed >= 0.0).then_some(speed)
}

/// Period speed for a racer with a current lean-feed record.
///
/// Falls back from the weighted value to the snapshot average, and floors at 0.
pub fn period_speed(before: Option<&RacerRecord>, now: &RacerRecord, method: SpeedMethod) -> f64 {
    let weighted = match method {
        SpeedMethod::Weighted => before.and_then(|before| weighted_speed(before, now)),
        SpeedMethod::Snapshot => None,
    };
    weighted
        .or_else(|| (now.avg_speed.is_finite() && now.avg_speed >= 0.0).then_some(now.avg_speed))
        .unwrap_or(0.0)
}

/// Score rewarding both speed and precision: `100 + (speed / 2) * (accuracy / 100)`.
pub fn derived_score(speed: f64, accuracy: f64) -> f64 {
    SCORE_BASE + (speed / SCORE_SPEED_DIVISOR) * (accuracy / ACCURACY_MAX)
}

/// Nitro usage over the period; absent unless both records carry the counter.
fn nitros_delta(before: &RacerRecord, now: &RacerRecord) -> Option<i64> {
    now.nitros_used
        .zip(before.nitros_used)
        .map(|(now, before)| count_delta(now, before))
}

fn count_delta(now: f64, before: f64) -> i64 {
    (now - before).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CutoffMode;

    fn lean(typed: f64, errs: f64, played: f64, avg_speed: f64, races: f64) -> RacerRecord {
        RacerRecord {
            username: "kat".into(),
            display_name: "Kat".into(),
            typed,
            errs,
            played,
            avg_speed,
            lifetime_races: races,
            ..RacerRecord::default()
        }
    }

    fn rich(races: f64, nitros: Option<f64>) -> RacerRecord {
        RacerRecord {
            username: "Kat".into(),
            tag: "ZOOM".into(),
            lifetime_races: races,
            nitros_used: nitros,
            ..RacerRecord::default()
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn weighted_speed_recovers_period_average() {
        let before = lean(0.0, 0.0, 10.0, 80.0, 0.0);
        let now = lean(0.0, 0.0, 30.0, 100.0, 0.0);
        assert_close(weighted_speed(&before, &now).unwrap(), 110.0);
    }

    #[test]
    fn weighted_speed_rejects_stalled_or_negative_periods() {
        let before = lean(0.0, 0.0, 30.0, 100.0, 0.0);
        let same = lean(0.0, 0.0, 30.0, 120.0, 0.0);
        assert_eq!(weighted_speed(&before, &same), None);

        let slower = lean(0.0, 0.0, 31.0, 1.0, 0.0);
        assert_eq!(weighted_speed(&before, &slower), None);
    }

    #[test]
    fn period_speed_falls_back_to_snapshot_then_zero() {
        let before = lean(0.0, 0.0, 30.0, 100.0, 0.0);
        let now = lean(0.0, 0.0, 30.0, 95.0, 0.0);
        assert_close(period_speed(Some(&before), &now, SpeedMethod::Weighted), 95.0);
        assert_close(period_speed(None, &now, SpeedMethod::Weighted), 95.0);

        let negative = lean(0.0, 0.0, 30.0, -4.0, 0.0);
        assert_close(period_speed(None, &negative, SpeedMethod::Weighted), 0.0);

        let grown = lean(0.0, 0.0, 50.0, 90.0, 0.0);
        assert_close(period_speed(Some(&before), &grown, SpeedMethod::Snapshot), 90.0);
    }

    #[test]
    fn accuracy_is_clamped_and_absent_without_typing() {
        assert_close(accuracy_pct(1000.0, 50.0).unwrap(), 95.0);
        assert_close(accuracy_pct(100.0, 250.0).unwrap(), 0.0);
        assert_eq!(accuracy_pct(0.0, 0.0), None);
        assert_eq!(accuracy_pct(0.0, 12.0), None);
    }

    #[test]
    fn derived_score_matches_formula() {
        assert_close(derived_score(110.0, 95.0), 152.25);
        assert_close(derived_score(0.0, 0.0), 100.0);
    }

    #[test]
    fn event_row_combines_both_feeds() {
        let lean_before = lean(5_000.0, 100.0, 10.0, 80.0, 500.0);
        let lean_now = lean(6_000.0, 150.0, 30.0, 100.0, 520.0);
        let rich_before = rich(100.0, Some(40.0));
        let rich_now = rich(150.0, Some(43.0));
        let inputs = EventInputs {
            lean_before: Some(&lean_before),
            lean_now: Some(&lean_now),
            rich_before: Some(&rich_before),
            rich_now: Some(&rich_now),
        };

        let row = event_metrics("kat", &inputs, &StatsConfig::default())
            .into_row()
            .unwrap();
        assert_eq!(row.races, 50);
        assert_close(row.speed.unwrap(), 110.0);
        assert_close(row.accuracy.unwrap(), 95.0);
        assert_close(row.points.unwrap(), 152.25);
        assert_eq!(row.nitros, Some(3));
        assert_eq!(row.username, "Kat");
        assert_eq!(row.display_name, "Kat");
        assert_eq!(row.tag, "ZOOM");
    }

    #[test]
    fn event_race_delta_falls_back_to_lean_feed() {
        let lean_before = lean(0.0, 0.0, 0.0, 0.0, 500.0);
        let lean_now = lean(0.0, 0.0, 0.0, 0.0, 512.0);
        let rich_before = rich(100.0, None);
        let rich_now = rich(100.0, None);
        let inputs = EventInputs {
            lean_before: Some(&lean_before),
            lean_now: Some(&lean_now),
            rich_before: Some(&rich_before),
            rich_now: Some(&rich_now),
        };
        let row = event_metrics("kat", &inputs, &StatsConfig::default())
            .into_row()
            .unwrap();
        assert_eq!(row.races, 12);
        assert_eq!(row.accuracy, None);
        assert_eq!(row.points, None);
        assert_eq!(row.nitros, None);
    }

    #[test]
    fn event_without_pairs_is_inactive() {
        let rich_now = rich(150.0, Some(3.0));
        let inputs = EventInputs {
            rich_now: Some(&rich_now),
            ..EventInputs::default()
        };
        assert_eq!(
            event_metrics("kat", &inputs, &StatsConfig::default()),
            PeriodOutcome::Inactive
        );
    }

    #[test]
    fn event_negative_delta_is_inactive() {
        let rich_before = rich(150.0, None);
        let rich_now = rich(140.0, None);
        let inputs = EventInputs {
            rich_before: Some(&rich_before),
            rich_now: Some(&rich_now),
            ..EventInputs::default()
        };
        assert_eq!(
            event_metrics("kat", &inputs, &StatsConfig::default()),
            PeriodOutcome::Inactive
        );
    }

    #[test]
    fn event_rich_only_has_no_speed_or_accuracy() {
        let rich_before = rich(100.0, None);
        let rich_now = rich(130.0, Some(9.0));
        let inputs = EventInputs {
            rich_before: Some(&rich_before),
            rich_now: Some(&rich_now),
            ..EventInputs::default()
        };
        let row = event_metrics("kat", &inputs, &StatsConfig::default())
            .into_row()
            .unwrap();
        assert_eq!(row.races, 30);
        assert_eq!(row.speed, None);
        assert_eq!(row.accuracy, None);
        assert_eq!(row.points, None);
        assert_eq!(row.nitros, None);
        assert_eq!(row.display_name, "Kat");
    }

    #[test]
    fn event_keeps_large_race_deltas() {
        let rich_before = rich(0.0, None);
        let rich_now = rich(2_600.0, None);
        let inputs = EventInputs {
            rich_before: Some(&rich_before),
            rich_now: Some(&rich_now),
            ..EventInputs::default()
        };
        let row = event_metrics("kat", &inputs, &StatsConfig::default())
            .into_row()
            .unwrap();
        assert_eq!(row.races, 2_600);

        let huge = rich(90_000.0, None);
        let inputs = EventInputs {
            rich_now: Some(&huge),
            ..inputs
        };
        let strict = StatsConfig::default().with_anomaly_threshold(10);
        assert_eq!(
            event_metrics("kat", &inputs, &strict).into_row().map(|row| row.races),
            Some(90_000)
        );
    }

    #[test]
    fn event_nitros_need_the_counter_on_both_rich_records() {
        let lean_before = lean(0.0, 0.0, 0.0, 0.0, 1.0);
        let lean_now = lean(0.0, 0.0, 0.0, 0.0, 2.0);
        let without = rich(100.0, None);
        let with_counter = rich(110.0, Some(7.0));
        let inputs = EventInputs {
            lean_before: Some(&lean_before),
            lean_now: Some(&lean_now),
            rich_before: Some(&without),
            rich_now: Some(&without),
        };
        let config = StatsConfig::default();
        assert_eq!(event_metrics("kat", &inputs, &config).into_row().unwrap().nitros, None);

        let inputs = EventInputs {
            rich_now: Some(&with_counter),
            ..inputs
        };
        assert_eq!(event_metrics("kat", &inputs, &config).into_row().unwrap().nitros, None);

        let counted_before = rich(100.0, Some(9.0));
        let inputs = EventInputs {
            rich_before: Some(&counted_before),
            ..inputs
        };
        assert_eq!(event_metrics("kat", &inputs, &config).into_row().unwrap().nitros, Some(0));
    }

    #[test]
    fn event_label_falls_back_to_identifier() {
        let mut lean_before = lean(0.0, 0.0, 0.0, 0.0, 1.0);
        let mut lean_now = lean(0.0, 0.0, 0.0, 0.0, 4.0);
        lean_before.display_name.clear();
        lean_now.display_name.clear();
        lean_now.username = "KatRacer".into();
        let inputs = EventInputs {
            lean_before: Some(&lean_before),
            lean_now: Some(&lean_now),
            ..EventInputs::default()
        };
        let row = event_metrics("katracer", &inputs, &StatsConfig::default())
            .into_row()
            .unwrap();
        assert_eq!(row.username, "KatRacer");
        assert_eq!(row.display_name, "KatRacer");
        assert_close(row.speed.unwrap(), 0.0);
    }

    #[test]
    fn daily_race_delta_and_fields() {
        let before = RacerRecord {
            username: "Kat".into(),
            lifetime_races: 100.0,
            high_speed: 120.0,
            profile_views: 10.0,
            nitros_used: Some(5.0),
            ..RacerRecord::default()
        };
        let now = RacerRecord {
            lifetime_races: 150.0,
            high_speed: 126.5,
            profile_views: 14.0,
            nitros_used: Some(8.0),
            avg_speed: 97.0,
            ..before.clone()
        };
        let row = daily_metrics("kat", Some(&before), Some(&now), &StatsConfig::default())
            .into_row()
            .unwrap();
        assert_eq!(row.races, 50);
        assert_close(row.peak_speed_delta, 6.5);
        assert_eq!(row.profile_views_delta, 4);
        assert_eq!(row.nitros, Some(3));
        assert_close(row.avg_speed, 97.0);
        assert_eq!(row.display_name, "Kat");
    }

    #[test]
    fn daily_nitros_absent_when_field_missing() {
        let before = rich(100.0, None);
        let now = rich(110.0, Some(4.0));
        let row = daily_metrics("kat", Some(&before), Some(&now), &StatsConfig::default())
            .into_row()
            .unwrap();
        assert_eq!(row.nitros, None);
    }

    #[test]
    fn daily_requires_both_snapshots() {
        let now = rich(110.0, None);
        let config = StatsConfig::default();
        assert_eq!(daily_metrics("kat", None, Some(&now), &config), PeriodOutcome::Inactive);
        assert_eq!(daily_metrics("kat", Some(&now), None, &config), PeriodOutcome::Inactive);
        assert_eq!(daily_metrics("kat", Some(&now), Some(&now), &config), PeriodOutcome::Inactive);
    }

    #[test]
    fn daily_anomaly_cutoff_policies() {
        let before = rich(0.0, None);
        let at_threshold = rich(2600.0, None);
        let above_threshold = rich(2601.0, None);

        let inclusive = StatsConfig::default();
        assert_eq!(
            daily_metrics("kat", Some(&before), Some(&at_threshold), &inclusive),
            PeriodOutcome::Anomalous
        );
        assert_eq!(
            daily_metrics("kat", Some(&before), Some(&above_threshold), &inclusive),
            PeriodOutcome::Anomalous
        );

        let strict = StatsConfig::default().with_anomaly_cutoff(CutoffMode::Above);
        let kept = daily_metrics("kat", Some(&before), Some(&at_threshold), &strict)
            .into_row()
            .unwrap();
        assert_eq!(kept.races, 2600);
        assert_eq!(
            daily_metrics("kat", Some(&before), Some(&above_threshold), &strict),
            PeriodOutcome::Anomalous
        );
    }
}
