use std::collections::HashSet;

use serde_json::json;

use racestats::metrics::{accuracy_pct, derived_score, weighted_speed};
use racestats::{
    CutoffMode, EventIndices, InMemorySource, PeriodOutcome, RacerIndex, RacerRecord,
    SnapshotLoader, StatsConfig, assemble_daily_board, assemble_event_board, daily_metrics,
    normalize_record, union_keys,
};

fn load(id: &str, body: &str) -> RacerIndex {
    let snapshot = SnapshotLoader::required()
        .load(&InMemorySource::new(id, body))
        .unwrap();
    RacerIndex::from_snapshot(&snapshot)
}

fn racer(username: &str, races: f64) -> RacerRecord {
    RacerRecord {
        username: username.to_string(),
        lifetime_races: races,
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
fn normalization_never_yields_non_finite_numbers() {
    let inputs = [
        json!({}),
        json!({"username": "a", "racesPlayed": null, "avgSpeed": "NaN"}),
        json!({"username": "b", "typed": "1e400", "errs": [], "played": {"x": 1}}),
        json!({"username": "c", "highestSpeed": "-inf", "profileViews": true}),
        json!(null),
        json!([1, 2, 3]),
    ];
    for raw in &inputs {
        let record = normalize_record(raw);
        for value in [
            record.lifetime_races,
            record.avg_speed,
            record.high_speed,
            record.profile_views,
            record.garage_cars,
            record.longest_session,
            record.league_tier,
            record.typed,
            record.errs,
            record.played,
            record.nitros_used.unwrap_or(0.0),
        ] {
            assert!(value.is_finite(), "non-finite value from {raw}");
        }
    }
}

#[test]
fn union_visits_every_identifier_exactly_once() {
    let before = RacerIndex::from_records(vec![racer("a", 1.0), racer("B", 1.0), racer("c", 1.0)]);
    let now = RacerIndex::from_records(vec![racer("b", 2.0), racer("D", 2.0), racer("A", 2.0)]);
    let keys = union_keys(&[&now, &before]);

    let unique: HashSet<&String> = keys.iter().collect();
    assert_eq!(unique.len(), keys.len());
    let expected: HashSet<String> = ["a", "b", "c", "d"].iter().map(|k| k.to_string()).collect();
    let actual: HashSet<String> = keys.into_iter().collect();
    assert_eq!(actual, expected);

    let board = assemble_daily_board(&before, &now, &StatsConfig::default());
    assert_eq!(board.summary.visited, 4);
}

#[test]
fn race_delta_and_activity_filter() {
    let config = StatsConfig::default();
    let before = racer("kat", 100.0);
    let after = racer("kat", 150.0);
    let PeriodOutcome::Row(row) = daily_metrics("kat", Some(&before), Some(&after), &config) else {
        panic!("expected a row");
    };
    assert_eq!(row.races, 50);

    assert_eq!(
        daily_metrics("kat", Some(&after), Some(&before), &config),
        PeriodOutcome::Inactive
    );
    assert_eq!(
        daily_metrics("kat", Some(&before), Some(&before), &config),
        PeriodOutcome::Inactive
    );
}

#[test]
fn anomaly_threshold_policies_are_pinned() {
    let before = racer("kat", 0.0);
    let at = racer("kat", 2600.0);
    let over = racer("kat", 2601.0);

    let inclusive = StatsConfig::default();
    assert_eq!(inclusive.anomaly_cutoff, CutoffMode::AtOrAbove);
    assert_eq!(
        daily_metrics("kat", Some(&before), Some(&at), &inclusive),
        PeriodOutcome::Anomalous
    );
    assert_eq!(
        daily_metrics("kat", Some(&before), Some(&over), &inclusive),
        PeriodOutcome::Anomalous
    );

    let strict = StatsConfig::default().with_anomaly_cutoff(CutoffMode::Above);
    assert!(matches!(
        daily_metrics("kat", Some(&before), Some(&at), &strict),
        PeriodOutcome::Row(_)
    ));
    assert_eq!(
        daily_metrics("kat", Some(&before), Some(&over), &strict),
        PeriodOutcome::Anomalous
    );

    let lowered = StatsConfig::default().with_anomaly_threshold(10);
    assert_eq!(
        daily_metrics("kat", Some(&before), Some(&racer("kat", 10.0)), &lowered),
        PeriodOutcome::Anomalous
    );
}

#[test]
fn weighted_speed_accuracy_and_score_examples() {
    let before = RacerRecord {
        avg_speed: 80.0,
        played: 10.0,
        ..RacerRecord::default()
    };
    let after = RacerRecord {
        avg_speed: 100.0,
        played: 30.0,
        ..RacerRecord::default()
    };
    assert_close(weighted_speed(&before, &after).unwrap(), 110.0);
    assert_close(accuracy_pct(1000.0, 50.0).unwrap(), 95.0);
    assert_eq!(accuracy_pct(0.0, 0.0), None);
    assert_close(derived_score(110.0, 95.0), 152.25);
}

#[test]
fn case_insensitive_pairing_across_feeds() {
    let indices = EventIndices {
        lean_before: load(
            "lean_before",
            "{\"username\":\"foo\",\"lifetimeRaces\":10,\"typed\":100,\"errs\":10,\"played\":10,\"avgSpeed\":80}",
        ),
        lean_now: load(
            "lean_now",
            "{\"username\":\"FOO\",\"lifetimeRaces\":15,\"typed\":1100,\"errs\":60,\"played\":30,\"avgSpeed\":100,\"displayName\":\"Foo Fighter\"}",
        ),
        rich_before: load("rich_before", r#"[{"username":"Foo","racesPlayed":100,"nitrosUsed":2}]"#),
        rich_now: load("rich_now", r#"[{"username":"Foo","racesPlayed":150,"nitrosUsed":1}]"#),
    };
    let board = assemble_event_board(&indices, &StatsConfig::default());
    assert_eq!(board.rows.len(), 1);
    let row = &board.rows[0];
    assert_eq!(row.key, "foo");
    assert_eq!(row.username, "Foo");
    assert_eq!(row.display_name, "Foo Fighter");
    assert_eq!(row.races, 50);
    assert_close(row.speed.unwrap(), 110.0);
    assert_close(row.accuracy.unwrap(), 95.0);
    assert_close(row.points.unwrap(), 152.25);
    assert_eq!(row.nitros, Some(0));
}

#[test]
fn assembly_is_idempotent_over_immutable_snapshots() {
    let indices = EventIndices {
        lean_before: load("lb", "{\"username\":\"a\",\"lifetimeRaces\":1}\n{\"username\":\"b\",\"lifetimeRaces\":1}"),
        lean_now: load("ln", "{\"username\":\"b\",\"lifetimeRaces\":9}\n{\"username\":\"a\",\"lifetimeRaces\":9}"),
        rich_before: load("rb", r#"[{"username":"c","racesPlayed":3}]"#),
        rich_now: load("rn", r#"[{"username":"c","racesPlayed":11}]"#),
    };
    let config = StatsConfig::default();
    let first = assemble_event_board(&indices, &config);
    let second = assemble_event_board(&indices, &config);
    assert_eq!(first, second);
    let keys: Vec<&str> = first.rows.iter().map(|row| row.key.as_str()).collect();
    assert_eq!(keys, vec!["a", "b", "c"]);
}
