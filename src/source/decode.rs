//! Content decoding for snapshot bodies.
//!
//! Two encodings are accepted: a single JSON document (bare list, wrapped
//! `{ updatedAt, racers }` object, or a lone record object) and newline
//! delimited JSON with one record per line. Detection looks at the first
//! non-whitespace character; a document that opens like JSON but fails to
//! parse as one is retried line by line, since NDJSON lines also open with `{`.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::constants::fields;
use crate::data::Snapshot;
use crate::errors::StatsError;
use crate::normalize::normalize_record;
use crate::types::SourceId;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SnapshotDocument {
    List(Vec<Value>),
    Wrapped(WrappedSnapshot),
    Single(Map<String, Value>),
}

#[derive(Debug, Deserialize)]
struct WrappedSnapshot {
    #[serde(default, rename = "updatedAt")]
    updated_at: Option<Value>,
    racers: Vec<Value>,
}

/// Decode a non-empty snapshot body into canonical records.
pub fn decode_snapshot(source_id: &str, body: &str) -> Result<Snapshot, StatsError> {
    let trimmed = body.trim_start();
    if trimmed.is_empty() {
        return Err(StatsError::Parse {
            source_id: source_id.to_string(),
            details: "content is empty".into(),
        });
    }

    let mut document_error = None;
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        match serde_json::from_str::<SnapshotDocument>(trimmed) {
            Ok(document) => return Ok(from_document(source_id, document)),
            Err(err) => {
                debug!(
                    "[racestats:loader] source '{}' is not a single JSON document ({err}); trying line-delimited",
                    source_id
                );
                document_error = Some(err);
            }
        }
    }

    decode_lines(source_id, body).map_err(|details| StatsError::Parse {
        source_id: source_id.to_string(),
        details: match document_error {
            Some(err) => format!("{details}; single-document parse failed: {err}"),
            None => details,
        },
    })
}

fn from_document(source_id: &str, document: SnapshotDocument) -> Snapshot {
    let (updated_at, raw_records) = match document {
        SnapshotDocument::List(records) => (None, records),
        SnapshotDocument::Wrapped(wrapped) => (
            wrapped
                .updated_at
                .as_ref()
                .and_then(|value| parse_updated_at(source_id, value)),
            wrapped.racers,
        ),
        SnapshotDocument::Single(object) => (None, vec![Value::Object(object)]),
    };
    Snapshot {
        source_id: source_id.to_string(),
        updated_at,
        racers: raw_records.iter().map(normalize_record).collect(),
        skipped_lines: 0,
    }
}

fn decode_lines(source_id: &str, body: &str) -> Result<Snapshot, String> {
    let mut racers = Vec::new();
    let mut skipped_lines = 0usize;
    for (idx, line) in body.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(raw) => racers.push(normalize_record(&raw)),
            Err(err) => {
                skipped_lines += 1;
                warn!(
                    "[racestats:loader] source '{}' skipping malformed line {}: {err}",
                    source_id,
                    idx + 1
                );
            }
        }
    }
    if racers.is_empty() {
        return Err(format!(
            "no line parsed as JSON ({skipped_lines} malformed)"
        ));
    }
    Ok(Snapshot {
        source_id: SourceId::from(source_id),
        updated_at: None,
        racers,
        skipped_lines,
    })
}

fn parse_updated_at(source_id: &str, value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?;
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(err) => {
            warn!(
                "[racestats:loader] source '{}' has unreadable {} '{}': {err}",
                source_id,
                fields::UPDATED_AT,
                raw
            );
            None
        }
    }
}
