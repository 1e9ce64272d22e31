use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::data::{RacerRecord, Snapshot};
use crate::types::RacerKey;

/// Case-insensitive lookup from racer key to record for one snapshot.
///
/// Records without a username are left out. When two records share a key the
/// later one replaces the earlier one (the key keeps its first position).
#[derive(Clone, Debug, Default)]
pub struct RacerIndex {
    records: IndexMap<RacerKey, RacerRecord>,
}

impl RacerIndex {
    /// Index the records of `snapshot`.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let index = Self::from_records(snapshot.racers.iter().cloned());
        debug!(
            "[racestats:index] source '{}' records={} keys={}",
            snapshot.source_id,
            snapshot.len(),
            index.len()
        );
        index
    }

    /// Index an arbitrary record sequence.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = RacerRecord>,
    {
        let mut index = IndexMap::new();
        for record in records {
            let key = record.key();
            if key.is_empty() {
                continue;
            }
            index.insert(key, record);
        }
        Self { records: index }
    }

    /// Record for `username`, compared case-insensitively.
    pub fn get(&self, username: &str) -> Option<&RacerRecord> {
        self.records.get(&crate::utils::racer_key(username))
    }

    /// Record for an already-normalized key.
    pub fn get_key(&self, key: &str) -> Option<&RacerRecord> {
        self.records.get(key)
    }

    /// Keys in first-insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &RacerKey> {
        self.records.keys()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no keyed record was indexed.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Every key known to any of `indices`, each exactly once, in first-seen order.
pub fn union_keys(indices: &[&RacerIndex]) -> IndexSet<RacerKey> {
    let mut keys = IndexSet::new();
    for index in indices {
        for key in index.keys() {
            if !keys.contains(key) {
                keys.insert(key.clone());
            }
        }
    }
    keys
}
