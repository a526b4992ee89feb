//! Concurrent first-writer-wins dedup of association candidates.
//!
//! [`RoleAggregator`] is shared by every file worker. Inserts go through
//! the `DashMap` entry API, so the key check and the insert happen under a
//! single shard lock: two workers can never both see a key as absent.

use super::association::AssociationCandidate;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;

/// Shared dedup collection keyed by [`AssociationCandidate::unique_key`].
#[derive(Debug, Default)]
pub struct RoleAggregator {
    entries: DashMap<String, AssociationCandidate>,
}

impl RoleAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `candidate` unless its key is already present.
    ///
    /// Returns `false` for a duplicate; the stored entry is left untouched
    /// even if the duplicate's other fields differ.
    pub fn try_insert(&self, candidate: AssociationCandidate) -> bool {
        match self.entries.entry(candidate.unique_key()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(candidate);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of the current contents. Only meaningful once every producer
    /// has stopped inserting.
    pub fn snapshot(&self) -> ResultSet {
        ResultSet(
            self.entries
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect(),
        )
    }

    /// Take the final contents without copying.
    pub fn into_result_set(self) -> ResultSet {
        ResultSet(self.entries.into_iter().collect())
    }
}

/// Final, read-only set of unique associations. Unordered.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResultSet(HashMap<String, AssociationCandidate>);

impl ResultSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&AssociationCandidate> {
        self.0.get(key)
    }

    /// Rows for the report, optionally ordered by unique key.
    pub fn into_rows(self, sorted: bool) -> Vec<AssociationCandidate> {
        let mut entries: Vec<_> = self.0.into_iter().collect();
        if sorted {
            entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        }
        entries.into_iter().map(|(_, candidate)| candidate).collect()
    }
}
