//! Capacity-bounded result list
//!
//! Kept sorted by descending score with plain insertion: for the small
//! fixed N used here a shift of at most N entries beats heap bookkeeping.
//! A new entry goes after existing entries of equal score, so earlier
//! insertions win ties.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedHit {
    pub url: String,
    pub score: i64,
}

#[derive(Debug, Clone)]
pub struct TopN {
    capacity: usize,
    hits: Vec<RankedHit>,
}

impl TopN {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            hits: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.hits.len() >= self.capacity
    }

    /// Lowest kept score, `None` while empty
    pub fn worst_score(&self) -> Option<i64> {
        self.hits.last().map(|hit| hit.score)
    }

    /// Whether `insert` would keep a hit with this score
    pub fn accepts(&self, score: i64) -> bool {
        if self.capacity == 0 {
            return false;
        }
        !self.is_full() || self.worst_score().is_some_and(|worst| score > worst)
    }

    /// Insert `hit` if it ranks; returns whether it was kept
    pub fn insert(&mut self, hit: RankedHit) -> bool {
        if !self.accepts(hit.score) {
            return false;
        }
        if self.is_full() {
            self.hits.pop();
        }
        let at = self.hits.partition_point(|kept| kept.score >= hit.score);
        self.hits.insert(at, hit);
        true
    }

    /// Fold another bounded list into this one
    pub fn merge(&mut self, other: TopN) {
        for hit in other.hits {
            if !self.insert(hit) {
                // `other` is sorted; nothing after this can rank either
                break;
            }
        }
    }

    pub fn as_slice(&self) -> &[RankedHit] {
        &self.hits
    }

    pub fn into_vec(self) -> Vec<RankedHit> {
        self.hits
    }
}
