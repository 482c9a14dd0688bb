use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Ranking types
// ---------------------------------------------------------------------------

/// A single entry in a user's ranked recommendation list.
///
/// A ranking is an ordered `Vec<RankedItem>` in the exact order the producing
/// algorithm emitted it (assumed descending by predicted score). The harness
/// never re-sorts a loaded ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedItem {
    /// Recommended item (job) identifier.
    pub item_id: String,
    /// Predicted relevance score.
    pub score: f64,
}

impl RankedItem {
    /// Creates a ranked entry.
    #[must_use]
    pub fn new(item_id: impl Into<String>, score: f64) -> Self {
        Self {
            item_id: item_id.into(),
            score,
        }
    }
}

/// One ground-truth observation: an item the user rated, with the recorded
/// relevance value.
///
/// Ground-truth loading reduces the raw test partition to the entries whose
/// relevance exceeds the configured threshold; the relevance value is kept so
/// RMSE can compare it against predicted scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruthItem {
    /// Item (job) identifier.
    pub item_id: String,
    /// Recorded relevance value from the test partition.
    pub relevance: f64,
}

impl TruthItem {
    /// Creates a ground-truth entry.
    #[must_use]
    pub fn new(item_id: impl Into<String>, relevance: f64) -> Self {
        Self {
            item_id: item_id.into(),
            relevance,
        }
    }
}

/// Per-user rankings, keyed by user id.
///
/// `BTreeMap` keeps per-user iteration order deterministic so repeated scoring
/// passes accumulate in the same order.
pub type UserRankList = BTreeMap<String, Vec<RankedItem>>;

/// Per-user relevant items (already threshold-filtered), keyed by user id.
pub type UserGroundTruth = BTreeMap<String, Vec<TruthItem>>;

// ---------------------------------------------------------------------------
// Evaluation results
// ---------------------------------------------------------------------------

/// Aggregated metric values for one evaluation (or one fold of one), keyed by
/// human-readable metric name (`"P@10"`, `"NDCG@10"`, `"MRR"`, ...).
///
/// Created per fold, combined by arithmetic mean across folds, persisted, and
/// never mutated afterward.
pub type EvaluationResult = BTreeMap<String, f64>;
