//! Information retrieval evaluation metrics.
//!
//! Provides the standard IR metrics used to score one user's ranking against
//! that user's ground truth:
//! - **P@K / R@K**: Precision and Recall at K
//! - **F1**: harmonic mean of full-list precision and recall
//! - **nDCG@K**: Normalized Discounted Cumulative Gain (binary gain)
//! - **RMSE**: Root Mean Square Error over items present in both lists
//! - **RR**: Reciprocal Rank of the first relevant item
//! - **AP@K / AP**: Average Precision, at-K and full-list variants
//!
//! Every function is pure, deterministic, and total: degenerate input (empty
//! ranking, empty ground truth, `k == 0`) yields `0.0`, never an error. Mean
//! variants (MAP, mean nDCG, MRR as a mean) are produced by the harness by
//! averaging over users; nothing here aggregates across users.
//!
//! `average_precision_at_k` and `average_precision` use *different*
//! normalizers and are deliberately kept as two distinct functions; see the
//! doc comments on each.

use crate::types::{RankedItem, TruthItem};

#[inline]
fn usize_to_f64(value: usize) -> f64 {
    u32::try_from(value).map_or_else(|_| f64::from(u32::MAX), f64::from)
}

#[inline]
fn is_relevant(truth: &[TruthItem], item_id: &str) -> bool {
    truth.iter().any(|t| t.item_id == item_id)
}

/// Precision at K.
///
/// Fraction of the top `min(k, |ranked|)` items that are relevant. The
/// effective cutoff is the real list length when the ranking is shorter than
/// `k`, so a short list is never penalized for positions it does not have.
///
/// Returns 0.0 when `ranked` or `truth` is empty or `k` is 0.
#[must_use]
pub fn precision_at_k(ranked: &[RankedItem], truth: &[TruthItem], k: usize) -> f64 {
    if ranked.is_empty() || truth.is_empty() || k == 0 {
        return 0.0;
    }

    let limit = k.min(ranked.len());
    let found = ranked[..limit]
        .iter()
        .filter(|item| is_relevant(truth, &item.item_id))
        .count();

    usize_to_f64(found) / usize_to_f64(limit)
}

/// Recall at K.
///
/// Fraction of relevant items that appear in the top `min(k, |ranked|)`
/// positions. Returns 0.0 when `ranked` or `truth` is empty or `k` is 0.
#[must_use]
pub fn recall_at_k(ranked: &[RankedItem], truth: &[TruthItem], k: usize) -> f64 {
    if ranked.is_empty() || truth.is_empty() || k == 0 {
        return 0.0;
    }

    let limit = k.min(ranked.len());
    let found = ranked[..limit]
        .iter()
        .filter(|item| is_relevant(truth, &item.item_id))
        .count();

    usize_to_f64(found) / usize_to_f64(truth.len())
}

/// F1 measure: harmonic mean of full-list precision and recall.
///
/// Both components use the entire ranking (`k = |ranked|`). Returns 0.0 when
/// inputs are empty or when both precision and recall are 0.
#[must_use]
pub fn f1(ranked: &[RankedItem], truth: &[TruthItem]) -> f64 {
    if ranked.is_empty() || truth.is_empty() {
        return 0.0;
    }

    let precision = precision_at_k(ranked, truth, ranked.len());
    let recall = recall_at_k(ranked, truth, ranked.len());
    if precision + recall == 0.0 {
        return 0.0;
    }

    2.0 * precision * recall / (precision + recall)
}

/// Normalized Discounted Cumulative Gain at K.
///
/// Binary gain (1.0 if the item is relevant, 0.0 otherwise) with log2
/// position discount `1/log2(i + 2)` for 0-indexed rank `i`, normalized by
/// the ideal DCG (all relevant items packed at the top, capped at `k`).
///
/// Returns 0.0 when `ranked` or `truth` is empty, `k` is 0, or the ideal DCG
/// is 0.
#[must_use]
pub fn ndcg_at_k(ranked: &[RankedItem], truth: &[TruthItem], k: usize) -> f64 {
    if ranked.is_empty() || truth.is_empty() || k == 0 {
        return 0.0;
    }

    let limit = k.min(ranked.len());
    let dcg: f64 = ranked[..limit]
        .iter()
        .enumerate()
        .filter(|(_, item)| is_relevant(truth, &item.item_id))
        .map(|(i, _)| 1.0 / (usize_to_f64(i) + 2.0).log2())
        .sum();

    let ideal_count = k.min(truth.len());
    let idcg: f64 = (0..ideal_count)
        .map(|i| 1.0 / (usize_to_f64(i) + 2.0).log2())
        .sum();

    if idcg == 0.0 {
        return 0.0;
    }

    dcg / idcg
}

/// Root Mean Square Error between predicted scores and recorded relevance.
///
/// Only items present in *both* the ranking and the ground truth contribute;
/// items observed on one side only are excluded from the sum. Returns 0.0
/// when either input is empty or the intersection is empty.
#[must_use]
pub fn rmse(ranked: &[RankedItem], truth: &[TruthItem]) -> f64 {
    if ranked.is_empty() || truth.is_empty() {
        return 0.0;
    }

    let mut sum_sq = 0.0;
    let mut count = 0_u32;
    for item in ranked {
        if let Some(observed) = truth.iter().find(|t| t.item_id == item.item_id) {
            let diff = item.score - observed.relevance;
            sum_sq += diff * diff;
            count += 1;
        }
    }

    if count == 0 {
        return 0.0;
    }

    (sum_sq / f64::from(count)).sqrt()
}

/// Reciprocal Rank.
///
/// Returns `1/(rank of the first relevant item)` with 1-indexed ranks, or
/// 0.0 if no relevant item appears in the ranking.
#[must_use]
pub fn reciprocal_rank(ranked: &[RankedItem], truth: &[TruthItem]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    for (i, item) in ranked.iter().enumerate() {
        if is_relevant(truth, &item.item_id) {
            return 1.0 / (usize_to_f64(i) + 1.0);
        }
    }
    0.0
}

/// Average Precision at K.
///
/// Scans the top `nK = min(k, |ranked|)` positions, adding `hits/(i + 1)` at
/// each relevant hit, then divides by `min(nK, |truth|)`, the number of
/// relevant documents considered, *not* the hit count. This normalizer
/// intentionally differs from [`average_precision`]; the two are distinct
/// statistics and must not be unified.
///
/// Returns 0.0 when `ranked` or `truth` is empty or `k` is 0.
#[must_use]
pub fn average_precision_at_k(ranked: &[RankedItem], truth: &[TruthItem], k: usize) -> f64 {
    if ranked.is_empty() || truth.is_empty() || k == 0 {
        return 0.0;
    }

    let n_k = k.min(ranked.len());
    let mut hits = 0_u32;
    let mut accumulator = 0.0;
    for (i, item) in ranked[..n_k].iter().enumerate() {
        if is_relevant(truth, &item.item_id) {
            hits += 1;
            accumulator += f64::from(hits) / (usize_to_f64(i) + 1.0);
        }
    }

    let denominator = usize_to_f64(n_k.min(truth.len()));
    accumulator / denominator
}

/// Average Precision over the entire ranking.
///
/// Same hit scan as [`average_precision_at_k`] with `nK = |ranked|`, but the
/// accumulator is divided by the *hit count* rather than by the relevant
/// document count. Returns 0.0 when either input is empty or there were no
/// hits.
#[must_use]
pub fn average_precision(ranked: &[RankedItem], truth: &[TruthItem]) -> f64 {
    if ranked.is_empty() || truth.is_empty() {
        return 0.0;
    }

    let mut hits = 0_u32;
    let mut accumulator = 0.0;
    for (i, item) in ranked.iter().enumerate() {
        if is_relevant(truth, &item.item_id) {
            hits += 1;
            accumulator += f64::from(hits) / (usize_to_f64(i) + 1.0);
        }
    }

    if hits == 0 {
        return 0.0;
    }
    accumulator / f64::from(hits)
}
