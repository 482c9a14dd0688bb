//! Alpha blending of collaborative-filtering and content-based scores.
//!
//! Combines the two rankers' per-item scores into a single blended score:
//!
//! ```text
//! blended = alpha * cf_score + (1 - alpha) * cb_score
//! ```
//!
//! where `alpha` in `[0, 1]` is the configured `hb.alpha` weight.
//!
//! Missing-source behavior is intentional: the blend runs over the *union* of
//! item ids from both sources, and an item absent from one source contributes
//! `0.0` for that source's term. This means `alpha = 1.0` reduces exactly to
//! the CF scores and `alpha = 0.0` exactly to the CB scores.

use std::collections::HashMap;

use jobrank_core::{BoundedTopN, RankedItem};
use tracing::{debug, instrument};

const NON_FINITE_SCORE_FALLBACK: f64 = 0.0;

#[derive(Debug, Clone, Copy, Default)]
struct ScorePair {
    cf: f64,
    cb: f64,
}

/// Blend one CF score and one CB score with weight `alpha`.
///
/// Linear and monotonic in `alpha` for fixed scores; `alpha = 1.0` returns
/// `cf` exactly and `alpha = 0.0` returns `cb` exactly. Non-finite `alpha`
/// values are clamped into `[0, 1]` after being treated as 0.
#[must_use]
pub fn hybrid_score(cf: f64, cb: f64, alpha: f64) -> f64 {
    let alpha = sanitize_alpha(alpha);
    alpha.mul_add(cf, (1.0 - alpha) * cb)
}

/// Blend two per-user `item -> score` maps into a single ranking.
///
/// The output covers the union of item ids from both sources, sorted by
/// blended score descending with lexicographic item-id tie-breaking for
/// determinism.
#[must_use]
#[instrument(
    name = "jobrank::blend",
    skip(cf_scores, cb_scores),
    fields(cf_count = cf_scores.len(), cb_count = cb_scores.len())
)]
pub fn blend_user_scores(
    cf_scores: &HashMap<String, f64>,
    cb_scores: &HashMap<String, f64>,
    alpha: f64,
) -> Vec<RankedItem> {
    let alpha = sanitize_alpha(alpha);

    let mut merged: HashMap<&str, ScorePair> =
        HashMap::with_capacity(cf_scores.len() + cb_scores.len());
    for (item_id, score) in cf_scores {
        merged.entry(item_id).or_default().cf = sanitize_score(*score);
    }
    for (item_id, score) in cb_scores {
        merged.entry(item_id).or_default().cb = sanitize_score(*score);
    }

    let mut blended: Vec<RankedItem> = merged
        .into_iter()
        .map(|(item_id, pair)| {
            let score = alpha.mul_add(pair.cf, (1.0 - alpha) * pair.cb);
            RankedItem::new(item_id, sanitize_score(score))
        })
        .collect();

    blended.sort_by(|left, right| {
        right
            .score
            .total_cmp(&left.score)
            .then_with(|| left.item_id.cmp(&right.item_id))
    });

    debug!(
        target: "jobrank.blend",
        blended_count = blended.len(),
        effective_alpha = %alpha,
        "blending complete"
    );

    blended
}

/// Feed a blended ranking through the bounded top-N selector.
///
/// The input order (descending blended score) is the insertion order, so the
/// selector's earlier-inserted tie preference keeps the blend's deterministic
/// ordering intact.
#[must_use]
pub fn select_top_n(blended: &[RankedItem], top_n: usize) -> Vec<RankedItem> {
    let mut selector = BoundedTopN::new(top_n);
    for item in blended {
        selector.add(item.item_id.clone(), item.score);
    }
    selector.top_n()
}

fn sanitize_alpha(alpha: f64) -> f64 {
    if alpha.is_finite() {
        alpha.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn sanitize_score(score: f64) -> f64 {
    if score.is_finite() {
        score
    } else {
        NON_FINITE_SCORE_FALLBACK
    }
}
