//! Bounded top-N retention for streaming scores.
//!
//! Materializes a ranked list from a stream of `(item_id, score)` insertions
//! without sorting the full candidate set: only the `N` best entries are ever
//! tracked. Tie-breaking is explicit and stable: when scores are equal, the
//! earlier-inserted item wins. Naive heap implementations do not guarantee
//! this and the evaluation contract depends on it.

use crate::types::RankedItem;

#[derive(Debug, Clone)]
struct Entry {
    item_id: String,
    score: f64,
    /// Monotonic insertion sequence; lower means inserted earlier.
    seq: u64,
}

impl Entry {
    /// True when `self` is a worse retained entry than `other`: lower score,
    /// or equal score but inserted later.
    fn is_worse_than(&self, other: &Self) -> bool {
        match ord_score(self.score).total_cmp(&ord_score(other.score)) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => self.seq > other.seq,
        }
    }
}

/// Score as ordered by the selector. NaN maps to negative infinity: IEEE
/// total order would rank a positive NaN above every real value, which is
/// the opposite of what a ranking wants from an undefined score.
fn ord_score(score: f64) -> f64 {
    if score.is_nan() {
        f64::NEG_INFINITY
    } else {
        score
    }
}

/// Streaming top-N selector with stable tie-breaking.
///
/// Capacity is fixed at construction. Once `N` entries are tracked, a new
/// item replaces the current minimum only when its score is *strictly*
/// greater; an incoming item that merely ties the minimum is discarded, so
/// earlier insertions are preferred throughout.
///
/// [`BoundedTopN::top_n`] is side-effect-free and idempotent: repeated calls
/// without intervening [`BoundedTopN::add`] calls return the same sequence.
#[derive(Debug, Clone)]
pub struct BoundedTopN {
    capacity: usize,
    entries: Vec<Entry>,
    next_seq: u64,
}

impl BoundedTopN {
    /// Creates a selector retaining at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity),
            next_seq: 0,
        }
    }

    /// Configured capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been retained yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Offers one scored item to the selector.
    ///
    /// NaN scores sort below all real values, so a NaN entry is the first
    /// candidate for eviction and never displaces a real-scored one.
    pub fn add(&mut self, item_id: impl Into<String>, score: f64) {
        if self.capacity == 0 {
            return;
        }

        let entry = Entry {
            item_id: item_id.into(),
            score,
            seq: self.next_seq,
        };
        self.next_seq += 1;

        if self.entries.len() < self.capacity {
            self.entries.push(entry);
            return;
        }

        // Full: locate the worst retained entry (lowest score; among equals,
        // the latest inserted) and replace it only on a strictly greater score.
        let worst = self
            .entries
            .iter()
            .enumerate()
            .reduce(|acc, cur| if cur.1.is_worse_than(acc.1) { cur } else { acc })
            .map(|(i, _)| i);
        if let Some(worst_idx) = worst {
            let cmp = ord_score(entry.score).total_cmp(&ord_score(self.entries[worst_idx].score));
            if cmp == std::cmp::Ordering::Greater {
                self.entries[worst_idx] = entry;
            }
        }
    }

    /// Returns the retained entries ordered by score descending, with equal
    /// scores ordered by insertion (earlier first).
    #[must_use]
    pub fn top_n(&self) -> Vec<RankedItem> {
        let mut ordered: Vec<&Entry> = self.entries.iter().collect();
        ordered.sort_by(|a, b| {
            ord_score(b.score)
                .total_cmp(&ord_score(a.score))
                .then_with(|| a.seq.cmp(&b.seq))
        });
        ordered
            .into_iter()
            .map(|entry| RankedItem::new(entry.item_id.clone(), entry.score))
            .collect()
    }
}
