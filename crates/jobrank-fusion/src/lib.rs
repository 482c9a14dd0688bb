//! Hybrid score combination for jobrank.
//!
//! This crate provides:
//! - **`hybrid_score`**: the scalar alpha blend of one CF score and one CB score.
//! - **`blend_user_scores`**: per-user merge of two `item -> score` maps into
//!   one blended ranking (union alignment, zero-fill for missing sources).
//! - **`select_top_n`**: materialization of the final recommendation list via
//!   the core bounded top-N selector.

pub mod hybrid;

pub use hybrid::{blend_user_scores, hybrid_score, select_top_n};
