//! Core types, errors, and ranking metrics for the jobrank evaluation harness.
//!
//! This crate defines the shared data model (`RankedItem`, `TruthItem`,
//! `EvaluationResult`), the unified error type (`EvalError`), the pure
//! information-retrieval metric suite, and the bounded top-N selector used to
//! materialize rankings from raw scores.
//!
//! It has minimal external dependencies and is intended to be depended on by
//! every other crate in the workspace.

pub mod error;
pub mod metrics;
pub mod topn;
pub mod tracing_config;
pub mod types;

pub use error::{EvalError, EvalResult};
pub use topn::BoundedTopN;
pub use types::{
    EvaluationResult, RankedItem, TruthItem, UserGroundTruth, UserRankList,
};
