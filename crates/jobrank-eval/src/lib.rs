//! Evaluation harness for job-recommendation algorithms.
//!
//! Orchestrates one evaluation run end to end: carve train/test partitions
//! (`split`), invoke an algorithm collaborator through the `Recommender` seam
//! (`algorithm`), score the produced ranking against threshold-filtered
//! ground truth with the core metric suite (`harness`), aggregate across
//! folds, and persist the result to tabular and relational sinks (`sink`).
//!
//! The harness is strictly sequential: phases never overlap, and at most one
//! run may be active against a given evaluation working area at a time.

pub mod algorithm;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod harness;
pub mod sink;
pub mod split;

pub use algorithm::{
    AlgorithmKind, HybridRecommender, PartitionScoreProvider, PrecomputedRecommender, Recommender,
    ScoreProvider,
};
pub use config::EvalConfig;
pub use dataset::{EvalWorkspace, ScoreRecord};
pub use harness::{mean_over_folds, score_partition, Evaluation, EvaluationSpec};
pub use sink::{RelationalSink, ResultSink, TabularSink};
pub use split::{SplitMode, SplitStrategy};
