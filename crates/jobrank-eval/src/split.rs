//! Train/test partitioning strategies.
//!
//! Every strategy is deterministic: the same input dataset always produces
//! the same partitions, with no randomness involved. Splits are carved per
//! user so that every user with enough interactions appears on both sides.

use std::path::Path;
use std::str::FromStr;

use jobrank_core::{EvalError, EvalResult};
use tracing::{debug, instrument};

use crate::dataset::{self, EvalWorkspace, ScoreRecord};

/// How the input dataset is partitioned into train and test sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    /// K-fold cross-validation; the parameter is the fold count.
    Cross,
    /// Single percentage split; the parameter is the training percentage.
    Partitioning,
    /// Caller-provided partitions; the testing file must already exist.
    Custom,
}

impl SplitMode {
    /// Stable lowercase name, as accepted on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cross => "cross",
            Self::Partitioning => "partitioning",
            Self::Custom => "custom",
        }
    }
}

impl FromStr for SplitMode {
    type Err = EvalError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "cross" => Ok(Self::Cross),
            "partitioning" => Ok(Self::Partitioning),
            "custom" => Ok(Self::Custom),
            other => Err(EvalError::InvalidConfig {
                field: "split_mode".to_owned(),
                value: other.to_owned(),
                reason: "expected one of: cross, partitioning, custom".to_owned(),
            }),
        }
    }
}

/// Deterministic splitter writing partitions into an [`EvalWorkspace`].
#[derive(Debug)]
pub struct SplitStrategy<'a> {
    workspace: &'a EvalWorkspace,
}

impl<'a> SplitStrategy<'a> {
    /// Creates a splitter over `workspace`.
    #[must_use]
    pub fn new(workspace: &'a EvalWorkspace) -> Self {
        Self { workspace }
    }

    /// Carve fold `fold` of `fold_count` out of the input dataset.
    ///
    /// Within each user's record sequence, record `i` lands in the testing
    /// partition when `i % fold_count == fold`, otherwise in training. Users
    /// with fewer records than folds may be absent from some test folds.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::InvalidConfig`] for a zero fold count or an
    /// out-of-range fold index, and propagates dataset I/O errors.
    #[instrument(name = "jobrank::split", level = "debug", skip(self, input))]
    pub fn carve_fold(&self, input: &Path, fold: usize, fold_count: usize) -> EvalResult<()> {
        if fold_count == 0 {
            return Err(invalid("fold_count", "0", "fold count must be at least 1"));
        }
        if fold >= fold_count {
            return Err(invalid(
                "fold",
                &fold.to_string(),
                "fold index must be below the fold count",
            ));
        }

        let records = dataset::read_score_records(input)?;
        let mut training = Vec::new();
        let mut testing = Vec::new();
        for (_, user_records) in dataset::group_by_user(&records) {
            for (index, record) in user_records.into_iter().enumerate() {
                if index % fold_count == fold {
                    testing.push(record.clone());
                } else {
                    training.push(record.clone());
                }
            }
        }
        debug!(
            target: "jobrank.split",
            fold,
            fold_count,
            training = training.len(),
            testing = testing.len(),
            "carved cross-validation fold"
        );
        self.write_partitions(&training, &testing)
    }

    /// Single split assigning the first `percentage`% of each user's records
    /// (rounded up) to training and the remainder to testing.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::InvalidConfig`] when `percentage` is outside
    /// `1..=99`, and propagates dataset I/O errors.
    #[instrument(name = "jobrank::split", level = "debug", skip(self, input))]
    pub fn percentage_split(&self, input: &Path, percentage: usize) -> EvalResult<()> {
        if !(1..=99).contains(&percentage) {
            return Err(invalid(
                "percentage",
                &percentage.to_string(),
                "training percentage must be between 1 and 99",
            ));
        }

        let records = dataset::read_score_records(input)?;
        let mut training = Vec::new();
        let mut testing = Vec::new();
        for (_, user_records) in dataset::group_by_user(&records) {
            let take = (user_records.len() * percentage).div_ceil(100);
            for (index, record) in user_records.into_iter().enumerate() {
                if index < take {
                    training.push(record.clone());
                } else {
                    testing.push(record.clone());
                }
            }
        }
        debug!(
            target: "jobrank.split",
            percentage,
            training = training.len(),
            testing = testing.len(),
            "carved percentage split"
        );
        self.write_partitions(&training, &testing)
    }

    /// Use caller-provided partitions: the input becomes the training file
    /// unchanged, and a testing file must already be present in the
    /// workspace.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::PartitionNotFound`] when the testing file is
    /// missing, and propagates dataset I/O errors.
    pub fn custom_split(&self, input: &Path) -> EvalResult<()> {
        let testing = self.workspace.testing_scores();
        if !testing.exists() {
            return Err(EvalError::PartitionNotFound { path: testing });
        }
        let records = dataset::read_score_records(input)?;
        dataset::write_score_records(&self.workspace.training_scores(), &records)
    }

    fn write_partitions(&self, training: &[ScoreRecord], testing: &[ScoreRecord]) -> EvalResult<()> {
        dataset::write_score_records(&self.workspace.training_scores(), training)?;
        dataset::write_score_records(&self.workspace.testing_scores(), testing)
    }
}

fn invalid(field: &str, value: &str, reason: &str) -> EvalError {
    EvalError::InvalidConfig {
        field: field.to_owned(),
        value: value.to_owned(),
        reason: reason.to_owned(),
    }
}
