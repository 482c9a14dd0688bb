use std::path::PathBuf;

/// Unified error type covering all failure modes across the jobrank
/// evaluation pipeline.
///
/// Every variant includes an actionable message guiding the consumer toward
/// resolution. The harness degrades gracefully where the design calls for it:
/// a missing configuration file falls back to documented defaults and a sink
/// write failure is logged without aborting the run. Only `Training`,
/// `InvalidConfig`, and dataset errors abort an evaluation.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    // === Configuration errors ===
    /// The configuration file could not be read at construction time.
    #[error("Config file unreadable at {path}: {source}. Proceeding requires defaults; check evaluationDir/config.properties.")]
    ConfigLoad {
        /// Path that was attempted.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("Invalid config: {field} = \"{value}\": {reason}")]
    InvalidConfig {
        /// Which config field.
        field: String,
        /// The invalid value.
        value: String,
        /// Why it is invalid.
        reason: String,
    },

    // === Dataset errors ===
    /// A score file row could not be parsed.
    #[error("Malformed score row at {path}:{line}: {detail}. Expected `userId\\titemId\\tscore`.")]
    ParseRow {
        /// File containing the bad row.
        path: PathBuf,
        /// 1-indexed line number.
        line: usize,
        /// What was wrong with the row.
        detail: String,
    },

    /// A required partition file does not exist.
    #[error("Partition file not found at {path}. Run the split step first, or populate the testing partition for custom validation.")]
    PartitionNotFound {
        /// Expected path.
        path: PathBuf,
    },

    // === Training errors ===
    /// An algorithm collaborator failed during TRAIN. This aborts the whole
    /// evaluation run; partial results are never scored.
    #[error("Training failed for algorithm {algorithm}: {source}")]
    Training {
        /// Which algorithm kind failed (cf, cb, hb).
        algorithm: &'static str,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // === Aggregation errors ===
    /// Per-fold results disagreed on their metric key sets.
    #[error("Fold aggregation mismatch: {detail}. Every fold must produce the same metric keys.")]
    FoldMismatch {
        /// Which keys diverged.
        detail: String,
    },

    // === Persistence errors ===
    /// Wraps errors from the relational result sink.
    ///
    /// Sink failures are logged by the harness and do not abort the run.
    #[error("{sink} sink error: {source}")]
    Sink {
        /// Which sink produced the error ("tabular" or "relational").
        sink: &'static str,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // === I/O errors ===
    /// Wraps `std::io::Error` for file operations.
    #[error("I/O error: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the jobrank crate hierarchy.
pub type EvalResult<T> = Result<T, EvalError>;
