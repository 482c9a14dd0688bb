//! Evaluation run configuration.
//!
//! Loaded once per run from `config.properties` in the evaluation working
//! area, as simple `key=value` lines. A missing or unreadable file is logged
//! and the run proceeds with the documented defaults; malformed values are a
//! hard error, since silently mis-parsed numbers would skew every metric.

use std::fs;
use std::path::Path;

use jobrank_core::{EvalError, EvalResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// File name of the per-run configuration, relative to the evaluation dir.
pub const CONFIG_FILE_NAME: &str = "config.properties";

/// Default top-N cutoff for metrics and selection.
pub const DEFAULT_TOP_N: usize = 10;

/// Default relevance threshold: an entry is relevant iff its score exceeds this.
pub const DEFAULT_RELEVANT_SCORE: i64 = 3;

/// Default hybrid blend weight.
pub const DEFAULT_HB_ALPHA: f64 = 0.5;

/// Configuration for one evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Top-N cutoff applied to metrics (`P@N`, `NDCG@N`, ...) and to the
    /// hybrid collaborator's emitted list length. Key: `topn`.
    pub top_n: usize,
    /// Relevance threshold: ground-truth entries with a recorded score
    /// strictly greater than this are relevant. Key: `relevant.score`.
    pub relevant_score: i64,
    /// Hybrid blend weight alpha in `[0, 1]`. Key: `hb.alpha`.
    pub hb_alpha: f64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            relevant_score: DEFAULT_RELEVANT_SCORE,
            hb_alpha: DEFAULT_HB_ALPHA,
        }
    }
}

impl EvalConfig {
    /// Load configuration from `<evaluation_dir>/config.properties`.
    ///
    /// A missing or unreadable file logs a warning and yields the defaults
    /// (the run proceeds; see the error-policy table in DESIGN.md).
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::InvalidConfig`] when a present key has a value
    /// that does not parse.
    pub fn load(evaluation_dir: &Path) -> EvalResult<Self> {
        let path = evaluation_dir.join(CONFIG_FILE_NAME);
        let body = match fs::read_to_string(&path) {
            Ok(body) => body,
            Err(source) => {
                let error = EvalError::ConfigLoad { path, source };
                warn!(
                    target: "jobrank.config",
                    %error,
                    "config file unreadable; proceeding with defaults"
                );
                return Ok(Self::default());
            }
        };
        Self::from_properties(&body)
    }

    /// Parse `key=value` property lines. Unknown keys are ignored; `#` and
    /// `!` lines are comments.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::InvalidConfig`] for unparseable values.
    pub fn from_properties(body: &str) -> EvalResult<Self> {
        let mut config = Self::default();
        for line in body.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            match key {
                "topn" => {
                    config.top_n = value.parse().map_err(|_| invalid("topn", value, "must be a positive integer"))?;
                }
                "relevant.score" => {
                    config.relevant_score = value
                        .parse()
                        .map_err(|_| invalid("relevant.score", value, "must be an integer"))?;
                }
                "hb.alpha" => {
                    config.hb_alpha = value
                        .parse()
                        .map_err(|_| invalid("hb.alpha", value, "must be a float in [0, 1]"))?;
                }
                _ => {}
            }
        }
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::InvalidConfig`] when `top_n` is zero or
    /// `hb_alpha` is not a finite value in `[0, 1]`.
    pub fn validate(&self) -> EvalResult<()> {
        if self.top_n == 0 {
            return Err(invalid("topn", &self.top_n.to_string(), "must be >= 1"));
        }
        if !self.hb_alpha.is_finite() || !(0.0..=1.0).contains(&self.hb_alpha) {
            return Err(invalid(
                "hb.alpha",
                &self.hb_alpha.to_string(),
                "must be a finite value within [0, 1]",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, value: &str, reason: &str) -> EvalError {
    EvalError::InvalidConfig {
        field: field.to_owned(),
        value: value.to_owned(),
        reason: reason.to_owned(),
    }
}
