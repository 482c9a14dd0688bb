//! Tracing conventions for the jobrank evaluation pipeline.
//!
//! All jobrank spans and events use targets under the `jobrank` prefix, so
//! consumers can filter them with:
//!
//! ```text
//! RUST_LOG=jobrank=debug
//! ```
//!
//! Consumers bring their own subscriber; this module only fixes the naming
//! contract and the environment-driven level selection.

use tracing::Level;

/// Target prefix used by all jobrank tracing spans and events.
pub const TARGET_PREFIX: &str = "jobrank";

/// Standard tracing span names used across the evaluation pipeline.
///
/// These constants ensure consistent span naming so consumers can match on
/// them in subscribers and tests.
pub mod span_names {
    /// Root span for one evaluation run.
    pub const EVALUATE: &str = "jobrank::evaluate";
    /// Train/test partition carving.
    pub const SPLIT: &str = "jobrank::split";
    /// One collaborator training invocation.
    pub const TRAIN: &str = "jobrank::train";
    /// CF/CB score blending.
    pub const BLEND: &str = "jobrank::blend";
}

/// Environment variable selecting the pipeline's log level.
pub const LEVEL_ENV_VAR: &str = "JOBRANK_LOG_LEVEL";

/// Log level for this run: `JOBRANK_LOG_LEVEL` when set to one of `trace`,
/// `debug`, `info`, `warn`, or `error` (any case), otherwise `default`.
/// An unset or unrecognized value falls back silently; a bad log knob must
/// never stop an evaluation.
#[must_use]
pub fn level_from_env(default: Level) -> Level {
    let Ok(raw) = std::env::var(LEVEL_ENV_VAR) else {
        return default;
    };
    raw.trim().parse::<Level>().unwrap_or(default)
}
