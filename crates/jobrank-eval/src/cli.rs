//! Command-line front end: argument parsing and pipeline wiring.
//!
//! Flag parsing is hand-rolled; the surface is small enough that a parser
//! dependency would buy nothing. Usage problems are reported as plain
//! strings so the binary can print them with the usage text and exit 2.

use std::path::PathBuf;

use jobrank_core::EvalResult;

use crate::algorithm::{
    AlgorithmKind, HybridRecommender, PartitionScoreProvider, PrecomputedRecommender, Recommender,
};
use crate::config::EvalConfig;
use crate::dataset::SCORE_FILE_NAME;
use crate::harness::EvaluationSpec;
use crate::split::SplitMode;

/// Process exit codes.
pub mod exit_code {
    /// Evaluation completed.
    pub const OK: u8 = 0;
    /// Pipeline failure (bad data, failing training step, I/O).
    pub const RUNTIME_ERROR: u8 = 1;
    /// Bad command line.
    pub const USAGE_ERROR: u8 = 2;
}

/// Usage text printed for `--help` and argument errors.
pub const USAGE: &str = "\
usage: jobrank-eval --mode <cross|partitioning|custom> --algorithm <cf|cb|hb>
                    --input <score-file> --eval-dir <dir>
                    [--param <n>] [--task-id <id>]

modes:
  cross          k-fold cross-validation; --param is the fold count (default 5)
  partitioning   single split; --param is the training percentage (default 80)
  custom         pre-split partitions; testing/Score.txt must already exist

The evaluation directory holds config.properties, the train/test/result
partitions, and the result sinks. Precomputed cf/cb score artifacts are read
from <eval-dir>/cf/Score.txt and <eval-dir>/cb/Score.txt.";

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub mode: SplitMode,
    pub param: usize,
    pub algorithm: AlgorithmKind,
    pub input: PathBuf,
    pub evaluation_dir: PathBuf,
    pub task_id: String,
}

impl CliArgs {
    /// Turn the parsed arguments into an evaluation spec.
    #[must_use]
    pub fn into_spec(self) -> EvaluationSpec {
        EvaluationSpec {
            mode: self.mode,
            param: self.param,
            algorithm: self.algorithm,
            input: self.input,
            evaluation_dir: self.evaluation_dir,
            task_id: self.task_id,
        }
    }
}

/// Parse command-line arguments (without the program name).
///
/// # Errors
///
/// Returns a human-readable message for any usage problem; `Ok(None)` means
/// `--help` was requested.
pub fn parse_cli_args(args: &[String]) -> Result<Option<CliArgs>, String> {
    let mut mode = None;
    let mut param = None;
    let mut algorithm = None;
    let mut input = None;
    let mut evaluation_dir = None;
    let mut task_id = None;

    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--help" | "-h" => return Ok(None),
            "--mode" => {
                let value = flag_value(&mut iter, "--mode")?;
                mode = Some(value.parse::<SplitMode>().map_err(|e| e.to_string())?);
            }
            "--param" => {
                let value = flag_value(&mut iter, "--param")?;
                param = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("--param must be a non-negative integer, got {value:?}"))?,
                );
            }
            "--algorithm" => {
                let value = flag_value(&mut iter, "--algorithm")?;
                algorithm = Some(value.parse::<AlgorithmKind>().map_err(|e| e.to_string())?);
            }
            "--input" => input = Some(PathBuf::from(flag_value(&mut iter, "--input")?)),
            "--eval-dir" => {
                evaluation_dir = Some(PathBuf::from(flag_value(&mut iter, "--eval-dir")?));
            }
            "--task-id" => task_id = Some(flag_value(&mut iter, "--task-id")?.clone()),
            other => return Err(format!("unknown argument {other:?}")),
        }
    }

    let mode = mode.ok_or("missing required flag --mode")?;
    let algorithm = algorithm.ok_or("missing required flag --algorithm")?;
    let input = input.ok_or("missing required flag --input")?;
    let evaluation_dir = evaluation_dir.ok_or("missing required flag --eval-dir")?;
    let param = param.unwrap_or(match mode {
        SplitMode::Cross => 5,
        SplitMode::Partitioning => 80,
        SplitMode::Custom => 0,
    });

    Ok(Some(CliArgs {
        mode,
        param,
        algorithm,
        input,
        evaluation_dir,
        task_id: task_id.unwrap_or_else(|| "local".to_owned()),
    }))
}

/// Build the recommender the spec's algorithm calls for.
///
/// # Errors
///
/// For the hybrid algorithm, propagates errors from loading the cf and cb
/// score artifacts.
pub fn build_recommender(spec: &EvaluationSpec, config: &EvalConfig) -> EvalResult<Box<dyn Recommender>> {
    let artifact = |name: &str| spec.evaluation_dir.join(name).join(SCORE_FILE_NAME);
    match spec.algorithm {
        AlgorithmKind::Cf => Ok(Box::new(PrecomputedRecommender::new(
            AlgorithmKind::Cf,
            artifact("cf"),
        ))),
        AlgorithmKind::Cb => Ok(Box::new(PrecomputedRecommender::new(
            AlgorithmKind::Cb,
            artifact("cb"),
        ))),
        AlgorithmKind::Hb => {
            let cf = PartitionScoreProvider::load(artifact("cf"))?;
            let cb = PartitionScoreProvider::load(artifact("cb"))?;
            Ok(Box::new(HybridRecommender::new(
                Box::new(cf),
                Box::new(cb),
                config.top_n,
                config.hb_alpha,
            )))
        }
    }
}

fn flag_value<'a>(
    iter: &mut std::slice::Iter<'a, String>,
    flag: &str,
) -> Result<&'a String, String> {
    iter.next().ok_or_else(|| format!("{flag} requires a value"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn parses_a_full_command_line() {
        let parsed = parse_cli_args(&args(&[
            "--mode",
            "cross",
            "--param",
            "3",
            "--algorithm",
            "hb",
            "--input",
            "data/Score.txt",
            "--eval-dir",
            "work",
            "--task-id",
            "task-7",
        ]))
        .expect("parse")
        .expect("args");
        assert_eq!(parsed.mode, SplitMode::Cross);
        assert_eq!(parsed.param, 3);
        assert_eq!(parsed.algorithm, AlgorithmKind::Hb);
        assert_eq!(parsed.task_id, "task-7");
    }

    #[test]
    fn applies_mode_defaults_for_param() {
        let cross = parse_cli_args(&args(&[
            "--mode", "cross", "--algorithm", "cf", "--input", "s", "--eval-dir", "d",
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(cross.param, 5);

        let split = parse_cli_args(&args(&[
            "--mode",
            "partitioning",
            "--algorithm",
            "cf",
            "--input",
            "s",
            "--eval-dir",
            "d",
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(split.param, 80);
    }

    #[test]
    fn help_short_circuits() {
        assert_eq!(parse_cli_args(&args(&["--help"])).unwrap(), None);
    }

    #[test]
    fn missing_required_flags_are_reported() {
        let err = parse_cli_args(&args(&["--mode", "cross"])).expect_err("must fail");
        assert!(err.contains("--algorithm"));
    }

    #[test]
    fn rejects_unknown_flags_and_bad_values() {
        assert!(parse_cli_args(&args(&["--verbose"])).is_err());
        assert!(parse_cli_args(&args(&["--mode", "shuffle"])).is_err());
        assert!(parse_cli_args(&args(&["--param", "many"])).is_err());
        assert!(parse_cli_args(&args(&["--param"])).is_err());
    }
}
