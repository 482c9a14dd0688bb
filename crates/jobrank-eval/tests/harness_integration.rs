//! End-to-end runs of the evaluation pipeline against a temp working area.

use std::fs;
use std::path::Path;

use jobrank_core::EvalResult;
use jobrank_eval::{
    AlgorithmKind, EvalWorkspace, Evaluation, EvaluationSpec, PrecomputedRecommender, Recommender,
    RelationalSink, ResultSink, SplitMode, TabularSink,
};

/// Emits the current testing partition verbatim as the result, which makes
/// every prediction correct.
struct OracleRecommender;

impl Recommender for OracleRecommender {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Cf
    }

    fn train_and_emit(&self, workspace: &EvalWorkspace) -> EvalResult<()> {
        let body = fs::read_to_string(workspace.testing_scores())?;
        fs::write(workspace.result_scores(), body)?;
        Ok(())
    }
}

fn write_input(dir: &Path, rows: &[(&str, &str, f64)]) -> std::path::PathBuf {
    let path = dir.join("input.txt");
    let body: String = rows
        .iter()
        .map(|(u, i, s)| format!("{u}\t{i}\t{s}\n"))
        .collect();
    fs::write(&path, body).expect("write input");
    path
}

fn spec(mode: SplitMode, param: usize, input: &Path, eval_dir: &Path) -> EvaluationSpec {
    EvaluationSpec {
        mode,
        param,
        algorithm: AlgorithmKind::Cf,
        input: input.to_path_buf(),
        evaluation_dir: eval_dir.to_path_buf(),
        task_id: "it-task".to_owned(),
    }
}

#[test]
fn cross_validation_with_perfect_predictions_scores_one() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_input(
        dir.path(),
        &[
            ("u1", "a", 5.0),
            ("u1", "b", 5.0),
            ("u1", "c", 5.0),
            ("u1", "d", 5.0),
        ],
    );

    let evaluation =
        Evaluation::new(spec(SplitMode::Cross, 2, &input, dir.path())).expect("evaluation");
    let result = evaluation.run(&OracleRecommender, &[]).expect("run");

    // Every fold's result equals its ground truth, so the ranking metrics
    // are exactly 1 and the error metric exactly 0 after averaging.
    assert_eq!(result["MRR"], 1.0);
    assert_eq!(result["MAP"], 1.0);
    assert_eq!(result["R@10"], 1.0);
    assert_eq!(result["NDCG@10"], 1.0);
    assert_eq!(result["RMSE"], 0.0);
}

#[test]
fn custom_mode_scores_a_precomputed_artifact() {
    let dir = tempfile::tempdir().expect("tempdir");
    let workspace = EvalWorkspace::new(dir.path());
    workspace.ensure_layout().expect("layout");

    // Held-out truth: u1 considers only "a" relevant (threshold is 3).
    fs::write(workspace.testing_scores(), "u1\ta\t5\nu1\tb\t1\n").expect("write testing");
    let input = write_input(dir.path(), &[("u1", "c", 4.0)]);

    // The artifact ranks the relevant item second.
    let artifact_dir = dir.path().join("cf");
    fs::create_dir_all(&artifact_dir).expect("mkdir");
    fs::write(artifact_dir.join("Score.txt"), "u1\tb\t0.9\nu1\ta\t0.4\n").expect("write artifact");

    let evaluation =
        Evaluation::new(spec(SplitMode::Custom, 0, &input, dir.path())).expect("evaluation");
    let recommender =
        PrecomputedRecommender::new(AlgorithmKind::Cf, artifact_dir.join("Score.txt"));
    let result = evaluation.run(&recommender, &[]).expect("run");

    assert_eq!(result["MRR"], 0.5);
    assert_eq!(result["P@10"], 0.5);
    assert_eq!(result["R@10"], 1.0);
}

#[test]
fn sinks_receive_the_aggregated_result() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_input(dir.path(), &[("u1", "a", 5.0), ("u1", "b", 5.0)]);

    let evaluation =
        Evaluation::new(spec(SplitMode::Cross, 2, &input, dir.path())).expect("evaluation");
    let tabular = TabularSink::in_dir(dir.path());
    let relational = RelationalSink::in_dir(dir.path());
    let sinks: [&dyn ResultSink; 2] = [&tabular, &relational];
    evaluation.run(&OracleRecommender, &sinks).expect("run");

    let table = fs::read_to_string(dir.path().join("evaluationResult.txt")).expect("read table");
    assert!(table.contains("MRR\t1\n"));
    for line in table.lines() {
        assert_eq!(line.split('\t').count(), 2, "unexpected row shape: {line:?}");
    }

    let conn = rusqlite::Connection::open(dir.path().join("evaluation.sqlite3")).expect("open db");
    let metrics: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM evaluation WHERE task_id = 'it-task'",
            [],
            |row| row.get(0),
        )
        .expect("count");
    assert_eq!(metrics, 8);
    let status: String = conn
        .query_row(
            "SELECT status FROM task WHERE task_id = 'it-task'",
            [],
            |row| row.get(0),
        )
        .expect("status");
    assert_eq!(status, "Done");
}

#[test]
fn partitioning_mode_splits_then_scores() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_input(
        dir.path(),
        &[("u1", "a", 5.0), ("u1", "b", 5.0), ("u1", "c", 5.0), ("u1", "d", 5.0)],
    );

    let evaluation =
        Evaluation::new(spec(SplitMode::Partitioning, 75, &input, dir.path())).expect("evaluation");
    let result = evaluation.run(&OracleRecommender, &[]).expect("run");

    // 75% of four records trains; the held-out record is predicted exactly.
    assert_eq!(result["MRR"], 1.0);
    assert_eq!(result["R@10"], 1.0);
}

#[test]
fn training_failure_aborts_the_run() {
    struct FailingRecommender;
    impl Recommender for FailingRecommender {
        fn kind(&self) -> AlgorithmKind {
            AlgorithmKind::Cb
        }
        fn train_and_emit(&self, _workspace: &EvalWorkspace) -> EvalResult<()> {
            Err(jobrank_core::EvalError::PartitionNotFound {
                path: "missing-model".into(),
            })
        }
    }

    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_input(dir.path(), &[("u1", "a", 5.0), ("u1", "b", 5.0)]);

    let evaluation =
        Evaluation::new(spec(SplitMode::Cross, 2, &input, dir.path())).expect("evaluation");
    let err = evaluation
        .run(&FailingRecommender, &[])
        .expect_err("must abort");
    assert!(matches!(err, jobrank_core::EvalError::Training { .. }));

    // Nothing was persisted.
    assert!(!dir.path().join("evaluationResult.txt").exists());
}
