//! Score-file datasets and the evaluation working-area layout.
//!
//! All partitions (train, test, result) share one persisted format: tab
//! separated rows `userId \t itemId \t score`, one file per partition named
//! `Score.txt`. Rankings are loaded in emission order and never re-sorted;
//! ground truth is reduced to the relevant subset at load time by the
//! configured threshold.
//!
//! Writers are atomic (temp file + rename) so a failed producer can never
//! leave a partially-written partition that looks complete.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use jobrank_core::{EvalError, EvalResult, RankedItem, TruthItem, UserGroundTruth, UserRankList};
use tracing::debug;

/// Partition file name, identical in every partition directory.
pub const SCORE_FILE_NAME: &str = "Score.txt";
/// Training partition directory, relative to the working-area root.
pub const TRAINING_DIR: &str = "training";
/// Testing partition directory, relative to the working-area root.
pub const TESTING_DIR: &str = "testing";
/// Result partition directory, relative to the working-area root.
pub const RESULT_DIR: &str = "result";

/// One parsed score row.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub user_id: String,
    pub item_id: String,
    pub score: f64,
}

impl ScoreRecord {
    /// Creates a record.
    #[must_use]
    pub fn new(user_id: impl Into<String>, item_id: impl Into<String>, score: f64) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            score,
        }
    }
}

/// Fixed partition layout of one evaluation working area.
///
/// Cross-validation folds reuse the same three locations, which is why at
/// most one evaluation run may be active against a working area at a time.
#[derive(Debug, Clone)]
pub struct EvalWorkspace {
    root: PathBuf,
}

impl EvalWorkspace {
    /// Creates a workspace rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Working-area root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the training partition's score file.
    #[must_use]
    pub fn training_scores(&self) -> PathBuf {
        self.root.join(TRAINING_DIR).join(SCORE_FILE_NAME)
    }

    /// Path of the testing partition's score file.
    #[must_use]
    pub fn testing_scores(&self) -> PathBuf {
        self.root.join(TESTING_DIR).join(SCORE_FILE_NAME)
    }

    /// Path of the result partition's score file (the collaborator's output).
    #[must_use]
    pub fn result_scores(&self) -> PathBuf {
        self.root.join(RESULT_DIR).join(SCORE_FILE_NAME)
    }

    /// Create the partition directories if they do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::Io`] on filesystem failure.
    pub fn ensure_layout(&self) -> EvalResult<()> {
        for dir in [TRAINING_DIR, TESTING_DIR, RESULT_DIR] {
            fs::create_dir_all(self.root.join(dir))?;
        }
        Ok(())
    }

    /// Truncate a stale result file before a TRAIN step so a collaborator
    /// always starts from an empty result location.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::Io`] when the existing file cannot be truncated.
    pub fn clean_result(&self) -> EvalResult<()> {
        let path = self.result_scores();
        if path.exists() {
            fs::write(&path, "")?;
            debug!(target: "jobrank.dataset", path = %path.display(), "truncated stale result file");
        }
        Ok(())
    }
}

/// Read and parse a score file.
///
/// Blank lines are skipped; each remaining row must have exactly three
/// tab-separated fields with a numeric score. Carriage returns from files
/// written on other platforms are tolerated.
///
/// # Errors
///
/// Returns [`EvalError::PartitionNotFound`] when the file does not exist and
/// [`EvalError::ParseRow`] for malformed rows.
pub fn read_score_records(path: &Path) -> EvalResult<Vec<ScoreRecord>> {
    if !path.exists() {
        return Err(EvalError::PartitionNotFound {
            path: path.to_path_buf(),
        });
    }
    let body = fs::read_to_string(path)?;

    let mut records = Vec::new();
    for (index, line) in body.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let (Some(user_id), Some(item_id), Some(raw_score), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(parse_error(path, index, "expected exactly 3 tab-separated fields"));
        };
        let score: f64 = raw_score
            .parse()
            .map_err(|_| parse_error(path, index, "score field is not a number"))?;
        records.push(ScoreRecord::new(user_id, item_id, score));
    }
    Ok(records)
}

/// Write a score file atomically (temp file, then rename into place).
///
/// # Errors
///
/// Returns [`EvalError::Io`] on filesystem failure.
pub fn write_score_records(path: &Path, records: &[ScoreRecord]) -> EvalResult<()> {
    let mut body = String::with_capacity(records.len() * 24);
    for record in records {
        body.push_str(&record.user_id);
        body.push('\t');
        body.push_str(&record.item_id);
        body.push('\t');
        body.push_str(&record.score.to_string());
        body.push('\n');
    }

    let tmp = path.with_extension("txt.tmp");
    fs::write(&tmp, body)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Load a result partition as per-user rankings, preserving emission order.
///
/// # Errors
///
/// Propagates [`read_score_records`] errors.
pub fn load_rank_list(path: &Path) -> EvalResult<UserRankList> {
    let mut rank_list = UserRankList::new();
    for record in read_score_records(path)? {
        rank_list
            .entry(record.user_id)
            .or_default()
            .push(RankedItem::new(record.item_id, record.score));
    }
    Ok(rank_list)
}

/// Load a test partition as per-user ground truth, keeping only entries whose
/// recorded score is strictly greater than `threshold`.
///
/// # Errors
///
/// Propagates [`read_score_records`] errors.
pub fn load_ground_truth(path: &Path, threshold: i64) -> EvalResult<UserGroundTruth> {
    #[allow(clippy::cast_precision_loss)]
    let cutoff = threshold as f64;
    let mut truth = UserGroundTruth::new();
    for record in read_score_records(path)? {
        if record.score > cutoff {
            truth
                .entry(record.user_id)
                .or_default()
                .push(TruthItem::new(record.item_id, record.score));
        }
    }
    Ok(truth)
}

/// Group records by user, preserving each user's record order.
#[must_use]
pub fn group_by_user(records: &[ScoreRecord]) -> BTreeMap<&str, Vec<&ScoreRecord>> {
    let mut grouped: BTreeMap<&str, Vec<&ScoreRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.user_id.as_str()).or_default().push(record);
    }
    grouped
}

fn parse_error(path: &Path, index: usize, detail: &str) -> EvalError {
    EvalError::ParseRow {
        path: path.to_path_buf(),
        line: index + 1,
        detail: detail.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, body: &str) {
        fs::write(path, body).expect("write fixture");
    }

    #[test]
    fn roundtrips_score_records() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SCORE_FILE_NAME);
        let records = vec![
            ScoreRecord::new("u1", "job-1", 4.5),
            ScoreRecord::new("u2", "job-2", 2.0),
        ];
        write_score_records(&path, &records).expect("write");
        let loaded = read_score_records(&path).expect("read");
        assert_eq!(loaded, records);
    }

    #[test]
    fn tolerates_crlf_and_blank_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SCORE_FILE_NAME);
        write(&path, "u1\tjob-1\t4\r\n\r\nu1\tjob-2\t5\r\n");
        let loaded = read_score_records(&path).expect("read");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].item_id, "job-2");
    }

    #[test]
    fn missing_partition_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = read_score_records(&dir.path().join("absent.txt")).expect_err("must fail");
        assert!(matches!(err, EvalError::PartitionNotFound { .. }));
    }

    #[test]
    fn malformed_rows_name_the_line() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SCORE_FILE_NAME);
        write(&path, "u1\tjob-1\t4\nu1\tjob-2\n");
        let err = read_score_records(&path).expect_err("must fail");
        match err {
            EvalError::ParseRow { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_numeric_score_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SCORE_FILE_NAME);
        write(&path, "u1\tjob-1\thigh\n");
        assert!(matches!(
            read_score_records(&path),
            Err(EvalError::ParseRow { .. })
        ));
    }

    #[test]
    fn rank_list_preserves_emission_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SCORE_FILE_NAME);
        // Second row scores lower than third: order must still be as written.
        write(&path, "u1\tfirst\t9\nu1\tsecond\t1\nu1\tthird\t5\n");
        let ranks = load_rank_list(&path).expect("load");
        let ids: Vec<&str> = ranks["u1"].iter().map(|i| i.item_id.as_str()).collect();
        assert_eq!(ids, ["first", "second", "third"]);
    }

    #[test]
    fn ground_truth_filters_by_strict_threshold() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SCORE_FILE_NAME);
        write(&path, "u1\tkeep\t4\nu1\tdrop-at-threshold\t3\nu1\tdrop-below\t1\n");
        let truth = load_ground_truth(&path, 3).expect("load");
        assert_eq!(truth["u1"].len(), 1);
        assert_eq!(truth["u1"][0].item_id, "keep");
    }

    #[test]
    fn ground_truth_keeps_relevance_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SCORE_FILE_NAME);
        write(&path, "u1\tjob\t4.5\n");
        let truth = load_ground_truth(&path, 3).expect("load");
        assert!((truth["u1"][0].relevance - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn workspace_layout_and_result_cleanup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let workspace = EvalWorkspace::new(dir.path());
        workspace.ensure_layout().expect("layout");
        assert!(dir.path().join(TRAINING_DIR).is_dir());
        assert!(dir.path().join(TESTING_DIR).is_dir());
        assert!(dir.path().join(RESULT_DIR).is_dir());

        write(&workspace.result_scores(), "u1\tjob\t5\n");
        workspace.clean_result().expect("clean");
        let body = fs::read_to_string(workspace.result_scores()).expect("read");
        assert!(body.is_empty());
    }

    #[test]
    fn group_by_user_keeps_per_user_order() {
        let records = vec![
            ScoreRecord::new("b", "j1", 1.0),
            ScoreRecord::new("a", "j2", 2.0),
            ScoreRecord::new("b", "j3", 3.0),
        ];
        let grouped = group_by_user(&records);
        assert_eq!(grouped["b"].len(), 2);
        assert_eq!(grouped["b"][0].item_id, "j1");
        assert_eq!(grouped["b"][1].item_id, "j3");
    }
}
