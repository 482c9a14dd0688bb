//! Result sinks: where a finished evaluation's metric map lands.
//!
//! Two sinks ship with the harness: a flat tab-separated file and a SQLite
//! database. Both are addressed through the [`ResultSink`] trait so the
//! harness can fan a result out to any combination of them.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use jobrank_core::{EvalError, EvalResult, EvaluationResult};
use rusqlite::Connection;
use tracing::{debug, warn};

/// File name of the tabular sink inside the evaluation directory.
pub const TABULAR_RESULT_FILE: &str = "evaluationResult.txt";
/// Database file name of the relational sink inside the evaluation directory.
pub const RELATIONAL_DB_FILE: &str = "evaluation.sqlite3";

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS evaluation (
    task_id TEXT NOT NULL,
    score   REAL NOT NULL,
    metric  TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS task (
    task_id          TEXT PRIMARY KEY,
    status           TEXT NOT NULL,
    execution_time_s INTEGER NOT NULL
);
";

/// Persists one evaluation result under a task identity.
pub trait ResultSink {
    /// Stable sink name, used in error reports and logs.
    fn name(&self) -> &'static str;

    /// Persist `result` for `task_id`, recording the run's wall time.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store rejects the write. The
    /// harness logs sink errors and continues; they never abort a run.
    fn persist(&self, task_id: &str, result: &EvaluationResult, elapsed: Duration) -> EvalResult<()>;
}

/// Writes the result as a tab-separated file, once.
///
/// An existing file is treated as a completed earlier run and left alone, so
/// re-running an evaluation never clobbers a recorded result.
#[derive(Debug)]
pub struct TabularSink {
    path: PathBuf,
}

impl TabularSink {
    /// Creates a sink writing to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Sink rooted at the conventional file inside `evaluation_dir`.
    #[must_use]
    pub fn in_dir(evaluation_dir: &Path) -> Self {
        Self::new(evaluation_dir.join(TABULAR_RESULT_FILE))
    }
}

impl ResultSink for TabularSink {
    fn name(&self) -> &'static str {
        "tabular"
    }

    fn persist(&self, task_id: &str, result: &EvaluationResult, _elapsed: Duration) -> EvalResult<()> {
        if self.path.exists() {
            warn!(
                target: "jobrank.sink",
                path = %self.path.display(),
                task_id,
                "result file already exists, leaving earlier run untouched"
            );
            return Ok(());
        }

        // One `metric \t value` line per metric, nothing else; task status
        // and elapsed time are the relational sink's job.
        let mut body = String::new();
        for (metric, score) in result {
            body.push_str(metric);
            body.push('\t');
            body.push_str(&score.to_string());
            body.push('\n');
        }
        fs::write(&self.path, body)?;
        debug!(
            target: "jobrank.sink",
            path = %self.path.display(),
            metrics = result.len(),
            "wrote tabular result"
        );
        Ok(())
    }
}

/// Writes the result into a SQLite database, one row per metric, and marks
/// the owning task as done.
#[derive(Debug)]
pub struct RelationalSink {
    path: PathBuf,
}

impl RelationalSink {
    /// Creates a sink backed by the database at `path`. The schema is
    /// bootstrapped on first use.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Sink backed by the conventional database inside `evaluation_dir`.
    #[must_use]
    pub fn in_dir(evaluation_dir: &Path) -> Self {
        Self::new(evaluation_dir.join(RELATIONAL_DB_FILE))
    }

    fn open(&self) -> Result<Connection, rusqlite::Error> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn)
    }

    fn write(&self, task_id: &str, result: &EvaluationResult, elapsed: Duration) -> Result<(), rusqlite::Error> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        {
            let mut insert =
                tx.prepare("INSERT INTO evaluation (task_id, score, metric) VALUES (?1, ?2, ?3)")?;
            for (metric, score) in result {
                insert.execute(rusqlite::params![task_id, score, metric])?;
            }
        }
        #[allow(clippy::cast_possible_wrap)]
        let seconds = elapsed.as_secs() as i64;
        let updated = tx.execute(
            "UPDATE task SET status = 'Done', execution_time_s = ?2 WHERE task_id = ?1",
            rusqlite::params![task_id, seconds],
        )?;
        if updated == 0 {
            tx.execute(
                "INSERT INTO task (task_id, status, execution_time_s) VALUES (?1, 'Done', ?2)",
                rusqlite::params![task_id, seconds],
            )?;
        }
        tx.commit()
    }
}

impl ResultSink for RelationalSink {
    fn name(&self) -> &'static str {
        "relational"
    }

    fn persist(&self, task_id: &str, result: &EvaluationResult, elapsed: Duration) -> EvalResult<()> {
        self.write(task_id, result, elapsed)
            .map_err(|err| EvalError::Sink {
                sink: self.name(),
                source: Box::new(err),
            })?;
        debug!(
            target: "jobrank.sink",
            path = %self.path.display(),
            task_id,
            metrics = result.len(),
            "persisted result rows"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> EvaluationResult {
        let mut result = EvaluationResult::new();
        result.insert("MAP".to_owned(), 0.42);
        result.insert("MRR".to_owned(), 0.9);
        result
    }

    #[test]
    fn tabular_sink_writes_only_metric_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = TabularSink::in_dir(dir.path());
        sink.persist("task-1", &sample_result(), Duration::from_secs(7))
            .expect("persist");

        let body = fs::read_to_string(dir.path().join(TABULAR_RESULT_FILE)).expect("read");
        assert_eq!(body, "MAP\t0.42\nMRR\t0.9\n");
        // Every line is a two-field metric row.
        for line in body.lines() {
            assert_eq!(line.split('\t').count(), 2, "unexpected row shape: {line:?}");
        }
    }

    #[test]
    fn tabular_sink_never_overwrites() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(TABULAR_RESULT_FILE);
        fs::write(&path, "earlier run\n").expect("seed");

        let sink = TabularSink::new(&path);
        sink.persist("task-1", &sample_result(), Duration::from_secs(1))
            .expect("persist");
        assert_eq!(fs::read_to_string(&path).expect("read"), "earlier run\n");
    }

    #[test]
    fn relational_sink_inserts_rows_and_marks_task_done() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = RelationalSink::in_dir(dir.path());
        sink.persist("task-9", &sample_result(), Duration::from_secs(12))
            .expect("persist");

        let conn = Connection::open(dir.path().join(RELATIONAL_DB_FILE)).expect("open");
        let rows: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM evaluation WHERE task_id = 'task-9'",
                [],
                |row| row.get(0),
            )
            .expect("count");
        assert_eq!(rows, 2);

        let (status, seconds): (String, i64) = conn
            .query_row(
                "SELECT status, execution_time_s FROM task WHERE task_id = 'task-9'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .expect("task row");
        assert_eq!(status, "Done");
        assert_eq!(seconds, 12);
    }

    #[test]
    fn relational_sink_updates_existing_task_row() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = dir.path().join(RELATIONAL_DB_FILE);
        {
            let conn = Connection::open(&db).expect("open");
            conn.execute_batch(SCHEMA).expect("schema");
            conn.execute(
                "INSERT INTO task (task_id, status, execution_time_s) VALUES ('task-9', 'Running', 0)",
                [],
            )
            .expect("seed");
        }

        let sink = RelationalSink::new(&db);
        sink.persist("task-9", &sample_result(), Duration::from_secs(3))
            .expect("persist");

        let conn = Connection::open(&db).expect("open");
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM task", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 1);
        let status: String = conn
            .query_row("SELECT status FROM task WHERE task_id = 'task-9'", [], |row| {
                row.get(0)
            })
            .expect("status");
        assert_eq!(status, "Done");
    }
}
