//! Recommenders: the producers of the result partition.
//!
//! The harness only knows the [`Recommender`] trait. The two concrete
//! flavours here cover the evaluation setups we run: replaying a
//! precomputed score artifact for a single algorithm, and blending two such
//! artifacts into a hybrid ranking.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::str::FromStr;

use jobrank_core::{EvalError, EvalResult};
use jobrank_fusion::{blend_user_scores, select_top_n};
use tracing::{debug, instrument};

use crate::dataset::{self, EvalWorkspace, ScoreRecord};

/// Which recommendation algorithm produced (or produces) a result partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmKind {
    /// Collaborative filtering.
    Cf,
    /// Content-based.
    Cb,
    /// Hybrid blend of the two.
    Hb,
}

impl AlgorithmKind {
    /// Stable lowercase name, used on the command line and in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cf => "cf",
            Self::Cb => "cb",
            Self::Hb => "hb",
        }
    }
}

impl FromStr for AlgorithmKind {
    type Err = EvalError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "cf" => Ok(Self::Cf),
            "cb" => Ok(Self::Cb),
            "hb" => Ok(Self::Hb),
            other => Err(EvalError::InvalidConfig {
                field: "algorithm".to_owned(),
                value: other.to_owned(),
                reason: "expected one of: cf, cb, hb".to_owned(),
            }),
        }
    }
}

/// A training step that fills the result partition of a workspace.
pub trait Recommender {
    /// Algorithm identity, used for error reporting and logging.
    fn kind(&self) -> AlgorithmKind;

    /// Train on the workspace's training partition and emit the result
    /// partition.
    ///
    /// # Errors
    ///
    /// Returns any error from training or from writing the result file.
    fn train_and_emit(&self, workspace: &EvalWorkspace) -> EvalResult<()>;
}

/// Per-user predicted scores, as read from one algorithm's artifact.
pub trait ScoreProvider {
    /// Users the provider has predictions for.
    fn user_ids(&self) -> Vec<&str>;

    /// Predicted item scores for `user`, if any.
    fn scores_for(&self, user: &str) -> Option<&HashMap<String, f64>>;
}

/// Replays a precomputed score artifact as the result partition.
///
/// The artifact is parsed on the way through, so a malformed file fails the
/// run instead of silently producing an unreadable result.
#[derive(Debug)]
pub struct PrecomputedRecommender {
    algorithm: AlgorithmKind,
    source: PathBuf,
}

impl PrecomputedRecommender {
    /// Creates a recommender replaying `source`.
    #[must_use]
    pub fn new(algorithm: AlgorithmKind, source: impl Into<PathBuf>) -> Self {
        Self {
            algorithm,
            source: source.into(),
        }
    }
}

impl Recommender for PrecomputedRecommender {
    fn kind(&self) -> AlgorithmKind {
        self.algorithm
    }

    #[instrument(
        name = "jobrank::train",
        level = "debug",
        skip(self, workspace),
        fields(algorithm = self.algorithm.as_str())
    )]
    fn train_and_emit(&self, workspace: &EvalWorkspace) -> EvalResult<()> {
        let records = dataset::read_score_records(&self.source)?;
        debug!(
            target: "jobrank.algorithm",
            algorithm = self.algorithm.as_str(),
            rows = records.len(),
            "replaying precomputed score artifact"
        );
        dataset::write_score_records(&workspace.result_scores(), &records)
    }
}

/// [`ScoreProvider`] backed by a score file, fully loaded at construction.
#[derive(Debug)]
pub struct PartitionScoreProvider {
    scores: HashMap<String, HashMap<String, f64>>,
}

impl PartitionScoreProvider {
    /// Load all predictions from a score file.
    ///
    /// # Errors
    ///
    /// Propagates dataset read and parse errors.
    pub fn load(path: impl Into<PathBuf>) -> EvalResult<Self> {
        let path = path.into();
        let mut scores: HashMap<String, HashMap<String, f64>> = HashMap::new();
        for record in dataset::read_score_records(&path)? {
            scores
                .entry(record.user_id)
                .or_default()
                .insert(record.item_id, record.score);
        }
        Ok(Self { scores })
    }
}

impl ScoreProvider for PartitionScoreProvider {
    fn user_ids(&self) -> Vec<&str> {
        self.scores.keys().map(String::as_str).collect()
    }

    fn scores_for(&self, user: &str) -> Option<&HashMap<String, f64>> {
        self.scores.get(user)
    }
}

/// Blends a collaborative and a content-based score source into a bounded
/// per-user top-N ranking.
pub struct HybridRecommender {
    cf: Box<dyn ScoreProvider>,
    cb: Box<dyn ScoreProvider>,
    top_n: usize,
    alpha: f64,
}

impl HybridRecommender {
    /// Creates a hybrid recommender over the two score sources.
    #[must_use]
    pub fn new(cf: Box<dyn ScoreProvider>, cb: Box<dyn ScoreProvider>, top_n: usize, alpha: f64) -> Self {
        Self { cf, cb, top_n, alpha }
    }
}

impl Recommender for HybridRecommender {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Hb
    }

    #[instrument(
        name = "jobrank::train",
        level = "debug",
        skip(self, workspace),
        fields(algorithm = "hb", top_n = self.top_n, alpha = self.alpha)
    )]
    fn train_and_emit(&self, workspace: &EvalWorkspace) -> EvalResult<()> {
        let empty = HashMap::new();

        // Union of users across both sources, in a stable order.
        let users: BTreeSet<&str> = self
            .cf
            .user_ids()
            .into_iter()
            .chain(self.cb.user_ids())
            .collect();

        let mut records = Vec::new();
        for user in users {
            let cf = self.cf.scores_for(user).unwrap_or(&empty);
            let cb = self.cb.scores_for(user).unwrap_or(&empty);
            let blended = blend_user_scores(cf, cb, self.alpha);
            for item in select_top_n(&blended, self.top_n) {
                records.push(ScoreRecord::new(user, item.item_id, item.score));
            }
        }
        debug!(
            target: "jobrank.algorithm",
            algorithm = "hb",
            rows = records.len(),
            "emitted blended rankings"
        );
        dataset::write_score_records(&workspace.result_scores(), &records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn provider(rows: &[(&str, &str, f64)]) -> PartitionScoreProvider {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Score.txt");
        let body: String = rows
            .iter()
            .map(|(u, i, s)| format!("{u}\t{i}\t{s}\n"))
            .collect();
        fs::write(&path, body).expect("write");
        PartitionScoreProvider::load(&path).expect("load")
    }

    fn setup() -> (tempfile::TempDir, EvalWorkspace) {
        let dir = tempfile::tempdir().expect("tempdir");
        let workspace = EvalWorkspace::new(dir.path());
        workspace.ensure_layout().expect("layout");
        (dir, workspace)
    }

    #[test]
    fn parses_algorithm_kinds() {
        assert_eq!("CF".parse::<AlgorithmKind>().unwrap(), AlgorithmKind::Cf);
        assert_eq!("hb".parse::<AlgorithmKind>().unwrap(), AlgorithmKind::Hb);
        assert!("svd".parse::<AlgorithmKind>().is_err());
    }

    #[test]
    fn precomputed_recommender_replays_artifact() {
        let (dir, workspace) = setup();
        let source = dir.path().join("cf.txt");
        fs::write(&source, "u1\tjob-1\t4.5\n").expect("write");

        let recommender = PrecomputedRecommender::new(AlgorithmKind::Cf, &source);
        recommender.train_and_emit(&workspace).expect("emit");

        let result = dataset::read_score_records(&workspace.result_scores()).expect("read");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].user_id, "u1");
    }

    #[test]
    fn precomputed_recommender_rejects_malformed_artifact() {
        let (dir, workspace) = setup();
        let source = dir.path().join("cf.txt");
        fs::write(&source, "not-a-valid-row\n").expect("write");

        let recommender = PrecomputedRecommender::new(AlgorithmKind::Cf, &source);
        assert!(recommender.train_and_emit(&workspace).is_err());
    }

    #[test]
    fn score_provider_groups_by_user() {
        let provider = provider(&[("u1", "a", 1.0), ("u1", "b", 2.0), ("u2", "c", 3.0)]);
        assert_eq!(provider.scores_for("u1").unwrap().len(), 2);
        assert!((provider.scores_for("u2").unwrap()["c"] - 3.0).abs() < f64::EPSILON);
        assert!(provider.scores_for("u3").is_none());
    }

    #[test]
    fn hybrid_emits_top_n_rows_per_user() {
        let (_dir, workspace) = setup();
        let cf = provider(&[("u1", "a", 1.0), ("u1", "b", 0.5), ("u1", "c", 0.2)]);
        let cb = provider(&[("u1", "a", 0.0), ("u1", "b", 1.0), ("u1", "c", 0.9)]);

        let recommender = HybridRecommender::new(Box::new(cf), Box::new(cb), 2, 0.5);
        recommender.train_and_emit(&workspace).expect("emit");

        let result = dataset::read_score_records(&workspace.result_scores()).expect("read");
        let ids: Vec<&str> = result.iter().map(|r| r.item_id.as_str()).collect();
        // Blends: a=0.5, b=0.75, c=0.55; top 2 are b then c.
        assert_eq!(ids, ["b", "c"]);
    }

    #[test]
    fn hybrid_covers_the_user_union() {
        let (_dir, workspace) = setup();
        let cf = provider(&[("cf-only", "a", 1.0)]);
        let cb = provider(&[("cb-only", "b", 1.0)]);

        let recommender = HybridRecommender::new(Box::new(cf), Box::new(cb), 5, 0.5);
        recommender.train_and_emit(&workspace).expect("emit");

        let result = dataset::read_score_records(&workspace.result_scores()).expect("read");
        let users: Vec<&str> = result.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(users, ["cb-only", "cf-only"]);
    }
}
