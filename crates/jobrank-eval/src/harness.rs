//! The evaluation harness: split, train, score, aggregate, persist.
//!
//! One [`Evaluation`] run owns a working area for the duration of the run.
//! Cross-validation reuses the same partition locations fold after fold, so
//! concurrent runs against one working area are not supported.

use std::path::PathBuf;
use std::time::Instant;

use jobrank_core::{metrics, EvalError, EvalResult, EvaluationResult, UserGroundTruth, UserRankList};
use tracing::{debug, error, info, instrument};

use crate::algorithm::{AlgorithmKind, Recommender};
use crate::config::EvalConfig;
use crate::dataset::{self, EvalWorkspace};
use crate::sink::ResultSink;
use crate::split::{SplitMode, SplitStrategy};

/// Everything one evaluation run needs to know up front.
#[derive(Debug, Clone)]
pub struct EvaluationSpec {
    /// How the input dataset is partitioned.
    pub mode: SplitMode,
    /// Mode parameter: fold count for cross-validation, training percentage
    /// for a single split, ignored for custom partitions.
    pub param: usize,
    /// Algorithm under evaluation.
    pub algorithm: AlgorithmKind,
    /// Input dataset (full score file).
    pub input: PathBuf,
    /// Working-area root; also holds the config file and sink outputs.
    pub evaluation_dir: PathBuf,
    /// Task identity the result is recorded under.
    pub task_id: String,
}

/// A configured, ready-to-run evaluation.
#[derive(Debug)]
pub struct Evaluation {
    spec: EvaluationSpec,
    config: EvalConfig,
    workspace: EvalWorkspace,
}

impl Evaluation {
    /// Load configuration for `spec` and prepare the working area paths.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::InvalidConfig`] when the loaded configuration
    /// does not validate.
    pub fn new(spec: EvaluationSpec) -> EvalResult<Self> {
        let config = EvalConfig::load(&spec.evaluation_dir)?;
        config.validate()?;
        let workspace = EvalWorkspace::new(&spec.evaluation_dir);
        Ok(Self {
            spec,
            config,
            workspace,
        })
    }

    /// Effective configuration for this run.
    #[must_use]
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Working area of this run.
    #[must_use]
    pub fn workspace(&self) -> &EvalWorkspace {
        &self.workspace
    }

    /// Run the full pipeline and fan the aggregated result out to `sinks`.
    ///
    /// A failing sink is logged and skipped; the remaining sinks still
    /// receive the result. A failing split, training or scoring step aborts
    /// the whole run.
    ///
    /// # Errors
    ///
    /// Returns the first pipeline error. Sink failures do not error.
    #[instrument(
        name = "jobrank::evaluate",
        skip(self, recommender, sinks),
        fields(
            algorithm = self.spec.algorithm.as_str(),
            mode = self.spec.mode.as_str(),
            task_id = %self.spec.task_id
        )
    )]
    pub fn run(
        &self,
        recommender: &dyn Recommender,
        sinks: &[&dyn ResultSink],
    ) -> EvalResult<EvaluationResult> {
        self.workspace.ensure_layout()?;
        let started = Instant::now();
        let splitter = SplitStrategy::new(&self.workspace);

        let result = match self.spec.mode {
            SplitMode::Cross => {
                let folds = self.spec.param;
                let mut fold_results = Vec::with_capacity(folds);
                for fold in 0..folds {
                    splitter.carve_fold(&self.spec.input, fold, folds)?;
                    let fold_result = self.run_fold(recommender)?;
                    debug!(
                        target: "jobrank.harness",
                        fold,
                        fold_count = folds,
                        "scored cross-validation fold"
                    );
                    fold_results.push(fold_result);
                }
                mean_over_folds(&fold_results)?
            }
            SplitMode::Partitioning => {
                splitter.percentage_split(&self.spec.input, self.spec.param)?;
                self.run_fold(recommender)?
            }
            SplitMode::Custom => {
                splitter.custom_split(&self.spec.input)?;
                self.run_fold(recommender)?
            }
        };

        let elapsed = started.elapsed();
        for sink in sinks {
            if let Err(err) = sink.persist(&self.spec.task_id, &result, elapsed) {
                error!(
                    target: "jobrank.harness",
                    sink = sink.name(),
                    task_id = %self.spec.task_id,
                    %err,
                    "result sink failed, continuing with remaining sinks"
                );
            }
        }

        for (metric, score) in &result {
            info!(
                target: "jobrank.harness",
                metric = metric.as_str(),
                score,
                task_id = %self.spec.task_id,
            );
        }
        info!(
            target: "jobrank.harness",
            task_id = %self.spec.task_id,
            elapsed_s = elapsed.as_secs(),
            "evaluation finished"
        );
        Ok(result)
    }

    /// Train on the current partitions and score the produced result file.
    fn run_fold(&self, recommender: &dyn Recommender) -> EvalResult<EvaluationResult> {
        self.workspace.clean_result()?;
        recommender
            .train_and_emit(&self.workspace)
            .map_err(|err| EvalError::Training {
                algorithm: recommender.kind().as_str(),
                source: Box::new(err),
            })?;

        let rank_list = dataset::load_rank_list(&self.workspace.result_scores())?;
        let truth =
            dataset::load_ground_truth(&self.workspace.testing_scores(), self.config.relevant_score)?;
        Ok(score_partition(&rank_list, &truth, &self.config))
    }
}

/// Score one result partition against its ground truth.
///
/// Per-user metric values are averaged over every user present in the rank
/// list, including users with no relevant test items (their per-user values
/// are zero). An empty rank list yields all-zero metrics.
#[must_use]
pub fn score_partition(
    rank_list: &UserRankList,
    truth: &UserGroundTruth,
    config: &EvalConfig,
) -> EvaluationResult {
    let k = config.top_n;
    let mut precision = 0.0;
    let mut recall = 0.0;
    let mut f1 = 0.0;
    let mut ndcg = 0.0;
    let mut rmse = 0.0;
    let mut mrr = 0.0;
    let mut map_at_k = 0.0;
    let mut map = 0.0;

    for (user, ranking) in rank_list {
        let relevant = truth.get(user).map_or(&[][..], Vec::as_slice);
        precision += metrics::precision_at_k(ranking, relevant, k);
        recall += metrics::recall_at_k(ranking, relevant, k);
        f1 += metrics::f1(ranking, relevant);
        ndcg += metrics::ndcg_at_k(ranking, relevant, k);
        rmse += metrics::rmse(ranking, relevant);
        mrr += metrics::reciprocal_rank(ranking, relevant);
        map_at_k += metrics::average_precision_at_k(ranking, relevant, k);
        map += metrics::average_precision(ranking, relevant);
    }

    let users = rank_list.len();
    let mut result = EvaluationResult::new();
    result.insert(format!("P@{k}"), mean(precision, users));
    result.insert(format!("R@{k}"), mean(recall, users));
    result.insert("F1".to_owned(), mean(f1, users));
    result.insert(format!("NDCG@{k}"), mean(ndcg, users));
    result.insert("RMSE".to_owned(), mean(rmse, users));
    result.insert("MRR".to_owned(), mean(mrr, users));
    result.insert(format!("MAP@{k}"), mean(map_at_k, users));
    result.insert("MAP".to_owned(), mean(map, users));
    result
}

/// Average per-fold results into one result, metric by metric.
///
/// # Errors
///
/// Returns [`EvalError::FoldMismatch`] when the folds do not share an
/// identical metric key set, or when `fold_results` is empty.
pub fn mean_over_folds(fold_results: &[EvaluationResult]) -> EvalResult<EvaluationResult> {
    let Some(first) = fold_results.first() else {
        return Err(EvalError::FoldMismatch {
            detail: "no fold results to aggregate".to_owned(),
        });
    };

    let mut totals: EvaluationResult = first.keys().map(|k| (k.clone(), 0.0)).collect();
    for (index, fold) in fold_results.iter().enumerate() {
        if fold.len() != totals.len() || !fold.keys().eq(totals.keys()) {
            return Err(EvalError::FoldMismatch {
                detail: format!("fold {index} reported a different metric key set"),
            });
        }
        for (metric, score) in fold {
            if let Some(total) = totals.get_mut(metric) {
                *total += score;
            }
        }
    }

    let folds = usize_to_f64(fold_results.len());
    for total in totals.values_mut() {
        *total /= folds;
    }
    Ok(totals)
}

fn mean(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / usize_to_f64(count)
    }
}

#[allow(clippy::cast_precision_loss)]
fn usize_to_f64(value: usize) -> f64 {
    value as f64
}
