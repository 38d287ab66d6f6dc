//! Hyperparameter search driver: a thin wrapper binding one (ticker, upto)
//! pair to the TPE optimizer over the CV objective.

use model_core::{HyperparamConfig, ModelError, SeriesContext};
use tpe_optimizer::{minimize, Dimension, SearchSpace};
use tracing::debug;

use crate::objective::cv_score;
use crate::split::DEFAULT_TEST_SIZE;

/// Default evaluation budget per (ticker, upto) pair.
pub const DEFAULT_MAX_EVALS: usize = 100;

/// Best configuration found for one (ticker, upto) pair, with its CV loss.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub config: HyperparamConfig,
    pub loss: f64,
}

/// The default search space. `upto` and `test_size` ride along as constants
/// (fixed within one invocation, not free dimensions); the target ticker is
/// bound by the driver, not the space.
pub fn default_search_space(upto: usize) -> SearchSpace {
    SearchSpace::new()
        .with("train_size", Dimension::DiscreteUniform { low: 200.0, high: 1000.0 })
        .with("num_leaves", Dimension::DiscreteUniform { low: 8.0, high: 128.0 })
        .with("max_depth", Dimension::DiscreteUniform { low: 2.0, high: 12.0 })
        .with("n_estimators", Dimension::DiscreteUniform { low: 20.0, high: 300.0 })
        .with("min_child_samples", Dimension::DiscreteUniform { low: 5.0, high: 100.0 })
        .with("learning_rate", Dimension::LogUniform { low: 0.005, high: 0.3 })
        .with("sw", Dimension::LogUniform { low: 0.1, high: 10.0 })
        .with("upto", Dimension::Constant(upto as f64))
        .with("test_size", Dimension::Constant(DEFAULT_TEST_SIZE as f64))
}

/// Search for the best hyperparameters for `ticker` evaluated up to `upto`.
///
/// Delegates straight to the sequential optimizer over the raw objective
/// (coercion happens inside the objective, not here). There is no retry or
/// failure handling beyond the optimizer's own: a trial that fails for a
/// structural reason (unknown ticker, missing dimension) aborts the whole
/// search.
pub fn search(
    ctx: &SeriesContext,
    ticker: &str,
    upto: usize,
    space: &SearchSpace,
    max_evals: usize,
    seed: u64,
) -> Result<SearchOutcome, ModelError> {
    let mut failure: Option<ModelError> = None;

    let best = minimize(
        |params| {
            let config = HyperparamConfig::new(ticker, params.clone());
            match cv_score(ctx, &config) {
                Ok(loss) => loss,
                Err(err) => {
                    if failure.is_none() {
                        failure = Some(err);
                    }
                    f64::INFINITY
                }
            }
        },
        space,
        max_evals,
        seed,
    )?;

    if let Some(err) = failure {
        return Err(err);
    }

    debug!(ticker, upto, loss = best.loss, "search complete");
    Ok(SearchOutcome {
        config: HyperparamConfig::new(ticker, best.params),
        loss: best.loss,
    })
}
