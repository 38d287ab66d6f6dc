//! Whole-run orchestration: per evaluation window, search hyperparameters
//! for every ticker in the universe, evaluate the holdout, then aggregate
//! every window's predictions into one equity curve.

use model_core::{EquityCurve, HyperparamConfig, ModelError, PredictionFrame, PriceTable};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::aggregate::{aggregate, negated_return, portfolio_return};
use crate::evaluate::{evaluate_per_ticker, HOLDOUT_SIZE};
use crate::features::build_context;
use crate::search::{default_search_space, search, DEFAULT_MAX_EVALS};

/// Knobs for one experiment run.
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    /// Universe size: the first N tickers of the price table, positionally.
    pub ticks_to_use: usize,
    /// First evaluation ceiling. Each window's holdout is `[upto+100, upto+200)`.
    pub first_upto: usize,
    /// Windows are spaced by the holdout width so holdouts tile contiguously.
    pub num_windows: usize,
    /// TPE evaluation budget per (ticker, window) pair.
    pub max_evals: usize,
    /// Flat per-share commission applied on both sides of each round trip.
    pub commission: f64,
    pub seed: u64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            ticks_to_use: 20,
            first_upto: 1500,
            num_windows: 4,
            max_evals: DEFAULT_MAX_EVALS,
            commission: 0.0,
            seed: 42,
        }
    }
}

/// Search quality of one evaluation window.
#[derive(Debug, Clone, Serialize)]
pub struct WindowSummary {
    pub upto: usize,
    /// Mean best CV loss (negated MCC) across the universe.
    pub mean_cv_loss: f64,
}

/// Final outcome of an experiment run.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentReport {
    pub ticks_to_use: usize,
    pub windows: Vec<WindowSummary>,
    pub equity: EquityCurve,
    pub final_equity: f64,
    /// Plain compounded return, percent.
    pub return_pct: f64,
    /// The same return under the minimization sign convention.
    pub negated_return: f64,
}

/// Run the full Model E experiment over a loaded price table.
pub fn run_experiment(
    table: &PriceTable,
    config: &ExperimentConfig,
) -> Result<ExperimentReport, ModelError> {
    let ctx = build_context(table)?;
    let universe: Vec<String> = ctx.first_n(config.ticks_to_use).to_vec();
    if universe.len() < config.ticks_to_use {
        warn!(
            requested = config.ticks_to_use,
            available = universe.len(),
            "price table has fewer tickers than requested"
        );
    }

    let mut frames: Vec<PredictionFrame> = Vec::with_capacity(config.num_windows);
    let mut windows = Vec::with_capacity(config.num_windows);

    for window in 0..config.num_windows {
        let upto = config.first_upto + window * HOLDOUT_SIZE;
        let space = default_search_space(upto);
        info!(window, upto, tickers = universe.len(), "searching window");

        // Per-ticker searches share only the immutable context, so they run
        // in parallel; a derived per-(ticker, window) seed keeps the run
        // reproducible regardless of scheduling.
        let outcomes: Vec<_> = universe
            .par_iter()
            .enumerate()
            .map(|(i, ticker)| {
                let seed = config
                    .seed
                    .wrapping_add(((window as u64) << 32) | i as u64);
                search(&ctx, ticker, upto, &space, config.max_evals, seed)
            })
            .collect::<Result<_, ModelError>>()?;

        let mean_cv_loss = outcomes.iter().map(|o| o.loss).sum::<f64>()
            / outcomes.len().max(1) as f64;
        info!(window, upto, mean_cv_loss, "window search complete");

        let configs: Vec<HyperparamConfig> =
            outcomes.into_iter().map(|o| o.config).collect();
        frames.push(evaluate_per_ticker(&ctx, &configs, upto)?);
        windows.push(WindowSummary { upto, mean_cv_loss });
    }

    let equity = aggregate(&ctx, &frames, config.commission)?;
    let return_pct = portfolio_return(&equity) * 100.0;
    info!(
        final_equity = equity.final_value(),
        return_pct, "experiment complete"
    );

    Ok(ExperimentReport {
        ticks_to_use: config.ticks_to_use,
        windows,
        final_equity: equity.final_value(),
        return_pct,
        negated_return: negated_return(&equity),
        equity,
    })
}
