//! Out-of-sample evaluator: refits chosen configurations on the window
//! immediately preceding a holdout period and collects holdout predictions.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use gbdt_classifier::{BinaryClassifier, GbdtClassifier};
use model_core::{HyperparamConfig, ModelError, PredictionFrame, SeriesContext};

use crate::objective::{classifier_params, coerce_integer_params, sample_weights};
use crate::split::split;

/// Rows between `upto` and the start of the holdout window. Keeps the
/// holdout strictly outside the CV range `[upto-500, upto)` used for tuning,
/// so out-of-sample results are never contaminated by tuning data.
pub const HOLDOUT_OFFSET: usize = 100;

/// Holdout window length in rows.
pub const HOLDOUT_SIZE: usize = 100;

/// Fit one coerced config for its ticker and predict the holdout window at
/// `upto + 100`. Returns the window's full date range alongside the positive
/// predictions: the frame must index every holdout trading day, not just the
/// predicted ones, or downstream lane rotation loses its day alignment.
fn predict_holdout(
    ctx: &SeriesContext,
    config: &HyperparamConfig,
) -> Result<(Vec<NaiveDate>, BTreeMap<NaiveDate, f64>), ModelError> {
    let config = coerce_integer_params(config);
    let series = ctx.get(&config.ticker)?;

    let upto = config.int("upto")?;
    let train_size = config.int("train_size")?;
    let split_point = upto + HOLDOUT_OFFSET;

    let sets = split(series, split_point, train_size, HOLDOUT_SIZE);
    let weights = sample_weights(&sets.train_labels, config.float("sw")?);

    let mut model = GbdtClassifier::new(classifier_params(&config)?);
    model.fit(&sets.train_features, &sets.train_labels, Some(&weights))?;
    let predicted = model.predict(&sets.test_features);

    let test_start = split_point.min(series.rows.len());
    let test_end = (split_point + HOLDOUT_SIZE).min(series.rows.len());
    let window: Vec<NaiveDate> = series.rows[test_start..test_end]
        .iter()
        .map(|r| r.date)
        .collect();

    let mut by_date = BTreeMap::new();
    for (offset, &label) in predicted.iter().enumerate() {
        if label == 1 {
            let row = &series.rows[test_start + offset];
            by_date.insert(row.date, row.fwd);
        }
    }
    Ok((window, by_date))
}

/// Evaluate one shared configuration identically across a ticker universe.
///
/// Every ticker gets its own refit (on its own training window) but the same
/// hyperparameters. The frame indexes the union of all tickers' holdout
/// dates; tickers with no positive predictions still contribute an
/// all-missing column, so the frame's row-mean denominator is the full
/// universe.
pub fn evaluate_shared(
    ctx: &SeriesContext,
    config: &HyperparamConfig,
    upto: usize,
    universe: &[String],
) -> Result<PredictionFrame, ModelError> {
    let mut dates = BTreeSet::new();
    let mut predictions = BTreeMap::new();
    for ticker in universe {
        let mut per_ticker = config.clone();
        per_ticker.ticker = ticker.clone();
        per_ticker.set("upto", upto as f64);
        let (window, by_date) = predict_holdout(ctx, &per_ticker)?;
        dates.extend(window);
        predictions.insert(ticker.clone(), by_date);
    }
    Ok(PredictionFrame::from_predictions(dates, predictions))
}

/// Evaluate per-ticker configurations (one chosen-best config each) on the
/// holdout window at `upto + 100`.
pub fn evaluate_per_ticker(
    ctx: &SeriesContext,
    configs: &[HyperparamConfig],
    upto: usize,
) -> Result<PredictionFrame, ModelError> {
    let mut dates = BTreeSet::new();
    let mut predictions = BTreeMap::new();
    for config in configs {
        let mut bound = config.clone();
        bound.set("upto", upto as f64);
        let (window, by_date) = predict_holdout(ctx, &bound)?;
        dates.extend(window);
        predictions.insert(bound.ticker.clone(), by_date);
    }
    Ok(PredictionFrame::from_predictions(dates, predictions))
}
