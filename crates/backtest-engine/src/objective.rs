//! Per-ticker cross-validation objective: the quantity the hyperparameter
//! search minimizes.

use gbdt_classifier::{BinaryClassifier, GbdtClassifier, GbdtParams};
use model_core::{HyperparamConfig, ModelError, SeriesContext, INTEGER_PARAM_KEYS};

use crate::split::{split, DEFAULT_TEST_SIZE};
use crate::statistical::matthews_corrcoef;

/// Span of rolling validation split points below `upto`.
pub const CV_SPAN: usize = 500;

/// Step between consecutive validation split points.
pub const CV_STEP: usize = 100;

/// Truncate the integer-designated parameters to whole numbers.
///
/// The optimizer samples every dimension as a float, including discrete
/// ones, so configs are coerced at each point of use. Idempotent; keys
/// outside [`INTEGER_PARAM_KEYS`] pass through bit-for-bit.
pub fn coerce_integer_params(config: &HyperparamConfig) -> HyperparamConfig {
    let mut coerced = config.clone();
    for &key in INTEGER_PARAM_KEYS {
        if let Some(value) = coerced.get(key) {
            coerced.set(key, value.trunc());
        }
    }
    coerced
}

/// Per-row training weights: `sw` for negative-labeled rows, 1 for positive,
/// in original row order. `sw` is unconstrained — below 1 it down-weights
/// the majority negative class, above 1 it up-weights it.
pub fn sample_weights(labels: &[u8], sw: f64) -> Vec<f64> {
    labels
        .iter()
        .map(|&y| if y == 0 { sw } else { 1.0 })
        .collect()
}

/// Classifier hyperparameters from an already-coerced config.
pub fn classifier_params(config: &HyperparamConfig) -> Result<GbdtParams, ModelError> {
    Ok(GbdtParams {
        num_leaves: config.int("num_leaves")?,
        max_depth: config.int("max_depth")?,
        learning_rate: config.float("learning_rate")?,
        n_estimators: config.int("n_estimators")?,
        min_child_samples: config.int("min_child_samples")?,
    })
}

/// Walk-forward CV score for one hyperparameter configuration, to be
/// minimized.
///
/// Refits one classifier at each of the five rolling split points
/// `upto - 500, upto - 400, ..., upto - 100` (train window per the config's
/// `train_size`), scores each holdout with the Matthews correlation
/// coefficient, and returns the negated mean so that minimizing the
/// objective maximizes predictive quality.
pub fn cv_score(ctx: &SeriesContext, config: &HyperparamConfig) -> Result<f64, ModelError> {
    let config = coerce_integer_params(config);
    let series = ctx.get(&config.ticker)?;

    let upto = config.int("upto")?;
    let train_size = config.int("train_size")?;
    let test_size = config
        .get("test_size")
        .map(|v| v as usize)
        .unwrap_or(DEFAULT_TEST_SIZE);
    let sw = config.float("sw")?;

    let mut model = GbdtClassifier::new(classifier_params(&config)?);
    let mut total = 0.0;
    let mut points = 0;

    let mut offset = CV_SPAN;
    while offset >= CV_STEP {
        let split_point = upto.saturating_sub(offset);
        let sets = split(series, split_point, train_size, test_size);

        let weights = sample_weights(&sets.train_labels, sw);
        model.fit(&sets.train_features, &sets.train_labels, Some(&weights))?;
        let predicted = model.predict(&sets.test_features);

        total += matthews_corrcoef(&sets.test_labels, &predicted);
        points += 1;
        offset -= CV_STEP;
    }

    Ok(-(total / points as f64))
}
