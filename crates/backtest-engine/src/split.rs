//! Walk-forward splitter: positional train/test carving of a derived series.

use model_core::{ModelError, TickerSeries};

/// Default train window length in rows.
pub const DEFAULT_TRAIN_SIZE: usize = 1000;

/// Default test window length in rows.
pub const DEFAULT_TEST_SIZE: usize = 100;

/// Train/test features and labels carved around one split point.
#[derive(Debug, Clone)]
pub struct SplitSets {
    pub train_features: Vec<Vec<f64>>,
    pub test_features: Vec<Vec<f64>>,
    pub train_labels: Vec<u8>,
    pub test_labels: Vec<u8>,
}

/// Carve `[split_point - train_size, split_point)` as train and
/// `[split_point, split_point + test_size)` as test.
///
/// Features are the lagged returns only; raw price, forward return, and the
/// label never leak into the feature matrix. Every test row sits strictly
/// after every train row.
///
/// This variant is deliberately unchecked: it runs inside the search hot
/// loop, so out-of-range windows clamp to short or empty slices instead of
/// failing. Callers own the `split_point >= train_size` precondition; use
/// [`split_checked`] when that guarantee is not in hand.
pub fn split(
    series: &TickerSeries,
    split_point: usize,
    train_size: usize,
    test_size: usize,
) -> SplitSets {
    let n = series.rows.len();
    let train_start = split_point.saturating_sub(train_size);
    let train_end = split_point.min(n);
    let test_start = train_end;
    let test_end = (split_point + test_size).min(n);

    let train = &series.rows[train_start.min(n)..train_end];
    let test = &series.rows[test_start..test_end];

    SplitSets {
        train_features: train.iter().map(|r| r.lag_returns.clone()).collect(),
        test_features: test.iter().map(|r| r.lag_returns.clone()).collect(),
        train_labels: train.iter().map(|r| r.label).collect(),
        test_labels: test.iter().map(|r| r.label).collect(),
    }
}

/// Checked variant of [`split`] for defensive callers: rejects windows the
/// series cannot fully supply instead of clamping.
pub fn split_checked(
    series: &TickerSeries,
    split_point: usize,
    train_size: usize,
    test_size: usize,
) -> Result<SplitSets, ModelError> {
    let n = series.rows.len();
    if split_point < train_size {
        return Err(ModelError::InsufficientData(format!(
            "split point {} cannot supply {} training rows",
            split_point, train_size
        )));
    }
    if split_point + test_size > n {
        return Err(ModelError::InsufficientData(format!(
            "test window [{}, {}) exceeds series length {}",
            split_point,
            split_point + test_size,
            n
        )));
    }
    Ok(split(series, split_point, train_size, test_size))
}
