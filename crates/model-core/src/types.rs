use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Wide table of daily closing prices: one row per trading day, one column
/// per ticker. Loaded once, immutable thereafter.
#[derive(Debug, Clone)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    tickers: Vec<String>,
    /// rows[i][j] = close of tickers[j] on dates[i].
    rows: Vec<Vec<f64>>,
}

impl PriceTable {
    /// Build a price table, validating shape and date ordering.
    ///
    /// Dates must be strictly increasing (only trading days present, so gaps
    /// between calendar days are expected and fine).
    pub fn new(
        dates: Vec<NaiveDate>,
        tickers: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, ModelError> {
        if dates.len() != rows.len() {
            return Err(ModelError::InvalidData(format!(
                "{} dates but {} price rows",
                dates.len(),
                rows.len()
            )));
        }
        for window in dates.windows(2) {
            if window[1] <= window[0] {
                return Err(ModelError::InvalidData(format!(
                    "dates not strictly increasing at {}",
                    window[1]
                )));
            }
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != tickers.len() {
                return Err(ModelError::InvalidData(format!(
                    "row {} has {} cells for {} tickers",
                    i,
                    row.len(),
                    tickers.len()
                )));
            }
        }
        Ok(Self {
            dates,
            tickers,
            rows,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Closing-price column for one ticker, in date order.
    pub fn column(&self, ticker: &str) -> Result<Vec<f64>, ModelError> {
        let j = self
            .tickers
            .iter()
            .position(|t| t == ticker)
            .ok_or_else(|| ModelError::UnknownTicker(ticker.to_string()))?;
        Ok(self.rows.iter().map(|row| row[j]).collect())
    }
}

/// One derived row of a ticker's return series: close, forward return over
/// the lead window, the lagged returns used as features, and the binary
/// label (`fwd >= threshold`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesRow {
    pub date: NaiveDate,
    pub price: f64,
    pub fwd: f64,
    pub lag_returns: Vec<f64>,
    pub label: u8,
}

/// Per-ticker derived return series. Rows with any undefined lag or forward
/// value are already dropped, so every row is fully populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerSeries {
    pub ticker: String,
    /// Lag offsets matching `lag_returns` positionally.
    pub lags: Vec<usize>,
    pub rows: Vec<SeriesRow>,
}

impl TickerSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Locate a row by date (rows are date-ordered).
    pub fn row_by_date(&self, date: NaiveDate) -> Option<&SeriesRow> {
        self.rows
            .binary_search_by_key(&date, |row| row.date)
            .ok()
            .map(|i| &self.rows[i])
    }
}

/// Immutable lookup of all tickers' derived series, passed explicitly to the
/// objective function and evaluator (no ambient global state). Preserves the
/// price table's column order so "first N tickers" is well-defined.
#[derive(Debug, Clone)]
pub struct SeriesContext {
    order: Vec<String>,
    series: HashMap<String, TickerSeries>,
}

impl SeriesContext {
    pub fn new(all: Vec<TickerSeries>) -> Self {
        let order: Vec<String> = all.iter().map(|s| s.ticker.clone()).collect();
        let series = all.into_iter().map(|s| (s.ticker.clone(), s)).collect();
        Self { order, series }
    }

    pub fn get(&self, ticker: &str) -> Result<&TickerSeries, ModelError> {
        self.series
            .get(ticker)
            .ok_or_else(|| ModelError::UnknownTicker(ticker.to_string()))
    }

    /// Tickers in price-table column order.
    pub fn tickers(&self) -> &[String] {
        &self.order
    }

    /// The first `n` tickers in column order (positional universe selection).
    pub fn first_n(&self, n: usize) -> &[String] {
        &self.order[..n.min(self.order.len())]
    }
}

/// Hyperparameter keys whose sampled values are integer-valued and must be
/// truncated before use (the optimizer always yields floats).
pub const INTEGER_PARAM_KEYS: &[&str] = &[
    "train_size",
    "test_size",
    "num_leaves",
    "max_depth",
    "n_estimators",
    "min_child_samples",
    "upto",
    "ticks_to_use",
];

/// A named hyperparameter assignment for one ticker. Values are kept as
/// floats exactly as the optimizer produced them; integer coercion is applied
/// explicitly by the caller before use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HyperparamConfig {
    pub ticker: String,
    params: HashMap<String, f64>,
}

impl HyperparamConfig {
    pub fn new(ticker: impl Into<String>, params: HashMap<String, f64>) -> Self {
        Self {
            ticker: ticker.into(),
            params,
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.params.get(key).copied()
    }

    pub fn float(&self, key: &str) -> Result<f64, ModelError> {
        self.get(key)
            .ok_or_else(|| ModelError::MissingParam(key.to_string()))
    }

    /// An integer-designated parameter, as usize. Callers coerce the whole
    /// config first, so the stored float is already integral.
    pub fn int(&self, key: &str) -> Result<usize, ModelError> {
        Ok(self.float(key)? as usize)
    }

    pub fn set(&mut self, key: impl Into<String>, value: f64) {
        self.params.insert(key.into(), value);
    }

    pub fn params(&self) -> &HashMap<String, f64> {
        &self.params
    }
}

/// Per-date predicted forward returns, one column per ticker. A cell is
/// `Some` only where the model predicted the positive class for that
/// (date, ticker); otherwise the prediction is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionFrame {
    dates: Vec<NaiveDate>,
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl PredictionFrame {
    /// Assemble a frame over an explicit date index from per-ticker
    /// date→prediction maps. The row index is the sorted union of `dates`
    /// and every predicted date, so trading days on which no ticker
    /// predicted positive still keep their row (all cells missing).
    pub fn from_predictions(
        dates: impl IntoIterator<Item = NaiveDate>,
        predictions: BTreeMap<String, BTreeMap<NaiveDate, f64>>,
    ) -> Self {
        let mut date_set: BTreeSet<NaiveDate> = dates.into_iter().collect();
        date_set.extend(predictions.values().flat_map(|m| m.keys().copied()));
        let dates: Vec<NaiveDate> = date_set.into_iter().collect();

        let columns = predictions
            .into_iter()
            .map(|(ticker, by_date)| {
                let column: Vec<Option<f64>> = dates
                    .iter()
                    .map(|d| by_date.get(d).copied())
                    .collect();
                (ticker, column)
            })
            .collect();

        Self { dates, columns }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn tickers(&self) -> impl Iterator<Item = &String> {
        self.columns.keys()
    }

    pub fn column(&self, ticker: &str) -> Option<&[Option<f64>]> {
        self.columns.get(ticker).map(|c| c.as_slice())
    }

    pub fn cell(&self, date: NaiveDate, ticker: &str) -> Option<f64> {
        let i = self.dates.binary_search(&date).ok()?;
        self.columns.get(ticker).and_then(|c| c[i])
    }

    /// Daily gross multiplier: row-wise mean over tickers with missing
    /// predictions treated as 0, plus 1.
    pub fn avg(&self) -> Vec<f64> {
        let n = self.columns.len();
        self.dates
            .iter()
            .enumerate()
            .map(|(i, _)| {
                if n == 0 {
                    return 1.0;
                }
                let sum: f64 = self
                    .columns
                    .values()
                    .map(|col| col[i].unwrap_or(0.0))
                    .sum();
                sum / n as f64 + 1.0
            })
            .collect()
    }
}

/// Lane count for the staggered-entry scheme: one lane enters a fresh 5-day
/// trade each trading day.
pub const LANE_COUNT: usize = 5;

/// Total starting capital split evenly across the lanes.
pub const INITIAL_CAPITAL: f64 = 100.0;

/// Portfolio value over time from the 5-lane staggered-entry simulation.
/// `lanes[i]` is the (already shifted) per-lane snapshot on day `i`, and
/// `total[i]` is its row-wise sum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityCurve {
    pub dates: Vec<NaiveDate>,
    pub lanes: Vec<[f64; LANE_COUNT]>,
    pub total: Vec<f64>,
}

impl EquityCurve {
    pub fn initial_value(&self) -> f64 {
        INITIAL_CAPITAL
    }

    pub fn final_value(&self) -> f64 {
        self.total.last().copied().unwrap_or(INITIAL_CAPITAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_price_table_rejects_unsorted_dates() {
        let dates = vec![d("2020-01-03"), d("2020-01-02")];
        let rows = vec![vec![1.0], vec![2.0]];
        let result = PriceTable::new(dates, vec!["AAA".into()], rows);
        assert!(result.is_err());
    }

    #[test]
    fn test_price_table_column_lookup() {
        let dates = vec![d("2020-01-02"), d("2020-01-03")];
        let rows = vec![vec![1.0, 10.0], vec![2.0, 20.0]];
        let table =
            PriceTable::new(dates, vec!["AAA".into(), "BBB".into()], rows).unwrap();
        assert_eq!(table.column("BBB").unwrap(), vec![10.0, 20.0]);
        assert!(table.column("CCC").is_err());
    }

    #[test]
    fn test_prediction_frame_avg_missing_as_zero() {
        let mut predictions: BTreeMap<String, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
        predictions.insert(
            "AAA".into(),
            [(d("2020-01-02"), 0.04)].into_iter().collect(),
        );
        predictions.insert(
            "BBB".into(),
            [(d("2020-01-02"), 0.02), (d("2020-01-03"), 0.06)]
                .into_iter()
                .collect(),
        );
        let index = vec![d("2020-01-02"), d("2020-01-03"), d("2020-01-06")];
        let frame = PredictionFrame::from_predictions(index, predictions);

        let avg = frame.avg();
        // Day 1: (0.04 + 0.02) / 2 + 1; day 2: (0 + 0.06) / 2 + 1.
        assert!((avg[0] - 1.03).abs() < 1e-12);
        assert!((avg[1] - 1.03).abs() < 1e-12);
        // Day 3 is in the index but prediction-free: the row survives with a
        // flat multiplier.
        assert_eq!(frame.dates().len(), 3);
        assert!((avg[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_series_row_by_date() {
        let series = TickerSeries {
            ticker: "AAA".into(),
            lags: vec![1],
            rows: vec![
                SeriesRow {
                    date: d("2020-01-02"),
                    price: 10.0,
                    fwd: 0.01,
                    lag_returns: vec![0.0],
                    label: 0,
                },
                SeriesRow {
                    date: d("2020-01-06"),
                    price: 11.0,
                    fwd: 0.03,
                    lag_returns: vec![0.1],
                    label: 1,
                },
            ],
        };
        assert_eq!(series.row_by_date(d("2020-01-06")).unwrap().price, 11.0);
        assert!(series.row_by_date(d("2020-01-05")).is_none());
    }
}
