//! Return feature builder: derives forward returns, lagged returns, and the
//! binary label per ticker from the raw price table.

use chrono::NaiveDate;
use model_core::{ModelError, PriceTable, SeriesContext, SeriesRow, TickerSeries};

/// Trading days the forward return looks ahead.
pub const DEFAULT_LEAD: usize = 5;

/// Lag offsets for the lagged-return features.
pub const DEFAULT_LAGS: &[usize] = &[1, 2, 3, 4, 5, 7, 10, 15, 20, 30, 50];

/// A row is labeled positive when its forward return meets this threshold.
pub const DEFAULT_THRESHOLD: f64 = 0.025;

/// Build one ticker's derived return series.
///
/// Row `t` keeps `fwd = price[t+lead]/price[t] - 1` and, per lag `L`,
/// `price[t]/price[t-L] - 1`. Rows where any of these is undefined (too
/// close to either end of the series) are dropped, so the output covers
/// positions `[max_lag, n - lead)`. The label is `1` iff `fwd >= threshold`
/// (boundary inclusive). The input prices are untouched.
pub fn build_series(
    ticker: &str,
    dates: &[NaiveDate],
    prices: &[f64],
    lead: usize,
    lags: &[usize],
    threshold: f64,
) -> TickerSeries {
    let max_lag = lags.iter().copied().max().unwrap_or(0);
    let n = prices.len();
    let first = max_lag;
    let last = n.saturating_sub(lead);

    let mut rows = Vec::with_capacity(last.saturating_sub(first));
    for t in first..last {
        let fwd = prices[t + lead] / prices[t] - 1.0;
        let lag_returns: Vec<f64> = lags.iter().map(|&lag| prices[t] / prices[t - lag] - 1.0).collect();
        rows.push(SeriesRow {
            date: dates[t],
            price: prices[t],
            fwd,
            lag_returns,
            label: u8::from(fwd >= threshold),
        });
    }

    TickerSeries {
        ticker: ticker.to_string(),
        lags: lags.to_vec(),
        rows,
    }
}

/// Derive every ticker's series from the price table once, with the default
/// lead/lags/threshold, preserving column order.
pub fn build_context(table: &PriceTable) -> Result<SeriesContext, ModelError> {
    let mut all = Vec::with_capacity(table.tickers().len());
    for ticker in table.tickers() {
        let prices = table.column(ticker)?;
        all.push(build_series(
            ticker,
            table.dates(),
            &prices,
            DEFAULT_LEAD,
            DEFAULT_LAGS,
            DEFAULT_THRESHOLD,
        ));
    }
    Ok(SeriesContext::new(all))
}
