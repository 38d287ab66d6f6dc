//! Portfolio return aggregator: turns holdout prediction frames into a
//! compounded 5-lane staggered-entry equity curve.

use chrono::NaiveDate;
use model_core::{
    EquityCurve, ModelError, PredictionFrame, SeriesContext, INITIAL_CAPITAL, LANE_COUNT,
};
use tracing::debug;

/// Positional row of the derived series used to decide whether a ticker's
/// price history is trending up enough to trade.
///
/// TODO: replace with a start/end comparison over an explicit date range —
/// a fixed row index silently measures a different era whenever the input
/// table's history length changes.
pub const INCLUSION_REFERENCE_ROW: usize = 1000;

/// Ticker-inclusion heuristic: trade a ticker only when its price at the
/// fixed reference row is below its final price. Tickers whose series do not
/// reach the reference row are excluded.
pub fn ticker_qualifies(ctx: &SeriesContext, ticker: &str) -> Result<bool, ModelError> {
    let series = ctx.get(ticker)?;
    let reference = series.rows.get(INCLUSION_REFERENCE_ROW);
    let last = series.rows.last();
    Ok(match (reference, last) {
        (Some(r), Some(l)) => r.price < l.price,
        _ => false,
    })
}

/// Round-trip return net of a flat per-share commission on both sides:
/// buy at `entry + c`, sell at `exit - c`.
pub fn commission_adjusted_return(entry: f64, exit: f64, commission: f64) -> f64 {
    (exit - commission) / (entry + commission) - 1.0
}

/// Aggregate holdout predictions into the compounded equity curve.
///
/// Per frame (one evaluation window each, in chronological order), the
/// per-ticker forward returns are recomputed net of commission from the
/// underlying prices; non-qualifying tickers' cells become missing. The
/// daily gross multiplier is the row mean (missing as 0) plus 1, exactly as
/// the prediction frame's own `avg`.
///
/// Capital starts as 5 lanes of 20. On day `i`, lane `i % 5` is multiplied
/// by that day's gross multiplier — only the lane entering a fresh 5-day
/// trade moves. The full lane snapshot is recorded daily, the snapshot
/// series is then shifted forward 5 rows (a day's realized total only
/// becomes available when its trades close) with the leading gap filled at
/// the initial per-lane 20, and the equity curve is the row-wise lane sum.
pub fn aggregate(
    ctx: &SeriesContext,
    frames: &[PredictionFrame],
    commission: f64,
) -> Result<EquityCurve, ModelError> {
    let mut dates: Vec<NaiveDate> = Vec::new();
    let mut multipliers: Vec<f64> = Vec::new();

    for frame in frames {
        let tickers: Vec<&String> = frame.tickers().collect();
        let mut qualifies = Vec::with_capacity(tickers.len());
        for ticker in &tickers {
            qualifies.push(ticker_qualifies(ctx, ticker)?);
        }

        for (i, &date) in frame.dates().iter().enumerate() {
            let mut sum = 0.0;
            for (ticker, &ok) in tickers.iter().zip(&qualifies) {
                if !ok {
                    continue;
                }
                let cell = frame
                    .column(ticker)
                    .and_then(|col| col[i])
                    .and_then(|_| ctx.get(ticker).ok()?.row_by_date(date));
                if let Some(row) = cell {
                    let entry = row.price;
                    let exit = row.price * (1.0 + row.fwd);
                    sum += commission_adjusted_return(entry, exit, commission);
                }
            }
            let mean = if tickers.is_empty() {
                0.0
            } else {
                sum / tickers.len() as f64
            };
            dates.push(date);
            multipliers.push(mean + 1.0);
        }
    }

    let per_lane = INITIAL_CAPITAL / LANE_COUNT as f64;
    let mut lanes = [per_lane; LANE_COUNT];
    let mut snapshots: Vec<[f64; LANE_COUNT]> = Vec::with_capacity(multipliers.len());
    for (i, &mult) in multipliers.iter().enumerate() {
        lanes[i % LANE_COUNT] *= mult;
        snapshots.push(lanes);
    }

    // Shift the snapshot series forward by the holding period, filling the
    // leading rows with the untouched initial lane capital.
    let shifted: Vec<[f64; LANE_COUNT]> = (0..snapshots.len())
        .map(|i| {
            if i < LANE_COUNT {
                [per_lane; LANE_COUNT]
            } else {
                snapshots[i - LANE_COUNT]
            }
        })
        .collect();
    let total: Vec<f64> = shifted.iter().map(|l| l.iter().sum()).collect();

    debug!(
        days = total.len(),
        final_value = total.last().copied().unwrap_or(INITIAL_CAPITAL),
        "aggregated equity curve"
    );

    Ok(EquityCurve {
        dates,
        lanes: shifted,
        total,
    })
}

/// Plain compounded portfolio return of the curve.
pub fn portfolio_return(curve: &EquityCurve) -> f64 {
    curve.final_value() / curve.initial_value() - 1.0
}

/// Sign-flipped return for minimization (`1 - final/initial`). The single
/// place the minimization convention lives.
pub fn negated_return(curve: &EquityCurve) -> f64 {
    -portfolio_return(curve)
}
