//! CSV price-table loader.
//!
//! Expected layout: a header row of `date` followed by one ticker symbol per
//! column, then one row per trading day with the date in the first cell and
//! closing prices in the rest. Blank cells are rejected; this pipeline
//! assumes a pre-aligned table.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use model_core::PriceTable;

fn parse_date(cell: &str) -> Result<NaiveDate> {
    // ISO first, then the US-style export format some vendors ship.
    NaiveDate::parse_from_str(cell, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(cell, "%m/%d/%Y"))
        .with_context(|| format!("unparseable date cell '{}'", cell))
}

/// Load a wide close-price CSV into a validated [`PriceTable`].
pub fn load_price_table(path: &Path) -> Result<PriceTable> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening price table {}", path.display()))?;

    let headers = reader.headers().context("reading header row")?;
    if headers.len() < 2 {
        bail!("price table needs a date column and at least one ticker column");
    }
    let tickers: Vec<String> = headers.iter().skip(1).map(|h| h.trim().to_string()).collect();

    let mut dates = Vec::new();
    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading data row {}", line + 1))?;
        if record.len() != tickers.len() + 1 {
            bail!(
                "row {} has {} cells, expected {}",
                line + 1,
                record.len(),
                tickers.len() + 1
            );
        }

        dates.push(parse_date(record[0].trim())?);
        let prices: Vec<f64> = record
            .iter()
            .skip(1)
            .map(|cell| {
                cell.trim()
                    .parse::<f64>()
                    .with_context(|| format!("bad price '{}' on row {}", cell, line + 1))
            })
            .collect::<Result<_>>()?;
        rows.push(prices);
    }

    PriceTable::new(dates, tickers, rows).context("validating price table")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_loads_wide_table_in_column_order() {
        let file = write_csv(
            "date,MMM,AAA\n\
             2020-01-02,10.0,1.5\n\
             2020-01-03,10.5,1.6\n",
        );
        let table = load_price_table(file.path()).unwrap();

        // Column order comes from the file, not from sorting.
        assert_eq!(table.tickers(), &["MMM".to_string(), "AAA".to_string()]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.column("AAA").unwrap(), vec![1.5, 1.6]);
    }

    #[test]
    fn test_accepts_us_style_dates() {
        let file = write_csv("date,AAA\n01/02/2020,1.0\n01/03/2020,2.0\n");
        let table = load_price_table(file.path()).unwrap();
        assert_eq!(table.dates()[0], "2020-01-02".parse().unwrap());
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let file = write_csv("date,AAA,BBB\n2020-01-02,1.0\n");
        assert!(load_price_table(file.path()).is_err());
    }

    #[test]
    fn test_rejects_unsorted_dates() {
        let file = write_csv("date,AAA\n2020-01-03,1.0\n2020-01-02,2.0\n");
        assert!(load_price_table(file.path()).is_err());
    }

    #[test]
    fn test_rejects_non_numeric_price() {
        let file = write_csv("date,AAA\n2020-01-02,n/a\n");
        assert!(load_price_table(file.path()).is_err());
    }
}
