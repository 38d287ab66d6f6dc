//! data-loader: Load a wide close-price CSV and run the Model E backtest.
//!
//! Usage:
//!   cargo run -p data-loader --release -- prices.csv
//!   cargo run -p data-loader --release -- prices.csv --ticks 20 --windows 4
//!   cargo run -p data-loader --release -- prices.csv --evals 100 --commission 0.05
//!   cargo run -p data-loader --release -- prices.csv --json report.json

mod loader;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use backtest_engine::{run_experiment, ExperimentConfig};
use tracing::info;

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1).cloned())
}

fn parsed_flag<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> Result<T> {
    match flag_value(args, flag) {
        Some(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid value '{}' for {}", raw, flag)),
        None => Ok(default),
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "data_loader=info,backtest_engine=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    // Every flag takes a value, so positionals are whatever is neither a
    // flag nor the token right after one.
    let mut positional = None;
    let mut i = 0;
    while i < args.len() {
        if args[i].starts_with("--") {
            i += 2;
        } else {
            positional = Some(args[i].clone());
            i += 1;
        }
    }
    let data_path: PathBuf = match positional {
        Some(p) => PathBuf::from(p),
        None => bail!("usage: data-loader <prices.csv> [--ticks N] [--windows N] [--evals N] [--commission X] [--seed N] [--first-upto N] [--json FILE]"),
    };

    let defaults = ExperimentConfig::default();
    let config = ExperimentConfig {
        ticks_to_use: parsed_flag(&args, "--ticks", defaults.ticks_to_use)?,
        first_upto: parsed_flag(&args, "--first-upto", defaults.first_upto)?,
        num_windows: parsed_flag(&args, "--windows", defaults.num_windows)?,
        max_evals: parsed_flag(&args, "--evals", defaults.max_evals)?,
        commission: parsed_flag(&args, "--commission", defaults.commission)?,
        seed: parsed_flag(&args, "--seed", defaults.seed)?,
    };

    info!(path = %data_path.display(), "loading price table");
    let table = loader::load_price_table(&data_path)?;
    info!(
        days = table.len(),
        tickers = table.tickers().len(),
        "price table loaded"
    );

    let report = run_experiment(&table, &config).context("running experiment")?;

    if let Some(json_path) = flag_value(&args, "--json") {
        let serialized =
            serde_json::to_string_pretty(&report).context("serializing report")?;
        std::fs::write(Path::new(&json_path), serialized)
            .with_context(|| format!("writing {}", json_path))?;
        info!(path = json_path, "report written");
    }

    for window in &report.windows {
        println!(
            "window upto {}: mean CV loss {:.4}",
            window.upto, window.mean_cv_loss
        );
    }
    println!(
        "Average return for Model E{}: {:.2} %",
        report.ticks_to_use, report.return_pct
    );

    Ok(())
}
