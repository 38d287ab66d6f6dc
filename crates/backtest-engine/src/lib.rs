pub mod aggregate;
pub mod evaluate;
pub mod experiment;
pub mod features;
pub mod objective;
pub mod search;
pub mod split;
pub mod statistical;


pub use aggregate::{aggregate, negated_return, portfolio_return};
pub use evaluate::{evaluate_per_ticker, evaluate_shared};
pub use experiment::{run_experiment, ExperimentConfig, ExperimentReport};
pub use features::{build_context, build_series};
pub use search::{search, SearchOutcome};
