use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unknown ticker: {0}")]
    UnknownTicker(String),

    #[error("Missing hyperparameter: {0}")]
    MissingParam(String),

    #[error("Search error: {0}")]
    SearchError(String),
}
