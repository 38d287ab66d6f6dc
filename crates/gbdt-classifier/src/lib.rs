pub mod booster;
pub mod tree;

pub use booster::{GbdtClassifier, GbdtParams};

use model_core::ModelError;

/// A trainable binary classifier. The backtest treats the model as opaque:
/// fit on 0/1 labels (optionally per-row weighted), predict 0/1 labels.
pub trait BinaryClassifier {
    /// Train on `features` (row-major) against `labels`. `sample_weight`,
    /// when present, scales each row's contribution to the loss.
    fn fit(
        &mut self,
        features: &[Vec<f64>],
        labels: &[u8],
        sample_weight: Option<&[f64]>,
    ) -> Result<(), ModelError>;

    /// Predicted 0/1 labels for `features`.
    fn predict(&self, features: &[Vec<f64>]) -> Vec<u8>;
}
