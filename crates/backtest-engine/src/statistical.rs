//! Classification-quality statistics used by the objective function.

/// Matthews correlation coefficient between true and predicted 0/1 labels.
///
/// Balanced across both classes (range [-1, 1]), which matters here because
/// positive labels are a small minority of trading days. Returns 0 when any
/// confusion-matrix margin is empty (the conventional degenerate value).
pub fn matthews_corrcoef(actual: &[u8], predicted: &[u8]) -> f64 {
    let mut tp: f64 = 0.0;
    let mut tn: f64 = 0.0;
    let mut fp: f64 = 0.0;
    let mut fne: f64 = 0.0;

    for (&a, &p) in actual.iter().zip(predicted) {
        match (a, p) {
            (1, 1) => tp += 1.0,
            (0, 0) => tn += 1.0,
            (0, 1) => fp += 1.0,
            _ => fne += 1.0,
        }
    }

    let denom = ((tp + fp) * (tp + fne) * (tn + fp) * (tn + fne)).sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    (tp * tn - fp * fne) / denom
}
