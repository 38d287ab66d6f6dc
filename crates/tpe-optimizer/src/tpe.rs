//! Tree-structured Parzen Estimator minimizer.
//!
//! Sequential model-based search: after a random startup phase, completed
//! trials are split into a "good" head (lowest losses) and a "bad" tail, a
//! Parzen density is fit over each per dimension, and the next point is the
//! candidate maximizing the good/bad density ratio. Dimensions are modeled
//! independently, log-uniform ones in log space.

use std::collections::HashMap;

use model_core::ModelError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::{Continuous, Normal};
use tracing::debug;

use crate::space::{Dimension, SearchSpace};

/// Random trials before the Parzen model kicks in.
const STARTUP_TRIALS: usize = 20;
/// Fraction of completed trials treated as "good".
const GAMMA: f64 = 0.25;
/// Candidates drawn from the good density per dimension each round.
const CANDIDATES: usize = 24;

/// One completed evaluation.
#[derive(Debug, Clone)]
pub struct Trial {
    pub params: HashMap<String, f64>,
    pub loss: f64,
}

/// Minimize `objective` over `space` with an evaluation budget.
///
/// Returns the best trial found. All sampled values are floats, including
/// discrete dimensions (rounded to whole numbers but not cast). A failed or
/// NaN trial is kept with loss +inf, which keeps it out of the good set but
/// does not abort the search.
pub fn minimize<F>(
    mut objective: F,
    space: &SearchSpace,
    max_evals: usize,
    seed: u64,
) -> Result<Trial, ModelError>
where
    F: FnMut(&HashMap<String, f64>) -> f64,
{
    if space.is_empty() {
        return Err(ModelError::SearchError("empty search space".to_string()));
    }
    if max_evals == 0 {
        return Err(ModelError::SearchError(
            "max_evals must be positive".to_string(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut trials: Vec<Trial> = Vec::with_capacity(max_evals);

    for eval in 0..max_evals {
        let params = if eval < STARTUP_TRIALS.min(max_evals) {
            sample_uniform(space, &mut rng)
        } else {
            sample_tpe(space, &trials, &mut rng)?
        };

        let raw = objective(&params);
        let loss = if raw.is_nan() { f64::INFINITY } else { raw };
        debug!(eval, loss, "trial complete");
        trials.push(Trial { params, loss });
    }

    trials
        .into_iter()
        .min_by(|a, b| a.loss.partial_cmp(&b.loss).unwrap_or(std::cmp::Ordering::Equal))
        .ok_or_else(|| ModelError::SearchError("no completed trials".to_string()))
}

/// Draw one assignment uniformly at random (startup phase).
fn sample_uniform(space: &SearchSpace, rng: &mut StdRng) -> HashMap<String, f64> {
    space
        .dimensions()
        .iter()
        .map(|(name, dim)| {
            let value = match dim {
                Dimension::Constant(v) => *v,
                Dimension::DiscreteUniform { low, high } => {
                    rng.gen_range(*low..=*high).round()
                }
                Dimension::LogUniform { low, high } => {
                    let u = rng.gen_range(low.ln()..=high.ln());
                    u.exp()
                }
            };
            (name.clone(), value)
        })
        .collect()
}

/// Draw one assignment from the Parzen model of past trials.
fn sample_tpe(
    space: &SearchSpace,
    trials: &[Trial],
    rng: &mut StdRng,
) -> Result<HashMap<String, f64>, ModelError> {
    let mut sorted: Vec<&Trial> = trials.iter().collect();
    sorted.sort_by(|a, b| a.loss.partial_cmp(&b.loss).unwrap_or(std::cmp::Ordering::Equal));
    let n_good = ((GAMMA * sorted.len() as f64).ceil() as usize).clamp(1, 25);
    let (good, bad) = sorted.split_at(n_good.min(sorted.len()));

    let mut params = HashMap::new();
    for (name, dim) in space.dimensions() {
        let value = match dim {
            Dimension::Constant(v) => *v,
            _ => {
                let good_obs = observations(name, good, dim);
                let bad_obs = observations(name, bad, dim);
                let raw = sample_dimension(dim, &good_obs, &bad_obs, rng)?;
                match dim {
                    Dimension::DiscreteUniform { .. } => raw.round(),
                    Dimension::LogUniform { .. } => raw.exp(),
                    Dimension::Constant(v) => *v,
                }
            }
        };
        params.insert(name.clone(), value);
    }
    Ok(params)
}

/// Past values of one dimension in its model (transformed) space.
fn observations(name: &str, trials: &[&Trial], dim: &Dimension) -> Vec<f64> {
    trials
        .iter()
        .filter_map(|t| t.params.get(name).copied())
        .map(|v| match dim {
            Dimension::LogUniform { .. } => v.ln(),
            _ => v,
        })
        .collect()
}

/// Model-space bounds of a dimension.
fn model_bounds(dim: &Dimension) -> (f64, f64) {
    match dim {
        Dimension::DiscreteUniform { low, high } => (*low, *high),
        Dimension::LogUniform { low, high } => (low.ln(), high.ln()),
        Dimension::Constant(v) => (*v, *v),
    }
}

/// Sample candidates from the good-set Parzen density and keep the one with
/// the highest good/bad density ratio. Returns a value in model space.
fn sample_dimension(
    dim: &Dimension,
    good: &[f64],
    bad: &[f64],
    rng: &mut StdRng,
) -> Result<f64, ModelError> {
    let (lo, hi) = model_bounds(dim);
    let range = (hi - lo).max(f64::MIN_POSITIVE);
    let bandwidth = |obs: &[f64]| -> f64 {
        let n = obs.len().max(1) as f64;
        (range / n.sqrt()).clamp(range * 0.01, range)
    };
    let bw_good = bandwidth(good);
    let bw_bad = bandwidth(bad);

    let mut best: Option<(f64, f64)> = None;
    for _ in 0..CANDIDATES {
        let candidate = if good.is_empty() {
            rng.gen_range(lo..=hi)
        } else {
            let center = good[rng.gen_range(0..good.len())];
            let kernel = Normal::new(center, bw_good)
                .map_err(|e| ModelError::SearchError(e.to_string()))?;
            rng.sample(kernel).clamp(lo, hi)
        };

        let l = parzen_density(candidate, good, bw_good, lo, hi)?;
        let g = parzen_density(candidate, bad, bw_bad, lo, hi)?;
        let score = l / g.max(f64::MIN_POSITIVE);
        if best.map(|(s, _)| score > s).unwrap_or(true) {
            best = Some((score, candidate));
        }
    }

    best.map(|(_, v)| v)
        .ok_or_else(|| ModelError::SearchError("no candidate sampled".to_string()))
}

/// Parzen mixture density: Gaussian kernel per observation plus one uniform
/// prior component over the bounds, so unexplored regions keep mass.
fn parzen_density(
    x: f64,
    obs: &[f64],
    bandwidth: f64,
    lo: f64,
    hi: f64,
) -> Result<f64, ModelError> {
    let uniform = 1.0 / (hi - lo).max(f64::MIN_POSITIVE);
    if obs.is_empty() {
        return Ok(uniform);
    }
    let mut total = uniform;
    for &center in obs {
        let kernel =
            Normal::new(center, bandwidth).map_err(|e| ModelError::SearchError(e.to_string()))?;
        total += kernel.pdf(x);
    }
    Ok(total / (obs.len() + 1) as f64)
}
