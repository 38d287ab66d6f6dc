//! Named search-space description. Every dimension samples to an f64; integer
//! coercion of discrete dimensions is the caller's responsibility.

/// One search dimension.
#[derive(Debug, Clone)]
pub enum Dimension {
    /// Integer-valued uniform over `[low, high]` inclusive. Samples are
    /// rounded to whole numbers but still delivered as floats.
    DiscreteUniform { low: f64, high: f64 },
    /// Uniform in log space over `[low, high]`, both > 0.
    LogUniform { low: f64, high: f64 },
    /// Fixed value carried through every trial, never searched.
    Constant(f64),
}

/// Ordered, named collection of dimensions.
#[derive(Debug, Clone, Default)]
pub struct SearchSpace {
    dims: Vec<(String, Dimension)>,
}

impl SearchSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, dim: Dimension) -> Self {
        self.dims.push((name.into(), dim));
        self
    }

    pub fn dimensions(&self) -> &[(String, Dimension)] {
        &self.dims
    }

    pub fn is_empty(&self) -> bool {
        self.dims.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_preserves_insertion_order() {
        let space = SearchSpace::new()
            .with("a", Dimension::Constant(1.0))
            .with("b", Dimension::DiscreteUniform { low: 0.0, high: 5.0 });
        let names: Vec<&str> = space
            .dimensions()
            .iter()
            .map(|(n, _)| n.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
