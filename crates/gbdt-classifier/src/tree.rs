//! Regression tree on gradient/hessian statistics, grown leaf-wise with a
//! leaf-count cap (LightGBM-style) under depth and child-size constraints.

/// L2 regularization on leaf weights.
const LAMBDA: f64 = 1.0;
/// Minimum summed hessian allowed on either side of a split.
const MIN_CHILD_HESSIAN: f64 = 1e-3;

#[derive(Debug, Clone)]
pub enum Node {
    Branch {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Raw score contribution of this tree for one feature row.
    pub fn score(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Branch {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn num_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}

#[derive(Debug, Clone)]
struct Split {
    gain: f64,
    feature: usize,
    threshold: f64,
}

/// A grown-but-still-splittable leaf during construction.
struct OpenLeaf {
    node: usize,
    depth: usize,
    indices: Vec<usize>,
    best: Option<Split>,
}

pub struct TreeBuilder<'a> {
    features: &'a [Vec<f64>],
    grad: &'a [f64],
    hess: &'a [f64],
    max_leaves: usize,
    max_depth: usize,
    min_child_samples: usize,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(
        features: &'a [Vec<f64>],
        grad: &'a [f64],
        hess: &'a [f64],
        max_leaves: usize,
        max_depth: usize,
        min_child_samples: usize,
    ) -> Self {
        Self {
            features,
            grad,
            hess,
            max_leaves: max_leaves.max(2),
            max_depth: max_depth.max(1),
            min_child_samples: min_child_samples.max(1),
        }
    }

    pub fn build(&self) -> Tree {
        let all: Vec<usize> = (0..self.features.len()).collect();
        let root_value = self.leaf_value(&all);
        let mut nodes = vec![Node::Leaf { value: root_value }];

        let mut open = vec![OpenLeaf {
            node: 0,
            depth: 0,
            best: self.best_split(&all, 0),
            indices: all,
        }];
        let mut num_leaves = 1;

        while num_leaves < self.max_leaves {
            // Split the open leaf with the largest gain; stop when nothing
            // improves the loss any more.
            let pick = open
                .iter()
                .enumerate()
                .filter(|(_, leaf)| leaf.best.is_some())
                .max_by(|(_, a), (_, b)| {
                    let ga = a.best.as_ref().map(|s| s.gain).unwrap_or(f64::NEG_INFINITY);
                    let gb = b.best.as_ref().map(|s| s.gain).unwrap_or(f64::NEG_INFINITY);
                    ga.partial_cmp(&gb).unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|(i, _)| i);

            let Some(pick) = pick else { break };
            let leaf = open.swap_remove(pick);
            let Some(split) = leaf.best else { break };

            let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = leaf
                .indices
                .iter()
                .partition(|&&i| self.features[i][split.feature] <= split.threshold);

            let left_node = nodes.len();
            nodes.push(Node::Leaf {
                value: self.leaf_value(&left_idx),
            });
            let right_node = nodes.len();
            nodes.push(Node::Leaf {
                value: self.leaf_value(&right_idx),
            });
            nodes[leaf.node] = Node::Branch {
                feature: split.feature,
                threshold: split.threshold,
                left: left_node,
                right: right_node,
            };
            num_leaves += 1;

            let child_depth = leaf.depth + 1;
            open.push(OpenLeaf {
                node: left_node,
                depth: child_depth,
                best: self.best_split(&left_idx, child_depth),
                indices: left_idx,
            });
            open.push(OpenLeaf {
                node: right_node,
                depth: child_depth,
                best: self.best_split(&right_idx, child_depth),
                indices: right_idx,
            });
        }

        Tree { nodes }
    }

    /// Optimal leaf weight: -G / (H + lambda).
    fn leaf_value(&self, indices: &[usize]) -> f64 {
        let g: f64 = indices.iter().map(|&i| self.grad[i]).sum();
        let h: f64 = indices.iter().map(|&i| self.hess[i]).sum();
        -g / (h + LAMBDA)
    }

    /// Exact greedy search over every feature and threshold for the best
    /// gain-positive split of `indices`, or None when no valid split exists.
    fn best_split(&self, indices: &[usize], depth: usize) -> Option<Split> {
        if depth >= self.max_depth || indices.len() < 2 * self.min_child_samples {
            return None;
        }

        let g_total: f64 = indices.iter().map(|&i| self.grad[i]).sum();
        let h_total: f64 = indices.iter().map(|&i| self.hess[i]).sum();
        let parent_score = g_total * g_total / (h_total + LAMBDA);
        let num_features = self.features[indices[0]].len();

        let mut best: Option<Split> = None;
        let mut order = indices.to_vec();

        for feature in 0..num_features {
            order.sort_by(|&a, &b| {
                self.features[a][feature]
                    .partial_cmp(&self.features[b][feature])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut g_left = 0.0;
            let mut h_left = 0.0;
            for pos in 0..order.len() - 1 {
                let i = order[pos];
                g_left += self.grad[i];
                h_left += self.hess[i];

                let here = self.features[i][feature];
                let next = self.features[order[pos + 1]][feature];
                if next <= here {
                    continue; // same feature value; not a real boundary
                }

                let left_count = pos + 1;
                let right_count = order.len() - left_count;
                if left_count < self.min_child_samples || right_count < self.min_child_samples {
                    continue;
                }

                let g_right = g_total - g_left;
                let h_right = h_total - h_left;
                if h_left < MIN_CHILD_HESSIAN || h_right < MIN_CHILD_HESSIAN {
                    continue;
                }

                let gain = 0.5
                    * (g_left * g_left / (h_left + LAMBDA)
                        + g_right * g_right / (h_right + LAMBDA)
                        - parent_score);
                if gain <= 0.0 {
                    continue;
                }
                if best.as_ref().map(|s| gain > s.gain).unwrap_or(true) {
                    best = Some(Split {
                        gain,
                        feature,
                        threshold: here + (next - here) / 2.0,
                    });
                }
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_split_separates_groups() {
        // Feature perfectly separates negative-gradient and positive-gradient
        // rows, so the builder should split at the boundary.
        let features: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let grad: Vec<f64> = (0..10).map(|i| if i < 5 { -1.0 } else { 1.0 }).collect();
        let hess = vec![0.25; 10];

        let tree = TreeBuilder::new(&features, &grad, &hess, 2, 3, 1).build();
        assert_eq!(tree.num_leaves(), 2);
        assert!(tree.score(&[0.0]) > 0.0);
        assert!(tree.score(&[9.0]) < 0.0);
    }

    #[test]
    fn test_min_child_samples_blocks_split() {
        let features: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64]).collect();
        let grad: Vec<f64> = (0..6).map(|i| if i < 3 { -1.0 } else { 1.0 }).collect();
        let hess = vec![0.25; 6];

        // min_child_samples = 4 can never be satisfied on both sides of 6 rows.
        let tree = TreeBuilder::new(&features, &grad, &hess, 8, 3, 4).build();
        assert_eq!(tree.num_leaves(), 1);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let features: Vec<Vec<f64>> = (0..16).map(|i| vec![i as f64]).collect();
        let grad: Vec<f64> = (0..16).map(|i| if i % 4 < 2 { -1.0 } else { 1.0 }).collect();
        let hess = vec![0.25; 16];

        let tree = TreeBuilder::new(&features, &grad, &hess, 64, 1, 1).build();
        // Depth 1 allows exactly one split.
        assert!(tree.num_leaves() <= 2);
    }
}
