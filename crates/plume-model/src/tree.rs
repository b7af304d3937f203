//! Regression tree over a flat node arena.
//!
//! Nodes live in a `Vec` and reference their children by index; node 0 is
//! the root. Every node, internal or leaf, records the mean target of the
//! training rows that reached it. Predictions read the leaf mean; path
//! attribution reads the mean deltas along the way down.

use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Below this target variance a node is treated as pure.
const PURITY_EPSILON: f64 = 1e-12;

/// Parameters controlling tree growth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Depth limit in split levels; `None` grows until leaves are pure or
    /// too small to split
    pub max_depth: Option<usize>,
    /// Minimum rows a node needs before a split is attempted (default: 2)
    pub min_samples_split: usize,
    /// Minimum rows each side of a split must keep (default: 1)
    pub min_samples_leaf: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// An axis-aligned split test. Rows with `value <= threshold` go left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Split {
    /// Feature column the test reads
    pub feature: usize,
    /// Decision boundary, the midpoint between two adjacent training values
    pub threshold: f64,
    /// Arena index of the left child
    pub left: usize,
    /// Arena index of the right child
    pub right: usize,
}

/// One node of the tree. `split` is `None` on leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Mean target of the training rows that reached this node
    pub value: f64,
    /// Number of training rows that reached this node
    pub n_samples: usize,
    /// Split test, absent on leaves
    pub split: Option<Split>,
}

/// A fitted regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Grow a tree on the rows selected by `indices`. Indices may repeat,
    /// which is how bootstrap resampling reaches this level.
    ///
    /// Callers guarantee a non-empty selection and finite values; the
    /// ensemble layer validates before growing.
    pub(crate) fn fit(
        config: &TreeConfig,
        features: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
        indices: &[usize],
    ) -> Self {
        debug_assert!(!indices.is_empty());
        let mut nodes = Vec::new();
        grow(config, &features, &targets, indices, 0, &mut nodes);
        Self { nodes }
    }

    /// Predict a single row by walking the arena from the root.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx].split {
                Some(split) => {
                    idx = if row[split.feature] <= split.threshold {
                        split.left
                    } else {
                        split.right
                    };
                }
                None => return self.nodes[idx].value,
            }
        }
    }

    /// The node arena; node 0 is the root.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Mean target of the full training selection.
    pub fn root_value(&self) -> f64 {
        self.nodes[0].value
    }

    /// Number of leaves.
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.split.is_none()).count()
    }

    /// Longest root-to-leaf path, counting nodes. A lone root is depth 1.
    pub fn depth(&self) -> usize {
        self.depth_below(0)
    }

    fn depth_below(&self, idx: usize) -> usize {
        match self.nodes[idx].split {
            Some(split) => 1 + self.depth_below(split.left).max(self.depth_below(split.right)),
            None => 1,
        }
    }
}

/// Recursively grow the subtree for `indices`, returning its arena index.
fn grow(
    config: &TreeConfig,
    features: &ArrayView2<'_, f64>,
    targets: &ArrayView1<'_, f64>,
    indices: &[usize],
    depth: usize,
    nodes: &mut Vec<Node>,
) -> usize {
    let (mean, variance) = mean_variance(targets, indices);
    let node_idx = nodes.len();
    nodes.push(Node {
        value: mean,
        n_samples: indices.len(),
        split: None,
    });

    let depth_allows = config.max_depth.is_none_or(|limit| depth < limit);
    if !depth_allows || indices.len() < config.min_samples_split || variance <= PURITY_EPSILON {
        return node_idx;
    }

    let Some(best) = best_split(config, features, targets, indices) else {
        return node_idx;
    };

    let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .partition(|&&i| features[[i, best.feature]] <= best.threshold);

    let left = grow(config, features, targets, &left_rows, depth + 1, nodes);
    let right = grow(config, features, targets, &right_rows, depth + 1, nodes);
    nodes[node_idx].split = Some(Split {
        feature: best.feature,
        threshold: best.threshold,
        left,
        right,
    });
    node_idx
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    score: f64,
}

/// Scan every feature for the variance-minimizing split.
///
/// For each feature the rows are sorted by value and candidate thresholds
/// are the midpoints between adjacent distinct values. Minimizing the
/// summed within-side squared error is equivalent to maximizing
/// `S_l^2/n_l + S_r^2/n_r` over the running target sums, so a single
/// prefix scan scores all candidates.
fn best_split(
    config: &TreeConfig,
    features: &ArrayView2<'_, f64>,
    targets: &ArrayView1<'_, f64>,
    indices: &[usize],
) -> Option<BestSplit> {
    let n = indices.len();
    let total_sum: f64 = indices.iter().map(|&i| targets[i]).sum();
    let parent_score = total_sum * total_sum / n as f64;

    let mut best: Option<BestSplit> = None;
    let mut sorted: Vec<(f64, f64)> = Vec::with_capacity(n);

    for feature in 0..features.ncols() {
        sorted.clear();
        sorted.extend(indices.iter().map(|&i| (features[[i, feature]], targets[i])));
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left_sum = 0.0;
        for k in 1..n {
            left_sum += sorted[k - 1].1;

            if k < config.min_samples_leaf || n - k < config.min_samples_leaf {
                continue;
            }
            let (lo, hi) = (sorted[k - 1].0, sorted[k].0);
            if lo >= hi {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let score =
                left_sum * left_sum / k as f64 + right_sum * right_sum / (n - k) as f64;
            if score > parent_score && best.as_ref().is_none_or(|b| score > b.score) {
                // the midpoint of two adjacent floats can round up to the
                // higher one; fall back to the lower so `<=` stays faithful
                let mid = f64::midpoint(lo, hi);
                let threshold = if mid >= hi { lo } else { mid };
                best = Some(BestSplit {
                    feature,
                    threshold,
                    score,
                });
            }
        }
    }
    best
}

fn mean_variance(targets: &ArrayView1<'_, f64>, indices: &[usize]) -> (f64, f64) {
    let n = indices.len() as f64;
    let mean = indices.iter().map(|&i| targets[i]).sum::<f64>() / n;
    let variance = indices
        .iter()
        .map(|&i| (targets[i] - mean).powi(2))
        .sum::<f64>()
        / n;
    (mean, variance)
}
