//! Weighted C4.5-style decision tree.
//!
//! Nominal attributes split multiway (one branch per training label),
//! numeric attributes split on a single threshold. Split quality is the
//! information gain, optionally normalized to the gain ratio. Rows with a
//! missing split value follow the heaviest branch during induction; at
//! prediction time a missing value stops at the current node.
use ndarray::Array2;

use crate::dataset::{AttributeKind, Dataset, Instance};
use crate::error::{PipelineError, Result, Stage};
use crate::models::classifier_trait::Classifier;
use crate::models::utils::{argmax, normalize, FittedSchema};

const MIN_GAIN: f64 = 1e-10;

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        distribution: Vec<f64>,
    },
    Nominal {
        attribute: usize,
        children: Vec<Node>,
        distribution: Vec<f64>,
    },
    Numeric {
        attribute: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
        distribution: Vec<f64>,
    },
}

impl Node {
    fn leaves(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Nominal { children, .. } => children.iter().map(Node::leaves).sum(),
            Node::Numeric { left, right, .. } => left.leaves() + right.leaves(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum SplitKind {
    Nominal { arity: usize },
    Numeric { threshold: f64 },
}

#[derive(Debug, Clone, Copy)]
struct Split {
    attribute: usize,
    kind: SplitKind,
    score: f64,
}

/// Encoded training data shared by the recursive builder.
struct View {
    x: Array2<f64>,
    classes: Vec<usize>,
    weights: Vec<f64>,
    features: Vec<usize>,
    kinds: Vec<AttributeKind>,
    arities: Vec<usize>,
    num_classes: usize,
}

impl View {
    fn class_counts(&self, rows: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0; self.num_classes];
        for &r in rows {
            counts[self.classes[r]] += self.weights[r];
        }
        counts
    }

    fn weight(&self, rows: &[usize]) -> f64 {
        rows.iter().map(|&r| self.weights[r]).sum()
    }
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    max_depth: usize,
    min_leaf_weight: f64,
    use_gain_ratio: bool,
    schema: Option<FittedSchema>,
    root: Option<Node>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new(12, 2.0, true)
    }
}

impl DecisionTree {
    pub fn new(max_depth: usize, min_leaf_weight: f64, use_gain_ratio: bool) -> Self {
        Self {
            max_depth,
            min_leaf_weight,
            use_gain_ratio,
            schema: None,
            root: None,
        }
    }

    /// Number of leaves of the fitted tree (0 before `fit`).
    pub fn leaf_count(&self) -> usize {
        self.root.as_ref().map_or(0, Node::leaves)
    }

    fn build(&self, view: &View, rows: &[usize], depth: usize) -> Node {
        let distribution = view.class_counts(rows);
        let total: f64 = distribution.iter().sum();
        let pure = distribution.iter().filter(|&&w| w > 0.0).count() <= 1;

        if pure || depth >= self.max_depth || total < 2.0 * self.min_leaf_weight {
            return Node::Leaf { distribution };
        }
        let Some(split) = self.best_split(view, rows, total) else {
            return Node::Leaf { distribution };
        };

        let col = split.attribute;
        match split.kind {
            SplitKind::Nominal { arity } => {
                let mut parts: Vec<Vec<usize>> = vec![Vec::new(); arity];
                let mut unknown = Vec::new();
                for &r in rows {
                    let v = view.x[[r, col]];
                    if v.is_nan() {
                        unknown.push(r);
                    } else {
                        parts[v as usize].push(r);
                    }
                }
                let part_weights: Vec<f64> = parts.iter().map(|p| view.weight(p)).collect();
                parts[argmax(&part_weights)].extend(unknown);

                let children = parts
                    .iter()
                    .map(|p| {
                        if p.is_empty() {
                            Node::Leaf {
                                distribution: distribution.clone(),
                            }
                        } else {
                            self.build(view, p, depth + 1)
                        }
                    })
                    .collect();
                Node::Nominal {
                    attribute: col,
                    children,
                    distribution,
                }
            }
            SplitKind::Numeric { threshold } => {
                let mut left = Vec::new();
                let mut right = Vec::new();
                let mut unknown = Vec::new();
                for &r in rows {
                    let v = view.x[[r, col]];
                    if v.is_nan() {
                        unknown.push(r);
                    } else if v <= threshold {
                        left.push(r);
                    } else {
                        right.push(r);
                    }
                }
                if view.weight(&left) >= view.weight(&right) {
                    left.extend(unknown);
                } else {
                    right.extend(unknown);
                }
                Node::Numeric {
                    attribute: col,
                    threshold,
                    left: Box::new(self.build(view, &left, depth + 1)),
                    right: Box::new(self.build(view, &right, depth + 1)),
                    distribution,
                }
            }
        }
    }

    fn best_split(&self, view: &View, rows: &[usize], total: f64) -> Option<Split> {
        let mut best: Option<Split> = None;
        for &col in &view.features {
            let candidate = match view.kinds[col] {
                AttributeKind::Nominal => self.nominal_split(view, rows, col, total),
                AttributeKind::Numeric => self.numeric_split(view, rows, col, total),
                AttributeKind::String => None,
            };
            if let Some(c) = candidate {
                if best.map_or(true, |b| c.score > b.score) {
                    best = Some(c);
                }
            }
        }
        best
    }

    fn score(&self, gain: f64, branch_weights: &[f64]) -> Option<f64> {
        if gain <= MIN_GAIN {
            return None;
        }
        if !self.use_gain_ratio {
            return Some(gain);
        }
        let split_info = entropy(branch_weights);
        if split_info <= MIN_GAIN {
            return None;
        }
        Some(gain / split_info)
    }

    fn nominal_split(&self, view: &View, rows: &[usize], col: usize, total: f64) -> Option<Split> {
        let arity = view.arities[col];
        if arity < 2 {
            return None;
        }
        let k = view.num_classes;
        let mut branches = vec![vec![0.0; k]; arity];
        let mut known = vec![0.0; k];
        for &r in rows {
            let v = view.x[[r, col]];
            if v.is_nan() {
                continue;
            }
            branches[v as usize][view.classes[r]] += view.weights[r];
            known[view.classes[r]] += view.weights[r];
        }

        let known_total: f64 = known.iter().sum();
        let branch_totals: Vec<f64> = branches.iter().map(|b| b.iter().sum()).collect();
        let populated = branch_totals
            .iter()
            .filter(|&&w| w >= self.min_leaf_weight)
            .count();
        if known_total <= 0.0 || populated < 2 {
            return None;
        }

        let children: f64 = branches
            .iter()
            .zip(&branch_totals)
            .map(|(b, &w)| w / known_total * entropy(b))
            .sum();
        let gain = (entropy(&known) - children) * known_total / total;
        let score = self.score(gain, &branch_totals)?;
        Some(Split {
            attribute: col,
            kind: SplitKind::Nominal { arity },
            score,
        })
    }

    fn numeric_split(&self, view: &View, rows: &[usize], col: usize, total: f64) -> Option<Split> {
        let mut known: Vec<(f64, usize, f64)> = rows
            .iter()
            .filter(|&&r| !view.x[[r, col]].is_nan())
            .map(|&r| (view.x[[r, col]], view.classes[r], view.weights[r]))
            .collect();
        if known.len() < 2 {
            return None;
        }
        known.sort_by(|a, b| a.0.total_cmp(&b.0));

        let k = view.num_classes;
        let mut known_dist = vec![0.0; k];
        for &(_, c, w) in &known {
            known_dist[c] += w;
        }
        let known_total: f64 = known_dist.iter().sum();
        let base = entropy(&known_dist);

        let mut left = vec![0.0; k];
        let mut left_total = 0.0;
        let mut best: Option<(f64, f64, f64)> = None;
        for i in 0..known.len() - 1 {
            let (value, class, weight) = known[i];
            left[class] += weight;
            left_total += weight;
            let next = known[i + 1].0;
            if value == next {
                continue;
            }
            let right_total = known_total - left_total;
            if left_total < self.min_leaf_weight || right_total < self.min_leaf_weight {
                continue;
            }
            let right: Vec<f64> = known_dist
                .iter()
                .zip(&left)
                .map(|(t, l)| (t - l).max(0.0))
                .collect();
            let gain = base
                - (left_total / known_total * entropy(&left)
                    + right_total / known_total * entropy(&right));
            if best.map_or(true, |(g, _, _)| gain > g) {
                best = Some((gain, (value + next) / 2.0, left_total));
            }
        }

        let (gain, threshold, left_total) = best?;
        let gain = gain * known_total / total;
        let score = self.score(gain, &[left_total, known_total - left_total])?;
        Some(Split {
            attribute: col,
            kind: SplitKind::Numeric { threshold },
            score,
        })
    }
}

fn entropy(counts: &[f64]) -> f64 {
    let total: f64 = counts.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    counts
        .iter()
        .filter(|&&c| c > 0.0)
        .map(|&c| {
            let p = c / total;
            -p * p.log2()
        })
        .sum()
}

impl Classifier for DecisionTree {
    fn fit(&mut self, train: &Dataset) -> Result<()> {
        let schema = FittedSchema::from_dataset(train)?;
        let x = schema.encode(train);

        let n = train.instance_count();
        let mut classes = vec![0usize; n];
        let mut weights = vec![0.0; n];
        let mut rows = Vec::with_capacity(n);
        for (r, instance) in train.instances().iter().enumerate() {
            if let Some(c) = schema.class_of(instance) {
                if instance.weight() > 0.0 {
                    classes[r] = c;
                    weights[r] = instance.weight();
                    rows.push(r);
                }
            }
        }
        if rows.is_empty() {
            return Err(PipelineError::config(
                Stage::Train,
                format!("no labeled instances in '{}'", train.name()),
            ));
        }

        let view = View {
            x,
            classes,
            weights,
            features: schema.feature_columns(),
            kinds: schema.attributes().iter().map(|a| a.kind()).collect(),
            arities: schema.attributes().iter().map(|a| a.labels().len()).collect(),
            num_classes: schema.num_classes(),
        };
        let root = self.build(&view, &rows, 0);
        log::trace!(
            "Grew tree with {} leaves on {} instances",
            root.leaves(),
            rows.len()
        );

        self.root = Some(root);
        self.schema = Some(schema);
        Ok(())
    }

    fn distribution(&self, instance: &Instance) -> Result<Vec<f64>> {
        let (Some(schema), Some(root)) = (&self.schema, &self.root) else {
            return Err(PipelineError::config(Stage::Predict, "decision tree is not fitted"));
        };
        schema.check(instance)?;
        let codes = schema.encode_instance(instance);

        let mut node = root;
        let counts = loop {
            match node {
                Node::Leaf { distribution } => break distribution,
                Node::Nominal {
                    attribute,
                    children,
                    distribution,
                } => {
                    let v = codes[*attribute];
                    if v.is_nan() || v as usize >= children.len() {
                        break distribution;
                    }
                    node = &children[v as usize];
                }
                Node::Numeric {
                    attribute,
                    threshold,
                    left,
                    right,
                    distribution,
                } => {
                    let v = codes[*attribute];
                    if v.is_nan() {
                        break distribution;
                    }
                    node = if v <= *threshold { left } else { right };
                }
            }
        };

        let mut dist = counts.clone();
        normalize(&mut dist);
        Ok(dist)
    }

    fn class_labels(&self) -> &[String] {
        match &self.schema {
            Some(schema) => schema.class_labels(),
            None => &[],
        }
    }

    fn name(&self) -> &str {
        "tree"
    }
}
