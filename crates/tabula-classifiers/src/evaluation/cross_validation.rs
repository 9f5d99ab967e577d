//! k-fold cross-validation.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::dataset::{Dataset, Value};
use crate::error::{PipelineError, Result, Stage};
use crate::evaluation::metrics::{EvaluationResult, FoldResult};
use crate::models::Classifier;

/// Builds a fresh, unfitted classifier for every fold.
pub type ModelFactory<'a> = &'a (dyn Fn() -> Box<dyn Classifier> + Sync);

fn check_folds(n: usize, k: usize) -> Result<()> {
    if n == 0 {
        return Err(PipelineError::config(
            Stage::CrossValidate,
            "cannot cross-validate an empty dataset",
        ));
    }
    if k < 2 || k > n {
        return Err(PipelineError::config(
            Stage::CrossValidate,
            format!("fold count {} must be between 2 and the number of instances ({})", k, n),
        ));
    }
    Ok(())
}

/// Cut `order` into `k` contiguous folds; the first `n % k` folds hold one
/// extra element.
fn contiguous(order: &[usize], k: usize) -> Vec<Vec<usize>> {
    let (base, extra) = (order.len() / k, order.len() % k);
    let mut folds = Vec::with_capacity(k);
    let mut start = 0;
    for f in 0..k {
        let size = base + usize::from(f < extra);
        folds.push(order[start..start + size].to_vec());
        start += size;
    }
    folds
}

fn shuffled(n: usize, seed: u64) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    indices
}

/// Seeded shuffle of `0..n` split into `k` folds.
pub fn partition(n: usize, k: usize, seed: u64) -> Result<Vec<Vec<usize>>> {
    check_folds(n, k)?;
    Ok(contiguous(&shuffled(n, seed), k))
}

/// Like [`partition`], but the shuffled rows are regrouped class by class and
/// dealt across folds so every fold sees the class proportions of the whole.
pub fn stratified_partition(classes: &[usize], k: usize, seed: u64) -> Result<Vec<Vec<usize>>> {
    check_folds(classes.len(), k)?;
    let mut order = shuffled(classes.len(), seed);
    order.sort_by_key(|&r| classes[r]);

    let mut dealt: Vec<Vec<usize>> = vec![Vec::new(); k];
    for (p, &r) in order.iter().enumerate() {
        dealt[p % k].push(r);
    }
    let flat: Vec<usize> = dealt.into_iter().flatten().collect();
    Ok(contiguous(&flat, k))
}

/// Cross-validation settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossValidation {
    pub folds: usize,
    pub seed: u64,
    pub stratify: bool,
}

impl CrossValidation {
    pub fn new(folds: usize, seed: u64) -> Self {
        Self {
            folds,
            seed,
            stratify: false,
        }
    }

    pub fn stratified(mut self, stratify: bool) -> Self {
        self.stratify = stratify;
        self
    }

    /// Train a fresh model per fold on the remaining folds and score it on
    /// the held-out one. Rows with a missing class are removed first.
    pub fn run(&self, dataset: &Dataset, factory: ModelFactory<'_>) -> Result<EvaluationResult> {
        let class_index = dataset.class_index().ok_or_else(|| {
            PipelineError::config(
                Stage::CrossValidate,
                format!("dataset '{}' has no target attribute", dataset.name()),
            )
        })?;
        let class = dataset.attribute(class_index);
        if !class.is_nominal() {
            return Err(PipelineError::config(
                Stage::CrossValidate,
                format!("target attribute '{}' is {}, not nominal", class.name(), class.kind()),
            ));
        }

        // (original row, class position) of every labeled instance
        let labeled: Vec<(usize, usize)> = dataset
            .instances()
            .iter()
            .enumerate()
            .filter_map(|(r, i)| match i.value(class_index) {
                Value::Text(label) => class.label_index(label).map(|c| (r, c)),
                _ => None,
            })
            .collect();
        let dropped = dataset.instance_count() - labeled.len();
        if dropped > 0 {
            log::info!("Ignoring {} instances with a missing class value", dropped);
        }

        let rows: Vec<usize> = labeled.iter().map(|&(r, _)| r).collect();
        let classes: Vec<usize> = labeled.iter().map(|&(_, c)| c).collect();
        let data = dataset.select_rows(&rows);

        let folds = if self.stratify {
            stratified_partition(&classes, self.folds, self.seed)?
        } else {
            partition(rows.len(), self.folds, self.seed)?
        };

        let outcomes: Vec<Result<(FoldResult, Vec<(usize, usize)>)>> = folds
            .par_iter()
            .enumerate()
            .map(|(f, test_rows)| {
                let train_rows: Vec<usize> = folds
                    .iter()
                    .enumerate()
                    .filter(|&(g, _)| g != f)
                    .flat_map(|(_, fold)| fold.iter().copied())
                    .collect();
                let mut model = factory();
                model.fit(&data.select_rows(&train_rows))?;

                let mut pairs = Vec::with_capacity(test_rows.len());
                for &r in test_rows {
                    let predicted = match model.predict(data.instance(r))? {
                        Value::Text(label) => class.label_index(&label),
                        _ => None,
                    };
                    pairs.push((classes[r], predicted.unwrap_or(usize::MAX)));
                }
                let correct = pairs.iter().filter(|(a, p)| a == p).count();
                let fold = FoldResult {
                    fold: f,
                    train_size: train_rows.len(),
                    test_size: test_rows.len(),
                    rows: test_rows.iter().map(|&r| rows[r]).collect(),
                    correct,
                };
                Ok((fold, pairs))
            })
            .collect();

        let k = class.labels().len();
        let mut confusion = vec![vec![0usize; k]; k];
        let mut fold_results = Vec::with_capacity(folds.len());
        for outcome in outcomes {
            let (fold, pairs) = outcome?;
            log::debug!(
                "Fold {}: {}/{} correct ({:.2}%)",
                fold.fold + 1,
                fold.correct,
                fold.test_size,
                100.0 * fold.accuracy()
            );
            for (actual, predicted) in pairs {
                if predicted < k {
                    confusion[actual][predicted] += 1;
                }
            }
            fold_results.push(fold);
        }

        Ok(EvaluationResult {
            model: factory().name().to_string(),
            class_labels: class.labels().to_vec(),
            folds: fold_results,
            confusion,
        })
    }
}

/// Unstratified k-fold cross-validation with a seeded shuffle.
pub fn cross_validate(
    dataset: &Dataset,
    factory: ModelFactory<'_>,
    k: usize,
    seed: u64,
) -> Result<EvaluationResult> {
    CrossValidation::new(k, seed).run(dataset, factory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Attribute;
    use crate::models::majority::MajorityClassifier;

    #[test]
    fn twenty_five_rows_in_five_folds() {
        let folds = partition(25, 5, 1).unwrap();
        assert_eq!(folds.len(), 5);
        assert!(folds.iter().all(|f| f.len() == 5));

        let mut all: Vec<usize> = folds.concat();
        all.sort_unstable();
        assert_eq!(all, (0..25).collect::<Vec<_>>());

        assert_eq!(folds, partition(25, 5, 1).unwrap());
        let other = partition(25, 5, 2).unwrap();
        assert_ne!(folds, other);
        assert!(other.iter().all(|f| f.len() == 5));
    }

    #[test]
    fn first_folds_take_the_remainder() {
        let sizes: Vec<usize> = partition(11, 3, 7).unwrap().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 4, 3]);
    }

    #[test]
    fn invalid_fold_counts() {
        assert!(partition(10, 1, 1).is_err());
        assert!(partition(10, 11, 1).is_err());
        assert!(partition(0, 2, 1).is_err());
        assert!(partition(10, 10, 1).is_ok());
    }

    #[test]
    fn stratified_folds_balance_classes() {
        let classes: Vec<usize> = (0..20).map(|i| usize::from(i < 10)).collect();
        let folds = stratified_partition(&classes, 5, 3).unwrap();
        for fold in &folds {
            let ones = fold.iter().filter(|&&r| classes[r] == 1).count();
            assert_eq!((fold.len(), ones), (4, 2));
        }
    }

    #[test]
    fn missing_class_rows_are_ignored() {
        let mut rows: Vec<Vec<Value>> = (0..6)
            .map(|i| vec![Value::Number(i as f64), Value::text("a")])
            .collect();
        rows.push(vec![Value::Number(9.0), Value::Missing]);
        let mut ds = Dataset::from_rows(
            "labels",
            vec![
                Attribute::numeric("x"),
                Attribute::nominal("y", vec!["a".into(), "b".into()]),
            ],
            rows,
        )
        .unwrap();
        ds.set_class("y").unwrap();

        let factory = || -> Box<dyn Classifier> { Box::new(MajorityClassifier::new()) };
        let result = cross_validate(&ds, &factory, 3, 1).unwrap();
        assert_eq!(result.total(), 6);
        assert_eq!(result.correct(), 6);
        assert_eq!(result.confusion, vec![vec![6, 0], vec![0, 0]]);
        assert!(result.folds.iter().all(|f| !f.rows.contains(&6)));
    }

    #[test]
    fn unlabeled_dataset_is_rejected() {
        let ds = Dataset::from_rows("x", vec![Attribute::numeric("x")], vec![vec![Value::Number(1.0)]])
            .unwrap();
        let factory = || -> Box<dyn Classifier> { Box::new(MajorityClassifier::new()) };
        assert!(matches!(
            cross_validate(&ds, &factory, 2, 1),
            Err(PipelineError::Configuration { .. })
        ));
    }
}
