use std::fmt;

use serde::Serialize;

use crate::stats::{kappa, mean_std};

/// Outcome of one held-out fold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldResult {
    pub fold: usize,
    pub train_size: usize,
    pub test_size: usize,
    /// Original (pre-shuffle) row indices of the held-out instances.
    pub rows: Vec<usize>,
    pub correct: usize,
}

impl FoldResult {
    pub fn accuracy(&self) -> f64 {
        if self.test_size == 0 {
            0.0
        } else {
            self.correct as f64 / self.test_size as f64
        }
    }
}

/// Aggregate cross-validation outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub model: String,
    pub class_labels: Vec<String>,
    pub folds: Vec<FoldResult>,
    /// Counts indexed `[actual][predicted]` over `class_labels`.
    pub confusion: Vec<Vec<usize>>,
}

impl EvaluationResult {
    pub fn total(&self) -> usize {
        self.folds.iter().map(|f| f.test_size).sum()
    }

    pub fn correct(&self) -> usize {
        self.folds.iter().map(|f| f.correct).sum()
    }

    pub fn incorrect(&self) -> usize {
        self.total() - self.correct()
    }

    /// Total correct over total instances.
    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            n => self.correct() as f64 / n as f64,
        }
    }

    pub fn pct_correct(&self) -> f64 {
        100.0 * self.accuracy()
    }

    pub fn kappa(&self) -> f64 {
        let matrix: Vec<Vec<f64>> = self
            .confusion
            .iter()
            .map(|row| row.iter().map(|&c| c as f64).collect())
            .collect();
        kappa(&matrix)
    }

    pub fn fold_accuracies(&self) -> Vec<f64> {
        self.folds.iter().map(FoldResult::accuracy).collect()
    }

    /// Plain-text summary in the layout of classic ML toolkits.
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for EvaluationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.total().max(1) as f64;
        let (mean, std) = mean_std(&self.fold_accuracies());

        writeln!(f, "=== {}-fold cross-validation: {} ===", self.folds.len(), self.model)?;
        writeln!(f)?;
        writeln!(
            f,
            "Correctly Classified Instances   {:>8} {:>10.4} %",
            self.correct(),
            100.0 * self.correct() as f64 / total
        )?;
        writeln!(
            f,
            "Incorrectly Classified Instances {:>8} {:>10.4} %",
            self.incorrect(),
            100.0 * self.incorrect() as f64 / total
        )?;
        writeln!(f, "Kappa statistic                  {:>8.4}", self.kappa())?;
        writeln!(f, "Total Number of Instances        {:>8}", self.total())?;
        writeln!(
            f,
            "Fold accuracy ({} folds)          {:.4} +/- {:.4}",
            self.folds.len(),
            mean,
            std
        )?;
        writeln!(f)?;
        writeln!(f, "=== Confusion Matrix ===")?;
        writeln!(f)?;

        let width = self
            .confusion
            .iter()
            .flatten()
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(1)
            .max(3);
        let names = letters(self.class_labels.len());
        for name in &names {
            write!(f, " {:>width$}", name, width = width)?;
        }
        writeln!(f, "   <-- classified as")?;
        for (i, row) in self.confusion.iter().enumerate() {
            for count in row {
                write!(f, " {:>width$}", count, width = width)?;
            }
            writeln!(f, " | {} = {}", names[i], self.class_labels[i])?;
        }
        Ok(())
    }
}

/// Column names a, b, ..., z, aa, ab, ...
fn letters(n: usize) -> Vec<String> {
    (0..n)
        .map(|mut i| {
            let mut name = Vec::new();
            loop {
                name.push(b'a' + (i % 26) as u8);
                if i < 26 {
                    break;
                }
                i = i / 26 - 1;
            }
            name.reverse();
            String::from_utf8_lossy(&name).into_owned()
        })
        .collect()
}
