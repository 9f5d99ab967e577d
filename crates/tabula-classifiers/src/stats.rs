use statrs::statistics::Statistics;

/// Cohen's kappa from a square confusion matrix (rows actual, columns
/// predicted). Zero when the matrix is empty or expected agreement is total.
pub fn kappa(confusion: &[Vec<f64>]) -> f64 {
    let total: f64 = confusion.iter().flatten().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let observed: f64 = confusion
        .iter()
        .enumerate()
        .map(|(i, row)| row.get(i).copied().unwrap_or(0.0))
        .sum::<f64>()
        / total;

    let mut expected = 0.0;
    for (i, row) in confusion.iter().enumerate() {
        let actual: f64 = row.iter().sum();
        let predicted: f64 = confusion.iter().map(|r| r.get(i).copied().unwrap_or(0.0)).sum();
        expected += actual * predicted;
    }
    expected /= total * total;

    if (1.0 - expected).abs() < f64::EPSILON {
        0.0
    } else {
        (observed - expected) / (1.0 - expected)
    }
}

/// Mean and sample standard deviation; the deviation is 0 for fewer than
/// two values.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = values.iter().mean();
    let std = if values.len() < 2 {
        0.0
    } else {
        values.iter().std_dev()
    };
    (mean, std)
}
