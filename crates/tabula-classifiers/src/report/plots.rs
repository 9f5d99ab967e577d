use plotly::layout::{Axis, Layout};
use plotly::{Bar, Plot, Scatter};

use crate::evaluation::EvaluationResult;

/// Bar chart of held-out accuracy per fold, with the pooled accuracy as a
/// horizontal reference line.
pub fn plot_fold_accuracy(result: &EvaluationResult, title: &str) -> Plot {
    let folds: Vec<String> = result
        .folds
        .iter()
        .map(|f| format!("Fold {}", f.fold + 1))
        .collect();
    let accuracy: Vec<f64> = result.fold_accuracies().iter().map(|a| 100.0 * a).collect();

    let bars = Bar::new(folds.clone(), accuracy).name("Fold accuracy");
    let pooled = Scatter::new(folds, vec![result.pct_correct(); result.folds.len()])
        .name("Overall");

    let layout = Layout::new()
        .title(title)
        .x_axis(Axis::new().title("Fold"))
        .y_axis(Axis::new().title("Accuracy (%)").range(vec![0.0, 100.0]));

    let mut plot = Plot::new();
    plot.add_trace(bars);
    plot.add_trace(pooled);
    plot.set_layout(layout);
    plot
}

/// Confusion matrix as grouped bars, one group per actual class.
pub fn plot_confusion(result: &EvaluationResult) -> Plot {
    let mut plot = Plot::new();
    for (p, predicted) in result.class_labels.iter().enumerate() {
        let counts: Vec<usize> = result.confusion.iter().map(|row| row[p]).collect();
        plot.add_trace(
            Bar::new(result.class_labels.clone(), counts).name(&format!("predicted {}", predicted)),
        );
    }
    plot.set_layout(
        Layout::new()
            .title("Confusion by actual class")
            .x_axis(Axis::new().title("Actual class"))
            .y_axis(Axis::new().title("Instances")),
    );
    plot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::FoldResult;

    #[test]
    fn fold_plot_renders_inline() {
        let result = EvaluationResult {
            model: "majority".into(),
            class_labels: vec!["a".into(), "b".into()],
            folds: vec![FoldResult {
                fold: 0,
                train_size: 3,
                test_size: 2,
                rows: vec![0, 1],
                correct: 1,
            }],
            confusion: vec![vec![1, 0], vec![1, 0]],
        };
        let html = plot_fold_accuracy(&result, "Folds").to_inline_html(Some("folds"));
        assert!(html.contains("Fold 1"));
        let html = plot_confusion(&result).to_inline_html(Some("confusion"));
        assert!(html.contains("predicted a"));
    }
}
