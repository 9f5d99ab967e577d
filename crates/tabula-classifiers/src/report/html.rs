use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::evaluation::EvaluationResult;
use crate::pipeline::PreprocessReport;
use crate::report::plots::{plot_confusion, plot_fold_accuracy};

const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

/// Self-contained HTML summary of a cross-validation run.
pub struct EvaluationReport<'a> {
    pub title: String,
    pub target: &'a str,
    pub evaluation: &'a EvaluationResult,
    pub preprocess: Option<&'a PreprocessReport>,
    /// Pretty-printed configuration shown verbatim at the end.
    pub config_json: Option<String>,
}

impl<'a> EvaluationReport<'a> {
    pub fn new(title: impl Into<String>, target: &'a str, evaluation: &'a EvaluationResult) -> Self {
        Self {
            title: title.into(),
            target,
            evaluation,
            preprocess: None,
            config_json: None,
        }
    }

    pub fn with_preprocess(mut self, report: &'a PreprocessReport) -> Self {
        self.preprocess = Some(report);
        self
    }

    pub fn with_config_json(mut self, json: String) -> Self {
        self.config_json = Some(json);
        self
    }

    fn overview(&self) -> Markup {
        let e = self.evaluation;
        html! {
            h2 { "Overview" }
            table {
                tr { th { "Model" } td { (e.model) } }
                tr { th { "Target attribute" } td { (self.target) } }
                tr { th { "Folds" } td { (e.folds.len()) } }
                tr { th { "Correctly classified" } td { (e.correct()) " (" (format!("{:.4}", e.pct_correct())) " %)" } }
                tr { th { "Incorrectly classified" } td { (e.incorrect()) } }
                tr { th { "Kappa" } td { (format!("{:.4}", e.kappa())) } }
                tr { th { "Total instances" } td { (e.total()) } }
            }
        }
    }

    fn preprocessing(&self, report: &PreprocessReport) -> Markup {
        html! {
            h2 { "Preprocessing" }
            table {
                tr { th { "Stage" } th { "Attributes" } }
                @for (stage, count) in &report.attribute_counts {
                    tr { td { (stage.to_string()) } td { (count) } }
                }
            }
            @if !report.dropped.is_empty() {
                p { "Removed string attributes: " (report.dropped.join(", ")) }
            }
            @if report.placeholder_target {
                p { "The test set had no target column; a placeholder was added." }
            }
            @if !report.unseen.is_empty() {
                table {
                    tr { th { "Attribute" } th { "Unseen test values" } }
                    @for (attribute, count) in &report.unseen {
                        tr { td { (attribute) } td { (count) } }
                    }
                }
            }
        }
    }

    pub fn render(&self) -> Markup {
        let folds = plot_fold_accuracy(self.evaluation, "Accuracy per fold");
        let confusion = plot_confusion(self.evaluation);
        let generated = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    script src=(PLOTLY_JS) {}
                }
                body {
                    h1 { (self.title) }
                    p { "Generated " (generated) }
                    (self.overview())
                    (PreEscaped(folds.to_inline_html(Some("fold-accuracy"))))
                    (PreEscaped(confusion.to_inline_html(Some("confusion"))))
                    h2 { "Summary" }
                    pre { (self.evaluation.summary()) }
                    @if let Some(report) = self.preprocess {
                        (self.preprocessing(report))
                    }
                    @if let Some(json) = &self.config_json {
                        h2 { "Configuration" }
                        pre { (json) }
                    }
                }
            }
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.render().into_string())
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        log::info!("Report written to {}", path.display());
        Ok(())
    }
}
