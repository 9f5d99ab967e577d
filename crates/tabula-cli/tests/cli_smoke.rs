//! CLI binary smoke tests using assert_cmd.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("tabula").unwrap()
}

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

const TRAIN: &str = "\
id,zone,age,price
1,A,20,low
2,B,22,high
3,A,NA,low
4,B,25,high
5,A,30,low
6,B,NA,high
7,A,40,low
8,B,18,high
";

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

#[test]
fn no_args_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("evaluate"));
}

#[test]
fn version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tabula"));
}

#[test]
fn unknown_model_type_is_rejected() {
    cmd()
        .args(["evaluate", "--model-type", "svm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

// ---------------------------------------------------------------------------
// run / evaluate
// ---------------------------------------------------------------------------

#[test]
fn run_writes_submission() {
    let dir = tempfile::tempdir().unwrap();
    let train = write(dir.path(), "train.csv", TRAIN);
    let test = write(dir.path(), "test.csv", "id,zone,age\n9,B,33\n10,A,NA\n");
    let template = write(dir.path(), "template.csv", "id,price\n9,?\n10,?\n");
    let output = dir.path().join("submission.csv");

    cmd()
        .arg("run")
        .arg("--train")
        .arg(&train)
        .arg("--test")
        .arg(&test)
        .arg("--template")
        .arg(&template)
        .arg("--output")
        .arg(&output)
        .args(["--folds", "2", "--model-type", "tree", "--no-report"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Correctly Classified Instances"))
        .stderr(predicate::str::contains("Default config"));

    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(written, "id,price\n9,high\n10,low\n");
}

#[test]
fn evaluate_without_train_fails() {
    cmd()
        .args(["evaluate", "--no-report"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No train file given"));
}

#[test]
fn evaluate_rejects_non_csv_input() {
    let dir = tempfile::tempdir().unwrap();
    let train = write(dir.path(), "train.txt", TRAIN);
    cmd()
        .arg("evaluate")
        .arg("--train")
        .arg(&train)
        .arg("--no-report")
        .assert()
        .failure()
        .stderr(predicate::str::contains(".tsv or .csv"));
}

#[test]
fn evaluate_with_too_many_folds_fails() {
    let dir = tempfile::tempdir().unwrap();
    let train = write(dir.path(), "train.csv", TRAIN);
    cmd()
        .arg("evaluate")
        .arg("--train")
        .arg(&train)
        .args(["--folds", "20", "--no-report"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fold count 20"));
}

#[test]
fn evaluate_writes_report_when_requested() {
    let dir = tempfile::tempdir().unwrap();
    let train = write(dir.path(), "train.csv", TRAIN);
    let report = dir.path().join("report.html");
    let config = write(
        dir.path(),
        "run.json",
        &format!(
            r#"{{"train": {:?}, "report_path": {:?}, "pipeline": {{"folds": 4}}}}"#,
            train.to_str().unwrap(),
            report.to_str().unwrap()
        ),
    );

    cmd()
        .arg("evaluate")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("4-fold cross-validation"));
    let html = fs::read_to_string(&report).unwrap();
    assert!(html.contains("Accuracy per fold"));
}
