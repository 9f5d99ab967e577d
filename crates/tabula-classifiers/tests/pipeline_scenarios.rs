use std::fs;
use std::path::Path;

use tabula_classifiers::config::{ModelConfig, ModelType, PipelineConfig, UnseenPolicy};
use tabula_classifiers::dataset::{Dataset, Value};
use tabula_classifiers::evaluation::cross_validation::{cross_validate, partition};
use tabula_classifiers::io::{read_csv, write_csv, CsvReaderConfig};
use tabula_classifiers::models::{build_model, Classifier};
use tabula_classifiers::pipeline::Pipeline;
use tabula_classifiers::preprocessing::{align, normalize_missing, Imputer};
use tabula_classifiers::{PipelineError, Stage};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

fn load(dir: &Path, name: &str, text: &str) -> Dataset {
    read_csv(write(dir, name, text), &CsvReaderConfig::default()).unwrap()
}

const TRAIN: &str = "\
id,zone,age,price
1,A,20,low
2,B,22,high
3,C,NA,low
4,A,25,low
5,B,30,high
6,C,NA,low
7,A,40,low
8,B,18,high
9,C,NA,low
10,B,35,high
";

#[test]
fn age_mean_fills_every_missing_cell() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let mut train = load(dir.path(), "train.csv", TRAIN);
    train.set_class("price").unwrap();

    let normalized = normalize_missing(&train, &PipelineConfig::default().missing);
    let age = normalized.attribute_index("age").unwrap();
    assert_eq!(normalized.missing_count(age), 3);

    let imputer = Imputer::fit(&normalized).unwrap();
    let filled = imputer.apply(&normalized).unwrap();
    assert_eq!(filled.missing_count(age), 0);
    let expected = 190.0 / 7.0;
    match filled.value(2, age) {
        Value::Number(v) => assert!((v - expected).abs() < 1e-9, "got {}", v),
        other => panic!("expected a number, got {:?}", other),
    }
}

#[test]
fn end_to_end_run_writes_submission_in_template_order() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let train = load(dir.path(), "train.csv", TRAIN);
    let test = load(dir.path(), "test.csv", "id,zone,age\n11,B,NA\n12,D,31\n13,A,19\n");
    let template = load(dir.path(), "template.csv", "id,price\n11,?\n12,?\n13,?\n");

    let config = PipelineConfig {
        folds: 5,
        coerce_range: "2".to_string(),
        ..PipelineConfig::default()
    };
    let model = ModelConfig::new(ModelType::DecisionTree {
        max_depth: 4,
        min_leaf_weight: 1.0,
        use_gain_ratio: true,
    });
    let outcome = Pipeline::new(config, model).run(&train, &test, &template).unwrap();

    assert_eq!(outcome.target_name, "price");
    assert!(outcome.report.placeholder_target);
    assert_eq!(outcome.report.unseen.get("zone"), Some(&1));
    assert_eq!(outcome.evaluation.total(), 10);

    let out = dir.path().join("submission.csv");
    write_csv(&outcome.submission, &out).unwrap();
    let written = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], "id,price");
    assert_eq!(lines[1], "11,high");
    assert!(lines[2].starts_with("12,"));
    assert_eq!(lines[3], "13,low");
}

#[test]
fn unseen_zone_maps_to_reserved_label_without_changing_width() {
    let dir = tempfile::tempdir().unwrap();
    let train = load(dir.path(), "train.csv", TRAIN);
    let test = load(dir.path(), "test.csv", "id,zone,age,price\n11,D,31,?\n");

    let pipeline = Pipeline::new(
        PipelineConfig {
            coerce_range: "2".to_string(),
            ..PipelineConfig::default()
        },
        ModelConfig::default(),
    );
    let prepared = pipeline.prepare(&train, Some(&test)).unwrap();
    let test = prepared.test.unwrap();
    assert_eq!(test.attribute_count(), 4);
    assert_eq!(test.value(0, 1), &Value::text("other"));

    let strict = Pipeline::new(
        PipelineConfig {
            coerce_range: "2".to_string(),
            unseen_policy: UnseenPolicy::Fail,
            ..PipelineConfig::default()
        },
        ModelConfig::default(),
    );
    let test = load(dir.path(), "test.csv", "id,zone,age,price\n11,D,31,?\n");
    assert!(matches!(
        strict.prepare(&train, Some(&test)),
        Err(PipelineError::UnseenCategory { .. })
    ));
}

#[test]
fn sentinel_target_column_in_test_adopts_numeric_training_target() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let train = load(
        dir.path(),
        "train.csv",
        "id,x,price\n1,1,100\n2,2,100\n3,3,100\n4,7,200\n5,8,200\n6,9,200\n",
    );
    let test = load(dir.path(), "test.csv", "id,x,price\n7,2,NA\n8,8,NA\n");
    assert!(test.attribute(2).is_nominal(), "an all-NA column loads as nominal");
    let template = load(dir.path(), "template.csv", "id,price\n7,?\n8,?\n");

    let config = PipelineConfig {
        folds: 3,
        coerce_range: "2-3".to_string(),
        ..PipelineConfig::default()
    };
    let model = ModelConfig::new(ModelType::DecisionTree {
        max_depth: 3,
        min_leaf_weight: 1.0,
        use_gain_ratio: true,
    });
    let outcome = Pipeline::new(config, model).run(&train, &test, &template).unwrap();
    assert!(!outcome.report.placeholder_target);

    let out = dir.path().join("submission.csv");
    write_csv(&outcome.submission, &out).unwrap();
    assert_eq!(fs::read_to_string(&out).unwrap(), "id,price\n7,100\n8,200\n");
}

#[test]
fn missing_target_column_is_reported_as_schema_diff() {
    let dir = tempfile::tempdir().unwrap();
    let mut train = load(dir.path(), "train.csv", TRAIN);
    train.set_class("price").unwrap();
    let test = load(dir.path(), "test.csv", "id,zone,age\n11,B,30\n");

    match align(&train, &test) {
        Err(PipelineError::SchemaMismatch(diff)) => {
            assert_eq!((diff.train_count, diff.test_count), (4, 3));
            let text = diff.to_string();
            assert!(text.contains("price"), "{}", text);
        }
        other => panic!("expected a schema mismatch, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn cross_validation_is_deterministic_per_seed() {
    let rows: String = (0..25)
        .map(|i| format!("{},{}\n", i, if i % 3 == 0 { "x" } else { "y" }))
        .collect();
    let dir = tempfile::tempdir().unwrap();
    let mut ds = load(dir.path(), "cv.csv", &format!("n,label\n{}", rows));
    ds.set_class("label").unwrap();

    let first = partition(25, 5, 1).unwrap();
    assert!(first.iter().all(|f| f.len() == 5));
    assert_ne!(first, partition(25, 5, 2).unwrap());

    let config = ModelConfig::new(ModelType::decision_tree());
    let factory = || -> Box<dyn Classifier> { build_model(&config) };
    let a = cross_validate(&ds, &factory, 5, 1).unwrap();
    let b = cross_validate(&ds, &factory, 5, 1).unwrap();
    assert_eq!(a, b);
    let held_out: Vec<Vec<usize>> = a.folds.iter().map(|f| f.rows.clone()).collect();
    assert_eq!(held_out, first);

    assert!(matches!(
        cross_validate(&ds, &factory, 1, 1),
        Err(PipelineError::Configuration {
            stage: Stage::CrossValidate,
            ..
        })
    ));
}
