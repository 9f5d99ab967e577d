use tabula_classifiers::config::{ModelConfig, ModelType};
use tabula_classifiers::dataset::{Attribute, Dataset, Value};
use tabula_classifiers::models::factory;

fn two_clusters() -> Dataset {
    let rows = vec![
        vec![Value::Number(1.0), Value::Number(0.0), Value::text("pos")],
        vec![Value::Number(0.0), Value::Number(1.0), Value::text("neg")],
        vec![Value::Number(1.0), Value::Number(0.1), Value::text("pos")],
        vec![Value::Number(0.0), Value::Number(0.9), Value::text("neg")],
        vec![Value::Number(1.1), Value::Number(0.0), Value::text("pos")],
        vec![Value::Number(0.0), Value::Number(1.2), Value::text("neg")],
    ];
    let mut ds = Dataset::from_rows(
        "clusters",
        vec![
            Attribute::numeric("a"),
            Attribute::numeric("b"),
            Attribute::nominal("label", vec!["pos".into(), "neg".into()]),
        ],
        rows,
    )
    .expect("failed to build dataset");
    ds.set_class("label").expect("label column exists");
    ds
}

#[test]
fn test_factory_builds_and_predicts() {
    let ds = two_clusters();
    let tree = ModelType::DecisionTree {
        max_depth: 4,
        min_leaf_weight: 1.0,
        use_gain_ratio: true,
    };
    let model_types = vec![
        tree.clone(),
        ModelType::AdaBoost {
            rounds: 5,
            base: Box::new(tree),
        },
        ModelType::Gbdt {
            max_depth: 3,
            iterations: 10,
            shrinkage: 0.3,
        },
    ];

    for model_type in model_types {
        let mut model = factory::build_model(&ModelConfig::new(model_type.clone()));
        model.fit(&ds).unwrap();
        assert_eq!(model.class_labels(), ["pos", "neg"]);
        for instance in ds.instances() {
            let dist = model.distribution(instance).unwrap();
            assert_eq!(dist.len(), 2);
            assert!((dist.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            assert_eq!(
                &model.predict(instance).unwrap(),
                instance.value(2),
                "{} misclassified a training instance",
                model_type.name()
            );
        }
    }
}

#[test]
fn test_majority_ignores_features() {
    let ds = two_clusters().with_weights(&[3.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
    let mut model = factory::build_model(&ModelConfig::new(ModelType::Majority));
    model.fit(&ds).unwrap();
    assert_eq!(model.predict(ds.instance(1)).unwrap(), Value::text("pos"));
}
