//! Shared fixtures: a small tree ensemble over the default car schema

#![allow(dead_code)]

use car_price_engine::normalizer::RawInput;
use car_price_engine::pipeline::{
    Aggregation, FeatureEncoder, ModelArtifact, RegressionModel, TreeEnsemble, TreeNode,
};
use car_price_engine::schema::FeatureSchema;
use std::path::PathBuf;
use tempfile::TempDir;

fn leaf(value: f64, n_samples: usize, impurity: f64) -> TreeNode {
    TreeNode::Leaf { value, n_samples, impurity }
}

fn split(
    feature_idx: usize,
    threshold: f64,
    left: TreeNode,
    right: TreeNode,
    n_samples: usize,
    impurity: f64,
) -> TreeNode {
    TreeNode::Split {
        feature_idx,
        threshold,
        left: Box::new(left),
        right: Box::new(right),
        n_samples,
        impurity,
    }
}

/// Two-tree forest: age and BMW in one tree, mileage in the other.
///
/// A five-year-old non-BMW with 50,000 km predicts (700,000 + 650,000) / 2.
pub fn car_artifact() -> ModelArtifact {
    let schema = FeatureSchema::car_default();
    let encoder = FeatureEncoder::from_schema(&schema).unwrap();
    let names = encoder.feature_names_out();
    let idx = |name: &str| names.iter().position(|n| n == name).unwrap();

    let age_tree = split(
        idx("Car_Age"),
        6.0,
        split(idx("Brand_BMW"), 0.5, leaf(700_000.0, 50, 0.1), leaf(2_500_000.0, 10, 0.1), 60, 0.5),
        leaf(400_000.0, 40, 0.2),
        100,
        1.0,
    );
    let mileage_tree = split(
        idx("Mileage"),
        80_000.0,
        leaf(650_000.0, 60, 0.3),
        leaf(380_000.0, 40, 0.3),
        100,
        0.8,
    );

    let model = RegressionModel::TreeEnsemble(TreeEnsemble {
        n_features: encoder.n_features_out(),
        trees: vec![age_tree, mileage_tree],
        aggregation: Aggregation::Mean,
        learning_rate: 1.0,
        base_score: 0.0,
        feature_importances: None,
    });

    ModelArtifact::new("car-forest-fixture", schema, encoder, model)
}

/// Write an artifact into a fresh temp dir, returning the dir guard, path and digest
pub fn write_artifact(artifact: &ModelArtifact) -> (TempDir, PathBuf, String) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("car_price_artifact.json");
    let digest = artifact.save(&path).unwrap();
    (dir, path, digest)
}

pub fn corolla_json() -> serde_json::Value {
    serde_json::json!({
        "Brand": "Toyota",
        "Model": "Corolla",
        "Car_Age": 5,
        "Mileage": 50000,
        "Engine_Size": 1.8,
        "Fuel_Type": "Petrol",
        "Transmission": "Automatic",
        "Fuel_Efficiency": 15.0,
        "Previous_Owners": 1,
        "Demand_Trend": 3,
        "Accident_History": 0,
        "Car_Condition_Score": 8.5,
        "Service_History": 1
    })
}

pub fn corolla() -> RawInput {
    serde_json::from_value(corolla_json()).unwrap()
}
