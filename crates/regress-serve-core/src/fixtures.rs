//! Artifact fixtures for tests and benchmarks.
//!
//! Compiled for this crate's own tests and, through the `test-utils`
//! feature, for downstream integration tests.
//!
//! The EV linear model predicts `42.8` for [`ev_request`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};

use crate::contract::DEFAULT_FEATURES;

/// Prediction of [`ev_linear_predictor`] for [`ev_request`].
pub const EV_LINEAR_PREDICTION: f64 = 42.8;

/// Prediction of [`ev_forest_predictor`] for [`ev_request`].
pub const EV_FOREST_PREDICTION: f64 = 25.0;

/// Feature names of the EV fixtures, in model input order.
#[must_use]
pub fn ev_feature_names() -> Vec<String> {
    DEFAULT_FEATURES.iter().map(|(n, _)| (*n).to_string()).collect()
}

/// Linear EV model that records `feature_names_in` and refuses unknown
/// drivetrains.
#[must_use]
pub fn ev_linear_predictor() -> Value {
    let mut doc = ev_linear_predictor_without_names();
    doc["feature_names_in"] = json!(ev_feature_names());
    doc
}

/// Same model as [`ev_linear_predictor`] without introspectable names.
#[must_use]
pub fn ev_linear_predictor_without_names() -> Value {
    json!({
        "kind": "linear",
        "intercept": 10.0,
        "columns": [
            {"type": "numeric", "coefficient": -2.0, "center": 7.0},
            {"type": "numeric", "coefficient": 0.05},
            {"type": "numeric", "coefficient": 0.01},
            {"type": "numeric", "coefficient": 0.1},
            {"type": "numeric", "coefficient": -0.02},
            {"type": "numeric", "coefficient": 0.01},
            {"type": "numeric", "coefficient": 0.5},
            {"type": "numeric", "coefficient": 0.0001},
            {
                "type": "categorical",
                "weights": {"AWD": 3.0, "RWD": 1.0, "FWD": 0.0},
                "handle_unknown": "error"
            }
        ]
    })
}

/// Single-tree forest over the EV features: a top-speed split followed by
/// an AWD split.
#[must_use]
pub fn ev_forest_predictor() -> Value {
    json!({
        "kind": "forest",
        "feature_names_in": ev_feature_names(),
        "n_features": 9,
        "base_score": 5.0,
        "categories": {"8": ["AWD", "FWD", "RWD"]},
        "trees": [{
            "split_indices": [1, 8, 0, 0, 0],
            "thresholds": [200.0, 0.0, 0.0, 0.0, 0.0],
            "children_left": [1, 3, 0, 0, 0],
            "children_right": [2, 4, 0, 0, 0],
            "default_left": [true, true, true, true, true],
            "leaf_values": [0.0, 0.0, 30.0, 10.0, 20.0],
            "category_sets": {"1": [0]}
        }]
    })
}

/// Bundle storing `predictor` under `key` with a declared contract.
#[must_use]
pub fn bundle(key: &str, predictor: Value, features: Value, metadata: Option<Value>) -> Value {
    let mut doc = Map::new();
    doc.insert(key.to_string(), predictor);
    doc.insert("contract".to_string(), json!({ "features": features }));
    if let Some(metadata) = metadata {
        doc.insert("metadata".to_string(), metadata);
    }
    Value::Object(doc)
}

/// The canonical valid EV request.
#[must_use]
pub fn ev_request() -> Map<String, Value> {
    let Value::Object(map) = json!({
        "Acceleration": 5.0,
        "TopSpeed_KmH": 180,
        "Range_Km": 420,
        "Battery_kWh": 75,
        "Efficiency_WhKm": 170,
        "FastCharge_kW": 150,
        "Seats": 5,
        "PriceEuro": 45000,
        "PowerTrain": "AWD"
    }) else {
        unreachable!("object literal")
    };
    map
}

/// Write `doc` as pretty JSON to `dir/name`.
pub fn write_artifact(dir: &Path, name: &str, doc: &Value) -> io::Result<PathBuf> {
    let path = dir.join(name);
    let bytes = serde_json::to_vec_pretty(doc).map_err(io::Error::other)?;
    fs::write(&path, bytes)?;
    Ok(path)
}
