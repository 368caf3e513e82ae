//! Scenarios crossing several components, run against the shipped model configuration.

mod rotation_default;
mod season_scenario;

use crate::config::ModelConfig;
use std::path::PathBuf;

pub(crate) fn is_close(a: &f64, b: &f64, abs_tol: Option<f64>) -> bool {
    // used rather than equality for float numbers
    (a - b).abs() < abs_tol.unwrap_or(1e-8)
}

pub(crate) fn fixture_model_config() -> ModelConfig {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("model_default.json");
    ModelConfig::from_path(path).unwrap()
}
