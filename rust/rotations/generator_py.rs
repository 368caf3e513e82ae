//! Wrapper module to export rotation generation to Python using pyo3 bindings.

use pyo3::prelude::*;
use std::path::PathBuf;

use crate::error::Error;
use crate::json::JSON;
use crate::rotations::{RotationCache, RotationConfig, RotationGenerator, RotationSet};

/// Phase keys, history keys and `(phase, history, coefficient)` rotation coefficients.
type RotationTables = (Vec<String>, Vec<String>, Vec<(usize, usize, f64)>);

fn tables(set: &RotationSet) -> RotationTables {
    (
        set.phase_keys(),
        set.history_keys(),
        set.relation.coefficients(),
    )
}

/// Generate the rotation phases of a rotation configuration given as JSON.
///
/// With `cache` the result is read from, or written to, that file.
#[pyfunction]
#[pyo3(name = "generate_rotations", signature = (config, cache=None, force=false))]
pub(crate) fn generate_rotations_py(
    config: &str,
    cache: Option<PathBuf>,
    force: bool,
) -> PyResult<RotationTables> {
    let config = RotationConfig::from_json(config).map_err(Error::from)?;
    let set = match cache {
        Some(path) => RotationCache::new(path).load_or_generate(&config, None, force)?,
        None => RotationGenerator::try_new(&config)?.generate()?,
    };
    Ok(tables(&set))
}
