//! Wrapper module to export the season branching model to Python using pyo3 bindings.

use numpy::{IntoPyArray, PyArray2, PyArray3};
use pyo3::prelude::*;

use crate::calendars::PeriodTaxonomy;
use crate::json::JSON;
use crate::seasons::{SeasonBranchModel, SeasonConfig, Transfer, TransferMasks};

/// The season branching of a model run, built from a season configuration as JSON.
#[pyclass(name = "SeasonBranchModel", module = "farm_rotations.rs")]
#[derive(Clone)]
pub(crate) struct PySeasonBranchModel {
    inner: SeasonBranchModel,
}

fn taxonomy_from_json(json: &str) -> PyResult<PeriodTaxonomy> {
    Ok(PeriodTaxonomy::from_json(json).map_err(crate::error::Error::from)?)
}

#[pymethods]
impl PySeasonBranchModel {
    #[new]
    fn new_py(config: &str) -> PyResult<Self> {
        let config = SeasonConfig::from_json(config).map_err(crate::error::Error::from)?;
        Ok(PySeasonBranchModel {
            inner: SeasonBranchModel::from_config(&config)?,
        })
    }

    #[getter]
    fn keys(&self) -> Vec<String> {
        self.inner.seasons().keys().to_vec()
    }

    #[getter]
    fn probabilities(&self) -> Vec<f64> {
        self.inner.seasons().probabilities().to_vec()
    }

    #[getter]
    fn parents(&self) -> Vec<usize> {
        self.inner.parents().to_vec()
    }

    fn initiating_parent(&self, season: usize) -> usize {
        self.inner.initiating_parent(season)
    }

    /// `[period, season]` identification over a taxonomy given as JSON.
    fn identification<'py>(
        &self,
        py: Python<'py>,
        taxonomy: &str,
    ) -> PyResult<Bound<'py, PyArray2<bool>>> {
        let taxonomy = taxonomy_from_json(taxonomy)?;
        Ok(self.inner.identification(&taxonomy).into_pyarray(py))
    }

    /// `[period, z8, z9]` masks as float arrays: `(require, provide_within, provide_between)`.
    fn transfer_masks<'py>(
        &self,
        py: Python<'py>,
        taxonomy: &str,
    ) -> PyResult<(
        Bound<'py, PyArray3<f64>>,
        Bound<'py, PyArray3<f64>>,
        Bound<'py, PyArray3<f64>>,
    )> {
        let taxonomy = taxonomy_from_json(taxonomy)?;
        let masks = self.inner.transfer_masks(&taxonomy);
        Ok((
            TransferMasks::as_f64(&masks.require).into_pyarray(py),
            TransferMasks::as_f64(&masks.provide_within).into_pyarray(py),
            TransferMasks::as_f64(&masks.provide_between).into_pyarray(py),
        ))
    }

    /// `[z8, z9]` mask of one period, `direction` is `"require"` or `"provide"`.
    fn transfer_mask<'py>(
        &self,
        py: Python<'py>,
        taxonomy: &str,
        period: usize,
        direction: &str,
    ) -> PyResult<Bound<'py, PyArray2<bool>>> {
        let taxonomy = taxonomy_from_json(taxonomy)?;
        let direction = match direction {
            "require" => Transfer::Require,
            "provide" => Transfer::Provide,
            _ => {
                return Err(pyo3::exceptions::PyValueError::new_err(format!(
                    "`direction` must be 'require' or 'provide', got '{}'",
                    direction
                )))
            }
        };
        if period >= taxonomy.len() {
            return Err(pyo3::exceptions::PyValueError::new_err(format!(
                "period {} is out of range for `{}`",
                period,
                taxonomy.name()
            )));
        }
        let masks = self.inner.transfer_masks(&taxonomy);
        Ok(masks.transfer_mask(period, direction).into_pyarray(py))
    }
}
