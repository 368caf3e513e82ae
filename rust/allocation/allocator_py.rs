//! Wrapper module to export the period allocator to Python using pyo3 bindings.

use chrono::NaiveDate;
use numpy::{IntoPyArray, PyArray1, PyArray2};
use pyo3::prelude::*;

use crate::allocation::{increment_adjust, DatedItem, PeriodAllocator};
use crate::calendars::PeriodTaxonomy;
use crate::json::JSON;
use ndarray::{Array1, Array2, Axis};

/// A period taxonomy with the allocation operations over it.
#[pyclass(name = "PeriodAllocator", module = "farm_rotations.rs")]
#[derive(Clone)]
pub(crate) struct PyPeriodAllocator {
    taxonomy: PeriodTaxonomy,
}

#[pymethods]
impl PyPeriodAllocator {
    #[new]
    #[pyo3(signature = (name, boundaries, hard_boundaries=None))]
    fn new_py(
        name: &str,
        boundaries: Vec<NaiveDate>,
        hard_boundaries: Option<Vec<NaiveDate>>,
    ) -> PyResult<Self> {
        let mut taxonomy = PeriodTaxonomy::try_new(name, boundaries)?;
        for date in hard_boundaries.unwrap_or_default() {
            taxonomy = taxonomy.with_hard_boundary(date)?;
        }
        Ok(PyPeriodAllocator { taxonomy })
    }

    #[getter]
    fn keys(&self) -> Vec<String> {
        self.taxonomy.keys().to_vec()
    }

    #[getter]
    fn boundaries(&self) -> Vec<NaiveDate> {
        self.taxonomy.boundaries().to_vec()
    }

    #[pyo3(name = "allocate", signature = (start, length=0))]
    fn allocate_py<'py>(
        &self,
        py: Python<'py>,
        start: NaiveDate,
        length: i64,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        let alloc = PeriodAllocator::new(&self.taxonomy).allocate(&start, length)?;
        Ok(alloc.into_pyarray(py))
    }

    /// Allocate many items; the result is indexed `[period, item]`.
    #[pyo3(name = "allocate_many")]
    fn allocate_many_py<'py>(
        &self,
        py: Python<'py>,
        starts: Vec<NaiveDate>,
        lengths: Vec<i64>,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let starts = Array1::from(starts);
        let lengths = Array1::from(lengths);
        let table = PeriodAllocator::new(&self.taxonomy).allocate_many(starts.view(), lengths.view())?;
        Ok(table.values.into_pyarray(py))
    }

    #[pyo3(name = "period_totals")]
    fn period_totals_py<'py>(
        &self,
        py: Python<'py>,
        items: Vec<(NaiveDate, i64, f64)>,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        let items: Vec<(DatedItem, f64)> = items
            .into_iter()
            .map(|(start, length, amount)| (DatedItem::new(start, length), amount))
            .collect();
        let totals = PeriodAllocator::new(&self.taxonomy).period_totals(&items)?;
        Ok(totals.into_pyarray(py))
    }

    #[pyo3(name = "to_json")]
    fn to_json_py(&self) -> PyResult<String> {
        Ok(self.taxonomy.to_json().map_err(crate::error::Error::from)?)
    }
}

/// Commitment to date of a `[row, period]` requirement.
#[pyfunction]
#[pyo3(name = "increment_adjust")]
pub(crate) fn increment_adjust_py<'py>(
    py: Python<'py>,
    param: Vec<Vec<f64>>,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let rows = param.len();
    let cols = param.first().map_or(0, |r| r.len());
    let flat: Vec<f64> = param.into_iter().flatten().collect();
    let param = Array2::from_shape_vec((rows, cols), flat).map_err(|e| {
        pyo3::exceptions::PyValueError::new_err(format!("ragged requirement table: {}", e))
    })?;
    Ok(increment_adjust(&param, Axis(1)).into_pyarray(py))
}
