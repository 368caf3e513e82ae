//! Rotation, season and period-allocation engine of a whole-farm optimisation model.
//!
//! The crate computes the coefficients an LP builder needs to represent crop and pasture
//! rotations over a farm year with several possible weather-years:
//!
//! - [`allocation`] spreads dated items over the periods of a [`calendars::PeriodTaxonomy`],
//! - [`seasons`] derives the branching of weather-year seasons and its transfer masks,
//! - [`rotations`] enumerates legal rotation phases and the histories linking them,
//! - [`binder`] ties phases to rotation periods and seasons.
//!
//! A run is configured once through [`config::ModelConfig`].

#[cfg(test)]
mod tests;

pub mod json;

pub mod error;
pub use error::{Error, Result};

pub mod logging;

pub mod calendars;

pub mod allocation;

pub mod seasons;

pub mod rotations;

pub mod binder;

pub mod config;

#[cfg(feature = "python")]
use pyo3::prelude::*;

#[cfg(feature = "python")]
#[pymodule]
fn rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Allocation
    m.add_class::<allocation::allocator_py::PyPeriodAllocator>()?;
    m.add_function(wrap_pyfunction!(
        allocation::allocator_py::increment_adjust_py,
        m
    )?)?;

    // Seasons
    m.add_class::<seasons::branch_py::PySeasonBranchModel>()?;

    // Rotations
    m.add_function(wrap_pyfunction!(
        rotations::generator_py::generate_rotations_py,
        m
    )?)?;

    Ok(())
}
