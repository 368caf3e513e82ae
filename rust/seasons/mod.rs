//! Weather-year seasons and the branching of decisions between them.
//!
//! A stochastic model run carries one copy of every decision per season. Early in the farm year
//! the seasons cannot be told apart, so the [`SeasonBranchModel`] records when each season is
//! identified and from which parent season it branches, and builds the [`TransferMasks`] that tie
//! quantities carried between periods to the right season.
//!
//! ### Example
//! ```rust
//! # use farm_rotations::calendars::{nd, blocks, PeriodTaxonomy};
//! # use farm_rotations::seasons::{SeasonBranchModel, SeasonConfig, SeasonInput};
//! let config = SeasonConfig {
//!     season_start: nd(2021, 4, 1),
//!     steady_state: false,
//!     seasons: vec![
//!         SeasonInput { name: "early".into(), initiation: nd(2021, 4, 1), probability: 0.5, active: true },
//!         SeasonInput { name: "late".into(), initiation: nd(2021, 6, 30), probability: 0.5, active: true },
//!     ],
//! };
//! let model = SeasonBranchModel::from_config(&config).unwrap();
//! let tax = PeriodTaxonomy::try_new("p7", blocks(nd(2021, 4, 1), 30, 12)).unwrap();
//! assert_eq!(model.parent(1), 0);
//! assert_eq!(model.identification_period(1, &tax), Some(3));
//! ```

mod branch;
mod masks;
mod season;

#[cfg(feature = "python")]
pub(crate) mod branch_py;

pub use crate::seasons::{
    branch::SeasonBranchModel,
    masks::{Transfer, TransferMasks},
    season::{SeasonConfig, SeasonInput, SeasonSet},
};
