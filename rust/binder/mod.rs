//! Coefficients tying rotation phases to rotation periods and seasons.
//!
//! The [`RotationPeriodBinder`] combines a generated [`RotationSet`](crate::rotations::RotationSet)
//! with the season [`TransferMasks`](crate::seasons::TransferMasks) of the rotation phase
//! taxonomy. It emits the area transfer coefficients of the rotation constraint, the dry-sow carry
//! mask and the commitment to date of phase items.

mod period_binder;

pub use crate::binder::period_binder::{
    AreaTransfer, PhaseItem, RotationCoefficients, RotationPeriodBinder,
};
