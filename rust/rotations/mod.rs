//! Rotation phase generation.
//!
//! A **phase** is a sequence of land uses over the previous `depth - 1` years and the current
//! year. The [`RotationGenerator`] enumerates the product of candidate land uses per year, removes
//! agronomically illegal or unprofitable sequences with [`ExclusionRule`]s and derives the
//! [`HistoryRelation`]: which histories a phase requires at the start of the year and which it
//! provides for the next. Generation is expensive for deep rotations, so a [`RotationCache`]
//! keeps the result on disk alongside the configuration that produced it.
//!
//! ### Example
//! ```rust
//! # use farm_rotations::rotations::{RotationConfig, RotationGenerator};
//! let config = RotationConfig {
//!     depth: 2,
//!     slots: vec![vec!["E".into(), "N".into()], vec!["E".into(), "N".into()]],
//!     sets: Default::default(),
//!     rules: vec![],
//!     allow_list: vec![],
//!     continuous: vec![],
//!     fixed_phases: None,
//!     dry_sown_set: "dry_sown".into(),
//! };
//! let set = RotationGenerator::try_new(&config).unwrap().generate().unwrap();
//! assert_eq!(set.phase_keys(), vec!["EE", "EN", "NE", "NN"]);
//! assert_eq!(set.history_keys(), vec!["E", "N"]);
//! ```

mod cache;
mod generator;
mod landuse;
mod phase;
mod relation;
mod rules;

#[cfg(feature = "python")]
pub(crate) mod generator_py;

pub use crate::rotations::{
    cache::{RotationCache, Staleness, CACHE_FORMAT_VERSION},
    generator::{ContinuousPhase, RotationConfig, RotationGenerator, RotationSet},
    landuse::{LandUse, LandUseCatalog, LandUseSet},
    phase::{History, Phase},
    relation::HistoryRelation,
    rules::{CompiledRule, ExclusionRule, PhaseRule, Rule, RuleKind},
};
