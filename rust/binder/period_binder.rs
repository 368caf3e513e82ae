use ndarray::{Array2, Array3, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::allocation::{increment_adjust, DatedItem, PeriodAllocator};
use crate::calendars::PeriodTaxonomy;
use crate::error::{Error, Result};
use crate::json::JSON;
use crate::rotations::{RotationConfig, RotationSet};
use crate::seasons::{SeasonBranchModel, Transfer, TransferMasks};

/// One entry of the rotation constraint of a history in a rotation period.
///
/// Phase area selected for season `z8` provides the history to season `z9` (coefficient `-1`)
/// and phase area of season `z9` requires it (coefficient `+1`, with `z8 == z9`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AreaTransfer {
    pub phase: usize,
    pub history: usize,
    pub period: usize,
    pub z8: usize,
    pub z9: usize,
    pub coefficient: f64,
}

/// A dated cost or labour item attached to a phase.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseItem {
    pub phase: usize,
    pub item: DatedItem,
    pub amount: f64,
}

/// Every coefficient the binder hands to the LP builder, keyed by position in the key vectors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotationCoefficients {
    pub phases: Vec<String>,
    pub histories: Vec<String>,
    pub periods: Vec<String>,
    pub seasons: Vec<String>,
    /// `(phase, history, coefficient)` of the rotation constraint, before season masking.
    pub rotation: Vec<(usize, usize, f64)>,
    /// `[phase, period]`: `1` where phase area carries into the next period.
    pub dry_sow_carry: Array2<f64>,
    pub area_transfer: Vec<AreaTransfer>,
}

impl JSON for RotationCoefficients {}

/// Binds generated phases to the rotation periods and seasons of a model run.
#[derive(Clone, Debug)]
pub struct RotationPeriodBinder<'a> {
    rotations: &'a RotationSet,
    seasons: &'a SeasonBranchModel,
    periods: &'a PeriodTaxonomy,
    masks: TransferMasks,
    dry_sow_carry: Array2<f64>,
}

impl<'a> RotationPeriodBinder<'a> {
    /// `periods` is the rotation phase taxonomy. The dry-sown land uses are the members of the
    /// rotation config's `dry_sown_set`, which must be configured.
    pub fn try_new(
        config: &RotationConfig,
        rotations: &'a RotationSet,
        seasons: &'a SeasonBranchModel,
        periods: &'a PeriodTaxonomy,
    ) -> Result<Self> {
        let catalog = config.catalog()?;
        catalog.named_set(&config.dry_sown_set)?;
        let last = periods.len() - 1;
        let dry_sow_carry = Array2::from_shape_fn((rotations.phases.len(), periods.len()), |(r, m)| {
            let carries = m < last
                || rotations.phases[r]
                    .newest()
                    .is_some_and(|lu| catalog.belongs_to(lu, &config.dry_sown_set));
            if carries {
                1.0
            } else {
                0.0
            }
        });
        debug!(
            dry_sown = dry_sow_carry.column(last).sum(),
            phases = rotations.phases.len(),
            "phases carried over the year end"
        );
        Ok(RotationPeriodBinder {
            rotations,
            seasons,
            periods,
            masks: seasons.transfer_masks(periods),
            dry_sow_carry,
        })
    }

    pub fn n_phases(&self) -> usize {
        self.rotations.phases.len()
    }

    pub fn n_periods(&self) -> usize {
        self.periods.len()
    }

    pub fn masks(&self) -> &TransferMasks {
        &self.masks
    }

    /// `[phase, period]` carry mask: ones, except in the last period where only phases whose
    /// current land use is dry sown carry into the first period of the next year.
    pub fn dry_sow_carry(&self) -> ArrayView2<'_, f64> {
        self.dry_sow_carry.view()
    }

    /// `[z8, z9]` require coefficients of phase area in a period.
    pub fn area_require(&self, period: usize) -> Array2<f64> {
        self.masks
            .transfer_mask(period, Transfer::Require)
            .mapv(|b| if b { 1.0 } else { 0.0 })
    }

    /// `[phase, z8, z9]` provide coefficients of phase area in a period.
    pub fn area_provide(&self, period: usize) -> Array3<f64> {
        let provide = self.masks.transfer_mask(period, Transfer::Provide);
        let n_z = self.seasons.len();
        Array3::from_shape_fn((self.n_phases(), n_z, n_z), |(r, z8, z9)| {
            if provide[[z8, z9]] {
                self.dry_sow_carry[[r, period]]
            } else {
                0.0
            }
        })
    }

    /// Sparse area-transfer coefficients of a period: the history relation crossed with the
    /// season masks.
    pub fn area_transfer(&self, period: usize) -> Vec<AreaTransfer> {
        let require = self.masks.transfer_mask(period, Transfer::Require);
        let provide = self.masks.transfer_mask(period, Transfer::Provide);
        let pairs = |mask: &Array2<bool>| -> Vec<(usize, usize)> {
            mask.indexed_iter()
                .filter(|(_, v)| **v)
                .map(|(ix, _)| ix)
                .collect()
        };
        let require = pairs(&require);
        let provide = pairs(&provide);

        let mut out = Vec::new();
        for (r, h) in self.rotations.relation.requires() {
            for (z8, z9) in require.iter() {
                out.push(AreaTransfer {
                    phase: *r,
                    history: *h,
                    period,
                    z8: *z8,
                    z9: *z9,
                    coefficient: 1.0,
                });
            }
        }
        for (r, h) in self.rotations.relation.provides() {
            let carry = self.dry_sow_carry[[*r, period]];
            if carry == 0.0 {
                continue;
            }
            for (z8, z9) in provide.iter() {
                out.push(AreaTransfer {
                    phase: *r,
                    history: *h,
                    period,
                    z8: *z8,
                    z9: *z9,
                    coefficient: -carry,
                });
            }
        }
        out
    }

    /// Commitment to date of a `[phase, period]` requirement, see [`increment_adjust`].
    pub fn commitment(&self, param: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let expected = (self.n_phases(), self.n_periods());
        if param.dim() != expected {
            return Err(Error::config(format!(
                "phase requirement has shape {:?}, expected {:?}",
                param.dim(),
                expected
            )));
        }
        Ok(increment_adjust(&param, Axis(1)))
    }

    /// Allocate phase items into the rotation periods and return their commitment to date.
    pub fn item_commitment(&self, items: &[PhaseItem]) -> Result<Array2<f64>> {
        let allocator = PeriodAllocator::new(self.periods);
        let mut param = Array2::<f64>::zeros((self.n_phases(), self.n_periods()));
        for item in items.iter() {
            if item.phase >= self.n_phases() {
                return Err(Error::config(format!(
                    "item refers to phase {} but only {} phases exist",
                    item.phase,
                    self.n_phases()
                )));
            }
            let alloc = allocator.allocate_item(&item.item)?;
            param.row_mut(item.phase).scaled_add(item.amount, &alloc);
        }
        self.commitment(param.view())
    }

    /// Collect every coefficient of the run.
    pub fn coefficients(&self) -> RotationCoefficients {
        RotationCoefficients {
            phases: self.rotations.phase_keys(),
            histories: self.rotations.history_keys(),
            periods: self.periods.keys().to_vec(),
            seasons: self.seasons.seasons().keys().to_vec(),
            rotation: self.rotations.relation.coefficients(),
            dry_sow_carry: self.dry_sow_carry.clone(),
            area_transfer: (0..self.n_periods())
                .flat_map(|m| self.area_transfer(m))
                .collect(),
        }
    }
}

// UNIT TESTS
#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendars::nd;
    use crate::rotations::RotationGenerator;
    use crate::seasons::{SeasonConfig, SeasonInput};
    use indexmap::IndexMap;
    use ndarray::arr2;

    fn strs(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    fn fixture_rotation_config() -> RotationConfig {
        let mut sets = IndexMap::new();
        sets.insert("E".to_string(), strs(&["E", "w", "b"]));
        sets.insert("N".to_string(), strs(&["N", "r"]));
        sets.insert("dry_sown".to_string(), strs(&["b"]));
        RotationConfig {
            depth: 3,
            slots: vec![strs(&["E", "N"]), strs(&["E", "N"]), strs(&["w", "b", "r"])],
            sets,
            rules: vec![],
            allow_list: vec![strs(&["r", "w", "b"])],
            continuous: vec![],
            fixed_phases: None,
            dry_sown_set: "dry_sown".to_string(),
        }
    }

    fn fixture_seasons() -> SeasonBranchModel {
        let season = |name: &str, initiation| SeasonInput {
            name: name.to_string(),
            initiation,
            probability: 0.5,
            active: true,
        };
        SeasonBranchModel::from_config(&SeasonConfig {
            season_start: nd(2021, 4, 1),
            steady_state: false,
            seasons: vec![season("z0", nd(2021, 4, 1)), season("z1", nd(2021, 6, 30))],
        })
        .unwrap()
    }

    fn fixture_periods() -> PeriodTaxonomy {
        PeriodTaxonomy::try_new(
            "m",
            vec![nd(2021, 4, 1), nd(2021, 6, 1), nd(2021, 10, 1), nd(2022, 4, 1)],
        )
        .unwrap()
    }

    #[test]
    fn test_dry_sow_carry() {
        let config = fixture_rotation_config();
        let rotations = RotationGenerator::try_new(&config).unwrap().generate().unwrap();
        let seasons = fixture_seasons();
        let periods = fixture_periods();
        let binder = RotationPeriodBinder::try_new(&config, &rotations, &seasons, &periods).unwrap();
        assert_eq!(rotations.phase_keys(), vec!["EEr", "ENw", "NEb"]);
        assert_eq!(
            binder.dry_sow_carry(),
            arr2(&[[1.0, 1.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0]])
        );
    }

    #[test]
    fn test_missing_dry_sown_set() {
        let mut config = fixture_rotation_config();
        config.dry_sown_set = "early_sown".to_string();
        let rotations = RotationGenerator::try_new(&config).unwrap().generate().unwrap();
        let seasons = fixture_seasons();
        let periods = fixture_periods();
        assert!(RotationPeriodBinder::try_new(&config, &rotations, &seasons, &periods).is_err());
    }

    #[test]
    fn test_area_transfer_first_and_last_period() {
        let config = fixture_rotation_config();
        let rotations = RotationGenerator::try_new(&config).unwrap().generate().unwrap();
        let seasons = fixture_seasons();
        let periods = fixture_periods();
        let binder = RotationPeriodBinder::try_new(&config, &rotations, &seasons, &periods).unwrap();

        // z1 is unidentified in the first period, z0 provides to itself and branches into z1
        assert_eq!(binder.area_require(0), arr2(&[[1.0, 0.0], [0.0, 0.0]]));
        let first = binder.area_transfer(0);
        assert_eq!(first.iter().filter(|t| t.coefficient > 0.0).count(), 3);
        assert_eq!(first.iter().filter(|t| t.coefficient < 0.0).count(), 6);
        assert!(first.contains(&AreaTransfer {
            phase: 0,
            history: 1,
            period: 0,
            z8: 0,
            z9: 1,
            coefficient: -1.0,
        }));

        // only the dry sown phase NEb carries over the year end, into the root season
        let last = binder.area_transfer(2);
        assert_eq!(last.iter().filter(|t| t.coefficient > 0.0).count(), 6);
        let provided: Vec<(usize, usize, usize, usize)> = last
            .iter()
            .filter(|t| t.coefficient < 0.0)
            .map(|t| (t.phase, t.history, t.z8, t.z9))
            .collect();
        assert_eq!(provided, vec![(2, 0, 0, 0), (2, 0, 1, 0)]);

        let provide = binder.area_provide(2);
        assert_eq!(provide[[2, 1, 0]], 1.0);
        assert_eq!(provide[[0, 1, 0]], 0.0);
        assert_eq!(provide.sum(), 2.0);
    }

    #[test]
    fn test_item_commitment() {
        let config = fixture_rotation_config();
        let rotations = RotationGenerator::try_new(&config).unwrap().generate().unwrap();
        let seasons = fixture_seasons();
        let periods = fixture_periods();
        let binder = RotationPeriodBinder::try_new(&config, &rotations, &seasons, &periods).unwrap();
        let items = vec![
            PhaseItem {
                phase: 0,
                item: DatedItem::point(nd(2021, 7, 1)),
                amount: 10.0,
            },
            PhaseItem {
                phase: 2,
                item: DatedItem::new(nd(2021, 4, 1), 61),
                amount: 6.0,
            },
        ];
        let commitment = binder.item_commitment(&items).unwrap();
        assert_eq!(
            commitment,
            arr2(&[[0.0, 0.0, 10.0], [0.0, 0.0, 0.0], [0.0, 6.0, 6.0]])
        );

        let wrong_shape = Array2::<f64>::zeros((2, 3));
        assert!(binder.commitment(wrong_shape.view()).is_err());
        let bad = [PhaseItem {
            phase: 3,
            item: DatedItem::point(nd(2021, 7, 1)),
            amount: 1.0,
        }];
        assert!(binder.item_commitment(&bad).is_err());
    }

    #[test]
    fn test_coefficients_collected() {
        let config = fixture_rotation_config();
        let rotations = RotationGenerator::try_new(&config).unwrap().generate().unwrap();
        let seasons = fixture_seasons();
        let periods = fixture_periods();
        let binder = RotationPeriodBinder::try_new(&config, &rotations, &seasons, &periods).unwrap();
        let coefficients = binder.coefficients();
        assert_eq!(coefficients.seasons, vec!["z0", "z1"]);
        assert_eq!(coefficients.periods.len(), 3);
        assert_eq!(coefficients.rotation.len(), 6);
        let per_period: usize = (0..3).map(|m| binder.area_transfer(m).len()).sum();
        assert_eq!(coefficients.area_transfer.len(), per_period);
        let json = coefficients.to_json().unwrap();
        assert_eq!(RotationCoefficients::from_json(&json).unwrap(), coefficients);
    }
}
