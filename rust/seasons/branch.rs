use chrono::prelude::*;
use chrono::Duration;
use ndarray::{Array2, Array3, Axis};
use tracing::{debug, warn};

use crate::allocation::{DatedItem, PeriodAllocator};
use crate::calendars::{BaseYear, PeriodTaxonomy};
use crate::error::{Error, Result};
use crate::seasons::masks::TransferMasks;
use crate::seasons::season::{SeasonConfig, SeasonSet};

/// The weather-year branching structure of a model run.
///
/// Each season becomes **identified** once its initiation date has been reached within the farm
/// year. Before that the farmer cannot tell it apart from its **parent**, the season it branches
/// from, and decisions taken for it must match the parent's. The parent of a season is the
/// highest indexed season initiating strictly earlier; a season initiating at the season start
/// is a **root** and is its own parent.
///
/// In steady state the single season is always identified and is its own root.
#[derive(Clone, Debug, PartialEq)]
pub struct SeasonBranchModel {
    seasons: SeasonSet,
    parent: Vec<usize>,
    base_year: BaseYear,
}

impl SeasonBranchModel {
    pub fn try_new(seasons: SeasonSet) -> Result<Self> {
        let base_year = BaseYear::new(seasons.season_start);
        let parent = if seasons.steady_state {
            vec![0]
        } else {
            let init = &seasons.initiation;
            if !init.iter().any(|d| *d == seasons.season_start) {
                return Err(Error::config(format!(
                    "no season initiates at the season start {}",
                    seasons.season_start
                )));
            }
            (0..init.len())
                .map(|z| {
                    if init[z] == seasons.season_start {
                        z
                    } else {
                        (0..init.len())
                            .filter(|z_| init[*z_] < init[z])
                            .max()
                            .unwrap_or(z)
                    }
                })
                .collect()
        };
        debug!(?parent, steady_state = seasons.steady_state, "season parents");
        Ok(SeasonBranchModel {
            seasons,
            parent,
            base_year,
        })
    }

    pub fn from_config(config: &SeasonConfig) -> Result<Self> {
        Self::try_new(SeasonSet::try_new(config)?)
    }

    pub fn seasons(&self) -> &SeasonSet {
        &self.seasons
    }

    pub fn len(&self) -> usize {
        self.seasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty()
    }

    pub fn parent(&self, season: usize) -> usize {
        self.parent[season]
    }

    pub fn parents(&self) -> &[usize] {
        &self.parent
    }

    pub fn is_root(&self, season: usize) -> bool {
        self.parent[season] == season
    }

    /// The root season the given season descends from in the season ordering: the highest
    /// indexed root at or below `season`.
    ///
    /// If no root is indexed at or below `season` this is season 0, which is then not a root.
    pub fn initiating_parent(&self, season: usize) -> usize {
        (0..=season).rev().find(|z| self.is_root(*z)).unwrap_or(0)
    }

    /// Whether `season` is identified in `period` of the taxonomy.
    ///
    /// The period is moved into the base year by its start date and the season is identified
    /// when its initiation falls before the period's exclusive end, i.e. from the period containing
    /// the initiation onward.
    pub fn is_identified(&self, season: usize, taxonomy: &PeriodTaxonomy, period: usize) -> bool {
        if self.seasons.steady_state {
            return true;
        }
        let start = self.base_year.adjust(&taxonomy.start(period));
        let end = start + Duration::days(taxonomy.days(period));
        self.seasons.initiation[season] < end
    }

    /// `[period, season]` identification mask.
    pub fn identification(&self, taxonomy: &PeriodTaxonomy) -> Array2<bool> {
        Array2::from_shape_fn((taxonomy.len(), self.len()), |(p, z)| {
            self.is_identified(z, taxonomy, p)
        })
    }

    /// First period in which the season is identified.
    pub fn identification_period(&self, season: usize, taxonomy: &PeriodTaxonomy) -> Option<usize> {
        (0..taxonomy.len()).find(|p| self.is_identified(season, taxonomy, *p))
    }

    /// The season providing for `season` when it becomes identified: its parent, or the nearest
    /// identified ancestor if the parent is not identified yet.
    fn provider(&self, season: usize, identified: impl Fn(usize) -> bool) -> Option<usize> {
        let mut z = self.parent[season];
        loop {
            if identified(z) {
                return Some(z);
            }
            if self.parent[z] == z {
                return None;
            }
            z = self.parent[z];
        }
    }

    /// Build the require and provide masks over the taxonomy.
    ///
    /// - A season requires only from its own provision, in periods it is identified.
    /// - Within the year an identified season provides to itself in the next period, and the
    ///   provider of a season identified in the next period provides to that season.
    /// - In the final period every identified season provides to the root seasons of the next
    ///   year.
    pub fn transfer_masks(&self, taxonomy: &PeriodTaxonomy) -> TransferMasks {
        let n_p = taxonomy.len();
        let n_z = self.len();
        if !self.seasons.steady_state
            && self.base_year.adjust(&taxonomy.start(0)) != self.seasons.season_start
        {
            warn!(
                taxonomy = taxonomy.name(),
                "taxonomy does not begin at the season start, identification may not be monotone"
            );
        }
        let mut masks = TransferMasks::empty(taxonomy.name(), n_p, n_z);
        let identified = self.identification(taxonomy);

        for p in 0..n_p {
            for z in 0..n_z {
                masks.require[[p, z, z]] = identified[[p, z]];
            }
            if p + 1 < n_p {
                for z8 in 0..n_z {
                    if identified[[p, z8]] && identified[[p + 1, z8]] {
                        masks.provide_within[[p, z8, z8]] = true;
                    }
                }
                for z9 in 0..n_z {
                    if identified[[p, z9]] || !identified[[p + 1, z9]] {
                        continue;
                    }
                    match self.provider(z9, |z| identified[[p, z]]) {
                        Some(z8) => masks.provide_within[[p, z8, z9]] = true,
                        None => warn!(
                            season = self.seasons.names[z9].as_str(),
                            period = p,
                            "season has no identified ancestor to branch from"
                        ),
                    }
                }
            } else {
                for z8 in (0..n_z).filter(|z| identified[[p, *z]]) {
                    for z9 in (0..n_z).filter(|z| self.is_root(*z)) {
                        masks.provide_between[[p, z8, z9]] = true;
                    }
                }
            }
        }
        debug!(
            taxonomy = taxonomy.name(),
            periods = n_p,
            seasons = n_z,
            "built season transfer masks"
        );
        masks.identified = identified;
        masks
    }

    /// Allocate items into the allocator's taxonomy and zero the periods in which each season is
    /// not yet identified. The result is indexed `[period, season, item]`.
    pub fn allocate_masked(
        &self,
        allocator: &PeriodAllocator,
        items: &[DatedItem],
    ) -> Result<Array3<f64>> {
        let table = allocator.allocate_items(items)?;
        let identified = self.identification(allocator.taxonomy());
        let n_p = table.n_periods();
        let mut out = Array3::<f64>::zeros((n_p, self.len(), table.n_items()));
        for ((p, z), id) in identified.indexed_iter() {
            if *id {
                out.index_axis_mut(Axis(0), p)
                    .index_axis_mut(Axis(0), z)
                    .assign(&table.values.index_axis(Axis(0), p));
            }
        }
        Ok(out)
    }

    /// The season break date of the base year.
    pub fn season_start(&self) -> NaiveDate {
        self.seasons.season_start
    }
}

// UNIT TESTS
#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendars::{blocks, nd};
    use crate::seasons::masks::Transfer;
    use crate::seasons::season::SeasonInput;

    fn season(name: &str, initiation: NaiveDate) -> SeasonInput {
        SeasonInput {
            name: name.to_string(),
            initiation,
            probability: 1.0,
            active: true,
        }
    }

    fn fixture_config() -> SeasonConfig {
        SeasonConfig {
            season_start: nd(2021, 4, 1),
            steady_state: false,
            seasons: vec![
                season("z0", nd(2021, 4, 1)),
                season("z1", nd(2021, 6, 30)),
            ],
        }
    }

    fn fixture_taxonomy() -> PeriodTaxonomy {
        PeriodTaxonomy::try_new("p7", blocks(nd(2021, 4, 1), 30, 12)).unwrap()
    }

    #[test]
    fn test_parents() {
        let mut config = fixture_config();
        config.seasons.push(season("z2", nd(2021, 5, 1)));
        config.seasons.push(season("z3", nd(2021, 4, 1)));
        config.seasons.push(season("z4", nd(2021, 8, 1)));
        let model = SeasonBranchModel::from_config(&config).unwrap();
        // z1 picks the highest index among z0, z2, z3 which all initiate earlier
        assert_eq!(model.parents(), &[0, 3, 3, 3, 3]);
        assert_eq!(model.initiating_parent(2), 0);
        assert_eq!(model.initiating_parent(4), 3);
    }

    #[test]
    fn test_initiating_parent_without_lower_root() {
        let config = SeasonConfig {
            season_start: nd(2021, 4, 1),
            steady_state: false,
            seasons: vec![
                season("z0", nd(2021, 6, 30)),
                season("z1", nd(2021, 4, 1)),
            ],
        };
        let model = SeasonBranchModel::from_config(&config).unwrap();
        assert_eq!(model.parents(), &[1, 1]);
        assert_eq!(model.initiating_parent(0), 0);
        assert_eq!(model.initiating_parent(1), 1);
    }

    #[test]
    fn test_leap_base_year_identification() {
        let config = SeasonConfig {
            season_start: nd(2019, 4, 1),
            steady_state: false,
            seasons: vec![
                season("z0", nd(2019, 4, 1)),
                season("z1", nd(2019, 6, 1)),
                season("z2", nd(2020, 3, 31)),
            ],
        };
        let model = SeasonBranchModel::from_config(&config).unwrap();
        assert_eq!(model.seasons().initiation()[2], nd(2020, 3, 31));
        assert_eq!(model.parents(), &[0, 0, 1]);

        let tax = PeriodTaxonomy::try_new(
            "p7",
            vec![
                nd(2019, 4, 1),
                nd(2019, 6, 1),
                nd(2019, 10, 1),
                nd(2020, 3, 31),
                nd(2020, 4, 1),
            ],
        )
        .unwrap();
        let identified = model.identification(&tax);
        let z1: Vec<bool> = (0..tax.len()).map(|p| identified[[p, 1]]).collect();
        let z2: Vec<bool> = (0..tax.len()).map(|p| identified[[p, 2]]).collect();
        assert_eq!(z1, vec![false, true, true, true]);
        assert_eq!(z2, vec![false, false, false, true]);
        assert_eq!(model.identification_period(2, &tax), Some(3));
    }

    #[test]
    fn test_no_root_is_error() {
        let mut config = fixture_config();
        config.seasons[0].initiation = nd(2021, 5, 1);
        assert!(SeasonBranchModel::from_config(&config).is_err());
    }

    #[test]
    fn test_identification_from_containing_period() {
        let model = SeasonBranchModel::from_config(&fixture_config()).unwrap();
        let tax = fixture_taxonomy();
        // 2021-06-30 is day 90, the first day of period 3
        assert_eq!(model.identification_period(1, &tax), Some(3));
        assert_eq!(model.identification_period(0, &tax), Some(0));

        let mut config = fixture_config();
        config.seasons[1].initiation = nd(2021, 6, 29);
        let model = SeasonBranchModel::from_config(&config).unwrap();
        assert_eq!(model.identification_period(1, &tax), Some(2));
    }

    #[test]
    fn test_identification_uses_base_year() {
        let model = SeasonBranchModel::from_config(&fixture_config()).unwrap();
        // a taxonomy laid out on the following year
        let tax = PeriodTaxonomy::try_new("p7", blocks(nd(2022, 4, 1), 30, 12)).unwrap();
        assert_eq!(model.identification_period(1, &tax), Some(3));
    }

    #[test]
    fn test_branch_masks() {
        let model = SeasonBranchModel::from_config(&fixture_config()).unwrap();
        let tax = fixture_taxonomy();
        let masks = model.transfer_masks(&tax);

        // before identification z0 carries z1's decisions and hands over in period 2
        assert!(masks.provide_within[[1, 0, 0]]);
        assert!(!masks.provide_within[[1, 0, 1]]);
        assert!(masks.provide_within[[2, 0, 0]]);
        assert!(masks.provide_within[[2, 0, 1]]);
        assert!(!masks.provide_within[[2, 1, 1]]);
        assert!(masks.provide_within[[3, 1, 1]]);
        assert!(!masks.provide_within[[3, 0, 1]]);

        // require only on the diagonal once identified
        assert!(!masks.require[[2, 1, 1]]);
        assert!(masks.require[[3, 1, 1]]);
        assert!(!masks.require[[3, 0, 1]]);

        // last period hands both seasons to the single root of the next year
        let last = tax.len() - 1;
        assert!(masks.provide_between[[last, 0, 0]]);
        assert!(masks.provide_between[[last, 1, 0]]);
        assert!(!masks.provide_between[[last, 1, 1]]);
        assert!(masks.within(last).iter().all(|v| !v));
        assert!(masks.between(0).iter().all(|v| !v));
    }

    #[test]
    fn test_every_identified_season_receives_once() {
        let mut config = fixture_config();
        config.seasons.push(season("z2", nd(2021, 9, 15)));
        config.seasons.push(season("z3", nd(2021, 4, 1)));
        let model = SeasonBranchModel::from_config(&config).unwrap();
        let tax = fixture_taxonomy();
        let masks = model.transfer_masks(&tax);
        for p in 0..tax.len() - 1 {
            for z9 in 0..model.len() {
                let received = masks.within(p).column(z9).iter().filter(|v| **v).count();
                let expected = usize::from(masks.identified[[p + 1, z9]]);
                assert_eq!(received, expected, "period {} season {}", p, z9);
            }
        }
        let last = tax.len() - 1;
        for z9 in 0..model.len() {
            let received = masks.between(last).column(z9).iter().filter(|v| **v).count();
            let expected = if model.is_root(z9) { model.len() } else { 0 };
            assert_eq!(received, expected);
        }
    }

    #[test]
    fn test_identification_is_monotone() {
        let mut config = fixture_config();
        config.seasons.push(season("z2", nd(2022, 1, 20)));
        let model = SeasonBranchModel::from_config(&config).unwrap();
        let id = model.identification(&fixture_taxonomy());
        for z in 0..model.len() {
            let col = id.column(z);
            assert!(col.windows(2).into_iter().all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_steady_state_masks() {
        let mut config = fixture_config();
        config.steady_state = true;
        let model = SeasonBranchModel::from_config(&config).unwrap();
        let tax = fixture_taxonomy();
        let masks = model.transfer_masks(&tax);
        assert_eq!(masks.n_seasons(), 1);
        assert!(masks.identified.iter().all(|v| *v));
        let last = tax.len() - 1;
        assert!(masks.transfer_mask(0, Transfer::Provide)[[0, 0]]);
        assert!(masks.transfer_mask(last, Transfer::Provide)[[0, 0]]);
        assert!(masks.transfer_mask(last, Transfer::Require)[[0, 0]]);
    }

    #[test]
    fn test_allocate_masked() {
        let model = SeasonBranchModel::from_config(&fixture_config()).unwrap();
        let tax = fixture_taxonomy();
        let allocator = PeriodAllocator::new(&tax);
        let items = [DatedItem::new(nd(2021, 6, 15), 30)];
        let alloc = model.allocate_masked(&allocator, &items).unwrap();
        assert_eq!(alloc.shape(), &[12, 2, 1]);
        assert_eq!(alloc[[2, 0, 0]], 0.5);
        assert_eq!(alloc[[3, 0, 0]], 0.5);
        assert_eq!(alloc[[2, 1, 0]], 0.0);
        assert_eq!(alloc[[3, 1, 0]], 0.5);
    }
}
