use ndarray::{Array2, Array3, ArrayView2, Axis, Zip};
use serde::{Deserialize, Serialize};

/// Direction of an inter-period transfer as seen from a decision variable.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transfer {
    /// The child-season variable draws on a quantity in the period.
    Require,
    /// The parent-season variable carries a quantity into the next period (or next year).
    Provide,
}

/// Boolean transfer masks of a [`SeasonBranchModel`](crate::seasons::SeasonBranchModel) over one
/// period taxonomy.
///
/// Every 3-d mask is indexed `[period, z8, z9]` where `z8` is the providing (parent) season and
/// `z9` the receiving (child) season.
#[derive(Clone, Debug, PartialEq)]
pub struct TransferMasks {
    pub taxonomy: String,
    /// `[period, season]`: whether the season is identified in the period.
    pub identified: Array2<bool>,
    pub require: Array3<bool>,
    /// Provision into the next period of the same year.
    pub provide_within: Array3<bool>,
    /// Provision from the final period into the first period of the next year.
    pub provide_between: Array3<bool>,
}

impl TransferMasks {
    pub const PERIOD_AXIS: Axis = Axis(0);

    pub(crate) fn empty(taxonomy: &str, n_periods: usize, n_seasons: usize) -> Self {
        TransferMasks {
            taxonomy: taxonomy.to_string(),
            identified: Array2::from_elem((n_periods, n_seasons), false),
            require: Array3::from_elem((n_periods, n_seasons, n_seasons), false),
            provide_within: Array3::from_elem((n_periods, n_seasons, n_seasons), false),
            provide_between: Array3::from_elem((n_periods, n_seasons, n_seasons), false),
        }
    }

    pub fn n_periods(&self) -> usize {
        self.identified.len_of(Self::PERIOD_AXIS)
    }

    pub fn n_seasons(&self) -> usize {
        self.identified.len_of(Axis(1))
    }

    /// The `[z8, z9]` mask of a period. `Provide` combines within- and between-year provision,
    /// which never overlap.
    pub fn transfer_mask(&self, period: usize, direction: Transfer) -> Array2<bool> {
        match direction {
            Transfer::Require => self.require.index_axis(Self::PERIOD_AXIS, period).to_owned(),
            Transfer::Provide => {
                let mut out = self.provide_within.index_axis(Self::PERIOD_AXIS, period).to_owned();
                Zip::from(&mut out)
                    .and(self.provide_between.index_axis(Self::PERIOD_AXIS, period))
                    .for_each(|o, b| *o = *o || *b);
                out
            }
        }
    }

    pub fn within(&self, period: usize) -> ArrayView2<'_, bool> {
        self.provide_within.index_axis(Self::PERIOD_AXIS, period)
    }

    pub fn between(&self, period: usize) -> ArrayView2<'_, bool> {
        self.provide_between.index_axis(Self::PERIOD_AXIS, period)
    }

    /// The `(period, z8, z9)` triples where a mask is set, for handing to the LP builder.
    pub fn entries(mask: &Array3<bool>) -> Vec<(usize, usize, usize)> {
        mask.indexed_iter()
            .filter(|(_, v)| **v)
            .map(|((p, z8, z9), _)| (p, z8, z9))
            .collect()
    }

    /// The mask as 1.0/0.0 coefficients.
    pub fn as_f64(mask: &Array3<bool>) -> Array3<f64> {
        mask.mapv(|v| if v { 1.0 } else { 0.0 })
    }
}
