use chrono::prelude::*;
use indexmap::set::IndexSet;
use serde::{Deserialize, Serialize};

use crate::calendars::dateroll::YearRoll;
use crate::error::{Error, Result};
use crate::json::JSON;

/// An ordered set of half open date intervals used to time-bucket dated items.
///
/// A taxonomy of `N` periods is defined by `N+1` strictly increasing boundary dates. Period `p`
/// covers `[boundaries[p], boundaries[p+1])`. Some boundaries may be flagged **hard**: an item
/// allocated into the taxonomy is never prorated across a hard boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PeriodTaxonomyDataModel")]
pub struct PeriodTaxonomy {
    pub(crate) name: String,
    pub(crate) boundaries: Vec<NaiveDate>,
    pub(crate) keys: Vec<String>,
    pub(crate) hard_boundaries: IndexSet<NaiveDate>,
}

#[derive(Deserialize)]
struct PeriodTaxonomyDataModel {
    name: String,
    boundaries: Vec<NaiveDate>,
    #[serde(default)]
    keys: Option<Vec<String>>,
    #[serde(default)]
    hard_boundaries: Vec<NaiveDate>,
}

impl TryFrom<PeriodTaxonomyDataModel> for PeriodTaxonomy {
    type Error = Error;

    fn try_from(model: PeriodTaxonomyDataModel) -> Result<Self> {
        let mut taxonomy = PeriodTaxonomy::try_new(&model.name, model.boundaries)?;
        if let Some(keys) = model.keys {
            taxonomy = taxonomy.with_keys(keys)?;
        }
        for date in model.hard_boundaries {
            taxonomy = taxonomy.with_hard_boundary(date)?;
        }
        Ok(taxonomy)
    }
}

impl JSON for PeriodTaxonomy {}

impl PeriodTaxonomy {
    /// Create a taxonomy from its boundary dates.
    ///
    /// Period keys default to the taxonomy name suffixed with the period index, e.g. `m0`, `m1`.
    /// Fails if fewer than two boundaries are given or they are not strictly increasing.
    pub fn try_new(name: &str, boundaries: Vec<NaiveDate>) -> Result<Self> {
        if boundaries.len() < 2 {
            return Err(Error::config(format!(
                "period taxonomy `{}` needs at least two boundary dates, got {}",
                name,
                boundaries.len()
            )));
        }
        if let Some(w) = boundaries.windows(2).find(|w| w[0] >= w[1]) {
            return Err(Error::config(format!(
                "period taxonomy `{}` boundaries are not strictly increasing at {} -> {}",
                name, w[0], w[1]
            )));
        }
        let keys = (0..boundaries.len() - 1)
            .map(|p| format!("{}{}", name, p))
            .collect();
        Ok(PeriodTaxonomy {
            name: name.to_string(),
            boundaries,
            keys,
            hard_boundaries: IndexSet::new(),
        })
    }

    /// Replace the default period keys.
    pub fn with_keys(mut self, keys: Vec<String>) -> Result<Self> {
        if keys.len() != self.len() {
            return Err(Error::config(format!(
                "period taxonomy `{}` has {} periods but {} keys were given",
                self.name,
                self.len(),
                keys.len()
            )));
        }
        self.keys = keys;
        Ok(self)
    }

    /// Flag an existing boundary as hard. The date must be one of the taxonomy's boundaries.
    pub fn with_hard_boundary(mut self, date: NaiveDate) -> Result<Self> {
        if !self.boundaries.contains(&date) {
            return Err(Error::config(format!(
                "hard boundary {} is not a boundary of period taxonomy `{}`",
                date, self.name
            )));
        }
        self.hard_boundaries.insert(date);
        self.hard_boundaries.sort();
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of periods.
    pub fn len(&self) -> usize {
        self.boundaries.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn boundaries(&self) -> &[NaiveDate] {
        &self.boundaries
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Start dates of every period (boundaries without the final end date).
    pub fn starts(&self) -> &[NaiveDate] {
        &self.boundaries[..self.len()]
    }

    pub fn start(&self, period: usize) -> NaiveDate {
        self.boundaries[period]
    }

    pub fn end(&self, period: usize) -> NaiveDate {
        self.boundaries[period + 1]
    }

    /// Length of a period in days.
    pub fn days(&self, period: usize) -> i64 {
        (self.end(period) - self.start(period)).num_days()
    }

    /// Index of the period containing `date`, left inclusive. `None` outside the span; no year
    /// shifting is applied.
    pub fn period_of(&self, date: &NaiveDate) -> Option<usize> {
        if !self.in_span(date) {
            return None;
        }
        Some(self.boundaries.partition_point(|b| b <= date) - 1)
    }

    pub fn is_hard(&self, date: &NaiveDate) -> bool {
        self.hard_boundaries.contains(date)
    }

    /// First hard boundary strictly after `date`.
    pub fn next_hard_boundary(&self, date: &NaiveDate) -> Option<NaiveDate> {
        self.hard_boundaries.iter().find(|d| *d > date).copied()
    }
}

impl YearRoll for PeriodTaxonomy {
    fn span_start(&self) -> NaiveDate {
        self.boundaries[0]
    }

    fn span_end(&self) -> NaiveDate {
        self.boundaries[self.len()]
    }
}

// UNIT TESTS
#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendars::nd;

    fn fixture_taxonomy() -> PeriodTaxonomy {
        PeriodTaxonomy::try_new(
            "m",
            vec![nd(2021, 4, 1), nd(2021, 6, 1), nd(2021, 10, 1), nd(2022, 4, 1)],
        )
        .unwrap()
    }

    #[test]
    fn test_period_of_is_left_inclusive() {
        let tax = fixture_taxonomy();
        assert_eq!(tax.period_of(&nd(2021, 4, 1)), Some(0));
        assert_eq!(tax.period_of(&nd(2021, 5, 31)), Some(0));
        assert_eq!(tax.period_of(&nd(2021, 6, 1)), Some(1));
        assert_eq!(tax.period_of(&nd(2022, 3, 31)), Some(2));
        assert_eq!(tax.period_of(&nd(2022, 4, 1)), None);
        assert_eq!(tax.period_of(&nd(2021, 3, 31)), None);
    }

    #[test]
    fn test_default_keys_and_lengths() {
        let tax = fixture_taxonomy();
        assert_eq!(tax.len(), 3);
        assert_eq!(tax.keys(), &["m0", "m1", "m2"]);
        assert_eq!(tax.days(0), 61);
        assert_eq!(tax.starts().len(), 3);
    }

    #[test]
    fn test_non_increasing_boundaries_rejected() {
        let result = PeriodTaxonomy::try_new("p", vec![nd(2021, 4, 1), nd(2021, 4, 1)]);
        assert!(matches!(result, Err(Error::Configuration(_))));
        let result = PeriodTaxonomy::try_new("p", vec![nd(2021, 4, 1)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_hard_boundary_must_be_a_boundary() {
        let tax = fixture_taxonomy().with_hard_boundary(nd(2021, 6, 1)).unwrap();
        assert!(tax.is_hard(&nd(2021, 6, 1)));
        assert_eq!(tax.next_hard_boundary(&nd(2021, 4, 20)), Some(nd(2021, 6, 1)));
        assert_eq!(tax.next_hard_boundary(&nd(2021, 6, 1)), None);
        assert!(fixture_taxonomy().with_hard_boundary(nd(2021, 6, 2)).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"{"name":"p7","boundaries":["2021-04-01","2021-03-01"]}"#;
        assert!(serde_json::from_str::<PeriodTaxonomy>(json).is_err());
        let json = r#"{"name":"p7","boundaries":["2021-04-01","2021-08-01","2022-04-01"],
                       "keys":["early","late"],"hard_boundaries":["2021-08-01"]}"#;
        let tax: PeriodTaxonomy = serde_json::from_str(json).unwrap();
        assert_eq!(tax.keys(), &["early", "late"]);
        assert!(tax.is_hard(&nd(2021, 8, 1)));
    }
}
