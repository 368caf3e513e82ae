use chrono::prelude::*;
use serde::{Deserialize, Serialize};

use crate::calendars::BaseYear;
use crate::error::{Error, Result};
use crate::json::JSON;

fn default_probability() -> f64 {
    1.0
}

fn default_active() -> bool {
    true
}

/// One configured weather-year.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeasonInput {
    pub name: String,
    /// Date at which the season becomes distinguishable from the others.
    pub initiation: NaiveDate,
    #[serde(default = "default_probability")]
    pub probability: f64,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// Season configuration as read from the model inputs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeasonConfig {
    /// The start-of-season node (season break) of the base year.
    pub season_start: NaiveDate,
    #[serde(default)]
    pub steady_state: bool,
    pub seasons: Vec<SeasonInput>,
}

impl JSON for SeasonConfig {}

/// The active seasons of a model run with their initiation dates and probabilities.
///
/// Inactive seasons are dropped and probabilities renormalised over the remaining ones. The model
/// runs in **steady state** when configured to or when only one season is active; the set then
/// holds the first active season alone, with probability 1.
#[derive(Clone, Debug, PartialEq)]
pub struct SeasonSet {
    pub(crate) season_start: NaiveDate,
    pub(crate) steady_state: bool,
    pub(crate) names: Vec<String>,
    pub(crate) initiation: Vec<NaiveDate>,
    pub(crate) probability: Vec<f64>,
    /// Active flag and normalised probability per configured season, used for input handling.
    pub(crate) configured_active: Vec<bool>,
    pub(crate) configured_probability: Vec<f64>,
}

impl SeasonSet {
    pub fn try_new(config: &SeasonConfig) -> Result<Self> {
        if config.seasons.is_empty() {
            return Err(Error::config("at least one season must be configured"));
        }
        if let Some(s) = config.seasons.iter().find(|s| !(s.probability >= 0.0)) {
            return Err(Error::config(format!(
                "season `{}` has invalid probability {}",
                s.name, s.probability
            )));
        }
        let configured_active: Vec<bool> = config.seasons.iter().map(|s| s.active).collect();
        let total: f64 = config
            .seasons
            .iter()
            .filter(|s| s.active)
            .map(|s| s.probability)
            .sum();
        if !configured_active.iter().any(|a| *a) {
            return Err(Error::config("no season is active"));
        }
        if total <= 0.0 {
            return Err(Error::config("active season probabilities sum to zero"));
        }
        let configured_probability: Vec<f64> = config
            .seasons
            .iter()
            .map(|s| if s.active { s.probability / total } else { 0.0 })
            .collect();

        let base_year = BaseYear::new(config.season_start);
        let active: Vec<(usize, &SeasonInput)> = config
            .seasons
            .iter()
            .enumerate()
            .filter(|(_, s)| s.active)
            .collect();
        let steady_state = config.steady_state || active.len() == 1;

        let (names, initiation, probability) = if steady_state {
            let first = active[0].1;
            (
                vec![first.name.clone()],
                vec![base_year.adjust(&first.initiation)],
                vec![1.0],
            )
        } else {
            (
                active.iter().map(|(_, s)| s.name.clone()).collect(),
                active
                    .iter()
                    .map(|(_, s)| base_year.adjust(&s.initiation))
                    .collect(),
                active.iter().map(|(i, _)| configured_probability[*i]).collect(),
            )
        };

        Ok(SeasonSet {
            season_start: config.season_start,
            steady_state,
            names,
            initiation,
            probability,
            configured_active,
            configured_probability,
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn is_steady_state(&self) -> bool {
        self.steady_state
    }

    pub fn season_start(&self) -> NaiveDate {
        self.season_start
    }

    pub fn keys(&self) -> &[String] {
        &self.names
    }

    /// Initiation date of each active season, adjusted into the base year.
    pub fn initiation(&self) -> &[NaiveDate] {
        &self.initiation
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probability
    }

    /// Treat the season axis of an input given for every configured season.
    ///
    /// In a stochastic run the values of the active seasons are returned. In steady state the
    /// probability weighted average of the active seasons is returned as a single value.
    pub fn seasonal_input(&self, values: &[f64]) -> Result<Vec<f64>> {
        if values.len() != self.configured_active.len() {
            return Err(Error::config(format!(
                "seasonal input has {} values but {} seasons are configured",
                values.len(),
                self.configured_active.len()
            )));
        }
        if self.steady_state {
            let average = values
                .iter()
                .zip(self.configured_probability.iter())
                .map(|(v, p)| v * p)
                .sum();
            Ok(vec![average])
        } else {
            Ok(values
                .iter()
                .zip(self.configured_active.iter())
                .filter(|(_, a)| **a)
                .map(|(v, _)| *v)
                .collect())
        }
    }
}
