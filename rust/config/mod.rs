//! The resolved configuration of a model run.
//!
//! A [`ModelConfig`] is read once, validated and then passed by reference to every component.
//! Nothing in the crate reads configuration from global state.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::calendars::{add_years, CalendarPeriods, PeriodTaxonomy, YearRoll};
use crate::error::{Error, Result};
use crate::json::JSON;
use crate::rotations::RotationConfig;
use crate::seasons::{SeasonBranchModel, SeasonConfig};

/// Calendar, season and rotation inputs of a model run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub calendar: CalendarPeriods,
    pub seasons: SeasonConfig,
    pub rotation: RotationConfig,
}

impl JSON for ModelConfig {}

impl ModelConfig {
    /// Read a JSON configuration file and validate it.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Self::from_json_file(path.as_ref())?;
        config.validate()?;
        info!(path = %path.as_ref().display(), "loaded model configuration");
        Ok(config)
    }

    fn check_span(taxonomy: &PeriodTaxonomy) -> Result<()> {
        if taxonomy.span_end() > add_years(&taxonomy.span_start(), 1) {
            let span = (taxonomy.span_end() - taxonomy.span_start()).num_days();
            return Err(Error::config(format!(
                "period taxonomy `{}` spans {} days, more than one year",
                taxonomy.name(),
                span
            )));
        }
        Ok(())
    }

    /// Check the configuration as a whole.
    ///
    /// Taxonomy boundaries are checked when the taxonomies are built. Here every taxonomy must
    /// span at most one year, the seasons must form a valid branching, the rotation inputs must be
    /// consistent and the dry-sown set must be configured.
    pub fn validate(&self) -> Result<()> {
        for taxonomy in [&self.calendar.phase, &self.calendar.season, &self.calendar.labour] {
            Self::check_span(taxonomy)?;
        }
        self.season_model()?;
        self.rotation.validate()?;
        self.rotation
            .catalog()?
            .named_set(&self.rotation.dry_sown_set)?;
        Ok(())
    }

    pub fn season_model(&self) -> Result<SeasonBranchModel> {
        SeasonBranchModel::from_config(&self.seasons)
    }
}

// UNIT TESTS
#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("data")
            .join("model_default.json")
    }

    #[test]
    fn test_load_default_config() {
        let config = ModelConfig::from_path(fixture_path()).unwrap();
        assert_eq!(config.calendar.phase.len(), 6);
        assert_eq!(config.calendar.season.len(), 7);
        assert_eq!(config.calendar.labour.len(), 12);
        assert_eq!(config.rotation.depth, 6);
        let model = config.season_model().unwrap();
        assert_eq!(model.len(), 3);
        assert_eq!(model.parents(), &[0, 0, 1]);
    }

    #[test]
    fn test_json_round_trip() {
        let config = ModelConfig::from_path(fixture_path()).unwrap();
        let json = config.to_json().unwrap();
        assert_eq!(ModelConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_configs() {
        let config = ModelConfig::from_path(fixture_path()).unwrap();

        let mut no_root = config.clone();
        no_root.seasons.seasons[0].initiation = crate::calendars::nd(2021, 4, 2);
        assert!(matches!(no_root.validate(), Err(Error::Configuration(_))));

        let mut no_dry_sown = config.clone();
        no_dry_sown.rotation.dry_sown_set = "early_sown".to_string();
        assert!(no_dry_sown.validate().is_err());

        let mut long = config.clone();
        long.calendar.labour = PeriodTaxonomy::try_new(
            "p5",
            crate::calendars::blocks(crate::calendars::nd(2021, 4, 1), 200, 2),
        )
        .unwrap();
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_leap_year_taxonomy_spans_one_year() {
        use crate::calendars::{blocks, nd};
        let mut leap = ModelConfig::from_path(fixture_path()).unwrap();
        leap.seasons.season_start = nd(2019, 4, 1);
        leap.calendar.labour =
            PeriodTaxonomy::try_new("p5", vec![nd(2019, 4, 1), nd(2019, 10, 1), nd(2020, 4, 1)])
                .unwrap();
        assert!(leap.validate().is_ok());

        leap.calendar.labour = PeriodTaxonomy::try_new("p5", blocks(nd(2019, 4, 1), 367, 1)).unwrap();
        assert!(matches!(leap.validate(), Err(Error::Configuration(_))));

        let mut common = ModelConfig::from_path(fixture_path()).unwrap();
        common.calendar.labour =
            PeriodTaxonomy::try_new("p5", blocks(nd(2021, 4, 1), 366, 1)).unwrap();
        assert!(common.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ModelConfig::from_path("no/such/model.json"),
            Err(Error::Io(_))
        ));
    }
}
