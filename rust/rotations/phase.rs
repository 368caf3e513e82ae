use serde::{Deserialize, Serialize};
use std::fmt;

use crate::rotations::landuse::LandUse;

/// A rotation phase: one land use per history year, ordered oldest to newest.
///
/// The newest slot is the land use of the current year. A phase is identified by its sequence,
/// displayed as the concatenated codes, e.g. *"YAENEw"*.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Phase {
    pub(crate) slots: Vec<LandUse>,
}

/// The history a phase requires or provides: a sequence one year shorter than a phase.
pub type History = Phase;

impl Phase {
    pub fn new(slots: Vec<LandUse>) -> Self {
        Phase { slots }
    }

    /// Build from string codes, e.g. `Phase::from_codes(&["A", "w"])`.
    pub fn from_codes<S: AsRef<str>>(codes: &[S]) -> Self {
        Phase {
            slots: codes.iter().map(|c| LandUse::new(c.as_ref())).collect(),
        }
    }

    pub fn slots(&self) -> &[LandUse] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The land use of the current year.
    pub fn newest(&self) -> Option<&LandUse> {
        self.slots.last()
    }

    /// The phase without its newest year.
    pub fn history(&self) -> History {
        let n = self.slots.len().saturating_sub(1);
        Phase {
            slots: self.slots[..n].to_vec(),
        }
    }

    /// The string identity of the phase.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for lu in self.slots.iter() {
            write!(f, "{}", lu)?;
        }
        Ok(())
    }
}
