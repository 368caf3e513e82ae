use serde::{Deserialize, Serialize};

use crate::error::{Error, IntegrityViolation, Result};
use crate::rotations::landuse::LandUseCatalog;
use crate::rotations::phase::Phase;

/// Sparse bipartite relation between phases and histories, by index.
///
/// - a phase **requires** a history when every history slot is a superset of the phase slot in the
///   same position, i.e. the land uses of years `0..depth-1` of the phase;
/// - a phase **provides** a history when every history slot is a superset of the phase slot one
///   position newer, i.e. years `1..depth` of the phase become the history of the next year.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryRelation {
    pub(crate) requires: Vec<(usize, usize)>,
    pub(crate) provides: Vec<(usize, usize)>,
}

impl HistoryRelation {
    /// Build the relation over token index sequences.
    pub(crate) fn build(
        phases: &[Vec<usize>],
        histories: &[Vec<usize>],
        catalog: &LandUseCatalog,
    ) -> Self {
        let covers = |history: &[usize], window: &[usize]| {
            history
                .iter()
                .zip(window.iter())
                .all(|(h, t)| catalog.expansion(*h).is_superset(catalog.expansion(*t)))
        };
        let mut relation = HistoryRelation::default();
        for (r, phase) in phases.iter().enumerate() {
            for (h, history) in histories.iter().enumerate() {
                if covers(history, &phase[..phase.len() - 1]) {
                    relation.requires.push((r, h));
                }
                if covers(history, &phase[1..]) {
                    relation.provides.push((r, h));
                }
            }
        }
        relation
    }

    /// `(phase, history)` pairs where the phase requires the history.
    pub fn requires(&self) -> &[(usize, usize)] {
        &self.requires
    }

    /// `(phase, history)` pairs where the phase provides the history.
    pub fn provides(&self) -> &[(usize, usize)] {
        &self.provides
    }

    pub fn requires_of(&self, phase: usize) -> impl Iterator<Item = usize> + '_ {
        self.requires
            .iter()
            .filter(move |(r, _)| *r == phase)
            .map(|(_, h)| *h)
    }

    pub fn provides_of(&self, phase: usize) -> impl Iterator<Item = usize> + '_ {
        self.provides
            .iter()
            .filter(move |(r, _)| *r == phase)
            .map(|(_, h)| *h)
    }

    /// Rotation constraint coefficients: `+1` where a phase requires a history and `-1` where it
    /// provides one. A phase that requires and provides the same history carries both entries.
    pub fn coefficients(&self) -> Vec<(usize, usize, f64)> {
        self.requires
            .iter()
            .map(|(r, h)| (*r, *h, 1.0))
            .chain(self.provides.iter().map(|(r, h)| (*r, *h, -1.0)))
            .collect()
    }

    /// Every phase that requires or provides no history.
    pub fn violations(&self, phases: &[Phase]) -> Vec<IntegrityViolation> {
        let mut has_require = vec![false; phases.len()];
        let mut has_provide = vec![false; phases.len()];
        self.requires.iter().for_each(|(r, _)| has_require[*r] = true);
        self.provides.iter().for_each(|(r, _)| has_provide[*r] = true);
        phases
            .iter()
            .enumerate()
            .filter(|(r, _)| !has_require[*r] || !has_provide[*r])
            .map(|(r, phase)| IntegrityViolation {
                phase: phase.clone(),
                missing_require: !has_require[r],
                missing_provide: !has_provide[r],
            })
            .collect()
    }

    /// Fail with every violation found, see [`violations`](Self::violations).
    pub fn check_integrity(&self, phases: &[Phase]) -> Result<()> {
        let violations = self.violations(phases);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Error::RotationIntegrity { violations })
        }
    }
}
