use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::json::JSON;
use crate::rotations::landuse::LandUseCatalog;
use crate::rotations::phase::{History, Phase};
use crate::rotations::relation::HistoryRelation;
use crate::rotations::rules::{CompiledRule, ExclusionRule, PhaseRule, RuleKind};

fn default_dry_sown_set() -> String {
    "dry_sown".to_string()
}

/// A perennial whose resown and established tokens, when both generated, add a phase of the
/// continuous token repeated in every slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuousPhase {
    pub resown: String,
    pub established: String,
    pub continuous: String,
}

/// Rotation inputs: candidate land uses per history year, land-use sets and exclusion rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotationConfig {
    /// Number of history years in a phase, including the current year.
    pub depth: usize,
    /// Candidate codes per slot, oldest first.
    pub slots: Vec<Vec<String>>,
    /// Named land-use sets. A code with the name of a set stands for the set's members.
    #[serde(default)]
    pub sets: IndexMap<String, Vec<String>>,
    #[serde(default)]
    pub rules: Vec<ExclusionRule>,
    /// Restrict the generated phases to those needed by these rotations.
    #[serde(default)]
    pub allow_list: Vec<Vec<String>>,
    #[serde(default)]
    pub continuous: Vec<ContinuousPhase>,
    /// Use these phases instead of generating them.
    #[serde(default)]
    pub fixed_phases: Option<Vec<Vec<String>>>,
    /// Name of the land-use set sown before the season break.
    #[serde(default = "default_dry_sown_set")]
    pub dry_sown_set: String,
}

impl JSON for RotationConfig {}

impl RotationConfig {
    /// Check the shape of the configuration. Codes are checked when the catalogue is built.
    pub fn validate(&self) -> Result<()> {
        if self.depth < 2 {
            return Err(Error::config(format!(
                "rotation depth must be at least 2, got {}",
                self.depth
            )));
        }
        if self.slots.len() != self.depth {
            return Err(Error::config(format!(
                "rotation depth is {} but {} slots are given",
                self.depth,
                self.slots.len()
            )));
        }
        if let Some(i) = self.slots.iter().position(|s| s.is_empty()) {
            return Err(Error::config(format!("rotation slot {} has no candidates", i)));
        }
        let sequences = self
            .allow_list
            .iter()
            .chain(self.fixed_phases.iter().flatten());
        for seq in sequences {
            if seq.len() != self.depth {
                return Err(Error::config(format!(
                    "rotation `{}` has {} years but the depth is {}",
                    seq.join(""),
                    seq.len(),
                    self.depth
                )));
            }
        }
        Ok(())
    }

    /// The catalogue of every code named in the configuration.
    pub fn catalog(&self) -> Result<LandUseCatalog> {
        let tokens = self
            .slots
            .iter()
            .flatten()
            .chain(self.allow_list.iter().flatten())
            .chain(self.fixed_phases.iter().flatten().flatten())
            .map(|s| s.as_str())
            .chain(self.continuous.iter().flat_map(|c| {
                [
                    c.resown.as_str(),
                    c.established.as_str(),
                    c.continuous.as_str(),
                ]
            }));
        LandUseCatalog::try_new(&self.sets, tokens)
    }
}

/// The generated phases, their histories and the relation between them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotationSet {
    pub phases: Vec<Phase>,
    pub histories: Vec<History>,
    pub relation: HistoryRelation,
}

impl JSON for RotationSet {}

impl RotationSet {
    pub fn phase_keys(&self) -> Vec<String> {
        self.phases.iter().map(|p| p.key()).collect()
    }

    pub fn history_keys(&self) -> Vec<String> {
        self.histories.iter().map(|h| h.key()).collect()
    }

    /// Rotation constraint coefficients keyed by `(phase, history)` strings.
    pub fn keyed_coefficients(&self) -> Vec<(String, String, f64)> {
        self.relation
            .coefficients()
            .into_iter()
            .map(|(r, h, v)| (self.phases[r].key(), self.histories[h].key(), v))
            .collect()
    }
}

/// Enumerates and filters rotation phases.
///
/// The product of the slot candidates is built one slot at a time and each partial phase is tested
/// against the rules as it grows, so a prefix rejected early is never extended.
#[derive(Debug)]
pub struct RotationGenerator<'a> {
    config: &'a RotationConfig,
    catalog: LandUseCatalog,
    slots: Vec<Vec<usize>>,
    rules: Vec<CompiledRule>,
}

impl<'a> RotationGenerator<'a> {
    pub fn try_new(config: &'a RotationConfig) -> Result<Self> {
        config.validate()?;
        let catalog = config.catalog()?;
        let slots = config
            .slots
            .iter()
            .map(|s| {
                s.iter()
                    .map(|c| catalog.index_of(c))
                    .collect::<Result<Vec<usize>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        let rules = config
            .rules
            .iter()
            .map(|r| r.compile(&catalog, config.depth))
            .collect::<Result<Vec<_>>>()?;
        Ok(RotationGenerator {
            config,
            catalog,
            slots,
            rules,
        })
    }

    pub fn catalog(&self) -> &LandUseCatalog {
        &self.catalog
    }

    fn depth(&self) -> usize {
        self.config.depth
    }

    /// The first rule rejecting the partial phase, if any.
    fn rejected_by(&self, prefix: &[usize]) -> Option<usize> {
        self.rules
            .iter()
            .position(|r| r.rejects(prefix, self.depth()))
    }

    /// Product of the slot candidates with the rules applied slot by slot.
    pub(crate) fn enumerate(&self) -> Vec<Vec<usize>> {
        let mut rejected = vec![0_usize; self.rules.len()];
        let mut partial: Vec<Vec<usize>> = vec![Vec::new()];
        for candidates in self.slots.iter() {
            let mut next = Vec::with_capacity(partial.len() * candidates.len());
            for (prefix, token) in partial.iter().cartesian_product(candidates.iter()) {
                let mut phase = prefix.clone();
                phase.push(*token);
                match self.rejected_by(&phase) {
                    Some(r) => rejected[r] += 1,
                    None => next.push(phase),
                }
            }
            partial = next;
        }
        for (rule, count) in self.rules.iter().zip(rejected.iter()) {
            debug!(
                rule = rule.name.as_str(),
                illegal = rule.kind == RuleKind::Illegal,
                rejected = count,
                "exclusion rule applied"
            );
        }
        partial
    }

    /// Keep phases that match a cyclic shift of an allow-listed rotation slot by slot, a phase
    /// slot matching when the land uses it stands for include the rotation's code.
    fn allow_listed(&self, phases: Vec<Vec<usize>>) -> Result<Vec<Vec<usize>>> {
        if self.config.allow_list.is_empty() {
            return Ok(phases);
        }
        let mut shifts: IndexSet<Vec<usize>> = IndexSet::new();
        for rotation in self.config.allow_list.iter() {
            let tokens = rotation
                .iter()
                .map(|c| self.catalog.index_of(c))
                .collect::<Result<Vec<usize>>>()?;
            for offset in 0..tokens.len() {
                let mut shifted = tokens.clone();
                shifted.rotate_right(offset);
                shifts.insert(shifted);
            }
        }
        let before = phases.len();
        let kept: Vec<Vec<usize>> = phases
            .into_iter()
            .filter(|phase| {
                shifts.iter().any(|rotation| {
                    phase
                        .iter()
                        .zip(rotation.iter())
                        .all(|(p, u)| self.catalog.expansion(*p).contains(*u))
                })
            })
            .collect();
        debug!(before, after = kept.len(), "allow list applied");
        Ok(kept)
    }

    fn fixed(&self, fixed: &[Vec<String>]) -> Result<Vec<Vec<usize>>> {
        fixed
            .iter()
            .map(|p| {
                p.iter()
                    .map(|c| self.catalog.index_of(c))
                    .collect::<Result<Vec<usize>>>()
            })
            .collect()
    }

    fn with_continuous(&self, mut phases: Vec<Vec<usize>>) -> Result<Vec<Vec<usize>>> {
        for c in self.config.continuous.iter() {
            let resown = self.catalog.index_of(&c.resown)?;
            let established = self.catalog.index_of(&c.established)?;
            let present = |t: usize| phases.iter().any(|p| p.contains(&t));
            if present(resown) && present(established) {
                let continuous = vec![self.catalog.index_of(&c.continuous)?; self.depth()];
                if !phases.contains(&continuous) {
                    phases.push(continuous);
                }
            }
        }
        Ok(phases)
    }

    /// Phases as token index sequences, before the history relation is derived.
    fn phase_indices(&self) -> Result<Vec<Vec<usize>>> {
        let phases = match &self.config.fixed_phases {
            Some(fixed) => self.fixed(fixed)?,
            None => self.allow_listed(self.enumerate())?,
        };
        let phases = self.with_continuous(phases)?;
        if phases.is_empty() {
            return Err(Error::config("no rotation phase survives the exclusion rules"));
        }
        Ok(phases)
    }

    fn to_phase(&self, tokens: &[usize]) -> Phase {
        Phase::new(tokens.iter().map(|t| self.catalog.land_use(*t)).collect())
    }

    /// The filtered phase list.
    pub fn phases(&self) -> Result<Vec<Phase>> {
        Ok(self
            .phase_indices()?
            .iter()
            .map(|p| self.to_phase(p))
            .collect())
    }

    /// Generate the phases, the distinct histories they require and the history relation.
    ///
    /// Fails with [`Error::RotationIntegrity`] listing every phase that requires or provides no
    /// history.
    pub fn generate(&self) -> Result<RotationSet> {
        let phase_idx = self.phase_indices()?;
        let history_idx: IndexSet<Vec<usize>> = phase_idx
            .iter()
            .map(|p| p[..p.len() - 1].to_vec())
            .collect();
        let history_idx: Vec<Vec<usize>> = history_idx.into_iter().collect();
        let relation = HistoryRelation::build(&phase_idx, &history_idx, &self.catalog);

        let phases: Vec<Phase> = phase_idx.iter().map(|p| self.to_phase(p)).collect();
        let histories: Vec<History> = history_idx.iter().map(|h| self.to_phase(h)).collect();
        info!(
            phases = phases.len(),
            histories = histories.len(),
            requires = relation.requires.len(),
            provides = relation.provides.len(),
            "generated rotation phases"
        );
        relation.check_integrity(&phases)?;
        Ok(RotationSet {
            phases,
            histories,
            relation,
        })
    }

    /// Filter the full product, testing each rule on every prefix of every phase.
    #[cfg(test)]
    pub(crate) fn enumerate_exhaustive(&self) -> Vec<Vec<usize>> {
        self.slots
            .iter()
            .multi_cartesian_product()
            .map(|p| p.into_iter().copied().collect::<Vec<usize>>())
            .filter(|p| (1..=p.len()).all(|n| self.rejected_by(&p[..n]).is_none()))
            .collect()
    }
}
