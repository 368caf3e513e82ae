use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::rotations::landuse::{LandUseCatalog, LandUseSet};

/// Why a rule removes phases.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// The phase is agronomically impossible.
    Illegal,
    /// The phase is possible but never worth representing.
    Unprofitable,
}

/// An exclusion rule over the slots of a phase. Slots are indexed oldest (0) to newest
/// (`depth - 1`) and every code list is matched literally against the slot's token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
    /// Reject when slot `i` is in `earlier` and slot `i + gap` is in `later`.
    Sequence {
        earlier: Vec<String>,
        later: Vec<String>,
        gap: usize,
    },
    /// Reject an interior slot in `codes` unless the previous slot is in `continues_from` or the
    /// next slot is in `continues_into`. The oldest slot may have continued from outside the
    /// visible history and the newest may continue next year, so neither is tested.
    IsolatedPerennial {
        codes: Vec<String>,
        continues_from: Vec<String>,
        continues_into: Vec<String>,
    },
    /// Reject when the newest slot is in `entering` and the slot before is not in `established`.
    ResowOnEntry {
        established: Vec<String>,
        entering: Vec<String>,
    },
    /// For each of the `trailing` newest slots, reject when it is in `then` and all of the
    /// `window` slots before it are in `run`.
    RunLimit {
        run: Vec<String>,
        window: usize,
        then: Vec<String>,
        trailing: usize,
    },
    /// For each of the `trailing` newest slots, reject when it is in `then` and none of the
    /// `window` slots before it are in `absent`.
    ResowAfterBreak {
        absent: Vec<String>,
        window: usize,
        then: Vec<String>,
        trailing: usize,
    },
    /// Reject a phase containing codes of two different families.
    ExclusiveFamilies { families: Vec<Vec<String>> },
    /// Reject a phase whose every slot is in `within`.
    Uniform { within: Vec<String> },
}

/// A named [`Rule`] as configured.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExclusionRule {
    pub name: String,
    pub kind: RuleKind,
    #[serde(flatten)]
    pub rule: Rule,
}

/// Test a partial phase against a rule.
///
/// Generation appends one slot at a time and calls [`rejects`](PhaseRule::rejects) after each
/// append. A rule only tests the conditions whose newest referenced slot is the slot just
/// appended, so every condition is tested exactly once and filtering partial phases gives the
/// same result as filtering the full product.
pub trait PhaseRule {
    /// `prefix` holds token indices of the slots `0..prefix.len()` of a phase of `depth` slots.
    fn rejects(&self, prefix: &[usize], depth: usize) -> bool;
}

#[derive(Clone, Debug)]
pub(crate) struct SequenceRule {
    earlier: LandUseSet,
    later: LandUseSet,
    gap: usize,
}

impl PhaseRule for SequenceRule {
    fn rejects(&self, prefix: &[usize], _depth: usize) -> bool {
        let j = prefix.len() - 1;
        j >= self.gap && self.later.contains(prefix[j]) && self.earlier.contains(prefix[j - self.gap])
    }
}

#[derive(Clone, Debug)]
pub(crate) struct IsolatedPerennialRule {
    codes: LandUseSet,
    continues_from: LandUseSet,
    continues_into: LandUseSet,
}

impl PhaseRule for IsolatedPerennialRule {
    fn rejects(&self, prefix: &[usize], _depth: usize) -> bool {
        // the interior slot i = j - 1 is decided once slot j is known
        let j = prefix.len() - 1;
        if j < 2 {
            return false;
        }
        let i = j - 1;
        self.codes.contains(prefix[i])
            && !(self.continues_from.contains(prefix[i - 1])
                || self.continues_into.contains(prefix[j]))
    }
}

#[derive(Clone, Debug)]
pub(crate) struct ResowOnEntryRule {
    established: LandUseSet,
    entering: LandUseSet,
}

impl PhaseRule for ResowOnEntryRule {
    fn rejects(&self, prefix: &[usize], depth: usize) -> bool {
        let j = prefix.len() - 1;
        j + 1 == depth
            && j >= 1
            && self.entering.contains(prefix[j])
            && !self.established.contains(prefix[j - 1])
    }
}

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub(crate) enum WindowTest {
    /// Every window slot is a member.
    Every,
    /// No window slot is a member.
    NoneOf,
}

#[derive(Clone, Debug)]
pub(crate) struct WindowRule {
    members: LandUseSet,
    test: WindowTest,
    window: usize,
    then: LandUseSet,
    trailing: usize,
}

impl PhaseRule for WindowRule {
    fn rejects(&self, prefix: &[usize], depth: usize) -> bool {
        let j = prefix.len() - 1;
        let from_newest = depth - j;
        // a run shorter than the window cannot be confirmed from the visible history
        if from_newest > self.trailing || j < self.window || !self.then.contains(prefix[j]) {
            return false;
        }
        let window = &prefix[j - self.window..j];
        match self.test {
            WindowTest::Every => window.iter().all(|t| self.members.contains(*t)),
            WindowTest::NoneOf => window.iter().all(|t| !self.members.contains(*t)),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct ExclusiveFamiliesRule {
    families: Vec<LandUseSet>,
}

impl PhaseRule for ExclusiveFamiliesRule {
    fn rejects(&self, prefix: &[usize], _depth: usize) -> bool {
        let j = prefix.len() - 1;
        let newest = prefix[j];
        self.families
            .iter()
            .enumerate()
            .filter(|(_, f)| f.contains(newest))
            .any(|(k, _)| {
                self.families
                    .iter()
                    .enumerate()
                    .filter(|(k_, _)| *k_ != k)
                    .any(|(_, other)| prefix[..j].iter().any(|t| other.contains(*t)))
            })
    }
}

#[derive(Clone, Debug)]
pub(crate) struct UniformRule {
    within: LandUseSet,
}

impl PhaseRule for UniformRule {
    fn rejects(&self, prefix: &[usize], depth: usize) -> bool {
        prefix.len() == depth && prefix.iter().all(|t| self.within.contains(*t))
    }
}

/// A rule resolved against a [`LandUseCatalog`], ready for generation.
#[derive(Clone, Debug)]
pub(crate) enum PhaseFilter {
    Sequence(SequenceRule),
    IsolatedPerennial(IsolatedPerennialRule),
    ResowOnEntry(ResowOnEntryRule),
    Window(WindowRule),
    ExclusiveFamilies(ExclusiveFamiliesRule),
    Uniform(UniformRule),
}

impl PhaseRule for PhaseFilter {
    fn rejects(&self, prefix: &[usize], depth: usize) -> bool {
        match self {
            PhaseFilter::Sequence(r) => r.rejects(prefix, depth),
            PhaseFilter::IsolatedPerennial(r) => r.rejects(prefix, depth),
            PhaseFilter::ResowOnEntry(r) => r.rejects(prefix, depth),
            PhaseFilter::Window(r) => r.rejects(prefix, depth),
            PhaseFilter::ExclusiveFamilies(r) => r.rejects(prefix, depth),
            PhaseFilter::Uniform(r) => r.rejects(prefix, depth),
        }
    }
}

/// An [`ExclusionRule`] with its code lists resolved to token sets.
#[derive(Clone, Debug)]
pub struct CompiledRule {
    pub name: String,
    pub kind: RuleKind,
    pub(crate) filter: PhaseFilter,
}

impl PhaseRule for CompiledRule {
    fn rejects(&self, prefix: &[usize], depth: usize) -> bool {
        self.filter.rejects(prefix, depth)
    }
}

impl ExclusionRule {
    /// Resolve the rule's codes against the catalogue and check its parameters fit `depth`.
    pub fn compile(&self, catalog: &LandUseCatalog, depth: usize) -> Result<CompiledRule> {
        let invalid = |msg: &str| Error::config(format!("rule `{}`: {}", self.name, msg));
        let filter = match &self.rule {
            Rule::Sequence { earlier, later, gap } => {
                if *gap == 0 || *gap >= depth {
                    return Err(invalid("gap must be between 1 and depth - 1"));
                }
                PhaseFilter::Sequence(SequenceRule {
                    earlier: catalog.set_of(earlier)?,
                    later: catalog.set_of(later)?,
                    gap: *gap,
                })
            }
            Rule::IsolatedPerennial {
                codes,
                continues_from,
                continues_into,
            } => PhaseFilter::IsolatedPerennial(IsolatedPerennialRule {
                codes: catalog.set_of(codes)?,
                continues_from: catalog.set_of(continues_from)?,
                continues_into: catalog.set_of(continues_into)?,
            }),
            Rule::ResowOnEntry {
                established,
                entering,
            } => PhaseFilter::ResowOnEntry(ResowOnEntryRule {
                established: catalog.set_of(established)?,
                entering: catalog.set_of(entering)?,
            }),
            Rule::RunLimit {
                run: members,
                window,
                then,
                trailing,
            }
            | Rule::ResowAfterBreak {
                absent: members,
                window,
                then,
                trailing,
            } => {
                if *window == 0 || *trailing == 0 || *trailing > depth {
                    return Err(invalid("window and trailing must be positive, trailing at most depth"));
                }
                let test = match self.rule {
                    Rule::RunLimit { .. } => WindowTest::Every,
                    _ => WindowTest::NoneOf,
                };
                PhaseFilter::Window(WindowRule {
                    members: catalog.set_of(members)?,
                    test,
                    window: *window,
                    then: catalog.set_of(then)?,
                    trailing: *trailing,
                })
            }
            Rule::ExclusiveFamilies { families } => {
                if families.len() < 2 {
                    return Err(invalid("at least two families are required"));
                }
                PhaseFilter::ExclusiveFamilies(ExclusiveFamiliesRule {
                    families: families
                        .iter()
                        .map(|f| catalog.set_of(f))
                        .collect::<Result<Vec<_>>>()?,
                })
            }
            Rule::Uniform { within } => PhaseFilter::Uniform(UniformRule {
                within: catalog.set_of(within)?,
            }),
        };
        Ok(CompiledRule {
            name: self.name.clone(),
            kind: self.kind,
            filter,
        })
    }
}
