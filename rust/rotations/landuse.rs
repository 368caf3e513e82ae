use indexmap::{IndexMap, IndexSet};
use internment::Intern;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// A land-use code, e.g. *"w"* for wheat or *"A"* for established annual pasture.
///
/// Codes are case sensitive: lower case tokens are the land use sown this year, upper case tokens
/// generalise a group of land uses in the older history slots.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct LandUse {
    pub(crate) name: Intern<String>,
}

impl LandUse {
    pub fn new(name: &str) -> Self {
        LandUse {
            name: Intern::new(name.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

impl fmt::Display for LandUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A set of land-use codes stored as a bitset over the token indices of a [`LandUseCatalog`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct LandUseSet {
    bits: Vec<u64>,
}

impl LandUseSet {
    pub fn with_capacity(n_tokens: usize) -> Self {
        LandUseSet {
            bits: vec![0; n_tokens.div_ceil(64)],
        }
    }

    pub fn insert(&mut self, token: usize) {
        let word = token / 64;
        if word >= self.bits.len() {
            self.bits.resize(word + 1, 0);
        }
        self.bits[word] |= 1 << (token % 64);
    }

    pub fn contains(&self, token: usize) -> bool {
        self.bits
            .get(token / 64)
            .is_some_and(|w| w & (1 << (token % 64)) != 0)
    }

    /// Whether every member of `other` is a member of `self`.
    pub fn is_superset(&self, other: &LandUseSet) -> bool {
        other.bits.iter().enumerate().all(|(i, o)| {
            let s = self.bits.get(i).copied().unwrap_or(0);
            o & !s == 0
        })
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|w| *w == 0)
    }

    pub fn len(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }
}

impl FromIterator<usize> for LandUseSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = LandUseSet::default();
        for token in iter {
            set.insert(token);
        }
        set
    }
}

/// Every land-use token of a rotation configuration with its named set memberships.
///
/// Each token stands for a set of land uses in the history relation: the named set of the same
/// name if one is configured (e.g. *"E"* for all cereals), otherwise just itself.
#[derive(Clone, Debug, PartialEq)]
pub struct LandUseCatalog {
    tokens: IndexSet<LandUse>,
    sets: IndexMap<String, LandUseSet>,
    expansion: Vec<LandUseSet>,
}

impl LandUseCatalog {
    /// Build the catalogue from the named sets and every other token in use.
    pub fn try_new<'a, I>(sets: &IndexMap<String, Vec<String>>, tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut universe: IndexSet<LandUse> = IndexSet::new();
        for token in tokens {
            universe.insert(LandUse::new(token));
        }
        for (name, members) in sets.iter() {
            if members.is_empty() {
                return Err(Error::config(format!("land-use set `{}` is empty", name)));
            }
            for m in members {
                universe.insert(LandUse::new(m));
            }
        }

        let index = |s: &str| universe.get_index_of(&LandUse::new(s));
        let mut named: IndexMap<String, LandUseSet> = IndexMap::new();
        for (name, members) in sets.iter() {
            let set: LandUseSet = members.iter().filter_map(|m| index(m)).collect();
            named.insert(name.clone(), set);
        }
        let expansion = universe
            .iter()
            .enumerate()
            .map(|(i, lu)| match named.get(lu.name()) {
                Some(set) => set.clone(),
                None => LandUseSet::from_iter([i]),
            })
            .collect();

        Ok(LandUseCatalog {
            tokens: universe,
            sets: named,
            expansion,
        })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Index of a token.
    pub fn index_of(&self, token: &str) -> Result<usize> {
        self.tokens
            .get_index_of(&LandUse::new(token))
            .ok_or_else(|| Error::config(format!("unknown land-use code `{}`", token)))
    }

    pub fn land_use(&self, index: usize) -> LandUse {
        self.tokens[index]
    }

    /// The set of land uses the token at `index` stands for.
    pub fn expansion(&self, index: usize) -> &LandUseSet {
        &self.expansion[index]
    }

    /// Token indices of a list of codes as a set.
    pub fn set_of<S: AsRef<str>>(&self, codes: &[S]) -> Result<LandUseSet> {
        let mut set = LandUseSet::with_capacity(self.len());
        for code in codes {
            set.insert(self.index_of(code.as_ref())?);
        }
        Ok(set)
    }

    /// A configured named set.
    pub fn named_set(&self, name: &str) -> Result<&LandUseSet> {
        self.sets
            .get(name)
            .ok_or_else(|| Error::config(format!("unknown land-use set `{}`", name)))
    }

    /// Whether `code` is a member of the named set `set`. Unknown codes or sets are never members.
    pub fn belongs_to(&self, code: &LandUse, set: &str) -> bool {
        match (self.tokens.get_index_of(code), self.sets.get(set)) {
            (Some(i), Some(s)) => s.contains(i),
            _ => false,
        }
    }
}
