// Orthography-to-pronunciation tables and their compilation into rules.

use std::collections::{BTreeMap, BTreeSet};

use phonofst::{Rule, Symbol, SymbolTable, Weight};
use phonofst_core::Segmenter;
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// IPA length mark, dropped during normalisation.
const LENGTH_MARK: char = '\u{02D0}';

/// One pronunciation of a written unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawEntry", into = "RawEntry")]
pub struct Pronunciation {
    pub symbols: String,
    /// Extra cost on top of the language's unit weight.
    pub weight: Weight,
}

impl Pronunciation {
    pub fn new(symbols: impl Into<String>) -> Self {
        Self {
            symbols: symbols.into(),
            weight: 0.0,
        }
    }

    pub fn weighted(symbols: impl Into<String>, weight: Weight) -> Self {
        Self {
            symbols: symbols.into(),
            weight,
        }
    }
}

/// JSON form: a bare string, or `{"symbols": ..., "weight": ...}`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Plain(String),
    Weighted { symbols: String, weight: Weight },
}

impl From<RawEntry> for Pronunciation {
    fn from(raw: RawEntry) -> Self {
        match raw {
            RawEntry::Plain(symbols) => Pronunciation::new(symbols),
            RawEntry::Weighted { symbols, weight } => Pronunciation::weighted(symbols, weight),
        }
    }
}

impl From<Pronunciation> for RawEntry {
    fn from(p: Pronunciation) -> Self {
        if p.weight == 0.0 {
            RawEntry::Plain(p.symbols)
        } else {
            RawEntry::Weighted {
                symbols: p.symbols,
                weight: p.weight,
            }
        }
    }
}

/// Mapping from written units (one or more characters) to their
/// pronunciations.
///
/// Units are kept sorted so that compiled automata do not depend on insertion
/// order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhonologyTable {
    units: BTreeMap<String, Vec<Pronunciation>>,
}

impl PhonologyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(unit, [pronunciation, ...])` pairs with zero
    /// extra weights.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a [&'a str])>,
    {
        let mut table = Self::new();
        for (unit, prons) in pairs {
            for &p in prons {
                table.insert(unit, Pronunciation::new(p));
            }
        }
        table
    }

    /// Add one pronunciation for `unit`. Duplicates are ignored.
    pub fn insert(&mut self, unit: &str, pronunciation: Pronunciation) {
        let entries = self.units.entry(unit.to_string()).or_default();
        if !entries.contains(&pronunciation) {
            entries.push(pronunciation);
        }
    }

    /// Declare `unit` without pronunciations. Only useful to build tables
    /// that [`validate`](Self::validate) must reject.
    pub fn declare(&mut self, unit: &str) {
        self.units.entry(unit.to_string()).or_default();
    }

    pub fn get(&self, unit: &str) -> Option<&[Pronunciation]> {
        self.units.get(unit).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Pronunciation])> {
        self.units.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Union of two tables: units present in both keep all pronunciations.
    pub fn merge(mut self, other: &PhonologyTable) -> Self {
        for (unit, prons) in other.iter() {
            if prons.is_empty() {
                self.declare(unit);
            }
            for p in prons {
                self.insert(unit, p.clone());
            }
        }
        self
    }

    /// Strip length marks and expand optional segments.
    ///
    /// `ə(r)` becomes the two pronunciations `ə` and `ər`.
    pub fn normalise(&self) -> Self {
        let mut out = Self::new();
        for (unit, prons) in self.iter() {
            out.declare(unit);
            for p in prons {
                for variant in expand_optional(&p.symbols.replace(LENGTH_MARK, "")) {
                    out.insert(unit, Pronunciation::weighted(variant, p.weight));
                }
            }
        }
        out
    }

    /// Reject empty units, units without pronunciations, empty
    /// pronunciations and negative extra weights.
    pub fn validate(&self) -> Result<(), ModelError> {
        for (unit, prons) in self.iter() {
            if unit.is_empty() {
                return Err(ModelError::EmptyUnit);
            }
            if prons.is_empty() {
                return Err(ModelError::NoPronunciations(unit.to_string()));
            }
            for p in prons {
                if p.symbols.is_empty() {
                    return Err(ModelError::EmptyPronunciation(unit.to_string()));
                }
                if !(p.weight.is_finite() && p.weight >= 0.0) {
                    return Err(ModelError::Fst(phonofst::FstError::InvalidWeight(p.weight)));
                }
            }
        }
        Ok(())
    }

    /// Every written character used by some unit.
    pub fn letters(&self) -> BTreeSet<String> {
        self.units
            .keys()
            .flat_map(|unit| unit.chars())
            .map(String::from)
            .collect()
    }

    /// Every pronunciation segment used by some entry.
    pub fn segments(&self, segmenter: &dyn Segmenter) -> BTreeSet<String> {
        self.units
            .values()
            .flatten()
            .flat_map(|p| segmenter.segment(&p.symbols))
            .map(String::from)
            .collect()
    }

    /// Compile the table into written→pronunciation rules.
    ///
    /// Each unit is aligned with each of its pronunciations character by
    /// segment; the shorter side is padded with epsilon. The rule weight is
    /// `unit_weight` plus the entry's extra weight.
    pub fn rules(
        &self,
        unit_weight: Weight,
        segmenter: &dyn Segmenter,
        symbols: &mut SymbolTable,
    ) -> Result<Vec<Rule>, ModelError> {
        self.validate()?;
        let mut rules = Vec::new();
        for (unit, prons) in self.iter() {
            let written: Vec<Symbol> = unit
                .chars()
                .map(|c| symbols.intern(c.encode_utf8(&mut [0u8; 4])))
                .collect();
            for p in prons {
                let spoken: Vec<Symbol> = segmenter
                    .segment(&p.symbols)
                    .into_iter()
                    .map(|seg| symbols.intern(&pronunciation_symbol(seg)))
                    .collect();
                let len = written.len().max(spoken.len());
                let pairs = (0..len)
                    .map(|i| {
                        (
                            written.get(i).copied().unwrap_or(Symbol::EPSILON),
                            spoken.get(i).copied().unwrap_or(Symbol::EPSILON),
                        )
                    })
                    .collect();
                rules.push(Rule::new(pairs, unit_weight + p.weight));
            }
        }
        Ok(rules)
    }
}

/// Name of the symbol standing for pronunciation segment `segment`.
///
/// Pronunciation symbols are wrapped in slashes so they never share an id
/// with a written letter of the same spelling.
pub fn pronunciation_symbol(segment: &str) -> String {
    format!("/{segment}/")
}

fn expand_optional(symbols: &str) -> Vec<String> {
    let Some(open) = symbols.find('(') else {
        return vec![symbols.to_string()];
    };
    let Some(close) = symbols[open..].find(')').map(|i| open + i) else {
        return vec![symbols.to_string()];
    };
    let before = &symbols[..open];
    let inside = &symbols[open + 1..close];
    let after = &symbols[close + 1..];
    let mut out = Vec::new();
    for rest in expand_optional(after) {
        out.push(format!("{before}{rest}"));
        out.push(format!("{before}{inside}{rest}"));
    }
    out
}
