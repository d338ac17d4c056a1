// PhoneticModel: builds the end-to-end source-to-target relation and ranks
// candidates against it.
//
// Construction pipeline:
//   source table -> source letters:pronunciation (one or more units)
//   target table -> target letters:pronunciation, inverted
//   pronunciation edit* between them
//   optional letter-level edits disjoined with the result, then closed

use phonofst::algebra::{
    bounded_repeat, closure_plus, closure_star, compose, disjoin, empty_pair_cost, invert,
    linear_acceptor, trim,
};
use phonofst::format::{self, HEADER_SIZE};
use phonofst::{
    EmptyRules, FstError, SearchLimits, SearchStatus, SymbolTable, Weight, WeightedAutomaton,
    best_paths, compile,
};
use phonofst_core::{CharSegmenter, Segmenter};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, info};

use crate::ModelError;
use crate::edit::{EditAlphabet, EditConfig, edit_closure, edit_once};
use crate::features::{FeatureTable, SymbolDistance};
use crate::phonology::{PhonologyTable, pronunciation_symbol};
use crate::presets;

/// One side of the model: a language's spelling-to-pronunciation table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    pub phonology: PhonologyTable,
    /// Cost charged for every written unit.
    pub unit_weight: Weight,
    /// Maximum number of units in a word; unbounded when `None`.
    pub max_units: Option<usize>,
}

impl LanguageConfig {
    pub fn new(phonology: PhonologyTable) -> Self {
        Self {
            phonology,
            ..Self::default()
        }
    }
}

/// Everything needed to build a [`PhoneticModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub source: LanguageConfig,
    pub target: LanguageConfig,
    /// Edits between pronunciations.
    pub edits: EditConfig,
    /// Letter-level edits usable alongside the phonetic route.
    pub orthographic: Option<EditConfig>,
    pub search: SearchLimits,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::finnish_to_english()
    }
}

impl ModelConfig {
    /// Finnish queries ranked against English spellings.
    pub fn finnish_to_english() -> Self {
        Self {
            source: LanguageConfig::new(presets::finnish()),
            target: LanguageConfig::new(presets::english()),
            edits: EditConfig::default(),
            orthographic: Some(EditConfig::orthographic()),
            search: SearchLimits::default(),
        }
    }

    /// Parse a JSON configuration; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A ranked target-language candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub text: String,
    pub cost: Weight,
}

/// Result of [`PhoneticModel::rank`].
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub query: String,
    /// Candidates by non-decreasing cost.
    pub candidates: Vec<Candidate>,
    pub status: SearchStatus,
}

impl Ranking {
    fn no_match(query: &str) -> Self {
        Self {
            query: query.to_string(),
            candidates: Vec::new(),
            status: SearchStatus::Complete,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Position of `correct`, resolved over equal costs (see
    /// [`evaluation::rank_of`](crate::evaluation::rank_of)).
    pub fn rank_of(&self, correct: &str) -> Option<usize> {
        crate::evaluation::rank_of(&self.candidates, correct)
    }
}

/// The end-to-end source-to-target relation with its symbol table.
///
/// Immutable after construction; share it freely between threads.
#[derive(Clone)]
pub struct PhoneticModel {
    symbols: SymbolTable,
    relation: WeightedAutomaton,
    limits: SearchLimits,
}

impl std::fmt::Debug for PhoneticModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhoneticModel")
            .field("symbols", &self.symbols.len())
            .field("states", &self.relation.num_states())
            .field("transitions", &self.relation.num_transitions())
            .field("limits", &self.limits)
            .finish()
    }
}

impl PhoneticModel {
    /// Build with character segmentation and the built-in feature tables
    /// (IPA for pronunciations, Latin letters for spellings).
    pub fn build(config: &ModelConfig) -> Result<Self, ModelError> {
        Self::build_with(
            config,
            &CharSegmenter,
            &FeatureTable::ipa(),
            &FeatureTable::latin(),
        )
    }

    /// Build with caller-supplied segmentation and distances.
    pub fn build_with(
        config: &ModelConfig,
        segmenter: &dyn Segmenter,
        phonetic: &dyn SymbolDistance,
        orthographic: &dyn SymbolDistance,
    ) -> Result<Self, ModelError> {
        let _span = debug_span!("build_model").entered();
        let mut symbols = SymbolTable::new();

        let source_table = config.source.phonology.normalise();
        let target_table = config.target.phonology.normalise();

        let source = language_transducer(&source_table, &config.source, segmenter, &mut symbols)?;
        let target = language_transducer(&target_table, &config.target, segmenter, &mut symbols)?;

        let mut sounds = EditAlphabet::new();
        let segments = source_table
            .segments(segmenter)
            .into_iter()
            .chain(target_table.segments(segmenter));
        for seg in segments {
            let sym = symbols.intern(&pronunciation_symbol(&seg));
            sounds.push(&seg, sym);
        }
        let edits = edit_closure(&sounds, phonetic, &config.edits)?;
        debug!(
            source = source.num_states(),
            target = target.num_states(),
            edits = edits.num_states(),
            "component transducers"
        );

        let spoken = trim(&compose(&source, &edits)?);
        let mut relation = trim(&compose(&spoken, &invert(&target))?);

        if let Some(letter_config) = &config.orthographic {
            let mut letters = EditAlphabet::new();
            for letter in source_table.letters().into_iter().chain(target_table.letters()) {
                let sym = symbols.intern(&letter);
                letters.push(&letter, sym);
            }
            let letter_edits = edit_once(&letters, orthographic, letter_config)?;
            let either = disjoin(&relation, &letter_edits);
            if empty_pair_cost(&either) == Some(0.0) {
                return Err(ModelError::FreeEmptyEdit);
            }
            relation = closure_star(&either);
        }

        info!(
            states = relation.num_states(),
            transitions = relation.num_transitions(),
            symbols = symbols.len(),
            "model built"
        );
        Ok(Self {
            symbols,
            relation,
            limits: config.search,
        })
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn relation(&self) -> &WeightedAutomaton {
        &self.relation
    }

    pub fn limits(&self) -> SearchLimits {
        self.limits
    }

    /// Replace the search limits used by [`rank`](Self::rank) and
    /// [`score`](Self::score).
    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// The `k` cheapest target spellings for `query`.
    ///
    /// A query with characters the model has never seen has no match.
    pub fn rank(&self, query: &str, k: usize) -> Ranking {
        let Some(input) = self.symbols.lookup_chars(query) else {
            debug!(query, "query has unknown characters");
            return Ranking::no_match(query);
        };
        let result = best_paths(&self.relation, Some(&input), k, self.limits);
        Ranking {
            query: query.to_string(),
            candidates: result
                .paths
                .into_iter()
                .map(|p| Candidate {
                    text: self.symbols.render(&p.output),
                    cost: p.cost,
                })
                .collect(),
            status: result.status,
        }
    }

    /// Rank many queries concurrently. Results keep the order of `queries`.
    pub fn rank_many<S>(&self, queries: &[S], k: usize) -> Vec<Ranking>
    where
        S: AsRef<str> + Sync,
    {
        queries.par_iter().map(|q| self.rank(q.as_ref(), k)).collect()
    }

    /// Cheapest cost relating `source` to `target`, or `None` if the model
    /// does not relate them.
    pub fn score(&self, source: &str, target: &str) -> Option<Weight> {
        let input = self.symbols.lookup_chars(source)?;
        let output = self.symbols.lookup_chars(target)?;
        // Composition only fails when no symbol is shared: no relation.
        let pair = compose(&linear_acceptor(&input), &self.relation)
            .and_then(|left| compose(&left, &linear_acceptor(&output)))
            .ok()?;
        best_paths(&pair, None, 1, self.limits)
            .paths
            .first()
            .map(|p| p.cost)
    }

    /// Serialize to a model file: header, symbol table, search limits, then
    /// the relation.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ModelError> {
        let mut out = Vec::new();
        format::write_header(&mut out);
        self.symbols.write_to(&mut out)?;
        out.extend_from_slice(&(self.limits.max_expansions as u64).to_le_bytes());
        let max_cost = self.limits.max_cost.unwrap_or(f64::INFINITY);
        out.extend_from_slice(&max_cost.to_le_bytes());
        format::write_body(&self.relation, &mut out);
        Ok(out)
    }

    /// Load a model file written by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(data: &[u8]) -> Result<Self, ModelError> {
        format::parse_header(data)?;
        let (symbols, pos) = SymbolTable::parse(data, HEADER_SIZE)?;

        let limits_end = pos + 16;
        if data.len() < limits_end {
            return Err(FstError::TooShort {
                expected: limits_end,
                actual: data.len(),
            }
            .into());
        }
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&data[pos..pos + 8]);
        let max_expansions = u64::from_le_bytes(raw) as usize;
        raw.copy_from_slice(&data[pos + 8..limits_end]);
        let max_cost = f64::from_le_bytes(raw);
        let limits = SearchLimits {
            max_expansions,
            max_cost: (max_cost != f64::INFINITY).then_some(max_cost),
        };

        let (relation, _) = format::read_body(data, limits_end)?;
        Ok(Self {
            symbols,
            relation,
            limits,
        })
    }
}

fn language_transducer(
    table: &PhonologyTable,
    config: &LanguageConfig,
    segmenter: &dyn Segmenter,
    symbols: &mut SymbolTable,
) -> Result<WeightedAutomaton, ModelError> {
    let rules = table.rules(config.unit_weight, segmenter, symbols)?;
    let once = compile(&rules, EmptyRules::Reject)?;
    Ok(match config.max_units {
        Some(max) => bounded_repeat(&once, 1, max)?,
        None => closure_plus(&once),
    })
}
