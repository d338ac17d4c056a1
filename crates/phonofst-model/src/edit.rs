// Symbol-edit transducers: weighted substitution, insertion, deletion,
// transposition and shortening over one alphabet.

use hashbrown::HashMap;
use phonofst::algebra::{closure_star, empty_pair_cost};
use phonofst::{EmptyRules, Rule, Symbol, Weight, WeightedAutomaton, compile};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span};

use crate::ModelError;
use crate::features::SymbolDistance;

/// A fixed rewrite with its own weight. Empty names stand for epsilon.
///
/// JSON form: `{"pairs": [["k", "x"], ["s", ""]], "weight": 1.0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialRule {
    pub pairs: Vec<(String, String)>,
    pub weight: Weight,
}

impl SpecialRule {
    pub fn new(pairs: &[(&str, &str)], weight: Weight) -> Self {
        Self {
            pairs: pairs
                .iter()
                .map(|&(i, o)| (i.to_string(), o.to_string()))
                .collect(),
            weight,
        }
    }
}

/// Edit operations and their costs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditConfig {
    /// Substitutions are generated for pairs with `distance <= cutoff`.
    pub cutoff: f64,
    /// Substitution weight is `distance * scale`.
    pub scale: f64,
    /// Weight of inserting any symbol, if allowed.
    pub insertion: Option<Weight>,
    /// Weight of deleting any symbol, if allowed.
    pub deletion: Option<Weight>,
    /// Weight of swapping two adjacent distinct symbols, if allowed.
    pub transposition: Option<Weight>,
    /// Weight of dropping the second of two identical symbols, if allowed.
    pub shortening: Option<Weight>,
    pub special: Vec<SpecialRule>,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            cutoff: 2.0,
            scale: 2.0,
            insertion: None,
            deletion: None,
            transposition: None,
            shortening: None,
            special: Vec::new(),
        }
    }
}

impl EditConfig {
    /// Letter-level edits for the orthographic fallback: feature
    /// substitutions, shortening of doubled letters and a few common
    /// spelling correspondences.
    pub fn orthographic() -> Self {
        Self {
            shortening: Some(1.0),
            special: vec![
                SpecialRule::new(&[("k", "x"), ("s", "")], 1.0),
                SpecialRule::new(&[("f", "p")], 1.0),
                SpecialRule::new(&[("", "h")], 1.0),
            ],
            ..Self::default()
        }
    }
}

/// The symbols an edit transducer works over: display name and id.
#[derive(Debug, Clone, Default)]
pub struct EditAlphabet {
    entries: Vec<(String, Symbol)>,
    by_name: HashMap<String, Symbol>,
}

impl EditAlphabet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a symbol; names already present are ignored.
    pub fn push(&mut self, name: &str, symbol: Symbol) {
        if !self.by_name.contains_key(name) {
            self.by_name.insert(name.to_string(), symbol);
            self.entries.push((name.to_string(), symbol));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn resolve(&self, name: &str) -> Result<Symbol, ModelError> {
        if name.is_empty() {
            return Ok(Symbol::EPSILON);
        }
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::UnknownSymbol(name.to_string()))
    }
}

fn check_fixed_weight(operation: &'static str, weight: Weight) -> Result<Weight, ModelError> {
    if !(weight.is_finite() && weight >= 0.0) {
        return Err(ModelError::Fst(phonofst::FstError::InvalidWeight(weight)));
    }
    if weight == 0.0 {
        return Err(ModelError::ZeroCostEdit(operation));
    }
    Ok(weight)
}

/// Every edit rule for `alphabet`, one application each.
///
/// Identity is always present at cost 0. Substitution distances are computed
/// in parallel.
pub fn edit_rules(
    alphabet: &EditAlphabet,
    distance: &dyn SymbolDistance,
    config: &EditConfig,
) -> Result<Vec<Rule>, ModelError> {
    let entries = &alphabet.entries;
    let n = entries.len();

    let substitutions: Vec<Option<Rule>> = (0..n)
        .into_par_iter()
        .flat_map_iter(|i| (0..n).map(move |j| (i, j)))
        .map(|(i, j)| {
            let (a_name, a) = &entries[i];
            let (b_name, b) = &entries[j];
            if i == j {
                return Ok(Some(Rule::single(*a, *b, 0.0)));
            }
            let Some(d) = distance.distance(a_name, b_name) else {
                return Ok(None);
            };
            if !(d.is_finite() && d >= 0.0) {
                return Err(ModelError::InvalidDistance {
                    a: a_name.clone(),
                    b: b_name.clone(),
                    distance: d,
                });
            }
            if d == 0.0 {
                return Err(ModelError::ZeroDistance {
                    a: a_name.clone(),
                    b: b_name.clone(),
                });
            }
            Ok((d <= config.cutoff).then(|| Rule::single(*a, *b, d * config.scale)))
        })
        .collect::<Result<_, ModelError>>()?;
    let mut rules: Vec<Rule> = substitutions.into_iter().flatten().collect();

    if let Some(w) = config.insertion {
        let w = check_fixed_weight("insertion", w)?;
        rules.extend(entries.iter().map(|&(_, s)| Rule::single(Symbol::EPSILON, s, w)));
    }
    if let Some(w) = config.deletion {
        let w = check_fixed_weight("deletion", w)?;
        rules.extend(entries.iter().map(|&(_, s)| Rule::single(s, Symbol::EPSILON, w)));
    }
    if let Some(w) = config.transposition {
        let w = check_fixed_weight("transposition", w)?;
        for &(_, a) in entries {
            for &(_, b) in entries {
                if a != b {
                    rules.push(Rule::new(vec![(a, b), (b, a)], w));
                }
            }
        }
    }
    if let Some(w) = config.shortening {
        let w = check_fixed_weight("shortening", w)?;
        rules.extend(
            entries
                .iter()
                .map(|&(_, s)| Rule::new(vec![(s, s), (s, Symbol::EPSILON)], w)),
        );
    }
    for special in &config.special {
        let pairs = special
            .pairs
            .iter()
            .map(|(i, o)| Ok((alphabet.resolve(i)?, alphabet.resolve(o)?)))
            .collect::<Result<Vec<_>, ModelError>>()?;
        let rule = Rule::new(pairs, special.weight);
        let consumes = rule.pairs.iter().any(|(i, _)| !i.is_epsilon());
        let produces = rule.pairs.iter().any(|(_, o)| !o.is_epsilon());
        if special.weight == 0.0 && !(consumes && produces) {
            return Err(ModelError::ZeroCostEdit("special rule"));
        }
        rules.push(rule);
    }

    Ok(rules)
}

/// One application of any edit rule.
pub fn edit_once(
    alphabet: &EditAlphabet,
    distance: &dyn SymbolDistance,
    config: &EditConfig,
) -> Result<WeightedAutomaton, ModelError> {
    let _span = debug_span!("edit_once", symbols = alphabet.len()).entered();
    let rules = edit_rules(alphabet, distance, config)?;
    debug!(rules = rules.len(), "edit rules");
    let once = compile(&rules, EmptyRules::AcceptEmpty)?;
    if empty_pair_cost(&once) == Some(0.0) {
        return Err(ModelError::FreeEmptyEdit);
    }
    Ok(once)
}

/// Any number of edit applications, each charged separately.
pub fn edit_closure(
    alphabet: &EditAlphabet,
    distance: &dyn SymbolDistance,
    config: &EditConfig,
) -> Result<WeightedAutomaton, ModelError> {
    Ok(closure_star(&edit_once(alphabet, distance, config)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use phonofst::{SearchLimits, best_paths};

    const A: Symbol = Symbol(1);
    const B: Symbol = Symbol(2);
    const C: Symbol = Symbol(3);

    fn alphabet() -> EditAlphabet {
        let mut alpha = EditAlphabet::new();
        alpha.push("a", A);
        alpha.push("b", B);
        alpha.push("c", C);
        alpha
    }

    // a-b close, a-c far, b-c unrelated.
    fn distance(x: &str, y: &str) -> Option<f64> {
        match (x.min(y), x.max(y)) {
            ("a", "b") => Some(1.0),
            ("a", "c") => Some(3.0),
            _ => None,
        }
    }

    fn outputs(a: &WeightedAutomaton, query: &[Symbol]) -> Vec<(Vec<Symbol>, Weight)> {
        best_paths(a, Some(query), 20, SearchLimits::default())
            .paths
            .into_iter()
            .map(|p| (p.output, p.cost))
            .collect()
    }

    #[test]
    fn substitutions_respect_cutoff_and_scale() {
        let once = edit_once(&alphabet(), &distance, &EditConfig::default()).unwrap();
        assert_eq!(outputs(&once, &[A]), vec![(vec![A], 0.0), (vec![B], 2.0)]);
        assert_eq!(outputs(&once, &[C]), vec![(vec![C], 0.0)]);
    }

    #[test]
    fn insertion_deletion_transposition() {
        let config = EditConfig {
            insertion: Some(5.0),
            deletion: Some(4.0),
            transposition: Some(1.5),
            ..EditConfig::default()
        };
        let once = edit_once(&alphabet(), &distance, &config).unwrap();
        let ab = outputs(&once, &[A, B]);
        assert_eq!(ab[0], (vec![B, A], 1.5));
        let deleted = outputs(&once, &[C]);
        assert!(deleted.contains(&(vec![], 4.0)));
        let inserted = outputs(&once, &[]);
        assert!(inserted.contains(&(vec![B], 5.0)));
    }

    #[test]
    fn closure_charges_every_edit() {
        let star = edit_closure(&alphabet(), &distance, &EditConfig::default()).unwrap();
        let result = outputs(&star, &[A, A]);
        assert_eq!(result[0], (vec![A, A], 0.0));
        assert!(result.contains(&(vec![B, B], 4.0)));
    }

    #[test]
    fn shortening_and_special_rules() {
        let config = EditConfig {
            shortening: Some(1.0),
            special: vec![SpecialRule::new(&[("c", "a"), ("a", "")], 0.5)],
            ..EditConfig::default()
        };
        let once = edit_once(&alphabet(), &distance, &config).unwrap();
        assert!(outputs(&once, &[B, B]).contains(&(vec![B], 1.0)));
        assert_eq!(outputs(&once, &[C, A]), vec![(vec![A], 0.5)]);
    }

    #[test]
    fn negative_distance_is_rejected() {
        let bad = |x: &str, y: &str| if x == y { Some(0.0) } else { Some(-1.0) };
        let err = edit_once(&alphabet(), &bad, &EditConfig::default()).unwrap_err();
        assert!(matches!(err, ModelError::InvalidDistance { .. }));
    }

    #[test]
    fn zero_distance_between_distinct_symbols_is_rejected() {
        let bad = |_: &str, _: &str| Some(0.0);
        let err = edit_once(&alphabet(), &bad, &EditConfig::default()).unwrap_err();
        assert!(matches!(err, ModelError::ZeroDistance { .. }));
    }

    #[test]
    fn free_insertion_is_rejected() {
        let config = EditConfig {
            insertion: Some(0.0),
            ..EditConfig::default()
        };
        let err = edit_once(&alphabet(), &distance, &config).unwrap_err();
        assert!(matches!(err, ModelError::ZeroCostEdit("insertion")));
    }

    #[test]
    fn free_epsilon_special_rule_is_rejected() {
        let config = EditConfig {
            special: vec![SpecialRule::new(&[("", "")], 0.0)],
            ..EditConfig::default()
        };
        let err = edit_once(&alphabet(), &distance, &config).unwrap_err();
        assert!(matches!(err, ModelError::ZeroCostEdit(_)));
    }

    #[test]
    fn unknown_special_symbol_is_rejected() {
        let config = EditConfig {
            special: vec![SpecialRule::new(&[("q", "a")], 1.0)],
            ..EditConfig::default()
        };
        let err = edit_once(&alphabet(), &distance, &config).unwrap_err();
        assert!(matches!(err, ModelError::UnknownSymbol(s) if s == "q"));
    }

    #[test]
    fn empty_alphabet_edits_nothing() {
        let once = edit_once(&EditAlphabet::new(), &distance, &EditConfig::default());
        assert!(matches!(once, Err(ModelError::FreeEmptyEdit)));
    }
}
