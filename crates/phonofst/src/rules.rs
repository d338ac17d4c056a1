// Compilation of declarative weighted rules into an automaton.

use phonofst_core::Symbol;
use tracing::debug;

use crate::FstError;
use crate::algebra;
use crate::automaton::{AutomatonBuilder, Weight, WeightedAutomaton, check_weight};

/// A weighted alignment of an input sequence to an output sequence.
///
/// The rule's weight is charged once, on the first pair; the remaining pairs
/// are free. Either side of a pair may be [`Symbol::EPSILON`].
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub pairs: Vec<(Symbol, Symbol)>,
    pub weight: Weight,
}

impl Rule {
    pub fn new(pairs: Vec<(Symbol, Symbol)>, weight: Weight) -> Self {
        Self { pairs, weight }
    }

    /// A one-pair rule.
    pub fn single(input: Symbol, output: Symbol, weight: Weight) -> Self {
        Self {
            pairs: vec![(input, output)],
            weight,
        }
    }

    /// True if no pair consumes or produces anything.
    pub fn is_all_epsilon(&self) -> bool {
        self.pairs
            .iter()
            .all(|(i, o)| i.is_epsilon() && o.is_epsilon())
    }
}

/// What [`compile`] does with an empty rule list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyRules {
    /// Produce the automaton accepting only the empty pair at cost 0.
    AcceptEmpty,
    /// Fail with [`FstError::EmptyRuleList`].
    Reject,
}

/// Compile a disjunction of rules.
///
/// Every rule becomes a linear chain of fresh states from a shared initial
/// state to a shared final state (final weight 0). Rules producing the same
/// output for the same input all survive as separate paths.
pub fn compile(rules: &[Rule], on_empty: EmptyRules) -> Result<WeightedAutomaton, FstError> {
    if rules.is_empty() {
        return match on_empty {
            EmptyRules::AcceptEmpty => Ok(algebra::epsilon_acceptor()),
            EmptyRules::Reject => Err(FstError::EmptyRuleList),
        };
    }

    let interior: usize = rules.iter().map(|r| r.pairs.len().saturating_sub(1)).sum();
    let pair_count: usize = rules.iter().map(|r| r.pairs.len()).sum();
    let mut builder = AutomatonBuilder::with_capacity(interior + 2, pair_count);

    let start = builder.add_state();
    let end = builder.add_state();
    builder.set_start(start);
    builder.set_final(end, 0.0);

    for (index, rule) in rules.iter().enumerate() {
        if rule.pairs.is_empty() {
            return Err(FstError::EmptyRule(index));
        }
        let weight = check_weight(rule.weight)?;

        let last = rule.pairs.len() - 1;
        let mut prev = start;
        for (j, &(input, output)) in rule.pairs.iter().enumerate() {
            let next = if j == last { end } else { builder.add_state() };
            let w = if j == 0 { weight } else { 0.0 };
            builder.add_transition(prev, next, input, output, w);
            prev = next;
        }
    }

    debug!(rules = rules.len(), states = builder.num_states(), "compiled rules");
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::{SearchLimits, best_paths};

    const K: Symbol = Symbol(1);
    const X: Symbol = Symbol(2);
    const S: Symbol = Symbol(3);

    #[test]
    fn rule_weight_sits_on_first_pair() {
        let a = compile(
            &[Rule::new(vec![(K, X), (S, Symbol::EPSILON)], 1.5)],
            EmptyRules::Reject,
        )
        .unwrap();
        let first = a.transitions_from(a.start());
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].weight, 1.5);
        let second = a.transitions_from(first[0].to);
        assert_eq!(second[0].weight, 0.0);
        assert!(a.is_final(second[0].to));
    }

    #[test]
    fn ties_survive() {
        let a = compile(
            &[Rule::single(K, K, 0.0), Rule::single(K, X, 1.0)],
            EmptyRules::Reject,
        )
        .unwrap();
        let result = best_paths(&a, Some(&[K]), 2, SearchLimits::default());
        assert_eq!(result.paths.len(), 2);
        assert_eq!(result.paths[0].output, vec![K]);
        assert_eq!(result.paths[0].cost, 0.0);
        assert_eq!(result.paths[1].output, vec![X]);
        assert_eq!(result.paths[1].cost, 1.0);
    }

    #[test]
    fn empty_list_policy() {
        assert!(matches!(
            compile(&[], EmptyRules::Reject),
            Err(FstError::EmptyRuleList)
        ));
        let a = compile(&[], EmptyRules::AcceptEmpty).unwrap();
        let result = best_paths(&a, Some(&[]), 5, SearchLimits::default());
        assert_eq!(result.paths.len(), 1);
        assert!(result.paths[0].output.is_empty());
        assert_eq!(result.paths[0].cost, 0.0);
    }

    #[test]
    fn empty_rule_is_rejected() {
        let rules = [Rule::single(K, K, 0.0), Rule::new(Vec::new(), 0.0)];
        assert!(matches!(
            compile(&rules, EmptyRules::Reject),
            Err(FstError::EmptyRule(1))
        ));
    }

    #[test]
    fn negative_rule_weight_is_rejected() {
        assert!(matches!(
            compile(&[Rule::single(K, K, -0.5)], EmptyRules::Reject),
            Err(FstError::InvalidWeight(_))
        ));
    }

    #[test]
    fn all_epsilon_detection() {
        assert!(Rule::single(Symbol::EPSILON, Symbol::EPSILON, 0.0).is_all_epsilon());
        assert!(!Rule::single(Symbol::EPSILON, K, 0.0).is_all_epsilon());
    }
}
