//! Property-based tests for the automaton algebra and path extraction.
//!
//! Automata are compiled from random rule lists over a four-symbol alphabet.
//! Weights are multiples of 0.25 so that sums stay exact.

use std::collections::BTreeMap;

use proptest::prelude::*;

use phonofst::algebra::{closure_star, compose, concat, disjoin, invert};
use phonofst::{
    EmptyRules, Rule, SearchLimits, Symbol, Weight, WeightedAutomaton, best_paths, compile,
};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_symbol() -> impl Strategy<Value = Symbol> {
    prop_oneof![
        1 => Just(Symbol::EPSILON),
        4 => (1u32..=4).prop_map(Symbol),
    ]
}

fn arb_weight() -> impl Strategy<Value = Weight> {
    (0u32..=8).prop_map(|q| f64::from(q) * 0.25)
}

fn arb_rule() -> impl Strategy<Value = Rule> {
    (
        prop::collection::vec((arb_symbol(), arb_symbol()), 1..=2),
        arb_weight(),
    )
        .prop_map(|(pairs, weight)| Rule::new(pairs, weight))
}

fn arb_automaton() -> impl Strategy<Value = WeightedAutomaton> {
    prop::collection::vec(arb_rule(), 1..=5)
        .prop_map(|rules| compile(&rules, EmptyRules::Reject).unwrap())
}

fn arb_query() -> impl Strategy<Value = Vec<Symbol>> {
    prop::collection::vec((1u32..=4).prop_map(Symbol), 0..=3)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Cheapest cost per distinct output for `query`.
fn relation(a: &WeightedAutomaton, query: &[Symbol]) -> BTreeMap<Vec<u32>, Weight> {
    best_paths(a, Some(query), 1000, SearchLimits::default())
        .paths
        .into_iter()
        .map(|p| (p.output.iter().map(|s| s.0).collect(), p.cost))
        .collect()
}

fn best_cost(a: &WeightedAutomaton, query: &[Symbol]) -> Option<Weight> {
    best_paths(a, Some(query), 1, SearchLimits::default())
        .paths
        .first()
        .map(|p| p.cost)
}

/// Every accepting path of an acyclic automaton whose input equals `query`,
/// reduced to the cheapest cost per output.
fn brute_force(a: &WeightedAutomaton, query: &[Symbol]) -> BTreeMap<Vec<u32>, Weight> {
    fn walk(
        a: &WeightedAutomaton,
        state: u32,
        query: &[Symbol],
        output: &mut Vec<u32>,
        cost: Weight,
        found: &mut BTreeMap<Vec<u32>, Weight>,
    ) {
        if query.is_empty() {
            if let Some(w) = a.final_weight(state) {
                let total = cost + w;
                let entry = found.entry(output.clone()).or_insert(total);
                if total < *entry {
                    *entry = total;
                }
            }
        }
        for t in a.transitions_from(state) {
            let rest = if t.input.is_epsilon() {
                query
            } else if query.first() == Some(&t.input) {
                &query[1..]
            } else {
                continue;
            };
            let pushed = !t.output.is_epsilon();
            if pushed {
                output.push(t.output.0);
            }
            walk(a, t.to, rest, output, cost + t.weight, found);
            if pushed {
                output.pop();
            }
        }
    }

    let mut found = BTreeMap::new();
    walk(a, a.start(), query, &mut Vec::new(), 0.0, &mut found);
    found
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn union_takes_cheaper_operand(
        a in arb_automaton(),
        b in arb_automaton(),
        query in arb_query(),
    ) {
        let mut expected = relation(&a, &query);
        for (output, cost) in relation(&b, &query) {
            let entry = expected.entry(output).or_insert(cost);
            if cost < *entry {
                *entry = cost;
            }
        }
        prop_assert_eq!(relation(&disjoin(&a, &b), &query), expected);
    }

    #[test]
    fn inversion_is_an_involution(a in arb_automaton(), query in arb_query()) {
        let back = invert(&invert(&a));
        prop_assert_eq!(back.transitions(), a.transitions());
        prop_assert_eq!(relation(&back, &query), relation(&a, &query));
    }

    #[test]
    fn star_accepts_empty_pair_at_zero(a in arb_automaton()) {
        let star = closure_star(&a);
        let result = best_paths(&star, Some(&[]), 50, SearchLimits::default());
        prop_assert!(
            result
                .paths
                .iter()
                .any(|p| p.output.is_empty() && p.cost == 0.0)
        );
        prop_assert_eq!(result.paths[0].cost, 0.0);
    }

    #[test]
    fn results_match_brute_force(
        a in arb_automaton(),
        b in arb_automaton(),
        query in arb_query(),
    ) {
        let chained = concat(&a, &b);
        let result = best_paths(&chained, Some(&query), 1000, SearchLimits::default());

        for pair in result.paths.windows(2) {
            prop_assert!(pair[0].cost <= pair[1].cost);
        }
        prop_assert_eq!(relation(&chained, &query), brute_force(&chained, &query));
    }

    #[test]
    fn composition_is_associative(
        a in arb_automaton(),
        b in arb_automaton(),
        c in arb_automaton(),
        query in arb_query(),
    ) {
        let left = compose(&a, &b).and_then(|ab| compose(&ab, &c));
        let right = compose(&b, &c).and_then(|bc| compose(&a, &bc));
        let (Ok(left), Ok(right)) = (left, right) else {
            return Err(TestCaseError::reject("incompatible alphabets"));
        };

        let l = relation(&left, &query);
        let r = relation(&right, &query);
        prop_assert_eq!(l.keys().collect::<Vec<_>>(), r.keys().collect::<Vec<_>>());
        for (output, cost) in &l {
            prop_assert!((cost - r[output]).abs() < 1e-9);
        }
    }

    #[test]
    fn query_outside_language_is_empty(a in arb_automaton()) {
        // Symbol 9 never appears in generated rules.
        let result = best_paths(&a, Some(&[Symbol(9)]), 5, SearchLimits::default());
        prop_assert!(result.is_empty());
        prop_assert!(!result.is_truncated());
    }
}
