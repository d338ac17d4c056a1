// Best-first extraction of the K cheapest accepting paths.
//
// The search runs Dijkstra over configurations (state, query position,
// output so far). Outputs are hash-consed in a trie, so a configuration is
// three integers. A configuration is expanded once, at its cheapest arrival;
// distinct configurations with the same state stay apart, which lets the
// search surface K distinct outputs rather than K state arrivals.

use std::collections::BinaryHeap;

use hashbrown::{HashMap, HashSet};
use phonofst_core::Symbol;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::automaton::{MinCost, StateId, Weight, WeightedAutomaton};

/// Default ceiling on expanded configurations per search.
pub const DEFAULT_MAX_EXPANSIONS: usize = 100_000;

/// Resource ceilings for one search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchLimits {
    /// Maximum number of configurations expanded before giving up.
    pub max_expansions: usize,
    /// Paths costing more than this are never explored.
    pub max_cost: Option<Weight>,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_expansions: DEFAULT_MAX_EXPANSIONS,
            max_cost: None,
        }
    }
}

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// Every eligible path was considered (or K results were found).
    Complete,
    /// The expansion ceiling stopped the search; results are partial.
    ExpansionLimit,
    /// Some paths were cut by the cost ceiling; results are partial.
    CostCeiling,
}

/// One accepting path: its output (epsilons dropped) and total cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub output: Vec<Symbol>,
    pub cost: Weight,
}

/// Result of [`best_paths`].
#[derive(Debug, Clone, PartialEq)]
pub struct NBest {
    /// Paths in non-decreasing cost order, distinct outputs.
    pub paths: Vec<Path>,
    pub status: SearchStatus,
}

impl NBest {
    /// True when no path matched ("no match" is a normal outcome).
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// True when a resource ceiling may have hidden further results.
    pub fn is_truncated(&self) -> bool {
        self.status != SearchStatus::Complete
    }
}

/// Collect up to `k` cheapest accepting paths with distinct outputs.
///
/// With `query`, only paths whose input projection equals the query are
/// eligible; without it, every accepting path is. Equal costs come out in
/// discovery order.
pub fn best_paths(
    automaton: &WeightedAutomaton,
    query: Option<&[Symbol]>,
    k: usize,
    limits: SearchLimits,
) -> NBest {
    if k == 0 {
        return NBest {
            paths: Vec::new(),
            status: SearchStatus::Complete,
        };
    }
    let mut search = BestPaths::new(automaton, query, limits);
    let paths: Vec<Path> = search.by_ref().take(k).collect();
    let status = if paths.len() == k {
        SearchStatus::Complete
    } else {
        search.status()
    };
    debug!(
        results = paths.len(),
        expansions = search.expansions(),
        best_cost = paths.first().map(|p| p.cost),
        "best paths"
    );
    NBest { paths, status }
}

/// Interned output sequences: node 0 is the empty output.
#[derive(Debug, Default)]
struct OutputTrie {
    nodes: Vec<(u32, Symbol)>,
    children: HashMap<(u32, Symbol), u32>,
}

impl OutputTrie {
    fn new() -> Self {
        Self {
            nodes: vec![(0, Symbol::EPSILON)],
            children: HashMap::new(),
        }
    }

    fn child(&mut self, parent: u32, sym: Symbol) -> u32 {
        if let Some(&id) = self.children.get(&(parent, sym)) {
            return id;
        }
        let id = self.nodes.len() as u32;
        self.nodes.push((parent, sym));
        self.children.insert((parent, sym), id);
        id
    }

    fn resolve(&self, mut node: u32) -> Vec<Symbol> {
        let mut out = Vec::new();
        while node != 0 {
            let (parent, sym) = self.nodes[node as usize];
            out.push(sym);
            node = parent;
        }
        out.reverse();
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    key: MinCost,
    state: StateId,
    pos: u32,
    out: u32,
    accept: bool,
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

/// Lazy best-first path enumeration.
///
/// Each `next` resumes the search until one more path with a new output is
/// found. Dropping the iterator early costs nothing extra.
pub struct BestPaths<'a> {
    automaton: &'a WeightedAutomaton,
    query: Option<Vec<Symbol>>,
    limits: SearchLimits,
    heap: BinaryHeap<Entry>,
    settled: HashSet<(StateId, u32, u32)>,
    emitted: HashSet<u32>,
    trie: OutputTrie,
    seq: u64,
    expansions: usize,
    pruned: bool,
    status: SearchStatus,
}

impl<'a> BestPaths<'a> {
    pub fn new(
        automaton: &'a WeightedAutomaton,
        query: Option<&[Symbol]>,
        limits: SearchLimits,
    ) -> Self {
        let mut search = Self {
            automaton,
            query: query.map(<[Symbol]>::to_vec),
            limits,
            heap: BinaryHeap::new(),
            settled: HashSet::new(),
            emitted: HashSet::new(),
            trie: OutputTrie::new(),
            seq: 0,
            expansions: 0,
            pruned: false,
            status: SearchStatus::Complete,
        };
        search.push(0.0, automaton.start(), 0, 0, false);
        search
    }

    /// How the search has ended so far. Meaningful once `next` returned `None`.
    pub fn status(&self) -> SearchStatus {
        self.status
    }

    /// Number of configurations expanded so far.
    pub fn expansions(&self) -> usize {
        self.expansions
    }

    fn push(&mut self, cost: Weight, state: StateId, pos: u32, out: u32, accept: bool) {
        if let Some(max) = self.limits.max_cost {
            if cost > max {
                self.pruned = true;
                return;
            }
        }
        self.seq += 1;
        self.heap.push(Entry {
            key: MinCost {
                cost,
                seq: self.seq,
            },
            state,
            pos,
            out,
            accept,
        });
    }

    fn query_done(&self, pos: u32) -> bool {
        match &self.query {
            Some(q) => pos as usize == q.len(),
            None => true,
        }
    }

    fn expand(&mut self, entry: Entry) {
        let automaton = self.automaton;
        let cost = entry.key.cost;

        if self.query_done(entry.pos) {
            if let Some(w) = automaton.final_weight(entry.state) {
                self.push(cost + w, entry.state, entry.pos, entry.out, true);
            }
        }

        for t in automaton.transitions_from(entry.state) {
            let pos = if t.input.is_epsilon() {
                entry.pos
            } else {
                match &self.query {
                    None => entry.pos,
                    Some(q) => match q.get(entry.pos as usize) {
                        Some(&sym) if sym == t.input => entry.pos + 1,
                        _ => continue,
                    },
                }
            };
            let out = if t.output.is_epsilon() {
                entry.out
            } else {
                self.trie.child(entry.out, t.output)
            };
            if self.settled.contains(&(t.to, pos, out)) {
                continue;
            }
            self.push(cost + t.weight, t.to, pos, out, false);
        }
    }
}

impl Iterator for BestPaths<'_> {
    type Item = Path;

    fn next(&mut self) -> Option<Path> {
        while let Some(entry) = self.heap.pop() {
            if entry.accept {
                if self.emitted.insert(entry.out) {
                    return Some(Path {
                        output: self.trie.resolve(entry.out),
                        cost: entry.key.cost,
                    });
                }
                continue;
            }

            if !self.settled.insert((entry.state, entry.pos, entry.out)) {
                continue;
            }
            if self.expansions >= self.limits.max_expansions {
                // Accepts no dearer than this entry would still pop next.
                self.status = SearchStatus::ExpansionLimit;
                let ceiling = entry.key.cost;
                self.heap.retain(|e| e.accept && e.key.cost <= ceiling);
                continue;
            }
            self.expansions += 1;
            self.expand(entry);
        }

        if self.pruned && self.status == SearchStatus::Complete {
            self.status = SearchStatus::CostCeiling;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::{closure_star, compose, disjoin};
    use crate::automaton::AutomatonBuilder;
    use crate::rules::{EmptyRules, Rule, compile};

    const K: Symbol = Symbol(1);
    const X: Symbol = Symbol(2);
    const A: Symbol = Symbol(3);
    const ONE: Symbol = Symbol(4);
    const Z: Symbol = Symbol(5);

    fn pairs(result: NBest) -> Vec<(Vec<Symbol>, Weight)> {
        result.paths.into_iter().map(|p| (p.output, p.cost)).collect()
    }

    #[test]
    fn k_to_k_and_x() {
        let a = compile(
            &[Rule::single(K, K, 0.0), Rule::single(K, X, 1.0)],
            EmptyRules::Reject,
        )
        .unwrap();
        let result = best_paths(&a, Some(&[K]), 2, SearchLimits::default());
        assert_eq!(result.status, SearchStatus::Complete);
        assert_eq!(pairs(result), vec![(vec![K], 0.0), (vec![X], 1.0)]);
    }

    #[test]
    fn composed_single_symbols() {
        let a = compile(&[Rule::single(A, ONE, 0.0)], EmptyRules::Reject).unwrap();
        let b = compile(&[Rule::single(ONE, Z, 2.0)], EmptyRules::Reject).unwrap();
        let c = compose(&a, &b).unwrap();
        assert_eq!(
            pairs(best_paths(&c, Some(&[A]), 5, SearchLimits::default())),
            vec![(vec![Z], 2.0)]
        );
    }

    #[test]
    fn closure_star_on_aaa_costs_three() {
        let a = compile(&[Rule::single(A, A, 1.0)], EmptyRules::Reject).unwrap();
        let star = closure_star(&a);
        let result = best_paths(&star, Some(&[A, A, A]), 1, SearchLimits::default());
        assert_eq!(result.paths[0].cost, 3.0);
    }

    #[test]
    fn no_match_is_empty_not_error() {
        let a = compile(&[Rule::single(K, K, 0.0)], EmptyRules::Reject).unwrap();
        let result = best_paths(&a, Some(&[X]), 3, SearchLimits::default());
        assert!(result.is_empty());
        assert!(!result.is_truncated());
    }

    #[test]
    fn fewer_than_k_returns_all() {
        let a = compile(
            &[Rule::single(K, K, 0.0), Rule::single(K, X, 1.0)],
            EmptyRules::Reject,
        )
        .unwrap();
        let result = best_paths(&a, Some(&[K]), 10, SearchLimits::default());
        assert_eq!(result.paths.len(), 2);
        assert_eq!(result.status, SearchStatus::Complete);
    }

    #[test]
    fn zero_k_is_empty() {
        let a = compile(&[Rule::single(K, K, 0.0)], EmptyRules::Reject).unwrap();
        assert!(best_paths(&a, Some(&[K]), 0, SearchLimits::default()).is_empty());
    }

    #[test]
    fn duplicate_outputs_collapse_to_cheapest() {
        let a = compile(
            &[
                Rule::single(K, X, 3.0),
                Rule::single(K, X, 1.0),
                Rule::single(K, K, 2.0),
            ],
            EmptyRules::Reject,
        )
        .unwrap();
        assert_eq!(
            pairs(best_paths(&a, Some(&[K]), 5, SearchLimits::default())),
            vec![(vec![X], 1.0), (vec![K], 2.0)]
        );
    }

    #[test]
    fn unconstrained_search_enumerates_language() {
        let a = disjoin(
            &compile(&[Rule::single(K, X, 0.5)], EmptyRules::Reject).unwrap(),
            &compile(&[Rule::single(A, Z, 0.25)], EmptyRules::Reject).unwrap(),
        );
        assert_eq!(
            pairs(best_paths(&a, None, 5, SearchLimits::default())),
            vec![(vec![Z], 0.25), (vec![X], 0.5)]
        );
    }

    #[test]
    fn cyclic_language_terminates_with_k() {
        // Insertion loop: ε -> A at cost 1, infinitely many outputs.
        let ins = compile(&[Rule::single(Symbol::EPSILON, A, 1.0)], EmptyRules::Reject).unwrap();
        let star = closure_star(&ins);
        let result = best_paths(&star, Some(&[]), 4, SearchLimits::default());
        let costs: Vec<Weight> = result.paths.iter().map(|p| p.cost).collect();
        assert_eq!(costs, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(result.status, SearchStatus::Complete);
    }

    #[test]
    fn expansion_limit_is_reported() {
        let ins = compile(&[Rule::single(Symbol::EPSILON, A, 1.0)], EmptyRules::Reject).unwrap();
        let star = closure_star(&ins);
        let limits = SearchLimits {
            max_expansions: 5,
            max_cost: None,
        };
        let result = best_paths(&star, None, 1000, limits);
        assert!(result.paths.len() < 1000);
        assert_eq!(result.status, SearchStatus::ExpansionLimit);
        assert!(result.is_truncated());
    }

    #[test]
    fn expansion_limit_keeps_discovered_cheapest_accepts() {
        let mut b = AutomatonBuilder::new();
        let s0 = b.add_state();
        let done = b.add_state();
        let pending = b.add_state();
        let far = b.add_state();
        b.set_start(s0);
        b.set_final(done, 0.0);
        b.set_final(far, 0.0);
        b.add_transition(s0, done, A, A, 1.0);
        b.add_transition(s0, pending, K, K, 1.0);
        b.add_transition(pending, far, X, X, 0.0);
        let a = b.finish().unwrap();

        // s0 and `done` are expanded; the limit trips on `pending`, while the
        // accept for `done` at cost 1 is already queued.
        let limits = SearchLimits {
            max_expansions: 2,
            max_cost: None,
        };
        let result = best_paths(&a, None, 5, limits);
        assert_eq!(result.status, SearchStatus::ExpansionLimit);
        assert_eq!(pairs(result), vec![(vec![A], 1.0)]);
    }

    #[test]
    fn cost_ceiling_is_reported() {
        let ins = compile(&[Rule::single(Symbol::EPSILON, A, 1.0)], EmptyRules::Reject).unwrap();
        let star = closure_star(&ins);
        let limits = SearchLimits {
            max_expansions: DEFAULT_MAX_EXPANSIONS,
            max_cost: Some(2.5),
        };
        let result = best_paths(&star, None, 100, limits);
        assert_eq!(result.paths.len(), 3);
        assert_eq!(result.status, SearchStatus::CostCeiling);
    }

    #[test]
    fn free_epsilon_cycle_does_not_hang() {
        let mut b = AutomatonBuilder::new();
        let s = b.add_state();
        let t = b.add_state();
        b.set_start(s);
        b.set_final(t, 0.0);
        b.add_transition(s, s, Symbol::EPSILON, Symbol::EPSILON, 0.0);
        b.add_transition(s, t, K, K, 0.0);
        let a = b.finish().unwrap();
        let result = best_paths(&a, Some(&[K]), 3, SearchLimits::default());
        assert_eq!(pairs(result), vec![(vec![K], 0.0)]);
    }

    #[test]
    fn lazy_iteration_can_stop_early() {
        let a = compile(
            &[Rule::single(K, K, 0.0), Rule::single(K, X, 1.0)],
            EmptyRules::Reject,
        )
        .unwrap();
        let mut it = BestPaths::new(&a, Some(&[K]), SearchLimits::default());
        let first = it.next().unwrap();
        assert_eq!(first.output, vec![K]);
        drop(it);
    }

    #[test]
    fn final_weight_orders_results() {
        let mut b = AutomatonBuilder::new();
        let s = b.add_state();
        let cheap_edge = b.add_state();
        let cheap_final = b.add_state();
        b.set_start(s);
        b.set_final(cheap_edge, 5.0);
        b.set_final(cheap_final, 0.0);
        b.add_transition(s, cheap_edge, K, K, 0.0);
        b.add_transition(s, cheap_final, K, X, 1.0);
        let a = b.finish().unwrap();
        assert_eq!(
            pairs(best_paths(&a, Some(&[K]), 2, SearchLimits::default())),
            vec![(vec![X], 1.0), (vec![K], 5.0)]
        );
    }
}
