// Transducer algebra: every operation builds a new automaton from its
// operands and leaves them untouched.

use std::collections::{BinaryHeap, VecDeque};

use hashbrown::HashMap;
use phonofst_core::Symbol;
use tracing::{debug, debug_span};

use crate::FstError;
use crate::automaton::{AutomatonBuilder, MinCost, StateId, Weight, WeightedAutomaton};

const EPS: Symbol = Symbol::EPSILON;

/// The automaton accepting only the empty pair, at cost 0.
pub fn epsilon_acceptor() -> WeightedAutomaton {
    let mut b = AutomatonBuilder::with_capacity(1, 0);
    let s = b.add_state();
    b.set_start(s);
    b.set_final(s, 0.0);
    finish_infallible(b)
}

/// The automaton accepting nothing.
pub fn empty() -> WeightedAutomaton {
    let mut b = AutomatonBuilder::with_capacity(1, 0);
    let s = b.add_state();
    b.set_start(s);
    finish_infallible(b)
}

/// Identity transducer over exactly one symbol sequence, at cost 0.
pub fn linear_acceptor(symbols: &[Symbol]) -> WeightedAutomaton {
    let mut b = AutomatonBuilder::with_capacity(symbols.len() + 1, symbols.len());
    let mut prev = b.add_state();
    b.set_start(prev);
    for &sym in symbols {
        let next = b.add_state();
        b.add_transition(prev, next, sym, sym, 0.0);
        prev = next;
    }
    b.set_final(prev, 0.0);
    finish_infallible(b)
}

/// Union of two relations.
///
/// A fresh initial state reaches both operands' starts on free epsilon
/// transitions; all final states keep their weights.
pub fn disjoin(a: &WeightedAutomaton, b: &WeightedAutomaton) -> WeightedAutomaton {
    union_all([a, b])
}

/// Union of any number of relations behind one fresh initial state.
/// The union of nothing accepts nothing.
pub fn union_all<'a, I>(operands: I) -> WeightedAutomaton
where
    I: IntoIterator<Item = &'a WeightedAutomaton>,
{
    let mut builder = AutomatonBuilder::new();
    let start = builder.add_state();
    builder.set_start(start);
    for operand in operands {
        let offset = builder.append(operand);
        builder.add_transition(start, offset + operand.start(), EPS, EPS, 0.0);
    }
    finish_infallible(builder)
}

/// `a` followed by `b`.
///
/// Each final state of `a` gets an epsilon transition to `b`'s start carrying
/// its former final weight, and stops being final.
pub fn concat(a: &WeightedAutomaton, b: &WeightedAutomaton) -> WeightedAutomaton {
    let mut builder = AutomatonBuilder::with_capacity(
        a.num_states() + b.num_states(),
        a.num_transitions() + b.num_transitions(),
    );
    let oa = builder.append(a);
    let ob = builder.append(b);
    builder.set_start(oa + a.start());
    for (state, weight) in a.final_states() {
        builder.clear_final(oa + state);
        builder.add_transition(oa + state, ob + b.start(), EPS, EPS, weight);
    }
    finish_infallible(builder)
}

/// Swap input and output on every transition.
pub fn invert(a: &WeightedAutomaton) -> WeightedAutomaton {
    let mut builder = AutomatonBuilder::with_capacity(a.num_states(), a.num_transitions());
    for _ in a.states() {
        builder.add_state();
    }
    builder.set_start(a.start());
    for (state, weight) in a.final_states() {
        builder.set_final(state, weight);
    }
    for t in a.transitions() {
        builder.add_transition(t.from, t.to, t.output, t.input, t.weight);
    }
    finish_infallible(builder)
}

/// Kleene star: zero or more copies of `a`.
///
/// A fresh initial state is final at cost 0 and reaches `a`'s start for
/// free. Every final state of `a` loops back to `a`'s start, charging its
/// final weight. `a` must not accept the empty pair at cost 0 (see
/// [`empty_pair_cost`]), otherwise the result has a free epsilon cycle.
pub fn closure_star(a: &WeightedAutomaton) -> WeightedAutomaton {
    let mut builder = AutomatonBuilder::with_capacity(a.num_states() + 1, a.num_transitions() + 1);
    let start = builder.add_state();
    let offset = builder.append(a);
    let inner_start = offset + a.start();
    builder.set_start(start);
    builder.set_final(start, 0.0);
    builder.add_transition(start, inner_start, EPS, EPS, 0.0);
    for (state, weight) in a.final_states() {
        builder.add_transition(offset + state, inner_start, EPS, EPS, weight);
    }
    finish_infallible(builder)
}

/// One or more copies of `a`. Same precondition as [`closure_star`].
pub fn closure_plus(a: &WeightedAutomaton) -> WeightedAutomaton {
    let mut builder = AutomatonBuilder::with_capacity(a.num_states(), a.num_transitions());
    let offset = builder.append(a);
    let inner_start = offset + a.start();
    builder.set_start(inner_start);
    for (state, weight) in a.final_states() {
        builder.add_transition(offset + state, inner_start, EPS, EPS, weight);
    }
    finish_infallible(builder)
}

/// Between `min_n` and `max_n` copies of `a`, without any cycle through the
/// repetition point.
///
/// The optional part is nested (`ε | a (ε | a (...))`) so each repetition
/// count is reached by exactly one path shape.
pub fn bounded_repeat(
    a: &WeightedAutomaton,
    min_n: usize,
    max_n: usize,
) -> Result<WeightedAutomaton, FstError> {
    if max_n < min_n {
        return Err(FstError::InvalidRepeatBounds {
            min: min_n,
            max: max_n,
        });
    }

    let mut result = epsilon_acceptor();
    for _ in 0..min_n {
        result = concat(&result, a);
    }
    if max_n > min_n {
        let mut tail = epsilon_acceptor();
        for _ in min_n..max_n {
            tail = disjoin(&epsilon_acceptor(), &concat(a, &tail));
        }
        result = concat(&result, &tail);
    }
    Ok(result)
}

/// Product-state key: (state of `a`, state of `b`, epsilon filter).
type PairKey = (StateId, StateId, u8);

/// Compose two relations: `a`'s output feeds `b`'s input.
///
/// Product states carry an epsilon filter flag. A move of `a` alone (output
/// epsilon) is allowed only while the flag is 0; a move of `b` alone (input
/// epsilon) sets it to 1; a matched move on a real symbol resets it to 0.
/// Between two matched moves every `a`-alone step therefore precedes every
/// `b`-alone step, so each pair of operand paths yields one composed path.
///
/// Fails with [`FstError::DisjointAlphabets`] when both `a`'s output alphabet
/// and `b`'s input alphabet are non-empty and share no symbol.
pub fn compose(a: &WeightedAutomaton, b: &WeightedAutomaton) -> Result<WeightedAutomaton, FstError> {
    let _span = debug_span!(
        "compose",
        a_states = a.num_states(),
        b_states = b.num_states()
    )
    .entered();

    let a_out = a.output_alphabet();
    let b_in = b.input_alphabet();
    if !a_out.is_empty() && !b_in.is_empty() && a_out.is_disjoint(&b_in) {
        return Err(FstError::DisjointAlphabets);
    }

    // b's transitions by (state, input symbol), real symbols only.
    let mut b_index: HashMap<(StateId, Symbol), Vec<u32>> = HashMap::new();
    for (i, t) in b.transitions().iter().enumerate() {
        if !t.input.is_epsilon() {
            b_index.entry((t.from, t.input)).or_default().push(i as u32);
        }
    }

    let mut builder = AutomatonBuilder::new();
    let mut ids: HashMap<PairKey, StateId> = HashMap::new();
    let mut queue: VecDeque<(PairKey, StateId)> = VecDeque::new();

    let start = product_state((a.start(), b.start(), 0), &mut ids, &mut builder, &mut queue);
    builder.set_start(start);

    while let Some(((sa, sb, filter), src)) = queue.pop_front() {
        if let (Some(wa), Some(wb)) = (a.final_weight(sa), b.final_weight(sb)) {
            builder.set_final(src, wa + wb);
        }

        for ta in a.transitions_from(sa) {
            if ta.output.is_epsilon() {
                if filter == 0 {
                    let dst = product_state((ta.to, sb, 0), &mut ids, &mut builder, &mut queue);
                    builder.add_transition(src, dst, ta.input, EPS, ta.weight);
                }
            } else if let Some(matches) = b_index.get(&(sb, ta.output)) {
                for &i in matches {
                    let tb = &b.transitions()[i as usize];
                    let dst = product_state((ta.to, tb.to, 0), &mut ids, &mut builder, &mut queue);
                    builder.add_transition(src, dst, ta.input, tb.output, ta.weight + tb.weight);
                }
            }
        }

        for tb in b.transitions_from(sb) {
            if tb.input.is_epsilon() {
                let dst = product_state((sa, tb.to, 1), &mut ids, &mut builder, &mut queue);
                builder.add_transition(src, dst, EPS, tb.output, tb.weight);
            }
        }
    }

    debug!(states = builder.num_states(), "composed");
    builder.finish()
}

fn product_state(
    key: PairKey,
    ids: &mut HashMap<PairKey, StateId>,
    builder: &mut AutomatonBuilder,
    queue: &mut VecDeque<(PairKey, StateId)>,
) -> StateId {
    *ids.entry(key).or_insert_with(|| {
        let id = builder.add_state();
        queue.push_back((key, id));
        id
    })
}

/// Remove states that are not both reachable from the start and able to
/// reach a final state. The start state is always kept.
pub fn trim(a: &WeightedAutomaton) -> WeightedAutomaton {
    let n = a.num_states();

    let mut reachable = vec![false; n];
    let mut stack = vec![a.start()];
    reachable[a.start() as usize] = true;
    while let Some(s) = stack.pop() {
        for t in a.transitions_from(s) {
            if !reachable[t.to as usize] {
                reachable[t.to as usize] = true;
                stack.push(t.to);
            }
        }
    }

    let mut incoming: Vec<Vec<StateId>> = vec![Vec::new(); n];
    for t in a.transitions() {
        incoming[t.to as usize].push(t.from);
    }
    let mut coreachable = vec![false; n];
    let mut stack: Vec<StateId> = a.final_states().map(|(s, _)| s).collect();
    for &s in &stack {
        coreachable[s as usize] = true;
    }
    while let Some(s) = stack.pop() {
        for &p in &incoming[s as usize] {
            if !coreachable[p as usize] {
                coreachable[p as usize] = true;
                stack.push(p);
            }
        }
    }

    let mut remap: Vec<Option<StateId>> = vec![None; n];
    let mut builder = AutomatonBuilder::new();
    for s in a.states() {
        let keep = s == a.start() || (reachable[s as usize] && coreachable[s as usize]);
        if keep {
            let id = builder.add_state();
            remap[s as usize] = Some(id);
            if let Some(w) = a.final_weight(s) {
                builder.set_final(id, w);
            }
        }
    }
    let start = remap[a.start() as usize].unwrap_or_default();
    builder.set_start(start);
    for t in a.transitions() {
        if let (Some(from), Some(to)) = (remap[t.from as usize], remap[t.to as usize]) {
            if coreachable[t.to as usize] {
                builder.add_transition(from, to, t.input, t.output, t.weight);
            }
        }
    }
    finish_infallible(builder)
}

/// Cheapest cost at which `a` accepts the empty input/output pair, or `None`
/// if it never does.
pub fn empty_pair_cost(a: &WeightedAutomaton) -> Option<Weight> {
    let n = a.num_states();
    let mut dist = vec![Weight::INFINITY; n];
    let mut heap: BinaryHeap<(MinCost, StateId)> = BinaryHeap::new();
    let mut seq = 0u64;

    dist[a.start() as usize] = 0.0;
    heap.push((MinCost { cost: 0.0, seq }, a.start()));

    let mut best: Option<Weight> = None;
    while let Some((MinCost { cost, .. }, s)) = heap.pop() {
        if cost > dist[s as usize] {
            continue;
        }
        if let Some(w) = a.final_weight(s) {
            let total = cost + w;
            best = Some(best.map_or(total, |b: Weight| b.min(total)));
        }
        for t in a.transitions_from(s) {
            if !t.input.is_epsilon() || !t.output.is_epsilon() {
                continue;
            }
            let next = cost + t.weight;
            if next < dist[t.to as usize] {
                dist[t.to as usize] = next;
                seq += 1;
                heap.push((MinCost { cost: next, seq }, t.to));
            }
        }
    }
    best
}

/// Builders assembled here only reference states they created, start
/// included, and copy weights from already validated automata.
fn finish_infallible(builder: AutomatonBuilder) -> WeightedAutomaton {
    match builder.finish() {
        Ok(a) => a,
        Err(e) => unreachable!("algebra produced an invalid automaton: {e}"),
    }
}
