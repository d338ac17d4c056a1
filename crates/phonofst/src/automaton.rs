// Weighted automaton arena and its builder.
//
// States are dense u32 ids. Transitions live in one flat array sorted by
// source state, with `offsets[s]..offsets[s + 1]` giving the slice of state
// `s` (CSR layout). Non-final states carry an infinite final weight, the
// tropical zero.

use std::cmp::Ordering;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use hashbrown::HashSet;
use phonofst_core::Symbol;

use crate::FstError;

/// State identifier.
pub type StateId = u32;

/// Path cost in the tropical semiring (sum along a path, min across paths).
pub type Weight = f64;

/// One weighted transition (24 bytes).
///
/// Layout is fixed so that transition tables can be written and read as raw
/// bytes by [`crate::format`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Transition {
    pub from: StateId,
    pub to: StateId,
    pub input: Symbol,
    pub output: Symbol,
    pub weight: Weight,
}

const _: () = assert!(size_of::<Transition>() == 24);

/// Check that a weight is usable in the tropical semiring.
pub fn check_weight(weight: Weight) -> Result<Weight, FstError> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(weight)
    } else {
        Err(FstError::InvalidWeight(weight))
    }
}

struct Inner {
    start: StateId,
    finals: Vec<Weight>,
    offsets: Vec<u32>,
    transitions: Vec<Transition>,
}

/// An immutable weighted finite-state transducer.
///
/// Cloning is cheap: the arena is shared behind an `Arc`.
#[derive(Clone)]
pub struct WeightedAutomaton {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for WeightedAutomaton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightedAutomaton")
            .field("start", &self.inner.start)
            .field("state_count", &self.num_states())
            .field("final_count", &self.final_states().count())
            .field("transition_count", &self.num_transitions())
            .finish()
    }
}

impl WeightedAutomaton {
    /// The initial state.
    #[inline]
    pub fn start(&self) -> StateId {
        self.inner.start
    }

    #[inline]
    pub fn num_states(&self) -> usize {
        self.inner.finals.len()
    }

    #[inline]
    pub fn num_transitions(&self) -> usize {
        self.inner.transitions.len()
    }

    /// All state ids.
    pub fn states(&self) -> std::ops::Range<StateId> {
        0..self.num_states() as StateId
    }

    /// Final weight of `state`, or `None` if it is not final.
    #[inline]
    pub fn final_weight(&self, state: StateId) -> Option<Weight> {
        let w = self.inner.finals[state as usize];
        if w.is_finite() { Some(w) } else { None }
    }

    #[inline]
    pub fn is_final(&self, state: StateId) -> bool {
        self.final_weight(state).is_some()
    }

    /// Final states with their weights, in id order.
    pub fn final_states(&self) -> impl Iterator<Item = (StateId, Weight)> + '_ {
        self.inner
            .finals
            .iter()
            .enumerate()
            .filter(|(_, w)| w.is_finite())
            .map(|(s, &w)| (s as StateId, w))
    }

    /// Outgoing transitions of `state`, in insertion order.
    #[inline]
    pub fn transitions_from(&self, state: StateId) -> &[Transition] {
        let s = state as usize;
        let lo = self.inner.offsets[s] as usize;
        let hi = self.inner.offsets[s + 1] as usize;
        &self.inner.transitions[lo..hi]
    }

    /// The whole transition table, sorted by source state.
    #[inline]
    pub fn transitions(&self) -> &[Transition] {
        &self.inner.transitions
    }

    /// Raw final weights (infinite for non-final states).
    pub(crate) fn raw_finals(&self) -> &[Weight] {
        &self.inner.finals
    }

    /// Real (non-epsilon) input symbols used by any transition.
    pub fn input_alphabet(&self) -> HashSet<Symbol> {
        self.transitions()
            .iter()
            .map(|t| t.input)
            .filter(|s| !s.is_epsilon())
            .collect()
    }

    /// Real (non-epsilon) output symbols used by any transition.
    pub fn output_alphabet(&self) -> HashSet<Symbol> {
        self.transitions()
            .iter()
            .map(|t| t.output)
            .filter(|s| !s.is_epsilon())
            .collect()
    }
}

/// Mutable state/transition arena that produces a [`WeightedAutomaton`].
///
/// Nothing is validated until [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct AutomatonBuilder {
    start: Option<StateId>,
    finals: Vec<Option<Weight>>,
    transitions: Vec<Transition>,
    /// First unknown state passed to `set_final`/`clear_final`, with the
    /// state count at that time.
    unknown_final: Option<(StateId, usize)>,
}

impl AutomatonBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(states: usize, transitions: usize) -> Self {
        Self {
            start: None,
            finals: Vec::with_capacity(states),
            transitions: Vec::with_capacity(transitions),
            unknown_final: None,
        }
    }

    /// Add a fresh non-final state.
    pub fn add_state(&mut self) -> StateId {
        self.finals.push(None);
        (self.finals.len() - 1) as StateId
    }

    pub fn num_states(&self) -> usize {
        self.finals.len()
    }

    pub fn set_start(&mut self, state: StateId) {
        self.start = Some(state);
    }

    /// Make `state` final. An unknown state makes [`finish`](Self::finish)
    /// fail with [`FstError::InvalidState`].
    pub fn set_final(&mut self, state: StateId, weight: Weight) {
        match self.finals.get_mut(state as usize) {
            Some(slot) => *slot = Some(weight),
            None => self.note_unknown_final(state),
        }
    }

    pub fn clear_final(&mut self, state: StateId) {
        match self.finals.get_mut(state as usize) {
            Some(slot) => *slot = None,
            None => self.note_unknown_final(state),
        }
    }

    fn note_unknown_final(&mut self, state: StateId) {
        if self.unknown_final.is_none() {
            self.unknown_final = Some((state, self.finals.len()));
        }
    }

    pub fn add_transition(
        &mut self,
        from: StateId,
        to: StateId,
        input: Symbol,
        output: Symbol,
        weight: Weight,
    ) {
        self.transitions.push(Transition {
            from,
            to,
            input,
            output,
            weight,
        });
    }

    /// Copy every state, final weight and transition of `automaton` into this
    /// arena. Returns the id offset of the copy; its start state is
    /// `offset + automaton.start()`. The start of this builder is unchanged.
    pub fn append(&mut self, automaton: &WeightedAutomaton) -> StateId {
        let offset = self.finals.len() as StateId;
        self.finals.extend(
            automaton
                .raw_finals()
                .iter()
                .map(|&w| if w.is_finite() { Some(w) } else { None }),
        );
        self.transitions
            .extend(automaton.transitions().iter().map(|t| Transition {
                from: t.from + offset,
                to: t.to + offset,
                ..*t
            }));
        offset
    }

    /// Validate and freeze the arena.
    pub fn finish(self) -> Result<WeightedAutomaton, FstError> {
        if let Some((state, states)) = self.unknown_final {
            return Err(FstError::InvalidState { state, states });
        }
        let state_count = self.finals.len();
        let start = self.start.ok_or(FstError::MissingStart)?;
        check_state(start, state_count)?;

        let mut finals = Vec::with_capacity(state_count);
        for w in self.finals {
            finals.push(match w {
                Some(w) => check_weight(w)?,
                None => Weight::INFINITY,
            });
        }

        let mut transitions = self.transitions;
        for t in &transitions {
            check_state(t.from, state_count)?;
            check_state(t.to, state_count)?;
            check_weight(t.weight)?;
        }
        // Stable: keeps insertion order within a state.
        transitions.sort_by_key(|t| t.from);

        let mut offsets = vec![0u32; state_count + 1];
        for t in &transitions {
            offsets[t.from as usize + 1] += 1;
        }
        for s in 0..state_count {
            offsets[s + 1] += offsets[s];
        }

        Ok(WeightedAutomaton {
            inner: Arc::new(Inner {
                start,
                finals,
                offsets,
                transitions,
            }),
        })
    }
}

fn check_state(state: StateId, states: usize) -> Result<(), FstError> {
    if (state as usize) < states {
        Ok(())
    } else {
        Err(FstError::InvalidState { state, states })
    }
}

/// Heap key ordering costs so that `BinaryHeap` pops the cheapest first,
/// then the earliest discovered.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MinCost {
    pub cost: Weight,
    pub seq: u64,
}

impl PartialEq for MinCost {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MinCost {}

impl PartialOrd for MinCost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MinCost {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(n: u32) -> Symbol {
        Symbol(n)
    }

    #[test]
    fn transition_size() {
        assert_eq!(size_of::<Transition>(), 24);
    }

    #[test]
    fn finish_requires_start() {
        let mut b = AutomatonBuilder::new();
        b.add_state();
        assert!(matches!(b.finish(), Err(FstError::MissingStart)));
    }

    #[test]
    fn finish_rejects_negative_weight() {
        let mut b = AutomatonBuilder::new();
        let s = b.add_state();
        let t = b.add_state();
        b.set_start(s);
        b.add_transition(s, t, sym(1), sym(1), -1.0);
        assert!(matches!(b.finish(), Err(FstError::InvalidWeight(_))));
    }

    #[test]
    fn finish_rejects_nan_final_weight() {
        let mut b = AutomatonBuilder::new();
        let s = b.add_state();
        b.set_start(s);
        b.set_final(s, f64::NAN);
        assert!(b.finish().is_err());
    }

    #[test]
    fn finish_rejects_dangling_target() {
        let mut b = AutomatonBuilder::new();
        let s = b.add_state();
        b.set_start(s);
        b.add_transition(s, 7, sym(1), sym(1), 0.0);
        assert!(matches!(
            b.finish(),
            Err(FstError::InvalidState { state: 7, states: 1 })
        ));
    }

    #[test]
    fn finish_rejects_unknown_final_state() {
        let mut b = AutomatonBuilder::new();
        let s = b.add_state();
        b.set_start(s);
        b.set_final(3, 0.0);
        // States added later do not make the earlier call valid.
        for _ in 0..4 {
            b.add_state();
        }
        assert!(matches!(
            b.finish(),
            Err(FstError::InvalidState { state: 3, states: 1 })
        ));

        let mut b = AutomatonBuilder::new();
        let s = b.add_state();
        b.set_start(s);
        b.clear_final(9);
        assert!(matches!(
            b.finish(),
            Err(FstError::InvalidState { state: 9, states: 1 })
        ));
    }

    #[test]
    fn csr_groups_by_source_in_insertion_order() {
        let mut b = AutomatonBuilder::new();
        let s0 = b.add_state();
        let s1 = b.add_state();
        let s2 = b.add_state();
        b.set_start(s0);
        b.set_final(s2, 0.5);
        b.add_transition(s1, s2, sym(3), sym(3), 0.0);
        b.add_transition(s0, s1, sym(1), sym(2), 1.0);
        b.add_transition(s0, s2, sym(2), sym(1), 2.0);
        let a = b.finish().unwrap();

        assert_eq!(a.num_states(), 3);
        assert_eq!(a.num_transitions(), 3);
        let from0 = a.transitions_from(s0);
        assert_eq!(from0.len(), 2);
        assert_eq!(from0[0].to, s1);
        assert_eq!(from0[1].to, s2);
        assert_eq!(a.transitions_from(s1).len(), 1);
        assert!(a.transitions_from(s2).is_empty());
        assert_eq!(a.final_weight(s2), Some(0.5));
        assert_eq!(a.final_weight(s0), None);
    }

    #[test]
    fn append_offsets_states() {
        let mut inner = AutomatonBuilder::new();
        let s = inner.add_state();
        let t = inner.add_state();
        inner.set_start(s);
        inner.set_final(t, 1.0);
        inner.add_transition(s, t, sym(1), sym(1), 0.0);
        let inner = inner.finish().unwrap();

        let mut b = AutomatonBuilder::new();
        let head = b.add_state();
        let offset = b.append(&inner);
        b.set_start(head);
        b.add_transition(head, offset + inner.start(), Symbol::EPSILON, Symbol::EPSILON, 0.0);
        let a = b.finish().unwrap();

        assert_eq!(offset, 1);
        assert_eq!(a.num_states(), 3);
        assert_eq!(a.final_weight(2), Some(1.0));
        assert_eq!(a.transitions_from(1)[0].to, 2);
    }

    #[test]
    fn alphabets_exclude_epsilon() {
        let mut b = AutomatonBuilder::new();
        let s = b.add_state();
        let t = b.add_state();
        b.set_start(s);
        b.set_final(t, 0.0);
        b.add_transition(s, t, sym(1), Symbol::EPSILON, 0.0);
        b.add_transition(s, t, Symbol::EPSILON, sym(2), 0.0);
        let a = b.finish().unwrap();
        assert_eq!(a.input_alphabet().len(), 1);
        assert!(a.output_alphabet().contains(&sym(2)));
    }

    #[test]
    fn min_cost_heap_order() {
        let mut heap = std::collections::BinaryHeap::new();
        heap.push(MinCost { cost: 2.0, seq: 0 });
        heap.push(MinCost { cost: 1.0, seq: 2 });
        heap.push(MinCost { cost: 1.0, seq: 1 });
        assert_eq!(heap.pop().map(|m| m.seq), Some(1));
        assert_eq!(heap.pop().map(|m| m.seq), Some(2));
        assert_eq!(heap.pop().map(|m| m.seq), Some(0));
    }
}
