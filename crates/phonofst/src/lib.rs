//! Weighted finite-state transducer engine over the tropical semiring.
//!
//! Automata are immutable arenas of states and transitions. Every operation
//! in [`algebra`] returns a new automaton, so one automaton can feed several
//! constructions at once.
//!
//! # Architecture
//!
//! - [`automaton`] -- `WeightedAutomaton` (CSR transition arena) and `AutomatonBuilder`
//! - [`rules`] -- Compilation of weighted symbol-pair rules into an automaton
//! - [`algebra`] -- Union, concatenation, inversion, composition, closure, repetition
//! - [`paths`] -- Best-first extraction of the K cheapest accepting paths
//! - [`format`] -- Binary serialization of automata

pub mod algebra;
pub mod automaton;
pub mod format;
pub mod paths;
pub mod rules;

pub use automaton::{AutomatonBuilder, StateId, Transition, Weight, WeightedAutomaton};
pub use paths::{BestPaths, NBest, Path, SearchLimits, SearchStatus, best_paths};
pub use phonofst_core::{Symbol, SymbolTable};
pub use rules::{EmptyRules, Rule, compile};

/// Broad class of an [`FstError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or contradictory input data.
    Configuration,
    /// The caller broke an operation's contract.
    Precondition,
    /// Binary data could not be decoded.
    Format,
}

/// Error type for automaton construction, algebra and serialization.
#[derive(Debug, thiserror::Error)]
pub enum FstError {
    #[error("automaton has no start state")]
    MissingStart,
    #[error("state {state} out of range (automaton has {states} states)")]
    InvalidState { state: StateId, states: usize },
    #[error("weight {0} is not a finite non-negative number")]
    InvalidWeight(Weight),
    #[error("rule {0} has no symbol pairs")]
    EmptyRule(usize),
    #[error("empty rule list")]
    EmptyRuleList,
    #[error("composition operands share no symbols")]
    DisjointAlphabets,
    #[error("invalid repeat bounds: min {min} > max {max}")]
    InvalidRepeatBounds { min: usize, max: usize },
    #[error("invalid magic number in automaton header")]
    InvalidMagic,
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),
    #[error("data too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
}

impl FstError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FstError::InvalidWeight(_)
            | FstError::EmptyRule(_)
            | FstError::EmptyRuleList
            | FstError::DisjointAlphabets => ErrorKind::Configuration,
            FstError::MissingStart
            | FstError::InvalidState { .. }
            | FstError::InvalidRepeatBounds { .. } => ErrorKind::Precondition,
            FstError::InvalidMagic | FstError::UnsupportedVersion(_) | FstError::TooShort { .. } => {
                ErrorKind::Format
            }
        }
    }
}
