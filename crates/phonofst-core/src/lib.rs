//! Shared types for the phonofst workspace.
//!
//! - [`symbols`] -- Symbol ids and the interning symbol table (with its binary codec)
//! - [`segment`] -- Splitting pronunciation strings into minimal symbols

pub mod segment;
pub mod symbols;

pub use segment::{CharSegmenter, Segmenter};
pub use symbols::{Symbol, SymbolTable};

/// Error type for symbol table decoding and encoding.
#[derive(Debug, thiserror::Error)]
pub enum SymbolTableError {
    #[error("symbol table too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("unterminated symbol string at index {0}")]
    Unterminated(u32),
    #[error("invalid UTF-8 in symbol {0}")]
    InvalidUtf8(u32),
    #[error("duplicate symbol name {0:?}")]
    Duplicate(String),
    #[error("symbol 0 must be epsilon (empty name)")]
    MissingEpsilon,
    #[error("symbol name {0:?} contains a NUL byte")]
    EmbeddedNul(String),
}
