//! Cross-language phonetic matching on top of the `phonofst` engine.
//!
//! A [`PhoneticModel`] relates written words of a source language to written
//! words of a target language through their pronunciations:
//!
//! ```text
//! source letters -> pronunciation -> edited pronunciation -> target letters
//! ```
//!
//! # Architecture
//!
//! - [`phonology`] -- Orthography-to-pronunciation tables and their rules
//! - [`features`] -- Feature-based symbol distances (`SymbolDistance`)
//! - [`edit`] -- Weighted edit transducers over an alphabet
//! - [`model`] -- `PhoneticModel`: construction, ranking, pair scoring, model files
//! - [`presets`] -- Built-in Finnish and English tables
//! - [`evaluation`] -- Rank of the correct candidate in a ranking

pub mod edit;
pub mod evaluation;
pub mod features;
pub mod model;
pub mod phonology;
pub mod presets;

pub use edit::{EditConfig, SpecialRule};
pub use features::{FeatureTable, SymbolDistance};
pub use model::{Candidate, LanguageConfig, ModelConfig, PhoneticModel, Ranking};
pub use phonology::{PhonologyTable, Pronunciation};

use phonofst::FstError;
use phonofst_core::SymbolTableError;

/// Error type for model construction and model files.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("phonology table contains an empty written unit")]
    EmptyUnit,
    #[error("written unit {0:?} has no pronunciations")]
    NoPronunciations(String),
    #[error("written unit {0:?} has an empty pronunciation")]
    EmptyPronunciation(String),
    #[error("distance between {a:?} and {b:?} is {distance}, expected a finite non-negative number")]
    InvalidDistance { a: String, b: String, distance: f64 },
    #[error("distinct symbols {a:?} and {b:?} are at distance 0")]
    ZeroDistance { a: String, b: String },
    #[error("{0} weight must be positive")]
    ZeroCostEdit(&'static str),
    #[error("edit transducer accepts the empty pair at cost 0")]
    FreeEmptyEdit,
    #[error("unknown symbol {0:?} in edit rule")]
    UnknownSymbol(String),
    #[error(transparent)]
    Fst(#[from] FstError),
    #[error("invalid symbol table: {0}")]
    Symbols(#[from] SymbolTableError),
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}
