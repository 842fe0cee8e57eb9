//! Library for working with deterministic finite automata in Rust.
//!
//! The automata in this crate are total: every state has exactly one
//! successor per symbol of the alphabet, which is verified at construction
//! time. Once built, a [`Dfa`] is immutable and can be evaluated concurrently
//! without synchronization.
#![warn(missing_docs)]

/// A hash map as it is used throughout this crate.
#[cfg(feature = "ahash")]
pub type Map<K, V> = ahash::AHashMap<K, V>;
/// A hash map as it is used throughout this crate.
#[cfg(not(feature = "ahash"))]
pub type Map<K, V> = std::collections::HashMap<K, V>;

mod alphabet;
pub use alphabet::{Alphabet, WordError};

mod word;
pub use word::Word;

mod dfa;
pub use dfa::{Dfa, DfaBuilder, DfaError};

pub mod codec;
