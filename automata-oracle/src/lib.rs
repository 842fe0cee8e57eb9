//! An oracle for active automata learning, exposed as a TCP service.
//!
//! The server holds an immutable target [`automata::Dfa`] and answers the two
//! query kinds an L*-style learner needs: membership of a single word, and
//! equivalence of a hypothesis automaton. Equivalence is answered with a
//! length-minimal counterexample when the bounded breadth-first search finds
//! a disagreement, see [`DfaOracle`] for the exact guarantees.
#![warn(missing_docs)]

mod oracle;
pub use oracle::{DfaOracle, Oracle, DEFAULT_VISIT_BOUND};

pub mod protocol;

mod server;
pub use server::{OracleServer, ServerConfig, ServerError};
