//! Serialization of automata in the JSON document format exchanged with
//! learner clients.
//!
//! The document carries the alphabet as decimal digit values, the initial
//! state index and one record per state holding its label (0 for accepting, 2
//! for rejecting) and its successor vector, indexed by symbol position:
//!
//! ```text
//! {"Alphabet":[0,1],"StartingState":0,
//!  "States":[{"Label":0,"Next":[0,1],"depth":0,"order":0}],
//!  "dateCreated":"None","depth":0,"dirty":false,"docType":"DfaGo/DFA","version":1}
//! ```
//!
//! Decoding funnels through [`DfaBuilder`](crate::DfaBuilder), so every
//! automaton obtained from bytes satisfies the structural invariants of
//! [`Dfa`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Alphabet, Dfa, DfaError};

/// Document type tag carried by every serialized automaton.
pub const DOC_TYPE: &str = "DfaGo/DFA";

const VERSION: u32 = 1;
const LABEL_ACCEPTING: u8 = 0;
const LABEL_REJECTING: u8 = 2;

#[derive(Debug, Serialize, Deserialize)]
struct RawState {
    #[serde(rename = "Label")]
    label: u8,
    #[serde(rename = "Next")]
    next: Vec<usize>,
    depth: usize,
    order: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawDfa {
    #[serde(rename = "Alphabet")]
    alphabet: Vec<u32>,
    #[serde(rename = "StartingState")]
    starting_state: usize,
    #[serde(rename = "States")]
    states: Vec<RawState>,
    #[serde(rename = "dateCreated")]
    date_created: String,
    depth: usize,
    dirty: bool,
    #[serde(rename = "docType")]
    doc_type: String,
    version: u32,
}

/// Failures when translating between automata and their wire documents.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The bytes are not a well-formed document.
    #[error("malformed automaton document: {0}")]
    Json(#[from] serde_json::Error),
    /// The document type tag is not [`DOC_TYPE`].
    #[error("unsupported document type {0:?}")]
    DocumentType(String),
    /// An alphabet entry is not a decimal digit value.
    #[error("alphabet value {0} is not a decimal digit")]
    SymbolRange(u32),
    /// The alphabet contains a symbol that has no digit representation.
    #[error("symbol {0:?} cannot be written as a decimal digit")]
    NonDigitSymbol(char),
    /// A state record lists the wrong number of successors.
    #[error("state {state} lists {found} successors, expected {expected}")]
    SuccessorArity {
        /// Index of the offending state record.
        state: usize,
        /// Number of symbols in the alphabet.
        expected: usize,
        /// Number of successors the record actually lists.
        found: usize,
    },
    /// The document is well-formed but does not describe a valid automaton.
    #[error("invalid automaton: {0}")]
    Automaton(#[from] DfaError),
}

/// Decodes an automaton from its wire document.
pub fn decode(bytes: &[u8]) -> Result<Dfa, CodecError> {
    let raw: RawDfa = serde_json::from_slice(bytes)?;
    if raw.doc_type != DOC_TYPE {
        return Err(CodecError::DocumentType(raw.doc_type));
    }

    let symbols = raw
        .alphabet
        .iter()
        .map(|&digit| char::from_digit(digit, 10).ok_or(CodecError::SymbolRange(digit)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut builder = Dfa::builder(Alphabet::new(symbols.iter().copied()));
    for state in &raw.states {
        builder.state(state.label == LABEL_ACCEPTING);
    }
    for (index, state) in raw.states.iter().enumerate() {
        if state.next.len() != symbols.len() {
            return Err(CodecError::SuccessorArity {
                state: index,
                expected: symbols.len(),
                found: state.next.len(),
            });
        }
        for (&symbol, &target) in symbols.iter().zip(&state.next) {
            builder.transition(index, symbol, target);
        }
    }
    builder.initial(raw.starting_state);
    Ok(builder.build()?)
}

/// Encodes an automaton as a wire document. Fails only when the alphabet
/// contains symbols that are not decimal digits.
pub fn encode(dfa: &Dfa) -> Result<Vec<u8>, CodecError> {
    let alphabet = dfa
        .alphabet()
        .universe()
        .map(|&symbol| symbol.to_digit(10).ok_or(CodecError::NonDigitSymbol(symbol)))
        .collect::<Result<Vec<_>, _>>()?;

    let states = (0..dfa.state_count())
        .map(|state| RawState {
            label: if dfa.is_accepting(state) {
                LABEL_ACCEPTING
            } else {
                LABEL_REJECTING
            },
            next: dfa
                .alphabet()
                .universe()
                .map(|&symbol| {
                    dfa.successor(state, symbol)
                        .expect("transition function is total")
                })
                .collect(),
            depth: 0,
            order: 0,
        })
        .collect();

    let raw = RawDfa {
        alphabet,
        starting_state: dfa.initial(),
        states,
        date_created: "None".to_string(),
        depth: 0,
        dirty: false,
        doc_type: DOC_TYPE.to_string(),
        version: VERSION,
    };
    Ok(serde_json::to_vec(&raw)?)
}
