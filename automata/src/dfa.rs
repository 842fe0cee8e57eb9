use std::fmt::Write as _;

use thiserror::Error;

use crate::{Alphabet, Word};

#[derive(Debug, Clone, PartialEq, Eq)]
struct State {
    accepting: bool,
    // one successor per symbol, indexed by alphabet position
    successors: Vec<usize>,
}

/// A deterministic finite automaton: a finite set of states indexed from 0, a
/// designated initial state, a total transition function and an accept/reject
/// flag on every state. A word is accepted if the state reached by reading it
/// from the initial state carries the accept flag.
///
/// Construction goes through [`Dfa::builder`], which verifies totality and
/// index validity, so evaluation never fails for words over the alphabet. A
/// built automaton is immutable; identity of two automata is behavioral (same
/// verdict on every word), never structural.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dfa {
    alphabet: Alphabet,
    states: Vec<State>,
    initial: usize,
}

impl Dfa {
    /// Starts building an automaton over the given alphabet.
    pub fn builder(alphabet: Alphabet) -> DfaBuilder {
        DfaBuilder::new(alphabet)
    }

    /// Returns a reference to the alphabet of the automaton.
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// The number of states.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// The index of the initial state.
    pub fn initial(&self) -> usize {
        self.initial
    }

    /// Whether the state with the given index is accepting.
    ///
    /// Panics if the index is out of range.
    pub fn is_accepting(&self, state: usize) -> bool {
        self.states[state].accepting
    }

    /// The state reached from `state` on reading `symbol`. Returns `None` if
    /// the state index is out of range or the symbol is not in the alphabet;
    /// for valid pairs the transition function is total.
    pub fn successor(&self, state: usize, symbol: char) -> Option<usize> {
        let position = self.alphabet.position(symbol)?;
        self.states.get(state).map(|st| st.successors[position])
    }

    /// Runs the automaton on the given word from the initial state and
    /// returns the state it ends up in. The run fails with `None` only when
    /// the word contains a symbol outside the alphabet.
    pub fn reached(&self, word: &Word) -> Option<usize> {
        let mut current = self.initial;
        for symbol in word.symbols() {
            current = self.successor(current, symbol)?;
        }
        Some(current)
    }

    /// Whether the automaton accepts the given word. A word on which the run
    /// fails is not accepted.
    pub fn accepts(&self, word: &Word) -> bool {
        self.reached(word)
            .map(|state| self.states[state].accepting)
            .unwrap_or(false)
    }

    /// Renders the automaton in graphviz dot format. Accepting states are
    /// drawn as double circles, the initial state is marked by an arrow from
    /// an unlabeled point.
    pub fn dot_representation(&self) -> String {
        let mut out = String::from("digraph G {\n");
        let _ = writeln!(out, "  init [label=\"\", shape=point];");
        let _ = writeln!(out, "  init -> {};", self.initial);
        for (index, state) in self.states.iter().enumerate() {
            let shape = if state.accepting {
                "doublecircle"
            } else {
                "circle"
            };
            let _ = writeln!(out, "  {index} [shape={shape}];");
            for (symbol, target) in self.alphabet.universe().zip(&state.successors) {
                let _ = writeln!(out, "  {index} -> {target} [label=\"{symbol}\"];");
            }
        }
        out.push_str("}\n");
        out
    }
}

/// Builds a [`Dfa`] by adding states and transitions, deferring all
/// validation to [`DfaBuilder::build`].
#[derive(Debug, Clone)]
pub struct DfaBuilder {
    alphabet: Alphabet,
    accepting: Vec<bool>,
    transitions: Vec<(usize, char, usize)>,
    initial: usize,
}

impl DfaBuilder {
    fn new(alphabet: Alphabet) -> Self {
        Self {
            alphabet,
            accepting: Vec::new(),
            transitions: Vec::new(),
            initial: 0,
        }
    }

    /// Adds a state and returns its index. States are numbered consecutively
    /// from 0.
    pub fn state(&mut self, accepting: bool) -> usize {
        self.accepting.push(accepting);
        self.accepting.len() - 1
    }

    /// Records a transition from `from` to `to` on `symbol`.
    pub fn transition(&mut self, from: usize, symbol: char, to: usize) -> &mut Self {
        self.transitions.push((from, symbol, to));
        self
    }

    /// Designates the initial state. Defaults to state 0.
    pub fn initial(&mut self, state: usize) -> &mut Self {
        self.initial = state;
        self
    }

    /// Verifies that the recorded states and transitions form a complete
    /// deterministic automaton and builds it.
    pub fn build(&self) -> Result<Dfa, DfaError> {
        let count = self.accepting.len();
        if count == 0 {
            return Err(DfaError::Empty);
        }
        if self.initial >= count {
            return Err(DfaError::InvalidInitial(self.initial));
        }

        let mut successors = vec![vec![None; self.alphabet.len()]; count];
        for &(from, symbol, to) in &self.transitions {
            let position = self
                .alphabet
                .position(symbol)
                .ok_or(DfaError::UnknownSymbol(symbol))?;
            if from >= count {
                return Err(DfaError::InvalidState(from));
            }
            if to >= count {
                return Err(DfaError::InvalidState(to));
            }
            if successors[from][position].replace(to).is_some() {
                return Err(DfaError::Nondeterministic {
                    state: from,
                    symbol,
                });
            }
        }

        let states = self
            .accepting
            .iter()
            .zip(successors)
            .enumerate()
            .map(|(state, (&accepting, outgoing))| {
                let successors = outgoing
                    .into_iter()
                    .zip(self.alphabet.universe())
                    .map(|(target, &symbol)| {
                        target.ok_or(DfaError::MissingTransition { state, symbol })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(State {
                    accepting,
                    successors,
                })
            })
            .collect::<Result<Vec<_>, DfaError>>()?;

        Ok(Dfa {
            alphabet: self.alphabet.clone(),
            states,
            initial: self.initial,
        })
    }
}

/// Violations of the automaton invariants, detected when building a [`Dfa`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DfaError {
    /// The automaton has no states at all.
    #[error("automaton has no states")]
    Empty,
    /// The designated initial state does not exist.
    #[error("initial state {0} is out of range")]
    InvalidInitial(usize),
    /// A transition refers to a state that does not exist.
    #[error("state index {0} is out of range")]
    InvalidState(usize),
    /// A transition is labeled with a symbol outside the alphabet.
    #[error("symbol {0:?} is not in the alphabet")]
    UnknownSymbol(char),
    /// A state lacks a transition for some symbol, the function is not total.
    #[error("state {state} has no transition on {symbol:?}")]
    MissingTransition {
        /// State missing the outgoing transition.
        state: usize,
        /// Symbol for which no successor exists.
        symbol: char,
    },
    /// A state has more than one transition for the same symbol.
    #[error("state {state} has more than one transition on {symbol:?}")]
    Nondeterministic {
        /// State with the duplicated transition.
        state: usize,
        /// Symbol with more than one successor.
        symbol: char,
    },
}
