use std::collections::VecDeque;

use automata::{Dfa, Map, Word};
use tracing::{debug, trace};

/// Default number of times a single target state may be taken off the search
/// queue before further arrivals are dropped unexpanded.
pub const DEFAULT_VISIT_BOUND: usize = 2;

/// A minimally adequate teacher for active learning. An L*-esque learner asks
/// for the desired output on single words and tests candidate automata for
/// equivalence; the latter answers `Err` with a word from the symmetric
/// difference of target and hypothesis when one is found.
pub trait Oracle {
    /// Query the desired output for the given word.
    fn output(&self, word: &Word) -> bool;

    /// Test the given hypothesis for equivalence, returning `Ok(())` if no
    /// disagreement was found and `Err(word)` otherwise, where `word` is a
    /// length-minimal word on which target and hypothesis disagree.
    fn equivalence(&self, hypothesis: &Dfa) -> Result<(), Word>;
}

/// An oracle backed by a concrete target [`Dfa`].
///
/// Membership is plain acceptance evaluation on the target. Equivalence runs
/// a breadth-first search over the target's state graph, keeping a queue of
/// `(prefix, state)` pairs and comparing target and hypothesis on every
/// extension of the prefix by one symbol. Since prefix lengths leaving the
/// queue never decrease, the first mismatch is a shortest counterexample;
/// among equal-length candidates the one extending by the smallest symbol
/// wins, as symbols are tried in ascending order.
///
/// To terminate on cyclic state graphs the search expands any single target
/// state at most [`visit_bound`](DfaOracle::visit_bound) times. This makes
/// the check approximate: a hypothesis that answers the first
/// `visit_bound` prefixes into some state correctly, but a later distinct
/// prefix incorrectly, passes as equivalent. Iterative learners compensate by
/// re-querying after each refinement; raising the bound deepens the search at
/// a proportional cost of up to `visit_bound * state_count * alphabet size`
/// comparisons.
#[derive(Debug, Clone)]
pub struct DfaOracle {
    target: Dfa,
    visit_bound: usize,
}

impl DfaOracle {
    /// Creates an oracle for the given target with the default visit bound.
    pub fn new(target: Dfa) -> Self {
        Self::with_visit_bound(target, DEFAULT_VISIT_BOUND)
    }

    /// Creates an oracle whose equivalence search expands every target state
    /// at most `visit_bound` times.
    pub fn with_visit_bound(target: Dfa, visit_bound: usize) -> Self {
        Self {
            target,
            visit_bound,
        }
    }

    /// Returns a reference to the hidden target automaton.
    pub fn target(&self) -> &Dfa {
        &self.target
    }

    /// The number of queue entries per target state the search will expand.
    pub fn visit_bound(&self) -> usize {
        self.visit_bound
    }
}

impl Oracle for DfaOracle {
    fn output(&self, word: &Word) -> bool {
        self.target.accepts(word)
    }

    fn equivalence(&self, hypothesis: &Dfa) -> Result<(), Word> {
        let epsilon = Word::epsilon();
        if self.target.accepts(&epsilon) != hypothesis.accepts(&epsilon) {
            debug!("target and hypothesis disagree on the empty word");
            return Err(epsilon);
        }

        let mut visits: Map<usize, usize> = Map::default();
        let mut queue: VecDeque<(Word, usize)> =
            VecDeque::from([(epsilon, self.target.initial())]);

        while let Some((prefix, state)) = queue.pop_front() {
            let seen = visits.entry(state).or_insert(0);
            let expand = *seen < self.visit_bound;
            *seen += 1;
            if !expand {
                trace!(state, "visit bound reached, dropping entry");
                continue;
            }

            for &symbol in self.target.alphabet().universe() {
                let candidate = prefix.appended(symbol);
                if self.target.accepts(&candidate) != hypothesis.accepts(&candidate) {
                    debug!(counterexample = %candidate, "hypothesis disagrees with target");
                    return Err(candidate);
                }
                if let Some(next) = self.target.successor(state, symbol) {
                    queue.push_back((candidate, next));
                }
            }
        }

        debug!("no counterexample within the visit bound");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use automata::Alphabet;
    use tracing_test::traced_test;

    use super::*;

    // accepts exactly the words ending in '1'
    fn ends_in_one() -> Dfa {
        let mut builder = Dfa::builder(Alphabet::binary());
        let reject = builder.state(false);
        let accept = builder.state(true);
        builder
            .transition(reject, '0', reject)
            .transition(reject, '1', accept)
            .transition(accept, '0', reject)
            .transition(accept, '1', accept);
        builder.build().unwrap()
    }

    fn reject_all() -> Dfa {
        let mut builder = Dfa::builder(Alphabet::binary());
        let sink = builder.state(false);
        builder.transition(sink, '0', sink).transition(sink, '1', sink);
        builder.build().unwrap()
    }

    fn accept_all() -> Dfa {
        let mut builder = Dfa::builder(Alphabet::binary());
        let sink = builder.state(true);
        builder.transition(sink, '0', sink).transition(sink, '1', sink);
        builder.build().unwrap()
    }

    // accepts exactly the words of length at least `threshold`
    fn accept_from_length(threshold: usize) -> Dfa {
        let mut builder = Dfa::builder(Alphabet::binary());
        let states: Vec<usize> = (0..=threshold)
            .map(|depth| builder.state(depth == threshold))
            .collect();
        for (depth, &state) in states.iter().enumerate() {
            let next = states[(depth + 1).min(threshold)];
            builder.transition(state, '0', next).transition(state, '1', next);
        }
        builder.build().unwrap()
    }

    #[test]
    #[traced_test]
    fn all_rejecting_hypothesis_yields_shortest_counterexample() {
        let oracle = DfaOracle::new(ends_in_one());
        let counterexample = oracle.equivalence(&reject_all()).unwrap_err();
        assert_eq!(counterexample, Word::from("1"));
        // soundness: the returned word distinguishes the two automata
        assert!(oracle.target().accepts(&counterexample));
        assert!(!reject_all().accepts(&counterexample));
    }

    #[test]
    fn identical_automata_are_equivalent() {
        let oracle = DfaOracle::new(ends_in_one());
        assert_eq!(oracle.equivalence(&ends_in_one()), Ok(()));
    }

    #[test]
    fn self_equivalence_terminates_on_cycles() {
        let oracle = DfaOracle::new(accept_all());
        assert_eq!(oracle.equivalence(&accept_all()), Ok(()));
    }

    #[test]
    fn empty_word_is_a_valid_counterexample() {
        let oracle = DfaOracle::new(accept_all());
        assert_eq!(oracle.equivalence(&reject_all()), Err(Word::epsilon()));
    }

    #[test]
    fn equal_length_candidates_resolve_by_ascending_symbol() {
        // target accepts every nonempty word, so both '0' and '1' distinguish
        // it from the all-rejecting hypothesis; the smaller symbol wins
        let mut builder = Dfa::builder(Alphabet::binary());
        let start = builder.state(false);
        let sink = builder.state(true);
        builder
            .transition(start, '0', sink)
            .transition(start, '1', sink)
            .transition(sink, '0', sink)
            .transition(sink, '1', sink);
        let oracle = DfaOracle::new(builder.build().unwrap());
        assert_eq!(oracle.equivalence(&reject_all()), Err(Word::from("0")));
    }

    #[test]
    fn membership_delegates_to_the_target() {
        let oracle = DfaOracle::new(ends_in_one());
        assert!(oracle.output(&Word::from("101")));
        assert!(!oracle.output(&Word::from("100")));
        assert!(!oracle.output(&Word::epsilon()));
    }

    #[test]
    fn visit_bound_caps_the_search_depth() {
        // the single target state is dequeued for the third time with prefix
        // "1"; at the default bound that entry is dropped, so the search
        // never reaches the length-3 words where the hypothesis diverges
        let bounded = DfaOracle::new(reject_all());
        assert_eq!(bounded.equivalence(&accept_from_length(3)), Ok(()));

        let deepened = DfaOracle::with_visit_bound(reject_all(), 4);
        let counterexample = deepened.equivalence(&accept_from_length(3)).unwrap_err();
        assert_eq!(counterexample.len(), 3);
        assert!(!deepened.target().accepts(&counterexample));
        assert!(accept_from_length(3).accepts(&counterexample));
    }
}
