//! Anchored weighted NFA: the mutable builder and the frozen, immutable
//! automaton produced by [`NfaBuilder::freeze`].
//!
//! Construction and evaluation are different types, so a frozen automaton
//! can never again be mutated by accident.

use std::collections::{BTreeSet, HashMap, HashSet};

use rust_decimal::Decimal;

use crate::config::FinalStateTiebreak;
use crate::error::NfaError;
use crate::pattern;

pub type StateId = u32;

#[derive(Debug, Clone, PartialEq)]
pub struct WeightedRegex {
    pub measure_id: String,
    pub raw_pattern: String,
    pub weight: Decimal,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Fragment {
    pub start: StateId,
    pub accept: StateId,
}

#[derive(Debug, Clone, Default)]
struct BuilderState {
    is_final: bool,
    regex_weights: Vec<WeightedRegex>,
    transitions: Vec<(char, StateId)>,
    epsilons: Vec<StateId>,
}

/// Mutable NFA under construction. Patterns may be added until [`freeze`]
/// is called; every registered pattern is end-anchored per
/// [`pattern::compile_anchored`].
///
/// Unicode character classes (`.`, `[^x]`, ...) are compiled against
/// `alphabet` rather than the full Unicode range: a class transition is
/// only ever added for a symbol the alphabet actually contains, since
/// those are the only symbols `AccountTaxonomy` ever hands the automaton.
///
/// [`freeze`]: NfaBuilder::freeze
#[derive(Debug, Clone)]
pub struct NfaBuilder {
    states: Vec<BuilderState>,
    initial: StateId,
    alphabet: Vec<char>,
}

impl NfaBuilder {
    pub fn new(alphabet: Vec<char>) -> Self {
        let mut builder = Self {
            states: Vec::new(),
            initial: 0,
            alphabet,
        };
        builder.initial = builder.new_state();
        builder
    }

    pub(crate) fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    pub(crate) fn new_state(&mut self) -> StateId {
        let id = self.states.len() as StateId;
        self.states.push(BuilderState::default());
        id
    }

    pub(crate) fn add_transition(&mut self, from: StateId, symbol: char, to: StateId) {
        self.states[from as usize].transitions.push((symbol, to));
    }

    pub(crate) fn add_epsilon(&mut self, from: StateId, to: StateId) {
        self.states[from as usize].epsilons.push(to);
    }

    /// Compiles `pattern`, anchors it per the end-of-string contract, and
    /// wires its acceptance into a fresh final state carrying
    /// `(measure_id, weight)`.
    ///
    /// Rejects a pattern whose final state would hold a second
    /// [`WeightedRegex`] for a `measure_id` it already carries (the
    /// "one weight, one use" guard).
    pub fn add_weighted_regex(
        &mut self,
        measure_id: impl Into<String>,
        pattern: &str,
        weight: Decimal,
    ) -> Result<StateId, NfaError> {
        let measure_id = measure_id.into();
        let fragment = pattern::compile_anchored(self, pattern)?;
        self.add_epsilon(self.initial, fragment.start);

        self.attach_final(
            fragment.accept,
            WeightedRegex {
                measure_id,
                raw_pattern: pattern.to_string(),
                weight,
            },
        )?;
        Ok(fragment.accept)
    }

    /// Marks `state` final and attaches `regex` to it, enforcing that a
    /// single state never carries two [`WeightedRegex`] entries for the
    /// same `measure_id` (the "one weight, one use" guard).
    fn attach_final(&mut self, state: StateId, regex: WeightedRegex) -> Result<(), NfaError> {
        let entry = &mut self.states[state as usize];
        if entry
            .regex_weights
            .iter()
            .any(|w| w.measure_id == regex.measure_id)
        {
            return Err(NfaError::DuplicateMeasureWeight {
                measure_id: regex.measure_id,
                state_id: state,
            });
        }
        entry.is_final = true;
        entry.regex_weights.push(regex);
        Ok(())
    }

    fn epsilon_closure(&self, start: StateId) -> BTreeSet<StateId> {
        let mut closure = BTreeSet::new();
        let mut stack = vec![start];
        while let Some(s) = stack.pop() {
            if closure.insert(s) {
                for &next in &self.states[s as usize].epsilons {
                    stack.push(next);
                }
            }
        }
        closure
    }

    /// Eliminates epsilon transitions once, producing an immutable,
    /// freely shareable [`FrozenNfa`].
    pub fn freeze(&self, tiebreak: FinalStateTiebreak) -> FrozenNfa {
        let closures: Vec<BTreeSet<StateId>> = (0..self.states.len() as StateId)
            .map(|s| self.epsilon_closure(s))
            .collect();

        let mut frozen_states = Vec::with_capacity(self.states.len());
        for (id, state) in self.states.iter().enumerate() {
            let closure = &closures[id];
            let mut combined: HashMap<char, BTreeSet<StateId>> = HashMap::new();
            for &member in closure {
                for &(symbol, target) in &self.states[member as usize].transitions {
                    let expanded = &closures[target as usize];
                    combined.entry(symbol).or_default().extend(expanded.iter().copied());
                }
            }
            let mut transitions: Vec<(char, StateId)> = combined
                .into_iter()
                .flat_map(|(symbol, targets)| targets.into_iter().map(move |t| (symbol, t)))
                .collect();
            transitions.sort_unstable();

            frozen_states.push(FrozenState {
                is_final: state.is_final,
                regex_weights: state.regex_weights.clone(),
                transitions,
            });
        }

        let initial_closure: Vec<StateId> = closures[self.initial as usize].iter().copied().collect();
        let mut final_states: Vec<StateId> = frozen_states
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_final)
            .map(|(id, _)| id as StateId)
            .collect();
        final_states.sort_unstable();

        FrozenNfa {
            states: frozen_states,
            initial_closure,
            final_states,
            tiebreak,
            alphabet: self.alphabet.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct FrozenState {
    is_final: bool,
    regex_weights: Vec<WeightedRegex>,
    transitions: Vec<(char, StateId)>,
}

/// An immutable, anchored, weighted NFA. Safe to share and evaluate
/// concurrently from multiple threads without synchronization: nothing
/// about `evaluate` mutates `self`.
#[derive(Debug, Clone)]
pub struct FrozenNfa {
    states: Vec<FrozenState>,
    initial_closure: Vec<StateId>,
    final_states: Vec<StateId>,
    tiebreak: FinalStateTiebreak,
    alphabet: Vec<char>,
}

impl FrozenNfa {
    /// Produces an independent copy of `self` with `additional_patterns`
    /// spliced in and the result refrozen. `self` is unaffected.
    pub fn clone_with(
        &self,
        additional_patterns: &[(String, String, Decimal)],
    ) -> Result<FrozenNfa, NfaError> {
        let mut builder = self.to_builder();
        for (measure_id, pattern, weight) in additional_patterns {
            builder.add_weighted_regex(measure_id.clone(), pattern, *weight)?;
        }
        Ok(builder.freeze(self.tiebreak))
    }

    /// Reconstitutes a mutable builder whose frozen form is semantically
    /// equivalent to `self` — used only by `clone_with`, since a frozen
    /// automaton otherwise never becomes mutable again.
    fn to_builder(&self) -> NfaBuilder {
        let states = self
            .states
            .iter()
            .map(|s| BuilderState {
                is_final: s.is_final,
                regex_weights: s.regex_weights.clone(),
                transitions: s.transitions.clone(),
                epsilons: Vec::new(),
            })
            .collect();
        // State 0 is always the original initial state by construction in
        // NfaBuilder::new; additional patterns are spliced onto it below
        // the same way `add_weighted_regex` does for a live builder.
        let mut builder = NfaBuilder {
            states,
            initial: 0,
            alphabet: self.alphabet.clone(),
        };
        for &member in &self.initial_closure {
            if member != 0 {
                builder.add_epsilon(0, member);
            }
        }
        builder
    }

    /// Simulates the automaton on `word`, consuming it in full, and
    /// returns the single final state reached (smallest id among those
    /// simultaneously reachable), or `None` if no final state is active
    /// once the word is exhausted.
    pub fn evaluate(&self, word: &str) -> Option<StateId> {
        let mut active: HashSet<StateId> = self.initial_closure.iter().copied().collect();
        for ch in word.chars() {
            if active.is_empty() {
                break;
            }
            let mut next: HashSet<StateId> = HashSet::new();
            for &state in &active {
                let transitions = &self.states[state as usize].transitions;
                let start = transitions.partition_point(|(c, _)| *c < ch);
                for &(c, target) in &transitions[start..] {
                    if c != ch {
                        break;
                    }
                    next.insert(target);
                }
            }
            active = next;
        }
        self.final_state_tiebreak(&active)
    }

    fn final_state_tiebreak(&self, active: &HashSet<StateId>) -> Option<StateId> {
        match self.tiebreak {
            FinalStateTiebreak::SmallestStateId => self
                .final_states
                .iter()
                .copied()
                .find(|s| active.contains(s)),
        }
    }

    pub fn final_states(&self) -> &[StateId] {
        &self.final_states
    }

    pub fn weights_at(&self, state_id: StateId) -> &[WeightedRegex] {
        self.states
            .get(state_id as usize)
            .map(|s| s.regex_weights.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_final(&self, state_id: StateId) -> bool {
        self.states
            .get(state_id as usize)
            .map(|s| s.is_final)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_alphabet() -> Vec<char> {
        ('A'..='Z').collect()
    }

    fn frozen(patterns: &[(&str, &str, Decimal)]) -> FrozenNfa {
        let mut builder = NfaBuilder::new(test_alphabet());
        for (measure, pattern, weight) in patterns {
            builder
                .add_weighted_regex(*measure, pattern, *weight)
                .unwrap();
        }
        builder.freeze(FinalStateTiebreak::SmallestStateId)
    }

    #[test]
    fn prefix_pattern_accepts_matching_word() {
        let nfa = frozen(&[("src", "A.*", dec!(1))]);
        assert!(nfa.evaluate("AB").is_some());
        assert!(nfa.evaluate("BA").is_none());
    }

    #[test]
    fn suffix_pattern_accepts_matching_word() {
        let nfa = frozen(&[("tgt", ".*B", dec!(1))]);
        assert!(nfa.evaluate("AB").is_some());
        assert!(nfa.evaluate("BA").is_none());
    }

    #[test]
    fn no_partial_match_accepts() {
        let nfa = frozen(&[("exact", "AB", dec!(1))]);
        assert!(nfa.evaluate("AB").is_some());
        assert!(nfa.evaluate("ABC").is_none(), "trailing content must not accept a non-anchored literal");
        assert!(nfa.evaluate("A").is_none());
    }

    #[test]
    fn smallest_state_id_tiebreak_is_deterministic() {
        let nfa = frozen(&[("m1", "A.*", dec!(1)), ("m2", ".*B", dec!(1))]);
        let first = nfa.evaluate("AB");
        let second = nfa.evaluate("AB");
        assert_eq!(first, second);
        assert!(first.is_some());
    }

    #[test]
    fn duplicate_measure_on_same_final_state_is_rejected() {
        let mut builder = NfaBuilder::new(test_alphabet());
        let state = builder.new_state();
        builder
            .attach_final(
                state,
                WeightedRegex {
                    measure_id: "m".to_string(),
                    raw_pattern: "A.*".to_string(),
                    weight: dec!(1),
                },
            )
            .unwrap();
        let err = builder.attach_final(
            state,
            WeightedRegex {
                measure_id: "m".to_string(),
                raw_pattern: "A.*".to_string(),
                weight: dec!(2),
            },
        );
        assert!(matches!(err, Err(NfaError::DuplicateMeasureWeight { .. })));
    }

    #[test]
    fn alternation_and_star_compile() {
        let nfa = frozen(&[("m", "(A|B)*C", dec!(1))]);
        assert!(nfa.evaluate("AABBC").is_some());
        assert!(nfa.evaluate("AABBD").is_none());
        assert!(nfa.evaluate("C").is_some());
    }

    #[test]
    fn frozen_nfa_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FrozenNfa>();
    }

    #[test]
    fn clone_with_does_not_affect_parent() {
        let base = frozen(&[("src", "A.*", dec!(1))]);
        let extended = base
            .clone_with(&[("tgt".to_string(), ".*B".to_string(), dec!(1))])
            .unwrap();
        assert_eq!(base.final_states().len(), 1);
        assert_eq!(extended.final_states().len(), 2);
    }
}
