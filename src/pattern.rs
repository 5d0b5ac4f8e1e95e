//! Pattern compilation: regex syntax in, an NFA fragment wired into a
//! [`NfaBuilder`] out.
//!
//! Patterns are parsed with `regex-syntax` into an HIR, which this module
//! lowers directly into epsilon-NFA fragments via a small Thompson
//! construction. We consume the parser's HIR rather than its finished
//! automaton engine (the `regex` crate's own NFA/DFA) because the core
//! needs custom per-state weight attachment, stable state ids, and the
//! explicit builder/frozen split `regex` does not expose.

use regex_syntax::hir::{Class, Hir, HirKind, Look, Repetition};

use crate::error::NfaError;
use crate::nfa::{Fragment, NfaBuilder};

/// Parses `raw_pattern`, anchors it to end-of-string
/// (append `.*$` unless the pattern already ends in an unescaped `$`), and
/// compiles the anchored form into a fragment within `builder`.
pub(crate) fn compile_anchored(
    builder: &mut NfaBuilder,
    raw_pattern: &str,
) -> Result<Fragment, NfaError> {
    let hir = parse(raw_pattern)?;
    if ends_with_end_anchor(&hir) {
        Ok(compile(builder, &hir))
    } else {
        let anchored_source = format!("(?:{raw_pattern}).*$");
        let anchored_hir = parse(&anchored_source)?;
        Ok(compile(builder, &anchored_hir))
    }
}

fn parse(pattern: &str) -> Result<Hir, NfaError> {
    regex_syntax::Parser::new()
        .parse(pattern)
        .map_err(|err| NfaError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: err.to_string(),
        })
}

/// Detects whether `hir`, read left to right, necessarily ends in an
/// end-of-string assertion. An escaped `\$` parses as a literal `$`
/// character (`HirKind::Literal`), never as `HirKind::Look`, so this
/// correctly distinguishes the anchor from its escaped form.
fn ends_with_end_anchor(hir: &Hir) -> bool {
    match hir.kind() {
        HirKind::Look(Look::End | Look::EndLF | Look::EndCRLF) => true,
        HirKind::Concat(parts) => parts.last().is_some_and(ends_with_end_anchor),
        HirKind::Capture(capture) => ends_with_end_anchor(capture.sub.as_ref()),
        HirKind::Alternation(branches) => {
            !branches.is_empty() && branches.iter().all(ends_with_end_anchor)
        }
        _ => false,
    }
}

fn compile(builder: &mut NfaBuilder, hir: &Hir) -> Fragment {
    match hir.kind() {
        HirKind::Empty => empty_fragment(builder),
        HirKind::Literal(literal) => compile_literal(builder, literal.0.as_ref()),
        HirKind::Class(Class::Unicode(class)) => compile_unicode_class(builder, class),
        HirKind::Class(Class::Bytes(_)) => empty_fragment(builder),
        HirKind::Look(_) => empty_fragment(builder),
        HirKind::Repetition(repetition) => compile_repetition(builder, repetition),
        HirKind::Capture(capture) => compile(builder, capture.sub.as_ref()),
        HirKind::Concat(parts) => compile_concat(builder, parts),
        HirKind::Alternation(branches) => compile_alternation(builder, branches),
    }
}

fn empty_fragment(builder: &mut NfaBuilder) -> Fragment {
    let start = builder.new_state();
    let accept = builder.new_state();
    builder.add_epsilon(start, accept);
    Fragment { start, accept }
}

fn compile_literal(builder: &mut NfaBuilder, bytes: &[u8]) -> Fragment {
    let text = std::str::from_utf8(bytes).unwrap_or("");
    if text.is_empty() {
        return empty_fragment(builder);
    }
    let start = builder.new_state();
    let mut prev = start;
    for ch in text.chars() {
        let next = builder.new_state();
        builder.add_transition(prev, ch, next);
        prev = next;
    }
    Fragment {
        start,
        accept: prev,
    }
}

/// Wires one transition per alphabet symbol the class contains, rather than
/// enumerating every individual Unicode code point in its ranges (`.`
/// alone spans almost all of `0..=0x10FFFF`) — the automaton never needs
/// to recognize a symbol `AccountTaxonomy` could not have assigned.
fn compile_unicode_class(
    builder: &mut NfaBuilder,
    class: &regex_syntax::hir::ClassUnicode,
) -> Fragment {
    let start = builder.new_state();
    let accept = builder.new_state();
    let alphabet: Vec<char> = builder.alphabet().to_vec();
    for ch in alphabet {
        if class.ranges().iter().any(|range| range.start() <= ch && ch <= range.end()) {
            builder.add_transition(start, ch, accept);
        }
    }
    Fragment { start, accept }
}

fn compile_concat(builder: &mut NfaBuilder, parts: &[Hir]) -> Fragment {
    let Some((first, rest)) = parts.split_first() else {
        return empty_fragment(builder);
    };
    let mut fragment = compile(builder, first);
    for part in rest {
        let next = compile(builder, part);
        builder.add_epsilon(fragment.accept, next.start);
        fragment = Fragment {
            start: fragment.start,
            accept: next.accept,
        };
    }
    fragment
}

fn compile_alternation(builder: &mut NfaBuilder, branches: &[Hir]) -> Fragment {
    let start = builder.new_state();
    let accept = builder.new_state();
    for branch in branches {
        let fragment = compile(builder, branch);
        builder.add_epsilon(start, fragment.start);
        builder.add_epsilon(fragment.accept, accept);
    }
    Fragment { start, accept }
}

fn compile_repetition(builder: &mut NfaBuilder, repetition: &Repetition) -> Fragment {
    let mandatory = compile_exact(builder, repetition.sub.as_ref(), repetition.min);
    let tail = match repetition.max {
        None => compile_star(builder, repetition.sub.as_ref()),
        Some(max) => {
            let extra = max.saturating_sub(repetition.min);
            compile_optional_chain(builder, repetition.sub.as_ref(), extra)
        }
    };
    concat_fragments(builder, mandatory, tail)
}

fn compile_exact(builder: &mut NfaBuilder, sub: &Hir, count: u32) -> Fragment {
    if count == 0 {
        return empty_fragment(builder);
    }
    let mut fragment = compile(builder, sub);
    for _ in 1..count {
        let next = compile(builder, sub);
        builder.add_epsilon(fragment.accept, next.start);
        fragment = Fragment {
            start: fragment.start,
            accept: next.accept,
        };
    }
    fragment
}

/// Zero-or-more repetitions of `sub` (Kleene star).
fn compile_star(builder: &mut NfaBuilder, sub: &Hir) -> Fragment {
    let start = builder.new_state();
    let accept = builder.new_state();
    let inner = compile(builder, sub);
    builder.add_epsilon(start, inner.start);
    builder.add_epsilon(inner.accept, inner.start);
    builder.add_epsilon(inner.accept, accept);
    builder.add_epsilon(start, accept);
    Fragment { start, accept }
}

/// `remaining` nested optional repetitions of `sub`, each able to skip
/// straight to the shared tail — used to realize bounded `{m,n}` beyond
/// the mandatory `m` copies.
fn compile_optional_chain(builder: &mut NfaBuilder, sub: &Hir, remaining: u32) -> Fragment {
    if remaining == 0 {
        return empty_fragment(builder);
    }
    let start = builder.new_state();
    let accept = builder.new_state();
    let inner = compile(builder, sub);
    let rest = compile_optional_chain(builder, sub, remaining - 1);
    builder.add_epsilon(start, accept);
    builder.add_epsilon(start, inner.start);
    builder.add_epsilon(inner.accept, rest.start);
    builder.add_epsilon(rest.accept, accept);
    Fragment { start, accept }
}

fn concat_fragments(builder: &mut NfaBuilder, first: Fragment, second: Fragment) -> Fragment {
    builder.add_epsilon(first.accept, second.start);
    Fragment {
        start: first.start,
        accept: second.accept,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::config::FinalStateTiebreak;
    use crate::nfa::NfaBuilder;

    fn evaluate(pattern: &str, word: &str) -> bool {
        let alphabet: Vec<char> = ('A'..='Z').collect();
        let mut builder = NfaBuilder::new(alphabet);
        builder.add_weighted_regex("m", pattern, dec!(1)).unwrap();
        let frozen = builder.freeze(FinalStateTiebreak::SmallestStateId);
        frozen.evaluate(word).is_some()
    }

    #[test]
    fn escaped_dollar_is_a_literal_not_an_anchor() {
        // "A\$" should match the literal text "A$", followed by any
        // suffix once anchored (the trailing `\$` is not an end anchor).
        assert!(evaluate(r"A\$", "A$"));
        assert!(evaluate(r"A\$", "A$B"));
        assert!(!evaluate(r"A\$", "A"));
    }

    #[test]
    fn already_anchored_pattern_is_not_double_anchored() {
        assert!(evaluate("AB$", "AB"));
        assert!(!evaluate("AB$", "ABC"));
    }

    #[test]
    fn character_class_and_bounded_repetition() {
        assert!(evaluate("[A-C]{2,3}", "AB"));
        assert!(evaluate("[A-C]{2,3}", "ABC"));
        assert!(!evaluate("[A-C]{2,3}", "A"));
        assert!(!evaluate("[A-C]{2,3}", "ABCD"));
    }

    #[test]
    fn optional_and_plus_quantifiers() {
        assert!(evaluate("AB?C", "AC"));
        assert!(evaluate("AB?C", "ABC"));
        assert!(evaluate("A+B", "AAAB"));
        assert!(!evaluate("A+B", "B"));
    }
}
