// src/core/phrase.rs
use crate::core::rules::{CompoundRule, OverridePart, RuleSet};
use crate::core::types::{NormalizedToken, RawRule, ResolvedPhrase, Token};
use tracing::trace;

/// Resolves the full display and speech text of a tap sequence.
///
/// Every rule is applied in declaration order and every matching window of a
/// rule is applied left to right, so later writes win where windows overlap.
/// Unmatched rules are no-ops.
pub fn resolve_phrase(tokens: &[Token], rules: &RuleSet) -> ResolvedPhrase {
    let baseline: Vec<NormalizedToken> = tokens.iter().map(NormalizedToken::identity).collect();
    if rules.is_empty() || tokens.is_empty() {
        return ResolvedPhrase::from_tokens(baseline);
    }

    let normalized = rules
        .iter()
        .fold(baseline, |acc, rule| overlay_rule(acc, tokens, rule));
    ResolvedPhrase::from_tokens(normalized)
}

/// Same as [`resolve_phrase`] for unvalidated CMS rules. `None` means no rules.
pub fn resolve_phrase_raw(tokens: &[Token], rules: Option<&[RawRule]>) -> ResolvedPhrase {
    resolve_phrase(tokens, &RuleSet::from_optional(rules))
}

fn overlay_rule(
    current: Vec<NormalizedToken>,
    tokens: &[Token],
    rule: &CompoundRule,
) -> Vec<NormalizedToken> {
    let len = rule.len();
    if len > tokens.len() {
        return current;
    }
    (0..=tokens.len() - len)
        .filter(|&start| rule.matches_window(&tokens[start..start + len]))
        .fold(current, |acc, start| {
            trace!(rule = rule.id(), start, "compound window matched");
            overlay_window(acc, start, rule.parts())
        })
}

fn overlay_window(
    current: Vec<NormalizedToken>,
    start: usize,
    parts: &[OverridePart],
) -> Vec<NormalizedToken> {
    current
        .into_iter()
        .enumerate()
        .map(|(pos, token)| {
            let written = pos
                .checked_sub(start)
                .and_then(|j| parts.get(j))
                .and_then(OverridePart::written_form);
            match written {
                Some((surface, tts)) => NormalizedToken {
                    id: token.id,
                    surface: surface.to_string(),
                    tts: tts.to_string(),
                },
                None => token,
            }
        })
        .collect()
}
