// src/core/tail.rs
use crate::core::rules::{CompoundRule, RuleSet};
use crate::core::types::{RawRule, TailForm, Token};

/// The compound that captured the most recent token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailMatch {
    pub rule_id: String,
    /// Number of trailing tokens the rule matched.
    pub matched_len: usize,
    pub form: TailForm,
}

/// Spoken/displayed form for only the last token, or `None` when no compound
/// claims it (the caller then uses the raw token text).
pub fn resolve_tail_form(tokens: &[Token], rules: &RuleSet) -> Option<TailForm> {
    tail_match(tokens, rules).map(|m| m.form)
}

/// Same as [`resolve_tail_form`] for unvalidated CMS rules.
pub fn resolve_tail_form_raw(tokens: &[Token], rules: Option<&[RawRule]>) -> Option<TailForm> {
    resolve_tail_form(tokens, &RuleSet::from_optional(rules))
}

/// Picks one winner: each rule offers its longest matching suffix, the longest
/// offer across rules wins, and the earlier rule wins a tie.
pub fn tail_match(tokens: &[Token], rules: &RuleSet) -> Option<TailMatch> {
    if rules.is_empty() || tokens.is_empty() {
        return None;
    }
    rules
        .iter()
        .filter_map(|rule| candidate(tokens, rule))
        .fold(None, |best: Option<TailMatch>, cand| match best {
            Some(b) if b.matched_len >= cand.matched_len => Some(b),
            _ => Some(cand),
        })
}

fn candidate(tokens: &[Token], rule: &CompoundRule) -> Option<TailMatch> {
    let k = longest_suffix(tokens, rule)?;
    // An empty surface drops the rule; shorter suffixes are not retried.
    let (surface, tts) = rule.parts().get(k - 1)?.written_form()?;
    Some(TailMatch {
        rule_id: rule.id().to_string(),
        matched_len: k,
        form: TailForm {
            surface: surface.to_string(),
            tts: tts.to_string(),
        },
    })
}

fn longest_suffix(tokens: &[Token], rule: &CompoundRule) -> Option<usize> {
    let max_k = rule.len().min(tokens.len());
    (1..=max_k).rev().find(|&k| rule.matches_suffix(tokens, k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rules::OverridePart;

    fn tokens(ids: &[&str]) -> Vec<Token> {
        ids.iter().map(|id| Token::new(*id, *id)).collect()
    }

    fn rule(id: &str, pattern: &[&str], surfaces: &[&str]) -> CompoundRule {
        CompoundRule::new(
            id,
            pattern.iter().map(|s| s.to_string()).collect(),
            surfaces.iter().map(|s| OverridePart::new(s, None)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn nothing_to_resolve() {
        let rules = RuleSet::new(vec![rule("r", &["a"], &["x"])]);
        assert_eq!(resolve_tail_form(&[], &rules), None);
        assert_eq!(resolve_tail_form(&tokens(&["a"]), &RuleSet::empty()), None);
    }

    #[test]
    fn partial_suffix_uses_part_at_match_length() {
        // last two tokens match the last two pattern cells, so k = 2 picks parts[1]
        let rules = RuleSet::new(vec![rule("r", &["a", "b", "c"], &["A", "B", "C"])]);
        let m = tail_match(&tokens(&["x", "b", "c"]), &rules).unwrap();
        assert_eq!(m.matched_len, 2);
        assert_eq!(m.form.surface, "B");
    }

    #[test]
    fn empty_aligned_surface_discards_rule() {
        let rules = RuleSet::new(vec![
            rule("blank", &["a", "b"], &["A", " "]),
            rule("single", &["b"], &["bee"]),
        ]);
        let m = tail_match(&tokens(&["a", "b"]), &rules).unwrap();
        assert_eq!(m.rule_id, "single");
        assert_eq!(m.form.tts, "bee");
    }

    #[test]
    fn later_longer_match_beats_earlier_shorter() {
        let rules = RuleSet::new(vec![
            rule("short", &["c"], &["s"]),
            rule("long", &["b", "c"], &["l1", "l2"]),
        ]);
        assert_eq!(tail_match(&tokens(&["b", "c"]), &rules).unwrap().rule_id, "long");
    }

    #[test]
    fn raw_rules_skip_malformed() {
        let raw = vec![RawRule {
            id: "bad".into(),
            pattern: vec!["a".into()],
            ..Default::default()
        }];
        assert_eq!(resolve_tail_form_raw(&tokens(&["a"]), Some(raw.as_slice())), None);
    }
}
