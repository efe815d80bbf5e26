// src/core/rules.rs
use crate::core::types::{CellId, RawPart, RawRule, Token};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Why a raw CMS rule never reaches the resolvers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleRejection {
    #[error("rule '{0}' has an empty pattern")]
    EmptyPattern(String),
    #[error("rule '{id}' has {parts} parts for a pattern of {pattern} cells")]
    PartCountMismatch { id: String, pattern: usize, parts: usize },
}

/// Override text for one pattern position. Fields are trimmed and an empty
/// field is stored as `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverridePart {
    surface: Option<String>,
    tts: Option<String>,
}

impl OverridePart {
    pub fn new(surface: &str, tts: Option<&str>) -> Self {
        Self {
            surface: non_empty(surface),
            tts: tts.and_then(non_empty),
        }
    }

    pub fn surface(&self) -> Option<&str> {
        self.surface.as_deref()
    }

    pub fn tts(&self) -> Option<&str> {
        self.tts.as_deref()
    }

    /// The (surface, tts) pair this part writes, or `None` when the surface is
    /// empty and the position must be left alone. A missing tts speaks the
    /// surface as written.
    pub fn written_form(&self) -> Option<(&str, &str)> {
        let surface = self.surface.as_deref()?;
        Some((surface, self.tts.as_deref().unwrap_or(surface)))
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// A compound whose pattern is non-empty and has exactly one part per cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRule", into = "RawRule")]
pub struct CompoundRule {
    id: String,
    pattern: Vec<CellId>,
    parts: Vec<OverridePart>,
}

impl CompoundRule {
    pub fn new(
        id: impl Into<String>,
        pattern: Vec<CellId>,
        parts: Vec<OverridePart>,
    ) -> Result<Self, RuleRejection> {
        let id = id.into();
        if pattern.is_empty() {
            return Err(RuleRejection::EmptyPattern(id));
        }
        if parts.len() != pattern.len() {
            return Err(RuleRejection::PartCountMismatch {
                id,
                pattern: pattern.len(),
                parts: parts.len(),
            });
        }
        Ok(Self { id, pattern, parts })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pattern(&self) -> &[CellId] {
        &self.pattern
    }

    pub fn parts(&self) -> &[OverridePart] {
        &self.parts
    }

    /// Pattern length; never zero.
    pub fn len(&self) -> usize {
        self.pattern.len()
    }

    /// True when `window` holds exactly this pattern, compared by cell id only.
    pub fn matches_window(&self, window: &[Token]) -> bool {
        ids_match(window, &self.pattern)
    }

    /// True when the last `k` pattern cells equal the last `k` tokens.
    pub fn matches_suffix(&self, tokens: &[Token], k: usize) -> bool {
        if k == 0 || k > self.pattern.len() || k > tokens.len() {
            return false;
        }
        ids_match(
            &tokens[tokens.len() - k..],
            &self.pattern[self.pattern.len() - k..],
        )
    }
}

fn ids_match(tokens: &[Token], pattern: &[CellId]) -> bool {
    tokens.len() == pattern.len() && tokens.iter().zip(pattern).all(|(t, id)| &t.id == id)
}

impl TryFrom<RawRule> for CompoundRule {
    type Error = RuleRejection;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        let pattern = raw.cell_ids();
        let parts = raw
            .parts
            .iter()
            .map(|p| OverridePart::new(&p.surface, p.tts.as_deref()))
            .collect();
        CompoundRule::new(raw.id, pattern, parts)
    }
}

impl From<CompoundRule> for RawRule {
    fn from(rule: CompoundRule) -> Self {
        RawRule {
            id: rule.id,
            pattern: rule.pattern,
            cells: Vec::new(),
            parts: rule
                .parts
                .into_iter()
                .map(|p| RawPart {
                    surface: p.surface.unwrap_or_default(),
                    tts: p.tts,
                })
                .collect(),
        }
    }
}

/// An ordered snapshot of valid compounds. Order is the tie-break between
/// rules, so it is never changed after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    rules: Vec<CompoundRule>,
}

impl RuleSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(rules: Vec<CompoundRule>) -> Self {
        Self { rules }
    }

    /// Validates CMS rules once, dropping the malformed ones.
    pub fn from_raw<I>(raw: I) -> Self
    where
        I: IntoIterator<Item = RawRule>,
    {
        let rules = raw
            .into_iter()
            .filter_map(|r| match CompoundRule::try_from(r) {
                Ok(rule) => Some(rule),
                Err(reason) => {
                    debug!(%reason, "skipping malformed compound");
                    None
                }
            })
            .collect();
        Self { rules }
    }

    /// Accepts an absent rule list the same way as an empty one.
    pub fn from_optional(raw: Option<&[RawRule]>) -> Self {
        raw.map(|r| Self::from_raw(r.iter().cloned()))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompoundRule> {
        self.rules.iter()
    }

    pub fn get(&self, id: &str) -> Option<&CompoundRule> {
        self.rules.iter().find(|r| r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, pattern: &[&str], surfaces: &[&str]) -> RawRule {
        RawRule {
            id: id.into(),
            pattern: pattern.iter().map(|s| s.to_string()).collect(),
            parts: surfaces
                .iter()
                .map(|s| RawPart { surface: s.to_string(), tts: None })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn rejects_empty_pattern() {
        let err = CompoundRule::try_from(raw("e", &[], &[])).unwrap_err();
        assert_eq!(err, RuleRejection::EmptyPattern("e".into()));
    }

    #[test]
    fn rejects_part_count_mismatch() {
        let err = CompoundRule::try_from(raw("m", &["a", "b"], &["x"])).unwrap_err();
        assert_eq!(
            err,
            RuleRejection::PartCountMismatch { id: "m".into(), pattern: 2, parts: 1 }
        );
    }

    #[test]
    fn from_raw_keeps_order_of_valid_rules() {
        let set = RuleSet::from_raw(vec![
            raw("first", &["a"], &["x"]),
            raw("broken", &["a", "b"], &["x"]),
            raw("second", &["b"], &["y"]),
        ]);
        let ids: Vec<&str> = set.iter().map(|r| r.id()).collect();
        assert_eq!(ids, ["first", "second"]);
        assert!(set.get("broken").is_none());
    }

    #[test]
    fn absent_rules_are_empty() {
        assert!(RuleSet::from_optional(None).is_empty());
    }

    #[test]
    fn parts_are_trimmed() {
        let part = OverridePart::new("  kassi ", Some("   "));
        assert_eq!(part.surface(), Some("kassi"));
        assert_eq!(part.tts(), None);
        assert_eq!(part.written_form(), Some(("kassi", "kassi")));
        assert_eq!(OverridePart::new(" ", Some("x")).written_form(), None);
    }

    #[test]
    fn suffix_matching_is_positional() {
        let rule = CompoundRule::try_from(raw("r", &["a", "b", "c"], &["x", "y", "z"])).unwrap();
        let tokens = vec![Token::new("q", "q"), Token::new("b", "b"), Token::new("c", "c")];
        assert!(rule.matches_suffix(&tokens, 1));
        assert!(rule.matches_suffix(&tokens, 2));
        assert!(!rule.matches_suffix(&tokens, 3));
        assert!(!rule.matches_suffix(&tokens, 0));
        assert!(!rule.matches_window(&tokens));
        assert!(rule.matches_window(&[Token::new("a", "A"), Token::new("b", ""), Token::new("c", "c")]));
    }

    #[test]
    fn deserializing_revalidates() {
        let bad = r#"{"id":"x","pattern":["a","b"],"parts":[{"surface":"y"}]}"#;
        assert!(serde_json::from_str::<CompoundRule>(bad).is_err());
        let good = r#"{"id":"x","pattern":["a"],"parts":[{"surface":"y"}]}"#;
        let rule: CompoundRule = serde_json::from_str(good).unwrap();
        assert_eq!(rule.len(), 1);
        assert_eq!(rule.pattern(), ["a".to_string()]);
    }
}
