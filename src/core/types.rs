// src/core/types.rs
use serde::{Deserialize, Serialize};

/// Identifier of a grid cell. Several taps of the same cell share one id.
pub type CellId = String;

/// One selected cell in the tap sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: CellId,
    /// Display text captured when the cell was tapped.
    pub text: String,
}

impl Token {
    pub fn new(id: impl Into<CellId>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into() }
    }
}

/// A token after compound overrides have been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedToken {
    pub id: CellId,
    pub surface: String,
    pub tts: String,
}

impl NormalizedToken {
    /// Identity mapping: show and speak the raw token text.
    pub fn identity(token: &Token) -> Self {
        Self {
            id: token.id.clone(),
            surface: token.text.clone(),
            tts: token.text.clone(),
        }
    }
}

/// Result of resolving a whole tap sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResolvedPhrase {
    pub display: String,
    pub tts: String,
    pub tokens: Vec<NormalizedToken>,
}

impl ResolvedPhrase {
    pub(crate) fn from_tokens(tokens: Vec<NormalizedToken>) -> Self {
        let display = join_words(tokens.iter().map(|t| t.surface.as_str()));
        let tts = join_words(tokens.iter().map(|t| t.tts.as_str()));
        Self { display, tts, tokens }
    }
}

/// Spoken and displayed form of the most recent token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TailForm {
    pub surface: String,
    pub tts: String,
}

fn join_words<'a>(words: impl Iterator<Item = &'a str>) -> String {
    words.collect::<Vec<_>>().join(" ")
}

// --- Raw CMS shapes ---
// These mirror what the content store hands out. Nothing here is trusted;
// `RuleSet::from_raw` is the only way they reach the resolvers.

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCellRef {
    #[serde(default)]
    pub cell_id: CellId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPart {
    #[serde(default)]
    pub surface: String,
    #[serde(default)]
    pub tts: Option<String>,
}

/// A compound rule exactly as stored by the CMS.
///
/// The pattern may be given either as `cells: [{cellId}]` (CMS export) or as a
/// flat `pattern: [..]` list; `pattern` takes precedence when non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub pattern: Vec<CellId>,
    #[serde(default)]
    pub cells: Vec<RawCellRef>,
    #[serde(default)]
    pub parts: Vec<RawPart>,
}

impl RawRule {
    /// The cell-id sequence this rule matches, whichever field carries it.
    pub fn cell_ids(&self) -> Vec<CellId> {
        if !self.pattern.is_empty() {
            self.pattern.clone()
        } else {
            self.cells.iter().map(|c| c.cell_id.clone()).collect()
        }
    }
}
