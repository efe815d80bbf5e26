use crate::config::EngineConfig;
use crate::core::phrase::resolve_phrase;
use crate::core::rules::RuleSet;
use crate::core::tail::tail_match;
use crate::core::types::{ResolvedPhrase, Token};
use crate::error::PhraseError;
use crate::persistence::{load_rules_json, load_snapshot, save_snapshot};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// What to say right after a tap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub surface: String,
    pub tts: String,
    /// Id of the compound that supplied the form, if any.
    pub compound: Option<String>,
}

// The phrase engine owns the tap sequence of one session and the rule
// snapshot it is resolved against. All resolution goes through the pure
// functions in `phrase` and `tail`.
pub struct PhraseEngine {
    rules: RuleSet,
    tokens: Vec<Token>,
    max_tokens: usize,
}

impl PhraseEngine {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            tokens: Vec::new(),
            max_tokens: 0,
        }
    }

    /// Loads rules from the configured export, falling back to the snapshot.
    /// A fresh export refreshes the snapshot.
    pub fn from_config(config: &EngineConfig) -> Result<Self, PhraseError> {
        config.validate()?;
        let rules = match (&config.rules_path, &config.snapshot_path) {
            (Some(rules_path), snapshot) => {
                let rules = load_rules_json(rules_path)?;
                if let Some(snapshot_path) = snapshot {
                    if let Err(e) = save_snapshot(&rules, snapshot_path) {
                        warn!("Failed to refresh rule snapshot: {}", e);
                    }
                }
                rules
            }
            (None, Some(snapshot_path)) => load_snapshot(snapshot_path)?,
            (None, None) => RuleSet::empty(),
        };
        info!(rules = rules.len(), "phrase engine ready");
        let mut engine = Self::new(rules);
        engine.max_tokens = config.max_tokens;
        Ok(engine)
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Appends a tapped cell and returns what to speak now. Returns `None` only
    /// when the phrase is already at its configured length.
    pub fn select(&mut self, id: &str, text: &str) -> Option<Utterance> {
        if self.max_tokens > 0 && self.tokens.len() >= self.max_tokens {
            warn!(max = self.max_tokens, "phrase is full, ignoring tap on '{}'", id);
            return None;
        }
        self.tokens.push(Token::new(id, text));

        let utterance = match tail_match(&self.tokens, &self.rules) {
            Some(m) => {
                debug!(rule = %m.rule_id, k = m.matched_len, "compound captured tap");
                Utterance {
                    surface: m.form.surface,
                    tts: m.form.tts,
                    compound: Some(m.rule_id),
                }
            }
            None => Utterance {
                surface: text.to_string(),
                tts: text.to_string(),
                compound: None,
            },
        };
        Some(utterance)
    }

    pub fn play_all(&self) -> ResolvedPhrase {
        resolve_phrase(&self.tokens, &self.rules)
    }

    /// Resolves the phrase and starts a new one.
    pub fn complete(&mut self) -> ResolvedPhrase {
        let phrase = self.play_all();
        self.tokens.clear();
        phrase
    }

    pub fn undo(&mut self) -> Option<Token> {
        self.tokens.pop()
    }

    pub fn reset(&mut self) {
        self.tokens.clear();
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Swaps in a new rule snapshot; the current phrase is kept.
    pub fn replace_rules(&mut self, rules: RuleSet) {
        self.rules = rules;
    }
}
