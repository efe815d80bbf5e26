// src/lib.rs

pub mod c_api;
pub mod config;
pub mod core;
pub mod error;
pub mod persistence;

pub use crate::config::EngineConfig;
pub use crate::core::engine::{PhraseEngine, Utterance};
pub use crate::core::phrase::{resolve_phrase, resolve_phrase_raw};
pub use crate::core::rules::{CompoundRule, OverridePart, RuleRejection, RuleSet};
pub use crate::core::tail::{resolve_tail_form, resolve_tail_form_raw, tail_match, TailMatch};
pub use crate::core::types::{NormalizedToken, RawRule, ResolvedPhrase, TailForm, Token};
pub use crate::error::PhraseError;
