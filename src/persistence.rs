// File: src/persistence.rs
use crate::core::rules::RuleSet;
use crate::core::types::RawRule;
use crate::error::PhraseError;
use serde::Deserialize;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// The CMS exports either a bare list or an object wrapping it.
#[derive(Deserialize)]
#[serde(untagged)]
enum RuleExport {
    List(Vec<Value>),
    Wrapped {
        #[serde(default)]
        compounds: Vec<Value>,
    },
}

// Null fields count as absent, like a missing key.
fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

fn read_raw_rule(mut value: Value) -> Option<RawRule> {
    strip_nulls(&mut value);
    match serde_json::from_value(value) {
        Ok(rule) => Some(rule),
        Err(e) => {
            debug!(error = %e, "skipping unreadable compound");
            None
        }
    }
}

/// Parses a CMS rule export and validates it. Malformed rules are dropped.
pub fn parse_rules_json(json: &str) -> Result<RuleSet, PhraseError> {
    let export: RuleExport = serde_json::from_str(json)?;
    let values = match export {
        RuleExport::List(rules) => rules,
        RuleExport::Wrapped { compounds } => compounds,
    };
    let total = values.len();
    let rules = RuleSet::from_raw(values.into_iter().filter_map(read_raw_rule));
    if rules.len() < total {
        info!(kept = rules.len(), total, "dropped malformed compounds from export");
    }
    Ok(rules)
}

pub fn load_rules_json(path: &Path) -> Result<RuleSet, PhraseError> {
    let text = fs::read_to_string(path)?;
    parse_rules_json(&text)
}

/// Writes the validated rules atomically next to `path`.
pub fn save_snapshot(rules: &RuleSet, path: &Path) -> Result<(), PhraseError> {
    let parent_dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir)?;

    let temp_file = NamedTempFile::new_in(parent_dir)?;
    {
        let mut writer = BufWriter::new(&temp_file);
        bincode::serialize_into(&mut writer, rules)?;
        writer.flush()?;
    }
    temp_file.persist(path)?;
    Ok(())
}

/// Reads a snapshot; every rule is validated again on the way in.
pub fn load_snapshot(path: &Path) -> Result<RuleSet, PhraseError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(bincode::deserialize_from(reader)?)
}
