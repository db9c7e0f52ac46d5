use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::warn;

use crate::core_api::{EditError, EditErrorCode};
use crate::settings::decode_utf8;

/// Keys and the values they should be set to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModificationSet {
    entries: JsonMap<String, JsonValue>,
}

impl ModificationSet {
    /// Parse `key=value[,key=value...]`.
    ///
    /// Pairs are separated by commas outside a bracketed list value and split
    /// on the first `=`. Keys and values are trimmed. A value wrapped in `[...]`
    /// becomes a list of strings (see [`normalize_value`]); anything else
    /// stays a string, numbers and booleans included.
    pub fn parse_inline(input: &str) -> Result<Self, EditError> {
        let mut set = Self::default();

        for pair in split_pairs(input) {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(EditError::new(
                    EditErrorCode::Format,
                    format!("invalid format in modification: {pair}"),
                ));
            };
            set.insert(key.trim(), normalize_value(value.trim()));
        }

        Ok(set)
    }

    /// Use a JSON object verbatim; values may be any JSON type.
    pub fn from_json_str(text: &str) -> Result<Self, EditError> {
        serde_json::from_str(text).map_err(|e| {
            EditError::new(
                EditErrorCode::Parse,
                format!("modifications are not a valid JSON object: {e}"),
            )
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, EditError> {
        let bytes = fs::read(path).map_err(|e| {
            EditError::new(
                EditErrorCode::Io,
                format!("failed to read {}: {e}", path.display()),
            )
        })?;
        Self::from_json_str(decode_utf8(&bytes)?)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: JsonValue) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &JsonValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Where the modifications for a write come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModificationSource {
    File(PathBuf),
    Inline(String),
}

impl ModificationSource {
    /// The file form wins when both are supplied. A blank inline string counts
    /// as no source at all.
    pub fn resolve(file: Option<PathBuf>, inline: Option<String>) -> Result<Self, EditError> {
        let inline = inline.filter(|text| !text.trim().is_empty());
        match (file, inline) {
            (Some(path), _) => Ok(Self::File(path)),
            (None, Some(text)) => Ok(Self::Inline(text)),
            (None, None) => Err(EditError::new(
                EditErrorCode::Usage,
                "you must provide either --modifications or --config-from-file",
            )),
        }
    }

    pub fn load(&self) -> Result<ModificationSet, EditError> {
        match self {
            Self::File(path) => ModificationSet::from_file(path),
            Self::Inline(text) => ModificationSet::parse_inline(text),
        }
    }
}

/// Turn one trimmed inline value into a JSON value.
///
/// `[a, "b", 'c']` becomes `["a", "b", "c"]`. The inner split is purely on
/// commas, so a quoted element containing a comma is split in two. If the
/// re-quoted list still fails to parse, the raw text is kept as a string.
pub fn normalize_value(raw: &str) -> JsonValue {
    if !(raw.starts_with('[') && raw.ends_with(']')) {
        return JsonValue::String(raw.to_string());
    }

    match parse_bracketed_list(raw) {
        Ok(items) => JsonValue::Array(items.into_iter().map(JsonValue::String).collect()),
        Err(e) => {
            warn!("could not parse list: {raw}, using raw string ({e})");
            JsonValue::String(raw.to_string())
        }
    }
}

fn parse_bracketed_list(raw: &str) -> serde_json::Result<Vec<String>> {
    let inner = raw.trim_matches(|c| c == '[' || c == ']');
    let quoted: Vec<String> = inner
        .split(',')
        .map(|part| {
            let part = part.trim().trim_matches('"').trim_matches('\'');
            format!("\"{part}\"")
        })
        .collect();
    serde_json::from_str(&format!("[{}]", quoted.join(",")))
}

/// Split on commas, except inside a `[...]` that opens a value.
///
/// Only a `[` that is the first non-blank character after a pair's `=` starts
/// a bracketed region. If such a region is never closed the whole input falls
/// back to a plain comma split, so one stray bracket cannot swallow the pairs
/// after it.
fn split_pairs(input: &str) -> Vec<&str> {
    let mut pairs = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut after_equals = false;
    let mut in_value = false;

    for (idx, ch) in input.char_indices() {
        if depth > 0 {
            match ch {
                '[' => depth += 1,
                ']' => depth -= 1,
                _ => {}
            }
            continue;
        }

        match ch {
            ',' => {
                pairs.push(&input[start..idx]);
                start = idx + 1;
                after_equals = false;
                in_value = false;
            }
            '=' if !after_equals => after_equals = true,
            '[' if after_equals && !in_value => {
                depth = 1;
                in_value = true;
            }
            c if after_equals && !c.is_whitespace() => in_value = true,
            _ => {}
        }
    }

    if depth > 0 {
        return input.split(',').collect();
    }
    pairs.push(&input[start..]);

    pairs
}
