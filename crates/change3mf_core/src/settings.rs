use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::warn;

use crate::core_api::{ChangeRecord, EditError, EditErrorCode};
use crate::modifications::ModificationSet;

const UTF8_BOM: &str = "\u{feff}";

/// The project settings object stored in the archive.
///
/// Key order from the source document is kept so a rewrite is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsDocument {
    entries: JsonMap<String, JsonValue>,
}

impl SettingsDocument {
    /// Decode member bytes as UTF-8, dropping a leading byte-order mark.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EditError> {
        let text = decode_utf8(bytes)?;
        Self::from_json_str(text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, EditError> {
        serde_json::from_str(text).map_err(|e| {
            EditError::new(
                EditErrorCode::Parse,
                format!("settings are not a valid JSON object: {e}"),
            )
        })
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_map(&self) -> &JsonMap<String, JsonValue> {
        &self.entries
    }

    pub fn to_json_pretty(&self) -> Result<String, EditError> {
        serde_json::to_string_pretty(&self.entries).map_err(|e| {
            EditError::new(
                EditErrorCode::Parse,
                format!("failed to serialize settings: {e}"),
            )
        })
    }

    /// Overwrite every key named in `modifications`, adding keys that are missing.
    ///
    /// Returns one record per processed key when `record` is set, otherwise an
    /// empty list. Unchanged-looking overwrites are recorded too.
    pub fn apply(&mut self, modifications: &ModificationSet, record: bool) -> Vec<ChangeRecord> {
        let mut changes = Vec::new();

        for (key, value) in modifications.iter() {
            let old = self.entries.get(key).cloned();
            if old.is_none() {
                warn!("key '{key}' not found in config, it will be added");
            }
            self.entries.insert(key.clone(), value.clone());

            if record {
                changes.push(ChangeRecord {
                    key: key.clone(),
                    old,
                    new: value.clone(),
                });
            }
        }

        changes
    }
}

pub(crate) fn decode_utf8(bytes: &[u8]) -> Result<&str, EditError> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        EditError::new(
            EditErrorCode::Parse,
            format!("member is not valid UTF-8: {e}"),
        )
    })?;
    Ok(text.strip_prefix(UTF8_BOM).unwrap_or(text))
}
