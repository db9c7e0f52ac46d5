use std::path::PathBuf;

use serde_json::Value as JsonValue;

pub const SETTINGS_MEMBER: &str = "Metadata/project_settings.config";
pub const MODEL_SETTINGS_MEMBER: &str = "Metadata/model_settings.config";

/// Names of the archive members the editor reads and replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    pub settings_member: String,
    pub model_settings_member: String,
}

impl Default for ArchiveLayout {
    fn default() -> Self {
        Self {
            settings_member: SETTINGS_MEMBER.to_string(),
            model_settings_member: MODEL_SETTINGS_MEMBER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    pub backup: bool,
    pub sync_model_name: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            backup: true,
            sync_model_name: true,
        }
    }
}

/// One overwritten key. `old` is `None` when the key was absent before.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    pub key: String,
    pub old: Option<JsonValue>,
    pub new: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub path: PathBuf,
    pub backup_path: Option<PathBuf>,
    pub model_name: Option<String>,
}
