use std::fmt::Write as _;

use change3mf_core::core_api::{ChangeRecord, EditError, SaveReport};
use change3mf_core::settings::SettingsDocument;
use serde_json::Value as JsonValue;

const NOT_SET: &str = "<not set>";

/// The whole settings document as indented JSON.
pub fn render_settings(settings: &SettingsDocument) -> Result<String, EditError> {
    settings.to_json_pretty()
}

/// `name: value`, or a not-found line when the key is absent or `null`.
pub fn render_field(settings: &SettingsDocument, name: &str) -> String {
    match settings.get(name) {
        Some(value) if !value.is_null() => format!("{name}: {}", render_value(value)),
        _ => format!("{name} not found in config."),
    }
}

/// Strings print bare; everything else prints as compact JSON.
pub fn render_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn render_old_value(value: Option<&JsonValue>) -> String {
    value.map(render_value).unwrap_or_else(|| NOT_SET.to_string())
}

pub fn render_change_log(changes: &[ChangeRecord]) -> String {
    let mut out = String::new();
    writeln!(&mut out, "Changes made:").expect("writing to String cannot fail");
    for change in changes {
        writeln!(
            &mut out,
            " - {}: {} → {}",
            change.key,
            render_old_value(change.old.as_ref()),
            render_value(&change.new)
        )
        .expect("writing to String cannot fail");
    }
    out
}

pub fn render_save_report(report: &SaveReport) -> String {
    let mut out = String::new();
    if let Some(backup) = &report.backup_path {
        writeln!(&mut out, "Backup saved as: {}", backup.display())
            .expect("writing to String cannot fail");
    }
    if let Some(name) = &report.model_name {
        writeln!(&mut out, "Model name set to: {name}").expect("writing to String cannot fail");
    }
    writeln!(&mut out, "Changes saved to: {}", report.path.display())
        .expect("writing to String cannot fail");
    out
}
