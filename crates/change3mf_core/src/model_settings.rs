use std::path::Path;

use xmltree::{Element, EmitterConfig, XMLNode};

use crate::core_api::{EditError, EditErrorCode};

const METADATA_TAG: &str = "metadata";
const NAME_KEY: &str = "name";

/// The model name an archive should carry: its file name without directory or extension.
pub fn model_name_for(path: &Path) -> Result<String, EditError> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| {
            EditError::new(
                EditErrorCode::Usage,
                format!("cannot derive a model name from {}", path.display()),
            )
        })
}

/// Parse model settings XML, rename it and serialize the result.
pub fn patch_model_name(xml: &str, name: &str) -> Result<String, EditError> {
    let mut root = Element::parse(xml.as_bytes()).map_err(|e| {
        EditError::new(
            EditErrorCode::Parse,
            format!("model settings are not well-formed XML: {e}"),
        )
    })?;

    rename_objects(&mut root, name);

    let mut out = Vec::new();
    root.write_with_config(&mut out, EmitterConfig::new().perform_indent(true))
        .map_err(|e| {
            EditError::new(
                EditErrorCode::Parse,
                format!("failed to serialize model settings: {e}"),
            )
        })?;
    String::from_utf8(out).map_err(|e| {
        EditError::new(
            EditErrorCode::Parse,
            format!("serialized model settings are not UTF-8: {e}"),
        )
    })
}

/// Set `value` on every `<metadata key="name">` that is a grandchild of `root`.
///
/// Only the children of the root's direct children are inspected; deeper
/// metadata (per-part names, for instance) is left alone. Returns the number
/// of elements updated.
pub fn rename_objects(root: &mut Element, name: &str) -> usize {
    let mut patched = 0;

    for child in root.children.iter_mut() {
        let XMLNode::Element(object) = child else {
            continue;
        };
        for grandchild in object.children.iter_mut() {
            let XMLNode::Element(metadata) = grandchild else {
                continue;
            };
            if metadata.name == METADATA_TAG
                && metadata.attributes.get("key").map(String::as_str) == Some(NAME_KEY)
            {
                metadata
                    .attributes
                    .insert("value".to_string(), name.to_string());
                patched += 1;
            }
        }
    }

    patched
}
