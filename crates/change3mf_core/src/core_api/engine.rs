use std::path::{Path, PathBuf};

use tracing::debug;

use crate::archive::{self, ArchiveReader, MemberReplacement};
use crate::model_settings;
use crate::modifications::ModificationSet;
use crate::settings::SettingsDocument;

use super::error::EditError;
use super::types::{ArchiveLayout, ChangeRecord, SaveOptions, SaveReport};

#[derive(Debug, Default, Clone)]
pub struct Engine {
    layout: ArchiveLayout,
}

/// An opened archive with its settings loaded into memory.
#[derive(Debug)]
pub struct Session {
    path: PathBuf,
    layout: ArchiveLayout,
    settings: SettingsDocument,
    member_names: Vec<String>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(layout: ArchiveLayout) -> Self {
        Self { layout }
    }

    pub fn open(&self, path: impl AsRef<Path>) -> Result<Session, EditError> {
        let path = path.as_ref();
        let mut reader = ArchiveReader::open(path)?;
        let member_names = reader.member_names();
        debug!("opened {} ({} members)", path.display(), member_names.len());

        let bytes = reader.read_member(&self.layout.settings_member)?;
        let settings = SettingsDocument::from_bytes(&bytes)?;
        debug!("loaded {} settings", settings.len());

        Ok(Session {
            path: path.to_path_buf(),
            layout: self.layout.clone(),
            settings,
            member_names,
        })
    }
}

impl Session {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &SettingsDocument {
        &self.settings
    }

    pub fn member_names(&self) -> &[String] {
        &self.member_names
    }

    pub fn apply(&mut self, modifications: &ModificationSet, record: bool) -> Vec<ChangeRecord> {
        self.settings.apply(modifications, record)
    }

    /// Write the in-memory settings back into the archive.
    ///
    /// Replacement members are prepared before anything touches the disk, so a
    /// missing or malformed model settings member aborts without a backup or
    /// rewrite.
    pub fn save(&self, options: SaveOptions) -> Result<SaveReport, EditError> {
        let mut replacements = vec![MemberReplacement::new(
            self.layout.settings_member.clone(),
            self.settings.to_json_pretty()?,
        )];

        let model_name = if options.sync_model_name {
            let name = model_settings::model_name_for(&self.path)?;
            let xml = ArchiveReader::open(&self.path)?
                .read_text(&self.layout.model_settings_member)?;
            let patched = model_settings::patch_model_name(&xml, &name)?;
            replacements.push(MemberReplacement::new(
                self.layout.model_settings_member.clone(),
                patched,
            ));
            Some(name)
        } else {
            None
        };

        let backup_path = if options.backup {
            Some(archive::write_backup(&self.path)?)
        } else {
            None
        };

        archive::rewrite_archive(&self.path, &replacements)?;

        Ok(SaveReport {
            path: self.path.clone(),
            backup_path,
            model_name,
        })
    }
}
