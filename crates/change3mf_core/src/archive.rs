use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::core_api::{EditError, EditErrorCode};
use crate::settings::decode_utf8;

/// Bytes that take the place of an existing archive member on rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberReplacement {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl MemberReplacement {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

pub struct ArchiveReader<R> {
    inner: ZipArchive<R>,
}

impl ArchiveReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, EditError> {
        let file = File::open(path).map_err(|e| io_error("failed to open", path, e))?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> ArchiveReader<R> {
    pub fn new(inner: R) -> Result<Self, EditError> {
        let inner = ZipArchive::new(inner).map_err(|e| {
            EditError::new(EditErrorCode::Archive, format!("failed to read archive: {e}"))
        })?;
        Ok(Self { inner })
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Member names in central directory order.
    pub fn member_names(&self) -> Vec<String> {
        self.inner.file_names().map(str::to_string).collect()
    }

    pub fn read_member(&mut self, name: &str) -> Result<Vec<u8>, EditError> {
        let mut file = match self.inner.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => {
                return Err(EditError::new(
                    EditErrorCode::NotFound,
                    format!("{name} not found in the .3mf file"),
                ));
            }
            Err(e) => {
                return Err(EditError::new(
                    EditErrorCode::Archive,
                    format!("failed to open member {name}: {e}"),
                ));
            }
        };

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| {
            EditError::new(
                EditErrorCode::Archive,
                format!("failed to read member {name}: {e}"),
            )
        })?;
        Ok(bytes)
    }

    /// Read a member as UTF-8 text, dropping a leading byte-order mark.
    pub fn read_text(&mut self, name: &str) -> Result<String, EditError> {
        let bytes = self.read_member(name)?;
        decode_utf8(&bytes)
            .map(str::to_string)
            .map_err(|e| EditError::new(e.code, format!("{name}: {}", e.message)))
    }
}

/// `<path><suffix>`, appended to the full file name (`model.3mf` -> `model.3mf.bak`).
pub fn companion_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Copy the archive verbatim to `<path>.bak`.
pub fn write_backup(path: &Path) -> Result<PathBuf, EditError> {
    let backup_path = companion_path(path, ".bak");
    fs::copy(path, &backup_path).map_err(|e| io_error("failed to back up", path, e))?;
    debug!("backup written to {}", backup_path.display());
    Ok(backup_path)
}

/// Rewrite the archive at `path` with `replacements` substituted.
///
/// The new archive is assembled at `<path>.tmp` and renamed over the original
/// only once it is complete. Members without a replacement are copied raw, so
/// their compressed payloads are unchanged. On failure the scratch file is
/// removed and the original is left as it was.
pub fn rewrite_archive(path: &Path, replacements: &[MemberReplacement]) -> Result<(), EditError> {
    let temp_path = companion_path(path, ".tmp");

    if let Err(e) = write_rewritten(path, &temp_path, replacements) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        io_error("failed to replace", path, e)
    })?;
    debug!("replaced {} with rewritten archive", path.display());
    Ok(())
}

fn write_rewritten(
    source_path: &Path,
    temp_path: &Path,
    replacements: &[MemberReplacement],
) -> Result<(), EditError> {
    let out = File::create(temp_path).map_err(|e| io_error("failed to create", temp_path, e))?;
    let mut writer = ZipWriter::new(BufWriter::new(out));

    let source = File::open(source_path).map_err(|e| io_error("failed to open", source_path, e))?;
    let mut archive = ZipArchive::new(BufReader::new(source)).map_err(archive_error)?;

    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index).map_err(archive_error)?;

        match replacements.iter().find(|r| r.name == entry.name()) {
            Some(replacement) => {
                let method = match entry.compression() {
                    CompressionMethod::Stored => CompressionMethod::Stored,
                    _ => CompressionMethod::Deflated,
                };
                let options = SimpleFileOptions::default().compression_method(method);
                writer
                    .start_file(replacement.name.as_str(), options)
                    .map_err(archive_error)?;
                writer
                    .write_all(&replacement.bytes)
                    .map_err(|e| io_error("failed to write", temp_path, e))?;
                debug!("replaced member {}", replacement.name);
            }
            None => {
                debug!("copied member {}", entry.name());
                writer.raw_copy_file(entry).map_err(archive_error)?;
            }
        }
    }

    let mut out = writer.finish().map_err(archive_error)?;
    out.flush()
        .map_err(|e| io_error("failed to flush", temp_path, e))?;
    Ok(())
}

fn archive_error(e: ZipError) -> EditError {
    EditError::new(EditErrorCode::Archive, format!("archive error: {e}"))
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> EditError {
    EditError::new(
        EditErrorCode::Io,
        format!("{action} {}: {e}", path.display()),
    )
}
