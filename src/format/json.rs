//! JSON persistence helpers.
//!
//! Files are written with four-space indentation and non-ASCII text kept as
//! is, matching the files the annotation tool has always produced. Writes go
//! to a sibling temporary file that is renamed over the target, so a crash
//! mid-write never leaves a truncated annotation file behind.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::format::error::FormatError;

/// Read and parse a JSON file, reporting a missing file as `FileNotFound`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, FormatError> {
    if !path.is_file() {
        return Err(FormatError::not_found(path));
    }
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Serialize with four-space indentation.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, FormatError> {
    let mut bytes = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, formatter);
    value.serialize(&mut serializer)?;
    Ok(bytes)
}

/// Serialize `value` and atomically replace `path` with it.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), FormatError> {
    let bytes = to_pretty_json(value)?;
    write_atomic(path, &bytes)
}

/// Write `bytes` to a temporary sibling of `path`, then rename it into place.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), FormatError> {
    let tmp = temp_path_for(path);
    let result = write_and_sync(&tmp, bytes).and_then(|()| fs::rename(&tmp, path));
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    log::trace!("Wrote {} bytes to {:?}", bytes.len(), path);
    Ok(())
}

fn write_and_sync(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// `dir/name.ext` → `dir/.name.ext.tmp`
pub(crate) fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}
