//! Model Artifact Persistence

use crate::PersistenceError;
use flight_features::FEATURE_COLUMNS;
use serde::{de::DeserializeOwned, Serialize};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Bumped whenever the artifact layout changes
pub const ARTIFACT_VERSION: u32 = 1;

fn io_error(path: &Path, source: std::io::Error) -> PersistenceError {
    PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Encode and write an artifact. The target is replaced by rename, so
/// readers see either the old or the new file, never a partial one.
pub fn save<T: Serialize>(path: &Path, artifact: &T) -> Result<(), PersistenceError> {
    let bytes =
        postcard::to_allocvec(artifact).map_err(|e| PersistenceError::Codec(e.to_string()))?;

    let tmp = temp_path(path);
    let mut file = File::create(&tmp).map_err(|e| io_error(&tmp, e))?;
    file.write_all(&bytes).map_err(|e| io_error(&tmp, e))?;
    file.sync_all().map_err(|e| io_error(&tmp, e))?;
    drop(file);

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        io_error(path, e)
    })?;

    debug!("Wrote {} byte artifact to {}", bytes.len(), path.display());
    Ok(())
}

/// Read and decode an artifact
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, PersistenceError> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => PersistenceError::NotFound(path.to_path_buf()),
        _ => io_error(path, e),
    })?;
    postcard::from_bytes(&bytes).map_err(|e| PersistenceError::Codec(e.to_string()))
}

/// Check a stored version and column list against the running schema
pub fn check_schema(version: u32, columns: &[String]) -> Result<(), PersistenceError> {
    if version != ARTIFACT_VERSION {
        return Err(PersistenceError::SchemaMismatch(format!(
            "artifact version {version}, expected {ARTIFACT_VERSION}"
        )));
    }
    if columns.len() != FEATURE_COLUMNS.len()
        || columns.iter().zip(FEATURE_COLUMNS).any(|(stored, name)| stored != name)
    {
        return Err(PersistenceError::SchemaMismatch(format!(
            "artifact columns {columns:?} do not match {FEATURE_COLUMNS:?}"
        )));
    }
    Ok(())
}

/// Current schema as stored in an artifact
pub fn current_columns() -> Vec<String> {
    FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect()
}
