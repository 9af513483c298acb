//! File system-related utilities.

use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use log::debug;
use serde_json::Value as JsonValue;

use crate::Error;

/// Canonicalize the given path if it exists. If it does not exist, returns
/// `Ok(None)`.
pub fn maybe_canonicalize<P>(path: P) -> Result<Option<PathBuf>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.exists() {
        Ok(Some(path.canonicalize()?))
    } else {
        Ok(None)
    }
}

/// Reads the given file as a UTF-8 string.
pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path)
        .map_err(|e| Error::Io(path.display().to_string(), e).into())
}

/// Reads and parses the given JSON file.
pub fn read_json<P: AsRef<Path>>(path: P) -> Result<JsonValue> {
    let path = path.as_ref();
    let content = read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(Error::Json)
        .wrap_err_with(|| format!("failed to parse JSON file {}", path.display()))
}

/// Writes the given content to a file, creating its parent directories if
/// necessary.
pub fn write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, content: C) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_path_exists(path)?;
    fs::write(path, content).map_err(|e| Error::Io(path.display().to_string(), e))?;
    Ok(())
}

pub fn ensure_parent_path_exists(path: &Path) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::PathMissingParent(path.to_path_buf()))?;
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    ensure_path_exists(parent)
}

pub fn ensure_path_exists(path: &Path) -> Result<()> {
    if !path.is_dir() {
        fs::create_dir_all(path).map_err(|e| Error::Io(path.display().to_string(), e))?;
        debug!("Created path: {}", path.display());
    }
    Ok(())
}
