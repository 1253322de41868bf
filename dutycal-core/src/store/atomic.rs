//! Whole-file JSON reads and temp-file-then-rename writes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{DutyError, DutyResult};

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_temp(path: &Path, contents: &[u8]) -> DutyResult<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| DutyError::io(parent, e))?;
    }

    let temp = temp_path(path);
    let mut file = fs::File::create(&temp).map_err(|e| DutyError::io(&temp, e))?;
    file.write_all(contents)
        .and_then(|_| file.sync_all())
        .map_err(|e| DutyError::io(&temp, e))?;
    Ok(temp)
}

/// Replaces `path` with `contents` via a sibling temp file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> DutyResult<()> {
    let temp = write_temp(path, contents)?;
    fs::rename(&temp, path).map_err(|e| DutyError::io(path, e))?;
    tracing::debug!(path = %path.display(), bytes = contents.len(), "Wrote file");
    Ok(())
}

pub fn to_json<T: Serialize>(path: &Path, value: &T) -> DutyResult<Vec<u8>> {
    let mut json = serde_json::to_vec_pretty(value)
        .map_err(|e| DutyError::corrupt(path, format!("cannot serialize: {}", e)))?;
    json.push(b'\n');
    Ok(json)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> DutyResult<()> {
    write_atomic(path, &to_json(path, value)?)
}

/// Reads and parses `path`; `Ok(None)` when the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> DutyResult<Option<T>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(DutyError::io(path, e)),
    };

    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| DutyError::corrupt(path, e))
}

/// A batch of file replacements committed together.
///
/// Every temp file is written before any rename happens, so a failure while
/// writing leaves all targets untouched.
#[derive(Debug, Default)]
pub struct StagedWrites {
    files: Vec<(PathBuf, Vec<u8>)>,
}

impl StagedWrites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn stage(&mut self, path: PathBuf, contents: Vec<u8>) {
        self.files.retain(|(p, _)| *p != path);
        self.files.push((path, contents));
    }

    pub fn stage_json<T: Serialize>(&mut self, path: PathBuf, value: &T) -> DutyResult<()> {
        let contents = to_json(&path, value)?;
        self.stage(path, contents);
        Ok(())
    }

    pub fn commit(self) -> DutyResult<()> {
        let mut temps: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(self.files.len());
        for (path, contents) in &self.files {
            match write_temp(path, contents) {
                Ok(temp) => temps.push((temp, path.clone())),
                Err(e) => {
                    for (temp, _) in &temps {
                        let _ = fs::remove_file(temp);
                    }
                    return Err(e);
                }
            }
        }

        for (temp, path) in temps {
            fs::rename(&temp, &path).map_err(|e| DutyError::io(&path, e))?;
            tracing::debug!(path = %path.display(), "Committed staged file");
        }
        Ok(())
    }
}
