//! TempFilesManager: save, load and delete files in one flat temp folder.
//!
//! Names passed in may carry directories; only the last path component is
//! used, so every file lands directly in the managed folder. The manager
//! does not deduplicate names or expire old files.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{FileError, FileResult};

#[derive(Debug, Clone)]
pub struct TempFilesManager {
    folder: PathBuf,
}

/// Last path component of `name` (either separator), or `None` when it is
/// empty, i.e. `name` is blank or ends with a separator.
pub fn short_file_name(name: &str) -> Option<&str> {
    let short = name.rsplit(['/', '\\']).next().unwrap_or(name);
    (!short.is_empty()).then_some(short)
}

/// Text after the last `.` of `name`; empty when there is no extension.
pub fn file_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) => &name[dot + 1..],
        None => "",
    }
}

impl TempFilesManager {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Where a file with this name lives (or would live) in the folder.
    pub fn path_of(&self, name: &str) -> FileResult<PathBuf> {
        let short = short_file_name(name).ok_or_else(|| FileError::InvalidName(name.to_string()))?;
        Ok(self.folder.join(short))
    }

    /// Create (or truncate) a file in the folder for writing.
    pub fn create(&self, name: &str) -> FileResult<File> {
        let path = self.path_of(name)?;
        File::create(&path).map_err(|source| FileError::Create { path, source })
    }

    /// Copy `data` into the folder under the short form of `name` and
    /// return that short name, which later calls should use.
    pub fn save<R: Read>(&self, name: &str, mut data: R) -> FileResult<String> {
        let path = self.path_of(name)?;
        let mut file = File::create(&path).map_err(|source| FileError::Create {
            path: path.clone(),
            source,
        })?;
        let bytes = io::copy(&mut data, &mut file).map_err(|source| FileError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), bytes, "temporary file saved");

        // path_of already validated the name.
        Ok(short_file_name(name).unwrap_or_default().to_string())
    }

    /// Open a previously saved file for reading.
    pub fn load(&self, name: &str) -> FileResult<File> {
        let path = self.path_of(name)?;
        File::open(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => FileError::NotFound(path.display().to_string()),
            _ => FileError::Io { path, source },
        })
    }

    pub fn delete(&self, name: &str) -> FileResult<()> {
        let path = self.path_of(name)?;
        if !path.exists() {
            return Err(FileError::NotFound(path.display().to_string()));
        }
        std::fs::remove_file(&path).map_err(|source| FileError::Delete { path: path.clone(), source })?;
        debug!(path = %path.display(), "temporary file deleted");
        Ok(())
    }

    /// Delete everything inside the folder, keeping the folder itself.
    pub fn clean(&self) -> FileResult<()> {
        let entries = std::fs::read_dir(&self.folder).map_err(|source| FileError::Io {
            path: self.folder.clone(),
            source,
        })?;

        let mut removed = 0usize;
        for entry in entries {
            let path = entry
                .map_err(|source| FileError::Io {
                    path: self.folder.clone(),
                    source,
                })?
                .path();
            let result = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            result.map_err(|source| FileError::Delete { path: path.clone(), source })?;
            removed += 1;
        }
        debug!(folder = %self.folder.display(), removed, "temp folder cleaned");
        Ok(())
    }
}
