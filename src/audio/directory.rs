use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A directory whose entries are candidate audio segments.
///
/// Entries are treated opaquely: no extension or file type filtering.
#[derive(Debug, Clone)]
pub struct AudioDirectory {
    path: PathBuf,
}

impl AudioDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entry names in the order the filesystem yields them. Read fresh on
    /// every call. Names are kept as raw OS strings so non-UTF-8 entries
    /// still join into a path that exists.
    pub fn list(&self) -> io::Result<Vec<OsString>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            names.push(entry?.file_name());
        }
        Ok(names)
    }

    pub fn join(&self, name: impl AsRef<OsStr>) -> PathBuf {
        self.path.join(name.as_ref())
    }
}
