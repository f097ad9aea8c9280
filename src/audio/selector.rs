use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::directory::AudioDirectory;

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("no entries found in {}", .0.display())]
    EmptyDirectory(PathBuf),
    #[error("failed to list {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One intro and one outro path, built fresh for each request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionResult {
    pub intro_path: PathBuf,
    pub outro_path: PathBuf,
}

/// Uniform index in `[0, len)`, or `None` for an empty sequence.
pub fn pick_index<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Option<usize> {
    (len > 0).then(|| rng.gen_range(0..len))
}

#[derive(Debug, Clone)]
pub struct AudioSelector {
    intro: AudioDirectory,
    outro: AudioDirectory,
}

impl AudioSelector {
    pub fn new(intro: AudioDirectory, outro: AudioDirectory) -> Self {
        Self { intro, outro }
    }

    /// List both directories and pick one entry from each.
    ///
    /// Both listings are read before either is checked, so a missing outro
    /// directory is reported even when the intro directory is empty.
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<SelectionResult, SelectionError> {
        let intro_entries = list_entries(&self.intro)?;
        let outro_entries = list_entries(&self.outro)?;

        let intro_path = choose(&self.intro, &intro_entries, rng)?;
        let outro_path = choose(&self.outro, &outro_entries, rng)?;

        info!("Selected intro: {}", intro_path.display());
        info!("Selected outro: {}", outro_path.display());

        Ok(SelectionResult { intro_path, outro_path })
    }
}

fn list_entries(dir: &AudioDirectory) -> Result<Vec<OsString>, SelectionError> {
    let entries = dir.list().map_err(|source| SelectionError::Io {
        path: dir.path().to_path_buf(),
        source,
    })?;
    debug!("Files found in {}: {:?}", dir.path().display(), entries);
    Ok(entries)
}

fn choose<R: Rng + ?Sized>(
    dir: &AudioDirectory,
    entries: &[OsString],
    rng: &mut R,
) -> Result<PathBuf, SelectionError> {
    let index = pick_index(rng, entries.len())
        .ok_or_else(|| SelectionError::EmptyDirectory(dir.path().to_path_buf()))?;
    let name = &entries[index];
    if name.to_str().is_none() {
        warn!("Entry {:?} in {} is not valid UTF-8", name, dir.path().display());
    }
    Ok(dir.join(name))
}
