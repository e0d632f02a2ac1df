//! Movie file discovery when no file is given

use std::path::{Path, PathBuf};

use glob::glob;

#[derive(Debug, thiserror::Error)]
pub enum CandidateError {
    #[error("no movie file (*_mov.*) found in {0:?}")]
    NoCandidate(PathBuf),
    #[error("invalid search pattern")]
    Pattern(#[from] glob::PatternError),
    #[error("failed to list movie files")]
    Glob(#[from] glob::GlobError),
}
type Result<T> = std::result::Result<T, CandidateError>;

/// Resolves the movie file to process
pub trait CandidateResolver {
    fn resolve(&self) -> Result<PathBuf>;
}

/// Picks the candidate at the 1-based `selection`
///
/// An out-of-range selection falls back to the first candidate.
pub fn select(candidates: &[PathBuf], selection: usize) -> Option<PathBuf> {
    let first = candidates.first()?;
    match selection
        .checked_sub(1)
        .and_then(|index| candidates.get(index))
    {
        Some(candidate) => Some(candidate.clone()),
        None => {
            log::warn!(
                "non valid index {}: {:?} has been chosen instead",
                selection,
                first
            );
            Some(first.clone())
        }
    }
}

/// Movie files `*_mov.*` of a directory, in alphabetical order
pub struct GlobResolver {
    dir: PathBuf,
    selection: usize,
}
impl GlobResolver {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            selection: 1,
        }
    }
    /// Sets the 1-based index of the movie to process
    pub fn selection(self, selection: usize) -> Self {
        Self { selection, ..self }
    }
    /// Lists the candidates
    pub fn candidates(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.dir.join("*_mov.*");
        let mut candidates =
            glob(&pattern.to_string_lossy())?.collect::<std::result::Result<Vec<_>, _>>()?;
        candidates.sort();
        Ok(candidates)
    }
}
impl CandidateResolver for GlobResolver {
    fn resolve(&self) -> Result<PathBuf> {
        let candidates = self.candidates()?;
        candidates.iter().enumerate().for_each(|(k, movie)| {
            log::info!(" {}) {:?}", k + 1, movie);
        });
        select(&candidates, self.selection)
            .ok_or_else(|| CandidateError::NoCandidate(self.dir.clone()))
    }
}
