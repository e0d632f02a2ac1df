//! Number of frames in a movie
//!
//! The simulation log `log.<TAG>` reports every movie frame it writes; the
//! movie `<name>_mov.<TAG>` then holds as many frames as the highest frame
//! number reported.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use regex::Regex;

#[derive(Debug, thiserror::Error)]
pub enum FrameCountError {
    #[error("{0:?} is not a movie file name (<name>_mov.<TAG>)")]
    MovieName(PathBuf),
    #[error("failed to read log file {1:?}")]
    Io(#[source] io::Error, PathBuf),
    #[error("failed to read log")]
    Read(#[from] io::Error),
    #[error("no movie frame reported in {0:?}")]
    NotFound(PathBuf),
    #[error("invalid pattern")]
    Regex(#[from] regex::Error),
}
type Result<T> = std::result::Result<T, FrameCountError>;

/// Returns the path of the log file next to the movie
pub fn log_path<P: AsRef<Path>>(movie: P) -> Result<PathBuf> {
    let movie = movie.as_ref();
    let re = Regex::new(r".*_mov\.(.+)$")?;
    let tag = movie
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| re.captures(name))
        .and_then(|capts| capts.get(1))
        .map(|tag| tag.as_str().to_owned())
        .ok_or_else(|| FrameCountError::MovieName(movie.to_path_buf()))?;
    Ok(movie.with_file_name(format!("log.{}", tag)))
}

/// Returns the highest movie frame number in a log
///
/// `None` if no line reports a movie frame.
pub fn last_frame<R: BufRead>(log: R) -> Result<Option<usize>> {
    let re = Regex::new(r"^\s*! WRITING MOVIE FRAME NO\s*(\d+)")?;
    let mut last = None;
    for line in log.lines() {
        let line = line?;
        if let Some(n) = re
            .captures(&line)
            .and_then(|capts| capts.get(1))
            .and_then(|n| n.as_str().parse::<usize>().ok())
        {
            last = last.max(Some(n));
        }
    }
    Ok(last)
}

/// Discovers the number of frames of a movie from its log file
pub fn discover<P: AsRef<Path>>(movie: P) -> Result<usize> {
    let path = log_path(movie)?;
    let file = File::open(&path).map_err(|e| FrameCountError::Io(e, path.clone()))?;
    let n = last_frame(BufReader::new(file))?
        .ok_or_else(|| FrameCountError::NotFound(path.clone()))?;
    log::info!("{:?}: {} movie frames", path, n);
    Ok(n)
}
