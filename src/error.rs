use std::{io, path::PathBuf};

use crate::{
    candidates::CandidateError, export::ExportError, frame::FrameError,
    framecount::FrameCountError, grid::GridError, header::HeaderError, selector::SelectorError,
};

#[derive(thiserror::Error, Debug)]
pub enum Movie3dError {
    #[error("failed to open movie {1:?}")]
    Open(#[source] io::Error, PathBuf),
    #[error("failed to create output directory {1:?}")]
    OutputDir(#[source] io::Error, PathBuf),
    #[error("Error in the `candidates` module")]
    Candidate(#[from] CandidateError),
    #[error("Error in the `framecount` module")]
    FrameCount(#[from] FrameCountError),
    #[error("Error in the `selector` module")]
    Selector(#[from] SelectorError),
    #[error("Error in the `header` module")]
    Header(#[from] HeaderError),
    #[error("Error in the `grid` module")]
    Grid(#[from] GridError),
    #[error("failed to decode frame #{index} of the movie")]
    Frame {
        index: usize,
        #[source]
        source: FrameError,
    },
    #[error("failed to export frame #{index} of the window")]
    Export {
        index: usize,
        #[source]
        source: ExportError,
    },
    #[error("failed to write the time series")]
    Pickle(#[from] serde_pickle::Error),
}
