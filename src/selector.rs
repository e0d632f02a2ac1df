//! Frame selection
//!
//! Every frame of the stream up to the last retained one is read, whatever
//! its plan: skipping a frame only means its content is dropped once decoded.

use std::{fmt, str::FromStr};

#[derive(Debug, thiserror::Error)]
pub enum SelectorError {
    #[error("the export step must be at least 1")]
    Stride,
    #[error("cannot retain {requested} frames out of {total}")]
    WindowExceedsTotal { requested: usize, total: usize },
    #[error(r#"expected "all" or a number of frames, found {0:?}"#)]
    NVar(String),
}
type Result<T> = std::result::Result<T, SelectorError>;

/// Number of frames retained from the end of the movie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NVar {
    #[default]
    All,
    Count(usize),
}
impl FromStr for NVar {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(NVar::All)
        } else {
            s.trim()
                .parse::<usize>()
                .map(NVar::Count)
                .map_err(|_| SelectorError::NVar(s.to_string()))
        }
    }
}
impl fmt::Display for NVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NVar::All => write!(f, "all"),
            NVar::Count(n) => write!(f, "{}", n),
        }
    }
}

/// What happens to a frame once read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePlan {
    /// before the window
    Skip,
    /// inside the window, not exported
    DecodeDiscard { index: usize },
    /// inside the window and exported
    DecodeExport { index: usize },
}
impl FramePlan {
    /// Frame index within the window
    pub fn window_index(&self) -> Option<usize> {
        match self {
            FramePlan::Skip => None,
            FramePlan::DecodeDiscard { index } | FramePlan::DecodeExport { index } => Some(*index),
        }
    }
    pub fn is_export(&self) -> bool {
        matches!(self, FramePlan::DecodeExport { .. })
    }
}

/// Window of frames counted back from the last retained frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSelector {
    total: usize,
    requested: usize,
    stride: usize,
}
impl FrameSelector {
    /// Selects `requested` frames ending at frame `total`, exporting every `stride` frame
    pub fn new(total: usize, requested: NVar, stride: usize) -> Result<Self> {
        if stride == 0 {
            return Err(SelectorError::Stride);
        }
        let requested = match requested {
            NVar::All => total,
            NVar::Count(n) if n > total => {
                return Err(SelectorError::WindowExceedsTotal {
                    requested: n,
                    total,
                })
            }
            NVar::Count(n) => n,
        };
        Ok(Self {
            total,
            requested,
            stride,
        })
    }
    /// Number of frames read from the stream
    pub fn total(&self) -> usize {
        self.total
    }
    /// Number of frames in the window
    pub fn requested(&self) -> usize {
        self.requested
    }
    pub fn stride(&self) -> usize {
        self.stride
    }
    /// Number of frames read and dropped before the window
    pub fn discard_count(&self) -> usize {
        self.total - self.requested
    }
    /// Number of exported frames
    pub fn n_export(&self) -> usize {
        self.requested.div_ceil(self.stride)
    }
    /// The plan of every frame in stream order
    pub fn plan(&self) -> Vec<FramePlan> {
        std::iter::repeat(FramePlan::Skip)
            .take(self.discard_count())
            .chain((0..self.requested).map(|index| {
                if index % self.stride == 0 {
                    FramePlan::DecodeExport { index }
                } else {
                    FramePlan::DecodeDiscard { index }
                }
            }))
            .collect()
    }
}
