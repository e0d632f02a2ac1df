//! Physical grid reconstruction
//!
//! Radial samples are stored from the outer boundary inward and end with
//! samples of the inner core. [FrameGrid] keeps the fluid shell samples only
//! and flips them so that the radius increases outward.

use ndarray::{s, Array3, Axis, ShapeBuilder, ShapeError};

use crate::header::Preamble;

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("array does not fit its shape")]
    Shape(#[from] ShapeError),
    #[error("cannot keep {keep} radial samples out of {len}")]
    Trim { keep: usize, len: usize },
    #[error("radius is not strictly increasing: {0:?}")]
    NonMonotonicRadius(Vec<f64>),
    #[error("radius ratio must be in [0,1), found {0}")]
    RadiusRatio(f64),
}
type Result<T> = std::result::Result<T, GridError>;

/// 3D scalar field
pub type Field = Array3<f64>;

/// Builds a field from values stored with the first index varying fastest
pub fn from_fortran(dims: [usize; 3], data: Vec<f64>) -> Result<Field> {
    let [n0, n1, n2] = dims;
    Ok(Array3::from_shape_vec((n0, n1, n2).f(), data)?)
}

/// Reconstructed coordinate grid
///
/// The radius is strictly increasing: index 0 is the innermost fluid shell
/// and the last index is the outer boundary.
#[derive(Debug, Clone)]
pub struct FrameGrid {
    n_r_max: usize,
    radius: Vec<f64>,
    theta: Vec<f64>,
    phi: Vec<f64>,
}
impl FrameGrid {
    pub fn new(preamble: &Preamble) -> Result<Self> {
        let radratio = preamble.run.radratio;
        if !(0f64..1f64).contains(&radratio) {
            return Err(GridError::RadiusRatio(radratio));
        }
        let n_r_max = preamble.run.n_r_max;
        let scale = 1. / (1. - radratio);
        let radius: Vec<f64> = trim_reverse(&preamble.radius, n_r_max)?
            .into_iter()
            .map(|r| r * scale)
            .collect();
        if radius.windows(2).any(|w| w[1] <= w[0]) {
            return Err(GridError::NonMonotonicRadius(radius));
        }
        Ok(Self {
            n_r_max,
            radius,
            theta: preamble.theta.clone(),
            phi: preamble.phi.clone(),
        })
    }
    pub fn n_r_max(&self) -> usize {
        self.n_r_max
    }
    pub fn radius(&self) -> &[f64] {
        &self.radius
    }
    pub fn theta(&self) -> &[f64] {
        &self.theta
    }
    pub fn phi(&self) -> &[f64] {
        &self.phi
    }
    /// Outer boundary radius
    pub fn r_cmb(&self) -> f64 {
        self.radius.last().copied().unwrap_or_default()
    }
    /// Trims, flips and transposes a raw `(r,θ,φ)` vector component into `(φ,θ,r)`
    pub fn frame_field(&self, raw: &Field) -> Result<Field> {
        let keep = self.n_r_max;
        let len = raw.len_of(Axis(0));
        if keep > len {
            return Err(GridError::Trim { keep, len });
        }
        Ok(raw.slice(s![..keep;-1, .., ..]).reversed_axes().to_owned())
    }
}

/// Keeps the first `keep` values and reverses them
pub fn trim_reverse(values: &[f64], keep: usize) -> Result<Vec<f64>> {
    if keep > values.len() {
        return Err(GridError::Trim {
            keep,
            len: values.len(),
        });
    }
    Ok(values[..keep].iter().rev().cloned().collect())
}
