//! Potential field outside the fluid shell
//!
//! The field beyond the outer boundary is curl-free and is computed from the
//! radial field at the boundary. Extrapolated fields always cover the full
//! azimuthal period, so the simulated fields are [symmetrize]d before the
//! extension is appended to them.

use std::f64::consts::PI;

use ndarray::{concatenate, s, Array3, ArrayView2, Axis, ShapeError};

use crate::grid::Field;

#[derive(Debug, thiserror::Error)]
pub enum ExtrapolationError {
    #[error("the periodicity order must be at least 1")]
    Periodicity,
    #[error("the outer to boundary radius ratio must be greater than 1, found {0}")]
    RatioOut(f64),
    #[error("at least 1 extrapolation radius is required")]
    NoRadius,
    #[error("boundary field has {found} colatitudes, the grid has {expected}")]
    Colatitudes { expected: usize, found: usize },
    #[error("cannot replicate the field over the full period")]
    Shape(#[from] ShapeError),
}
type Result<T> = std::result::Result<T, ExtrapolationError>;

/// Replicates a `(φ,θ,r)` field over the full azimuthal period
///
/// The field is repeated `minc` times along φ and closed by a copy of its
/// first φ plane, giving `n_φ·minc + 1` planes.
pub fn symmetrize(field: &Field, minc: usize) -> Result<Field> {
    if minc == 0 {
        return Err(ExtrapolationError::Periodicity);
    }
    let n_phi = field.len_of(Axis(0));
    let mut planes = vec![field.view(); minc];
    planes.push(field.slice(s![..n_phi.min(1), .., ..]));
    Ok(concatenate(Axis(0), &planes)?)
}

/// Azimuths of a symmetrized field: `n_phi·minc + 1` points from 0 to 2π
pub fn full_period_phi(n_phi: usize, minc: usize) -> Vec<f64> {
    let n = n_phi * minc;
    (0..=n).map(|k| 2. * PI * k as f64 / n as f64).collect()
}

/// Inputs of a potential extrapolation
#[derive(Debug, Clone, Copy)]
pub struct ExtrapolationRequest<'a> {
    /// outer boundary radius
    pub r_cmb: f64,
    /// radial field at the outer boundary, `(φ,θ)`
    pub br_cmb: ArrayView2<'a, f64>,
    pub theta: &'a [f64],
    pub minc: usize,
    /// ratio of the outermost extrapolation radius to `r_cmb`
    pub ratio_out: f64,
    /// number of extrapolation radii
    pub nrout: usize,
}

/// Extrapolated radii and fields, `(φ,θ,nrout)` over the full period
#[derive(Debug, Clone, PartialEq)]
pub struct Extrapolation {
    pub radius: Vec<f64>,
    pub br: Field,
    pub btheta: Field,
    pub bphi: Field,
}

pub trait PotentialExtrapolation {
    fn extrapolate(&self, request: ExtrapolationRequest<'_>) -> Result<Extrapolation>;
}

/// Extrapolation radii: `nrout` radii evenly spaced in `(r_cmb, ratio_out·r_cmb]`
pub fn outer_radii(r_cmb: f64, ratio_out: f64, nrout: usize) -> Result<Vec<f64>> {
    if ratio_out.is_nan() || ratio_out <= 1. {
        return Err(ExtrapolationError::RatioOut(ratio_out));
    }
    if nrout == 0 {
        return Err(ExtrapolationError::NoRadius);
    }
    let dr = r_cmb * (ratio_out - 1.) / nrout as f64;
    Ok((1..=nrout).map(|i| r_cmb + dr * i as f64).collect())
}

/// Axial dipole potential field
///
/// The axial dipole coefficient is the least-squares fit of
/// `Br = 2g cos θ` to the boundary field; higher degrees are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct AxialDipole;
impl AxialDipole {
    /// Axial dipole coefficient of the boundary radial field
    pub fn coefficient(br_cmb: ArrayView2<'_, f64>, theta: &[f64]) -> f64 {
        let (num, den) = br_cmb
            .indexed_iter()
            .fold((0f64, 0f64), |(num, den), ((_, t), b)| {
                let c = 2. * theta[t].cos();
                (num + b * c, den + c * c)
            });
        if den > 0. {
            num / den
        } else {
            0.
        }
    }
}
impl PotentialExtrapolation for AxialDipole {
    fn extrapolate(&self, request: ExtrapolationRequest<'_>) -> Result<Extrapolation> {
        let ExtrapolationRequest {
            r_cmb,
            br_cmb,
            theta,
            minc,
            ratio_out,
            nrout,
        } = request;
        if minc == 0 {
            return Err(ExtrapolationError::Periodicity);
        }
        let (n_phi, n_theta) = br_cmb.dim();
        if theta.len() != n_theta {
            return Err(ExtrapolationError::Colatitudes {
                expected: theta.len(),
                found: n_theta,
            });
        }
        let radius = outer_radii(r_cmb, ratio_out, nrout)?;
        let g = Self::coefficient(br_cmb, theta);
        log::debug!("axial dipole coefficient: {:.6e}", g);

        let dims = (n_phi * minc + 1, n_theta, nrout);
        let decay: Vec<f64> = radius.iter().map(|r| g * (r_cmb / r).powi(3)).collect();
        Ok(Extrapolation {
            br: Array3::from_shape_fn(dims, |(_, t, k)| 2. * decay[k] * theta[t].cos()),
            btheta: Array3::from_shape_fn(dims, |(_, t, k)| decay[k] * theta[t].sin()),
            bphi: Array3::zeros(dims),
            radius,
        })
    }
}
