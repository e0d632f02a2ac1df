//! Frame export
//!
//! Exported fields are laid out `(φ,θ,r)` with the radius varying fastest.

use std::{
    io,
    path::{Path, PathBuf},
};

use ndarray::{concatenate, Axis, ShapeError};

use crate::{
    extrapolation::{
        full_period_phi, symmetrize, ExtrapolationError, ExtrapolationRequest,
        PotentialExtrapolation,
    },
    grid::{Field, FrameGrid, GridError},
};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to transform frame")]
    Grid(#[from] GridError),
    #[error("potential extrapolation failed")]
    Extrapolation(#[from] ExtrapolationError),
    #[error("extrapolated field of dims {found:?}, {expected:?} expected")]
    ShapeMismatch {
        expected: (usize, usize, usize),
        found: (usize, usize, usize),
    },
    #[error("failed to append the extrapolated field")]
    Concat(#[from] ShapeError),
    #[error("failed to write {1:?}")]
    Write(#[source] io::Error, PathBuf),
}
type Result<T> = std::result::Result<T, ExportError>;

/// Artifact name of the frame at `index` in the window
pub fn artifact_name(prefix: &str, index: usize) -> String {
    format!("{}_{:05}", prefix, index)
}

/// A frame ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFrame {
    /// index in the window
    pub index: usize,
    pub radius: Vec<f64>,
    pub theta: Vec<f64>,
    pub phi: Vec<f64>,
    pub br: Field,
    pub btheta: Field,
    pub bphi: Field,
}

/// Structured grid file writer
pub trait GridWriter {
    /// Writes `frame` in `dir` and returns the path of the new file
    fn write(&self, dir: &Path, name: &str, frame: &ExportedFrame) -> io::Result<PathBuf>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtrapolationOptions {
    /// ratio of the outermost extrapolation radius to the boundary radius
    pub ratio_out: f64,
    /// number of extrapolation radii
    pub nrout: usize,
}
impl Default for ExtrapolationOptions {
    fn default() -> Self {
        Self {
            ratio_out: 2.,
            nrout: 48,
        }
    }
}

pub struct Exporter<'a> {
    grid: &'a FrameGrid,
    minc: usize,
    writer: &'a dyn GridWriter,
    output_dir: PathBuf,
    prefix: String,
    extrapolation: Option<(&'a dyn PotentialExtrapolation, ExtrapolationOptions)>,
}
impl<'a> Exporter<'a> {
    pub fn new<P: AsRef<Path>>(
        grid: &'a FrameGrid,
        minc: usize,
        writer: &'a dyn GridWriter,
        output_dir: P,
    ) -> Self {
        Self {
            grid,
            minc,
            writer,
            output_dir: output_dir.as_ref().to_path_buf(),
            prefix: String::from("B3D"),
            extrapolation: None,
        }
    }
    pub fn prefix<S: Into<String>>(self, prefix: S) -> Self {
        Self {
            prefix: prefix.into(),
            ..self
        }
    }
    /// Appends a potential field extrapolation to every exported frame
    pub fn extrapolation(
        self,
        extrapolator: &'a dyn PotentialExtrapolation,
        options: ExtrapolationOptions,
    ) -> Self {
        Self {
            extrapolation: Some((extrapolator, options)),
            ..self
        }
    }
    /// Transforms raw `(r,θ,φ)` vector components into an exported frame
    pub fn transform(&self, index: usize, vectors: &[Field; 3]) -> Result<ExportedFrame> {
        let [br, btheta, bphi] = [
            self.grid.frame_field(&vectors[0])?,
            self.grid.frame_field(&vectors[1])?,
            self.grid.frame_field(&vectors[2])?,
        ];
        let Some((extrapolator, options)) = self.extrapolation else {
            return Ok(ExportedFrame {
                index,
                radius: self.grid.radius().to_vec(),
                theta: self.grid.theta().to_vec(),
                phi: self.grid.phi().to_vec(),
                br,
                btheta,
                bphi,
            });
        };

        let (n_phi, _, n_r) = br.dim();
        let ext = extrapolator.extrapolate(ExtrapolationRequest {
            r_cmb: self.grid.r_cmb(),
            br_cmb: br.index_axis(Axis(2), n_r - 1),
            theta: self.grid.theta(),
            minc: self.minc,
            ratio_out: options.ratio_out,
            nrout: options.nrout,
        })?;
        let [br, btheta, bphi] = [
            symmetrize(&br, self.minc)?,
            symmetrize(&btheta, self.minc)?,
            symmetrize(&bphi, self.minc)?,
        ];
        let (n0, n1, _) = br.dim();
        let expected = (n0, n1, ext.radius.len());
        for field in [&ext.br, &ext.btheta, &ext.bphi] {
            if field.dim() != expected {
                return Err(ExportError::ShapeMismatch {
                    expected,
                    found: field.dim(),
                });
            }
        }
        Ok(ExportedFrame {
            index,
            radius: self
                .grid
                .radius()
                .iter()
                .chain(ext.radius.iter())
                .cloned()
                .collect(),
            theta: self.grid.theta().to_vec(),
            phi: full_period_phi(n_phi, self.minc),
            br: concatenate(Axis(2), &[br.view(), ext.br.view()])?,
            btheta: concatenate(Axis(2), &[btheta.view(), ext.btheta.view()])?,
            bphi: concatenate(Axis(2), &[bphi.view(), ext.bphi.view()])?,
        })
    }
    /// Transforms and writes the frame at `index` in the window
    pub fn export(&self, index: usize, vectors: &[Field; 3]) -> Result<PathBuf> {
        let frame = self.transform(index, vectors)?;
        let name = artifact_name(&self.prefix, index);
        let path = self
            .writer
            .write(&self.output_dir, &name, &frame)
            .map_err(|e| ExportError::Write(e, self.output_dir.join(&name)))?;
        log::info!("write {:?}", path);
        Ok(path)
    }
}
