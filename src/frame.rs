use serde::Serialize;

use crate::{
    grid::{self, Field, GridError},
    header::FrameShape,
    record::{Precision, RecordError, RecordRead},
};

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("failed to read frame")]
    Record(#[from] RecordError),
    #[error("frame does not fit its shape")]
    Grid(#[from] GridError),
}
type Result<T> = std::result::Result<T, FrameError>;

const VECTOR_NAMES: [&str; 3] = ["radial component", "theta component", "phi component"];

/// Frame diagnostics written ahead of the vector arrays
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FrameMeta {
    pub n_frame: f64,
    pub time: f64,
    /// inner core rotation rate
    pub omega_ic: f64,
    /// mantle rotation rate
    pub omega_ma: f64,
    pub dipole_colatitude: f64,
    pub dipole_longitude: f64,
    pub dipole_strength: f64,
    pub dipole_strength_geo: f64,
}
impl FrameMeta {
    pub fn read<R: RecordRead>(reader: &mut R, precision: Precision) -> Result<Self> {
        let m = reader.read_scalars("frame metadata", precision, 8)?;
        Ok(Self {
            n_frame: m[0],
            time: m[1],
            omega_ic: m[2],
            omega_ma: m[3],
            dipole_colatitude: m[4],
            dipole_longitude: m[5],
            dipole_strength: m[6],
            dipole_strength_geo: m[7],
        })
    }
}

/// Raw frame as stored in the movie
#[derive(Debug, Clone)]
pub struct Frame {
    pub meta: FrameMeta,
    /// radial, colatitudinal and azimuthal components, `(r,θ,φ)` each
    pub vectors: [Field; 3],
}
impl Frame {
    pub fn read<R: RecordRead>(
        reader: &mut R,
        precision: Precision,
        shape: &FrameShape,
    ) -> Result<Self> {
        let meta = FrameMeta::read(reader, precision)?;
        let mut read = |name: &'static str| -> Result<Field> {
            let values = reader.read_scalars(name, precision, shape.len())?;
            Ok(grid::from_fortran(shape.dims(), values)?)
        };
        let vectors = [
            read(VECTOR_NAMES[0])?,
            read(VECTOR_NAMES[1])?,
            read(VECTOR_NAMES[2])?,
        ];
        Ok(Self { meta, vectors })
    }
    /// Reads the frame metadata and consumes the vector arrays
    pub fn skip<R: RecordRead>(
        reader: &mut R,
        precision: Precision,
        shape: &FrameShape,
    ) -> Result<FrameMeta> {
        let meta = FrameMeta::read(reader, precision)?;
        for name in VECTOR_NAMES {
            reader.skip_scalars(name, precision, shape.len())?;
        }
        Ok(meta)
    }
}
