//! Movie file preamble
//!
//! The preamble fixes the frame layout of the whole file: once decoded, the
//! [FrameShape] is handed explicitly to every frame read.

use serde::Serialize;

use crate::record::{Precision, RecordError, RecordRead};

#[derive(Debug, thiserror::Error)]
pub enum HeaderError {
    #[error("failed to read the movie preamble")]
    Record(#[from] RecordError),
    #[error("{name} must be an integer in [0, {}], found {value}", u32::MAX)]
    NotACount { name: &'static str, value: f64 },
    #[error("invalid header: {0}")]
    Invalid(String),
    #[error("{what} holds {found} entries, at least {expected} expected")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
}
type Result<T> = std::result::Result<T, HeaderError>;

/// Movie description record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieHeader {
    pub version: String,
    pub n_type: f64,
    pub n_surface: usize,
    pub constant: f64,
    pub n_fields: usize,
    /// Movie type code, only defined for single field movies
    pub movie_type: Option<usize>,
    /// Value of the movie type slot as stored in the file
    pub movie_type_raw: f64,
}

/// Run parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunParameters {
    pub run_id: String,
    /// number of radial samples per frame, minus the 2 boundary samples
    pub n_r_mov_tot: usize,
    /// number of radial samples in the fluid shell
    pub n_r_max: usize,
    pub n_theta_max: usize,
    pub n_phi_tot: usize,
    /// azimuthal periodicity order
    pub minc: usize,
    pub rayleigh: f64,
    pub ekman: f64,
    pub prandtl: f64,
    pub magnetic_prandtl: f64,
    /// inner to outer radius ratio
    pub radratio: f64,
    pub time_scale: f64,
}

/// Shape `(radial, theta, phi)` of the vector arrays of every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameShape {
    pub n_r: usize,
    pub n_theta: usize,
    pub n_phi: usize,
}
impl FrameShape {
    pub fn dims(&self) -> [usize; 3] {
        [self.n_r, self.n_theta, self.n_phi]
    }
    /// Number of scalars in one vector array, saturated at `usize::MAX`
    pub fn len(&self) -> usize {
        self.n_r
            .saturating_mul(self.n_theta)
            .saturating_mul(self.n_phi)
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decoded preamble with the raw coordinate arrays
#[derive(Debug, Clone)]
pub struct Preamble {
    pub movie: MovieHeader,
    pub run: RunParameters,
    pub radius: Vec<f64>,
    pub theta: Vec<f64>,
    pub phi: Vec<f64>,
}
impl Preamble {
    /// Reads the preamble records in file order
    ///
    /// No partial preamble is ever returned: any short record or early end of
    /// stream is an error.
    pub fn decode<R: RecordRead>(reader: &mut R, precision: Precision) -> Result<Self> {
        let version = reader.read_tag("version")?;
        let description = reader.read_scalars("movie description", precision, 4)?;
        let n_fields = as_count("n_fields", description[3])?;
        let movie_type_raw = reader.read_scalars("movie type", precision, 1)?[0];
        let movie_type = if n_fields == 1 {
            Some(as_count("movie type", movie_type_raw)?)
        } else {
            None
        };
        let movie = MovieHeader {
            version,
            n_type: description[0],
            n_surface: as_count("n_surface", description[1])?,
            constant: description[2],
            n_fields,
            movie_type,
            movie_type_raw,
        };
        log::debug!("{:?}", movie);

        let run_id = reader.read_tag("run identifier")?;
        let p = reader.read_scalars("run parameters", precision, 11)?;
        let run = RunParameters {
            run_id,
            n_r_mov_tot: as_count("n_r_mov_tot", p[0])?,
            n_r_max: as_count("n_r_max", p[1])?,
            n_theta_max: as_count("n_theta_max", p[2])?,
            n_phi_tot: as_count("n_phi_tot", p[3])?,
            minc: as_count("minc", p[4])?,
            rayleigh: p[5],
            ekman: p[6],
            prandtl: p[7],
            magnetic_prandtl: p[8],
            radratio: p[9],
            time_scale: p[10],
        };
        log::debug!("{:?}", run);
        if run.minc == 0 {
            return Err(HeaderError::Invalid("minc must be at least 1".into()));
        }
        if run.n_r_max == 0 || run.n_theta_max == 0 || run.n_phi_tot == 0 {
            return Err(HeaderError::Invalid(format!(
                "empty grid: {} x {} x {}",
                run.n_r_max, run.n_theta_max, run.n_phi_tot
            )));
        }
        let n_r = run.n_r_mov_tot.saturating_add(2);
        if run.n_r_max > n_r {
            return Err(HeaderError::Invalid(format!(
                "n_r_max ({}) exceeds the number of radial samples per frame ({})",
                run.n_r_max, n_r
            )));
        }

        let radius = reader.read_vec("radius", precision)?;
        let theta = reader.read_vec("theta", precision)?;
        let phi = reader.read_vec("phi", precision)?;
        for (what, found, expected) in [
            ("radius", radius.len(), run.n_r_max),
            ("theta", theta.len(), run.n_theta_max),
            ("phi", phi.len(), run.n_phi_tot),
        ] {
            if found < expected {
                return Err(HeaderError::ShapeMismatch {
                    what,
                    expected,
                    found,
                });
            }
        }

        let theta = theta[..run.n_theta_max].to_vec();
        let phi = phi[..run.n_phi_tot].to_vec();
        Ok(Self {
            movie,
            run,
            radius,
            theta,
            phi,
        })
    }
    /// Shape of the vector arrays of every frame
    pub fn shape(&self) -> FrameShape {
        FrameShape {
            n_r: self.run.n_r_mov_tot.saturating_add(2),
            n_theta: self.run.n_theta_max,
            n_phi: self.run.n_phi_tot,
        }
    }
}

/// Counts are stored as floats, they must be whole and fit a record marker
fn as_count(name: &'static str, value: f64) -> Result<usize> {
    if value.is_finite() && value >= 0. && value.fract() == 0. && value <= u32::MAX as f64 {
        Ok(value as usize)
    } else {
        Err(HeaderError::NotACount { name, value })
    }
}
