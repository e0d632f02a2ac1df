//! 3D movie files of spherical shell simulations
//!
//! A movie file holds a time series of 3D vector fields sampled on a
//! spherical shell grid. [Movie3D] reads the frames at the end of the movie
//! and writes every `step` of them to a structured grid file for ParaView.
//!
//! ```no_run
//! use movie3d::{Movie3D, NVar};
//!
//! let report = Movie3D::default()
//!     .file("B_3D_mov.CJ2")
//!     .nvar(NVar::Count(10))
//!     .step(2)
//!     .export()?;
//! report.summary();
//! # Ok::<(), movie3d::Movie3dError>(())
//! ```

use std::{
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

pub mod candidates;
pub mod error;
pub mod export;
pub mod extrapolation;
pub mod frame;
pub mod framecount;
pub mod grid;
pub mod header;
pub mod record;
pub mod selector;
pub mod vts;

pub use candidates::{CandidateResolver, GlobResolver};
pub use error::Movie3dError;
pub use export::{ExportedFrame, Exporter, ExtrapolationOptions, GridWriter};
pub use extrapolation::{AxialDipole, PotentialExtrapolation};
pub use frame::{Frame, FrameMeta};
pub use grid::{Field, FrameGrid};
pub use header::{FrameShape, MovieHeader, Preamble, RunParameters};
pub use record::{FortranReader, FortranWriter, Precision, RecordRead};
pub use selector::{FramePlan, FrameSelector, NVar};
pub use vts::VtsWriter;

type Result<T> = std::result::Result<T, Movie3dError>;

/// Outcome of a movie export
#[derive(Debug, Default, Serialize)]
pub struct MovieReport {
    /// number of frames read from the movie
    pub frames_read: usize,
    /// time of every frame in the window
    pub time: Vec<f64>,
    /// exported files
    pub artifacts: Vec<PathBuf>,
}
impl MovieReport {
    pub fn summary(&self) {
        println!("SUMMARY:");
        println!(" - # of frames read: {}", self.frames_read);
        if let (Some(first), Some(last)) = (self.time.first(), self.time.last()) {
            println!(
                " - window: {} frames in [{:.6e}, {:.6e}]",
                self.time.len(),
                first,
                last
            );
        }
        println!(" - # of exported frames: {}", self.artifacts.len());
        if let Some(dir) = self.artifacts.first().and_then(|path| path.parent()) {
            println!(" - output directory: {:?}", dir);
        }
    }
}

/// 3D movie loader
///
/// The window of frames is counted back from the last frame: `nvar` frames
/// ending at frame `lastvar`. When `lastvar` is not set, or `nvar` is
/// [NVar::All], the number of frames is read from the simulation log.
pub struct Movie3D {
    file: Option<PathBuf>,
    selection: usize,
    step: usize,
    lastvar: Option<usize>,
    nvar: NVar,
    extrapolation: ExtrapolationOptions,
    extrapot: bool,
    precision: Precision,
    output_dir: PathBuf,
    prefix: String,
}
impl Default for Movie3D {
    fn default() -> Self {
        Self {
            file: None,
            selection: 1,
            step: 1,
            lastvar: None,
            nvar: NVar::All,
            extrapolation: Default::default(),
            extrapot: false,
            precision: Precision::Float32,
            output_dir: PathBuf::from("vtsFiles"),
            prefix: String::from("B3D"),
        }
    }
}
impl Movie3D {
    pub fn file<P: AsRef<Path>>(self, file: P) -> Self {
        Self {
            file: Some(file.as_ref().to_path_buf()),
            ..self
        }
    }
    /// 1-based index of the movie picked by the resolver when no file is set
    pub fn selection(self, selection: usize) -> Self {
        Self { selection, ..self }
    }
    pub fn step(self, step: usize) -> Self {
        Self { step, ..self }
    }
    pub fn lastvar(self, lastvar: usize) -> Self {
        Self {
            lastvar: Some(lastvar),
            ..self
        }
    }
    pub fn nvar(self, nvar: NVar) -> Self {
        Self { nvar, ..self }
    }
    pub fn nrout(self, nrout: usize) -> Self {
        Self {
            extrapolation: ExtrapolationOptions {
                nrout,
                ..self.extrapolation
            },
            ..self
        }
    }
    pub fn ratio_out(self, ratio_out: f64) -> Self {
        Self {
            extrapolation: ExtrapolationOptions {
                ratio_out,
                ..self.extrapolation
            },
            ..self
        }
    }
    pub fn extrapot(self, extrapot: bool) -> Self {
        Self { extrapot, ..self }
    }
    pub fn precision(self, precision: Precision) -> Self {
        Self { precision, ..self }
    }
    pub fn output_dir<P: AsRef<Path>>(self, output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            ..self
        }
    }
    pub fn prefix<S: Into<String>>(self, prefix: S) -> Self {
        Self {
            prefix: prefix.into(),
            ..self
        }
    }
    /// Exports the movie with the default collaborators
    ///
    /// Movies are looked up in the current directory, the potential field is
    /// an [AxialDipole] and frames are written with [VtsWriter].
    pub fn export(self) -> Result<MovieReport> {
        let resolver = GlobResolver::new(".").selection(self.selection);
        self.export_with(&resolver, &AxialDipole, &VtsWriter)
    }
    /// Exports the movie
    pub fn export_with(
        self,
        resolver: &dyn CandidateResolver,
        extrapolator: &dyn PotentialExtrapolation,
        writer: &dyn GridWriter,
    ) -> Result<MovieReport> {
        let path = match &self.file {
            Some(file) => file.clone(),
            None => resolver.resolve()?,
        };
        let selector = self.selector(&path)?;
        log::info!(
            "{:?}: reading {} frames, exporting {} of the last {}",
            path,
            selector.total(),
            selector.n_export(),
            selector.requested()
        );
        let file = File::open(&path).map_err(|e| Movie3dError::Open(e, path.clone()))?;
        let mut reader = FortranReader::new(BufReader::new(file));
        self.process(&mut reader, &selector, extrapolator, writer)
    }
    /// Returns the frame window of a movie
    pub fn selector<P: AsRef<Path>>(&self, movie: P) -> Result<FrameSelector> {
        let (total, requested) = match (self.nvar, self.lastvar) {
            (NVar::All, _) => (framecount::discover(movie)?, NVar::All),
            (nvar, Some(lastvar)) => (lastvar, nvar),
            (nvar, None) => (framecount::discover(movie)?, nvar),
        };
        Ok(FrameSelector::new(total, requested, self.step)?)
    }
    /// Decodes the movie preamble and processes the frames according to the selector
    pub fn process<R: RecordRead>(
        &self,
        reader: &mut R,
        selector: &FrameSelector,
        extrapolator: &dyn PotentialExtrapolation,
        writer: &dyn GridWriter,
    ) -> Result<MovieReport> {
        let preamble = Preamble::decode(reader, self.precision)?;
        let shape = preamble.shape();
        let grid = FrameGrid::new(&preamble)?;
        log::info!(
            "{} ({}): {:?} per frame, {} fluid shells, minc={}",
            preamble.movie.version,
            preamble.run.run_id,
            shape.dims(),
            grid.n_r_max(),
            preamble.run.minc
        );

        fs::create_dir_all(&self.output_dir)
            .map_err(|e| Movie3dError::OutputDir(e, self.output_dir.clone()))?;
        let mut exporter = Exporter::new(&grid, preamble.run.minc, writer, &self.output_dir)
            .prefix(self.prefix.as_str());
        if self.extrapot {
            exporter = exporter.extrapolation(extrapolator, self.extrapolation);
        }

        let plan = selector.plan();
        let pb = ProgressBar::new(plan.len() as u64);
        if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} frames [{eta}]") {
            pb.set_style(style);
        }
        let mut report = MovieReport::default();
        for (k, frame_plan) in plan.into_iter().enumerate() {
            let as_frame_error = |source| Movie3dError::Frame { index: k, source };
            match frame_plan {
                FramePlan::Skip => {
                    Frame::skip(reader, self.precision, &shape).map_err(as_frame_error)?;
                }
                FramePlan::DecodeDiscard { .. } => {
                    let meta =
                        Frame::skip(reader, self.precision, &shape).map_err(as_frame_error)?;
                    report.time.push(meta.time);
                }
                FramePlan::DecodeExport { index } => {
                    let frame =
                        Frame::read(reader, self.precision, &shape).map_err(as_frame_error)?;
                    report.time.push(frame.meta.time);
                    let path = exporter
                        .export(index, &frame.vectors)
                        .map_err(|source| Movie3dError::Export { index, source })?;
                    report.artifacts.push(path);
                }
            }
            report.frames_read += 1;
            pb.inc(1);
        }
        pb.finish_and_clear();

        serde_pickle::to_writer(
            &mut File::create(self.output_dir.join("time.pkl"))
                .map_err(|e| Movie3dError::OutputDir(e, self.output_dir.clone()))?,
            &report.time,
            Default::default(),
        )?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::{
        export::tests::{ConstantExtension, MemoryWriter},
        header::tests::write_preamble,
    };

    const DIMS: [usize; 4] = [4, 3, 2, 2];

    fn movie(n_frame: usize) -> Vec<u8> {
        let mut wtr = FortranWriter::new(Vec::new());
        write_preamble(&mut wtr, Precision::Float32, 3, DIMS);
        let n = (DIMS[0] + 2) * DIMS[2] * DIMS[3];
        for f in 0..n_frame {
            let time = 0.1 * f as f64;
            wtr.write_scalars(Precision::Float32, &[f as f64, time, 0., 0., 0., 0., 0., 0.])
                .unwrap();
            for c in 0..3 {
                let values: Vec<f64> = (0..n).map(|i| (1000 * f + 100 * c + i) as f64).collect();
                wtr.write_scalars(Precision::Float32, &values).unwrap();
            }
        }
        wtr.into_inner()
    }

    #[test]
    fn window_and_stride() {
        let dir = tempfile::tempdir().unwrap();
        let writer = MemoryWriter::default();
        let loader = Movie3D::default().step(2).output_dir(dir.path());
        let selector = FrameSelector::new(6, NVar::Count(4), 2).unwrap();
        let mut reader = FortranReader::new(Cursor::new(movie(6)));
        let report = loader
            .process(&mut reader, &selector, &AxialDipole, &writer)
            .unwrap();
        assert_eq!(report.frames_read, 6);
        assert_eq!(report.time.len(), 4);
        assert!((report.time[0] - 0.2).abs() < 1e-6);
        let names: Vec<String> = writer.0.borrow().iter().map(|(n, _)| n.clone()).collect();
        assert_eq!(names, vec!["B3D_00000", "B3D_00002"]);
        // window frame 2 is movie frame 4
        let frame = &writer.0.borrow()[1].1;
        assert_eq!(frame.br[[0, 0, DIMS[1] - 1]], 4000.);
        assert!(dir.path().join("time.pkl").exists());
    }

    #[test]
    fn extrapolated_window() {
        let dir = tempfile::tempdir().unwrap();
        let writer = MemoryWriter::default();
        let loader = Movie3D::default()
            .extrapot(true)
            .nrout(5)
            .output_dir(dir.path());
        let selector = FrameSelector::new(3, NVar::All, 1).unwrap();
        let mut reader = FortranReader::new(Cursor::new(movie(3)));
        let report = loader
            .process(&mut reader, &selector, &ConstantExtension, &writer)
            .unwrap();
        assert_eq!(report.artifacts.len(), 3);
        for (_, frame) in writer.0.borrow().iter() {
            assert_eq!(frame.radius.len(), DIMS[1] + 5);
        }
    }

    #[test]
    fn explicit_lastvar_skips_log() {
        let selector = Movie3D::default()
            .lastvar(10)
            .nvar(NVar::Count(3))
            .selector("no_log_mov.none")
            .unwrap();
        assert_eq!(selector.discard_count(), 7);
        assert!(matches!(
            Movie3D::default().lastvar(10).selector("no_log_mov.none"),
            Err(Movie3dError::FrameCount(_))
        ));
    }
}
