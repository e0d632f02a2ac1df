use std::{
    env, fs,
    path::{Path, PathBuf},
};

use ndarray::Array3;

use movie3d::{
    extrapolation::{Extrapolation, ExtrapolationError, ExtrapolationRequest},
    CandidateResolver, ExportedFrame, FortranWriter, GlobResolver, GridWriter, Movie3D,
    Movie3dError, NVar, PotentialExtrapolation, Precision, VtsWriter,
};

const N_R_MOV_TOT: usize = 4;
const N_R_MAX: usize = 3;
const N_THETA: usize = 4;
const N_PHI: usize = 3;
const MINC: usize = 2;
const N_R: usize = N_R_MOV_TOT + 2;

fn value(frame: usize, component: usize, r: usize, t: usize, p: usize) -> f64 {
    (frame * 10_000 + component * 1_000 + r * 100 + t * 10 + p) as f64
}

/// Writes a movie of `n_frame` frames, the last one holding `last_frame_records` records
fn write_movie(path: &Path, n_frame: usize, last_frame_records: usize) {
    let precision = Precision::Float64;
    let mut wtr = FortranWriter::new(Vec::new());
    wtr.write_tag("JW_Movie_Version_2").unwrap();
    wtr.write_scalars(precision, &[8., 0., 1., 3.]).unwrap();
    wtr.write_scalars(precision, &[0.]).unwrap();
    wtr.write_tag("synthetic").unwrap();
    wtr.write_scalars(
        precision,
        &[
            N_R_MOV_TOT as f64,
            N_R_MAX as f64,
            N_THETA as f64,
            N_PHI as f64,
            MINC as f64,
            1e5,
            1e-3,
            1.,
            5.,
            0.35,
            1.,
        ],
    )
    .unwrap();
    let radius: Vec<f64> = (0..N_R).map(|i| 0.65 - 0.05 * i as f64).collect();
    wtr.write_scalars(precision, &radius).unwrap();
    let theta: Vec<f64> = (0..N_THETA)
        .map(|i| (i as f64 + 0.5) * std::f64::consts::PI / N_THETA as f64)
        .collect();
    wtr.write_scalars(precision, &theta).unwrap();
    let phi: Vec<f64> = (0..N_PHI)
        .map(|i| i as f64 * std::f64::consts::PI / N_PHI as f64)
        .collect();
    wtr.write_scalars(precision, &phi).unwrap();
    for f in 0..n_frame {
        let n_record = if f + 1 == n_frame {
            last_frame_records
        } else {
            4
        };
        if n_record == 0 {
            continue;
        }
        wtr.write_scalars(precision, &[f as f64, f as f64, 0., 0., 0., 0., 0., 0.])
            .unwrap();
        for c in 0..n_record - 1 {
            // radial index varies fastest
            let mut values = Vec::with_capacity(N_R * N_THETA * N_PHI);
            for p in 0..N_PHI {
                for t in 0..N_THETA {
                    for r in 0..N_R {
                        values.push(value(f, c, r, t, p));
                    }
                }
            }
            wtr.write_scalars(precision, &values).unwrap();
        }
    }
    fs::write(path, wtr.into_inner()).unwrap();
}

fn write_log(dir: &Path, tag: &str, n_frame: usize) {
    let log: String = (1..=n_frame)
        .map(|i| format!("  ! WRITING MOVIE FRAME NO {:8}       at time {:8.3}\n", i, i))
        .collect();
    fs::write(dir.join(format!("log.{}", tag)), log).unwrap();
}

fn vts_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "vts"))
        .collect();
    files.sort();
    files
}

/// Radii `10 + k`, fields `-(1 + k)`
struct StubExtrapolation;
impl PotentialExtrapolation for StubExtrapolation {
    fn extrapolate(
        &self,
        request: ExtrapolationRequest<'_>,
    ) -> Result<Extrapolation, ExtrapolationError> {
        let (n_phi, n_theta) = request.br_cmb.dim();
        let dims = (n_phi * request.minc + 1, n_theta, request.nrout);
        let field = Array3::from_shape_fn(dims, |(_, _, k)| -(1. + k as f64));
        Ok(Extrapolation {
            radius: (0..request.nrout).map(|k| 10. + k as f64).collect(),
            br: field.clone(),
            btheta: field.clone(),
            bphi: field,
        })
    }
}

/// Keeps the frames in memory and writes the vts files
#[derive(Default)]
struct Recorder(std::cell::RefCell<Vec<ExportedFrame>>);
impl GridWriter for Recorder {
    fn write(&self, dir: &Path, name: &str, frame: &ExportedFrame) -> std::io::Result<PathBuf> {
        self.0.borrow_mut().push(frame.clone());
        VtsWriter.write(dir, name, frame)
    }
}

#[test]
fn export_every_frame() {
    let dir = tempfile::tempdir().unwrap();
    let movie = dir.path().join("B_3D_mov.test");
    write_movie(&movie, 3, 4);
    write_log(dir.path(), "test", 3);
    let outdir = dir.path().join("vtsFiles");
    let recorder = Recorder::default();

    let report = Movie3D::default()
        .file(&movie)
        .precision(Precision::Float64)
        .output_dir(&outdir)
        .export_with(&GlobResolver::new(dir.path()), &StubExtrapolation, &recorder)
        .unwrap();

    assert_eq!(report.frames_read, 3);
    assert_eq!(report.time, vec![0., 1., 2.]);
    let files = vts_files(&outdir);
    assert_eq!(
        files,
        vec![
            outdir.join("B3D_00000.vts"),
            outdir.join("B3D_00001.vts"),
            outdir.join("B3D_00002.vts")
        ]
    );
    for (f, frame) in recorder.0.borrow().iter().enumerate() {
        assert_eq!(frame.radius.len(), N_R_MAX);
        assert!(frame.radius.windows(2).all(|w| w[1] > w[0]));
        assert_eq!(frame.br.dim(), (N_PHI, N_THETA, N_R_MAX));
        for p in 0..N_PHI {
            for t in 0..N_THETA {
                for r in 0..N_R_MAX {
                    let raw_r = N_R_MAX - 1 - r;
                    assert_eq!(frame.br[[p, t, r]], value(f, 0, raw_r, t, p));
                    assert_eq!(frame.btheta[[p, t, r]], value(f, 1, raw_r, t, p));
                    assert_eq!(frame.bphi[[p, t, r]], value(f, 2, raw_r, t, p));
                }
            }
        }
    }
}

#[test]
fn export_with_extrapolation() {
    let dir = tempfile::tempdir().unwrap();
    let movie = dir.path().join("B_3D_mov.test");
    write_movie(&movie, 3, 4);
    let recorder = Recorder::default();

    let report = Movie3D::default()
        .file(&movie)
        .lastvar(3)
        .nvar(NVar::Count(3))
        .extrapot(true)
        .nrout(5)
        .precision(Precision::Float64)
        .output_dir(dir.path().join("out"))
        .export_with(&GlobResolver::new(dir.path()), &StubExtrapolation, &recorder)
        .unwrap();

    assert_eq!(report.artifacts.len(), 3);
    for frame in recorder.0.borrow().iter() {
        assert_eq!(frame.radius.len(), N_R_MAX + 5);
        assert_eq!(&frame.radius[N_R_MAX..], &[10., 11., 12., 13., 14.]);
        assert_eq!(frame.br.dim(), (N_PHI * MINC + 1, N_THETA, N_R_MAX + 5));
        for k in 0..5 {
            assert_eq!(frame.br[[1, 2, N_R_MAX + k]], -(1. + k as f64));
            assert_eq!(frame.bphi[[6, 0, N_R_MAX + k]], -(1. + k as f64));
        }
    }
}

#[test]
fn stride_two_of_last_four() {
    let dir = tempfile::tempdir().unwrap();
    let movie = dir.path().join("B_3D_mov.test");
    write_movie(&movie, 6, 4);
    write_log(dir.path(), "test", 6);

    let report = Movie3D::default()
        .file(&movie)
        .nvar(NVar::Count(4))
        .step(2)
        .precision(Precision::Float64)
        .output_dir(dir.path().join("out"))
        .export_with(&GlobResolver::new(dir.path()), &StubExtrapolation, &VtsWriter)
        .unwrap();

    assert_eq!(report.frames_read, 6);
    assert_eq!(report.time, vec![2., 3., 4., 5.]);
    assert_eq!(
        vts_files(&dir.path().join("out")),
        vec![
            dir.path().join("out").join("B3D_00000.vts"),
            dir.path().join("out").join("B3D_00002.vts")
        ]
    );
}

#[test]
fn existing_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let movie = dir.path().join("B_3D_mov.test");
    write_movie(&movie, 1, 4);
    let outdir = dir.path().join("out");
    fs::create_dir(&outdir).unwrap();

    let report = Movie3D::default()
        .file(&movie)
        .lastvar(1)
        .nvar(NVar::Count(1))
        .precision(Precision::Float64)
        .output_dir(&outdir)
        .export_with(&GlobResolver::new(dir.path()), &StubExtrapolation, &VtsWriter)
        .unwrap();
    assert_eq!(report.artifacts, vec![outdir.join("B3D_00000.vts")]);
}

#[test]
fn truncated_frame() {
    let dir = tempfile::tempdir().unwrap();
    let movie = dir.path().join("B_3D_mov.test");
    // frame #2 lacks its azimuthal component
    write_movie(&movie, 3, 3);
    write_log(dir.path(), "test", 3);
    let outdir = dir.path().join("out");
    let cwd = env::current_dir().unwrap();

    let err = Movie3D::default()
        .file(&movie)
        .precision(Precision::Float64)
        .output_dir(&outdir)
        .export_with(&GlobResolver::new(dir.path()), &StubExtrapolation, &VtsWriter)
        .unwrap_err();

    assert!(matches!(err, Movie3dError::Frame { index: 2, .. }));
    assert_eq!(env::current_dir().unwrap(), cwd);
    assert_eq!(vts_files(&outdir).len(), 2);
}

#[test]
fn missing_frame_count() {
    let dir = tempfile::tempdir().unwrap();
    let movie = dir.path().join("B_3D_mov.test");
    write_movie(&movie, 2, 4);
    fs::write(dir.path().join("log.test"), "! no frame written\n").unwrap();

    let err = Movie3D::default()
        .file(&movie)
        .precision(Precision::Float64)
        .output_dir(dir.path().join("out"))
        .export_with(&GlobResolver::new(dir.path()), &StubExtrapolation, &VtsWriter)
        .unwrap_err();
    assert!(matches!(err, Movie3dError::FrameCount(_)));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn resolved_candidate() {
    let dir = tempfile::tempdir().unwrap();
    write_movie(&dir.path().join("B_3D_mov.test"), 2, 4);
    write_movie(&dir.path().join("V_3D_mov.test"), 2, 4);
    write_log(dir.path(), "test", 2);
    let resolver = GlobResolver::new(dir.path()).selection(7);
    assert_eq!(
        resolver.resolve().unwrap(),
        dir.path().join("B_3D_mov.test")
    );

    let report = Movie3D::default()
        .precision(Precision::Float64)
        .output_dir(dir.path().join("out"))
        .prefix("V3D")
        .export_with(
            &GlobResolver::new(dir.path()).selection(2),
            &StubExtrapolation,
            &VtsWriter,
        )
        .unwrap();
    assert_eq!(
        report.artifacts,
        vec![
            dir.path().join("out").join("V3D_00000.vts"),
            dir.path().join("out").join("V3D_00001.vts")
        ]
    );
}
