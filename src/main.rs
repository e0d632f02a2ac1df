use std::path::PathBuf;

use movie3d::{Movie3D, NVar, Precision};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "movie3d",
    about = "Converts 3D movie files into VTS files for ParaView"
)]
struct Opt {
    /// Movie file, chosen among the *_mov.* files of the current directory if not given
    #[structopt(long)]
    file: Option<PathBuf>,
    /// Index (from 1) of the movie to choose when no file is given
    #[structopt(long, default_value = "1")]
    select: usize,
    /// Stepping between two exported frames
    #[structopt(short, long, default_value = "1")]
    step: usize,
    /// Number of the last frame to read, the simulation log gives it if not set
    #[structopt(long)]
    lastvar: Option<usize>,
    /// Number of frames to process, counted back from the last one, or "all"
    #[structopt(long, default_value = "all")]
    nvar: NVar,
    /// Number of radii of the potential field extrapolation
    #[structopt(long, default_value = "48")]
    nrout: usize,
    /// Ratio of the outermost extrapolation radius to the outer boundary radius
    #[structopt(long, default_value = "2")]
    ratio_out: f64,
    /// Extrapolates a potential field outside the fluid shell
    #[structopt(long)]
    extrapot: bool,
    /// Movie floating point precision: Float32 or Float64
    #[structopt(short, long, default_value = "Float32")]
    precision: Precision,
    /// Output directory
    #[structopt(short, long, default_value = "vtsFiles")]
    outdir: PathBuf,
    /// Output file name prefix
    #[structopt(long, default_value = "B3D")]
    prefix: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();
    log::debug!("{:?}", opt);

    let mut movie = Movie3D::default()
        .selection(opt.select)
        .step(opt.step)
        .nvar(opt.nvar)
        .nrout(opt.nrout)
        .ratio_out(opt.ratio_out)
        .extrapot(opt.extrapot)
        .precision(opt.precision)
        .output_dir(opt.outdir)
        .prefix(opt.prefix);
    if let Some(arg) = opt.file {
        movie = movie.file(arg);
    }
    if let Some(arg) = opt.lastvar {
        movie = movie.lastvar(arg);
    }

    let report = movie.export()?;
    report.summary();

    Ok(())
}
