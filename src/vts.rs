//! VTK XML structured grid (`.vts`) files
//!
//! Points run over the radius first, then the colatitude and the azimuth,
//! matching the `(φ,θ,r)` layout of [ExportedFrame] fields. Besides the
//! spherical components, the Cartesian vector `B` is written for glyphs and
//! stream lines.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::export::{ExportedFrame, GridWriter};

/// ASCII `.vts` writer
#[derive(Debug, Default, Clone, Copy)]
pub struct VtsWriter;
impl GridWriter for VtsWriter {
    fn write(&self, dir: &Path, name: &str, frame: &ExportedFrame) -> io::Result<PathBuf> {
        let path = dir.join(format!("{}.vts", name));
        let mut out = BufWriter::new(File::create(&path)?);
        write_vts(&mut out, frame)?;
        out.flush()?;
        Ok(path)
    }
}

fn data_array<W: Write>(
    out: &mut W,
    name: Option<&str>,
    n_component: usize,
    values: impl Iterator<Item = f64>,
) -> io::Result<()> {
    match name {
        Some(name) => writeln!(
            out,
            r#"        <DataArray type="Float32" Name="{}" NumberOfComponents="{}" format="ascii">"#,
            name, n_component
        )?,
        None => writeln!(
            out,
            r#"        <DataArray type="Float32" NumberOfComponents="{}" format="ascii">"#,
            n_component
        )?,
    }
    for (i, value) in values.enumerate() {
        let sep = if (i + 1) % n_component == 0 { '\n' } else { ' ' };
        write!(out, "{:e}{}", value as f32, sep)?;
    }
    writeln!(out, "        </DataArray>")
}

/// Writes a frame as a VTK XML structured grid
pub fn write_vts<W: Write>(out: &mut W, frame: &ExportedFrame) -> io::Result<()> {
    let (n_phi, n_theta, n_r) = frame.br.dim();
    if frame.br.is_empty()
        || frame.btheta.dim() != frame.br.dim()
        || frame.bphi.dim() != frame.br.dim()
        || frame.phi.len() != n_phi
        || frame.theta.len() != n_theta
        || frame.radius.len() != n_r
    {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "frame #{}: coordinates ({},{},{}) do not match fields {:?}",
                frame.index,
                frame.phi.len(),
                frame.theta.len(),
                frame.radius.len(),
                frame.br.dim()
            ),
        ));
    }
    let points = || {
        (0..n_phi).flat_map(move |p| {
            (0..n_theta).flat_map(move |t| (0..n_r).map(move |r| (p, t, r)))
        })
    };
    let extent = format!("0 {} 0 {} 0 {}", n_r - 1, n_theta - 1, n_phi - 1);

    writeln!(out, r#"<?xml version="1.0"?>"#)?;
    writeln!(
        out,
        r#"<VTKFile type="StructuredGrid" version="0.1" byte_order="LittleEndian">"#
    )?;
    writeln!(out, r#"  <StructuredGrid WholeExtent="{}">"#, extent)?;
    writeln!(out, r#"    <Piece Extent="{}">"#, extent)?;
    writeln!(out, r#"      <PointData Scalars="Br" Vectors="B">"#)?;
    data_array(out, Some("Br"), 1, frame.br.iter().copied())?;
    data_array(out, Some("Btheta"), 1, frame.btheta.iter().copied())?;
    data_array(out, Some("Bphi"), 1, frame.bphi.iter().copied())?;
    data_array(
        out,
        Some("B"),
        3,
        points().flat_map(|(p, t, r)| {
            let (st, ct) = frame.theta[t].sin_cos();
            let (sp, cp) = frame.phi[p].sin_cos();
            let (br, bt, bp) = (
                frame.br[[p, t, r]],
                frame.btheta[[p, t, r]],
                frame.bphi[[p, t, r]],
            );
            [
                br * st * cp + bt * ct * cp - bp * sp,
                br * st * sp + bt * ct * sp + bp * cp,
                br * ct - bt * st,
            ]
        }),
    )?;
    writeln!(out, "      </PointData>")?;
    writeln!(out, "      <Points>")?;
    data_array(
        out,
        None,
        3,
        points().flat_map(|(p, t, r)| {
            let (st, ct) = frame.theta[t].sin_cos();
            let (sp, cp) = frame.phi[p].sin_cos();
            let rad = frame.radius[r];
            [rad * st * cp, rad * st * sp, rad * ct]
        }),
    )?;
    writeln!(out, "      </Points>")?;
    writeln!(out, "    </Piece>")?;
    writeln!(out, "  </StructuredGrid>")?;
    writeln!(out, "</VTKFile>")
}
