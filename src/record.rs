//! Sequential binary records
//!
//! Movie files are written as Fortran unformatted sequential records: every
//! payload is framed by its byte count, stored as a big-endian `u32`, before
//! and after the payload. All scalars are big-endian floats whose width is
//! given by [Precision].

use std::io::{self, BufRead, Read, Write};

use serde::Serialize;
use strum_macros::{Display, EnumString};

/// Length in bytes of the version and run identifier tags
pub const TAG_LEN: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("stream exhausted while reading {0}")]
    StreamExhausted(&'static str),
    #[error("{what}: expected {expected} bytes, record holds {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("{what}: record markers disagree ({head} vs {tail} bytes)")]
    Framing {
        what: &'static str,
        head: u32,
        tail: u32,
    },
    #[error("{what}: {n} scalars do not fit in a record")]
    Oversized { what: &'static str, n: usize },
    #[error("failed to read {1}")]
    Io(#[source] io::Error, &'static str),
}
type Result<T> = std::result::Result<T, RecordError>;

/// Floating point width of the movie scalars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, Serialize)]
pub enum Precision {
    #[default]
    #[strum(to_string = "Float32", serialize = "f32", serialize = "single")]
    Float32,
    #[strum(to_string = "Float64", serialize = "f64", serialize = "double")]
    Float64,
}
impl Precision {
    /// Number of bytes per scalar
    pub fn width(&self) -> usize {
        match self {
            Precision::Float32 => 4,
            Precision::Float64 => 8,
        }
    }
    /// Decodes big-endian scalars, `bytes` length must be a multiple of the width
    pub fn decode(&self, bytes: &[u8]) -> Vec<f64> {
        match self {
            Precision::Float32 => bytes
                .chunks_exact(4)
                .map(|b| f32::from_be_bytes([b[0], b[1], b[2], b[3]]) as f64)
                .collect(),
            Precision::Float64 => bytes
                .chunks_exact(8)
                .map(|b| f64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
                .collect(),
        }
    }
    /// Encodes scalars as big-endian bytes
    pub fn encode(&self, values: &[f64]) -> Vec<u8> {
        match self {
            Precision::Float32 => values
                .iter()
                .flat_map(|&v| (v as f32).to_be_bytes())
                .collect(),
            Precision::Float64 => values.iter().flat_map(|v| v.to_be_bytes()).collect(),
        }
    }
}

/// Sequential record source
///
/// Only [RecordRead::next_record] must be provided, the typed reads are built
/// on top of it and check the record length against what the caller expects.
pub trait RecordRead {
    /// Returns the next record payload
    ///
    /// When `expected` is given, a record of any other byte count is a
    /// [RecordError::ShapeMismatch] and its payload is not read.
    fn next_record(&mut self, what: &'static str, expected: Option<usize>) -> Result<Vec<u8>>;

    /// Reads a fixed length text tag, trailing blanks and NULs are removed
    fn read_tag(&mut self, what: &'static str) -> Result<String> {
        let payload = self.next_record(what, Some(TAG_LEN))?;
        Ok(String::from_utf8_lossy(&payload)
            .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
            .to_string())
    }
    /// Reads exactly `n` scalars
    fn read_scalars(&mut self, what: &'static str, precision: Precision, n: usize) -> Result<Vec<f64>> {
        let payload = self.next_record(what, Some(byte_len(what, precision, n)?))?;
        Ok(precision.decode(&payload))
    }
    /// Reads a record of any number of scalars
    fn read_vec(&mut self, what: &'static str, precision: Precision) -> Result<Vec<f64>> {
        let payload = self.next_record(what, None)?;
        if payload.len() % precision.width() != 0 {
            return Err(RecordError::ShapeMismatch {
                what,
                expected: (payload.len() / precision.width() + 1) * precision.width(),
                found: payload.len(),
            });
        }
        Ok(precision.decode(&payload))
    }
    /// Consumes a record of `n` scalars without decoding it
    fn skip_scalars(&mut self, what: &'static str, precision: Precision, n: usize) -> Result<()> {
        self.next_record(what, Some(byte_len(what, precision, n)?))?;
        Ok(())
    }
}

/// Byte count of `n` scalars, which must fit in a record marker
fn byte_len(what: &'static str, precision: Precision, n: usize) -> Result<usize> {
    n.checked_mul(precision.width())
        .filter(|&len| u32::try_from(len).is_ok())
        .ok_or(RecordError::Oversized { what, n })
}

/// Fortran unformatted sequential record reader
pub struct FortranReader<R> {
    inner: R,
    n_record: usize,
}
impl<R: BufRead> FortranReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, n_record: 0 }
    }
    /// Number of records read so far
    pub fn n_record(&self) -> usize {
        self.n_record
    }
    fn read_marker(&mut self, what: &'static str) -> Result<u32> {
        let mut marker = [0u8; 4];
        self.inner.read_exact(&mut marker).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => RecordError::StreamExhausted(what),
            _ => RecordError::Io(e, what),
        })?;
        Ok(u32::from_be_bytes(marker))
    }
}
impl<R: BufRead> RecordRead for FortranReader<R> {
    fn next_record(&mut self, what: &'static str, expected: Option<usize>) -> Result<Vec<u8>> {
        let head = self.read_marker(what)?;
        let len = head as usize;
        if let Some(expected) = expected {
            if len != expected {
                return Err(RecordError::ShapeMismatch {
                    what,
                    expected,
                    found: len,
                });
            }
        }
        // the payload grows with the bytes actually read, never with the marker
        let mut payload = Vec::new();
        Read::take(&mut self.inner, head as u64)
            .read_to_end(&mut payload)
            .map_err(|e| RecordError::Io(e, what))?;
        if payload.len() != len {
            return Err(RecordError::StreamExhausted(what));
        }
        let tail = self.read_marker(what)?;
        if head != tail {
            return Err(RecordError::Framing { what, head, tail });
        }
        self.n_record += 1;
        Ok(payload)
    }
}

/// Fortran unformatted sequential record writer
///
/// Produces streams [FortranReader] can read back, e.g. synthetic movies.
pub struct FortranWriter<W> {
    inner: W,
}
impl<W: Write> FortranWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
    pub fn write_record(&mut self, payload: &[u8]) -> io::Result<()> {
        let marker = (payload.len() as u32).to_be_bytes();
        self.inner.write_all(&marker)?;
        self.inner.write_all(payload)?;
        self.inner.write_all(&marker)
    }
    /// Writes a text tag blank padded (or truncated) to [TAG_LEN] bytes
    pub fn write_tag(&mut self, tag: &str) -> io::Result<()> {
        let mut payload = vec![b' '; TAG_LEN];
        tag.bytes()
            .take(TAG_LEN)
            .enumerate()
            .for_each(|(i, b)| payload[i] = b);
        self.write_record(&payload)
    }
    pub fn write_scalars(&mut self, precision: Precision, values: &[f64]) -> io::Result<()> {
        self.write_record(&precision.encode(values))
    }
    pub fn into_inner(self) -> W {
        self.inner
    }
}
