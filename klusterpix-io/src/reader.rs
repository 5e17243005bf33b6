//! Pixelman ASCII frame and mask readers.
//!
//! Three text layouts are understood, told apart by the first line:
//!
//! - `[X, C]`: `key\tcount` per line, with `key = cols * y + x`;
//! - `[x, y, C]`: `x\ty\tcount` per line (an empty file is an empty frame);
//! - `Matrix`: one line per row, one space-separated count per column.

use crate::{Error, Result};
use klusterpix_core::{FrameGeometry, HitMap, Mask};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// First line of a detector-settings file, which carries no pixel data.
const DSC_HEADER: &str = "A000000001";

/// ASCII frame layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameFormat {
    /// Linear pixel key and count.
    KeyCount,
    /// Column, row and count.
    CoordinateCount,
    /// Dense matrix of counts.
    Matrix,
}

impl FrameFormat {
    /// Name used by the acquisition software.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::KeyCount => "[X, C]",
            Self::CoordinateCount => "[x, y, C]",
            Self::Matrix => "ASCII Matrix",
        }
    }

    /// Detects the layout from the first line of a file.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] if the line matches no layout.
    pub fn detect(first_line: &str, geometry: FrameGeometry) -> Result<Self> {
        let line = first_line.trim();
        if line.is_empty() {
            return Ok(Self::CoordinateCount);
        }
        if line == DSC_HEADER {
            return Err(Error::InvalidFormat("detector settings file, not frame data".to_string()));
        }

        if line.contains('\t') {
            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
            if fields.iter().all(|f| f.parse::<u32>().is_ok()) {
                match fields.len() {
                    2 => return Ok(Self::KeyCount),
                    3 => return Ok(Self::CoordinateCount),
                    n => {
                        return Err(Error::InvalidFormat(format!(
                            "{n} tab-separated values on the first line"
                        )))
                    }
                }
            }
        }

        let values: Vec<&str> = line.split_whitespace().collect();
        if values.len() == usize::from(geometry.cols())
            && values.iter().all(|v| v.parse::<u32>().is_ok())
        {
            return Ok(Self::Matrix);
        }

        Err(Error::InvalidFormat(format!("unrecognised first line: {line:?}")))
    }
}

impl fmt::Display for FrameFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reader for a single ASCII frame file.
///
/// The file is read once on [`AsciiFrameReader::open`]; parsing happens in
/// [`AsciiFrameReader::read_hits`].
#[derive(Debug)]
pub struct AsciiFrameReader {
    path: PathBuf,
    contents: String,
    format: FrameFormat,
    geometry: FrameGeometry,
}

impl AsciiFrameReader {
    /// Opens a frame file and detects its layout.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or its layout is not recognised.
    pub fn open<P: AsRef<Path>>(path: P, geometry: FrameGeometry) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let contents = fs::read_to_string(&path)?;
        let first_line = contents.lines().next().unwrap_or("");
        let format = FrameFormat::detect(first_line, geometry).map_err(|err| match err {
            Error::InvalidFormat(msg) => Error::InvalidFormat(format!("{}: {msg}", path.display())),
            other => other,
        })?;
        log::debug!("{}: {} frame", path.display(), format);
        Ok(Self {
            path,
            contents,
            format,
            geometry,
        })
    }

    /// Path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Detected layout.
    #[must_use]
    pub fn format(&self) -> FrameFormat {
        self.format
    }

    /// Frame geometry used for parsing.
    #[must_use]
    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    /// Parses the file into a hit map.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] naming the offending line for
    /// malformed values or coordinates outside the frame.
    pub fn read_hits(&self) -> Result<HitMap> {
        parse_frame(&self.contents, self.format, self.geometry).map_err(|err| match err {
            Error::InvalidFormat(msg) => {
                Error::InvalidFormat(format!("{}: {msg}", self.path.display()))
            }
            other => other,
        })
    }
}

/// Reads a frame file of any supported layout.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn read_frame<P: AsRef<Path>>(path: P, geometry: FrameGeometry) -> Result<HitMap> {
    AsciiFrameReader::open(path, geometry)?.read_hits()
}

/// Parses frame text in a known layout.
///
/// Blank lines are skipped with a warning. A pixel listed twice keeps its
/// last count. Matrix zeros are not hits.
///
/// # Errors
/// Returns [`Error::InvalidFormat`] naming the offending line.
pub fn parse_frame(
    contents: &str,
    format: FrameFormat,
    geometry: FrameGeometry,
) -> Result<HitMap> {
    let mut hits = HitMap::new(geometry);
    let mut matrix_row = 0u32;

    for (index, line) in contents.lines().enumerate() {
        let line_no = index + 1;
        let line = line.trim();
        if line.is_empty() {
            log::warn!("line {line_no}: blank line skipped");
            continue;
        }

        match format {
            FrameFormat::KeyCount => {
                let [key, count] = parse_fields::<2>(line, line_no)?;
                let previous = hits
                    .insert(key, count)
                    .map_err(|err| out_of_frame(line_no, &err))?;
                warn_duplicate(previous, line_no);
            }
            FrameFormat::CoordinateCount => {
                let [x, y, count] = parse_fields::<3>(line, line_no)?;
                let previous = hits
                    .insert_xy(x, y, count)
                    .map_err(|err| out_of_frame(line_no, &err))?;
                warn_duplicate(previous, line_no);
            }
            FrameFormat::Matrix => {
                if matrix_row >= u32::from(geometry.rows()) {
                    return Err(Error::InvalidFormat(format!(
                        "line {line_no}: more than {} matrix rows",
                        geometry.rows()
                    )));
                }
                let values: Vec<&str> = line.split_whitespace().collect();
                if values.len() != usize::from(geometry.cols()) {
                    return Err(Error::InvalidFormat(format!(
                        "line {line_no}: expected {} values, found {}",
                        geometry.cols(),
                        values.len()
                    )));
                }
                for (x, value) in (0u32..).zip(values) {
                    let count = parse_value(value, line_no)?;
                    if count > 0 {
                        hits.insert_xy(x, matrix_row, count)
                            .map_err(|err| out_of_frame(line_no, &err))?;
                    }
                }
                matrix_row += 1;
            }
        }
    }

    log::debug!("parsed {} hit pixel(s) from {} layout", hits.len(), format);
    Ok(hits)
}

/// Reads a mask file of `x\ty` lines (any whitespace separates).
///
/// # Errors
/// Returns [`Error::InvalidFormat`] for malformed lines or coordinates
/// outside the frame.
pub fn read_mask<P: AsRef<Path>>(path: P, geometry: FrameGeometry) -> Result<Mask> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let mask = parse_mask(&contents, geometry).map_err(|err| match err {
        Error::InvalidFormat(msg) => Error::InvalidFormat(format!("{}: {msg}", path.display())),
        other => other,
    })?;
    log::debug!("{}: {} masked pixel(s)", path.display(), mask.len());
    Ok(mask)
}

/// Parses mask text of `x y` lines.
///
/// # Errors
/// Returns [`Error::InvalidFormat`] naming the offending line.
pub fn parse_mask(contents: &str, geometry: FrameGeometry) -> Result<Mask> {
    let mut mask = Mask::new();
    for (index, line) in contents.lines().enumerate() {
        let line_no = index + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let [x, y] = parse_fields::<2>(line, line_no)?;
        let key = geometry.key(x, y).map_err(|err| out_of_frame(line_no, &err))?;
        mask.insert(key);
    }
    Ok(mask)
}

fn parse_fields<const N: usize>(line: &str, line_no: usize) -> Result<[u32; N]> {
    let mut fields = [0u32; N];
    let mut values = line.split_whitespace();
    for field in &mut fields {
        let value = values
            .next()
            .ok_or_else(|| Error::InvalidFormat(format!("line {line_no}: expected {N} values")))?;
        *field = parse_value(value, line_no)?;
    }
    if values.next().is_some() {
        return Err(Error::InvalidFormat(format!("line {line_no}: expected {N} values")));
    }
    Ok(fields)
}

fn parse_value(value: &str, line_no: usize) -> Result<u32> {
    value
        .parse()
        .map_err(|_| Error::InvalidFormat(format!("line {line_no}: invalid value {value:?}")))
}

fn out_of_frame(line_no: usize, err: &klusterpix_core::Error) -> Error {
    Error::InvalidFormat(format!("line {line_no}: {err}"))
}

fn warn_duplicate(previous: Option<u32>, line_no: usize) {
    if previous.is_some() {
        log::warn!("line {line_no}: pixel listed twice, keeping the later count");
    }
}
