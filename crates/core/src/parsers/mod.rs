//! Readers for the tabular inputs and the track file.

pub mod bed;
pub mod identity;
pub mod tracks;

use std::path::{Path, PathBuf};

use thiserror::Error;

/// A malformed row.
#[derive(Debug, Error, PartialEq)]
#[error("line {line}: {msg}")]
pub struct LineError {
    pub line: usize,
    pub msg: String,
}

impl LineError {
    fn new(line: usize, msg: impl Into<String>) -> Self {
        Self {
            line,
            msg: msg.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("{}: file does not exist", path.display())]
    Missing { path: PathBuf },
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: LineError,
    },
}

/// Read a whole file, mapping a missing file to [`ReadError::Missing`].
pub fn read_text(path: &Path) -> Result<String, ReadError> {
    if !path.exists() {
        return Err(ReadError::Missing {
            path: path.to_path_buf(),
        });
    }
    std::fs::read_to_string(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a file with one of the text parsers below.
fn read_with<T>(
    path: &Path,
    parse: impl FnOnce(&str) -> Result<T, LineError>,
) -> Result<T, ReadError> {
    let text = read_text(path)?;
    parse(&text).map_err(|source| ReadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Tab-separated data rows with 1-based line numbers. Blank lines, `#`
/// comments and UCSC `track`/`browser` lines are skipped.
fn data_rows(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    text.lines().enumerate().filter_map(|(i, line)| {
        let line = line.trim_end_matches('\r');
        let skip = line.trim().is_empty()
            || line.starts_with('#')
            || line.starts_with("track")
            || line.starts_with("browser");
        (!skip).then(|| (i + 1, line.split('\t').collect()))
    })
}

/// Whether the first row is a header: its coordinate column is not numeric.
fn is_header(fields: &[&str], coord_col: usize) -> bool {
    fields
        .get(coord_col)
        .is_some_and(|f| f.trim().parse::<i64>().is_err())
}

fn parse_coord(fields: &[&str], col: usize, line: usize, what: &str) -> Result<i64, LineError> {
    let field = fields
        .get(col)
        .ok_or_else(|| LineError::new(line, format!("missing {what} column")))?;
    field
        .trim()
        .parse()
        .map_err(|_| LineError::new(line, format!("invalid {what}: {field:?}")))
}

/// Start of a `name:START-END` contig, or 0.
pub fn contig_offset(name: &str) -> i64 {
    let Some((_, range)) = name.rsplit_once(':') else {
        return 0;
    };
    let Some((start, end)) = range.split_once('-') else {
        return 0;
    };
    match (start.parse::<i64>(), end.parse::<i64>()) {
        (Ok(start), Ok(_)) => start,
        _ => 0,
    }
}

/// First `chr` followed by digits, `X` or `Y` inside `name`.
pub fn short_chrom_name(name: &str) -> Option<String> {
    name.match_indices("chr").find_map(|(at, _)| {
        let rest = &name[at + 3..];
        let len = rest
            .bytes()
            .take_while(|b| b.is_ascii_digit() || *b == b'X' || *b == b'Y')
            .count();
        (len > 0).then(|| name[at..at + 3 + len].to_string())
    })
}
