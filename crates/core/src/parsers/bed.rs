//! BED9 reader.
//!
//! Columns: `chrom start end [name score strand thick_start thick_end item_rgb]`.
//! Missing trailing columns take defaults. Contigs named `name:START-END` are
//! shifted so coordinates are relative to `START`.

use std::path::Path;

use cenplot_protocol::Color;

use super::{
    LineError, ReadError, contig_offset, data_rows, is_header, parse_coord, read_with,
    short_chrom_name,
};
use crate::model::{BedRecord, Strand, ValueRecord};

const NAME_COL: usize = 3;
const SCORE_COL: usize = 4;
const STRAND_COL: usize = 5;
const ITEM_RGB_COL: usize = 8;

/// Name used when the column is absent.
pub const NO_NAME: &str = "-";

fn item_rgb(field: &str) -> Option<Color> {
    match field.trim() {
        "" | "." | "0" => None,
        other => Color::from_item_rgb(other).ok(),
    }
}

/// Parse BED9 text. A header line is skipped when its start column is not
/// numeric. Rows come back sorted by start.
pub fn parse_bed9(text: &str) -> Result<Vec<BedRecord>, LineError> {
    let mut records = Vec::new();
    for (n, (line, fields)) in data_rows(text).enumerate() {
        if n == 0 && is_header(&fields, 1) {
            log::debug!("skipping BED header on line {line}");
            continue;
        }
        let chrom = fields[0].trim().to_string();
        let offset = contig_offset(&chrom);
        let start = parse_coord(&fields, 1, line, "start")?;
        let end = parse_coord(&fields, 2, line, "end")?;
        let field = |col: usize| fields.get(col).map(|f| f.trim()).filter(|f| !f.is_empty());

        records.push(BedRecord {
            chrom_name: short_chrom_name(&chrom),
            chrom,
            start: start - offset,
            end: end - offset,
            name: field(NAME_COL).unwrap_or(NO_NAME).to_string(),
            score: field(SCORE_COL).and_then(|s| s.parse().ok()),
            strand: field(STRAND_COL).map(Strand::from_field).unwrap_or_default(),
            item_rgb: field(ITEM_RGB_COL).and_then(item_rgb),
        });
    }
    records.sort_by_key(|r| r.start);
    Ok(records)
}

/// Parse BED rows whose fourth column is a number (Bar/Line tracks).
pub fn parse_values(text: &str) -> Result<Vec<ValueRecord>, LineError> {
    let mut values = Vec::new();
    for (n, (line, fields)) in data_rows(text).enumerate() {
        if n == 0 && is_header(&fields, 1) {
            continue;
        }
        let chrom = fields[0].trim().to_string();
        let offset = contig_offset(&chrom);
        let start = parse_coord(&fields, 1, line, "start")?;
        let end = parse_coord(&fields, 2, line, "end")?;
        let raw = fields
            .get(NAME_COL)
            .ok_or_else(|| LineError::new(line, "missing value column"))?;
        let value: f64 = raw
            .trim()
            .parse()
            .map_err(|_| LineError::new(line, format!("invalid value: {raw:?}")))?;
        values.push(ValueRecord {
            chrom,
            start: start - offset,
            end: end - offset,
            value,
        });
    }
    values.sort_by_key(|v| v.start);
    Ok(values)
}

pub fn read_bed9(path: &Path) -> Result<Vec<BedRecord>, ReadError> {
    let records = read_with(path, parse_bed9)?;
    log::debug!("{}: {} BED rows", path.display(), records.len());
    Ok(records)
}

pub fn read_values(path: &Path) -> Result<Vec<ValueRecord>, ReadError> {
    read_with(path, parse_values)
}
