//! Pairwise self-identity reader.
//!
//! Seven tab-separated columns: `query query_st query_end ref ref_st ref_end
//! percent_identity_by_events`.

use std::path::Path;

use super::{LineError, ReadError, contig_offset, data_rows, is_header, parse_coord, read_with};
use crate::model::IdentityRecord;

const COLUMNS: usize = 7;

pub fn parse_identity(text: &str) -> Result<Vec<IdentityRecord>, LineError> {
    let mut records = Vec::new();
    for (n, (line, fields)) in data_rows(text).enumerate() {
        if n == 0 && is_header(&fields, 1) {
            continue;
        }
        if fields.len() < COLUMNS {
            return Err(LineError::new(
                line,
                format!("expected {COLUMNS} columns, found {}", fields.len()),
            ));
        }
        let query = fields[0].trim().to_string();
        let reference = fields[3].trim().to_string();
        let q_off = contig_offset(&query);
        let r_off = contig_offset(&reference);
        let identity: f64 = fields[6]
            .trim()
            .parse()
            .map_err(|_| LineError::new(line, format!("invalid identity: {:?}", fields[6])))?;
        records.push(IdentityRecord {
            query_start: parse_coord(&fields, 1, line, "query start")? - q_off,
            query_end: parse_coord(&fields, 2, line, "query end")? - q_off,
            ref_start: parse_coord(&fields, 4, line, "reference start")? - r_off,
            ref_end: parse_coord(&fields, 5, line, "reference end")? - r_off,
            query,
            reference,
            identity,
        });
    }
    Ok(records)
}

pub fn read_identity(path: &Path) -> Result<Vec<IdentityRecord>, ReadError> {
    let records = read_with(path, parse_identity)?;
    log::debug!("{}: {} identity rows", path.display(), records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_and_shifts_coordinates() {
        let text = "\
#query\tquery_st\tquery_end\tref\tref_st\tref_end\tperc_id_by_events
chr1:100-400\t100\t200\tchr1:100-400\t200\t300\t99.5
";
        let records = parse_identity(text).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!((r.query_start, r.query_end), (0, 100));
        assert_eq!((r.ref_start, r.ref_end), (100, 200));
        assert_eq!(r.identity, 99.5);
    }

    #[test]
    fn header_without_hash_is_skipped() {
        let text = "query\tqs\tqe\tref\trs\tre\tid\nc\t0\t5\tc\t0\t5\t100\n";
        assert_eq!(parse_identity(text).unwrap().len(), 1);
    }

    #[test]
    fn short_rows_are_rejected() {
        let err = parse_identity("c\t0\t5\tc\t0\t5\n").unwrap_err();
        assert_eq!(err.line, 1);
    }
}
