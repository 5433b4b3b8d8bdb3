//! Orientation blocks from same-strand runs.

use std::collections::HashMap;

use crate::interval::{Interval, merge_with};
use crate::model::{BedRecord, HorRecord, Strand, StrandBlock};

/// An oriented interval entering the merge.
#[derive(Debug, Clone, PartialEq)]
pub struct StrandSpan {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
}

impl From<&BedRecord> for StrandSpan {
    fn from(r: &BedRecord) -> Self {
        StrandSpan {
            chrom: r.chrom.clone(),
            start: r.start,
            end: r.end,
            strand: r.strand,
        }
    }
}

impl From<&HorRecord> for StrandSpan {
    fn from(h: &HorRecord) -> Self {
        StrandSpan::from(&h.record)
    }
}

/// `(units, unit_bp)` carried through a merge.
type UnitStats = (usize, i64);

type Row = (String, Strand, Interval<UnitStats>);

fn merge_grouped(rows: impl IntoIterator<Item = Row>, dst_merge: u32) -> Vec<StrandBlock> {
    let mut index: HashMap<(String, Strand), usize> = HashMap::new();
    let mut groups: Vec<((String, Strand), Vec<Interval<UnitStats>>)> = Vec::new();
    for (chrom, strand, iv) in rows {
        let key = (chrom, strand);
        let slot = match index.get(&key) {
            Some(slot) => *slot,
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, Vec::new()));
                groups.len() - 1
            }
        };
        groups[slot].1.push(iv);
    }

    let mut blocks: Vec<StrandBlock> = Vec::new();
    for ((chrom, strand), intervals) in groups {
        let merged = merge_with(intervals, dst_merge, |acc, (units, bp)| {
            acc.0 += units;
            acc.1 += bp;
        });
        blocks.extend(merged.into_iter().map(|m| StrandBlock {
            chrom: chrom.clone(),
            start: m.start,
            end: m.end,
            strand,
            units: m.data.0,
            unit_bp: m.data.1,
        }));
    }
    blocks.sort_by_key(|b| b.start);
    blocks
}

/// Merge same-strand intervals lying within `2 * dst_merge` of each other.
///
/// Intervals are grouped by `(chrom, strand)`; the output is sorted by start.
pub fn merge_strand_runs<I>(spans: I, dst_merge: u32) -> Vec<StrandBlock>
where
    I: IntoIterator<Item = StrandSpan>,
{
    merge_grouped(
        spans.into_iter().map(|s| {
            let len = s.end - s.start;
            (s.chrom, s.strand, Interval::new(s.start, s.end, (1, len)))
        }),
        dst_merge,
    )
}

/// Thresholds for grouping orientation blocks into arrays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrayThresholds {
    pub merge_dst: u32,
    pub min_units: usize,
    pub min_len: i64,
    /// Minimum fraction of the array covered by repeat units.
    pub min_prop: f64,
}

impl ArrayThresholds {
    pub fn accepts(&self, block: &StrandBlock) -> bool {
        let len = block.len();
        let prop = if len > 0 {
            (block.unit_bp as f64 / len as f64).min(1.0)
        } else {
            0.0
        };
        block.units >= self.min_units && len >= self.min_len && prop >= self.min_prop
    }
}

/// Second-pass merge of orientation blocks into arrays.
///
/// Unit counts and covered length accumulate across merged blocks; a
/// candidate array failing any threshold is dropped.
pub fn merge_arrays(blocks: &[StrandBlock], thresholds: &ArrayThresholds) -> Vec<StrandBlock> {
    let candidates = merge_grouped(
        blocks.iter().map(|b| {
            (
                b.chrom.clone(),
                b.strand,
                Interval::new(b.start, b.end, (b.units, b.unit_bp)),
            )
        }),
        thresholds.merge_dst,
    );
    let total = candidates.len();
    let arrays: Vec<StrandBlock> = candidates
        .into_iter()
        .filter(|c| thresholds.accepts(c))
        .collect();
    if arrays.len() < total {
        log::debug!(
            "dropped {} of {total} candidate arrays below thresholds",
            total - arrays.len()
        );
    }
    arrays
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(chrom: &str, start: i64, end: i64, strand: Strand) -> StrandSpan {
        StrandSpan {
            chrom: chrom.into(),
            start,
            end,
            strand,
        }
    }

    fn coords(blocks: &[StrandBlock]) -> Vec<(i64, i64, Strand)> {
        blocks.iter().map(|b| (b.start, b.end, b.strand)).collect()
    }

    #[test]
    fn merges_per_strand_and_sorts_by_start() {
        let spans = vec![
            span("c", 1_000, 1_170, Strand::Reverse),
            span("c", 0, 170, Strand::Forward),
            span("c", 200, 370, Strand::Forward),
            span("c", 1_200, 1_370, Strand::Reverse),
            span("c", 50_000, 50_170, Strand::Forward),
        ];
        let blocks = merge_strand_runs(spans, 100);
        assert_eq!(
            coords(&blocks),
            vec![
                (0, 370, Strand::Forward),
                (1_000, 1_370, Strand::Reverse),
                (50_000, 50_170, Strand::Forward),
            ]
        );
        assert_eq!(blocks[0].units, 2);
        assert_eq!(blocks[0].unit_bp, 340);
    }

    #[test]
    fn contigs_never_merge() {
        let spans = vec![span("a", 0, 100, Strand::Forward), span("b", 50, 150, Strand::Forward)];
        assert_eq!(merge_strand_runs(spans, 1_000).len(), 2);
    }

    #[test]
    fn merge_is_idempotent() {
        let spans = vec![
            span("c", 0, 170, Strand::Forward),
            span("c", 300, 470, Strand::Forward),
            span("c", 400_000, 400_170, Strand::Reverse),
        ];
        let once = merge_strand_runs(spans, 100_000);
        let again = merge_strand_runs(
            once.iter().map(|b| span(&b.chrom, b.start, b.end, b.strand)),
            100_000,
        );
        assert_eq!(coords(&once), coords(&again));
    }

    #[test]
    fn arrays_respect_thresholds() {
        let forward: Vec<StrandSpan> = (0..12)
            .map(|i| span("c", i * 3_000, i * 3_000 + 2_900, Strand::Forward))
            .collect();
        let blocks = merge_strand_runs(
            forward
                .into_iter()
                .chain([span("c", 200_000, 201_000, Strand::Forward)]),
            0,
        );
        assert_eq!(blocks.len(), 13);

        let thresholds = ArrayThresholds {
            merge_dst: 8_000,
            min_units: 10,
            min_len: 30_000,
            min_prop: 0.9,
        };
        let arrays = merge_arrays(&blocks, &thresholds);
        assert_eq!(arrays.len(), 1);
        assert_eq!((arrays[0].start, arrays[0].end), (0, 35_900));
        assert_eq!(arrays[0].units, 12);
    }
}
