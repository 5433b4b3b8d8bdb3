//! Self-identity matrix to diamond tessellation.
//!
//! A contig compared against itself in fixed windows yields an
//! upper-triangular identity matrix. Rotating it 45 degrees turns every cell
//! into a diamond whose centre is `(first + second, second - first)` in
//! window units, so the diagonal lands on `y = 0`. Diamonds are then scaled
//! back onto the genomic axis so the plot lines up with the other tracks.

use std::collections::HashMap;
use std::f64::consts::FRAC_1_SQRT_2;

use cenplot_protocol::{Color, Point};
use thiserror::Error;

use crate::colors::{IDENTITY_BUCKETS, identity_bucket_overlapping, identity_color};
use crate::model::{BandRecord, IdentityDiamond, IdentityRecord};

/// Half-width nudge used when looking up the bucket of a histogram bin edge.
pub const BUCKET_EPSILON: f64 = 1e-5;

/// Right, top, left, bottom corners of a unit diamond.
const CORNERS: [(f64, f64); 4] = [
    (FRAC_1_SQRT_2, 0.0),
    (0.0, FRAC_1_SQRT_2),
    (-FRAC_1_SQRT_2, 0.0),
    (0.0, -FRAC_1_SQRT_2),
];

#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    #[error("contig {contig}: window size must be positive, got {window}")]
    InvalidWindow { contig: String, window: i64 },
    #[error(
        "contig {contig}: every window collapses onto x = 0, cannot derive a scale (single-window contig?)"
    )]
    DegenerateScale { contig: String },
}

/// Records grouped by query contig, first-seen order.
fn by_contig(records: &[IdentityRecord]) -> Vec<(&str, Vec<&IdentityRecord>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&IdentityRecord>)> = Vec::new();
    for r in records {
        let slot = *index.entry(r.query.as_str()).or_insert_with(|| {
            groups.push((r.query.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(r);
    }
    groups
}

/// Window size of one contig: the largest query interval.
fn window_size(contig: &str, records: &[&IdentityRecord]) -> Result<i64, TransformError> {
    let window = records
        .iter()
        .map(|r| r.query_end - r.query_start)
        .max()
        .unwrap_or(0);
    if window <= 0 {
        return Err(TransformError::InvalidWindow {
            contig: contig.to_string(),
            window,
        });
    }
    Ok(window)
}

/// Rotate each contig's identity matrix into scaled diamonds.
pub fn identity_diamonds(
    records: &[IdentityRecord],
) -> Result<Vec<IdentityDiamond>, TransformError> {
    let mut diamonds = Vec::with_capacity(records.len());
    for (contig, rows) in by_contig(records) {
        let window = window_size(contig, &rows)?;
        let grid: Vec<(i64, i64)> = rows
            .iter()
            .map(|r| {
                let first = r.query_start.div_euclid(window);
                let second = r.ref_start.div_euclid(window);
                (first + second, second - first)
            })
            .collect();

        let max_x = grid.iter().map(|g| g.0).max().unwrap_or(0);
        let max_query = rows.iter().map(|r| r.query_start).max().unwrap_or(0);
        let scale = if max_x > 0 {
            max_query as f64 / max_x as f64
        } else {
            0.0
        };
        if scale <= 0.0 {
            return Err(TransformError::DegenerateScale {
                contig: contig.to_string(),
            });
        }
        let scaled_window = window as f64 / scale;

        for (r, (x, y)) in rows.iter().zip(grid) {
            let vertices = CORNERS.map(|(dx, dy)| {
                Point::new(
                    (x as f64 + dx * scaled_window) * scale,
                    (y as f64 + dy * scaled_window) * scaled_window,
                )
            });
            diamonds.push(IdentityDiamond {
                chrom: contig.to_string(),
                grid_x: x,
                grid_y: y,
                vertices,
                identity: r.identity,
                color: identity_color(r.identity),
            });
        }
        log::debug!("{contig}: {} diamonds, window {window} bp", rows.len());
    }
    Ok(diamonds)
}

/// One bar of the identity legend histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
    pub color: Option<Color>,
}

/// Equal-width histogram over the data range, each bin colored by the
/// identity bucket its left edge falls in.
///
/// The last bin is closed on the right. A constant input spans `v ± 0.5`.
pub fn identity_histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let (Some(lo), Some(hi)) = (
        finite.iter().copied().reduce(f64::min),
        finite.iter().copied().reduce(f64::max),
    ) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }
    let (lo, hi) = if lo == hi { (lo - 0.5, hi + 0.5) } else { (lo, hi) };
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for v in finite {
        let i = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[i] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let start = lo + i as f64 * width;
            let color = identity_bucket_overlapping(start, start + BUCKET_EPSILON)
                .map(|b| IDENTITY_BUCKETS[b].color);
            HistogramBin {
                start,
                end: start + width,
                count,
                color,
            }
        })
        .collect()
}

/// Mean identity near the diagonal for every query window.
///
/// A record contributes to both of its windows when their distance in
/// windows lies in `[ignore_band_size, band_size)`.
pub fn local_identity_band(
    records: &[IdentityRecord],
    band_size: usize,
    ignore_band_size: usize,
) -> Result<Vec<BandRecord>, TransformError> {
    if band_size <= ignore_band_size {
        log::warn!(
            "band_size ({band_size}) must exceed ignore_band_size ({ignore_band_size}); band is empty"
        );
        return Ok(Vec::new());
    }
    let mut bands = Vec::new();
    for (contig, rows) in by_contig(records) {
        let window = window_size(contig, &rows)?;
        let mut sums: HashMap<i64, (f64, usize)> = HashMap::new();
        for r in &rows {
            let q = r.query_start.div_euclid(window);
            let s = r.ref_start.div_euclid(window);
            let dist = q.abs_diff(s) as usize;
            if dist < ignore_band_size || dist >= band_size {
                continue;
            }
            for w in [q, s] {
                let entry = sums.entry(w).or_insert((0.0, 0));
                entry.0 += r.identity;
                entry.1 += 1;
            }
        }
        let mut windows: Vec<(i64, (f64, usize))> = sums.into_iter().collect();
        windows.sort_by_key(|(w, _)| *w);
        bands.extend(windows.into_iter().map(|(w, (sum, n))| {
            let identity = sum / n as f64;
            BandRecord {
                chrom: contig.to_string(),
                start: w * window,
                end: (w + 1) * window,
                identity,
                color: identity_color(identity),
            }
        }));
    }
    Ok(bands)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: i64 = 5_000;

    fn cell(query_window: i64, ref_window: i64, identity: f64) -> IdentityRecord {
        IdentityRecord {
            query: "chr1_cen".into(),
            query_start: query_window * WINDOW,
            query_end: (query_window + 1) * WINDOW,
            reference: "chr1_cen".into(),
            ref_start: ref_window * WINDOW,
            ref_end: (ref_window + 1) * WINDOW,
            identity,
        }
    }

    fn upper_triangle(n: i64) -> Vec<IdentityRecord> {
        (0..n)
            .flat_map(|q| (q..n).map(move |r| cell(q, r, 99.0 - (r - q) as f64)))
            .collect()
    }

    #[test]
    fn diagonal_maps_to_zero() {
        let diamonds = identity_diamonds(&upper_triangle(4)).unwrap();
        assert_eq!(diamonds.len(), 10);
        for d in diamonds.iter().filter(|d| d.grid_x % 2 == 0 && d.grid_y == 0) {
            let centre_y = (d.vertices[0].y + d.vertices[2].y) / 2.0;
            assert!(centre_y.abs() < 1e-9);
        }
        let self_cells = diamonds.iter().filter(|d| d.grid_y == 0).count();
        assert_eq!(self_cells, 4);
    }

    #[test]
    fn x_axis_spans_the_contig() {
        let diamonds = identity_diamonds(&upper_triangle(4)).unwrap();
        // max query start 15000 over max x 6 => scale 2500; window/scale = 2.
        let centre_x: Vec<f64> = diamonds
            .iter()
            .map(|d| (d.vertices[0].x + d.vertices[2].x) / 2.0)
            .collect();
        let max_centre = centre_x.iter().copied().fold(f64::MIN, f64::max);
        assert!((max_centre - 15_000.0).abs() < 1e-6);
        let right = diamonds[0].vertices[0].x - 0.0;
        assert!((right - FRAC_1_SQRT_2 * WINDOW as f64).abs() < 1e-6);
    }

    #[test]
    fn rejects_non_positive_window() {
        let mut bad = cell(0, 0, 99.0);
        bad.query_end = bad.query_start;
        assert_eq!(
            identity_diamonds(&[bad]),
            Err(TransformError::InvalidWindow {
                contig: "chr1_cen".into(),
                window: 0
            })
        );
    }

    #[test]
    fn rejects_single_window_contig() {
        assert!(matches!(
            identity_diamonds(&[cell(0, 0, 100.0)]),
            Err(TransformError::DegenerateScale { .. })
        ));
    }

    #[test]
    fn diamonds_carry_bucket_colors() {
        let diamonds = identity_diamonds(&[cell(0, 0, 99.9), cell(0, 1, 50.0), cell(1, 1, 120.0)])
            .unwrap();
        assert_eq!(diamonds[0].color, Some(IDENTITY_BUCKETS[11].color));
        assert_eq!(diamonds[1].color, Some(IDENTITY_BUCKETS[0].color));
        assert_eq!(diamonds[2].color, None);
    }

    #[test]
    fn histogram_counts_every_value() {
        let values: Vec<f64> = (0..1_000).map(|i| 90.0 + f64::from(i) / 100.0).collect();
        let bins = identity_histogram(&values, 300);
        assert_eq!(bins.len(), 300);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 1_000);
        assert_eq!(bins[0].color, Some(IDENTITY_BUCKETS[1].color));
        assert_eq!(bins[299].color, Some(IDENTITY_BUCKETS[11].color));
    }

    #[test]
    fn histogram_of_constant_values() {
        let bins = identity_histogram(&[99.0, 99.0], 10);
        assert_eq!(bins.len(), 10);
        assert!((bins[0].start - 98.5).abs() < 1e-9);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
        assert!(identity_histogram(&[], 10).is_empty());
    }

    #[test]
    fn band_averages_near_diagonal() {
        let bands = local_identity_band(&upper_triangle(6), 3, 1).unwrap();
        assert_eq!(bands.len(), 6);
        // Window 0 sees distances 1 and 2: identities 98 and 97.
        assert!((bands[0].identity - 97.5).abs() < 1e-9);
        assert_eq!((bands[0].start, bands[0].end), (0, WINDOW));
        assert!(local_identity_band(&upper_triangle(3), 2, 2).unwrap().is_empty());
    }
}
