//! Track-to-panel-grid compilation.
//!
//! Walks the tracks in order with a row cursor. A `Relative` track takes the
//! cursor row and advances it; an `Overlap` track reuses the previous row.
//! Split tracks expand into one `Relative` sibling per facet before
//! placement. A legend column is added when any track asks for a legend.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::model::{LegendPosition, PlotSettings, Track, TrackPosition, TrackType};

/// Slack allowed when checking that row proportions sum to at most 1.
const PROPORTION_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("no tracks to lay out")]
    NoTracks,
    #[error("track {index} ({title}): split track has zero facets")]
    EmptySplit { index: usize, title: String },
    #[error("track {index} ({title}): overlap track has no preceding row to draw on")]
    DanglingOverlap { index: usize, title: String },
    #[error(
        "no valid track to derive x-axis bounds from; check that each input file has data for this contig"
    )]
    NoValidTrack,
    #[error("invalid x-axis bounds ({min}, {max})")]
    InvalidBounds { min: f64, max: f64 },
}

/// Shared x-axis range of a figure, in base pairs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct XBounds {
    pub min: f64,
    pub max: f64,
}

impl XBounds {
    pub fn new(min: f64, max: f64) -> Result<XBounds, LayoutError> {
        if !(min.is_finite() && max.is_finite()) || min >= max {
            return Err(LayoutError::InvalidBounds { min, max });
        }
        Ok(XBounds { min, max })
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn union(self, other: XBounds) -> XBounds {
        XBounds {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// The compiled grid for one figure.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Tracks after split expansion, in draw order.
    pub tracks: Vec<Track>,
    /// Input index each expanded track came from.
    pub sources: Vec<usize>,
    /// Panel row of each expanded track.
    pub rows: Vec<usize>,
    /// One entry per panel row.
    pub height_ratios: Vec<f64>,
    /// One entry per column.
    pub width_ratios: Vec<f64>,
    pub track_col: usize,
    pub legend_col: Option<usize>,
    pub x_bounds: XBounds,
}

impl Layout {
    pub fn num_rows(&self) -> usize {
        self.height_ratios.len()
    }

    pub fn num_cols(&self) -> usize {
        self.width_ratios.len()
    }

    /// Expanded track index to panel row.
    pub fn row_map(&self) -> BTreeMap<usize, usize> {
        self.rows.iter().copied().enumerate().collect()
    }
}

/// Proportion of each sibling of a split track with `facets` facets.
///
/// `None` when there are no facets.
pub fn split_proportion(proportion: f64, facets: usize, split_prop: bool) -> Option<f64> {
    if facets == 0 {
        return None;
    }
    Some(if split_prop {
        proportion / facets as f64
    } else {
        proportion
    })
}

fn display_title(track: &Track) -> String {
    track.title().unwrap_or("untitled").to_string()
}

/// Compile tracks and figure settings into a panel grid.
pub fn compile(tracks: &[Track], settings: &PlotSettings) -> Result<Layout, LayoutError> {
    if tracks.is_empty() {
        return Err(LayoutError::NoTracks);
    }

    let mut expanded: Vec<Track> = Vec::with_capacity(tracks.len());
    let mut sources = Vec::with_capacity(tracks.len());
    let mut rows = Vec::with_capacity(tracks.len());
    let mut height_ratios = Vec::new();
    let mut cursor = 0usize;

    for (index, track) in tracks.iter().enumerate() {
        if track.kind() == TrackType::HorSplit {
            if track.position() == TrackPosition::Overlap {
                log::warn!(
                    "track {index} ({}): split tracks cannot overlap; drawing as relative",
                    display_title(track)
                );
            }
            let facets = track.facets();
            let split_prop = match track.options() {
                crate::model::TrackOptions::Hor(opts) => opts.split_prop,
                _ => false,
            };
            let Some(proportion) = split_proportion(track.proportion(), facets.len(), split_prop)
            else {
                return Err(LayoutError::EmptySplit {
                    index,
                    title: display_title(track),
                });
            };
            for facet in &facets {
                expanded.push(track.facet_track(facet, proportion));
                sources.push(index);
                rows.push(cursor);
                height_ratios.push(proportion);
                cursor += 1;
            }
            continue;
        }

        match track.position() {
            TrackPosition::Relative => {
                rows.push(cursor);
                height_ratios.push(track.proportion());
                cursor += 1;
            }
            TrackPosition::Overlap => {
                let Some(row) = cursor.checked_sub(1) else {
                    return Err(LayoutError::DanglingOverlap {
                        index,
                        title: display_title(track),
                    });
                };
                rows.push(row);
            }
        }
        expanded.push(track.clone());
        sources.push(index);
    }

    let total: f64 = height_ratios.iter().sum();
    if total > 1.0 + PROPORTION_TOLERANCE {
        log::warn!("row proportions sum to {total:.3}, more than the figure height");
    }

    let wants_legend = expanded.iter().any(|t| t.options().legend());
    let legend_prop = settings.legend_prop.clamp(0.0, 1.0);
    let (width_ratios, track_col, legend_col) = match (wants_legend, settings.legend_pos) {
        (false, _) => (vec![1.0], 0, None),
        (true, LegendPosition::Right) => (vec![1.0 - legend_prop, legend_prop], 0, Some(1)),
        (true, LegendPosition::Left) => (vec![legend_prop, 1.0 - legend_prop], 1, Some(0)),
    };

    let x_bounds = match settings.xlim {
        Some((min, max)) => XBounds::new(min, max)?,
        None => x_bounds(&expanded)?,
    };

    log::debug!(
        "layout: {} tracks in {} rows x {} cols, x = [{}, {}]",
        expanded.len(),
        height_ratios.len(),
        width_ratios.len(),
        x_bounds.min,
        x_bounds.max
    );

    Ok(Layout {
        tracks: expanded,
        sources,
        rows,
        height_ratios,
        width_ratios,
        track_col,
        legend_col,
        x_bounds,
    })
}

/// Smallest non-negative start and largest end across all positional tracks.
///
/// Tracks with no usable rows are logged and skipped.
pub fn x_bounds(tracks: &[Track]) -> Result<XBounds, LayoutError> {
    let mut bounds: Option<(f64, f64)> = None;
    for (index, track) in tracks.iter().enumerate() {
        if !track.kind().has_positional_data() {
            continue;
        }
        let Some((min, max)) = track.data().x_extent() else {
            log::error!(
                "track {index} ({}, {}) has no usable rows for x-axis bounds; skipping",
                display_title(track),
                track.kind()
            );
            continue;
        };
        bounds = Some(match bounds {
            Some((lo, hi)) => (lo.min(min), hi.max(max)),
            None => (min, max),
        });
    }
    let (min, max) = bounds.ok_or(LayoutError::NoValidTrack)?;
    XBounds::new(min, max)
}
