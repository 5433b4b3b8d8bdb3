//! Higher-order-repeat classification.

use std::collections::BTreeMap;
use std::num::NonZeroU32;

use cenplot_protocol::Color;

use crate::colors::{CategoricalPalette, UNKNOWN_COLOR, monomer_color};
use crate::model::{BedRecord, HorMode, HorRecord, Mer, SortOrder};

/// Upper clamp for monomer counts.
pub const MAX_MER: u32 = 100;
/// Marker in a record's name flagging a live array.
pub const LIVE_MARKER: char = 'L';
/// Extra length given to each interval in visualization mode.
pub const VISUALIZATION_PAD: i64 = 2_000;

/// Number of monomers in a repeat of `length` bp: `round(length / unit)`
/// clamped to `[1, MAX_MER]`.
pub fn mer_count(length: i64, unit: NonZeroU32) -> Mer {
    let mer = (length as f64 / f64::from(unit.get())).round();
    Mer(mer.clamp(1.0, f64::from(MAX_MER)) as u32)
}

#[derive(Debug, Clone)]
pub struct ClassifyParams<'a> {
    pub mer_size: NonZeroU32,
    pub live_only: bool,
    pub mer_filter: u32,
    pub sort_order: SortOrder,
    /// Per-chromosome minimum counts; enables visualization mode when set.
    pub visualization: Option<&'a BTreeMap<String, u32>>,
}

/// Classify, filter and sort repeat intervals.
///
/// Sorting is stable, so records with the same count keep input order.
/// Colors are left as [`UNKNOWN_COLOR`]; see [`assign_colors`].
pub fn classify_hors(records: Vec<BedRecord>, params: &ClassifyParams<'_>) -> Vec<HorRecord> {
    let total = records.len();
    let mut hors: Vec<HorRecord> = records
        .into_iter()
        .filter(|r| !params.live_only || r.name.contains(LIVE_MARKER))
        .map(|record| {
            let mer = mer_count(record.len(), params.mer_size);
            let pad = if params.visualization.is_some() {
                VISUALIZATION_PAD
            } else {
                0
            };
            HorRecord {
                display_len: record.len() + pad,
                mer,
                record,
                color: UNKNOWN_COLOR,
            }
        })
        .filter(|h| h.mer.0 >= params.mer_filter)
        .filter(|h| passes_chrom_minimum(h, params.visualization))
        .collect();

    match params.sort_order {
        SortOrder::Ascending => hors.sort_by_key(|h| h.mer),
        SortOrder::Descending => hors.sort_by_key(|h| std::cmp::Reverse(h.mer)),
    }
    log::debug!("kept {} of {total} repeat intervals", hors.len());
    hors
}

fn passes_chrom_minimum(hor: &HorRecord, table: Option<&BTreeMap<String, u32>>) -> bool {
    let Some(table) = table else {
        return true;
    };
    hor.record
        .chrom_name
        .as_ref()
        .and_then(|name| table.get(name))
        .is_none_or(|min| hor.mer.0 >= *min)
}

/// Fill in display colors: the record's own RGB when requested, otherwise
/// the monomer palette (`mer` mode) or a first-seen categorical palette
/// (`hor` mode). Anything without a color falls back to gray.
pub fn assign_colors(hors: &mut [HorRecord], mode: HorMode, use_item_rgb: bool) {
    let mut palette = CategoricalPalette::default();
    for hor in hors.iter_mut() {
        let item = hor.record.item_rgb.filter(|_| use_item_rgb);
        hor.color = item
            .or_else(|| match mode {
                HorMode::Mer => monomer_color(hor.mer.0),
                HorMode::Hor => Some(palette.color_for(&hor.record.name)),
            })
            .unwrap_or(UNKNOWN_COLOR);
    }
}

/// Colors keyed by legend label, first-seen order.
pub fn legend_colors(hors: &[HorRecord], mode: HorMode) -> Vec<(String, Color)> {
    let mut out: Vec<(String, Color)> = Vec::new();
    for hor in hors {
        let label = hor.label(mode);
        if !out.iter().any(|(l, _)| *l == label) {
            out.push((label, hor.color));
        }
    }
    out
}
