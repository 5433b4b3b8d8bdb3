//! Load-time preparation of each track's payload.

pub mod hor;
pub mod self_ident;
pub mod strand;

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::colors::CategoricalPalette;
use crate::model::{
    BedRecord, IdentityRecord, LabelRecord, LabelSettings, TrackData, TrackOptions, TrackType,
    ValueRecord,
};

pub use self_ident::TransformError;

#[derive(Debug, Error, PartialEq)]
pub enum PrepareError {
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error("{kind} track with {options} options cannot use {rows} rows")]
    RowsMismatch {
        kind: TrackType,
        options: &'static str,
        rows: &'static str,
    },
}

/// Raw rows handed over by a reader.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceData {
    Bed(Vec<BedRecord>),
    Identity(Vec<IdentityRecord>),
    Values(Vec<ValueRecord>),
    None,
}

impl SourceData {
    fn row_chroms(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            SourceData::Bed(v) => Box::new(v.iter().map(|r| r.chrom.as_str())),
            SourceData::Identity(v) => Box::new(v.iter().map(|r| r.query.as_str())),
            SourceData::Values(v) => Box::new(v.iter().map(|r| r.chrom.as_str())),
            SourceData::None => Box::new(std::iter::empty()),
        }
    }

    /// Contigs in first-seen order.
    pub fn chroms(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.row_chroms()
            .filter(|c| seen.insert(*c))
            .map(str::to_string)
            .collect()
    }

    /// A new set of rows restricted to `chrom`.
    pub fn variant_name(&self) -> &'static str {
        match self {
            SourceData::Bed(_) => "bed",
            SourceData::Identity(_) => "identity",
            SourceData::Values(_) => "value",
            SourceData::None => "no",
        }
    }

    pub fn filter_chrom(&self, chrom: &str) -> SourceData {
        match self {
            SourceData::Bed(v) => {
                SourceData::Bed(v.iter().filter(|r| r.chrom == chrom).cloned().collect())
            }
            SourceData::Identity(v) => {
                SourceData::Identity(v.iter().filter(|r| r.query == chrom).cloned().collect())
            }
            SourceData::Values(v) => {
                SourceData::Values(v.iter().filter(|r| r.chrom == chrom).cloned().collect())
            }
            SourceData::None => SourceData::None,
        }
    }
}

/// Turn raw rows into the payload the renderer for `kind` expects.
pub fn prepare(
    kind: TrackType,
    options: &TrackOptions,
    source: SourceData,
) -> Result<TrackData, PrepareError> {
    let data = match (options, source) {
        (TrackOptions::Hor(opts), SourceData::Bed(records)) => {
            let params = hor::ClassifyParams {
                mer_size: opts.mer_size,
                live_only: opts.live_only,
                mer_filter: opts.mer_filter,
                sort_order: opts.sort_order,
                visualization: opts.visualization.then_some(&opts.chrom_min_mer),
            };
            let mut hors = hor::classify_hors(records, &params);
            hor::assign_colors(&mut hors, opts.mode, opts.use_item_rgb);
            TrackData::Hor(hors)
        }
        (TrackOptions::HorOrt(opts), SourceData::Bed(records)) => {
            let params = hor::ClassifyParams {
                mer_size: opts.mer_size,
                live_only: opts.live_only,
                mer_filter: opts.mer_filter,
                sort_order: Default::default(),
                visualization: None,
            };
            let hors = hor::classify_hors(records, &params);
            let spans = hors.iter().map(strand::StrandSpan::from);
            let blocks = strand::merge_strand_runs(spans, opts.dst_merge);
            if opts.merge_arrays {
                let thresholds = strand::ArrayThresholds {
                    merge_dst: opts.arr_merge_dst,
                    min_units: opts.min_arr_units,
                    min_len: opts.min_arr_len,
                    min_prop: opts.min_arr_prop,
                };
                TrackData::Strand(strand::merge_arrays(&blocks, &thresholds))
            } else {
                TrackData::Strand(blocks)
            }
        }
        (TrackOptions::Strand(opts), SourceData::Bed(records)) => TrackData::Strand(
            strand::merge_strand_runs(records.iter().map(strand::StrandSpan::from), opts.dst_merge),
        ),
        (TrackOptions::Label(opts), SourceData::Bed(records)) => {
            TrackData::Label(prepare_labels(records, opts))
        }
        (TrackOptions::SelfIdent(_), SourceData::Identity(records)) => {
            TrackData::SelfIdent(self_ident::identity_diamonds(&records)?)
        }
        (TrackOptions::LocalSelfIdent(opts), SourceData::Identity(records)) => {
            TrackData::LocalSelfIdent(self_ident::local_identity_band(
                &records,
                opts.band_size,
                opts.ignore_band_size,
            )?)
        }
        (TrackOptions::Bar(_) | TrackOptions::Line(_), SourceData::Values(values)) => {
            TrackData::Values(values)
        }
        (
            TrackOptions::Legend(_) | TrackOptions::Position(_) | TrackOptions::Spacer(_),
            SourceData::None,
        ) => TrackData::Empty,
        (opts, rows) => {
            return Err(PrepareError::RowsMismatch {
                kind,
                options: opts.variant_name(),
                rows: rows.variant_name(),
            });
        }
    };
    Ok(data)
}

/// Color labels and order them so names covering the most sequence are
/// drawn first.
fn prepare_labels(records: Vec<BedRecord>, opts: &LabelSettings) -> Vec<LabelRecord> {
    let mut totals: HashMap<String, i64> = HashMap::new();
    for r in &records {
        *totals.entry(r.name.clone()).or_default() += r.len();
    }

    let mut palette = CategoricalPalette::default();
    let mut labels: Vec<LabelRecord> = records
        .into_iter()
        .map(|record| {
            let color = opts
                .color
                .or(record.item_rgb.filter(|_| opts.use_item_rgb))
                .unwrap_or_else(|| palette.color_for(&record.name));
            LabelRecord {
                color: color.with_alpha(opts.alpha.clamp(0.0, 1.0)),
                record,
            }
        })
        .collect();
    labels.sort_by_key(|l| std::cmp::Reverse(totals.get(&l.record.name).copied().unwrap_or(0)));
    labels
}
