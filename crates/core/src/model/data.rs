use std::collections::HashSet;
use std::fmt;

use cenplot_protocol::{Color, Point};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Strand {
    #[serde(rename = "+")]
    Forward,
    #[serde(rename = "-")]
    Reverse,
    #[default]
    #[serde(rename = ".")]
    Unknown,
}

impl Strand {
    pub fn from_field(field: &str) -> Strand {
        match field.trim() {
            "+" => Strand::Forward,
            "-" => Strand::Reverse,
            _ => Strand::Unknown,
        }
    }
}

/// One BED9 row with coordinates made contig-relative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BedRecord {
    pub chrom: String,
    /// Short chromosome name (`chr1`..`chrY`) parsed out of `chrom`, if any.
    pub chrom_name: Option<String>,
    pub start: i64,
    pub end: i64,
    pub name: String,
    pub score: Option<f64>,
    pub strand: Strand,
    pub item_rgb: Option<Color>,
}

impl BedRecord {
    pub fn len(&self) -> i64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Monomer count of a repeat unit. Treated as a category, not a quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Mer(pub u32);

impl fmt::Display for Mer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorRecord {
    pub record: BedRecord,
    pub mer: Mer,
    /// Length used for drawing; may be padded in visualization mode.
    pub display_len: i64,
    pub color: Color,
}

/// How a split HOR track picks its facets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorMode {
    #[default]
    Mer,
    Hor,
}

impl HorRecord {
    pub fn facet(&self, mode: HorMode) -> String {
        match mode {
            HorMode::Mer => self.mer.to_string(),
            HorMode::Hor => self.record.name.clone(),
        }
    }

    /// Legend label for this record.
    pub fn label(&self, mode: HorMode) -> String {
        self.facet(mode)
    }
}

/// A merged same-strand run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrandBlock {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
    /// Number of input intervals merged into this block.
    pub units: usize,
    /// Total length of those intervals.
    pub unit_bp: i64,
}

impl StrandBlock {
    pub fn len(&self) -> i64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRecord {
    pub record: BedRecord,
    pub color: Color,
}

/// One cell of a pairwise identity matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub query: String,
    pub query_start: i64,
    pub query_end: i64,
    pub reference: String,
    pub ref_start: i64,
    pub ref_end: i64,
    pub identity: f64,
}

/// A rotated identity-matrix cell ready for area fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityDiamond {
    pub chrom: String,
    /// Rotated grid coordinates: `x = first + second`, `y = second - first`.
    pub grid_x: i64,
    pub grid_y: i64,
    /// Right, top, left, bottom corners.
    pub vertices: [Point; 4],
    pub identity: f64,
    pub color: Option<Color>,
}

impl IdentityDiamond {
    pub fn x_range(&self) -> (f64, f64) {
        self.vertices
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.x), hi.max(p.x))
            })
    }
}

/// Mean identity near the diagonal for one query window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandRecord {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub identity: f64,
    pub color: Option<Color>,
}

/// A scalar value over an interval (Bar/Line tracks).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRecord {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub value: f64,
}

/// Prepared payload of a track.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum TrackData {
    Hor(Vec<HorRecord>),
    Strand(Vec<StrandBlock>),
    Label(Vec<LabelRecord>),
    SelfIdent(Vec<IdentityDiamond>),
    LocalSelfIdent(Vec<BandRecord>),
    Values(Vec<ValueRecord>),
    #[default]
    Empty,
}

impl TrackData {
    pub fn variant_name(&self) -> &'static str {
        match self {
            TrackData::Hor(_) => "hor",
            TrackData::Strand(_) => "strand",
            TrackData::Label(_) => "label",
            TrackData::SelfIdent(_) => "selfident",
            TrackData::LocalSelfIdent(_) => "localselfident",
            TrackData::Values(_) => "values",
            TrackData::Empty => "empty",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TrackData::Hor(v) => v.len(),
            TrackData::Strand(v) => v.len(),
            TrackData::Label(v) => v.len(),
            TrackData::SelfIdent(v) => v.len(),
            TrackData::LocalSelfIdent(v) => v.len(),
            TrackData::Values(v) => v.len(),
            TrackData::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Contig name of every row.
    fn row_chroms(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            TrackData::Hor(v) => Box::new(v.iter().map(|r| r.record.chrom.as_str())),
            TrackData::Strand(v) => Box::new(v.iter().map(|r| r.chrom.as_str())),
            TrackData::Label(v) => Box::new(v.iter().map(|r| r.record.chrom.as_str())),
            TrackData::SelfIdent(v) => Box::new(v.iter().map(|r| r.chrom.as_str())),
            TrackData::LocalSelfIdent(v) => Box::new(v.iter().map(|r| r.chrom.as_str())),
            TrackData::Values(v) => Box::new(v.iter().map(|r| r.chrom.as_str())),
            TrackData::Empty => Box::new(std::iter::empty()),
        }
    }

    /// Distinct contig names in first-seen order.
    pub fn chroms(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.row_chroms()
            .filter(|c| seen.insert(*c))
            .map(str::to_string)
            .collect()
    }

    /// Positional extent of the payload: the minimum over non-negative starts
    /// and the maximum end. Self-identity data uses its transformed x axis.
    pub fn x_extent(&self) -> Option<(f64, f64)> {
        let spans: Vec<(f64, f64)> = match self {
            TrackData::Hor(v) => v
                .iter()
                .map(|r| (r.record.start as f64, r.record.end as f64))
                .collect(),
            TrackData::Strand(v) => v.iter().map(|r| (r.start as f64, r.end as f64)).collect(),
            TrackData::Label(v) => v
                .iter()
                .map(|r| (r.record.start as f64, r.record.end as f64))
                .collect(),
            TrackData::SelfIdent(v) => v.iter().map(IdentityDiamond::x_range).collect(),
            TrackData::LocalSelfIdent(v) => {
                v.iter().map(|r| (r.start as f64, r.end as f64)).collect()
            }
            TrackData::Values(v) => v.iter().map(|r| (r.start as f64, r.end as f64)).collect(),
            TrackData::Empty => Vec::new(),
        };
        let min = spans
            .iter()
            .map(|s| s.0)
            .filter(|s| *s >= 0.0)
            .reduce(f64::min)?;
        let max = spans.iter().map(|s| s.1).reduce(f64::max)?;
        Some((min, max))
    }
}
