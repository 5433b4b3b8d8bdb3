//! Per-type settings records.
//!
//! Every record composes [`BaseSettings`]. Option maps coming from a track
//! file are checked against the record's known keys before deserializing,
//! so a misspelled key is an error rather than a silently ignored value.

use std::collections::BTreeMap;
use std::num::NonZeroU32;

use cenplot_protocol::Color;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::data::HorMode;
use super::track::TrackType;
use crate::units::Unit;

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("unknown option(s) for {kind} track: {}", keys.join(", "))]
    UnknownKeys { kind: TrackType, keys: Vec<String> },
    #[error("invalid options for {kind} track: {source}")]
    Invalid {
        kind: TrackType,
        source: serde_json::Error,
    },
}

/// Colors in option maps are `#rrggbb`, `r,g,b`, or a basic color name.
pub fn parse_color(s: &str) -> Option<Color> {
    match s.trim().to_ascii_lowercase().as_str() {
        "black" => Some(Color::BLACK),
        "white" => Some(Color::WHITE),
        "gray" | "grey" => Some(Color::GRAY),
        "red" => Some(Color::from_rgb8(0xff, 0x00, 0x00)),
        "green" => Some(Color::from_rgb8(0x00, 0x80, 0x00)),
        "blue" => Some(Color::from_rgb8(0x00, 0x00, 0xff)),
        other => Color::from_item_rgb(other).ok(),
    }
}

mod color_opt {
    use cenplot_protocol::Color;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(color: &Option<Color>, s: S) -> Result<S::Ok, S::Error> {
        match color {
            Some(c) => s.serialize_some(&c.to_hex()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Color>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        raw.map(|s| {
            super::parse_color(&s).ok_or_else(|| D::Error::custom(format!("invalid color: {s}")))
        })
        .transpose()
    }
}

/// Fields shared by every track type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseSettings {
    pub legend: bool,
    /// Legend title; `{chrom}` is substituted.
    pub legend_title: Option<String>,
    pub legend_title_only: bool,
    pub legend_ncols: Option<usize>,
    pub fontsize: f64,
    pub title_fontsize: f64,
    pub legend_fontsize: f64,
    pub hide_x: bool,
    /// Ruler unit; picked from the x-axis span when unset.
    pub units_x: Option<Unit>,
}

impl BaseSettings {
    pub const KEYS: &'static [&'static str] = &[
        "legend",
        "legend_title",
        "legend_title_only",
        "legend_ncols",
        "fontsize",
        "title_fontsize",
        "legend_fontsize",
        "hide_x",
        "units_x",
    ];

    pub const DEFAULT_LEGEND_COLUMNS: usize = 3;

    pub fn legend_columns(&self) -> usize {
        self.legend_ncols
            .filter(|n| *n > 0)
            .unwrap_or(Self::DEFAULT_LEGEND_COLUMNS)
    }
}

impl Default for BaseSettings {
    fn default() -> Self {
        Self {
            legend: true,
            legend_title: None,
            legend_title_only: false,
            legend_ncols: None,
            fontsize: 10.0,
            title_fontsize: 12.0,
            legend_fontsize: 10.0,
            hide_x: true,
            units_x: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Monomer length in base pairs.
pub const DEFAULT_MER_SIZE: NonZeroU32 = match NonZeroU32::new(170) {
    Some(n) => n,
    None => NonZeroU32::MIN,
};

/// Legacy per-chromosome minimum monomer counts applied in visualization mode.
pub fn default_chrom_min_mer() -> BTreeMap<String, u32> {
    [("chr10", 5), ("chr20", 5), ("chrY", 30), ("chr17", 4)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// HOR and HORSplit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorSettings {
    #[serde(flatten)]
    pub base: BaseSettings,
    pub sort_order: SortOrder,
    pub mode: HorMode,
    pub live_only: bool,
    pub mer_size: NonZeroU32,
    pub mer_filter: u32,
    pub use_item_rgb: bool,
    pub split_prop: bool,
    pub visualization: bool,
    pub chrom_min_mer: BTreeMap<String, u32>,
    pub border: bool,
}

impl HorSettings {
    const KEYS: &'static [&'static str] = &[
        "sort_order",
        "mode",
        "live_only",
        "mer_size",
        "mer_filter",
        "use_item_rgb",
        "split_prop",
        "visualization",
        "chrom_min_mer",
        "border",
    ];
}

impl Default for HorSettings {
    fn default() -> Self {
        Self {
            base: BaseSettings::default(),
            sort_order: SortOrder::Descending,
            mode: HorMode::Mer,
            live_only: true,
            mer_size: DEFAULT_MER_SIZE,
            mer_filter: 2,
            use_item_rgb: false,
            split_prop: false,
            visualization: false,
            chrom_min_mer: default_chrom_min_mer(),
            border: false,
        }
    }
}

/// HOR orientation arrows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorOrtSettings {
    #[serde(flatten)]
    pub base: BaseSettings,
    pub scale: f64,
    #[serde(with = "color_opt")]
    pub fwd_color: Option<Color>,
    #[serde(with = "color_opt")]
    pub rev_color: Option<Color>,
    pub live_only: bool,
    pub mer_size: NonZeroU32,
    pub mer_filter: u32,
    pub dst_merge: u32,
    pub merge_arrays: bool,
    pub arr_merge_dst: u32,
    pub min_arr_units: usize,
    pub min_arr_len: i64,
    pub min_arr_prop: f64,
}

impl HorOrtSettings {
    const KEYS: &'static [&'static str] = &[
        "scale",
        "fwd_color",
        "rev_color",
        "live_only",
        "mer_size",
        "mer_filter",
        "dst_merge",
        "merge_arrays",
        "arr_merge_dst",
        "min_arr_units",
        "min_arr_len",
        "min_arr_prop",
    ];
}

impl Default for HorOrtSettings {
    fn default() -> Self {
        Self {
            base: BaseSettings::default(),
            scale: 50.0,
            fwd_color: None,
            rev_color: None,
            live_only: true,
            mer_size: DEFAULT_MER_SIZE,
            mer_filter: 2,
            dst_merge: 100_000,
            merge_arrays: false,
            arr_merge_dst: 8_000,
            min_arr_units: 10,
            min_arr_len: 30_000,
            min_arr_prop: 0.9,
        }
    }
}

/// Generic strand arrows from a plain BED file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrandSettings {
    #[serde(flatten)]
    pub base: BaseSettings,
    pub scale: f64,
    #[serde(with = "color_opt")]
    pub fwd_color: Option<Color>,
    #[serde(with = "color_opt")]
    pub rev_color: Option<Color>,
    pub dst_merge: u32,
    pub min_len: i64,
}

impl StrandSettings {
    const KEYS: &'static [&'static str] =
        &["scale", "fwd_color", "rev_color", "dst_merge", "min_len"];
}

impl Default for StrandSettings {
    fn default() -> Self {
        Self {
            base: BaseSettings::default(),
            scale: 50.0,
            fwd_color: None,
            rev_color: None,
            dst_merge: 100_000,
            min_len: i64::from(DEFAULT_MER_SIZE.get()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelShape {
    #[default]
    Rect,
    Tri,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelSettings {
    #[serde(flatten)]
    pub base: BaseSettings,
    #[serde(with = "color_opt")]
    pub color: Option<Color>,
    pub use_item_rgb: bool,
    pub alpha: f32,
    pub shape: LabelShape,
    pub border: bool,
}

impl LabelSettings {
    const KEYS: &'static [&'static str] = &["color", "use_item_rgb", "alpha", "shape", "border"];
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            base: BaseSettings::default(),
            color: None,
            use_item_rgb: true,
            alpha: 1.0,
            shape: LabelShape::Rect,
            border: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfIdentSettings {
    #[serde(flatten)]
    pub base: BaseSettings,
    pub invert: bool,
    pub legend_bins: usize,
    pub legend_xmin: f64,
}

impl SelfIdentSettings {
    const KEYS: &'static [&'static str] = &["invert", "legend_bins", "legend_xmin"];
}

impl Default for SelfIdentSettings {
    fn default() -> Self {
        Self {
            base: BaseSettings::default(),
            invert: true,
            legend_bins: 300,
            legend_xmin: 70.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalSelfIdentSettings {
    #[serde(flatten)]
    pub base: BaseSettings,
    pub band_size: usize,
    pub ignore_band_size: usize,
}

impl LocalSelfIdentSettings {
    const KEYS: &'static [&'static str] = &["band_size", "ignore_band_size"];
}

impl Default for LocalSelfIdentSettings {
    fn default() -> Self {
        Self {
            base: BaseSettings::default(),
            band_size: 5,
            ignore_band_size: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarSettings {
    #[serde(flatten)]
    pub base: BaseSettings,
    #[serde(with = "color_opt")]
    pub color: Option<Color>,
    pub alpha: f32,
    pub ymin: f64,
    pub ymax: Option<f64>,
    pub label: Option<String>,
}

impl BarSettings {
    const KEYS: &'static [&'static str] = &["color", "alpha", "ymin", "ymax", "label"];
}

impl Default for BarSettings {
    fn default() -> Self {
        Self {
            base: BaseSettings::default(),
            color: None,
            alpha: 1.0,
            ymin: 0.0,
            ymax: None,
            label: None,
        }
    }
}

/// Where along an interval a line vertex is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinePosition {
    #[default]
    Start,
    Midpoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineSettings {
    #[serde(flatten)]
    pub bar: BarSettings,
    pub fill: bool,
    pub linewidth: f64,
    pub position: LinePosition,
}

impl LineSettings {
    const KEYS: &'static [&'static str] = &["fill", "linewidth", "position"];
}

impl Default for LineSettings {
    fn default() -> Self {
        Self {
            bar: BarSettings::default(),
            fill: false,
            linewidth: 1.0,
            position: LinePosition::Start,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendSettings {
    #[serde(flatten)]
    pub base: BaseSettings,
    /// Track whose legend is drawn; the preceding track when unset.
    pub index: Option<usize>,
}

impl LegendSettings {
    const KEYS: &'static [&'static str] = &["index"];
}

/// Closed set of per-type settings. One variant per track type, except
/// that HOR and HORSplit share [`HorSettings`] and Position/Spacer carry
/// only the base fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrackOptions {
    Hor(HorSettings),
    HorOrt(HorOrtSettings),
    Label(LabelSettings),
    SelfIdent(SelfIdentSettings),
    LocalSelfIdent(LocalSelfIdentSettings),
    Bar(BarSettings),
    Line(LineSettings),
    Strand(StrandSettings),
    Legend(LegendSettings),
    Position(BaseSettings),
    Spacer(BaseSettings),
}

fn parse_record<T: serde::de::DeserializeOwned>(
    kind: TrackType,
    map: &Map<String, Value>,
    own_keys: &[&[&str]],
) -> Result<T, OptionsError> {
    let unknown: Vec<String> = map
        .keys()
        .filter(|k| {
            !BaseSettings::KEYS.contains(&k.as_str())
                && !own_keys.iter().any(|keys| keys.contains(&k.as_str()))
        })
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(OptionsError::UnknownKeys {
            kind,
            keys: unknown,
        });
    }
    serde_json::from_value(Value::Object(map.clone()))
        .map_err(|source| OptionsError::Invalid { kind, source })
}

impl TrackOptions {
    pub fn defaults_for(kind: TrackType) -> TrackOptions {
        match kind {
            TrackType::Hor | TrackType::HorSplit => TrackOptions::Hor(HorSettings::default()),
            TrackType::HorOrt => TrackOptions::HorOrt(HorOrtSettings::default()),
            TrackType::Label => TrackOptions::Label(LabelSettings::default()),
            TrackType::SelfIdent => TrackOptions::SelfIdent(SelfIdentSettings::default()),
            TrackType::LocalSelfIdent => {
                TrackOptions::LocalSelfIdent(LocalSelfIdentSettings::default())
            }
            TrackType::Bar => TrackOptions::Bar(BarSettings::default()),
            TrackType::Line => TrackOptions::Line(LineSettings::default()),
            TrackType::Strand => TrackOptions::Strand(StrandSettings::default()),
            TrackType::Legend => TrackOptions::Legend(LegendSettings::default()),
            TrackType::Position => TrackOptions::Position(BaseSettings::default()),
            TrackType::Spacer => TrackOptions::Spacer(BaseSettings::default()),
        }
    }

    /// Build the settings record for `kind` from a raw option map.
    pub fn from_map(
        kind: TrackType,
        map: &Map<String, Value>,
    ) -> Result<TrackOptions, OptionsError> {
        Ok(match kind {
            TrackType::Hor | TrackType::HorSplit => {
                TrackOptions::Hor(parse_record(kind, map, &[HorSettings::KEYS])?)
            }
            TrackType::HorOrt => {
                TrackOptions::HorOrt(parse_record(kind, map, &[HorOrtSettings::KEYS])?)
            }
            TrackType::Label => {
                TrackOptions::Label(parse_record(kind, map, &[LabelSettings::KEYS])?)
            }
            TrackType::SelfIdent => {
                TrackOptions::SelfIdent(parse_record(kind, map, &[SelfIdentSettings::KEYS])?)
            }
            TrackType::LocalSelfIdent => TrackOptions::LocalSelfIdent(parse_record(
                kind,
                map,
                &[LocalSelfIdentSettings::KEYS],
            )?),
            TrackType::Bar => TrackOptions::Bar(parse_record(kind, map, &[BarSettings::KEYS])?),
            TrackType::Line => TrackOptions::Line(parse_record(
                kind,
                map,
                &[BarSettings::KEYS, LineSettings::KEYS],
            )?),
            TrackType::Strand => {
                TrackOptions::Strand(parse_record(kind, map, &[StrandSettings::KEYS])?)
            }
            TrackType::Legend => {
                TrackOptions::Legend(parse_record(kind, map, &[LegendSettings::KEYS])?)
            }
            TrackType::Position => TrackOptions::Position(parse_record(kind, map, &[])?),
            TrackType::Spacer => TrackOptions::Spacer(parse_record(kind, map, &[])?),
        })
    }

    /// Whether this record is the one `kind` expects.
    pub fn matches(&self, kind: TrackType) -> bool {
        matches!(
            (self, kind),
            (TrackOptions::Hor(_), TrackType::Hor | TrackType::HorSplit)
                | (TrackOptions::HorOrt(_), TrackType::HorOrt)
                | (TrackOptions::Label(_), TrackType::Label)
                | (TrackOptions::SelfIdent(_), TrackType::SelfIdent)
                | (TrackOptions::LocalSelfIdent(_), TrackType::LocalSelfIdent)
                | (TrackOptions::Bar(_), TrackType::Bar)
                | (TrackOptions::Line(_), TrackType::Line)
                | (TrackOptions::Strand(_), TrackType::Strand)
                | (TrackOptions::Legend(_), TrackType::Legend)
                | (TrackOptions::Position(_), TrackType::Position)
                | (TrackOptions::Spacer(_), TrackType::Spacer)
        )
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            TrackOptions::Hor(_) => "hor",
            TrackOptions::HorOrt(_) => "horort",
            TrackOptions::Label(_) => "label",
            TrackOptions::SelfIdent(_) => "selfident",
            TrackOptions::LocalSelfIdent(_) => "localselfident",
            TrackOptions::Bar(_) => "bar",
            TrackOptions::Line(_) => "line",
            TrackOptions::Strand(_) => "strand",
            TrackOptions::Legend(_) => "legend",
            TrackOptions::Position(_) => "position",
            TrackOptions::Spacer(_) => "spacer",
        }
    }

    pub fn base(&self) -> &BaseSettings {
        match self {
            TrackOptions::Hor(s) => &s.base,
            TrackOptions::HorOrt(s) => &s.base,
            TrackOptions::Label(s) => &s.base,
            TrackOptions::SelfIdent(s) => &s.base,
            TrackOptions::LocalSelfIdent(s) => &s.base,
            TrackOptions::Bar(s) => &s.base,
            TrackOptions::Line(s) => &s.bar.base,
            TrackOptions::Strand(s) => &s.base,
            TrackOptions::Legend(s) => &s.base,
            TrackOptions::Position(s) | TrackOptions::Spacer(s) => s,
        }
    }

    pub fn legend(&self) -> bool {
        self.base().legend
    }
}
