use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::data::{HorMode, TrackData};
use super::options::TrackOptions;

#[derive(Debug, Error, PartialEq)]
pub enum TrackError {
    #[error("unknown track type: {0:?}")]
    UnknownType(String),
    #[error("unknown track position: {0:?}")]
    UnknownPosition(String),
    #[error("proportion {0} is outside [0, 1]")]
    ProportionOutOfRange(f64),
    #[error("{kind} track cannot take {options} options")]
    OptionsMismatch {
        kind: TrackType,
        options: &'static str,
    },
    #[error("{kind} track cannot hold {data} data")]
    DataMismatch { kind: TrackType, data: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    Hor,
    HorSplit,
    HorOrt,
    Label,
    SelfIdent,
    LocalSelfIdent,
    Bar,
    Line,
    Strand,
    Legend,
    Position,
    Spacer,
}

impl TrackType {
    pub const ALL: [TrackType; 12] = [
        TrackType::Hor,
        TrackType::HorSplit,
        TrackType::HorOrt,
        TrackType::Label,
        TrackType::SelfIdent,
        TrackType::LocalSelfIdent,
        TrackType::Bar,
        TrackType::Line,
        TrackType::Strand,
        TrackType::Legend,
        TrackType::Position,
        TrackType::Spacer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TrackType::Hor => "hor",
            TrackType::HorSplit => "horsplit",
            TrackType::HorOrt => "horort",
            TrackType::Label => "label",
            TrackType::SelfIdent => "selfident",
            TrackType::LocalSelfIdent => "localselfident",
            TrackType::Bar => "bar",
            TrackType::Line => "line",
            TrackType::Strand => "strand",
            TrackType::Legend => "legend",
            TrackType::Position => "position",
            TrackType::Spacer => "spacer",
        }
    }

    /// Types drawn without any positional payload.
    pub fn has_positional_data(self) -> bool {
        !matches!(
            self,
            TrackType::Legend | TrackType::Position | TrackType::Spacer
        )
    }

    /// Whether `data` is a payload this type can hold.
    pub fn accepts(self, data: &TrackData) -> bool {
        match (self, data) {
            (_, TrackData::Empty) => true,
            (TrackType::Hor | TrackType::HorSplit, TrackData::Hor(_)) => true,
            (TrackType::HorOrt | TrackType::Strand, TrackData::Strand(_)) => true,
            (TrackType::Label, TrackData::Label(_)) => true,
            (TrackType::SelfIdent, TrackData::SelfIdent(_)) => true,
            (TrackType::LocalSelfIdent, TrackData::LocalSelfIdent(_)) => true,
            (TrackType::Bar | TrackType::Line, TrackData::Values(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TrackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TrackType {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        TrackType::ALL
            .into_iter()
            .find(|t| t.name() == wanted)
            .ok_or_else(|| TrackError::UnknownType(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackPosition {
    #[default]
    Relative,
    Overlap,
}

impl FromStr for TrackPosition {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relative" => Ok(TrackPosition::Relative),
            "overlap" => Ok(TrackPosition::Overlap),
            _ => Err(TrackError::UnknownPosition(s.to_string())),
        }
    }
}

/// Replace every `{key}` in `template` with `value`.
pub fn fill_placeholder(template: &str, key: &str, value: &str) -> String {
    template.replace(&format!("{{{key}}}"), value)
}

/// One visual layer of a figure.
///
/// Fields are private so the type/options/data pairing checked in
/// [`Track::new`] cannot be broken afterwards; derived tracks are built as
/// new values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    title: Option<String>,
    position: TrackPosition,
    kind: TrackType,
    proportion: f64,
    data: TrackData,
    options: TrackOptions,
}

impl Track {
    pub fn new(
        title: Option<String>,
        position: TrackPosition,
        kind: TrackType,
        proportion: f64,
        data: TrackData,
        options: TrackOptions,
    ) -> Result<Track, TrackError> {
        if !(0.0..=1.0).contains(&proportion) {
            return Err(TrackError::ProportionOutOfRange(proportion));
        }
        if !options.matches(kind) {
            return Err(TrackError::OptionsMismatch {
                kind,
                options: options.variant_name(),
            });
        }
        if !kind.accepts(&data) {
            return Err(TrackError::DataMismatch {
                kind,
                data: data.variant_name(),
            });
        }
        Ok(Track {
            title,
            position,
            kind,
            proportion,
            data,
            options,
        })
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn position(&self) -> TrackPosition {
        self.position
    }

    pub fn kind(&self) -> TrackType {
        self.kind
    }

    pub fn proportion(&self) -> f64 {
        self.proportion
    }

    pub fn data(&self) -> &TrackData {
        &self.data
    }

    pub fn options(&self) -> &TrackOptions {
        &self.options
    }

    /// Title with `{chrom}` filled in.
    pub fn title_for(&self, chrom: &str) -> Option<String> {
        self.title
            .as_deref()
            .map(|t| fill_placeholder(t, "chrom", chrom))
    }

    fn with_data(&self, data: TrackData) -> Track {
        Track {
            title: self.title.clone(),
            position: self.position,
            kind: self.kind,
            proportion: self.proportion,
            data,
            options: self.options.clone(),
        }
    }

    /// Facet mode of a split track.
    pub fn split_mode(&self) -> Option<HorMode> {
        match (&self.kind, &self.options) {
            (TrackType::HorSplit, TrackOptions::Hor(opts)) => Some(opts.mode),
            _ => None,
        }
    }

    /// Distinct facet values of a split track, in data order.
    pub fn facets(&self) -> Vec<String> {
        let (Some(mode), TrackData::Hor(records)) = (self.split_mode(), &self.data) else {
            return Vec::new();
        };
        let mut facets: Vec<String> = Vec::new();
        for r in records {
            let facet = r.facet(mode);
            if !facets.contains(&facet) {
                facets.push(facet);
            }
        }
        facets
    }

    /// One sibling of a split track: rows matching `facet`, forced to
    /// `Relative`, `{mer}` filled in the title.
    pub fn facet_track(&self, facet: &str, proportion: f64) -> Track {
        let data = match (self.split_mode(), &self.data) {
            (Some(mode), TrackData::Hor(records)) => TrackData::Hor(
                records
                    .iter()
                    .filter(|r| r.facet(mode) == facet)
                    .cloned()
                    .collect(),
            ),
            _ => self.data.clone(),
        };
        Track {
            title: self
                .title
                .as_deref()
                .map(|t| fill_placeholder(t, "mer", facet)),
            position: TrackPosition::Relative,
            proportion: proportion.clamp(0.0, 1.0),
            ..self.with_data(data)
        }
    }
}

/// Ordered tracks plus every contig they reference.
#[derive(Debug, Clone, Default)]
pub struct TrackList {
    tracks: Vec<Track>,
    chroms: Vec<String>,
}

impl TrackList {
    pub fn new(tracks: Vec<Track>) -> TrackList {
        let mut chroms: Vec<String> = Vec::new();
        for chrom in tracks.iter().flat_map(|t| t.data().chroms()) {
            if !chroms.contains(&chrom) {
                chroms.push(chrom);
            }
        }
        TrackList { tracks, chroms }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Contig names in first-seen order.
    pub fn chroms(&self) -> &[String] {
        &self.chroms
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
