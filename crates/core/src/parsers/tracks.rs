//! Track file reader.
//!
//! A track file is TOML, or YAML when the extension is `.yaml`/`.yml`:
//!
//! ```toml
//! [settings]
//! format = ["svg"]
//! dim = [16.0, 8.0]
//!
//! [[tracks]]
//! title = "{chrom}"
//! position = "relative"
//! type = "hor"
//! proportion = 0.5
//! path = "hor.bed"
//! options = { mode = "mer", mer_filter = 2 }
//! ```
//!
//! Problems confined to one descriptor (bad enum value, unknown option,
//! missing path) skip that track with a warning. Unreadable data files are
//! fatal.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::ReadError;
use super::bed::{read_bed9, read_values};
use super::identity::read_identity;
use crate::model::{PlotSettings, Track, TrackList, TrackOptions, TrackPosition, TrackType};
use crate::pipeline::{PrepareError, SourceData, prepare};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: invalid TOML: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{}: invalid YAML: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error("track {index} ({title}): {source}")]
    Prepare {
        index: usize,
        title: String,
        #[source]
        source: PrepareError,
    },
    #[error("{}: no usable tracks", path.display())]
    NoUsableTracks { path: PathBuf },
}

/// One `[[tracks]]` entry as written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackDescriptor {
    pub title: Option<String>,
    pub position: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub proportion: f64,
    pub path: Option<PathBuf>,
    pub options: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackFile {
    pub settings: PlotSettings,
    pub tracks: Vec<TrackDescriptor>,
}

impl TrackFile {
    pub fn from_toml(text: &str) -> Result<TrackFile, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn from_yaml(text: &str) -> Result<TrackFile, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Parse by extension: YAML for `.yaml`/`.yml`, TOML otherwise.
    pub fn read(path: &Path) -> Result<TrackFile, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
        if is_yaml {
            Self::from_yaml(&text).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })
        } else {
            Self::from_toml(&text).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

/// A validated descriptor with its raw rows, not yet prepared for drawing.
#[derive(Debug, Clone)]
pub struct TrackSource {
    pub index: usize,
    pub title: Option<String>,
    pub position: TrackPosition,
    pub kind: TrackType,
    pub proportion: f64,
    pub options: TrackOptions,
    pub rows: SourceData,
}

impl TrackSource {
    fn display_title(&self) -> String {
        self.title.clone().unwrap_or_else(|| "untitled".into())
    }

    /// Prepare the rows on `chrom` (all rows when `None`) into a track.
    fn build(&self, chrom: Option<&str>) -> Result<Option<Track>, ConfigError> {
        let rows = match chrom {
            Some(chrom) => self.rows.filter_chrom(chrom),
            None => self.rows.clone(),
        };
        let data = prepare(self.kind, &self.options, rows).map_err(|source| {
            ConfigError::Prepare {
                index: self.index,
                title: self.display_title(),
                source,
            }
        })?;
        // Filtering can leave a split with no facets at all.
        if self.kind == TrackType::HorSplit && data.is_empty() {
            log::warn!(
                "track {} ({}): no rows left{}; skipping split track",
                self.index,
                self.display_title(),
                chrom.map(|c| format!(" on {c}")).unwrap_or_default()
            );
            return Ok(None);
        }
        match Track::new(
            self.title.clone(),
            self.position,
            self.kind,
            self.proportion,
            data,
            self.options.clone(),
        ) {
            Ok(track) => Ok(Some(track)),
            Err(err) => {
                log::warn!("track {} ({}): {err}; skipping", self.index, self.display_title());
                Ok(None)
            }
        }
    }
}

/// A loaded track file: figure settings plus every usable track's rows.
#[derive(Debug, Clone)]
pub struct TrackConfig {
    pub path: PathBuf,
    pub settings: PlotSettings,
    pub sources: Vec<TrackSource>,
    chroms: Vec<String>,
}

fn read_rows(kind: TrackType, path: &Path) -> Result<SourceData, ReadError> {
    Ok(match kind {
        TrackType::Hor
        | TrackType::HorSplit
        | TrackType::HorOrt
        | TrackType::Strand
        | TrackType::Label => SourceData::Bed(read_bed9(path)?),
        TrackType::SelfIdent | TrackType::LocalSelfIdent => {
            SourceData::Identity(read_identity(path)?)
        }
        TrackType::Bar | TrackType::Line => SourceData::Values(read_values(path)?),
        TrackType::Legend | TrackType::Position | TrackType::Spacer => SourceData::None,
    })
}

/// Validate one descriptor. `Ok(None)` means it was skipped with a warning.
fn load_source(
    index: usize,
    desc: &TrackDescriptor,
    base_dir: &Path,
) -> Result<Option<TrackSource>, ConfigError> {
    let name = desc.title.as_deref().unwrap_or("untitled");
    let position = match desc.position.as_deref().map(str::parse::<TrackPosition>) {
        None => TrackPosition::default(),
        Some(Ok(position)) => position,
        Some(Err(err)) => {
            log::warn!("track {index} ({name}): {err}; skipping");
            return Ok(None);
        }
    };
    let kind = match desc.kind.as_deref().map(str::parse::<TrackType>) {
        Some(Ok(kind)) => kind,
        Some(Err(err)) => {
            log::warn!("track {index} ({name}): {err}; skipping");
            return Ok(None);
        }
        None => {
            log::warn!("track {index} ({name}): missing track type; skipping");
            return Ok(None);
        }
    };
    let options = match TrackOptions::from_map(kind, &desc.options) {
        Ok(options) => options,
        Err(err) => {
            log::warn!("track {index} ({name}): {err}; skipping");
            return Ok(None);
        }
    };

    let rows = if kind.has_positional_data() {
        let Some(path) = desc.path.as_deref() else {
            log::warn!("track {index} ({name}): {kind} track needs a data path; skipping");
            return Ok(None);
        };
        let path = if path.is_relative() {
            base_dir.join(path)
        } else {
            path.to_path_buf()
        };
        read_rows(kind, &path)?
    } else {
        SourceData::None
    };

    Ok(Some(TrackSource {
        index,
        title: desc.title.clone(),
        position,
        kind,
        proportion: desc.proportion,
        options,
        rows,
    }))
}

impl TrackConfig {
    /// Read a track file and every data file it names.
    pub fn load(path: &Path) -> Result<TrackConfig, ConfigError> {
        let file = TrackFile::read(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_file(file, path, base_dir)
    }

    /// Build from an already parsed file; relative data paths resolve
    /// against `base_dir`.
    pub fn from_file(
        file: TrackFile,
        path: &Path,
        base_dir: &Path,
    ) -> Result<TrackConfig, ConfigError> {
        let mut sources = Vec::with_capacity(file.tracks.len());
        for (index, desc) in file.tracks.iter().enumerate() {
            if let Some(source) = load_source(index, desc, base_dir)? {
                sources.push(source);
            }
        }
        if sources.is_empty() {
            return Err(ConfigError::NoUsableTracks {
                path: path.to_path_buf(),
            });
        }

        let mut chroms: Vec<String> = Vec::new();
        for chrom in sources.iter().flat_map(|s| s.rows.chroms()) {
            if !chroms.contains(&chrom) {
                chroms.push(chrom);
            }
        }
        log::info!(
            "{}: {} tracks over {} contigs",
            path.display(),
            sources.len(),
            chroms.len()
        );

        Ok(TrackConfig {
            path: path.to_path_buf(),
            settings: file.settings,
            sources,
            chroms,
        })
    }

    /// Contigs referenced by any track, first-seen order.
    pub fn chroms(&self) -> &[String] {
        &self.chroms
    }

    /// Prepared tracks restricted to `chrom`, or over every contig when
    /// `None`.
    pub fn track_list(&self, chrom: Option<&str>) -> Result<TrackList, ConfigError> {
        let mut tracks = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            if let Some(track) = source.build(chrom)? {
                tracks.push(track);
            }
        }
        if tracks.is_empty() {
            return Err(ConfigError::NoUsableTracks {
                path: self.path.clone(),
            });
        }
        Ok(TrackList::new(tracks))
    }
}

/// Read a track file and prepare its tracks, optionally for one contig.
pub fn read_tracks(
    path: &Path,
    chrom: Option<&str>,
) -> Result<(TrackList, PlotSettings), ConfigError> {
    let config = TrackConfig::load(path)?;
    let tracks = config.track_list(chrom)?;
    Ok((tracks, config.settings))
}
