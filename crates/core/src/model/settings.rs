use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Svg,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendPosition {
    Left,
    #[default]
    Right,
}

/// Figure-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlotSettings {
    /// Figure title; `{chrom}` is substituted.
    pub title: Option<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub format: Vec<OutputFormat>,
    pub transparent: bool,
    /// Width and height in inches.
    pub dim: (f64, f64),
    pub dpi: f64,
    pub legend_pos: LegendPosition,
    /// Fraction of the figure width given to the legend column.
    pub legend_prop: f64,
    /// Vertical gap between panel rows, in inches.
    pub axis_h_pad: f64,
    /// Explicit x-axis bounds shared by every track.
    #[serde(alias = "shared_xlim")]
    pub xlim: Option<(f64, f64)>,
    pub title_fontsize: f64,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            title: None,
            format: vec![OutputFormat::Svg],
            transparent: true,
            dim: (20.0, 12.0),
            dpi: 600.0,
            legend_pos: LegendPosition::Right,
            legend_prop: 0.2,
            axis_h_pad: 0.2,
            xlim: None,
            title_fontsize: 16.0,
        }
    }
}

impl PlotSettings {
    /// Canvas size in pixels.
    pub fn canvas_px(&self) -> (f64, f64) {
        (self.dim.0 * self.dpi, self.dim.1 * self.dpi)
    }

    /// Pixels per typographic point.
    pub fn px_per_pt(&self) -> f64 {
        self.dpi / 72.0
    }
}

fn one_or_many<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<OutputFormat>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(OutputFormat),
        Many(Vec<OutputFormat>),
    }
    Ok(match OneOrMany::deserialize(d)? {
        OneOrMany::One(f) => vec![f],
        OneOrMany::Many(v) => v,
    })
}
