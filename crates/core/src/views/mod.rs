//! Per-type track renderers.
//!
//! Every renderer draws one track into a panel whose origin is the panel's
//! top-left corner; the figure assembly translates panels into place.

pub mod hor;
pub mod label;
pub mod legend;
pub mod position;
pub mod self_ident;
pub mod strand;
pub mod values;

use cenplot_protocol::{RenderCommand, Viewport};

use crate::layout::XBounds;
use crate::legend::LegendEntry;
use crate::model::{Track, TrackType};
use crate::pipeline::self_ident::HistogramBin;

/// Everything a renderer needs besides the track itself.
#[derive(Debug, Clone, Copy)]
pub struct PanelContext<'a> {
    /// Panel size; `x` and `y` are zero.
    pub viewport: Viewport,
    pub x_bounds: XBounds,
    pub chrom: &'a str,
    /// Entries of the track a `Legend` track points at.
    pub legend_source: &'a [LegendEntry],
}

impl PanelContext<'_> {
    /// Genomic position to panel x.
    pub fn x_px(&self, pos: f64) -> f64 {
        (pos - self.x_bounds.min) / self.x_bounds.span() * self.viewport.width
    }
}

/// What a track contributes to its legend panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LegendContent {
    #[default]
    None,
    Entries(Vec<LegendEntry>),
    Histogram { bins: Vec<HistogramBin>, xmin: f64 },
}

#[derive(Debug, Clone, Default)]
pub struct TrackRender {
    pub commands: Vec<RenderCommand>,
    pub legend: LegendContent,
}

pub type Renderer = fn(&Track, &PanelContext<'_>) -> TrackRender;

/// Renderer for a track type.
pub fn renderer_for(kind: TrackType) -> Renderer {
    match kind {
        TrackType::Hor | TrackType::HorSplit => hor::render,
        TrackType::HorOrt | TrackType::Strand => strand::render,
        TrackType::Label => label::render,
        TrackType::SelfIdent => self_ident::render,
        TrackType::LocalSelfIdent => self_ident::render_band,
        TrackType::Bar => values::render_bar,
        TrackType::Line => values::render_line,
        TrackType::Legend => legend::render_legend_track,
        TrackType::Position => position::render,
        TrackType::Spacer => render_spacer,
    }
}

fn render_spacer(_track: &Track, _ctx: &PanelContext<'_>) -> TrackRender {
    TrackRender::default()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn context(width: f64, height: f64, min: f64, max: f64) -> PanelContext<'static> {
        PanelContext {
            viewport: Viewport {
                x: 0.0,
                y: 0.0,
                width,
                height,
                px_per_pt: 1.0,
            },
            x_bounds: XBounds { min, max },
            chrom: "chr1",
            legend_source: &[],
        }
    }

    pub fn count<F: Fn(&RenderCommand) -> bool>(commands: &[RenderCommand], pred: F) -> usize {
        commands.iter().filter(|c| pred(c)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TrackData, TrackOptions, TrackPosition};

    #[test]
    fn every_type_has_a_renderer() {
        let ctx = test_support::context(100.0, 10.0, 0.0, 1.0);
        for kind in TrackType::ALL {
            let track = Track::new(
                None,
                TrackPosition::Relative,
                kind,
                0.1,
                TrackData::Empty,
                TrackOptions::defaults_for(kind),
            )
            .unwrap();
            let out = renderer_for(kind)(&track, &ctx);
            if kind != TrackType::Position {
                assert!(out.commands.is_empty(), "{kind} drew on an empty track");
            }
        }
    }

    #[test]
    fn maps_positions_into_panel() {
        let ctx = test_support::context(200.0, 10.0, 1_000.0, 2_000.0);
        assert!((ctx.x_px(1_500.0) - 100.0).abs() < 1e-9);
        assert!((ctx.x_px(1_000.0)).abs() < 1e-9);
    }
}
