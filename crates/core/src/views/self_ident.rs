use cenplot_protocol::{Point, Rect, RenderCommand};

use super::{LegendContent, PanelContext, TrackRender};
use crate::colors::{IDENTITY_BUCKETS, identity_bucket};
use crate::legend::LegendEntry;
use crate::model::{Track, TrackData, TrackOptions};
use crate::pipeline::self_ident::identity_histogram;

/// Render identity diamonds scaled to fill the panel height.
///
/// With `invert` the triangle hangs from the top edge.
pub fn render(track: &Track, ctx: &PanelContext<'_>) -> TrackRender {
    let (TrackData::SelfIdent(diamonds), TrackOptions::SelfIdent(opts)) =
        (track.data(), track.options())
    else {
        return TrackRender::default();
    };
    if diamonds.is_empty() {
        return TrackRender::default();
    }

    let sign = if opts.invert { -1.0 } else { 1.0 };
    let (ymin, ymax) = diamonds
        .iter()
        .flat_map(|d| d.vertices.iter().map(|p| p.y * sign))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
            (lo.min(y), hi.max(y))
        });
    let height = ctx.viewport.height;
    let y_px = |y: f64| {
        if ymax > ymin {
            (ymax - y * sign) / (ymax - ymin) * height
        } else {
            height / 2.0
        }
    };

    let commands = diamonds
        .iter()
        .filter_map(|d| {
            let fill = d.color?;
            Some(RenderCommand::DrawPolygon {
                points: d
                    .vertices
                    .iter()
                    .map(|p| Point::new(ctx.x_px(p.x), y_px(p.y)))
                    .collect(),
                fill,
                stroke: None,
            })
        })
        .collect();

    let legend = if opts.base.legend {
        let values: Vec<f64> = diamonds.iter().map(|d| d.identity).collect();
        LegendContent::Histogram {
            bins: identity_histogram(&values, opts.legend_bins),
            xmin: opts.legend_xmin,
        }
    } else {
        LegendContent::None
    };

    TrackRender { commands, legend }
}

/// Render the near-diagonal identity band as colored windows.
pub fn render_band(track: &Track, ctx: &PanelContext<'_>) -> TrackRender {
    let (TrackData::LocalSelfIdent(bands), TrackOptions::LocalSelfIdent(opts)) =
        (track.data(), track.options())
    else {
        return TrackRender::default();
    };

    let height = ctx.viewport.height;
    let commands = bands
        .iter()
        .filter_map(|b| {
            let fill = b.color?;
            let x0 = ctx.x_px(b.start as f64);
            let x1 = ctx.x_px(b.end as f64);
            Some(RenderCommand::DrawRect {
                rect: Rect::new(x0, 0.0, x1 - x0, height),
                fill,
                stroke: None,
                label: None,
            })
        })
        .collect();

    let legend = if opts.base.legend {
        let mut used: Vec<usize> = bands
            .iter()
            .filter_map(|b| identity_bucket(b.identity))
            .collect();
        used.sort_unstable();
        used.dedup();
        LegendContent::Entries(
            used.into_iter()
                .rev()
                .map(|i| {
                    let bucket = &IDENTITY_BUCKETS[i];
                    LegendEntry::new(format!("{:.2}-{:.2}", bucket.start, bucket.end), bucket.color)
                })
                .collect(),
        )
    } else {
        LegendContent::None
    };

    TrackRender { commands, legend }
}
