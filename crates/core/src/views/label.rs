use cenplot_protocol::{Color, Point, Rect, RenderCommand};

use super::{LegendContent, PanelContext, TrackRender};
use crate::legend::{LegendEntry, dedup_entries};
use crate::model::{LabelShape, Track, TrackData, TrackOptions};

/// Names that mean "no label".
fn is_blank(name: &str) -> bool {
    matches!(name.trim(), "" | "-" | ".")
}

pub fn render(track: &Track, ctx: &PanelContext<'_>) -> TrackRender {
    let (TrackData::Label(labels), TrackOptions::Label(opts)) = (track.data(), track.options())
    else {
        return TrackRender::default();
    };

    let height = ctx.viewport.height;
    let stroke = opts.border.then_some(Color::BLACK);
    let mut commands = Vec::with_capacity(labels.len());
    for label in labels {
        let x0 = ctx.x_px(label.record.start as f64);
        let x1 = ctx.x_px(label.record.end as f64);
        let name = (!is_blank(&label.record.name)).then(|| label.record.name.clone());
        match opts.shape {
            LabelShape::Rect => commands.push(RenderCommand::DrawRect {
                rect: Rect::new(x0, 0.0, x1 - x0, height),
                fill: label.color,
                stroke,
                label: name,
            }),
            LabelShape::Tri => commands.push(RenderCommand::DrawPolygon {
                points: vec![
                    Point::new(x0, 0.0),
                    Point::new(x1, 0.0),
                    Point::new((x0 + x1) / 2.0, height),
                ],
                fill: label.color,
                stroke,
            }),
        }
    }

    let legend = if opts.base.legend {
        LegendContent::Entries(dedup_entries(
            labels
                .iter()
                .filter(|l| !is_blank(&l.record.name))
                .map(|l| LegendEntry::new(l.record.name.clone(), l.color)),
        ))
    } else {
        LegendContent::None
    };

    TrackRender { commands, legend }
}
