use cenplot_protocol::{Color, Point, Rect, RenderCommand};

use super::{LegendContent, PanelContext, TrackRender};
use crate::legend::LegendEntry;
use crate::model::{BarSettings, LinePosition, Track, TrackData, TrackOptions, ValueRecord};

/// Vertical range of a value track: `ymin` up to `ymax` or the data maximum.
fn value_range(values: &[ValueRecord], opts: &BarSettings) -> (f64, f64) {
    let data_max = values
        .iter()
        .map(|v| v.value)
        .filter(|v| v.is_finite())
        .reduce(f64::max)
        .unwrap_or(opts.ymin);
    let ymax = opts.ymax.unwrap_or(data_max);
    if ymax > opts.ymin {
        (opts.ymin, ymax)
    } else {
        (opts.ymin, opts.ymin + 1.0)
    }
}

fn y_scale(range: (f64, f64), height: f64) -> impl Fn(f64) -> f64 {
    let (lo, hi) = range;
    move |v: f64| height - (v.clamp(lo, hi) - lo) / (hi - lo) * height
}

fn legend_for(opts: &BarSettings, color: Color) -> LegendContent {
    match (&opts.label, opts.base.legend) {
        (Some(label), true) => LegendContent::Entries(vec![LegendEntry::new(label.clone(), color)]),
        _ => LegendContent::None,
    }
}

pub fn render_bar(track: &Track, ctx: &PanelContext<'_>) -> TrackRender {
    let (TrackData::Values(values), TrackOptions::Bar(opts)) = (track.data(), track.options())
    else {
        return TrackRender::default();
    };
    let color = opts.color.unwrap_or(Color::BLACK).with_alpha(opts.alpha);
    let y_px = y_scale(value_range(values, opts), ctx.viewport.height);

    let commands = values
        .iter()
        .map(|v| {
            let x0 = ctx.x_px(v.start as f64);
            let x1 = ctx.x_px(v.end as f64);
            let top = y_px(v.value);
            let base = y_px(opts.ymin);
            RenderCommand::DrawRect {
                rect: Rect::new(x0, top.min(base), x1 - x0, (base - top).abs()),
                fill: color,
                stroke: None,
                label: None,
            }
        })
        .collect();

    TrackRender {
        commands,
        legend: legend_for(opts, color),
    }
}

pub fn render_line(track: &Track, ctx: &PanelContext<'_>) -> TrackRender {
    let (TrackData::Values(values), TrackOptions::Line(opts)) = (track.data(), track.options())
    else {
        return TrackRender::default();
    };
    if values.is_empty() {
        return TrackRender::default();
    }
    let color = opts.bar.color.unwrap_or(Color::BLACK).with_alpha(opts.bar.alpha);
    let y_px = y_scale(value_range(values, &opts.bar), ctx.viewport.height);

    let points: Vec<Point> = values
        .iter()
        .map(|v| {
            let x = match opts.position {
                LinePosition::Start => v.start as f64,
                LinePosition::Midpoint => (v.start + v.end) as f64 / 2.0,
            };
            Point::new(ctx.x_px(x), y_px(v.value))
        })
        .collect();

    let mut commands = Vec::with_capacity(2);
    if opts.fill
        && let (Some(first), Some(last)) = (points.first(), points.last())
    {
        let base = y_px(opts.bar.ymin);
        let mut area = points.clone();
        area.push(Point::new(last.x, base));
        area.push(Point::new(first.x, base));
        commands.push(RenderCommand::DrawPolygon {
            points: area,
            fill: color,
            stroke: None,
        });
    }
    commands.push(RenderCommand::DrawPolyline {
        points,
        color,
        width: opts.linewidth * ctx.viewport.px_per_pt,
    });

    TrackRender {
        commands,
        legend: legend_for(&opts.bar, color),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LineSettings, TrackPosition, TrackType};
    use crate::views::test_support::context;

    fn values() -> Vec<ValueRecord> {
        [(0, 5.0), (100, 10.0), (200, 0.0)]
            .into_iter()
            .map(|(start, value)| ValueRecord {
                chrom: "chr1".into(),
                start,
                end: start + 100,
                value,
            })
            .collect()
    }

    #[test]
    fn bars_scale_to_data_max() {
        let track = Track::new(
            None,
            TrackPosition::Relative,
            TrackType::Bar,
            0.2,
            TrackData::Values(values()),
            TrackOptions::Bar(BarSettings {
                label: Some("methylation".into()),
                ..BarSettings::default()
            }),
        )
        .unwrap();
        let out = render_bar(&track, &context(300.0, 50.0, 0.0, 300.0));
        let RenderCommand::DrawRect { rect, .. } = &out.commands[1] else {
            panic!("expected a rect");
        };
        assert!(rect.y.abs() < 1e-9);
        assert!((rect.h - 50.0).abs() < 1e-9);
        let RenderCommand::DrawRect { rect, .. } = &out.commands[0] else {
            panic!("expected a rect");
        };
        assert!((rect.h - 25.0).abs() < 1e-9);
        assert!(matches!(out.legend, LegendContent::Entries(ref e) if e[0].label == "methylation"));
    }

    #[test]
    fn filled_line_adds_area() {
        let track = Track::new(
            None,
            TrackPosition::Relative,
            TrackType::Line,
            0.2,
            TrackData::Values(values()),
            TrackOptions::Line(LineSettings {
                fill: true,
                position: LinePosition::Midpoint,
                ..LineSettings::default()
            }),
        )
        .unwrap();
        let out = render_line(&track, &context(300.0, 50.0, 0.0, 300.0));
        assert_eq!(out.commands.len(), 2);
        let RenderCommand::DrawPolyline { points, .. } = &out.commands[1] else {
            panic!("expected a polyline");
        };
        assert_eq!(points[0], Point::new(50.0, 25.0));
        assert_eq!(out.legend, LegendContent::None);
    }
}
