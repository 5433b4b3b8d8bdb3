use cenplot_protocol::{Color, Point, RenderCommand, TextAlign, Viewport};

use super::{PanelContext, TrackRender};
use crate::layout::XBounds;
use crate::model::{Track, TrackType};
use crate::units::Unit;

const MAJOR_TICK_PT: f64 = 4.0;
const MINOR_TICK_PT: f64 = 2.0;
const LABEL_GAP_PT: f64 = 2.0;
const MIN_MAJOR_SPACING_PT: f64 = 60.0;

/// Position track: a ruler along the panel's top edge.
pub fn render(track: &Track, ctx: &PanelContext<'_>) -> TrackRender {
    if track.kind() != TrackType::Position {
        return TrackRender::default();
    }
    let base = track.options().base();
    TrackRender {
        commands: render_ruler(&ctx.viewport, ctx.x_bounds, base.units_x, base.fontsize, 0.0),
        legend: Default::default(),
    }
}

/// Draw a genomic ruler with its baseline at `baseline_y`, ticks hanging
/// below it, labels in `unit` and an axis title underneath.
///
/// Without a `unit`, the largest one the span covers more than once is used.
pub fn render_ruler(
    viewport: &Viewport,
    bounds: XBounds,
    unit: Option<Unit>,
    font_pt: f64,
    baseline_y: f64,
) -> Vec<RenderCommand> {
    let span = bounds.span();
    let width = viewport.width;
    if span <= 0.0 || width <= 0.0 {
        return Vec::new();
    }
    let unit = unit.unwrap_or_else(|| Unit::for_span(span));
    let pt = viewport.px_per_pt;
    let x_scale = width / span;
    let font = viewport.font_px(font_pt);
    let mut commands = Vec::with_capacity(64);

    commands.push(RenderCommand::DrawLine {
        from: Point::new(0.0, baseline_y),
        to: Point::new(width, baseline_y),
        color: Color::BLACK,
        width: pt,
    });

    let (major, subdivisions) = nice_interval(span, width / pt);
    let minor = major / f64::from(subdivisions);
    let decimals = label_decimals(major, unit);

    let first_minor = (bounds.min / minor).ceil() * minor;
    let mut t = first_minor;
    while t <= bounds.max {
        let x = (t - bounds.min) * x_scale;
        let is_major = is_aligned(t, major);
        let tick = if is_major { MAJOR_TICK_PT } else { MINOR_TICK_PT } * pt;
        commands.push(RenderCommand::DrawLine {
            from: Point::new(x, baseline_y),
            to: Point::new(x, baseline_y + tick),
            color: Color::BLACK,
            width: if is_major { pt } else { pt * 0.5 },
        });
        if is_major {
            commands.push(RenderCommand::DrawText {
                position: Point::new(x, baseline_y + tick + LABEL_GAP_PT * pt + font),
                text: format!("{:.*}", decimals, unit.convert(t, decimals as u32)),
                color: Color::BLACK,
                font_size: font,
                align: TextAlign::Center,
                rotation: 0.0,
            });
        }
        t += minor;
    }

    commands.push(RenderCommand::DrawText {
        position: Point::new(
            width / 2.0,
            baseline_y + (MAJOR_TICK_PT + 2.0 * LABEL_GAP_PT) * pt + 2.0 * font,
        ),
        text: format!("Position ({})", unit.label()),
        color: Color::BLACK,
        font_size: font,
        align: TextAlign::Center,
        rotation: 0.0,
    });

    commands
}

fn is_aligned(t: f64, interval: f64) -> bool {
    let offset = t / interval;
    (offset - offset.round()).abs() < 0.001
}

/// A 1/2/5 x 10^k major interval giving roughly one major tick per
/// `MIN_MAJOR_SPACING_PT`, and how many minor steps split it.
fn nice_interval(span_bp: f64, width_pt: f64) -> (f64, u32) {
    let target_count = (width_pt / MIN_MAJOR_SPACING_PT).max(2.0);
    let raw = span_bp / target_count;
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let (step, subdivisions) = match normalized {
        n if n <= 1.0 => (1.0, 2),
        n if n <= 2.0 => (2.0, 2),
        n if n <= 5.0 => (5.0, 5),
        _ => (10.0, 2),
    };
    ((step * magnitude).max(1.0), subdivisions)
}

/// Decimals needed to tell major ticks apart in `unit`.
fn label_decimals(major_bp: f64, unit: Unit) -> usize {
    let in_unit = major_bp / unit.divisor();
    if in_unit >= 1.0 {
        0
    } else {
        (-in_unit.log10().floor()) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::test_support::context;

    #[test]
    fn nice_interval_selects_reasonable_value() {
        // 4 Mbp over 600pt => ~10 ticks => 500 kbp.
        let (interval, subs) = nice_interval(4_000_000.0, 600.0);
        assert!((interval - 500_000.0).abs() < 1e-6, "interval={interval}");
        assert_eq!(subs, 5);
    }

    #[test]
    fn label_precision_tracks_interval() {
        assert_eq!(label_decimals(500_000.0, Unit::Mbp), 1);
        assert_eq!(label_decimals(2_000_000.0, Unit::Mbp), 0);
        assert_eq!(label_decimals(50_000.0, Unit::Kbp), 0);
    }

    #[test]
    fn renders_ticks_and_labels() {
        let ctx = context(600.0, 40.0, 38_000_000.0, 42_000_000.0);
        let cmds = render_ruler(&ctx.viewport, ctx.x_bounds, Some(Unit::Mbp), 10.0, 0.0);
        let texts: Vec<&str> = cmds
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert!(texts.contains(&"38.0"));
        assert!(texts.contains(&"42.0"));
        assert!(texts.contains(&"Position (Mbp)"));
        let lines = cmds
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawLine { .. }))
            .count();
        assert!(lines > 9);
    }

    #[test]
    fn empty_span_draws_nothing() {
        let ctx = context(600.0, 40.0, 0.0, 1.0);
        let bounds = XBounds { min: 5.0, max: 5.0 };
        assert!(render_ruler(&ctx.viewport, bounds, Some(Unit::Bp), 10.0, 0.0).is_empty());
    }

    #[test]
    fn unit_follows_span_when_unset() {
        let ctx = context(600.0, 40.0, 0.0, 40_000.0);
        let cmds = render_ruler(&ctx.viewport, ctx.x_bounds, None, 10.0, 0.0);
        assert!(cmds.iter().any(
            |c| matches!(c, RenderCommand::DrawText { text, .. } if text == "Position (kbp)")
        ));
    }
}
