use cenplot_protocol::{Color, Point, Rect, RenderCommand, TextAlign, Viewport};

use super::{LegendContent, PanelContext, TrackRender};
use crate::legend::LegendEntry;
use crate::model::{BaseSettings, Track, TrackOptions, fill_placeholder};
use crate::pipeline::self_ident::HistogramBin;

const ROW_SPACING: f64 = 1.6;
const SWATCH_GAP: f64 = 0.4;
const HISTOGRAM_MAX: f64 = 100.0;

/// Draw a legend panel: optional title, then either a swatch grid or a
/// histogram of identity values.
pub fn render_legend_panel(
    content: &LegendContent,
    title: Option<&str>,
    base: &BaseSettings,
    viewport: &Viewport,
) -> Vec<RenderCommand> {
    let font = viewport.font_px(base.legend_fontsize);
    let mut commands = Vec::new();
    let mut top = 0.0;

    if let Some(title) = title.filter(|t| !t.is_empty()) {
        let title_font = viewport.font_px(base.title_fontsize);
        commands.push(RenderCommand::DrawText {
            position: Point::new(viewport.width / 2.0, title_font),
            text: title.to_string(),
            color: Color::BLACK,
            font_size: title_font,
            align: TextAlign::Center,
            rotation: 0.0,
        });
        top = title_font * ROW_SPACING;
    }
    if base.legend_title_only {
        return commands;
    }

    match content {
        LegendContent::None => {}
        LegendContent::Entries(entries) => {
            swatch_grid(&mut commands, entries, base.legend_columns(), font, top, viewport.width)
        }
        LegendContent::Histogram { bins, xmin } => {
            let area = Rect::new(0.0, top, viewport.width, viewport.height - top);
            histogram(&mut commands, bins, *xmin, font, area)
        }
    }
    commands
}

fn swatch_grid(
    commands: &mut Vec<RenderCommand>,
    entries: &[LegendEntry],
    ncols: usize,
    font: f64,
    top: f64,
    width: f64,
) {
    let ncols = ncols.clamp(1, entries.len().max(1));
    let col_width = width / ncols as f64;
    let row_height = font * ROW_SPACING;
    for (i, entry) in entries.iter().enumerate() {
        let x = (i % ncols) as f64 * col_width;
        let y = top + (i / ncols) as f64 * row_height;
        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(x, y, font, font),
            fill: entry.color,
            stroke: Some(Color::BLACK),
            label: None,
        });
        commands.push(RenderCommand::DrawText {
            position: Point::new(x + font * (1.0 + SWATCH_GAP), y + font),
            text: entry.label.clone(),
            color: Color::BLACK,
            font_size: font,
            align: TextAlign::Left,
            rotation: 0.0,
        });
    }
}

fn histogram(
    commands: &mut Vec<RenderCommand>,
    bins: &[HistogramBin],
    xmin: f64,
    font: f64,
    area: Rect,
) {
    let span = HISTOGRAM_MAX - xmin;
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0);
    if span <= 0.0 || max_count == 0 {
        return;
    }
    // Leave room for tick labels under the axis.
    let plot_h = (area.h - font * 2.0 * ROW_SPACING).max(0.0);
    let baseline = area.y + plot_h;
    let x_px = |v: f64| area.x + (v.clamp(xmin, HISTOGRAM_MAX) - xmin) / span * area.w;

    for bin in bins.iter().filter(|b| b.count > 0 && b.end > xmin) {
        let x0 = x_px(bin.start);
        let x1 = x_px(bin.end);
        let h = bin.count as f64 / max_count as f64 * plot_h;
        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(x0, baseline - h, (x1 - x0).max(0.0), h),
            fill: bin.color.unwrap_or(Color::GRAY),
            stroke: None,
            label: None,
        });
    }
    commands.push(RenderCommand::DrawLine {
        from: Point::new(area.x, baseline),
        to: Point::new(area.right(), baseline),
        color: Color::BLACK,
        width: 1.0,
    });
    for (value, align) in [(xmin, TextAlign::Left), (HISTOGRAM_MAX, TextAlign::Right)] {
        commands.push(RenderCommand::DrawText {
            position: Point::new(x_px(value), baseline + font * 1.2),
            text: format!("{value}"),
            color: Color::BLACK,
            font_size: font,
            align,
            rotation: 0.0,
        });
    }
    commands.push(RenderCommand::DrawText {
        position: Point::new(area.x + area.w / 2.0, baseline + font * 1.2 * 2.0),
        text: "Sequence identity (%)".into(),
        color: Color::BLACK,
        font_size: font,
        align: TextAlign::Center,
        rotation: 0.0,
    });
}

/// A `legend` track: draws the entries of the track it references.
pub fn render_legend_track(track: &Track, ctx: &PanelContext<'_>) -> TrackRender {
    let TrackOptions::Legend(opts) = track.options() else {
        return TrackRender::default();
    };
    if ctx.legend_source.is_empty() {
        return TrackRender::default();
    }
    let title = opts
        .base
        .legend_title
        .as_deref()
        .map(|t| fill_placeholder(t, "chrom", ctx.chrom));
    let content = LegendContent::Entries(ctx.legend_source.to_vec());
    TrackRender {
        commands: render_legend_panel(&content, title.as_deref(), &opts.base, &ctx.viewport),
        legend: LegendContent::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LegendSettings, TrackData, TrackPosition, TrackType};
    use crate::views::test_support::{context, count};

    fn entries() -> Vec<LegendEntry> {
        ["12", "8", "4", "2"]
            .into_iter()
            .map(|l| LegendEntry::new(l, Color::BLACK))
            .collect()
    }

    fn is_text(c: &RenderCommand) -> bool {
        matches!(c, RenderCommand::DrawText { .. })
    }

    #[test]
    fn grid_wraps_at_column_count() {
        let base = BaseSettings {
            legend_ncols: Some(2),
            ..BaseSettings::default()
        };
        let vp = context(200.0, 100.0, 0.0, 1.0).viewport;
        let cmds = render_legend_panel(&LegendContent::Entries(entries()), None, &base, &vp);
        let swatches: Vec<Rect> = cmds
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect();
        assert_eq!(swatches.len(), 4);
        assert_eq!(swatches[0].y, swatches[1].y);
        assert!(swatches[2].y > swatches[0].y);
        assert_eq!(swatches[2].x, 0.0);
        assert_eq!(swatches[1].x, 100.0);
    }

    #[test]
    fn title_only_skips_entries() {
        let base = BaseSettings {
            legend_title_only: true,
            ..BaseSettings::default()
        };
        let vp = context(200.0, 100.0, 0.0, 1.0).viewport;
        let content = LegendContent::Entries(entries());
        let cmds = render_legend_panel(&content, Some("HORs"), &base, &vp);
        assert_eq!(cmds.len(), 1);
        assert!(is_text(&cmds[0]));
    }

    #[test]
    fn histogram_starts_at_xmin() {
        let bins = vec![
            HistogramBin {
                start: 50.0,
                end: 60.0,
                count: 3,
                color: None,
            },
            HistogramBin {
                start: 90.0,
                end: 100.0,
                count: 6,
                color: Some(Color::WHITE),
            },
        ];
        let vp = context(100.0, 100.0, 0.0, 1.0).viewport;
        let cmds = render_legend_panel(
            &LegendContent::Histogram { bins, xmin: 70.0 },
            None,
            &BaseSettings::default(),
            &vp,
        );
        let bars: Vec<Rect> = cmds
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect();
        assert_eq!(bars.len(), 1);
        assert!((bars[0].x - (20.0 / 30.0 * 100.0)).abs() < 1e-9);
        assert_eq!(count(&cmds, is_text), 3);
    }

    #[test]
    fn legend_track_uses_source_entries() {
        let track = Track::new(
            None,
            TrackPosition::Relative,
            TrackType::Legend,
            0.1,
            TrackData::Empty,
            TrackOptions::Legend(LegendSettings {
                base: BaseSettings {
                    legend_title: Some("{chrom} HORs".into()),
                    ..BaseSettings::default()
                },
                index: None,
            }),
        )
        .unwrap();
        let source = entries();
        let base_ctx = context(300.0, 60.0, 0.0, 1.0);
        let ctx = PanelContext {
            viewport: base_ctx.viewport,
            x_bounds: base_ctx.x_bounds,
            chrom: "chr1",
            legend_source: &source,
        };
        let out = render_legend_track(&track, &ctx);
        assert!(out.commands.iter().any(
            |c| matches!(c, RenderCommand::DrawText { text, .. } if text == "chr1 HORs")
        ));
        assert_eq!(
            count(&out.commands, |c| matches!(c, RenderCommand::DrawRect { .. })),
            4
        );
    }
}
