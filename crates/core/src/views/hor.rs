use cenplot_protocol::{Color, Point, Rect, RenderCommand};

use super::{LegendContent, PanelContext, TrackRender};
use crate::legend::LegendEntry;
use crate::model::{Track, TrackData, TrackOptions};
use crate::pipeline::hor::legend_colors;

/// Render HOR intervals as full-height colored blocks.
pub fn render(track: &Track, ctx: &PanelContext<'_>) -> TrackRender {
    let (TrackData::Hor(hors), TrackOptions::Hor(opts)) = (track.data(), track.options()) else {
        return TrackRender::default();
    };
    if hors.is_empty() {
        return TrackRender::default();
    }

    let height = ctx.viewport.height;
    let mut commands = Vec::with_capacity(hors.len() + 1);
    for hor in hors {
        let x0 = ctx.x_px(hor.record.start as f64);
        let x1 = ctx.x_px((hor.record.start + hor.display_len) as f64);
        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(x0, 0.0, x1 - x0, height),
            fill: hor.color,
            stroke: None,
            label: Some(hor.label(opts.mode)),
        });
    }

    if opts.border {
        let start = hors.iter().map(|h| h.record.start).min().unwrap_or(0);
        let end = hors
            .iter()
            .map(|h| h.record.start + h.display_len)
            .max()
            .unwrap_or(0);
        let (x0, x1) = (ctx.x_px(start as f64), ctx.x_px(end as f64));
        commands.push(RenderCommand::DrawPolyline {
            points: vec![
                Point::new(x0, 0.0),
                Point::new(x1, 0.0),
                Point::new(x1, height),
                Point::new(x0, height),
                Point::new(x0, 0.0),
            ],
            color: Color::BLACK,
            width: 1.0,
        });
    }

    let legend = if opts.base.legend {
        LegendContent::Entries(
            legend_colors(hors, opts.mode)
                .into_iter()
                .map(|(label, color)| LegendEntry::new(label, color))
                .collect(),
        )
    } else {
        LegendContent::None
    };

    TrackRender { commands, legend }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        BedRecord, HorRecord, HorSettings, Mer, Strand, TrackPosition, TrackType,
    };
    use crate::views::test_support::{context, count};

    fn hor(start: i64, mer: u32, color: Color) -> HorRecord {
        let len = 170 * i64::from(mer);
        HorRecord {
            record: BedRecord {
                chrom: "chr1".into(),
                chrom_name: None,
                start,
                end: start + len,
                name: "S1L".into(),
                score: None,
                strand: Strand::Forward,
                item_rgb: None,
            },
            mer: Mer(mer),
            display_len: len,
            color,
        }
    }

    fn track(border: bool) -> Track {
        Track::new(
            None,
            TrackPosition::Relative,
            TrackType::Hor,
            0.5,
            TrackData::Hor(vec![
                hor(0, 10, Color::BLACK),
                hor(1_700, 10, Color::BLACK),
                hor(3_400, 4, Color::WHITE),
            ]),
            TrackOptions::Hor(HorSettings {
                border,
                ..HorSettings::default()
            }),
        )
        .unwrap()
    }

    #[test]
    fn one_block_per_record() {
        let ctx = context(4_080.0, 20.0, 0.0, 4_080.0);
        let out = render(&track(false), &ctx);
        assert_eq!(count(&out.commands, |c| matches!(c, RenderCommand::DrawRect { .. })), 3);
        let RenderCommand::DrawRect { rect, .. } = &out.commands[1] else {
            panic!("expected a rect");
        };
        assert!((rect.x - 1_700.0).abs() < 1e-9);
        assert!((rect.w - 1_700.0).abs() < 1e-9);
        assert!((rect.h - 20.0).abs() < 1e-9);
    }

    #[test]
    fn legend_has_one_entry_per_mer() {
        let ctx = context(100.0, 20.0, 0.0, 4_080.0);
        let out = render(&track(false), &ctx);
        let LegendContent::Entries(entries) = out.legend else {
            panic!("expected entries");
        };
        let labels: Vec<_> = entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, ["10", "4"]);
    }

    #[test]
    fn border_wraps_all_blocks() {
        let ctx = context(100.0, 20.0, 0.0, 4_080.0);
        let out = render(&track(true), &ctx);
        assert_eq!(count(&out.commands, |c| matches!(c, RenderCommand::DrawPolyline { .. })), 1);
    }
}
