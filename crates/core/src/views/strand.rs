use cenplot_protocol::{Color, Point, Rect, RenderCommand};

use super::{PanelContext, TrackRender};
use crate::model::{Strand, Track, TrackData, TrackOptions};

/// Arrow head width as a fraction of `scale` points.
const HEAD_PER_SCALE: f64 = 0.3;
const SHAFT_RATIO: f64 = 0.4;

/// Render orientation blocks as arrows pointing along their strand.
///
/// Blocks shorter than the minimum length are not drawn.
pub fn render(track: &Track, ctx: &PanelContext<'_>) -> TrackRender {
    let (blocks, scale, fwd, rev, min_len) = match (track.data(), track.options()) {
        (TrackData::Strand(blocks), TrackOptions::HorOrt(o)) => (
            blocks,
            o.scale,
            o.fwd_color,
            o.rev_color,
            i64::from(o.mer_size.get()),
        ),
        (TrackData::Strand(blocks), TrackOptions::Strand(o)) => {
            (blocks, o.scale, o.fwd_color, o.rev_color, o.min_len)
        }
        _ => return TrackRender::default(),
    };

    let vp = &ctx.viewport;
    let mid = vp.height / 2.0;
    let head_width = (scale * HEAD_PER_SCALE * vp.px_per_pt).min(vp.height);
    let shaft_width = head_width * SHAFT_RATIO;

    let mut commands = Vec::with_capacity(blocks.len());
    let mut skipped = 0usize;
    for block in blocks {
        if block.len() < min_len {
            skipped += 1;
            continue;
        }
        let x0 = ctx.x_px(block.start as f64);
        let x1 = ctx.x_px(block.end as f64);
        let head_length = head_width.min(x1 - x0);
        let (from, to, color) = match block.strand {
            Strand::Forward => (x0, x1, fwd.unwrap_or(Color::BLACK)),
            Strand::Reverse => (x1, x0, rev.unwrap_or(Color::BLACK)),
            Strand::Unknown => {
                commands.push(RenderCommand::DrawRect {
                    rect: Rect::new(x0, mid - shaft_width / 2.0, x1 - x0, shaft_width),
                    fill: Color::GRAY,
                    stroke: None,
                    label: None,
                });
                continue;
            }
        };
        commands.push(RenderCommand::DrawArrow {
            from: Point::new(from, mid),
            to: Point::new(to, mid),
            shaft_width,
            head_width,
            head_length,
            color,
        });
    }
    if skipped > 0 {
        log::debug!("{}: {skipped} blocks shorter than {min_len} bp not drawn", ctx.chrom);
    }

    TrackRender {
        commands,
        legend: Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{StrandBlock, StrandSettings, TrackPosition, TrackType};
    use crate::views::test_support::context;

    fn block(start: i64, end: i64, strand: Strand) -> StrandBlock {
        StrandBlock {
            chrom: "chr1".into(),
            start,
            end,
            strand,
            units: 1,
            unit_bp: end - start,
        }
    }

    #[test]
    fn arrows_follow_strand_and_skip_short_blocks() {
        let track = Track::new(
            None,
            TrackPosition::Relative,
            TrackType::Strand,
            0.1,
            TrackData::Strand(vec![
                block(0, 1_000, Strand::Forward),
                block(2_000, 2_100, Strand::Forward),
                block(3_000, 4_000, Strand::Reverse),
            ]),
            TrackOptions::Strand(StrandSettings {
                rev_color: Some(Color::WHITE),
                ..StrandSettings::default()
            }),
        )
        .unwrap();
        let ctx = context(400.0, 20.0, 0.0, 4_000.0);
        let out = render(&track, &ctx);
        assert_eq!(out.commands.len(), 2);
        let RenderCommand::DrawArrow { from, to, color, .. } = &out.commands[1] else {
            panic!("expected an arrow");
        };
        assert!(from.x > to.x);
        assert_eq!(*color, Color::WHITE);
    }
}
