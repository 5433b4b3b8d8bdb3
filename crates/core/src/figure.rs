//! Figure assembly: places every track panel on one canvas, draws titles,
//! rulers and merged legends, and writes the outputs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use cenplot_protocol::{Color, Point, Rect, RenderCommand, TextAlign, Viewport};
use serde::Serialize;
use thiserror::Error;

use crate::layout::{Layout, LayoutError, XBounds, compile};
use crate::legend::{LegendBuilder, LegendEntry, LegendTitles};
use crate::model::{
    OutputFormat, PlotSettings, Track, TrackOptions, TrackPosition, TrackType, fill_placeholder,
};
use crate::svg::render_svg;
use crate::views::legend::render_legend_panel;
use crate::views::position::render_ruler;
use crate::views::{LegendContent, PanelContext, TrackRender, renderer_for};

/// Fraction of the canvas width reserved left of the grid for track titles.
const TITLE_GUTTER: f64 = 0.12;
const RIGHT_MARGIN: f64 = 0.02;
const TOP_MARGIN: f64 = 0.05;
const BOTTOM_MARGIN: f64 = 0.04;
/// Gap between a track title and its panel, in points.
const TITLE_PAD_PT: f64 = 6.0;

#[derive(Debug, Error)]
pub enum FigureError {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize figure: {0}")]
    Json(#[from] serde_json::Error),
}

/// One rendered contig.
#[derive(Debug, Clone)]
pub struct Figure {
    pub chrom: String,
    /// Canvas size in pixels.
    pub width: f64,
    pub height: f64,
    /// Canvas size in inches.
    pub dim: (f64, f64),
    pub layout: Layout,
    pub commands: Vec<RenderCommand>,
}

#[derive(Serialize)]
struct FigureDump<'a> {
    chrom: &'a str,
    width: f64,
    height: f64,
    x_bounds: XBounds,
    commands: &'a [RenderCommand],
}

impl Figure {
    pub fn to_svg(&self) -> String {
        render_svg(&self.commands, self.width, self.height, self.dim.0, self.dim.1)
    }

    /// The command list with canvas metadata, as JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&FigureDump {
            chrom: &self.chrom,
            width: self.width,
            height: self.height,
            x_bounds: self.layout.x_bounds,
            commands: &self.commands,
        })
    }
}

/// Pixel geometry of the compiled grid.
#[derive(Debug, Clone, PartialEq)]
struct Grid {
    /// `(x, width)` per column.
    cols: Vec<(f64, f64)>,
    /// `(y, height)` per row.
    rows: Vec<(f64, f64)>,
}

impl Grid {
    fn cell(&self, row: usize, col: usize) -> Rect {
        let (x, w) = self.cols[col];
        let (y, h) = self.rows[row];
        Rect::new(x, y, w, h)
    }
}

/// Normalize `ratios` over `extent`, separated by `gap`.
fn partition(start: f64, extent: f64, ratios: &[f64], gap: f64) -> Vec<(f64, f64)> {
    if ratios.is_empty() {
        return Vec::new();
    }
    let gaps = gap * (ratios.len() - 1) as f64;
    let usable = (extent - gaps).max(0.0);
    let total: f64 = ratios.iter().sum();
    let mut cursor = start;
    ratios
        .iter()
        .map(|r| {
            let size = if total > 0.0 {
                r / total * usable
            } else {
                usable / ratios.len() as f64
            };
            let cell = (cursor, size);
            cursor += size + gap;
            cell
        })
        .collect()
}

fn grid(layout: &Layout, area: Rect, row_gap: f64) -> Grid {
    Grid {
        cols: partition(area.x, area.w, &layout.width_ratios, 0.0),
        rows: partition(area.y, area.h, &layout.height_ratios, row_gap),
    }
}

fn local(rect: Rect, px_per_pt: f64) -> Viewport {
    Viewport {
        x: 0.0,
        y: 0.0,
        width: rect.w,
        height: rect.h,
        px_per_pt,
    }
}

/// Wrap panel commands in a group translated to `rect`, clipped to it
/// unless `clip` is off.
fn place_panel(
    out: &mut Vec<RenderCommand>,
    id: String,
    label: Option<String>,
    rect: Rect,
    clipped: Vec<RenderCommand>,
    unclipped: Vec<RenderCommand>,
) {
    out.push(RenderCommand::BeginGroup { id, label });
    out.push(RenderCommand::PushTransform {
        translate: Point::new(rect.x, rect.y),
        scale: Point::new(1.0, 1.0),
    });
    out.push(RenderCommand::SetClip {
        rect: Rect::new(0.0, 0.0, rect.w, rect.h),
    });
    out.extend(clipped);
    out.push(RenderCommand::ClearClip);
    out.extend(unclipped);
    out.push(RenderCommand::PopTransform);
    out.push(RenderCommand::EndGroup);
}

/// Index of the input track a `legend` track draws.
fn legend_target(track: &Track, source: usize) -> Option<usize> {
    match track.options() {
        TrackOptions::Legend(opts) => opts.index.or_else(|| source.checked_sub(1)),
        _ => None,
    }
}

/// Render one contig's tracks into a figure.
///
/// `tracks` must already be filtered to `chrom`.
pub fn plot_one_cen(
    tracks: &[Track],
    chrom: &str,
    settings: &PlotSettings,
) -> Result<Figure, FigureError> {
    let layout = compile(tracks, settings)?;
    let (width, height) = settings.canvas_px();
    let pt = settings.px_per_pt();
    let mut commands = Vec::new();

    if !settings.transparent {
        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(0.0, 0.0, width, height),
            fill: Color::WHITE,
            stroke: None,
            label: None,
        });
    }

    let mut top = height * TOP_MARGIN;
    if let Some(title) = settings.title.as_deref() {
        let font = settings.title_fontsize * pt;
        commands.push(RenderCommand::DrawText {
            position: Point::new(width / 2.0, top + font),
            text: fill_placeholder(title, "chrom", chrom),
            color: Color::BLACK,
            font_size: font,
            align: TextAlign::Center,
            rotation: 0.0,
        });
        top += font * 2.0;
    }

    let area = Rect::new(
        width * TITLE_GUTTER,
        top,
        width * (1.0 - TITLE_GUTTER - RIGHT_MARGIN),
        (height - top - height * BOTTOM_MARGIN).max(0.0),
    );
    let grid = grid(&layout, area, settings.axis_h_pad * settings.dpi);

    // Legend tracks may point at any input track, so render the rest first.
    let mut renders: Vec<Option<TrackRender>> = vec![None; layout.tracks.len()];
    let mut entries_by_source: HashMap<usize, LegendBuilder> = HashMap::new();
    for (i, track) in layout.tracks.iter().enumerate() {
        if track.kind() == TrackType::Legend {
            continue;
        }
        let rect = grid.cell(layout.rows[i], layout.track_col);
        let ctx = PanelContext {
            viewport: local(rect, pt),
            x_bounds: layout.x_bounds,
            chrom,
            legend_source: &[],
        };
        let render = renderer_for(track.kind())(track, &ctx);
        if let LegendContent::Entries(entries) = &render.legend {
            entries_by_source
                .entry(layout.sources[i])
                .or_default()
                .extend(entries.iter().cloned());
        }
        renders[i] = Some(render);
    }
    for (i, track) in layout.tracks.iter().enumerate() {
        if track.kind() != TrackType::Legend {
            continue;
        }
        let source: &[LegendEntry] = match legend_target(track, layout.sources[i]) {
            Some(target) => entries_by_source
                .get(&target)
                .map(LegendBuilder::entries)
                .unwrap_or_default(),
            None => &[],
        };
        if source.is_empty() {
            log::warn!(
                "{chrom}: legend track {} has no legend entries to draw",
                layout.sources[i]
            );
        }
        let rect = grid.cell(layout.rows[i], layout.track_col);
        let ctx = PanelContext {
            viewport: local(rect, pt),
            x_bounds: layout.x_bounds,
            chrom,
            legend_source: source,
        };
        renders[i] = Some(renderer_for(track.kind())(track, &ctx));
    }

    let mut row_titles: Vec<Vec<String>> = vec![Vec::new(); layout.num_rows()];
    for (i, (track, render)) in layout.tracks.iter().zip(renders.iter_mut()).enumerate() {
        let row = layout.rows[i];
        let rect = grid.cell(row, layout.track_col);
        let title = track.title_for(chrom);
        if let Some(title) = &title {
            row_titles[row].push(title.clone());
        }
        let base = track.options().base();
        let ruler = if base.hide_x || track.position() == TrackPosition::Overlap {
            Vec::new()
        } else {
            render_ruler(&local(rect, pt), layout.x_bounds, base.units_x, base.fontsize, rect.h)
        };
        let drawn = render.as_mut().map(|r| std::mem::take(&mut r.commands));
        place_panel(
            &mut commands,
            format!("track-{i}"),
            title,
            rect,
            drawn.unwrap_or_default(),
            ruler,
        );
    }

    for (row, titles) in row_titles.iter().enumerate() {
        let Some(first) = layout.rows.iter().position(|r| *r == row) else {
            continue;
        };
        if titles.is_empty() {
            continue;
        }
        let rect = grid.cell(row, layout.track_col);
        let font = layout.tracks[first].options().base().title_fontsize * pt;
        commands.push(RenderCommand::DrawText {
            position: Point::new(rect.x - TITLE_PAD_PT * pt, rect.y + rect.h / 2.0),
            text: titles.join("\n"),
            color: Color::BLACK,
            font_size: font,
            align: TextAlign::Right,
            rotation: 0.0,
        });
    }

    if let Some(legend_col) = layout.legend_col {
        let mut titles = LegendTitles::default();
        for row in 0..layout.num_rows() {
            let members: Vec<usize> = (0..layout.tracks.len())
                .filter(|i| layout.rows[*i] == row)
                .collect();
            let mut builder = LegendBuilder::default();
            let mut histogram = None;
            let mut title = None;
            let mut base = None;
            for &i in &members {
                let track = &layout.tracks[i];
                if !track.options().legend() || track.kind() == TrackType::Legend {
                    continue;
                }
                let track_title = track
                    .options()
                    .base()
                    .legend_title
                    .as_deref()
                    .map(|t| fill_placeholder(t, "chrom", chrom));
                let shown = titles.title_for(layout.sources[i], track.kind(), track_title);
                if title.is_none() {
                    title = shown;
                }
                base.get_or_insert(track.options().base());
                match renders[i].as_ref().map(|r| &r.legend) {
                    Some(LegendContent::Entries(entries)) => {
                        builder.extend(entries.iter().cloned());
                    }
                    Some(h @ LegendContent::Histogram { .. }) if histogram.is_none() => {
                        histogram = Some(h.clone());
                    }
                    _ => {}
                }
            }
            let Some(base) = base else {
                continue;
            };
            let content = match histogram {
                Some(h) => h,
                None if builder.is_empty() => LegendContent::None,
                None => LegendContent::Entries(builder.into_entries()),
            };
            if content == LegendContent::None && title.is_none() {
                continue;
            }
            let rect = grid.cell(row, legend_col);
            let drawn = render_legend_panel(&content, title.as_deref(), base, &local(rect, pt));
            place_panel(
                &mut commands,
                format!("legend-{row}"),
                None,
                rect,
                drawn,
                Vec::new(),
            );
        }
    }

    log::info!(
        "{chrom}: {} panels, {} draw commands",
        layout.tracks.len(),
        commands.len()
    );

    Ok(Figure {
        chrom: chrom.to_string(),
        width,
        height,
        dim: settings.dim,
        layout,
        commands,
    })
}

/// File stem for a contig; path separators are not allowed in names.
fn file_stem(chrom: &str) -> String {
    chrom.replace(['/', '\\'], "_")
}

/// Write `{outdir}/{chrom}.{ext}` for every requested format.
pub fn write_outputs(
    figure: &Figure,
    outdir: &Path,
    formats: &[OutputFormat],
) -> Result<Vec<PathBuf>, FigureError> {
    std::fs::create_dir_all(outdir).map_err(|source| FigureError::Io {
        path: outdir.to_path_buf(),
        source,
    })?;
    let stem = file_stem(&figure.chrom);
    let mut written = Vec::with_capacity(formats.len());
    for format in formats {
        let path = outdir.join(format!("{stem}.{}", format.extension()));
        let body = match format {
            OutputFormat::Svg => figure.to_svg(),
            OutputFormat::Json => figure.to_json()?,
        };
        std::fs::write(&path, body).map_err(|source| FigureError::Io {
            path: path.clone(),
            source,
        })?;
        log::debug!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Stack figures top to bottom into one SVG document.
pub fn merge_figures(figures: &[Figure]) -> String {
    let width = figures.iter().map(|f| f.width).fold(0.0, f64::max);
    let width_in = figures.iter().map(|f| f.dim.0).fold(0.0, f64::max);
    let height_in: f64 = figures.iter().map(|f| f.dim.1).sum();
    let mut commands = Vec::new();
    let mut y = 0.0;
    for figure in figures {
        commands.push(RenderCommand::BeginGroup {
            id: file_stem(&figure.chrom),
            label: Some(figure.chrom.clone()),
        });
        commands.push(RenderCommand::PushTransform {
            translate: Point::new(0.0, y),
            scale: Point::new(1.0, 1.0),
        });
        commands.extend(figure.commands.iter().cloned());
        commands.push(RenderCommand::PopTransform);
        commands.push(RenderCommand::EndGroup);
        y += figure.height;
    }
    render_svg(&commands, width, y, width_in, height_in)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        BandRecord, BaseSettings, BedRecord, LabelRecord, LabelSettings, LegendSettings, Strand,
        TrackData,
    };

    fn settings() -> PlotSettings {
        PlotSettings {
            dim: (10.0, 5.0),
            dpi: 72.0,
            ..PlotSettings::default()
        }
    }

    fn labels(names: &[&str]) -> TrackData {
        TrackData::Label(
            names
                .iter()
                .enumerate()
                .map(|(i, name)| LabelRecord {
                    record: BedRecord {
                        chrom: "chr1".into(),
                        chrom_name: None,
                        start: i as i64 * 100,
                        end: i as i64 * 100 + 100,
                        name: name.to_string(),
                        score: None,
                        strand: Strand::Unknown,
                        item_rgb: None,
                    },
                    color: Color::GRAY,
                })
                .collect(),
        )
    }

    fn label_track(title: &str, position: TrackPosition, names: &[&str]) -> Track {
        Track::new(
            Some(title.into()),
            position,
            TrackType::Label,
            0.5,
            labels(names),
            TrackOptions::Label(LabelSettings::default()),
        )
        .unwrap()
    }

    fn texts(commands: &[RenderCommand]) -> Vec<&str> {
        commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn partition_normalizes_with_gaps() {
        let cells = partition(0.0, 110.0, &[0.2, 0.2], 10.0);
        assert_eq!(cells, vec![(0.0, 50.0), (60.0, 50.0)]);
        assert_eq!(partition(0.0, 10.0, &[0.0, 0.0], 0.0), vec![(0.0, 5.0), (5.0, 5.0)]);
    }

    #[test]
    fn overlap_titles_stack_and_legends_merge() {
        let tracks = vec![
            label_track("{chrom} A", TrackPosition::Relative, &["ct", "dhor"]),
            label_track("B", TrackPosition::Overlap, &["dhor", "mon"]),
        ];
        let figure = plot_one_cen(&tracks, "chr1", &settings()).unwrap();
        let all = texts(&figure.commands);
        assert!(all.contains(&"chr1 A\nB"));
        let legend_labels: Vec<_> = all
            .iter()
            .filter(|t| ["ct", "dhor", "mon"].contains(t))
            .collect();
        assert_eq!(legend_labels, [&"ct", &"dhor", &"mon"]);
    }

    #[test]
    fn panels_are_grouped_transformed_and_clipped() {
        let tracks = vec![label_track("A", TrackPosition::Relative, &["ct"])];
        let figure = plot_one_cen(&tracks, "chr1", &settings()).unwrap();
        let begin = figure
            .commands
            .iter()
            .position(|c| matches!(c, RenderCommand::BeginGroup { id, .. } if id == "track-0"))
            .unwrap();
        assert!(matches!(figure.commands[begin + 1], RenderCommand::PushTransform { .. }));
        assert!(matches!(figure.commands[begin + 2], RenderCommand::SetClip { .. }));
        let pushes = figure
            .commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::PushTransform { .. }))
            .count();
        let pops = figure
            .commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::PopTransform))
            .count();
        assert_eq!(pushes, pops);
    }

    #[test]
    fn panels_fill_the_space_between_margins() {
        let tracks = vec![label_track("A", TrackPosition::Relative, &["ct"])];
        let figure = plot_one_cen(&tracks, "chr1", &settings()).unwrap();
        let begin = figure
            .commands
            .iter()
            .position(|c| matches!(c, RenderCommand::BeginGroup { id, .. } if id == "track-0"))
            .unwrap();
        let (RenderCommand::PushTransform { translate, .. }, RenderCommand::SetClip { rect }) =
            (&figure.commands[begin + 1], &figure.commands[begin + 2])
        else {
            panic!("expected transform then clip");
        };
        assert!((translate.y - figure.height * TOP_MARGIN).abs() < 1e-9);
        let bottom = translate.y + rect.h;
        assert!((bottom - figure.height * (1.0 - BOTTOM_MARGIN)).abs() < 1e-9);
    }

    #[test]
    fn opaque_figures_get_a_background() {
        let tracks = vec![label_track("A", TrackPosition::Relative, &["ct"])];
        let opaque = PlotSettings {
            transparent: false,
            ..settings()
        };
        let figure = plot_one_cen(&tracks, "chr1", &opaque).unwrap();
        assert!(matches!(
            figure.commands[0],
            RenderCommand::DrawRect { fill, .. } if fill == Color::WHITE
        ));
    }

    #[test]
    fn legend_track_draws_preceding_entries() {
        let legend = Track::new(
            None,
            TrackPosition::Relative,
            TrackType::Legend,
            0.2,
            TrackData::Empty,
            TrackOptions::Legend(LegendSettings::default()),
        )
        .unwrap();
        let hidden = LabelSettings {
            base: BaseSettings {
                legend: false,
                ..BaseSettings::default()
            },
            ..LabelSettings::default()
        };
        let source = Track::new(
            None,
            TrackPosition::Relative,
            TrackType::Label,
            0.5,
            labels(&["ct"]),
            TrackOptions::Label(hidden),
        )
        .unwrap();
        let figure = plot_one_cen(&[source, legend], "chr1", &settings()).unwrap();
        assert!(figure.layout.legend_col.is_some());
        assert!(texts(&figure.commands).is_empty());

        let band = TrackData::LocalSelfIdent(vec![BandRecord {
            chrom: "chr1".into(),
            start: 0,
            end: 100,
            identity: 99.0,
            color: Some(Color::BLACK),
        }]);
        let shown = Track::new(
            None,
            TrackPosition::Relative,
            TrackType::Label,
            0.5,
            labels(&["ct"]),
            TrackOptions::Label(LabelSettings::default()),
        )
        .unwrap();
        let legend = Track::new(
            None,
            TrackPosition::Relative,
            TrackType::Legend,
            0.2,
            TrackData::Empty,
            TrackOptions::Legend(LegendSettings {
                index: Some(0),
                ..LegendSettings::default()
            }),
        )
        .unwrap();
        let ident = Track::new(
            None,
            TrackPosition::Relative,
            TrackType::LocalSelfIdent,
            0.1,
            band,
            TrackOptions::defaults_for(TrackType::LocalSelfIdent),
        )
        .unwrap();
        let figure = plot_one_cen(&[shown, ident, legend], "chr1", &settings()).unwrap();
        // "ct" appears in the legend column and again in the legend track.
        assert_eq!(texts(&figure.commands).iter().filter(|t| **t == "ct").count(), 2);
    }

    #[test]
    fn writes_requested_formats() {
        let dir = tempfile::tempdir().unwrap();
        let tracks = vec![label_track("A", TrackPosition::Relative, &["ct"])];
        let figure = plot_one_cen(&tracks, "chr1:100-200", &settings()).unwrap();
        let written =
            write_outputs(&figure, dir.path(), &[OutputFormat::Svg, OutputFormat::Json]).unwrap();
        assert_eq!(written.len(), 2);
        let svg = std::fs::read_to_string(&written[0]).unwrap();
        assert!(svg.starts_with("<svg"));
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&written[1]).unwrap()).unwrap();
        assert_eq!(json["chrom"], "chr1:100-200");
    }

    #[test]
    fn merged_output_stacks_heights() {
        let tracks = vec![label_track("A", TrackPosition::Relative, &["ct"])];
        let a = plot_one_cen(&tracks, "chr1", &settings()).unwrap();
        let b = plot_one_cen(&tracks, "chr2", &settings()).unwrap();
        let svg = merge_figures(&[a, b]);
        assert!(svg.contains(r#"viewBox="0 0 720 720""#));
        assert!(svg.contains(r#"height="10in""#));
    }
}
