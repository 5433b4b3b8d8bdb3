//! Integration test: read track files with real data files, compile the
//! panel grid and write figures to disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cenplot_core::layout::compile;
use cenplot_core::{TrackConfig, TrackType, plot_one_cen, read_tracks, write_outputs};
use cenplot_protocol::RenderCommand;

fn data(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
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
fn three_rows_two_columns_with_overlap() {
    let (tracks, settings) = read_tracks(&data("tracks.toml"), Some("chr1")).unwrap();
    assert_eq!(tracks.len(), 4);
    assert_eq!(tracks.chroms(), ["chr1"]);

    let layout = compile(tracks.tracks(), &settings).unwrap();
    assert_eq!(layout.num_rows(), 3);
    assert_eq!(layout.num_cols(), 2);
    assert_eq!(layout.height_ratios, [0.4, 0.3, 0.3]);
    assert_eq!(layout.width_ratios, [0.8, 0.2]);
    assert_eq!(layout.track_col, 0);
    assert_eq!(layout.legend_col, Some(1));
    assert_eq!(
        layout.row_map(),
        BTreeMap::from([(0, 0), (1, 1), (2, 2), (3, 2)])
    );
    assert_eq!(layout.x_bounds.min, 0.0);
    assert!(layout.x_bounds.max >= 3740.0);
}

#[test]
fn split_track_expands_into_facets() {
    let (tracks, settings) = read_tracks(&data("split.yaml"), Some("chr1")).unwrap();
    let layout = compile(tracks.tracks(), &settings).unwrap();

    assert_eq!(layout.num_rows(), 6);
    for ratio in &layout.height_ratios[..4] {
        assert!((ratio - 0.1).abs() < 1e-12);
    }
    assert_eq!(layout.height_ratios[4..], [0.1, 0.05]);
    assert_eq!(layout.sources, [0, 0, 0, 0, 1, 2]);
    let titles: Vec<_> = layout.tracks[..4]
        .iter()
        .map(|t| t.title().unwrap_or_default())
        .collect();
    assert_eq!(titles, ["8-mers", "6-mers", "4-mers", "2-mers"]);
    assert!(layout.tracks[..4].iter().all(|t| t.kind() == TrackType::HorSplit));
    assert_eq!((layout.x_bounds.min, layout.x_bounds.max), (0.0, 3400.0));
}

#[test]
fn split_track_with_one_facet_on_other_contig() {
    let (tracks, settings) = read_tracks(&data("split.yaml"), Some("chr2")).unwrap();
    let layout = compile(tracks.tracks(), &settings).unwrap();
    assert_eq!(layout.num_rows(), 3);
    assert_eq!(layout.tracks[0].title(), Some("2-mers"));
}

#[test]
fn each_split_track_keeps_its_legend_title() {
    let (tracks, settings) = read_tracks(&data("two_splits.yaml"), Some("chr1")).unwrap();
    let figure = plot_one_cen(tracks.tracks(), "chr1", &settings).unwrap();
    let labels = texts(&figure.commands);
    for title in ["First pass", "Second pass"] {
        let count = labels.iter().filter(|t| **t == title).count();
        assert_eq!(count, 1, "legend title {title} drawn {count} times");
    }
}

#[test]
fn contigs_come_from_every_data_file() {
    let config = TrackConfig::load(&data("tracks.toml")).unwrap();
    assert_eq!(config.chroms(), ["chr1", "chr2"]);
    assert_eq!(config.sources.len(), 4);
}

#[test]
fn draws_and_writes_figure() {
    let (tracks, settings) = read_tracks(&data("tracks.toml"), Some("chr1")).unwrap();
    let figure = plot_one_cen(tracks.tracks(), "chr1", &settings).unwrap();

    assert_eq!((figure.width, figure.height), (576.0, 432.0));
    let labels = texts(&figure.commands);
    assert!(labels.contains(&"chr1 centromere"));
    assert!(labels.contains(&"HOR"));
    assert!(labels.contains(&"Identity\nCoverage"));
    for name in ["ct", "dhor", "mon"] {
        assert!(labels.contains(&name), "missing legend entry {name}");
    }
    assert!(labels.contains(&"Sequence identity (%)"));

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

    let dir = tempfile::tempdir().unwrap();
    let written = write_outputs(&figure, dir.path(), &settings.format).unwrap();
    assert_eq!(
        written,
        [dir.path().join("chr1.svg"), dir.path().join("chr1.json")]
    );

    let svg = std::fs::read_to_string(&written[0]).unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains(r#"width="8in""#));
    assert!(svg.contains("chr1 centromere"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&written[1]).unwrap()).unwrap();
    assert_eq!(json["chrom"], "chr1");
    assert_eq!(json["x_bounds"]["min"], 0.0);
    assert!(json["commands"].as_array().is_some_and(|c| !c.is_empty()));
}

#[test]
fn contig_without_data_fails_to_lay_out() {
    let (tracks, settings) = read_tracks(&data("tracks.toml"), Some("chrUn")).unwrap();
    assert!(plot_one_cen(tracks.tracks(), "chrUn", &settings).is_err());
}
