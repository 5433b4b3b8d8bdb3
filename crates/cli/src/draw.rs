use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use cenplot_core::layout::x_bounds;
use cenplot_core::{
    Figure, PlotSettings, TrackConfig, XBounds, merge_figures, plot_one_cen, write_outputs,
};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

#[derive(clap::Args, Debug)]
pub struct DrawArgs {
    /// Track file (TOML, or YAML for .yaml/.yml).
    #[clap(short = 't', long, value_parser)]
    pub input_tracks: PathBuf,

    /// Contigs to draw. Every contig in the track data when omitted.
    #[clap(short = 'c', long, value_parser, num_args = 1..)]
    pub chroms: Vec<String>,

    /// Output directory for per-contig figures.
    #[clap(short = 'd', long, value_parser, default_value = ".")]
    pub outdir: PathBuf,

    /// Merged SVG with every successfully drawn contig stacked vertically.
    #[clap(short = 'o', long, value_parser)]
    pub outfile: Option<PathBuf>,

    /// Number of contigs drawn in parallel.
    #[clap(short = 'p', long, value_parser, default_value = "4")]
    pub processes: NonZeroUsize,

    /// Use one x-axis range, the union over all contigs, for every figure.
    #[clap(long, action)]
    pub share_xlim: bool,

    /// Verbosity (-v info, -vv debug).
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// What happened to each requested contig.
#[derive(Debug, Default)]
pub struct Summary {
    pub drawn: Vec<String>,
    pub failed: Vec<String>,
}

/// Union of the x-axis bounds of every contig that has any.
fn shared_bounds(config: &TrackConfig, chroms: &[String]) -> Option<XBounds> {
    chroms
        .par_iter()
        .filter_map(|chrom| {
            let tracks = config.track_list(Some(chrom)).ok()?;
            match x_bounds(tracks.tracks()) {
                Ok(bounds) => Some(bounds),
                Err(err) => {
                    log::warn!("{chrom}: {err}; not included in the shared x-axis range");
                    None
                }
            }
        })
        .reduce_with(XBounds::union)
}

fn draw_one(
    config: &TrackConfig,
    settings: &PlotSettings,
    chrom: &str,
    outdir: &Path,
) -> Result<Figure> {
    let tracks = config.track_list(Some(chrom))?;
    let figure = plot_one_cen(tracks.tracks(), chrom, settings)?;
    let written = write_outputs(&figure, outdir, &settings.format)?;
    log::info!(
        "{chrom}: wrote {}",
        written
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(figure)
}

pub fn run(args: &DrawArgs) -> Result<Summary> {
    let config = TrackConfig::load(&args.input_tracks)
        .with_context(|| format!("reading track file {}", args.input_tracks.display()))?;

    let chroms: Vec<String> = if args.chroms.is_empty() {
        config.chroms().to_vec()
    } else {
        args.chroms.clone()
    };
    if chroms.is_empty() {
        bail!("no contigs to draw: none given and the track data names none");
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(args.processes.get())
        .build()
        .context("building worker pool")?;

    let mut settings = config.settings.clone();
    if args.share_xlim && settings.xlim.is_none() {
        match pool.install(|| shared_bounds(&config, &chroms)) {
            Some(bounds) => {
                log::info!("shared x-axis range: [{}, {}]", bounds.min, bounds.max);
                settings.xlim = Some((bounds.min, bounds.max));
            }
            None => log::warn!("no contig has x-axis bounds to share"),
        }
    }

    let results: Vec<(String, Result<Figure>)> = pool.install(|| {
        chroms
            .par_iter()
            .map(|chrom| {
                let result = draw_one(&config, &settings, chrom, &args.outdir)
                    .with_context(|| format!("drawing {chrom}"));
                (chrom.clone(), result)
            })
            .collect()
    });

    let mut summary = Summary::default();
    let mut figures = Vec::with_capacity(results.len());
    for (chrom, result) in results {
        match result {
            Ok(figure) => {
                summary.drawn.push(chrom);
                figures.push(figure);
            }
            Err(err) => {
                log::error!("{err:#}");
                summary.failed.push(chrom);
            }
        }
    }

    if let Some(outfile) = &args.outfile {
        if figures.is_empty() {
            log::warn!("no figures drawn; not writing {}", outfile.display());
        } else {
            std::fs::write(outfile, merge_figures(&figures))
                .with_context(|| format!("writing merged figure {}", outfile.display()))?;
            log::info!("wrote merged figure {}", outfile.display());
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct Cli {
        #[clap(flatten)]
        draw: DrawArgs,
    }

    const HOR_ROWS: &str = "\
chr1\t0\t1700\tS1C1H1L\t0\t+\t0\t1700\t0,0,0
chr1\t1700\t3400\tS1C1H1L\t0\t-\t1700\t3400\t0,0,0
chr2\t0\t340\tS2C2H1L\t0\t-\t0\t340\t0,0,0
";

    fn setup(dir: &Path) -> PathBuf {
        std::fs::write(dir.join("hor.bed"), HOR_ROWS).unwrap();
        let tracks = dir.join("tracks.toml");
        std::fs::write(
            &tracks,
            r#"
            [settings]
            dim = [4.0, 2.0]
            dpi = 72

            [[tracks]]
            title = "{chrom}"
            type = "hor"
            proportion = 0.5
            path = "hor.bed"

            [[tracks]]
            type = "strand"
            proportion = 0.2
            path = "hor.bed"
            options = { min_len = 0 }
            "#,
        )
        .unwrap();
        tracks
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "cenplot", "-t", "t.toml", "-c", "chr1", "chr2", "-p", "2", "--share-xlim", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.draw.chroms, ["chr1", "chr2"]);
        assert_eq!(cli.draw.processes.get(), 2);
        assert!(cli.draw.share_xlim);
        assert_eq!(cli.draw.verbose, 2);
        assert!(Cli::try_parse_from(["cenplot", "-t", "t.toml", "-p", "0"]).is_err());
    }

    #[test]
    fn draws_every_contig_and_merges() {
        let dir = tempfile::tempdir().unwrap();
        let tracks = setup(dir.path());
        let out = dir.path().join("out");
        let merged = dir.path().join("all.svg");
        let args = DrawArgs {
            input_tracks: tracks,
            chroms: Vec::new(),
            outdir: out.clone(),
            outfile: Some(merged.clone()),
            processes: NonZeroUsize::MIN,
            share_xlim: true,
            verbose: 0,
        };
        let summary = run(&args).unwrap();
        assert!(summary.failed.is_empty());
        assert_eq!(summary.drawn.len(), 2);
        assert!(out.join("chr1.svg").exists());
        assert!(out.join("chr2.svg").exists());
        assert!(std::fs::read_to_string(merged).unwrap().contains("chr2"));
    }

    #[test]
    fn one_bad_contig_does_not_stop_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let tracks = setup(dir.path());
        let args = DrawArgs {
            input_tracks: tracks,
            chroms: vec!["chr1".into(), "chrUn".into()],
            outdir: dir.path().join("out"),
            outfile: None,
            processes: NonZeroUsize::MIN,
            share_xlim: false,
            verbose: 0,
        };
        let summary = run(&args).unwrap();
        assert_eq!(summary.drawn, ["chr1"]);
        assert_eq!(summary.failed, ["chrUn"]);
    }
}
