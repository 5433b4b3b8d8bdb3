mod draw;

use std::process::ExitCode;

use clap::Parser;

/// Draw centromere figures from annotation tracks.
#[derive(Parser, Debug)]
#[command(author, version, about, disable_help_subcommand = true)]
enum Args {
    /// Draw one figure per contig from a track file.
    Draw(draw::DrawArgs),
}

fn init_logger(verbose: u8) {
    env_logger::Builder::new()
        .filter_level(match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();
}

fn main() -> ExitCode {
    match Args::parse() {
        Args::Draw(args) => {
            init_logger(args.verbose);
            match draw::run(&args) {
                Ok(summary) if summary.failed.is_empty() => ExitCode::SUCCESS,
                Ok(summary) => {
                    log::error!(
                        "{} of {} contigs failed: {}",
                        summary.failed.len(),
                        summary.failed.len() + summary.drawn.len(),
                        summary.failed.join(", ")
                    );
                    ExitCode::FAILURE
                }
                Err(err) => {
                    log::error!("{err:#}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
