//! Print the codepoints encoded by each subtable of a font's cmap.

use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};

use clap::Parser;
use cmap_dump::{
    CmapDumpError, Font,
    dump::{Dumper, Variant},
};
use log::debug;

#[derive(Parser)]
#[command(version, about = "Print the codepoints of every cmap subtable of a font")]
struct Cli {
    /// Font file (.ttf, .otf or .ttc)
    font: PathBuf,

    /// Only dump format 12 subtables, keeping the order the subtable lists its codepoints
    #[arg(long)]
    raw: bool,

    /// Dump subtables of this format instead of the default set, may be repeated
    #[arg(long = "format", value_name = "N")]
    formats: Vec<u16>,

    /// Font index inside a TrueType Collection
    #[arg(long, default_value_t = 0)]
    index: u32,
}

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error(transparent)]
    Font(#[from] CmapDumpError),

    #[error(transparent)]
    Format(#[from] cmap_dump::tables::TableEncodingError),

    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),
}

fn main() -> ExitCode {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "warn"),
    );
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    let variant = if cli.raw { Variant::Raw } else { Variant::Sorted };
    let mut dumper = Dumper::new(variant);
    if !cli.formats.is_empty() {
        dumper = dumper.with_formats(&cli.formats)?;
    }

    let mut font = Font::open_index(&cli.font, cli.index)?;
    let cmap = font.cmap()?;
    debug!(
        "{} has {} cmap subtable(s), dumping {:?}",
        cli.font.display(),
        cmap.subtables().len(),
        dumper.variant()
    );

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    dumper.write(&cmap, &mut out)?;
    out.flush()?;

    Ok(())
}
