//! minifont CLI.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use serde::Serialize;

use minifont_core::charset::CharSet;
use minifont_core::harvest::Harvester;
use minifont_core::output::{write_json_pretty, write_ndjson};
use minifont_core::subset::{expand_sources, subset_fonts, FontArtifact, SubsetOptions};

/// CLI entrypoint for minifont.
#[derive(Debug, Parser)]
#[command(
    name = "minifont",
    about = "Build-time web font minifier driven by harvested site text"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Harvest site text and subset glyph sources into compressed web fonts
    Minify(MinifyArgs),
    /// Print the character set a site tree would request
    Chars(CharsArgs),
}

#[derive(Debug, Args)]
struct MinifyArgs {
    /// Root of the generated site to harvest text from
    #[arg(value_hint = ValueHint::DirPath, default_value = "public")]
    root: PathBuf,

    /// Glob selecting the glyph source fonts
    #[arg(
        short = 'g',
        long = "glyphs",
        default_value = "source/*.ttf",
        value_hint = ValueHint::AnyPath
    )]
    glyphs: String,

    /// Directory the subsetted web fonts are written into
    #[arg(
        short = 'd',
        long = "dest",
        default_value = "public",
        value_hint = ValueHint::DirPath
    )]
    dest: PathBuf,

    /// File extensions harvested for text
    #[arg(
        short = 'e',
        long = "ext",
        default_value = "html",
        value_delimiter = ',',
        value_hint = ValueHint::Other
    )]
    extensions: Vec<String>,

    /// Keep TrueType hinting tables instead of stripping them
    #[arg(long = "keep-hinting", action = ArgAction::SetTrue)]
    keep_hinting: bool,

    /// Follow symlinks while walking the site tree
    #[arg(long = "follow-symlinks", action = ArgAction::SetTrue)]
    follow_symlinks: bool,

    /// Cap the number of fonts subsetted in parallel
    #[arg(short = 'j', long = "jobs")]
    jobs: Option<usize>,

    /// Emit a single JSON array
    #[arg(long = "json", action = ArgAction::SetTrue, conflicts_with = "ndjson")]
    json: bool,

    /// Emit newline-delimited JSON
    #[arg(long = "ndjson", action = ArgAction::SetTrue)]
    ndjson: bool,
}

#[derive(Debug, Args)]
struct CharsArgs {
    /// Root of the generated site to harvest text from
    #[arg(value_hint = ValueHint::DirPath, default_value = "public")]
    root: PathBuf,

    /// File extensions harvested for text
    #[arg(
        short = 'e',
        long = "ext",
        default_value = "html",
        value_delimiter = ',',
        value_hint = ValueHint::Other
    )]
    extensions: Vec<String>,

    /// Follow symlinks while walking the site tree
    #[arg(long = "follow-symlinks", action = ArgAction::SetTrue)]
    follow_symlinks: bool,

    /// Report the character set as JSON
    #[arg(long = "json", action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct CharsReport<'a> {
    chars: &'a str,
    count: usize,
}

/// Parse CLI args and execute the selected command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Minify(args) => run_minify(args),
        Command::Chars(args) => run_chars(args),
    }
}

fn run_minify(args: MinifyArgs) -> Result<()> {
    let chars = harvest_chars(&args.root, &args.extensions, args.follow_symlinks)?;
    let sources = expand_sources(&args.glyphs)?;
    let opts = SubsetOptions {
        keep_hinting: args.keep_hinting,
        jobs: args.jobs,
    };

    let artifacts = subset_fonts(&sources, &args.dest, &chars, &opts)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if args.ndjson {
        write_ndjson(&artifacts, &mut handle)?;
    } else if args.json {
        write_json_pretty(&artifacts, &mut handle)?;
    } else {
        write_completion(&artifacts, &mut handle)?;
    }

    Ok(())
}

fn run_chars(args: CharsArgs) -> Result<()> {
    let chars = harvest_chars(&args.root, &args.extensions, args.follow_symlinks)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if args.json {
        let report = CharsReport {
            chars: chars.as_str(),
            count: chars.char_count(),
        };
        writeln!(handle, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        writeln!(handle, "{chars}")?;
    }

    Ok(())
}

fn harvest_chars(root: &Path, extensions: &[String], follow_symlinks: bool) -> Result<CharSet> {
    let text = Harvester::with_extensions(extensions.iter().cloned())
        .follow_symlinks(follow_symlinks)
        .harvest(root)?;
    Ok(CharSet::from_text(&text))
}

fn write_completion(artifacts: &[FontArtifact], mut w: impl Write) -> Result<()> {
    for artifact in artifacts {
        let unmapped = if artifact.unmapped_chars > 0 {
            format!(", {} unmapped", artifact.unmapped_chars)
        } else {
            String::new()
        };
        writeln!(
            w,
            "{} ({} glyphs, {} chars{}, {} -> {} bytes)",
            artifact.output.display(),
            artifact.glyphs,
            artifact.chars,
            unmapped,
            artifact.source_bytes,
            artifact.output_bytes,
        )?;
    }
    Ok(())
}
