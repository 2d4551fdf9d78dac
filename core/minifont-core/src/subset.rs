//! Subsetting pipeline: glyph source fonts in, WOFF2 artifacts out.

use std::fs;
use std::path::{Path, PathBuf};

use allsorts::binary::read::ReadScope;
use allsorts::font::MatchingPresentation;
use allsorts::font_data::FontData;
use allsorts::subset;
use allsorts::tables::FontTableProvider;
use allsorts::tag;
use anyhow::{anyhow, bail, Context, Result};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};

use crate::charset::CharSet;
use crate::woff2;

/// Report for one produced web font.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontArtifact {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Distinct characters requested from this font.
    pub chars: usize,
    /// Requested characters the font has no mapping for.
    pub unmapped_chars: usize,
    /// Glyphs retained in the subset, including .notdef.
    pub glyphs: usize,
    pub source_bytes: u64,
    pub output_bytes: u64,
}

#[derive(Debug, Default, Clone)]
pub struct SubsetOptions {
    /// Retain the cvt /fpgm/prep instruction tables. Off by default: subset
    /// web fonts are rendered by engines that ignore TrueType hinting.
    pub keep_hinting: bool,
    pub jobs: Option<usize>,
}

/// Expand a glyph-source glob into a sorted list of font paths.
///
/// A pattern that matches nothing is an error: running the pipeline without
/// source fonts would silently ship pages with no web font at all.
pub fn expand_sources(pattern: &str) -> Result<Vec<PathBuf>> {
    let entries =
        glob::glob(pattern).with_context(|| format!("invalid glyph source pattern {pattern:?}"))?;

    let mut sources = Vec::new();
    for entry in entries {
        let path = entry?;
        if path.is_file() {
            sources.push(path);
        }
    }
    sources.sort();

    if sources.is_empty() {
        return Err(anyhow!("no glyph sources matched {pattern:?}"));
    }
    Ok(sources)
}

/// Subset every source font down to `chars` and write the results into
/// `dest` as `<stem>.woff2`. The destination directory is created if needed.
///
/// An empty charset still produces output fonts (subset to just .notdef);
/// pages with no text simply get the smallest possible font.
pub fn subset_fonts(
    sources: &[PathBuf],
    dest: &Path,
    chars: &CharSet,
    opts: &SubsetOptions,
) -> Result<Vec<FontArtifact>> {
    fs::create_dir_all(dest).with_context(|| format!("creating {}", dest.display()))?;

    let run = || -> Result<Vec<FontArtifact>> {
        sources
            .par_iter()
            .map(|source| subset_one(source, dest, chars, opts))
            .collect()
    };

    if let Some(jobs) = opts.jobs {
        let pool = ThreadPoolBuilder::new().num_threads(jobs).build()?;
        pool.install(run)
    } else {
        run()
    }
}

fn subset_one(
    source: &Path,
    dest: &Path,
    chars: &CharSet,
    opts: &SubsetOptions,
) -> Result<FontArtifact> {
    let data = fs::read(source).with_context(|| format!("reading font {}", source.display()))?;

    let scope = ReadScope::new(&data);
    let font_file = scope
        .read::<FontData<'_>>()
        .map_err(|err| anyhow!("parsing font {}: {err}", source.display()))?;
    let provider = font_file
        .table_provider(0)
        .map_err(|err| anyhow!("reading tables of {}: {err}", source.display()))?;
    let mut font = allsorts::Font::new(provider)
        .map_err(|err| anyhow!("loading font {}: {err}", source.display()))?;

    // Map the charset to glyph ids. .notdef always survives; characters the
    // font cannot map are counted and skipped rather than failing the run,
    // since the harvest routinely contains punctuation a display face lacks.
    let mut glyph_ids = vec![0_u16];
    let mut unmapped = 0_usize;
    for ch in chars.chars() {
        let (glyph_id, _) = font.lookup_glyph_index(ch, MatchingPresentation::NotRequired, None);
        if glyph_id == 0 {
            unmapped += 1;
        } else {
            glyph_ids.push(glyph_id);
        }
    }
    glyph_ids.sort_unstable();
    glyph_ids.dedup();

    let provider = font_file
        .table_provider(0)
        .map_err(|err| anyhow!("reading tables of {}: {err}", source.display()))?;
    let sfnt = subset::subset(&provider, &glyph_ids)
        .map_err(|err| anyhow!("subsetting {}: {err}", source.display()))?;
    let glyphs = subset_glyph_count(&sfnt)
        .with_context(|| format!("inspecting subset of {}", source.display()))?;

    let packaged = woff2::encode(&sfnt, opts.keep_hinting)
        .with_context(|| format!("packaging {}", source.display()))?;

    let output = dest.join(output_name(source));
    fs::write(&output, &packaged).with_context(|| format!("writing {}", output.display()))?;

    Ok(FontArtifact {
        source: source.to_path_buf(),
        output,
        chars: chars.char_count(),
        unmapped_chars: unmapped,
        glyphs,
        source_bytes: data.len() as u64,
        output_bytes: packaged.len() as u64,
    })
}

/// Glyph count of the subset font, read back from its maxp table. Composite
/// glyphs pull their components into the subset, so this can exceed the
/// number of requested glyph ids.
fn subset_glyph_count(sfnt: &[u8]) -> Result<usize> {
    let font_file = ReadScope::new(sfnt)
        .read::<FontData<'_>>()
        .map_err(|err| anyhow!("parsing subset font: {err}"))?;
    let provider = font_file
        .table_provider(0)
        .map_err(|err| anyhow!("reading subset tables: {err}"))?;
    let maxp = provider
        .read_table_data(tag::MAXP)
        .map_err(|err| anyhow!("reading subset maxp: {err}"))?;
    match maxp.as_ref() {
        [_, _, _, _, hi, lo, ..] => Ok(usize::from(u16::from_be_bytes([*hi, *lo]))),
        _ => bail!("subset maxp table is truncated"),
    }
}

fn output_name(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "font".to_string());
    PathBuf::from(format!("{stem}.woff2"))
}
