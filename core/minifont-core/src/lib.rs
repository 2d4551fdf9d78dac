//! minifont-core: trims web fonts down to the characters a site actually uses.
//!
//! A generated static site knows exactly which characters it renders, so its
//! web fonts rarely need more than a few dozen glyphs. This crate walks the
//! generated output, collects every distinct character, and subsets the
//! source fonts to exactly that set before packaging them as WOFF2.
//!
//! The pipeline has three stages:
//!
//! - **Harvest**: [`harvest::Harvester`] walks the site tree and concatenates
//!   the text of every matching file. A missing tree yields empty text, not
//!   an error.
//! - **Charset**: [`charset::CharSet`] reduces that text to its distinct
//!   characters, keeping first-occurrence order.
//! - **Subset**: [`subset::subset_fonts`] maps the charset to glyph ids,
//!   subsets each source font and writes compressed WOFF2 files next to the
//!   site output.
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use minifont_core::charset::CharSet;
//! use minifont_core::harvest::Harvester;
//! use minifont_core::subset::{expand_sources, subset_fonts, SubsetOptions};
//!
//! let text = Harvester::new().harvest(Path::new("public"))?;
//! let chars = CharSet::from_text(&text);
//!
//! let sources = expand_sources("source/*.ttf")?;
//! let artifacts = subset_fonts(&sources, Path::new("public"), &chars, &SubsetOptions::default())?;
//! for artifact in &artifacts {
//!     println!("{} ({} glyphs)", artifact.output.display(), artifact.glyphs);
//! }
//! #
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! File reads and font subsetting run in parallel through rayon, but results
//! keep source order, so repeated runs over the same tree produce identical
//! fonts.

pub mod charset;
pub mod harvest;
pub mod output;
pub mod subset;
pub mod woff2;

#[cfg(test)]
pub(crate) mod tests;
