//! Site-text harvesting for minifont-core.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use walkdir::WalkDir;

/// Recursive filesystem walker that reads the text of generated site output.
///
/// Traversal order is name-sorted, so the harvested string is stable for a
/// fixed tree regardless of directory iteration order.
#[derive(Debug, Clone)]
pub struct Harvester {
    extensions: Vec<String>,
    follow_symlinks: bool,
}

impl Harvester {
    /// Harvester for the default extension set (`html`).
    pub fn new() -> Self {
        Self::with_extensions(["html"])
    }

    /// Harvester for an explicit set of file extensions. Extensions are
    /// matched case-insensitively and may be given with or without the
    /// leading dot.
    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.into().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        Self {
            extensions,
            follow_symlinks: false,
        }
    }

    /// Follow symlinks during traversal. Applies to the root itself as well
    /// as links inside the tree.
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// All matching files under `root`, in name-sorted traversal order.
    ///
    /// A missing root is not an error: sites with no generated output yield
    /// an empty list.
    pub fn collect_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.exists() {
            return Ok(Vec::new());
        }

        // walkdir follows a symlinked root even with follow_links off, so
        // the root link has to be gated separately.
        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(self.follow_symlinks)
            .follow_root_links(self.follow_symlinks)
            .sort_by_file_name();
        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() && self.matches(entry.path()) {
                files.push(entry.path().to_path_buf());
            }
        }

        Ok(files)
    }

    /// Concatenated UTF-8 contents of every matching file under `root`.
    ///
    /// Files are read in parallel but joined in traversal order, so repeated
    /// harvests of the same tree produce the same string.
    pub fn harvest(&self, root: &Path) -> Result<String> {
        let files = self.collect_files(root)?;
        let contents = files
            .par_iter()
            .map(|path| {
                fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(contents.concat())
    }

    fn matches(&self, path: &Path) -> bool {
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ext.to_ascii_lowercase(),
            None => return false,
        };

        self.extensions.iter().any(|want| *want == ext)
    }
}

impl Default for Harvester {
    fn default() -> Self {
        Self::new()
    }
}
