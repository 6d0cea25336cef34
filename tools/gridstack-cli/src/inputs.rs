//! Input discovery.

use std::path::{Path, PathBuf};

use gridstack_common::error::{GridstackError, GridstackResult};
use gridstack_render_engine::media::extension_of;
use walkdir::{DirEntry, WalkDir};

/// How to collect inputs from a directory.
#[derive(Debug, Clone)]
pub struct Discovery {
    /// Accepted extensions, lowercase without the dot.
    pub exts: Vec<String>,

    /// Descend into subdirectories.
    pub recursive: bool,

    /// Keep at most this many files.
    pub limit: Option<usize>,

    /// Never pick these files (outputs of previous runs).
    pub exclude: Vec<PathBuf>,
}

impl Discovery {
    pub fn new(exts: &[String]) -> Self {
        Self {
            exts: exts
                .iter()
                .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
            recursive: false,
            limit: None,
            exclude: Vec::new(),
        }
    }

    /// Matching files under `dir`, sorted by path and truncated to the limit.
    ///
    /// Hidden entries are skipped.
    pub fn discover(&self, dir: &Path) -> GridstackResult<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(GridstackError::FileNotFound {
                path: dir.to_path_buf(),
            });
        }

        let mut found = Vec::new();
        self.walk(dir, &mut found)?;
        found.sort();

        if let Some(limit) = self.limit {
            found.truncate(limit);
        }
        if found.is_empty() {
            return Err(GridstackError::empty_input(format!(
                "no files with extensions [{}] in {}",
                self.exts.join(", "),
                dir.display()
            )));
        }

        tracing::debug!(dir = %dir.display(), files = found.len(), "Discovered inputs");
        Ok(found)
    }

    fn walk(&self, dir: &Path, found: &mut Vec<PathBuf>) -> GridstackResult<()> {
        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let walker = WalkDir::new(dir)
            .max_depth(max_depth)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

        for entry in walker {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.into_path();
            if self.exclude.iter().any(|ex| same_file(ex, &path)) {
                continue;
            }
            let accepted = extension_of(&path).is_some_and(|ext| self.exts.contains(&ext));
            if accepted {
                found.push(path);
            }
        }
        Ok(())
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
