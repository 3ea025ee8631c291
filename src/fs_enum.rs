use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
// Local tree enumeration for upload

/// One directory or file under the source root
#[derive(Debug, Clone)]
pub struct LocalEntry {
    pub path: PathBuf,
    /// Path relative to the source root; empty for the root itself
    pub rel: PathBuf,
    pub size: u64,
    pub is_directory: bool,
}

/// Result of walking the source tree
#[derive(Debug, Default)]
pub struct TreeListing {
    /// Top-down: every directory precedes its contents
    pub entries: Vec<LocalEntry>,
    /// Entries that could not be read, with the reason
    pub skipped: Vec<String>,
}

impl TreeListing {
    pub fn file_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_directory).count()
    }

    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }
}

/// Exclusion patterns (robocopy-style /XF and /XD)
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    pub exclude_files: Vec<String>,
    pub exclude_dirs: Vec<String>,
}

impl FileFilter {
    /// Check if a file should be included
    fn should_include_file(&self, path: &Path) -> bool {
        let filename = path.file_name().unwrap_or_default().to_string_lossy();
        !self
            .exclude_files
            .iter()
            .any(|pattern| glob_match(pattern, &filename))
    }

    /// Check if a directory (relative to the root) should be included
    fn should_include_dir(&self, rel: &Path) -> bool {
        for pattern in &self.exclude_dirs {
            // Any path component matching excludes the whole subtree
            for component in rel.components() {
                if let Some(component_str) = component.as_os_str().to_str() {
                    if glob_match(pattern, component_str) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

/// Simple glob matching (supports * wildcards)
fn glob_match(pattern: &str, text: &str) -> bool {
    if pattern == "*" {
        return true;
    }

    if pattern.contains('*') {
        if pattern.starts_with('*') && pattern.ends_with('*') && pattern.len() > 1 {
            let middle = &pattern[1..pattern.len() - 1];
            return text.contains(middle);
        } else if let Some(suffix) = pattern.strip_prefix('*') {
            return text.ends_with(suffix);
        } else if let Some(prefix) = pattern.strip_suffix('*') {
            return text.starts_with(prefix);
        }
    }

    // Exact match
    pattern == text
}

/// Walk `root` top-down in file-name order, applying `filter`.
/// A link to a file is listed as a file with its target's size; links to
/// directories are not descended.
pub fn enumerate_tree(root: &Path, filter: &FileFilter) -> Result<TreeListing> {
    use walkdir::WalkDir;

    if !root.is_dir() {
        anyhow::bail!("Not a directory: {}", root.display());
    }

    let mut listing = TreeListing::default();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            // Skip excluded directories entirely - this prevents walking into them
            if e.depth() > 0 && e.file_type().is_dir() {
                let rel = e.path().strip_prefix(root).unwrap_or(e.path());
                filter.should_include_dir(rel)
            } else {
                true
            }
        });

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let at = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| root.display().to_string());
                listing.skipped.push(format!("{}: {}", at, e));
                continue;
            }
        };
        let path = entry.path();
        let rel = path
            .strip_prefix(root)
            .with_context(|| format!("{} escaped {}", path.display(), root.display()))?
            .to_path_buf();

        if entry.file_type().is_dir() {
            listing.entries.push(LocalEntry {
                path: path.to_path_buf(),
                rel,
                size: 0,
                is_directory: true,
            });
        } else if entry.file_type().is_file() || (entry.path_is_symlink() && path.is_file()) {
            if !filter.should_include_file(path) {
                continue;
            }
            // fs::metadata follows a link to its target
            match std::fs::metadata(path) {
                Ok(metadata) => listing.entries.push(LocalEntry {
                    path: path.to_path_buf(),
                    rel,
                    size: metadata.len(),
                    is_directory: false,
                }),
                Err(e) => listing.skipped.push(format!("{}: {}", path.display(), e)),
            }
        }
        // links to directories are not followed; special files are not deployed
    }

    Ok(listing)
}
