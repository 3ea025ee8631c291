//! Remote path helpers
//!
//! Remote paths are plain strings relative to the server's landing
//! directory and always use `/` as separator, whatever the local platform
//! uses.

use std::path::{Component, Path};

/// Join a child name onto a remote directory. An empty parent means the
/// remote root, so the child is returned as-is.
pub fn join(parent: &str, child: &str) -> String {
    let child = child.trim_start_matches('/');
    if parent == "/" {
        return format!("/{}", child);
    }
    let parent = parent.trim_end_matches('/');
    if parent.is_empty() {
        child.to_string()
    } else if child.is_empty() {
        parent.to_string()
    } else {
        format!("{}/{}", parent, child)
    }
}

/// Convert a relative local path into a remote path fragment.
pub fn from_local(rel: &Path) -> String {
    let mut out = String::new();
    for component in rel.components() {
        if let Component::Normal(seg) = component {
            let seg = seg.to_string_lossy();
            out = join(&out, &normalize_separators(&seg));
        }
    }
    out
}

/// Replace backslashes with forward slashes and collapse empty segments.
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Normalize a configured remote directory. A leading `/` (absolute
/// path on the server) is kept; `/` alone stays `/`.
pub fn normalize_dir(path: &str) -> String {
    let path = path.trim().replace('\\', "/");
    let rest = normalize_separators(&path);
    if path.starts_with('/') {
        format!("/{}", rest)
    } else {
        rest
    }
}

/// Last segment of a listing name. `NLST` on some servers answers with
/// `dir/name` instead of the bare name.
pub fn last_segment(name: &str) -> &str {
    let trimmed = name.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Every successive prefix of a remote directory path, shortest first:
/// `a/b/c` yields `a`, `a/b`, `a/b/c`.
pub fn prefixes(path: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = if path.starts_with('/') {
        "/".to_string()
    } else {
        String::new()
    };
    for part in path.split('/').filter(|p| !p.is_empty()) {
        current = join(&current, part);
        out.push(current.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn join_handles_root_and_nested() {
        assert_eq!(join("", "a.txt"), "a.txt");
        assert_eq!(join("docs", "b.txt"), "docs/b.txt");
        assert_eq!(join("docs/", "b.txt"), "docs/b.txt");
        assert_eq!(join("site", ""), "site");
        assert_eq!(join("/", "a.txt"), "/a.txt");
        assert_eq!(join("/www", "a.txt"), "/www/a.txt");
    }

    #[test]
    fn normalize_dir_keeps_absolute_marker() {
        assert_eq!(normalize_dir(""), "");
        assert_eq!(normalize_dir("/"), "/");
        assert_eq!(normalize_dir("/www/"), "/www");
        assert_eq!(normalize_dir("www//site"), "www/site");
        assert_eq!(normalize_dir("\\www\\site"), "/www/site");
    }

    #[test]
    fn backslashes_become_forward_slashes() {
        assert_eq!(normalize_separators("sub\\dir\\file.txt"), "sub/dir/file.txt");
        assert_eq!(normalize_separators("a//b/"), "a/b");
    }

    #[test]
    fn from_local_uses_forward_slashes() {
        let rel: PathBuf = ["sub", "dir", "file.txt"].iter().collect();
        assert_eq!(from_local(&rel), "sub/dir/file.txt");
        assert_eq!(from_local(Path::new("")), "");
        assert_eq!(from_local(Path::new("./x")), "x");
        // Windows-style separators inside a single component
        assert_eq!(from_local(Path::new("sub\\dir\\file.txt")), "sub/dir/file.txt");
    }

    #[test]
    fn last_segment_strips_nlst_prefix() {
        assert_eq!(last_segment("docs/b.txt"), "b.txt");
        assert_eq!(last_segment("plain"), "plain");
        assert_eq!(last_segment("dir/"), "dir");
    }

    #[test]
    fn prefixes_walk_from_first_segment() {
        assert_eq!(prefixes("a/b/c"), vec!["a", "a/b", "a/b/c"]);
        assert!(prefixes("").is_empty());
        assert_eq!(prefixes("/www/site"), vec!["/www", "/www/site"]);
        assert!(prefixes("/").is_empty());
    }
}
