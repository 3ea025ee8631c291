//! Tree upload: recreate the local directory structure remotely and store
//! every file.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::connection::RemoteFs;
use crate::fs_enum::{enumerate_tree, FileFilter, LocalEntry};
use crate::logger::Logger;
use crate::progress::DeployProgress;
use crate::remote_path;

/// Statistics for an upload run
#[derive(Debug, Default, Clone)]
pub struct UploadStats {
    pub uploaded: u64,
    pub failed: u64,
    pub bytes: u64,
    pub dirs_created: u64,
    pub errors: Vec<String>,
}

impl UploadStats {
    pub fn add_file(&mut self, bytes: u64) {
        self.uploaded += 1;
        self.bytes += bytes;
    }

    pub fn add_error(&mut self, error: String) {
        self.failed += 1;
        self.errors.push(error);
    }
}

/// Mirror `local_root` under `remote_root`. Only a failure to enumerate
/// the local tree is returned as an error; per-file failures are counted.
pub fn upload_tree(
    remote: &mut dyn RemoteFs,
    local_root: &Path,
    remote_root: &str,
    filter: &FileFilter,
    progress: &DeployProgress,
    logger: &dyn Logger,
) -> Result<UploadStats> {
    let listing = enumerate_tree(local_root, filter)
        .with_context(|| format!("Failed to enumerate {}", local_root.display()))?;
    for skipped in &listing.skipped {
        progress.warn(&format!("skipping unreadable entry {}", skipped));
        logger.error("walk", skipped, "unreadable");
    }
    progress.detail(&format!(
        "Found {} files ({:.2} MB)",
        listing.file_count(),
        listing.total_size() as f64 / 1_048_576.0
    ));

    let mut uploader = Uploader {
        remote,
        progress,
        logger,
        ensured: HashSet::new(),
        stats: UploadStats::default(),
    };

    for entry in &listing.entries {
        if entry.is_directory {
            let dir = remote_dir_for(remote_root, &entry.rel);
            uploader.ensure_dir_chain(&dir);
        } else {
            let parent = entry.rel.parent().unwrap_or_else(|| Path::new(""));
            let dir = remote_dir_for(remote_root, parent);
            uploader.upload_file(entry, &dir);
        }
    }

    Ok(uploader.stats)
}

/// Remote directory for a local directory given relative to the root
pub fn remote_dir_for(remote_root: &str, rel: &Path) -> String {
    let root = remote_path::normalize_dir(remote_root);
    let rel = remote_path::from_local(rel);
    if rel.is_empty() {
        root
    } else {
        remote_path::join(&root, &rel)
    }
}

struct Uploader<'a> {
    remote: &'a mut dyn RemoteFs,
    progress: &'a DeployProgress,
    logger: &'a dyn Logger,
    /// Directories already created (or found present) this run
    ensured: HashSet<String>,
    stats: UploadStats,
}

impl Uploader<'_> {
    /// Create each prefix of `dir` in turn. A failed MKD is taken to
    /// mean the directory already exists; it is logged, never counted.
    fn ensure_dir_chain(&mut self, dir: &str) {
        for prefix in remote_path::prefixes(dir) {
            if self.ensured.contains(&prefix) {
                continue;
            }
            match self.remote.make_dir(&prefix) {
                Ok(()) => {
                    self.stats.dirs_created += 1;
                    self.logger.make_dir(&prefix);
                    self.progress.detail(&format!("Created directory: {}", prefix));
                }
                Err(e) => {
                    self.logger.error("mkdir", &prefix, &format!("{:#}", e));
                    self.progress
                        .detail(&format!("MKD {} failed, assuming it exists: {:#}", prefix, e));
                }
            }
            self.ensured.insert(prefix);
        }
    }

    fn upload_file(&mut self, entry: &LocalEntry, remote_dir: &str) {
        let name = entry
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let remote_path = remote_path::join(remote_dir, &remote_path::normalize_separators(&name));

        match self.store(&entry.path, &remote_path) {
            Ok(bytes) => {
                self.stats.add_file(bytes);
                self.logger.upload_done(&entry.path, &remote_path, bytes);
                self.progress.file_op("Uploaded", &remote_path);
                self.progress.uploaded(self.stats.uploaded);
            }
            Err(e) => {
                self.logger.error("upload", &remote_path, &format!("{:#}", e));
                self.progress.failure("Failed to upload", &remote_path, &e);
                self.stats
                    .add_error(format!("Failed to upload {}: {:#}", remote_path, e));
            }
        }
    }

    fn store(&mut self, local: &Path, remote_path: &str) -> Result<u64> {
        let file = File::open(local).with_context(|| format!("open {}", local.display()))?;
        let mut reader = BufReader::new(file);
        self.remote.store(remote_path, &mut reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::NoopLogger;
    use crate::memory::MemoryRemote;
    use std::fs;
    use tempfile::TempDir;

    fn upload(remote: &mut MemoryRemote, root: &Path, remote_root: &str) -> UploadStats {
        upload_tree(
            remote,
            root,
            remote_root,
            &FileFilter::default(),
            &DeployProgress::hidden(true),
            &NoopLogger,
        )
        .unwrap()
    }

    #[test]
    fn remote_dir_mapping() {
        assert_eq!(remote_dir_for("", Path::new("")), "");
        assert_eq!(remote_dir_for("site", Path::new("")), "site");
        assert_eq!(remote_dir_for("", Path::new("docs/img")), "docs/img");
        assert_eq!(remote_dir_for("site/", Path::new("docs")), "site/docs");
        assert_eq!(remote_dir_for("", Path::new("sub\\dir")), "sub/dir");
        assert_eq!(remote_dir_for("/", Path::new("")), "/");
        assert_eq!(remote_dir_for("/", Path::new("docs")), "/docs");
        assert_eq!(remote_dir_for("/www/", Path::new("docs")), "/www/docs");
    }

    #[test]
    fn hello_world_tree() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "hello").unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/b.txt"), "world").unwrap();

        let mut remote = MemoryRemote::new();
        let stats = upload(&mut remote, dir.path(), "");

        assert_eq!(stats.uploaded, 2);
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.bytes, 10);
        assert!(remote.has_dir("docs"));
        assert_eq!(remote.file("a.txt"), Some(&b"hello"[..]));
        assert_eq!(remote.file("docs/b.txt"), Some(&b"world"[..]));
    }

    #[test]
    fn creates_each_directory_once() {
        let dir = TempDir::new().unwrap();
        for d in ["a/b/c", "a/d", "e"] {
            fs::create_dir_all(dir.path().join(d)).unwrap();
        }
        for f in ["a/1", "a/b/2", "a/b/c/3", "a/d/4", "e/5", "6"] {
            fs::write(dir.path().join(f), f).unwrap();
        }

        let mut remote = MemoryRemote::new();
        let stats = upload(&mut remote, dir.path(), "");

        let mut dirs: Vec<_> = remote.dirs().collect();
        dirs.sort();
        assert_eq!(dirs, vec!["a", "a/b", "a/b/c", "a/d", "e"]);
        assert_eq!(stats.dirs_created, 5);
        assert_eq!(remote.make_dir_calls, 5);
        assert_eq!(stats.uploaded + stats.failed, 6);
    }

    #[test]
    fn nested_remote_root_is_created() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<html>").unwrap();

        let mut remote = MemoryRemote::new();
        let stats = upload(&mut remote, dir.path(), "www/site");

        assert!(remote.has_dir("www"));
        assert!(remote.has_dir("www/site"));
        assert_eq!(remote.file("www/site/index.html"), Some(&b"<html>"[..]));
        assert_eq!(stats.uploaded, 1);
    }

    #[test]
    fn existing_directories_are_tolerated() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/b.txt"), "world").unwrap();

        let mut remote = MemoryRemote::new().with_dir("docs");
        let stats = upload(&mut remote, dir.path(), "");

        assert_eq!(stats.dirs_created, 0);
        assert_eq!(stats.uploaded, 1);
        assert_eq!(stats.failed, 0);
    }

    #[test]
    fn one_store_failure_is_counted_and_skipped() {
        let dir = TempDir::new().unwrap();
        for i in 0..12 {
            fs::write(dir.path().join(format!("f{:02}.txt", i)), "x").unwrap();
        }

        let mut remote = MemoryRemote::new();
        remote.fail_store.insert("f05.txt".into());
        let stats = upload(&mut remote, dir.path(), "");

        assert_eq!(stats.uploaded, 11);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.errors.len(), 1);
        assert!(stats.errors[0].contains("f05.txt"));
        assert!(remote.file("f06.txt").is_some());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_file_is_uploaded_with_target_contents() {
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("shared.txt"), "shared").unwrap();
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "hello").unwrap();
        std::os::unix::fs::symlink(outside.path().join("shared.txt"), dir.path().join("link.txt"))
            .unwrap();

        let mut remote = MemoryRemote::new();
        let stats = upload(&mut remote, dir.path(), "");

        assert_eq!(stats.uploaded, 2);
        assert_eq!(remote.file("link.txt"), Some(&b"shared"[..]));
    }

    #[test]
    fn missing_local_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut remote = MemoryRemote::new();
        let res = upload_tree(
            &mut remote,
            &dir.path().join("missing"),
            "",
            &FileFilter::default(),
            &DeployProgress::hidden(true),
            &NoopLogger,
        );
        assert!(res.is_err());
        assert_eq!(remote.make_dir_calls, 0);
    }
}
