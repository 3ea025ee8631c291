//! In-memory remote tree
//!
//! Behaves like a strict FTP server: `MKD` fails when the directory
//! exists or its parent is missing, `RMD` fails on non-empty
//! directories, `DELE` fails on anything that is not a file. Used for
//! `--dry-run` and as the remote side in tests.
//!
//! The landing directory is also `/`, so `www/a` and `/www/a` name the
//! same entry.

use anyhow::{bail, Result};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::Read;

use crate::connection::{EntryKind, RemoteEntry, RemoteFs};
use crate::remote_path;

#[derive(Debug, Default)]
pub struct MemoryRemote {
    dirs: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
    /// Answer listings with names only, like a bare `NLST` server
    pub names_only: bool,
    pub fail_list: HashSet<String>,
    pub fail_delete: HashSet<String>,
    pub fail_remove_dir: HashSet<String>,
    pub fail_store: HashSet<String>,
    pub make_dir_calls: usize,
    pub quit_called: bool,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory and any missing parents
    pub fn with_dir(mut self, path: &str) -> Self {
        for prefix in remote_path::prefixes(key(path)) {
            self.dirs.insert(prefix);
        }
        self
    }

    /// Add a file, creating its parent directories
    pub fn with_file(mut self, path: &str, contents: &[u8]) -> Self {
        let path = key(path);
        if let Some((parent, _)) = path.rsplit_once('/') {
            self = self.with_dir(parent);
        }
        self.files.insert(path.to_string(), contents.to_vec());
        self
    }

    pub fn file(&self, path: &str) -> Option<&[u8]> {
        self.files.get(key(path)).map(|v| v.as_slice())
    }

    pub fn has_dir(&self, path: &str) -> bool {
        let path = key(path);
        path.is_empty() || self.dirs.contains(path)
    }

    pub fn dirs(&self) -> impl Iterator<Item = &str> {
        self.dirs.iter().map(|s| s.as_str())
    }

    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.files.is_empty()
    }

    fn parent_of(path: &str) -> &str {
        path.rsplit_once('/').map(|(p, _)| p).unwrap_or("")
    }

    fn children(&self, path: &str) -> Vec<RemoteEntry> {
        let dirs = self
            .dirs
            .iter()
            .filter(|d| Self::parent_of(d) == path)
            .map(|d| RemoteEntry::new(remote_path::last_segment(d), EntryKind::Directory));
        let files = self
            .files
            .keys()
            .filter(|f| Self::parent_of(f) == path)
            .map(|f| RemoteEntry::new(remote_path::last_segment(f), EntryKind::File));
        dirs.chain(files).collect()
    }
}

fn key(path: &str) -> &str {
    path.trim_matches('/')
}

impl RemoteFs for MemoryRemote {
    fn list(&mut self, path: &str) -> Result<Vec<RemoteEntry>> {
        let path = key(path);
        if self.fail_list.contains(path) {
            bail!("550 {}: listing refused", path);
        }
        if !self.has_dir(path) {
            bail!("550 {}: no such directory", path);
        }
        let mut entries = self.children(path);
        if self.names_only {
            for e in &mut entries {
                e.kind = EntryKind::Unknown;
            }
        }
        Ok(entries)
    }

    fn delete_file(&mut self, path: &str) -> Result<()> {
        let path = key(path);
        if self.fail_delete.contains(path) {
            bail!("550 {}: permission denied", path);
        }
        if self.files.remove(path).is_none() {
            bail!("550 {}: not a plain file", path);
        }
        Ok(())
    }

    fn remove_dir(&mut self, path: &str) -> Result<()> {
        let path = key(path);
        if self.fail_remove_dir.contains(path) {
            bail!("550 {}: permission denied", path);
        }
        if !self.dirs.contains(path) {
            bail!("550 {}: no such directory", path);
        }
        if !self.children(path).is_empty() {
            bail!("550 {}: directory not empty", path);
        }
        self.dirs.remove(path);
        Ok(())
    }

    fn make_dir(&mut self, path: &str) -> Result<()> {
        self.make_dir_calls += 1;
        let path = key(path);
        if self.dirs.contains(path) || self.files.contains_key(path) {
            bail!("550 {}: file exists", path);
        }
        if !self.has_dir(Self::parent_of(path)) {
            bail!("550 {}: parent directory missing", path);
        }
        self.dirs.insert(path.to_string());
        Ok(())
    }

    fn store(&mut self, path: &str, reader: &mut dyn Read) -> Result<u64> {
        let path = key(path);
        if self.fail_store.contains(path) {
            bail!("451 {}: transfer aborted", path);
        }
        if !self.has_dir(Self::parent_of(path)) || self.dirs.contains(path) {
            bail!("553 {}: could not create file", path);
        }
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        let n = buf.len() as u64;
        self.files.insert(path.to_string(), buf);
        Ok(n)
    }

    fn quit(&mut self) -> Result<()> {
        self.quit_called = true;
        Ok(())
    }
}
