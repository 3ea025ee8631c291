//! Remote wipe: empty a remote directory, depth-first
//!
//! Failures are isolated to the entry they concern. A directory that
//! cannot be listed is treated as empty.

use crate::connection::{EntryKind, RemoteFs};
use crate::logger::Logger;
use crate::progress::DeployProgress;
use crate::remote_path;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WipeStats {
    pub files_deleted: u64,
    pub dirs_deleted: u64,
    pub failures: u64,
}

/// Delete everything under `path`. `path` itself is kept.
pub fn wipe_remote(
    remote: &mut dyn RemoteFs,
    path: &str,
    progress: &DeployProgress,
    logger: &dyn Logger,
) -> WipeStats {
    let mut stats = WipeStats::default();
    let root = remote_path::normalize_dir(path);
    wipe_dir(remote, &root, progress, logger, &mut stats);
    stats
}

fn wipe_dir(
    remote: &mut dyn RemoteFs,
    path: &str,
    progress: &DeployProgress,
    logger: &dyn Logger,
    stats: &mut WipeStats,
) {
    let entries = match remote.list(path) {
        Ok(entries) => entries,
        Err(e) => {
            progress.detail(&format!("skipping unlistable {:?}: {:#}", path, e));
            return;
        }
    };

    for entry in entries {
        let name = remote_path::last_segment(&entry.name);
        if name.is_empty() || name == "." || name == ".." {
            continue;
        }
        let full_path = remote_path::join(path, name);

        match entry.kind {
            EntryKind::File => {
                if let Err(e) = remote.delete_file(&full_path) {
                    report_failure(&full_path, &e, progress, logger, stats);
                } else {
                    file_deleted(&full_path, progress, logger, stats);
                }
            }
            EntryKind::Directory => {
                remove_tree(remote, &full_path, progress, logger, stats);
            }
            EntryKind::Unknown => {
                // Name-only listing: a failed delete means "probably a directory"
                if remote.delete_file(&full_path).is_ok() {
                    file_deleted(&full_path, progress, logger, stats);
                } else {
                    remove_tree(remote, &full_path, progress, logger, stats);
                }
            }
        }
    }
}

fn remove_tree(
    remote: &mut dyn RemoteFs,
    path: &str,
    progress: &DeployProgress,
    logger: &dyn Logger,
    stats: &mut WipeStats,
) {
    wipe_dir(remote, path, progress, logger, stats);
    match remote.remove_dir(path) {
        Ok(()) => {
            stats.dirs_deleted += 1;
            logger.remove_dir(path);
            progress.file_op("Deleted directory", path);
        }
        Err(e) => report_failure(path, &e, progress, logger, stats),
    }
}

fn file_deleted(path: &str, progress: &DeployProgress, logger: &dyn Logger, stats: &mut WipeStats) {
    stats.files_deleted += 1;
    logger.delete(path);
    progress.file_op("Deleted file", path);
}

fn report_failure(
    path: &str,
    err: &anyhow::Error,
    progress: &DeployProgress,
    logger: &dyn Logger,
    stats: &mut WipeStats,
) {
    stats.failures += 1;
    logger.error("delete", path, &format!("{:#}", err));
    progress.failure("Could not delete", path, err);
}
