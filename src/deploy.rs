//! Deployment driver: check the source, connect, wipe, upload, report.

use anyhow::{bail, Context, Result};
use std::time::{Duration, Instant};

use crate::config::DeployConfig;
use crate::connection::{RemoteFs, ServerParams};
use crate::logger::Logger;
use crate::memory::MemoryRemote;
use crate::progress::DeployProgress;
use crate::upload::{upload_tree, UploadStats};
use crate::wipe::{wipe_remote, WipeStats};

const RULE: &str = "==================================================";

#[derive(Debug, Clone)]
pub struct DeploySummary {
    /// `None` when the wipe phase was skipped
    pub wipe: Option<WipeStats>,
    pub upload: UploadStats,
    pub elapsed: Duration,
    pub dry_run: bool,
}

impl DeploySummary {
    pub fn is_clean(&self) -> bool {
        self.upload.failed == 0 && self.wipe.as_ref().map_or(true, |w| w.failures == 0)
    }
}

/// Run one deployment. `connect` is only invoked once the source tree has
/// been validated; the connection is closed only when every phase ran.
///
/// Per-file failures are reported in the summary; an `Err` means the
/// run was aborted (missing source, bad configuration, connection
/// failure, unreadable source tree).
pub fn run<R, F>(
    config: &DeployConfig,
    progress: &DeployProgress,
    logger: &dyn Logger,
    connect: F,
) -> Result<DeploySummary>
where
    R: RemoteFs,
    F: FnOnce(&ServerParams) -> Result<R>,
{
    if !config.source.is_dir() {
        bail!("Publish directory '{}' not found!", config.source.display());
    }

    let start = Instant::now();
    logger.start(&config.source, &config.server_label());

    if config.dry_run {
        return dry_run(config, progress, logger, start);
    }

    let params = config.server_params()?;
    let label = config.server_label();

    progress.stage("Connecting to FTP server...");
    let mut remote = connect(&params).with_context(|| format!("Could not connect to {}", label))?;
    progress.file_op("Connected to", &label);

    let wipe = if config.skip_wipe {
        progress.detail("Skipping clean step (--skip-wipe)");
        None
    } else {
        progress.stage("Step 1: Cleaning FTP server...");
        let stats = wipe_remote(&mut remote, &config.remote_dir, progress, logger);
        progress.file_op("FTP server cleaned", &display_dir(&config.remote_dir));
        Some(stats)
    };

    progress.stage(&format!(
        "Step 2: Uploading files from {}...",
        config.source.display()
    ));
    let upload = upload_tree(
        &mut remote,
        &config.source,
        &config.remote_dir,
        &config.filter,
        progress,
        logger,
    )?;

    let summary = DeploySummary {
        wipe,
        upload,
        elapsed: start.elapsed(),
        dry_run: false,
    };
    print_summary(&summary, progress);
    logger.done(
        summary.upload.uploaded,
        summary.upload.failed,
        summary.elapsed.as_secs_f64(),
    );

    // The summary has been printed, so a failed logout no longer changes
    // the outcome.
    if let Err(e) = remote.quit() {
        progress.warn(&format!("logout failed: {:#}", e));
    }

    Ok(summary)
}

fn dry_run(
    config: &DeployConfig,
    progress: &DeployProgress,
    logger: &dyn Logger,
    start: Instant,
) -> Result<DeploySummary> {
    progress.stage(&format!(
        "DRY RUN - {} would be wiped, nothing is sent",
        display_dir(&config.remote_dir)
    ));
    let mut plan = MemoryRemote::new();
    let upload = upload_tree(
        &mut plan,
        &config.source,
        &config.remote_dir,
        &config.filter,
        progress,
        logger,
    )?;
    let summary = DeploySummary {
        wipe: None,
        upload,
        elapsed: start.elapsed(),
        dry_run: true,
    };
    print_summary(&summary, progress);
    Ok(summary)
}

fn display_dir(remote_dir: &str) -> String {
    if remote_dir.is_empty() {
        "/ (server root)".to_string()
    } else {
        remote_dir.to_string()
    }
}

fn print_summary(summary: &DeploySummary, progress: &DeployProgress) {
    let upload = &summary.upload;
    let mut lines = vec![
        String::new(),
        RULE.to_string(),
        if summary.dry_run {
            "Deployment Summary (dry run):".to_string()
        } else {
            "Deployment Summary:".to_string()
        },
    ];
    if let Some(wipe) = &summary.wipe {
        lines.push(format!(
            "  Deleted: {} files, {} directories ({} failed)",
            wipe.files_deleted, wipe.dirs_deleted, wipe.failures
        ));
    }
    lines.push(format!("  Successfully uploaded: {}", upload.uploaded));
    lines.push(format!("  Failed uploads: {}", upload.failed));
    lines.push(format!(
        "  Transferred: {:.2} MB in {:.2}s",
        upload.bytes as f64 / 1_048_576.0,
        summary.elapsed.as_secs_f64()
    ));
    lines.push(RULE.to_string());
    if upload.failed == 0 {
        lines.push("Deployment completed successfully!".to_string());
    } else {
        lines.push(format!(
            "Deployment completed with {} errors.",
            upload.failed
        ));
    }
    for line in lines {
        progress.stage(&line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use crate::config::FileConfig;
    use crate::logger::NoopLogger;
    use std::cell::Cell;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn config_for(source: &Path) -> DeployConfig {
        let args = Args {
            host: Some("ftp.example.com".into()),
            username: Some("deploy".into()),
            source: Some(source.to_path_buf()),
            quiet: true,
            ..Args::default()
        };
        DeployConfig::merge(&args, FileConfig::default())
    }

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "hello").unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/b.txt"), "world").unwrap();
        dir
    }

    #[test]
    fn replaces_remote_content() {
        let dir = site();
        let cfg = config_for(dir.path());
        let mut remote = MemoryRemote::new()
            .with_file("old.html", b"stale")
            .with_file("assets/old.js", b"stale");
        let r = &mut remote;

        let summary = run(&cfg, &DeployProgress::hidden(true), &NoopLogger, move |p| {
            assert_eq!(p.host, "ftp.example.com");
            assert_eq!(p.port, 21);
            Ok(r)
        })
        .unwrap();

        assert!(summary.is_clean());
        assert_eq!(summary.upload.uploaded, 2);
        assert_eq!(summary.wipe.as_ref().unwrap().files_deleted, 2);
        assert!(remote.file("old.html").is_none());
        assert!(!remote.has_dir("assets"));
        assert_eq!(remote.file("a.txt"), Some(&b"hello"[..]));
        assert_eq!(remote.file("docs/b.txt"), Some(&b"world"[..]));
        assert!(remote.quit_called);
    }

    #[test]
    fn missing_source_never_connects() {
        let dir = TempDir::new().unwrap();
        let cfg = config_for(&dir.path().join("publish"));
        let attempted = Cell::new(false);

        let res = run(&cfg, &DeployProgress::hidden(true), &NoopLogger, |_| {
            attempted.set(true);
            Ok(MemoryRemote::new())
        });

        assert!(res.is_err());
        assert!(!attempted.get());
    }

    #[test]
    fn connection_failure_is_fatal() {
        let dir = site();
        let cfg = config_for(dir.path());

        let res: Result<DeploySummary> =
            run(&cfg, &DeployProgress::hidden(true), &NoopLogger, |_| {
                Err::<MemoryRemote, _>(anyhow::anyhow!("connection refused"))
            });

        let err = res.unwrap_err();
        assert!(format!("{:#}", err).contains("connection refused"));
    }

    #[test]
    fn missing_host_fails_before_connecting() {
        let dir = site();
        let mut cfg = config_for(dir.path());
        cfg.host = None;
        let attempted = Cell::new(false);

        let res = run(&cfg, &DeployProgress::hidden(true), &NoopLogger, |_| {
            attempted.set(true);
            Ok(MemoryRemote::new())
        });

        assert!(res.is_err());
        assert!(!attempted.get());
    }

    #[test]
    fn single_upload_failure_still_completes() {
        let dir = site();
        let cfg = config_for(dir.path());
        let mut remote = MemoryRemote::new();
        remote.fail_store.insert("docs/b.txt".into());
        let r = &mut remote;

        let summary = run(&cfg, &DeployProgress::hidden(true), &NoopLogger, move |_| Ok(r)).unwrap();

        assert_eq!(summary.upload.uploaded, 1);
        assert_eq!(summary.upload.failed, 1);
        assert!(!summary.is_clean());
        assert!(remote.quit_called);
    }

    #[test]
    fn skip_wipe_keeps_existing_files() {
        let dir = site();
        let mut cfg = config_for(dir.path());
        cfg.skip_wipe = true;
        let mut remote = MemoryRemote::new().with_file("keep.txt", b"k");
        let r = &mut remote;

        let summary = run(&cfg, &DeployProgress::hidden(true), &NoopLogger, move |_| Ok(r)).unwrap();

        assert!(summary.wipe.is_none());
        assert!(remote.file("keep.txt").is_some());
        assert_eq!(remote.file("a.txt"), Some(&b"hello"[..]));
    }

    #[test]
    fn dry_run_plans_without_connecting() {
        let dir = site();
        let mut cfg = config_for(dir.path());
        cfg.dry_run = true;
        cfg.host = None;

        let summary = run(
            &cfg,
            &DeployProgress::hidden(true),
            &NoopLogger,
            |_| -> Result<MemoryRemote> { panic!("dry run must not connect") },
        )
        .unwrap();

        assert!(summary.dry_run);
        assert_eq!(summary.upload.uploaded, 2);
        assert_eq!(summary.upload.dirs_created, 1);
    }
}
