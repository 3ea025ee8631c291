//! Deployment configuration: config file, environment and flags merged
//! into one [`DeployConfig`].

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Args;
use crate::connection::ServerParams;
use crate::fs_enum::FileFilter;
use crate::remote_path;

pub const DEFAULT_PORT: u16 = 21;
pub const DEFAULT_SOURCE: &str = "./publish";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONFIG_FILE: &str = "ftpdeploy.toml";

/// On-disk config file; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub source: Option<PathBuf>,
    pub remote_dir: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    #[serde(default)]
    pub exclude_files: Vec<String>,
    #[serde(default)]
    pub exclude_dirs: Vec<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&data)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }
}

#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: String,
    pub source: PathBuf,
    pub remote_dir: String,
    pub connect_timeout: Duration,
    pub filter: FileFilter,
    pub skip_wipe: bool,
    pub dry_run: bool,
    pub verbose: bool,
    pub quiet: bool,
    pub log_file: Option<PathBuf>,
}

impl DeployConfig {
    /// Read the config file named by `args` (or the default one in the
    /// working directory, when present) and merge.
    pub fn from_args(args: &Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    FileConfig::load(default)?
                } else {
                    FileConfig::default()
                }
            }
        };
        Ok(Self::merge(args, file))
    }

    /// Flags (clap already folds in environment variables) win over the
    /// file; excludes from both are combined.
    pub fn merge(args: &Args, file: FileConfig) -> Self {
        let mut filter = FileFilter {
            exclude_files: file.exclude_files,
            exclude_dirs: file.exclude_dirs,
        };
        filter.exclude_files.extend(args.exclude_files.iter().cloned());
        filter.exclude_dirs.extend(args.exclude_dirs.iter().cloned());

        Self {
            host: args.host.clone().or(file.host),
            port: args.port.or(file.port).unwrap_or(DEFAULT_PORT),
            username: args.username.clone().or(file.username),
            password: args.password.clone().or(file.password).unwrap_or_default(),
            source: args
                .source
                .clone()
                .or(file.source)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE)),
            remote_dir: remote_path::normalize_dir(
                &args.remote_dir.clone().or(file.remote_dir).unwrap_or_default(),
            ),
            connect_timeout: Duration::from_secs(
                args.timeout_secs
                    .or(file.connect_timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            filter,
            skip_wipe: args.skip_wipe,
            dry_run: args.dry_run,
            verbose: args.verbose,
            quiet: args.quiet,
            log_file: args.log_file.clone(),
        }
    }

    /// Connection parameters; host and user must be set
    pub fn server_params(&self) -> Result<ServerParams> {
        let host = self
            .host
            .clone()
            .filter(|h| !h.trim().is_empty())
            .context("No FTP host configured (use --host, FTPDEPLOY_HOST or the config file)")?;
        let username = self
            .username
            .clone()
            .filter(|u| !u.is_empty())
            .context("No FTP user configured (use --user, FTPDEPLOY_USER or the config file)")?;
        if self.connect_timeout.is_zero() {
            anyhow::bail!("Connect timeout must be at least one second");
        }
        Ok(ServerParams {
            host,
            port: self.port,
            username,
            password: self.password.clone(),
            connect_timeout: self.connect_timeout,
        })
    }

    /// `host:port` for display
    pub fn server_label(&self) -> String {
        match &self.host {
            Some(h) => format!("{}:{}", h, self.port),
            None => "(no server)".to_string(),
        }
    }
}
