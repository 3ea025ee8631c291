//! Command-line arguments

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Every connection option can also come from the environment or the
/// config file; flags win over both.
#[derive(Clone, Debug, Default, Parser)]
#[command(
    name = "ftpdeploy",
    author,
    version,
    about = "Wipe an FTP server's directory and upload a local tree in its place"
)]
pub struct Args {
    /// TOML config file (default: ./ftpdeploy.toml when present)
    #[arg(long, env = "FTPDEPLOY_CONFIG")]
    pub config: Option<PathBuf>,

    /// FTP server host name or address
    #[arg(long, env = "FTPDEPLOY_HOST")]
    pub host: Option<String>,

    /// FTP control port
    #[arg(long, env = "FTPDEPLOY_PORT")]
    pub port: Option<u16>,

    /// Login user
    #[arg(short = 'u', long = "user", env = "FTPDEPLOY_USER")]
    pub username: Option<String>,

    /// Login password (prefer the environment variable)
    #[arg(long, env = "FTPDEPLOY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Local directory to deploy
    #[arg(short = 's', long, env = "FTPDEPLOY_SOURCE")]
    pub source: Option<PathBuf>,

    /// Remote directory to wipe and upload into (default: server root)
    #[arg(short = 'r', long = "remote-dir", env = "FTPDEPLOY_REMOTE_DIR")]
    pub remote_dir: Option<String>,

    /// Connect timeout in seconds
    #[arg(long = "timeout")]
    pub timeout_secs: Option<u64>,

    /// Exclude files matching patterns (/XF)
    #[arg(long = "xf", action = ArgAction::Append)]
    pub exclude_files: Vec<String>,

    /// Exclude directories matching patterns (/XD)
    #[arg(long = "xd", action = ArgAction::Append)]
    pub exclude_dirs: Vec<String>,

    /// Upload without deleting existing remote content first
    #[arg(long)]
    pub skip_wipe: bool,

    /// Show what would be uploaded; no connection is made
    #[arg(short = 'n', long, alias = "list-only")]
    pub dry_run: bool,

    /// Show directory creation and skipped listings
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors and the summary
    #[arg(short, long)]
    pub quiet: bool,

    /// Append a timestamped run log to this file
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,
}
