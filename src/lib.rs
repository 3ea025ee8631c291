//! ftpdeploy library
//!
//! One-shot FTP deployment: empty a remote directory, then mirror a local
//! tree into it over a single plain-FTP connection.

pub mod cli;
pub mod config;
pub mod connection;
pub mod deploy;
pub mod fs_enum;
pub mod logger;
pub mod memory;
pub mod progress;
pub mod remote_path;
pub mod upload;
pub mod wipe;

pub use cli::Args;
pub use config::DeployConfig;
pub use connection::{EntryKind, FtpConnection, RemoteEntry, RemoteFs, ServerParams};
pub use deploy::{run, DeploySummary};
