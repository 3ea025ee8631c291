//! ftpdeploy - wipe a remote FTP directory and upload a local tree in its place
//!
//! Exit codes: 0 once the summary is printed (even with per-file
//! failures), 1 for a fatal error, 130 on Ctrl-C.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

use ftpdeploy::config::DeployConfig;
use ftpdeploy::connection::FtpConnection;
use ftpdeploy::logger::{Logger, NoopLogger, TextLogger};
use ftpdeploy::progress::DeployProgress;
use ftpdeploy::Args;

fn main() -> Result<()> {
    // Set up Ctrl-C handler
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted by user. Exiting (Ctrl-C)...");
        // Exit immediately with 130 (128 + SIGINT)
        std::process::exit(130);
    })
    .expect("Error setting Ctrl-C handler");

    let args = Args::parse();
    let config = DeployConfig::from_args(&args)?;

    // Choose logger once; NoopLogger unless --log-file is given
    let logger: Arc<dyn Logger> = match &config.log_file {
        Some(p) => match TextLogger::new(p) {
            Ok(l) => Arc::new(l),
            Err(e) => {
                eprintln!("warning: cannot open log file {}: {}", p.display(), e);
                Arc::new(NoopLogger)
            }
        },
        None => Arc::new(NoopLogger),
    };

    println!("==================================================");
    println!("  Automated FTP Deployment ({})", env!("CARGO_PKG_VERSION"));
    println!("==================================================");
    if config.verbose {
        println!("Source: {}", config.source.display());
        println!("Server: {}", config.server_label());
        if !config.filter.exclude_dirs.is_empty() {
            println!("Excluding directories: {:?}", config.filter.exclude_dirs);
        }
        if !config.filter.exclude_files.is_empty() {
            println!("Excluding files: {:?}", config.filter.exclude_files);
        }
    }
    println!();

    let progress = DeployProgress::new(config.quiet, config.verbose);
    let result = ftpdeploy::run(&config, &progress, &*logger, FtpConnection::connect);
    progress.finish();

    if let Err(e) = &result {
        logger.error("deploy", &config.source.display().to_string(), &format!("{:#}", e));
    }
    result.map(|_| ())
}
