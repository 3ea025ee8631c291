use anyhow::Result;
use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Run log sink. Every hook defaults to a no-op so callers can hold a
/// `&dyn Logger` unconditionally.
pub trait Logger: Send + Sync {
    fn start(&self, _src: &Path, _server: &str) {}
    fn delete(&self, _remote: &str) {}
    fn remove_dir(&self, _remote: &str) {}
    fn make_dir(&self, _remote: &str) {}
    fn upload_done(&self, _src: &Path, _remote: &str, _bytes: u64) {}
    fn error(&self, _context: &str, _path: &str, _msg: &str) {}
    fn done(&self, _uploaded: u64, _failed: u64, _seconds: f64) {}
}

pub struct NoopLogger;
impl Logger for NoopLogger {}

pub struct TextLogger {
    file: Mutex<File>,
}

impl TextLogger {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(f),
        })
    }

    fn line(&self, s: &str) {
        if let Ok(mut f) = self.file.lock() {
            let _ = writeln!(f, "[{}] {}", Utc::now().to_rfc3339(), s);
        }
    }
}

impl Logger for TextLogger {
    fn start(&self, src: &Path, server: &str) {
        self.line(&format!("START src={} server={}", src.display(), server));
    }
    fn delete(&self, remote: &str) {
        self.line(&format!("DELETE path={}", remote));
    }
    fn remove_dir(&self, remote: &str) {
        self.line(&format!("RMDIR path={}", remote));
    }
    fn make_dir(&self, remote: &str) {
        self.line(&format!("MKDIR path={}", remote));
    }
    fn upload_done(&self, src: &Path, remote: &str, bytes: u64) {
        self.line(&format!(
            "UPLOAD src={} dst={} bytes={}",
            src.display(),
            remote,
            bytes
        ));
    }
    fn error(&self, context: &str, path: &str, msg: &str) {
        self.line(&format!("ERROR ctx={} path={} msg={}", context, path, msg));
    }
    fn done(&self, uploaded: u64, failed: u64, seconds: f64) {
        self.line(&format!(
            "DONE uploaded={uploaded} failed={failed} seconds={seconds:.3}"
        ));
    }
}
