//! Remote filesystem abstraction and its FTP implementation

use anyhow::{anyhow, Context, Result};
use std::io::Read;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;
use suppaftp::list::File as ListedFile;
use suppaftp::types::FileType;
use suppaftp::FtpStream;

use crate::remote_path;

/// What a listing says about an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Name-only listing; type must be discovered by trying a delete
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl RemoteEntry {
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Operations a deployment needs from the remote side. Paths are
/// forward-slash strings relative to the landing directory; `""` is the
/// landing directory itself.
pub trait RemoteFs {
    /// Child entries directly under `path`, never `.` or `..`
    fn list(&mut self, path: &str) -> Result<Vec<RemoteEntry>>;
    fn delete_file(&mut self, path: &str) -> Result<()>;
    /// Remove an empty directory
    fn remove_dir(&mut self, path: &str) -> Result<()>;
    fn make_dir(&mut self, path: &str) -> Result<()>;
    /// Store the reader's full contents at `path`, returning bytes sent
    fn store(&mut self, path: &str, reader: &mut dyn Read) -> Result<u64>;
    /// Graceful logout
    fn quit(&mut self) -> Result<()>;
}

impl<T: RemoteFs + ?Sized> RemoteFs for &mut T {
    fn list(&mut self, path: &str) -> Result<Vec<RemoteEntry>> {
        (**self).list(path)
    }
    fn delete_file(&mut self, path: &str) -> Result<()> {
        (**self).delete_file(path)
    }
    fn remove_dir(&mut self, path: &str) -> Result<()> {
        (**self).remove_dir(path)
    }
    fn make_dir(&mut self, path: &str) -> Result<()> {
        (**self).make_dir(path)
    }
    fn store(&mut self, path: &str, reader: &mut dyn Read) -> Result<u64> {
        (**self).store(path, reader)
    }
    fn quit(&mut self) -> Result<()> {
        (**self).quit()
    }
}

/// Connection parameters for [`FtpConnection::connect`]
#[derive(Debug, Clone)]
pub struct ServerParams {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub connect_timeout: Duration,
}

/// Plain FTP session (passive mode, binary transfers)
pub struct FtpConnection {
    stream: FtpStream,
}

impl FtpConnection {
    /// Resolve, connect with a bounded timeout, log in and switch to
    /// binary mode.
    pub fn connect(params: &ServerParams) -> Result<Self> {
        let addrs: Vec<SocketAddr> = (params.host.as_str(), params.port)
            .to_socket_addrs()
            .with_context(|| format!("Failed to resolve {}:{}", params.host, params.port))?
            .collect();
        if addrs.is_empty() {
            anyhow::bail!("No addresses found for {}:{}", params.host, params.port);
        }

        let mut last_err = None;
        let mut stream = None;
        for addr in addrs {
            match FtpStream::connect_timeout(addr, params.connect_timeout) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => last_err = Some(anyhow!("{}: {}", addr, e)),
            }
        }
        let mut stream = match stream {
            Some(s) => s,
            None => {
                return Err(last_err
                    .unwrap_or_else(|| anyhow!("no address attempted"))
                    .context(format!("Failed to connect to {}:{}", params.host, params.port)))
            }
        };

        stream
            .login(params.username.as_str(), params.password.as_str())
            .with_context(|| format!("Login failed for user '{}'", params.username))?;
        stream
            .transfer_type(FileType::Binary)
            .context("Failed to switch to binary transfer mode")?;

        Ok(Self { stream })
    }

    fn nlst_entries(&mut self, path: &str) -> Result<Vec<RemoteEntry>> {
        let names = self
            .stream
            .nlst(non_root(path))
            .with_context(|| format!("NLST {}", path))?;
        Ok(names
            .iter()
            .map(|n| remote_path::last_segment(n.trim()))
            .filter(|n| is_real_child(n))
            .map(|n| RemoteEntry::new(n, EntryKind::Unknown))
            .collect())
    }
}

impl RemoteFs for FtpConnection {
    fn list(&mut self, path: &str) -> Result<Vec<RemoteEntry>> {
        let lines = match self.stream.list(non_root(path)) {
            Ok(lines) => lines,
            Err(_) => return self.nlst_entries(path),
        };
        match parse_listing(&lines) {
            Some(entries) => Ok(entries),
            None => self.nlst_entries(path),
        }
    }

    fn delete_file(&mut self, path: &str) -> Result<()> {
        self.stream
            .rm(path)
            .with_context(|| format!("DELE {}", path))
    }

    fn remove_dir(&mut self, path: &str) -> Result<()> {
        self.stream
            .rmdir(path)
            .with_context(|| format!("RMD {}", path))
    }

    fn make_dir(&mut self, path: &str) -> Result<()> {
        self.stream
            .mkdir(path)
            .with_context(|| format!("MKD {}", path))
    }

    fn store(&mut self, path: &str, mut reader: &mut dyn Read) -> Result<u64> {
        self.stream
            .put_file(path, &mut reader)
            .with_context(|| format!("STOR {}", path))
    }

    fn quit(&mut self) -> Result<()> {
        self.stream.quit().context("QUIT")
    }
}

fn non_root(path: &str) -> Option<&str> {
    if path.is_empty() {
        None
    } else {
        Some(path)
    }
}

fn is_real_child(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".."
}

/// Parse `LIST` output into typed entries. Returns `None` when any line
/// is not in a recognised format so the caller can fall back to `NLST`.
pub fn parse_listing(lines: &[String]) -> Option<Vec<RemoteEntry>> {
    let mut entries = Vec::with_capacity(lines.len());
    for line in lines {
        let line = line.trim_end();
        if line.is_empty() || line.starts_with("total ") {
            continue;
        }
        let file: ListedFile = line.parse().ok()?;
        let name = file.name();
        if !is_real_child(name) {
            continue;
        }
        let kind = if file.is_directory() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        entries.push(RemoteEntry::new(name, kind));
    }
    Some(entries)
}
