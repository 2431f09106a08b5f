//! Forwarding of the server's stdout/stderr.
//!
//! Each stream is read line by line on a detached task and re-emitted as a
//! tracing event prefixed with `[name/stream]`. Lines can additionally be
//! appended to a log file. Read and write errors end forwarding quietly.

use parking_lot::Mutex;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use suite_common::{SupervisorError, SupervisorResult};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Which pipe a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStream::Stdout => write!(f, "stdout"),
            OutputStream::Stderr => write!(f, "stderr"),
        }
    }
}

/// Appends forwarded lines to a file, shared by both stream tasks.
pub struct FileOutputWriter {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl FileOutputWriter {
    pub fn new(path: &Path) -> SupervisorResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    SupervisorError::configuration(format!(
                        "Failed to create log directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                SupervisorError::configuration(format!(
                    "Failed to open log file {}: {}",
                    path.display(),
                    e
                ))
            })?;

        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Format: `[timestamp] [name/stream] line`
    pub fn write_line(&self, name: &str, stream: OutputStream, line: &str) -> std::io::Result<()> {
        let mut writer = self.writer.lock();
        writeln!(
            writer,
            "[{}] [{}/{}] {}",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            name,
            stream,
            line
        )
    }

    pub fn flush(&self) -> std::io::Result<()> {
        self.writer.lock().flush()
    }
}

/// Spawn a detached task forwarding `reader` until EOF.
pub fn spawn_forwarder<R>(
    reader: R,
    name: String,
    stream: OutputStream,
    file: Option<Arc<FileOutputWriter>>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    match stream {
                        OutputStream::Stdout => info!("[{}/{}] {}", name, stream, line),
                        OutputStream::Stderr => warn!("[{}/{}] {}", name, stream, line),
                    }

                    if let Some(ref file) = file {
                        if file.write_line(&name, stream, &line).is_err() {
                            debug!("Log file write failed for {}/{}", name, stream);
                        }
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    debug!("Stopped reading {}/{}: {}", name, stream, e);
                    break;
                }
            }
        }

        if let Some(ref file) = file {
            let _ = file.flush();
        }
        debug!("Output forwarding finished for {}/{}", name, stream);
    })
}
