//! FileSink: append-only file guarded by an async mutex.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::SinkError;
use crate::ports::RecordSink;

/// Appends one line per successful record to a file.
///
/// - The file is created if missing and never truncated.
/// - It is opened on the first write and kept open until `close`.
/// - The mutex is held for the whole write, so lines from concurrent workers
///   never interleave. The guard is dropped on every exit path.
/// - After a failed write the handle is dropped and the next write reopens
///   the file.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open(&self) -> Result<File, SinkError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        tracing::debug!(path = %self.path.display(), "sink opened");
        Ok(file)
    }
}

#[async_trait]
impl RecordSink for FileSink {
    async fn write(&self, line: &[u8]) -> Result<(), SinkError> {
        let mut entry = Vec::with_capacity(line.len() + 1);
        entry.extend_from_slice(line);
        entry.push(b'\n');

        let mut guard = self.file.lock().await;
        let file = match &mut *guard {
            Some(file) => file,
            slot @ None => slot.insert(self.open().await?),
        };

        let written = async {
            file.write_all(&entry).await?;
            file.flush().await
        }
        .await;

        if let Err(err) = written {
            *guard = None;
            return Err(err.into());
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        let mut guard = self.file.lock().await;
        if let Some(mut file) = guard.take() {
            file.flush().await?;
            file.sync_all().await?;
            tracing::debug!(path = %self.path.display(), "sink closed");
        }
        Ok(())
    }
}
