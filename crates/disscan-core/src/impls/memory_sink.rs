use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::SinkError;
use crate::ports::RecordSink;

/// In-memory sink. Each stored entry is one line including its separator.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lines(&self) -> Vec<Vec<u8>> {
        self.lines.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.lines.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.lines.lock().await.is_empty()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn write(&self, line: &[u8]) -> Result<(), SinkError> {
        let mut entry = Vec::with_capacity(line.len() + 1);
        entry.extend_from_slice(line);
        entry.push(b'\n');
        self.lines.lock().await.push(entry);
        Ok(())
    }
}
