use async_trait::async_trait;

use crate::error::SinkError;

/// Append-only destination for successful records.
///
/// `write` appends `line` plus a record separator. Concurrent calls must never
/// interleave: each write lands whole or not at all with respect to the
/// others.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn write(&self, line: &[u8]) -> Result<(), SinkError>;

    /// Flush and release the destination. Called once, by the pool client.
    async fn close(&self) -> Result<(), SinkError> {
        Ok(())
    }
}
