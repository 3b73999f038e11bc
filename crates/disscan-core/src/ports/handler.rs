use async_trait::async_trait;

use crate::domain::Record;

/// Receives every record a worker finishes, success or failure.
///
/// The worker awaits `handle` before marking the item complete, so `drain`
/// also waits for whatever the handler does (sink writes included).
/// Implementations report their own problems; nothing can be returned to the
/// worker.
#[async_trait]
pub trait RecordHandler: Send + Sync {
    async fn handle(&self, record: Record);
}
