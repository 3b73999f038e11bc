//! Queue module: submitted items and the bounded FIFO the workers pull from.

mod bounded;
mod item;

pub use item::QueueItem;

pub(crate) use bounded::TaskQueue;

use crate::domain::Record;

/// An accepted item, as the worker sees it.
///
/// The record was created `Pending` at acceptance time; the worker resolves it.
#[derive(Debug)]
pub(crate) struct Queued {
    pub record: Record,
    pub params: serde_json::Value,
}
