//! Worker loop: dequeue -> resolve (under timeout) -> hand off -> done.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::domain::{Failure, Record, Resolution};
use crate::observability::Counters;
use crate::ports::{RecordHandler, Resolver};
use crate::queue::{Queued, TaskQueue};

/// Everything one worker needs. Cloned `Arc`s, one per worker.
pub(crate) struct Worker {
    pub id: usize,
    pub queue: Arc<TaskQueue>,
    pub resolver: Arc<dyn Resolver>,
    pub handler: Arc<dyn RecordHandler>,
    pub timeout: Option<Duration>,
    pub abort: CancellationToken,
    pub counters: Arc<Counters>,
}

impl Worker {
    /// Run until the queue is closed and empty, or until `abort` fires.
    pub async fn run(self) {
        tracing::trace!(worker = self.id, "worker started");

        loop {
            // abort は dequeue 待ちとも処理中とも競合させる
            let entry = tokio::select! {
                biased;
                _ = self.abort.cancelled() => break,
                entry = self.queue.pop() => match entry {
                    Some(entry) => entry,
                    None => break,
                },
            };

            tokio::select! {
                biased;
                _ = self.abort.cancelled() => break,
                _ = self.process(entry) => {}
            }

            // success or failure, the item is done
            self.queue.task_done();
        }

        tracing::trace!(worker = self.id, "worker stopped");
    }

    async fn process(&self, entry: Queued) {
        let Queued { record, params } = entry;
        let span = tracing::debug_span!(
            "resolve",
            worker = self.id,
            ticket = %record.ticket(),
            identifier = %record.identifier(),
        );

        async move {
            let resolution = self.invoke(&record, &params).await;
            let record = record.settle(resolution);
            self.counters.completed(&record);
            tracing::debug!(state = ?record.state(), "resolved");

            let handed_off = AssertUnwindSafe(self.handler.handle(record))
                .catch_unwind()
                .await;
            if let Err(panic) = handed_off {
                tracing::error!(
                    panic = %panic_message(panic.as_ref()),
                    "record handler panicked"
                );
            }
        }
        .instrument(span)
        .await
    }

    /// Call the resolver, folding timeouts, errors and panics into a failed
    /// resolution. Nothing escapes from here.
    async fn invoke(&self, record: &Record, params: &serde_json::Value) -> Resolution {
        let call = AssertUnwindSafe(self.resolver.resolve(record.identifier(), params)).catch_unwind();

        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_elapsed) => {
                    tracing::debug!(timeout_ms = limit.as_millis() as u64, "resolver timed out");
                    return Resolution::Failed(Failure::timeout(limit));
                }
            },
            None => call.await,
        };

        match outcome {
            Ok(Ok(resolution)) => resolution,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "resolver raised");
                Resolution::Failed(Failure::error(err.to_string()))
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(panic = %message, "resolver panicked");
                Resolution::Failed(Failure::error(format!("resolver panicked: {message}")))
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
