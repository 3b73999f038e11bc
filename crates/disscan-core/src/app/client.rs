//! PoolClient - feeds identifiers in, routes finished records out.
//!
//! No concurrency of its own: everything goes through the pool.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use super::pool::WorkerPool;
use crate::domain::{Record, Ticket};
use crate::error::{CoreError, PoolError};
use crate::observability::PoolCounts;
use crate::ports::{Normalizer, Observer, RecordHandler, RecordSink};

/// Where every finished record goes: the observer always, the sink for
/// successes only.
pub(crate) struct Router {
    pub observer: Arc<dyn Observer>,
    pub sink: Option<Arc<dyn RecordSink>>,
    pub sink_writes: AtomicUsize,
    pub sink_failures: AtomicUsize,
}

impl Router {
    pub fn new(observer: Arc<dyn Observer>, sink: Option<Arc<dyn RecordSink>>) -> Self {
        Self {
            observer,
            sink,
            sink_writes: AtomicUsize::new(0),
            sink_failures: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RecordHandler for Router {
    async fn handle(&self, record: Record) {
        self.observer.observe(&record);

        if !record.is_success() {
            return;
        }
        let Some(sink) = &self.sink else {
            return;
        };

        let written = match record.to_sink_line() {
            Ok(line) => sink.write(&line).await,
            Err(err) => Err(err),
        };
        match written {
            Ok(()) => {
                self.sink_writes.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                // the record still counts as processed; it is not re-queued
                self.sink_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    identifier = %record.identifier(),
                    error = %err,
                    "sink write failed"
                );
            }
        }
    }
}

/// Final tally returned by [`PoolClient::finish`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub counts: PoolCounts,
    pub sink_writes: usize,
    pub sink_failures: usize,
}

/// Thin orchestration around a [`WorkerPool`].
///
/// Build one with [`super::ClientBuilder`].
pub struct PoolClient {
    pub(crate) pool: WorkerPool,
    pub(crate) normalizer: Arc<dyn Normalizer>,
    pub(crate) router: Arc<Router>,
}

impl PoolClient {
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Normalize one raw input and submit it (waiting for a slot if needed).
    ///
    /// `Ok(None)` when the normalizer rejected the input.
    pub async fn submit(&self, raw: &str) -> Result<Option<Ticket>, PoolError> {
        let Some(identifier) = self.normalizer.normalize(raw) else {
            tracing::debug!(raw, "input skipped by normalizer");
            return Ok(None);
        };
        self.pool.submit(identifier).await.map(Some)
    }

    /// Submit a batch of raw inputs in order. Returns how many were accepted.
    pub async fn feed<I, S>(&self, inputs: I) -> Result<usize, PoolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut accepted = 0;
        for raw in inputs {
            if self.submit(raw.as_ref()).await?.is_some() {
                accepted += 1;
            }
        }
        Ok(accepted)
    }

    /// Submit every non-blank line of `reader`.
    ///
    /// A line that isn't valid UTF-8 is logged and skipped; only a failing
    /// reader or a closed pool stops the feed.
    pub async fn feed_lines<R>(&self, mut reader: R) -> Result<usize, CoreError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut buf = Vec::new();
        let mut line_no = 0usize;
        let mut accepted = 0;
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            line_no += 1;

            let Ok(line) = std::str::from_utf8(&buf) else {
                tracing::warn!(line = line_no, "skipping line that is not valid UTF-8");
                continue;
            };
            if line.trim().is_empty() {
                continue;
            }
            if self.submit(line).await?.is_some() {
                accepted += 1;
            }
        }
        Ok(accepted)
    }

    /// Open each file in turn and feed its lines.
    pub async fn feed_files<I, P>(&self, paths: I) -> Result<usize, CoreError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut accepted = 0;
        for path in paths {
            let path = path.as_ref();
            let file = tokio::fs::File::open(path).await?;
            let n = self.feed_lines(BufReader::new(file)).await?;
            tracing::debug!(path = %path.display(), accepted = n, "list fed");
            accepted += n;
        }
        Ok(accepted)
    }

    pub fn counts(&self) -> PoolCounts {
        self.pool.counts()
    }

    /// Forced stop; see [`WorkerPool::cancel`].
    pub fn abort(&self) {
        self.pool.cancel();
    }

    /// Drain the pool, then close the sink.
    pub async fn finish(self) -> Result<Summary, CoreError> {
        let counts = self.pool.drain().await?;

        if let Some(sink) = &self.router.sink
            && let Err(err) = sink.close().await
        {
            tracing::warn!(error = %err, "sink close failed");
            self.router.sink_failures.fetch_add(1, Ordering::Relaxed);
        }

        Ok(Summary {
            counts,
            sink_writes: self.router.sink_writes.load(Ordering::Relaxed),
            sink_failures: self.router.sink_failures.load(Ordering::Relaxed),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::app::{ClientBuilder, PoolConfig};
    use crate::domain::{Identifier, Payload, RecordState, Resolution, VerificationLevel};
    use crate::error::{ResolveError, SinkError};
    use crate::impls::MemorySink;
    use crate::ports::resolver_fn;

    fn echo_resolver() -> impl crate::ports::Resolver {
        resolver_fn(|id: Identifier, _| async move {
            if id.as_str().starts_with("bad") {
                return Ok::<_, ResolveError>(Resolution::rejected("unknown"));
            }
            Ok(Resolution::success(Payload::new(
                id.as_str(),
                VerificationLevel::NoVerification,
                3,
            )))
        })
    }

    struct BrokenSink;

    #[async_trait]
    impl RecordSink for BrokenSink {
        async fn write(&self, _line: &[u8]) -> Result<(), SinkError> {
            Err(SinkError::Io(std::io::Error::other("disk gone")))
        }
    }

    #[tokio::test]
    async fn routes_failures_to_observer_only() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::new(MemorySink::new());
        let client = ClientBuilder::new(echo_resolver())
            .observer({
                let seen = Arc::clone(&seen);
                move |r: &Record| seen.lock().unwrap().push((r.identifier().to_string(), r.state()))
            })
            .sink(sink.clone())
            .build()
            .unwrap();

        let accepted = client.feed(["good-1", "bad-1", "  ", "good-2"]).await.unwrap();
        assert_eq!(accepted, 3);

        let summary = client.finish().await.unwrap();
        assert_eq!(summary.counts.completed(), 3);
        assert_eq!(summary.sink_writes, 2);
        assert_eq!(sink.len().await, 2);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(
            seen.iter().filter(|(_, s)| *s == RecordState::Failed).count(),
            1
        );
    }

    #[tokio::test]
    async fn feed_lines_skips_blank_lines() {
        let sink = Arc::new(MemorySink::new());
        let client = ClientBuilder::new(echo_resolver())
            .sink(sink.clone())
            .build()
            .unwrap();

        let input: &[u8] = b"one\n\n   \ntwo\r\nthree";
        let accepted = client.feed_lines(input).await.unwrap();
        assert_eq!(accepted, 3);

        let summary = client.finish().await.unwrap();
        assert_eq!(summary.sink_writes, 3);
    }

    #[tokio::test]
    async fn feed_lines_skips_undecodable_lines() {
        let sink = Arc::new(MemorySink::new());
        let client = ClientBuilder::new(echo_resolver())
            .sink(sink.clone())
            .build()
            .unwrap();

        let input: &[u8] = b"good1\nbad\xff\ngood2\ngood3\n";
        let accepted = client.feed_lines(input).await.unwrap();
        assert_eq!(accepted, 3);
        assert_eq!(client.counts().submitted, 3);

        let summary = client.finish().await.unwrap();
        assert_eq!(summary.sink_writes, 3);
        let written: Vec<String> = sink
            .lines()
            .await
            .iter()
            .map(|line| {
                let doc: serde_json::Value = serde_json::from_slice(line).unwrap();
                doc["identifier"].as_str().unwrap().to_string()
            })
            .collect();
        for id in ["good1", "good2", "good3"] {
            assert!(written.iter().any(|w| w == id), "{id} missing");
        }
    }

    #[tokio::test]
    async fn feed_files_reads_every_list() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        tokio::fs::write(&a, "x1\nx2\n").await.unwrap();
        tokio::fs::write(&b, "x3\n").await.unwrap();

        let client = ClientBuilder::new(echo_resolver()).build().unwrap();
        let accepted = client.feed_files([&a, &b]).await.unwrap();
        assert_eq!(accepted, 3);
        assert_eq!(client.finish().await.unwrap().counts.succeeded, 3);
    }

    #[tokio::test]
    async fn missing_list_is_an_io_error() {
        let client = ClientBuilder::new(echo_resolver()).build().unwrap();
        let err = client
            .feed_files(["/definitely/not/here.txt"])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
    }

    #[tokio::test]
    async fn accepted_work_still_drains_after_a_feed_error() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.txt");
        tokio::fs::write(&first, "a\nb\n").await.unwrap();
        let missing = dir.path().join("missing.txt");

        let sink = Arc::new(MemorySink::new());
        let client = ClientBuilder::new(echo_resolver())
            .sink(sink.clone())
            .build()
            .unwrap();

        let err = client.feed_files([&first, &missing]).await.unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));

        let summary = client.finish().await.unwrap();
        assert_eq!(summary.counts.succeeded, 2);
        assert_eq!(sink.len().await, 2);
    }

    #[tokio::test]
    async fn sink_failure_is_counted_not_fatal() {
        let client = ClientBuilder::new(echo_resolver())
            .config(PoolConfig::default().with_workers(1))
            .sink(Arc::new(BrokenSink))
            .build()
            .unwrap();

        client.feed(["a", "b"]).await.unwrap();
        let summary = client.finish().await.unwrap();
        assert_eq!(summary.counts.succeeded, 2);
        assert_eq!(summary.sink_writes, 0);
        assert_eq!(summary.sink_failures, 2);
    }

    #[tokio::test]
    async fn finish_after_abort_reports_closed() {
        let client = ClientBuilder::new(echo_resolver()).build().unwrap();
        client.feed(["a"]).await.unwrap();
        client.abort();
        let err = client.finish().await.unwrap_err();
        assert!(matches!(err, CoreError::Pool(PoolError::Closed)));
    }
}
