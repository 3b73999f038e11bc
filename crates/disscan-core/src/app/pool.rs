//! Worker pool: a bounded queue serviced by a fixed set of workers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::config::PoolConfig;
use super::worker_loop::Worker;
use crate::domain::Ticket;
use crate::error::{CoreError, PoolError};
use crate::observability::{Counters, PoolCounts};
use crate::ports::{RecordHandler, Resolver};
use crate::queue::{QueueItem, TaskQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Running,
    Draining,
    Drained,
    Cancelled,
}

/// A fixed pool of workers pulling from one bounded FIFO queue.
///
/// - Workers start in `new` and live until `drain` or `cancel`; both are
///   terminal.
/// - Every accepted item reaches the handler exactly once, unless `cancel`
///   throws it away first.
/// - Completion order is whatever order the resolver calls finish in.
///
/// Must be constructed inside a Tokio runtime.
pub struct WorkerPool {
    queue: Arc<TaskQueue>,
    counters: Arc<Counters>,
    abort: CancellationToken,
    workers: Mutex<Vec<JoinHandle<()>>>,
    phase: Mutex<Phase>,
    config: PoolConfig,
}

impl WorkerPool {
    /// Validate `config` and spawn `config.workers` worker tasks.
    pub fn new(
        config: PoolConfig,
        resolver: Arc<dyn Resolver>,
        handler: Arc<dyn RecordHandler>,
    ) -> Result<Self, CoreError> {
        config.validate()?;

        let queue = Arc::new(TaskQueue::new(config.queue_capacity));
        let counters = Arc::new(Counters::default());
        let abort = CancellationToken::new();

        let mut workers = Vec::with_capacity(config.workers);
        for id in 0..config.workers {
            let worker = Worker {
                id,
                queue: Arc::clone(&queue),
                resolver: Arc::clone(&resolver),
                handler: Arc::clone(&handler),
                timeout: config.timeout,
                abort: abort.clone(),
                counters: Arc::clone(&counters),
            };
            workers.push(tokio::spawn(worker.run()));
        }

        tracing::debug!(
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            timeout_ms = config.timeout.map(|t| t.as_millis() as u64),
            "worker pool started"
        );

        Ok(Self {
            queue,
            counters,
            abort,
            workers: Mutex::new(workers),
            phase: Mutex::new(Phase::Running),
            config,
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    fn phase(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_workers(&self) -> Vec<JoinHandle<()>> {
        let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *workers)
    }

    /// Enqueue, suspending while the queue is full.
    ///
    /// Items submitted one after another from the same task are accepted in
    /// that order.
    pub async fn submit(&self, item: impl Into<QueueItem>) -> Result<Ticket, PoolError> {
        let ticket = self.queue.put(item.into()).await?;
        self.counters.submitted();
        Ok(ticket)
    }

    /// Enqueue without suspending; `QueueFull` when there is no free slot.
    pub fn submit_nowait(&self, item: impl Into<QueueItem>) -> Result<Ticket, PoolError> {
        let ticket = self.queue.try_put(item.into())?;
        self.counters.submitted();
        Ok(ticket)
    }

    /// Graceful shutdown.
    ///
    /// 1. Close intake (later submits get `Closed`).
    /// 2. Wait until every accepted item has been resolved and handed off.
    /// 3. Let the now idle workers run out of their loops and join them.
    ///
    /// Producers still blocked on a full queue when this starts get `Closed`;
    /// finish feeding before draining.
    pub async fn drain(&self) -> Result<PoolCounts, PoolError> {
        {
            let mut phase = self.phase();
            if *phase != Phase::Running {
                return Err(PoolError::Closed);
            }
            *phase = Phase::Draining;
        }

        tracing::debug!(unfinished = self.queue.unfinished(), "draining pool");
        self.queue.close();
        self.queue.join().await;

        for handle in self.take_workers() {
            if let Err(err) = handle.await
                && err.is_panic()
            {
                tracing::error!(error = %err, "worker panicked during drain");
            }
        }

        {
            let mut phase = self.phase();
            if *phase == Phase::Draining {
                *phase = Phase::Drained;
            }
        }

        let counts = self.counts();
        tracing::debug!(?counts, "pool drained");
        Ok(counts)
    }

    /// Forced shutdown. Does not wait for anything.
    ///
    /// Queued items are dropped unprocessed and unreported; in-flight
    /// resolutions are cancelled at their next suspension point. Calling it
    /// again (or after `drain`) does nothing.
    pub fn cancel(&self) {
        {
            let mut phase = self.phase();
            if matches!(*phase, Phase::Cancelled | Phase::Drained) {
                return;
            }
            *phase = Phase::Cancelled;
        }

        let dropped = self.queue.abandon();
        self.abort.cancel();
        for handle in self.take_workers() {
            handle.abort();
        }

        tracing::debug!(dropped, "pool cancelled");
    }

    pub fn is_closed(&self) -> bool {
        *self.phase() != Phase::Running
    }

    pub fn counts(&self) -> PoolCounts {
        self.counters
            .snapshot(self.queue.len(), self.queue.unfinished())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // workers hold their own Arc to the queue; without this an undrained
        // pool would leave them parked forever
        self.abort.cancel();
        for handle in self.take_workers() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::domain::{Identifier, Payload, Record, RecordState, Resolution, VerificationLevel};
    use crate::error::ResolveError;
    use crate::ports::resolver_fn;

    #[derive(Default)]
    struct Collect(StdMutex<Vec<Record>>);

    impl Collect {
        fn records(&self) -> Vec<Record> {
            self.0.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RecordHandler for Collect {
        async fn handle(&self, record: Record) {
            self.0.lock().unwrap().push(record);
        }
    }

    fn id(s: &str) -> Identifier {
        Identifier::new(s).unwrap()
    }

    fn ok_resolver() -> Arc<dyn Resolver> {
        Arc::new(resolver_fn(|id: Identifier, _| async move {
            Ok::<_, ResolveError>(Resolution::success(Payload::new(
                id.as_str(),
                VerificationLevel::Unknown,
                1,
            )))
        }))
    }

    #[tokio::test]
    async fn zero_workers_is_a_config_error() {
        let sink = Arc::new(Collect::default());
        let err = WorkerPool::new(PoolConfig::default().with_workers(0), ok_resolver(), sink)
            .err()
            .unwrap();
        assert!(matches!(err, CoreError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn drain_processes_everything_then_rejects_submits() {
        let sink = Arc::new(Collect::default());
        let pool = WorkerPool::new(PoolConfig::default(), ok_resolver(), sink.clone()).unwrap();

        for s in ["a", "b", "c", "d", "e"] {
            pool.submit(id(s)).await.unwrap();
        }
        let counts = pool.drain().await.unwrap();

        assert_eq!(sink.records().len(), 5);
        assert_eq!(counts.succeeded, 5);
        assert_eq!(counts.in_flight, 0);
        assert_eq!(pool.submit(id("late")).await, Err(PoolError::Closed));
        assert_eq!(pool.submit_nowait(id("late")), Err(PoolError::Closed));
        assert_eq!(pool.drain().await, Err(PoolError::Closed));
    }

    #[tokio::test]
    async fn resolver_error_becomes_failed_record() {
        let sink = Arc::new(Collect::default());
        let resolver: Arc<dyn Resolver> = Arc::new(resolver_fn(|_, _| async move {
            Err::<Resolution, _>(ResolveError::Other("boom".to_string()))
        }));
        let pool = WorkerPool::new(PoolConfig::default(), resolver, sink.clone()).unwrap();

        pool.submit(id("a")).await.unwrap();
        pool.submit(id("b")).await.unwrap();
        let counts = pool.drain().await.unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.state() == RecordState::Failed));
        assert_eq!(counts.failed, 2);
        assert_eq!(counts.timed_out, 0);
    }

    #[tokio::test]
    async fn resolver_panic_does_not_kill_the_worker() {
        let sink = Arc::new(Collect::default());
        let resolver: Arc<dyn Resolver> = Arc::new(resolver_fn(|id: Identifier, _| async move {
            if id.as_str() == "bad" {
                panic!("resolver exploded");
            }
            Ok::<_, ResolveError>(Resolution::rejected("nope"))
        }));
        let pool = WorkerPool::new(PoolConfig::default().with_workers(1), resolver, sink.clone())
            .unwrap();

        for s in ["bad", "fine", "bad", "fine"] {
            pool.submit(id(s)).await.unwrap();
        }
        pool.drain().await.unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 4);
        let panicked = records
            .iter()
            .filter(|r| {
                matches!(r.failure(), Some(crate::domain::Failure::Error { message }) if message.contains("exploded"))
            })
            .count();
        assert_eq!(panicked, 2);
    }

    /// Panics on one identifier, collects the rest.
    #[derive(Default)]
    struct Fragile(Collect);

    #[async_trait]
    impl RecordHandler for Fragile {
        async fn handle(&self, record: Record) {
            if record.identifier().as_str() == "boom" {
                panic!("handler exploded");
            }
            self.0.handle(record).await;
        }
    }

    #[tokio::test]
    async fn handler_panic_still_marks_the_item_done() {
        let sink = Arc::new(Fragile::default());
        let pool = WorkerPool::new(PoolConfig::default().with_workers(1), ok_resolver(), sink.clone())
            .unwrap();

        for s in ["a", "boom", "b", "boom", "c"] {
            pool.submit(id(s)).await.unwrap();
        }
        let counts = tokio::time::timeout(Duration::from_secs(5), pool.drain())
            .await
            .expect("drain hung after a handler panic")
            .unwrap();

        let handled: Vec<String> = sink
            .0
            .records()
            .iter()
            .map(|r| r.identifier().to_string())
            .collect();
        assert_eq!(handled, ["a", "b", "c"]);
        assert_eq!(counts.completed(), 5);
        assert_eq!(counts.in_flight, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_abandons_in_flight_and_queued_work() {
        let sink = Arc::new(Collect::default());
        let resolver: Arc<dyn Resolver> = Arc::new(resolver_fn(|_, _| async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, ResolveError>(Resolution::rejected("too late"))
        }));
        let pool = WorkerPool::new(PoolConfig::default().with_workers(2), resolver, sink.clone())
            .unwrap();

        for i in 0..6 {
            pool.submit(id(&format!("id-{i}"))).await.unwrap();
        }
        // let both workers pick something up
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(pool.counts().in_flight, 2);

        pool.cancel();
        pool.cancel();
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert!(sink.records().is_empty());
        assert!(pool.is_closed());
        assert_eq!(pool.submit_nowait(id("x")), Err(PoolError::Closed));
        assert_eq!(pool.drain().await, Err(PoolError::Closed));
    }

    #[tokio::test]
    async fn params_reach_the_resolver() {
        let sink = Arc::new(Collect::default());
        let resolver: Arc<dyn Resolver> = Arc::new(resolver_fn(|id: Identifier, params: serde_json::Value| async move {
            let population = params["population"].as_u64().unwrap_or_default();
            Ok::<_, ResolveError>(Resolution::success(Payload::new(id.as_str(), VerificationLevel::Unknown, population)))
        }));
        let pool = WorkerPool::new(PoolConfig::default(), resolver, sink.clone()).unwrap();

        pool.submit(QueueItem::new(id("a")).with_params(serde_json::json!({"population": 42})))
            .await
            .unwrap();
        pool.drain().await.unwrap();

        let records = sink.records();
        assert_eq!(records[0].payload().unwrap().population, 42);
    }
}
