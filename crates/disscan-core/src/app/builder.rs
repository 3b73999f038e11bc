//! ClientBuilder - wires resolver, observer, sink and normalizer into a pool.
//!
//! Config is validated in `build()` so a bad setup fails before any work is
//! submitted.

use std::sync::Arc;

use super::client::{PoolClient, Router};
use super::config::PoolConfig;
use super::pool::WorkerPool;
use crate::error::CoreError;
use crate::ports::{Normalizer, Observer, RecordSink, Resolver, Silent, Verbatim};

/// Builds a [`PoolClient`].
///
/// ```ignore
/// let client = ClientBuilder::new(resolver)
///     .config(PoolConfig::default().with_workers(8))
///     .observer(|r: &Record| println!("{}", r.identifier()))
///     .sink(Arc::new(FileSink::new("out.jsonl")))
///     .build()?;
/// ```
pub struct ClientBuilder {
    resolver: Arc<dyn Resolver>,
    config: PoolConfig,
    observer: Arc<dyn Observer>,
    sink: Option<Arc<dyn RecordSink>>,
    normalizer: Arc<dyn Normalizer>,
}

impl ClientBuilder {
    pub fn new(resolver: impl Resolver + 'static) -> Self {
        Self::from_shared(Arc::new(resolver))
    }

    /// Use an already shared resolver.
    pub fn from_shared(resolver: Arc<dyn Resolver>) -> Self {
        Self {
            resolver,
            config: PoolConfig::default(),
            observer: Arc::new(Silent),
            sink: None,
            normalizer: Arc::new(Verbatim),
        }
    }

    pub fn config(mut self, config: PoolConfig) -> Self {
        self.config = config;
        self
    }

    pub fn observer(mut self, observer: impl Observer + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn RecordSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn normalizer(mut self, normalizer: impl Normalizer + 'static) -> Self {
        self.normalizer = Arc::new(normalizer);
        self
    }

    /// Validate the config and start the pool (workers spawn here).
    pub fn build(self) -> Result<PoolClient, CoreError> {
        let router = Arc::new(Router::new(self.observer, self.sink));
        let pool = WorkerPool::new(self.config, self.resolver, router.clone())?;
        Ok(PoolClient {
            pool,
            normalizer: self.normalizer,
            router,
        })
    }
}
