//! disscan-core
//!
//! A bounded pool of async workers that resolves identifiers through a
//! pluggable [`ports::Resolver`] and routes every finished [`domain::Record`]
//! to an observer, plus successful ones to a sink.
//!
//! # モジュール構成
//! - **domain**: Identifier, Ticket, Payload, Record
//! - **ports**: Resolver, Observer, RecordSink, Normalizer, RecordHandler
//! - **queue**: bounded FIFO (capacity, close, join)
//! - **app**: PoolConfig, WorkerPool, ClientBuilder, PoolClient
//! - **impls**: FileSink, MemorySink
//! - **error**: PoolError, SinkError, ResolveError, CoreError
//! - **observability**: PoolCounts

pub mod app;
pub mod domain;
pub mod error;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod queue;

pub use app::{ClientBuilder, PoolClient, PoolConfig, Summary, WorkerPool};
pub use domain::{
    Failure, Identifier, Payload, Record, RecordState, Resolution, Ticket, VerificationLevel,
};
pub use error::{CoreError, PoolError, ResolveError, SinkError};
pub use observability::PoolCounts;
