//! App - アプリケーション層
//!
//! ports を組み合わせてプールを動かす。
//!
//! - **PoolConfig**: worker 数、キュー容量、タイムアウト
//! - **WorkerPool**: bounded queue + 固定数の worker
//! - **ClientBuilder / PoolClient**: 入力の正規化、observer と sink へのルーティング

pub mod builder;
pub mod client;
pub mod config;
pub mod pool;
mod worker_loop;

pub use self::builder::ClientBuilder;
pub use self::client::{PoolClient, Summary};
pub use self::config::PoolConfig;
pub use self::pool::WorkerPool;
