//! Impls: sink destinations shipped with the core.
//!
//! - **FileSink**: append-only file, opened on first write
//! - **MemorySink**: keeps lines in memory (tests, embedding)

pub mod file_sink;
pub mod memory_sink;

pub use self::file_sink::FileSink;
pub use self::memory_sink::MemorySink;
