//! Ports: the seams between the pool and whatever surrounds it.
//!
//! The core owns none of these implementations' side effects. The CLI (or a
//! test) plugs in the transport, the normalization of raw text, the console
//! reporting, and the sink destination.

pub mod handler;
pub mod normalizer;
pub mod observer;
pub mod resolver;
pub mod sink;

pub use self::handler::RecordHandler;
pub use self::normalizer::{Normalizer, Verbatim};
pub use self::observer::{Observer, Silent};
pub use self::resolver::{FnResolver, Resolver, resolver_fn};
pub use self::sink::RecordSink;
