//! Domain model (identifiers, payloads, records).

pub mod ids;
pub mod payload;
pub mod record;

pub use ids::{Identifier, Ticket};
pub use payload::{Payload, VerificationLevel};
pub use record::{Failure, Record, RecordState, Resolution};
