//! Record: the outcome of resolving one identifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Identifier, Payload, Ticket};
use crate::error::{CoreError, SinkError};

/// Observable state of a record.
///
/// State transitions:
/// - Pending -> Success
/// - Pending -> Failed
///
/// Both targets are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordState {
    Pending,
    Success,
    Failed,
}

impl RecordState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RecordState::Pending)
    }
}

/// Why a record failed.
///
/// All variants count as plain `Failed` for reporting; the split is kept for
/// diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Failure {
    /// The remote side answered, and the answer was "no" (unknown target,
    /// error status, malformed body).
    Rejected { reason: String },

    /// The resolver did not finish within the pool timeout.
    Timeout { after_ms: u64 },

    /// The lookup itself broke: transport trouble, or the resolver raised or
    /// panicked.
    Error { message: String },
}

impl Failure {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Failure::Rejected {
            reason: reason.into(),
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Failure::Timeout {
            after_ms: u64::try_from(after.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Failure::Error {
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Failure::Timeout { .. })
    }
}

/// What a resolver hands back for one identifier.
///
/// The worker applies it to the pending record it dequeued.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Success(Payload),
    Failed(Failure),
}

impl Resolution {
    pub fn success(payload: Payload) -> Self {
        Resolution::Success(payload)
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Resolution::Failed(Failure::rejected(reason))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Status {
    Pending,
    Success(Payload),
    Failed(Failure),
}

/// One unit of work and its result.
///
/// Design:
/// - Created `Pending` the moment the queue accepts an identifier.
/// - `resolve` consumes the pending record and returns the terminal one, so a
///   resolved record can't be mutated again.
/// - The payload lives inside the `Success` status: it exists exactly when
///   the state is `Success`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    identifier: Identifier,
    ticket: Ticket,
    accepted_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
    status: Status,
}

impl Record {
    pub fn pending(identifier: Identifier) -> Self {
        Self {
            identifier,
            ticket: Ticket::generate(),
            accepted_at: Utc::now(),
            resolved_at: None,
            status: Status::Pending,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn accepted_at(&self) -> DateTime<Utc> {
        self.accepted_at
    }

    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    pub fn state(&self) -> RecordState {
        match self.status {
            Status::Pending => RecordState::Pending,
            Status::Success(_) => RecordState::Success,
            Status::Failed(_) => RecordState::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, Status::Success(_))
    }

    pub fn payload(&self) -> Option<&Payload> {
        match &self.status {
            Status::Success(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match &self.status {
            Status::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// Move out of `Pending`.
    pub fn resolve(self, resolution: Resolution) -> Result<Self, CoreError> {
        if self.state().is_terminal() {
            return Err(CoreError::AlreadyResolved(self.identifier));
        }
        Ok(self.settle(resolution))
    }

    /// Unchecked transition for the worker, which only ever holds records
    /// straight out of the queue.
    pub(crate) fn settle(mut self, resolution: Resolution) -> Self {
        debug_assert_eq!(self.state(), RecordState::Pending);
        self.status = match resolution {
            Resolution::Success(payload) => Status::Success(payload),
            Resolution::Failed(failure) => Status::Failed(failure),
        };
        self.resolved_at = Some(Utc::now());
        self
    }

    /// The line a sink stores for a successful record (no trailing newline).
    pub fn to_sink_line(&self) -> Result<Vec<u8>, SinkError> {
        let Status::Success(payload) = &self.status else {
            return Err(SinkError::NotSuccess(self.identifier.clone()));
        };
        let line = SinkLine {
            identifier: &self.identifier,
            resolved_at: self.resolved_at,
            payload,
        };
        Ok(serde_json::to_vec(&line)?)
    }
}

#[derive(Serialize)]
struct SinkLine<'a> {
    identifier: &'a Identifier,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    payload: &'a Payload,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VerificationLevel;

    fn id(s: &str) -> Identifier {
        Identifier::new(s).unwrap()
    }

    #[test]
    fn pending_record_has_no_payload_or_failure() {
        let r = Record::pending(id("abc"));
        assert_eq!(r.state(), RecordState::Pending);
        assert!(r.payload().is_none());
        assert!(r.failure().is_none());
        assert!(r.resolved_at().is_none());
    }

    #[test]
    fn success_carries_payload() {
        let payload = Payload::new("Server", VerificationLevel::NoVerification, 10);
        let r = Record::pending(id("abc"))
            .resolve(Resolution::success(payload.clone()))
            .unwrap();
        assert_eq!(r.state(), RecordState::Success);
        assert_eq!(r.payload(), Some(&payload));
        assert!(r.failure().is_none());
        assert!(r.resolved_at().is_some());
    }

    #[test]
    fn failed_has_no_payload() {
        let r = Record::pending(id("abc"))
            .resolve(Resolution::Failed(Failure::timeout(Duration::from_millis(50))))
            .unwrap();
        assert_eq!(r.state(), RecordState::Failed);
        assert!(r.payload().is_none());
        assert!(r.failure().unwrap().is_timeout());
    }

    #[test]
    fn resolved_record_cannot_transition_again() {
        let r = Record::pending(id("abc"))
            .resolve(Resolution::rejected("404"))
            .unwrap();
        let err = r
            .resolve(Resolution::success(Payload::new(
                "x",
                VerificationLevel::Unknown,
                1,
            )))
            .unwrap_err();
        assert!(matches!(err, CoreError::AlreadyResolved(i) if i.as_str() == "abc"));
    }

    #[test]
    fn sink_line_flattens_payload() {
        let payload = Payload::new("Server", VerificationLevel::VerifiedPhone, 5)
            .with_document(serde_json::json!({"code": "abc"}));
        let r = Record::pending(id("abc"))
            .resolve(Resolution::success(payload))
            .unwrap();
        let line = r.to_sink_line().unwrap();
        let v: serde_json::Value = serde_json::from_slice(&line).unwrap();
        assert_eq!(v["identifier"], "abc");
        assert_eq!(v["name"], "Server");
        assert_eq!(v["level"], 4);
        assert_eq!(v["population"], 5);
        assert_eq!(v["document"]["code"], "abc");
        assert!(!line.contains(&b'\n'));
    }

    #[test]
    fn sink_line_refuses_failed_records() {
        let r = Record::pending(id("abc"))
            .resolve(Resolution::rejected("nope"))
            .unwrap();
        assert!(matches!(r.to_sink_line(), Err(SinkError::NotSuccess(_))));
    }

    #[test]
    fn failure_serializes_with_kind_tag() {
        let v = serde_json::to_value(Failure::rejected("404")).unwrap();
        assert_eq!(v["kind"], "rejected");
        assert_eq!(v["reason"], "404");
    }
}
