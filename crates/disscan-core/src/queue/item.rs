//! Queue item: identifier + resolver arguments.

use crate::domain::Identifier;

/// What a caller submits.
///
/// `params` is passed through to the resolver untouched; the pool never looks
/// at it.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueItem {
    identifier: Identifier,
    params: serde_json::Value,
}

impl QueueItem {
    pub fn new(identifier: Identifier) -> Self {
        Self {
            identifier,
            params: serde_json::Value::Null,
        }
    }

    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = params;
        self
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn params(&self) -> &serde_json::Value {
        &self.params
    }

    pub(crate) fn into_parts(self) -> (Identifier, serde_json::Value) {
        (self.identifier, self.params)
    }
}

impl From<Identifier> for QueueItem {
    fn from(identifier: Identifier) -> Self {
        Self::new(identifier)
    }
}
