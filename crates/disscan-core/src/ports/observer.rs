use crate::domain::Record;

/// Observation callback, fired once per completed record.
///
/// The record gives the identifier, the state, and the payload (if any).
/// The core makes no assumption about what happens here: print, log,
/// aggregate...
pub trait Observer: Send + Sync {
    fn observe(&self, record: &Record);
}

impl<F> Observer for F
where
    F: Fn(&Record) + Send + Sync,
{
    fn observe(&self, record: &Record) {
        self(record)
    }
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Observer for Silent {
    fn observe(&self, _record: &Record) {}
}
