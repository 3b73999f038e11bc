use crate::domain::Identifier;

/// Turns one raw line of input into an identifier.
///
/// `None` means "skip this line".
pub trait Normalizer: Send + Sync {
    fn normalize(&self, raw: &str) -> Option<Identifier>;
}

/// Takes the line as-is (trimmed).
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl Normalizer for Verbatim {
    fn normalize(&self, raw: &str) -> Option<Identifier> {
        Identifier::new(raw).ok()
    }
}
