//! Invite normalization: pull the code out of an invite URL.

use disscan_core::Identifier;
use disscan_core::ports::Normalizer;
use once_cell::sync::Lazy;
use regex::Regex;

/// `discord.gg/<code>`, `discord.io|me|li/<code>`, `discordapp.com/invite/<code>`,
/// with or without scheme and `www.`.
static INVITE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:www\.)?(?:discord\.(?:gg|io|me|li)|discordapp\.com/invite)/([^\s/?#]+)",
    )
    .unwrap()
});

/// Turns a line of input into an invite code.
///
/// Lines that aren't invite URLs are taken as bare codes (trimmed).
#[derive(Debug, Clone, Copy, Default)]
pub struct InviteNormalizer;

impl InviteNormalizer {
    pub fn extract(raw: &str) -> &str {
        let raw = raw.trim();
        INVITE_PATTERN
            .captures(raw)
            .and_then(|c| c.get(1))
            .map_or(raw, |m| m.as_str())
    }
}

impl Normalizer for InviteNormalizer {
    fn normalize(&self, raw: &str) -> Option<Identifier> {
        Identifier::new(Self::extract(raw)).ok()
    }
}
