//! Invite lookups against the Discord REST API.

use std::time::Duration;

use async_trait::async_trait;
use disscan_core::ports::Resolver;
use disscan_core::{Failure, Identifier, Payload, ResolveError, Resolution, VerificationLevel};
use reqwest::Url;
use serde::Deserialize;

pub const DEFAULT_API_BASE: &str = "https://discord.com";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client settings for [`InviteResolver`].
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    pub api_base: String,
    pub proxy: Option<String>,
    pub user_agent: String,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            proxy: None,
            user_agent: crate::agents::pick().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct InviteDocument {
    guild: Option<GuildInfo>,
    #[serde(default)]
    approximate_member_count: u64,
}

#[derive(Debug, Deserialize)]
struct GuildInfo {
    name: String,
    #[serde(default)]
    verification_level: u8,
}

/// Resolves invite codes with one shared `reqwest::Client`.
///
/// Every ordinary failure (unknown invite, non-2xx, unreadable body, network
/// trouble) comes back as a failed [`Resolution`]; the pool never sees an
/// `Err` from here except for a base URL that can't take a path.
#[derive(Debug, Clone)]
pub struct InviteResolver {
    client: reqwest::Client,
    base: Url,
}

impl InviteResolver {
    pub fn new(options: &ResolverOptions) -> anyhow::Result<Self> {
        let base = Url::parse(&options.api_base)?;

        let mut builder = reqwest::Client::builder()
            .user_agent(options.user_agent.as_str())
            .connect_timeout(CONNECT_TIMEOUT);
        builder = match &options.proxy {
            Some(proxy) => builder.proxy(reqwest::Proxy::all(proxy.as_str())?),
            // ignore *_PROXY env vars unless asked for explicitly
            None => builder.no_proxy(),
        };

        tracing::debug!(
            base = %base,
            proxy = options.proxy.as_deref().unwrap_or("-"),
            user_agent = %options.user_agent,
            "invite resolver ready"
        );

        Ok(Self {
            client: builder.build()?,
            base,
        })
    }

    /// `{base}/api/v10/invites/{code}?with_counts=1&with_expiration=1`
    pub fn endpoint(&self, code: &str) -> Result<Url, ResolveError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ResolveError::Other(format!("api base {} cannot take a path", self.base)))?
            .pop_if_empty()
            .extend(["api", "v10", "invites", code]);
        url.query_pairs_mut()
            .append_pair("with_counts", "1")
            .append_pair("with_expiration", "1");
        Ok(url)
    }
}

#[async_trait]
impl Resolver for InviteResolver {
    async fn resolve(
        &self,
        identifier: &Identifier,
        _params: &serde_json::Value,
    ) -> Result<Resolution, ResolveError> {
        let url = self.endpoint(identifier.as_str())?;

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(error = %err, "invite request failed");
                return Ok(Resolution::Failed(Failure::error(format!(
                    "request failed: {err}"
                ))));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Ok(Resolution::rejected(format!("HTTP {status}")));
        }

        match response.bytes().await {
            Ok(body) => Ok(parse_invite(&body)),
            Err(err) => Ok(Resolution::Failed(Failure::error(format!(
                "reading body failed: {err}"
            )))),
        }
    }
}

/// Turn a 2xx invite body into a resolution. The full document is kept on
/// the payload so the sink stores everything the API returned.
///
/// A body that doesn't decode as an invite is a rejection, same as an
/// error status: the remote side answered, just not with an invite.
pub fn parse_invite(body: &[u8]) -> Resolution {
    let document: serde_json::Value = match serde_json::from_slice(body) {
        Ok(document) => document,
        Err(err) => return Resolution::rejected(format!("malformed body: {err}")),
    };

    let invite = match InviteDocument::deserialize(&document) {
        Ok(invite) => invite,
        Err(err) => return Resolution::rejected(format!("unexpected body: {err}")),
    };
    let Some(guild) = invite.guild else {
        return Resolution::rejected("invite has no guild");
    };

    Resolution::success(
        Payload::new(
            guild.name,
            VerificationLevel::from(guild.verification_level),
            invite.approximate_member_count,
        )
        .with_document(document),
    )
}
