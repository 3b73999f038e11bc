use std::future::Future;

use async_trait::async_trait;

use crate::domain::{Identifier, Resolution};
use crate::error::ResolveError;

/// Looks up one identifier against the remote service.
///
/// Contract:
/// - Ordinary failures (unknown target, bad status, malformed body, network
///   trouble) come back as `Ok(Resolution::Failed(..))`.
/// - `Err` is for setup/programming errors. The pool still only records it as
///   a failed item.
/// - One resolver is shared by every worker; any state it keeps (an HTTP
///   client, say) must be safe to use concurrently.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(
        &self,
        identifier: &Identifier,
        params: &serde_json::Value,
    ) -> Result<Resolution, ResolveError>;
}

/// Resolver backed by a closure. See [`resolver_fn`].
pub struct FnResolver<F> {
    f: F,
}

/// Wrap an async closure as a [`Resolver`].
///
/// ```ignore
/// let resolver = resolver_fn(|id, _params| async move {
///     Ok::<_, ResolveError>(Resolution::rejected(format!("{id} not found")))
/// });
/// ```
pub fn resolver_fn<F, Fut>(f: F) -> FnResolver<F>
where
    F: Fn(Identifier, serde_json::Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Resolution, ResolveError>> + Send + 'static,
{
    FnResolver { f }
}

#[async_trait]
impl<F, Fut> Resolver for FnResolver<F>
where
    F: Fn(Identifier, serde_json::Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Resolution, ResolveError>> + Send + 'static,
{
    async fn resolve(
        &self,
        identifier: &Identifier,
        params: &serde_json::Value,
    ) -> Result<Resolution, ResolveError> {
        (self.f)(identifier.clone(), params.clone()).await
    }
}
