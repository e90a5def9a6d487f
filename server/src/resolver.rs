use crate::store::Store;
use async_trait::async_trait;
use std::sync::Arc;

/// Maps a short key to its target.
///
/// `None` means "no target" and covers every reason a lookup can fail; the
/// redirect layer only cares whether a target exists.
#[async_trait]
pub trait Resolver: Send + Sync + 'static {
    async fn resolve(&self, key: &str) -> Option<String>;
}

/// Plain closures can stand in for a resolver (handy for fixed stubs).
#[async_trait]
impl<F> Resolver for F
where
    F: Fn(&str) -> Option<String> + Send + Sync + 'static,
{
    async fn resolve(&self, key: &str) -> Option<String> {
        (self)(key)
    }
}

/// Resolver backed by the link [`Store`].
#[derive(Debug, Clone)]
pub struct StoreResolver {
    store: Arc<Store>,
}

impl StoreResolver {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Resolver for StoreResolver {
    async fn resolve(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(target) => {
                tracing::debug!(key, target = %target, "resolved short key");
                Some(target)
            }
            Err(e) => {
                tracing::trace!(key, reason = %e, "short key not resolved");
                None
            }
        }
    }
}
