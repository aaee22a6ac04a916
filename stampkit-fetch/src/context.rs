//! Per-batch provider context.
//!
//! One [`ProviderContext`] is created for each verification batch and shared
//! by reference with every provider verified in that batch. The first
//! provider that needs a resource (a token balance, an OAuth access token)
//! fetches it; everyone else reads the cached value.
//!
//! Lookups are single-flight: concurrent callers asking for the same
//! `(namespace, key)` wait on one pending fetch, so there is at most one
//! external call per resource per batch. Entries are write-once.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, trace};

type Slot = Arc<OnceCell<Value>>;

/// Namespaced, single-flight memoization cache scoped to one batch.
///
/// Deliberately not `Clone`: share it by reference (or `Arc`) within one
/// batch and create a fresh one for the next.
#[derive(Debug, Default)]
pub struct ProviderContext {
    slots: Mutex<HashMap<(String, String), Slot>>,
}

impl ProviderContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, namespace: &str, key: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .entry((namespace.to_string(), key.to_string()))
            .or_default()
            .clone()
    }

    /// Returns the cached value, fetching it with `fetch` on first use.
    ///
    /// If `fetch` fails the error is returned and nothing is cached, so a
    /// later caller may try again.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        namespace: &str,
        key: &str,
        fetch: F,
    ) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        let slot = self.slot(namespace, key);
        if let Some(value) = slot.get() {
            trace!(namespace, key, "Context hit");
            return Ok(value.clone());
        }

        let value = slot
            .get_or_try_init(|| async {
                debug!(namespace, key, "Context miss, fetching");
                fetch().await
            })
            .await?;
        Ok(value.clone())
    }

    /// Returns the cached value without fetching.
    pub fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .get(&(namespace.to_string(), key.to_string()))
            .and_then(|slot| slot.get().cloned())
    }

    /// Number of populated entries.
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|s| s.initialized()).count()
    }

    /// Returns true if no entry has been populated.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_second_lookup_hits_cache() {
        let ctx = ProviderContext::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let v: Result<Value, ()> = ctx
                .get_or_fetch("balances", "eth", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!("1.5"))
                })
                .await;
            assert_eq!(v.unwrap(), json!("1.5"));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(ctx.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_lookups_are_single_flight() {
        let ctx = Arc::new(ProviderContext::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let ctx = ctx.clone();
                let calls = calls.clone();
                tokio::spawn(async move {
                    ctx.get_or_fetch("tokens", "github", || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok::<_, ()>(json!("token-1"))
                    })
                    .await
                })
            })
            .collect();

        for task in futures::future::join_all(tasks).await {
            assert_eq!(task.unwrap().unwrap(), json!("token-1"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let ctx = ProviderContext::new();

        let err: Result<Value, &str> = ctx
            .get_or_fetch("balances", "gtc", || async { Err("rpc down") })
            .await;
        assert_eq!(err.unwrap_err(), "rpc down");
        assert!(ctx.get("balances", "gtc").is_none());

        let ok: Result<Value, &str> = ctx
            .get_or_fetch("balances", "gtc", || async { Ok(json!(3)) })
            .await;
        assert_eq!(ok.unwrap(), json!(3));
    }

    #[tokio::test]
    async fn test_entries_are_write_once() {
        let ctx = ProviderContext::new();
        let _: Result<Value, ()> = ctx.get_or_fetch("ns", "k", || async { Ok(json!(1)) }).await;
        let second: Result<Value, ()> =
            ctx.get_or_fetch("ns", "k", || async { Ok(json!(2)) }).await;
        assert_eq!(second.unwrap(), json!(1));
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let ctx = ProviderContext::new();
        assert!(ctx.is_empty());
        assert!(ctx.get("balances", "k").is_none());
        assert!(ctx.get("tokens", "k").is_none());
    }
}
