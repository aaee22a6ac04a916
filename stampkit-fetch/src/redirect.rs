//! OAuth redirect handshake.
//!
//! A detached OAuth popup (browser window, local callback listener, or a
//! user pasting the final redirect URL) posts
//! `{target: platformPath, data: {code, state}}` on the channel
//! `"{platformPath}_oauth_channel"`. The claim that opened the popup waits
//! on that channel with [`RedirectBus::wait_for_redirect`].
//!
//! The first matching message wins; later duplicates are dropped because the
//! subscription is released as soon as the wait resolves. Every wait has a
//! mandatory timeout and a cancellation token, and the subscription is
//! released exactly once on every exit path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stampkit_core::ProviderPayload;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::RedirectError;

/// Buffered messages per channel.
const CHANNEL_CAPACITY: usize = 16;

/// Returns the channel name for a platform path.
pub fn channel_name(path: &str) -> String {
    format!("{path}_oauth_channel")
}

// ============================================================================
// Messages
// ============================================================================

/// Data carried by an OAuth redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectData {
    /// Authorization code.
    #[serde(default)]
    pub code: String,
    /// OAuth state, echoed back by the provider.
    #[serde(default)]
    pub state: String,
    /// Error reported by the provider instead of a code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RedirectData {
    /// Creates redirect data from a code and state.
    pub fn new(code: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            state: state.into(),
            error: None,
        }
    }

    /// Extracts `code`, `state` and `error` from a redirect URL's query.
    pub fn from_redirect_url(url: &str) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(url)?;
        let mut data = Self::new("", "");
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "code" => data.code = value.into_owned(),
                "state" => data.state = value.into_owned(),
                "error" => data.error = Some(value.into_owned()),
                _ => {}
            }
        }
        Ok(data)
    }
}

/// A message posted on a redirect channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectMessage {
    /// Platform path the redirect is meant for.
    pub target: String,
    /// Redirect payload.
    pub data: RedirectData,
}

// ============================================================================
// Redirect Bus
// ============================================================================

#[derive(Debug)]
struct Channel {
    sender: broadcast::Sender<RedirectMessage>,
    waiters: usize,
}

#[derive(Debug, Default)]
struct BusInner {
    channels: Mutex<HashMap<String, Channel>>,
    releases: AtomicUsize,
    shutdown: CancellationToken,
}

/// Typed pub/sub bus carrying OAuth redirects to waiting claims.
#[derive(Debug, Clone, Default)]
pub struct RedirectBus {
    inner: Arc<BusInner>,
}

impl RedirectBus {
    /// Creates a new bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a posting handle for a platform path.
    pub fn sender(&self, path: &str) -> RedirectSender {
        RedirectSender {
            bus: self.clone(),
            path: path.to_string(),
        }
    }

    /// Posts a message on `channel`.
    ///
    /// Returns false if nobody is listening; the message is then dropped.
    pub fn post(&self, channel: &str, message: RedirectMessage) -> bool {
        let channels = self.lock();
        let Some(ch) = channels.get(channel) else {
            debug!(channel, "No listener, dropping redirect");
            return false;
        };
        ch.sender.send(message).is_ok()
    }

    /// Waits for the redirect addressed to `path`.
    ///
    /// Resolves with `{code, state}` from the first matching message.
    /// Fails with [`RedirectError::Timeout`] after `timeout`, or with
    /// [`RedirectError::Cancelled`] when `cancel` fires or the bus shuts down.
    pub async fn wait_for_redirect(
        &self,
        path: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<ProviderPayload, RedirectError> {
        self.listen(path).wait(timeout, cancel).await
    }

    /// Subscribes to the channel for `path` right away.
    ///
    /// Use this when the popup may post before the caller starts waiting:
    /// messages posted after `listen` returns are buffered for the listener.
    pub fn listen(&self, path: &str) -> RedirectListener {
        let channel = channel_name(path);
        let subscription = self.subscribe(&channel);
        RedirectListener {
            bus: self.clone(),
            path: path.to_string(),
            subscription,
        }
    }

    /// Cancels every outstanding and future wait.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    /// Returns true once [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// Names of channels that currently have a waiter.
    pub fn open_channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Total number of subscriptions released so far.
    pub fn releases(&self) -> usize {
        self.inner.releases.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Channel>> {
        self.inner
            .channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn subscribe(&self, channel: &str) -> Subscription {
        let mut channels = self.lock();
        let ch = channels.entry(channel.to_string()).or_insert_with(|| Channel {
            sender: broadcast::channel(CHANNEL_CAPACITY).0,
            waiters: 0,
        });
        ch.waiters += 1;
        let rx = ch.sender.subscribe();
        debug!(channel, waiters = ch.waiters, "Redirect channel opened");

        Subscription {
            bus: self.clone(),
            channel: channel.to_string(),
            rx,
        }
    }

    fn release(&self, channel: &str) {
        let mut channels = self.lock();
        if let Some(ch) = channels.get_mut(channel) {
            ch.waiters = ch.waiters.saturating_sub(1);
            if ch.waiters == 0 {
                channels.remove(channel);
            }
        }
        self.inner.releases.fetch_add(1, Ordering::SeqCst);
        debug!(channel, "Redirect channel released");
    }
}

// ============================================================================
// Redirect Listener
// ============================================================================

/// An open subscription waiting for one platform's redirect.
///
/// Dropping the listener releases the channel.
pub struct RedirectListener {
    bus: RedirectBus,
    path: String,
    subscription: Subscription,
}

impl RedirectListener {
    /// Channel this listener is subscribed to.
    pub fn channel(&self) -> &str {
        &self.subscription.channel
    }

    /// Waits for the first message addressed to this listener's path.
    #[instrument(skip(self, cancel), fields(channel = %self.subscription.channel))]
    pub async fn wait(
        mut self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<ProviderPayload, RedirectError> {
        let channel = self.subscription.channel.clone();
        let path = self.path.clone();
        let rx = &mut self.subscription.rx;

        let wait = async {
            loop {
                match rx.recv().await {
                    Ok(msg) if msg.target == path => return Ok(msg.data),
                    Ok(msg) => debug!(other = %msg.target, "Ignoring redirect for other target"),
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "Redirect listener lagged"),
                    Err(RecvError::Closed) => return Err(RedirectError::Closed(channel.clone())),
                }
            }
        };

        let data = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(RedirectError::Cancelled(channel.clone())),
            () = self.bus.inner.shutdown.cancelled() => {
                Err(RedirectError::Cancelled(channel.clone()))
            }
            result = tokio::time::timeout(timeout, wait) => match result {
                Ok(inner) => inner,
                Err(_) => Err(RedirectError::Timeout { channel: channel.clone(), timeout }),
            },
        }?;

        if let Some(error) = data.error {
            return Err(RedirectError::Denied(error));
        }

        debug!("Redirect received");
        Ok(ProviderPayload::oauth(data.code, data.state))
    }
}

impl std::fmt::Debug for RedirectListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedirectListener")
            .field("channel", &self.subscription.channel)
            .finish_non_exhaustive()
    }
}

/// Releases its channel when dropped.
struct Subscription {
    bus: RedirectBus,
    channel: String,
    rx: broadcast::Receiver<RedirectMessage>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.release(&self.channel);
    }
}

// ============================================================================
// Redirect Sender
// ============================================================================

/// Posting handle bound to one platform path.
#[derive(Debug, Clone)]
pub struct RedirectSender {
    bus: RedirectBus,
    path: String,
}

impl RedirectSender {
    /// Posts `{target: path, data}` on the platform's channel.
    pub fn send(&self, data: RedirectData) -> bool {
        self.bus.post(
            &channel_name(&self.path),
            RedirectMessage {
                target: self.path.clone(),
                data,
            },
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
