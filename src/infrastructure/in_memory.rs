use crate::domain::notification::{FeedQuery, Notification, NotificationId, UserView};
use crate::domain::ports::{ClientStorage, NotificationApi};
use crate::error::{ApiError, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{Semaphore, watch};

/// A thread-safe in-memory key/value store.
///
/// Clones share the same map, so a test can keep a handle and inspect what an
/// engine persisted. Contents are lost when the last handle drops.
#[derive(Default, Clone)]
pub struct InMemoryStorage {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryStorage {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientStorage for InMemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// An in-process stand-in for the notification backend.
///
/// Serves one feed per view in stored order, accepts a single bearer token,
/// and can be told to fail, reject acknowledgments, or hold acknowledgments
/// and fetches until released.
#[derive(Clone)]
pub struct InMemoryNotificationApi {
    inner: Arc<ApiState>,
}

struct ApiState {
    token: String,
    feeds: tokio::sync::RwLock<HashMap<UserView, Vec<Notification>>>,
    available: AtomicBool,
    reject_acks: AtomicBool,
    ack_gate: watch::Sender<bool>,
    gate_fetches: AtomicBool,
    fetch_permits: Semaphore,
    fetches: AtomicUsize,
    acks: AtomicUsize,
}

impl InMemoryNotificationApi {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ApiState {
                token: token.into(),
                feeds: tokio::sync::RwLock::new(HashMap::new()),
                available: AtomicBool::new(true),
                reject_acks: AtomicBool::new(false),
                ack_gate: watch::Sender::new(false),
                gate_fetches: AtomicBool::new(false),
                fetch_permits: Semaphore::new(0),
                fetches: AtomicUsize::new(0),
                acks: AtomicUsize::new(0),
            }),
        }
    }

    /// Adds a notification at the top of a view's feed.
    pub async fn push(&self, view: UserView, notification: Notification) {
        let mut feeds = self.inner.feeds.write().await;
        feeds.entry(view).or_default().insert(0, notification);
    }

    pub async fn set_feed(&self, view: UserView, notifications: Vec<Notification>) {
        let mut feeds = self.inner.feeds.write().await;
        feeds.insert(view, notifications);
    }

    pub async fn feed(&self, view: UserView) -> Vec<Notification> {
        let feeds = self.inner.feeds.read().await;
        feeds.get(&view).cloned().unwrap_or_default()
    }

    /// When false, every call fails with a network error.
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    pub fn reject_acknowledgments(&self, reject: bool) {
        self.inner.reject_acks.store(reject, Ordering::SeqCst);
    }

    /// While held, mark-read calls wait before touching the feed.
    pub fn hold_acknowledgments(&self, hold: bool) {
        self.inner.ack_gate.send_replace(hold);
    }

    /// While gated, each fetch waits for a permit from [`release_fetches`].
    /// Waiting fetches are released in arrival order.
    ///
    /// [`release_fetches`]: Self::release_fetches
    pub fn gate_fetches(&self, gate: bool) {
        self.inner.gate_fetches.store(gate, Ordering::SeqCst);
    }

    pub fn release_fetches(&self, count: usize) {
        self.inner.fetch_permits.add_permits(count);
    }

    pub fn fetch_count(&self) -> usize {
        self.inner.fetches.load(Ordering::SeqCst)
    }

    pub fn acknowledgment_count(&self) -> usize {
        self.inner.acks.load(Ordering::SeqCst)
    }

    fn check(&self, token: &str) -> std::result::Result<(), ApiError> {
        if !self.inner.available.load(Ordering::SeqCst) {
            return Err(ApiError::Network("backend unavailable".to_string()));
        }
        if token != self.inner.token {
            return Err(ApiError::Unauthorized);
        }
        Ok(())
    }

    async fn acknowledge(&self, token: &str) -> std::result::Result<(), ApiError> {
        self.inner.acks.fetch_add(1, Ordering::SeqCst);
        let mut gate = self.inner.ack_gate.subscribe();
        // the sender lives in `inner`, so the channel cannot close here
        let _ = gate.wait_for(|held| !*held).await;

        self.check(token)?;
        if self.inner.reject_acks.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 500,
                body: "acknowledgment rejected".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationApi for InMemoryNotificationApi {
    async fn fetch(
        &self,
        token: &str,
        query: &FeedQuery,
    ) -> std::result::Result<Vec<Notification>, ApiError> {
        self.inner.fetches.fetch_add(1, Ordering::SeqCst);
        if self.inner.gate_fetches.load(Ordering::SeqCst)
            && let Ok(permit) = self.inner.fetch_permits.acquire().await
        {
            permit.forget();
        }
        self.check(token)?;

        let feeds = self.inner.feeds.read().await;
        Ok(feeds
            .get(&query.user_view)
            .into_iter()
            .flatten()
            .filter(|n| !query.unread_only || !n.is_read)
            .cloned()
            .collect())
    }

    async fn mark_read(&self, token: &str, id: NotificationId) -> std::result::Result<(), ApiError> {
        self.acknowledge(token).await?;

        let mut feeds = self.inner.feeds.write().await;
        match feeds.values_mut().flatten().find(|n| n.id == id) {
            Some(n) => {
                n.is_read = true;
                Ok(())
            }
            None => Err(ApiError::Status {
                status: 404,
                body: "Notification not found".to_string(),
            }),
        }
    }

    async fn mark_all_read(&self, token: &str) -> std::result::Result<(), ApiError> {
        self.acknowledge(token).await?;

        let mut feeds = self.inner.feeds.write().await;
        for n in feeds.values_mut().flatten() {
            n.is_read = true;
        }
        Ok(())
    }
}
