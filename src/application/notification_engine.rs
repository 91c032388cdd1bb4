use crate::application::session;
use crate::application::subscription::Subscription;
use crate::domain::notification::{
    FeedPhase, FeedQuery, FeedState, Notification, NotificationId,
};
use crate::domain::ports::{ClientStorageRef, NotificationApiRef};
use crate::error::ApiError;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationSettings {
    pub poll_interval: Duration,
    pub unread_only: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            unread_only: false,
        }
    }
}

/// Polls the backend for the user's notification feed and applies optimistic
/// read marks.
///
/// The handle is cheap to clone; clones share one feed. Fetch failures never
/// escape: they land in [`FeedState`] as an error phase with the previous
/// collection kept. Mark-read calls update local state before the server is
/// contacted and are not rolled back if the server rejects them. Until the
/// server answers, the id stays in a pending set so a refresh that predates the
/// acknowledgment does not flip it back to unread.
///
/// `mark_as_read`, `mark_all_as_read` and `activate` spawn onto the current
/// Tokio runtime.
#[derive(Clone)]
pub struct NotificationEngine {
    inner: Arc<Inner>,
}

struct Inner {
    api: NotificationApiRef,
    storage: ClientStorageRef,
    settings: NotificationSettings,
    // lock order: pending, then state, then fetches
    pending: Mutex<HashSet<NotificationId>>,
    state: watch::Sender<FeedState>,
    fetches: Mutex<FetchTracker>,
}

/// Overlapping fetches (a manual refresh during a poll) share the loading
/// phase. It ends when the last one settles.
#[derive(Default)]
struct FetchTracker {
    in_flight: usize,
    settled: FeedPhase,
}

impl NotificationEngine {
    pub fn new(
        api: NotificationApiRef,
        storage: ClientStorageRef,
        settings: NotificationSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                storage,
                settings,
                pending: Mutex::new(HashSet::new()),
                state: watch::Sender::new(FeedState::default()),
                fetches: Mutex::new(FetchTracker::default()),
            }),
        }
    }

    /// Fetches the feed for the stored profile's active view and replaces the
    /// local collection with it.
    ///
    /// A missing profile or token, or a rejected token, is the logged-out case:
    /// the feed becomes empty and no error is flagged.
    pub async fn fetch_notifications(&self) {
        let inner = &self.inner;
        let fetch = inner.begin_fetch();

        let Some(profile) = session::load_profile(inner.storage.as_ref()) else {
            tracing::debug!("no stored user profile, showing an empty notification feed");
            fetch.settle(empty_feed);
            return;
        };
        let Some(token) = session::load_token(inner.storage.as_ref()) else {
            tracing::debug!("no stored token, showing an empty notification feed");
            fetch.settle(empty_feed);
            return;
        };

        let query = FeedQuery {
            user_view: profile.active_view,
            unread_only: inner.settings.unread_only,
        };

        match inner.api.fetch(&token, &query).await {
            Ok(fresh) => {
                tracing::debug!(count = fresh.len(), view = %query.user_view, "notifications fetched");
                let pending = inner.pending.lock();
                fetch.settle(|s| {
                    s.replace(fresh, &pending);
                    s.phase = FeedPhase::Loaded;
                    s.last_error = None;
                });
            }
            Err(ApiError::Unauthorized) => {
                tracing::debug!("notification fetch unauthorized, showing an empty feed");
                fetch.settle(empty_feed);
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch notifications, keeping previous feed");
                fetch.settle(|s| {
                    s.phase = FeedPhase::Errored;
                    s.last_error = Some(e.to_string());
                });
            }
        }
    }

    /// Manual refresh. Does not touch the poll timer.
    pub async fn refresh(&self) {
        self.fetch_notifications().await
    }

    /// Marks one notification read locally, then acknowledges it to the server
    /// in the background.
    ///
    /// Unknown ids are a no-op and return `None`. The returned handle resolves
    /// once the server call has finished; dropping it does not cancel the call.
    pub fn mark_as_read(&self, id: NotificationId) -> Option<JoinHandle<()>> {
        let inner = &self.inner;
        {
            let mut pending = inner.pending.lock();
            let mut present = false;
            inner.state.send_if_modified(|s| {
                present = s.get(id).is_some();
                s.mark_read(id)
            });
            if !present {
                tracing::debug!(id, "mark as read ignored for unknown notification");
                return None;
            }
            pending.insert(id);
        }

        let inner = Arc::clone(inner);
        Some(tokio::spawn(async move {
            let result = match session::load_token(inner.storage.as_ref()) {
                Some(token) => inner.api.mark_read(&token, id).await,
                None => Err(ApiError::Unauthorized),
            };
            if let Err(e) = result {
                tracing::warn!(id, error = %e, "server did not acknowledge read mark");
            }
            inner.pending.lock().remove(&id);
        }))
    }

    /// Marks every notification read locally, then acknowledges in bulk.
    pub fn mark_all_as_read(&self) -> JoinHandle<()> {
        let inner = &self.inner;
        let marked = {
            let mut pending = inner.pending.lock();
            let mut marked = Vec::new();
            inner.state.send_if_modified(|s| {
                marked = s.mark_all_read();
                !marked.is_empty()
            });
            pending.extend(marked.iter().copied());
            marked
        };

        let inner = Arc::clone(inner);
        tokio::spawn(async move {
            let result = match session::load_token(inner.storage.as_ref()) {
                Some(token) => inner.api.mark_all_read(&token).await,
                None => Err(ApiError::Unauthorized),
            };
            if let Err(e) = result {
                tracing::warn!(error = %e, "server did not acknowledge bulk read mark");
            }
            let mut pending = inner.pending.lock();
            for id in &marked {
                pending.remove(id);
            }
        })
    }

    /// Starts polling: one fetch immediately, then one per interval.
    ///
    /// Polling stops when the returned guard is dropped or shut down.
    pub fn activate(&self) -> PollerGuard {
        let shutdown = Arc::new(Notify::new());
        let engine = self.clone();
        let signal = Arc::clone(&shutdown);
        let period = self.inner.settings.poll_interval;

        let handle = tokio::spawn(async move {
            tracing::info!(?period, "notification poller started");

            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = signal.notified() => break,
                    _ = ticker.tick() => engine.fetch_notifications().await,
                }
            }

            tracing::info!("notification poller stopped");
        });

        PollerGuard {
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn state(&self) -> FeedState {
        self.inner.state.borrow().clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.state.borrow().notifications.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading()
    }

    pub fn has_error(&self) -> bool {
        self.inner.state.borrow().has_error()
    }

    pub fn unread_count(&self) -> usize {
        self.inner.state.borrow().unread_count()
    }

    pub fn subscribe(&self) -> Subscription<FeedState> {
        Subscription::new(self.inner.state.subscribe())
    }
}

impl Inner {
    fn begin_fetch(&self) -> PendingFetch<'_> {
        self.state.send_modify(|s| {
            self.fetches.lock().in_flight += 1;
            s.phase = FeedPhase::Loading;
        });
        PendingFetch {
            inner: self,
            settled: false,
        }
    }
}

fn empty_feed(s: &mut FeedState) {
    s.notifications.clear();
    s.phase = FeedPhase::Loaded;
    s.last_error = None;
}

/// One fetch counted in [`FetchTracker`]. Dropping it unsettled (the fetch
/// future was cancelled) releases its share of the loading phase.
struct PendingFetch<'a> {
    inner: &'a Inner,
    settled: bool,
}

impl PendingFetch<'_> {
    fn settle(mut self, apply: impl FnOnce(&mut FeedState)) {
        self.settled = true;
        let inner = self.inner;
        inner.state.send_modify(|s| {
            apply(s);
            let mut fetches = inner.fetches.lock();
            fetches.in_flight = fetches.in_flight.saturating_sub(1);
            fetches.settled = s.phase;
            if fetches.in_flight > 0 {
                s.phase = FeedPhase::Loading;
            }
        });
    }
}

impl Drop for PendingFetch<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let inner = self.inner;
        inner.state.send_modify(|s| {
            let mut fetches = inner.fetches.lock();
            fetches.in_flight = fetches.in_flight.saturating_sub(1);
            if fetches.in_flight == 0 {
                s.phase = fetches.settled;
            }
        });
    }
}

/// Keeps a notification poller alive. Dropping it cancels the timer.
pub struct PollerGuard {
    shutdown: Arc<Notify>,
    handle: Option<JoinHandle<()>>,
}

impl PollerGuard {
    /// Stops the poller and waits for its task to finish.
    pub async fn shutdown(mut self) {
        self.shutdown.notify_one();
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            tracing::warn!(error = %e, "notification poller ended abnormally");
        }
    }
}

impl Drop for PollerGuard {
    fn drop(&mut self) {
        self.shutdown.notify_one();
    }
}
