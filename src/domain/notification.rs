use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub type NotificationId = i64;

/// The account mode that scopes which notifications apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserView {
    Personal,
    Business,
}

impl UserView {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserView::Personal => "personal",
            UserView::Business => "business",
        }
    }
}

impl fmt::Display for UserView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The locally persisted profile written by the login flow.
///
/// Only `active_view` is read here; everything else the login flow stores is
/// ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub active_view: UserView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub text: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub reference_id: Option<i64>,
    #[serde(default)]
    pub reference_type: Option<String>,
    #[serde(default)]
    pub notification_metadata: Option<serde_json::Value>,
    /// Set locally when the entry arrived with the latest refresh. The server
    /// never sends it.
    #[serde(default)]
    pub is_new: bool,
}

/// Reads RFC 3339 timestamps, or naive ones which the backend writes in UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc())
        .map_err(|e| de::Error::custom(format!("invalid timestamp '{}': {}", raw, e)))
}

/// Parameters of one feed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub user_view: UserView,
    pub unread_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Errored,
}

/// Snapshot of the notification feed as consumers see it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedState {
    pub phase: FeedPhase,
    pub notifications: Vec<Notification>,
    pub last_error: Option<String>,
}

impl FeedState {
    pub fn is_loading(&self) -> bool {
        self.phase == FeedPhase::Loading
    }

    pub fn has_error(&self) -> bool {
        self.phase == FeedPhase::Errored
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.is_read).count()
    }

    /// Entries that were not in the collection before the latest refresh.
    pub fn new_count(&self) -> usize {
        self.notifications.iter().filter(|n| n.is_new).count()
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.id == id)
    }

    /// Flips `is_read` on the entry with `id`. Returns false if the entry is
    /// absent or already read.
    pub fn mark_read(&mut self, id: NotificationId) -> bool {
        match self.notifications.iter_mut().find(|n| n.id == id) {
            Some(n) if !n.is_read => {
                n.is_read = true;
                true
            }
            _ => false,
        }
    }

    /// Marks every entry read, returning the ids that changed.
    pub fn mark_all_read(&mut self) -> Vec<NotificationId> {
        self.notifications
            .iter_mut()
            .filter(|n| !n.is_read)
            .map(|n| {
                n.is_read = true;
                n.id
            })
            .collect()
    }

    /// Replaces the collection wholesale with `fresh`.
    ///
    /// Ids in `pending` have an unconfirmed mark-read in flight; they keep
    /// `is_read = true` even if `fresh` predates the acknowledgment. Entries
    /// whose id was not in the previous collection get `is_new = true`.
    pub fn replace(&mut self, mut fresh: Vec<Notification>, pending: &HashSet<NotificationId>) {
        let known: HashSet<NotificationId> = self.notifications.iter().map(|n| n.id).collect();
        for n in fresh.iter_mut() {
            n.is_new = !known.contains(&n.id);
            if pending.contains(&n.id) {
                n.is_read = true;
            }
        }
        self.notifications = fresh;
    }
}
