use super::notification::{FeedQuery, Notification, NotificationId};
use crate::error::{ApiError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Storage key holding the serialized cart.
pub const CART_KEY: &str = "cart";
/// Storage key holding the user profile written by the login flow.
pub const USER_KEY: &str = "user";
/// Storage key holding the bearer token written by the login flow.
pub const TOKEN_KEY: &str = "token";

/// Durable client-side key/value storage.
///
/// Calls are synchronous: the cart persists inside its mutation, before the
/// caller regains control.
pub trait ClientStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// The backend collaborator serving the notification feed.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    async fn fetch(
        &self,
        token: &str,
        query: &FeedQuery,
    ) -> std::result::Result<Vec<Notification>, ApiError>;
    async fn mark_read(&self, token: &str, id: NotificationId) -> std::result::Result<(), ApiError>;
    async fn mark_all_read(&self, token: &str) -> std::result::Result<(), ApiError>;
}

pub type ClientStorageRef = Arc<dyn ClientStorage>;
pub type NotificationApiRef = Arc<dyn NotificationApi>;
pub type ClientStorageFactory = Box<dyn Fn() -> ClientStorageRef + Send + Sync>;
