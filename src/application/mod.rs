//! Application layer: the cart and notification engines.
//!
//! Both engines hold their state in a `tokio::sync::watch` channel. Commands
//! mutate it in place; consumers read snapshots or hold a [`Subscription`] to
//! be woken on change.

pub mod cart_engine;
pub mod notification_engine;
pub mod session;
pub mod subscription;

pub use subscription::Subscription;
