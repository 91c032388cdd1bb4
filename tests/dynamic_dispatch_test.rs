use rust_decimal_macros::dec;
use std::sync::Arc;
use storefront::application::cart_engine::CartEngine;
use storefront::application::notification_engine::{NotificationEngine, NotificationSettings};
use storefront::domain::notification::UserView;
use storefront::domain::ports::{ClientStorageRef, NotificationApiRef};
use storefront::infrastructure::file::FileStorage;
use storefront::infrastructure::in_memory::{InMemoryNotificationApi, InMemoryStorage};

mod common;

#[test]
fn test_cart_over_any_storage_backend() {
    let dir = tempfile::tempdir().unwrap();
    let backends: Vec<ClientStorageRef> = vec![
        Arc::new(InMemoryStorage::new()),
        Arc::new(FileStorage::open(dir.path()).unwrap()),
    ];

    for storage in backends {
        let cart = CartEngine::new(Arc::clone(&storage));
        cart.add_to_cart(common::product("p1", dec!(2)), 3);

        let rehydrated = CartEngine::new(storage);
        assert_eq!(rehydrated.total(), dec!(6));
    }
}

#[tokio::test]
async fn test_engines_are_send_and_sync() {
    let api = InMemoryNotificationApi::new("t");
    api.push(UserView::Personal, common::notification(1)).await;

    let api_ref: NotificationApiRef = Arc::new(api);
    let storage: ClientStorageRef = Arc::new(common::signed_in("personal", "t"));

    let cart = Arc::new(CartEngine::new(Arc::clone(&storage)));
    let feed = NotificationEngine::new(api_ref, storage, NotificationSettings::default());

    // Verify Send + Sync by spawning tasks
    let cart_handle = {
        let cart = Arc::clone(&cart);
        tokio::spawn(async move { cart.add_to_cart(common::product("p1", dec!(1)), 1) })
    };
    let feed_handle = {
        let feed = feed.clone();
        tokio::spawn(async move {
            feed.fetch_notifications().await;
            feed.unread_count()
        })
    };

    assert!(cart_handle.await.unwrap().is_some());
    assert_eq!(feed_handle.await.unwrap(), 1);
}
