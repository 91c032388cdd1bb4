use std::sync::Arc;
use storefront::domain::ports::{CART_KEY, ClientStorage, ClientStorageFactory, ClientStorageRef};
use storefront::infrastructure::in_memory::InMemoryStorage;

#[test]
fn test_factory_instantiation() {
    let factory: ClientStorageFactory =
        Box::new(|| Arc::new(InMemoryStorage::new()) as ClientStorageRef);

    let storage = factory();
    storage.set(CART_KEY, "[]").unwrap();
    assert_eq!(storage.get(CART_KEY).unwrap().as_deref(), Some("[]"));

    // Each call yields a fresh store
    assert!(factory().get(CART_KEY).unwrap().is_none());
}

#[tokio::test]
async fn test_factory_in_task() {
    let factory: ClientStorageFactory =
        Box::new(|| Arc::new(InMemoryStorage::new()) as ClientStorageRef);

    let handle = tokio::spawn(async move {
        let storage = factory();
        storage.set("token", "abc").unwrap();
        storage.get("token").unwrap()
    });

    assert_eq!(handle.await.unwrap().as_deref(), Some("abc"));
}
