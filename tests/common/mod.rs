#![allow(dead_code)]

use chrono::Utc;
use std::fs::File;
use std::io::Error;
use std::path::Path;
use storefront::domain::cart::{Price, Product};
use storefront::domain::notification::{Notification, NotificationId};
use storefront::domain::ports::{ClientStorage, TOKEN_KEY, USER_KEY};
use storefront::infrastructure::in_memory::InMemoryStorage;
use rust_decimal::Decimal;

pub fn generate_cart_csv(path: &Path, rows: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(["product_id", "name", "price", "quantity"])?;

    for i in 1..=rows {
        wtr.write_record([
            &format!("p{}", i),
            &format!("Product {}", i),
            "1.50",
            "2",
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn product(id: &str, price: Decimal) -> Product {
    Product::new(id, format!("Product {}", id), Price::new(price).unwrap())
}

pub fn notification(id: NotificationId) -> Notification {
    Notification {
        id,
        kind: "new_order".to_string(),
        text: format!("New order #{}", id),
        is_read: false,
        created_at: Utc::now(),
        reference_id: Some(id),
        reference_type: Some("order".to_string()),
        notification_metadata: None,
        is_new: true,
    }
}

pub fn signed_in(view: &str, token: &str) -> InMemoryStorage {
    let storage = InMemoryStorage::new();
    storage
        .set(USER_KEY, &format!(r#"{{"active_view":"{}"}}"#, view))
        .unwrap();
    storage.set(TOKEN_KEY, token).unwrap();
    storage
}
