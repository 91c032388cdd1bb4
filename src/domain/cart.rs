use crate::error::StorefrontError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A non-negative unit price.
///
/// Wraps `rust_decimal::Decimal` so that line totals and cart totals are exact.
/// Deserialization goes through [`Price::new`], so a stored negative price is
/// rejected just like a constructed one.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, StorefrontError> {
        if value >= Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(StorefrontError::ValidationError(
                "Price must not be negative".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Price {
    type Error = StorefrontError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.normalize(), f)
    }
}

/// Identifies one line entry in the cart. Distinct from the product id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartId(Uuid);

impl CartId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for CartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for CartId {
    type Err = StorefrontError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| StorefrontError::ValidationError(format!("Invalid cart id '{}': {}", s, e)))
    }
}

/// A catalog item as handed to the cart. The cart never owns the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Price) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            store: None,
            images: Vec::new(),
        }
    }
}

/// One purchasable product quantity grouping.
///
/// Stored as the product fields plus `cartId` and `quantity`, which is the
/// layout persisted under the `cart` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub cart_id: CartId,
    #[serde(rename = "id")]
    pub product_id: String,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

impl CartItem {
    fn from_product(cart_id: CartId, product: Product, quantity: u32) -> Self {
        Self {
            cart_id,
            product_id: product.id,
            name: product.name,
            price: product.price,
            quantity,
            store: product.store,
            images: product.images,
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.price.value() * Decimal::from(self.quantity)
    }
}

/// The ordered collection of line entries. Insertion order is display order.
///
/// Every method keeps two invariants: quantities are at least 1 and cart ids
/// are unique. Mutators report whether anything changed so callers can skip
/// persisting and notifying on no-ops.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cart from untrusted items, dropping any that break an invariant.
    ///
    /// Entries with a quantity below 1 or a repeated cart id are dropped.
    /// Later entries for a product already in the cart are folded into the
    /// first one. Returns the cart and the number of entries dropped or folded.
    pub fn from_items(items: Vec<CartItem>) -> (Self, usize) {
        let total = items.len();
        let mut seen = HashSet::new();
        let mut cart = Self::new();

        for item in items {
            if item.quantity < 1 || !seen.insert(item.cart_id) {
                continue;
            }
            match cart
                .items
                .iter_mut()
                .find(|existing| existing.product_id == item.product_id)
            {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity)
                }
                None => cart.items.push(item),
            }
        }

        let dropped = total - cart.items.len();
        (cart, dropped)
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, cart_id: CartId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.cart_id == cart_id)
    }

    /// Adds `quantity` of `product`, merging into the existing entry for the
    /// same product id.
    ///
    /// Returns the id of the affected entry, or `None` when `quantity` is 0.
    pub fn add(
        &mut self,
        product: Product,
        quantity: u32,
        mut next_id: impl FnMut() -> CartId,
    ) -> Option<CartId> {
        if quantity == 0 {
            return None;
        }

        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.product_id == product.id)
        {
            item.quantity = item.quantity.saturating_add(quantity);
            return Some(item.cart_id);
        }

        let mut cart_id = next_id();
        while self.get(cart_id).is_some() {
            cart_id = next_id();
        }
        self.items
            .push(CartItem::from_product(cart_id, product, quantity));
        Some(cart_id)
    }

    /// Removes the entry with `cart_id`. Absent ids are not an error.
    pub fn remove(&mut self, cart_id: CartId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.cart_id != cart_id);
        self.items.len() != before
    }

    /// Sets the quantity of an entry; anything below 1 removes it.
    pub fn update_quantity(&mut self, cart_id: CartId, new_quantity: i64) -> bool {
        if new_quantity < 1 {
            return self.remove(cart_id);
        }
        let quantity = u32::try_from(new_quantity).unwrap_or(u32::MAX);

        match self.items.iter_mut().find(|item| item.cart_id == cart_id) {
            Some(item) if item.quantity != quantity => {
                item.quantity = quantity;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.items.is_empty();
        self.items.clear();
        changed
    }

    /// Sum of `price * quantity` over the current items, recomputed on every call.
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Sum of quantities, as shown on a cart badge.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}
