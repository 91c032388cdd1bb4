use crate::application::session;
use crate::application::subscription::Subscription;
use crate::domain::cart::{Cart, CartId, CartItem, Product};
use crate::domain::notification::UserView;
use crate::domain::ports::{CART_KEY, ClientStorage, ClientStorageRef};
use crate::error::CartError;
use rust_decimal::Decimal;
use tokio::sync::watch;

/// The client-side shopping cart.
///
/// `CartEngine` is the only writer of the cart. Every mutation runs as a
/// single read-modify-write under the state lock and writes the full item
/// collection to storage before returning, so a later [`CartEngine::new`] over
/// the same storage rehydrates exactly what was last persisted.
///
/// Mutations never fail from the caller's point of view: storage faults are
/// logged and the in-memory cart stays authoritative.
pub struct CartEngine {
    storage: ClientStorageRef,
    state: watch::Sender<Cart>,
}

impl CartEngine {
    /// Creates an engine, rehydrating the cart from `storage`.
    ///
    /// Missing or corrupt data yields an empty cart.
    pub fn new(storage: ClientStorageRef) -> Self {
        let cart = Self::rehydrate(storage.as_ref());
        Self {
            storage,
            state: watch::Sender::new(cart),
        }
    }

    fn rehydrate(storage: &dyn ClientStorage) -> Cart {
        let raw = match storage.get(CART_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Cart::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored cart, starting empty");
                return Cart::new();
            }
        };

        let items: Vec<CartItem> = match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(error = %e, "stored cart is corrupt, starting empty");
                return Cart::new();
            }
        };

        let (cart, dropped) = Cart::from_items(items);
        if dropped > 0 {
            tracing::warn!(dropped, "dropped invalid entries from stored cart");
        }
        tracing::debug!(items = cart.len(), "cart rehydrated");
        cart
    }

    fn persist(storage: &dyn ClientStorage, cart: &Cart) {
        let result = serde_json::to_string(cart.items())
            .map_err(Into::into)
            .and_then(|json| storage.set(CART_KEY, &json));
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to persist cart");
        }
    }

    /// Applies `op` atomically; persists and notifies subscribers only if it
    /// reports a change.
    fn mutate<R>(&self, op: impl FnOnce(&mut Cart) -> (bool, R)) -> R {
        let mut out = None;
        self.state.send_if_modified(|cart| {
            let (changed, result) = op(cart);
            if changed {
                Self::persist(self.storage.as_ref(), cart);
            }
            out = Some(result);
            changed
        });
        // send_if_modified always runs the closure exactly once
        out.unwrap_or_else(|| unreachable!())
    }

    /// Adds `quantity` of `product`, merging into an existing entry for the
    /// same product. A quantity of 0 changes nothing and returns `None`.
    pub fn add_to_cart(&self, product: Product, quantity: u32) -> Option<CartId> {
        let product_id = product.id.clone();
        let cart_id = self.mutate(|cart| {
            let id = cart.add(product, quantity, CartId::generate);
            (id.is_some(), id)
        });
        if let Some(id) = cart_id {
            tracing::debug!(%id, %product_id, quantity, "added to cart");
        }
        cart_id
    }

    /// Like [`CartEngine::add_to_cart`], but refuses while the stored profile
    /// has the business view active.
    pub fn try_add_to_cart(
        &self,
        product: Product,
        quantity: u32,
    ) -> Result<Option<CartId>, CartError> {
        if let Some(profile) = session::load_profile(self.storage.as_ref())
            && profile.active_view == UserView::Business
        {
            tracing::debug!(product_id = %product.id, "add to cart refused in business view");
            return Err(CartError::BusinessView);
        }
        Ok(self.add_to_cart(product, quantity))
    }

    /// Removes the entry. Removing an absent entry is a no-op.
    pub fn remove_from_cart(&self, cart_id: CartId) {
        self.mutate(|cart| (cart.remove(cart_id), ()));
    }

    /// Sets an entry's quantity; values below 1 remove the entry.
    pub fn update_quantity(&self, cart_id: CartId, new_quantity: i64) {
        self.mutate(|cart| (cart.update_quantity(cart_id, new_quantity), ()));
    }

    /// Empties the cart and drops its storage key.
    pub fn clear_cart(&self) {
        let storage = self.storage.as_ref();
        self.state.send_if_modified(|cart| {
            let changed = cart.clear();
            if let Err(e) = storage.remove(CART_KEY) {
                tracing::warn!(error = %e, "failed to clear stored cart");
            }
            changed
        });
    }

    pub fn items(&self) -> Vec<CartItem> {
        self.state.borrow().items().to_vec()
    }

    pub fn snapshot(&self) -> Cart {
        self.state.borrow().clone()
    }

    pub fn total(&self) -> Decimal {
        self.state.borrow().total()
    }

    pub fn item_count(&self) -> u64 {
        self.state.borrow().item_count()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    pub fn subscribe(&self) -> Subscription<Cart> {
        Subscription::new(self.state.subscribe())
    }
}
