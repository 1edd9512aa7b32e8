//! # Cart Store
//!
//! The authoritative cart, mirrored to local storage after every mutation.
//!
//! ## Thread Safety
//! The cart sits behind a `tokio::sync::Mutex` that stays held across the
//! snapshot write, so each mutation is one read-modify-write-persist step
//! and concurrent adds for the same key always merge.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Store Operations                                │
//! │                                                                         │
//! │  Caller                   CartStore               Effect               │
//! │  ──────                   ─────────               ──────               │
//! │                                                                         │
//! │  add ────────────────────► add_to_cart() ───────► merge or append      │
//! │                                                   persist + Added      │
//! │                                                                         │
//! │  set quantity ───────────► update_quantity() ───► Updated / Rejected / │
//! │                                                   NotFound             │
//! │                                                                         │
//! │  remove ─────────────────► remove_from_cart() ──► persist + Removed    │
//! │                                                                         │
//! │  clear ──────────────────► clear_cart() ────────► entry deleted        │
//! │                                                                         │
//! │  totals ─────────────────► cart_total() ────────► computed on read     │
//! │                            item_count()                                 │
//! │                                                                         │
//! │  Storage failures are logged and never fail a mutation.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

use codemart_core::{
    Cart, CartKey, CartLine, CartTotals, CoreError, CoreResult, Money, NewOrderLine, Product,
    ValidationError, Variation,
};
use codemart_db::{SnapshotRepository, CART_KEY};

/// Buffered cart events per subscriber before the oldest are dropped.
const EVENT_CAPACITY: usize = 64;

/// Notification emitted after a cart mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    /// Exactly one per successful add.
    Added {
        key: CartKey,
        product_name: String,
        quantity: i64,
        /// Present when the line was added at a custom (bundle) price.
        bundle_price: Option<Money>,
    },
    Removed { key: CartKey },
}

/// Outcome of [`CartStore::update_quantity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityUpdate {
    Updated,
    /// Quantity below 1; the line is unchanged.
    Rejected(ValidationError),
    NotFound,
}

/// Cart state shared by every command.
#[derive(Debug)]
pub struct CartStore {
    cart: Mutex<Cart>,
    snapshots: SnapshotRepository,
    events: broadcast::Sender<CartEvent>,
}

impl CartStore {
    /// Creates an empty store without reading storage.
    pub fn new(snapshots: SnapshotRepository) -> Self {
        Self::with_cart(snapshots, Cart::new())
    }

    fn with_cart(snapshots: SnapshotRepository, cart: Cart) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        CartStore {
            cart: Mutex::new(cart),
            snapshots,
            events,
        }
    }

    /// Restores the cart from storage.
    ///
    /// ## When This Yields an Empty Cart
    /// - No stored entry (first run, or after clear)
    /// - Storage unreadable
    /// - Stored value isn't a cart line list
    pub async fn hydrate(snapshots: SnapshotRepository) -> Self {
        let cart = match snapshots.get::<Vec<CartLine>>(CART_KEY).await {
            Ok(Some(lines)) => Cart::from_lines(lines),
            Ok(None) => Cart::new(),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable cart snapshot");
                Cart::new()
            }
        };

        debug!(lines = cart.lines().len(), "Cart hydrated");
        Self::with_cart(snapshots, cart)
    }

    /// Subscribes to cart notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.events.subscribe()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds a product, merging into the line with the same composite key.
    ///
    /// ## Returns
    /// The key of the affected line, or a validation error for `quantity < 1`.
    pub async fn add_to_cart(
        &self,
        product: &Product,
        quantity: i64,
        variation: Option<&Variation>,
        custom_price: Option<Money>,
    ) -> CoreResult<CartKey> {
        let mut cart = self.cart.lock().await;
        let key = cart.add(product, quantity, variation, custom_price)?;

        debug!(key = %key, quantity, "Added to cart");
        self.persist(&cart).await;

        self.emit(CartEvent::Added {
            key: key.clone(),
            product_name: product.name.clone(),
            quantity,
            bundle_price: custom_price,
        });
        Ok(key)
    }

    /// Adds one unit of each `(variation, price)` pair as custom-priced lines.
    ///
    /// The lines are applied to a copy of the cart first, so either all of
    /// them land and are persisted once, or the cart is left unchanged.
    pub async fn add_bundle_lines(
        &self,
        product: &Product,
        lines: &[(&Variation, Money)],
    ) -> CoreResult<Vec<CartKey>> {
        let mut cart = self.cart.lock().await;

        let mut staged = cart.clone();
        let keys = lines
            .iter()
            .map(|(variation, price)| staged.add(product, 1, Some(*variation), Some(*price)))
            .collect::<CoreResult<Vec<_>>>()?;
        *cart = staged;

        debug!(lines = keys.len(), "Bundle added to cart");
        self.persist(&cart).await;

        for (key, (_, price)) in keys.iter().zip(lines) {
            self.emit(CartEvent::Added {
                key: key.clone(),
                product_name: product.name.clone(),
                quantity: 1,
                bundle_price: Some(*price),
            });
        }
        Ok(keys)
    }

    /// Removes the line with exactly this key. Absent keys are a no-op.
    pub async fn remove_from_cart(&self, key: &CartKey) -> bool {
        let mut cart = self.cart.lock().await;
        let removed = cart.remove(key);

        debug!(key = %key, removed, "Remove from cart");
        self.persist(&cart).await;

        self.emit(CartEvent::Removed { key: key.clone() });
        removed
    }

    /// Sets a line's quantity. Quantities below 1 are rejected.
    pub async fn update_quantity(&self, key: &CartKey, quantity: i64) -> QuantityUpdate {
        let mut cart = self.cart.lock().await;

        match cart.update_quantity(key, quantity) {
            Ok(true) => {
                debug!(key = %key, quantity, "Quantity updated");
                self.persist(&cart).await;
                QuantityUpdate::Updated
            }
            Ok(false) => QuantityUpdate::NotFound,
            Err(CoreError::Validation(e)) => {
                debug!(key = %key, quantity, "Quantity rejected");
                QuantityUpdate::Rejected(e)
            }
            Err(e) => QuantityUpdate::Rejected(ValidationError::invalid_format(
                "quantity",
                e.to_string(),
            )),
        }
    }

    /// Empties the cart and deletes the stored entry.
    pub async fn clear_cart(&self) {
        let mut cart = self.cart.lock().await;
        cart.clear();

        if let Err(e) = self.snapshots.delete(CART_KEY).await {
            warn!(error = %e, "Failed to delete cart snapshot");
        }
        debug!("Cart cleared");
    }

    // =========================================================================
    // Queries (derived on every read)
    // =========================================================================

    pub async fn cart_total(&self) -> Money {
        self.cart.lock().await.total()
    }

    pub async fn item_count(&self) -> i64 {
        self.cart.lock().await.item_count()
    }

    pub async fn totals(&self) -> CartTotals {
        self.cart.lock().await.totals()
    }

    /// A copy of the current cart.
    pub async fn snapshot(&self) -> Cart {
        self.cart.lock().await.clone()
    }

    pub async fn order_lines(&self) -> Vec<NewOrderLine> {
        self.cart.lock().await.order_lines()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn persist(&self, cart: &Cart) {
        if let Err(e) = self.snapshots.put(CART_KEY, cart).await {
            warn!(error = %e, "Failed to persist cart snapshot");
        }
    }

    fn emit(&self, event: CartEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use codemart_db::{Database, DbConfig};
    use std::sync::Arc;

    async fn database() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn product(id: u64, price: i64) -> Product {
        Product::new(id, format!("Product {id}"), Money::from_major(price))
    }

    #[tokio::test]
    async fn test_add_add_add_scenario() {
        let db = database().await;
        let store = CartStore::new(db.snapshots());
        let p = product(42, 100);

        store.add_to_cart(&p, 1, None, None).await.unwrap();
        store.add_to_cart(&p, 2, None, None).await.unwrap();

        let cart = store.snapshot().await;
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);

        let bundle = store
            .add_to_cart(&p, 1, None, Some(Money::from_major(1150)))
            .await
            .unwrap();
        assert_eq!(bundle.as_str(), "42-default-1150.00");
        assert_eq!(store.snapshot().await.lines().len(), 2);
        assert_eq!(store.item_count().await, 4);
        assert_eq!(store.cart_total().await, Money::from_major(300 + 1150));
    }

    #[tokio::test]
    async fn test_add_emits_one_event() {
        let db = database().await;
        let store = CartStore::new(db.snapshots());
        let mut events = store.subscribe();
        let p = product(1, 10);

        store
            .add_to_cart(&p, 2, None, Some(Money::from_major(9)))
            .await
            .unwrap();

        match events.try_recv().unwrap() {
            CartEvent::Added {
                product_name,
                quantity,
                bundle_price,
                ..
            } => {
                assert_eq!(product_name, "Product 1");
                assert_eq!(quantity, 2);
                assert_eq!(bundle_price, Some(Money::from_major(9)));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_quantity_floor() {
        let db = database().await;
        let store = CartStore::new(db.snapshots());
        let key = store.add_to_cart(&product(1, 10), 2, None, None).await.unwrap();

        assert!(matches!(
            store.update_quantity(&key, 0).await,
            QuantityUpdate::Rejected(ValidationError::MustBePositive { .. })
        ));
        assert_eq!(store.item_count().await, 2);

        assert_eq!(store.update_quantity(&key, 5).await, QuantityUpdate::Updated);
        assert_eq!(store.item_count().await, 5);

        let missing = CartKey::from("9-default-standard");
        assert_eq!(store.update_quantity(&missing, 5).await, QuantityUpdate::NotFound);
    }

    #[tokio::test]
    async fn test_remove_absent_key_is_noop() {
        let db = database().await;
        let store = CartStore::new(db.snapshots());
        store.add_to_cart(&product(1, 10), 1, None, None).await.unwrap();

        assert!(!store.remove_from_cart(&CartKey::from("2-default-standard")).await);
        assert_eq!(store.item_count().await, 1);

        assert!(store.remove_from_cart(&CartKey::from("1-default-standard")).await);
        assert_eq!(store.item_count().await, 0);
    }

    #[tokio::test]
    async fn test_persistence_round_trip() {
        let db = database().await;
        let variation = Variation::new(11, "$10", Money::from_major(1300));
        let mut p = product(42, 1300);
        p.variations.push(variation.clone());

        {
            let store = CartStore::new(db.snapshots());
            store.add_to_cart(&p, 2, Some(&variation), None).await.unwrap();
        }

        let restored = CartStore::hydrate(db.snapshots()).await;
        let cart = restored.snapshot().await;
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].key().as_str(), "42-11-standard");
        assert_eq!(restored.cart_total().await, Money::from_major(2600));
    }

    #[tokio::test]
    async fn test_clear_deletes_entry() {
        let db = database().await;
        let store = CartStore::new(db.snapshots());
        store.add_to_cart(&product(1, 10), 1, None, None).await.unwrap();
        assert!(db.snapshots().exists(CART_KEY).await.unwrap());

        store.clear_cart().await;
        assert_eq!(store.item_count().await, 0);
        assert!(!db.snapshots().exists(CART_KEY).await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_hydrates_empty() {
        let db = database().await;
        db.snapshots().put_raw(CART_KEY, "{oops").await.unwrap();

        let store = CartStore::hydrate(db.snapshots()).await;
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_does_not_fail_mutation() {
        let db = database().await;
        let store = CartStore::new(db.snapshots());
        db.close().await;

        store.add_to_cart(&product(1, 10), 1, None, None).await.unwrap();
        assert_eq!(store.item_count().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_adds_merge() {
        let db = database().await;
        let store = Arc::new(CartStore::new(db.snapshots()));
        let p = product(7, 5);

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let store = store.clone();
                let p = p.clone();
                tokio::spawn(async move { store.add_to_cart(&p, 1, None, None).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let cart = store.snapshot().await;
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 10);
    }
}
