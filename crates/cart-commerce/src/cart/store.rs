//! The cart store: stock-checked mutations mirrored to storage.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cart_cache::CacheError;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::cart::{CartState, CartStorage, Notifier};
use crate::catalog::CatalogSource;
use crate::error::{CartError, FailureCause};
use crate::ids::ProductId;

/// Result of a cart operation that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum CartOutcome {
    /// The cart changed and was persisted; carries the new contents.
    Committed(CartState),
    /// Nothing to do (a quantity below 1 was requested).
    Unchanged,
}

impl CartOutcome {
    /// The new contents, if the cart changed.
    pub fn committed(&self) -> Option<&CartState> {
        match self {
            Self::Committed(cart) => Some(cart),
            Self::Unchanged => None,
        }
    }
}

/// Request to set a product's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateProductAmount {
    /// Product to change.
    pub product_id: ProductId,
    /// Requested quantity. Values below 1 are ignored.
    pub amount: i64,
}

/// Shopping cart with stock validation and a persisted mirror.
///
/// Operations on the same product run one at a time; operations on
/// different products may interleave at their catalog lookups. Each commit
/// applies only its own product's change to the latest contents, so no
/// update is lost, and the persisted slot is written before the in-memory
/// contents are replaced.
///
/// # Example
///
/// ```rust,ignore
/// let store = CartStore::hydrate(catalog, storage)?
///     .with_notifier(Arc::new(TracingNotifier));
///
/// store.add_product(ProductId::new(1)).await?;
/// store
///     .update_product_amount(UpdateProductAmount { product_id: ProductId::new(1), amount: 3 })
///     .await?;
/// println!("{} items", store.cart().total_amount());
/// ```
pub struct CartStore {
    catalog: Arc<dyn CatalogSource>,
    storage: Arc<dyn CartStorage>,
    notifier: Option<Arc<dyn Notifier>>,
    state: Mutex<CartState>,
    product_locks: ProductLocks,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &*self.lock_state())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Open a session: restore the persisted cart, or start empty.
    ///
    /// A slot that exists but does not parse is an error.
    pub fn hydrate(
        catalog: Arc<dyn CatalogSource>,
        storage: Arc<dyn CartStorage>,
    ) -> Result<Self, CacheError> {
        let cart = storage.load()?.unwrap_or_default();
        tracing::info!(items = cart.len(), "cart hydrated");
        Ok(Self {
            catalog,
            storage,
            notifier: None,
            state: Mutex::new(cart),
            product_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Show a notice on every failed operation.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Snapshot of the current contents.
    pub fn cart(&self) -> CartState {
        self.lock_state().clone()
    }

    /// Add one unit of a product.
    ///
    /// A product already in the cart is incremented if stock allows. A new
    /// product is fetched from the catalog and prepended with quantity 1.
    pub async fn add_product(&self, product_id: ProductId) -> Result<CartOutcome, CartError> {
        let _turn = self.product_turn(product_id).await;
        let result = self.add(product_id).await;
        self.report(result)
    }

    /// Remove a product. A product that is not in the cart is an error.
    pub async fn remove_product(&self, product_id: ProductId) -> Result<CartOutcome, CartError> {
        let _turn = self.product_turn(product_id).await;
        let result = self.remove(product_id);
        self.report(result)
    }

    /// Set a product's quantity, if stock allows.
    ///
    /// Quantities below 1 are ignored without a notice.
    pub async fn update_product_amount(
        &self,
        request: UpdateProductAmount,
    ) -> Result<CartOutcome, CartError> {
        if request.amount < 1 {
            tracing::debug!(product_id = %request.product_id, amount = request.amount, "ignoring quantity below 1");
            return Ok(CartOutcome::Unchanged);
        }
        let _turn = self.product_turn(request.product_id).await;
        let result = self.update(request).await;
        self.report(result)
    }

    async fn add(&self, product_id: ProductId) -> Result<CartOutcome, CartError> {
        let current = self.lock_state().get(product_id).map(|p| p.amount);

        match current {
            Some(amount) => {
                let stock = self
                    .catalog
                    .stock(product_id)
                    .await
                    .map_err(|e| CartError::add_failed(product_id, e))?;
                let requested = amount.saturating_add(1);
                if !stock.covers(requested) {
                    return Err(out_of_stock(product_id, requested, stock.amount));
                }
                self.commit(|cart| {
                    cart.set_amount(product_id, requested);
                })
                .map_err(|e| CartError::add_failed(product_id, e))
            }
            None => {
                let mut product = self
                    .catalog
                    .product(product_id)
                    .await
                    .map_err(|e| CartError::add_failed(product_id, e))?;
                let stock = self
                    .catalog
                    .stock(product_id)
                    .await
                    .map_err(|e| CartError::add_failed(product_id, e))?;
                if !stock.covers(1) {
                    return Err(out_of_stock(product_id, 1, stock.amount));
                }
                product.id = product_id;
                product.amount = 1;
                self.commit(|cart| cart.prepend(product))
                    .map_err(|e| CartError::add_failed(product_id, e))
            }
        }
    }

    fn remove(&self, product_id: ProductId) -> Result<CartOutcome, CartError> {
        if !self.lock_state().contains(product_id) {
            return Err(CartError::remove_failed(product_id, FailureCause::NotInCart));
        }
        self.commit(|cart| {
            cart.remove(product_id);
        })
        .map_err(|e| CartError::remove_failed(product_id, e))
    }

    async fn update(&self, request: UpdateProductAmount) -> Result<CartOutcome, CartError> {
        let UpdateProductAmount { product_id, amount } = request;
        if !self.lock_state().contains(product_id) {
            return Err(CartError::update_failed(product_id, FailureCause::NotInCart));
        }
        let stock = self
            .catalog
            .stock(product_id)
            .await
            .map_err(|e| CartError::update_failed(product_id, e))?;
        if !stock.covers(amount) {
            return Err(out_of_stock(product_id, amount, stock.amount));
        }
        self.commit(|cart| {
            cart.set_amount(product_id, amount);
        })
        .map_err(|e| CartError::update_failed(product_id, e))
    }

    /// Apply `change` to the latest contents, persist, then publish.
    fn commit(&self, change: impl FnOnce(&mut CartState)) -> Result<CartOutcome, CacheError> {
        let mut state = self.lock_state();
        let mut next = state.clone();
        change(&mut next);
        self.storage.save(&next)?;
        *state = next.clone();
        tracing::debug!(items = next.len(), total = next.total_amount(), "cart committed");
        Ok(CartOutcome::Committed(next))
    }

    fn report(&self, result: Result<CartOutcome, CartError>) -> Result<CartOutcome, CartError> {
        if let Err(err) = &result {
            tracing::warn!(product_id = %err.product_id(), error = %err, "cart operation failed");
            if let Some(notifier) = &self.notifier {
                notifier.notify(err.notice());
            }
        }
        result
    }

    /// Wait for exclusive use of one product's entry.
    async fn product_turn(&self, product_id: ProductId) -> ProductTurn<'_> {
        let lock = {
            let mut locks = lock_map(&self.product_locks);
            Arc::clone(locks.entry(product_id).or_default())
        };
        ProductTurn {
            locks: &self.product_locks,
            product_id,
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn tracked_products(&self) -> usize {
        lock_map(&self.product_locks).len()
    }

    fn lock_state(&self) -> MutexGuard<'_, CartState> {
        // Contents are only ever replaced whole, so a poisoned lock still
        // guards a consistent cart.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

type ProductLocks = Mutex<HashMap<ProductId, Arc<AsyncMutex<()>>>>;

fn lock_map(locks: &ProductLocks) -> MutexGuard<'_, HashMap<ProductId, Arc<AsyncMutex<()>>>> {
    locks.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Exclusive use of one product's entry.
///
/// On drop the lock is released, and its map slot is dropped too once no
/// other operation holds or waits on it.
struct ProductTurn<'a> {
    locks: &'a ProductLocks,
    product_id: ProductId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ProductTurn<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = lock_map(self.locks);
        // Waiters clone the Arc under the map lock, so a count of one means
        // nobody else can be queued on it.
        if locks
            .get(&self.product_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.product_id);
        }
    }
}

fn out_of_stock(product_id: ProductId, requested: i64, available: i64) -> CartError {
    CartError::OutOfStock {
        product_id,
        requested,
        available,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{CacheCartStorage, Notice};
    use crate::catalog::{InMemoryCatalog, Product, Stock};
    use async_trait::async_trait;
    use cart_cache::Cache;
    use cart_data::FetchError;

    #[derive(Default)]
    struct RecordingNotifier {
        notices: Mutex<Vec<Notice>>,
    }

    impl RecordingNotifier {
        fn notices(&self) -> Vec<Notice> {
            self.notices.lock().unwrap().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notice: Notice) {
            self.notices.lock().unwrap().push(notice);
        }
    }

    /// Storage whose writes can be switched off.
    #[derive(Default)]
    struct FlakyStorage {
        saved: Mutex<Option<CartState>>,
        failing: Mutex<bool>,
    }

    impl CartStorage for FlakyStorage {
        fn load(&self) -> Result<Option<CartState>, CacheError> {
            Ok(self.saved.lock().unwrap().clone())
        }

        fn save(&self, cart: &CartState) -> Result<(), CacheError> {
            if *self.failing.lock().unwrap() {
                return Err(CacheError::StoreError("disk full".to_string()));
            }
            *self.saved.lock().unwrap() = Some(cart.clone());
            Ok(())
        }
    }

    /// Catalog that yields before answering, so concurrent calls interleave.
    struct YieldingCatalog(InMemoryCatalog);

    #[async_trait]
    impl CatalogSource for YieldingCatalog {
        async fn product(&self, id: ProductId) -> Result<Product, FetchError> {
            tokio::task::yield_now().await;
            self.0.product(id).await
        }

        async fn stock(&self, id: ProductId) -> Result<Stock, FetchError> {
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            self.0.stock(id).await
        }
    }

    fn shoe(id: u64) -> Product {
        Product::new(ProductId::new(id))
            .with_detail("title", format!("Shoe {}", id))
            .with_detail("price", 100.0 + id as f64)
    }

    fn seeded_catalog() -> InMemoryCatalog {
        InMemoryCatalog::new()
            .with_product(shoe(1), 5)
            .with_product(shoe(2), 1)
            .with_product(shoe(3), 0)
    }

    fn catalog() -> Arc<InMemoryCatalog> {
        Arc::new(seeded_catalog())
    }

    struct Fixture {
        store: CartStore,
        catalog: Arc<InMemoryCatalog>,
        cache: Cache,
        notifier: Arc<RecordingNotifier>,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_items(Vec::new())
        }

        fn with_items(items: Vec<Product>) -> Self {
            let cache = Cache::in_memory();
            let storage = CacheCartStorage::new(cache.clone());
            if !items.is_empty() {
                storage.save(&CartState::from_items(items)).unwrap();
            }
            let catalog = catalog();
            let notifier = Arc::new(RecordingNotifier::default());
            let store = CartStore::hydrate(catalog.clone(), Arc::new(storage))
                .unwrap()
                .with_notifier(notifier.clone());
            Self {
                store,
                catalog,
                cache,
                notifier,
            }
        }

        fn persisted(&self) -> Option<CartState> {
            CacheCartStorage::new(self.cache.clone()).load().unwrap()
        }

        fn amounts(&self) -> Vec<(u64, i64)> {
            self.store
                .cart()
                .iter()
                .map(|p| (p.id.get(), p.amount))
                .collect()
        }
    }

    fn id(n: u64) -> ProductId {
        ProductId::new(n)
    }

    #[tokio::test]
    async fn test_add_new_product_prepends_with_amount_one() {
        let fx = Fixture::with_items(vec![shoe(2).with_amount(1)]);

        let outcome = fx.store.add_product(id(1)).await.unwrap();

        assert_eq!(fx.amounts(), vec![(1, 1), (2, 1)]);
        assert_eq!(outcome.committed(), Some(&fx.store.cart()));
        assert_eq!(fx.persisted(), Some(fx.store.cart()));
        assert_eq!(fx.store.cart().items()[0].title(), Some("Shoe 1"));
        assert!(fx.notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn test_add_existing_product_increments_only_that_entry() {
        let fx = Fixture::with_items(vec![shoe(2).with_amount(1), shoe(1).with_amount(2)]);

        fx.store.add_product(id(1)).await.unwrap();

        assert_eq!(fx.amounts(), vec![(2, 1), (1, 3)]);
        assert_eq!(fx.persisted(), Some(fx.store.cart()));
    }

    #[tokio::test]
    async fn test_add_at_stock_limit_is_out_of_stock() {
        let fx = Fixture::with_items(vec![shoe(1).with_amount(5)]);
        let before = fx.store.cart();

        let err = fx.store.add_product(id(1)).await.unwrap_err();

        assert!(matches!(
            err,
            CartError::OutOfStock { requested: 6, available: 5, .. }
        ));
        assert_eq!(fx.store.cart(), before);
        assert_eq!(fx.persisted(), Some(before));
        assert_eq!(fx.notifier.notices(), vec![Notice::OutOfStock]);
    }

    #[tokio::test]
    async fn test_add_new_product_without_stock_is_out_of_stock() {
        let fx = Fixture::new();

        let err = fx.store.add_product(id(3)).await.unwrap_err();

        assert_eq!(err.notice(), Notice::OutOfStock);
        assert!(fx.store.cart().is_empty());
        assert_eq!(fx.persisted(), None);
        assert_eq!(fx.notifier.notices(), vec![Notice::OutOfStock]);
    }

    #[tokio::test]
    async fn test_add_unknown_product_fails() {
        let fx = Fixture::new();

        let err = fx.store.add_product(id(42)).await.unwrap_err();

        assert!(matches!(
            err,
            CartError::AddFailed { cause: FailureCause::Catalog(_), .. }
        ));
        assert!(fx.store.cart().is_empty());
        assert_eq!(fx.notifier.notices(), vec![Notice::AddFailed]);
    }

    #[tokio::test]
    async fn test_add_existing_with_missing_stock_record_fails() {
        let fx = Fixture::with_items(vec![shoe(1).with_amount(1)]);
        fx.catalog.remove_stock(id(1));

        let err = fx.store.add_product(id(1)).await.unwrap_err();

        assert_eq!(err.notice(), Notice::AddFailed);
        assert_eq!(fx.amounts(), vec![(1, 1)]);
    }

    #[tokio::test]
    async fn test_remove_present_product_keeps_order() {
        let fx = Fixture::with_items(vec![
            shoe(3).with_amount(1),
            shoe(2).with_amount(1),
            shoe(1).with_amount(2),
        ]);

        fx.store.remove_product(id(2)).await.unwrap();

        assert_eq!(fx.amounts(), vec![(3, 1), (1, 2)]);
        assert_eq!(fx.persisted(), Some(fx.store.cart()));
    }

    #[tokio::test]
    async fn test_remove_absent_product_fails() {
        let fx = Fixture::with_items(vec![shoe(1).with_amount(1)]);

        let err = fx.store.remove_product(id(2)).await.unwrap_err();

        assert!(matches!(
            err,
            CartError::RemoveFailed { cause: FailureCause::NotInCart, .. }
        ));
        assert_eq!(fx.amounts(), vec![(1, 1)]);
        assert_eq!(fx.notifier.notices(), vec![Notice::RemoveFailed]);
    }

    #[tokio::test]
    async fn test_update_below_one_is_silent_noop() {
        let fx = Fixture::with_items(vec![shoe(1).with_amount(2)]);

        for amount in [0, -1, i64::MIN] {
            let outcome = fx
                .store
                .update_product_amount(UpdateProductAmount { product_id: id(1), amount })
                .await
                .unwrap();
            assert_eq!(outcome, CartOutcome::Unchanged);
        }

        assert_eq!(fx.amounts(), vec![(1, 2)]);
        assert!(fx.notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn test_update_within_stock_sets_exact_amount() {
        let fx = Fixture::with_items(vec![shoe(2).with_amount(1), shoe(1).with_amount(1)]);

        fx.store
            .update_product_amount(UpdateProductAmount { product_id: id(1), amount: 5 })
            .await
            .unwrap();

        assert_eq!(fx.amounts(), vec![(2, 1), (1, 5)]);
        assert_eq!(fx.persisted(), Some(fx.store.cart()));
    }

    #[tokio::test]
    async fn test_update_above_stock_is_out_of_stock() {
        let fx = Fixture::with_items(vec![shoe(1).with_amount(1)]);

        let err = fx
            .store
            .update_product_amount(UpdateProductAmount { product_id: id(1), amount: 6 })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CartError::OutOfStock { requested: 6, available: 5, .. }
        ));
        assert_eq!(fx.amounts(), vec![(1, 1)]);
        assert_eq!(fx.notifier.notices(), vec![Notice::OutOfStock]);
    }

    #[tokio::test]
    async fn test_update_absent_product_fails() {
        let fx = Fixture::new();

        let err = fx
            .store
            .update_product_amount(UpdateProductAmount { product_id: id(1), amount: 2 })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CartError::UpdateFailed { cause: FailureCause::NotInCart, .. }
        ));
        assert_eq!(fx.notifier.notices(), vec![Notice::UpdateFailed]);
    }

    #[tokio::test]
    async fn test_update_with_failed_lookup_fails() {
        let fx = Fixture::with_items(vec![shoe(1).with_amount(1)]);
        fx.catalog.remove_stock(id(1));

        let err = fx
            .store
            .update_product_amount(UpdateProductAmount { product_id: id(1), amount: 2 })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CartError::UpdateFailed { cause: FailureCause::Catalog(_), .. }
        ));
        assert_eq!(fx.amounts(), vec![(1, 1)]);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_last_good_state() {
        let storage = Arc::new(FlakyStorage::default());
        let store = CartStore::hydrate(catalog(), storage.clone()).unwrap();

        store.add_product(id(1)).await.unwrap();
        *storage.failing.lock().unwrap() = true;

        let err = store.add_product(id(2)).await.unwrap_err();
        assert!(matches!(
            err,
            CartError::AddFailed { cause: FailureCause::Storage(_), .. }
        ));
        let err = store.remove_product(id(1)).await.unwrap_err();
        assert!(matches!(
            err,
            CartError::RemoveFailed { cause: FailureCause::Storage(_), .. }
        ));

        let cart = store.cart();
        assert_eq!(cart.len(), 1);
        assert_eq!(storage.load().unwrap(), Some(cart));
    }

    #[test]
    fn test_hydrate_rejects_corrupt_slot() {
        let cache = Cache::in_memory();
        cache.set("@RocketShoes:cart", &"garbage").unwrap();

        let result = CartStore::hydrate(catalog(), Arc::new(CacheCartStorage::new(cache)));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_adds_of_same_product_are_not_lost() {
        let storage = Arc::new(CacheCartStorage::new(Cache::in_memory()));
        let store =
            CartStore::hydrate(Arc::new(YieldingCatalog(seeded_catalog())), storage).unwrap();

        let (a, b, c) = tokio::join!(
            store.add_product(id(1)),
            store.add_product(id(1)),
            store.add_product(id(1)),
        );
        a.unwrap();
        b.unwrap();
        c.unwrap();

        assert_eq!(store.cart().get(id(1)).map(|p| p.amount), Some(3));
        assert_eq!(store.cart().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_adds_of_different_products_both_land() {
        let storage = Arc::new(CacheCartStorage::new(Cache::in_memory()));
        let store = CartStore::hydrate(Arc::new(YieldingCatalog(seeded_catalog())), storage.clone())
            .unwrap();

        let (a, b) = tokio::join!(store.add_product(id(1)), store.add_product(id(2)));
        a.unwrap();
        b.unwrap();

        let cart = store.cart();
        assert!(cart.contains(id(1)));
        assert!(cart.contains(id(2)));
        assert_eq!(storage.load().unwrap(), Some(cart));
    }

    #[tokio::test]
    async fn test_finished_operations_release_their_locks() {
        let fx = Fixture::new();

        for n in 100..1100 {
            fx.store.remove_product(id(n)).await.unwrap_err();
        }
        fx.store.add_product(id(1)).await.unwrap();
        fx.store.add_product(id(3)).await.unwrap_err();
        fx.store
            .update_product_amount(UpdateProductAmount {
                product_id: id(1),
                amount: 2,
            })
            .await
            .unwrap();

        assert_eq!(fx.store.tracked_products(), 0);
        assert_eq!(fx.amounts(), vec![(1, 2)]);
    }

    #[tokio::test]
    async fn test_concurrent_operations_release_their_locks() {
        let storage = Arc::new(CacheCartStorage::new(Cache::in_memory()));
        let store =
            CartStore::hydrate(Arc::new(YieldingCatalog(seeded_catalog())), storage).unwrap();

        let (a, b, c) = tokio::join!(
            store.add_product(id(1)),
            store.add_product(id(1)),
            store.add_product(id(2)),
        );
        a.unwrap();
        b.unwrap();
        c.unwrap();

        assert_eq!(store.tracked_products(), 0);
        assert_eq!(store.cart().get(id(1)).map(|p| p.amount), Some(2));
    }

    #[tokio::test]
    async fn test_cancelled_operation_releases_its_lock() {
        let storage = Arc::new(CacheCartStorage::new(Cache::in_memory()));
        let store =
            CartStore::hydrate(Arc::new(YieldingCatalog(seeded_catalog())), storage).unwrap();

        {
            let pending = store.add_product(id(1));
            tokio::pin!(pending);
            // Poll once so the turn is taken, then drop mid-lookup.
            assert!(poll_once(pending.as_mut()).await.is_none());
        }

        assert_eq!(store.tracked_products(), 0);
        assert!(store.cart().is_empty());
    }

    async fn poll_once<F: std::future::Future + Unpin>(fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            out = fut => Some(out),
            _ = std::future::ready(()) => None,
        }
    }
}
