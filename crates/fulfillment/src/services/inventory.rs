//! Per-product inventory counters and the best-effort purchase fan-out.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{LedgerId, UserId};
use domain::{CartItem, ProductId};
use futures_util::StreamExt;
use futures_util::stream;

use crate::error::FulfillmentError;

/// How many counter mutations run concurrently during the fan-out.
const PURCHASE_FANOUT_CONCURRENCY: usize = 4;

/// Availability bookkeeping for one product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InventoryCounter {
    /// Carts currently holding the product.
    pub in_carts: i64,
    /// Units sold across completed checkouts.
    pub purchased: i64,
    /// Checkouts that completed with the product in the cart.
    pub completed_checkouts: i64,
}

/// Trait for the product store's counter mutation.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Applies one purchase to a product: decrements the in-cart counter,
    /// increments purchased and completed checkouts, and records the
    /// ledger/user backlink.
    async fn apply_purchase(
        &self,
        product_id: &ProductId,
        ledger_id: LedgerId,
        user_id: UserId,
    ) -> Result<(), FulfillmentError>;
}

/// Outcome of the purchase fan-out, visible to operators.
///
/// Individual failures are collected here instead of being dropped; the
/// report never gates the saga result.
#[derive(Debug, Clone, Default)]
pub struct InventoryReport {
    pub succeeded: Vec<ProductId>,
    pub failed: Vec<(ProductId, String)>,
}

impl InventoryReport {
    /// Returns true when every product mutation went through.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Applies the purchase to every cart product with bounded concurrency.
///
/// Each product is mutated independently; one failure never affects the
/// others. Completion order is arbitrary.
pub async fn apply_purchases<P: ProductStore>(
    store: &P,
    items: &[CartItem],
    ledger_id: LedgerId,
    user_id: UserId,
) -> InventoryReport {
    // Yield owned items so the per-item closure takes `CartItem` by value.
    // Borrowing (`&CartItem`) makes the closure's returned future carry a
    // universally-quantified lifetime that rustc cannot prove `Send`
    // (rust-lang/rust #102211); the clone is behaviour-neutral.
    let results: Vec<(ProductId, Result<(), FulfillmentError>)> = stream::iter(items.to_vec())
        .map(|item| {
            let product_id = item.product_id.clone();
            async move {
                let result = store.apply_purchase(&product_id, ledger_id, user_id).await;
                (product_id, result)
            }
        })
        .buffer_unordered(PURCHASE_FANOUT_CONCURRENCY)
        .collect()
        .await;

    let mut report = InventoryReport::default();
    for (product_id, result) in results {
        match result {
            Ok(()) => report.succeeded.push(product_id),
            Err(e) => report.failed.push((product_id, e.to_string())),
        }
    }
    report
}

#[derive(Debug, Default)]
struct InMemoryProductState {
    counters: HashMap<ProductId, InventoryCounter>,
    backlinks: HashMap<ProductId, Vec<(LedgerId, UserId)>>,
    failing: HashSet<ProductId>,
    calls: HashMap<ProductId, u32>,
}

/// In-memory product store for tests and default wiring.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductStore {
    state: Arc<RwLock<InMemoryProductState>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a product counter, e.g. with carts already holding it.
    pub fn seed_counter(&self, product_id: impl Into<ProductId>, counter: InventoryCounter) {
        self.state
            .write()
            .unwrap()
            .counters
            .insert(product_id.into(), counter);
    }

    /// Configures one product's mutation to fail.
    pub fn set_fail_for(&self, product_id: impl Into<ProductId>) {
        self.state.write().unwrap().failing.insert(product_id.into());
    }

    /// Reads a product's counter.
    pub fn counter(&self, product_id: &ProductId) -> InventoryCounter {
        self.state
            .read()
            .unwrap()
            .counters
            .get(product_id)
            .copied()
            .unwrap_or_default()
    }

    /// Number of mutation calls seen for a product.
    pub fn call_count(&self, product_id: &ProductId) -> u32 {
        self.state
            .read()
            .unwrap()
            .calls
            .get(product_id)
            .copied()
            .unwrap_or(0)
    }

    /// Total mutation calls across all products.
    pub fn total_calls(&self) -> u32 {
        self.state.read().unwrap().calls.values().sum()
    }

    /// The ledger/user backlinks recorded for a product.
    pub fn backlinks(&self, product_id: &ProductId) -> Vec<(LedgerId, UserId)> {
        self.state
            .read()
            .unwrap()
            .backlinks
            .get(product_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn apply_purchase(
        &self,
        product_id: &ProductId,
        ledger_id: LedgerId,
        user_id: UserId,
    ) -> Result<(), FulfillmentError> {
        let mut state = self.state.write().unwrap();
        *state.calls.entry(product_id.clone()).or_default() += 1;

        if state.failing.contains(product_id) {
            return Err(FulfillmentError::InventoryUpdate {
                product_id: product_id.to_string(),
                detail: "product save rejected".to_string(),
            });
        }

        let counter = state.counters.entry(product_id.clone()).or_default();
        counter.in_carts -= 1;
        counter.purchased += 1;
        counter.completed_checkouts += 1;

        state
            .backlinks
            .entry(product_id.clone())
            .or_default()
            .push((ledger_id, user_id));

        Ok(())
    }
}
