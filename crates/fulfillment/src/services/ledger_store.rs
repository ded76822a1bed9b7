//! Ledger persistence boundary trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::LedgerId;
use domain::TransactionLedger;

use crate::error::FulfillmentError;

/// Trait for persisting transaction ledgers.
///
/// The orchestrator writes through this boundary; the storage mechanics
/// behind it are owned elsewhere.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Persists a newly opened ledger.
    async fn create(&self, ledger: &TransactionLedger) -> Result<(), FulfillmentError>;

    /// Persists the current state of an existing ledger.
    async fn update(&self, ledger: &TransactionLedger) -> Result<(), FulfillmentError>;

    /// Loads a ledger by id.
    async fn get(&self, id: LedgerId) -> Result<Option<TransactionLedger>, FulfillmentError>;
}

#[derive(Debug, Default)]
struct InMemoryLedgerState {
    ledgers: HashMap<LedgerId, TransactionLedger>,
    fail_on_create: bool,
    fail_on_update: bool,
    updates: u32,
}

/// In-memory ledger store for tests and default wiring.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    state: Arc<RwLock<InMemoryLedgerState>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    pub fn set_fail_on_update(&self, fail: bool) {
        self.state.write().unwrap().fail_on_update = fail;
    }

    pub fn ledger_count(&self) -> usize {
        self.state.read().unwrap().ledgers.len()
    }

    /// Ids of all stored ledgers, in no particular order.
    pub fn ledger_ids(&self) -> Vec<LedgerId> {
        self.state.read().unwrap().ledgers.keys().copied().collect()
    }

    pub fn update_count(&self) -> u32 {
        self.state.read().unwrap().updates
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn create(&self, ledger: &TransactionLedger) -> Result<(), FulfillmentError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_create {
            return Err(FulfillmentError::LedgerStore(
                "ledger insert rejected".to_string(),
            ));
        }
        state.ledgers.insert(ledger.id(), ledger.clone());
        Ok(())
    }

    async fn update(&self, ledger: &TransactionLedger) -> Result<(), FulfillmentError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_update {
            return Err(FulfillmentError::LedgerStore(
                "ledger update rejected".to_string(),
            ));
        }
        state.updates += 1;
        state.ledgers.insert(ledger.id(), ledger.clone());
        Ok(())
    }

    async fn get(&self, id: LedgerId) -> Result<Option<TransactionLedger>, FulfillmentError> {
        Ok(self.state.read().unwrap().ledgers.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::order_request;

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemoryLedgerStore::new();
        let ledger = TransactionLedger::open(LedgerId::new(), &order_request());

        store.create(&ledger).await.unwrap();
        let loaded = store.get(ledger.id()).await.unwrap().unwrap();
        assert_eq!(loaded.id(), ledger.id());
        assert_eq!(store.ledger_count(), 1);
    }

    #[tokio::test]
    async fn test_update_overwrites() {
        let store = InMemoryLedgerStore::new();
        let mut ledger = TransactionLedger::open(LedgerId::new(), &order_request());
        store.create(&ledger).await.unwrap();

        ledger.mark_location_resolved().unwrap();
        store.update(&ledger).await.unwrap();

        let loaded = store.get(ledger.id()).await.unwrap().unwrap();
        assert_eq!(loaded.status(), ledger.status());
        assert_eq!(store.update_count(), 1);
    }

    #[tokio::test]
    async fn test_create_failure() {
        let store = InMemoryLedgerStore::new();
        store.set_fail_on_create(true);
        let ledger = TransactionLedger::open(LedgerId::new(), &order_request());

        let err = store.create(&ledger).await.unwrap_err();
        assert!(matches!(err, FulfillmentError::LedgerStore(_)));
        assert_eq!(store.ledger_count(), 0);
    }
}
