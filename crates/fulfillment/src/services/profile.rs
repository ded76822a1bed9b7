//! User profile store trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{LedgerId, UserId};
use domain::CartItem;
use serde::{Deserialize, Serialize};

use crate::error::FulfillmentError;

/// Snapshot of a user profile as seen by the fulfillment flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: Option<String>,
    pub newsletter_opt_in: bool,
    /// Ledger ids of completed checkout attempts, oldest first.
    pub transactions: Vec<LedgerId>,
    /// The stored cart; cleared once a checkout's charge is captured.
    pub cart: Vec<CartItem>,
    /// CRM lead reference, backfilled on first lead creation.
    pub lead_ref: Option<String>,
}

impl UserProfile {
    fn empty(id: UserId) -> Self {
        Self {
            id,
            email: None,
            newsletter_opt_in: false,
            transactions: Vec::new(),
            cart: Vec::new(),
            lead_ref: None,
        }
    }
}

/// Trait for user profile reads and slice updates.
///
/// Each method touches a disjoint slice of the profile so parallel
/// branches never contend on the same fields.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Writes contact email and newsletter decision; returns the profile.
    async fn update_contact(
        &self,
        user_id: UserId,
        email: &str,
        newsletter_opt_in: bool,
    ) -> Result<UserProfile, FulfillmentError>;

    /// Appends a ledger to the transaction history and clears the cart.
    async fn append_transaction(
        &self,
        user_id: UserId,
        ledger_id: LedgerId,
    ) -> Result<UserProfile, FulfillmentError>;

    /// Backfills the CRM lead reference, set only on first lead creation.
    async fn set_lead_ref(
        &self,
        user_id: UserId,
        lead_ref: &str,
    ) -> Result<UserProfile, FulfillmentError>;

    /// Reads a profile.
    async fn get(&self, user_id: UserId) -> Result<Option<UserProfile>, FulfillmentError>;
}

#[derive(Debug, Default)]
struct InMemoryUserState {
    profiles: HashMap<UserId, UserProfile>,
    fail_on_contact: bool,
    fail_on_history: bool,
    fail_on_lead_ref: bool,
    contact_updates: u32,
    history_updates: u32,
    lead_ref_updates: u32,
}

/// In-memory user store for tests and default wiring.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    state: Arc<RwLock<InMemoryUserState>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a profile with a stored cart, as the storefront would have.
    pub fn seed_cart(&self, user_id: UserId, cart: Vec<CartItem>) {
        let mut state = self.state.write().unwrap();
        state
            .profiles
            .entry(user_id)
            .or_insert_with(|| UserProfile::empty(user_id))
            .cart = cart;
    }

    pub fn set_fail_on_contact(&self, fail: bool) {
        self.state.write().unwrap().fail_on_contact = fail;
    }

    pub fn set_fail_on_history(&self, fail: bool) {
        self.state.write().unwrap().fail_on_history = fail;
    }

    pub fn set_fail_on_lead_ref(&self, fail: bool) {
        self.state.write().unwrap().fail_on_lead_ref = fail;
    }

    pub fn contact_updates(&self) -> u32 {
        self.state.read().unwrap().contact_updates
    }

    pub fn history_updates(&self) -> u32 {
        self.state.read().unwrap().history_updates
    }

    pub fn lead_ref_updates(&self) -> u32 {
        self.state.read().unwrap().lead_ref_updates
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn update_contact(
        &self,
        user_id: UserId,
        email: &str,
        newsletter_opt_in: bool,
    ) -> Result<UserProfile, FulfillmentError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_contact {
            return Err(FulfillmentError::ProfileStore(
                "contact update rejected".to_string(),
            ));
        }
        state.contact_updates += 1;
        let profile = state
            .profiles
            .entry(user_id)
            .or_insert_with(|| UserProfile::empty(user_id));
        profile.email = Some(email.to_string());
        profile.newsletter_opt_in = newsletter_opt_in;
        Ok(profile.clone())
    }

    async fn append_transaction(
        &self,
        user_id: UserId,
        ledger_id: LedgerId,
    ) -> Result<UserProfile, FulfillmentError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_history {
            return Err(FulfillmentError::ProfileStore(
                "history update rejected".to_string(),
            ));
        }
        state.history_updates += 1;
        let profile = state
            .profiles
            .entry(user_id)
            .or_insert_with(|| UserProfile::empty(user_id));
        profile.transactions.push(ledger_id);
        profile.cart.clear();
        Ok(profile.clone())
    }

    async fn set_lead_ref(
        &self,
        user_id: UserId,
        lead_ref: &str,
    ) -> Result<UserProfile, FulfillmentError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_lead_ref {
            return Err(FulfillmentError::ProfileStore(
                "lead reference update rejected".to_string(),
            ));
        }
        state.lead_ref_updates += 1;
        let profile = state
            .profiles
            .entry(user_id)
            .or_insert_with(|| UserProfile::empty(user_id));
        profile.lead_ref = Some(lead_ref.to_string());
        Ok(profile.clone())
    }

    async fn get(&self, user_id: UserId) -> Result<Option<UserProfile>, FulfillmentError> {
        Ok(self.state.read().unwrap().profiles.get(&user_id).cloned())
    }
}
