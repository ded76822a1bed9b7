//! CRM lead synchronization: local mirror, remote API, and the
//! create-or-update branch driven after a successful charge.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::{CartItem, Locale, OrderTotals};
use serde::{Deserialize, Serialize};

use crate::error::FulfillmentError;

/// A CRM lead keyed by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    pub locale: Locale,
}

/// How the lead branch resolved: the lead was created fresh or an
/// existing one was updated. Carries the local mirror id either way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadSyncOutcome {
    Created { id: String },
    Updated { id: String },
}

impl LeadSyncOutcome {
    /// The local mirror id regardless of branch.
    pub fn local_id(&self) -> &str {
        match self {
            LeadSyncOutcome::Created { id } | LeadSyncOutcome::Updated { id } => id,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, LeadSyncOutcome::Created { .. })
    }
}

/// Result of the lead branch: the surviving outcome (if the local write
/// succeeded) plus soft errors from either write. Local and remote are
/// independently writable and may transiently diverge; no reconciliation
/// is attempted here.
#[derive(Debug, Clone, Default)]
pub struct LeadSyncReport {
    pub outcome: Option<LeadSyncOutcome>,
    pub soft_errors: Vec<String>,
}

/// Trait for the local lead mirror.
#[async_trait]
pub trait CrmStore: Send + Sync {
    /// Looks up a lead by email; returns its local id when present.
    async fn find_by_email(&self, email: &str) -> Result<Option<String>, FulfillmentError>;

    /// Creates a local lead; returns the assigned local id.
    async fn create(&self, lead: &Lead, tags: &[String]) -> Result<String, FulfillmentError>;

    /// Updates a local lead; returns its local id.
    async fn update(&self, lead: &Lead, tags: &[String]) -> Result<String, FulfillmentError>;
}

/// Trait for the remote CRM API.
#[async_trait]
pub trait CrmApi: Send + Sync {
    /// Creates a remote lead; returns the remote id.
    async fn create(&self, lead: &Lead, tags: &[String]) -> Result<String, FulfillmentError>;

    /// Updates a remote lead; returns the remote id.
    async fn update(&self, lead: &Lead, tags: &[String]) -> Result<String, FulfillmentError>;
}

/// Tags written to the local mirror for a purchase.
pub fn mirror_tags(totals: &OrderTotals, cart: &[CartItem], locale: Locale) -> Vec<String> {
    let mut tags = vec![
        "purchase".to_string(),
        format!("lang:{}", locale.tag()),
        format!("total:{}", totals.grand_total),
    ];
    tags.extend(cart.iter().map(|item| format!("sku:{}", item.product_id)));
    tags
}

/// Tags sent to the remote API for a purchase. Derived independently of
/// the mirror tags; the two sets are allowed to differ.
pub fn api_tags(totals: &OrderTotals, cart: &[CartItem], locale: Locale) -> Vec<String> {
    vec![
        format!("customer-{}", locale.tag()),
        format!("order-total-{}", totals.grand_total),
        format!("order-items-{}", cart.len()),
    ]
}

/// Creates or updates the lead in both systems concurrently.
///
/// `existing` is the local id found by the earlier existence check; when
/// absent both systems get a create, otherwise both get an update. A
/// failure on either write is reported softly and never aborts the branch.
pub async fn sync_lead<S, A>(
    store: &S,
    api: &A,
    lead: &Lead,
    existing: Option<String>,
    totals: &OrderTotals,
    cart: &[CartItem],
) -> LeadSyncReport
where
    S: CrmStore,
    A: CrmApi,
{
    let local_tags = mirror_tags(totals, cart, lead.locale);
    let remote_tags = api_tags(totals, cart, lead.locale);

    let creating = existing.is_none();
    let (local, remote) = if creating {
        tokio::join!(store.create(lead, &local_tags), api.create(lead, &remote_tags))
    } else {
        tokio::join!(store.update(lead, &local_tags), api.update(lead, &remote_tags))
    };

    let mut report = LeadSyncReport::default();

    match local {
        Ok(id) => {
            report.outcome = Some(if creating {
                LeadSyncOutcome::Created { id }
            } else {
                LeadSyncOutcome::Updated { id }
            });
        }
        Err(e) => report
            .soft_errors
            .push(format!("local lead write failed: {e}")),
    }

    if let Err(e) = remote {
        report
            .soft_errors
            .push(format!("remote lead write failed: {e}"));
    }

    report
}

#[derive(Debug, Default)]
struct InMemoryCrmState {
    leads: HashMap<String, (String, Vec<String>)>,
    next_id: u32,
    fail_on_find: bool,
    fail_on_write: bool,
    creates: u32,
    updates: u32,
}

/// In-memory local lead mirror.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCrmStore {
    state: Arc<RwLock<InMemoryCrmState>>,
}

impl InMemoryCrmStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an existing lead, returning its local id.
    pub fn seed_lead(&self, email: &str) -> String {
        let mut state = self.state.write().unwrap();
        state.next_id += 1;
        let id = format!("LEAD-{:04}", state.next_id);
        state
            .leads
            .insert(email.to_string(), (id.clone(), Vec::new()));
        id
    }

    pub fn set_fail_on_find(&self, fail: bool) {
        self.state.write().unwrap().fail_on_find = fail;
    }

    pub fn set_fail_on_write(&self, fail: bool) {
        self.state.write().unwrap().fail_on_write = fail;
    }

    pub fn create_count(&self) -> u32 {
        self.state.read().unwrap().creates
    }

    pub fn update_count(&self) -> u32 {
        self.state.read().unwrap().updates
    }

    /// Tags currently stored for a lead.
    pub fn tags(&self, email: &str) -> Option<Vec<String>> {
        self.state
            .read()
            .unwrap()
            .leads
            .get(email)
            .map(|(_, tags)| tags.clone())
    }
}

#[async_trait]
impl CrmStore for InMemoryCrmStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<String>, FulfillmentError> {
        let state = self.state.read().unwrap();
        if state.fail_on_find {
            return Err(FulfillmentError::LeadSync(
                "lead lookup unavailable".to_string(),
            ));
        }
        Ok(state.leads.get(email).map(|(id, _)| id.clone()))
    }

    async fn create(&self, lead: &Lead, tags: &[String]) -> Result<String, FulfillmentError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_write {
            return Err(FulfillmentError::LeadSync(
                "local lead store unavailable".to_string(),
            ));
        }
        state.next_id += 1;
        state.creates += 1;
        let id = format!("LEAD-{:04}", state.next_id);
        state
            .leads
            .insert(lead.email.clone(), (id.clone(), tags.to_vec()));
        Ok(id)
    }

    async fn update(&self, lead: &Lead, tags: &[String]) -> Result<String, FulfillmentError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_write {
            return Err(FulfillmentError::LeadSync(
                "local lead store unavailable".to_string(),
            ));
        }
        state.updates += 1;
        match state.leads.get_mut(&lead.email) {
            Some((id, stored_tags)) => {
                stored_tags.extend(tags.iter().cloned());
                Ok(id.clone())
            }
            None => Err(FulfillmentError::LeadSync(format!(
                "no local lead for {}",
                lead.email
            ))),
        }
    }
}

#[derive(Debug, Default)]
struct InMemoryCrmApiState {
    leads: HashMap<String, String>,
    next_id: u32,
    fail_on_write: bool,
    creates: u32,
    updates: u32,
}

/// In-memory remote CRM API.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCrmApi {
    state: Arc<RwLock<InMemoryCrmApiState>>,
}

impl InMemoryCrmApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_on_write(&self, fail: bool) {
        self.state.write().unwrap().fail_on_write = fail;
    }

    pub fn create_count(&self) -> u32 {
        self.state.read().unwrap().creates
    }

    pub fn update_count(&self) -> u32 {
        self.state.read().unwrap().updates
    }
}

#[async_trait]
impl CrmApi for InMemoryCrmApi {
    async fn create(&self, lead: &Lead, _tags: &[String]) -> Result<String, FulfillmentError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_write {
            return Err(FulfillmentError::LeadSync(
                "remote CRM unavailable".to_string(),
            ));
        }
        state.next_id += 1;
        state.creates += 1;
        let id = format!("RLEAD-{:04}", state.next_id);
        state.leads.insert(lead.email.clone(), id.clone());
        Ok(id)
    }

    async fn update(&self, lead: &Lead, _tags: &[String]) -> Result<String, FulfillmentError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_write {
            return Err(FulfillmentError::LeadSync(
                "remote CRM unavailable".to_string(),
            ));
        }
        state.updates += 1;
        // Remote API upserts: an update for an unseen email creates it.
        if let Some(id) = state.leads.get(&lead.email) {
            return Ok(id.clone());
        }
        state.next_id += 1;
        let id = format!("RLEAD-{:04}", state.next_id);
        state.leads.insert(lead.email.clone(), id.clone());
        Ok(id)
    }
}
