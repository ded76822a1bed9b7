//! Payment gateway trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::LedgerId;
use domain::{BillingCountry, ChargeAmount, ShippingDestination};
use uuid::Uuid;

use crate::error::FulfillmentError;

/// Capability a location must carry before cards can be charged against it.
pub const CARD_PROCESSING: &str = "CREDIT_CARD_PROCESSING";

/// A processor-side location, as returned by the location-list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorLocation {
    pub id: String,
    pub name: String,
    pub capabilities: Vec<String>,
}

impl ProcessorLocation {
    /// Returns true if this location can process card payments.
    pub fn can_process_cards(&self) -> bool {
        self.capabilities.iter().any(|c| c == CARD_PROCESSING)
    }
}

/// A charge submission against a resolved location.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub location_id: String,
    /// Derived from the ledger id; identical across retries of the same
    /// ledger so the processor can deduplicate.
    pub idempotency_key: Uuid,
    /// Ledger id, recorded provider-side as the charge reference.
    pub reference_id: LedgerId,
    pub buyer_email: String,
    pub destination: ShippingDestination,
    pub amount: ChargeAmount,
    pub card_nonce: String,
    pub note: String,
}

/// Result of a successful capture.
#[derive(Debug, Clone)]
pub struct ChargeOutcome {
    /// Charge reference assigned by the processor.
    pub provider_ref: String,
    /// Processor-reported status, e.g. `CAPTURED`.
    pub status: String,
}

/// Trait for payment processor operations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Lists all locations on the processor account for a billing country.
    async fn list_locations(
        &self,
        country: BillingCountry,
    ) -> Result<Vec<ProcessorLocation>, FulfillmentError>;

    /// Submits a card charge. Immediate capture; no delayed settlement.
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeOutcome, FulfillmentError>;
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    locations: Vec<ProcessorLocation>,
    charges: HashMap<Uuid, (ChargeRequest, ChargeOutcome)>,
    charge_attempts: u32,
    next_id: u32,
    fail_on_list: bool,
    decline_reason: Option<String>,
    fail_on_charge: bool,
}

/// In-memory payment gateway for tests and default wiring.
///
/// Seeds one card-capable location per billing country; knobs flip the
/// list call, a decline, or an opaque gateway failure.
#[derive(Debug, Clone)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl Default for InMemoryPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPaymentGateway {
    /// Creates a gateway seeded with a card-capable location per country.
    pub fn new() -> Self {
        let locations = [BillingCountry::UnitedStates, BillingCountry::Japan]
            .iter()
            .enumerate()
            .map(|(i, country)| ProcessorLocation {
                id: format!("LOC-{:04}", i + 1),
                name: country.location_name().to_string(),
                capabilities: vec![CARD_PROCESSING.to_string()],
            })
            .collect();

        Self {
            state: Arc::new(RwLock::new(InMemoryGatewayState {
                locations,
                ..Default::default()
            })),
        }
    }

    /// Replaces the seeded location list.
    pub fn set_locations(&self, locations: Vec<ProcessorLocation>) {
        self.state.write().unwrap().locations = locations;
    }

    /// Removes the card-processing capability from a named location.
    pub fn strip_card_capability(&self, name: &str) {
        let mut state = self.state.write().unwrap();
        for location in state.locations.iter_mut().filter(|l| l.name == name) {
            location.capabilities.retain(|c| c != CARD_PROCESSING);
        }
    }

    /// Configures the location-list call to fail transiently.
    pub fn set_fail_on_list(&self, fail: bool) {
        self.state.write().unwrap().fail_on_list = fail;
    }

    /// Configures the next charge to be declined with the given reason.
    pub fn set_decline(&self, reason: impl Into<String>) {
        self.state.write().unwrap().decline_reason = Some(reason.into());
    }

    /// Configures the charge call to fail opaquely.
    pub fn set_fail_on_charge(&self, fail: bool) {
        self.state.write().unwrap().fail_on_charge = fail;
    }

    /// Number of charge attempts submitted, deduplicated or not.
    pub fn charge_attempts(&self) -> u32 {
        self.state.read().unwrap().charge_attempts
    }

    /// Number of distinct captures held by the processor.
    pub fn captured_count(&self) -> usize {
        self.state.read().unwrap().charges.len()
    }

    /// The idempotency keys of all captures, in no particular order.
    pub fn captured_keys(&self) -> Vec<Uuid> {
        self.state.read().unwrap().charges.keys().copied().collect()
    }

    /// The recorded request for a capture, looked up by idempotency key.
    pub fn capture(&self, key: Uuid) -> Option<ChargeRequest> {
        self.state
            .read()
            .unwrap()
            .charges
            .get(&key)
            .map(|(req, _)| req.clone())
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn list_locations(
        &self,
        _country: BillingCountry,
    ) -> Result<Vec<ProcessorLocation>, FulfillmentError> {
        let state = self.state.read().unwrap();
        if state.fail_on_list {
            return Err(FulfillmentError::UpstreamUnavailable {
                context: "location list".to_string(),
            });
        }
        Ok(state.locations.clone())
    }

    async fn charge(&self, request: ChargeRequest) -> Result<ChargeOutcome, FulfillmentError> {
        let mut state = self.state.write().unwrap();
        state.charge_attempts += 1;

        if let Some(reason) = state.decline_reason.clone() {
            return Err(FulfillmentError::PaymentDeclined { reason });
        }
        if state.fail_on_charge {
            return Err(FulfillmentError::PaymentGateway(
                "processor returned an unreadable response".to_string(),
            ));
        }

        // Provider-side dedup: a repeated key returns the original capture.
        if let Some((_, outcome)) = state.charges.get(&request.idempotency_key) {
            return Ok(outcome.clone());
        }

        state.next_id += 1;
        let outcome = ChargeOutcome {
            provider_ref: format!("CHG-{:04}", state.next_id),
            status: "CAPTURED".to_string(),
        };
        state
            .charges
            .insert(request.idempotency_key, (request, outcome.clone()));

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idempotency::charge_key;
    use domain::Currency;

    fn charge_request(key: Uuid) -> ChargeRequest {
        let ledger_id = LedgerId::new();
        ChargeRequest {
            location_id: "LOC-0001".to_string(),
            idempotency_key: key,
            reference_id: ledger_id,
            buyer_email: "aiko@example.com".to_string(),
            destination: ShippingDestination {
                given_name: "Aiko".to_string(),
                family_name: "Tanaka".to_string(),
                email: "aiko@example.com".to_string(),
                postal_code: "97201".to_string(),
                address_line1: "100 SW Main St".to_string(),
                address_line2: "Apt 4".to_string(),
                city: "Portland".to_string(),
                prefecture: "OR".to_string(),
                country: "US".to_string(),
                phone: "5035550100".to_string(),
            },
            amount: ChargeAmount {
                amount: 4998,
                currency: Currency::Usd,
            },
            card_nonce: "cnon-test-ok".to_string(),
            note: "Kasumi Trading US: Online order.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_seeded_locations_process_cards() {
        let gateway = InMemoryPaymentGateway::new();
        let locations = gateway
            .list_locations(BillingCountry::UnitedStates)
            .await
            .unwrap();
        assert_eq!(locations.len(), 2);
        assert!(locations.iter().all(ProcessorLocation::can_process_cards));
    }

    #[tokio::test]
    async fn test_charge_capture() {
        let gateway = InMemoryPaymentGateway::new();
        let outcome = gateway
            .charge(charge_request(charge_key(LedgerId::new())))
            .await
            .unwrap();
        assert!(outcome.provider_ref.starts_with("CHG-"));
        assert_eq!(outcome.status, "CAPTURED");
        assert_eq!(gateway.captured_count(), 1);
    }

    #[tokio::test]
    async fn test_repeated_key_deduplicates() {
        let gateway = InMemoryPaymentGateway::new();
        let key = charge_key(LedgerId::new());

        let first = gateway.charge(charge_request(key)).await.unwrap();
        let second = gateway.charge(charge_request(key)).await.unwrap();

        assert_eq!(first.provider_ref, second.provider_ref);
        assert_eq!(gateway.captured_count(), 1);
        assert_eq!(gateway.charge_attempts(), 2);
    }

    #[tokio::test]
    async fn test_decline() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.set_decline("insufficient funds");

        let err = gateway
            .charge(charge_request(charge_key(LedgerId::new())))
            .await
            .unwrap_err();
        assert!(matches!(err, FulfillmentError::PaymentDeclined { .. }));
        assert_eq!(gateway.captured_count(), 0);
    }

    #[tokio::test]
    async fn test_list_failure_is_transient() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.set_fail_on_list(true);

        let err = gateway
            .list_locations(BillingCountry::Japan)
            .await
            .unwrap_err();
        assert!(matches!(err, FulfillmentError::UpstreamUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_strip_card_capability() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.strip_card_capability(BillingCountry::UnitedStates.location_name());

        let locations = gateway
            .list_locations(BillingCountry::UnitedStates)
            .await
            .unwrap();
        let us = locations
            .iter()
            .find(|l| l.name == BillingCountry::UnitedStates.location_name())
            .unwrap();
        assert!(!us.can_process_cards());
    }
}
