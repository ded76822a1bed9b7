//! Shipping exporter trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{LedgerId, UserId};
use domain::{CartItem, OrderTotals, ShippingDestination};

use crate::error::FulfillmentError;

/// Shipment handed to the external fulfillment/customs service,
/// correlated by ledger id.
#[derive(Debug, Clone)]
pub struct ShipmentRecord {
    pub ledger_id: LedgerId,
    pub user_id: UserId,
    pub destination: ShippingDestination,
    pub items: Vec<CartItem>,
    pub totals: OrderTotals,
}

/// Reference assigned when the shipment record is accepted.
#[derive(Debug, Clone)]
pub struct ShipmentHandle {
    pub reference: String,
}

/// Acknowledgement from the final handoff call.
#[derive(Debug, Clone)]
pub struct HandoffAck {
    pub status: u16,
    pub body: String,
}

impl HandoffAck {
    /// Returns true for a 2xx acknowledgement.
    pub fn accepted(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for the external shipping/customs service.
#[async_trait]
pub trait ShippingService: Send + Sync {
    /// Builds and submits the shipment record; returns its reference.
    async fn export_shipment(
        &self,
        record: ShipmentRecord,
    ) -> Result<ShipmentHandle, FulfillmentError>;

    /// Final handoff confirming the shipment for dispatch.
    async fn confirm_handoff(
        &self,
        user_id: UserId,
        shipment_ref: &str,
        ledger_id: LedgerId,
    ) -> Result<HandoffAck, FulfillmentError>;
}

#[derive(Debug)]
struct InMemoryShippingState {
    shipments: HashMap<String, ShipmentRecord>,
    confirmed: Vec<String>,
    next_id: u32,
    fail_on_export: bool,
    handoff_status: u16,
}

impl Default for InMemoryShippingState {
    fn default() -> Self {
        Self {
            shipments: HashMap::new(),
            confirmed: Vec::new(),
            next_id: 0,
            fail_on_export: false,
            handoff_status: 200,
        }
    }
}

/// In-memory shipping service for tests and default wiring.
#[derive(Debug, Clone, Default)]
pub struct InMemoryShippingService {
    state: Arc<RwLock<InMemoryShippingState>>,
}

impl InMemoryShippingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the export call to fail.
    pub fn set_fail_on_export(&self, fail: bool) {
        self.state.write().unwrap().fail_on_export = fail;
    }

    /// Configures the status code returned by the handoff call.
    pub fn set_handoff_status(&self, status: u16) {
        self.state.write().unwrap().handoff_status = status;
    }

    /// Number of exported shipment records.
    pub fn export_count(&self) -> usize {
        self.state.read().unwrap().shipments.len()
    }

    /// Number of confirmed handoffs.
    pub fn confirmed_count(&self) -> usize {
        self.state.read().unwrap().confirmed.len()
    }

    /// The exported record for a shipment reference.
    pub fn shipment(&self, reference: &str) -> Option<ShipmentRecord> {
        self.state.read().unwrap().shipments.get(reference).cloned()
    }
}

#[async_trait]
impl ShippingService for InMemoryShippingService {
    async fn export_shipment(
        &self,
        record: ShipmentRecord,
    ) -> Result<ShipmentHandle, FulfillmentError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_export {
            return Err(FulfillmentError::ShippingExportFailed {
                detail: "shipment export rejected".to_string(),
            });
        }
        state.next_id += 1;
        let reference = format!("SHIP-{:04}", state.next_id);
        state.shipments.insert(reference.clone(), record);
        Ok(ShipmentHandle { reference })
    }

    async fn confirm_handoff(
        &self,
        _user_id: UserId,
        shipment_ref: &str,
        _ledger_id: LedgerId,
    ) -> Result<HandoffAck, FulfillmentError> {
        let mut state = self.state.write().unwrap();
        let status = state.handoff_status;
        if status == 200 {
            state.confirmed.push(shipment_ref.to_string());
        }
        Ok(HandoffAck {
            status,
            body: if status == 200 {
                "accepted".to_string()
            } else {
                "rejected by carrier".to_string()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Discount;

    fn record() -> ShipmentRecord {
        ShipmentRecord {
            ledger_id: LedgerId::new(),
            user_id: UserId::new(),
            destination: ShippingDestination {
                given_name: "Aiko".to_string(),
                family_name: "Tanaka".to_string(),
                email: "aiko@example.com".to_string(),
                postal_code: "1500001".to_string(),
                address_line1: "1-2-3 Jingumae".to_string(),
                address_line2: "Shibuya".to_string(),
                city: "Tokyo".to_string(),
                prefecture: "Tokyo".to_string(),
                country: "JP".to_string(),
                phone: "0312345678".to_string(),
            },
            items: vec![CartItem::new("P1", 2)],
            totals: OrderTotals {
                sub_total: "45.00".to_string(),
                tax: "4.98".to_string(),
                grand_total: "49.98".to_string(),
                discount: Discount::default(),
            },
        }
    }

    #[tokio::test]
    async fn test_export_assigns_reference() {
        let service = InMemoryShippingService::new();
        let handle = service.export_shipment(record()).await.unwrap();
        assert!(handle.reference.starts_with("SHIP-"));
        assert_eq!(service.export_count(), 1);
        assert!(service.shipment(&handle.reference).is_some());
    }

    #[tokio::test]
    async fn test_export_failure() {
        let service = InMemoryShippingService::new();
        service.set_fail_on_export(true);

        let err = service.export_shipment(record()).await.unwrap_err();
        assert!(matches!(
            err,
            FulfillmentError::ShippingExportFailed { .. }
        ));
        assert_eq!(service.export_count(), 0);
    }

    #[tokio::test]
    async fn test_handoff_acceptance() {
        let service = InMemoryShippingService::new();
        let handle = service.export_shipment(record()).await.unwrap();

        let ack = service
            .confirm_handoff(UserId::new(), &handle.reference, LedgerId::new())
            .await
            .unwrap();
        assert!(ack.accepted());
        assert_eq!(service.confirmed_count(), 1);
    }

    #[tokio::test]
    async fn test_handoff_rejection() {
        let service = InMemoryShippingService::new();
        service.set_handoff_status(502);
        let handle = service.export_shipment(record()).await.unwrap();

        let ack = service
            .confirm_handoff(UserId::new(), &handle.reference, LedgerId::new())
            .await
            .unwrap();
        assert!(!ack.accepted());
        assert_eq!(service.confirmed_count(), 0);
    }
}
