//! Order fulfillment orchestration.
//!
//! This crate drives a submitted order through a chain of independently
//! owned external systems — payment capture, CRM lead sync, shipping
//! export, invoice rendering, and inventory accounting — none of which
//! share a transactional boundary.
//!
//! The orchestrator owns the step ordering and the failure policy:
//! 1. Intake fan-out: ledger persistence, profile contact update,
//!    processor location resolution
//! 2. Card charge against the resolved location (hard-fails the saga)
//! 3. Post-charge fan-out: history update, lead check, shipment export,
//!    then invoice render + lead create-or-update + ledger update
//! 4. Shipment handoff confirmation
//! 5. Best-effort per-product inventory mutation
//!
//! There is no automatic compensation: a hard failure after capture is
//! surfaced with the accumulated state, and reconciliation is an
//! operational process outside this crate.

pub mod error;
pub mod idempotency;
pub mod invoice;
pub mod location;
pub mod orchestrator;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ErrorEnvelope, FulfillmentError, Severity};
pub use idempotency::charge_key;
pub use invoice::render_invoice;
pub use location::resolve_location;
pub use orchestrator::{CheckoutOutcome, FulfillmentOrchestrator};
pub use services::{
    CARD_PROCESSING, ChargeOutcome, ChargeRequest, CrmApi, CrmStore, HandoffAck, InMemoryCrmApi,
    InMemoryCrmStore, InMemoryLedgerStore, InMemoryPaymentGateway, InMemoryProductStore,
    InMemoryShippingService, InMemoryUserStore, InventoryCounter, InventoryReport, Lead,
    LeadSyncOutcome, LeadSyncReport, LedgerStore, PaymentGateway, ProcessorLocation, ProductStore,
    ShipmentHandle, ShipmentRecord, ShippingService, UserProfile, UserStore,
};

/// Orchestrator wired entirely to the in-memory collaborators.
pub type InMemoryOrchestrator = FulfillmentOrchestrator<
    InMemoryPaymentGateway,
    InMemoryUserStore,
    InMemoryCrmStore,
    InMemoryCrmApi,
    InMemoryShippingService,
    InMemoryProductStore,
    InMemoryLedgerStore,
>;
