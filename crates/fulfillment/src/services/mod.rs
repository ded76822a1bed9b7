//! Collaborator traits and in-memory implementations for the saga steps.

pub mod crm;
pub mod inventory;
pub mod ledger_store;
pub mod payment;
pub mod profile;
pub mod shipping;

pub use crm::{
    CrmApi, CrmStore, InMemoryCrmApi, InMemoryCrmStore, Lead, LeadSyncOutcome, LeadSyncReport,
    api_tags, mirror_tags, sync_lead,
};
pub use inventory::{
    InMemoryProductStore, InventoryCounter, InventoryReport, ProductStore, apply_purchases,
};
pub use ledger_store::{InMemoryLedgerStore, LedgerStore};
pub use payment::{
    CARD_PROCESSING, ChargeOutcome, ChargeRequest, InMemoryPaymentGateway, PaymentGateway,
    ProcessorLocation,
};
pub use profile::{InMemoryUserStore, UserProfile, UserStore};
pub use shipping::{
    HandoffAck, InMemoryShippingService, ShipmentHandle, ShipmentRecord, ShippingService,
};
