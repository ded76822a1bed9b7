//! The transaction ledger and its status state machine.

use chrono::{DateTime, Utc};
use common::{LedgerId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::order::OrderRequest;
use crate::value_objects::{CartItem, Currency, Locale, OrderTotals, TaxBreakdown};

/// Status of a checkout attempt in its lifecycle.
///
/// Status transitions:
/// ```text
/// Intake ──► LocationResolved ──► Charging ──► Charged ──► PostChargeSync
///    │              │                │                          │
///    │              │                │                          ▼
///    │              │                │                   ShippingHandoff ──► InventorySync ──┬──► Complete
///    │              │                │                          │                            └──► FailedSoft
///    └──────────────┴────────────────┴──────────────────────────┴──► FailedHard
/// ```
///
/// `FailedSoft` is terminal but the accumulated result is still returned to
/// the caller, annotated with the soft errors collected along the way.
/// `FailedHard` is terminal with no further mutation attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LedgerStatus {
    /// Order form accepted, ledger opened, intake fan-out in flight.
    #[default]
    Intake,

    /// Processor location resolved and verified for card processing.
    LocationResolved,

    /// Charge submission in flight.
    Charging,

    /// Payment captured. The charge sub-record is frozen from here on.
    Charged,

    /// Post-charge fan-out in flight (history, CRM, shipment export).
    PostChargeSync,

    /// Awaiting shipment acceptance from the fulfillment service.
    ShippingHandoff,

    /// Best-effort per-product counter mutation in flight.
    InventorySync,

    /// All steps done (terminal).
    Complete,

    /// Finished with soft errors recorded; result still returned (terminal).
    FailedSoft,

    /// Hard failure; no further mutation attempted (terminal).
    FailedHard,
}

impl LedgerStatus {
    /// Returns true if location resolution may run in this status.
    pub fn can_resolve_location(&self) -> bool {
        matches!(self, LedgerStatus::Intake)
    }

    /// Returns true if a charge may be submitted in this status.
    pub fn can_charge(&self) -> bool {
        matches!(self, LedgerStatus::LocationResolved)
    }

    /// Returns true if the post-charge fan-out may start in this status.
    pub fn can_sync_post_charge(&self) -> bool {
        matches!(self, LedgerStatus::Charged)
    }

    /// Returns true if the shipping handoff may be confirmed in this status.
    pub fn can_confirm_handoff(&self) -> bool {
        matches!(self, LedgerStatus::PostChargeSync)
    }

    /// Returns true if inventory mutation may start in this status.
    pub fn can_sync_inventory(&self) -> bool {
        matches!(self, LedgerStatus::ShippingHandoff)
    }

    /// Returns true if the ledger may finish in this status.
    pub fn can_complete(&self) -> bool {
        matches!(self, LedgerStatus::InventorySync)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LedgerStatus::Complete | LedgerStatus::FailedSoft | LedgerStatus::FailedHard
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerStatus::Intake => "Intake",
            LedgerStatus::LocationResolved => "LocationResolved",
            LedgerStatus::Charging => "Charging",
            LedgerStatus::Charged => "Charged",
            LedgerStatus::PostChargeSync => "PostChargeSync",
            LedgerStatus::ShippingHandoff => "ShippingHandoff",
            LedgerStatus::InventorySync => "InventorySync",
            LedgerStatus::Complete => "Complete",
            LedgerStatus::FailedSoft => "FailedSoft",
            LedgerStatus::FailedHard => "FailedHard",
        }
    }
}

impl std::fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The captured charge, recorded once and never altered afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCharge {
    /// Amount in the currency's minor unit.
    pub amount: i64,
    pub currency: Currency,
    /// Charge reference assigned by the processor.
    pub provider_ref: String,
    /// Processor-reported charge status.
    pub status: String,
}

/// Durable record of one checkout attempt.
///
/// Opened at saga start and mutated in place as steps complete; each
/// completed step contributes its cross-system reference. Never deleted,
/// only transitioned to a terminal status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionLedger {
    id: LedgerId,
    user_id: UserId,
    products: Vec<CartItem>,
    taxes: TaxBreakdown,
    totals: OrderTotals,
    locale: Locale,
    email: String,
    status: LedgerStatus,
    payment: Option<PaymentCharge>,
    shipment_ref: Option<String>,
    lead_ref: Option<String>,
    invoice_body: Option<String>,
    soft_errors: Vec<String>,
    created_at: DateTime<Utc>,
}

impl TransactionLedger {
    /// Opens a ledger for a validated order request.
    pub fn open(id: LedgerId, order: &OrderRequest) -> Self {
        Self {
            id,
            user_id: order.user_id,
            products: order.cart.clone(),
            taxes: order.taxes,
            totals: order.totals.clone(),
            locale: order.locale,
            email: order.shipping.email.clone(),
            status: LedgerStatus::Intake,
            payment: None,
            shipment_ref: None,
            lead_ref: None,
            invoice_body: None,
            soft_errors: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Marks the processor location as resolved.
    pub fn mark_location_resolved(&mut self) -> Result<(), DomainError> {
        self.transition(LedgerStatus::LocationResolved, "resolve location", |s| {
            s.can_resolve_location()
        })
    }

    /// Marks the charge submission as in flight.
    pub fn mark_charging(&mut self) -> Result<(), DomainError> {
        self.transition(LedgerStatus::Charging, "charge", |s| s.can_charge())
    }

    /// Records the captured charge. Rejects a second charge for the same
    /// ledger; the charge sub-record is immutable once written.
    pub fn record_charge(&mut self, charge: PaymentCharge) -> Result<(), DomainError> {
        if self.payment.is_some() {
            return Err(DomainError::ChargeAlreadyRecorded);
        }
        if self.status != LedgerStatus::Charging {
            return Err(DomainError::InvalidStatusTransition {
                current: self.status,
                action: "record charge",
            });
        }
        self.payment = Some(charge);
        self.status = LedgerStatus::Charged;
        Ok(())
    }

    /// Marks the post-charge fan-out as started.
    pub fn mark_post_charge_sync(&mut self) -> Result<(), DomainError> {
        self.transition(LedgerStatus::PostChargeSync, "sync post-charge", |s| {
            s.can_sync_post_charge()
        })
    }

    /// Marks the shipment handoff as started.
    pub fn mark_shipping_handoff(&mut self) -> Result<(), DomainError> {
        self.transition(LedgerStatus::ShippingHandoff, "confirm handoff", |s| {
            s.can_confirm_handoff()
        })
    }

    /// Marks the inventory fan-out as started.
    pub fn mark_inventory_sync(&mut self) -> Result<(), DomainError> {
        self.transition(LedgerStatus::InventorySync, "sync inventory", |s| {
            s.can_sync_inventory()
        })
    }

    /// Finishes the ledger: `Complete` when clean, `FailedSoft` when soft
    /// errors were recorded along the way.
    pub fn finish(&mut self) -> Result<(), DomainError> {
        if !self.status.can_complete() {
            return Err(DomainError::InvalidStatusTransition {
                current: self.status,
                action: "complete",
            });
        }
        self.status = if self.soft_errors.is_empty() {
            LedgerStatus::Complete
        } else {
            LedgerStatus::FailedSoft
        };
        Ok(())
    }

    /// Transitions to the absorbing hard-failure status. Valid from any
    /// non-terminal status; accumulated references are kept.
    pub fn fail_hard(&mut self) {
        if !self.status.is_terminal() {
            self.status = LedgerStatus::FailedHard;
        }
    }

    /// Records the shipment reference produced by the export step.
    pub fn set_shipment_ref(&mut self, reference: impl Into<String>) {
        self.shipment_ref = Some(reference.into());
    }

    /// Records the CRM lead reference.
    pub fn set_lead_ref(&mut self, reference: impl Into<String>) {
        self.lead_ref = Some(reference.into());
    }

    /// Records the rendered invoice body.
    pub fn set_invoice_body(&mut self, body: impl Into<String>) {
        self.invoice_body = Some(body.into());
    }

    /// Appends a soft-error note visible on the final response.
    pub fn note_soft_error(&mut self, note: impl Into<String>) {
        self.soft_errors.push(note.into());
    }

    fn transition(
        &mut self,
        next: LedgerStatus,
        action: &'static str,
        allowed: impl Fn(&LedgerStatus) -> bool,
    ) -> Result<(), DomainError> {
        if !allowed(&self.status) {
            return Err(DomainError::InvalidStatusTransition {
                current: self.status,
                action,
            });
        }
        self.status = next;
        Ok(())
    }
}

// Query methods
impl TransactionLedger {
    pub fn id(&self) -> LedgerId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn products(&self) -> &[CartItem] {
        &self.products
    }

    pub fn taxes(&self) -> TaxBreakdown {
        self.taxes
    }

    pub fn totals(&self) -> &OrderTotals {
        &self.totals
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn status(&self) -> LedgerStatus {
        self.status
    }

    pub fn payment(&self) -> Option<&PaymentCharge> {
        self.payment.as_ref()
    }

    pub fn shipment_ref(&self) -> Option<&str> {
        self.shipment_ref.as_deref()
    }

    pub fn lead_ref(&self) -> Option<&str> {
        self.lead_ref.as_deref()
    }

    pub fn invoice_body(&self) -> Option<&str> {
        self.invoice_body.as_deref()
    }

    pub fn soft_errors(&self) -> &[String] {
        &self.soft_errors
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
