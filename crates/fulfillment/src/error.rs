//! Fulfillment error taxonomy and the wire error envelope.

use domain::DomainError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a fulfillment failure.
///
/// Hard failures are terminal: the saga stops mutating and the failure is
/// surfaced verbatim. Soft failures are annotated on the result and the
/// saga continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Hard,
    Soft,
}

/// Errors that can occur while driving an order through fulfillment.
///
/// Transient upstream failures are classified at the step where they
/// occur: a lookup failure before the charge is hard (charging cannot
/// proceed), while the same class of failure inside the lead-sync or
/// invoice branch is wrapped into the step's soft variant instead.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// Order form or ledger-state violation.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// No processor location matches the configured display name.
    #[error("Did not find requested location in processor locations.")]
    LocationNotFound,

    /// The processor location cannot take card payments.
    #[error("Location \"{location}\" does not have permission \"CREDIT_CARD_PROCESSING\".")]
    CapabilityMissing { location: String },

    /// A collaborator call failed transiently.
    #[error("Upstream unavailable: {context}")]
    UpstreamUnavailable { context: String },

    /// The processor declined the charge; carries the user-readable reason.
    #[error("Payment declined: {reason}")]
    PaymentDeclined { reason: String },

    /// Opaque processor failure while submitting the charge.
    #[error("Payment gateway error: {0}")]
    PaymentGateway(String),

    /// Shipment export or handoff was not accepted. Occurs after capture,
    /// so accumulated ledger/user state is still returned.
    #[error("Was not able to complete the order: {detail}")]
    ShippingExportFailed { detail: String },

    /// Ledger persistence failure.
    #[error("Ledger store error: {0}")]
    LedgerStore(String),

    /// User profile store failure.
    #[error("Profile store error: {0}")]
    ProfileStore(String),

    /// CRM write failure (soft: reported, never aborts the branch).
    #[error("Lead sync error: {0}")]
    LeadSync(String),

    /// Invoice rendering failure (soft).
    #[error("Invoice rendering error: {0}")]
    InvoiceRender(String),

    /// Per-product counter mutation failure (soft, best-effort).
    #[error("Inventory update failed for {product_id}: {detail}")]
    InventoryUpdate { product_id: String, detail: String },
}

impl FulfillmentError {
    /// Hard/soft classification per the failure policy.
    pub fn severity(&self) -> Severity {
        match self {
            FulfillmentError::LeadSync(_)
            | FulfillmentError::InvoiceRender(_)
            | FulfillmentError::InventoryUpdate { .. } => Severity::Soft,
            _ => Severity::Hard,
        }
    }

    pub fn is_hard(&self) -> bool {
        self.severity() == Severity::Hard
    }

    pub fn is_soft(&self) -> bool {
        self.severity() == Severity::Soft
    }
}

/// The only error shape that crosses the API boundary.
///
/// Mirrors the storefront contract: both flags false with an empty message
/// means no error; `soft` carries annotations on an otherwise returned
/// result; `hard` flags a terminal failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub hard: bool,
    pub soft: bool,
    pub message: String,
}

impl ErrorEnvelope {
    /// The all-clear envelope.
    pub fn none() -> Self {
        Self {
            hard: false,
            soft: false,
            message: String::new(),
        }
    }

    /// A hard-failure envelope.
    pub fn hard(message: impl Into<String>) -> Self {
        Self {
            hard: true,
            soft: false,
            message: message.into(),
        }
    }

    /// A soft-annotation envelope.
    pub fn soft(message: impl Into<String>) -> Self {
        Self {
            hard: false,
            soft: true,
            message: message.into(),
        }
    }

    /// Builds the envelope for a list of accumulated soft-error notes.
    pub fn from_soft_notes(notes: &[String]) -> Self {
        if notes.is_empty() {
            Self::none()
        } else {
            Self::soft(notes.join("; "))
        }
    }

    pub fn is_none(&self) -> bool {
        !self.hard && !self.soft
    }
}

impl From<&FulfillmentError> for ErrorEnvelope {
    fn from(err: &FulfillmentError) -> Self {
        match err.severity() {
            Severity::Hard => Self::hard(err.to_string()),
            Severity::Soft => Self::soft(err.to_string()),
        }
    }
}

/// Convenience type alias for fulfillment results.
pub type Result<T> = std::result::Result<T, FulfillmentError>;
