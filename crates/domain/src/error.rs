//! Domain error types.

use thiserror::Error;

use crate::ledger::LedgerStatus;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Grand total could not be turned into a charge amount.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Order form arrived with an empty cart.
    #[error("Order has no items")]
    EmptyCart,

    /// A cart line has a zero quantity.
    #[error("Invalid quantity for product {product_id} (must be greater than 0)")]
    InvalidQuantity { product_id: String },

    /// No shipping email was provided.
    #[error("Shipping email is required")]
    MissingEmail,

    /// The customer did not accept the terms of sale.
    #[error("Terms of sale must be accepted")]
    TermsNotAccepted,

    /// Ledger is not in the expected status for the attempted step.
    #[error("Invalid status transition: cannot {action} from {current} status")]
    InvalidStatusTransition {
        current: LedgerStatus,
        action: &'static str,
    },

    /// A payment charge was already recorded for this ledger.
    #[error("Payment charge already recorded for this ledger")]
    ChargeAlreadyRecorded,
}
