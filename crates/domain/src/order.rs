//! The normalized order form accepted at saga entry.

use common::UserId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::{
    BillingInfo, CardInfo, CartItem, Locale, OrderTotals, ShippingDestination, TaxBreakdown,
};

/// Normalized input to the fulfillment saga.
///
/// Constructed once when the order form is submitted and immutable
/// thereafter; every step reads from the same snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub user_id: UserId,
    pub cart: Vec<CartItem>,
    pub taxes: TaxBreakdown,
    pub totals: OrderTotals,
    pub billing: BillingInfo,
    pub card: CardInfo,
    pub shipping: ShippingDestination,
    /// FX rate applied when the billing currency is zero-decimal.
    pub fx_rate: Option<Decimal>,
    #[serde(default)]
    pub locale: Locale,
    #[serde(default)]
    pub newsletter_opt_in: bool,
    pub terms_accepted: bool,
    #[serde(default)]
    pub comments: Option<String>,
}

impl OrderRequest {
    /// Validates the order form before a ledger is opened for it.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.cart.is_empty() {
            return Err(DomainError::EmptyCart);
        }
        for item in &self.cart {
            if item.quantity == 0 {
                return Err(DomainError::InvalidQuantity {
                    product_id: item.product_id.to_string(),
                });
            }
        }
        if self.shipping.email.trim().is_empty() {
            return Err(DomainError::MissingEmail);
        }
        if !self.terms_accepted {
            return Err(DomainError::TermsNotAccepted);
        }
        Ok(())
    }
}
