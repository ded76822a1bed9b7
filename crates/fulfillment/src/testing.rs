//! Shared fixtures for unit tests in this crate.

use common::UserId;
use domain::{
    BillingCountry, BillingInfo, CardInfo, CartItem, Discount, Locale, OrderRequest, OrderTotals,
    ShippingDestination, TaxBreakdown,
};

/// A valid US order form with a single two-unit cart line.
pub fn order_request() -> OrderRequest {
    OrderRequest {
        user_id: UserId::new(),
        cart: vec![CartItem::new("P1", 2)],
        taxes: TaxBreakdown {
            city: 2,
            state: 6,
            total: 8,
        },
        totals: OrderTotals {
            sub_total: "45.00".to_string(),
            tax: "4.98".to_string(),
            grand_total: "49.98".to_string(),
            discount: Discount::default(),
        },
        billing: BillingInfo {
            country: BillingCountry::UnitedStates,
            city: "Portland".to_string(),
            prefecture: "OR".to_string(),
        },
        card: CardInfo {
            name_on_card: "Aiko Tanaka".to_string(),
            last4: 4242,
            nonce: "cnon-test-ok".to_string(),
        },
        shipping: ShippingDestination {
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
        fx_rate: None,
        locale: Locale::English,
        newsletter_opt_in: true,
        terms_accepted: true,
        comments: None,
    }
}
