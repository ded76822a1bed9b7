//! Value objects for the order domain.

use serde::{Deserialize, Serialize};

/// Product identifier (SKU).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a new product ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the product ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Currency the payment processor charges in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "JPY")]
    Jpy,
}

impl Currency {
    /// ISO 4217 currency code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Jpy => "JPY",
        }
    }

    /// Returns true if the currency has no fractional minor unit.
    ///
    /// Zero-decimal currencies are charged in whole units; fractional
    /// currencies are charged in hundredths.
    pub fn is_zero_decimal(&self) -> bool {
        matches!(self, Currency::Jpy)
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Billing country chosen at checkout. Determines the processor account,
/// the processing location, and the charge currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BillingCountry {
    #[serde(rename = "US")]
    UnitedStates,
    #[serde(rename = "JP")]
    Japan,
}

impl BillingCountry {
    /// The currency charged for this billing country.
    pub fn currency(&self) -> Currency {
        match self {
            BillingCountry::UnitedStates => Currency::Usd,
            BillingCountry::Japan => Currency::Jpy,
        }
    }

    /// Display name of the processor location configured for this country.
    pub fn location_name(&self) -> &'static str {
        match self {
            BillingCountry::UnitedStates => "Kasumi Trading US",
            BillingCountry::Japan => "Kasumi Trading Japan",
        }
    }

    /// Two-letter country code.
    pub fn code(&self) -> &'static str {
        match self {
            BillingCountry::UnitedStates => "US",
            BillingCountry::Japan => "JP",
        }
    }
}

impl std::fmt::Display for BillingCountry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Customer-facing locale, used for invoice rendering and CRM tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Locale {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ja")]
    Japanese,
}

impl Locale {
    /// Language tag for CRM segmentation.
    pub fn tag(&self) -> &'static str {
        match self {
            Locale::English => "en",
            Locale::Japanese => "ja",
        }
    }
}

/// One cart line: a product and the quantity purchased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CartItem {
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Tax snapshot taken at submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TaxBreakdown {
    pub city: i64,
    pub state: i64,
    pub total: i64,
}

/// Discounts applied to the order, as reported by the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Discount {
    /// Quantity discount applied.
    pub qty: bool,
    pub qty_amount: Option<String>,
    /// First-registration discount applied.
    pub register: bool,
    pub register_amount: Option<String>,
}

/// Requested totals, as decimal strings straight from the order form.
///
/// Totals stay strings until charge composition so the ledger records
/// exactly what the customer was shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub sub_total: String,
    pub tax: String,
    pub grand_total: String,
    #[serde(default)]
    pub discount: Discount,
}

/// Billing address fields required by the payment processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingInfo {
    pub country: BillingCountry,
    pub city: String,
    pub prefecture: String,
}

/// Non-sensitive card information plus the single-use charge nonce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInfo {
    pub name_on_card: String,
    pub last4: u16,
    pub nonce: String,
}

/// Where the order ships, as collected from the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDestination {
    pub given_name: String,
    pub family_name: String,
    pub email: String,
    pub postal_code: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub prefecture: String,
    pub country: String,
    pub phone: String,
}

/// A composed charge: integer amount in the currency's minor unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeAmount {
    pub amount: i64,
    pub currency: Currency,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_id_string_conversion() {
        let id = ProductId::new("SKU-001");
        assert_eq!(id.as_str(), "SKU-001");

        let id2: ProductId = "SKU-002".into();
        assert_eq!(id2.as_str(), "SKU-002");
    }

    #[test]
    fn test_currency_codes() {
        assert_eq!(Currency::Usd.code(), "USD");
        assert_eq!(Currency::Jpy.code(), "JPY");
    }

    #[test]
    fn test_zero_decimal_currencies() {
        assert!(!Currency::Usd.is_zero_decimal());
        assert!(Currency::Jpy.is_zero_decimal());
    }

    #[test]
    fn test_billing_country_currency() {
        assert_eq!(BillingCountry::UnitedStates.currency(), Currency::Usd);
        assert_eq!(BillingCountry::Japan.currency(), Currency::Jpy);
    }

    #[test]
    fn test_billing_country_location_names_differ() {
        assert_ne!(
            BillingCountry::UnitedStates.location_name(),
            BillingCountry::Japan.location_name()
        );
    }

    #[test]
    fn test_billing_country_serialization() {
        let json = serde_json::to_string(&BillingCountry::UnitedStates).unwrap();
        assert_eq!(json, "\"US\"");
        let country: BillingCountry = serde_json::from_str("\"JP\"").unwrap();
        assert_eq!(country, BillingCountry::Japan);
    }

    #[test]
    fn test_locale_serialization() {
        let json = serde_json::to_string(&Locale::Japanese).unwrap();
        assert_eq!(json, "\"ja\"");
        assert_eq!(Locale::default(), Locale::English);
    }

    #[test]
    fn test_cart_item_serialization_roundtrip() {
        let item = CartItem::new("SKU-001", 2);
        let json = serde_json::to_string(&item).unwrap();
        let deserialized: CartItem = serde_json::from_str(&json).unwrap();
        assert_eq!(item, deserialized);
    }

    #[test]
    fn test_totals_default_discount() {
        let json = r#"{"sub_total":"45.00","tax":"4.98","grand_total":"49.98"}"#;
        let totals: OrderTotals = serde_json::from_str(json).unwrap();
        assert!(!totals.discount.qty);
        assert!(totals.discount.qty_amount.is_none());
    }
}
