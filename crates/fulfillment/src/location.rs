//! Processor location resolution.

use domain::BillingCountry;

use crate::error::FulfillmentError;
use crate::services::payment::{PaymentGateway, ProcessorLocation};

/// Resolves the payment-processing location for a billing country.
///
/// Lists the processor's locations, picks the one matching the country's
/// configured display name, and verifies it can take card payments. No
/// retries; the caller decides what a transient lookup failure means at
/// its step.
pub async fn resolve_location<G: PaymentGateway>(
    gateway: &G,
    country: BillingCountry,
) -> Result<ProcessorLocation, FulfillmentError> {
    let locations = gateway.list_locations(country).await?;

    let location = locations
        .into_iter()
        .find(|l| l.name == country.location_name())
        .ok_or(FulfillmentError::LocationNotFound)?;

    if !location.can_process_cards() {
        return Err(FulfillmentError::CapabilityMissing {
            location: location.name,
        });
    }

    tracing::debug!(location_id = %location.id, %country, "processor location resolved");
    Ok(location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::payment::InMemoryPaymentGateway;

    #[tokio::test]
    async fn test_resolves_matching_location() {
        let gateway = InMemoryPaymentGateway::new();
        let location = resolve_location(&gateway, BillingCountry::Japan)
            .await
            .unwrap();
        assert_eq!(location.name, BillingCountry::Japan.location_name());
    }

    #[tokio::test]
    async fn test_missing_location_is_hard() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.set_locations(Vec::new());

        let err = resolve_location(&gateway, BillingCountry::UnitedStates)
            .await
            .unwrap_err();
        assert!(matches!(err, FulfillmentError::LocationNotFound));
        assert!(err.is_hard());
    }

    #[tokio::test]
    async fn test_missing_capability_is_hard() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.strip_card_capability(BillingCountry::UnitedStates.location_name());

        let err = resolve_location(&gateway, BillingCountry::UnitedStates)
            .await
            .unwrap_err();
        assert!(matches!(err, FulfillmentError::CapabilityMissing { .. }));
        assert!(
            err.to_string().contains("CREDIT_CARD_PROCESSING"),
            "message names the missing capability: {err}"
        );
    }

    #[tokio::test]
    async fn test_lookup_failure_propagates_unretried() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.set_fail_on_list(true);

        let err = resolve_location(&gateway, BillingCountry::Japan)
            .await
            .unwrap_err();
        assert!(matches!(err, FulfillmentError::UpstreamUnavailable { .. }));
    }
}
