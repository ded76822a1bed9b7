//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fulfillment::{ErrorEnvelope, FulfillmentError};

/// API-level error type that maps to HTTP responses.
///
/// Every response body is the wire error envelope `{hard, soft, message}`;
/// the status code carries the HTTP-level classification.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Fulfillment failure surfaced before any money was taken.
    Fulfillment(FulfillmentError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, envelope) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorEnvelope::hard(msg)),
            ApiError::Fulfillment(err) => fulfillment_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorEnvelope::hard(msg))
            }
        };

        (status, axum::Json(envelope)).into_response()
    }
}

fn fulfillment_error_to_response(err: FulfillmentError) -> (StatusCode, ErrorEnvelope) {
    let status = match &err {
        FulfillmentError::Domain(_) => StatusCode::BAD_REQUEST,
        FulfillmentError::PaymentDeclined { .. } => StatusCode::PAYMENT_REQUIRED,
        FulfillmentError::UpstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        FulfillmentError::LocationNotFound
        | FulfillmentError::CapabilityMissing { .. }
        | FulfillmentError::PaymentGateway(_)
        | FulfillmentError::ShippingExportFailed { .. } => StatusCode::BAD_GATEWAY,
        FulfillmentError::LedgerStore(_)
        | FulfillmentError::ProfileStore(_)
        | FulfillmentError::LeadSync(_)
        | FulfillmentError::InvoiceRender(_)
        | FulfillmentError::InventoryUpdate { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, ErrorEnvelope::from(&err))
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        ApiError::Fulfillment(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declined_charge_maps_to_402() {
        let (status, envelope) = fulfillment_error_to_response(FulfillmentError::PaymentDeclined {
            reason: "card expired".to_string(),
        });
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert!(envelope.hard);
    }

    #[test]
    fn test_location_not_found_maps_to_502() {
        let (status, envelope) = fulfillment_error_to_response(FulfillmentError::LocationNotFound);
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(
            envelope.message,
            "Did not find requested location in processor locations."
        );
    }

    #[test]
    fn test_validation_maps_to_400() {
        let (status, _) = fulfillment_error_to_response(FulfillmentError::Domain(
            domain::DomainError::EmptyCart,
        ));
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
