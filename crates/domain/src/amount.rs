//! Charge amount composition.
//!
//! Converts the decimal grand total submitted with the order form into the
//! integer minor-unit amount the payment processor expects, applying the
//! FX rate for zero-decimal billing countries.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::DomainError;
use crate::value_objects::{BillingCountry, ChargeAmount};

/// Composes the processor charge amount for a billing country.
///
/// US totals are parsed directly into integer cents; Japanese totals are
/// converted at the supplied FX rate and rounded to whole yen. Both paths
/// round half away from zero, matching what the customer was shown.
pub fn compose_charge_amount(
    country: BillingCountry,
    grand_total: &str,
    fx_rate: Option<Decimal>,
) -> Result<ChargeAmount, DomainError> {
    let total: Decimal = grand_total
        .trim()
        .parse()
        .map_err(|_| DomainError::InvalidAmount(format!("unparseable grand total {grand_total:?}")))?;

    if total <= Decimal::ZERO {
        return Err(DomainError::InvalidAmount(format!(
            "grand total must be positive, got {total}"
        )));
    }

    let currency = country.currency();
    let minor_units = if currency.is_zero_decimal() {
        let rate = fx_rate.ok_or_else(|| {
            DomainError::InvalidAmount(format!("FX rate required for {} billing", country.code()))
        })?;
        if rate <= Decimal::ZERO {
            return Err(DomainError::InvalidAmount(format!(
                "FX rate must be positive, got {rate}"
            )));
        }
        total * rate
    } else {
        total * Decimal::ONE_HUNDRED
    };

    let amount = minor_units
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| {
            DomainError::InvalidAmount(format!("charge amount out of range: {minor_units}"))
        })?;

    Ok(ChargeAmount { amount, currency })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::Currency;

    fn rate(mantissa: i64, scale: u32) -> Decimal {
        Decimal::new(mantissa, scale)
    }

    #[test]
    fn test_us_total_parses_to_cents() {
        let charge =
            compose_charge_amount(BillingCountry::UnitedStates, "49.98", None).unwrap();
        assert_eq!(charge.amount, 4998);
        assert_eq!(charge.currency, Currency::Usd);
    }

    #[test]
    fn test_us_total_rounds_half_up() {
        let charge =
            compose_charge_amount(BillingCountry::UnitedStates, "10.005", None).unwrap();
        assert_eq!(charge.amount, 1001);
    }

    #[test]
    fn test_japan_total_converts_at_fx_rate() {
        let charge =
            compose_charge_amount(BillingCountry::Japan, "49.98", Some(rate(11025, 2))).unwrap();
        // 49.98 * 110.25 = 5510.295 -> 5510 whole yen
        assert_eq!(charge.amount, 5510);
        assert_eq!(charge.currency, Currency::Jpy);
    }

    #[test]
    fn test_japan_rounds_to_nearest_yen() {
        let charge =
            compose_charge_amount(BillingCountry::Japan, "10.00", Some(rate(11005, 2))).unwrap();
        assert_eq!(charge.amount, 1101); // 1100.5 rounds away from zero
    }

    #[test]
    fn test_japan_without_fx_rate_is_invalid() {
        let err = compose_charge_amount(BillingCountry::Japan, "49.98", None).unwrap_err();
        assert!(matches!(err, DomainError::InvalidAmount(_)));
    }

    #[test]
    fn test_unparseable_total_is_invalid() {
        let err =
            compose_charge_amount(BillingCountry::UnitedStates, "forty-nine", None).unwrap_err();
        assert!(matches!(err, DomainError::InvalidAmount(_)));
    }

    #[test]
    fn test_non_positive_total_is_invalid() {
        for total in ["0", "0.00", "-3.50"] {
            let err = compose_charge_amount(BillingCountry::UnitedStates, total, None).unwrap_err();
            assert!(matches!(err, DomainError::InvalidAmount(_)), "total {total}");
        }
    }

    #[test]
    fn test_fx_rate_ignored_for_us() {
        let charge =
            compose_charge_amount(BillingCountry::UnitedStates, "12.34", Some(rate(11025, 2)))
                .unwrap();
        assert_eq!(charge.amount, 1234);
    }

    #[test]
    fn test_whitespace_tolerated() {
        let charge =
            compose_charge_amount(BillingCountry::UnitedStates, " 5.00 ", None).unwrap();
        assert_eq!(charge.amount, 500);
    }
}
