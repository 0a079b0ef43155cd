//! Currency conversion logic.
//!
//! Rates are quoted per unit of the base currency. Results use banker's
//! rounding (round half to even) to minimize cumulative errors.

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;
use serde::Serialize;

use super::code::Currency;
use crate::ledger::LedgerError;

/// Decimal places of a converted amount.
pub const AMOUNT_DECIMAL_PLACES: u32 = 2;

/// Decimal places of a reported conversion rate.
pub const RATE_DECIMAL_PLACES: u32 = 6;

/// A balance expressed in a display currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertedAmount {
    /// Converted amount.
    pub amount: Decimal,
    /// Currency of `amount`.
    pub currency: Currency,
    /// Units of the base currency per unit of `currency`.
    pub conversion_rate: Decimal,
}

/// Multiplies `amount` by `rate` and rounds half to even at `decimal_places`.
///
/// Returns `None` when the product does not fit a `Decimal`.
#[must_use]
pub fn convert_amount(amount: Decimal, rate: Decimal, decimal_places: u32) -> Option<Decimal> {
    amount
        .checked_mul(rate)
        .map(|converted| {
            converted.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
        })
}

/// Converts a base-currency balance with `rate` (target units per base unit).
///
/// # Errors
///
/// Returns `LedgerError::FailedConvert` for a non-positive rate or on overflow.
pub fn convert_balance(
    balance: i64,
    currency: Currency,
    rate: Decimal,
) -> Result<ConvertedAmount, LedgerError> {
    if rate <= Decimal::ZERO {
        return Err(LedgerError::failed_convert(format!(
            "non-positive rate {rate} for {currency}"
        )));
    }

    let amount = convert_amount(Decimal::from(balance), rate, AMOUNT_DECIMAL_PLACES)
        .ok_or_else(|| LedgerError::failed_convert(format!("overflow converting to {currency}")))?;

    let conversion_rate = Decimal::ONE
        .checked_div(rate)
        .ok_or_else(|| LedgerError::failed_convert(format!("cannot invert rate for {currency}")))?
        .round_dp_with_strategy(RATE_DECIMAL_PLACES, RoundingStrategy::MidpointNearestEven);

    Ok(ConvertedAmount {
        amount,
        currency,
        conversion_rate,
    })
}
