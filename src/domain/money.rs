use crate::error::{Result, StorefrontError};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Smallest amount the payment provider will charge, in the currency's
/// minimum unit.
pub const MIN_CHARGE: Decimal = Decimal::ONE_HUNDRED;

/// A strictly positive monetary amount.
///
/// Wraps `rust_decimal::Decimal` so a zero or negative value can never reach
/// the payment gateway.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(StorefrontError::Validation(
                "결제 가능한 금액이 아닙니다.".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = StorefrontError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// Derives the chargeable checkout amount from a cart total: the total
/// rounded to the currency's minimum unit, floored at [`MIN_CHARGE`].
pub fn checkout_amount(total: Decimal) -> Result<Amount> {
    let rounded = total.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    Amount::new(rounded.max(MIN_CHARGE))
}
