use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported currencies with their pricing precision rules.
///
/// Course prices are quoted in whole currency units; the gateway is paid
/// in minor units (paisa/cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(3)", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Indian Rupee (whole-rupee course pricing)
    INR,
    /// US Dollar (whole-dollar course pricing)
    USD,
}

impl Currency {
    /// Decimal scale used for stored amounts
    pub fn scale(&self) -> u32 {
        match self {
            Currency::INR | Currency::USD => 0,
        }
    }

    /// Rounds a decimal value to the stored scale for this currency
    pub fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp(self.scale())
    }

    /// Converts a stored amount into gateway minor units (x100: paisa/cents)
    pub fn minor_units(&self, amount: Decimal) -> i64 {
        use rust_decimal::prelude::ToPrimitive;
        (amount * Decimal::from(100))
            .round_dp(0)
            .to_i64()
            .unwrap_or(0)
    }

    /// Validates that an amount is usable as a charge in this currency
    pub fn validate_amount(&self, amount: Decimal) -> Result<(), String> {
        if amount <= Decimal::ZERO {
            return Err(format!("{} amount must be positive", self));
        }

        if amount.scale() > self.scale() {
            return Err(format!(
                "{} amounts must have at most {} decimal places, got {}",
                self,
                self.scale(),
                amount.scale()
            ));
        }

        Ok(())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::INR => write!(f, "INR"),
            Currency::USD => write!(f, "USD"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "INR" => Ok(Currency::INR),
            "USD" => Ok(Currency::USD),
            _ => Err(format!("Invalid currency: {}", s)),
        }
    }
}

impl TryFrom<String> for Currency {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
