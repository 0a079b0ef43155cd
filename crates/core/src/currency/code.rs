//! Supported display currencies.

use serde::{Deserialize, Serialize};

use crate::ledger::LedgerError;

/// Display currency. Balances are stored in [`Currency::BASE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Russian rouble, the base currency.
    Rub,
    /// US dollar.
    Usd,
    /// Euro.
    Eur,
}

impl Currency {
    /// Currency balances are stored in.
    pub const BASE: Self = Self::Rub;

    /// Currencies the rate provider must quote.
    pub const QUOTED: [Self; 2] = [Self::Usd, Self::Eur];

    /// Parses a currency code, case-insensitively. Blank or absent means the base currency.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NotSupportedCurrency` for any other code.
    pub fn parse(raw: Option<&str>) -> Result<Self, LedgerError> {
        let code = raw.map(str::trim).unwrap_or_default();
        if code.is_empty() {
            return Ok(Self::BASE);
        }
        match code.to_ascii_uppercase().as_str() {
            "RUB" => Ok(Self::Rub),
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            _ => Err(LedgerError::NotSupportedCurrency),
        }
    }

    /// ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Rub => "RUB",
            Self::Usd => "USD",
            Self::Eur => "EUR",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
