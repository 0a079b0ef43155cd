//! Display-currency conversion.

pub mod cache;
pub mod code;
pub mod conversion;
pub mod provider;

pub use cache::RateCache;
pub use code::Currency;
pub use conversion::{ConvertedAmount, convert_amount, convert_balance};
pub use provider::{RateProvider, RateProviderError, RateTable};
