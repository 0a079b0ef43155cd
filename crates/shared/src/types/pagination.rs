//! Sort and page-size types for transaction listings.
//!
//! Wire codes follow the public query string: `sort=0|1`, `order=0|1`,
//! `limit=1..=30`.

use serde::{Deserialize, Serialize};

/// Field a transaction listing is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortField {
    /// Creation timestamp. Paginated with a seek anchor.
    #[default]
    ByDate,
    /// Absolute amount. Paginated by offset.
    ByAmount,
}

impl SortField {
    /// Resolves a query-string code (`0` = date, `1` = amount).
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::ByDate),
            1 => Some(Self::ByAmount),
            _ => None,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending (newest or largest first).
    #[default]
    Desc,
}

impl SortDirection {
    /// Resolves a query-string code (`0` = asc, `1` = desc).
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Asc),
            1 => Some(Self::Desc),
            _ => None,
        }
    }

    /// Returns the opposite direction.
    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// SQL keyword for this direction.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Requested ordering of a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    /// Field to order by.
    pub field: SortField,
    /// Direction of the ordering.
    pub direction: SortDirection,
}

impl SortSpec {
    /// Creates a sort spec.
    #[must_use]
    pub const fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

/// Page size, always within `[Limit::MIN, Limit::MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Limit(u32);

impl Limit {
    /// Smallest accepted page size.
    pub const MIN: u32 = 1;
    /// Largest accepted page size.
    pub const MAX: u32 = 30;
    /// Page size used when the client sends none.
    pub const DEFAULT: u32 = 2;

    /// Validates a requested page size.
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        if value >= Self::MIN && value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Returns the page size.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for Limit {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}
