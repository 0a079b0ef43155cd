//! The pagination strategy interface and the query plans it produces.

use chrono::{DateTime, Utc};
use moneta_shared::types::{Limit, SortDirection, SortField, SortSpec};
use serde::Serialize;

use super::cursor::Cursor;
use super::offset::OffsetStrategy;
use super::seek::SeekStrategy;
use crate::ledger::LedgerError;

/// Resolved position of the requested page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePosition {
    /// Page index carried by the cursor, 0 when there was none.
    pub page: u32,
    /// Walking forward.
    pub is_next: bool,
    /// The request carried a non-empty cursor.
    pub has_cursor: bool,
}

impl PagePosition {
    /// Position of the first page.
    pub const FIRST: Self = Self {
        page: 0,
        is_next: true,
        has_cursor: false,
    };
}

/// Timestamp comparison applied against a seek anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// `created_at > anchor`
    Greater,
    /// `created_at < anchor`
    Less,
}

impl Comparator {
    /// Picks the comparator for a walk in `direction`.
    #[must_use]
    pub const fn for_walk(direction: SortDirection, is_next: bool) -> Self {
        match (direction, is_next) {
            (SortDirection::Asc, true) | (SortDirection::Desc, false) => Self::Greater,
            (SortDirection::Asc, false) | (SortDirection::Desc, true) => Self::Less,
        }
    }

    /// SQL operator.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Greater => ">",
            Self::Less => "<",
        }
    }

    /// Applies the comparison.
    #[must_use]
    pub fn matches(self, value: DateTime<Utc>, anchor: DateTime<Utc>) -> bool {
        match self {
            Self::Greater => value > anchor,
            Self::Less => value < anchor,
        }
    }
}

/// Query over the account's entries ordered by timestamp, filtered by an anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeekPlan {
    /// Anchor timestamp.
    pub anchor: DateTime<Utc>,
    /// Filter applied against the anchor.
    pub comparator: Comparator,
    /// Order used to pick the `limit` nearest rows.
    pub fetch_direction: SortDirection,
    /// Order of the returned window.
    pub output_direction: SortDirection,
    /// Window size.
    pub limit: u32,
    /// Requested page.
    pub position: PagePosition,
}

/// Query over the account's entries ordered by absolute amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetPlan {
    /// Rows to skip.
    pub offset: u64,
    /// Window size.
    pub limit: u32,
    /// Order of the window.
    pub direction: SortDirection,
    /// Requested page.
    pub position: PagePosition,
}

/// Store query for one listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPlan {
    /// Seek pagination (date order).
    Seek(SeekPlan),
    /// Offset pagination (amount order).
    Offset(OffsetPlan),
}

impl QueryPlan {
    /// Requested page.
    #[must_use]
    pub const fn position(&self) -> PagePosition {
        match self {
            Self::Seek(plan) => plan.position,
            Self::Offset(plan) => plan.position,
        }
    }

    /// Window size.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        match self {
            Self::Seek(plan) => plan.limit,
            Self::Offset(plan) => plan.limit,
        }
    }
}

/// Timestamps of the first and last row of a returned window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Timestamp of the first row.
    pub first: DateTime<Utc>,
    /// Timestamp of the last row.
    pub last: DateTime<Utc>,
}

impl Window {
    /// Builds a window from row timestamps in output order. `None` when empty.
    pub fn from_timestamps<I>(timestamps: I) -> Option<Self>
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        let mut iter = timestamps.into_iter();
        let first = iter.next()?;
        let last = iter.last().unwrap_or(first);
        Some(Self { first, last })
    }
}

/// Position of a returned page and the cursors around it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Page {
    /// 0-based page index.
    pub current: u32,
    /// Cursor to the previous page, empty if none.
    pub previous: Cursor,
    /// Cursor to the next page, empty if none.
    pub next: Cursor,
}

/// Pagination strategy for one sort field.
pub trait PaginationStrategy: Send + Sync {
    /// Builds the store query for a request.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidCursor` for an undecodable cursor.
    fn plan(
        &self,
        sort: SortSpec,
        cursor: &Cursor,
        limit: Limit,
        now: DateTime<Utc>,
    ) -> Result<QueryPlan, LedgerError>;

    /// Derives the page descriptor from the executed plan.
    ///
    /// `window` is `None` when the query returned no rows; `total` is the
    /// account's entry count.
    fn derive_page(&self, plan: &QueryPlan, window: Option<Window>, total: u64) -> Page;
}

/// Returns the strategy for a sort field.
#[must_use]
pub fn strategy_for(field: SortField) -> &'static dyn PaginationStrategy {
    match field {
        SortField::ByDate => &SeekStrategy,
        SortField::ByAmount => &OffsetStrategy,
    }
}

/// Whether another page exists after `probe`.
///
/// The page count rounds up rather than to nearest, so a trailing partial
/// page is always reachable.
pub(crate) fn has_page_after(probe: u32, total: u64, limit: u32) -> bool {
    let max_page = total.div_ceil(u64::from(limit.max(1)));
    u64::from(probe) < max_page
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SortDirection::Asc, true, Comparator::Greater)]
    #[case(SortDirection::Asc, false, Comparator::Less)]
    #[case(SortDirection::Desc, true, Comparator::Less)]
    #[case(SortDirection::Desc, false, Comparator::Greater)]
    fn test_comparator_table(
        #[case] direction: SortDirection,
        #[case] is_next: bool,
        #[case] expected: Comparator,
    ) {
        assert_eq!(Comparator::for_walk(direction, is_next), expected);
    }

    #[rstest]
    #[case(1, 6, 2, true)]
    #[case(2, 6, 2, true)]
    #[case(3, 6, 2, false)]
    #[case(3, 7, 2, true)] // partial trailing page still counts
    #[case(1, 2, 2, false)]
    #[case(0, 0, 2, false)]
    fn test_has_page_after(
        #[case] probe: u32,
        #[case] total: u64,
        #[case] limit: u32,
        #[case] expected: bool,
    ) {
        assert_eq!(has_page_after(probe, total, limit), expected);
    }

    #[test]
    fn test_window_from_single_row() {
        let at = Utc::now();
        let window = Window::from_timestamps([at]).unwrap();
        assert_eq!(window.first, at);
        assert_eq!(window.last, at);
        assert!(Window::from_timestamps(Vec::new()).is_none());
    }

    #[test]
    fn test_strategy_selection_follows_sort_field() {
        let now = Utc::now();
        let limit = Limit::default();
        let by_date = strategy_for(SortField::ByDate)
            .plan(SortSpec::default(), &Cursor::empty(), limit, now)
            .unwrap();
        assert!(matches!(by_date, QueryPlan::Seek(_)));

        let by_amount = strategy_for(SortField::ByAmount)
            .plan(
                SortSpec::new(SortField::ByAmount, SortDirection::Asc),
                &Cursor::empty(),
                limit,
                now,
            )
            .unwrap();
        assert!(matches!(by_amount, QueryPlan::Offset(_)));
    }
}
