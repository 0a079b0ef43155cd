//! Seek pagination for date-ordered listings.
//!
//! The cursor anchors on the timestamp of the first or last row of the page
//! it was issued from. A backward walk fetches the window ending at the anchor
//! in reversed order and re-sorts it, so the page it reports is one lower than
//! the page carried by the cursor.

use chrono::{DateTime, Duration, Utc};
use moneta_shared::types::{Limit, SortDirection, SortSpec};

use super::cursor::{Cursor, format_anchor, parse_anchor};
use super::strategy::{
    Comparator, Page, PagePosition, PaginationStrategy, QueryPlan, SeekPlan, Window,
    has_page_after,
};
use crate::ledger::LedgerError;

/// How far past `now`, in hours, the first descending page anchors.
const DESC_ANCHOR_LEAD_HOURS: i64 = 25;

/// Seek strategy used for `SortField::ByDate`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeekStrategy;

impl SeekStrategy {
    /// Anchor for a request without a cursor. Every real row passes its filter.
    #[must_use]
    pub fn default_anchor(direction: SortDirection, now: DateTime<Utc>) -> DateTime<Utc> {
        match direction {
            SortDirection::Desc => now + Duration::hours(DESC_ANCHOR_LEAD_HOURS),
            SortDirection::Asc => DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

impl PaginationStrategy for SeekStrategy {
    fn plan(
        &self,
        sort: SortSpec,
        cursor: &Cursor,
        limit: Limit,
        now: DateTime<Utc>,
    ) -> Result<QueryPlan, LedgerError> {
        let (position, anchor) = if cursor.is_empty() {
            (
                PagePosition::FIRST,
                Self::default_anchor(sort.direction, now),
            )
        } else {
            let decoded = cursor.decode()?;
            let anchor = parse_anchor(&decoded.anchor)?;
            (
                PagePosition {
                    page: decoded.page,
                    is_next: decoded.is_next,
                    has_cursor: true,
                },
                anchor,
            )
        };

        let fetch_direction = if position.is_next {
            sort.direction
        } else {
            sort.direction.toggle()
        };

        Ok(QueryPlan::Seek(SeekPlan {
            anchor,
            comparator: Comparator::for_walk(sort.direction, position.is_next),
            fetch_direction,
            output_direction: sort.direction,
            limit: limit.get(),
            position,
        }))
    }

    fn derive_page(&self, plan: &QueryPlan, window: Option<Window>, total: u64) -> Page {
        let Some(window) = window else {
            return Page::default();
        };
        let PagePosition {
            page,
            is_next,
            has_cursor,
        } = plan.position();

        let previous = if !has_cursor || (!is_next && page <= 1) || page < 1 {
            Cursor::empty()
        } else {
            let target = if is_next { page } else { page - 1 };
            Cursor::encode(&format_anchor(window.first), target, false)
        };

        let probe = if is_next { page.saturating_add(1) } else { page };
        let next = if has_page_after(probe, total, plan.limit()) {
            let target = if is_next { page.saturating_add(1) } else { page };
            Cursor::encode(&format_anchor(window.last), target, true)
        } else {
            Cursor::empty()
        };

        let current = if is_next { page } else { page.saturating_sub(1) };

        Page {
            current,
            previous,
            next,
        }
    }
}
