//! Offset pagination for amount-ordered listings.
//!
//! Position is purely the page index; cursors carry an empty anchor.

use chrono::{DateTime, Utc};
use moneta_shared::types::{Limit, SortSpec};

use super::cursor::Cursor;
use super::strategy::{
    OffsetPlan, Page, PagePosition, PaginationStrategy, QueryPlan, Window, has_page_after,
};
use crate::ledger::LedgerError;

/// Offset strategy used for `SortField::ByAmount`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OffsetStrategy;

impl PaginationStrategy for OffsetStrategy {
    fn plan(
        &self,
        sort: SortSpec,
        cursor: &Cursor,
        limit: Limit,
        _now: DateTime<Utc>,
    ) -> Result<QueryPlan, LedgerError> {
        let position = if cursor.is_empty() {
            PagePosition::FIRST
        } else {
            let decoded = cursor.decode()?;
            PagePosition {
                page: decoded.page,
                is_next: decoded.is_next,
                has_cursor: true,
            }
        };

        Ok(QueryPlan::Offset(OffsetPlan {
            offset: u64::from(position.page) * u64::from(limit.get()),
            limit: limit.get(),
            direction: sort.direction,
            position,
        }))
    }

    fn derive_page(&self, plan: &QueryPlan, window: Option<Window>, total: u64) -> Page {
        if window.is_none() {
            return Page::default();
        }
        let PagePosition {
            page,
            is_next,
            has_cursor,
        } = plan.position();

        let previous = if !has_cursor || page < 1 {
            Cursor::empty()
        } else {
            Cursor::encode("", page - 1, false)
        };

        let probe = if is_next { page.saturating_add(1) } else { page };
        let next = if has_page_after(probe, total, plan.limit()) {
            Cursor::encode("", page.saturating_add(1), true)
        } else {
            Cursor::empty()
        };

        Page {
            current: page,
            previous,
            next,
        }
    }
}
