//! Property-based tests for the pagination strategies.
//!
//! Walks are executed against a sorted in-test row set so page derivation is
//! checked independently of any store.

use chrono::{DateTime, Duration, TimeZone, Utc};
use moneta_shared::types::{Limit, SortDirection, SortField, SortSpec};
use proptest::prelude::*;

use super::cursor::Cursor;
use super::strategy::{Page, QueryPlan, Window, strategy_for};
use crate::ledger::LedgerError;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Strategy to generate distinct row timestamps.
fn timestamps() -> impl Strategy<Value = Vec<DateTime<Utc>>> {
    prop::collection::btree_set(0i64..100_000, 0..40)
        .prop_map(|secs| secs.into_iter().map(|s| base() + Duration::seconds(s)).collect())
}

fn direction_strategy() -> impl Strategy<Value = SortDirection> {
    prop_oneof![Just(SortDirection::Asc), Just(SortDirection::Desc)]
}

fn sort_in(rows: &mut [DateTime<Utc>], direction: SortDirection) {
    rows.sort_unstable();
    if direction == SortDirection::Desc {
        rows.reverse();
    }
}

/// Executes a plan over `rows` the way the store does.
fn fetch(rows: &[DateTime<Utc>], plan: &QueryPlan) -> Vec<DateTime<Utc>> {
    match plan {
        QueryPlan::Seek(seek) => {
            let mut window: Vec<_> = rows
                .iter()
                .copied()
                .filter(|at| seek.comparator.matches(*at, seek.anchor))
                .collect();
            sort_in(&mut window, seek.fetch_direction);
            window.truncate(seek.limit as usize);
            sort_in(&mut window, seek.output_direction);
            window
        }
        QueryPlan::Offset(offset) => {
            let mut window = rows.to_vec();
            sort_in(&mut window, offset.direction);
            window
                .into_iter()
                .skip(usize::try_from(offset.offset).unwrap())
                .take(offset.limit as usize)
                .collect()
        }
    }
}

fn page_for(
    rows: &[DateTime<Utc>],
    sort: SortSpec,
    cursor: &Cursor,
    limit: Limit,
) -> (Vec<DateTime<Utc>>, Page) {
    let strategy = strategy_for(sort.field);
    let now = base() + Duration::days(30);
    let plan = strategy.plan(sort, cursor, limit, now).unwrap();
    let window = fetch(rows, &plan);
    let page = strategy.derive_page(
        &plan,
        Window::from_timestamps(window.iter().copied()),
        rows.len() as u64,
    );
    (window, page)
}

fn walk_forward(
    rows: &[DateTime<Utc>],
    sort: SortSpec,
    limit: Limit,
) -> (Vec<Vec<DateTime<Utc>>>, Cursor) {
    let mut pages = Vec::new();
    let mut cursor = Cursor::empty();
    let mut last_page_cursor = Cursor::empty();
    loop {
        let (window, page) = page_for(rows, sort, &cursor, limit);
        if window.is_empty() {
            break;
        }
        assert_eq!(page.current as usize, pages.len());
        pages.push(window);
        if page.next.is_empty() {
            last_page_cursor = page.previous;
            break;
        }
        cursor = page.next;
    }
    (pages, last_page_cursor)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Encoding then decoding returns the original fields.
    #[test]
    fn prop_cursor_round_trip(
        anchor in "[^!]{0,40}",
        page in any::<u32>(),
        is_next in any::<bool>(),
    ) {
        let decoded = Cursor::encode(&anchor, page, is_next).decode().unwrap();
        prop_assert_eq!(decoded.anchor, anchor);
        prop_assert_eq!(decoded.page, page);
        prop_assert_eq!(decoded.is_next, is_next);
    }

    /// Tokens outside the URL-safe alphabet never decode.
    #[test]
    fn prop_foreign_tokens_are_invalid(token in "[A-Za-z0-9_-]{0,12}[+/*.!]{1,4}") {
        let result = Cursor::from(token).decode();
        prop_assert!(matches!(result, Err(LedgerError::InvalidCursor)));
    }

    /// A forward walk visits every row exactly once, in order.
    #[test]
    fn prop_forward_walk_covers_all_rows(
        rows in timestamps(),
        limit in 1u32..=30,
        direction in direction_strategy(),
        by_amount in any::<bool>(),
    ) {
        let field = if by_amount { SortField::ByAmount } else { SortField::ByDate };
        let sort = SortSpec::new(field, direction);
        let limit = Limit::new(limit).unwrap();

        let (pages, _) = walk_forward(&rows, sort, limit);

        let visited: Vec<_> = pages.iter().flatten().copied().collect();
        let mut expected = rows.clone();
        sort_in(&mut expected, direction);
        prop_assert_eq!(visited, expected);
        prop_assert_eq!(pages.len(), rows.len().div_ceil(limit.get() as usize));
    }

    /// Walking back from the last page reproduces the forward pages in reverse.
    #[test]
    fn prop_backward_walk_mirrors_forward_walk(
        rows in timestamps(),
        limit in 1u32..=30,
        direction in direction_strategy(),
        by_amount in any::<bool>(),
    ) {
        let field = if by_amount { SortField::ByAmount } else { SortField::ByDate };
        let sort = SortSpec::new(field, direction);
        let limit = Limit::new(limit).unwrap();

        let (forward, mut cursor) = walk_forward(&rows, sort, limit);

        let mut backward = Vec::new();
        while !cursor.is_empty() {
            let (window, page) = page_for(&rows, sort, &cursor, limit);
            prop_assert_eq!(page.current as usize, forward.len() - 2 - backward.len());
            prop_assert!(!page.next.is_empty());
            backward.push(window);
            cursor = page.previous;
        }

        let expected: Vec<_> = forward.iter().rev().skip(1).cloned().collect();
        prop_assert_eq!(backward, expected);
    }
}
