//! Bidirectional cursor pagination.
//!
//! Date order pages with a seek anchor, amount order pages by offset. Both are
//! [`PaginationStrategy`] implementations selected by [`strategy_for`].

pub mod cursor;
pub mod offset;
pub mod seek;
pub mod strategy;

#[cfg(test)]
mod strategy_props;

pub use cursor::{Cursor, CursorPosition};
pub use offset::OffsetStrategy;
pub use seek::SeekStrategy;
pub use strategy::{
    Comparator, OffsetPlan, Page, PagePosition, PaginationStrategy, QueryPlan, SeekPlan, Window,
    strategy_for,
};
