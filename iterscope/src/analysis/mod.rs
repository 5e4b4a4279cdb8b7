//! Analysis over populated event trees.
//!
//! - [`aggregator`] - regex category aggregation used by the performance report
//! - [`view_filter`] - user-code / flatten filtered tree-view rows

pub mod aggregator;
pub mod view_filter;

pub use aggregator::{
    Aggregation, Category, CategoryExample, CategoryStats, CategoryTable, PathMask,
    MISSING_MARKER_TIME,
};
pub use view_filter::{build_rows, ViewFilter, ViewRow};
