//! The components module contains Maud "partials", such as the history table,
//! that are not complete pages in themselves.
//!
//! The highest-level component is 'page', which provides the common header and
//! footer for all views.

pub(crate) mod history_table;
pub(crate) mod page;
pub(crate) mod summary_view;
