//! Filter, sort and paginate collections of flat records.
//!
//! [`view::TableView`] is the engine: it owns the records, the column
//! definitions and the current filter, sort and page settings, and derives
//! the visible rows from them. [`loader`] reads records from JSON files and
//! [`session`] persists view state between runs.

pub mod column;
pub mod loader;
pub mod record;
pub mod session;
pub mod view;
