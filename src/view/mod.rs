//! Tabular data view engine.
//!
//! A [`TableView`] owns a record collection plus the filter, sort and
//! pagination state of one grid session, and derives the visible page:
//!
//! ```text
//! records ──▶ filter (AND of active filters)
//!                │
//!                ▼
//!             sort (single directive, stable)
//!                │
//!                ▼
//!             paginate (page * size .. + size)
//!                │
//!                ▼
//!          visible rows
//! ```
//!
//! Every mutator bumps [`TableView::revision`] and drops the cached row
//! order. The next read recomputes the whole pipeline; reads in between
//! reuse it.

pub mod filter;
pub mod paginate;
pub mod sort;


use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::ops::Range;
use std::str::FromStr;

use crate::column::Column;
use crate::record::{Record, Value};

pub use filter::{filter_rows, Filter, FilterOperator};
pub use paginate::{page_count, page_range, paginate, Pagination};
pub use sort::{compare_values, sort_rows, SortDirection, SortDirective, SortMode};

/// Errors from parsing view directives given as text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown filter operator '{0}'")]
    UnknownOperator(String),
    #[error("unknown sort direction '{0}' (expected asc or desc)")]
    UnknownDirection(String),
    #[error("unknown sort mode '{0}' (expected typed or lexical)")]
    UnknownSortMode(String),
    #[error("missing column name")]
    MissingColumn,
    #[error("invalid filter '{0}' (expected key:value or key:operator:value)")]
    InvalidFilter(String),
}

impl FromStr for Filter {
    type Err = ParseError;

    /// `key:value` (contains) or `key:operator:value`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, rest) = s
            .split_once(':')
            .ok_or_else(|| ParseError::InvalidFilter(s.to_string()))?;
        if key.is_empty() {
            return Err(ParseError::MissingColumn);
        }

        // A middle segment that is not an operator belongs to the value
        if let Some((op, value)) = rest.split_once(':') {
            if let Ok(operator) = op.parse::<FilterOperator>() {
                return Ok(Filter::new(key, value, operator));
            }
        }
        Ok(Filter::contains(key, rest))
    }
}

/// Requested page, before the total is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

/// The engine-owned part of a view, detached from its records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    pub filters: Vec<Filter>,
    pub sort: Option<SortDirective>,
    pub page: Option<PageRequest>,
}

/// Filter, sort and pagination state over an owned record collection.
#[derive(Debug)]
pub struct TableView {
    records: Vec<Record>,
    columns: Vec<Column>,
    filters: Vec<Filter>,
    sort: Option<SortDirective>,
    page: Option<PageRequest>,
    mode: SortMode,
    revision: u64,
    /// Filtered and sorted record indices for the current revision
    derived: OnceCell<Vec<usize>>,
}

impl TableView {
    pub fn new(records: Vec<Record>, columns: Vec<Column>) -> Self {
        Self {
            records,
            columns,
            filters: Vec::new(),
            sort: None,
            page: None,
            mode: SortMode::default(),
            revision: 0,
            derived: OnceCell::new(),
        }
    }

    pub fn with_sort_mode(mut self, mode: SortMode) -> Self {
        self.set_sort_mode(mode);
        self
    }

    // ------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Replace the record collection. Filter, sort and page state are kept.
    pub fn set_records(&mut self, records: Vec<Record>) {
        self.records = records;
        self.invalidate();
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn set_columns(&mut self, columns: Vec<Column>) {
        self.columns = columns;
        self.invalidate();
    }

    pub fn sort_mode(&self) -> SortMode {
        self.mode
    }

    pub fn set_sort_mode(&mut self, mode: SortMode) {
        self.mode = mode;
        self.invalidate();
    }

    // ------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------

    /// Set the filter for `key`, replacing any previous one.
    ///
    /// An empty or null value removes the filter. The operator defaults to
    /// `contains`.
    pub fn set_filter(
        &mut self,
        key: &str,
        value: impl Into<Value>,
        operator: Option<FilterOperator>,
    ) {
        let filter = Filter::new(key, value, operator.unwrap_or_default());
        tracing::debug!(key, operator = %filter.operator, value = %filter.value, "set filter");

        if !filter.is_active() {
            self.filters.retain(|f| f.key != key);
        } else if let Some(existing) = self.filters.iter_mut().find(|f| f.key == key) {
            *existing = filter;
        } else {
            self.filters.push(filter);
        }
        self.invalidate();
    }

    /// Drop the filter for `key`. Returns whether one was present.
    pub fn remove_filter(&mut self, key: &str) -> bool {
        let before = self.filters.len();
        self.filters.retain(|f| f.key != key);
        let removed = self.filters.len() != before;
        if removed {
            self.invalidate();
        }
        removed
    }

    /// Drop every filter and the sort directive: the full set in insertion
    /// order. Pagination is kept.
    pub fn clear_filters(&mut self) {
        tracing::debug!(count = self.filters.len(), "clear filters");
        self.filters.clear();
        self.sort = None;
        self.invalidate();
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn has_active_filters(&self) -> bool {
        self.filters.iter().any(Filter::is_active)
    }

    /// The value currently filtering `key`, for echoing into an input.
    pub fn current_filter_value(&self, key: &str) -> Option<&Value> {
        self.current_filter(key).map(|f| &f.value)
    }

    pub fn current_filter(&self, key: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.key == key)
    }

    // ------------------------------------------------------------------
    // Sort
    // ------------------------------------------------------------------

    /// Make `column` the active sort. Columns declared non-sortable are
    /// ignored. Pagination is left alone.
    pub fn set_sort(&mut self, column: &str, direction: SortDirection) {
        if !self.is_sortable(column) {
            tracing::debug!(column, "ignoring sort on non-sortable column");
            return;
        }
        tracing::debug!(column, %direction, "set sort");
        self.sort = Some(SortDirective::new(column, direction));
        self.invalidate();
    }

    /// Ascending on a new column, flipped direction on the current one.
    pub fn toggle_sort(&mut self, column: &str) {
        let direction = match &self.sort {
            Some(current) if current.column == column => current.direction.toggled(),
            _ => SortDirection::Asc,
        };
        self.set_sort(column, direction);
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
        self.invalidate();
    }

    pub fn sort(&self) -> Option<&SortDirective> {
        self.sort.as_ref()
    }

    fn is_sortable(&self, column: &str) -> bool {
        // Undeclared fields stay sortable: records are open-ended
        self.columns
            .iter()
            .find(|c| c.key == column)
            .map_or(true, |c| c.sortable)
    }

    // ------------------------------------------------------------------
    // Pagination
    // ------------------------------------------------------------------

    /// Show page `page` (zero-based) of `page_size` rows. Sort is left alone.
    ///
    /// A zero page size shows nothing.
    pub fn set_page(&mut self, page: usize, page_size: usize) {
        if page_size == 0 {
            tracing::debug!("page size 0, view will be empty");
        }
        self.page = Some(PageRequest { page, page_size });
        self.invalidate();
    }

    /// Show every filtered row.
    pub fn clear_pagination(&mut self) {
        self.page = None;
        self.invalidate();
    }

    /// Advance one page if there is one. Returns whether the page changed.
    pub fn next_page(&mut self) -> bool {
        match self.pagination() {
            Some(p) if p.has_next() => {
                self.set_page(p.page + 1, p.page_size);
                true
            }
            _ => false,
        }
    }

    /// Go back one page if possible. Returns whether the page changed.
    pub fn previous_page(&mut self) -> bool {
        match self.pagination() {
            Some(p) if p.has_previous() => {
                let last = p.page_count().saturating_sub(1);
                // Land on the last real page if the current one ran off the end
                self.set_page((p.page - 1).min(last), p.page_size);
                true
            }
            _ => false,
        }
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.page.map(|req| Pagination {
            page: req.page,
            page_size: req.page_size,
            total: self.total_count(),
        })
    }

    /// Pages in the filtered set; a single page when pagination is off.
    pub fn page_count(&self) -> usize {
        match self.pagination() {
            Some(p) => p.page_count(),
            None => usize::from(self.total_count() > 0),
        }
    }

    // ------------------------------------------------------------------
    // Whole-state operations
    // ------------------------------------------------------------------

    /// Drop filters, sort and pagination: the full set in insertion order.
    pub fn reset(&mut self) {
        self.filters.clear();
        self.sort = None;
        self.page = None;
        self.invalidate();
    }

    pub fn state(&self) -> ViewState {
        ViewState {
            filters: self.filters.clone(),
            sort: self.sort.clone(),
            page: self.page,
        }
    }

    /// Apply a saved state. Inert filters are dropped, sorts on
    /// non-sortable columns are ignored.
    pub fn restore_state(&mut self, state: ViewState) {
        self.filters = state.filters.into_iter().filter(Filter::is_active).collect();
        let sort = state.sort.filter(|s| self.is_sortable(&s.column));
        self.sort = sort;
        self.page = state.page;
        self.invalidate();
    }

    /// Incremented by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ------------------------------------------------------------------
    // Derived output
    // ------------------------------------------------------------------

    /// The current page of filtered, sorted records.
    pub fn visible_rows(&self) -> Vec<&Record> {
        self.derived()
            .get(self.visible_range())
            .unwrap_or_default()
            .iter()
            .filter_map(|&i| self.records.get(i))
            .collect()
    }

    /// Positions of the visible rows within the filtered set.
    pub fn visible_range(&self) -> Range<usize> {
        let total = self.total_count();
        match self.page {
            Some(req) => page_range(total, req.page, req.page_size),
            None => 0..total,
        }
    }

    /// Record count after filtering, before pagination.
    pub fn total_count(&self) -> usize {
        self.derived().len()
    }

    fn derived(&self) -> &[usize] {
        self.derived.get_or_init(|| self.compute())
    }

    fn compute(&self) -> Vec<usize> {
        let mut indices = filter::filter_indices(&self.records, &self.filters);
        if let Some(directive) = &self.sort {
            let records = &self.records;
            indices.sort_by(|&a, &b| directive.compare(&records[a], &records[b], self.mode));
        }
        tracing::trace!(
            revision = self.revision,
            total = indices.len(),
            records = self.records.len(),
            "recomputed view"
        );
        indices
    }

    fn invalidate(&mut self) {
        self.revision += 1;
        self.derived.take();
    }
}
