//! Page slicing.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Pagination state as reported by a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Zero-based page index
    pub page: usize,
    /// Records per page
    pub page_size: usize,
    /// Post-filter record count
    #[serde(default)]
    pub total: usize,
}

impl Pagination {
    pub fn page_count(&self) -> usize {
        page_count(self.total, self.page_size)
    }

    /// Index range of the current page within the filtered set
    pub fn range(&self) -> Range<usize> {
        page_range(self.total, self.page, self.page_size)
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.page_count()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }
}

/// `[page * page_size, page * page_size + page_size)` clipped to `0..len`.
///
/// A zero page size or a page past the end gives an empty range.
pub fn page_range(len: usize, page: usize, page_size: usize) -> Range<usize> {
    if page_size == 0 {
        return 0..0;
    }
    let start = page.saturating_mul(page_size);
    if start >= len {
        return len..len;
    }
    let end = start.saturating_add(page_size).min(len);
    start..end
}

/// One page of `rows`.
pub fn paginate<T>(rows: &[T], page: usize, page_size: usize) -> &[T] {
    &rows[page_range(rows.len(), page, page_size)]
}

/// Number of pages needed for `total` rows; zero when `page_size` is zero.
pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        0
    } else {
        total.div_ceil(page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages() {
        let ids: Vec<u32> = (1..=25).collect();
        assert_eq!(paginate(&ids, 0, 10), (1..=10).collect::<Vec<_>>().as_slice());
        assert_eq!(paginate(&ids, 1, 10), (11..=20).collect::<Vec<_>>().as_slice());
        assert_eq!(paginate(&ids, 2, 10), &[21, 22, 23, 24, 25]);
    }

    #[test]
    fn test_out_of_range_is_empty() {
        let ids: Vec<u32> = (1..=25).collect();
        assert!(paginate(&ids, 3, 10).is_empty());
        assert!(paginate(&ids, usize::MAX, 10).is_empty());
        assert!(paginate::<u32>(&[], 0, 10).is_empty());
    }

    #[test]
    fn test_zero_page_size_is_empty() {
        let ids = [1, 2, 3];
        assert!(paginate(&ids, 0, 0).is_empty());
        assert_eq!(page_count(3, 0), 0);
    }

    #[test]
    fn test_page_length_formula() {
        for len in 0..30usize {
            let rows: Vec<usize> = (0..len).collect();
            for size in 1..8usize {
                for page in 0..10usize {
                    let expected = size.min(len.saturating_sub(page * size));
                    assert_eq!(paginate(&rows, page, size).len(), expected);
                }
            }
        }
    }

    #[test]
    fn test_pages_concatenate_to_whole() {
        let rows: Vec<usize> = (0..23).collect();
        for size in 1..10 {
            let joined: Vec<usize> = (0..page_count(rows.len(), size))
                .flat_map(|p| paginate(&rows, p, size).iter().copied())
                .collect();
            assert_eq!(joined, rows);
        }
    }

    #[test]
    fn test_pagination_navigation_flags() {
        let p = Pagination { page: 0, page_size: 10, total: 25 };
        assert_eq!(p.page_count(), 3);
        assert!(p.has_next());
        assert!(!p.has_previous());
        assert_eq!(p.range(), 0..10);

        let last = Pagination { page: 2, ..p };
        assert!(!last.has_next());
        assert_eq!(last.range(), 20..25);
    }
}
