//! Column layout for the grid
//!
//! Provides:
//! - Column widths from header labels and cell contents
//! - Horizontal scrolling so the selected column stays on screen
//! - Display-width aware truncation

use std::ops::Range;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use darkwall_grid::column::Column;
use darkwall_grid::record::Record;

/// Narrowest a column is drawn
pub const MIN_COLUMN_WIDTH: u16 = 3;
/// Widest an auto-sized column grows
pub const MAX_COLUMN_WIDTH: u16 = 40;
/// Space between columns
pub const COLUMN_GAP: u16 = 1;
/// Room after the label for the sort arrow and filter marker
const HEADER_DECORATION: usize = 2;

/// Width of every column, in display cells.
///
/// An explicit `width` on the column wins; otherwise the widest of the
/// header and the given rows, clamped to [`MIN_COLUMN_WIDTH`]..=[`MAX_COLUMN_WIDTH`].
pub fn column_widths(columns: &[Column], rows: &[&Record]) -> Vec<u16> {
    columns
        .iter()
        .map(|column| {
            if let Some(width) = column.width {
                return width.max(1);
            }
            let header = column.label.width() + HEADER_DECORATION;
            let content = rows
                .iter()
                .map(|r| r.display(&column.key).width())
                .max()
                .unwrap_or(0);
            let width = header.max(content).min(MAX_COLUMN_WIDTH as usize) as u16;
            width.max(MIN_COLUMN_WIDTH)
        })
        .collect()
}

/// Columns that fit in `available` cells with `selected` among them.
///
/// Scrolls as little as possible: starts from the first column and only
/// moves the window right when the selection would fall off the edge.
pub fn visible_columns(widths: &[u16], selected: usize, available: u16) -> Range<usize> {
    if widths.is_empty() {
        return 0..0;
    }
    let selected = selected.min(widths.len() - 1);
    let span = |range: Range<usize>| -> u32 {
        let cells: u32 = widths[range.clone()].iter().map(|&w| u32::from(w)).sum();
        cells + u32::from(COLUMN_GAP) * (range.len().saturating_sub(1) as u32)
    };
    let available = u32::from(available);

    // Leftmost start that still shows the selected column
    let mut start = 0;
    while start < selected && span(start..selected + 1) > available {
        start += 1;
    }

    let mut end = selected + 1;
    while end < widths.len() && span(start..end + 1) <= available {
        end += 1;
    }
    start..end
}

/// Cut `text` to at most `width` display cells, marking the cut with `…`.
pub fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Pad `text` with spaces to `width` display cells.
pub fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}
