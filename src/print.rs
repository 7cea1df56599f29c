//! Plain-text rendering of the current view for `--print`.

use std::io::{self, Write};

use darkwall_grid::view::TableView;

use crate::ui::layout::{column_widths, pad, truncate};

/// Aligned table of the visible rows with a header, a rule and a footer
/// line `rows X-Y of TOTAL`.
pub fn render(view: &TableView) -> String {
    let rows = view.visible_rows();
    let columns = view.columns();
    let widths: Vec<usize> = column_widths(columns, &rows)
        .into_iter()
        .map(usize::from)
        .collect();

    let mut out = String::new();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(column, &width)| {
            let label = match view.sort().filter(|s| s.column == column.key) {
                Some(sort) => format!("{} {}", column.label, sort.direction.arrow()),
                None => column.label.clone(),
            };
            pad(&truncate(&label, width), width)
        })
        .collect();
    push_line(&mut out, &header);

    let rule: Vec<String> = widths.iter().map(|&w| "─".repeat(w)).collect();
    push_line(&mut out, &rule);

    for record in &rows {
        let cells: Vec<String> = columns
            .iter()
            .zip(&widths)
            .map(|(column, &width)| pad(&truncate(&record.display(&column.key), width), width))
            .collect();
        push_line(&mut out, &cells);
    }

    out.push_str(&footer(view));
    out.push('\n');
    out
}

/// Write [`render`] to stdout
pub fn print(view: &TableView) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(render(view).as_bytes())?;
    stdout.flush()
}

fn push_line(out: &mut String, cells: &[String]) {
    out.push_str(cells.join(" ").trim_end());
    out.push('\n');
}

fn footer(view: &TableView) -> String {
    let range = view.visible_range();
    let total = view.total_count();
    let mut footer = if range.is_empty() {
        format!("rows 0 of {}", total)
    } else {
        format!("rows {}-{} of {}", range.start + 1, range.end, total)
    };
    if let Some(p) = view.pagination() {
        footer.push_str(&format!(" (page {}/{})", p.page + 1, p.page_count().max(1)));
    }
    footer
}

#[cfg(test)]
mod tests {
    use super::*;
    use darkwall_grid::column::Column;
    use darkwall_grid::record::Record;
    use darkwall_grid::view::{FilterOperator, SortDirection};

    fn view() -> TableView {
        let records = vec![
            Record::new().with("name", "Banana").with("price", 3),
            Record::new().with("name", "Apple").with("price", 12),
            Record::new().with("name", "Cherry").with("price", 7),
        ];
        TableView::new(records, vec![Column::new("name"), Column::new("price")])
    }

    #[test]
    fn test_render_all_rows() {
        let out = render(&view());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "Name   Price");
        assert!(lines[1].starts_with("────"));
        assert_eq!(lines[2], "Banana 3");
        assert_eq!(lines[5], "rows 1-3 of 3");
    }

    #[test]
    fn test_render_sorted_filtered_page() {
        let mut view = view();
        view.set_filter("price", "5", Some(FilterOperator::Gt));
        view.set_sort("price", SortDirection::Desc);
        view.set_page(0, 1);

        let out = render(&view);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Name   Price ▼");
        assert_eq!(lines[2], "Apple  12");
        assert_eq!(lines[3], "rows 1-1 of 2 (page 1/2)");
    }

    #[test]
    fn test_render_empty() {
        let mut view = view();
        view.set_filter("name", "zzz", None);
        let out = render(&view);
        assert!(out.ends_with("rows 0 of 0\n"));
    }
}
