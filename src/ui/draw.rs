use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, HighlightSpacing, Paragraph, Row, Table, TableState},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, InputMode};
use crate::ui::layout::{column_widths, truncate, visible_columns, COLUMN_GAP};
use crate::ui::theme::Theme;

/// Main draw function
pub fn draw(f: &mut Frame, app: &App) {
    let theme = app.theme();
    let area = f.area();
    f.render_widget(
        Block::default().style(Style::default().bg(theme.background)),
        area,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Filter bar
            Constraint::Min(1),    // Grid
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    draw_filter_bar(f, app, chunks[0], theme);
    draw_grid(f, app, chunks[1], theme);
    draw_status_bar(f, app, chunks[2], theme);
}

/// Draw the filter bar: the filter being edited, or a summary of active ones
fn draw_filter_bar(f: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let prompt = &app.config().appearance.prompt;

    let (text, style) = match app.mode() {
        InputMode::EditFilter {
            key,
            buffer,
            operator,
            ..
        } => (
            format!("{}{} {} {}", prompt, key, operator.symbol(), buffer),
            Style::default().fg(theme.filter_highlight),
        ),
        InputMode::Browse if app.view().has_active_filters() => (
            format!("{}{}", prompt, app.filter_summary()),
            Style::default().fg(theme.foreground),
        ),
        InputMode::Browse => {
            let label = app.selected_column().map(|c| c.label.as_str()).unwrap_or("");
            (
                format!("{}Press / to filter {}", prompt, label),
                Style::default().fg(theme.dimmed),
            )
        }
    };

    let title = match app.data_path().file_name() {
        Some(name) => format!(" darkwall-grid · {} ", name.to_string_lossy()),
        None => " darkwall-grid ".to_string(),
    };

    let bar = Paragraph::new(text.clone()).style(style.bg(theme.background)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.accent))
            .title(title)
            .style(Style::default().bg(theme.background)),
    );
    f.render_widget(bar, area);

    if app.is_editing() {
        // +1 for the left border
        let cursor_x = area.x + 1 + text.width() as u16;
        f.set_cursor_position((cursor_x.min(area.right().saturating_sub(2)), area.y + 1));
    }
}

/// Draw the current page as a table
fn draw_grid(f: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.dimmed))
        .style(Style::default().bg(theme.background));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let view = app.view();
    let rows = view.visible_rows();
    if rows.is_empty() {
        let message = if view.records().is_empty() {
            "No records"
        } else {
            "No matching rows"
        };
        f.render_widget(
            Paragraph::new(message).style(Style::default().fg(theme.dimmed)),
            inner,
        );
        return;
    }

    let prefix = &app.config().appearance.selected_prefix;
    let available = inner.width.saturating_sub(prefix.width() as u16);
    let columns = view.columns();
    let widths = column_widths(columns, &rows);
    let shown = visible_columns(&widths, app.selected_column_index(), available);

    let header = Row::new(shown.clone().map(|idx| {
        let column = &columns[idx];
        let mut label = column.label.clone();
        if let Some(sort) = view.sort().filter(|s| s.column == column.key) {
            label = format!("{} {}", label, sort.direction.arrow());
        }

        let mut style = Style::default().fg(theme.header).add_modifier(Modifier::BOLD);
        if view.current_filter(&column.key).is_some() {
            style = style.fg(theme.filter_highlight);
        }
        if idx == app.selected_column_index() {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        Cell::from(truncate(&label, widths[idx] as usize)).style(style)
    }));

    let body = rows.iter().enumerate().map(|(row_idx, record)| {
        let cells = shown.clone().map(|idx| {
            let column = &columns[idx];
            let text = truncate(&record.display(&column.key), widths[idx] as usize);
            let cell = Cell::from(text);
            if idx == app.selected_column_index() {
                cell.style(Style::default().fg(theme.accent))
            } else {
                cell
            }
        });
        let bg = if row_idx % 2 == 1 {
            theme.stripe_bg
        } else {
            theme.background
        };
        Row::new(cells).style(Style::default().fg(theme.foreground).bg(bg))
    });

    let constraints = shown.clone().map(|idx| Constraint::Length(widths[idx]));

    let table = Table::new(body, constraints)
        .header(header)
        .column_spacing(COLUMN_GAP)
        .row_highlight_style(
            Style::default()
                .fg(theme.selection_fg)
                .bg(theme.selection_bg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(prefix.as_str())
        .highlight_spacing(HighlightSpacing::Always);

    let mut state = TableState::default().with_selected(Some(app.selected_row()));
    f.render_stateful_widget(table, inner, &mut state);
}

/// Draw the status bar
fn draw_status_bar(f: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let status = match app.mode() {
        InputMode::EditFilter { operator, .. } => format!(
            " {} matches | Tab: operator ({}) | Enter: done | Esc: cancel",
            app.view().total_count(),
            operator.name()
        ),
        InputMode::Browse => status_text(app),
    };

    let status_bar =
        Paragraph::new(status).style(Style::default().fg(theme.dimmed).bg(theme.background));
    f.render_widget(status_bar, area);
}

fn status_text(app: &App) -> String {
    let view = app.view();
    let total = view.total_count();
    let range = view.visible_range();

    let rows = if range.is_empty() {
        format!("0 of {}", total)
    } else {
        format!("{}-{} of {}", range.start + 1, range.end, total)
    };
    let filtered = if total != view.records().len() {
        format!(" (filtered from {})", view.records().len())
    } else {
        String::new()
    };
    let page = match view.pagination() {
        Some(p) => format!(" | Page {}/{}", p.page + 1, p.page_count().max(1)),
        None => String::new(),
    };
    let sort = match view.sort() {
        Some(s) => format!(" | Sort: {} {}", s.column, s.direction.arrow()),
        None => String::new(),
    };

    format!(
        " {}{}{}{} | ←→: column | /: filter | s: sort | n/p: page | c: clear | q: quit",
        rows, filtered, page, sort
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use darkwall_grid::column::Column;
    use darkwall_grid::record::Record;
    use darkwall_grid::view::TableView;
    use ratatui::{backend::TestBackend, Terminal};
    use std::path::PathBuf;

    fn app(records: Vec<Record>) -> App {
        let columns = vec![Column::new("name"), Column::new("value")];
        let mut view = TableView::new(records, columns);
        view.set_page(0, 2);
        App::new(view, Config::default(), PathBuf::from("/tmp/items.json"))
    }

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 10)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn items() -> Vec<Record> {
        (1..=3)
            .map(|i| Record::new().with("name", format!("Item {}", i)).with("value", i * 10))
            .collect()
    }

    #[test]
    fn test_draws_header_rows_and_status() {
        let screen = render(&app(items()));
        assert!(screen.contains("darkwall-grid · items.json"));
        assert!(screen.contains("Name"));
        assert!(screen.contains("Item 1"));
        assert!(screen.contains("Item 2"));
        assert!(!screen.contains("Item 3"), "second page not drawn");
        assert!(screen.contains("1-2 of 3"));
        assert!(screen.contains("Page 1/2"));
    }

    #[test]
    fn test_draws_empty_message() {
        let screen = render(&app(Vec::new()));
        assert!(screen.contains("No records"));
        assert!(screen.contains("0 of 0"));
    }

    #[test]
    fn test_status_text_reports_filtering() {
        let mut app = app(items());
        app.start_filter();
        app.push_filter_char('3');
        app.handle_key(crossterm::event::KeyEvent::new(
            crossterm::event::KeyCode::Enter,
            crossterm::event::KeyModifiers::NONE,
        ));
        let status = status_text(&app);
        assert!(status.contains("1-1 of 1 (filtered from 3)"), "{status}");
    }
}
