use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::path::{Path, PathBuf};

use darkwall_grid::column::Column;
use darkwall_grid::record::Value;
use darkwall_grid::view::{Filter, FilterOperator, TableView};

use crate::config::Config;
use crate::ui::theme::Theme;

/// Input mode - determines how keys are interpreted
#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    /// Moving around the grid
    Browse,
    /// Typing into the filter of one column. Every keystroke re-filters.
    EditFilter {
        key: String,
        buffer: String,
        operator: FilterOperator,
        /// Filter in place before editing started, restored on Esc
        original: Option<Filter>,
    },
}

/// Application state
pub struct App {
    /// Filter/sort/page engine for the loaded records
    view: TableView,
    /// Configuration
    config: Config,
    /// Resolved colours
    theme: Theme,
    /// File the records came from
    data_path: PathBuf,
    mode: InputMode,
    /// Index into `view.columns()`
    selected_column: usize,
    /// Index into the visible page
    selected_row: usize,
    should_quit: bool,
}

impl App {
    pub fn new(view: TableView, config: Config, data_path: PathBuf) -> Self {
        let theme = config.resolve_theme();
        Self {
            view,
            config,
            theme,
            data_path,
            mode: InputMode::Browse,
            selected_column: 0,
            selected_row: 0,
            should_quit: false,
        }
    }

    pub fn view(&self) -> &TableView {
        &self.view
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn mode(&self) -> &InputMode {
        &self.mode
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, InputMode::EditFilter { .. })
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn selected_column_index(&self) -> usize {
        self.selected_column
    }

    pub fn selected_column(&self) -> Option<&Column> {
        self.view.columns().get(self.selected_column)
    }

    pub fn selected_row(&self) -> usize {
        self.selected_row
    }

    fn page_size(&self) -> usize {
        self.view
            .pagination()
            .map(|p| p.page_size)
            .unwrap_or(self.config.view.page_size)
    }

    /// Dispatch a key press
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.is_editing() {
            self.handle_edit_key(key.code);
        } else {
            self.handle_browse_key(key.code);
        }
    }

    fn handle_browse_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Left | KeyCode::Char('h') => self.previous_column(),
            KeyCode::Right | KeyCode::Char('l') => self.next_column(),
            KeyCode::Up | KeyCode::Char('k') => self.previous_row(),
            KeyCode::Down | KeyCode::Char('j') => self.next_row(),
            KeyCode::Home | KeyCode::Char('g') => self.selected_row = 0,
            KeyCode::End | KeyCode::Char('G') => {
                self.selected_row = self.view.visible_range().len().saturating_sub(1)
            }
            KeyCode::Char('/') => self.start_filter(),
            KeyCode::Char('s') => self.toggle_sort(),
            KeyCode::Char('n') | KeyCode::PageDown => self.next_page(),
            KeyCode::Char('p') | KeyCode::PageUp => self.previous_page(),
            KeyCode::Char('c') => self.clear_filters(),
            KeyCode::Char('x') => self.clear_column_filter(),
            KeyCode::Char('R') => self.reset_view(),
            _ => {}
        }
    }

    fn handle_edit_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => self.cancel_filter(),
            KeyCode::Enter => self.mode = InputMode::Browse,
            KeyCode::Tab => self.cycle_operator(),
            KeyCode::Backspace => self.pop_filter_char(),
            KeyCode::Char(c) => self.push_filter_char(c),
            _ => {}
        }
    }

    pub fn next_column(&mut self) {
        let count = self.view.columns().len();
        if self.selected_column + 1 < count {
            self.selected_column += 1;
        }
    }

    pub fn previous_column(&mut self) {
        self.selected_column = self.selected_column.saturating_sub(1);
    }

    pub fn next_row(&mut self) {
        let visible = self.view.visible_range().len();
        if self.selected_row + 1 < visible {
            self.selected_row += 1;
        }
    }

    pub fn previous_row(&mut self) {
        self.selected_row = self.selected_row.saturating_sub(1);
    }

    /// Begin editing the selected column's filter, seeded with its value
    pub fn start_filter(&mut self) {
        let Some(column) = self.selected_column() else {
            return;
        };
        let key = column.key.clone();
        let original = self.view.current_filter(&key).cloned();
        let (buffer, operator) = match &original {
            Some(f) => (f.value.to_string(), f.operator),
            None => (String::new(), FilterOperator::default()),
        };

        self.mode = InputMode::EditFilter {
            key,
            buffer,
            operator,
            original,
        };
    }

    pub fn push_filter_char(&mut self, c: char) {
        if let InputMode::EditFilter { buffer, .. } = &mut self.mode {
            buffer.push(c);
        }
        self.apply_edit();
    }

    pub fn pop_filter_char(&mut self) {
        if let InputMode::EditFilter { buffer, .. } = &mut self.mode {
            buffer.pop();
        }
        self.apply_edit();
    }

    pub fn cycle_operator(&mut self) {
        if let InputMode::EditFilter { operator, .. } = &mut self.mode {
            *operator = operator.cycle();
        }
        self.apply_edit();
    }

    /// Abandon the edit and put back whatever filter was there before
    pub fn cancel_filter(&mut self) {
        let mode = std::mem::replace(&mut self.mode, InputMode::Browse);
        if let InputMode::EditFilter { key, original, .. } = mode {
            match original {
                Some(f) => self.view.set_filter(&f.key, f.value, Some(f.operator)),
                None => {
                    self.view.remove_filter(&key);
                }
            }
            self.rewind_page();
        }
    }

    fn apply_edit(&mut self) {
        let InputMode::EditFilter {
            key,
            buffer,
            operator,
            ..
        } = &self.mode
        else {
            return;
        };
        let (key, value, operator) = (key.clone(), Value::text(buffer.as_str()), *operator);
        self.view.set_filter(&key, value, Some(operator));
        self.rewind_page();
    }

    pub fn toggle_sort(&mut self) {
        if let Some(column) = self.selected_column() {
            let key = column.key.clone();
            self.view.toggle_sort(&key);
            self.clamp_row();
        }
    }

    pub fn next_page(&mut self) {
        if self.view.next_page() {
            self.selected_row = 0;
        }
    }

    pub fn previous_page(&mut self) {
        if self.view.previous_page() {
            self.selected_row = 0;
        }
    }

    pub fn clear_filters(&mut self) {
        self.view.clear_filters();
        self.rewind_page();
    }

    pub fn clear_column_filter(&mut self) {
        if let Some(column) = self.selected_column() {
            let key = column.key.clone();
            if self.view.remove_filter(&key) {
                self.rewind_page();
            }
        }
    }

    /// Filters, sort and page all back to the initial state
    pub fn reset_view(&mut self) {
        let page_size = self.page_size();
        self.view.reset();
        self.view.set_page(0, page_size);
        self.selected_row = 0;
    }

    /// The filtered set changed shape; go back to the first page
    fn rewind_page(&mut self) {
        let page_size = self.page_size();
        self.view.set_page(0, page_size);
        self.selected_row = 0;
    }

    fn clamp_row(&mut self) {
        let visible = self.view.visible_range().len();
        if self.selected_row >= visible {
            self.selected_row = visible.saturating_sub(1);
        }
    }

    /// Text shown in the filter bar
    pub fn filter_summary(&self) -> String {
        self.view
            .filters()
            .iter()
            .map(|f| format!("{} {} {}", f.key, f.operator.symbol(), f.value))
            .collect::<Vec<_>>()
            .join("  ·  ")
    }
}
