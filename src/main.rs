mod app;
mod config;
mod print;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use darkwall_grid::column::{infer_columns, parse_column_list};
use darkwall_grid::loader;
use darkwall_grid::session::Sessions;
use darkwall_grid::view::{Filter, SortDirective, SortMode, TableView};

use app::App;
use config::{Config, SessionConfig};

#[derive(Parser, Debug)]
#[command(name = "dgrid")]
#[command(about = "Filter, sort and page through JSON records in the terminal")]
#[command(version)]
struct Cli {
    /// JSON array or JSON Lines file to display
    file: PathBuf,

    /// Config file path
    #[arg(long, default_value = "~/.config/darkwall-grid/config.toml")]
    config: String,

    /// Comma separated column keys, overriding the config
    #[arg(long, value_name = "KEY,KEY,...")]
    columns: Option<String>,

    /// Filter as `key:value` (contains) or `key:op:value`; repeatable
    #[arg(long = "filter", value_name = "KEY:OP:VALUE")]
    filters: Vec<Filter>,

    /// Sort as `column` or `column:asc|desc`
    #[arg(long, value_name = "COLUMN[:DIR]")]
    sort: Option<SortDirective>,

    /// Page to show, starting at 1
    #[arg(long)]
    page: Option<usize>,

    /// Rows per page
    #[arg(long)]
    page_size: Option<usize>,

    /// Compare sort keys as plain strings
    #[arg(long)]
    lexical_sort: bool,

    /// Print the view as a plain table and exit
    #[arg(long)]
    print: bool,

    /// Neither restore nor save the view for this file
    #[arg(long)]
    no_session: bool,

    /// Ignore the saved view for this file
    #[arg(long)]
    reset: bool,

    /// Write logs to a file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    // Load config
    let config = Config::load(&cli.config)?;

    // Load records
    let records = loader::load_file(&cli.file, &config.loader.options())
        .with_context(|| format!("Failed to load records from {}", cli.file.display()))?;

    let columns = match &cli.columns {
        Some(list) => parse_column_list(list),
        None => {
            let configured = config.columns();
            if configured.is_empty() {
                infer_columns(&records)
            } else {
                configured
            }
        }
    };
    tracing::debug!("Showing {} columns", columns.len());

    let sort_mode = if cli.lexical_sort {
        SortMode::Lexical
    } else {
        config.view.sort_mode
    };
    let mut view = TableView::new(records, columns).with_sort_mode(sort_mode);

    // Print mode is stateless; only the TUI restores and saves views
    let mut sessions = if config.session.enabled && !cli.no_session && !cli.print {
        Some(open_sessions(&config.session))
    } else {
        None
    };

    let saved = sessions
        .as_ref()
        .filter(|_| !cli.reset)
        .and_then(|s| s.get(&cli.file).cloned());
    match saved {
        Some(state) => {
            tracing::info!("Restoring saved view for {}", cli.file.display());
            view.restore_state(state);
        }
        None => {
            if let Some(sort) = &config.view.default_sort {
                view.set_sort(&sort.column, sort.direction);
            }
        }
    }

    apply_cli(&mut view, &cli, &config);

    if cli.print {
        print::print(&view).context("Failed to write table")?;
        return Ok(());
    }

    if view.pagination().is_none() {
        view.set_page(0, config.view.page_size);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(view, config, cli.file.clone());

    // Run main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Some(sessions) = sessions.as_mut() {
        sessions.record(app.data_path(), app.view().state());
        if let Err(e) = sessions.save() {
            tracing::warn!("Failed to save session: {}", e);
        }
    }

    result
}

/// `RUST_LOG` filter with a fmt layer on stderr, or on `log_file` when given
fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "darkwall_grid=info,dgrid=info".into());

    let (stderr_layer, file_layer) = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            (None, Some(layer))
        }
        None => (
            Some(tracing_subscriber::fmt::layer().with_writer(io::stderr)),
            None,
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(())
}

fn open_sessions(config: &SessionConfig) -> Sessions {
    let mut sessions = Sessions::new(config.max_entries, config.decay_after_days);
    if let Err(e) = sessions.load() {
        tracing::warn!("Failed to load sessions: {}", e);
    }
    sessions
}

/// Command line directives, applied over config and any restored view
fn apply_cli(view: &mut TableView, cli: &Cli, config: &Config) {
    for filter in &cli.filters {
        view.set_filter(&filter.key, filter.value.clone(), Some(filter.operator));
    }

    if let Some(sort) = &cli.sort {
        view.set_sort(&sort.column, sort.direction);
    }

    if cli.page.is_some() || cli.page_size.is_some() {
        let page_size = cli
            .page_size
            .or_else(|| view.pagination().map(|p| p.page_size))
            .unwrap_or(config.view.page_size);
        let page = cli.page.map(|p| p.saturating_sub(1)).unwrap_or(0);
        view.set_page(page, page_size);
    }
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }

        if app.should_quit() {
            return Ok(());
        }
    }
}
