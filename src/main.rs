mod app;
mod auth;
mod cache;
mod connection;
mod credentials;
mod devops;
mod diff;
mod error;
mod events;
mod filter;
mod keybindings;
mod saved_search;
mod session;
mod settings;
mod table;
mod theme;
mod ui;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{fs, io, sync::Arc, sync::Mutex, time::Duration};

use crate::{
    app::{App, InputMode},
    connection::{resolve_connection, Connection, ConnectionArgs},
    devops::{AzureDevOpsClient, FetchQuery, LoaderOptions, PullRequestLoader},
    error::AppError,
    events::{Action, Event, EventHandler},
    filter::{parse_date, sort_newest_first, FilterEngine, FilterState, StatusFilter},
    saved_search::SavedSearchStore,
    session::Session,
    settings::{config_dir, FileSettingsStore, Settings, SettingsStore},
    theme::Theme,
};

#[derive(Parser, Debug)]
#[command(name = "azpr")]
#[command(about = "Browse and filter Azure DevOps pull requests", long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print pull requests as a table
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// Start from a saved search; filter flags override its values
        #[arg(long)]
        saved: Option<String>,

        /// Print the matching records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Open the interactive browser (default)
    Browse {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Manage saved searches
    Searches {
        #[command(subcommand)]
        command: SearchCommand,
    },
}

#[derive(Subcommand, Debug)]
enum SearchCommand {
    /// List saved searches by name
    List,
    /// Save the given filters under a name
    Save {
        name: String,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Delete the first saved search with this name
    Delete { name: String },
    /// Print a saved search as JSON
    Show { name: String },
}

#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Author display name contains this text
    #[arg(long)]
    author: Option<String>,

    /// Target branch contains this text
    #[arg(long)]
    target_branch: Option<String>,

    /// Text searched in title, author and description
    #[arg(long)]
    search: Option<String>,

    /// Status such as Active, Completed or Abandoned ("All" disables)
    #[arg(long)]
    status: Option<String>,

    /// Only requests created on or after this day (YYYY-MM-DD)
    #[arg(long)]
    from_date: Option<String>,

    /// Only requests touching a file with this extension
    #[arg(long)]
    extension: Option<String>,

    /// Only requests with at least this many changed files
    #[arg(long)]
    min_changes: Option<String>,
}

impl FilterArgs {
    /// Replaces the dimensions given on the command line
    fn overlay(&self, mut state: FilterState) -> FilterState {
        if let Some(author) = &self.author {
            state = state.with_author(author.trim());
        }
        if let Some(branch) = &self.target_branch {
            state = state.with_target_branch(branch.trim());
        }
        if let Some(text) = &self.search {
            state = state.with_search_text(text.trim());
        }
        if let Some(status) = &self.status {
            state = state.with_status(StatusFilter::parse(status));
        }
        if let Some(date) = &self.from_date {
            if parse_date(date).is_none() {
                tracing::warn!(input = %date, "ignoring from-date, expected YYYY-MM-DD");
            }
            state = state.with_from_date_input(date);
        }
        if let Some(extension) = &self.extension {
            state = state.with_file_extension(extension.trim());
        }
        if let Some(min) = &self.min_changes {
            state = state.with_min_changes_input(min);
        }
        state
    }
}

fn init_logging(to_file: bool) {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    // The browser owns the terminal, so its logs go to a file
    let file = if to_file {
        let dir = config_dir();
        fs::create_dir_all(&dir)
            .and_then(|_| {
                fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(dir.join("azpr.log"))
            })
            .map_err(|e| eprintln!("Warning: logging disabled, cannot open log file: {e}"))
            .ok()
    } else {
        None
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match file {
        Some(file) => builder.with_writer(Mutex::new(file)).with_ansi(false).init(),
        None if to_file => builder.with_writer(io::sink).init(),
        None => builder.with_writer(io::stderr).init(),
    }
}

fn build_loader(connection: &Connection, settings: &Settings) -> Result<PullRequestLoader> {
    let client = AzureDevOpsClient::new(&connection.organization, &connection.token)?;
    let options = LoaderOptions {
        line_stats: settings.line_stats,
        concurrency: settings.concurrency,
    };
    Ok(PullRequestLoader::new(Arc::new(client), options))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let browsing = matches!(cli.command, None | Some(Command::Browse { .. }));
    init_logging(browsing);

    let store = FileSettingsStore::open_default();
    let settings = store.load();

    match cli.command {
        Some(Command::List {
            filters,
            saved,
            json,
        }) => run_list(&cli.connection, &filters, saved.as_deref(), json, settings, &store).await,
        Some(Command::Searches { command }) => run_searches(command, settings, &store),
        Some(Command::Browse { filters }) => {
            run_browse(&cli.connection, &filters, settings, store).await
        }
        None => run_browse(&cli.connection, &FilterArgs::default(), settings, store).await,
    }
}

async fn run_list(
    args: &ConnectionArgs,
    filters: &FilterArgs,
    saved: Option<&str>,
    json: bool,
    mut settings: Settings,
    store: &FileSettingsStore,
) -> Result<()> {
    let connection = resolve_connection(args, &settings)?;

    let base = match saved {
        Some(name) => {
            let store = SavedSearchStore::new(&mut settings, store);
            match store.find(name) {
                Some(search) => search.filter_state(),
                None => bail!("No saved search named '{name}'"),
            }
        }
        None => FilterState::default(),
    };
    let filter = filters.overlay(base);

    let loader = build_loader(&connection, &settings)?;
    let query = FetchQuery::new(&connection.project, &connection.repository);
    let mut records = loader.fetch(&query).await.map_err(AppError::Fetch)?;

    connection.remember(&mut settings);
    store.save(&settings);

    sort_newest_first(&mut records);
    let view = FilterEngine::apply(&records, &filter);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&view.records).context("Failed to encode records")?
        );
        eprintln!("{}", view.status_line());
    } else {
        print!("{}", table::render(&view.records));
        println!("{}", view.status_line());
    }

    Ok(())
}

fn run_searches(command: SearchCommand, mut settings: Settings, store: &FileSettingsStore) -> Result<()> {
    let mut searches = SavedSearchStore::new(&mut settings, store);

    match command {
        SearchCommand::List => {
            let list = searches.list();
            if list.is_empty() {
                println!("No saved searches.");
            }
            for search in list {
                let filter = search.filter_state();
                println!(
                    "{:<24} author={:<16} target={:<16} text={:<16} status={}",
                    table::truncate(&search.name, 21),
                    filter.author,
                    filter.target_branch,
                    filter.search_text,
                    filter.status.label()
                );
            }
        }
        SearchCommand::Save { name, filters } => {
            let saved = searches
                .save(&name, &filters.overlay(FilterState::default()))
                .map_err(AppError::from)?;
            println!("Saved search '{}'", saved.name);
        }
        SearchCommand::Delete { name } => {
            let Some(search) = searches.find(&name).cloned() else {
                bail!("No saved search named '{}'", name.trim());
            };
            searches.delete(&search);
            println!("Deleted saved search '{}'", search.name);
        }
        SearchCommand::Show { name } => {
            let Some(search) = searches.find(&name) else {
                bail!("No saved search named '{}'", name.trim());
            };
            println!(
                "{}",
                serde_json::to_string_pretty(search).context("Failed to encode saved search")?
            );
        }
    }

    Ok(())
}

async fn run_browse(
    args: &ConnectionArgs,
    filters: &FilterArgs,
    mut settings: Settings,
    store: FileSettingsStore,
) -> Result<()> {
    let connection = resolve_connection(args, &settings)?;
    connection.remember(&mut settings);

    // Check if we're in a TTY environment
    if !crossterm::tty::IsTty::is_tty(&io::stdout()) {
        eprintln!("Error: This application requires a terminal environment to run.");
        eprintln!("Use `azpr list` to print pull requests through a pipe or redirect.");
        return Ok(());
    }

    let theme = match settings.get_theme() {
        Ok(theme) => theme,
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), theme = %settings.theme, "falling back to built-in theme");
            Theme::builtin()?
        }
    };

    let loader = build_loader(&connection, &settings)?;
    let query = FetchQuery::new(&connection.project, &connection.repository);
    let filter = filters.overlay(settings.filters.to_filter_state());
    let session = Session::new(loader, query, filter);
    let mut app = App::new(session, settings, Box::new(store), theme);

    // Setup terminal
    enable_raw_mode()
        .context("Failed to enable raw mode - make sure you're running in a terminal")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    terminal.clear()?;

    let app_result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    app_result
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    let event_handler = EventHandler::new();

    // Create key mapping from settings
    let key_mapping = app
        .settings
        .keybindings
        .create_mapping()
        .context("Failed to create key bindings mapping")?;

    app.start_refresh();

    loop {
        app.on_tick();

        terminal.draw(|f| ui::render(f, app))?;

        if let Some(event) = event_handler.poll(Duration::from_millis(100))? {
            match event {
                Event::Key(key) if app.input_mode == InputMode::Normal => {
                    if let Some(action) = Action::from_key_event(key, &key_mapping) {
                        app.handle_action(action)?;
                    }
                }
                Event::Key(key) => app.handle_input_key(key),
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollDown => app.handle_action(Action::NavigateDown)?,
                    MouseEventKind::ScrollUp => app.handle_action(Action::NavigateUp)?,
                    _ => {}
                },
                Event::Resize(..) | Event::Tick => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    let size = terminal.size()?;
    app.persist(size.width, size.height);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_list_flags() {
        let cli = Cli::parse_from([
            "azpr",
            "list",
            "-o",
            "org",
            "--author",
            "alice",
            "--min-changes",
            "many",
            "--json",
        ]);

        assert_eq!(cli.connection.organization.as_deref(), Some("org"));
        match cli.command {
            Some(Command::List { filters, json, .. }) => {
                assert!(json);
                let state = filters.overlay(FilterState::default());
                assert_eq!(state.author, "alice");
                assert_eq!(state.min_changes, 0);
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_browse_is_default() {
        let cli = Cli::parse_from(["azpr", "--url", "https://dev.azure.com/o/p/_git/r"]);
        assert!(cli.command.is_none());
        assert!(cli.connection.url.is_some());
    }

    #[test]
    fn test_overlay_keeps_unset_dimensions() {
        let base = FilterState::default()
            .with_author("alice")
            .with_status(StatusFilter::parse("Active"));
        let args = FilterArgs {
            status: Some("all".to_string()),
            extension: Some(".cs".to_string()),
            ..FilterArgs::default()
        };

        let state = args.overlay(base);
        assert_eq!(state.author, "alice");
        assert_eq!(state.status, StatusFilter::All);
        assert_eq!(state.file_extension, ".cs");
    }
}
