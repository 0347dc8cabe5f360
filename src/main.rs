use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use crossterm::{
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
};
use tui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use construction_dashboard::config::{self, Config};
use construction_dashboard::feed::{assemble, filter_by_name, ProjectFeed};
use construction_dashboard::logging;
use construction_dashboard::progress::DurationRules;
use construction_dashboard::store::{DocumentStore, MemoryDocumentStore, OrderBy, PgDocumentStore, StoreError};
use construction_dashboard::ui::{
    components::project_card::ProjectCard,
    projects::{ProjectsState, ProjectAction, render_projects, handle_input},
    startup::{render_error, render_startup, handle_error_input},
};

/// How long the UI waits for a key before redrawing with fresh feed data
const TICK: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "construction-dashboard", version, about = "Live dashboard of construction projects")]
struct Cli {
    /// Postgres URL of the document store (overrides DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,
    /// JSON seed for the in-memory store, used when no database is configured
    #[arg(long)]
    seed_file: Option<PathBuf>,
    /// Collection holding client documents (overrides PROJECTS_COLLECTION)
    #[arg(long)]
    collection: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive dashboard (default)
    Tui,
    /// Print the current projects once
    List {
        /// Only projects whose client name contains this text
        #[arg(long, default_value = "")]
        search: String,
        /// Print the display fields as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Check that the document store is reachable
    Probe,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::init()?.with_overrides(cli.database_url, cli.seed_file, cli.collection);
    let _log_guard = logging::init(&config)?;
    tracing::info!("Starting construction dashboard");

    let command = cli.command.unwrap_or(Command::Tui);
    match config.database_url() {
        Some(url) => {
            let store = PgDocumentStore::new(url, &config).await;
            run(command, &config, store).await
        }
        None => {
            let store = match &config.seed_file {
                Some(path) => MemoryDocumentStore::from_seed_file(path),
                None => {
                    tracing::warn!("No DATABASE_URL or SEED_FILE configured, starting with an empty store");
                    Ok(MemoryDocumentStore::new())
                }
            };
            run(command, &config, store).await
        }
    }
}

async fn run<S: DocumentStore>(
    command: Command,
    config: &Config,
    store: Result<S, StoreError>,
) -> Result<()> {
    match command {
        Command::Tui => run_tui(config, store).await,
        Command::List { search, json } => {
            let store = connect(config, store).await?;
            print_projects(config, &store, &search, json).await
        }
        Command::Probe => {
            connect(config, store).await?;
            println!("Document store is reachable");
            Ok(())
        }
    }
}

/// Confirm the store answers by listing the probe collection.
async fn connect<S: DocumentStore>(config: &Config, store: Result<S, StoreError>) -> Result<S, StoreError> {
    let store = store?;
    match store.list_documents(&config.probe_collection).await {
        Ok(documents) => {
            tracing::info!(
                collection = %config.probe_collection,
                documents = documents.len(),
                "Document store connected"
            );
            Ok(store)
        }
        Err(err) => {
            tracing::error!(error = %err, "Document store initialization failed");
            Err(err)
        }
    }
}

fn duration_rules(config: &Config) -> DurationRules {
    DurationRules::new(config.duration_policy, config.default_construction_days)
}

fn project_order(config: &Config) -> OrderBy {
    OrderBy::new(config.order_field.clone(), config.order_direction)
}

async fn print_projects<S: DocumentStore>(
    config: &Config,
    store: &S,
    search: &str,
    json: bool,
) -> Result<()> {
    let mut subscription = store.subscribe(&config.projects_collection, project_order(config));
    let snapshot = match subscription.next().await {
        Some(Ok(snapshot)) => snapshot,
        Some(Err(err)) => return Err(err.into()),
        None => bail!("subscription to {} ended before any data arrived", config.projects_collection),
    };
    subscription.cancel();

    let projects = assemble(&snapshot, Utc::now(), duration_rules(config), &Local);
    let cards: Vec<ProjectCard> = filter_by_name(&projects, search)
        .into_iter()
        .map(ProjectCard::from_view_model)
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&cards)?);
    } else if cards.is_empty() {
        println!("Нет проектов");
    } else {
        for card in &cards {
            println!("{}", card.to_text());
        }
    }
    Ok(())
}

async fn run_tui<S: DocumentStore>(config: &Config, store: Result<S, StoreError>) -> Result<()> {
    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, config, store).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Show any error message
    if let Err(err) = result {
        tracing::error!(error = %err, "Dashboard stopped");
        println!("Error: {}", err);
    }

    println!("Dashboard closed");

    Ok(())
}

async fn run_app<B: Backend, S: DocumentStore>(
    terminal: &mut Terminal<B>,
    config: &Config,
    store: Result<S, StoreError>,
) -> Result<()> {
    terminal.draw(|f| render_startup(f))?;

    let store = match connect(config, store).await {
        Ok(store) => store,
        Err(err) => return show_fatal_error(terminal, &err.to_string()),
    };

    let subscription = store.subscribe(&config.projects_collection, project_order(config));
    let (feed, receiver) = ProjectFeed::new(subscription, duration_rules(config), config.subscription_errors);
    let feed_task = tokio::spawn(feed.run());

    let mut state = ProjectsState::new(receiver);
    let result = loop {
        if let Err(err) = terminal.draw(|f| render_projects(f, &mut state)) {
            break Err(err.into());
        }
        match handle_input(&mut state, TICK) {
            Ok(Some(ProjectAction::Quit)) => break Ok(()),
            Ok(None) => {}
            Err(err) => break Err(err),
        }
    };

    // Dropping the page drops the last observer, which stops the feed and
    // releases its subscription.
    drop(state);
    feed_task.await.ok();
    tracing::info!("Project feed released");

    result
}

/// Connectivity failures end the session: show the message until the user quits.
fn show_fatal_error<B: Backend>(terminal: &mut Terminal<B>, message: &str) -> Result<()> {
    loop {
        terminal.draw(|f| render_error(f, message))?;
        if handle_error_input(TICK)? {
            return Ok(());
        }
    }
}
