use logscope::cli::{init_config, Cli};
use logscope::config::Config;
use logscope::event_handler::EventHandler;
use logscope::headless::{export_records, format_summary};
use logscope::log::LogSource;
use logscope::logging::{init_logging, LogTarget};
use logscope::ui::{self, App};
use logscope::worker::{IngestionWorker, WorkerHandle};

use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::time::Duration;
use tracing::info;

/// How long exit waits for blocking reads still parked on a quiet source
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run());
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

async fn run() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Handle --init flag
    if cli.init {
        return init_config(&cli.config);
    }

    let config = Config::load_or_default(&cli.config)?;
    config.validate()?;
    let source = cli.source(&config)?;

    // Keep the guard alive so buffered log lines are written on exit
    let _log_guard = init_logging(&LogTarget::resolve(cli.headless, cli.log_file(&config)))?;
    info!(source = %source, headless = cli.headless, "logscope starting");

    if cli.headless {
        return run_headless(&config, source).await;
    }

    let mut worker = IngestionWorker::spawn(config.worker_config());
    worker.start(source.clone());

    let mut app = App::new(config.view_config());
    app.source_label = source.to_string();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // TUI event loop
    let result = run_app(&mut terminal, &mut app, &mut worker).await;

    // Flushes whatever the worker still holds before the terminal goes away
    worker.shutdown().await;

    // Cleanup terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    worker: &mut WorkerHandle,
) -> anyhow::Result<()> {
    let mut events = EventStream::new();
    let mut worker_open = true;

    loop {
        // Take everything already delivered so one frame covers several batches
        while let Some(message) = worker.try_recv() {
            app.apply_message(message);
        }

        terminal.draw(|f| ui::draw(f, app))?;

        if app.should_quit {
            break;
        }

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(event)) => {
                    EventHandler::new(app).handle_event(event);
                }
                Some(Err(err)) => return Err(err.into()),
                None => break,
            },
            message = worker.recv(), if worker_open => match message {
                Some(message) => app.apply_message(message),
                None => worker_open = false,
            },
        }
    }

    Ok(())
}

async fn run_headless(config: &Config, source: LogSource) -> anyhow::Result<()> {
    let mut out = std::io::BufWriter::new(std::io::stdout());
    let summary = export_records(config.fetcher(), source, &mut out).await?;
    eprintln!("{}", format_summary(&summary));
    Ok(())
}
