use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use albumhunt_core::session::ListView;
use albumhunt_core::{
    load_config, validate_config, AcquisitionRecord, CatalogClient, Intent, MusicBrainzClient,
    Phase, PollController, Session, SessionHandle, SessionRunner, SlskdClient, Snapshot,
    SourceNetwork,
};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Logs go to stderr, stdout carries the record
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = std::env::var("ALBUMHUNT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("albumhunt.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    let catalog: Arc<dyn CatalogClient> = Arc::new(
        MusicBrainzClient::new(&config.catalog).context("Failed to create catalog client")?,
    );
    let source: Arc<dyn SourceNetwork> = Arc::new(
        SlskdClient::new(config.source.clone()).context("Failed to create source client")?,
    );
    info!("Using catalog {} and source {}", config.catalog.base_url, source.name());

    let poller = PollController::new(Arc::clone(&source), config.poll.clone());
    let session = Session::new(&config.filters, config.poll.clone());
    let (runner, handle) = SessionRunner::new(session, catalog, source, poller);

    tokio::spawn(render_loop(handle.clone()));
    // Blocking stdin reads stay off the runtime so shutdown never waits on them
    let input = handle.clone();
    std::thread::spawn(move || input_loop(input));
    tokio::spawn(cancel_on_ctrl_c(handle));

    let last = runner.run().await;

    if let Some(record) = &last.record {
        emit_record(record, config.output.record_path.as_deref())?;
    }
    Ok(())
}

/// Print the record to stdout and, if configured, to a file.
fn emit_record(record: &AcquisitionRecord, path: Option<&Path>) -> Result<()> {
    info!(
        "Queued {} files ({} MB) from {}",
        record.files.len(),
        record.total_size() / (1024 * 1024),
        record.username
    );
    let json = serde_json::to_string_pretty(record).context("Failed to serialize record")?;
    println!("{}", json);

    if let Some(path) = path {
        std::fs::write(path, &json)
            .with_context(|| format!("Failed to write record to {:?}", path))?;
        info!("Record written to {:?}", path);
    }
    Ok(())
}

/// Map stdin lines to intents.
fn input_loop(handle: SessionHandle) {
    for line in std::io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read input: {}", e);
                break;
            }
        };

        let phase = handle.snapshot().phase;
        let Some(intent) = parse_intent(&line, phase) else {
            eprintln!("keys: enter b j k g G f s t a d /q");
            continue;
        };
        if !handle.send(intent) {
            break;
        }
    }
    handle.send(Intent::Cancel);
}

fn parse_intent(line: &str, phase: Phase) -> Option<Intent> {
    let trimmed = line.trim();
    if trimmed == "/q" {
        return Some(Intent::Cancel);
    }
    if phase == Phase::AwaitingQuery {
        return Some(Intent::Submit(trimmed.to_string()));
    }
    let intent = match trimmed {
        "" => Intent::Confirm,
        "b" => Intent::Back,
        "j" => Intent::CursorDown,
        "k" => Intent::CursorUp,
        "g" => Intent::CursorHome,
        "G" => Intent::CursorEnd,
        "f" => Intent::CycleFormat,
        "s" => Intent::ToggleFreeSlot,
        "t" => Intent::ToggleTrackCount,
        "a" => Intent::ToggleAlbumsOnly,
        "d" => Intent::ToggleDedup,
        _ => return None,
    };
    Some(intent)
}

async fn cancel_on_ctrl_c(handle: SessionHandle) {
    if signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl+C, cancelling");
        handle.send(Intent::Cancel);
    }
}

/// Print a compact summary to stderr on every snapshot change.
async fn render_loop(handle: SessionHandle) {
    let mut snapshots = handle.subscribe();
    render(&snapshots.borrow_and_update().clone());
    while snapshots.changed().await.is_ok() {
        let snapshot = snapshots.borrow_and_update().clone();
        render(&snapshot);
    }
}

fn render(snapshot: &Snapshot) {
    let filters = &snapshot.filters;
    eprintln!(
        "[{}] {}  (format={} slot={} tracks={} albums={} dedup={})",
        phase_label(snapshot.phase),
        snapshot.status,
        filters.format.as_str(),
        filters.require_free_slot,
        filters.require_track_count,
        filters.albums_only,
        filters.dedup_releases,
    );

    let rows: Vec<String> = match &snapshot.list {
        ListView::None => Vec::new(),
        ListView::Artists(items) => items
            .iter()
            .map(|a| match &a.disambiguation {
                Some(d) => format!("{} ({})", a.name, d),
                None => a.name.clone(),
            })
            .collect(),
        ListView::ReleaseGroups(items) => items
            .iter()
            .map(|g| format!("{} [{}]", g.title, g.year().unwrap_or("----")))
            .collect(),
        ListView::Releases(items) => items
            .iter()
            .map(|r| {
                format!(
                    "{} [{}] {} {} tracks {}",
                    r.title,
                    r.year().unwrap_or("----"),
                    r.format,
                    r.track_count,
                    r.country.as_deref().unwrap_or("??")
                )
            })
            .collect(),
        ListView::Sources(items) => items
            .iter()
            .map(|c| {
                format!(
                    "{} {} files {} {} MB {} KB/s{}",
                    c.username,
                    c.file_count(),
                    c.format,
                    c.total_size / (1024 * 1024),
                    c.upload_speed / 1024,
                    if c.year_match { " *" } else { "" }
                )
            })
            .collect(),
    };

    for (i, row) in rows.iter().enumerate() {
        let marker = if i == snapshot.cursor { ">" } else { " " };
        eprintln!("{} {}", marker, row);
    }
}

/// Phase name, with a trailing ellipsis while an operation is running.
fn phase_label(phase: Phase) -> String {
    if phase.is_loading() {
        format!("{}...", phase)
    } else {
        phase.to_string()
    }
}
