// src/main.rs

//! Console front-end for the check-in service.
//!
//! 1. Parse arguments, load configuration & set up structured logging
//! 2. Open SQLite (WAL/NORMAL) and apply the schema
//! 3. Run one subcommand; `scan` wires stdin → scan source → session →
//!    printed reports, with audit records going through the batched writer

// ───── std / 3rd-party imports ──────────────────────────────────────────────
use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use fern::Dispatch;
use log::LevelFilter;
use std::{
    io::BufRead,
    path::{Path, PathBuf},
    process,
    sync::Arc,
    thread,
};
use tokio::{
    runtime::{Handle, Runtime},
    sync::mpsc,
};

// ───── local imports ────────────────────────────────────────────────────────
use ticket_scanner::{
    checkin::{AuditSink, ChannelAudit, CheckInEngine, CheckInError},
    config::{self, Config, LoggingConfig},
    db::{
        connection::{db_path, init_database, open_db_connection},
        maintenance::spawn_wal_maintenance,
        spawn_writer, ParticipantStore, SqliteStore,
    },
    directory::{Directory, FilterMode},
    export,
    model::{TicketType, Transaction},
    scanner::{ChannelSource, ScanReport, ScanSource, ScannerSession},
};

// ───── command line ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "ticket-scanner", version, about = "Event check-in from scanned QR codes")]
struct Cli {
    /// Config file; defaults to `default.toml` next to the executable.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check in codes read from stdin, one per line. `>` and `<` switch ticket type.
    Scan {
        #[arg(long)]
        ticket: Option<TicketType>,
    },
    /// List participants for one ticket type.
    List {
        #[arg(long)]
        ticket: Option<TicketType>,
        /// all, checked-in or not-checked-in
        #[arg(long, default_value = "all")]
        filter: FilterMode,
        /// Case-insensitive match on name or id; overrides --filter.
        #[arg(long)]
        search: Option<String>,
    },
    /// List transactions, newest first.
    Transactions,
    /// Register a new participant under a freshly allocated id.
    Add { name: String },
    /// Write a delimited export into the export directory.
    Export {
        #[arg(value_enum)]
        table: ExportTable,
    },
    /// Load participants from a participant export.
    Import { file: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportTable {
    Participants,
    Transactions,
}

// ───── helpers ──────────────────────────────────────────────────────────────

/// Directory that contains the running executable.
fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configure global logging as requested in `[logging]`.
/// Logs go to stderr so stdout stays clean for reports and listings.
fn setup_logging(exe_dir: &Path, logging: &LoggingConfig) -> Result<(), fern::InitError> {
    let level = match logging.level.to_uppercase().as_str() {
        "ERROR" => LevelFilter::Error,
        "WARN" => LevelFilter::Warn,
        "DEBUG" => LevelFilter::Debug,
        "TRACE" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };

    let log_path = logging
        .enable
        .then(|| exe_dir.join(logging.file.as_deref().unwrap_or("checkin.log")));

    let mut dispatch = Dispatch::new()
        .format(|out, msg, record| {
            out.finish(format_args!(
                "[{}][{:5}][{}][pid={}][tid={:?}] {}",
                Local::now().to_rfc3339(),
                record.level(),
                record.target(),
                process::id(),
                thread::current().id(),
                msg
            ))
        })
        .level(level)
        .chain(std::io::stderr());

    if let Some(path) = log_path {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }

    dispatch.apply()?;
    Ok(())
}

fn print_report(report: &ScanReport) {
    match &report.outcome {
        Ok(done) => println!(
            "OK    {} - {} checked in for {}",
            report.code, done.participant.name, report.ticket
        ),
        Err(CheckInError::AlreadyCheckedIn { name, .. }) => {
            println!("SEEN  {} - {}: QR already scanned for {}", report.code, name, report.ticket)
        }
        Err(e) => println!("FAIL  {}: {}", report.code, e),
    }
}

fn mark(checked_in: bool) -> &'static str {
    if checked_in { "[x]" } else { "[ ]" }
}

// ───── commands ─────────────────────────────────────────────────────────────

async fn scan(
    store: Arc<SqliteStore>,
    exe_dir: &Path,
    cfg: &Config,
    ticket: Option<TicketType>,
) -> Result<()> {
    // 1 ─ Batched audit writer on its own connection
    let path = db_path(exe_dir, &cfg.database);
    let writer_conn = open_db_connection(&path, &cfg.database).context("opening writer connection")?;
    let (audit_tx, audit_rx) = mpsc::channel::<Transaction>(cfg.database.writer_capacity.max(1));
    let rt = Handle::current();
    let writer = spawn_writer(&rt, writer_conn, audit_rx, &cfg.database);
    let maintenance = spawn_wal_maintenance(&rt, path, &cfg.database);

    // 2 ─ Engine & session
    let engine = CheckInEngine::new(store, Arc::new(ChannelAudit::new(audit_tx)))
        .with_max_id_attempts(cfg.scanner.max_id_attempts);
    let mut session = ScannerSession::new(Arc::new(engine), &cfg.scanner);
    if let Some(t) = ticket {
        session.select(t);
    }
    println!("Scanning for {}. Enter codes; '>' / '<' switch ticket type.", session.ticket());

    // 3 ─ stdin stands in for the camera
    let (line_tx, line_rx) = crossbeam::channel::unbounded::<String>();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(l) => {
                    if line_tx.send(l).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::error!("stdin read failed: {}", e);
                    break;
                }
            }
        }
    });
    let events = Arc::new(ChannelSource::new(line_rx)).spawn();

    // 4 ─ Run until stdin closes
    let (report_tx, mut report_rx) = mpsc::channel::<ScanReport>(16);
    let session_task = tokio::spawn(session.run(events, report_tx));
    while let Some(report) = report_rx.recv().await {
        print_report(&report);
    }

    // 5 ─ Dropping the session drops the engine and closes the audit queue,
    //     which lets the writer flush its tail and stop.
    let session = session_task.await.context("scanner session failed")?;
    log::info!("Session ended on {}", session.ticket());
    drop(session);
    writer.await.context("transaction writer failed")?;
    if let Some(task) = maintenance {
        task.abort();
    }
    Ok(())
}

async fn list(
    store: &SqliteStore,
    ticket: TicketType,
    filter: FilterMode,
    search: Option<String>,
) -> Result<()> {
    let mut directory = Directory::new(ticket);
    directory.replace(store.list_by_name().await?);
    directory.set_filter(filter);
    if let Some(text) = search {
        directory.set_search(&text);
    }

    let view = directory.view();
    println!(
        "{} - Total: {} ({} scanned / {} not scanned)",
        view.ticket, view.counts.total, view.counts.checked_in, view.counts.not_checked_in
    );
    if view.is_empty() {
        println!("Data Not Found");
    }
    for p in &view.rows {
        println!("{} {}  {}", mark(p.is_checked_in(view.ticket)), p.id, p.name);
    }
    Ok(())
}

async fn run(command: Command, exe_dir: &Path, cfg: Config) -> Result<()> {
    let conn = init_database(exe_dir, &cfg.database).context("opening database")?;
    let store = Arc::new(SqliteStore::new(conn));

    match command {
        Command::Scan { ticket } => scan(store, exe_dir, &cfg, ticket).await,

        Command::List { ticket, filter, search } => {
            list(&store, ticket.unwrap_or(cfg.scanner.ticket), filter, search).await
        }

        Command::Transactions => {
            for t in store.transactions().await? {
                let details: Vec<String> = t
                    .transaction_details
                    .iter()
                    .map(|(field, value)| format!("{field}={value}"))
                    .collect();
                println!(
                    "{}  {:<5} {}  {}",
                    t.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
                    t.transaction_type.as_str(),
                    t.participant_name,
                    details.join(" ")
                );
            }
            Ok(())
        }

        Command::Add { name } => {
            let audit: Arc<dyn AuditSink> = store.clone();
            let engine = CheckInEngine::new(store, audit)
                .with_max_id_attempts(cfg.scanner.max_id_attempts);
            let participant = engine.register(&name).await?;
            println!("{}  {}", participant.id, participant.name);
            Ok(())
        }

        Command::Export { table } => {
            let dir = cfg.export.directory();
            let path = match table {
                ExportTable::Participants => {
                    let table = export::participants_table(&store.list_by_name().await?);
                    export::write_export(&dir, &cfg.export.participants_file, &table)?
                }
                ExportTable::Transactions => {
                    let table = export::transactions_table(&store.transactions().await?, &Local);
                    export::write_export(&dir, &cfg.export.transactions_file, &table)?
                }
            };
            println!("{}", path.display());
            Ok(())
        }

        Command::Import { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let participants = export::parse_participants_table(&text)?;
            let mut added = 0;
            for p in &participants {
                if store.insert(p).await? {
                    added += 1;
                } else {
                    log::warn!("Skipping {}: id already present", p.id);
                }
            }
            println!("Imported {added} of {} participant(s)", participants.len());
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1 ─ Context
    let exe_dir = exe_dir();
    let cfg_path = cli.config.unwrap_or_else(|| exe_dir.join("default.toml"));
    let cfg = config::load_or_default(&cfg_path)
        .with_context(|| format!("loading config {}", cfg_path.display()))?;

    // 2 ─ Logging
    setup_logging(&exe_dir, &cfg.logging).context("logging setup failed")?;
    log::debug!("Starting with config {:?}", cfg_path);

    // 3 ─ Runtime
    let rt = Runtime::new().context("Tokio runtime creation failed")?;
    rt.block_on(run(cli.command, &exe_dir, cfg))
}
