use std::io::{self, Write};
use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::{error, warn};
use serde::Serialize;

use csv_worker_pool::bankstatement::{parse_file, StatementReport};
use csv_worker_pool::prelude::*;

#[derive(Parser)]
#[command(
    name = "csv-processing",
    version,
    about = "A simple Bank Statement CSV processing with worker pool."
)]
struct Cli {
    /// Number of worker pool
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u16).range(1..))]
    pool: u16,

    /// Comma separated CSV path
    #[arg(long, required = true, value_delimiter = ',', value_name = "PATH[,PATH...]")]
    csv: Vec<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Write every pool event to stdout (stderr with --json)
    #[arg(short, long)]
    verbose: bool,
}

/// What one job reports back for one file
#[derive(Debug, Serialize)]
struct FileOutcome {
    path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<StatementReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl FileOutcome {
    fn failed(path: PathBuf, error: impl ToString) -> Self {
        Self {
            path,
            report: None,
            error: Some(error.to_string()),
        }
    }
}

fn process_file(path: PathBuf) -> FileOutcome {
    match parse_file(&path) {
        Ok(report) => FileOutcome {
            path,
            report: Some(report),
            error: None,
        },
        Err(e) => {
            warn!("Failed to open CSV: {}, Error: {}", path.display(), e);
            FileOutcome::failed(path, e)
        }
    }
}

fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Warn)
        .target(env_logger::Target::Stderr)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // Keep stdout a single JSON document when --json is set
    let sink: Arc<dyn EventSink> = match (cli.verbose, cli.json) {
        (true, false) => Arc::new(WriterSink::new(io::stdout())),
        (true, true) => Arc::new(WriterSink::new(io::stderr())),
        (false, _) => Arc::new(LogSink),
    };
    let config = WorkerPoolConfig::new(usize::from(cli.pool))
        .with_thread_name_prefix("csv")
        .with_event_sink(sink);
    let pool = WorkerPool::with_config(config).context("failed to start worker pool")?;

    let paths: Vec<PathBuf> = cli
        .csv
        .iter()
        .map(|path| path.trim())
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .collect();

    let mut pending = Vec::with_capacity(paths.len());
    let mut outcomes = Vec::with_capacity(paths.len());
    for path in paths {
        let job_path = path.clone();
        match pool.add(move || process_file(job_path)) {
            Ok(handle) => pending.push((path, handle.cast::<FileOutcome>())),
            Err(e) => {
                warn!("Failed to process CSV: {}, Error: {}", path.display(), e);
                outcomes.push(FileOutcome::failed(path, e));
            }
        }
    }

    for (path, mut results) in pending {
        outcomes.push(match results.next() {
            Some(Ok(outcome)) => outcome,
            Some(Err(e)) => FileOutcome::failed(path, e),
            None => FileOutcome::failed(path, "job finished without a result"),
        });
    }

    pool.shutdown().context("failed to shut down worker pool")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.json {
        serde_json::to_writer_pretty(&mut out, &outcomes)?;
        writeln!(out)?;
    } else {
        for outcome in &outcomes {
            print_outcome(&mut out, outcome)?;
        }
        writeln!(out, "All jobs completed and results collected.")?;
    }

    Ok(())
}

fn print_outcome(out: &mut impl Write, outcome: &FileOutcome) -> io::Result<()> {
    match (&outcome.report, &outcome.error) {
        (Some(report), _) => {
            writeln!(
                out,
                "CSV {}, transactions: {}, invalid lines: {}",
                outcome.path.display(),
                report.transactions.len(),
                report.errors.len()
            )?;
            for tx in &report.transactions {
                writeln!(
                    out,
                    "  {} {} {} {} {} {}",
                    tx.timestamp, tx.name, tx.transaction_type, tx.amount, tx.status, tx.description
                )?;
            }
            for (line, messages) in &report.errors {
                writeln!(out, "  {}: {}", line, messages.join("; "))?;
            }
        }
        (None, error) => {
            writeln!(
                out,
                "CSV {}, error: {}",
                outcome.path.display(),
                error.as_deref().unwrap_or("no result")
            )?;
        }
    }
    Ok(())
}
