use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use quarry::config::MinerConfig;
use quarry::sink::JsonLinesSink;
use quarry::{scan, telemetry};
use quarry_git::{GixStore, RevisionStore};

/// Repository history scenario miner
///
/// quarry walks the commit history, operation logs, and in-progress
/// operation markers of an already-cloned git repository and extracts
/// structured, replayable "scenario" records — merges with conflicts,
/// rebase sequences, cherry-picks, reverts, file-commit chains — suitable
/// as benchmark tasks for autonomous agents.
///
/// The miner is read-only: it never mutates the repository it scans, and it
/// needs no network access. Output is one JSON object per line. Fanning out
/// across many repositories is the caller's concern; one invocation scans
/// one repository deterministically.
#[derive(Parser)]
#[command(name = "quarry")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan one repository and emit scenario records
    Scan {
        /// Path to the locally materialized repository
        path: PathBuf,

        /// Reference to scan (repeatable). Default: all local branches
        /// plus HEAD
        #[arg(long = "ref", value_name = "NAME")]
        refs: Vec<String>,

        /// Configuration file (TOML). Missing file means defaults
        #[arg(long, value_name = "FILE", default_value = "quarry.toml")]
        config: PathBuf,

        /// Write records to a file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Accept rebase invocations that were aborted or left unfinished
        #[arg(long)]
        allow_incomplete: bool,

        /// Extraction worker threads (0 = one per core)
        #[arg(long, default_value_t = 0)]
        workers: usize,
    },
}

fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            path,
            refs,
            config,
            out,
            allow_incomplete,
            workers,
        } => run_scan(&path, refs, &config, out, allow_incomplete, workers),
    }
}

fn run_scan(
    path: &std::path::Path,
    refs: Vec<String>,
    config_path: &std::path::Path,
    out: Option<PathBuf>,
    allow_incomplete: bool,
    workers: usize,
) -> Result<()> {
    let mut config = MinerConfig::load(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    if !refs.is_empty() {
        config.refs = refs;
    }
    if allow_incomplete {
        config.allow_incomplete = true;
    }
    if workers > 0 {
        config.workers = workers;
    }

    let store = GixStore::open(path)
        .with_context(|| format!("opening repository at {}", path.display()))?;

    let writer: Box<dyn Write> = match out {
        Some(out_path) => Box::new(BufWriter::new(
            File::create(&out_path)
                .with_context(|| format!("creating output file {}", out_path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    let mut sink = JsonLinesSink::new(writer);

    let outcome = scan::scan(&store, &config, &mut sink).context("scan failed")?;
    sink.into_inner().context("flushing output")?;

    eprintln!(
        "{}: {} record(s) from {} candidate(s) across {} ref(s)",
        store.identity(),
        outcome.records,
        outcome.candidates,
        outcome.refs_scanned,
    );
    Ok(())
}
