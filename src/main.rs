use std::future::Future;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use concentration_reporter::app::run_viewer;
use concentration_reporter::state::ViewerState;
use concentration_reporter::{
    AggregateReport, Config, Monitor, ProcessOutcome, SeriesCollector, SummaryStore, Variant,
};

#[derive(Parser)]
#[command(name = "concentration-reporter", version, about)]
struct Cli {
    /// TOML configuration file
    #[arg(long, short = 'c', global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Folder holding the measurement files
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Export format of the measurement files
    #[arg(long, value_enum, global = true)]
    variant: Option<Variant>,

    /// Summary table (relative paths resolve inside the data folder)
    #[arg(long, global = true, value_name = "FILE")]
    summary_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Watch the data folder and process new files as they appear.
    ///
    /// Stops on 'quit' or Ctrl-C; a pending console read is abandoned at exit.
    Monitor,
    /// Show the aggregate report and exit
    Summary {
        /// Print a table instead of opening the chart window
        #[arg(long)]
        text: bool,
    },
    /// Process every matching file already in the data folder
    Scan {
        /// Open the chart window with the traces afterwards
        #[arg(long)]
        plot: bool,
    },
    /// Process the given files
    Process {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        plot: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    config
        .validate()
        .context("checking calibration constants")?;

    let command = match cli.command {
        Some(command) => command,
        None => match prompt_mode()? {
            Some(command) => command,
            None => {
                println!("Unknown option. Exiting.");
                return Ok(());
            }
        },
    };

    let store = config.open_store();
    match command {
        Command::Monitor => run_monitor(&config, store),
        Command::Summary { text } => run_summary(store, text),
        Command::Scan { plot } => run_scan(&config, store, plot),
        Command::Process { files, plot } => run_process(&config, store, &files, plot),
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(variant) = cli.variant {
        config.variant = variant;
    }
    if let Some(file) = &cli.summary_file {
        config.summary_file = file.clone();
    }
    log::debug!("{config:?}");
    Ok(config)
}

fn prompt_mode() -> Result<Option<Command>> {
    println!("Type 'monitor' to watch for new files or 'summary' to view summary data:");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(match line.trim().to_ascii_lowercase().as_str() {
        "monitor" => Some(Command::Monitor),
        "summary" => Some(Command::Summary { text: false }),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

fn run_monitor(config: &Config, store: Arc<SummaryStore>) -> Result<()> {
    ensure_dir(&config.data_dir)?;
    let processor = Arc::new(config.build_processor(Arc::clone(&store))?);
    let monitor = Monitor::start(processor, &config.data_dir, config.settle_delay())?;
    println!("Type 'summary' for a report, 'quit' to stop (Ctrl-C also stops).");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting command listener")?;
    let result = runtime.block_on(command_loop(
        &store,
        BufReader::new(tokio::io::stdin()),
        tokio::signal::ctrl_c(),
    ));
    // The stdin reader may still be parked in a blocking read that cannot be
    // cancelled; it is abandoned here and ends with the process.
    runtime.shutdown_background();
    log::debug!("Console reader detached");

    monitor.shutdown();
    result
}

/// Reads commands from `input` until `quit`, end of input followed by
/// `interrupt`, or `interrupt` itself. The interrupt future is created once
/// so a signal arriving mid-command is still observed.
async fn command_loop<R, F>(store: &SummaryStore, input: R, interrupt: F) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    F: Future<Output = std::io::Result<()>>,
{
    tokio::pin!(interrupt);
    let mut lines = input.lines();
    let mut input_open = true;

    loop {
        tokio::select! {
            res = &mut interrupt => {
                res.context("listening for Ctrl-C")?;
                log::info!("Interrupt received, shutting down");
                return Ok(());
            }
            line = lines.next_line(), if input_open => match line? {
                None => input_open = false,
                Some(cmd) => match cmd.trim().to_ascii_lowercase().as_str() {
                    "" => {}
                    "summary" | "report" => print_report(store),
                    "quit" | "exit" => return Ok(()),
                    other => println!("Unknown command '{other}' (try 'summary' or 'quit')"),
                },
            },
        }
    }
}

fn print_report(store: &SummaryStore) {
    match store.load_all() {
        Ok(rows) => println!("{}", AggregateReport::from_records(rows, store.variant()).render_table()),
        Err(e) => log::error!("Failed to load summary: {e}"),
    }
}

fn run_summary(store: Arc<SummaryStore>, text: bool) -> Result<()> {
    if !store.path().exists() {
        println!("No summary file found.");
        return Ok(());
    }
    let rows = store.load_all()?;
    let report = AggregateReport::from_records(rows, store.variant());
    if text || report.is_empty() {
        println!("{}", report.render_table());
        return Ok(());
    }
    run_viewer(ViewerState::new(store, Vec::new()))
}

fn run_scan(config: &Config, store: Arc<SummaryStore>, plot: bool) -> Result<()> {
    ensure_dir(&config.data_dir)?;
    let collector = Arc::new(SeriesCollector::default());
    let processor = config.build_processor(Arc::clone(&store))?.with_sink(collector.clone());

    let report = processor.process_directory(&config.data_dir);
    println!(
        "{} recorded, {} skipped, {} failed",
        report.recorded.len(),
        report.skipped.len(),
        report.failed.len()
    );
    for (path, reason) in &report.failed {
        println!("  {}: {reason}", path.display());
    }

    if plot {
        run_viewer(ViewerState::new(store, collector.take()))?;
    }
    Ok(())
}

fn run_process(config: &Config, store: Arc<SummaryStore>, files: &[PathBuf], plot: bool) -> Result<()> {
    let collector = Arc::new(SeriesCollector::default());
    let processor = config.build_processor(Arc::clone(&store))?.with_sink(collector.clone());

    let mut failed = 0usize;
    for path in files {
        match processor.process_file(path) {
            Ok(ProcessOutcome::Recorded(record)) => {
                println!("{}: {} / {}", record.filename, record.metric_a, record.metric_b);
            }
            Ok(ProcessOutcome::Skipped { filename }) => println!("{filename}: no valid readings"),
            Err(e) => {
                log::error!("Failed to process file: {e}");
                failed += 1;
            }
        }
    }

    if plot {
        run_viewer(ViewerState::new(store, collector.take()))?;
    }
    if failed > 0 {
        bail!("{failed} of {} files failed", files.len());
    }
    Ok(())
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        bail!("data folder {} does not exist", dir.display());
    }
    Ok(())
}
