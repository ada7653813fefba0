use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tenki_core::{AppError, Config, SelectionOutcome};
use tenki_forecast::AreaCatalog;
use tenki_store::{ForecastStore, SqliteForecastStore};
use tenki_ui::{AppServices, TextPresenter};

/// Poll interval of the interactive loop
const TICK: Duration = Duration::from_millis(50);

/// Upper bound on waiting for one batch
const BATCH_WAIT: Duration = Duration::from_secs(120);

/// Three-day JMA forecasts for every area of a region, with a local log.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Regions to fetch (code, name or list number). Starts an interactive
    /// prompt when omitted.
    regions: Vec<String>,

    /// Print the selectable regions and exit
    #[arg(long)]
    list: bool,

    /// Print the stored forecast log and exit
    #[arg(long)]
    history: bool,

    /// Config file instead of `<config dir>/tenki/config.toml`
    #[arg(long)]
    config: Option<PathBuf>,
}

fn load_config(explicit: Option<&PathBuf>) -> Result<Config> {
    let (config, _) = match explicit {
        Some(path) => Config::load_validated_from(path)?,
        None => Config::load_validated()?,
    };
    Ok(config)
}

/// Log the full chain and show the user-facing message when there is one.
fn report(err: &anyhow::Error) {
    tracing::error!("{:#}", err);
    if let Some(app) = err.downcast_ref::<AppError>() {
        eprintln!("{}", app.user_message());
    }
}

fn print_regions(catalog: &AreaCatalog) {
    for (i, region) in catalog.regions().iter().enumerate() {
        println!("{:>3}. {} ({}, {} areas)", i + 1, region.name, region.code, region.areas.len());
    }
}

fn print_history(store: &dyn ForecastStore) -> Result<()> {
    let rows = store.list().context("Failed to read the forecast log")?;
    if rows.is_empty() {
        println!("No stored forecasts.");
    }
    for row in rows {
        let e = &row.entry;
        println!(
            "{:>5}  {}  {}  {}  max {}  min {}  (recorded {})",
            row.id,
            e.location,
            e.date,
            e.condition,
            e.temperature_max.map_or("-".to_string(), |t| t.to_string()),
            e.temperature_min.map_or("-".to_string(), |t| t.to_string()),
            row.recorded_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

/// One selection per argument, each awaited before the next.
fn run_once(services: &AppServices, regions: &[String]) -> Result<()> {
    let mut coordinator = services.coordinator(TextPresenter::new(std::io::stdout()));

    for input in regions {
        let Some(region) = services.catalog().resolve(input) else {
            eprintln!("Unknown region: {}", input);
            continue;
        };
        let generation = coordinator.select(&region.code);

        loop {
            match coordinator.pump(BATCH_WAIT) {
                Some(outcome) if outcome.generation() == generation => break,
                Some(_) => continue,
                None => {
                    coordinator.cancel_current();
                    anyhow::bail!("Timed out waiting for {}", region.code);
                }
            }
        }
    }
    Ok(())
}

/// Interactive prompt. Stdin is read on its own thread; this thread owns the
/// coordinator and is the only one that renders.
fn run_interactive(services: &AppServices) -> Result<()> {
    print_regions(services.catalog());
    println!("Enter a region (number, code or name), `history`, or `quit`.");

    let (line_tx, line_rx) = mpsc::channel::<String>();
    std::thread::Builder::new()
        .name("tenki-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line_tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("Failed to start input thread")?;

    let mut coordinator = services.coordinator(TextPresenter::new(std::io::stdout()));
    let mut input_closed = false;
    prompt();

    loop {
        match line_rx.recv_timeout(TICK) {
            Ok(line) => match line.trim() {
                "" => prompt(),
                "quit" | "exit" => break,
                "history" => {
                    print_history(coordinator.store())?;
                    prompt();
                }
                input => match services.catalog().resolve(input) {
                    Some(region) => {
                        println!("Fetching {}...", region.name);
                        coordinator.select(&region.code);
                    }
                    None => {
                        println!("Unknown region: {}", input);
                        prompt();
                    }
                },
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                input_closed = true;
                break;
            }
        }

        for outcome in coordinator.poll_channel() {
            match outcome {
                SelectionOutcome::Delivered { .. } | SelectionOutcome::Failed { .. } => prompt(),
                SelectionOutcome::Superseded { .. } => {}
            }
        }
    }

    // Input ended: let the batch in flight render before exiting.
    if input_closed {
        coordinator.settle(BATCH_WAIT);
    }
    if let Some(outcome) = coordinator.cancel_current() {
        tracing::warn!("Selection {} abandoned at exit", outcome.generation());
    }
    Ok(())
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn main() -> Result<()> {
    tenki_core::init()?;

    let args = Args::parse();
    let config = load_config(args.config.as_ref()).inspect_err(report)?;

    if args.history {
        let store = SqliteForecastStore::open(config.database_path())
            .context("Failed to open the forecast log")?;
        return print_history(&store);
    }

    let services = AppServices::init(&config).inspect_err(report)?;

    tracing::info!("tenki started");

    let result = if args.list {
        print_regions(services.catalog());
        Ok(())
    } else if args.regions.is_empty() {
        run_interactive(&services)
    } else {
        run_once(&services, &args.regions)
    };

    services.shutdown();
    result
}
