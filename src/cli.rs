//! CLI definition and dispatch.

use chrono::{DateTime, FixedOffset, Utc};
use clap::{Parser, Subcommand};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};

use crate::adapters::csv_bar_feed::CsvBarFeed;
use crate::adapters::csv_order_journal::CsvOrderJournal;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::fixed_premium_adapter::FixedPremiumAdapter;
use crate::adapters::log_notifier::LogNotifier;
use crate::domain::config::EngineConfig;
use crate::domain::config_validation::load_engine_config;
use crate::domain::engine::{EnginePorts, TickOutcome, TradingEngine};
use crate::domain::error::SniperError;
use crate::domain::position::ExitReason;
use crate::domain::sizing::lot_quantity;
use crate::domain::time_policy::{EntryPermission, TimePolicy};

#[derive(Parser, Debug)]
#[command(
    name = "swingsniper",
    about = "Confluence swing signals with a Friday exit policy"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Evaluate every instrument once
    Tick {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory holding one <SYMBOL>.csv per instrument
        #[arg(short, long)]
        data_dir: PathBuf,
        /// Evaluate as of this RFC 3339 instant instead of now
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<FixedOffset>>,
        #[arg(long, default_value = "orders.csv")]
        journal: PathBuf,
    },
    /// Tick every instrument on the configured interval until Ctrl-C
    Run {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data_dir: PathBuf,
        /// Stop after this many passes
        #[arg(long)]
        ticks: Option<u64>,
        #[arg(long, default_value = "orders.csv")]
        journal: PathBuf,
        /// Close every open position on Ctrl-C or after the last pass
        #[arg(long)]
        flatten_on_exit: bool,
    },
    /// Show the Friday time policy at an instant
    Policy {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long, value_parser = parse_instant)]
        at: DateTime<FixedOffset>,
    },
    /// Compute the lot-rounded quantity for one position
    Size {
        #[arg(long)]
        capital: f64,
        #[arg(long)]
        max_trades: u32,
        #[arg(long)]
        premium: f64,
        #[arg(long)]
        lot_size: u64,
    },
}

fn parse_instant(s: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(s).map_err(|e| format!("expected an RFC 3339 timestamp: {}", e))
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Validate { config } => run_validate(&config),
        Command::Tick {
            config,
            data_dir,
            at,
            journal,
        } => run_tick(&config, &data_dir, at, &journal),
        Command::Run {
            config,
            data_dir,
            ticks,
            journal,
            flatten_on_exit,
        } => run_loop(&config, &data_dir, ticks, &journal, flatten_on_exit),
        Command::Policy { config, at } => run_policy(config.as_deref(), at),
        Command::Size {
            capital,
            max_trades,
            premium,
            lot_size,
        } => run_size(capital, max_trades, premium, lot_size),
    }
}

pub fn load_config(path: &Path) -> Result<EngineConfig, ExitCode> {
    let adapter = FileConfigAdapter::from_file(path).map_err(fail)?;
    load_engine_config(&adapter).map_err(fail)
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    println!("Configuration OK");
    println!(
        "  Capital:        {:.2} across {} concurrent trade(s)",
        config.risk.capital, config.risk.max_concurrent_trades
    );
    println!(
        "  Stop / target:  {:.2}% / {:.2}%",
        config.risk.stop_fraction * 100.0,
        config.risk.target_fraction * 100.0
    );
    println!("  Reversal exit:  {}", config.risk.reversal_exit);
    println!(
        "  Session:        weekdays {} to {}",
        config.time_policy.market_open.format("%H:%M"),
        config.time_policy.market_close.format("%H:%M")
    );
    println!(
        "  Friday:         entries until {}, warning from {}, forced exit at {}",
        config.time_policy.entry_cutoff.format("%H:%M"),
        config.time_policy.warning_start.format("%H:%M"),
        config.time_policy.forced_exit.format("%H:%M")
    );
    println!(
        "  Bars:           lookback {}, minimum {}",
        config.session.lookback,
        config.minimum_bars()
    );
    for instrument in &config.instruments {
        println!(
            "  {:<12} lot {:>4}  strike step {:>6.1}  OTM {:>6.1}  premium {:>7.2}",
            instrument.symbol,
            instrument.lot_size,
            instrument.strike_increment,
            instrument.otm_offset,
            instrument.premium
        );
    }
    ExitCode::SUCCESS
}

fn print_outcomes(outcomes: &[(String, TickOutcome)]) {
    for (symbol, outcome) in outcomes {
        println!("{:<12} {}", symbol, outcome);
    }
}

fn fail(e: SniperError) -> ExitCode {
    eprintln!("error: {e}");
    ExitCode::from(&e)
}

/// Reopen every position the journal still holds so exits and the
/// one-position-per-symbol rule carry across processes.
fn restore_book(engine: &mut TradingEngine<'_>, journal: &CsvOrderJournal) -> Result<(), ExitCode> {
    for position in journal.open_positions().map_err(fail)? {
        if engine.config().instrument(&position.symbol).is_none() {
            warn!(symbol = %position.symbol, "journal holds a position for an unconfigured symbol");
        }
        info!(
            symbol = %position.symbol,
            side = %position.side,
            quantity = position.quantity,
            entry = position.entry_price,
            "position restored from journal"
        );
        engine.lifecycle_mut().open(position).map_err(fail)?;
    }
    Ok(())
}

fn run_tick(
    config_path: &Path,
    data_dir: &Path,
    at: Option<DateTime<FixedOffset>>,
    journal_path: &Path,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let feed = CsvBarFeed::new(data_dir.to_path_buf());
    let journal = CsvOrderJournal::new(journal_path.to_path_buf());
    let premiums = FixedPremiumAdapter::from_config(&config);
    let notifier = LogNotifier;
    let ports = EnginePorts {
        feed: &feed,
        orders: &journal,
        premiums: &premiums,
        notifier: &notifier,
    };

    let now = at.unwrap_or_else(|| Utc::now().fixed_offset());
    let mut engine = TradingEngine::new(config, ports);
    if let Err(code) = restore_book(&mut engine, &journal) {
        return code;
    }
    print_outcomes(&engine.tick_all(&now));
    ExitCode::SUCCESS
}

/// Tick every instrument once per `interval` until `ticks` passes have run
/// or `shutdown` resolves. Returns the number of passes.
pub async fn run_passes<F>(
    engine: &mut TradingEngine<'_>,
    ticks: Option<u64>,
    interval: Duration,
    shutdown: F,
) -> u64
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let mut pass: u64 = 0;
    loop {
        pass += 1;
        print_outcomes(&engine.tick_all(&Utc::now()));

        if ticks.is_some_and(|limit| pass >= limit) {
            break;
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = &mut shutdown => {
                info!(passes = pass, "shutdown requested");
                break;
            }
        }
    }
    pass
}

fn run_loop(
    config_path: &Path,
    data_dir: &Path,
    ticks: Option<u64>,
    journal_path: &Path,
    flatten_on_exit: bool,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let interval = Duration::from_secs(config.session.tick_interval_secs);

    let feed = CsvBarFeed::new(data_dir.to_path_buf());
    let journal = CsvOrderJournal::new(journal_path.to_path_buf());
    let premiums = FixedPremiumAdapter::from_config(&config);
    let notifier = LogNotifier;
    let ports = EnginePorts {
        feed: &feed,
        orders: &journal,
        premiums: &premiums,
        notifier: &notifier,
    };
    let mut engine = TradingEngine::new(config, ports);
    if let Err(code) = restore_book(&mut engine, &journal) {
        return code;
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => return fail(SniperError::Io(e)),
    };

    info!(
        instruments = engine.config().instruments.len(),
        interval_secs = interval.as_secs(),
        "tick loop started"
    );

    let pass = runtime.block_on(async {
        let listener = tokio::spawn(tokio::signal::ctrl_c());
        // Let the listener register before the first pass.
        tokio::task::yield_now().await;
        let shutdown = async move {
            if !matches!(listener.await, Ok(Ok(()))) {
                warn!("Ctrl-C listener unavailable, running until the pass limit");
                std::future::pending::<()>().await;
            }
        };
        run_passes(&mut engine, ticks, interval, shutdown).await
    });

    if flatten_on_exit {
        let closed = engine.force_exit_all(&Utc::now(), ExitReason::Shutdown);
        for intent in &closed {
            println!(
                "{:<12} flattened {} x{} @ {:.2}",
                intent.symbol, intent.side, intent.quantity, intent.reference_price
            );
        }
    }

    let lifecycle = engine.lifecycle();
    info!(
        passes = pass,
        open = lifecycle.open_count(),
        closed = lifecycle.closed_trades().len(),
        realized_pnl = lifecycle.realized_pnl(),
        "tick loop finished"
    );
    ExitCode::SUCCESS
}

fn run_policy(config_path: Option<&Path>, at: DateTime<FixedOffset>) -> ExitCode {
    let policy = match config_path {
        Some(path) => match load_config(path) {
            Ok(c) => c.time_policy,
            Err(code) => return code,
        },
        None => TimePolicy::default(),
    };

    let decision = policy.evaluate(&at);
    let local = at.with_timezone(&policy.offset);
    println!("At {}", local.format("%a %Y-%m-%d %H:%M"));
    match &decision.entry {
        EntryPermission::Allowed => println!("  Entry:       allowed"),
        EntryPermission::Blocked { reason } => println!("  Entry:       blocked ({})", reason),
    }
    println!(
        "  Session:     {}",
        if decision.session_open { "open" } else { "closed" }
    );
    println!("  Forced exit: {}", decision.forced_exit);
    if let Some(warning) = &decision.warning {
        println!("  Warning:     {}", warning.message);
    }
    ExitCode::SUCCESS
}

fn run_size(capital: f64, max_trades: u32, premium: f64, lot_size: u64) -> ExitCode {
    let quantity = lot_quantity(capital, max_trades, premium, lot_size);
    println!("{}", quantity);
    if quantity == 0 {
        eprintln!("warning: one lot is not affordable with these inputs");
    }
    ExitCode::SUCCESS
}
