//! A live terminal dashboard for one service.
//!
//! Stacks a few blocks (process metrics, TCP connections, optional pool
//! statistics and a price ticker) and refreshes them in place.

mod app;
mod config;
mod core;
mod sources;
mod ui;

use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::Dispatch;
use tracing_subscriber::EnvFilter;

use crate::app::dashboard::Dashboard;
use crate::app::event::{InputListener, TerminalKeys};
use crate::config::AppConfig;
use crate::core::block::RefreshCache;
use crate::sources::{
    header::HeaderSource, into_producer, metrics::MetricsSource, network::NetworkSource,
    pool::PoolSource, ticker::TickerSource,
};
use crate::ui::palette::Palette;
use crate::ui::surface::TerminalSurface;

const KEY_HINT: &str = "j/k scroll  space/PgUp page  g/G top/bottom  q quit";

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), version, about = "Live terminal dashboard")]
struct Cli {
    /// Host serving the metrics endpoint.
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Port of the watched service (metrics and connection counts).
    #[arg(long, default_value_t = 9100)]
    port: u16,

    /// Path of the Prometheus metrics endpoint.
    #[arg(long, default_value = "/metrics")]
    path: String,

    /// Redraw interval in milliseconds (overrides the config file).
    #[arg(long)]
    interval: Option<u64>,

    /// CoinGecko coin id to show a price for (e.g. `monero`).
    #[arg(long)]
    ticker: Option<String>,

    /// Pool statistics URL (JSON; Koios pool_info or a hash-rate pool API).
    #[arg(long)]
    pool_url: Option<String>,

    /// Config file (defaults to `$XDG_CONFIG_HOME/blocktop/config.toml`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log at debug level (to `blocktop.log` unless `--log-file` is given).
    #[arg(long)]
    debug: bool,

    /// Write logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn metrics_url(&self) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        format!("http://{}:{}{}", self.host, self.port, path)
    }
}

// ───────────────────────────────────────── setup ─────────────

/// Logs never go to the terminal the dashboard owns: either a file, or nowhere.
fn build_log(cli: &Cli) -> Result<Dispatch> {
    let path = match (&cli.log_file, cli.debug) {
        (Some(path), _) => path.clone(),
        (None, true) => PathBuf::from(concat!(env!("CARGO_PKG_NAME"), ".log")),
        (None, false) => return Ok(Dispatch::none()),
    };
    let file = File::create(&path).with_context(|| format!("cannot create log file {}", path.display()))?;
    let default_level = if cli.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .finish();
    Ok(Dispatch::new(subscriber))
}

fn build_blocks(cli: &Cli, config: &AppConfig, log: &Dispatch) -> Result<Vec<RefreshCache>> {
    let theme = config.theme;
    let layout = config.layout;
    let ttls = config.ttls;
    let block = |title: &str, ttl: Duration, producer| {
        RefreshCache::new(title, ttl, layout, producer, log.clone())
    };

    let header = HeaderSource::new(cli.metrics_url(), KEY_HINT.into(), theme);
    let mut blocks = vec![
        // The clock should tick with every redraw.
        block("header", Duration::ZERO, into_producer(header, theme)),
        block(
            "metrics",
            ttls.metrics,
            into_producer(MetricsSource::new(cli.metrics_url(), theme)?, theme),
        ),
        block(
            "network",
            ttls.network,
            into_producer(NetworkSource::new(cli.port, theme), theme),
        ),
    ];
    if let Some(url) = &cli.pool_url {
        blocks.push(block(
            "pool",
            ttls.pool,
            into_producer(PoolSource::new(url.clone(), theme)?, theme),
        ));
    }
    if let Some(id) = &cli.ticker {
        blocks.push(block(
            "ticker",
            ttls.ticker,
            into_producer(TickerSource::new(id, &config.ticker_currency, theme)?, theme),
        ));
    }
    Ok(blocks)
}

// ───────────────────────────────────────── main ──────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log = build_log(&cli)?;

    // Config errors are reported before the terminal is touched.
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(ms) = cli.interval {
        config.interval = Duration::from_millis(ms.clamp(100, 60_000));
    }
    let blocks = build_blocks(&cli, &config, &log)?;

    // ── terminal setup ────────────────────────────────────────
    enable_raw_mode()?;
    if let Err(err) = execute!(stdout(), EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(err.into());
    }

    // Panic output would land on the alternate screen; log it and keep the
    // last message for after teardown.
    let last_panic = Arc::new(Mutex::new(None::<String>));
    let default_hook = panic::take_hook();
    {
        let slot = Arc::clone(&last_panic);
        let log = log.clone();
        panic::set_hook(Box::new(move |info| {
            let msg = info.to_string();
            tracing::dispatcher::with_default(&log, || tracing::error!("{msg}"));
            if let Ok(mut slot) = slot.lock() {
                *slot = Some(msg);
            }
        }));
    }

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| run(blocks, config, log.clone())));

    // ── teardown ──────────────────────────────────────────────
    panic::set_hook(default_hook);
    let restored = disable_raw_mode().and_then(|()| execute!(stdout(), LeaveAlternateScreen));
    if let Err(err) = restored {
        tracing::dispatcher::with_default(&log, || {
            tracing::warn!("terminal restore failed: {err}");
        });
    }

    match outcome {
        Ok(result) => result,
        Err(payload) => {
            if let Some(msg) = last_panic.lock().ok().and_then(|mut slot| slot.take()) {
                eprintln!("{msg}");
            }
            panic::resume_unwind(payload)
        }
    }
}

/// Everything between terminal setup and teardown.  The input thread is
/// stopped and joined before this returns, or unwinds.
fn run(blocks: Vec<RefreshCache>, config: AppConfig, log: Dispatch) -> Result<()> {
    let palette = Palette::new();
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let surface = TerminalSurface::new(terminal, palette.clone())?;

    let (mut listener, keys) =
        InputListener::spawn(TerminalKeys, log.clone()).context("cannot start input thread")?;

    let result = Dashboard::new(
        surface,
        palette,
        blocks,
        keys,
        config.keys,
        config.interval,
        log,
    )
    .and_then(|mut dashboard| dashboard.run());

    listener.stop();
    result
}
