//! Price Sampler — polls one instrument's price on a fixed period and keeps a bounded
//! window of recent samples in memory.
//!
//! Wiring:
//! - `Poller` — a background thread that fetches a quote every period and appends it to
//!   the shared `SampleBuffer`. Failed fetches are logged and the schedule carries on.
//! - Display thread — receives every new sample over a `crossbeam_channel` from the
//!   poller's update hook, keeps a small `ChartSeries`, and logs a sparkline of it.
//! - Ctrl+C — stops the poller, waiting up to the stop timeout for an in-flight fetch.
//!
//! Usage example (CLI):
//! ```bash
//! price_sampler --symbol ^DJI --period-secs 5 --capacity 1024
//! price_sampler --source simulated --period-secs 1 --dump-snapshot
//! ```
#![warn(missing_docs)]
mod args;

use crate::args::Args;
use clap::Parser;
use crossbeam_channel::{bounded, unbounded, Receiver};
use log::{error, info};
use price_sampler::chart::ChartSeries;
use price_sampler::source::{QuoteSource, SimulatedQuoteSource, SourceKind};
use price_sampler::{Poller, SampleBuffer, SampleUpdate, StopOutcome};
use sampler_common::{Result, SamplerError};
use std::io::{self, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Consumes poller updates on its own thread, the way a UI thread would.
fn start_display_thread(
    symbol: String,
    buffer: Arc<SampleBuffer>,
    updates: Receiver<SampleUpdate>,
    chart_points: usize,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(String::from("display"))
        .spawn(move || {
            let mut series = ChartSeries::new(chart_points);
            for update in updates.iter() {
                let point = series.push(&update);
                let (lo, hi) = series.range().unwrap_or((point.price, point.price));
                info!(
                    "{} t={}s {} [{}..{}] {} ({} buffered)",
                    symbol,
                    point.elapsed_secs,
                    point.price,
                    lo,
                    hi,
                    series.sparkline(),
                    buffer.len()
                );
            }
            info!("Display thread stopping...");
        })
        .map_err(|e| SamplerError::Worker(format!("failed to spawn display thread: {}", e)))
}

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();
    let config = args.to_config()?;

    let source: Box<dyn QuoteSource> = match args.source {
        SourceKind::Simulated => Box::new(
            SimulatedQuoteSource::default().with_failure_rate(args.simulated_failure_rate),
        ),
        kind => kind.build()?,
    };
    info!("Sampling {} from {} source", config.symbol, args.source);

    let (update_tx, update_rx) = unbounded::<SampleUpdate>();
    let symbol = config.symbol.clone();
    let mut poller = Poller::new(config, source)?.on_update(move |update| {
        let _ = update_tx.send(*update);
    });
    let buffer = poller.buffer();

    let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
    ctrlc::set_handler(move || {
        info!("Ctrl+C received. Shutting down sampler...");
        let _ = shutdown_tx.try_send(());
    })
    .map_err(|e| SamplerError::Worker(format!("failed to set Ctrl+C handler: {}", e)))?;

    let display = start_display_thread(symbol, Arc::clone(&buffer), update_rx, args.chart_points)?;

    poller.start()?;
    info!("Sampler is running. Press Ctrl+C to exit.");
    let _ = shutdown_rx.recv();

    let outcome = poller.stop();
    let stats = poller.stats();
    // A finished worker has dropped the update hook, which closes the display channel.
    // An abandoned one still holds it, so the display thread is left running.
    if outcome == StopOutcome::Finished && display.join().is_err() {
        error!("Display thread panicked");
    }
    info!(
        "Sampler stopped ({:?}): {} ticks, {} samples, {} failures, {} buffered",
        outcome,
        stats.ticks,
        stats.samples,
        stats.failures,
        buffer.len()
    );

    if args.dump_snapshot {
        dump_snapshot(&buffer)?;
    }
    Ok(())
}

/// Writes the buffer's contents to stdout, one JSON sample per line, oldest first.
fn dump_snapshot(buffer: &SampleBuffer) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for sample in buffer.snapshot() {
        serde_json::to_writer(&mut out, &sample)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
