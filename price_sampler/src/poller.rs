//! Scheduled fetch-and-store loop.
//!
//! A `Poller` owns one background thread that, on a fixed period, asks a
//! `QuoteSource` for the latest price and appends the result to the shared
//! `SampleBuffer`.
//!
//! Lifecycle is single-shot: `Idle -> Running -> Stopped`.
//!
//! Scheduling:
//! - The first tick runs as soon as the worker starts. Tick `k` is due at
//!   `start + k * period`, so a slow tick does not shift the ones after it.
//! - Ticks run one at a time on the worker. A tick that overruns one or more
//!   deadlines is followed by a single late tick straight away; the other missed
//!   slots are skipped and the schedule resumes on the original grid.
//! - A failed fetch is logged and counted; nothing else happens, and the next tick
//!   fires on schedule. A panicking source or update hook is contained the same way.
//!
//! Shutdown:
//! - `stop()` signals the worker through a channel and waits up to the configured
//!   stop timeout for the current tick to finish.
//! - If the timeout elapses the worker is abandoned, not interrupted. A quote its
//!   stuck fetch returns later is discarded before it can reach the buffer.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use crossbeam_channel::{at, bounded, select, Receiver, RecvTimeoutError, Sender, TryRecvError};
use log::{debug, error, info, warn};
use sampler_common::{ConfigError, Sample, SamplerConfig, SamplerError, TimestampPolicy};
use strum_macros::Display;

use crate::buffer::SampleBuffer;
use crate::source::QuoteSource;

/// Name of the background worker thread.
const WORKER_NAME: &str = "price-poller";

/// Lifecycle state of a `Poller`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum PollerState {
    /// Constructed, not yet started.
    Idle,
    /// Worker thread is ticking.
    Running,
    /// Terminal.
    Stopped,
}

/// How `stop()` ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The worker finished its last tick and exited.
    Finished,
    /// The in-flight tick outlived the stop timeout; the worker was left behind.
    Abandoned,
    /// The poller was never started.
    NotStarted,
    /// `stop()` had already been called.
    AlreadyStopped,
}

/// Notification sent to the update hook after every successful append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleUpdate {
    /// The sample just appended.
    pub sample: Sample,
    /// Time since the poller started, for charting.
    pub elapsed: Duration,
}

/// Callback invoked on the worker thread after each append.
pub type UpdateHook = Box<dyn Fn(&SampleUpdate) + Send + 'static>;

/// Counters describing what the poller has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollerStats {
    /// Ticks started.
    pub ticks: u64,
    /// Samples appended to the buffer.
    pub samples: u64,
    /// Fetches that failed.
    pub failures: u64,
    /// Quotes dropped because the worker had been abandoned.
    pub discarded: u64,
}

#[derive(Debug, Default)]
struct Counters {
    ticks: AtomicU64,
    samples: AtomicU64,
    failures: AtomicU64,
    discarded: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> PollerStats {
        PollerStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            samples: self.samples.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

struct Worker {
    handle: JoinHandle<()>,
    stop_tx: Sender<()>,
    done_rx: Receiver<()>,
    abandoned: Arc<Mutex<bool>>,
}

/// Periodic sampler for one symbol.
pub struct Poller<S: QuoteSource + 'static> {
    config: SamplerConfig,
    buffer: Arc<SampleBuffer>,
    source: Option<S>,
    on_update: Option<UpdateHook>,
    counters: Arc<Counters>,
    state: PollerState,
    worker: Option<Worker>,
}

impl<S: QuoteSource + 'static> Poller<S> {
    /// Validates `config` and creates an idle poller with a fresh buffer of
    /// `config.capacity` samples.
    pub fn new(config: SamplerConfig, source: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let buffer = Arc::new(SampleBuffer::new(config.capacity)?);
        Ok(Self::assemble(config, buffer, source))
    }

    /// Like [`Poller::new`] but writing into an existing buffer. The buffer's own
    /// capacity wins over `config.capacity`.
    pub fn with_buffer(
        config: SamplerConfig,
        buffer: Arc<SampleBuffer>,
        source: S,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::assemble(config, buffer, source))
    }

    fn assemble(config: SamplerConfig, buffer: Arc<SampleBuffer>, source: S) -> Self {
        Self {
            config,
            buffer,
            source: Some(source),
            on_update: None,
            counters: Arc::new(Counters::default()),
            state: PollerState::Idle,
            worker: None,
        }
    }

    /// Registers a hook run after every successful append. The sample is already
    /// visible to buffer readers when the hook runs. Must be set before `start()`.
    pub fn on_update<F>(mut self, hook: F) -> Self
    where
        F: Fn(&SampleUpdate) + Send + 'static,
    {
        self.on_update = Some(Box::new(hook));
        self
    }

    /// Handle to the shared buffer, for consumers.
    pub fn buffer(&self) -> Arc<SampleBuffer> {
        Arc::clone(&self.buffer)
    }

    /// Options this poller was built with.
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PollerState {
        self.state
    }

    /// Counters so far.
    pub fn stats(&self) -> PollerStats {
        self.counters.snapshot()
    }

    /// Spawns the worker and fires the first tick immediately.
    pub fn start(&mut self) -> Result<(), SamplerError> {
        if self.state != PollerState::Idle {
            return Err(SamplerError::InvalidState(format!(
                "cannot start a {} poller",
                self.state
            )));
        }
        let source = self.source.take().ok_or_else(|| {
            SamplerError::InvalidState(String::from("quote source already consumed"))
        })?;

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let (done_tx, done_rx) = bounded::<()>(1);
        let abandoned = Arc::new(Mutex::new(false));

        let task = TickTask {
            symbol: self.config.symbol.clone(),
            policy: self.config.timestamps,
            buffer: Arc::clone(&self.buffer),
            source,
            on_update: self.on_update.take(),
            counters: Arc::clone(&self.counters),
            abandoned: Arc::clone(&abandoned),
            started: Instant::now(),
            last_timestamp: None,
        };
        let period = self.config.period;

        let handle = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || {
                task.run(period, stop_rx);
                let _ = done_tx.send(());
            })
            .map_err(|e| {
                self.state = PollerState::Stopped;
                SamplerError::Worker(format!("failed to spawn {}: {}", WORKER_NAME, e))
            })?;

        info!(
            "Poller started: symbol={} period={:?} capacity={} timestamps={}",
            self.config.symbol,
            period,
            self.buffer.capacity(),
            self.config.timestamps
        );
        self.worker = Some(Worker {
            handle,
            stop_tx,
            done_rx,
            abandoned,
        });
        self.state = PollerState::Running;
        Ok(())
    }

    /// Stops the schedule and waits, up to the stop timeout, for an in-flight tick.
    ///
    /// Once this returns no further samples reach the buffer. On `Abandoned`, the
    /// worker skips the update hook from then on, but a hook call that was already
    /// under way may still finish after this returns.
    pub fn stop(&mut self) -> StopOutcome {
        match self.state {
            PollerState::Stopped => return StopOutcome::AlreadyStopped,
            PollerState::Idle => {
                self.state = PollerState::Stopped;
                return StopOutcome::NotStarted;
            }
            PollerState::Running => self.state = PollerState::Stopped,
        }
        let Some(worker) = self.worker.take() else {
            return StopOutcome::NotStarted;
        };

        let _ = worker.stop_tx.try_send(());
        drop(worker.stop_tx);

        match worker.done_rx.recv_timeout(self.config.stop_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if worker.handle.join().is_err() {
                    error!("{} thread panicked during shutdown", WORKER_NAME);
                }
                info!("Poller stopped: {:?}", self.stats());
                StopOutcome::Finished
            }
            Err(RecvTimeoutError::Timeout) => {
                *worker.abandoned.lock().unwrap_or_else(PoisonError::into_inner) = true;
                warn!(
                    "In-flight tick did not finish within {:?}; abandoning {} thread",
                    self.config.stop_timeout, WORKER_NAME
                );
                StopOutcome::Abandoned
            }
        }
    }
}

impl<S: QuoteSource + 'static> Drop for Poller<S> {
    fn drop(&mut self) {
        if self.state == PollerState::Running {
            self.stop();
        }
    }
}

/// Everything the worker thread owns.
struct TickTask<S: QuoteSource> {
    symbol: String,
    policy: TimestampPolicy,
    buffer: Arc<SampleBuffer>,
    source: S,
    on_update: Option<UpdateHook>,
    counters: Arc<Counters>,
    abandoned: Arc<Mutex<bool>>,
    started: Instant,
    last_timestamp: Option<DateTime<Utc>>,
}

impl<S: QuoteSource> TickTask<S> {
    fn run(mut self, period: Duration, stop_rx: Receiver<()>) {
        let mut deadline = Instant::now();
        self.guarded_tick();

        loop {
            deadline = next_deadline(deadline, period, Instant::now());
            select! {
                recv(stop_rx) -> _ => break,
                recv(at(deadline)) -> _ => {
                    // Both arms may be ready at once; stop wins.
                    if !matches!(stop_rx.try_recv(), Err(TryRecvError::Empty)) {
                        break;
                    }
                    self.guarded_tick();
                }
            }
        }
        debug!("{} loop exited after {} ticks", WORKER_NAME, self.counters.snapshot().ticks);
    }

    fn guarded_tick(&mut self) {
        if panic::catch_unwind(AssertUnwindSafe(|| self.tick())).is_err() {
            self.counters.failures.fetch_add(1, Ordering::Relaxed);
            error!("Tick for {} panicked; schedule continues", self.symbol);
        }
    }

    fn tick(&mut self) {
        self.counters.ticks.fetch_add(1, Ordering::Relaxed);

        let quote = match self.source.fetch(&self.symbol) {
            Ok(quote) => quote,
            Err(e) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                warn!("Failed to fetch {} price ({}): {}", self.symbol, e.kind(), e.message());
                return;
            }
        };

        let mut timestamp = self.policy.stamp(quote.traded_at, Utc::now());
        if let Some(last) = self.last_timestamp {
            if timestamp < last {
                debug!("{} timestamp {} behind last stored {}; clamping", self.symbol, timestamp, last);
                timestamp = last;
            }
        }
        let sample = match Sample::new(timestamp, quote.price) {
            Ok(sample) => sample,
            Err(e) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                warn!("Rejected {} quote ({}): {}", self.symbol, e.kind(), e.message());
                return;
            }
        };

        {
            // Held across the append so an abandoning `stop()` cannot interleave.
            let abandoned = self.abandoned.lock().unwrap_or_else(PoisonError::into_inner);
            if *abandoned {
                self.counters.discarded.fetch_add(1, Ordering::Relaxed);
                warn!("Discarding late {} quote from abandoned worker", self.symbol);
                return;
            }
            self.buffer.append(sample);
        }
        self.last_timestamp = Some(timestamp);
        self.counters.samples.fetch_add(1, Ordering::Relaxed);
        info!("{} @ {} -> {}", self.symbol, sample.timestamp(), sample.price());

        self.notify(sample);
    }

    fn notify(&self, sample: Sample) {
        let Some(hook) = &self.on_update else {
            return;
        };
        if *self.abandoned.lock().unwrap_or_else(PoisonError::into_inner) {
            debug!("Skipping update hook for {} on abandoned worker", self.symbol);
            return;
        }
        hook(&SampleUpdate {
            sample,
            elapsed: self.started.elapsed(),
        });
    }
}

/// Deadline of the tick after the one due at `previous`, on the
/// `previous + k * period` grid.
///
/// When `now` is already past the following slot, returns the latest slot at or
/// before `now`: one late tick fires at once and the rest are skipped.
fn next_deadline(previous: Instant, period: Duration, now: Instant) -> Instant {
    let next = previous + period;
    if next >= now {
        return next;
    }
    let behind = now.duration_since(next).as_nanos() / period.as_nanos().max(1);
    let skipped = u32::try_from(behind).unwrap_or(u32::MAX);
    next + period.saturating_mul(skipped)
}
