//! The scrape → parse → map → emit cycle and the loop that drives it.
//!
//! ```text
//! Idle → Fetching → Parsing → Emitting → Sleeping → Fetching … → Stopped
//! ```
//!
//! A fetch or parse failure abandons the cycle before anything is sent and
//! the loop carries on at the next interval. Mapping and send failures only
//! drop the affected row or point.

mod stop;

pub use stop::StopSignal;

use crate::config::{Config, ReportSource};
use crate::emit::{DatagramTransport, Emitter};
use crate::mapping::{map_row, STAT_NAMES};
use crate::report::{parse, FetchError, ParseError, ReportFetcher};
use crate::telemetry::BridgeMetrics;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Reasons a cycle is abandoned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Whether the loop runs one cycle or keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Once,
    Continuous,
}

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Fetching,
    Parsing,
    Emitting,
    Sleeping,
    Stopped,
}

/// Outcome of a cycle that reached emission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Well-formed rows in the report.
    pub rows: usize,
    /// Rows dropped as malformed or lacking pxname/svname.
    pub rows_skipped: usize,
    /// Stats dropped because their value was not numeric.
    pub points_skipped: usize,
    /// Datagrams handed to the transport.
    pub sent: usize,
    pub send_failures: usize,
}

/// Totals over a whole [`PollLoop::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub failed_cycles: u64,
    pub datagrams_sent: u64,
}

/// Drives fetch, parse, map and emit on an interval.
pub struct PollLoop<F, T> {
    fetcher: F,
    emitter: Emitter<T>,
    source: ReportSource,
    namespace: String,
    interval: Duration,
    mode: RunMode,
    stop: StopSignal,
    metrics: Option<BridgeMetrics>,
    state: PollState,
}

impl<F, T> PollLoop<F, T>
where
    F: ReportFetcher,
    T: DatagramTransport,
{
    pub fn new(fetcher: F, emitter: Emitter<T>, config: &Config, mode: RunMode, stop: StopSignal) -> Self {
        Self {
            fetcher,
            emitter,
            source: config.source.clone(),
            namespace: config.sink.namespace.clone(),
            interval: config.interval,
            mode,
            stop,
            metrics: None,
            state: PollState::Idle,
        }
    }

    /// Records cycle outcomes into `metrics`.
    pub fn with_metrics(mut self, metrics: BridgeMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn emitter(&self) -> &Emitter<T> {
        &self.emitter
    }

    /// Runs one full cycle.
    ///
    /// Either every well-formed row of the report is emitted or, on a fetch
    /// or parse error, nothing is.
    pub fn run_cycle(&mut self) -> Result<CycleReport, CycleError> {
        self.state = PollState::Fetching;
        let raw = self.fetcher.fetch(&self.source)?;

        self.state = PollState::Parsing;
        let report = parse(&raw)?;
        for rejected in &report.rejected {
            warn!("Skipping malformed row: {}", rejected);
        }

        self.state = PollState::Emitting;
        let mut cycle = CycleReport {
            rows: report.rows.len(),
            rows_skipped: report.rejected.len(),
            ..Default::default()
        };
        let mut points = Vec::with_capacity(report.rows.len() * STAT_NAMES.len());

        for (index, row) in report.rows.iter().enumerate() {
            match map_row(row, &self.namespace) {
                Ok(mapped) => {
                    for rejected in &mapped.rejected {
                        warn!(row = index + 1, "Skipping stat: {}", rejected);
                    }
                    cycle.points_skipped += mapped.rejected.len();
                    points.extend(mapped.points);
                }
                Err(e) => {
                    warn!(row = index + 1, "Skipping row: {}", e);
                    cycle.rows_skipped += 1;
                }
            }
        }

        let emitted = self.emitter.emit(&points);
        cycle.sent = emitted.sent;
        cycle.send_failures = emitted.failures.len();

        info!("Reported {} stats", cycle.sent);
        debug!(
            rows = cycle.rows,
            rows_skipped = cycle.rows_skipped,
            points_skipped = cycle.points_skipped,
            send_failures = cycle.send_failures,
            "Cycle complete"
        );

        Ok(cycle)
    }

    /// Runs cycles until the mode or the stop signal ends the loop.
    pub fn run(&mut self) -> RunSummary {
        let mut summary = RunSummary::default();

        info!(
            mode = ?self.mode,
            interval_secs = self.interval.as_secs_f64(),
            url = %self.source.url,
            namespace = %self.namespace,
            "Starting poll loop"
        );

        while !self.stop.is_stopped() {
            summary.cycles += 1;

            match self.run_cycle() {
                Ok(cycle) => {
                    summary.datagrams_sent += cycle.sent as u64;
                    if let Some(metrics) = &self.metrics {
                        metrics.record_success(&cycle);
                    }
                }
                Err(e) => {
                    summary.failed_cycles += 1;
                    error!("Cycle abandoned: {}", e);
                    if let Some(metrics) = &self.metrics {
                        metrics.record_failure();
                    }
                }
            }

            if self.mode == RunMode::Once {
                break;
            }

            self.state = PollState::Sleeping;
            if self.stop.wait_timeout(self.interval) {
                break;
            }
        }

        self.state = PollState::Stopped;
        info!(
            cycles = summary.cycles,
            failed = summary.failed_cycles,
            sent = summary.datagrams_sent,
            "Poll loop stopped"
        );

        summary
    }
}
