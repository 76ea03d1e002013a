//! Prometheus registry of bridge self-metrics.

use crate::poll::CycleReport;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during telemetry operations.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Counters describing what the bridge itself has done.
///
/// Cloning is cheap and clones share the same underlying metrics, so the
/// poll loop and the exporter can each hold one.
#[derive(Clone)]
pub struct BridgeMetrics {
    registry: Registry,

    // Cycle metrics
    cycles_total: IntCounter,
    cycle_failures_total: IntCounter,
    last_success_timestamp: IntGauge,

    // Row/point metrics
    rows_skipped_total: IntCounter,
    points_skipped_total: IntCounter,

    // Datagram metrics
    datagrams_sent_total: IntCounter,
    send_failures_total: IntCounter,
}

impl BridgeMetrics {
    /// Creates a registry with all bridge metrics registered.
    pub fn new() -> Result<Self, TelemetryError> {
        let registry = Registry::new();

        let cycles_total = IntCounter::new(
            "haproxy_statsd_cycles_total",
            "Scrape cycles started",
        )?;
        let cycle_failures_total = IntCounter::new(
            "haproxy_statsd_cycle_failures_total",
            "Scrape cycles abandoned because of a fetch or parse error",
        )?;
        let last_success_timestamp = IntGauge::new(
            "haproxy_statsd_last_success_timestamp_seconds",
            "Unix time of the last cycle that reached emission",
        )?;
        let rows_skipped_total = IntCounter::new(
            "haproxy_statsd_rows_skipped_total",
            "Report rows skipped as malformed or missing pxname/svname",
        )?;
        let points_skipped_total = IntCounter::new(
            "haproxy_statsd_points_skipped_total",
            "Stat values skipped because they were not numeric",
        )?;
        let datagrams_sent_total = IntCounter::new(
            "haproxy_statsd_datagrams_sent_total",
            "statsd datagrams handed to the socket",
        )?;
        let send_failures_total = IntCounter::new(
            "haproxy_statsd_send_failures_total",
            "statsd datagrams that failed to send",
        )?;

        registry.register(Box::new(cycles_total.clone()))?;
        registry.register(Box::new(cycle_failures_total.clone()))?;
        registry.register(Box::new(last_success_timestamp.clone()))?;
        registry.register(Box::new(rows_skipped_total.clone()))?;
        registry.register(Box::new(points_skipped_total.clone()))?;
        registry.register(Box::new(datagrams_sent_total.clone()))?;
        registry.register(Box::new(send_failures_total.clone()))?;

        Ok(Self {
            registry,
            cycles_total,
            cycle_failures_total,
            last_success_timestamp,
            rows_skipped_total,
            points_skipped_total,
            datagrams_sent_total,
            send_failures_total,
        })
    }

    /// Records a cycle that reached emission.
    pub fn record_success(&self, report: &CycleReport) {
        self.cycles_total.inc();
        self.rows_skipped_total.inc_by(report.rows_skipped as u64);
        self.points_skipped_total.inc_by(report.points_skipped as u64);
        self.datagrams_sent_total.inc_by(report.sent as u64);
        self.send_failures_total.inc_by(report.send_failures as u64);
        self.last_success_timestamp.set(chrono::Utc::now().timestamp());
    }

    /// Records an abandoned cycle.
    pub fn record_failure(&self) {
        self.cycles_total.inc();
        self.cycle_failures_total.inc();
    }

    /// Total datagrams sent since startup.
    pub fn datagrams_sent(&self) -> u64 {
        self.datagrams_sent_total.get()
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, TelemetryError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let output = BridgeMetrics::new().unwrap().encode().unwrap();
        for name in [
            "haproxy_statsd_cycles_total",
            "haproxy_statsd_cycle_failures_total",
            "haproxy_statsd_last_success_timestamp_seconds",
            "haproxy_statsd_rows_skipped_total",
            "haproxy_statsd_points_skipped_total",
            "haproxy_statsd_datagrams_sent_total",
            "haproxy_statsd_send_failures_total",
        ] {
            assert!(output.contains(name), "{} missing from export", name);
        }
    }

    #[test]
    fn test_record_success() {
        let metrics = BridgeMetrics::new().unwrap();
        let report = CycleReport {
            rows: 2,
            rows_skipped: 1,
            points_skipped: 3,
            sent: 29,
            send_failures: 0,
        };

        metrics.record_success(&report);
        metrics.record_success(&report);

        let output = metrics.encode().unwrap();
        assert!(output.contains("haproxy_statsd_cycles_total 2"));
        assert!(output.contains("haproxy_statsd_datagrams_sent_total 58"));
        assert!(output.contains("haproxy_statsd_points_skipped_total 6"));
        assert!(output.contains("haproxy_statsd_cycle_failures_total 0"));
        assert!(metrics.last_success_timestamp.get() > 0);
    }

    #[test]
    fn test_record_failure() {
        let metrics = BridgeMetrics::new().unwrap();
        metrics.record_failure();

        let output = metrics.encode().unwrap();
        assert!(output.contains("haproxy_statsd_cycles_total 1"));
        assert!(output.contains("haproxy_statsd_cycle_failures_total 1"));
        assert_eq!(metrics.datagrams_sent(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let metrics = BridgeMetrics::new().unwrap();
        let clone = metrics.clone();
        clone.record_failure();
        assert!(metrics.encode().unwrap().contains("haproxy_statsd_cycles_total 1"));
    }
}
