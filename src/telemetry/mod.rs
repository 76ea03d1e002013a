//! Self-telemetry for the bridge.
//!
//! These are metrics about haproxy-statsd itself, not the HAProxy stats it
//! forwards. They are always collected; serving them over HTTP requires the
//! `metrics` feature and a non-zero `metrics_port`.
//!
//! # Metrics Exposed
//!
//! - `haproxy_statsd_cycles_total` - Scrape cycles started
//! - `haproxy_statsd_cycle_failures_total` - Cycles abandoned on fetch/parse errors
//! - `haproxy_statsd_last_success_timestamp_seconds` - Last cycle that reached emission
//! - `haproxy_statsd_rows_skipped_total` - Rows skipped as malformed
//! - `haproxy_statsd_points_skipped_total` - Non-numeric stat values skipped
//! - `haproxy_statsd_datagrams_sent_total` - Datagrams handed to the socket
//! - `haproxy_statsd_send_failures_total` - Datagrams that failed to send

mod registry;
#[cfg(feature = "metrics")]
mod server;

pub use registry::{BridgeMetrics, TelemetryError};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, ServerError};
