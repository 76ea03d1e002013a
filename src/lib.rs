//! HAProxy to statsd bridge.
//!
//! Periodically scrapes the HAProxy CSV stats page and forwards a fixed
//! set of per-proxy/per-server stats to statsd as gauges.
//!
//! # Architecture
//!
//! One cycle runs fully before the next begins:
//!
//! ```text
//! report::fetch → report::parse → mapping → emit
//!          ↑                                  ↓
//!          └────────── poll (interval) ───────┘
//! ```
//!
//! # Design Principles
//!
//! - **Loose schema**: rows are keyed by whatever columns the header lists
//! - **Cycle isolation**: a failed scrape sends nothing and never stops the loop
//! - **Best-effort delivery**: one UDP datagram per metric, failures are logged
//! - **Wire compatibility**: every stat is a gauge, including response counters
//!
//! # Example
//!
//! ```no_run
//! use haproxy_statsd::{
//!     config::Config,
//!     emit::{Emitter, UdpTransport},
//!     poll::{PollLoop, RunMode, StopSignal},
//!     report::HttpFetcher,
//! };
//!
//! let config = Config::load("haproxy-statsd.toml").unwrap();
//! let fetcher = HttpFetcher::new(&config.source).unwrap();
//! let emitter = Emitter::new(UdpTransport::new(config.sink.address()));
//!
//! let mut poll = PollLoop::new(fetcher, emitter, &config, RunMode::Once, StopSignal::new());
//! let summary = poll.run();
//! println!("sent {} datagrams", summary.datagrams_sent);
//! ```

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod emit;
pub mod mapping;
pub mod poll;
pub mod report;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{Config, ConfigError, MetricSink, ReportSource};
pub use emit::{DatagramTransport, EmitError, EmitReport, Emitter, UdpTransport};
pub use mapping::{map_row, MapperError, MetricPoint, MetricValue, STAT_NAMES};
pub use poll::{CycleError, CycleReport, PollLoop, RunMode, RunSummary, StopSignal};
pub use report::{parse, FetchError, HttpFetcher, ParseError, Report, ReportFetcher, StatRow};
pub use telemetry::BridgeMetrics;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
