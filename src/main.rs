//! haproxy-statsd CLI
//!
//! Reports HAProxy stats to statsd, once or on an interval until Ctrl-C.

use clap::Parser;
use haproxy_statsd::{
    config::Config,
    emit::{Emitter, UdpTransport},
    poll::{PollLoop, RunMode, StopSignal},
    report::HttpFetcher,
    telemetry::BridgeMetrics,
};
use std::path::PathBuf;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Report haproxy stats to statsd.
#[derive(Parser)]
#[command(name = "haproxy-statsd", version, about = "Report haproxy stats to statsd")]
struct Args {
    /// Config file location.
    #[arg(short, long, default_value = "./haproxy-statsd.toml")]
    config: PathBuf,

    /// Run once and exit.
    #[arg(short = '1', long)]
    once: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let args = Args::parse();

    let level = if args.quiet {
        Level::ERROR
    } else {
        match args.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("haproxy-statsd v{}", haproxy_statsd::VERSION);

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let fetcher = match HttpFetcher::new(&config.source) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };
    let emitter = Emitter::new(UdpTransport::new(config.sink.address()));

    let stop = StopSignal::new();
    let handler_stop = stop.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        handler_stop.request_stop();
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let mode = if args.once {
        RunMode::Once
    } else {
        RunMode::Continuous
    };
    let mut poll = PollLoop::new(fetcher, emitter, &config, mode, stop);

    match BridgeMetrics::new() {
        Ok(metrics) => {
            start_exporter(config.metrics_port, &metrics);
            poll = poll.with_metrics(metrics);
        }
        Err(e) => warn!("Self-telemetry disabled: {}", e),
    }

    poll.run();
}

#[cfg(feature = "metrics")]
fn start_exporter(port: u16, metrics: &BridgeMetrics) {
    use haproxy_statsd::telemetry::{MetricsServer, MetricsServerConfig};

    if port == 0 {
        return;
    }
    let server = MetricsServer::new(MetricsServerConfig::with_port(port), metrics.clone());
    if let Err(e) = server.spawn() {
        warn!("Failed to start metrics server: {}", e);
    }
}

#[cfg(not(feature = "metrics"))]
fn start_exporter(port: u16, _metrics: &BridgeMetrics) {
    if port != 0 {
        warn!(
            port,
            "metrics_port is set but this build lacks the `metrics` feature"
        );
    }
}
