//! statsd emission.
//!
//! Each [`MetricPoint`] becomes exactly one datagram. Sends are
//! best-effort: a failure is recorded and the remaining points are still
//! sent.

mod transport;

pub use transport::{DatagramTransport, RecordingTransport, UdpTransport};

use crate::mapping::MetricPoint;
use thiserror::Error;

/// A datagram that could not be handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitError {
    #[error("failed to send {path}: {reason}")]
    SendFailed { path: String, reason: String },
}

/// Outcome of one [`Emitter::emit`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitReport {
    /// Datagrams handed to the transport.
    pub sent: usize,
    pub failures: Vec<EmitError>,
}

/// Writes metric points to a datagram transport.
pub struct Emitter<T> {
    transport: T,
}

impl<T: DatagramTransport> Emitter<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Sends every point, in order, one datagram each.
    pub fn emit(&mut self, points: &[MetricPoint]) -> EmitReport {
        let mut report = EmitReport::default();
        self.transport.begin_batch();

        for point in points {
            let payload = point.to_wire();
            match self.transport.send(payload.as_bytes()) {
                Ok(()) => {
                    report.sent += 1;
                    tracing::trace!(payload = %payload, "Sent metric");
                }
                Err(e) => {
                    let error = EmitError::SendFailed {
                        path: point.path.clone(),
                        reason: e.to_string(),
                    };
                    tracing::warn!("{}", error);
                    report.failures.push(error);
                }
            }
        }

        report
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MetricValue;

    fn points(names: &[&str]) -> Vec<MetricPoint> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| MetricPoint::gauge(name.to_string(), MetricValue::Integer(i as i64)))
            .collect()
    }

    #[test]
    fn test_emit_in_order() {
        let mut emitter = Emitter::new(RecordingTransport::new());
        let report = emitter.emit(&points(&["ns.a", "ns.b", "ns.c"]));

        assert_eq!(report.sent, 3);
        assert!(report.failures.is_empty());
        assert_eq!(emitter.transport().sent(), ["ns.a:0|g", "ns.b:1|g", "ns.c:2|g"]);
    }

    #[test]
    fn test_failure_does_not_abort_batch() {
        let mut emitter = Emitter::new(RecordingTransport::failing_on("ns.b"));
        let report = emitter.emit(&points(&["ns.a", "ns.b", "ns.c"]));

        assert_eq!(report.sent, 2);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            &report.failures[0],
            EmitError::SendFailed { path, .. } if path == "ns.b"
        ));
        assert_eq!(emitter.transport().sent(), ["ns.a:0|g", "ns.c:2|g"]);
    }

    #[test]
    fn test_each_emit_is_one_batch() {
        let mut emitter = Emitter::new(RecordingTransport::new());
        emitter.emit(&points(&["ns.a", "ns.b"]));
        emitter.emit(&points(&["ns.c"]));
        assert_eq!(emitter.transport().batches(), 2);
    }

    #[test]
    fn test_unresolvable_sink_fails_every_point() {
        let mut emitter = Emitter::new(UdpTransport::new("no-such-host.invalid:8125"));

        for _ in 0..2 {
            let report = emitter.emit(&points(&["ns.a", "ns.b", "ns.c"]));
            assert_eq!(report.sent, 0);
            assert_eq!(report.failures.len(), 3);
        }
    }

    #[test]
    fn test_emit_nothing() {
        let mut emitter = Emitter::new(RecordingTransport::new());
        assert_eq!(emitter.emit(&[]), EmitReport::default());
    }
}
