//! Metric points and their statsd wire form.

use std::fmt;

/// statsd metric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Set-current-value semantics (`|g`).
    Gauge,
}

impl MetricKind {
    /// Type suffix used on the wire.
    #[inline]
    pub fn type_code(self) -> &'static str {
        match self {
            MetricKind::Gauge => "g",
        }
    }
}

/// Numeric value of a stat cell.
///
/// Integers stay integers so `3` is sent as `3`, not `3.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Integer(i64),
    Float(f64),
}

impl MetricValue {
    /// Parses a cell. Empty text is zero; non-finite floats are rejected.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Some(MetricValue::Integer(0));
        }
        if let Ok(v) = text.parse::<i64>() {
            return Some(MetricValue::Integer(v));
        }
        match text.parse::<f64>() {
            Ok(v) if v.is_finite() => Some(MetricValue::Float(v)),
            _ => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Integer(v) => write!(f, "{}", v),
            MetricValue::Float(v) => write!(f, "{}", v),
        }
    }
}

/// One metric ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    /// Dotted path, `namespace.pxname.svname.stat`.
    pub path: String,
    pub value: MetricValue,
    pub kind: MetricKind,
}

impl MetricPoint {
    pub fn gauge(path: String, value: MetricValue) -> Self {
        Self {
            path,
            value,
            kind: MetricKind::Gauge,
        }
    }

    /// Renders the datagram payload, `path:value|type`.
    pub fn to_wire(&self) -> String {
        format!("{}:{}|{}", self.path, self.value, self.kind.type_code())
    }
}
