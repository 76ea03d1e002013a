//! Mapping of report rows to metric points.
//!
//! Only a fixed whitelist of stats is forwarded. Every point is a gauge,
//! including the `hrsp_*` response counters, which HAProxy reports as
//! cumulative totals; statsd receives them as the current value.

mod point;

pub use point::{MetricKind, MetricPoint, MetricValue};

use crate::report::StatRow;
use thiserror::Error;

/// Stats forwarded for every row, in emission order.
pub const STAT_NAMES: [&str; 16] = [
    "scur", "smax", "ereq", "econ", "rate", "bin", "bout", "hrsp_1xx", "hrsp_2xx", "hrsp_3xx",
    "hrsp_4xx", "hrsp_5xx", "qtime", "ctime", "rtime", "ttime",
];

/// Column holding the proxy name.
pub const PROXY_COLUMN: &str = "pxname";
/// Column holding the server or frontend/backend name.
pub const SERVER_COLUMN: &str = "svname";

/// Errors raised while mapping a row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapperError {
    #[error("row has no {column} column")]
    MissingIdentity { column: &'static str },
    #[error("{path}: {stat} value {value:?} is not a number")]
    BadValue {
        path: String,
        stat: &'static str,
        value: String,
    },
}

/// Points produced from one row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MappedRow {
    pub points: Vec<MetricPoint>,
    /// Stats that were skipped because their value did not parse.
    pub rejected: Vec<MapperError>,
}

/// Maps one row to its whitelisted gauges under `namespace`.
///
/// Absent and empty stats map to `0`. A stat that does not parse skips
/// only its own point. A row without `pxname` or `svname` is an error.
pub fn map_row(row: &StatRow, namespace: &str) -> Result<MappedRow, MapperError> {
    let pxname = row.get(PROXY_COLUMN).ok_or(MapperError::MissingIdentity {
        column: PROXY_COLUMN,
    })?;
    let svname = row.get(SERVER_COLUMN).ok_or(MapperError::MissingIdentity {
        column: SERVER_COLUMN,
    })?;
    let prefix = format!("{}.{}.{}", namespace, pxname, svname);

    let mut mapped = MappedRow {
        points: Vec::with_capacity(STAT_NAMES.len()),
        rejected: Vec::new(),
    };

    for stat in STAT_NAMES {
        let raw = row.get(stat).unwrap_or("");
        match MetricValue::parse(raw) {
            Some(value) => mapped
                .points
                .push(MetricPoint::gauge(format!("{}.{}", prefix, stat), value)),
            None => mapped.rejected.push(MapperError::BadValue {
                path: prefix.clone(),
                stat,
                value: raw.to_string(),
            }),
        }
    }

    Ok(mapped)
}
