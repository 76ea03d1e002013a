//! Scraping and parsing of the HAProxy CSV stats report.
//!
//! The report is fetched as raw text and parsed into [`StatRow`]s, one per
//! proxy/server line. The column set is taken from the header at parse time,
//! so new columns added by HAProxy are carried through and simply ignored
//! downstream.

mod fetch;
mod parse;
mod row;

pub use fetch::{strip_comment_marker, FetchError, HttpFetcher, ReportFetcher};
pub use parse::{parse, split_csv_line, ParseError, Report};
pub use row::StatRow;
