//! CSV report parsing.
//!
//! The first non-blank line is the header. Every later non-blank line is a
//! data row zipped against it. Rows whose field count differs from the
//! header are rejected individually and parsing continues with the next
//! line. A quoted field that never closes rejects its row the same way.

use super::StatRow;
use thiserror::Error;

/// Errors produced while parsing a report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("report has no header line")]
    HeaderMissing,
    #[error("line {line}: expected {expected} fields, found {found}")]
    MalformedRow {
        /// 1-based line number within the report text.
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: unterminated quoted field")]
    UnterminatedQuote { line: usize },
}

/// A parsed report.
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// Header column names in order.
    pub columns: Vec<String>,
    /// Well-formed rows in file order.
    pub rows: Vec<StatRow>,
    /// Rows skipped because of a field count mismatch.
    pub rejected: Vec<ParseError>,
}

/// Parses report text into rows.
///
/// Only a missing header fails the whole parse; malformed rows end up in
/// [`Report::rejected`].
pub fn parse(raw: &str) -> Result<Report, ParseError> {
    let mut lines = raw
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (index, header) = lines.next().ok_or(ParseError::HeaderMissing)?;
    let columns = split_csv_line(header).ok_or(ParseError::UnterminatedQuote { line: index + 1 })?;

    let mut report = Report {
        columns,
        ..Default::default()
    };

    for (index, line) in lines {
        let Some(fields) = split_csv_line(line) else {
            report
                .rejected
                .push(ParseError::UnterminatedQuote { line: index + 1 });
            continue;
        };
        if fields.len() != report.columns.len() {
            report.rejected.push(ParseError::MalformedRow {
                line: index + 1,
                expected: report.columns.len(),
                found: fields.len(),
            });
            continue;
        }
        report
            .rows
            .push(StatRow::from_pairs(report.columns.iter().cloned().zip(fields)));
    }

    tracing::trace!(
        columns = report.columns.len(),
        rows = report.rows.len(),
        rejected = report.rejected.len(),
        "Parsed stats report"
    );

    Ok(report)
}

/// Splits one CSV line into fields.
///
/// A field starting with `"` is quoted: it may contain commas, and `""`
/// inside it is a literal quote. Returns `None` when a quoted field is
/// never closed.
pub fn split_csv_line(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut rest = line;

    loop {
        let mut field = String::new();
        if let Some(quoted) = rest.strip_prefix('"') {
            rest = unquote(quoted, &mut field)?;
        }
        // Anything after a closing quote is kept verbatim up to the comma
        let end = rest.find(',').unwrap_or(rest.len());
        field.push_str(&rest[..end]);
        fields.push(field);

        match rest[end..].strip_prefix(',') {
            Some(tail) => rest = tail,
            None => return Some(fields),
        }
    }
}

/// Copies a quoted body into `field` and returns the text after the
/// closing quote.
fn unquote<'a>(mut body: &'a str, field: &mut String) -> Option<&'a str> {
    loop {
        let close = body.find('"')?;
        field.push_str(&body[..close]);
        body = &body[close + 1..];
        match body.strip_prefix('"') {
            Some(tail) => {
                field.push('"');
                body = tail;
            }
            None => return Some(body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // Trimmed-down HAProxy 2.x output; real reports end every line with a comma.
    const SAMPLE: &str = "\
pxname,svname,qcur,qmax,scur,smax,slim,stot,bin,bout,status,
stats,FRONTEND,,,1,2,2000,10,1234,5678,OPEN,
web,srv1,0,0,3,10,,42,100,200,UP,
web,BACKEND,0,0,3,10,200,42,100,200,UP,
";

    #[test]
    fn test_haproxy_sample() {
        let report = parse(SAMPLE).unwrap();

        assert_eq!(report.columns.len(), 12);
        assert_eq!(report.columns.last().map(String::as_str), Some(""));
        assert_eq!(report.rows.len(), 3);
        assert!(report.rejected.is_empty());

        let srv = &report.rows[1];
        assert_eq!(srv.get("pxname"), Some("web"));
        assert_eq!(srv.get("svname"), Some("srv1"));
        assert_eq!(srv.get("scur"), Some("3"));
        assert_eq!(srv.get("slim"), Some(""));
    }

    #[test]
    fn test_rows_keep_file_order() {
        let report = parse(SAMPLE).unwrap();
        let names: Vec<_> = report.rows.iter().filter_map(|r| r.get("svname")).collect();
        assert_eq!(names, ["FRONTEND", "srv1", "BACKEND"]);
    }

    #[test]
    fn test_blank_lines_ignored() {
        let report = parse("pxname,svname\r\nweb,srv1\r\n\r\n\n  \n").unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].get("svname"), Some("srv1"));
    }

    #[test]
    fn test_header_missing() {
        assert_eq!(parse("").unwrap_err(), ParseError::HeaderMissing);
        assert_eq!(parse("\n \n").unwrap_err(), ParseError::HeaderMissing);
    }

    #[test]
    fn test_header_only() {
        let report = parse("pxname,svname,scur\n").unwrap();
        assert!(report.rows.is_empty());
    }

    #[test]
    fn test_malformed_row_skipped() {
        let report = parse("pxname,svname,scur\nweb,srv1\nweb,srv2,4\n").unwrap();

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].get("svname"), Some("srv2"));
        assert_eq!(
            report.rejected,
            vec![ParseError::MalformedRow {
                line: 2,
                expected: 3,
                found: 2
            }]
        );
    }

    #[test]
    fn test_quoted_fields() {
        let report = parse("pxname,svname,\"last,chk\"\nweb,srv1,\"L7STS \"\"503\"\", fail\"\n").unwrap();

        assert_eq!(report.columns[2], "last,chk");
        assert_eq!(report.rows[0].get("last,chk"), Some("L7STS \"503\", fail"));
    }

    #[test]
    fn test_split_csv_line() {
        let fields = split_csv_line(r#"hello,"world, ""quoted""",123,"#).unwrap();
        assert_eq!(fields, vec!["hello", "world, \"quoted\"", "123", ""]);
        assert_eq!(split_csv_line("").unwrap(), vec![""]);
        assert_eq!(split_csv_line(r#""",x"#).unwrap(), vec!["", "x"]);
    }

    #[test]
    fn test_unterminated_quote() {
        assert_eq!(split_csv_line(r#""abc"#), None);
        assert_eq!(split_csv_line(r#"a,"b,c"#), None);
        assert_eq!(split_csv_line(r#"a,"b"",c"#), None);
    }

    #[test]
    fn test_unterminated_quote_rejects_row() {
        let report = parse("pxname,svname,scur\nweb,\"srv1,3\nweb,srv2,4\n").unwrap();

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].get("svname"), Some("srv2"));
        assert_eq!(report.rejected, vec![ParseError::UnterminatedQuote { line: 2 }]);
    }

    #[test]
    fn test_unterminated_quote_in_header() {
        assert_eq!(
            parse("\n\"pxname,svname\nweb,srv1\n").unwrap_err(),
            ParseError::UnterminatedQuote { line: 2 }
        );
    }

    proptest! {
        #[test]
        fn prop_one_row_per_line_with_header_keys(
            header in prop::collection::hash_set("[a-z_][a-z0-9_]{0,7}", 1..12),
            cells in prop::collection::vec(prop::collection::vec("[A-Za-z0-9 ,\"._-]{0,8}", 12), 0..20),
        ) {
            let header: Vec<String> = header.into_iter().collect();
            let mut text = header.join(",");
            text.push('\n');
            for row in &cells {
                let quoted: Vec<String> = row[..header.len()]
                    .iter()
                    .map(|c| format!("\"{}\"", c.replace('"', "\"\"")))
                    .collect();
                text.push_str(&quoted.join(","));
                text.push('\n');
            }

            let report = parse(&text).unwrap();
            prop_assert_eq!(report.rows.len(), cells.len());
            prop_assert!(report.rejected.is_empty());
            for (row, expected) in report.rows.iter().zip(&cells) {
                prop_assert_eq!(row.columns().collect::<Vec<_>>(), header.iter().map(String::as_str).collect::<Vec<_>>());
                for (name, cell) in header.iter().zip(expected) {
                    prop_assert_eq!(row.get(name), Some(cell.as_str()));
                }
            }
        }
    }
}
