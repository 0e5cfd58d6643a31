//! Extracts client addresses from a tab-delimited access log.
//!
//! The address lives at a fixed column of every line. Proxies may record a
//! forwarded-for chain there (`"203.0.113.5, 10.0.0.1"`); each element of the
//! chain is validated on its own.

use crate::addresses::error::ParseError;
use crate::addresses::validator::{validate, RejectReason};
use log::warn;
use std::net::IpAddr;
use std::path::Path;

/// Column holding the client address in the default log layout (zero based).
pub const DEFAULT_FIELD_INDEX: usize = 23;

const FIELD_DELIMITER: char = '\t';
const CHAIN_DELIMITER: char = ',';

/// A candidate that did not survive parsing or validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// 1-based line number in the log.
    pub line: usize,
    /// The raw field (or chain element) that was rejected.
    pub raw: String,
    pub reason: RejectReason,
}

/// Result of a parse pass over a whole log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLog {
    /// Number of non-blank lines read.
    pub lines: usize,
    /// Accepted addresses, in the order they appear in the log.
    pub addresses: Vec<IpAddr>,
    pub rejections: Vec<Rejection>,
}

impl ParsedLog {
    /// Every candidate looked at, accepted or not.
    pub fn candidates(&self) -> usize {
        self.addresses.len() + self.rejections.len()
    }

    fn reject(&mut self, line: usize, raw: &str, reason: RejectReason) {
        warn!(
            "Invalid address at line [{}] value [{}]: {}. Skipping...",
            line, raw, reason
        );
        self.rejections.push(Rejection {
            line,
            raw: raw.to_string(),
            reason,
        });
    }
}

/// Parses log text already held in memory.
pub fn parse_lines(text: &str, field_index: usize) -> ParsedLog {
    let mut parsed = ParsedLog::default();

    for (number, line) in text.lines().enumerate() {
        let number = number + 1;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        parsed.lines += 1;

        let Some(field) = line.split(FIELD_DELIMITER).nth(field_index) else {
            let found = line.split(FIELD_DELIMITER).count();
            parsed.reject(
                number,
                line,
                RejectReason::MissingField {
                    index: field_index,
                    found,
                },
            );
            continue;
        };

        for token in field.split(CHAIN_DELIMITER) {
            match validate(token) {
                Ok(address) => parsed.addresses.push(address),
                Err(reason) => parsed.reject(number, token.trim(), reason),
            }
        }
    }

    parsed
}

/// Reads and parses a log file from disk.
pub async fn parse_log_file(path: &Path, field_index: usize) -> Result<ParsedLog, ParseError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ParseError::LogRead(path.to_path_buf(), e))?;
    Ok(parse_lines(&text, field_index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn line_with(field_index: usize, value: &str) -> String {
        let mut fields: Vec<String> = (0..field_index).map(|i| format!("f{i}")).collect();
        fields.push(value.to_string());
        fields.push("trailing".to_string());
        fields.join("\t")
    }

    #[test]
    fn extracts_address_at_configured_index() {
        let text = [line_with(2, "8.8.8.8"), line_with(2, "1.1.1.1")].join("\n");
        let parsed = parse_lines(&text, 2);

        assert_eq!(parsed.lines, 2);
        assert_eq!(
            parsed.addresses,
            vec![
                "8.8.8.8".parse::<IpAddr>().unwrap(),
                "1.1.1.1".parse::<IpAddr>().unwrap()
            ]
        );
        assert!(parsed.rejections.is_empty());
    }

    #[test]
    fn forwarded_for_chain_is_split() {
        let parsed = parse_lines(&line_with(DEFAULT_FIELD_INDEX, "203.0.113.5, 10.0.0.1"), DEFAULT_FIELD_INDEX);

        assert_eq!(parsed.addresses, vec!["203.0.113.5".parse::<IpAddr>().unwrap()]);
        assert_eq!(
            parsed.rejections,
            vec![Rejection {
                line: 1,
                raw: "10.0.0.1".to_string(),
                reason: RejectReason::PrivateOrReserved,
            }]
        );
        assert_eq!(parsed.candidates(), 2);
    }

    #[test]
    fn short_lines_are_rejected_not_fatal() {
        let text = format!("only\tthree\tfields\n{}", line_with(3, "8.8.4.4"));
        let parsed = parse_lines(&text, 3);

        assert_eq!(parsed.addresses.len(), 1);
        assert_eq!(parsed.rejections.len(), 1);
        assert_eq!(parsed.rejections[0].line, 1);
        assert_eq!(
            parsed.rejections[0].reason,
            RejectReason::MissingField { index: 3, found: 3 }
        );
    }

    #[test]
    fn blank_lines_and_crlf_are_tolerated() {
        let text = format!("\r\n{}\r\n\n{}\r\n", line_with(0, "9.9.9.9"), line_with(0, "garbage"));
        let parsed = parse_lines(&text, 0);

        assert_eq!(parsed.lines, 2);
        assert_eq!(parsed.addresses.len(), 1);
        assert_eq!(parsed.rejections[0].line, 4);
        assert_eq!(parsed.rejections[0].reason, RejectReason::Malformed);
    }

    #[test]
    fn repeated_addresses_keep_input_order() {
        let text = ["1.1.1.1", "8.8.8.8", "1.1.1.1"]
            .iter()
            .map(|a| line_with(1, a))
            .collect::<Vec<_>>()
            .join("\n");
        let parsed = parse_lines(&text, 1);
        let rendered: Vec<String> = parsed.addresses.iter().map(|a| a.to_string()).collect();

        assert_eq!(rendered, ["1.1.1.1", "8.8.8.8", "1.1.1.1"]);
    }

    #[tokio::test]
    async fn reads_log_from_disk() -> Result<(), ParseError> {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", line_with(1, "8.8.8.8")).unwrap();

        let parsed = parse_log_file(file.path(), 1).await?;
        assert_eq!(parsed.addresses.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn missing_log_file_is_an_error() {
        let result = parse_log_file(Path::new("/definitely/not/here.log"), 1).await;
        assert!(matches!(result, Err(ParseError::LogRead(_, _))));
    }
}
