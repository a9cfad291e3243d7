//! One line of a cache file.
//!
//! ```text
//! <recorded_at RFC 3339>|<base64 url>|<base64 key>|<base64 response>
//! ```
//!
//! The base64 alphabet never contains `|` or a newline, so fields and
//! records need no further escaping.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, SecondsFormat, Utc};
use nom::{
    bytes::complete::{is_not, take_while},
    character::complete::char,
    combinator::{all_consuming, map_res},
    sequence::{terminated, tuple},
    IResult,
};

/// Field separator.
pub const SEPARATOR: char = '|';

/// A decoded cache record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// When the pair was captured.
    pub recorded_at: DateTime<Utc>,
    /// Target URL.
    pub url: String,
    /// Request key (raw request or digest).
    pub key: Vec<u8>,
    /// Captured response.
    pub response: Vec<u8>,
}

impl Record {
    /// Creates a record stamped with the current time.
    pub fn new(url: &str, key: &[u8], response: &[u8]) -> Self {
        Self {
            recorded_at: Utc::now(),
            url: url.to_string(),
            key: key.to_vec(),
            response: response.to_vec(),
        }
    }

    /// Encodes the record as one line, without the trailing newline.
    pub fn encode(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}{sep}{}",
            self.recorded_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            BASE64.encode(self.url.as_bytes()),
            BASE64.encode(&self.key),
            BASE64.encode(&self.response),
            sep = SEPARATOR,
        )
    }

    /// Decodes one line.
    pub fn decode(line: &str) -> Result<Self, String> {
        match all_consuming(record)(line) {
            Ok((_, (recorded_at, url, key, response))) => {
                let url = String::from_utf8(url).map_err(|_| "url is not UTF-8".to_string())?;
                Ok(Self {
                    recorded_at,
                    url,
                    key,
                    response,
                })
            }
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                let column = line.len() - e.input.len() + 1;
                Err(format!("unexpected input at column {}", column))
            }
            Err(nom::Err::Incomplete(_)) => Err("truncated record".to_string()),
        }
    }
}

type Fields = (DateTime<Utc>, Vec<u8>, Vec<u8>, Vec<u8>);

fn record(input: &str) -> IResult<&str, Fields> {
    tuple((
        terminated(timestamp, char(SEPARATOR)),
        terminated(encoded, char(SEPARATOR)),
        terminated(encoded, char(SEPARATOR)),
        encoded,
    ))(input)
}

fn timestamp(input: &str) -> IResult<&str, DateTime<Utc>> {
    map_res(is_not("|"), |text: &str| {
        DateTime::parse_from_rfc3339(text).map(|t| t.with_timezone(&Utc))
    })(input)
}

/// A base64 field; empty payloads encode to an empty field.
fn encoded(input: &str) -> IResult<&str, Vec<u8>> {
    map_res(
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '='),
        |text: &str| BASE64.decode(text),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_then_decode() {
        let original = Record::new("http://localhost/xmla", b"<Execute/>", b"<return>|\n</return>");
        let line = original.encode();
        assert!(!line.contains('\n'));
        assert_eq!(line.matches(SEPARATOR).count(), 3);

        let decoded = Record::decode(&line).unwrap();
        assert_eq!(decoded.url, original.url);
        assert_eq!(decoded.key, original.key);
        assert_eq!(decoded.response, original.response);
        assert_eq!(
            decoded.recorded_at.timestamp_millis(),
            original.recorded_at.timestamp_millis()
        );
    }

    #[test]
    fn test_decode_known_line() {
        let record = Record::decode("2024-03-01T10:00:00Z|dQ==|cQ==|cg==").unwrap();
        assert_eq!(record.url, "u");
        assert_eq!(record.key, b"q");
        assert_eq!(record.response, b"r");
        assert_eq!(record.recorded_at.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn test_empty_response_field() {
        let record = Record::decode("2024-03-01T10:00:00Z|dQ==|cQ==|").unwrap();
        assert!(record.response.is_empty());
    }

    #[test]
    fn test_decode_rejects_bad_lines() {
        for line in [
            "",
            "not-a-date|dQ==|cQ==|cg==",
            "2024-03-01T10:00:00Z|dQ==|cQ==",
            "2024-03-01T10:00:00Z|dQ==|cQ==|cg==|extra",
            "2024-03-01T10:00:00Z|d!==|cQ==|cg==",
            "2024-03-01T10:00:00Z|dQ=|cQ==|cg==",
        ] {
            assert!(Record::decode(line).is_err(), "{:?}", line);
        }
    }
}
