//! Version records and their log line encoding
//!
//! One record per committed version. On disk a record is a single line of
//! seven tab-separated fields:
//!
//! `path \t timestamp \t version \t based_on \t signature \t checksum \t description`
//!
//! Version numbers are zero-padded to [`VERSION_WIDTH`] digits, the timestamp
//! is RFC 3339 and the description is a quoted, escaped string so it can never
//! contain a raw tab or newline.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use std::fmt;
use std::str::FromStr;

/// Minimum number of digits used when printing version numbers.
pub const VERSION_WIDTH: usize = 4;

const FIELD_COUNT: usize = 7;

/// One committed version of a tracked file. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecord {
    /// Absolute path of the tracked file; the identity key
    pub path: String,
    pub timestamp: DateTime<Utc>,
    /// Starts at 1, +1 per commit of the same path
    pub version: u32,
    /// Declared parent version, 0 for a root
    pub based_on: u32,
    pub path_signature: String,
    pub content_checksum: u32,
    /// Unescaped change description
    pub change_description: String,
}

impl VersionRecord {
    /// Build a record stamped with the current time, truncated to whole
    /// seconds so that it equals its own reloaded form.
    pub fn new(
        path: impl Into<String>,
        version: u32,
        based_on: u32,
        path_signature: impl Into<String>,
        content_checksum: u32,
        change_description: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            timestamp: Utc::now().trunc_subsecs(0),
            version,
            based_on,
            path_signature: path_signature.into(),
            content_checksum,
            change_description: change_description.into(),
        }
    }

    /// Whether this record starts a new root chain.
    pub fn is_root(&self) -> bool {
        self.based_on == 0
    }

    /// RFC 3339 timestamp as written to the log.
    pub fn timestamp_rfc3339(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Quoted and escaped description as written to the log.
    pub fn quoted_description(&self) -> String {
        quote(&self.change_description)
    }

    /// Encode as one log line, without the trailing newline.
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.path,
            self.timestamp_rfc3339(),
            format_version(self.version),
            format_version(self.based_on),
            self.path_signature,
            self.content_checksum,
            self.quoted_description()
        )
    }
}

impl fmt::Display for VersionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

/// Reason a log line could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseRecordError {
    FieldCount(usize),
    Timestamp(String),
    Version(String),
    BasedOn(String),
    Checksum(String),
    Description(String),
}

impl fmt::Display for ParseRecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseRecordError::FieldCount(n) => {
                write!(f, "expected {} fields, found {}", FIELD_COUNT, n)
            }
            ParseRecordError::Timestamp(v) => write!(f, "malformed timestamp '{}'", v),
            ParseRecordError::Version(v) => write!(f, "malformed version '{}'", v),
            ParseRecordError::BasedOn(v) => write!(f, "malformed parent '{}'", v),
            ParseRecordError::Checksum(v) => write!(f, "malformed data crc '{}'", v),
            ParseRecordError::Description(v) => write!(f, "malformed description '{}'", v),
        }
    }
}

impl std::error::Error for ParseRecordError {}

impl FromStr for VersionRecord {
    type Err = ParseRecordError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() != FIELD_COUNT {
            return Err(ParseRecordError::FieldCount(parts.len()));
        }

        let timestamp = DateTime::parse_from_rfc3339(parts[1])
            .map_err(|_| ParseRecordError::Timestamp(parts[1].to_string()))?
            .with_timezone(&Utc);
        let version = parts[2]
            .parse::<u32>()
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| ParseRecordError::Version(parts[2].to_string()))?;
        let based_on = parts[3]
            .parse::<u32>()
            .map_err(|_| ParseRecordError::BasedOn(parts[3].to_string()))?;
        let content_checksum = parts[5]
            .parse::<u32>()
            .map_err(|_| ParseRecordError::Checksum(parts[5].to_string()))?;
        let change_description = unquote(parts[6])
            .ok_or_else(|| ParseRecordError::Description(parts[6].to_string()))?;

        Ok(VersionRecord {
            path: parts[0].to_string(),
            timestamp,
            version,
            based_on,
            path_signature: parts[4].to_string(),
            content_checksum,
            change_description,
        })
    }
}

/// Zero-padded version number, as used in log lines and blob names.
pub fn format_version(version: u32) -> String {
    format!("{:0width$}", version, width = VERSION_WIDTH)
}

fn quote(s: &str) -> String {
    // A JSON string literal escapes quotes, backslashes and every control
    // character, so the result is always a single tab-free field.
    serde_json::Value::String(s.to_string()).to_string()
}

fn unquote(field: &str) -> Option<String> {
    if !field.starts_with('"') {
        return None;
    }
    serde_json::from_str::<String>(field)
        .ok()
        .or_else(|| unquote_escaped(field))
}

/// Decode the C-style escapes JSON lacks (`\a`, `\v`, `\'`, `\xHH`,
/// `\UHHHHHHHH`, octal `\ooo`), as found in logs written by other tools.
/// Byte escapes that do not form valid UTF-8 are replaced.
fn unquote_escaped(field: &str) -> Option<String> {
    let inner = field.strip_prefix('"')?.strip_suffix('"')?;
    let mut out: Vec<u8> = Vec::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => return None,
            '\\' => {}
            _ => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                continue;
            }
        }

        let escaped = match chars.next()? {
            'a' => '\u{07}',
            'b' => '\u{08}',
            'f' => '\u{0c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{0b}',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            '/' => '/',
            'x' => {
                out.push(u8::try_from(hex_value(&mut chars, 2)?).ok()?);
                continue;
            }
            'u' => char::from_u32(hex_value(&mut chars, 4)?)?,
            'U' => char::from_u32(hex_value(&mut chars, 8)?)?,
            first @ '0'..='7' => {
                let mut value = first.to_digit(8)?;
                for _ in 0..2 {
                    value = value * 8 + chars.next()?.to_digit(8)?;
                }
                out.push(u8::try_from(value).ok()?);
                continue;
            }
            _ => return None,
        };
        let mut buf = [0u8; 4];
        out.extend_from_slice(escaped.encode_utf8(&mut buf).as_bytes());
    }

    Some(String::from_utf8_lossy(&out).into_owned())
}

fn hex_value(chars: &mut std::str::Chars<'_>, digits: usize) -> Option<u32> {
    let mut value = 0u32;
    for _ in 0..digits {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    Some(value)
}
