// LogWarden - core/parser.rs
//
// Line-oriented log parsing with format auto-detection.
// Core layer: accepts BufRead, never opens files itself.
//
// Three grammars are supported; detection tries them in a fixed priority
// order (web-access, remote-login, structured-auth) and the first match
// wins. Lines that match no grammar yield no record at all -- they are
// dropped, not errors. A timestamp that fails to parse inside an otherwise
// matched line is also never a reason to drop it: the record is produced
// with `timestamp: None`.

use crate::core::model::{FormatTag, LogRecord};
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use regex::Regex;
use std::io::BufRead;
use std::sync::OnceLock;

// =============================================================================
// Line grammars
// =============================================================================

// Patterns are compiled once on first use. A mistake in any of them shows up
// as a failing unit test rather than a runtime panic.

/// Apache-style access line:
/// `IP - user [25/Dec/2024:10:15:32 +0000] "GET /path HTTP/1.1" 200 1024`
fn web_access_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^(?P<ip>\d{1,3}(?:\.\d{1,3}){3})\s+-\s+(?P<user>\S+)\s+\[(?P<timestamp>[^\]]+)\]\s+"(?P<method>\w+)\s+(?P<path>\S+)\s+(?P<protocol>[^"]+)"\s+(?P<status>\d{3})\s+(?P<size>\d+|-)"#,
        )
        .expect("web-access pattern: invalid regex")
    })
}

/// sshd authentication line (matched anywhere in the line, since syslog
/// relays may prepend their own framing):
/// `Dec 25 10:15:32 host sshd[1234]: Failed password for root from 1.2.3.4`
fn remote_login_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?P<timestamp>\w+\s+\d+\s+\d+:\d+:\d+)\s+(?P<host>\S+)\s+sshd\[\d+\]:\s+(?P<status>Failed|Accepted)\s+password\s+for\s+(?:invalid\s+user\s+)?(?P<user>\S+)\s+from\s+(?P<ip>\d{1,3}(?:\.\d{1,3}){3})",
        )
        .expect("remote-login pattern: invalid regex")
    })
}

/// Structured application auth line:
/// `2024-12-25 10:15:32 AUTH FAILURE user=bob ip=1.2.3.4 reason=bad_password`
fn structured_auth_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<timestamp>\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2})\s+AUTH\s+(?P<status>SUCCESS|FAILURE)\s+user=(?P<user>\S+)\s+ip=(?P<ip>\d{1,3}(?:\.\d{1,3}){3})(?:\s+reason=(?P<reason>\S+))?",
        )
        .expect("structured-auth pattern: invalid regex")
    })
}

// =============================================================================
// Format detection
// =============================================================================

/// Classify a single line by trying each supported grammar in priority
/// order: web-access, then remote-login, then structured-auth.
///
/// Returns the first matching tag, or [`FormatTag::Unknown`] if none match.
pub fn detect_format(sample_line: &str) -> FormatTag {
    let line = sample_line.trim();
    if web_access_pattern().is_match(line) {
        return FormatTag::WebAccess;
    }
    if remote_login_pattern().is_match(line) {
        return FormatTag::RemoteLogin;
    }
    if structured_auth_pattern().is_match(line) {
        return FormatTag::StructuredAuth;
    }
    FormatTag::Unknown
}

// =============================================================================
// Timestamp parsing (per-format layouts, all failures non-fatal)
// =============================================================================

/// Parse a web-access timestamp such as `25/Dec/2024:10:15:32 +0000`.
///
/// The timezone offset is dropped: only the first whitespace-delimited token
/// is parsed, as local-naive, and interpreted as UTC.
fn parse_web_access_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let token = raw.split_whitespace().next()?;
    NaiveDateTime::parse_from_str(token, "%d/%b/%Y:%H:%M:%S")
        .ok()
        .map(|ndt| ndt.and_utc())
}

/// Parse a year-less syslog timestamp such as `Dec 25 10:15:32`.
///
/// Syslog timestamps carry no year, so one is injected: the caller's
/// `default_year` when given, otherwise the current UTC year. Best-effort:
/// files spanning a year boundary will date earlier entries into the
/// injected year.
fn parse_remote_login_timestamp(raw: &str, default_year: Option<i32>) -> Option<DateTime<Utc>> {
    let year = default_year.unwrap_or_else(|| Utc::now().year());
    let with_year = format!("{year} {raw}");
    NaiveDateTime::parse_from_str(&with_year, "%Y %b %d %H:%M:%S")
        .ok()
        .map(|ndt| ndt.and_utc())
}

/// Parse a structured-auth timestamp such as `2024-12-25 10:15:32`.
fn parse_structured_auth_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|ndt| ndt.and_utc())
}

// =============================================================================
// Per-format line parsers
// =============================================================================

fn parse_web_access_line(line: &str) -> Option<LogRecord> {
    let caps = web_access_pattern().captures(line)?;

    let user = match &caps["user"] {
        "-" => None,
        user => Some(user.to_string()),
    };
    let action = format!("{} {}", &caps["method"], &caps["path"]);

    Some(LogRecord {
        timestamp: parse_web_access_timestamp(&caps["timestamp"]),
        source_ip: caps["ip"].to_string(),
        format: FormatTag::WebAccess,
        raw_line: line.to_string(),
        user,
        action: Some(action),
        status: Some(caps["status"].to_string()),
        details: Some(format!("size={}", &caps["size"])),
    })
}

fn parse_remote_login_line(line: &str, default_year: Option<i32>) -> Option<LogRecord> {
    let caps = remote_login_pattern().captures(line)?;

    let status = if &caps["status"] == "Accepted" {
        "success"
    } else {
        "failure"
    };

    Some(LogRecord {
        timestamp: parse_remote_login_timestamp(&caps["timestamp"], default_year),
        source_ip: caps["ip"].to_string(),
        format: FormatTag::RemoteLogin,
        raw_line: line.to_string(),
        user: Some(caps["user"].to_string()),
        action: Some("ssh_login".to_string()),
        status: Some(status.to_string()),
        details: Some(format!("host={}", &caps["host"])),
    })
}

fn parse_structured_auth_line(line: &str) -> Option<LogRecord> {
    let caps = structured_auth_pattern().captures(line)?;

    let status = if &caps["status"] == "SUCCESS" {
        "success"
    } else {
        "failure"
    };

    Some(LogRecord {
        timestamp: parse_structured_auth_timestamp(&caps["timestamp"]),
        source_ip: caps["ip"].to_string(),
        format: FormatTag::StructuredAuth,
        raw_line: line.to_string(),
        user: Some(caps["user"].to_string()),
        action: Some("auth".to_string()),
        status: Some(status.to_string()),
        details: caps.name("reason").map(|m| m.as_str().to_string()),
    })
}

// =============================================================================
// Public parse surface
// =============================================================================

/// Parse a single line into a [`LogRecord`].
///
/// When `format` is `None`, detection runs first. Returns `None` (not an
/// error) for blank input and for input that fails the selected grammar.
pub fn parse_line(line: &str, format: Option<FormatTag>) -> Option<LogRecord> {
    parse_line_with_year(line, format, None)
}

/// [`parse_line`] with a caller-supplied default year for the year-less
/// remote-login timestamp. `None` uses the current UTC year.
pub fn parse_line_with_year(
    line: &str,
    format: Option<FormatTag>,
    default_year: Option<i32>,
) -> Option<LogRecord> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let tag = format.unwrap_or_else(|| detect_format(line));
    match tag {
        FormatTag::WebAccess => parse_web_access_line(line),
        FormatTag::RemoteLogin => parse_remote_login_line(line, default_year),
        FormatTag::StructuredAuth => parse_structured_auth_line(line),
        FormatTag::Unknown => None,
    }
}

// =============================================================================
// Whole-stream parsing
// =============================================================================

/// Lazy, forward-only record stream over a line-oriented reader.
///
/// The format is detected once, from the first non-blank line, and every
/// line (including that first one) is parsed against the single detected
/// tag. Mixed-format files are not supported: a file is assumed homogeneous.
/// Lines that fail to parse are silently skipped. A read error ends the
/// stream.
pub struct Records<R: BufRead> {
    lines: std::io::Lines<R>,
    format: Option<FormatTag>,
    default_year: Option<i32>,
}

impl<R: BufRead> Records<R> {
    /// Create a record stream over `reader`. Nothing is read until the
    /// first call to `next`.
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            format: None,
            default_year: None,
        }
    }

    /// Override the default year injected into year-less timestamps.
    pub fn with_default_year(mut self, year: i32) -> Self {
        self.default_year = Some(year);
        self
    }

    /// The detected format tag, once the first non-blank line has been seen.
    pub fn format(&self) -> Option<FormatTag> {
        self.format
    }
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = LogRecord;

    fn next(&mut self) -> Option<LogRecord> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!(error = %e, "Read error; ending record stream");
                    return None;
                }
            };

            if self.format.is_none() {
                if line.trim().is_empty() {
                    continue;
                }
                let tag = detect_format(&line);
                tracing::debug!(format = %tag, "Detected format from first non-blank line");
                self.format = Some(tag);
            }

            if let Some(record) = parse_line_with_year(&line, self.format, self.default_year) {
                return Some(record);
            }
        }
    }
}
