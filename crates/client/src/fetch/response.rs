//! Raw HTTP/1.x response parsing.
//!
//! A response is split at the first `\r\n\r\n`. Everything before it is the
//! header block (status line included); everything after it is the body.
//! Bodies are never de-chunked or decompressed.

use go2web_core::Error;

/// Separator between the header block and the body.
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Parsed status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Protocol version, e.g. `1.1`.
    pub version: String,
    pub code: u16,
    pub reason: String,
}

impl StatusLine {
    /// Parse `HTTP/<version> <code>[ <reason>]`.
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.trim_end().strip_prefix("HTTP/")?;
        let (version, rest) = rest.split_once(' ')?;
        let (code, reason) = match rest.split_once(' ') {
            Some((code, reason)) => (code, reason),
            None => (rest, ""),
        };

        if code.len() != 3 {
            return None;
        }
        let code = code.parse().ok()?;

        Some(Self { version: version.to_string(), code, reason: reason.to_string() })
    }
}

/// A response split into header block and body.
///
/// `headers` and `body` are lossy UTF-8 views; the bytes as received are kept
/// alongside them and are what the cache persists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// Status line and header lines, without the terminating blank line.
    pub headers: String,
    pub body: String,
    raw: Vec<u8>,
    body_start: usize,
}

impl RawResponse {
    /// Split raw response bytes at the header/body boundary.
    ///
    /// Fails with `MalformedResponse` when there is no boundary or the first
    /// line is not `HTTP/<version> <code>`.
    pub fn parse(raw: &[u8]) -> Result<Self, Error> {
        let boundary = raw
            .windows(HEADER_TERMINATOR.len())
            .position(|window| window == HEADER_TERMINATOR)
            .ok_or_else(|| {
                Error::MalformedResponse(format!("no header/body boundary in {} bytes", raw.len()))
            })?;
        let body_start = boundary + HEADER_TERMINATOR.len();

        let headers = String::from_utf8_lossy(&raw[..boundary]).into_owned();
        let status_line = headers.lines().next().unwrap_or_default();
        if StatusLine::parse(status_line).is_none() {
            return Err(Error::MalformedResponse(format!("unreadable status line `{status_line}`")));
        }

        let body = String::from_utf8_lossy(&raw[body_start..]).into_owned();

        Ok(Self { headers, body, raw: raw.to_vec(), body_start })
    }

    /// First line of the header block.
    pub fn status_line(&self) -> &str {
        self.headers.lines().next().unwrap_or_default()
    }

    /// Parsed status line.
    pub fn status(&self) -> Option<StatusLine> {
        StatusLine::parse(self.status_line())
    }

    /// Case-insensitive lookup of the first header named `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
        })
    }

    /// Header block with its terminating blank line, as text.
    pub fn header_block(&self) -> String {
        format!("{}\r\n\r\n", self.headers)
    }

    /// Header block with its terminating blank line, as received.
    pub fn header_bytes(&self) -> &[u8] {
        &self.raw[..self.body_start]
    }

    /// Body as received.
    pub fn body_bytes(&self) -> &[u8] {
        &self.raw[self.body_start..]
    }

    /// Full response exactly as received.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }
}
