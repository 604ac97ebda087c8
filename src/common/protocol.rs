//! Text protocol spoken between console, router and nodes
//!
//! Frame format: [LEN: u32 little-endian][UTF-8 payload]
//!
//! Every hop carries exactly one request frame followed by one response
//! frame, then the connection is closed.

use crate::common::{Error, Result};
use std::fmt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest request accepted by a server
pub const MAX_REQUEST_LEN: usize = 1024 * 1024;

/// Largest reply a client will read; status listings grow with the store
pub const MAX_RESPONSE_LEN: usize = u32::MAX as usize;

pub const UPDATE_OK: &str = "Update successful\n";
pub const NO_EVENTS: &str = "No events\n";
pub const NO_NODES: &str = "No nodes\n";
pub const EVENT_NOT_FOUND: &str = "Event not found\n";
pub const UNKNOWN_COMMAND: &str = "Unknown command\n";
pub const INVALID_REQUEST: &str = "Invalid request\n";
pub const REQUEST_FAILED: &str = "Error handling request\n";

/// `Count for <event>: <n>` line returned by `get`
pub fn count_line(event: &str, count: u64) -> String {
    format!("Count for {}: {}\n", event, count)
}

/// A parsed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Get(String),
    Update(String),
    Status,
    /// Well-formed but unrecognised command
    Unknown(String),
}

impl Request {
    /// Parse `"<command> <event>"`, splitting on the first space.
    ///
    /// Surrounding whitespace is trimmed. `get` and `update` without an event
    /// are rejected with [`Error::InvalidRequest`].
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::InvalidRequest("empty request".into()));
        }

        let (command, event) = match raw.split_once(' ') {
            Some((command, event)) => (command, Some(event.trim())),
            None => (raw, None),
        };
        let event = event.filter(|e| !e.is_empty());

        match (command, event) {
            ("get", Some(event)) => Ok(Request::Get(event.to_string())),
            ("update", Some(event)) => Ok(Request::Update(event.to_string())),
            ("get" | "update", None) => Err(Error::InvalidRequest(format!(
                "missing event for {}",
                command
            ))),
            ("status", _) => Ok(Request::Status),
            (other, _) => Ok(Request::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Get(event) => write!(f, "get {}", event),
            Request::Update(event) => write!(f, "update {}", event),
            Request::Status => write!(f, "status"),
            Request::Unknown(command) => write!(f, "{}", command),
        }
    }
}

/// Write one length-prefixed frame and flush
pub async fn write_frame<W>(writer: &mut W, payload: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let bytes = payload.as_bytes();
    let len = u32::try_from(bytes.len()).map_err(|_| Error::FrameTooLarge {
        len: bytes.len(),
        max: u32::MAX as usize,
    })?;
    writer.write_all(&len.to_le_bytes()).await?;
    writer.write_all(bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame of at most `max` bytes
pub async fn read_frame<R>(reader: &mut R, max: usize) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    let len = reader.read_u32_le().await? as usize;
    if len > max {
        return Err(Error::FrameTooLarge { len, max });
    }

    // Grow with the data received rather than trusting the prefix up front
    let mut buf = Vec::with_capacity(len.min(MAX_REQUEST_LEN));
    let read = (&mut *reader).take(len as u64).read_to_end(&mut buf).await?;
    if read < len {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("frame truncated: {} of {} bytes", read, len),
        )));
    }
    String::from_utf8(buf).map_err(|e| Error::Protocol(format!("payload is not UTF-8: {}", e)))
}

/// Read a request frame, capped at [`MAX_REQUEST_LEN`]
pub async fn read_request<R>(reader: &mut R) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    read_frame(reader, MAX_REQUEST_LEN).await
}

/// Read a reply frame, capped at [`MAX_RESPONSE_LEN`]
pub async fn read_response<R>(reader: &mut R) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    read_frame(reader, MAX_RESPONSE_LEN).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Request::parse("get click").unwrap(),
            Request::Get("click".into())
        );
        assert_eq!(
            Request::parse("update click\n").unwrap(),
            Request::Update("click".into())
        );
        assert_eq!(Request::parse("status").unwrap(), Request::Status);
        assert_eq!(
            Request::parse("delete x").unwrap(),
            Request::Unknown("delete".into())
        );
    }

    #[test]
    fn test_parse_splits_on_first_space() {
        assert_eq!(
            Request::parse("update add to cart").unwrap(),
            Request::Update("add to cart".into())
        );
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            Request::parse("get"),
            Err(Error::InvalidRequest(_))
        ));
        assert!(matches!(
            Request::parse("update   "),
            Err(Error::InvalidRequest(_))
        ));
        assert!(matches!(Request::parse(""), Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn test_wire_text() {
        assert_eq!(Request::Get("a b".into()).to_string(), "get a b");
        assert_eq!(Request::Status.to_string(), "status");
        assert_eq!(count_line("click", 2), "Count for click: 2\n");
    }

    #[tokio::test]
    async fn test_frame_carries_long_multiline_payload() {
        let payload = format!("{}\nsecond line\n", "x".repeat(4096));
        let (mut client, mut server) = tokio::io::duplex(64);

        let writer = tokio::spawn(async move {
            write_frame(&mut client, &payload).await.unwrap();
            payload
        });
        let received = read_response(&mut server).await.unwrap();
        assert_eq!(received, writer.await.unwrap());
    }

    #[tokio::test]
    async fn test_oversized_request_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let len = (MAX_REQUEST_LEN as u32 + 1).to_le_bytes();
        client.write_all(&len).await.unwrap();

        let err = read_request(&mut server).await.unwrap_err();
        assert!(matches!(err, Error::FrameTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_truncated_frame_is_io_error() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(&10u32.to_le_bytes()).await.unwrap();
        client.write_all(b"abc").await.unwrap();
        drop(client);

        let err = read_response(&mut server).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[tokio::test]
    async fn test_reply_larger_than_request_cap() {
        let payload = "a: 1\n".repeat(MAX_REQUEST_LEN / 4);
        assert!(payload.len() > MAX_REQUEST_LEN);
        let (mut client, mut server) = tokio::io::duplex(4096);

        let writer = tokio::spawn(async move {
            write_frame(&mut client, &payload).await.unwrap();
            payload
        });
        let received = read_response(&mut server).await.unwrap();
        assert_eq!(received, writer.await.unwrap());
    }
}
