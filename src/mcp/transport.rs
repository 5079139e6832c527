//! Transports for the MCP server.
//!
//! A [`Transport`] yields raw request bodies and accepts raw response
//! bodies; it never interprets them. [`LineTransport`] implements the stdio
//! framing specified by MCP over any async reader/writer pair:
//!
//! - Messages are UTF-8 encoded JSON-RPC
//! - Messages are delimited by newlines
//! - Messages must not contain embedded newlines
//! - stdin: receives messages from client
//! - stdout: sends messages to client
//! - stderr: may be used for logging (not MCP messages)

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// A bidirectional message channel to one client.
#[async_trait]
pub trait Transport: Send {
    /// Reads the next raw message as bytes, without its terminator.
    ///
    /// Returns `None` once the peer has closed the channel. The bytes are not
    /// checked for UTF-8; that is left to the caller so a bad line can be
    /// answered rather than ending the session.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails.
    async fn read_message(&mut self) -> io::Result<Option<Vec<u8>>>;

    /// Writes one raw message.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    async fn write_message(&mut self, message: &str) -> io::Result<()>;
}

/// Newline-delimited transport over an async reader and writer.
pub struct LineTransport<R, W> {
    /// Buffered reader for incoming messages.
    reader: BufReader<R>,
    /// Sink for outgoing messages.
    writer: W,
}

/// The stdio transport used by the server binary.
pub type StdioTransport = LineTransport<tokio::io::Stdin, tokio::io::Stdout>;

impl StdioTransport {
    /// Creates a transport over the process's stdin and stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a transport over `reader` and `writer`.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }
}

#[async_trait]
impl<R, W> Transport for LineTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn read_message(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        let bytes_read = self.reader.read_until(b'\n', &mut line).await?;

        if bytes_read == 0 {
            // EOF - peer closed
            return Ok(None);
        }

        // Remove the trailing newline
        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }

        Ok(Some(line))
    }

    async fn write_message(&mut self, message: &str) -> io::Result<()> {
        // MCP spec: messages must not contain embedded newlines
        if message.contains('\n') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "message contains an embedded newline",
            ));
        }

        self.writer.write_all(message.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{duplex, AsyncReadExt};

    use super::*;

    #[tokio::test]
    async fn reads_lines_and_strips_terminators() {
        let input: &[u8] = b"first\r\nsecond\nlast";
        let mut transport = LineTransport::new(input, Vec::new());

        assert_eq!(transport.read_message().await.unwrap().as_deref(), Some(&b"first"[..]));
        assert_eq!(transport.read_message().await.unwrap().as_deref(), Some(&b"second"[..]));
        assert_eq!(transport.read_message().await.unwrap().as_deref(), Some(&b"last"[..]));
        assert_eq!(transport.read_message().await.unwrap(), None);
    }

    #[tokio::test]
    async fn passes_through_invalid_utf8() {
        let input: &[u8] = b"\xff\xfe\nok\n";
        let mut transport = LineTransport::new(input, Vec::new());

        assert_eq!(transport.read_message().await.unwrap(), Some(vec![0xff, 0xfe]));
        assert_eq!(transport.read_message().await.unwrap().as_deref(), Some(&b"ok"[..]));
    }

    #[tokio::test]
    async fn writes_newline_terminated_messages() {
        let (client, server) = duplex(1024);
        let mut transport = LineTransport::new(tokio::io::empty(), server);
        transport.write_message(r#"{"ok":true}"#).await.unwrap();
        drop(transport);

        let mut written = String::new();
        let mut client = client;
        client.read_to_string(&mut written).await.unwrap();
        assert_eq!(written, "{\"ok\":true}\n");
    }

    #[tokio::test]
    async fn rejects_embedded_newlines() {
        let mut transport = LineTransport::new(tokio::io::empty(), Vec::new());
        let err = transport.write_message("a\nb").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn serialised_responses_have_no_newlines() {
        let response = crate::mcp::protocol::JsonRpcResponse::success(
            crate::mcp::protocol::RequestId::from(1),
            serde_json::json!({
                "message": "hello world",
                "nested": {"key": "value"}
            }),
        );

        let json = serde_json::to_string(&response).unwrap();
        assert!(
            !json.contains('\n'),
            "Serialised JSON should not contain newlines"
        );
    }
}
