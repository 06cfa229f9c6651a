//! Per-connection session loop.
//!
//! A session reads a line, evaluates it against the shared evaluator and
//! writes the reply, until the client leaves, sends `quit` or `shutdown`, goes
//! idle past the configured timeout, or the socket fails.
//!
//! Lines are read as raw bytes and never buffered past the configured maximum
//! length. A line that is not UTF-8 or is too long is answered with `Error`
//! and the session carries on.

use super::protocol::{Request, Response};
use super::{SessionEnd, SessionId};
use crate::config::DEFAULT_MAX_LINE_LENGTH;
use crate::shutdown::ShutdownSignal;
use calc_eval::Evaluator;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::time::timeout;
use tracing::{debug, trace};

/// Outcome of reading one line from the client.
#[derive(Debug, PartialEq, Eq)]
enum Incoming {
    /// A complete line (or a final unterminated one) is in the buffer.
    Line,
    /// The line exceeded the length limit and has been discarded.
    Oversized,
    /// End of stream with nothing read.
    Closed,
}

/// State needed to drive one client's session.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub peer: SocketAddr,
    evaluator: Arc<Evaluator>,
    shutdown: ShutdownSignal,
    idle_timeout: Option<Duration>,
    max_line_length: usize,
}

impl Session {
    /// Creates a session for a freshly admitted connection.
    ///
    /// # Arguments
    ///
    /// * `peer` - Remote address, used for logging only
    /// * `evaluator` - The evaluator shared by every session
    /// * `shutdown` - Flag raised when this client sends `shutdown`
    ///
    /// The session starts with no idle timeout and a line limit of
    /// [`DEFAULT_MAX_LINE_LENGTH`] bytes.
    pub fn new(peer: SocketAddr, evaluator: Arc<Evaluator>, shutdown: ShutdownSignal) -> Self {
        Self {
            id: SessionId::new(),
            peer,
            evaluator,
            shutdown,
            idle_timeout: None,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }

    /// Ends the session when no line arrives within `limit`. `None` waits forever.
    pub fn with_idle_timeout(mut self, limit: Option<Duration>) -> Self {
        self.idle_timeout = limit;
        self
    }

    /// Longest accepted line in bytes, excluding the `\n` terminator.
    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length.max(1);
        self
    }

    /// Runs the read → evaluate → respond loop to a terminal state.
    ///
    /// Never sends a reply for `quit`, `shutdown` or a closed stream. The
    /// stream is dropped, and so closed, when this returns.
    pub async fn run<S>(self, stream: S) -> SessionEnd
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (reader, mut writer) = tokio::io::split(stream);
        let mut reader = BufReader::new(reader);
        let mut buffer = Vec::with_capacity(128);

        loop {
            let read = read_line_bounded(&mut reader, &mut buffer, self.max_line_length);
            let incoming = match self.idle_timeout {
                Some(limit) => match timeout(limit, read).await {
                    Ok(incoming) => incoming,
                    Err(_) => return SessionEnd::IdleTimeout,
                },
                None => read.await,
            };

            let response = match incoming {
                Ok(Incoming::Closed) => return SessionEnd::ClientClosed,
                Err(e) => return SessionEnd::IoError(e),
                Ok(Incoming::Oversized) => {
                    debug!(session = %self.id, limit = self.max_line_length, "line too long");
                    Response::Error
                }
                Ok(Incoming::Line) => match std::str::from_utf8(&buffer) {
                    Err(_) => {
                        debug!(session = %self.id, "line is not valid UTF-8");
                        Response::Error
                    }
                    Ok(line) => match Request::parse(line) {
                        Request::Quit => return SessionEnd::Quit,
                        Request::Shutdown => {
                            debug!(session = %self.id, peer = %self.peer, "shutdown command received");
                            self.shutdown.trigger();
                            return SessionEnd::Shutdown;
                        }
                        Request::Evaluate(expr) => {
                            let response = Response::from(self.evaluator.evaluate(expr));
                            trace!(session = %self.id, request = expr, %response, "replying");
                            response
                        }
                    },
                },
            };

            if let Err(e) = write_response(&mut writer, response).await {
                return SessionEnd::IoError(e);
            }
        }
    }
}

/// Reads one `\n`-terminated line into `buffer`, holding at most
/// `max_len + 1` bytes.
///
/// An over-long line is drained up to and including its terminator without
/// being stored.
async fn read_line_bounded<R>(
    reader: &mut R,
    buffer: &mut Vec<u8>,
    max_len: usize,
) -> io::Result<Incoming>
where
    R: AsyncBufRead + Unpin,
{
    buffer.clear();

    let limit = max_len + 1;
    let read = (&mut *reader).take(limit as u64).read_until(b'\n', buffer).await?;

    if read == 0 {
        return Ok(Incoming::Closed);
    }
    if buffer.ends_with(b"\n") || read < limit {
        return Ok(Incoming::Line);
    }

    buffer.clear();
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            break;
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(end) => {
                reader.consume(end + 1);
                break;
            }
            None => {
                let len = available.len();
                reader.consume(len);
            }
        }
    }

    Ok(Incoming::Oversized)
}

async fn write_response<W>(writer: &mut W, response: Response) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(response.to_line().as_bytes()).await?;
    writer.flush().await
}
