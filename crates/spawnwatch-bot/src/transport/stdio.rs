//! Stdio transport: reads message events from stdin, writes the gateway's
//! outbound actions to stdout.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::gateway::{LocalGateway, OutboundAction};
use crate::protocol::Dispatcher;
use crate::types::BotResult;

use super::framing;

/// Longest accepted event line, in bytes. Longer lines are dropped whole.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// One read from a [`LineReader`].
#[derive(Debug, PartialEq, Eq)]
pub enum Line {
    Complete(String),
    Oversized,
    Eof,
}

/// Newline-delimited reader that never buffers more than `max` bytes of a
/// line. Partial lines survive a cancelled [`LineReader::next_line`].
pub struct LineReader<R> {
    reader: R,
    max: usize,
    buf: Vec<u8>,
    overflowed: bool,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    pub fn new(reader: R, max: usize) -> Self {
        Self {
            reader,
            max,
            buf: Vec::new(),
            overflowed: false,
        }
    }

    pub async fn next_line(&mut self) -> std::io::Result<Line> {
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(self.finish_line().unwrap_or(Line::Eof));
            }
            let (chunk_len, found) = match available.iter().position(|b| *b == b'\n') {
                Some(i) => (i, true),
                None => (available.len(), false),
            };
            if !self.overflowed {
                if self.buf.len() + chunk_len > self.max {
                    self.overflowed = true;
                    self.buf = Vec::new();
                } else {
                    self.buf.extend_from_slice(&available[..chunk_len]);
                }
            }
            self.reader.consume(chunk_len + usize::from(found));
            if found {
                return Ok(self.finish_line().unwrap_or(Line::Complete(String::new())));
            }
        }
    }

    fn finish_line(&mut self) -> Option<Line> {
        if std::mem::take(&mut self.overflowed) {
            return Some(Line::Oversized);
        }
        if self.buf.is_empty() {
            return None;
        }
        let bytes = std::mem::take(&mut self.buf);
        let text = String::from_utf8_lossy(&bytes);
        Some(Line::Complete(text.trim_end_matches('\r').to_string()))
    }
}

pub struct StdioTransport {
    dispatcher: Dispatcher,
    gateway: Arc<LocalGateway>,
    actions: UnboundedReceiver<OutboundAction>,
}

impl StdioTransport {
    /// `gateway` must be the dispatcher's gateway, created with
    /// [`LocalGateway::with_sink`] feeding `actions`.
    pub fn new(
        dispatcher: Dispatcher,
        gateway: Arc<LocalGateway>,
        actions: UnboundedReceiver<OutboundAction>,
    ) -> Self {
        Self {
            dispatcher,
            gateway,
            actions,
        }
    }

    /// Run until stdin closes. Messages are handled one at a time; actions
    /// are written as they happen, including those of auto-refresh tasks.
    pub async fn run(self) -> BotResult<()> {
        let Self {
            dispatcher,
            gateway,
            mut actions,
        } = self;
        let mut lines = LineReader::new(BufReader::new(tokio::io::stdin()), MAX_LINE_BYTES);
        let mut stdout = tokio::io::stdout();

        tracing::info!("Stdio transport started");

        loop {
            tokio::select! {
                line = lines.next_line() => match line? {
                    Line::Complete(line) => handle_line(&dispatcher, &gateway, &line).await,
                    Line::Oversized => {
                        tracing::warn!("Dropped an event longer than {MAX_LINE_BYTES} bytes");
                    }
                    Line::Eof => {
                        tracing::info!("EOF on stdin, shutting down");
                        break;
                    }
                },
                Some(action) = actions.recv() => {
                    write_action(&mut stdout, &action).await?;
                }
            }
        }

        while let Ok(action) = actions.try_recv() {
            write_action(&mut stdout, &action).await?;
        }
        Ok(())
    }
}

async fn handle_line(dispatcher: &Dispatcher, gateway: &LocalGateway, line: &str) {
    if line.trim().is_empty() {
        return;
    }
    match framing::parse_event(line) {
        Ok(message) => {
            gateway.record_inbound(&message);
            if let Err(e) = dispatcher.handle_message(&message).await {
                tracing::error!("Failed to handle message in group {}: {e}", message.group);
            }
        }
        Err(e) => tracing::warn!("Parse error: {e}"),
    }
}

async fn write_action(stdout: &mut Stdout, action: &OutboundAction) -> BotResult<()> {
    let framed = framing::frame_action(action)?;
    stdout.write_all(framed.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}
