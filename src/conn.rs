use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::command::{Response, tokenize};
use crate::error::{LedError, Result};
use crate::handler::{CommandProcessor, FrameConsumer, ProtocolHandler};
use crate::protocol::{self, LENGTH_PREFIX_SIZE};
use crate::state::ServerState;

pub const DEFAULT_MAX_LINE: usize = 64 * 1024;

/// Per-connection settings fixed when the server is built.
#[derive(Debug, Clone, Copy)]
pub struct ConnOptions {
    /// Idle limit for the command protocol. Frame connections never time out.
    pub timeout: Option<Duration>,
    /// Longest command line accepted, newline included.
    pub max_line: usize,
}

impl Default for ConnOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            max_line: DEFAULT_MAX_LINE,
        }
    }
}

pub async fn handle(
    state: ServerState,
    handler: ProtocolHandler,
    opts: ConnOptions,
    socket: TcpStream,
    peer: SocketAddr,
) -> Result<()> {
    let (reader, writer) = socket.into_split();
    serve(state, handler, opts, reader, writer, peer).await
}

/// Run one connection to completion over any byte stream.
pub async fn serve<R, W>(
    state: ServerState,
    handler: ProtocolHandler,
    opts: ConnOptions,
    reader: R,
    writer: W,
    peer: SocketAddr,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    log::info!("[{}] connected ({})", peer, handler.name());
    state.register(peer, handler.name());

    let result = match &handler {
        ProtocolHandler::Frames(consumer) => serve_frames(&state, consumer, peer, reader).await,
        ProtocolHandler::Commands(processor) => {
            serve_commands(&state, processor, peer, opts, reader, writer).await
        }
    };

    // Cleanup on disconnect
    if let Some(stats) = state.unregister(&peer) {
        log::info!(
            "[{}] disconnected after {} messages, {} bytes",
            peer,
            stats.messages,
            stats.bytes_read
        );
    }

    result
}

async fn serve_frames<R>(
    state: &ServerState,
    consumer: &Arc<dyn FrameConsumer>,
    peer: SocketAddr,
    mut reader: R,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let frame_size = consumer.geometry().frame_size();

    loop {
        let data = match protocol::read_frame(&mut reader, frame_size).await {
            Ok(data) => data,
            Err(LedError::ConnectionClosed) => {
                log::debug!("[{}] peer closed the connection", peer);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let seq = state.record(&peer, LENGTH_PREFIX_SIZE + data.len());

        if let Err(e) = consumer.consume(&data) {
            log::error!("[{}] frame #{} could not be handled: {}", peer, seq, e);
        }
    }
}

async fn serve_commands<R, W>(
    state: &ServerState,
    processor: &Arc<dyn CommandProcessor>,
    peer: SocketAddr,
    opts: ConnOptions,
    reader: R,
    mut writer: W,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();

        let mut limited = (&mut reader).take(opts.max_line as u64);
        let read = limited.read_until(b'\n', &mut buf);
        let n = match opts.timeout {
            Some(limit) => match tokio::time::timeout(limit, read).await {
                Ok(n) => n?,
                Err(_) => return Err(LedError::Timeout(limit)),
            },
            None => read.await?,
        };

        if n == 0 {
            // Client disconnected (EOF)
            return Ok(());
        }

        // Hitting the cap without a newline leaves the rest of the line unread.
        if n == opts.max_line && buf.last() != Some(&b'\n') {
            return Err(LedError::LineTooLong(opts.max_line));
        }

        let seq = state.record(&peer, n);

        let text = String::from_utf8_lossy(&buf);
        let line = text.trim_end_matches(['\r', '\n']);
        log::debug!("[{}] command #{}: {:?}", peer, seq, line);

        let response = match processor.execute(line) {
            Ok(r) => r,
            Err(e) => {
                log::error!("[{}] command {:?} failed: {}", peer, line, e);
                let name = tokenize(line).into_iter().next().unwrap_or_default();
                Response::error(name, e.to_string())
            }
        };

        writer.write_all(response.to_line().as_bytes()).await?;
        writer.flush().await?;

        if response.is_closed() {
            log::debug!("[{}] closed by client command", peer);
            return Ok(());
        }
    }
}
