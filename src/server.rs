use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::conn::{self, ConnOptions};
use crate::error::{LedError, Result};
use crate::handler::ProtocolHandler;
use crate::state::ServerState;

const LISTEN_BACKLOG: u32 = 1024;

/// Collects listener settings; [`ServerBuilder::build`] fails without a handler.
#[derive(Debug)]
pub struct ServerBuilder {
    addr: String,
    handler: Option<ProtocolHandler>,
    state: ServerState,
    opts: ConnOptions,
    max_connections: Option<usize>,
}

impl ServerBuilder {
    pub fn handler(mut self, handler: ProtocolHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn state(mut self, state: ServerState) -> Self {
        self.state = state;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Longest command line accepted before the connection is dropped.
    pub fn max_line(mut self, bytes: usize) -> Self {
        self.opts.max_line = bytes;
        self
    }

    pub fn max_connections(mut self, limit: Option<usize>) -> Self {
        self.max_connections = limit;
        self
    }

    pub fn build(self) -> Result<Server> {
        let handler = self.handler.ok_or(LedError::NoHandler)?;

        Ok(Server {
            addr: self.addr,
            handler,
            state: self.state,
            opts: self.opts,
            max_connections: self.max_connections,
        })
    }
}

/// A configured but not yet listening server.
#[derive(Debug)]
pub struct Server {
    addr: String,
    handler: ProtocolHandler,
    state: ServerState,
    opts: ConnOptions,
    max_connections: Option<usize>,
}

impl Server {
    pub fn builder(addr: impl Into<String>) -> ServerBuilder {
        ServerBuilder {
            addr: addr.into(),
            handler: None,
            state: ServerState::default(),
            opts: ConnOptions::default(),
            max_connections: None,
        }
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// Bind the listener and run the accept loop on a background task.
    pub async fn start(self) -> Result<ServerHandle> {
        let listener = bind(&self.addr).await?;
        let local_addr = listener.local_addr()?;

        match self.handler.geometry() {
            Some(geometry) => log::info!(
                "serving {} protocol on {} (frame size {})",
                self.handler.name(),
                local_addr,
                geometry.frame_size()
            ),
            None => log::info!("serving {} protocol on {}", self.handler.name(), local_addr),
        }

        let cancel = CancellationToken::new();
        let state = self.state.clone();
        let task = tokio::spawn(accept_loop(self, listener, cancel.clone()));

        Ok(ServerHandle {
            local_addr,
            state,
            cancel,
            task,
        })
    }
}

async fn bind(addr: &str) -> Result<TcpListener> {
    let addr = tokio::net::lookup_host(addr).await?.next().ok_or_else(|| {
        LedError::Io(std::io::Error::new(
            std::io::ErrorKind::AddrNotAvailable,
            format!("{addr} did not resolve"),
        ))
    })?;

    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;

    Ok(socket.listen(LISTEN_BACKLOG)?)
}

async fn accept_loop(server: Server, listener: TcpListener, cancel: CancellationToken) {
    let limit = server.max_connections.map(|n| Arc::new(Semaphore::new(n)));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                log::info!("listener shutting down");
                break;
            }
            accepted = listener.accept() => {
                let (socket, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        log::error!("accept error: {e}");
                        continue;
                    }
                };

                let permit = match &limit {
                    Some(sem) => match Arc::clone(sem).try_acquire_owned() {
                        Ok(permit) => Some(permit),
                        Err(_) => {
                            log::warn!("[{}] connection limit reached, rejecting", peer);
                            continue;
                        }
                    },
                    None => None,
                };

                let state = server.state.clone();
                let handler = server.handler.clone();
                let opts = server.opts;

                tokio::spawn(async move {
                    if let Err(err) = conn::handle(state, handler, opts, socket, peer).await {
                        report(peer, &err);
                    }
                    drop(permit);
                });
            }
        }
    }
}

fn report(peer: SocketAddr, err: &LedError) {
    match err {
        LedError::ConnectionClosed => log::debug!("[{}] connection closed", peer),
        LedError::Timeout(_) => log::info!("[{}] {}", peer, err),
        LedError::FrameSizeMismatch { .. } | LedError::LineTooLong(_) => {
            log::warn!("[{}] protocol violation: {}", peer, err)
        }
        _ => log::warn!("[{}] connection error: {}", peer, err),
    }
}

/// A running server. Dropping the handle leaves the listener running.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    state: ServerState,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// Token that stops the accept loop when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop accepting and wait for the accept loop to exit.
    ///
    /// Connections already being served keep running until their peers
    /// disconnect.
    pub async fn stop(self) {
        self.cancel.cancel();

        if let Err(e) = self.task.await {
            log::error!("listener task failed: {e}");
        }

        log::info!(
            "listener on {} stopped, {} connections still open",
            self.local_addr,
            self.state.session_count()
        );
    }
}
