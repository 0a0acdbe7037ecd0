use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::queue::FrameQueue;

#[derive(Debug, Clone)]
pub struct SessionStats {
    pub protocol: &'static str,
    pub connected_at: Instant,
    pub bytes_read: u64,
    pub messages: u64,
}

/// State shared by every connection a server accepts.
#[derive(Clone, Debug, Default)]
pub struct ServerState {
    pub queue: FrameQueue,
    sessions: Arc<DashMap<SocketAddr, SessionStats>>,
    call_sequence: Arc<AtomicU64>,
}

impl ServerState {
    pub fn new(queue: FrameQueue) -> Self {
        Self {
            queue,
            ..Self::default()
        }
    }

    pub fn register(&self, peer: SocketAddr, protocol: &'static str) {
        self.sessions.insert(
            peer,
            SessionStats {
                protocol,
                connected_at: Instant::now(),
                bytes_read: 0,
                messages: 0,
            },
        );
    }

    /// Count one handled message of `bytes` length for `peer`.
    pub fn record(&self, peer: &SocketAddr, bytes: usize) -> u64 {
        if let Some(mut s) = self.sessions.get_mut(peer) {
            s.bytes_read += bytes as u64;
            s.messages += 1;
        }

        self.call_sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn unregister(&self, peer: &SocketAddr) -> Option<SessionStats> {
        self.sessions.remove(peer).map(|(_, stats)| stats)
    }

    pub fn session(&self, peer: &SocketAddr) -> Option<SessionStats> {
        self.sessions.get(peer).map(|guard| guard.clone())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn active_sessions(&self) -> Vec<(SocketAddr, SessionStats)> {
        self.sessions
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect()
    }

    /// Messages handled across all connections since startup.
    pub fn calls(&self) -> u64 {
        self.call_sequence.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_session_lifecycle() {
        let state = ServerState::default();
        let peer: SocketAddr = "127.0.0.1:4000".parse().unwrap();

        state.register(peer, "frames");
        assert_eq!(state.session_count(), 1);

        assert_eq!(state.record(&peer, 212), 1);
        assert_eq!(state.record(&peer, 212), 2);

        let stats = state.session(&peer).unwrap();
        assert_eq!(stats.bytes_read, 424);
        assert_eq!(stats.messages, 2);

        let removed = state.unregister(&peer).unwrap();
        assert_eq!(removed.protocol, "frames");
        assert_eq!(state.session_count(), 0);
        assert_eq!(state.calls(), 2);
    }

    #[test]
    fn clones_share_sessions() {
        let state = ServerState::default();
        let other = state.clone();
        other.register("127.0.0.1:1".parse().unwrap(), "commands");

        assert_eq!(state.active_sessions().len(), 1);
    }
}
