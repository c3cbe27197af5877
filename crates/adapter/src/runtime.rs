//! Adapter runtime integration.
//!
//! Bridges the synchronous game loop with the async TCP server: the server
//! runs on its own tokio runtime, commands come in through a bounded channel,
//! and replies go out through an unbounded one.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use serde::Serialize;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::server::{run_server, ServerConfig};
use crate::types::{Coord, GameAction};

/// Command delivered to the game loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundCommand {
    pub client_id: usize,
    pub seq: u64,
    pub payload: InboundPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundPayload {
    Command(ClientCommand),
    /// A client just said hello and wants the current state.
    SnapshotRequest,
}

/// Command payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Swap { a: Coord, b: Coord },
    Actions(Vec<GameAction>),
}

/// Outbound message to be delivered by the server.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    ToClient { client_id: usize, line: String },
    /// Sent to every client that asked for observations.
    Broadcast { line: String },
}

impl OutboundMessage {
    pub fn to_client(client_id: usize, msg: &impl Serialize) -> Option<Self> {
        serde_json::to_string(msg)
            .ok()
            .map(|line| Self::ToClient { client_id, line })
    }

    pub fn broadcast(msg: &impl Serialize) -> Option<Self> {
        serde_json::to_string(msg)
            .ok()
            .map(|line| Self::Broadcast { line })
    }
}

/// Connection counters the server keeps current for the HUD.
#[derive(Debug, Default)]
pub struct ServerStatus {
    client_count: AtomicU16,
    /// 0 means no controller; client ids start at 1.
    controller: AtomicUsize,
    listen_addr: Mutex<Option<SocketAddr>>,
}

impl ServerStatus {
    pub fn client_count(&self) -> u16 {
        self.client_count.load(Ordering::Relaxed)
    }

    pub fn controller_id(&self) -> Option<usize> {
        match self.controller.load(Ordering::Relaxed) {
            0 => None,
            id => Some(id),
        }
    }

    pub fn listen_addr(&self) -> Option<SocketAddr> {
        self.listen_addr.lock().ok().and_then(|a| *a)
    }

    pub(crate) fn set_clients(&self, n: usize) {
        self.client_count
            .store(n.min(u16::MAX as usize) as u16, Ordering::Relaxed);
    }

    pub(crate) fn set_controller(&self, id: Option<usize>) {
        self.controller.store(id.unwrap_or(0), Ordering::Relaxed);
    }

    pub(crate) fn set_listen_addr(&self, addr: SocketAddr) {
        if let Ok(mut slot) = self.listen_addr.lock() {
            *slot = Some(addr);
        }
    }
}

/// Running adapter instance.
pub struct Adapter {
    _rt: Runtime,
    cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
    status: Arc<ServerStatus>,
}

impl Adapter {
    /// Start the adapter from environment variables.
    ///
    /// Returns `Ok(None)` if `GEMS_AI_DISABLED` is set.
    pub fn start_from_env() -> Result<Option<Self>> {
        if ServerConfig::is_disabled() {
            info!("AI adapter disabled via GEMS_AI_DISABLED");
            return Ok(None);
        }
        Self::start(ServerConfig::from_env()).map(Some)
    }

    pub fn start(config: ServerConfig) -> Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(config.max_pending_commands.max(1));
        let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
        let status = Arc::new(ServerStatus::default());

        let rt = Runtime::new()?;
        let server_status = Arc::clone(&status);
        rt.spawn(async move {
            if let Err(e) = run_server(config, cmd_tx, out_rx, None, Some(server_status)).await {
                error!(error = %e, "AI adapter stopped");
            }
        });

        Ok(Self {
            _rt: rt,
            cmd_rx,
            out_tx,
            status,
        })
    }

    pub fn try_recv(&mut self) -> Option<InboundCommand> {
        self.cmd_rx.try_recv().ok()
    }

    pub fn send(&self, msg: OutboundMessage) {
        let _ = self.out_tx.send(msg);
    }

    pub fn status(&self) -> &ServerStatus {
        &self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::create_ack;

    #[test]
    fn outbound_helpers_serialize() {
        match OutboundMessage::to_client(3, &create_ack(7)) {
            Some(OutboundMessage::ToClient { client_id, line }) => {
                assert_eq!(client_id, 3);
                assert!(line.contains("\"ack\""));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            OutboundMessage::broadcast(&create_ack(8)),
            Some(OutboundMessage::Broadcast { .. })
        ));
    }

    #[test]
    fn status_reports_no_controller_by_default() {
        let status = ServerStatus::default();
        assert_eq!(status.controller_id(), None);
        status.set_controller(Some(4));
        status.set_clients(2);
        assert_eq!(status.controller_id(), Some(4));
        assert_eq!(status.client_count(), 2);
        assert_eq!(status.listen_addr(), None);
    }
}
