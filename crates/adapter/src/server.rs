//! TCP server for the AI adapter
//!
//! One task per connection reads lines and answers protocol errors directly;
//! accepted commands go to the game loop, which replies through the outbound
//! channel once it has applied them.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};

use crate::core::{BoardSnapshot, Session};
use crate::engine::best_swap;
use crate::protocol::*;
use crate::runtime::{ClientCommand, InboundCommand, InboundPayload, OutboundMessage, ServerStatus};
use crate::types::{GameAction, Phase};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub protocol_version: String,
    pub max_pending_commands: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7788,
            protocol_version: PROTOCOL_VERSION.to_string(),
            max_pending_commands: 10,
        }
    }
}

impl ServerConfig {
    /// Read `GEMS_AI_HOST`, `GEMS_AI_PORT` and `GEMS_AI_MAX_PENDING`.
    pub fn from_env() -> Self {
        use std::env;

        let d = Self::default();
        let host = env::var("GEMS_AI_HOST")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(d.host);
        let port = env::var("GEMS_AI_PORT")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(d.port);
        let max_pending_commands = env::var("GEMS_AI_MAX_PENDING")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(d.max_pending_commands);

        Self {
            host,
            port,
            max_pending_commands,
            ..d
        }
    }

    /// `GEMS_AI_DISABLED` set to `1` or `true`.
    pub fn is_disabled() -> bool {
        std::env::var("GEMS_AI_DISABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

struct ClientHandle {
    id: usize,
    addr: SocketAddr,
    handshaken: bool,
    stream_observations: bool,
    last_seq: Option<u64>,
    tx: mpsc::UnboundedSender<String>,
}

#[derive(Default)]
struct Registry {
    clients: Vec<ClientHandle>,
    controller: Option<usize>,
}

impl Registry {
    fn get(&self, id: usize) -> Option<&ClientHandle> {
        self.clients.iter().find(|c| c.id == id)
    }

    fn get_mut(&mut self, id: usize) -> Option<&mut ClientHandle> {
        self.clients.iter_mut().find(|c| c.id == id)
    }

    fn is_handshaken(&self, id: usize) -> bool {
        self.get(id).is_some_and(|c| c.handshaken)
    }

    /// Accept `seq` only if it is above the client's last one.
    fn advance_seq(&mut self, id: usize, seq: u64) -> bool {
        let Some(client) = self.get_mut(id) else {
            return false;
        };
        if client.last_seq.is_some_and(|prev| seq <= prev) {
            return false;
        }
        client.last_seq = Some(seq);
        true
    }

    /// Drop a client; if it held control, hand it to the oldest handshaken client.
    fn remove(&mut self, id: usize) -> Option<usize> {
        self.clients.retain(|c| c.id != id);
        if self.controller == Some(id) {
            self.controller = self
                .clients
                .iter()
                .filter(|c| c.handshaken)
                .map(|c| c.id)
                .min();
            return self.controller;
        }
        None
    }
}

struct Shared {
    config: ServerConfig,
    registry: RwLock<Registry>,
    status: Option<Arc<ServerStatus>>,
}

impl Shared {
    fn publish(&self, reg: &Registry) {
        if let Some(status) = &self.status {
            status.set_clients(reg.clients.len());
            status.set_controller(reg.controller);
        }
    }
}

enum Flow {
    Continue,
    Close,
}

/// Start the TCP server and run until the listener fails.
///
/// `ready_tx` receives the bound address, which matters when `port` is 0.
pub async fn run_server(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    mut out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
    status: Option<Arc<ServerStatus>>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.socket_addr()?).await?;
    let bound = listener.local_addr()?;
    info!(addr = %bound, "AI adapter listening");
    if let Some(status) = &status {
        status.set_listen_addr(bound);
    }
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let shared = Arc::new(Shared {
        config,
        registry: RwLock::new(Registry::default()),
        status,
    });

    // Outbound dispatcher.
    {
        let shared = Arc::clone(&shared);
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let reg = shared.registry.read().await;
                match msg {
                    OutboundMessage::ToClient { client_id, line } => {
                        if let Some(c) = reg.get(client_id) {
                            let _ = c.tx.send(line);
                        }
                    }
                    OutboundMessage::Broadcast { line } => {
                        for c in reg.clients.iter().filter(|c| c.handshaken && c.stream_observations) {
                            let _ = c.tx.send(line.clone());
                        }
                    }
                }
            }
        });
    }

    let mut next_id = 0usize;
    loop {
        let (socket, addr) = listener.accept().await?;
        next_id += 1;
        let client_id = next_id;
        info!(client_id, %addr, "client connected");

        let shared = Arc::clone(&shared);
        let command_tx = command_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, addr, client_id, &shared, command_tx).await {
                debug!(client_id, error = %e, "client read failed");
            }
            let mut reg = shared.registry.write().await;
            if let Some(new_id) = reg.remove(client_id) {
                info!(client_id = new_id, "controller promoted");
            }
            shared.publish(&reg);
            info!(client_id, "client disconnected");
        });
    }
}

async fn handle_client(
    socket: TcpStream,
    addr: SocketAddr,
    client_id: usize,
    shared: &Shared,
    command_tx: mpsc::Sender<InboundCommand>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = socket.into_split();
    let mut reader = BufReader::new(reader);
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    {
        let mut reg = shared.registry.write().await;
        reg.clients.push(ClientHandle {
            id: client_id,
            addr,
            handshaken: false,
            stream_observations: false,
            last_seq: None,
            tx: tx.clone(),
        });
        shared.publish(&reg);
    }

    let write_task = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if writer.write_all(line.as_bytes()).await.is_err()
                || writer.write_all(b"\n").await.is_err()
                || writer.flush().await.is_err()
            {
                break;
            }
        }
    });

    let mut line = String::new();
    let result = loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break Ok(()),
            Ok(_) => {}
            Err(e) => break Err(e.into()),
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Flow::Close = dispatch(shared, client_id, trimmed, &tx, &command_tx).await {
            break Ok(());
        }
    };

    // The writer stops once the registry entry, holding the last sender, is removed.
    drop(write_task);
    result
}

fn reply(tx: &mpsc::UnboundedSender<String>, msg: &impl serde::Serialize) {
    if let Ok(line) = serde_json::to_string(msg) {
        let _ = tx.send(line);
    }
}

fn reject(tx: &mpsc::UnboundedSender<String>, seq: u64, code: ErrorCode, message: &str) {
    warn!(seq, ?code, reason = message, "request rejected");
    reply(tx, &create_error(seq, code, message));
}

async fn dispatch(
    shared: &Shared,
    client_id: usize,
    line: &str,
    tx: &mpsc::UnboundedSender<String>,
    command_tx: &mpsc::Sender<InboundCommand>,
) -> Flow {
    let parsed = match parse_message(line) {
        Ok(p) => p,
        Err(e) => {
            let seq = serde_json::from_str::<serde_json::Value>(line)
                .ok()
                .and_then(|v| v.get("seq").and_then(|s| s.as_u64()))
                .unwrap_or(0);
            reject(tx, seq, ErrorCode::InvalidCommand, &format!("parse error: {e}"));
            return Flow::Continue;
        }
    };

    match parsed {
        ParsedMessage::Hello(hello) => handle_hello(shared, client_id, hello, tx, command_tx).await,
        ParsedMessage::Command(cmd) => {
            let seq = cmd.seq;
            {
                let mut reg = shared.registry.write().await;
                if !reg.is_handshaken(client_id) {
                    drop(reg);
                    reject(tx, seq, ErrorCode::HandshakeRequired, "send hello first");
                    return Flow::Continue;
                }
                if !reg.advance_seq(client_id, seq) {
                    drop(reg);
                    let e = ProtocolError::StaleSeq;
                    reject(tx, seq, e.code(), &e.to_string());
                    return Flow::Continue;
                }
                if reg.controller != Some(client_id) {
                    drop(reg);
                    reject(tx, seq, ErrorCode::NotController, "only the controller may send commands");
                    return Flow::Continue;
                }
            }

            let command = match map_command(&cmd) {
                Ok(c) => c,
                Err(e) => {
                    reject(tx, seq, e.code(), &e.to_string());
                    return Flow::Continue;
                }
            };
            let inbound = InboundCommand {
                client_id,
                seq,
                payload: InboundPayload::Command(command),
            };
            if command_tx.try_send(inbound).is_err() {
                reject(tx, seq, ErrorCode::Backpressure, "command queue is full");
            }
            Flow::Continue
        }
        ParsedMessage::Control(ctrl) => {
            let seq = ctrl.seq;
            let mut reg = shared.registry.write().await;
            if !reg.is_handshaken(client_id) {
                drop(reg);
                reject(tx, seq, ErrorCode::HandshakeRequired, "send hello first");
                return Flow::Continue;
            }
            if !reg.advance_seq(client_id, seq) {
                drop(reg);
                let e = ProtocolError::StaleSeq;
                reject(tx, seq, e.code(), &e.to_string());
                return Flow::Continue;
            }
            match ctrl.action {
                ControlAction::Claim if reg.controller.is_none() => {
                    reg.controller = Some(client_id);
                    shared.publish(&reg);
                    info!(client_id, "controller claimed");
                    reply(tx, &create_ack(seq));
                }
                ControlAction::Claim if reg.controller == Some(client_id) => {
                    reply(tx, &create_ack(seq));
                }
                ControlAction::Claim => {
                    drop(reg);
                    reject(tx, seq, ErrorCode::ControllerActive, "controller already assigned");
                }
                ControlAction::Release if reg.controller == Some(client_id) => {
                    reg.controller = None;
                    shared.publish(&reg);
                    info!(client_id, "controller released");
                    reply(tx, &create_ack(seq));
                }
                ControlAction::Release => {
                    drop(reg);
                    reject(tx, seq, ErrorCode::NotController, "only the controller may release");
                }
            }
            Flow::Continue
        }
        ParsedMessage::Unknown(value) => {
            let seq = value.get("seq").and_then(|v| v.as_u64()).unwrap_or(0);
            let e = ProtocolError::UnknownType;
            reject(tx, seq, e.code(), &e.to_string());
            Flow::Continue
        }
    }
}

async fn handle_hello(
    shared: &Shared,
    client_id: usize,
    hello: HelloMessage,
    tx: &mpsc::UnboundedSender<String>,
    command_tx: &mpsc::Sender<InboundCommand>,
) -> Flow {
    let expected_major = shared.config.protocol_version.split('.').next().unwrap_or("");
    let major = hello.protocol_version.split('.').next().unwrap_or("");
    if major != expected_major {
        reject(
            tx,
            hello.seq,
            ErrorCode::ProtocolMismatch,
            &format!("protocol version {} not supported", hello.protocol_version),
        );
        return Flow::Close;
    }

    let (role, controller) = {
        let mut reg = shared.registry.write().await;
        if reg.is_handshaken(client_id) && !reg.advance_seq(client_id, hello.seq) {
            drop(reg);
            let e = ProtocolError::StaleSeq;
            reject(tx, hello.seq, e.code(), &e.to_string());
            return Flow::Continue;
        }
        if let Some(c) = reg.get_mut(client_id) {
            c.handshaken = true;
            c.last_seq = Some(hello.seq);
            c.stream_observations = hello.requested.stream_observations;
            debug!(client_id, addr = %c.addr, name = %hello.client.name, "hello");
        }
        if reg.controller.is_none() {
            reg.controller = Some(client_id);
            info!(client_id, "client is now controller");
        }
        shared.publish(&reg);
        let role = if reg.controller == Some(client_id) {
            AssignedRole::Controller
        } else {
            AssignedRole::Observer
        };
        (role, reg.controller)
    };

    reply(
        tx,
        &create_welcome(
            hello.seq,
            &shared.config.protocol_version,
            client_id as u64,
            role,
            controller.map(|c| c as u64),
        ),
    );

    if hello.requested.stream_observations {
        let _ = command_tx.try_send(InboundCommand {
            client_id,
            seq: hello.seq,
            payload: InboundPayload::SnapshotRequest,
        });
    }
    Flow::Continue
}

/// Turn a protocol command into a game command.
pub fn map_command(cmd: &CommandMessage) -> Result<ClientCommand, ProtocolError> {
    match cmd.mode {
        CommandMode::Swap => {
            let swap = cmd.swap.ok_or(ProtocolError::MissingSwap)?;
            let (a, b) = swap.coords();
            Ok(ClientCommand::Swap { a, b })
        }
        CommandMode::Action => {
            let actions = cmd.actions.as_ref().ok_or(ProtocolError::MissingActions)?;
            if actions.len() > MAX_ACTIONS {
                return Err(ProtocolError::TooManyActions);
            }
            Ok(ClientCommand::Actions(
                actions.iter().copied().map(GameAction::from).collect(),
            ))
        }
    }
}

/// Build an observation from the board and session state.
pub fn build_observation(
    seq: u64,
    snap: &BoardSnapshot,
    session: &Session,
    paused: bool,
) -> ObservationMessage {
    let hint = if snap.phase == Phase::Idle {
        best_swap(&snap.grid).map(|s| SwapCommand::new(s.a, s.b))
    } else {
        None
    };
    ObservationMessage {
        msg_type: ObservationType::Observation,
        seq,
        ts: current_timestamp_ms(),
        phase: snap.phase.as_str().to_string(),
        status: session.status().as_str().to_string(),
        paused,
        level: session.level(),
        score: snap.score,
        target: session.target_score(),
        combo: snap.combo,
        moves: snap.moves,
        time_remaining_ms: session.time_remaining_ms(),
        board: BoardView {
            columns: snap.columns(),
            rows: snap.rows(),
            palette: snap.palette_size,
            cells: snap.grid.row_strings(),
        },
        hint,
    }
}
