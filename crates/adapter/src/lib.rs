//! Adapter module - lets an external agent play over TCP
//!
//! Line-delimited JSON over a plain TCP socket (default `127.0.0.1:7788`).
//!
//! 1. The client connects and sends `hello`; the server answers `welcome`.
//! 2. The first client to say hello becomes the controller. Later clients
//!    observe until the controller disconnects or sends `control: release`.
//! 3. Clients that asked for observations receive a full board snapshot
//!    whenever the game state changes.
//! 4. The controller sends `command` messages in one of two modes:
//!    - **swap**: `{"from":[col,row],"to":[col,row]}`, row 0 at the bottom
//!    - **action**: a list of `pause` / `restart`
//!
//! Every command is answered with `ack` or `error`. Sequence numbers must
//! rise strictly per client, and at most `GEMS_AI_MAX_PENDING` commands may
//! wait for the game loop; the rest are refused with `backpressure`.
//!
//! # Environment
//!
//! - `GEMS_AI_HOST`: bind address (default `127.0.0.1`)
//! - `GEMS_AI_PORT`: port (default `7788`)
//! - `GEMS_AI_MAX_PENDING`: command queue depth (default 10)
//! - `GEMS_AI_DISABLED`: `1` or `true` turns the adapter off
//!
//! # Example
//!
//! ```text
//! -> {"type":"hello","seq":1,"ts":0,"client":{"name":"bot","version":"0.1"},"protocol_version":"1.0.0"}
//! <- {"type":"welcome","seq":1,"ts":...,"protocol_version":"1.0.0","client_id":1,"role":"controller",...}
//! <- {"type":"observation","seq":1,"ts":...,"phase":"idle","board":{...},"hint":{"from":[2,0],"to":[3,0]}}
//! -> {"type":"command","seq":2,"ts":0,"mode":"swap","swap":{"from":[2,0],"to":[3,0]}}
//! <- {"type":"ack","seq":2,"ts":...,"status":"ok"}
//! ```

pub mod protocol;
pub mod runtime;
pub mod server;

pub use tui_gems_core as core;
pub use tui_gems_engine as engine;
pub use tui_gems_types as types;

pub use protocol::*;
pub use runtime::{
    Adapter, ClientCommand, InboundCommand, InboundPayload, OutboundMessage, ServerStatus,
};
pub use server::{build_observation, map_command, run_server, ServerConfig};
