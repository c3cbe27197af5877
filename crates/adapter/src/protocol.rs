//! Protocol module - JSON message types for the AI adapter
//!
//! Line-delimited JSON. Every message carries `type`, `seq` (sender's
//! sequence number, strictly increasing) and `ts` (milliseconds since the
//! Unix epoch).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::BoardError;
use crate::types::{Coord, GameAction};

pub const PROTOCOL_VERSION: &str = "1.0.0";
pub const GAME_ID: &str = "tui-gems";
/// Most actions accepted in one command.
pub const MAX_ACTIONS: usize = 16;

// ============== Client -> Game Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HelloType {
    #[default]
    #[serde(rename = "hello")]
    Hello,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CommandType {
    #[default]
    #[serde(rename = "command")]
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ControlType {
    #[default]
    #[serde(rename = "control")]
    Control,
}

/// Client hello message (first message on a connection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    #[serde(rename = "type", default)]
    pub msg_type: HelloType,
    pub seq: u64,
    pub ts: u64,
    pub client: ClientInfo,
    pub protocol_version: String,
    #[serde(default)]
    pub requested: RequestedCapabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestedCapabilities {
    #[serde(default = "default_true")]
    pub stream_observations: bool,
}

impl Default for RequestedCapabilities {
    fn default() -> Self {
        Self {
            stream_observations: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandMode {
    Swap,
    Action,
}

/// Command message (controller only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandMessage {
    #[serde(rename = "type", default)]
    pub msg_type: CommandType,
    pub seq: u64,
    pub ts: u64,
    pub mode: CommandMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap: Option<SwapCommand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<ActionName>>,
}

/// Two cells as `[col, row]` pairs, row 0 at the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapCommand {
    pub from: [u8; 2],
    pub to: [u8; 2],
}

impl SwapCommand {
    pub fn new(a: Coord, b: Coord) -> Self {
        Self {
            from: [a.col, a.row],
            to: [b.col, b.row],
        }
    }

    pub fn coords(&self) -> (Coord, Coord) {
        (
            Coord::new(self.from[0], self.from[1]),
            Coord::new(self.to[0], self.to[1]),
        )
    }
}

/// Actions a client may send. Cursor movement is a human concern and is not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionName {
    Pause,
    Restart,
}

impl<'de> Deserialize<'de> for ActionName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        if s.eq_ignore_ascii_case("pause") {
            Ok(Self::Pause)
        } else if s.eq_ignore_ascii_case("restart") {
            Ok(Self::Restart)
        } else {
            Err(serde::de::Error::custom(format!("unknown action: {s}")))
        }
    }
}

impl From<ActionName> for GameAction {
    fn from(value: ActionName) -> Self {
        match value {
            ActionName::Pause => GameAction::Pause,
            ActionName::Restart => GameAction::Restart,
        }
    }
}

/// Control message (claim/release controller status)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlMessage {
    #[serde(rename = "type", default)]
    pub msg_type: ControlType,
    pub seq: u64,
    pub ts: u64,
    pub action: ControlAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    Claim,
    Release,
}

// ============== Game -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WelcomeType {
    #[serde(rename = "welcome")]
    Welcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckType {
    #[serde(rename = "ack")]
    Ack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservationType {
    #[serde(rename = "observation")]
    Observation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignedRole {
    Controller,
    Observer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    HandshakeRequired,
    ProtocolMismatch,
    NotController,
    ControllerActive,
    InvalidCommand,
    Backpressure,
    NotAdjacent,
    InvalidMove,
    Busy,
    OutOfBounds,
}

impl From<&BoardError> for ErrorCode {
    fn from(value: &BoardError) -> Self {
        match value {
            BoardError::NotAdjacent { .. } => ErrorCode::NotAdjacent,
            BoardError::InvalidMove { .. } => ErrorCode::InvalidMove,
            BoardError::Busy { .. } | BoardError::WrongPhase { .. } => ErrorCode::Busy,
            BoardError::OutOfBounds { .. } => ErrorCode::OutOfBounds,
            BoardError::InvalidConfig(_)
            | BoardError::InvalidLayout(_)
            | BoardError::ShuffleExhausted { .. } => ErrorCode::InvalidCommand,
        }
    }
}

/// Why a parsed command could not be turned into a game command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("swap mode requires a `swap` field")]
    MissingSwap,
    #[error("action mode requires an `actions` field")]
    MissingActions,
    #[error("at most {MAX_ACTIONS} actions per command")]
    TooManyActions,
    #[error("seq must be strictly increasing")]
    StaleSeq,
    #[error("unknown message type")]
    UnknownType,
}

impl ProtocolError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::InvalidCommand
    }
}

/// Welcome message (response to hello)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeMessage {
    #[serde(rename = "type")]
    pub msg_type: WelcomeType,
    pub seq: u64,
    pub ts: u64,
    pub protocol_version: String,
    pub client_id: u64,
    pub role: AssignedRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller_id: Option<u64>,
    pub game_id: String,
    pub command_modes: Vec<CommandMode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckMessage {
    #[serde(rename = "type")]
    pub msg_type: AckType,
    pub seq: u64,
    pub ts: u64,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: ErrorType,
    pub seq: u64,
    pub ts: u64,
    pub code: ErrorCode,
    pub message: String,
}

/// Board and session state, sent to every streaming client after each change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationMessage {
    #[serde(rename = "type")]
    pub msg_type: ObservationType,
    pub seq: u64,
    pub ts: u64,
    pub phase: String,
    pub status: String,
    pub paused: bool,
    pub level: u32,
    pub score: u64,
    pub target: u64,
    pub combo: u32,
    pub moves: u32,
    pub time_remaining_ms: u32,
    pub board: BoardView,
    /// Best available swap, absent when the board is not idle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<SwapCommand>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardView {
    pub columns: u8,
    pub rows: u8,
    pub palette: u8,
    /// Token characters, top row first.
    pub cells: Vec<String>,
}

/// Any inbound message.
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Hello(HelloMessage),
    Command(CommandMessage),
    Control(ControlMessage),
    Unknown(serde_json::Value),
}

/// Parse one line. Unknown `type` values come back as [`ParsedMessage::Unknown`].
pub fn parse_message(line: &str) -> Result<ParsedMessage, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(line)?;
    let kind = value.get("type").and_then(|t| t.as_str()).unwrap_or("");
    Ok(match kind {
        "hello" => ParsedMessage::Hello(serde_json::from_value(value)?),
        "command" => ParsedMessage::Command(serde_json::from_value(value)?),
        "control" => ParsedMessage::Control(serde_json::from_value(value)?),
        _ => ParsedMessage::Unknown(value),
    })
}

pub fn create_hello(seq: u64, client_name: &str, protocol_version: &str) -> HelloMessage {
    HelloMessage {
        msg_type: HelloType::Hello,
        seq,
        ts: current_timestamp_ms(),
        client: ClientInfo {
            name: client_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        protocol_version: protocol_version.to_string(),
        requested: RequestedCapabilities::default(),
    }
}

pub fn create_swap_command(seq: u64, a: Coord, b: Coord) -> CommandMessage {
    CommandMessage {
        msg_type: CommandType::Command,
        seq,
        ts: current_timestamp_ms(),
        mode: CommandMode::Swap,
        swap: Some(SwapCommand::new(a, b)),
        actions: None,
    }
}

pub fn create_welcome(
    seq: u64,
    protocol_version: &str,
    client_id: u64,
    role: AssignedRole,
    controller_id: Option<u64>,
) -> WelcomeMessage {
    WelcomeMessage {
        msg_type: WelcomeType::Welcome,
        seq,
        ts: current_timestamp_ms(),
        protocol_version: protocol_version.to_string(),
        client_id,
        role,
        controller_id,
        game_id: GAME_ID.to_string(),
        command_modes: vec![CommandMode::Swap, CommandMode::Action],
    }
}

pub fn create_ack(seq: u64) -> AckMessage {
    AckMessage {
        msg_type: AckType::Ack,
        seq,
        ts: current_timestamp_ms(),
        status: "ok".to_string(),
    }
}

pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ErrorMessage {
    ErrorMessage {
        msg_type: ErrorType::Error,
        seq,
        ts: current_timestamp_ms(),
        code,
        message: message.to_string(),
    }
}

/// Error reply for a swap the engine refused.
pub fn create_board_error(seq: u64, err: &BoardError) -> ErrorMessage {
    create_error(seq, ErrorCode::from(err), &err.to_string())
}

pub(crate) fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hello() {
        let json = r#"{"type":"hello","seq":1,"ts":1234567890,"client":{"name":"bot","version":"0.1"},"protocol_version":"1.0.0"}"#;
        match parse_message(json).unwrap() {
            ParsedMessage::Hello(msg) => {
                assert_eq!(msg.seq, 1);
                assert_eq!(msg.client.name, "bot");
                assert!(msg.requested.stream_observations);
            }
            other => panic!("expected hello, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_swap_command() {
        let json = r#"{"type":"command","seq":2,"ts":1,"mode":"swap","swap":{"from":[1,1],"to":[1,2]}}"#;
        match parse_message(json).unwrap() {
            ParsedMessage::Command(msg) => {
                assert_eq!(msg.mode, CommandMode::Swap);
                let (a, b) = msg.swap.unwrap().coords();
                assert_eq!(a, Coord::new(1, 1));
                assert_eq!(b, Coord::new(1, 2));
            }
            other => panic!("expected command, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_actions_case_insensitive() {
        let json = r#"{"type":"command","seq":3,"ts":1,"mode":"action","actions":["PAUSE","restart"]}"#;
        match parse_message(json).unwrap() {
            ParsedMessage::Command(msg) => {
                assert_eq!(
                    msg.actions.unwrap(),
                    vec![ActionName::Pause, ActionName::Restart]
                );
            }
            other => panic!("expected command, got {other:?}"),
        }
        let bad = r#"{"type":"command","seq":3,"ts":1,"mode":"action","actions":["hardDrop"]}"#;
        assert!(parse_message(bad).is_err());
    }

    #[test]
    fn test_parse_control_and_unknown() {
        let json = r#"{"type":"control","seq":4,"ts":1,"action":"release"}"#;
        assert!(matches!(
            parse_message(json).unwrap(),
            ParsedMessage::Control(ControlMessage {
                action: ControlAction::Release,
                ..
            })
        ));
        assert!(matches!(
            parse_message(r#"{"type":"dance","seq":5}"#).unwrap(),
            ParsedMessage::Unknown(_)
        ));
        assert!(parse_message("not json").is_err());
    }

    #[test]
    fn test_board_error_codes() {
        let a = Coord::new(0, 0);
        let b = Coord::new(0, 2);
        let msg = create_board_error(9, &BoardError::NotAdjacent { a, b });
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["type"], "error");
        assert_eq!(v["code"], "not_adjacent");
        assert_eq!(v["seq"], 9);

        let busy = BoardError::Busy {
            phase: crate::types::Phase::Resolving,
        };
        assert_eq!(ErrorCode::from(&busy), ErrorCode::Busy);
    }

    #[test]
    fn test_welcome_serializes_role() {
        let welcome = create_welcome(1, PROTOCOL_VERSION, 3, AssignedRole::Observer, Some(1));
        let v = serde_json::to_value(&welcome).unwrap();
        assert_eq!(v["type"], "welcome");
        assert_eq!(v["role"], "observer");
        assert_eq!(v["controller_id"], 1);
        assert_eq!(v["game_id"], "tui-gems");
        assert_eq!(v["command_modes"][0], "swap");
    }
}
