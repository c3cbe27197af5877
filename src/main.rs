//! Terminal gem-matching runner (default binary).
//!
//! Drives one `BoardEngine` per level with crossterm input, the framebuffer
//! renderer, the level timer and, unless disabled, the TCP adapter.

use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use tracing::{debug, info, trace, warn};
use tracing_subscriber::EnvFilter;

use tui_gems::adapter::{
    build_observation, create_ack, create_board_error, create_error, Adapter, ClientCommand,
    ErrorCode, InboundCommand, InboundPayload, OutboundMessage,
};
use tui_gems::core::{
    BoardConfig, BoardEngine, BoardSnapshot, SelectOutcome, Selection, Session, SessionConfig,
    SessionEvent, SessionStatus,
};
use tui_gems::engine::best_swap;
use tui_gems::input::{handle_key_event, should_quit, Cursor};
use tui_gems::term::{AdapterStatusView, FrameBuffer, GameView, HudView, TerminalRenderer, Viewport};
use tui_gems::types::{GameAction, Phase, Swap, CASCADE_STEP_MS, TICK_MS};

fn main() -> Result<()> {
    init_logging()?;

    let board_config = BoardConfig::from_env();
    board_config.validate()?;
    let session_config = SessionConfig::from_env();
    session_config.validate()?;

    let adapter = match Adapter::start_from_env() {
        Ok(adapter) => adapter,
        Err(e) => {
            warn!(error = %e, "AI adapter failed to start");
            None
        }
    };

    let mut app = App::new(board_config, session_config, adapter)?;

    let mut term = TerminalRenderer::new();
    term.enter()?;

    let result = run(&mut term, &mut app);

    // Always try to restore terminal state.
    let _ = term.exit();
    result
}

/// Log to `GEMS_LOG_FILE` when set; the terminal belongs to the renderer.
fn init_logging() -> Result<()> {
    let Ok(path) = std::env::var("GEMS_LOG_FILE") else {
        return Ok(());
    };
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_env("GEMS_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Observable state that, when changed, is pushed to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    moves: u32,
    score: u64,
    phase: Phase,
    paused: bool,
    status: SessionStatus,
    level: u32,
    time_secs: u32,
}

struct App {
    board_config: BoardConfig,
    engine: BoardEngine,
    session: Session,
    selection: Selection,
    cursor: Cursor,
    hint: Option<Swap>,
    paused: bool,
    cascade_ms: u32,
    adapter: Option<Adapter>,
    observation_seq: u64,
    last_observed: Option<Fingerprint>,
}

impl App {
    fn new(
        board_config: BoardConfig,
        session_config: SessionConfig,
        adapter: Option<Adapter>,
    ) -> Result<Self> {
        let engine = BoardEngine::initialize(board_config)?;
        Ok(Self {
            cursor: Cursor::new(board_config.columns, board_config.rows),
            board_config,
            engine,
            session: Session::new(session_config),
            selection: Selection::new(),
            hint: None,
            paused: false,
            cascade_ms: 0,
            adapter,
            observation_seq: 0,
            last_observed: None,
        })
    }

    fn accepts_play(&self) -> bool {
        !self.paused && self.session.status() == SessionStatus::Playing
    }

    /// Replace the board for the current level. Each level gets its own seed.
    fn rebuild_board(&mut self) -> Result<()> {
        let seed = self
            .board_config
            .seed
            .wrapping_add(self.session.level().saturating_sub(1));
        self.engine = BoardEngine::initialize(self.board_config.with_seed(seed))?;
        self.selection.cancel();
        self.hint = None;
        self.cascade_ms = 0;
        Ok(())
    }

    fn restart(&mut self) -> Result<()> {
        info!("restart");
        self.session.restart();
        self.paused = false;
        self.rebuild_board()
    }

    fn apply_action(&mut self, action: GameAction) -> Result<()> {
        match action {
            GameAction::CursorUp
            | GameAction::CursorDown
            | GameAction::CursorLeft
            | GameAction::CursorRight => {
                self.cursor.apply(action);
            }
            GameAction::Select if self.accepts_play() => {
                match self.selection.select(self.cursor.position(), &mut self.engine) {
                    SelectOutcome::Swapped(matches) => {
                        debug!(cleared = matches.len(), "swap accepted");
                        self.hint = None;
                        self.cascade_ms = 0;
                    }
                    SelectOutcome::Rejected(e) => debug!(error = %e, "swap rejected"),
                    SelectOutcome::Selected(_) | SelectOutcome::Deselected(_) => {}
                }
            }
            GameAction::Select => {}
            GameAction::Cancel => {
                self.selection.cancel();
                self.hint = None;
            }
            GameAction::Hint if self.engine.is_idle() => {
                self.hint = best_swap(self.engine.grid());
                if let Some(hint) = self.hint {
                    self.cursor.set_position(hint.a);
                }
            }
            GameAction::Hint => {}
            GameAction::Pause => {
                if self.session.status() == SessionStatus::Playing {
                    self.paused = !self.paused;
                }
            }
            GameAction::Restart => self.restart()?,
        }
        Ok(())
    }

    fn tick(&mut self, elapsed_ms: u32) -> Result<()> {
        if self.paused {
            return Ok(());
        }

        if !self.engine.is_idle() {
            self.cascade_ms += elapsed_ms;
            if self.cascade_ms >= CASCADE_STEP_MS {
                self.cascade_ms = 0;
                self.engine.tick();
            }
        }
        for event in self.engine.drain_events() {
            trace!(kind = event.name(), ?event, "board event");
        }

        match self.session.tick(elapsed_ms, self.engine.score()) {
            Some(SessionEvent::Victory) => {
                info!(level = self.session.level(), score = self.engine.score(), "level cleared");
            }
            Some(SessionEvent::TimeUp) => {
                info!(level = self.session.level(), score = self.engine.score(), "time up");
            }
            Some(SessionEvent::AdvanceLevel) => {
                self.session.start_level();
                self.rebuild_board()?;
            }
            None => {}
        }
        Ok(())
    }

    fn poll_adapter(&mut self) -> Result<()> {
        loop {
            let Some(cmd) = self.adapter.as_mut().and_then(Adapter::try_recv) else {
                return Ok(());
            };
            self.handle_command(cmd)?;
        }
    }

    fn handle_command(&mut self, cmd: InboundCommand) -> Result<()> {
        let InboundCommand {
            client_id,
            seq,
            payload,
        } = cmd;
        let reply = match payload {
            InboundPayload::SnapshotRequest => {
                let obs = self.observation();
                OutboundMessage::to_client(client_id, &obs)
            }
            InboundPayload::Command(ClientCommand::Swap { a, b }) => {
                if !self.accepts_play() {
                    let e = create_error(seq, ErrorCode::Busy, "game is paused or over");
                    OutboundMessage::to_client(client_id, &e)
                } else {
                    match self.engine.request_swap(a, b) {
                        Ok(_) => {
                            self.selection.cancel();
                            self.hint = None;
                            self.cascade_ms = 0;
                            OutboundMessage::to_client(client_id, &create_ack(seq))
                        }
                        Err(e) => {
                            OutboundMessage::to_client(client_id, &create_board_error(seq, &e))
                        }
                    }
                }
            }
            InboundPayload::Command(ClientCommand::Actions(actions)) => {
                for action in actions {
                    self.apply_action(action)?;
                }
                OutboundMessage::to_client(client_id, &create_ack(seq))
            }
        };
        if let (Some(adapter), Some(msg)) = (&self.adapter, reply) {
            adapter.send(msg);
        }
        Ok(())
    }

    fn observation(&mut self) -> tui_gems::adapter::ObservationMessage {
        self.observation_seq += 1;
        build_observation(
            self.observation_seq,
            &self.engine.snapshot(),
            &self.session,
            self.paused,
        )
    }

    fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            moves: self.engine.moves(),
            score: self.engine.score(),
            phase: self.engine.phase(),
            paused: self.paused,
            status: self.session.status(),
            level: self.session.level(),
            time_secs: self.session.time_remaining_secs(),
        }
    }

    /// Broadcast an observation when anything visible to agents changed.
    fn publish_observation(&mut self) {
        if self.adapter.is_none() {
            return;
        }
        let fp = self.fingerprint();
        if self.last_observed == Some(fp) {
            return;
        }
        self.last_observed = Some(fp);
        let obs = self.observation();
        if let (Some(adapter), Some(msg)) = (&self.adapter, OutboundMessage::broadcast(&obs)) {
            adapter.send(msg);
        }
    }

    fn hud(&self) -> HudView {
        HudView {
            level: self.session.level(),
            target: self.session.target_score(),
            score_pct: percent(self.session.progress(self.engine.score())),
            time_secs: self.session.time_remaining_secs(),
            time_pct: percent(self.session.time_fraction()),
            status: self.session.status(),
            paused: self.paused,
            cursor: Some(self.cursor.position()),
            selected: self.selection.selected(),
            hint: self.hint,
        }
    }

    fn adapter_view(&self) -> AdapterStatusView {
        match &self.adapter {
            Some(adapter) => {
                let status = adapter.status();
                AdapterStatusView {
                    enabled: true,
                    client_count: status.client_count(),
                    controller_id: status.controller_id(),
                    pid: std::process::id(),
                    listen_addr: status.listen_addr(),
                }
            }
            None => AdapterStatusView {
                enabled: false,
                client_count: 0,
                controller_id: None,
                pid: std::process::id(),
                listen_addr: None,
            },
        }
    }
}

fn percent(fraction: f32) -> u8 {
    (fraction.clamp(0.0, 1.0) * 100.0).round() as u8
}

fn run(term: &mut TerminalRenderer, app: &mut App) -> Result<()> {
    let view = GameView::default();
    let mut snap = BoardSnapshot::default();
    let mut fb = FrameBuffer::new(0, 0);

    let mut last_tick = Instant::now();
    let tick_duration = Duration::from_millis(TICK_MS as u64);

    loop {
        // Render.
        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        app.engine.snapshot_into(&mut snap);
        let adapter_view = app.adapter_view();
        view.render_into(&snap, &app.hud(), Some(&adapter_view), Viewport::new(w, h), &mut fb);
        term.present(&mut fb)?;

        // Input with timeout until next tick.
        let timeout = tick_duration
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if should_quit(key) {
                        return Ok(());
                    }
                    if let Some(action) = handle_key_event(key) {
                        app.apply_action(action)?;
                    }
                }
                Event::Resize(..) => term.invalidate(),
                _ => {}
            }
        }

        app.poll_adapter()?;

        // Tick.
        if last_tick.elapsed() >= tick_duration {
            last_tick = Instant::now();
            app.tick(TICK_MS)?;
        }

        app.publish_observation();
    }
}

