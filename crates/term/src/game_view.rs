//! GameView: maps a `core::BoardSnapshot` into a terminal framebuffer.
//!
//! This module is pure (no I/O). It can be unit-tested.

use std::net::SocketAddr;

use crate::core::{BoardSnapshot, SessionStatus};
use crate::fb::{CellStyle, FrameBuffer, Rgb};
use crate::types::{Coord, Swap, Token};

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// AI adapter state shown in the side panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterStatusView {
    pub enabled: bool,
    pub client_count: u16,
    pub controller_id: Option<usize>,
    pub pid: u32,
    pub listen_addr: Option<SocketAddr>,
}

/// Everything drawn around the board that is not board state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HudView {
    pub level: u32,
    pub target: u64,
    /// Share of the target reached, 0..=100.
    pub score_pct: u8,
    pub time_secs: u32,
    /// Share of the time limit left, 0..=100.
    pub time_pct: u8,
    pub status: SessionStatus,
    pub paused: bool,
    pub cursor: Option<Coord>,
    pub selected: Option<Coord>,
    pub hint: Option<Swap>,
}

impl Default for HudView {
    fn default() -> Self {
        Self {
            level: 1,
            target: 0,
            score_pct: 0,
            time_secs: 0,
            time_pct: 0,
            status: SessionStatus::Playing,
            paused: false,
            cursor: None,
            selected: None,
            hint: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorY {
    Center,
    Top,
}

const BOARD_BG: Rgb = Rgb::new(25, 25, 35);
const CURSOR_BG: Rgb = Rgb::new(70, 70, 95);
const SELECTED_BG: Rgb = Rgb::new(150, 140, 50);
const HINT_BG: Rgb = Rgb::new(35, 90, 60);
const METER_WIDTH: u16 = 10;

/// A lightweight terminal renderer for the gem board.
pub struct GameView {
    /// Board cell width in terminal columns.
    cell_w: u16,
    /// Board cell height in terminal rows.
    cell_h: u16,
    anchor_y: AnchorY,
}

impl Default for GameView {
    fn default() -> Self {
        // 2x1 keeps gems roughly square in most terminal fonts.
        Self::new(2, 1)
    }
}

/// Top-left corner of the board frame plus the board size in cells.
#[derive(Debug, Clone, Copy)]
struct Frame {
    x: u16,
    y: u16,
    w: u16,
    h: u16,
    rows: u8,
}

impl GameView {
    pub fn new(cell_w: u16, cell_h: u16) -> Self {
        Self {
            cell_w: cell_w.max(1),
            cell_h: cell_h.max(1),
            anchor_y: AnchorY::Center,
        }
    }

    pub fn with_anchor_y(mut self, anchor_y: AnchorY) -> Self {
        self.anchor_y = anchor_y;
        self
    }

    /// Screen position of the top-left character of board cell `coord`.
    pub fn cell_origin(&self, snap: &BoardSnapshot, viewport: Viewport, coord: Coord) -> (u16, u16) {
        let frame = self.frame(snap, viewport);
        self.cell_px(frame, coord)
    }

    /// Render into an existing framebuffer; reuse it across frames.
    pub fn render_into(
        &self,
        snap: &BoardSnapshot,
        hud: &HudView,
        adapter: Option<&AdapterStatusView>,
        viewport: Viewport,
        fb: &mut FrameBuffer,
    ) {
        fb.resize(viewport.width, viewport.height);
        fb.clear(CellStyle::default().cell(' '));

        let frame = self.frame(snap, viewport);
        let border = CellStyle::new(Rgb::new(200, 200, 200), Rgb::new(0, 0, 0));
        self.draw_border(fb, frame, border);

        for coord in snap.grid.coords() {
            let token = snap.grid.get(coord.col, coord.row).unwrap_or_default();
            let bg = highlight(coord, hud).unwrap_or(BOARD_BG);
            self.draw_gem(fb, frame, coord, token, bg, snap.pending.contains(coord));
        }

        self.draw_side_panel(fb, snap, hud, adapter, viewport, frame);

        let overlay = if hud.paused {
            Some("PAUSED")
        } else {
            match hud.status {
                SessionStatus::Victory => Some("VICTORY"),
                SessionStatus::TimeUp => Some("TIME UP"),
                SessionStatus::Playing => None,
            }
        };
        if let Some(text) = overlay {
            self.draw_overlay_text(fb, frame, text);
        }
    }

    /// Convenience helper that allocates a new framebuffer.
    pub fn render(&self, snap: &BoardSnapshot, hud: &HudView, viewport: Viewport) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into(snap, hud, None, viewport, &mut fb);
        fb
    }

    pub fn render_with_adapter(
        &self,
        snap: &BoardSnapshot,
        hud: &HudView,
        adapter: Option<&AdapterStatusView>,
        viewport: Viewport,
    ) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into(snap, hud, adapter, viewport, &mut fb);
        fb
    }

    fn frame(&self, snap: &BoardSnapshot, viewport: Viewport) -> Frame {
        let w = snap.columns() as u16 * self.cell_w + 2;
        let h = snap.rows() as u16 * self.cell_h + 2;
        let x = viewport.width.saturating_sub(w) / 2;
        let y = match self.anchor_y {
            AnchorY::Center => viewport.height.saturating_sub(h) / 2,
            AnchorY::Top => 0,
        };
        Frame {
            x,
            y,
            w,
            h,
            rows: snap.rows(),
        }
    }

    /// Row 0 is the bottom of the board, so screen rows run the other way.
    fn cell_px(&self, frame: Frame, coord: Coord) -> (u16, u16) {
        let flipped = frame.rows.saturating_sub(1).saturating_sub(coord.row) as u16;
        (
            frame.x + 1 + coord.col as u16 * self.cell_w,
            frame.y + 1 + flipped * self.cell_h,
        )
    }

    fn draw_border(&self, fb: &mut FrameBuffer, f: Frame, style: CellStyle) {
        if f.w < 2 || f.h < 2 {
            return;
        }
        let (right, bottom) = (f.x + f.w - 1, f.y + f.h - 1);

        fb.put_char(f.x, f.y, '╭', style);
        fb.put_char(right, f.y, '╮', style);
        fb.put_char(f.x, bottom, '╰', style);
        fb.put_char(right, bottom, '╯', style);
        for x in f.x + 1..right {
            fb.put_char(x, f.y, '─', style);
            fb.put_char(x, bottom, '─', style);
        }
        for y in f.y + 1..bottom {
            fb.put_char(f.x, y, '│', style);
            fb.put_char(right, y, '│', style);
        }
    }

    fn draw_gem(
        &self,
        fb: &mut FrameBuffer,
        frame: Frame,
        coord: Coord,
        token: Token,
        bg: Rgb,
        clearing: bool,
    ) {
        let (px, py) = self.cell_px(frame, coord);
        let base = CellStyle::new(gem_color(token), bg);
        fb.fill_rect(px, py, self.cell_w, self.cell_h, ' ', base);

        let (glyph, style) = if clearing {
            ('✦', CellStyle::new(Rgb::new(255, 255, 255), bg).bold())
        } else {
            (gem_glyph(token), base.bold())
        };
        fb.put_char(px, py, glyph, style);
    }

    fn draw_side_panel(
        &self,
        fb: &mut FrameBuffer,
        snap: &BoardSnapshot,
        hud: &HudView,
        adapter: Option<&AdapterStatusView>,
        viewport: Viewport,
        frame: Frame,
    ) {
        let panel_x = frame.x.saturating_add(frame.w).saturating_add(2);
        if panel_x >= viewport.width {
            return;
        }
        let panel_w = viewport.width - panel_x;
        if panel_w < 12 {
            return;
        }

        let label = CellStyle::default().bold();
        let value = CellStyle::new(Rgb::new(200, 200, 200), Rgb::new(0, 0, 0));
        let dim = value.dim();

        let mut y = frame.y;
        let row = |fb: &mut FrameBuffer, name: &str, y: &mut u16| {
            fb.put_str(panel_x, *y, name, label);
            *y = y.saturating_add(1);
        };

        row(fb, "SCORE", &mut y);
        fb.put_u64(panel_x, y, snap.score, value);
        y = y.saturating_add(1);
        draw_meter(fb, panel_x, y, hud.score_pct, Rgb::new(80, 200, 110));
        y = y.saturating_add(2);

        row(fb, "TARGET", &mut y);
        fb.put_u64(panel_x, y, hud.target, value);
        y = y.saturating_add(2);

        row(fb, "LEVEL", &mut y);
        fb.put_u32(panel_x, y, hud.level, value);
        y = y.saturating_add(2);

        row(fb, "TIME", &mut y);
        let end = fb.put_u32(panel_x, y, hud.time_secs, value);
        fb.put_char(end, y, 's', dim);
        y = y.saturating_add(1);
        draw_meter(fb, panel_x, y, hud.time_pct, Rgb::new(240, 210, 70));
        y = y.saturating_add(2);

        row(fb, "COMBO", &mut y);
        if snap.combo > 1 {
            fb.put_char(panel_x, y, 'x', value);
            fb.put_u32(panel_x + 1, y, snap.combo, value.bold());
        } else {
            fb.put_str(panel_x, y, "-", value);
        }
        y = y.saturating_add(2);

        row(fb, "AI", &mut y);
        let Some(st) = adapter.filter(|a| a.enabled) else {
            fb.put_str(panel_x, y, "OFF", value);
            return;
        };
        fb.put_str(panel_x, y, "ON", value);
        if panel_w >= 16 {
            fb.put_str(panel_x + 3, y, "clients", dim);
        }
        y = y.saturating_add(1);
        fb.put_str(panel_x, y, "C", value);
        fb.put_u32(panel_x + 2, y, st.client_count as u32, value);
        y = y.saturating_add(1);
        fb.put_str(panel_x, y, "CTRL", value);
        match st.controller_id {
            Some(id) => fb.put_u64(panel_x + 5, y, id as u64, value),
            None => fb.put_str(panel_x + 5, y, "-", value),
        };
        y = y.saturating_add(1);
        fb.put_str(panel_x, y, "PID", value);
        fb.put_u32(panel_x + 4, y, st.pid, value);
        if let Some(addr) = st.listen_addr {
            y = y.saturating_add(1);
            let end = fb.put_str(panel_x, y, "TCP ", value);
            let end = fb.put_str(end, y, &addr.ip().to_string(), value);
            if panel_w >= 22 {
                fb.put_char(end, y, ':', value);
                fb.put_u32(end + 1, y, addr.port() as u32, value);
            }
        }
    }

    fn draw_overlay_text(&self, fb: &mut FrameBuffer, f: Frame, text: &str) {
        let mid_y = f.y.saturating_add(f.h / 2);
        let text_w = text.chars().count() as u16;
        let x = f.x.saturating_add(f.w.saturating_sub(text_w) / 2);
        let style = CellStyle::new(Rgb::new(255, 255, 255), Rgb::new(0, 0, 0)).bold();
        fb.put_str(x, mid_y, text, style);
    }
}

/// A fixed-width bar filled to `pct` percent.
fn draw_meter(fb: &mut FrameBuffer, x: u16, y: u16, pct: u8, color: Rgb) {
    let filled = (pct.min(100) as u16 * METER_WIDTH + 50) / 100;
    let full = CellStyle::new(color, Rgb::new(0, 0, 0));
    let empty = CellStyle::new(Rgb::new(70, 70, 70), Rgb::new(0, 0, 0));
    for i in 0..METER_WIDTH {
        if i < filled {
            fb.put_char(x + i, y, '█', full);
        } else {
            fb.put_char(x + i, y, '░', empty);
        }
    }
}

/// Background for a highlighted cell. Selection wins over cursor, cursor over hint.
fn highlight(coord: Coord, hud: &HudView) -> Option<Rgb> {
    if hud.selected == Some(coord) {
        Some(SELECTED_BG)
    } else if hud.cursor == Some(coord) {
        Some(CURSOR_BG)
    } else if hud.hint.is_some_and(|s| s.a == coord || s.b == coord) {
        Some(HINT_BG)
    } else {
        None
    }
}

fn gem_color(token: Token) -> Rgb {
    match token.0 {
        0 => Rgb::new(230, 70, 70),
        1 => Rgb::new(80, 200, 110),
        2 => Rgb::new(80, 140, 240),
        3 => Rgb::new(240, 210, 70),
        4 => Rgb::new(190, 100, 230),
        5 => Rgb::new(70, 210, 220),
        6 => Rgb::new(250, 150, 50),
        _ => Rgb::new(230, 230, 230),
    }
}

/// Each token also gets its own shape so the board reads without color.
pub fn gem_glyph(token: Token) -> char {
    match token.0 {
        0 => '◆',
        1 => '●',
        2 => '▲',
        3 => '■',
        4 => '♥',
        5 => '★',
        6 => '✚',
        _ => '◉',
    }
}
