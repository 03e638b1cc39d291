/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` (an array of Cell)
///   2. Compare each cell with `back` (the previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. Batch everything with `queue!`, flush once at the end
///   5. Swap front/back
///
/// ## Map scale
///
/// One terminal row covers a full tile height, one column half a tile
/// width, so a 16 px tile lands on a 2×1 cell block and the usual
/// 26×26-tile field fits an 80×30 terminal: `col = x / 8`, `row = y / 16`.
/// Hulls are 4×2 blocks with the muzzle cells marking the heading,
/// shells a single dot. Half-tile brick remnants pick the matching
/// half-block glyph, so battle damage is readable at a glance.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{Bullet, Direction, Eagle, Tank, TankKind};
use crate::domain::tile::{Terrain, TerrainKind};
use crate::sim::event::GameEvent;
use crate::sim::session::{Phase, Session};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every cell. Using the same RGB for
    /// `Clear` and all cell backgrounds keeps the inter-row gap pixels on
    /// VTE terminals identical to the cell color, so no horizontal lines.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel used to invalidate the back buffer: differs from any real
    /// cell, so every position diffs dirty.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        cell.ch_len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.fg = fg;
        // Color::Reset would fall back to the terminal default and break
        // the gap trick above, so map it to the base background.
        cell.bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        cell
    }

    fn as_str(&self) -> &str {
        unsafe { std::str::from_utf8_unchecked(&self.ch[..self.ch_len as usize]) }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell::from_char(ch, fg, bg));
            cx += 1;
        }
    }
}

// ── Renderer ──

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    px_per_col: i32,
    px_per_row: i32,
    message: String,
    message_ttl: u32,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            px_per_col: 8,
            px_per_row: 16,
            message: String::new(),
            message_ttl: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Turn simulation events into flash messages for the bar under the
    /// field. Quiet events pass through without a trace.
    pub fn note_events(&mut self, events: &[GameEvent]) {
        for event in events {
            let text = match event {
                GameEvent::StageStarted { .. } => {
                    self.message.clear();
                    self.message_ttl = 0;
                    continue;
                }
                GameEvent::StageSwitched { stage } => format!("STAGE {stage}"),
                GameEvent::EnemySpawned { .. } => "ENEMY DEPLOYED".to_string(),
                GameEvent::EnemyDestroyed { points, .. } => format!("+{points}"),
                GameEvent::PlayerRespawned => "PLAYER RESPAWNED".to_string(),
                GameEvent::PlayerEliminated => "PLAYER DOWN".to_string(),
                GameEvent::EagleFell => "THE BASE HAS FALLEN".to_string(),
            };
            self.message = text;
            self.message_ttl = 90;
        }
    }

    pub fn render(&mut self, session: &Session) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(
                self.writer,
                SetBackgroundColor(Cell::BASE_BG),
                Clear(ClearType::All)
            )?;
        }

        // Phase change → clear for a clean transition
        if self.last_phase != Some(session.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(
                self.writer,
                SetBackgroundColor(Cell::BASE_BG),
                Clear(ClearType::All)
            )?;
            self.last_phase = Some(session.phase);
        }

        self.px_per_col = (session.cfg.map.tile_w / 2).max(1);
        self.px_per_row = session.cfg.map.tile_h.max(1);

        self.front.clear();
        match session.phase {
            Phase::StageIntro => self.compose_stage_intro(session),
            Phase::Playing | Phase::GameOver | Phase::Finished => self.compose_field(session),
        }

        if self.message_ttl > 0 {
            self.message_ttl -= 1;
            if self.message_ttl == 0 {
                self.message.clear();
            }
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors at frame start. Not ResetColor: that falls
        // back to the terminal's own default, which may differ from
        // BASE_BG and reintroduce line artifacts.
        queue!(
            self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.as_str()))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_field(&mut self, s: &Session) {
        self.compose_hud(s);

        for row in 0..s.grid.rows {
            for col in 0..s.grid.cols {
                if let Some(t) = s.grid.at(row, col) {
                    self.compose_terrain(t);
                }
            }
        }

        for enemy in &s.enemies {
            self.compose_hull(&enemy.tank);
        }
        for player in &s.players {
            self.compose_hull(&player.tank);
        }
        for enemy in &s.enemies {
            if let Some(shell) = &enemy.tank.bullet {
                self.compose_shell(shell);
            }
        }
        for player in &s.players {
            if let Some(shell) = &player.tank.bullet {
                self.compose_shell(shell);
            }
        }
        self.compose_eagle(&s.eagle);

        // Bushes overlay everything on the field.
        for bush in &s.bushes {
            self.compose_terrain(bush);
        }

        if matches!(s.phase, Phase::GameOver | Phase::Finished) {
            self.compose_game_over_banner(s);
        }
        self.compose_message_bar(s);
    }

    fn compose_hud(&mut self, s: &Session) {
        for x in 0..self.front.width {
            self.front.set(x, HUD_ROW, Cell::from_char(' ', Color::White, HUD_BG));
        }
        let stock = |kind: TankKind| {
            s.players
                .iter()
                .find(|p| p.tank.kind == kind)
                .map(|p| format!("♥×{}", p.respawns))
                .unwrap_or_else(|| "--".to_string())
        };
        let hud = format!(
            " STAGE {:<2}  SCORE {:<6}  P1 {}  P2 {}  FOES {} ",
            s.stage,
            s.score,
            stock(TankKind::Player1),
            stock(TankKind::Player2),
            s.enemies.len(),
        );
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    fn compose_terrain(&mut self, t: &Terrain) {
        let (ch, fg, bg) = match t.kind {
            TerrainKind::Brick => (
                '▒',
                Color::Rgb { r: 200, g: 90, b: 60 },
                Color::Rgb { r: 90, g: 35, b: 20 },
            ),
            TerrainKind::Stone => (
                '█',
                Color::Rgb { r: 150, g: 150, b: 150 },
                Color::Rgb { r: 80, g: 80, b: 80 },
            ),
            TerrainKind::Water => (
                '≈',
                Color::Rgb { r: 80, g: 140, b: 255 },
                Color::Rgb { r: 10, g: 30, b: 80 },
            ),
            TerrainKind::Ice => (
                '░',
                Color::Rgb { r: 200, g: 230, b: 255 },
                Color::Rgb { r: 40, g: 60, b: 80 },
            ),
            TerrainKind::Bush => (
                '♣',
                Color::Rgb { r: 60, g: 200, b: 60 },
                Color::Rgb { r: 10, g: 40, b: 10 },
            ),
        };
        // A shaved brick keeps only half its tile; pick the half-block
        // glyph that matches which half survived.
        let ch = if t.rect.h < self.px_per_row {
            if t.rect.y % self.px_per_row == 0 {
                '▀'
            } else {
                '▄'
            }
        } else {
            ch
        };

        let col0 = t.rect.x / self.px_per_col;
        let row = t.rect.y / self.px_per_row;
        let cols = (t.rect.w / self.px_per_col).max(1);
        for dx in 0..cols {
            self.set_map_cell(col0 + dx, row, Cell::from_char(ch, fg, bg));
        }
    }

    fn compose_hull(&mut self, tank: &Tank) {
        let fg = hull_color(tank.kind);
        let col0 = tank.rect.x / self.px_per_col;
        let row0 = tank.rect.y / self.px_per_row;
        for (dy, line) in hull_rows(tank.dir).iter().enumerate() {
            for (dx, ch) in line.chars().enumerate() {
                self.set_map_cell(
                    col0 + dx as i32,
                    row0 + dy as i32,
                    Cell::from_char(ch, fg, Cell::BASE_BG),
                );
            }
        }
    }

    fn compose_shell(&mut self, shell: &Bullet) {
        let col = shell.rect.x / self.px_per_col;
        let row = shell.rect.y / self.px_per_row;
        self.set_map_cell(col, row, Cell::from_char('•', Color::White, Cell::BASE_BG));
    }

    fn compose_eagle(&mut self, eagle: &Eagle) {
        let (rows, fg) = if eagle.destroyed {
            (["░░░░", "░░░░"], Color::DarkGrey)
        } else {
            (["▛▀▀▜", "▙▄▄▟"], Color::Rgb { r: 255, g: 220, b: 50 })
        };
        let col0 = eagle.rect.x / self.px_per_col;
        let row0 = eagle.rect.y / self.px_per_row;
        for (dy, line) in rows.iter().enumerate() {
            for (dx, ch) in line.chars().enumerate() {
                self.set_map_cell(
                    col0 + dx as i32,
                    row0 + dy as i32,
                    Cell::from_char(ch, fg, Cell::BASE_BG),
                );
            }
        }
    }

    fn compose_stage_intro(&mut self, s: &Session) {
        self.compose_hud(s);
        let map_cols = (s.cfg.map.width / self.px_per_col).max(0) as usize;
        let map_rows = (s.cfg.map.height / self.px_per_row).max(0) as usize;

        let title = format!("◈  STAGE {}  ◈", s.stage);
        let cx = map_cols.saturating_sub(title.chars().count()) / 2;
        let cy = MAP_ROW + map_rows / 2;
        self.front.put_str(
            cx,
            cy.saturating_sub(1),
            &title,
            Color::Rgb { r: 255, g: 220, b: 50 },
            Color::Reset,
        );

        // blink on a quarter-second cadence
        if (s.intro_ms / 250) % 2 == 0 {
            let ready = "GET READY";
            let rx = map_cols.saturating_sub(ready.len()) / 2;
            self.front.put_str(
                rx,
                cy + 1,
                ready,
                Color::Rgb { r: 80, g: 255, b: 80 },
                Color::Reset,
            );
        }
    }

    fn compose_game_over_banner(&mut self, s: &Session) {
        let row = s.game_over_y as i32 / self.px_per_row;
        let map_rows = s.cfg.map.height / self.px_per_row;
        if row < 0 || row >= map_rows {
            return;
        }
        let text = "G A M E   O V E R";
        let map_cols = (s.cfg.map.width / self.px_per_col).max(0) as usize;
        let cx = map_cols.saturating_sub(text.len()) / 2;
        self.front.put_str(
            cx,
            MAP_ROW + row as usize,
            text,
            Color::Rgb { r: 255, g: 60, b: 60 },
            Color::Reset,
        );
    }

    fn compose_message_bar(&mut self, s: &Session) {
        if self.message.is_empty() {
            return;
        }
        let map_rows = (s.cfg.map.height / self.px_per_row).max(0) as usize;
        let bar_row = MAP_ROW + map_rows + 1;
        if bar_row >= self.front.height {
            return;
        }
        let text = format!(" ◈ {} ", self.message);
        let fg = Color::Black;
        let bg = Color::Rgb { r: 200, g: 180, b: 50 };
        for x in 0..self.front.width {
            self.front.set(x, bar_row, Cell::from_char(' ', fg, bg));
        }
        self.front.put_str(0, bar_row, &text, fg, bg);
    }

    fn set_map_cell(&mut self, col: i32, row: i32, cell: Cell) {
        if col < 0 || row < 0 {
            return;
        }
        self.front.set(col as usize, MAP_ROW + row as usize, cell);
    }
}

// ── Sprite tables ──

fn hull_rows(dir: Direction) -> [&'static str; 2] {
    match dir {
        Direction::Up => ["█▲▲█", "████"],
        Direction::Down => ["████", "█▼▼█"],
        Direction::Left => ["◀███", "◀███"],
        Direction::Right => ["███▶", "███▶"],
    }
}

fn hull_color(kind: TankKind) -> Color {
    match kind {
        TankKind::Player1 => Color::Rgb { r: 80, g: 255, b: 80 },
        TankKind::Player2 => Color::Rgb { r: 100, g: 200, b: 255 },
        TankKind::TierA => Color::Rgb { r: 220, g: 220, b: 220 },
        TankKind::TierB => Color::Rgb { r: 255, g: 180, b: 80 },
        TankKind::TierC => Color::Rgb { r: 180, g: 100, b: 200 },
        TankKind::TierD => Color::Rgb { r: 255, g: 60, b: 60 },
    }
}
