/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// This eliminates flicker caused by full-screen redraws.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::enemy::{Enemy, EnemyKind, EnemyMode};
use crate::domain::mover::TILE_SIZE;
use crate::domain::tile::{Dir, Tile};
use crate::sim::session::{GameSession, GameState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells.
    ///
    /// By using the SAME explicit RGB for both `Clear(ClearType::All)` and
    /// every cell's background, the inter-row gap color matches the cell
    /// color exactly, eliminating visible horizontal lines on VTE-based
    /// terminals.
    const BASE_BG: Color = Color::Rgb { r: 8, g: 8, b: 20 };

    const BLANK: Cell = Cell {
        ch: ' ',
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: '?',
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
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

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell::new(ch, fg, bg));
            cx += 1;
        }
    }
}

// ── Renderer ──

/// Each maze tile = 2 terminal columns, so the board reads roughly square.
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

// Palette
const WALL_FG: Color = Color::Rgb { r: 50, g: 90, b: 230 };
const WALL_BG: Color = Color::Rgb { r: 15, g: 25, b: 90 };
const WALL_FLASH_FG: Color = Color::Rgb { r: 230, g: 235, b: 255 };
const WALL_FLASH_BG: Color = Color::Rgb { r: 90, g: 100, b: 160 };
const PELLET_FG: Color = Color::Rgb { r: 255, g: 185, b: 150 };
const DOOR_FG: Color = Color::Rgb { r: 255, g: 160, b: 200 };
const PLAYER_FG: Color = Color::Rgb { r: 255, g: 230, b: 60 };
const FRIGHT_FG: Color = Color::Rgb { r: 70, g: 90, b: 255 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const GOLD: Color = Color::Rgb { r: 255, g: 220, b: 50 };
const GREEN: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const RED: Color = Color::Rgb { r: 255, g: 60, b: 60 };
const DIM: Color = Color::DarkGrey;

fn enemy_body_color(kind: EnemyKind) -> Color {
    match kind {
        EnemyKind::Chase => Color::Rgb { r: 255, g: 60, b: 60 },
        EnemyKind::Ambush => Color::Rgb { r: 255, g: 140, b: 220 },
        EnemyKind::Whimsy => Color::Rgb { r: 90, g: 230, b: 255 },
        EnemyKind::Shy => Color::Rgb { r: 255, g: 170, b: 60 },
    }
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_state: Option<GameState>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_state: None,
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

    pub fn render(&mut self, session: &GameSession) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            // Force full repaint after resize.
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // State change → full clear for a clean transition
        if self.last_state != Some(session.state) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_state = Some(session.state);
        }

        self.front.clear();

        match session.state {
            GameState::Title => self.compose_title(session),
            GameState::Ready => {
                self.compose_board(session, false);
                self.compose_ready_banner(session);
            }
            GameState::Playing => self.compose_board(session, false),
            GameState::Paused => {
                self.compose_board(session, false);
                self.compose_pause_overlay(session);
            }
            GameState::Dying => self.compose_dying(session),
            GameState::LevelComplete => self.compose_level_complete(session),
            GameState::GameOver => {
                self.compose_board(session, true);
                self.compose_end_box(session, "G A M E   O V E R", RED);
            }
            GameState::Win => {
                self.compose_board(session, true);
                self.compose_end_box(session, "★  Y O U   W I N  ★", GOLD);
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

        // Set explicit base colors at start of frame. Do NOT use ResetColor
        // here: it resets to the terminal's native default, which may differ
        // from BASE_BG and cause line artifacts.
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

                let mut buf = [0u8; 4];
                queue!(self.writer, Print(&*cell.ch.encode_utf8(&mut buf)))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Coordinate mapping ──

    /// Map a pixel position to a terminal cell. The center of tile (r, c)
    /// lands on column c * CELL_W of the board.
    fn term_pos(px: f32, py: f32) -> (i32, i32) {
        let x = (px / TILE_SIZE * CELL_W as f32 - 1.0).round() as i32;
        let y = (py / TILE_SIZE - 0.5).round() as i32 + MAP_ROW as i32;
        (x, y)
    }

    fn board_cols(session: &GameSession) -> usize {
        session.maze.cols() as usize * CELL_W
    }

    // ── HUD ──

    fn compose_hud(&mut self, s: &GameSession) {
        let width = Self::board_cols(s).max(40).min(self.front.width);
        for x in 0..width {
            self.front.set(x, HUD_ROW, Cell::new(' ', Color::White, HUD_BG));
        }
        let hi = s.high_score.max(s.score);
        let eaten = s.maze.total_pellets() - s.maze.pellets_left();
        let hud = format!(
            " SCORE {:<7} HI {:<7} LV {:<2} ♥×{}  ·{}/{}",
            s.score,
            hi,
            s.level + 1,
            s.lives,
            eaten,
            s.maze.total_pellets(),
        );
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    // ── Board: maze + entities ──

    fn compose_board(&mut self, s: &GameSession, dim_entities: bool) {
        self.compose_hud(s);
        self.compose_maze(s, false);
        if !dim_entities {
            for e in &s.enemies {
                self.compose_enemy(s, e);
            }
            self.compose_player(s);
        }
        self.compose_popups(s);

        // Help line under the board
        let help_row = MAP_ROW + s.maze.rows() as usize + 1;
        if help_row < self.front.height {
            let help = " ←↑↓→/WASD move  P pause  M mute  Ctrl-C quit";
            self.front.put_str(0, help_row, help, DIM, Color::Reset);
        }
    }

    fn compose_maze(&mut self, s: &GameSession, flash_walls: bool) {
        let rows = s.maze.rows();
        let cols = s.maze.cols();
        let (wall_fg, wall_bg) = if flash_walls {
            (WALL_FLASH_FG, WALL_FLASH_BG)
        } else {
            (WALL_FG, WALL_BG)
        };
        // Power pellets blink at 4 Hz.
        let power_on = (s.game_time * 4.0) as i32 % 2 == 0;

        for r in 0..rows {
            let y = MAP_ROW + r as usize;
            if y >= self.front.height {
                break;
            }
            for c in 0..cols {
                let x = c as usize * CELL_W;
                if x + 1 >= self.front.width {
                    break;
                }
                let (c0, c1, fg, bg) = match s.maze.tile_at(r, c) {
                    Tile::Wall => ('▓', '▓', wall_fg, wall_bg),
                    Tile::Path => ('·', ' ', PELLET_FG, Color::Reset),
                    Tile::Power if power_on => ('●', ' ', PELLET_FG, Color::Reset),
                    Tile::GhostDoor => ('═', '═', DOOR_FG, Color::Reset),
                    _ => (' ', ' ', Color::Reset, Color::Reset),
                };
                self.front.set(x, y, Cell::new(c0, fg, bg));
                self.front.set(x + 1, y, Cell::new(c1, fg, bg));
            }
        }
    }

    fn compose_player(&mut self, s: &GameSession) {
        let (x, y) = Self::term_pos(s.player.mover.px, s.player.mover.py);
        if x < 0 || y < 0 {
            return;
        }
        // Mouth wedge points along the travel direction.
        let ch = if s.player.mouth > 0.5 {
            match s.player.dir() {
                Some(Dir::Right) => '>',
                Some(Dir::Left) => '<',
                Some(Dir::Up) => '^',
                Some(Dir::Down) => 'v',
                None => 'O',
            }
        } else {
            'O'
        };
        self.front.set(x as usize, y as usize, Cell::new(ch, PLAYER_FG, Color::Reset));
    }

    fn compose_enemy(&mut self, s: &GameSession, e: &Enemy) {
        let (x, y) = Self::term_pos(e.mover.px, e.mover.py);
        if x < 0 || y < 0 {
            return;
        }
        let (ch, fg) = match e.mode {
            // Eyes heading home.
            EnemyMode::Returning => ('¨', Color::White),
            EnemyMode::Frightened => {
                // Warning flash alternates blue/white near expiry.
                if e.flashing && (s.game_time * 5.0) as i32 % 2 == 0 {
                    ('∩', Color::White)
                } else {
                    ('∩', FRIGHT_FG)
                }
            }
            _ => ('∩', enemy_body_color(e.kind)),
        };
        self.front.set(x as usize, y as usize, Cell::new(ch, fg, Color::Reset));
    }

    fn compose_popups(&mut self, s: &GameSession) {
        for p in &s.popups {
            let (x, y) = Self::term_pos(p.px, p.py);
            // Drift upward as the popup ages.
            let y = y - (p.age * 1.5) as i32;
            if x < 0 || y < (MAP_ROW as i32) {
                continue;
            }
            self.front.put_str(x as usize, y as usize, &p.text, Color::White, Color::Reset);
        }
    }

    // ── State-specific scenes ──

    fn compose_ready_banner(&mut self, s: &GameSession) {
        let (dr, _) = s.maze.door();
        // Centered a few rows below the pen door, where the arcade puts it.
        let y = MAP_ROW + (dr + 3).max(0) as usize;
        self.put_centered(s, y, "R E A D Y !", GOLD, Color::Reset);

        let name = format!("◈ {} ◈", s.level_name());
        self.put_centered(s, MAP_ROW - 1, &name, GREEN, Color::Reset);
    }

    fn compose_dying(&mut self, s: &GameSession) {
        self.compose_hud(s);
        self.compose_maze(s, false);
        self.compose_popups(s);

        // Spin, then burst, then vanish.
        let (x, y) = Self::term_pos(s.player.mover.px, s.player.mover.py);
        if x >= 0 && y >= 0 {
            let frame = (s.state_timer * 8.0) as usize;
            let ch = match frame {
                0..=7 => ['>', 'v', '<', '^'][frame % 4],
                8..=9 => '*',
                _ => ' ',
            };
            self.front.set(x as usize, y as usize, Cell::new(ch, PLAYER_FG, Color::Reset));
        }
    }

    fn compose_level_complete(&mut self, s: &GameSession) {
        self.compose_hud(s);
        // Walls strobe between blue and white.
        let flash = (s.state_timer * 4.0) as i32 % 2 == 1;
        self.compose_maze(s, flash);
        self.compose_player(s);

        let y = MAP_ROW + s.maze.rows() as usize + 1;
        self.put_centered(s, y, "LEVEL CLEAR!", GOLD, Color::Reset);
    }

    fn compose_end_box(&mut self, s: &GameSession, label: &str, color: Color) {
        let rows = s.maze.rows() as usize;
        let cy = MAP_ROW + rows / 2;
        let inner = label.chars().count() + 6;
        let border: String = "═".repeat(inner);

        self.put_centered(s, cy - 1, &format!("╔{}╗", border), color, Color::Reset);
        self.put_centered(s, cy, &format!("║   {}   ║", label), color, Color::Reset);
        self.put_centered(s, cy + 1, &format!("╚{}╝", border), color, Color::Reset);

        let score = format!("Final Score: {}", s.score);
        self.put_centered(s, cy + 3, &score, Color::White, Color::Reset);
        if s.score >= s.high_score && s.score > 0 {
            self.put_centered(s, cy + 4, "◈ NEW HIGH SCORE ◈", GOLD, Color::Reset);
        }
        // Prompt only once the dwell time is over; blink it.
        if s.state_timer >= crate::sim::tuning::GAME_OVER_TIME
            && (s.game_time * 2.0) as i32 % 2 == 0
        {
            self.put_centered(s, cy + 6, "PRESS ENTER", GREEN, Color::Reset);
        }
    }

    fn compose_title(&mut self, s: &GameSession) {
        let title = [
            r"  ___  _  _  _  ___  _       __  __   _    ___  ____ ",
            r" | _ \| |( \/ )| __)| |     (  \/  ) / \  (_  )| ___)",
            r" |  _/| | )  ( | _) | |__    )    ( / _ \  / /_ | __)",
            r" |_|  |_|(_/\_)|___||____|  (_/\/\_)_/ \_\(____)|____)",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, GOLD, Color::Reset);
        }

        let hi = format!("HIGH SCORE  {}", s.high_score);
        self.front.put_str(8, 8, &hi, Color::White, Color::Reset);

        // Enemy roster, arcade attract style
        let roster: [(EnemyKind, &str); 4] = [
            (EnemyKind::Chase, "CHASE    follows your every step"),
            (EnemyKind::Ambush, "AMBUSH   cuts off the road ahead"),
            (EnemyKind::Whimsy, "WHIMSY   hard to predict"),
            (EnemyKind::Shy, "SHY      keeps a nervous distance"),
        ];
        for (i, (kind, text)) in roster.iter().enumerate() {
            self.front.set(8, 10 + i, Cell::new('∩', enemy_body_color(*kind), Color::Reset));
            self.front.put_str(11, 10 + i, text, Color::White, Color::Reset);
        }

        let menu_base = 15;
        let blink = (s.game_time * 2.0) as i32 % 2 == 0;
        if blink {
            self.front.put_str(8, menu_base, "ENTER / SPACE   Start", GREEN, Color::Reset);
        }
        self.front.put_str(8, menu_base + 1, "    M           Sound on/off", Color::White, Color::Reset);
        self.front.put_str(8, menu_base + 2, "    Q           Quit", Color::White, Color::Reset);

        let info = format!("{} mazes loaded", s.total_levels());
        self.front.put_str(8, menu_base + 4, &info, DIM, Color::Reset);
    }

    fn compose_pause_overlay(&mut self, s: &GameSession) {
        let y = MAP_ROW + s.maze.rows().max(0) as usize / 2 - 1;
        let bg = Color::Rgb { r: 40, g: 40, b: 40 };
        let lines = ["╔═══════════════╗", "║    PAUSED     ║", "╚═══════════════╝"];
        for (i, line) in lines.iter().enumerate() {
            self.put_centered(s, y + i, line, GOLD, bg);
        }
    }

    // ── Helpers ──

    fn put_centered(&mut self, s: &GameSession, y: usize, text: &str, fg: Color, bg: Color) {
        if y >= self.front.height {
            return;
        }
        let width = Self::board_cols(s);
        let x = width.saturating_sub(text.chars().count()) / 2;
        self.front.put_str(x, y, text, fg, bg);
    }
}
