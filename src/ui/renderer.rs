/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the next frame into the `front` buffer (a grid of Cell)
///   2. Compare each cell with the `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. Batch everything with `queue!` and flush once
///   5. Swap front/back
///
/// The arena is in pixels; one terminal cell covers `PX_PER_COL` by
/// `PX_PER_ROW` pixels (terminal glyphs are about twice as tall as wide).
/// A cell is drawn as wall when any wall rect overlaps its pixel area,
/// so thin walls still show up.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::direction::Direction;
use crate::domain::geometry::{BoundingBox, Position, Rect};
use crate::domain::pickup::{FruitKind, PickupKind};
use crate::sim::world::{Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every cell, also used for Clear, so
    /// row gaps on VTE terminals match the cells.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

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
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
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
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn put_centered(&mut self, y: usize, span: usize, s: &str, fg: Color, bg: Color) {
        let len = s.chars().count();
        self.put_str(span.saturating_sub(len) / 2, y, s, fg, bg);
    }
}

// ── Layout ──

pub const PX_PER_COL: i32 = 10;
pub const PX_PER_ROW: i32 = 20;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 1;

const WALL_FG: Color = Color::Rgb { r: 60, g: 90, b: 230 };
const PELLET_FG: Color = Color::Rgb { r: 255, g: 200, b: 170 };
const PLAYER_FG: Color = Color::Rgb { r: 255, g: 230, b: 0 };
const HUD_FG: Color = Color::Rgb { r: 220, g: 220, b: 220 };
const MSG_FG: Color = Color::Rgb { r: 255, g: 220, b: 50 };
const TRAIL_FG: Color = Color::Rgb { r: 110, g: 100, b: 30 };
const TRAIL_LEN: usize = 6;
const OVERLAY_BG: Color = Color::Rgb { r: 40, g: 40, b: 40 };

const PURSUER_FG: [Color; 4] = [
    Color::Rgb { r: 255, g: 0, b: 0 },
    Color::Rgb { r: 255, g: 184, b: 255 },
    Color::Rgb { r: 0, g: 255, b: 255 },
    Color::Rgb { r: 255, g: 184, b: 82 },
];

fn cell_of(p: Position) -> (usize, usize) {
    let col = p.x.max(0) / PX_PER_COL;
    let row = p.y.max(0) / PX_PER_ROW;
    (col as usize, row as usize + MAP_ROW)
}

fn player_glyph(facing: Direction) -> char {
    match facing {
        Direction::Up => 'v',
        Direction::Down => '^',
        Direction::Left => '>',
        Direction::Right => '<',
    }
}

fn fruit_glyph(kind: FruitKind) -> (char, Color) {
    match kind {
        FruitKind::Cherry => ('%', Color::Red),
        FruitKind::Banana => ('(', Color::Yellow),
        FruitKind::Strawberry => ('&', Color::Red),
        FruitKind::Orange => ('o', Color::Rgb { r: 255, g: 165, b: 0 }),
        FruitKind::Apple => ('a', Color::Red),
        FruitKind::Melon => ('O', Color::Green),
        FruitKind::Galaxian => ('Y', Color::Blue),
        FruitKind::Bell => ('A', Color::Yellow),
        FruitKind::Key => ('k', Color::Cyan),
    }
}

/// Terminal size the arena needs, HUD and message rows included.
pub fn required_size(w: &WorldState) -> (usize, usize) {
    let cols = (w.level.width + PX_PER_COL - 1) / PX_PER_COL;
    let rows = (w.level.height + PX_PER_ROW - 1) / PX_PER_ROW;
    (cols.max(0) as usize, rows.max(0) as usize + MAP_ROW + 2)
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    frame: u64,
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
            frame: 0,
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
        // Force a full repaint on the first frame.
        self.back.cells.fill(Cell::INVALID);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.frame = self.frame.wrapping_add(1);
        self.front.clear();
        compose(&mut self.front, world, self.frame);

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colors; ResetColor would fall back to the terminal default.
        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) { continue; }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

// ── Compose: build front buffer content ──

fn compose(buf: &mut FrameBuffer, w: &WorldState, frame: u64) {
    let (map_w, map_h) = required_size(w);
    let span = map_w.min(buf.width);

    compose_hud(buf, w);
    compose_walls(buf, w);
    compose_trail(buf, w);
    compose_pickups(buf, w, frame);
    compose_actors(buf, w);

    let msg_row = map_h - 1;
    if !w.message.is_empty() {
        buf.put_centered(msg_row, span, &w.message, MSG_FG, Color::Reset);
    }

    match w.phase {
        Phase::Ready => compose_overlay(buf, span, map_h, &[
            "READY!",
            "",
            "Arrows / WASD to move",
            "P pause   R restart   Esc quit",
        ]),
        Phase::Paused => compose_overlay(buf, span, map_h, &[
            if (frame / 8) % 2 == 0 { "> PAUSED <" } else { "  PAUSED  " },
            "",
            "P  Resume",
            "R  Restart",
            "Esc  Quit",
        ]),
        Phase::GameOver => {
            let score = format!("Score {}", w.score);
            compose_overlay(buf, span, map_h, &[
                "GAME OVER",
                "",
                score.as_str(),
                "Enter retry   Esc quit",
            ]);
        }
        Phase::Cleared => {
            let score = format!("Score {}", w.score);
            compose_overlay(buf, span, map_h, &[
                "MAZE CLEARED!",
                "",
                score.as_str(),
                "Enter play again   Esc quit",
            ]);
        }
        Phase::Playing => {}
    }
}

fn compose_hud(buf: &mut FrameBuffer, w: &WorldState) {
    let fruit = match w.pickups.active_fruit() {
        Some(p) => {
            let name = match p.kind {
                PickupKind::Fruit(kind) => kind.name(),
                PickupKind::Pellet => "",
            };
            let secs = p.remaining().map_or(0, |d| d.as_secs());
            format!("  Fruit:{name} {secs}s")
        }
        None => String::new(),
    };
    let hud = format!(
        " {}  Score:{:<7}  Pellets:{:<3}{}  Seed:{}",
        w.level.name,
        w.score,
        w.pickups.pellets_remaining(),
        fruit,
        w.seed,
    );
    buf.put_str(0, HUD_ROW, &hud, HUD_FG, Color::Reset);
}

fn compose_walls(buf: &mut FrameBuffer, w: &WorldState) {
    let (cols, rows) = required_size(w);
    for row in 0..rows - MAP_ROW - 2 {
        for col in 0..cols {
            let area = Rect::new(
                col as i32 * PX_PER_COL,
                row as i32 * PX_PER_ROW,
                PX_PER_COL,
                PX_PER_ROW,
            );
            if w.field.intersects_any(&BoundingBox::from_rect(area)) {
                buf.set(col, row + MAP_ROW, Cell::new('█', WALL_FG, Color::Reset));
            }
        }
    }
}

/// Fading marks on the player's last few positions.
fn compose_trail(buf: &mut FrameBuffer, w: &WorldState) {
    let current = cell_of(w.player.position);
    let recent: Vec<_> = w.player.history().rev().take(TRAIL_LEN).collect();
    for pos in recent {
        let (col, row) = cell_of(*pos);
        if (col, row) != current {
            buf.set(col, row, Cell::new('.', TRAIL_FG, Color::Reset));
        }
    }
}

fn compose_pickups(buf: &mut FrameBuffer, w: &WorldState, frame: u64) {
    for p in w.pickups.active() {
        let (col, row) = cell_of(p.position);
        let cell = match p.kind {
            PickupKind::Pellet => Cell::new('·', PELLET_FG, Color::Reset),
            PickupKind::Fruit(kind) => {
                // Blink during the last two seconds.
                let ending = p.remaining().map_or(false, |d| d.as_secs() < 2);
                if ending && (frame / 4) % 2 == 1 { continue; }
                let (ch, fg) = fruit_glyph(kind);
                Cell::new(ch, fg, Color::Reset)
            }
        };
        buf.set(col, row, cell);
    }
}

fn compose_actors(buf: &mut FrameBuffer, w: &WorldState) {
    for p in &w.pursuers {
        let (col, row) = cell_of(p.position);
        let fg = PURSUER_FG[p.id % PURSUER_FG.len()];
        buf.set(col, row, Cell::new('M', fg, Color::Reset));
    }
    let (col, row) = cell_of(w.player.position);
    let ch = if w.phase == Phase::GameOver { 'X' } else { player_glyph(w.player.facing) };
    buf.set(col, row, Cell::new(ch, PLAYER_FG, Color::Reset));
}

fn compose_overlay(buf: &mut FrameBuffer, span: usize, map_h: usize, lines: &[&str]) {
    let box_w = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) + 4;
    let box_h = lines.len() + 2;
    let box_x = span.saturating_sub(box_w) / 2;
    let box_y = MAP_ROW + map_h.saturating_sub(MAP_ROW + box_h) / 2;

    for y in box_y..box_y + box_h {
        for x in box_x..box_x + box_w {
            buf.set(x, y, Cell::new(' ', Color::Reset, OVERLAY_BG));
        }
    }
    for (i, line) in lines.iter().enumerate() {
        let fg = if i == 0 { MSG_FG } else { HUD_FG };
        let len = line.chars().count();
        buf.put_str(box_x + (box_w - len) / 2, box_y + 1 + i, line, fg, OVERLAY_BG);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::classic;
    use crate::sim::world::Rules;

    fn frame_of(w: &WorldState) -> FrameBuffer {
        let (cols, rows) = required_size(w);
        let mut buf = FrameBuffer::new(cols, rows);
        compose(&mut buf, w, 0);
        buf
    }

    fn playing_classic() -> WorldState {
        let mut w = WorldState::new(classic(), Rules::default(), 3);
        w.phase = Phase::Playing;
        w
    }

    #[test]
    fn classic_fits_sixty_by_thirty() {
        let w = playing_classic();
        assert_eq!(required_size(&w), (60, 33));
    }

    #[test]
    fn borders_and_inner_walls_are_drawn() {
        let w = playing_classic();
        let buf = frame_of(&w);
        assert_eq!(buf.get(0, MAP_ROW).ch, '█');
        assert_eq!(buf.get(59, MAP_ROW + 29).ch, '█');
        // Wall (150,150,200,10) sits in row 7, columns 15..35.
        assert_eq!(buf.get(20, MAP_ROW + 7).ch, '█');
        assert_eq!(buf.get(20, MAP_ROW + 8).ch, ' ');
    }

    #[test]
    fn actors_and_pellets_land_on_their_cells() {
        let w = playing_classic();
        let buf = frame_of(&w);
        assert_eq!(buf.get(30, MAP_ROW + 15).ch, '<');
        assert_eq!(buf.get(10, MAP_ROW + 5).ch, 'M');
        assert_eq!(buf.get(20, MAP_ROW + 5).ch, '·');
    }

    #[test]
    fn hud_shows_score_and_pellets() {
        let mut w = playing_classic();
        w.score = 120;
        let buf = frame_of(&w);
        let hud: String = (0..buf.width).map(|x| buf.get(x, HUD_ROW).ch).collect();
        assert!(hud.contains("Classic"));
        assert!(hud.contains("Score:120"));
        assert!(hud.contains("Pellets:24"));
    }

    #[test]
    fn ready_overlay_is_centered() {
        let w = WorldState::new(classic(), Rules::default(), 3);
        let buf = frame_of(&w);
        let text: String = buf.cells.iter().map(|c| c.ch).collect();
        assert!(text.contains("READY!"));
        assert!(buf.cells.iter().any(|c| c.bg == OVERLAY_BG));
    }
}
