//! Software-rendered heads-up display using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌───────────────────────────────┬────────────────────┐
//! │  FINGERS                      │  GESTURES          │
//! │                               │  0: gnome-terminal │
//! │      [ big count readout ]    │  2: firefox        │
//! │                               │  5: thunderbird    │
//! │  [cooldown bar + countdown]   │                    │
//! ├───────────────────────────────┴────────────────────┤
//! │  status line                                       │
//! │  key legend                                        │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! In simulation builds the window doubles as the input device: digit
//! keys pose a synthetic hand, `N` hides it, `Esc` quits.  In camera
//! builds only `Esc` is live.

use minifb::{Key, KeyRepeat, Window, WindowOptions};

use std::sync::mpsc::Sender;
use std::time::Instant;

use crate::app::AppState;
use crate::source::SimInput;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W: usize = 560;
pub const WIN_H: usize = 400;

const TABLE_X: usize = 330;
const TABLE_W: usize = WIN_W - TABLE_X;
const STATUS_Y: usize = WIN_H - 56;

const COUNT_X: usize = 110;
const COUNT_Y: usize = 110;
const COUNT_SCALE: usize = 24;

const BAR_X: usize = 30;
const BAR_Y: usize = 280;
const BAR_W: usize = 260;
const BAR_H: usize = 16;

const BG_COLOR: u32 = 0xFF101820;
const TABLE_BG: u32 = 0xFF16242E;
const STATUS_BG: u32 = 0xFF0C2B40;
const ACCENT: u32 = 0xFF46D370; // ready / launched
const COOLDOWN_COLOR: u32 = 0xFFE0533D; // bar while suppressing
const TEXT_DIM: u32 = 0xFF7A8794;
const TEXT_MAIN: u32 = 0xFFE8EEF2;

// ════════════════════════════════════════════════════════════════════════════
// Hud
// ════════════════════════════════════════════════════════════════════════════

pub struct Hud {
    window: Window,
    buf: Vec<u32>,
    sim_tx: Sender<SimInput>,
}

impl Hud {
    pub fn new(sim_tx: Sender<SimInput>) -> Result<Self, String> {
        let mut window = Window::new(
            "Cam Launch — Finger Gesture Launcher",
            WIN_W,
            WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| e.to_string())?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Hud {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
        })
    }

    /// Returns false once the window has been closed.
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Poll keyboard input and translate it to [`SimInput`] events.
    /// Returns false when the loop should exit (Esc or window closed).
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() {
            return false;
        }

        // Esc is the designated exit key in every build.
        if self.window.is_key_pressed(Key::Escape, KeyRepeat::No) {
            let _ = self.sim_tx.send(SimInput::Quit);
            return false;
        }

        // Digit keys repeat while held, simulating a sustained gesture.
        let digits = [
            (Key::Key0, Key::NumPad0, 0u8),
            (Key::Key1, Key::NumPad1, 1),
            (Key::Key2, Key::NumPad2, 2),
            (Key::Key3, Key::NumPad3, 3),
            (Key::Key4, Key::NumPad4, 4),
            (Key::Key5, Key::NumPad5, 5),
        ];
        for (row, pad, n) in digits {
            if self.window.is_key_pressed(row, KeyRepeat::Yes)
                || self.window.is_key_pressed(pad, KeyRepeat::Yes)
            {
                let _ = self.sim_tx.send(SimInput::ShowFingers(n));
            }
        }

        if self.window.is_key_pressed(Key::N, KeyRepeat::No) {
            let _ = self.sim_tx.send(SimInput::HideHand);
        }

        true
    }

    // ── render ────────────────────────────────────────────────────────────

    pub fn render(&mut self, app: &AppState, now: Instant) {
        self.buf.fill(BG_COLOR);

        // ── count readout ─────────────────────────────────────────────────
        self.draw_text("FINGERS", 30, 26, 2, TEXT_DIM);
        match app.current_count() {
            Some(count) => {
                let digit = count.to_string();
                self.draw_text(&digit, COUNT_X, COUNT_Y, COUNT_SCALE, TEXT_MAIN);
            }
            None => {
                self.draw_text("NO HAND", 60, COUNT_Y + 40, 5, TEXT_DIM);
            }
        }

        // ── cooldown bar ──────────────────────────────────────────────────
        let cooldown = app.dispatcher().cooldown();
        match app.dispatcher().cooldown_remaining(now) {
            Some(left) => {
                let frac = left.as_secs_f32() / cooldown.as_secs_f32().max(f32::EPSILON);
                let w = (BAR_W as f32 * frac.clamp(0.0, 1.0)) as usize;
                self.rect_outline(BAR_X, BAR_Y, BAR_W, BAR_H, TEXT_DIM);
                self.fill_rect(BAR_X, BAR_Y, w, BAR_H, COOLDOWN_COLOR);
                let label = format!("COOLDOWN {:.1}S", left.as_secs_f32());
                self.draw_text(&label, BAR_X, BAR_Y + BAR_H + 8, 2, COOLDOWN_COLOR);
            }
            None => {
                self.rect_outline(BAR_X, BAR_Y, BAR_W, BAR_H, TEXT_DIM);
                self.draw_text("READY", BAR_X, BAR_Y + BAR_H + 8, 2, ACCENT);
            }
        }

        // ── gesture table ─────────────────────────────────────────────────
        self.fill_rect(TABLE_X, 0, TABLE_W, STATUS_Y, TABLE_BG);
        self.draw_text("GESTURES", TABLE_X + 12, 26, 2, ACCENT);
        let mut y = 56;
        for (count, command) in app.dispatcher().map().iter() {
            let line = format!("{}: {}", count, command);
            self.draw_text(&truncate(&line, 26), TABLE_X + 12, y, 2, TEXT_MAIN);
            y += 22;
            if y + 22 > STATUS_Y {
                break;
            }
        }

        // ── status bar + key legend ───────────────────────────────────────
        self.fill_rect(0, STATUS_Y, WIN_W, WIN_H - STATUS_Y, STATUS_BG);
        self.draw_text(&truncate(&app.status, 66), 12, STATUS_Y + 10, 2, TEXT_MAIN);
        let legend = if cfg!(feature = "camera") {
            "ESC = QUIT"
        } else {
            "0-5 = SHOW FINGERS   N = NO HAND   ESC = QUIT"
        };
        self.draw_text(legend, 12, WIN_H - 16, 1, TEXT_DIM);

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── primitive drawing helpers ─────────────────────────────────────────

    fn px(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(WIN_H) {
            for col in x..(x + w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn rect_outline(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for col in x..(x + w).min(WIN_W) {
            self.px(col, y, color);
            self.px(col, y + h - 1, color);
        }
        for row in y..(y + h).min(WIN_H) {
            self.px(x, row, color);
            self.px(x + w - 1, row, color);
        }
    }

    /// Render `text` in the built-in 3×5 bitmap font, each font pixel
    /// drawn as a `scale`×`scale` block.
    fn draw_text(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let rows = glyph(ch);
            for (r, bits) in rows.iter().enumerate() {
                for c in 0..3usize {
                    if bits & (1 << (2 - c)) != 0 {
                        self.fill_rect(cx + c * scale, y + r * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx + 4 * scale > WIN_W {
                break;
            }
        }
    }
}

/// Clip a line to `max` characters for the fixed-width panels.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max.saturating_sub(1)).chain(['~']).collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '~' => [0b000, 0b001, 0b111, 0b100, 0b000],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _ => [0b101, 0b010, 0b101, 0b010, 0b101], // unknown: checker block
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_lines() {
        assert_eq!(truncate("firefox", 20), "firefox");
    }

    #[test]
    fn truncate_marks_clipped_lines() {
        let t = truncate("a very long command line indeed", 10);
        assert_eq!(t.chars().count(), 10);
        assert!(t.ends_with('~'));
    }

    #[test]
    fn every_legend_char_has_a_glyph() {
        // The legend and labels must never hit the fallback box.
        for ch in "0-5 = SHOW FINGERS N = NO HAND ESC = QUIT READY COOLDOWN .13".chars() {
            assert_ne!(
                glyph(ch),
                [0b101, 0b010, 0b101, 0b010, 0b101],
                "missing glyph for {:?}",
                ch
            );
        }
    }
}
