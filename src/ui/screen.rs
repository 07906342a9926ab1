use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{
        Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
        enable_raw_mode, size,
    },
};
use std::io::{self, Write, stdout};

/// Cell-buffer terminal renderer.
///
/// Draw calls mutate an off-screen buffer; `render` repaints the whole
/// frame. In plain mode (no alternate screen) nothing is ever painted and
/// output degrades to line printing by the caller.
pub struct Screen {
    width: u16,
    height: u16,
    buffer: Vec<Vec<Cell>>,
    interactive: bool,
}

#[derive(Clone)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
    pub bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: None,
            bold: false,
        }
    }
}

impl Screen {
    /// Enter raw mode and the alternate screen. Bracketed paste is enabled
    /// so dropped/pasted file paths arrive as one event.
    pub fn new(interactive: bool) -> io::Result<Self> {
        let (width, height) = size().unwrap_or((80, 24));

        if interactive {
            enable_raw_mode()?;
            execute!(stdout(), EnterAlternateScreen, EnableBracketedPaste, Hide)?;
        }

        let buffer = vec![vec![Cell::default(); width as usize]; height as usize];

        Ok(Self {
            width,
            height,
            buffer,
            interactive,
        })
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Clear the whole buffer.
    pub fn clear(&mut self) {
        for row in &mut self.buffer {
            for cell in row {
                *cell = Cell::default();
            }
        }
    }

    /// Clear a horizontal band of rows.
    pub fn clear_rows(&mut self, from: u16, to: u16) {
        for y in from..to.min(self.height) {
            for cell in &mut self.buffer[y as usize] {
                *cell = Cell::default();
            }
        }
    }

    pub fn set(&mut self, x: i32, y: i32, ch: char, fg: Option<Color>, bold: bool) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            self.buffer[y as usize][x as usize] = Cell { ch, fg, bold };
        }
    }

    pub fn set_str(&mut self, x: i32, y: i32, s: &str, fg: Option<Color>, bold: bool) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i as i32, y, ch, fg, bold);
        }
    }

    /// Repaint the buffer.
    pub fn render(&self) -> io::Result<()> {
        if !self.interactive {
            return Ok(());
        }

        let mut out = stdout();
        execute!(out, MoveTo(0, 0))?;

        for (y, row) in self.buffer.iter().enumerate() {
            execute!(out, MoveTo(0, y as u16))?;
            for cell in row {
                if cell.bold {
                    execute!(out, SetAttribute(Attribute::Bold))?;
                }
                match cell.fg {
                    Some(color) => execute!(out, SetForegroundColor(color), Print(cell.ch))?,
                    None => execute!(out, Print(cell.ch))?,
                }
                if cell.bold {
                    execute!(out, SetAttribute(Attribute::Reset))?;
                }
            }
            execute!(out, ResetColor)?;
        }

        out.flush()
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        if self.interactive {
            let _ = execute!(
                stdout(),
                Clear(ClearType::All),
                DisableBracketedPaste,
                LeaveAlternateScreen,
                Show
            );
            let _ = disable_raw_mode();
        }
    }
}
