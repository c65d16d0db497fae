//! Test utilities for asserting rendered output.
//!
//! [`ScreenBuffer`] is an in-memory cell grid that applies the draw
//! commands produced by screen updates, so tests can check exactly which
//! cells an update painted without a terminal.

use unicode_width::UnicodeWidthChar;

use crate::segment::Style;
use crate::update::{DrawCommand, ScreenUpdate};

/// An in-memory cell grid for tests.
///
/// Cells untouched by any update keep their fill character, which makes
/// it easy to assert that a partial update left the rest of the screen
/// alone.
pub struct ScreenBuffer {
    width: i32,
    height: i32,
    cells: Vec<char>,
    styles: Vec<Style>,
    cursor_x: i32,
    cursor_y: i32,
}

impl ScreenBuffer {
    /// Create a buffer filled with spaces.
    pub fn new(width: i32, height: i32) -> Self {
        Self::filled(width, height, ' ')
    }

    /// Create a buffer filled with the given character.
    pub fn filled(width: i32, height: i32, fill: char) -> Self {
        let area = (width.max(0) * height.max(0)) as usize;
        Self {
            width: width.max(0),
            height: height.max(0),
            cells: vec![fill; area],
            styles: vec![Style::default(); area],
            cursor_x: 0,
            cursor_y: 0,
        }
    }

    /// Apply a stream of draw commands.
    pub fn apply(&mut self, commands: &[DrawCommand]) {
        for command in commands {
            match command {
                DrawCommand::MoveTo(x, y) => {
                    self.cursor_x = *x;
                    self.cursor_y = *y;
                }
                DrawCommand::NewLine => {}
                DrawCommand::Text(segment) => {
                    let style = segment.style().copied().unwrap_or_default();
                    for ch in segment.text().chars() {
                        let cell_width = ch.width().unwrap_or(0) as i32;
                        self.put(self.cursor_x, self.cursor_y, ch, style);
                        self.cursor_x += cell_width;
                    }
                }
            }
        }
    }

    /// Apply a whole screen update.
    pub fn apply_update(&mut self, update: &ScreenUpdate) {
        self.apply(&update.commands());
    }

    fn put(&mut self, x: i32, y: i32, ch: char, style: Style) {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return;
        }
        let index = (y * self.width + x) as usize;
        self.cells[index] = ch;
        self.styles[index] = style;
    }

    /// The character at (x, y), or `'\0'` when out of bounds.
    pub fn get_char(&self, x: i32, y: i32) -> char {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return '\0';
        }
        self.cells[(y * self.width + x) as usize]
    }

    /// The style at (x, y), or the null style when out of bounds.
    pub fn style_at(&self, x: i32, y: i32) -> Style {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return Style::default();
        }
        self.styles[(y * self.width + x) as usize]
    }

    /// All characters in a row as a string.
    pub fn row_str(&self, y: i32) -> String {
        if y < 0 || y >= self.height {
            return String::new();
        }
        let start = (y * self.width) as usize;
        let end = start + self.width as usize;
        self.cells[start..end].iter().collect()
    }

    /// Every row joined with newlines.
    pub fn to_text(&self) -> String {
        (0..self.height)
            .map(|y| self.row_str(y))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
