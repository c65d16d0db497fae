//! Segment: the fundamental rendering unit.
//!
//! A segment is a styled chunk of text, the atomic unit that gets written
//! to the terminal. Segments are immutable and are combined into [`Strip`]s
//! (one strip per rendered row).
//!
//! [`Strip`]: crate::strip::Strip

use crossterm::style::Color;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Rendering style for a segment.
///
/// The default style is the "null" style: no colors, no attributes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Style {
    /// Foreground (text) color.
    pub fg: Option<Color>,
    /// Background color.
    pub bg: Option<Color>,
    /// Bold/increased intensity.
    pub bold: bool,
    /// Dim/decreased intensity.
    pub dim: bool,
    /// Italic text.
    pub italic: bool,
    /// Underlined text.
    pub underline: bool,
    /// Strikethrough text.
    pub strike: bool,
    /// Reverse video (swap fg/bg).
    pub reverse: bool,
}

impl Style {
    /// Creates a new style with the specified foreground color.
    pub fn with_fg(fg: Color) -> Self {
        Self {
            fg: Some(fg),
            ..Default::default()
        }
    }

    /// Creates a new style with the specified background color.
    pub fn with_bg(bg: Color) -> Self {
        Self {
            bg: Some(bg),
            ..Default::default()
        }
    }

    /// Returns true if no style properties are set.
    pub fn is_null(&self) -> bool {
        *self == Style::default()
    }
}

/// A styled text chunk.
///
/// Segments are immutable building blocks that combine text with styling.
/// They are collected into strips (horizontal lines) for rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    /// The text content.
    text: String,
    /// Optional styling for this segment.
    style: Option<Style>,
}

impl Segment {
    /// Creates a new segment with the given text and no style.
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            style: None,
        }
    }

    /// Creates a new segment with the given text and style.
    pub fn styled<S: Into<String>>(text: S, style: Style) -> Self {
        Self {
            text: text.into(),
            style: Some(style),
        }
    }

    /// Creates a blank segment of spaces with the given width and style.
    pub fn blank(width: usize, style: Option<Style>) -> Self {
        Self {
            text: " ".repeat(width),
            style,
        }
    }

    /// Returns the text content.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the style, if any.
    pub fn style(&self) -> Option<&Style> {
        self.style.as_ref()
    }

    /// Returns the terminal cell width of this segment.
    ///
    /// Uses Unicode width calculation to handle wide characters (CJK,
    /// emoji, etc.) correctly. Each terminal cell is one unit.
    pub fn cell_length(&self) -> usize {
        self.text.width()
    }

    /// Returns true if the segment is empty (no text).
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Splits the segment at a cell position.
    ///
    /// Returns two segments: one containing cells `0..cut`, another
    /// containing `cut..end`. The split respects character boundaries, so
    /// splitting in the middle of a wide character keeps the full character
    /// in the left segment.
    pub fn split_at(&self, cut: usize) -> (Segment, Segment) {
        if cut == 0 {
            return (
                Segment {
                    text: String::new(),
                    style: self.style,
                },
                self.clone(),
            );
        }

        if cut >= self.cell_length() {
            return (
                self.clone(),
                Segment {
                    text: String::new(),
                    style: self.style,
                },
            );
        }

        // Find the byte position corresponding to the cell position
        let mut cell_pos = 0;
        let mut byte_pos = 0;

        for (idx, ch) in self.text.char_indices() {
            if cell_pos >= cut {
                byte_pos = idx;
                break;
            }
            cell_pos += ch.width().unwrap_or(0);
            byte_pos = idx + ch.len_utf8();
        }

        let (left_text, right_text) = self.text.split_at(byte_pos);

        (
            Segment {
                text: left_text.to_string(),
                style: self.style,
            },
            Segment {
                text: right_text.to_string(),
                style: self.style,
            },
        )
    }
}

impl Default for Segment {
    fn default() -> Self {
        Self::new("")
    }
}
