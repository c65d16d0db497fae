//! Renderable screen updates.
//!
//! The compositor produces one of two update shapes: a [`LayoutUpdate`]
//! repainting a whole region row by row, or a [`ChopsUpdate`] patching
//! only the spans of the screen that changed. Both decompose into a
//! stream of [`DrawCommand`]s, which the terminal writer turns into
//! cursor moves and styled text.

use std::io::{self, Write};

use crossterm::{
    cursor, queue,
    style::{Attribute, Color, SetAttribute, SetBackgroundColor, SetForegroundColor},
};

use crate::geometry::Region;
use crate::segment::{Segment, Style};
use crate::strip::Strip;

/// One step of emitting an update to the terminal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrawCommand {
    /// Move the cursor to an absolute cell.
    MoveTo(i32, i32),
    /// Emit a styled text run at the cursor.
    Text(Segment),
    /// Row separator; not emitted after the final row.
    NewLine,
}

/// A renderable containing the result of a render for a given region.
///
/// Emits each row as a cursor move to the region's left edge followed by
/// the row's strip.
#[derive(Clone, Debug)]
pub struct LayoutUpdate {
    strips: Vec<Strip>,
    region: Region,
}

impl LayoutUpdate {
    pub fn new(strips: Vec<Strip>, region: Region) -> Self {
        Self { strips, region }
    }

    /// The rendered rows, top to bottom.
    pub fn strips(&self) -> &[Strip] {
        &self.strips
    }

    /// The region the update covers.
    pub fn region(&self) -> Region {
        self.region
    }

    /// Decompose into draw commands.
    pub fn commands(&self) -> Vec<DrawCommand> {
        let x = self.region.x;
        let last = self.strips.len().saturating_sub(1);
        let mut commands = Vec::new();
        for (index, strip) in self.strips.iter().enumerate() {
            let y = self.region.y + index as i32;
            commands.push(DrawCommand::MoveTo(x, y));
            for segment in strip.segments() {
                commands.push(DrawCommand::Text(segment.clone()));
            }
            if index != last {
                commands.push(DrawCommand::NewLine);
            }
        }
        commands
    }

    /// Write the update to a terminal.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write_commands(&self.commands(), out)
    }
}

/// A renderable that applies updated spans to the screen.
///
/// Walks the dirty spans and, for every chop fragment overlapping a
/// span, emits the overlapping cells with a cursor move to the first
/// emitted column. Fragments straddling a span edge are sliced to the
/// overlap.
#[derive(Clone, Debug)]
pub struct ChopsUpdate {
    /// Per row: the strip fragment painted at each cut column (parallel
    /// to the row's cut list, one slot per cut except the last).
    chops: Vec<Vec<Option<Strip>>>,
    /// The dirty spans `(y, x1, x2)` to paint.
    spans: Vec<(i32, i32, i32)>,
    /// The cut columns for every row.
    cuts: Vec<Vec<i32>>,
}

impl ChopsUpdate {
    pub fn new(
        chops: Vec<Vec<Option<Strip>>>,
        spans: Vec<(i32, i32, i32)>,
        cuts: Vec<Vec<i32>>,
    ) -> Self {
        Self { chops, spans, cuts }
    }

    /// The spans this update paints.
    pub fn spans(&self) -> &[(i32, i32, i32)] {
        &self.spans
    }

    /// Decompose into draw commands.
    pub fn commands(&self) -> Vec<DrawCommand> {
        let mut commands = Vec::new();
        let Some(&(last_y, _, _)) = self.spans.last() else {
            return commands;
        };

        for &(y, x1, x2) in &self.spans {
            if y < 0 || y as usize >= self.chops.len() {
                continue;
            }
            let row = y as usize;
            let line = &self.chops[row];
            let cuts = &self.cuts[row];

            for (slot, strip) in line.iter().enumerate() {
                let Some(strip) = strip else { continue };
                let x = cuts[slot];
                let end = cuts[slot + 1];

                // Skip chops entirely outside the span.
                if x > x2 || end <= x1 {
                    continue;
                }

                if x >= x1 && end <= x2 {
                    // The whole fragment is inside the span.
                    commands.push(DrawCommand::MoveTo(x, y));
                    for segment in strip.segments() {
                        commands.push(DrawCommand::Text(segment.clone()));
                    }
                } else {
                    // The fragment straddles a span edge: emit only the
                    // cells within [max(x, x1), min(end, x2)).
                    let emit_start = x.max(x1);
                    let emit_end = end.min(x2);
                    if emit_start >= emit_end {
                        continue;
                    }
                    let sliced =
                        strip.crop((emit_start - x) as usize, (emit_end - x) as usize);
                    if sliced.is_empty() {
                        continue;
                    }
                    commands.push(DrawCommand::MoveTo(emit_start, y));
                    for segment in sliced.segments() {
                        commands.push(DrawCommand::Text(segment.clone()));
                    }
                }
            }

            if y != last_y {
                commands.push(DrawCommand::NewLine);
            }
        }
        commands
    }

    /// Write the update to a terminal.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write_commands(&self.commands(), out)
    }
}

/// Either kind of screen update.
#[derive(Clone, Debug)]
pub enum ScreenUpdate {
    Full(LayoutUpdate),
    Partial(ChopsUpdate),
}

impl ScreenUpdate {
    /// Decompose into draw commands.
    pub fn commands(&self) -> Vec<DrawCommand> {
        match self {
            ScreenUpdate::Full(update) => update.commands(),
            ScreenUpdate::Partial(update) => update.commands(),
        }
    }

    /// Write the update to a terminal.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match self {
            ScreenUpdate::Full(update) => update.write_to(out),
            ScreenUpdate::Partial(update) => update.write_to(out),
        }
    }
}

/// Emit draw commands as terminal escape sequences.
///
/// Colors and attributes are reset up front and re-issued only when they
/// change between segments, keeping the byte stream small.
fn write_commands<W: Write>(commands: &[DrawCommand], out: &mut W) -> io::Result<()> {
    queue!(
        out,
        SetForegroundColor(Color::Reset),
        SetBackgroundColor(Color::Reset),
        SetAttribute(Attribute::Reset)
    )?;
    let mut last_style = Style::default();

    for command in commands {
        match command {
            DrawCommand::MoveTo(x, y) => {
                queue!(out, cursor::MoveTo((*x).max(0) as u16, (*y).max(0) as u16))?;
            }
            DrawCommand::NewLine => {
                out.write_all(b"\n")?;
            }
            DrawCommand::Text(segment) => {
                let style = segment.style().copied().unwrap_or_default();
                if style != last_style {
                    // An attribute reset clears colors too, so re-issue both.
                    queue!(out, SetAttribute(Attribute::Reset))?;
                    if style.bold {
                        queue!(out, SetAttribute(Attribute::Bold))?;
                    }
                    if style.dim {
                        queue!(out, SetAttribute(Attribute::Dim))?;
                    }
                    if style.italic {
                        queue!(out, SetAttribute(Attribute::Italic))?;
                    }
                    if style.underline {
                        queue!(out, SetAttribute(Attribute::Underlined))?;
                    }
                    if style.strike {
                        queue!(out, SetAttribute(Attribute::CrossedOut))?;
                    }
                    if style.reverse {
                        queue!(out, SetAttribute(Attribute::Reverse))?;
                    }
                    queue!(out, SetForegroundColor(style.fg.unwrap_or(Color::Reset)))?;
                    queue!(out, SetBackgroundColor(style.bg.unwrap_or(Color::Reset)))?;
                    last_style = style;
                }
                out.write_all(segment.text().as_bytes())?;
            }
        }
    }
    Ok(())
}
