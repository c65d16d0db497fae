//! Strip: an immutable horizontal line of segments.
//!
//! Strips represent a single rendered row of a widget. The compositor
//! slices them at cut columns (`divide`), reassembles per-row fragments
//! (`join`), and trims them to span intervals (`crop`).

use crate::segment::{Segment, Style};
use smallvec::{SmallVec, smallvec};

/// Inline storage for 2 segments covers most common rows:
/// a single styled run, or a styled run plus background padding.
pub type SegmentVec = SmallVec<[Segment; 2]>;

/// An immutable horizontal line of segments.
///
/// Strips track their total cell width so layout operations never have to
/// re-measure text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Strip {
    segments: SegmentVec,
    /// Cached total cell width.
    cell_length: usize,
}

impl Strip {
    /// Creates an empty strip.
    pub fn new() -> Self {
        Self {
            segments: SegmentVec::new(),
            cell_length: 0,
        }
    }

    /// Creates a strip from a Vec of segments.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        let cell_length = segments.iter().map(|s| s.cell_length()).sum();
        Self {
            segments: SegmentVec::from_vec(segments),
            cell_length,
        }
    }

    /// Internal constructor from a pre-built SegmentVec.
    fn from_smallvec(segments: SegmentVec) -> Self {
        let cell_length = segments.iter().map(|s| s.cell_length()).sum();
        Self {
            segments,
            cell_length,
        }
    }

    /// Creates a strip from a single segment.
    pub fn from_segment(segment: Segment) -> Self {
        let cell_length = segment.cell_length();
        Self {
            segments: smallvec![segment],
            cell_length,
        }
    }

    /// Creates a blank strip of spaces with the given width and style.
    pub fn blank(width: usize, style: Option<Style>) -> Self {
        if width == 0 {
            return Self::new();
        }
        Self::from_segment(Segment::blank(width, style))
    }

    /// Returns the segments in this strip.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the total cell width of this strip.
    pub fn cell_length(&self) -> usize {
        self.cell_length
    }

    /// Returns true if the strip is empty.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() || self.cell_length == 0
    }

    /// Returns the text content of this strip without styling.
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text()).collect()
    }

    /// Extracts a portion of the strip from `start` to `end` cell positions.
    ///
    /// The resulting strip contains cells in the range `[start, end)`.
    pub fn crop(&self, start: usize, end: usize) -> Strip {
        if start >= end || start >= self.cell_length {
            return Strip::new();
        }

        let end = end.min(self.cell_length);
        let mut result_segments = SegmentVec::new();
        let mut current_pos = 0;

        for segment in &self.segments {
            let seg_len = segment.cell_length();
            let seg_end = current_pos + seg_len;

            // Skip segments entirely before start
            if seg_end <= start {
                current_pos = seg_end;
                continue;
            }

            // Stop after end
            if current_pos >= end {
                break;
            }

            let local_start = start.saturating_sub(current_pos);
            let local_end = (end - current_pos).min(seg_len);

            if local_start == 0 && local_end == seg_len {
                result_segments.push(segment.clone());
            } else if local_start == 0 {
                let (left, _) = segment.split_at(local_end);
                if !left.is_empty() {
                    result_segments.push(left);
                }
            } else if local_end == seg_len {
                let (_, right) = segment.split_at(local_start);
                if !right.is_empty() {
                    result_segments.push(right);
                }
            } else {
                let (_, temp) = segment.split_at(local_start);
                let (middle, _) = temp.split_at(local_end - local_start);
                if !middle.is_empty() {
                    result_segments.push(middle);
                }
            }

            current_pos = seg_end;
        }

        Strip::from_smallvec(result_segments)
    }

    /// Splits the strip at the given cell positions.
    ///
    /// Returns one strip for each interval between cuts. A final cut equal
    /// to the strip's cell length produces no trailing remainder.
    pub fn divide(&self, cuts: &[usize]) -> Vec<Strip> {
        if cuts.is_empty() {
            return vec![self.clone()];
        }

        let mut result = Vec::with_capacity(cuts.len() + 1);
        let mut last = 0;

        for &cut in cuts {
            if cut > last && cut <= self.cell_length {
                result.push(self.crop(last, cut));
                last = cut;
            }
        }

        if last < self.cell_length {
            result.push(self.crop(last, self.cell_length));
        }

        result
    }

    /// Concatenates multiple strips into one.
    pub fn join(strips: impl IntoIterator<Item = Strip>) -> Strip {
        let mut segments = SegmentVec::new();
        for strip in strips {
            segments.extend(strip.segments);
        }
        Strip::from_smallvec(segments)
    }

    /// Adjusts the strip to exactly the given length.
    ///
    /// If shorter, pads with spaces using the provided style.
    /// If longer, crops to fit.
    pub fn adjust_cell_length(&self, length: usize, pad_style: Option<Style>) -> Strip {
        match self.cell_length.cmp(&length) {
            std::cmp::Ordering::Equal => self.clone(),
            std::cmp::Ordering::Greater => self.crop(0, length),
            std::cmp::Ordering::Less => {
                let padding = Segment::blank(length - self.cell_length, pad_style);
                let mut segments = self.segments.clone();
                segments.push(padding);
                Strip::from_smallvec(segments)
            }
        }
    }

    /// Merges adjacent segments with identical styles.
    pub fn simplify(&self) -> Strip {
        if self.segments.len() <= 1 {
            return self.clone();
        }

        let mut result = SegmentVec::new();
        let mut current_text = String::new();
        let mut current_style: Option<Style> = None;
        let mut has_current = false;

        for segment in &self.segments {
            if !has_current {
                current_text = segment.text().to_string();
                current_style = segment.style().copied();
                has_current = true;
            } else if segment.style() == current_style.as_ref() {
                current_text.push_str(segment.text());
            } else {
                if !current_text.is_empty() {
                    match current_style {
                        Some(style) => result.push(Segment::styled(current_text, style)),
                        None => result.push(Segment::new(current_text)),
                    }
                }
                current_text = segment.text().to_string();
                current_style = segment.style().copied();
            }
        }

        if !current_text.is_empty() {
            match current_style {
                Some(style) => result.push(Segment::styled(current_text, style)),
                None => result.push(Segment::new(current_text)),
            }
        }

        Strip::from_smallvec(result)
    }
}
