//! The widget contract consumed by the compositor.
//!
//! Widgets live outside this crate: the toolkit implements them, styles
//! them, and mutates them between frames. The compositor only reads the
//! capabilities below while arranging and rendering, so every method the
//! arrangement does not strictly require has a default.
//!
//! Widgets are shared through [`WidgetRef`], a cheap handle whose equality
//! and hash are *identity*: two distinct widgets with identical state stay
//! distinguishable in the composition map.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::geometry::{Offset, Region, Size, Spacing};
use crate::strip::Strip;

/// Resolved value of a widget's `visibility` style rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Unit of a styled offset component.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Unit {
    /// Character cells (standard terminal units).
    #[default]
    Cells,
    /// Percentage of the widget's own dimension.
    Percent,
}

/// A single styled offset component.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Scalar {
    pub value: f32,
    pub unit: Unit,
}

impl Scalar {
    pub const ZERO: Self = Self {
        value: 0.0,
        unit: Unit::Cells,
    };

    pub fn cells(value: f32) -> Self {
        Self {
            value,
            unit: Unit::Cells,
        }
    }

    pub fn percent(value: f32) -> Self {
        Self {
            value,
            unit: Unit::Percent,
        }
    }

    /// Resolve against a concrete dimension.
    fn resolve(&self, dimension: i32) -> i32 {
        match self.unit {
            Unit::Cells => self.value.round() as i32,
            Unit::Percent => (self.value / 100.0 * dimension as f32).round() as i32,
        }
    }
}

/// A styled offset, resolved against the widget's size at layout time.
///
/// The viewport size is accepted for parity with how styles resolve
/// elsewhere in the toolkit; only percentage units consume a dimension.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScalarOffset {
    pub x: Scalar,
    pub y: Scalar,
}

impl ScalarOffset {
    pub const NULL: Self = Self {
        x: Scalar::ZERO,
        y: Scalar::ZERO,
    };

    pub fn new(x: Scalar, y: Scalar) -> Self {
        Self { x, y }
    }

    /// Returns true if resolving can only ever produce the null offset.
    pub fn is_null(&self) -> bool {
        self.x.value == 0.0 && self.y.value == 0.0
    }

    /// Resolve to a concrete offset against `(size, viewport)`.
    pub fn resolve(&self, size: Size, _viewport: Size) -> Offset {
        Offset::new(self.x.resolve(size.width), self.y.resolve(size.height))
    }
}

/// One entry of a container's arrangement: where a child goes, and how it
/// participates in scrolling and painting.
#[derive(Clone, Debug)]
pub struct Placement {
    /// The child's region relative to the container (pre-scroll).
    pub region: Region,
    /// Margin around the child, contributing to the virtual size.
    pub margin: Spacing,
    /// The child widget.
    pub widget: WidgetRef,
    /// Secondary paint key within the child's layer.
    pub z: i32,
    /// Fixed placements do not move with the scroll offset.
    pub fixed: bool,
}

/// The result of arranging a container's children.
#[derive(Clone, Debug, Default)]
pub struct ArrangeResult {
    pub placements: Vec<Placement>,
    /// The region covered by all children, relative to the container.
    pub total_region: Region,
    /// Extra spacing reserved around base-layer children while scrolling.
    pub scroll_spacing: Spacing,
}

impl ArrangeResult {
    /// Every widget placed by the arrangement, visible or not.
    pub fn widgets(&self) -> impl Iterator<Item = &WidgetRef> {
        self.placements.iter().map(|placement| &placement.widget)
    }

    /// The placements whose regions overlap the given viewport.
    pub fn visible_placements(&self, viewport: Region) -> Vec<Placement> {
        self.placements
            .iter()
            .filter(|placement| viewport.overlaps(placement.region))
            .cloned()
            .collect()
    }
}

/// A widget as seen by the compositor.
///
/// Style lookups return the widget's *resolved* style values; the styling
/// engine that computes them is not this crate's concern. Widgets needing
/// mutation during render (scroll state, repaint buffers) use interior
/// mutability, which is why every method takes `&self`.
pub trait Widget {
    /// A short name for logs and debug output.
    fn name(&self) -> &str {
        "widget"
    }

    /// The resolved `visibility` rule, or `None` when unset (inherit).
    fn visibility(&self) -> Option<Visibility> {
        None
    }

    /// Effective visibility for hit-testing; unset means visible.
    fn is_visible(&self) -> bool {
        self.visibility() != Some(Visibility::Hidden)
    }

    /// The styled layout offset. Resolved against the widget's region and
    /// clip sizes during arrangement.
    fn offset(&self) -> ScalarOffset {
        ScalarOffset::NULL
    }

    /// Opacity in `[0, 1]`; zero excludes the widget from rendering.
    fn opacity(&self) -> f32 {
        1.0
    }

    /// The name of the layer this widget paints on.
    fn layer(&self) -> &str {
        ""
    }

    /// Border plus padding, subtracted from the widget's region to form
    /// the container region.
    fn gutter(&self) -> Spacing {
        Spacing::ZERO
    }

    /// Scrollable widgets own a viewport that clips their children.
    fn is_scrollable(&self) -> bool {
        false
    }

    /// Containers arrange child placements.
    fn is_container(&self) -> bool {
        false
    }

    /// Whether the (vertical, horizontal) scrollbars are enabled.
    fn scrollbars_enabled(&self) -> (bool, bool) {
        (false, false)
    }

    /// The declared layer ordering for this widget's children.
    fn layers(&self) -> Vec<String> {
        Vec::new()
    }

    /// The current scroll offset applied to non-fixed children.
    fn scroll_offset(&self) -> Offset {
        Offset::ZERO
    }

    /// The container region minus any space reserved for scrollbars.
    fn scrollable_region(&self, container_region: Region) -> Region {
        container_region
    }

    /// Arrange children within `size`. Only called when `is_container`.
    fn arrange(&self, _size: Size) -> ArrangeResult {
        ArrangeResult::default()
    }

    /// Scrollbar chrome widgets and their absolute regions.
    fn arrange_scrollbars(&self, _container_region: Region) -> Vec<(WidgetRef, Region)> {
        Vec::new()
    }

    /// Render the requested widget-local region, one strip per row.
    fn render_lines(&self, region: Region) -> Vec<Strip>;

    /// Atomically drain the widget's pending repaint rectangles
    /// (widget-local coordinates).
    fn exchange_repaint_regions(&self) -> Vec<Region> {
        Vec::new()
    }
}

/// A shared, cheaply clonable handle to a widget.
///
/// Equality and hashing use the widget's address, so the handle can key
/// the composition map while the toolkit retains ownership of the tree.
#[derive(Clone)]
pub struct WidgetRef {
    inner: Rc<dyn Widget>,
}

impl WidgetRef {
    pub fn new<W: Widget + 'static>(widget: W) -> Self {
        Self {
            inner: Rc::new(widget),
        }
    }

    pub fn from_rc(inner: Rc<dyn Widget>) -> Self {
        Self { inner }
    }

    /// Returns true if both handles refer to the same widget.
    pub fn ptr_eq(&self, other: &WidgetRef) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.inner), Rc::as_ptr(&other.inner))
    }

    fn key(&self) -> *const () {
        Rc::as_ptr(&self.inner) as *const ()
    }
}

impl std::ops::Deref for WidgetRef {
    type Target = dyn Widget;

    fn deref(&self) -> &(dyn Widget + 'static) {
        &*self.inner
    }
}

impl PartialEq for WidgetRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for WidgetRef {}

impl Hash for WidgetRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.key() as usize).hash(state);
    }
}

impl fmt::Debug for WidgetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WidgetRef({} @ {:p})", self.inner.name(), self.key())
    }
}
