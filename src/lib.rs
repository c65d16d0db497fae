//! Screen compositing for terminal user interfaces.
//!
//! The compositor combines a tree of nested, possibly scrollable widgets
//! into a single screen. It stores the results of that process (the
//! absolute region, paint order, and clip of every widget) so the
//! surrounding toolkit can answer queries about the widget or style under
//! a coordinate. It can also render just the portions of the screen which
//! have updated, without repainting everything.
//!
//! Widgets themselves live outside this crate; the [`widget::Widget`]
//! trait defines the contract the compositor consumes from them.

pub mod compositor;
pub mod context;
pub mod error;
pub mod geometry;
pub mod segment;
pub mod strip;
pub mod testing;
pub mod update;
pub mod widget;

pub use compositor::{
    Compositor, CompositorMap, MapGeometry, PaintOrder, ReflowResult, regions_to_spans,
};
pub use context::{ScreenStackGuard, visible_screen_stack};
pub use error::{CompositorError, Result};
pub use geometry::{Offset, Region, Size, Spacing};
pub use segment::{Segment, Style};
pub use strip::Strip;
pub use update::{ChopsUpdate, DrawCommand, LayoutUpdate, ScreenUpdate};
pub use widget::{
    ArrangeResult, Placement, Scalar, ScalarOffset, Unit, Visibility, Widget, WidgetRef,
};

// Re-export the log crate so embedders can use a single logging facade.
pub use log;
