//! Shared fixture widgets for the compositor integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use tui_compositor::geometry::{Offset, Region, Size, Spacing};
use tui_compositor::segment::{Segment, Style};
use tui_compositor::strip::Strip;
use tui_compositor::widget::{
    ArrangeResult, Placement, ScalarOffset, Visibility, Widget, WidgetRef,
};

/// Wrap a fixture widget, keeping a typed handle for test-side mutation.
pub fn widget_pair<W: Widget + 'static>(widget: W) -> (Rc<W>, WidgetRef) {
    let rc = Rc::new(widget);
    (rc.clone(), WidgetRef::from_rc(rc))
}

/// A placement with no margin, z 0, not fixed.
pub fn placement(widget: &WidgetRef, region: Region) -> Placement {
    Placement {
        region,
        margin: Spacing::ZERO,
        widget: widget.clone(),
        z: 0,
        fixed: false,
    }
}

// =============================================================================
// Fill: a leaf widget that fills its region with one character
// =============================================================================

/// Records the regions it is asked to render and drains an explicit
/// repaint queue, so tests can drive `update_widgets`.
pub struct Fill {
    name: String,
    ch: char,
    style: Style,
    visibility: Option<Visibility>,
    opacity: f32,
    layer: String,
    offset: ScalarOffset,
    rendered: RefCell<Vec<Region>>,
    repaint: RefCell<Vec<Region>>,
}

impl Fill {
    pub fn new(name: &str, ch: char) -> Self {
        Self {
            name: name.to_string(),
            ch,
            style: Style::default(),
            visibility: None,
            opacity: 1.0,
            layer: String::new(),
            offset: ScalarOffset::NULL,
            rendered: RefCell::new(Vec::new()),
            repaint: RefCell::new(Vec::new()),
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_layer(mut self, layer: &str) -> Self {
        self.layer = layer.to_string();
        self
    }

    pub fn with_offset(mut self, offset: ScalarOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Queue a widget-local region for repaint.
    pub fn queue_repaint(&self, region: Region) {
        self.repaint.borrow_mut().push(region);
    }

    /// The regions `render_lines` was called with, in order.
    pub fn rendered_regions(&self) -> Vec<Region> {
        self.rendered.borrow().clone()
    }
}

impl Widget for Fill {
    fn name(&self) -> &str {
        &self.name
    }

    fn visibility(&self) -> Option<Visibility> {
        self.visibility
    }

    fn opacity(&self) -> f32 {
        self.opacity
    }

    fn layer(&self) -> &str {
        &self.layer
    }

    fn offset(&self) -> ScalarOffset {
        self.offset
    }

    fn render_lines(&self, region: Region) -> Vec<Strip> {
        self.rendered.borrow_mut().push(region);
        let text: String = self.ch.to_string().repeat(region.width.max(0) as usize);
        (0..region.height.max(0))
            .map(|_| Strip::from_segment(Segment::styled(text.clone(), self.style)))
            .collect()
    }

    fn exchange_repaint_regions(&self) -> Vec<Region> {
        std::mem::take(&mut *self.repaint.borrow_mut())
    }
}

// =============================================================================
// Pane: a scrollable container with explicit placements
// =============================================================================

pub struct Pane {
    name: String,
    ch: char,
    style: Style,
    placements: RefCell<Vec<Placement>>,
    scroll_offset: RefCell<Offset>,
    layers: Vec<String>,
    scroll_spacing: Spacing,
    gutter: Spacing,
    visibility: Option<Visibility>,
    /// Vertical scrollbar chrome and the columns reserved for it.
    scrollbar: Option<(WidgetRef, i32)>,
    repaint: RefCell<Vec<Region>>,
}

impl Pane {
    pub fn new(name: &str, ch: char, placements: Vec<Placement>) -> Self {
        Self {
            name: name.to_string(),
            ch,
            style: Style::default(),
            placements: RefCell::new(placements),
            scroll_offset: RefCell::new(Offset::ZERO),
            layers: Vec::new(),
            scroll_spacing: Spacing::ZERO,
            gutter: Spacing::ZERO,
            visibility: None,
            scrollbar: None,
            repaint: RefCell::new(Vec::new()),
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_scroll_offset(self, offset: Offset) -> Self {
        *self.scroll_offset.borrow_mut() = offset;
        self
    }

    pub fn with_layers(mut self, layers: &[&str]) -> Self {
        self.layers = layers.iter().map(|name| name.to_string()).collect();
        self
    }

    pub fn with_scroll_spacing(mut self, spacing: Spacing) -> Self {
        self.scroll_spacing = spacing;
        self
    }

    pub fn with_gutter(mut self, gutter: Spacing) -> Self {
        self.gutter = gutter;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn with_vertical_scrollbar(mut self, chrome: WidgetRef, columns: i32) -> Self {
        self.scrollbar = Some((chrome, columns));
        self
    }

    pub fn set_scroll_offset(&self, offset: Offset) {
        *self.scroll_offset.borrow_mut() = offset;
    }

    pub fn set_placements(&self, placements: Vec<Placement>) {
        *self.placements.borrow_mut() = placements;
    }

    /// Queue a widget-local region for repaint.
    pub fn queue_repaint(&self, region: Region) {
        self.repaint.borrow_mut().push(region);
    }
}

impl Widget for Pane {
    fn name(&self) -> &str {
        &self.name
    }

    fn visibility(&self) -> Option<Visibility> {
        self.visibility
    }

    fn is_scrollable(&self) -> bool {
        true
    }

    fn is_container(&self) -> bool {
        true
    }

    fn layers(&self) -> Vec<String> {
        self.layers.clone()
    }

    fn gutter(&self) -> Spacing {
        self.gutter
    }

    fn scroll_offset(&self) -> Offset {
        *self.scroll_offset.borrow()
    }

    fn scrollbars_enabled(&self) -> (bool, bool) {
        (self.scrollbar.is_some(), false)
    }

    fn scrollable_region(&self, container_region: Region) -> Region {
        match &self.scrollbar {
            Some((_, columns)) => container_region.shrink(Spacing::new(0, *columns, 0, 0)),
            None => container_region,
        }
    }

    fn arrange(&self, _size: Size) -> ArrangeResult {
        let placements = self.placements.borrow().clone();
        let total_region =
            Region::from_union(placements.iter().map(|placement| placement.region));
        ArrangeResult {
            placements,
            total_region,
            scroll_spacing: self.scroll_spacing,
        }
    }

    fn arrange_scrollbars(&self, container_region: Region) -> Vec<(WidgetRef, Region)> {
        match &self.scrollbar {
            Some((chrome, columns)) => {
                let region = Region::new(
                    container_region.right() - columns,
                    container_region.y,
                    *columns,
                    container_region.height,
                );
                vec![(chrome.clone(), region)]
            }
            None => Vec::new(),
        }
    }

    fn render_lines(&self, region: Region) -> Vec<Strip> {
        let text: String = self.ch.to_string().repeat(region.width.max(0) as usize);
        (0..region.height.max(0))
            .map(|_| Strip::from_segment(Segment::styled(text.clone(), self.style)))
            .collect()
    }

    fn exchange_repaint_regions(&self) -> Vec<Region> {
        std::mem::take(&mut *self.repaint.borrow_mut())
    }
}
