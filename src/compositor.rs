//! The compositor combines a tree of widgets into a single screen.
//!
//! It stores the result of that process, so the toolkit knows the widgets
//! on the screen and their locations and can answer queries about the
//! widget or style under a coordinate. It can also re-render just the
//! portions of the screen that changed, without repainting everything.
//!
//! A [`reflow`] walks the widget tree and produces the *composition map*:
//! one [`MapGeometry`] per visible widget, carrying its absolute region,
//! painting order, clip, and scroll geometry. Derived indices (visible
//! widgets, per-row layers, cut columns) are projections of that map,
//! recomputed lazily and invalidated together.
//!
//! [`reflow`]: Compositor::reflow

use std::collections::{BTreeMap, HashMap, HashSet};

use smallvec::{SmallVec, smallvec};

use crate::context::ScreenStackGuard;
use crate::error::{CompositorError, Result};
use crate::geometry::{Offset, Region, Size};
use crate::segment::Style;
use crate::strip::Strip;
use crate::update::{ChopsUpdate, LayoutUpdate, ScreenUpdate};
use crate::widget::{Visibility, WidgetRef};

/// The painting-order key of a widget: one `(layer_index, z, sibling_order)`
/// triple per ancestor, plus one for the widget itself.
///
/// Lexicographic comparison of the triples is the total paint order; a
/// larger key paints later (on top). Sibling order decreases monotonically
/// through a parent's placement list, so earlier-declared siblings sit
/// above later ones within the same layer and z.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct PaintOrder(SmallVec<[(i32, i32, i32); 4]>);

impl PaintOrder {
    /// The order assigned to the root widget.
    pub fn root() -> Self {
        Self(smallvec![(0, 0, 0)])
    }

    /// The order of a child: the parent's order with one more triple.
    pub fn child(&self, layer_index: i32, z: i32, sibling_order: i32) -> Self {
        let mut triples = self.0.clone();
        triples.push((layer_index, z, sibling_order));
        Self(triples)
    }

    /// The raw triples, outermost ancestor first.
    pub fn triples(&self) -> &[(i32, i32, i32)] {
        &self.0
    }
}

/// The absolute location of a widget within the composition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapGeometry {
    /// The screen region occupied by the widget.
    pub region: Region,
    /// The widget's painting order.
    pub order: PaintOrder,
    /// The region the widget must not paint outside of (the viewport of
    /// the nearest scrollable ancestor).
    pub clip: Region,
    /// The total scrollable content size, for scrollbar arithmetic.
    pub virtual_size: Size,
    /// The inner area excluding scrollbars.
    pub container_size: Size,
    /// The region relative to the container (pre-scroll, pre-offset).
    pub virtual_region: Region,
}

impl MapGeometry {
    /// The widget's region after clipping; empty when off-screen.
    pub fn visible_region(&self) -> Region {
        self.clip.intersection(self.region)
    }
}

/// Maps a widget to the information describing its position in the
/// composition.
pub type CompositorMap = HashMap<WidgetRef, MapGeometry>;

/// The result of a reflow operation: how the set of widgets changed.
#[derive(Debug, Default)]
pub struct ReflowResult {
    /// Widgets that are no longer in the layout.
    pub hidden: HashSet<WidgetRef>,
    /// Widgets that newly appeared in the layout.
    pub shown: HashSet<WidgetRef>,
    /// Widgets whose size changed.
    pub resized: HashSet<WidgetRef>,
}

/// Visible widgets with their region and clip, in front-to-back paint
/// order, plus an identity index for membership tests.
struct VisibleWidgets {
    entries: Vec<(WidgetRef, Region, Region)>,
    index: HashMap<WidgetRef, usize>,
}

impl VisibleWidgets {
    fn build(map: &CompositorMap, size: Size) -> Self {
        let screen = size.region();
        let mut ordered: Vec<(&WidgetRef, &MapGeometry)> = map
            .iter()
            .filter(|(_, geometry)| {
                screen.overlaps(geometry.region) && geometry.clip.overlaps(geometry.region)
            })
            .collect();
        ordered.sort_by(|(_, a), (_, b)| b.order.cmp(&a.order));
        let entries: Vec<(WidgetRef, Region, Region)> = ordered
            .into_iter()
            .map(|(widget, geometry)| (widget.clone(), geometry.region, geometry.clip))
            .collect();
        let index = entries
            .iter()
            .enumerate()
            .map(|(position, (widget, _, _))| (widget.clone(), position))
            .collect();
        Self { entries, index }
    }

    fn contains(&self, widget: &WidgetRef) -> bool {
        self.index.contains_key(widget)
    }

    fn get(&self, widget: &WidgetRef) -> Option<(Region, Region)> {
        self.index.get(widget).map(|&position| {
            let (_, region, clip) = self.entries[position];
            (region, clip)
        })
    }
}

/// Converts regions to horizontal spans `(y, x1, x2)`.
///
/// Spans on the same row are merged when they overlap or touch, producing
/// a minimal sorted sequence of non-overlapping spans that exactly covers
/// the union of the input regions.
pub fn regions_to_spans(regions: impl IntoIterator<Item = Region>) -> Vec<(i32, i32, i32)> {
    let mut inline_ranges: BTreeMap<i32, Vec<(i32, i32)>> = BTreeMap::new();
    for region in regions {
        let span = (region.x, region.x + region.width);
        for y in region.line_range() {
            inline_ranges.entry(y).or_default().push(span);
        }
    }

    let mut spans = Vec::new();
    for (y, mut ranges) in inline_ranges {
        if let [(x1, x2)] = ranges[..] {
            // Special case of 1 span
            spans.push((y, x1, x2));
            continue;
        }
        ranges.sort_unstable();
        let (mut x1, mut x2) = ranges[0];
        for &(next_x1, next_x2) in &ranges[1..] {
            if next_x1 <= x2 {
                if next_x2 > x2 {
                    x2 = next_x2;
                }
            } else {
                spans.push((y, x1, x2));
                x1 = next_x1;
                x2 = next_x2;
            }
        }
        spans.push((y, x1, x2));
    }
    spans
}

/// Responsible for storing the relative positions of widgets and
/// rendering them.
#[derive(Default)]
pub struct Compositor {
    /// Mapping of every laid-out widget to its geometry.
    full_map: CompositorMap,
    /// Set when a fast-path reflow leaves the full map stale.
    full_map_invalidated: bool,
    /// Visible-only map built by the scrolling fast path.
    visible_map: Option<CompositorMap>,

    /// All widgets considered in the arrangement. May be a superset of
    /// the map's keys, as some widgets may be invisible.
    widgets: HashSet<WidgetRef>,

    /// The top level widget.
    root: Option<WidgetRef>,

    /// Dimensions of the arrangement.
    size: Size,

    /// Regions that require an update.
    dirty_regions: HashSet<Region>,

    // Lazily derived projections of the composition map, invalidated
    // together on reflow.
    visible_widgets: Option<VisibleWidgets>,
    layers: Option<Vec<(WidgetRef, MapGeometry)>>,
    layers_visible: Option<Vec<Vec<(WidgetRef, Region, Region)>>>,
    cuts: Option<Vec<Vec<i32>>>,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The size of the last arrangement.
    pub fn size(&self) -> Size {
        self.size
    }

    /// The root widget, if a reflow has happened.
    pub fn root(&self) -> Option<&WidgetRef> {
        self.root.as_ref()
    }

    /// All widgets considered in the last arrangement.
    pub fn widgets(&self) -> &HashSet<WidgetRef> {
        &self.widgets
    }

    /// True while the full map is stale after a fast-path reflow.
    pub fn full_map_invalidated(&self) -> bool {
        self.full_map_invalidated
    }

    fn invalidate_derived(&mut self) {
        self.cuts = None;
        self.layers = None;
        self.layers_visible = None;
        self.visible_widgets = None;
    }

    /// Reflow (layout) a widget tree into the given size.
    ///
    /// Rebuilds the composition map from scratch and returns the widgets
    /// that were hidden, shown, or resized relative to the previous map.
    pub fn reflow(&mut self, root: WidgetRef, size: Size) -> ReflowResult {
        log::debug!("reflow root={} size={:?}", root.name(), size);
        self.invalidate_derived();
        self.visible_map = None;
        self.root = Some(root.clone());
        self.size = size;

        let (map, widgets) = Self::arrange_root(&root, size, false);
        let old_map = std::mem::replace(&mut self.full_map, map);
        self.full_map_invalidated = false;
        self.widgets = widgets;

        let mut shown = HashSet::new();
        let mut hidden = HashSet::new();
        let mut resized = HashSet::new();
        let mut changed_regions: Vec<Region> = Vec::new();

        for (widget, geometry) in &self.full_map {
            match old_map.get(widget) {
                None => {
                    shown.insert(widget.clone());
                    changed_regions.push(geometry.visible_region());
                }
                Some(old_geometry) if old_geometry != geometry => {
                    if old_geometry.region.size() != geometry.region.size() {
                        resized.insert(widget.clone());
                    }
                    changed_regions.push(old_geometry.visible_region());
                    changed_regions.push(geometry.visible_region());
                }
                Some(_) => {}
            }
        }
        for (widget, geometry) in &old_map {
            if !self.full_map.contains_key(widget) {
                hidden.insert(widget.clone());
                changed_regions.push(geometry.visible_region());
            }
        }

        self.mark_dirty(changed_regions);

        ReflowResult {
            hidden,
            shown,
            resized,
        }
    }

    /// Reflow only the visible children.
    ///
    /// This is a fast path for scrolling: only placements the containers
    /// report as visible are arranged, the visible map replaces the full
    /// map for queries, and the full map is flagged stale so a later
    /// access rebuilds it lazily. Returns the widgets exposed by the
    /// scroll.
    pub fn reflow_visible(&mut self, root: WidgetRef, size: Size) -> HashSet<WidgetRef> {
        log::trace!("reflow_visible root={} size={:?}", root.name(), size);
        self.invalidate_derived();
        self.full_map_invalidated = true;
        self.root = Some(root.clone());
        self.size = size;

        // Diff against the visible map when one exists, else the full
        // map. On the very first fast-path reflow neither holds anything,
        // so every visible widget reports as exposed.
        let old_map = match self.visible_map.take() {
            Some(map) => map,
            None => self.full_map.clone(),
        };
        let (map, widgets) = Self::arrange_root(&root, size, true);

        let mut exposed = HashSet::new();
        let mut changed_regions: Vec<Region> = Vec::new();
        for (widget, geometry) in &map {
            match old_map.get(widget) {
                None => {
                    exposed.insert(widget.clone());
                    changed_regions.push(geometry.visible_region());
                }
                Some(old_geometry) if old_geometry != geometry => {
                    changed_regions.push(old_geometry.visible_region());
                    changed_regions.push(geometry.visible_region());
                }
                Some(_) => {}
            }
        }
        for (widget, geometry) in &old_map {
            if !map.contains_key(widget) {
                changed_regions.push(geometry.visible_region());
            }
        }

        self.visible_map = Some(map);
        self.widgets = widgets;
        self.mark_dirty(changed_regions);
        exposed
    }

    /// Add regions to the dirty set, unless the whole screen is already
    /// pending (a full repaint covers any finer-grained update).
    fn mark_dirty(&mut self, regions: impl IntoIterator<Item = Region>) {
        if self.dirty_regions.contains(&self.size.region()) {
            return;
        }
        self.dirty_regions
            .extend(regions.into_iter().filter(|region| !region.is_empty()));
    }

    /// The composition map covering all widgets.
    ///
    /// Rebuilt lazily when a fast-path reflow left it stale; dependent
    /// caches are invalidated with it. Returns an empty map when no root
    /// has been laid out.
    pub fn full_map(&mut self) -> &CompositorMap {
        if let Some(root) = self.root.clone() {
            if self.full_map_invalidated {
                log::trace!("rebuilding stale full map");
                self.full_map_invalidated = false;
                let (map, _widgets) = Self::arrange_root(&root, self.size, false);
                self.full_map = map;
                self.visible_map = None;
                self.invalidate_derived();
            }
        }
        &self.full_map
    }

    /// Arrange a widget tree, producing the composition map and the set
    /// of all widgets considered.
    fn arrange_root(
        root: &WidgetRef,
        size: Size,
        visible_only: bool,
    ) -> (CompositorMap, HashSet<WidgetRef>) {
        let mut map = CompositorMap::new();
        let mut widgets = HashSet::new();
        Self::add_widget(
            &mut map,
            &mut widgets,
            visible_only,
            root.clone(),
            size.region(),
            size.region(),
            &PaintOrder::root(),
            0,
            size.region(),
            true,
        );
        (map, widgets)
    }

    /// Called recursively to place a widget and its children in the map.
    ///
    /// `virtual_region` is the widget's region relative to its container,
    /// `region` its absolute screen region, `clip` the viewport that
    /// contains it, and `visible` the inherited visibility (overridden by
    /// the widget's own `visibility` rule when set).
    #[allow(clippy::too_many_arguments)]
    fn add_widget(
        map: &mut CompositorMap,
        widgets: &mut HashSet<WidgetRef>,
        visible_only: bool,
        widget: WidgetRef,
        virtual_region: Region,
        region: Region,
        order: &PaintOrder,
        layer_order: i32,
        clip: Region,
        visible: bool,
    ) {
        let visible = match widget.visibility() {
            Some(Visibility::Visible) => true,
            Some(Visibility::Hidden) => false,
            None => visible,
        };
        if visible {
            widgets.insert(widget.clone());
        }

        let styles_offset = widget.offset();
        let layout_offset = if styles_offset.is_null() {
            Offset::ZERO
        } else {
            styles_offset.resolve(region.size(), clip.size())
        };

        // Container region is the widget's region minus its gutter
        // (border and padding), shifted by the styled offset.
        let container_region = region.shrink(widget.gutter()).translate(layout_offset);
        let container_size = container_region.size();

        if widget.is_scrollable() {
            // The region that contains the content (container region
            // minus any scrollbars).
            let child_region = widget.scrollable_region(container_region);
            let sub_clip = clip.intersection(child_region);
            let mut total_region = child_region.reset_offset();

            if widget.is_container() {
                let arrange_result = widget.arrange(child_region.size());
                widgets.extend(arrange_result.widgets().cloned());
                total_region = total_region.union(arrange_result.total_region);
                let scroll_spacing = arrange_result.scroll_spacing;

                let placements = if visible_only {
                    arrange_result
                        .visible_placements(container_size.region() + widget.scroll_offset())
                } else {
                    arrange_result.placements
                };

                // An offset added to all placements
                let placement_offset = container_region.offset();
                let placement_scroll_offset = placement_offset - widget.scroll_offset();

                let layer_names = widget.layers();

                for (sibling, placement) in placements.iter().enumerate().rev() {
                    let layer_index = layer_names
                        .iter()
                        .position(|name| name == placement.widget.layer())
                        .unwrap_or(0) as i32;
                    // Sibling order decreases in declaration order, so
                    // earlier-declared children paint above later ones
                    // within the same layer and z.
                    let sibling_order = layer_order - sibling as i32;

                    let widget_region = if placement.fixed {
                        placement.region + placement_offset
                    } else {
                        // Non-fixed children contribute to the virtual
                        // size; only the base layer reserves the scroll
                        // spacing.
                        let margin = if layer_index != 0 {
                            placement.margin
                        } else {
                            placement.margin + scroll_spacing
                        };
                        total_region = total_region.union(placement.region.grow(margin));
                        placement.region + placement_scroll_offset
                    };

                    let widget_order = order.child(layer_index, placement.z, sibling_order);
                    Self::add_widget(
                        map,
                        widgets,
                        visible_only,
                        placement.widget.clone(),
                        placement.region,
                        widget_region,
                        &widget_order,
                        sibling_order,
                        sub_clip,
                        visible,
                    );
                }
            }

            if visible {
                let (vertical, horizontal) = widget.scrollbars_enabled();
                if vertical || horizontal {
                    for (chrome_widget, chrome_region) in widget.arrange_scrollbars(container_region)
                    {
                        map.insert(
                            chrome_widget,
                            MapGeometry {
                                region: chrome_region,
                                order: order.clone(),
                                clip,
                                virtual_size: container_size,
                                container_size,
                                virtual_region: chrome_region,
                            },
                        );
                    }
                }

                map.insert(
                    widget,
                    MapGeometry {
                        region: region + layout_offset,
                        order: order.clone(),
                        clip,
                        virtual_size: total_region.size(),
                        container_size,
                        virtual_region,
                    },
                );
            }
        } else if visible {
            map.insert(
                widget,
                MapGeometry {
                    region: region + layout_offset,
                    order: order.clone(),
                    clip,
                    virtual_size: region.size(),
                    container_size,
                    virtual_region,
                },
            );
        }
    }

    fn visible_widgets_cache(&mut self) -> &VisibleWidgets {
        if self.visible_widgets.is_none() {
            let map = self.visible_map.as_ref().unwrap_or(&self.full_map);
            self.visible_widgets = Some(VisibleWidgets::build(map, self.size));
        }
        self.visible_widgets.as_ref().expect("cache populated above")
    }

    /// Visible widgets with their region and clip, in front-to-back
    /// paint order.
    ///
    /// A widget qualifies when its region overlaps the screen and its
    /// region and clip intersect.
    pub fn visible_widgets(&mut self) -> &[(WidgetRef, Region, Region)] {
        &self.visible_widgets_cache().entries
    }

    /// Widgets and geometry sorted front-to-back.
    pub fn layers(&mut self) -> &[(WidgetRef, MapGeometry)] {
        if self.layers.is_none() {
            let map = self.visible_map.as_ref().unwrap_or(&self.full_map);
            let mut layers: Vec<(WidgetRef, MapGeometry)> = map
                .iter()
                .map(|(widget, geometry)| (widget.clone(), geometry.clone()))
                .collect();
            layers.sort_by(|(_, a), (_, b)| b.order.cmp(&a.order));
            self.layers = Some(layers);
        }
        self.layers.as_deref().expect("cache populated above")
    }

    /// Visible widgets grouped by row: for each `y`, the widgets covering
    /// that row with their cropped and full regions, front-to-back.
    pub fn layers_visible(&mut self) -> &[Vec<(WidgetRef, Region, Region)>] {
        if self.layers_visible.is_none() {
            let height = self.size.height.max(0) as usize;
            let mut rows: Vec<Vec<(WidgetRef, Region, Region)>> = vec![Vec::new(); height];
            let entries = &self.visible_widgets_cache().entries;
            for (widget, region, clip) in entries {
                let cropped_region = region.intersection(*clip);
                if cropped_region.height > 0 {
                    for y in cropped_region.line_range() {
                        if y >= 0 && (y as usize) < height {
                            rows[y as usize].push((widget.clone(), cropped_region, *region));
                        }
                    }
                }
            }
            self.layers_visible = Some(rows);
        }
        self.layers_visible.as_deref().expect("cache populated above")
    }

    /// The cut columns for every row: each column where a visible widget
    /// begins or ends, always including `0` and the screen width.
    pub fn cuts(&mut self) -> &[Vec<i32>] {
        if self.cuts.is_none() {
            let width = self.size.width;
            let height = self.size.height.max(0) as usize;
            let screen_region = self.size.region();
            let mut cuts: Vec<Vec<i32>> = vec![vec![0, width]; height];

            let entries = &self.visible_widgets_cache().entries;
            for (_, region, clip) in entries {
                let region = region.intersection(*clip);
                if !region.is_empty() && screen_region.contains_region(region) {
                    let (x1, x2) = region.column_span();
                    for y in region.line_range() {
                        if y >= 0 && (y as usize) < height {
                            cuts[y as usize].push(x1);
                            cuts[y as usize].push(x2);
                        }
                    }
                }
            }

            for line_cuts in &mut cuts {
                line_cuts.sort_unstable();
                line_cuts.dedup();
            }
            self.cuts = Some(cuts);
        }
        self.cuts.as_deref().expect("cache populated above")
    }

    /// Get the offset of a widget.
    pub fn get_offset(&mut self, widget: &WidgetRef) -> Result<Offset> {
        if let Some(visible_map) = &self.visible_map {
            if let Some(geometry) = visible_map.get(widget) {
                return Ok(geometry.region.offset());
            }
        }
        self.full_map()
            .get(widget)
            .map(|geometry| geometry.region.offset())
            .ok_or_else(|| CompositorError::NoWidget("widget is not in layout".into()))
    }

    /// Get the widget under the given coordinate, with its region.
    ///
    /// Fails with [`CompositorError::NoWidget`] when nothing visible is
    /// underneath `(x, y)`.
    pub fn get_widget_at(&mut self, x: i32, y: i32) -> Result<(WidgetRef, Region)> {
        if y >= 0 {
            if let Some(row) = self.layers_visible().get(y as usize) {
                for (widget, cropped_region, region) in row {
                    if cropped_region.contains(x, y) && widget.is_visible() {
                        return Ok((widget.clone(), *region));
                    }
                }
            }
        }
        Err(CompositorError::NoWidget(format!(
            "no widget under screen coordinate ({x}, {y})"
        )))
    }

    /// All widgets under the given coordinate, front-to-back.
    pub fn get_widgets_at(
        &mut self,
        x: i32,
        y: i32,
    ) -> impl Iterator<Item = (WidgetRef, Region)> + '_ {
        let row: &[(WidgetRef, Region, Region)] = if y >= 0 {
            self.layers_visible()
                .get(y as usize)
                .map(Vec::as_slice)
                .unwrap_or_default()
        } else {
            &[]
        };
        row.iter()
            .filter(move |(widget, cropped_region, _)| {
                cropped_region.contains(x, y) && widget.is_visible()
            })
            .map(|(widget, _, region)| (widget.clone(), *region))
    }

    /// The style under the given coordinate, or the null style.
    ///
    /// Renders a single row of the front-most widget and walks its
    /// segments until the cursor crosses the queried column.
    pub fn get_style_at(&mut self, x: i32, y: i32) -> Style {
        let Ok((widget, region)) = self.get_widget_at(x, y) else {
            return Style::default();
        };
        if !self.visible_widgets_cache().contains(&widget) {
            return Style::default();
        }

        let local_x = x - region.x;
        let local_y = y - region.y;

        let lines = widget.render_lines(Region::new(0, local_y, region.width, 1));
        let Some(line) = lines.first() else {
            return Style::default();
        };

        let mut end = 0;
        for segment in line.segments() {
            end += segment.cell_length() as i32;
            if local_x < end {
                return segment.style().copied().unwrap_or_default();
            }
        }
        Style::default()
    }

    /// Get the composition information of a widget.
    ///
    /// Fails with [`CompositorError::NoWidget`] when no root is set or
    /// the widget is not in the layout.
    pub fn find_widget(&mut self, widget: &WidgetRef) -> Result<MapGeometry> {
        if self.root.is_none() {
            return Err(CompositorError::NoWidget("widget is not in layout".into()));
        }
        if let Some(geometry) = self.full_map.get(widget) {
            return Ok(geometry.clone());
        }
        if let Some(visible_map) = &self.visible_map {
            if let Some(geometry) = visible_map.get(widget) {
                return Ok(geometry.clone());
            }
        }
        self.full_map()
            .get(widget)
            .cloned()
            .ok_or_else(|| CompositorError::NoWidget("widget is not in layout".into()))
    }

    /// Rendered strips of every visible widget that will paint, in
    /// front-to-back order, with their region and clip.
    fn get_renders(&mut self, crop: Option<Region>) -> Vec<(Region, Region, Vec<Strip>)> {
        let entries = &self.visible_widgets_cache().entries;
        let mut renders = Vec::new();

        for (widget, region, clip) in entries {
            if widget.opacity() <= 0.0 {
                continue;
            }
            if let Some(crop) = crop {
                if !crop.overlaps(*clip) {
                    continue;
                }
            }
            if clip.contains_region(*region) {
                renders.push((
                    *region,
                    *clip,
                    widget.render_lines(Region::new(0, 0, region.width, region.height)),
                ));
            } else {
                let clipped = region.intersection(*clip);
                if clipped.is_empty() {
                    continue;
                }
                renders.push((
                    *region,
                    *clip,
                    widget.render_lines(Region::new(
                        clipped.x - region.x,
                        clipped.y - region.y,
                        clipped.width,
                        clipped.height,
                    )),
                ));
            }
        }
        renders
    }

    /// Render the per-row chops: for each cut column of each rendered
    /// row, the strip fragment painted there.
    ///
    /// Widgets are visited front to back and fragments written only into
    /// empty slots, so the first writer wins.
    fn render_chops(
        &mut self,
        crop: Region,
        is_rendered_line: impl Fn(i32) -> bool,
    ) -> Vec<Vec<Option<Strip>>> {
        let renders = self.get_renders(Some(crop));
        let cuts = self.cuts();
        let mut chops: Vec<Vec<Option<Strip>>> = cuts
            .iter()
            .map(|line| vec![None; line.len().saturating_sub(1)])
            .collect();

        for (region, clip, strips) in renders {
            let render_region = region.intersection(clip);
            let (first_cut, last_cut) = render_region.column_span();
            let render_x = render_region.x;

            for (y, strip) in render_region.line_range().zip(strips) {
                if !is_rendered_line(y) {
                    continue;
                }
                if y < 0 || y as usize >= cuts.len() {
                    continue;
                }
                let row = y as usize;
                let cuts_line = &cuts[row];
                let start = cuts_line.partition_point(|&cut| cut < first_cut);
                let end = cuts_line.partition_point(|&cut| cut <= last_cut);
                let final_cuts = &cuts_line[start..end];

                let cut_strips: Vec<Strip> = if final_cuts.len() <= 2 {
                    // Two cuts means the entire line is one fragment
                    vec![strip]
                } else {
                    let relative_cuts: Vec<usize> = final_cuts[1..]
                        .iter()
                        .map(|&cut| (cut - render_x) as usize)
                        .collect();
                    strip.divide(&relative_cuts)
                };

                let chops_line = &mut chops[row];
                for (slot, cut_strip) in (start..).zip(cut_strips) {
                    if slot >= chops_line.len() {
                        break;
                    }
                    if chops_line[slot].is_none() {
                        chops_line[slot] = Some(cut_strip);
                    }
                }
            }
        }

        chops
    }

    /// Render an update renderable.
    ///
    /// Installs `screen_stack` as the ambient background-screen stack for
    /// the duration of the render. Emits a full update when requested or
    /// when the whole screen is already dirty, otherwise a partial update
    /// covering the dirty regions. Returns `None` when there is nothing
    /// to paint.
    pub fn render_update(
        &mut self,
        full: bool,
        screen_stack: Vec<WidgetRef>,
    ) -> Option<ScreenUpdate> {
        let _screens = ScreenStackGuard::install(screen_stack);
        let screen_region = self.size.region();
        if full || self.dirty_regions.contains(&screen_region) {
            Some(ScreenUpdate::Full(self.render_full_update()))
        } else {
            self.render_partial_update().map(ScreenUpdate::Partial)
        }
    }

    /// Render a full update covering the entire screen.
    pub fn render_full_update(&mut self) -> LayoutUpdate {
        log::trace!("render_full_update size={:?}", self.size);
        let screen_region = self.size.region();
        self.dirty_regions.clear();
        let chops = self.render_chops(screen_region, |_| true);
        let render_strips: Vec<Strip> = chops
            .into_iter()
            .map(|chop| Strip::join(chop.into_iter().flatten()))
            .collect();
        LayoutUpdate::new(render_strips, screen_region)
    }

    /// Render a partial update covering the dirty regions, or `None`
    /// when nothing is dirty.
    pub fn render_partial_update(&mut self) -> Option<ChopsUpdate> {
        let screen_region = self.size.region();
        if self.dirty_regions.is_empty() {
            return None;
        }
        let update_regions: Vec<Region> = self.dirty_regions.drain().collect();
        log::trace!("render_partial_update regions={}", update_regions.len());

        // A crop region that surrounds all updates.
        let crop = Region::from_union(update_regions.iter().copied()).intersection(screen_region);
        let spans = regions_to_spans(update_regions);
        let rendered_lines: HashSet<i32> = spans.iter().map(|&(y, _, _)| y).collect();

        let chops = self.render_chops(crop, |y| rendered_lines.contains(&y));
        let cuts = self.cuts().to_vec();
        Some(ChopsUpdate::new(chops, spans, cuts))
    }

    /// Render the whole screen to one strip per row, without touching
    /// dirty state.
    pub fn render_strips(&mut self) -> Vec<Strip> {
        let chops = self.render_chops(self.size.region(), |_| true);
        chops
            .into_iter()
            .map(|chop| Strip::join(chop.into_iter().flatten()))
            .collect()
    }

    /// Queue explicit repaints for the given widgets.
    ///
    /// Drains each visible widget's pending repaint rectangles,
    /// translates them to screen coordinates, clips them, and adds the
    /// results to the dirty set. A requested widget outside the visible
    /// set flags the full map stale, since it may have become visible.
    pub fn update_widgets(&mut self, widgets: &HashSet<WidgetRef>) {
        let all_visible = {
            let cache = self.visible_widgets_cache();
            widgets.iter().all(|widget| cache.contains(widget))
        };
        if !self.full_map_invalidated && !all_visible {
            self.full_map_invalidated = true;
        }

        let mut regions: Vec<Region> = Vec::new();
        {
            let cache = self.visible_widgets_cache();
            for widget in widgets {
                let Some((region, clip)) = cache.get(widget) else {
                    continue;
                };
                let offset = region.offset();
                for dirty_region in widget.exchange_repaint_regions() {
                    let update_region = clip.intersection(dirty_region.translate(offset));
                    if !update_region.is_empty() {
                        regions.push(update_region);
                    }
                }
            }
        }
        self.dirty_regions.extend(regions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // regions_to_spans tests
    // =========================================================================

    #[test]
    fn spans_single_region() {
        let spans = regions_to_spans([Region::new(1, 0, 4, 2)]);
        assert_eq!(spans, vec![(0, 1, 5), (1, 1, 5)]);
    }

    #[test]
    fn spans_merge_overlapping() {
        let spans = regions_to_spans([Region::new(0, 0, 5, 1), Region::new(3, 0, 5, 1)]);
        assert_eq!(spans, vec![(0, 0, 8)]);
    }

    #[test]
    fn spans_merge_touching() {
        let spans = regions_to_spans([Region::new(0, 0, 3, 1), Region::new(3, 0, 3, 1)]);
        assert_eq!(spans, vec![(0, 0, 6)]);
    }

    #[test]
    fn spans_keep_disjoint_intervals() {
        let spans = regions_to_spans([Region::new(0, 0, 2, 1), Region::new(5, 0, 2, 1)]);
        assert_eq!(spans, vec![(0, 0, 2), (0, 5, 7)]);
    }

    #[test]
    fn spans_sorted_by_row() {
        let spans = regions_to_spans([Region::new(0, 2, 1, 1), Region::new(0, 0, 1, 1)]);
        assert_eq!(spans, vec![(0, 0, 1), (2, 0, 1)]);
    }

    #[test]
    fn spans_unsorted_intervals_merge() {
        let spans = regions_to_spans([
            Region::new(6, 0, 2, 1),
            Region::new(0, 0, 3, 1),
            Region::new(2, 0, 5, 1),
        ]);
        assert_eq!(spans, vec![(0, 0, 8)]);
    }

    // =========================================================================
    // PaintOrder tests
    // =========================================================================

    #[test]
    fn paint_order_child_extends_parent() {
        let root = PaintOrder::root();
        let child = root.child(1, 2, -3);
        assert_eq!(child.triples(), &[(0, 0, 0), (1, 2, -3)]);
    }

    #[test]
    fn paint_order_lexicographic() {
        let root = PaintOrder::root();
        // A longer key with an equal prefix paints later (on top).
        assert!(root.child(0, 0, 0) > root);
        // Higher layer beats z and sibling order.
        assert!(root.child(1, 0, -5) > root.child(0, 9, 9));
        // Higher z beats sibling order.
        assert!(root.child(0, 1, -5) > root.child(0, 0, 5));
        // Earlier-declared sibling (larger order) is on top.
        assert!(root.child(0, 0, 0) > root.child(0, 0, -1));
    }
}
