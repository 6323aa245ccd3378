#![forbid(unsafe_code)]

//! Tool bar: a main bar plus an overflow area.
//!
//! Items are generated once, in order, into the [`ToolBarPanel`]'s generated
//! list. Each measure of the panel decides, per item, whether it lives in
//! the main bar or in the paired [`ToolBarOverflowPanel`], and physically
//! moves it:
//!
//! 1. Pass one handles every item whose [`OverflowMode`] is not `AsNeeded`:
//!    `Never` items join the bar, `Always` items go to overflow.
//! 2. Pass two walks the `AsNeeded` items in order. The first one that does
//!    not fit the remaining extent goes to overflow, and so does every
//!    `AsNeeded` item after it.
//!
//! The overflow panel picks its children up from the generated list during
//! its own measure and packs them into wrapped lines.
//!
//! # Invariants
//!
//! 1. Every generated item is a child of at most one of the two panels.
//! 2. Both panels list their items in generated order.
//! 3. With an unchanged item list and constraint, a second measure
//!    reproduces the same overflow assignment.
//! 4. An item wider than the wrap width gets a line of its own.

use primkit_core::ConfigError;
use primkit_core::geometry::{Orientation, Rect, Size};
use primkit_core::logging::LAYOUT;
use primkit_core::property::{Property, auto_or_non_negative};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::element::LayoutElement;
use crate::generator::{
    ContainerHost, GeneratorDirection, GeneratorPosition, ItemContainerGenerator,
};
use crate::tree::{LayoutContext, LayoutError, LayoutTree, NodeId};

/// Where a tool bar item may live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OverflowMode {
    /// Always in the overflow area.
    Always,
    /// In the main bar while it fits.
    #[default]
    AsNeeded,
    /// Always in the main bar.
    Never,
}

// -----------------------------------------------------------------------------
// Main bar
// -----------------------------------------------------------------------------

/// Running totals of one measure pass.
#[derive(Debug, Default)]
struct PassState {
    desired: Size,
    overflow_extent: f64,
    has_overflow: bool,
    overflow_changed: bool,
}

/// The main bar of a tool bar.
#[derive(Debug, Clone, Default)]
pub struct ToolBarPanel {
    orientation: Orientation,
    overflow_panel: Option<NodeId>,
    generated: Vec<NodeId>,
    min_length: f64,
    max_length: f64,
    has_overflow_items: bool,
}

impl ToolBarPanel {
    #[must_use]
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Generated items in order, wherever they currently live.
    #[must_use]
    pub fn generated(&self) -> &[NodeId] {
        &self.generated
    }

    /// Extent of the items that can never overflow.
    #[must_use]
    pub fn min_length(&self) -> f64 {
        self.min_length
    }

    /// Extent needed to show every item in the bar.
    #[must_use]
    pub fn max_length(&self) -> f64 {
        self.max_length
    }

    /// Whether the last measure sent anything to overflow.
    #[must_use]
    pub fn has_overflow_items(&self) -> bool {
        self.has_overflow_items
    }

    fn add_extent(&self, desired: &mut Size, child: Size) {
        match self.orientation {
            Orientation::Horizontal => {
                desired.width += child.width;
                desired.height = desired.height.max(child.height);
            }
            Orientation::Vertical => {
                desired.width = desired.width.max(child.width);
                desired.height += child.height;
            }
        }
    }

    fn measure_pass(
        &self,
        cx: &mut LayoutContext<'_>,
        as_needed_pass: bool,
        slot: Size,
        max_extent: f64,
        state: &mut PassState,
    ) -> Result<(), LayoutError> {
        let me = cx.node();
        let mut send_to_overflow = false;
        let mut index = 0;

        for &child in &self.generated {
            let mode = cx.props(child).overflow_mode;
            let as_needed = mode == OverflowMode::AsNeeded;
            if as_needed != as_needed_pass {
                if cx.tree().children(me).get(index) == Some(&child) {
                    index += 1;
                }
                continue;
            }
            let parent = cx.tree().parent(child);

            if mode != OverflowMode::Always && !send_to_overflow {
                let tree = cx.tree_mut();
                tree.set_overflow_item(child, false)?;
                let size = tree.measure(child, slot)?;
                if as_needed {
                    let extent = self.orientation.extent(size)
                        + self.orientation.extent(state.desired);
                    if extent > max_extent {
                        send_to_overflow = true;
                    }
                }
                if !send_to_overflow {
                    self.add_extent(&mut state.desired, size);
                    if parent != Some(me) {
                        tree.detach(child)?;
                        let at = index.min(tree.child_count(me));
                        tree.insert_child(me, at, child)?;
                        debug!(target: LAYOUT, panel = %me, item = %child, "item moved to main bar");
                    }
                    index += 1;
                }
            }

            if mode == OverflowMode::Always || send_to_overflow {
                state.has_overflow = true;
                let tree = cx.tree_mut();
                tree.set_overflow_item(child, true)?;
                let size = tree.measure(child, slot)?;
                state.overflow_extent += self.orientation.extent(size);
                if parent == Some(me) {
                    tree.remove_child(me, child)?;
                    state.overflow_changed = true;
                    debug!(target: LAYOUT, panel = %me, item = %child, "item moved to overflow");
                } else if parent.is_none() {
                    state.overflow_changed = true;
                }
            }
        }
        Ok(())
    }
}

impl LayoutElement for ToolBarPanel {
    fn kind(&self) -> &'static str {
        "ToolBarPanel"
    }

    fn measure_override(
        &mut self,
        cx: &mut LayoutContext<'_>,
        available: Size,
    ) -> Result<Size, LayoutError> {
        let (slot, max_extent) = match self.orientation {
            Orientation::Horizontal => (Size::new(f64::INFINITY, available.height), available.width),
            Orientation::Vertical => (Size::new(available.width, f64::INFINITY), available.height),
        };

        let mut state = PassState::default();
        self.measure_pass(cx, false, slot, max_extent, &mut state)?;
        self.min_length = self.orientation.extent(state.desired);
        self.measure_pass(cx, true, slot, max_extent, &mut state)?;
        self.max_length = self.orientation.extent(state.desired) + state.overflow_extent;
        self.has_overflow_items = state.has_overflow;

        if state.overflow_changed {
            if let Some(overflow) = self.overflow_panel {
                cx.tree_mut().invalidate_measure(overflow);
            }
        }
        debug!(
            target: LAYOUT,
            node = %cx.node(),
            desired = ?state.desired,
            min_length = self.min_length,
            max_length = self.max_length,
            has_overflow = self.has_overflow_items,
            "tool bar measured"
        );
        Ok(state.desired)
    }

    fn arrange_override(
        &mut self,
        cx: &mut LayoutContext<'_>,
        final_size: Size,
    ) -> Result<Size, LayoutError> {
        let mut offset = 0.0;
        for child in cx.children() {
            let d = cx.desired_size(child);
            let rect = match self.orientation {
                Orientation::Horizontal => {
                    Rect::new(offset, 0.0, d.width, final_size.height.max(d.height))
                }
                Orientation::Vertical => {
                    Rect::new(0.0, offset, final_size.width.max(d.width), d.height)
                }
            };
            cx.arrange(child, rect)?;
            offset += self.orientation.extent(d);
        }
        Ok(final_size)
    }
}

// -----------------------------------------------------------------------------
// Overflow area
// -----------------------------------------------------------------------------

/// One wrapped line: children `start..end`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Line {
    start: usize,
    end: usize,
    size: Size,
}

fn pack_lines(sizes: &[Size], wrap: f64) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut current = Size::ZERO;
    for (i, &size) in sizes.iter().enumerate() {
        if current.width + size.width > wrap {
            if i > start {
                lines.push(Line {
                    start,
                    end: i,
                    size: current,
                });
            }
            if size.width > wrap {
                lines.push(Line {
                    start: i,
                    end: i + 1,
                    size,
                });
                start = i + 1;
                current = Size::ZERO;
            } else {
                start = i;
                current = size;
            }
        } else {
            current.width += size.width;
            current.height = current.height.max(size.height);
        }
    }
    if sizes.len() > start {
        lines.push(Line {
            start,
            end: sizes.len(),
            size: current,
        });
    }
    lines
}

/// Wrapping panel holding a tool bar's overflowed items.
#[derive(Debug)]
pub struct ToolBarOverflowPanel {
    panel: Option<NodeId>,
    wrap_width: Property<f64>,
    effective_wrap: f64,
}

impl Default for ToolBarOverflowPanel {
    fn default() -> Self {
        Self {
            panel: None,
            wrap_width: Property::validated("WrapWidth", f64::NAN, auto_or_non_negative),
            effective_wrap: 0.0,
        }
    }
}

impl ToolBarOverflowPanel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit wrap width; NaN means "widest item".
    #[must_use]
    pub fn wrap_width(&self) -> f64 {
        self.wrap_width.get()
    }

    /// Negative and infinite values are rejected. Callers must invalidate
    /// the node's measure on `Ok(true)`.
    pub fn set_wrap_width(&mut self, wrap_width: f64) -> Result<bool, ConfigError> {
        self.wrap_width.set(wrap_width)
    }

    /// Wrap width used by the last measure.
    #[must_use]
    pub fn effective_wrap(&self) -> f64 {
        self.effective_wrap
    }

    /// Make this panel's children match the overflowed generated items.
    fn sync_children(&self, cx: &mut LayoutContext<'_>) -> Result<(), LayoutError> {
        let Some(panel) = self.panel else {
            return Ok(());
        };
        let me = cx.node();
        let wanted: Vec<NodeId> = match cx.tree().element::<ToolBarPanel>(panel) {
            Some(bar) => bar
                .generated()
                .iter()
                .copied()
                .filter(|c| cx.props(*c).is_overflow_item)
                .collect(),
            None => Vec::new(),
        };
        let wanted_set: FxHashSet<NodeId> = wanted.iter().copied().collect();

        let tree = cx.tree_mut();
        for stale in tree.children(me).to_vec() {
            if !wanted_set.contains(&stale) {
                tree.remove_child(me, stale)?;
            }
        }
        for (index, &child) in wanted.iter().enumerate() {
            if tree.children(me).get(index) != Some(&child) {
                tree.detach(child)?;
                let at = index.min(tree.child_count(me));
                tree.insert_child(me, at, child)?;
            }
        }
        Ok(())
    }
}

impl LayoutElement for ToolBarOverflowPanel {
    fn kind(&self) -> &'static str {
        "ToolBarOverflowPanel"
    }

    fn measure_override(
        &mut self,
        cx: &mut LayoutContext<'_>,
        available: Size,
    ) -> Result<Size, LayoutError> {
        self.sync_children(cx)?;

        let mut sizes = Vec::with_capacity(cx.child_count());
        for child in cx.children() {
            sizes.push(cx.measure(child, available)?);
        }
        let widest = sizes.iter().map(|s| s.width).fold(0.0, f64::max);
        let explicit = self.wrap_width.get();
        let wrap = if explicit.is_nan() {
            widest
        } else {
            explicit.max(widest)
        };
        self.effective_wrap = wrap.min(available.width);

        let lines = pack_lines(&sizes, self.effective_wrap);
        let size = lines.iter().fold(Size::ZERO, |acc, line| {
            Size::new(acc.width.max(line.size.width), acc.height + line.size.height)
        });
        debug!(
            target: LAYOUT,
            node = %cx.node(),
            items = sizes.len(),
            lines = lines.len(),
            wrap = self.effective_wrap,
            "overflow panel measured"
        );
        Ok(size)
    }

    fn arrange_override(
        &mut self,
        cx: &mut LayoutContext<'_>,
        final_size: Size,
    ) -> Result<Size, LayoutError> {
        let children = cx.children();
        let sizes: Vec<Size> = children.iter().map(|c| cx.desired_size(*c)).collect();
        let mut y = 0.0;
        for line in pack_lines(&sizes, self.effective_wrap) {
            let mut x = 0.0;
            for i in line.start..line.end {
                let width = sizes[i].width;
                cx.arrange(children[i], Rect::new(x, y, width, line.size.height))?;
                x += width;
            }
            y += line.size.height;
        }
        Ok(final_size)
    }
}

// -----------------------------------------------------------------------------
// Tool bar
// -----------------------------------------------------------------------------

struct TreeHost<'a, F> {
    tree: &'a mut LayoutTree,
    make: F,
}

impl<F: FnMut(&mut LayoutTree, usize) -> NodeId> ContainerHost<NodeId> for TreeHost<'_, F> {
    fn create_container(&mut self, index: usize) -> NodeId {
        (self.make)(self.tree, index)
    }
}

/// Handle pairing a main bar with its overflow panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToolBar {
    panel: NodeId,
    overflow: NodeId,
}

impl ToolBar {
    /// Insert a linked main bar and overflow panel into `tree`.
    pub fn new(tree: &mut LayoutTree, orientation: Orientation) -> Result<Self, LayoutError> {
        let panel = tree.insert(ToolBarPanel::new(orientation));
        let overflow = tree.insert(ToolBarOverflowPanel::new());
        tree.element_mut::<ToolBarPanel>(panel)
            .ok_or(LayoutError::UnknownNode(panel))?
            .overflow_panel = Some(overflow);
        tree.element_mut::<ToolBarOverflowPanel>(overflow)
            .ok_or(LayoutError::UnknownNode(overflow))?
            .panel = Some(panel);
        Ok(Self { panel, overflow })
    }

    #[must_use]
    pub fn panel(&self) -> NodeId {
        self.panel
    }

    #[must_use]
    pub fn overflow_panel(&self) -> NodeId {
        self.overflow
    }

    /// Append a detached item to the generated list and the main bar.
    pub fn add_item(&self, tree: &mut LayoutTree, item: NodeId) -> Result<(), LayoutError> {
        tree.add_child(self.panel, item)?;
        self.bar_mut(tree)?.generated.push(item);
        Ok(())
    }

    /// Drop an item from the tool bar, leaving it detached.
    pub fn remove_item(&self, tree: &mut LayoutTree, item: NodeId) -> Result<(), LayoutError> {
        let bar = self.bar_mut(tree)?;
        let Some(pos) = bar.generated.iter().position(|c| *c == item) else {
            return Err(LayoutError::NotAChild {
                parent: self.panel,
                child: item,
            });
        };
        bar.generated.remove(pos);
        tree.detach(item)?;
        tree.set_overflow_item(item, false)?;
        tree.invalidate_measure(self.panel);
        tree.invalidate_measure(self.overflow);
        Ok(())
    }

    /// Realize every item of `generator`, creating containers with `make`,
    /// and add the newly realized ones. Returns how many were added.
    pub fn generate_items<G, F>(
        &self,
        tree: &mut LayoutTree,
        generator: &mut G,
        make: F,
    ) -> Result<usize, LayoutError>
    where
        G: ItemContainerGenerator<Container = NodeId>,
        F: FnMut(&mut LayoutTree, usize) -> NodeId,
    {
        let mut fresh = Vec::new();
        {
            let mut host = TreeHost {
                tree: &mut *tree,
                make,
            };
            let mut scope =
                generator.start_at(GeneratorPosition::BOUNDARY, GeneratorDirection::Forward, true)?;
            while let Some((container, is_new)) = scope.generate_next(&mut host)? {
                if is_new {
                    fresh.push(container);
                }
            }
        }
        for item in &fresh {
            self.add_item(tree, *item)?;
        }
        Ok(fresh.len())
    }

    /// Change an item's overflow mode and schedule a new measure of the bar.
    pub fn set_overflow_mode(
        &self,
        tree: &mut LayoutTree,
        item: NodeId,
        mode: OverflowMode,
    ) -> Result<(), LayoutError> {
        tree.update_props(item, |p| p.overflow_mode = mode)?;
        tree.invalidate_measure(self.panel);
        Ok(())
    }

    /// Whether the last measure of the main bar overflowed anything.
    #[must_use]
    pub fn has_overflow_items(&self, tree: &LayoutTree) -> bool {
        tree.element::<ToolBarPanel>(self.panel)
            .is_some_and(ToolBarPanel::has_overflow_items)
    }

    fn bar_mut<'t>(&self, tree: &'t mut LayoutTree) -> Result<&'t mut ToolBarPanel, LayoutError> {
        tree.element_mut::<ToolBarPanel>(self.panel)
            .ok_or(LayoutError::UnknownNode(self.panel))
    }
}
