#![forbid(unsafe_code)]

//! Arena-backed element tree running the measure/arrange protocol.
//!
//! # Invariants
//!
//! 1. A node has at most one parent and appears exactly once in that
//!    parent's child list; the parent chain is acyclic.
//! 2. Stored desired and render sizes are finite and non-negative.
//! 3. `measure(id, a)` on a clean node previously measured with `a` returns
//!    the cached size without running any override (same for `arrange`).
//! 4. Invalidating a node's measure also invalidates every ancestor's.
//! 5. A collapsed node measures to zero without running its override.
//!
//! # Failure Modes
//!
//! - Element overrides may fail. The innermost failing node is recorded in
//!   [`LayoutTree::last_failure`] and the error propagates unchanged through
//!   every enclosing `measure`/`arrange` call. The failing node stays dirty.
//! - Re-entering layout on a node whose override is already running yields
//!   [`LayoutError::Reentrant`].
//! - Node ids are never reused, so a stale id yields
//!   [`LayoutError::UnknownNode`] instead of aliasing a newer node.

use std::fmt;

use primkit_core::geometry::{Rect, Size, Vector};
use primkit_core::logging::LAYOUT;
use thiserror::Error;
use tracing::{debug, debug_span, trace, warn};

use crate::Visibility;
use crate::element::LayoutElement;
use crate::generator::GeneratorError;
use crate::selective_scrolling_grid::SelectiveScrollingOrientation;
use crate::toolbar::OverflowMode;

// -----------------------------------------------------------------------------
// Identifiers and errors
// -----------------------------------------------------------------------------

/// Handle to a node in a [`LayoutTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Raw arena index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Which pass a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutPhase {
    Measure,
    Arrange,
}

impl fmt::Display for LayoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Measure => f.write_str("measure"),
            Self::Arrange => f.write_str("arrange"),
        }
    }
}

/// Errors from tree structure changes and layout passes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("{child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("child index {index} out of range for {parent} ({count} children)")]
    ChildIndexOutOfRange {
        parent: NodeId,
        index: usize,
        count: usize,
    },
    #[error("{child} already belongs to {parent}")]
    AlreadyParented { child: NodeId, parent: NodeId },
    #[error("attaching {child} under {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("layout re-entered {0} while its override is running")]
    Reentrant(NodeId),
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    #[error("{kind} {node} failed during {phase}: {message}")]
    ElementFailed {
        node: NodeId,
        kind: &'static str,
        phase: LayoutPhase,
        message: String,
    },
}

/// The innermost node whose override failed most recently.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutFailure {
    pub node: NodeId,
    pub kind: &'static str,
    pub phase: LayoutPhase,
    pub error: LayoutError,
}

// -----------------------------------------------------------------------------
// Per-node state
// -----------------------------------------------------------------------------

/// Layout-relevant attached properties of a node.
///
/// Panels read these from their children; the host writes them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeProps {
    pub visibility: Visibility,
    /// Consulted by [`ToolBarPanel`](crate::ToolBarPanel).
    pub overflow_mode: OverflowMode,
    /// Written by [`ToolBarPanel`](crate::ToolBarPanel): the child currently
    /// lives in the overflow panel.
    pub is_overflow_item: bool,
    /// Consulted by [`TabPanel`](crate::TabPanel) to pick the active row.
    pub is_selected: bool,
    /// Consulted by [`SelectiveScrollingGrid`](crate::SelectiveScrollingGrid).
    pub scrolling: SelectiveScrollingOrientation,
    /// Written by [`SelectiveScrollingGrid`](crate::SelectiveScrollingGrid):
    /// translation applied at render time.
    pub render_offset: Vector,
}

/// Cached layout results and dirty flags of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSlot {
    pub desired: Size,
    pub render: Size,
    /// Slot rect in the parent's coordinate space.
    pub rect: Rect,
    pub last_available: Option<Size>,
    pub last_rect: Option<Rect>,
    pub measure_dirty: bool,
    pub arrange_dirty: bool,
    /// Number of `measure_override` runs.
    pub measure_count: u64,
    /// Number of `arrange_override` runs.
    pub arrange_count: u64,
}

impl Default for LayoutSlot {
    fn default() -> Self {
        Self {
            desired: Size::ZERO,
            render: Size::ZERO,
            rect: Rect::default(),
            last_available: None,
            last_rect: None,
            measure_dirty: true,
            arrange_dirty: true,
            measure_count: 0,
            arrange_count: 0,
        }
    }
}

#[derive(Debug)]
struct Node {
    /// `None` while the element's override is running.
    element: Option<Box<dyn LayoutElement>>,
    kind: &'static str,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    props: NodeProps,
    slot: LayoutSlot,
}

// -----------------------------------------------------------------------------
// Tree
// -----------------------------------------------------------------------------

/// Owner of every element and of the parent/child relation.
#[derive(Debug, Default)]
pub struct LayoutTree {
    nodes: Vec<Option<Node>>,
    failure: Option<LayoutFailure>,
    depth: usize,
    unwinding: bool,
}

impl LayoutTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a detached node.
    pub fn insert<E: LayoutElement>(&mut self, element: E) -> NodeId {
        self.insert_boxed(Box::new(element))
    }

    /// Add a detached node from a boxed element.
    pub fn insert_boxed(&mut self, element: Box<dyn LayoutElement>) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        let kind = element.kind();
        self.nodes.push(Some(Node {
            element: Some(element),
            kind,
            parent: None,
            children: Vec::new(),
            props: NodeProps::default(),
            slot: LayoutSlot::default(),
        }));
        trace!(target: LAYOUT, node = %id, kind, "inserted");
        id
    }

    /// Remove a node and its whole subtree. Returns the removed ids.
    pub fn remove(&mut self, id: NodeId) -> Result<Vec<NodeId>, LayoutError> {
        self.detach(id)?;
        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(next.index()).and_then(Option::take) {
                stack.extend(node.children);
                removed.push(next);
            }
        }
        debug!(target: LAYOUT, node = %id, count = removed.len(), "removed subtree");
        Ok(removed)
    }

    /// Whether `id` names a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Whether the tree has no live nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // --- structure ----------------------------------------------------------

    /// Append `child` to `parent`'s children.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), LayoutError> {
        let count = self.node(parent)?.children.len();
        self.insert_child(parent, count, child)
    }

    /// Insert `child` at `index` in `parent`'s children.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), LayoutError> {
        let count = self.node(parent)?.children.len();
        if let Some(existing) = self.node(child)?.parent {
            return Err(LayoutError::AlreadyParented {
                child,
                parent: existing,
            });
        }
        if index > count {
            return Err(LayoutError::ChildIndexOutOfRange {
                parent,
                index,
                count,
            });
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(LayoutError::Cycle { parent, child });
        }
        self.node_mut(parent)?.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        self.invalidate_measure(parent);
        Ok(())
    }

    /// Remove `child` from `parent`'s children, leaving it detached.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), LayoutError> {
        let node = self.node_mut(parent)?;
        let Some(pos) = node.children.iter().position(|c| *c == child) else {
            return Err(LayoutError::NotAChild { parent, child });
        };
        node.children.remove(pos);
        self.node_mut(child)?.parent = None;
        self.invalidate_measure(parent);
        Ok(())
    }

    /// Detach `id` from its parent, if any. Returns the former parent.
    pub fn detach(&mut self, id: NodeId) -> Result<Option<NodeId>, LayoutError> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(None);
        };
        self.remove_child(parent, id)?;
        Ok(Some(parent))
    }

    /// Parent of `id`.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).ok().and_then(|n| n.parent)
    }

    /// Children of `id` in order; empty for unknown ids.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Number of children of `id`.
    #[must_use]
    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    /// Child of `parent` at `index`.
    pub fn visual_child(&self, parent: NodeId, index: usize) -> Result<NodeId, LayoutError> {
        let children = &self.node(parent)?.children;
        children
            .get(index)
            .copied()
            .ok_or(LayoutError::ChildIndexOutOfRange {
                parent,
                index,
                count: children.len(),
            })
    }

    /// Position of `child` among `parent`'s children.
    #[must_use]
    pub fn index_of_child(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).iter().position(|c| *c == child)
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.parent(id) {
                Some(p) => id = p,
                None => return false,
            }
        }
    }

    // --- element access -----------------------------------------------------

    /// Borrow the element of `id` as `T`.
    #[must_use]
    pub fn element<T: LayoutElement>(&self, id: NodeId) -> Option<&T> {
        self.node(id)
            .ok()?
            .element
            .as_deref()
            .and_then(|e| e.as_any().downcast_ref::<T>())
    }

    /// Mutably borrow the element of `id` as `T`.
    ///
    /// Does not invalidate; callers changing layout inputs must call
    /// [`invalidate_measure`](Self::invalidate_measure).
    #[must_use]
    pub fn element_mut<T: LayoutElement>(&mut self, id: NodeId) -> Option<&mut T> {
        self.node_mut(id)
            .ok()?
            .element
            .as_deref_mut()
            .and_then(|e| e.as_any_mut().downcast_mut::<T>())
    }

    /// Diagnostic type name of `id`.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> Option<&'static str> {
        self.node(id).ok().map(|n| n.kind)
    }

    /// Attached properties of `id`; defaults for unknown ids.
    #[must_use]
    pub fn props(&self, id: NodeId) -> NodeProps {
        self.node(id).map(|n| n.props).unwrap_or_default()
    }

    /// Edit host-owned properties of `id`.
    ///
    /// Any change invalidates the node and its ancestors.
    pub fn update_props(
        &mut self,
        id: NodeId,
        edit: impl FnOnce(&mut NodeProps),
    ) -> Result<(), LayoutError> {
        let node = self.node_mut(id)?;
        let before = node.props;
        edit(&mut node.props);
        if node.props != before {
            self.invalidate_measure(id);
        }
        Ok(())
    }

    /// Panel-owned flag; does not invalidate.
    pub(crate) fn set_overflow_item(&mut self, id: NodeId, value: bool) -> Result<(), LayoutError> {
        self.node_mut(id)?.props.is_overflow_item = value;
        Ok(())
    }

    /// Panel-owned render offset; does not invalidate.
    pub(crate) fn set_render_offset(&mut self, id: NodeId, offset: Vector) -> Result<(), LayoutError> {
        self.node_mut(id)?.props.render_offset = offset;
        Ok(())
    }

    // --- layout results -----------------------------------------------------

    /// Cached layout state of `id`.
    #[must_use]
    pub fn slot(&self, id: NodeId) -> Option<&LayoutSlot> {
        self.node(id).ok().map(|n| &n.slot)
    }

    /// Last measured desired size; zero for unknown ids.
    #[must_use]
    pub fn desired_size(&self, id: NodeId) -> Size {
        self.slot(id).map_or(Size::ZERO, |s| s.desired)
    }

    /// Last arranged render size.
    #[must_use]
    pub fn render_size(&self, id: NodeId) -> Size {
        self.slot(id).map_or(Size::ZERO, |s| s.render)
    }

    /// Last arranged slot rect, relative to the parent.
    #[must_use]
    pub fn layout_rect(&self, id: NodeId) -> Rect {
        self.slot(id).map_or_else(Rect::default, |s| s.rect)
    }

    /// Whether the cached desired size is current.
    #[must_use]
    pub fn is_measure_valid(&self, id: NodeId) -> bool {
        self.slot(id).is_some_and(|s| !s.measure_dirty)
    }

    /// Whether the cached arrangement is current.
    #[must_use]
    pub fn is_arrange_valid(&self, id: NodeId) -> bool {
        self.slot(id).is_some_and(|s| !s.arrange_dirty)
    }

    /// The innermost failure of the most recent failed pass.
    #[must_use]
    pub fn last_failure(&self) -> Option<&LayoutFailure> {
        self.failure.as_ref()
    }

    /// Take and clear the recorded failure.
    pub fn take_failure(&mut self) -> Option<LayoutFailure> {
        self.failure.take()
    }

    // --- invalidation -------------------------------------------------------

    /// Mark `id` and its ancestors as needing measure (and arrange).
    pub fn invalidate_measure(&mut self, id: NodeId) {
        let mut next = Some(id);
        while let Some(current) = next {
            let Ok(node) = self.node_mut(current) else {
                return;
            };
            node.slot.measure_dirty = true;
            node.slot.arrange_dirty = true;
            next = node.parent;
        }
    }

    /// Mark `id` and its ancestors as needing arrange.
    pub fn invalidate_arrange(&mut self, id: NodeId) {
        let mut next = Some(id);
        while let Some(current) = next {
            let Ok(node) = self.node_mut(current) else {
                return;
            };
            node.slot.arrange_dirty = true;
            next = node.parent;
        }
    }

    // --- passes -------------------------------------------------------------

    /// Measure `id` under `available` and return its desired size.
    pub fn measure(&mut self, id: NodeId, available: Size) -> Result<Size, LayoutError> {
        let node = self.node_mut(id)?;
        if node.props.visibility == Visibility::Collapsed {
            node.slot.desired = Size::ZERO;
            node.slot.last_available = Some(available);
            node.slot.measure_dirty = false;
            return Ok(Size::ZERO);
        }
        if !node.slot.measure_dirty && node.slot.last_available == Some(available) {
            return Ok(node.slot.desired);
        }
        let kind = node.kind;
        let Some(mut element) = node.element.take() else {
            return Err(LayoutError::Reentrant(id));
        };

        self.depth += 1;
        let result = {
            let mut cx = LayoutContext {
                tree: self,
                node: id,
                kind,
                phase: LayoutPhase::Measure,
            };
            element.measure_override(&mut cx, available)
        };
        self.depth -= 1;

        let restored = self.restore(id, element);
        let outcome = match (result, restored) {
            (Ok(size), Ok(())) => {
                if !size.is_valid_desired() {
                    warn!(target: LAYOUT, node = %id, kind, ?size, "sanitized invalid desired size");
                }
                let desired = size.sanitized();
                let node = self.node_mut(id)?;
                node.slot.desired = desired;
                node.slot.last_available = Some(available);
                node.slot.measure_dirty = false;
                node.slot.arrange_dirty = true;
                node.slot.measure_count += 1;
                trace!(target: LAYOUT, node = %id, kind, ?available, ?desired, "measured");
                Ok(desired)
            }
            (Err(err), _) | (_, Err(err)) => Err(self.fail(id, kind, LayoutPhase::Measure, err)),
        };
        self.finish_pass();
        outcome
    }

    /// Arrange `id` into `rect` (parent coordinates).
    ///
    /// Measures first if the node was never measured or is dirty, using the
    /// last available size or the rect's size.
    pub fn arrange(&mut self, id: NodeId, rect: Rect) -> Result<(), LayoutError> {
        let slot = &self.node(id)?.slot;
        if slot.measure_dirty || slot.last_available.is_none() {
            let available = slot.last_available.unwrap_or_else(|| rect.size());
            self.measure(id, available)?;
        }

        let node = self.node_mut(id)?;
        if node.props.visibility == Visibility::Collapsed {
            node.slot.render = Size::ZERO;
            node.slot.rect = Rect::new(rect.x, rect.y, 0.0, 0.0);
            node.slot.last_rect = Some(rect);
            node.slot.arrange_dirty = false;
            return Ok(());
        }
        if !node.slot.arrange_dirty && node.slot.last_rect == Some(rect) {
            return Ok(());
        }
        let kind = node.kind;
        let Some(mut element) = node.element.take() else {
            return Err(LayoutError::Reentrant(id));
        };

        self.depth += 1;
        let result = {
            let mut cx = LayoutContext {
                tree: self,
                node: id,
                kind,
                phase: LayoutPhase::Arrange,
            };
            element.arrange_override(&mut cx, rect.size())
        };
        self.depth -= 1;

        let restored = self.restore(id, element);
        let outcome = match (result, restored) {
            (Ok(render), Ok(())) => {
                let node = self.node_mut(id)?;
                node.slot.render = render.sanitized();
                node.slot.rect = rect;
                node.slot.last_rect = Some(rect);
                node.slot.arrange_dirty = false;
                node.slot.arrange_count += 1;
                trace!(target: LAYOUT, node = %id, kind, ?rect, "arranged");
                Ok(())
            }
            (Err(err), _) | (_, Err(err)) => Err(self.fail(id, kind, LayoutPhase::Arrange, err)),
        };
        self.finish_pass();
        outcome
    }

    /// Measure then arrange `root` at the origin with `available` space.
    pub fn update_layout(&mut self, root: NodeId, available: Size) -> Result<Size, LayoutError> {
        let _span = debug_span!(target: LAYOUT, "update_layout", root = %root).entered();
        let desired = self.measure(root, available)?;
        let width = if available.width.is_finite() {
            available.width
        } else {
            desired.width
        };
        let height = if available.height.is_finite() {
            available.height
        } else {
            desired.height
        };
        self.arrange(root, Rect::new(0.0, 0.0, width, height))?;
        Ok(desired)
    }

    // --- internals ----------------------------------------------------------

    fn node(&self, id: NodeId) -> Result<&Node, LayoutError> {
        self.nodes
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(LayoutError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, LayoutError> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(LayoutError::UnknownNode(id))
    }

    fn restore(&mut self, id: NodeId, element: Box<dyn LayoutElement>) -> Result<(), LayoutError> {
        // The override may have removed its own node.
        let node = self.node_mut(id)?;
        node.element = Some(element);
        Ok(())
    }

    fn fail(
        &mut self,
        id: NodeId,
        kind: &'static str,
        phase: LayoutPhase,
        err: LayoutError,
    ) -> LayoutError {
        if let Ok(node) = self.node_mut(id) {
            match phase {
                LayoutPhase::Measure => node.slot.measure_dirty = true,
                LayoutPhase::Arrange => node.slot.arrange_dirty = true,
            }
        }
        if !self.unwinding {
            self.unwinding = true;
            warn!(target: LAYOUT, node = %id, kind, %phase, error = %err, "layout failed");
            self.failure = Some(LayoutFailure {
                node: id,
                kind,
                phase,
                error: err.clone(),
            });
        }
        err
    }

    fn finish_pass(&mut self) {
        if self.depth == 0 {
            self.unwinding = false;
        }
    }
}

// -----------------------------------------------------------------------------
// Context handed to overrides
// -----------------------------------------------------------------------------

/// View of the tree from inside one element's override.
pub struct LayoutContext<'a> {
    tree: &'a mut LayoutTree,
    node: NodeId,
    kind: &'static str,
    phase: LayoutPhase,
}

impl fmt::Debug for LayoutContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutContext")
            .field("node", &self.node)
            .field("kind", &self.kind)
            .field("phase", &self.phase)
            .finish()
    }
}

impl LayoutContext<'_> {
    /// The node whose override is running.
    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Current pass.
    #[inline]
    #[must_use]
    pub fn phase(&self) -> LayoutPhase {
        self.phase
    }

    /// Snapshot of this node's children.
    #[must_use]
    pub fn children(&self) -> Vec<NodeId> {
        self.tree.children(self.node).to_vec()
    }

    /// Number of children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.tree.child_count(self.node)
    }

    /// Attached properties of any node.
    #[must_use]
    pub fn props(&self, id: NodeId) -> NodeProps {
        self.tree.props(id)
    }

    /// Last desired size of any node.
    #[must_use]
    pub fn desired_size(&self, id: NodeId) -> Size {
        self.tree.desired_size(id)
    }

    /// Measure one of this node's children.
    pub fn measure(&mut self, child: NodeId, available: Size) -> Result<Size, LayoutError> {
        self.check_child(child)?;
        self.tree.measure(child, available)
    }

    /// Arrange one of this node's children into `rect` (this node's space).
    pub fn arrange(&mut self, child: NodeId, rect: Rect) -> Result<(), LayoutError> {
        self.check_child(child)?;
        self.tree.arrange(child, rect)
    }

    /// Build an [`LayoutError::ElementFailed`] for this node.
    #[must_use]
    pub fn fail(&self, message: impl Into<String>) -> LayoutError {
        LayoutError::ElementFailed {
            node: self.node,
            kind: self.kind,
            phase: self.phase,
            message: message.into(),
        }
    }

    /// Shared access to the whole tree.
    #[must_use]
    pub fn tree(&self) -> &LayoutTree {
        self.tree
    }

    /// Mutable access to the whole tree, for panels that move children
    /// between parents. This node's own element is not reachable.
    pub fn tree_mut(&mut self) -> &mut LayoutTree {
        self.tree
    }

    fn check_child(&self, child: NodeId) -> Result<(), LayoutError> {
        if self.tree.parent(child) == Some(self.node) {
            Ok(())
        } else {
            Err(LayoutError::NotAChild {
                parent: self.node,
                child,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Fixed;

    /// Stacks children vertically; optionally fails.
    #[derive(Debug, Default)]
    struct Column {
        fail_measure: bool,
    }

    impl LayoutElement for Column {
        fn kind(&self) -> &'static str {
            "Column"
        }

        fn measure_override(
            &mut self,
            cx: &mut LayoutContext<'_>,
            available: Size,
        ) -> Result<Size, LayoutError> {
            if self.fail_measure {
                return Err(cx.fail("boom"));
            }
            let mut total = Size::ZERO;
            for child in cx.children() {
                let d = cx.measure(child, Size::new(available.width, f64::INFINITY))?;
                total.width = total.width.max(d.width);
                total.height += d.height;
            }
            Ok(total)
        }

        fn arrange_override(
            &mut self,
            cx: &mut LayoutContext<'_>,
            final_size: Size,
        ) -> Result<Size, LayoutError> {
            let mut y = 0.0;
            for child in cx.children() {
                let h = cx.desired_size(child).height;
                cx.arrange(child, Rect::new(0.0, y, final_size.width, h))?;
                y += h;
            }
            Ok(final_size)
        }
    }

    fn column_with(tree: &mut LayoutTree, sizes: &[(f64, f64)]) -> (NodeId, Vec<NodeId>) {
        let root = tree.insert(Column::default());
        let kids = sizes
            .iter()
            .map(|&(w, h)| {
                let id = tree.insert(Fixed::new(w, h));
                tree.add_child(root, id).unwrap();
                id
            })
            .collect();
        (root, kids)
    }

    #[test]
    fn measure_is_cached_until_invalidated() {
        let mut tree = LayoutTree::new();
        let (root, kids) = column_with(&mut tree, &[(10.0, 5.0), (20.0, 7.0)]);
        let avail = Size::new(100.0, 100.0);
        assert_eq!(tree.measure(root, avail).unwrap(), Size::new(20.0, 12.0));
        assert_eq!(tree.measure(root, avail).unwrap(), Size::new(20.0, 12.0));
        assert_eq!(tree.slot(root).unwrap().measure_count, 1);
        assert_eq!(tree.slot(kids[0]).unwrap().measure_count, 1);

        tree.element_mut::<Fixed>(kids[0])
            .unwrap()
            .set_size(Size::new(30.0, 5.0));
        tree.invalidate_measure(kids[0]);
        assert!(!tree.is_measure_valid(root));
        assert_eq!(tree.measure(root, avail).unwrap(), Size::new(30.0, 12.0));
        assert_eq!(tree.slot(kids[1]).unwrap().measure_count, 1);
    }

    #[test]
    fn collapsed_child_measures_zero_without_override() {
        let mut tree = LayoutTree::new();
        let (root, kids) = column_with(&mut tree, &[(10.0, 5.0), (20.0, 7.0)]);
        tree.update_props(kids[1], |p| p.visibility = Visibility::Collapsed)
            .unwrap();
        assert_eq!(
            tree.measure(root, Size::INFINITY).unwrap(),
            Size::new(10.0, 5.0)
        );
        assert_eq!(tree.slot(kids[1]).unwrap().measure_count, 0);
    }

    #[test]
    fn invalid_desired_size_is_sanitized() {
        let mut tree = LayoutTree::new();
        let leaf = tree.insert(Fixed::new(f64::NAN, -3.0));
        assert_eq!(tree.measure(leaf, Size::INFINITY).unwrap(), Size::ZERO);
    }

    #[test]
    fn arrange_measures_dirty_node_first_and_caches() {
        let mut tree = LayoutTree::new();
        let (root, kids) = column_with(&mut tree, &[(10.0, 5.0), (20.0, 7.0)]);
        let rect = Rect::new(0.0, 0.0, 50.0, 40.0);
        tree.arrange(root, rect).unwrap();
        assert_eq!(tree.layout_rect(kids[1]), Rect::new(0.0, 5.0, 50.0, 7.0));
        tree.arrange(root, rect).unwrap();
        assert_eq!(tree.slot(root).unwrap().arrange_count, 1);
        assert!(tree.is_arrange_valid(root));
    }

    #[test]
    fn innermost_failure_is_recorded_and_propagated() {
        let mut tree = LayoutTree::new();
        let root = tree.insert(Column::default());
        let mid = tree.insert(Column::default());
        let bad = tree.insert(Column { fail_measure: true });
        tree.add_child(root, mid).unwrap();
        tree.add_child(mid, bad).unwrap();

        let err = tree.measure(root, Size::INFINITY).unwrap_err();
        assert!(matches!(err, LayoutError::ElementFailed { node, .. } if node == bad));
        let failure = tree.last_failure().unwrap();
        assert_eq!(failure.node, bad);
        assert_eq!(failure.phase, LayoutPhase::Measure);
        assert!(!tree.is_measure_valid(root));
        assert!(!tree.is_measure_valid(bad));
    }

    #[test]
    fn structure_rules() {
        let mut tree = LayoutTree::new();
        let (root, kids) = column_with(&mut tree, &[(1.0, 1.0)]);
        assert!(matches!(
            tree.add_child(root, kids[0]),
            Err(LayoutError::AlreadyParented { .. })
        ));
        let other = tree.insert(Column::default());
        tree.add_child(other, root).unwrap();
        assert!(matches!(
            tree.detach(other).and_then(|_| tree.add_child(root, other)),
            Err(LayoutError::Cycle { .. })
        ));
        assert_eq!(tree.visual_child(root, 0).unwrap(), kids[0]);
        assert!(matches!(
            tree.visual_child(root, 1),
            Err(LayoutError::ChildIndexOutOfRange { index: 1, count: 1, .. })
        ));
    }

    #[test]
    fn removed_ids_are_not_reused() {
        let mut tree = LayoutTree::new();
        let (root, kids) = column_with(&mut tree, &[(1.0, 1.0), (2.0, 2.0)]);
        let removed = tree.remove(root).unwrap();
        assert_eq!(removed.len(), 3);
        assert!(!tree.contains(kids[0]));
        let fresh = tree.insert(Fixed::new(1.0, 1.0));
        assert!(fresh.index() > kids[1].index());
        assert!(matches!(
            tree.measure(root, Size::INFINITY),
            Err(LayoutError::UnknownNode(_))
        ));
    }

    #[test]
    fn measuring_a_non_child_is_rejected() {
        #[derive(Debug)]
        struct Thief(NodeId);
        impl LayoutElement for Thief {
            fn kind(&self) -> &'static str {
                "Thief"
            }
            fn measure_override(
                &mut self,
                cx: &mut LayoutContext<'_>,
                available: Size,
            ) -> Result<Size, LayoutError> {
                cx.measure(self.0, available)
            }
            fn arrange_override(
                &mut self,
                _cx: &mut LayoutContext<'_>,
                final_size: Size,
            ) -> Result<Size, LayoutError> {
                Ok(final_size)
            }
        }

        let mut tree = LayoutTree::new();
        let stray = tree.insert(Fixed::new(1.0, 1.0));
        let thief = tree.insert(Thief(stray));
        assert!(matches!(
            tree.measure(thief, Size::INFINITY),
            Err(LayoutError::NotAChild { .. })
        ));
        assert_eq!(tree.last_failure().unwrap().node, thief);
    }
}
