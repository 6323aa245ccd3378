#![forbid(unsafe_code)]

//! Layout: the measure/arrange protocol, item-container generation and the
//! primitive panels.
//!
//! # Protocol
//!
//! Every node of a [`LayoutTree`] wraps a [`LayoutElement`]. Layout runs in
//! two passes:
//!
//! 1. **Measure** (bottom-up): a parent calls [`LayoutContext::measure`] on a
//!    child with an available size per axis (finite bound or infinity); the
//!    child's [`LayoutElement::measure_override`] answers with a desired size,
//!    which the tree stores sanitized.
//! 2. **Arrange** (top-down): a parent hands each child a slot rect; the
//!    child's [`LayoutElement::arrange_override`] positions its own children
//!    and returns its render size.
//!
//! Dirty flags make both passes idempotent: repeating a call with the same
//! input and no invalidation in between returns the cached result and runs no
//! override.
//!
//! # Panels
//!
//! - [`TabPanel`]: multi-row tab headers with balanced row stretch.
//! - [`UniformGrid`]: equal cells, auto-sized row/column counts.
//! - [`ToolBarPanel`] / [`ToolBarOverflowPanel`]: main bar plus wrapping
//!   overflow area, with children moving between them.
//! - [`SelectiveScrollingGrid`]: per-child frozen scroll axes.
//! - [`BulletDecorator`]: bullet beside content.
//! - [`PopupRoot`]: popup content sized against a screen area.

mod element;
mod tree;

pub mod bullet_decorator;
pub mod generator;
pub mod popup_root;
pub mod selective_scrolling_grid;
pub mod tab_panel;
pub mod toolbar;
pub mod uniform_grid;

pub use bullet_decorator::BulletDecorator;
pub use element::{AsAny, Fixed, LayoutElement};
pub use generator::{
    ContainerHost, GeneratorDirection, GeneratorError, GeneratorPosition, GeneratorScope,
    GeneratorStatus, ItemContainerGenerator, ItemGenerator, ItemsChanged, ItemsChangedAction,
    RecyclingItemContainerGenerator,
};
pub use popup_root::PopupRoot;
pub use primkit_core::geometry::{Orientation, Point, Rect, Size, Vector};
pub use selective_scrolling_grid::{SelectiveScrollingGrid, SelectiveScrollingOrientation};
pub use tab_panel::{HeaderDistribution, TabPanel, distribute_headers};
pub use toolbar::{OverflowMode, ToolBar, ToolBarOverflowPanel, ToolBarPanel};
pub use tree::{
    LayoutContext, LayoutError, LayoutFailure, LayoutPhase, LayoutSlot, LayoutTree, NodeId,
    NodeProps,
};
pub use uniform_grid::{GridDimensions, UniformGrid, resolve_grid};

use serde::{Deserialize, Serialize};

/// Whether a node takes part in layout and rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Visibility {
    /// Laid out and rendered.
    #[default]
    Visible,
    /// Laid out, not rendered.
    Hidden,
    /// Neither; measures to zero and consumes no cell or row.
    Collapsed,
}

/// Edge of a container a strip is docked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Dock {
    Left,
    #[default]
    Top,
    Right,
    Bottom,
}

impl Dock {
    /// Whether the strip runs horizontally.
    #[inline]
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }
}
