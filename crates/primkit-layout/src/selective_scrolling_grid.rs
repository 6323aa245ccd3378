#![forbid(unsafe_code)]

//! Grid whose children can opt out of scrolling per axis.
//!
//! The host scrolls the grid's content by translating it by `-offset`. Each
//! child whose [`SelectiveScrollingOrientation`] excludes an axis gets the
//! offset on that axis added back as its render offset, so it appears frozen
//! in place (row headers, frozen columns).

use primkit_core::geometry::{Rect, Size, Vector};
use serde::{Deserialize, Serialize};

use crate::element::LayoutElement;
use crate::tree::{LayoutContext, LayoutError};

/// Axes along which a child follows the scroll offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SelectiveScrollingOrientation {
    /// Frozen on both axes.
    None,
    Horizontal,
    Vertical,
    #[default]
    Both,
}

impl SelectiveScrollingOrientation {
    #[inline]
    #[must_use]
    pub const fn scrolls_horizontally(self) -> bool {
        matches!(self, Self::Horizontal | Self::Both)
    }

    #[inline]
    #[must_use]
    pub const fn scrolls_vertically(self) -> bool {
        matches!(self, Self::Vertical | Self::Both)
    }

    /// Render offset cancelling `scroll` on the axes this child ignores.
    #[must_use]
    pub fn compensation(self, scroll: Vector) -> Vector {
        Vector::new(
            if self.scrolls_horizontally() { 0.0 } else { scroll.x },
            if self.scrolls_vertically() { 0.0 } else { scroll.y },
        )
    }
}

/// Overlay panel applying per-child scroll compensation.
#[derive(Debug, Clone, Default)]
pub struct SelectiveScrollingGrid {
    scroll_offset: Vector,
}

impl SelectiveScrollingGrid {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn scroll_offset(&self) -> Vector {
        self.scroll_offset
    }

    /// Record the host's current scroll offset. Callers must invalidate the
    /// node's arrange.
    pub fn set_scroll_offset(&mut self, offset: Vector) {
        self.scroll_offset = offset;
    }
}

impl LayoutElement for SelectiveScrollingGrid {
    fn kind(&self) -> &'static str {
        "SelectiveScrollingGrid"
    }

    fn measure_override(
        &mut self,
        cx: &mut LayoutContext<'_>,
        available: Size,
    ) -> Result<Size, LayoutError> {
        let mut size = Size::ZERO;
        for child in cx.children() {
            size = size.max(cx.measure(child, available)?);
        }
        Ok(size)
    }

    fn arrange_override(
        &mut self,
        cx: &mut LayoutContext<'_>,
        final_size: Size,
    ) -> Result<Size, LayoutError> {
        for child in cx.children() {
            let offset = cx.props(child).scrolling.compensation(self.scroll_offset);
            cx.tree_mut().set_render_offset(child, offset)?;
            cx.arrange(child, Rect::from_size(final_size))?;
        }
        Ok(final_size)
    }
}
