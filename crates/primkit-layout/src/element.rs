#![forbid(unsafe_code)]

//! The element side of the layout protocol.

use std::any::Any;
use std::fmt;

use primkit_core::geometry::Size;

use crate::tree::{LayoutContext, LayoutError};

/// Downcasting support for boxed elements.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A layoutable node type.
///
/// Implementations receive a [`LayoutContext`] that lets them measure and
/// arrange their own children. They must arrange every child exactly once
/// per `arrange_override`.
pub trait LayoutElement: AsAny + fmt::Debug {
    /// Type name used for diagnostics.
    fn kind(&self) -> &'static str;

    /// Compute the desired size under `available`.
    fn measure_override(
        &mut self,
        cx: &mut LayoutContext<'_>,
        available: Size,
    ) -> Result<Size, LayoutError>;

    /// Position children inside `final_size` and return the render size.
    fn arrange_override(
        &mut self,
        cx: &mut LayoutContext<'_>,
        final_size: Size,
    ) -> Result<Size, LayoutError>;
}

/// Leaf element with a fixed desired size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fixed {
    size: Size,
}

impl Fixed {
    /// Create a leaf that always wants `width x height`.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            size: Size::new(width, height),
        }
    }

    /// The size this leaf asks for.
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Change the requested size. Callers must invalidate the node's measure.
    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }
}

impl LayoutElement for Fixed {
    fn kind(&self) -> &'static str {
        "Fixed"
    }

    fn measure_override(
        &mut self,
        _cx: &mut LayoutContext<'_>,
        _available: Size,
    ) -> Result<Size, LayoutError> {
        Ok(self.size)
    }

    fn arrange_override(
        &mut self,
        _cx: &mut LayoutContext<'_>,
        final_size: Size,
    ) -> Result<Size, LayoutError> {
        Ok(final_size)
    }
}
