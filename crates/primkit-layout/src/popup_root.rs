#![forbid(unsafe_code)]

//! Root of a popup's content.
//!
//! Popup content is first measured unconstrained. The result is then
//! restricted to the popup's maximum area (usually the screen work area)
//! and to the available size; if that changes it, the content is measured
//! again at the restricted size so it can wrap or scroll.

use primkit_core::geometry::{Rect, Size};
use primkit_core::logging::LAYOUT;
use tracing::trace;

use crate::element::LayoutElement;
use crate::tree::{LayoutContext, LayoutError};

/// Single-child root sized against a maximum area.
#[derive(Debug, Clone, Copy)]
pub struct PopupRoot {
    max_size: Size,
}

impl Default for PopupRoot {
    fn default() -> Self {
        Self {
            max_size: Size::INFINITY,
        }
    }
}

impl PopupRoot {
    #[must_use]
    pub fn new(max_size: Size) -> Self {
        Self { max_size }
    }

    #[must_use]
    pub fn max_size(&self) -> Size {
        self.max_size
    }

    /// Callers must invalidate the node's measure.
    pub fn set_max_size(&mut self, max_size: Size) {
        self.max_size = max_size;
    }
}

impl LayoutElement for PopupRoot {
    fn kind(&self) -> &'static str {
        "PopupRoot"
    }

    fn measure_override(
        &mut self,
        cx: &mut LayoutContext<'_>,
        available: Size,
    ) -> Result<Size, LayoutError> {
        let Some(child) = cx.children().first().copied() else {
            return Ok(Size::ZERO);
        };
        let natural = cx.measure(child, Size::INFINITY)?;
        let restricted = natural.min(self.max_size).min(available);
        if restricted == natural {
            return Ok(natural);
        }
        trace!(target: LAYOUT, node = %cx.node(), ?natural, ?restricted, "popup content restricted");
        let remeasured = cx.measure(child, restricted)?;
        Ok(remeasured.min(restricted))
    }

    fn arrange_override(
        &mut self,
        cx: &mut LayoutContext<'_>,
        final_size: Size,
    ) -> Result<Size, LayoutError> {
        for child in cx.children() {
            cx.arrange(child, Rect::from_size(final_size))?;
        }
        Ok(final_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Fixed;
    use crate::tree::{LayoutPhase, LayoutTree};

    #[derive(Debug)]
    struct Broken;

    impl LayoutElement for Broken {
        fn kind(&self) -> &'static str {
            "Broken"
        }

        fn measure_override(
            &mut self,
            cx: &mut LayoutContext<'_>,
            _available: Size,
        ) -> Result<Size, LayoutError> {
            Err(cx.fail("content template missing"))
        }

        fn arrange_override(
            &mut self,
            _cx: &mut LayoutContext<'_>,
            final_size: Size,
        ) -> Result<Size, LayoutError> {
            Ok(final_size)
        }
    }

    #[test]
    fn content_is_clamped_to_max_area() {
        let mut tree = LayoutTree::new();
        let popup = tree.insert(PopupRoot::new(Size::new(300.0, 200.0)));
        let content = tree.insert(Fixed::new(500.0, 100.0));
        tree.add_child(popup, content).unwrap();
        assert_eq!(
            tree.measure(popup, Size::INFINITY).unwrap(),
            Size::new(300.0, 100.0)
        );
        assert_eq!(
            tree.slot(content).unwrap().last_available,
            Some(Size::new(300.0, 100.0))
        );
    }

    #[test]
    fn small_content_keeps_natural_size() {
        let mut tree = LayoutTree::new();
        let popup = tree.insert(PopupRoot::default());
        let content = tree.insert(Fixed::new(50.0, 40.0));
        tree.add_child(popup, content).unwrap();
        assert_eq!(
            tree.measure(popup, Size::INFINITY).unwrap(),
            Size::new(50.0, 40.0)
        );
    }

    #[test]
    fn failing_content_is_recorded() {
        let mut tree = LayoutTree::new();
        let popup = tree.insert(PopupRoot::default());
        let content = tree.insert(Broken);
        tree.add_child(popup, content).unwrap();
        assert!(tree.measure(popup, Size::INFINITY).is_err());
        let failure = tree.last_failure().unwrap();
        assert_eq!((failure.node, failure.kind), (content, "Broken"));
        assert_eq!(failure.phase, LayoutPhase::Measure);
    }
}
