#![forbid(unsafe_code)]

//! Bullet beside content, as used by check boxes and radio buttons.
//!
//! The first child is the bullet, the optional second child the content.
//! The bullet is vertically centred on the first line; the content takes
//! the remaining width.

use primkit_core::geometry::{Rect, Size};

use crate::element::LayoutElement;
use crate::tree::{LayoutContext, LayoutError, NodeId};

/// Decorator placing a bullet to the left of its content.
#[derive(Debug, Clone, Copy, Default)]
pub struct BulletDecorator;

impl BulletDecorator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn parts(cx: &LayoutContext<'_>) -> (Option<NodeId>, Option<NodeId>) {
        let children = cx.children();
        (children.first().copied(), children.get(1).copied())
    }
}

impl LayoutElement for BulletDecorator {
    fn kind(&self) -> &'static str {
        "BulletDecorator"
    }

    fn measure_override(
        &mut self,
        cx: &mut LayoutContext<'_>,
        available: Size,
    ) -> Result<Size, LayoutError> {
        let (bullet, content) = Self::parts(cx);
        let bullet_size = match bullet {
            Some(b) => cx.measure(b, available)?,
            None => Size::ZERO,
        };
        let content_size = match content {
            Some(c) => {
                let rest = Size::new((available.width - bullet_size.width).max(0.0), available.height);
                cx.measure(c, rest)?
            }
            None => Size::ZERO,
        };
        Ok(Size::new(
            bullet_size.width + content_size.width,
            bullet_size.height.max(content_size.height),
        ))
    }

    fn arrange_override(
        &mut self,
        cx: &mut LayoutContext<'_>,
        final_size: Size,
    ) -> Result<Size, LayoutError> {
        let (bullet, content) = Self::parts(cx);
        let bullet_size = bullet.map_or(Size::ZERO, |b| cx.desired_size(b));
        if let Some(b) = bullet {
            let y = ((final_size.height - bullet_size.height) / 2.0).max(0.0);
            cx.arrange(b, Rect::new(0.0, y, bullet_size.width, bullet_size.height))?;
        }
        if let Some(c) = content {
            let width = (final_size.width - bullet_size.width).max(0.0);
            cx.arrange(c, Rect::new(bullet_size.width, 0.0, width, final_size.height))?;
        }
        for extra in cx.children().into_iter().skip(2) {
            cx.arrange(extra, Rect::default())?;
        }
        Ok(final_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Fixed;
    use crate::tree::LayoutTree;

    #[test]
    fn bullet_is_centred_and_content_fills() {
        let mut tree = LayoutTree::new();
        let deco = tree.insert(BulletDecorator::new());
        let bullet = tree.insert(Fixed::new(12.0, 12.0));
        let content = tree.insert(Fixed::new(60.0, 20.0));
        tree.add_child(deco, bullet).unwrap();
        tree.add_child(deco, content).unwrap();

        assert_eq!(
            tree.measure(deco, Size::new(100.0, 50.0)).unwrap(),
            Size::new(72.0, 20.0)
        );
        tree.arrange(deco, Rect::new(0.0, 0.0, 100.0, 20.0)).unwrap();
        assert_eq!(tree.layout_rect(bullet), Rect::new(0.0, 4.0, 12.0, 12.0));
        assert_eq!(tree.layout_rect(content), Rect::new(12.0, 0.0, 88.0, 20.0));
    }

    #[test]
    fn empty_decorator_is_zero() {
        let mut tree = LayoutTree::new();
        let deco = tree.insert(BulletDecorator::new());
        assert_eq!(tree.update_layout(deco, Size::INFINITY).unwrap(), Size::ZERO);
    }
}
