#![forbid(unsafe_code)]

//! A value constrained to a range, as used by scroll bars and sliders.
//!
//! The requested maximum and value are remembered separately from their
//! effective (coerced) versions, so narrowing and then widening the range
//! restores the value the caller asked for.
//!
//! # Invariants
//!
//! 1. `minimum <= maximum` and `minimum <= value <= maximum` after every
//!    operation.
//! 2. `ValueChanged` is raised exactly when the effective value changes.
//! 3. Non-finite bounds or values are rejected and change nothing.

use primkit_core::element::ElementId;
use primkit_core::error::ConfigError;
use primkit_core::logging::INPUT;
use primkit_core::property::{Property, non_negative_finite};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::context::{ControlEvent, InputContext};
use crate::error::ControlError;

/// What a scroll action asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScrollEventType {
    SmallIncrement,
    SmallDecrement,
    LargeIncrement,
    LargeDecrement,
    /// The thumb was dropped at a position.
    ThumbPosition,
    /// The thumb is being dragged.
    ThumbTrack,
    First,
    Last,
    EndScroll,
}

fn finite(property: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NotFinite { property, value })
    }
}

/// Range state with coercion and change notification.
#[derive(Debug)]
pub struct RangeBase {
    id: ElementId,
    cx: InputContext,
    minimum: f64,
    requested_maximum: f64,
    requested_value: f64,
    maximum: f64,
    value: f64,
    small_change: Property<f64>,
    large_change: Property<f64>,
}

impl RangeBase {
    pub const KIND: &'static str = "RangeBase";

    /// Range `[0, 1]`, value 0, small change 0.1, large change 1.
    #[must_use]
    pub fn new(cx: &InputContext, id: ElementId, parent: Option<ElementId>) -> Self {
        cx.router.register(id, Self::KIND, parent);
        Self {
            id,
            cx: cx.clone(),
            minimum: 0.0,
            requested_maximum: 1.0,
            requested_value: 0.0,
            maximum: 1.0,
            value: 0.0,
            small_change: Property::validated("SmallChange", 0.1, non_negative_finite),
            large_change: Property::validated("LargeChange", 1.0, non_negative_finite),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ElementId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn minimum(&self) -> f64 {
        self.minimum
    }

    #[inline]
    #[must_use]
    pub fn maximum(&self) -> f64 {
        self.maximum
    }

    #[inline]
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[must_use]
    pub fn small_change(&self) -> f64 {
        self.small_change.get()
    }

    #[must_use]
    pub fn large_change(&self) -> f64 {
        self.large_change.get()
    }

    pub fn set_small_change(&mut self, change: f64) -> Result<bool, ConfigError> {
        self.small_change.set(change)
    }

    pub fn set_large_change(&mut self, change: f64) -> Result<bool, ConfigError> {
        self.large_change.set(change)
    }

    pub fn set_minimum(&mut self, minimum: f64) -> Result<(), ControlError> {
        self.minimum = finite("Minimum", minimum)?;
        self.coerce()
    }

    /// A maximum below the minimum is held back until the minimum allows it.
    pub fn set_maximum(&mut self, maximum: f64) -> Result<(), ControlError> {
        self.requested_maximum = finite("Maximum", maximum)?;
        self.coerce()
    }

    /// Set the value; it is clamped into the range.
    pub fn set_value(&mut self, value: f64) -> Result<(), ControlError> {
        self.requested_value = finite("Value", value)?;
        self.coerce()
    }

    fn coerce(&mut self) -> Result<(), ControlError> {
        self.maximum = self.requested_maximum.max(self.minimum);
        let old = self.value;
        let new = self.requested_value.clamp(self.minimum, self.maximum);
        if new == old {
            return Ok(());
        }
        self.value = new;
        trace!(target: INPUT, id = %self.id, old, new, "range value changed");
        self.cx.raise(self.id, ControlEvent::ValueChanged { old, new })?;
        Ok(())
    }

    /// The value a scroll action of `kind` leads to, clamped into range.
    ///
    /// `thumb_value` is only read for the thumb kinds.
    #[must_use]
    pub fn scroll_target(&self, kind: ScrollEventType, thumb_value: f64) -> f64 {
        let target = match kind {
            ScrollEventType::SmallIncrement => self.value + self.small_change(),
            ScrollEventType::SmallDecrement => self.value - self.small_change(),
            ScrollEventType::LargeIncrement => self.value + self.large_change(),
            ScrollEventType::LargeDecrement => self.value - self.large_change(),
            ScrollEventType::ThumbPosition | ScrollEventType::ThumbTrack => {
                if thumb_value.is_finite() {
                    thumb_value
                } else {
                    self.value
                }
            }
            ScrollEventType::First => self.minimum,
            ScrollEventType::Last => self.maximum,
            ScrollEventType::EndScroll => self.value,
        };
        target.clamp(self.minimum, self.maximum)
    }

    /// Perform a scroll action: raise `Scroll`, then move the value.
    ///
    /// Returns the new value.
    pub fn apply_scroll(
        &mut self,
        kind: ScrollEventType,
        thumb_value: f64,
    ) -> Result<f64, ControlError> {
        let new_value = self.scroll_target(kind, thumb_value);
        self.cx.raise(self.id, ControlEvent::Scroll { kind, new_value })?;
        if kind != ScrollEventType::EndScroll {
            self.set_value(new_value)?;
        }
        Ok(self.value)
    }

    /// Value change for a thumb dragged `distance` along a track.
    ///
    /// The thumb's travel (`track_length - thumb_length`) spans the whole
    /// range. Returns 0 when the thumb cannot move.
    #[must_use]
    pub fn value_from_distance(&self, distance: f64, track_length: f64, thumb_length: f64) -> f64 {
        let travel = track_length - thumb_length;
        if travel.is_nan() || travel <= 0.0 || !distance.is_finite() {
            return 0.0;
        }
        distance * (self.maximum - self.minimum) / travel
    }
}

impl Drop for RangeBase {
    fn drop(&mut self) {
        self.cx.router.unregister(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn setup() -> (RangeBase, Rc<RefCell<Vec<ControlEvent>>>) {
        let cx = InputContext::new();
        let range = RangeBase::new(&cx, ElementId::new(1).unwrap(), None);
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        cx.router
            .subscribe(range.id(), move |args| {
                sink.borrow_mut().push(*args.event);
                Ok(())
            })
            .detach();
        (range, log)
    }

    #[test]
    fn value_is_clamped_and_restored() {
        let (mut r, log) = setup();
        r.set_maximum(100.0).unwrap();
        r.set_value(80.0).unwrap();
        r.set_maximum(50.0).unwrap();
        assert_eq!(r.value(), 50.0);
        r.set_maximum(100.0).unwrap();
        assert_eq!(r.value(), 80.0);
        assert_eq!(
            *log.borrow(),
            vec![
                ControlEvent::ValueChanged { old: 0.0, new: 80.0 },
                ControlEvent::ValueChanged { old: 80.0, new: 50.0 },
                ControlEvent::ValueChanged { old: 50.0, new: 80.0 },
            ]
        );
    }

    #[test]
    fn maximum_never_below_minimum() {
        let (mut r, _log) = setup();
        r.set_minimum(10.0).unwrap();
        assert_eq!(r.maximum(), 10.0);
        assert_eq!(r.value(), 10.0);
        r.set_minimum(0.0).unwrap();
        assert_eq!(r.maximum(), 1.0);
        assert_eq!(r.value(), 0.0);
    }

    #[test]
    fn rejected_inputs_change_nothing() {
        let (mut r, log) = setup();
        assert!(r.set_value(f64::NAN).unwrap_err().as_config().is_some());
        assert!(r.set_maximum(f64::INFINITY).is_err());
        assert!(r.set_small_change(-1.0).is_err());
        assert_eq!((r.maximum(), r.value(), r.small_change()), (1.0, 0.0, 0.1));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn scroll_kinds() {
        let (mut r, log) = setup();
        r.set_maximum(10.0).unwrap();
        r.set_large_change(4.0).unwrap();
        assert_eq!(r.apply_scroll(ScrollEventType::LargeIncrement, 0.0).unwrap(), 4.0);
        assert_eq!(r.apply_scroll(ScrollEventType::ThumbTrack, 7.5).unwrap(), 7.5);
        assert_eq!(r.apply_scroll(ScrollEventType::Last, 0.0).unwrap(), 10.0);
        assert_eq!(r.apply_scroll(ScrollEventType::SmallIncrement, 0.0).unwrap(), 10.0);
        assert_eq!(r.apply_scroll(ScrollEventType::EndScroll, 0.0).unwrap(), 10.0);
        assert_eq!(r.apply_scroll(ScrollEventType::First, 0.0).unwrap(), 0.0);
        let scrolls = log
            .borrow()
            .iter()
            .filter(|e| matches!(e, ControlEvent::Scroll { .. }))
            .count();
        assert_eq!(scrolls, 6);
    }

    #[test]
    fn distance_maps_travel_onto_range() {
        let (mut r, _log) = setup();
        r.set_maximum(200.0).unwrap();
        assert_eq!(r.value_from_distance(25.0, 120.0, 20.0), 50.0);
        assert_eq!(r.value_from_distance(25.0, 20.0, 20.0), 0.0);
    }
}
