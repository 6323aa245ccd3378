#![forbid(unsafe_code)]

//! Pointer capture: the one exclusive input resource.
//!
//! [`PointerCapture`] is a cheap, cloneable handle to the capture slot of a
//! window. Every interactive primitive of that window holds a clone.
//!
//! # Invariants
//!
//! 1. At most one element holds capture at any time.
//! 2. A request by the current holder always succeeds and changes nothing.
//! 3. A request while another element holds capture displaces it, unless the
//!    holder marked itself exclusive, in which case the request is refused.
//! 4. Every displaced holder is queued exactly once in [`take_lost`]; the
//!    host delivers those as "lost capture" notifications.
//!
//! # Failure Modes
//!
//! - Releasing capture that is not held is a no-op returning `false`.
//!
//! [`take_lost`]: PointerCapture::take_lost

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::element::ElementId;
use crate::error::CaptureError;
use crate::logging::INPUT;

#[derive(Debug, Default)]
struct CaptureSlot {
    holder: Option<ElementId>,
    exclusive: bool,
    lost: Vec<ElementId>,
}

/// Shared handle to a window's pointer-capture slot.
#[derive(Debug, Clone, Default)]
pub struct PointerCapture {
    slot: Rc<RefCell<CaptureSlot>>,
}

impl PointerCapture {
    /// Create an empty capture slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current holder, if any.
    #[must_use]
    pub fn holder(&self) -> Option<ElementId> {
        self.slot.borrow().holder
    }

    /// Whether `id` holds capture.
    #[must_use]
    pub fn is_captured_by(&self, id: ElementId) -> bool {
        self.slot.borrow().holder == Some(id)
    }

    /// Request capture for `id`.
    ///
    /// Returns the displaced holder, if there was one.
    pub fn try_capture(&self, id: ElementId) -> Result<Option<ElementId>, CaptureError> {
        let mut slot = self.slot.borrow_mut();
        match slot.holder {
            Some(holder) if holder == id => Ok(None),
            Some(holder) if slot.exclusive => {
                debug!(target: INPUT, requester = %id, %holder, "capture refused");
                Err(CaptureError::Refused { holder })
            }
            previous => {
                slot.holder = Some(id);
                slot.exclusive = false;
                if let Some(prev) = previous {
                    slot.lost.push(prev);
                }
                trace!(target: INPUT, holder = %id, displaced = ?previous, "capture acquired");
                Ok(previous)
            }
        }
    }

    /// Release capture held by `id`.
    pub fn release(&self, id: ElementId) -> bool {
        let mut slot = self.slot.borrow_mut();
        if slot.holder != Some(id) {
            return false;
        }
        slot.holder = None;
        slot.exclusive = false;
        trace!(target: INPUT, holder = %id, "capture released");
        true
    }

    /// Mark the current holder as refusing to yield. No-op if `id` is not
    /// the holder.
    pub fn set_exclusive(&self, id: ElementId, exclusive: bool) {
        let mut slot = self.slot.borrow_mut();
        if slot.holder == Some(id) {
            slot.exclusive = exclusive;
        }
    }

    /// Change capture from outside the primitives (window deactivation, a
    /// foreign element grabbing input). Ignores exclusivity.
    pub fn force(&self, holder: Option<ElementId>) {
        let mut slot = self.slot.borrow_mut();
        if slot.holder == holder {
            return;
        }
        if let Some(prev) = slot.holder {
            slot.lost.push(prev);
        }
        debug!(target: INPUT, from = ?slot.holder, to = ?holder, "capture forced");
        slot.holder = holder;
        slot.exclusive = false;
    }

    /// Drain the elements that lost capture involuntarily since the last call.
    pub fn take_lost(&self) -> Vec<ElementId> {
        std::mem::take(&mut self.slot.borrow_mut().lost)
    }
}
